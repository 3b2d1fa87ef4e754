use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20241101_000001_create_promotions_table::Migration)]
    }
}

mod m20241101_000001_create_promotions_table {
    use sea_orm_migration::{prelude::*, sea_orm::DatabaseBackend};

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20241101_000001_create_promotions_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            let backend = manager.get_database_backend();

            manager
                .create_table(
                    Table::create()
                        .table(Promotions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Promotions::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Promotions::Code).string_len(64).not_null())
                        .col(ColumnDef::new(Promotions::Description).text().null())
                        .col(ColumnDef::new(Promotions::DiscountType).string_len(16).not_null())
                        .col(money(Promotions::DiscountValue, backend).not_null())
                        .col(
                            money(Promotions::MinOrderAmount, backend)
                                .not_null()
                                .default(0),
                        )
                        .col(money(Promotions::MaxDiscount, backend).null())
                        .col(ColumnDef::new(Promotions::UsageLimit).integer().null())
                        .col(
                            ColumnDef::new(Promotions::UsedCount)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Promotions::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Promotions::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Promotions::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Promotions::ExpiresAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_promotions_code")
                        .table(Promotions::Table)
                        .col(Promotions::Code)
                        .unique()
                        .if_not_exists()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Promotions::Table).to_owned())
                .await
        }
    }

    // SQLite keeps whole NUMERIC values as INTEGER, which does not decode as a decimal
    fn money(column: Promotions, backend: DatabaseBackend) -> ColumnDef {
        let mut def = ColumnDef::new(column);
        match backend {
            DatabaseBackend::Sqlite => def.double(),
            _ => def.decimal_len(12, 2),
        };
        def
    }

    #[derive(DeriveIden)]
    pub enum Promotions {
        Table,
        Id,
        Code,
        Description,
        DiscountType,
        DiscountValue,
        MinOrderAmount,
        MaxDiscount,
        UsageLimit,
        UsedCount,
        IsActive,
        CreatedAt,
        UpdatedAt,
        ExpiresAt,
    }
}

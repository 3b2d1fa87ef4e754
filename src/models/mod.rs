pub mod promotion_entity;

pub use promotion_entity::{
    DiscountType, Entity as Promotion, Model as PromotionModel,
};

// Core models
pub mod promotion_entity;

pub use promotion_entity::{normalize_code, Model as Promotion};

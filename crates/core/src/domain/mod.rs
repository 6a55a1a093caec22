pub mod product;
pub mod promotion;
pub mod specs;
pub mod store;

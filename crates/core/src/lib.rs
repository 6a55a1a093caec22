pub mod config;
pub mod domain;
pub mod render;
pub mod search;

pub use domain::product::{
    Brand, BrandId, BrandSummary, Category, CategoryId, Product, ProductId, Variant, VariantId,
    VariantRecord,
};
pub use domain::promotion::{Promotion, PromotionValue};
pub use domain::store::{Branch, Inventory, StockLine, WarrantyPolicy};
pub use render::{RenderError, RenderSettings, ReplyFormat, ReplyRenderer};
pub use search::{FilterResolver, FilterSet, PlanError, SearchPlan, SlotInput};

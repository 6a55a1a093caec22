//! Custom actions served to the dialogue engine.
//!
//! Each action reads the tracker it is handed, talks to the catalog and store
//! repositories (or the REST backend for carts, orders and customer profiles)
//! and answers with bot messages plus slot events. Nothing is kept between
//! calls.

pub mod backend;
pub mod cart;
pub mod catalog;
pub mod compare;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod order;
pub mod product_info;
pub mod promotion;
pub mod registry;
pub mod session;
pub mod stock;
pub mod store_info;
pub mod suggest;
pub mod tracker;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use techshop_core::render::ReplyRenderer;
use techshop_core::search::{FilterResolver, PlanOptions};
use techshop_db::{CatalogRepository, StoreRepository};

pub use backend::{BackendClient, BackendError};
pub use dispatcher::{BotMessage, Dispatcher};
pub use error::ActionError;
pub use events::Event;
pub use registry::{Action, ActionContext, ActionRegistry, ActionResponse, RegistryError};
pub use tracker::Tracker;

/// Shared handles every action is built from.
#[derive(Clone)]
pub struct ActionServices {
    pub catalog: Arc<dyn CatalogRepository>,
    pub store: Arc<dyn StoreRepository>,
    pub renderer: Arc<ReplyRenderer>,
    pub resolver: FilterResolver,
    pub plan_options: PlanOptions,
    pub backend: Arc<BackendClient>,
}

impl ActionRegistry {
    /// Registry holding every action the assistant answers.
    pub fn with_default_actions(services: &ActionServices) -> Self {
        let mut registry = Self::new();
        registry.register(suggest::SuggestProduct::new(
            services.catalog.clone(),
            services.renderer.clone(),
            services.resolver.clone(),
            services.plan_options,
        ));
        registry.register(catalog::CategoryList::new(
            services.catalog.clone(),
            services.renderer.clone(),
        ));
        registry
            .register(catalog::BrandList::new(services.catalog.clone(), services.renderer.clone()));
        registry
            .register(catalog::BrandInfo::new(services.catalog.clone(), services.renderer.clone()));
        registry.register(stock::CheckStock::new(services.catalog.clone(), services.store.clone()));
        registry
            .register(store_info::StoreInfo::new(services.store.clone(), services.renderer.clone()));
        registry.register(store_info::WarrantyInfo::new(
            services.store.clone(),
            services.renderer.clone(),
        ));
        registry.register(cart::AddToCart::new(services.catalog.clone(), services.backend.clone()));
        registry.register(cart::view::ViewCart::new(services.catalog.clone(), services.backend.clone()));
        registry.register(cart::edit::UpdateCartQuantity::new(
            services.catalog.clone(),
            services.backend.clone(),
        ));
        registry.register(cart::edit::DeleteFromCart::new(
            services.catalog.clone(),
            services.backend.clone(),
        ));
        registry.register(product_info::ProductInfo::new(
            services.catalog.clone(),
            services.renderer.clone(),
        ));
        registry.register(product_info::ProductSpec::new(
            services.catalog.clone(),
            services.renderer.clone(),
        ));
        registry.register(product_info::TechnicalSpecs::new(
            services.catalog.clone(),
            services.renderer.clone(),
        ));
        registry.register(product_info::ProvidePrice::new(services.catalog.clone()));
        registry.register(compare::CompareProducts::new(
            services.catalog.clone(),
            services.renderer.clone(),
        ));
        registry.register(promotion::CheckPromotion::new(
            services.catalog.clone(),
            services.store.clone(),
            services.renderer.clone(),
        ));
        registry.register(order::PreviewOrder::new(services.catalog.clone(), services.backend.clone()));
        registry.register(order::SubmitOrder::new(services.backend.clone()));
        registry.register(order::CancelOrder);
        registry.register(order::ReturnOrder::new(services.backend.clone()));
        registry.register(session::RestartSlot);
        registry.register(session::HumanHandoff::new(services.renderer.clone()));
        registry
    }
}

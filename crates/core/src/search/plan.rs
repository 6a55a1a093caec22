//! Typed search plans. A plan is built once per turn from a [`FilterSet`] and
//! then consumed by whichever store executes it: the SQL repository renders
//! the predicates with a query builder, the in-memory repository evaluates
//! them directly and [`SearchPlan::to_pipeline`] renders them as an
//! aggregation pipeline for diagnostics.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::domain::product::{BrandId, CategoryId, Product, Variant};
use crate::search::filter::{BoundKind, Dimension, FilterSet, PriceOrder};
use crate::search::numeric::{extract_number, parse_storage_gb};

pub const DEFAULT_RESULT_LIMIT: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum Bound {
    AtLeast(u64),
    AtMost(u64),
}

impl Bound {
    pub fn from_kind(kind: BoundKind, value: u64) -> Self {
        match kind {
            BoundKind::Min => Self::AtLeast(value),
            BoundKind::Max => Self::AtMost(value),
        }
    }

    pub fn value(&self) -> u64 {
        match self {
            Self::AtLeast(value) | Self::AtMost(value) => *value,
        }
    }

    pub fn admits(&self, candidate: u64) -> bool {
        match self {
            Self::AtLeast(value) => candidate >= *value,
            Self::AtMost(value) => candidate <= *value,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    Category(CategoryId),
    Brand(BrandId),
    Bound { dimension: Dimension, bound: Bound },
}

/// How a spec string with no readable number (`"N/A"`, `""`) compares
/// against an active bound on its dimension.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnparsedSpec {
    /// Fails every bound.
    #[default]
    Exclude,
    /// Passes every bound.
    Include,
    /// Compares as 0.
    TreatAsZero,
}

impl UnparsedSpec {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exclude => "exclude",
            Self::Include => "include",
            Self::TreatAsZero => "treat_as_zero",
        }
    }
}

/// Ids of the category and brand named in the filter set, as found in the
/// store. `None` means the name did not resolve (or was never given).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NameResolution {
    pub category: Option<CategoryId>,
    pub brand: Option<BrandId>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlanOptions {
    pub limit: usize,
    pub unparsed: UnparsedSpec,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self { limit: DEFAULT_RESULT_LIMIT, unparsed: UnparsedSpec::default() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("filter set is empty; a search needs a category, a brand or a numeric bound")]
    InsufficientFilter,
    #[error("category `{name}` does not exist")]
    CategoryNotFound { name: String },
    #[error("brand `{name}` does not exist and no other constraint was given")]
    BrandNotFound { name: String },
}

/// Numeric view of one variant, the values every bound is checked against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VariantMetrics {
    pub price: Option<u64>,
    pub ram_gb: Option<u64>,
    pub storage_gb: Option<u64>,
    pub battery_mah: Option<u64>,
}

impl VariantMetrics {
    pub fn from_parts(product: &Product, variant: &Variant) -> Self {
        Self {
            price: u64::try_from(variant.price).ok(),
            ram_gb: variant.memory.ram.as_deref().and_then(extract_number),
            storage_gb: variant.memory.storage.as_deref().and_then(parse_storage_gb),
            battery_mah: product.battery_capacity().and_then(extract_number),
        }
    }

    pub fn get(&self, dimension: Dimension) -> Option<u64> {
        match dimension {
            Dimension::Price => self.price,
            Dimension::Ram => self.ram_gb,
            Dimension::Storage => self.storage_gb,
            Dimension::Battery => self.battery_mah,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchPlan {
    predicates: Vec<Predicate>,
    order: PriceOrder,
    limit: usize,
    unparsed: UnparsedSpec,
    unresolved_brand: Option<String>,
}

impl SearchPlan {
    pub fn builder() -> SearchPlanBuilder {
        SearchPlanBuilder::new()
    }

    /// Builds the plan for one turn. Fails before any store access when the
    /// filter set is empty or a named category is missing from the store.
    /// A missing brand only drops the brand constraint; the dropped name is
    /// kept in [`SearchPlan::unresolved_brand`] so the caller can report it.
    pub fn from_filters(
        filters: &FilterSet,
        resolution: &NameResolution,
        options: &PlanOptions,
    ) -> Result<Self, PlanError> {
        if filters.is_empty() {
            return Err(PlanError::InsufficientFilter);
        }

        let mut builder = SearchPlanBuilder::new()
            .order(filters.order)
            .limit(options.limit)
            .unparsed(options.unparsed);

        if let Some(name) = &filters.category {
            match &resolution.category {
                Some(id) => builder = builder.category(id.clone()),
                None => return Err(PlanError::CategoryNotFound { name: name.clone() }),
            }
        }

        let mut unresolved_brand = None;
        if let Some(name) = &filters.brand {
            match &resolution.brand {
                Some(id) => builder = builder.brand(id.clone()),
                None => unresolved_brand = Some(name.clone()),
            }
        }

        for (dimension, kind, value) in filters.bounds() {
            builder = builder.bound(dimension, Bound::from_kind(kind, value));
        }

        match builder.build() {
            Ok(mut plan) => {
                plan.unresolved_brand = unresolved_brand;
                Ok(plan)
            }
            Err(PlanError::InsufficientFilter) => match unresolved_brand {
                Some(name) => Err(PlanError::BrandNotFound { name }),
                None => Err(PlanError::InsufficientFilter),
            },
            Err(other) => Err(other),
        }
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn order(&self) -> PriceOrder {
        self.order
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn unparsed(&self) -> UnparsedSpec {
        self.unparsed
    }

    pub fn unresolved_brand(&self) -> Option<&str> {
        self.unresolved_brand.as_deref()
    }

    pub fn category(&self) -> Option<&CategoryId> {
        self.predicates.iter().find_map(|predicate| match predicate {
            Predicate::Category(id) => Some(id),
            _ => None,
        })
    }

    pub fn brand(&self) -> Option<&BrandId> {
        self.predicates.iter().find_map(|predicate| match predicate {
            Predicate::Brand(id) => Some(id),
            _ => None,
        })
    }

    pub fn bounds(&self) -> impl Iterator<Item = (Dimension, Bound)> + '_ {
        self.predicates.iter().filter_map(|predicate| match predicate {
            Predicate::Bound { dimension, bound } => Some((*dimension, *bound)),
            _ => None,
        })
    }

    /// Product-stage match: category and brand.
    pub fn matches_product(&self, product: &Product) -> bool {
        let category_ok =
            self.category().map_or(true, |id| product.category_id.as_ref() == Some(id));
        let brand_ok = self.brand().map_or(true, |id| product.brand_id.as_ref() == Some(id));
        category_ok && brand_ok
    }

    /// Variant-stage match: every numeric bound, with unreadable values
    /// handled by the plan's [`UnparsedSpec`] policy.
    pub fn admits(&self, metrics: &VariantMetrics) -> bool {
        self.bounds().all(|(dimension, bound)| match metrics.get(dimension) {
            Some(value) => bound.admits(value),
            None => match self.unparsed {
                UnparsedSpec::Exclude => false,
                UnparsedSpec::Include => true,
                UnparsedSpec::TreatAsZero => bound.admits(0),
            },
        })
    }

    /// The plan as an aggregation pipeline over `products` joined with
    /// `variants`. Used for logs and the CLI `--explain` output.
    pub fn to_pipeline(&self) -> Value {
        let mut product_match = serde_json::Map::new();
        if let Some(CategoryId(id)) = self.category() {
            product_match.insert("category".to_string(), json!(id));
        }
        if let Some(BrandId(id)) = self.brand() {
            product_match.insert("brand".to_string(), json!(id));
        }

        let variant_conditions: Vec<Value> = self
            .bounds()
            .map(|(dimension, bound)| {
                let operator = match bound {
                    Bound::AtLeast(_) => "$gte",
                    Bound::AtMost(_) => "$lte",
                };
                json!({ operator: [pipeline_field(dimension), bound.value()] })
            })
            .collect();

        let direction = match self.order {
            PriceOrder::Ascending => 1,
            PriceOrder::Descending => -1,
        };

        json!([
            { "$match": Value::Object(product_match) },
            { "$lookup": {
                "from": "variants",
                "localField": "variants",
                "foreignField": "_id",
                "as": "variant"
            } },
            { "$unwind": "$variant" },
            { "$match": { "$expr": { "$and": variant_conditions } } },
            { "$sort": { "variant.price": direction } },
            { "$limit": self.limit },
            { "$project": {
                "_id": "$variant._id",
                "product_id": "$_id",
                "name": "$name",
                "price": "$variant.price",
                "discount": "$discount",
                "ram": "$variant.memory.ram",
                "storage": "$variant.memory.storage",
                "battery": "$attributes.batteryCapacity",
                "images": { "$arrayElemAt": ["$variant.colors.images", 0] },
                "soldCount": "$soldCount",
                "averageRating": "$averageRating"
            } }
        ])
    }
}

fn pipeline_field(dimension: Dimension) -> Value {
    let leading_int = |field: &str| {
        json!({
            "$convert": {
                "input": { "$arrayElemAt": [{ "$split": [field, " "] }, 0] },
                "to": "int",
                "onError": Value::Null,
                "onNull": Value::Null
            }
        })
    };
    match dimension {
        Dimension::Price => json!("$variant.price"),
        Dimension::Ram => leading_int("$variant.memory.ram"),
        Dimension::Storage => leading_int("$variant.memory.storage"),
        Dimension::Battery => leading_int("$attributes.batteryCapacity"),
    }
}

#[derive(Clone, Debug)]
pub struct SearchPlanBuilder {
    predicates: Vec<Predicate>,
    order: PriceOrder,
    limit: usize,
    unparsed: UnparsedSpec,
}

impl Default for SearchPlanBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchPlanBuilder {
    pub fn new() -> Self {
        Self {
            predicates: Vec::new(),
            order: PriceOrder::Ascending,
            limit: DEFAULT_RESULT_LIMIT,
            unparsed: UnparsedSpec::default(),
        }
    }

    pub fn category(mut self, id: CategoryId) -> Self {
        self.predicates.retain(|predicate| !matches!(predicate, Predicate::Category(_)));
        self.predicates.push(Predicate::Category(id));
        self
    }

    pub fn brand(mut self, id: BrandId) -> Self {
        self.predicates.retain(|predicate| !matches!(predicate, Predicate::Brand(_)));
        self.predicates.push(Predicate::Brand(id));
        self
    }

    pub fn bound(mut self, dimension: Dimension, bound: Bound) -> Self {
        self.predicates.push(Predicate::Bound { dimension, bound });
        self
    }

    pub fn order(mut self, order: PriceOrder) -> Self {
        self.order = order;
        self
    }

    /// Zero is raised to one; a plan always returns something when matches exist.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    pub fn unparsed(mut self, unparsed: UnparsedSpec) -> Self {
        self.unparsed = unparsed;
        self
    }

    pub fn build(self) -> Result<SearchPlan, PlanError> {
        if self.predicates.is_empty() {
            return Err(PlanError::InsufficientFilter);
        }
        Ok(SearchPlan {
            predicates: self.predicates,
            order: self.order,
            limit: self.limit,
            unparsed: self.unparsed,
            unresolved_brand: None,
        })
    }
}

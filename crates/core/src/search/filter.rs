use serde::{Deserialize, Serialize};

use crate::search::numeric::{extract_number, parse_price, parse_storage_gb};

/// A numeric attribute a search can be bounded on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Price,
    Ram,
    Storage,
    Battery,
}

impl Dimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Price => "price",
            Self::Ram => "ram",
            Self::Storage => "storage",
            Self::Battery => "battery",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundKind {
    Min,
    Max,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceOrder {
    #[default]
    Ascending,
    Descending,
}

/// Coarse intent tags filled by the NLU ("rẻ", "pin trâu", ...).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Qualifier {
    Cheap,
    Expensive,
    LowRam,
    HighRam,
    HighStorage,
    HighBattery,
}

impl Qualifier {
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "cheap" => Some(Self::Cheap),
            "expensive" => Some(Self::Expensive),
            "low_ram" => Some(Self::LowRam),
            "high_ram" => Some(Self::HighRam),
            "high_storage" => Some(Self::HighStorage),
            "high_battery" => Some(Self::HighBattery),
            _ => None,
        }
    }

    /// The single bound each qualifier is allowed to fill.
    pub fn target(self) -> (Dimension, BoundKind) {
        match self {
            Self::Cheap => (Dimension::Price, BoundKind::Max),
            Self::Expensive => (Dimension::Price, BoundKind::Min),
            Self::LowRam => (Dimension::Ram, BoundKind::Max),
            Self::HighRam => (Dimension::Ram, BoundKind::Min),
            Self::HighStorage => (Dimension::Storage, BoundKind::Min),
            Self::HighBattery => (Dimension::Battery, BoundKind::Min),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualifierThresholds {
    pub cheap_max_price: u64,
    pub expensive_min_price: u64,
    pub low_ram_max_gb: u64,
    pub high_ram_min_gb: u64,
    pub high_storage_min_gb: u64,
    pub high_battery_min_mah: u64,
}

impl Default for QualifierThresholds {
    fn default() -> Self {
        Self {
            cheap_max_price: 5_000_000,
            expensive_min_price: 20_000_000,
            low_ram_max_gb: 8,
            high_ram_min_gb: 16,
            high_storage_min_gb: 256,
            high_battery_min_mah: 4_000,
        }
    }
}

impl QualifierThresholds {
    pub fn threshold(&self, qualifier: Qualifier) -> u64 {
        match qualifier {
            Qualifier::Cheap => self.cheap_max_price,
            Qualifier::Expensive => self.expensive_min_price,
            Qualifier::LowRam => self.low_ram_max_gb,
            Qualifier::HighRam => self.high_ram_min_gb,
            Qualifier::HighStorage => self.high_storage_min_gb,
            Qualifier::HighBattery => self.high_battery_min_mah,
        }
    }
}

/// Raw slot values for one search turn.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SlotInput {
    pub category: Option<String>,
    pub brand: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub min_ram: Option<String>,
    pub max_ram: Option<String>,
    pub min_storage: Option<String>,
    pub max_storage: Option<String>,
    pub min_battery: Option<String>,
    pub qualifiers: Vec<String>,
}

impl SlotInput {
    /// Slot names read by [`SlotInput::from_slots`], in the order they are
    /// reset after a search.
    pub const FILTER_SLOTS: &'static [&'static str] = &[
        "min_price",
        "max_price",
        "min_ram",
        "max_ram",
        "min_storage",
        "max_storage",
        "min_battery",
        "price_qualifier",
        "ram_qualifier",
        "storage_qualifier",
        "battery_qualifier",
    ];

    const QUALIFIER_SLOTS: &'static [&'static str] =
        &["price_qualifier", "ram_qualifier", "storage_qualifier", "battery_qualifier"];

    pub fn from_slots<F>(slot: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            category: slot("category"),
            brand: slot("brand"),
            min_price: slot("min_price"),
            max_price: slot("max_price"),
            min_ram: slot("min_ram"),
            max_ram: slot("max_ram"),
            min_storage: slot("min_storage"),
            max_storage: slot("max_storage"),
            min_battery: slot("min_battery"),
            qualifiers: Self::QUALIFIER_SLOTS.iter().filter_map(|name| slot(name)).collect(),
        }
    }
}

/// Fully numeric filter for one turn. Prices are VND, RAM and storage GB,
/// battery mAh.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSet {
    pub category: Option<String>,
    pub brand: Option<String>,
    pub min_price: Option<u64>,
    pub max_price: Option<u64>,
    pub min_ram: Option<u64>,
    pub max_ram: Option<u64>,
    pub min_storage: Option<u64>,
    pub max_storage: Option<u64>,
    pub min_battery: Option<u64>,
    pub order: PriceOrder,
    /// Qualifiers that actually supplied a bound.
    pub applied_qualifiers: Vec<Qualifier>,
}

impl FilterSet {
    pub fn bound(&self, dimension: Dimension, kind: BoundKind) -> Option<u64> {
        match (dimension, kind) {
            (Dimension::Price, BoundKind::Min) => self.min_price,
            (Dimension::Price, BoundKind::Max) => self.max_price,
            (Dimension::Ram, BoundKind::Min) => self.min_ram,
            (Dimension::Ram, BoundKind::Max) => self.max_ram,
            (Dimension::Storage, BoundKind::Min) => self.min_storage,
            (Dimension::Storage, BoundKind::Max) => self.max_storage,
            (Dimension::Battery, BoundKind::Min) => self.min_battery,
            (Dimension::Battery, BoundKind::Max) => None,
        }
    }

    fn bound_slot(&mut self, dimension: Dimension, kind: BoundKind) -> Option<&mut Option<u64>> {
        match (dimension, kind) {
            (Dimension::Price, BoundKind::Min) => Some(&mut self.min_price),
            (Dimension::Price, BoundKind::Max) => Some(&mut self.max_price),
            (Dimension::Ram, BoundKind::Min) => Some(&mut self.min_ram),
            (Dimension::Ram, BoundKind::Max) => Some(&mut self.max_ram),
            (Dimension::Storage, BoundKind::Min) => Some(&mut self.min_storage),
            (Dimension::Storage, BoundKind::Max) => Some(&mut self.max_storage),
            (Dimension::Battery, BoundKind::Min) => Some(&mut self.min_battery),
            (Dimension::Battery, BoundKind::Max) => None,
        }
    }

    /// Every present numeric bound, price first.
    pub fn bounds(&self) -> Vec<(Dimension, BoundKind, u64)> {
        const ORDER: [(Dimension, BoundKind); 7] = [
            (Dimension::Price, BoundKind::Min),
            (Dimension::Price, BoundKind::Max),
            (Dimension::Ram, BoundKind::Min),
            (Dimension::Ram, BoundKind::Max),
            (Dimension::Storage, BoundKind::Min),
            (Dimension::Storage, BoundKind::Max),
            (Dimension::Battery, BoundKind::Min),
        ];
        ORDER
            .iter()
            .filter_map(|(dimension, kind)| {
                self.bound(*dimension, *kind).map(|value| (*dimension, *kind, value))
            })
            .collect()
    }

    pub fn has_numeric_bound(&self) -> bool {
        !self.bounds().is_empty()
    }

    /// Nothing to search on: running a query now would scan the whole catalog.
    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.brand.is_none() && !self.has_numeric_bound()
    }
}

#[derive(Clone, Debug, Default)]
pub struct FilterResolver {
    thresholds: QualifierThresholds,
}

impl FilterResolver {
    pub fn new(thresholds: QualifierThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &QualifierThresholds {
        &self.thresholds
    }

    pub fn resolve(&self, input: &SlotInput) -> FilterSet {
        let mut filters = FilterSet {
            category: non_blank(input.category.as_deref()),
            brand: non_blank(input.brand.as_deref()),
            min_price: input.min_price.as_deref().and_then(parse_price),
            max_price: input.max_price.as_deref().and_then(parse_price),
            min_ram: input.min_ram.as_deref().and_then(extract_number),
            max_ram: input.max_ram.as_deref().and_then(extract_number),
            min_storage: input.min_storage.as_deref().and_then(parse_storage_gb),
            max_storage: input.max_storage.as_deref().and_then(parse_storage_gb),
            min_battery: input.min_battery.as_deref().and_then(extract_number),
            order: PriceOrder::Ascending,
            applied_qualifiers: Vec::new(),
        };

        let qualifiers = input.qualifiers.iter().filter_map(|tag| Qualifier::parse(tag));
        for qualifier in qualifiers {
            if qualifier == Qualifier::Expensive {
                filters.order = PriceOrder::Descending;
            }
            self.apply_default(&mut filters, qualifier);
        }

        filters
    }

    /// The one place qualifier precedence is decided: a default only fills a
    /// bound the user left empty.
    fn apply_default(&self, filters: &mut FilterSet, qualifier: Qualifier) {
        let (dimension, kind) = qualifier.target();
        let threshold = self.thresholds.threshold(qualifier);
        if let Some(slot) = filters.bound_slot(dimension, kind) {
            if slot.is_none() {
                *slot = Some(threshold);
                filters.applied_qualifiers.push(qualifier);
            }
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|value| !value.is_empty()).map(str::to_string)
}

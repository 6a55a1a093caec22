use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::product::CategoryId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromotionValue {
    /// Percent off, 0..=100.
    Percent(u8),
    /// Fixed amount off in VND.
    Amount(i64),
}

impl PromotionValue {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Percent(_) => "percent",
            Self::Amount(_) => "amount",
        }
    }

    pub fn amount(&self) -> i64 {
        match self {
            Self::Percent(percent) => i64::from(*percent),
            Self::Amount(amount) => *amount,
        }
    }

    pub fn from_parts(kind: &str, value: i64) -> Option<Self> {
        match kind {
            "percent" => u8::try_from(value.clamp(0, 100)).ok().map(Self::Percent),
            "amount" => Some(Self::Amount(value.max(0))),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Promotion {
    pub id: String,
    pub title: String,
    pub value: PromotionValue,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub is_active: bool,
    /// Empty means storewide.
    pub category_ids: Vec<CategoryId>,
}

impl Promotion {
    /// Active and inside its window, both ends inclusive.
    pub fn is_running(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.starts_at <= now && now <= self.ends_at
    }

    pub fn applies_to(&self, category: Option<&CategoryId>) -> bool {
        match category {
            Some(category) => self.category_ids.is_empty() || self.category_ids.contains(category),
            None => true,
        }
    }
}

use serde::{Deserialize, Serialize};

use crate::domain::product::ProductId;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLine {
    pub variant_color: String,
    pub stock: u32,
}

/// Per-product stock, keyed by the variant/color label the warehouse uses.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    pub product_id: ProductId,
    pub lines: Vec<StockLine>,
}

impl Inventory {
    pub fn total_stock(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.stock)).sum()
    }

    pub fn find_line(&self, variant_query: &str) -> Option<&StockLine> {
        let wanted = variant_query.trim().to_lowercase();
        self.lines.iter().find(|line| line.variant_color.to_lowercase().contains(&wanted))
    }

    pub fn available_lines(&self) -> impl Iterator<Item = &StockLine> {
        self.lines.iter().filter(|line| line.stock > 0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarrantyPolicy {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
}

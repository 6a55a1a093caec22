use crate::domain::store::{Inventory, StockLine};

/// What a stock lookup found, before it is worded for the customer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StockReply {
    NoInventory,
    VariantInStock { label: String, stock: u32 },
    VariantSoldOut { label: String },
    VariantMissing { query: String },
    Available { total: u64, lines: Vec<StockLine> },
    AllSoldOut,
}

impl StockReply {
    pub fn assess(inventory: Option<&Inventory>, variant: Option<&str>) -> Self {
        let Some(inventory) = inventory.filter(|inventory| !inventory.lines.is_empty()) else {
            return Self::NoInventory;
        };

        if let Some(query) = variant.map(str::trim).filter(|query| !query.is_empty()) {
            return match inventory.find_line(query) {
                Some(line) if line.stock > 0 => {
                    Self::VariantInStock { label: line.variant_color.clone(), stock: line.stock }
                }
                Some(line) => Self::VariantSoldOut { label: line.variant_color.clone() },
                None => Self::VariantMissing { query: query.to_string() },
            };
        }

        let lines: Vec<StockLine> = inventory.available_lines().cloned().collect();
        if lines.is_empty() {
            Self::AllSoldOut
        } else {
            Self::Available { total: inventory.total_stock(), lines }
        }
    }

    pub fn message(&self, product_name: &str) -> String {
        match self {
            Self::NoInventory => format!(
                "Rất tiếc, sản phẩm '{product_name}' hiện đã hết hàng hoặc chưa được nhập kho."
            ),
            Self::VariantInStock { label, stock } => format!(
                "Tin vui! ✅ Sản phẩm '{product_name}' phiên bản '{label}' vẫn còn {stock} sản phẩm trong kho ạ."
            ),
            Self::VariantSoldOut { label } => format!(
                "Rất tiếc! ❌ Sản phẩm '{product_name}' phiên bản '{label}' đã tạm hết hàng."
            ),
            Self::VariantMissing { query } => format!(
                "Xin lỗi, tôi không tìm thấy phiên bản '{query}' cho sản phẩm '{product_name}'."
            ),
            Self::Available { total, lines } => {
                let listed: Vec<String> = lines
                    .iter()
                    .map(|line| format!("- {} (còn {} sản phẩm)", line.variant_color, line.stock))
                    .collect();
                format!(
                    "Dạ, sản phẩm '{product_name}' vẫn còn hàng ạ. Tổng cộng còn {total} sản phẩm với các phiên bản sau:\n{}",
                    listed.join("\n")
                )
            }
            Self::AllSoldOut => format!(
                "Rất tiếc! ❌ Sản phẩm '{product_name}' hiện đã tạm hết hàng ở tất cả các phiên bản."
            ),
        }
    }
}

pub fn render_stock(product_name: &str, inventory: Option<&Inventory>, variant: Option<&str>) -> String {
    StockReply::assess(inventory, variant).message(product_name)
}

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

use crate::domain::promotion::{Promotion, PromotionValue};
use crate::render::{escape_html, format_vnd, RenderError, ReplyFormat, ReplyRenderer};

pub const ALL_PRODUCTS_TITLE: &str = "Tất Cả Sản Phẩm";

/// Promotion dates are shown in Vietnam local time (UTC+7).
const SHOP_OFFSET_SECS: i32 = 7 * 3600;

#[derive(Serialize)]
struct PromotionView {
    title: String,
    ends_on: String,
    value: String,
}

#[derive(Serialize)]
struct PromotionListView {
    title: String,
    promotions: Vec<PromotionView>,
}

pub fn no_promotions_message(title: &str) -> String {
    format!("Hiện tại chưa có khuyến mãi nào cho {title} ạ.")
}

/// `dd/mm` in shop local time.
pub fn day_month(timestamp: DateTime<Utc>) -> String {
    match FixedOffset::east_opt(SHOP_OFFSET_SECS) {
        Some(offset) => timestamp.with_timezone(&offset).format("%d/%m").to_string(),
        None => timestamp.format("%d/%m").to_string(),
    }
}

pub fn value_label(value: PromotionValue) -> String {
    match value {
        PromotionValue::Percent(percent) => format!("{percent}%"),
        PromotionValue::Amount(amount) => format_vnd(amount),
    }
}

impl ReplyRenderer {
    /// `promotions` are already filtered to the running ones.
    pub fn render_promotions(&self, title: &str, promotions: &[Promotion]) -> Result<String, RenderError> {
        if promotions.is_empty() {
            return Ok(no_promotions_message(title));
        }

        match self.format() {
            ReplyFormat::Html => {
                let promotions = promotions
                    .iter()
                    .map(|promotion| PromotionView {
                        title: escape_html(&promotion.title),
                        ends_on: day_month(promotion.ends_at),
                        value: escape_html(&value_label(promotion.value)),
                    })
                    .collect();
                self.render_html(
                    "promotions.html.tera",
                    &PromotionListView { title: escape_html(title), promotions },
                )
            }
            ReplyFormat::Text => {
                let mut lines = vec![format!("Khuyến Mãi: {title}")];
                lines.extend(promotions.iter().map(|promotion| {
                    format!(
                        "- {} | Hạn đến: {} | Giảm {}",
                        promotion.title,
                        day_month(promotion.ends_at),
                        value_label(promotion.value)
                    )
                }));
                Ok(lines.join("\n"))
            }
        }
    }
}

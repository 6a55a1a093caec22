use serde::Serialize;

use crate::domain::product::VariantRecord;
use crate::render::{
    escape_html, final_price, format_vnd, RenderError, ReplyFormat, ReplyRenderer,
    NOT_AVAILABLE, NO_RESULTS_MESSAGE, RESULTS_HEADING,
};

#[derive(Clone, Debug, PartialEq, Serialize)]
struct VariantCard {
    display_name: String,
    image_url: String,
    price: i64,
    final_price: i64,
    discount: u8,
    ram: String,
    storage: String,
    battery: String,
    sold_count: u64,
    rating: String,
    product_url: String,
}

#[derive(Serialize)]
struct VariantListView<'a> {
    heading: &'a str,
    cards: Vec<VariantCard>,
}

impl ReplyRenderer {
    /// One card per record, in the order given. An empty slice renders the
    /// fixed "no matching product" message.
    pub fn render_variants(&self, records: &[VariantRecord]) -> Result<String, RenderError> {
        if records.is_empty() {
            return Ok(NO_RESULTS_MESSAGE.to_string());
        }

        let cards: Vec<VariantCard> = records.iter().map(|record| self.card(record)).collect();
        match self.format() {
            ReplyFormat::Html => {
                let cards = cards.into_iter().map(escape_card).collect();
                self.render_html(
                    "variants.html.tera",
                    &VariantListView { heading: RESULTS_HEADING, cards },
                )
            }
            ReplyFormat::Text => Ok(render_cards_text(&cards)),
        }
    }

    fn card(&self, record: &VariantRecord) -> VariantCard {
        let discount = record.discount.min(100);
        VariantCard {
            display_name: display_name(record),
            image_url: record
                .images
                .iter()
                .find(|url| !url.trim().is_empty())
                .cloned()
                .unwrap_or_else(|| self.settings().placeholder_image.clone()),
            price: record.price,
            final_price: final_price(record.price, discount),
            discount,
            ram: or_not_available(record.memory.ram.as_deref()),
            storage: or_not_available(record.memory.storage.as_deref()),
            battery: or_not_available(record.battery.as_deref()),
            sold_count: record.sold_count,
            rating: format_rating(record.average_rating),
            product_url: self.settings().product_url(&record.product_id.0),
        }
    }
}

/// `"Galaxy A55 (8 GB/128 GB)"`, or just the product name when the variant
/// has no memory spec at all.
fn display_name(record: &VariantRecord) -> String {
    let ram = record.memory.ram.as_deref().unwrap_or_default().trim();
    let storage = record.memory.storage.as_deref().unwrap_or_default().trim();
    if ram.is_empty() && storage.is_empty() {
        record.product_name.clone()
    } else {
        format!("{} ({ram}/{storage})", record.product_name)
    }
}

fn or_not_available(value: Option<&str>) -> String {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(NOT_AVAILABLE)
        .to_string()
}

fn format_rating(rating: f64) -> String {
    if rating.is_finite() {
        let rounded = (rating * 10.0).round() / 10.0;
        format!("{rounded}")
    } else {
        "0".to_string()
    }
}

fn escape_card(card: VariantCard) -> VariantCard {
    VariantCard {
        display_name: escape_html(&card.display_name),
        image_url: escape_html(&card.image_url),
        ram: escape_html(&card.ram),
        storage: escape_html(&card.storage),
        battery: escape_html(&card.battery),
        product_url: escape_html(&card.product_url),
        ..card
    }
}

fn render_cards_text(cards: &[VariantCard]) -> String {
    let mut lines = vec![RESULTS_HEADING.to_string()];
    for (index, card) in cards.iter().enumerate() {
        lines.push(format!("{}. {}", index + 1, card.display_name));
        if card.discount > 0 {
            lines.push(format!(
                "   Giá: {} (giá gốc {}, -{}%)",
                format_vnd(card.final_price),
                format_vnd(card.price),
                card.discount
            ));
        } else {
            lines.push(format!("   Giá: {}", format_vnd(card.final_price)));
        }
        lines.push(format!(
            "   RAM {} | ROM {} | Pin {} | Đã bán: {} | ⭐ {}",
            card.ram, card.storage, card.battery, card.sold_count, card.rating
        ));
        lines.push(format!("   Xem chi tiết: {}", card.product_url));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use crate::domain::product::{Memory, ProductId, VariantId, VariantRecord};
    use crate::render::{
        RenderSettings, ReplyFormat, ReplyRenderer, NO_RESULTS_MESSAGE, RESULTS_HEADING,
    };

    fn record(discount: u8) -> VariantRecord {
        VariantRecord {
            variant_id: VariantId("v-1".to_string()),
            product_id: ProductId("p-1".to_string()),
            product_name: "Galaxy A55".to_string(),
            variant_name: None,
            price: 10_000_000,
            discount,
            memory: Memory { ram: Some("8 GB".to_string()), storage: Some("128 GB".to_string()) },
            battery: Some("5000 mAh".to_string()),
            images: vec!["https://cdn.example/a55.png".to_string()],
            sold_count: 42,
            average_rating: 4.5,
        }
    }

    fn renderer(format: ReplyFormat) -> ReplyRenderer {
        ReplyRenderer::new(RenderSettings { format, ..RenderSettings::default() })
            .expect("templates compile")
    }

    #[test]
    fn zero_records_render_the_no_result_message() {
        let reply = renderer(ReplyFormat::Html).render_variants(&[]).expect("render");

        assert_eq!(reply, NO_RESULTS_MESSAGE);
    }

    #[test]
    fn discounted_card_shows_final_and_struck_original_price() {
        let reply = renderer(ReplyFormat::Html).render_variants(&[record(20)]).expect("render");

        assert!(reply.contains(RESULTS_HEADING));
        assert!(reply.contains("8.000.000 VNĐ"));
        assert!(reply.contains("text-decoration:line-through;\">10.000.000 VNĐ</span>"));
        assert!(reply.contains("-20%"));
        assert!(reply.contains("Galaxy A55 (8 GB/128 GB)"));
        assert!(reply.contains("href=\"http://localhost:5173/product/p-1\""));
        assert!(reply.contains("Xem chi tiết"));
        assert!(!reply.contains('\n'));
    }

    #[test]
    fn undiscounted_card_has_no_strike_through() {
        let reply = renderer(ReplyFormat::Html).render_variants(&[record(0)]).expect("render");

        assert!(reply.contains("10.000.000 VNĐ"));
        assert!(!reply.contains("line-through"));
        assert!(!reply.contains("-0%"));
    }

    #[test]
    fn missing_values_fall_back_to_placeholder_and_na() {
        let mut bare = record(0);
        bare.images.clear();
        bare.memory.storage = None;
        bare.battery = Some("  ".to_string());

        let reply = renderer(ReplyFormat::Html).render_variants(&[bare]).expect("render");

        assert!(reply.contains("src=\"https://via.placeholder.com/90\""));
        assert!(reply.contains("ROM N/A"));
        assert!(reply.contains("Pin N/A"));
        assert!(reply.contains("RAM 8 GB"));
    }

    #[test]
    fn markup_in_names_is_escaped() {
        let mut hostile = record(0);
        hostile.product_name = "<script>alert(1)</script>".to_string();

        let reply = renderer(ReplyFormat::Html).render_variants(&[hostile]).expect("render");

        assert!(!reply.contains("<script>"));
        assert!(reply.contains("&lt;script&gt;"));
    }

    #[test]
    fn text_format_lists_each_record() {
        let reply = renderer(ReplyFormat::Text)
            .render_variants(&[record(20), record(0)])
            .expect("render");

        let lines: Vec<&str> = reply.lines().collect();
        assert_eq!(lines[0], RESULTS_HEADING);
        assert_eq!(lines[1], "1. Galaxy A55 (8 GB/128 GB)");
        assert_eq!(lines[2], "   Giá: 8.000.000 VNĐ (giá gốc 10.000.000 VNĐ, -20%)");
        assert_eq!(lines[3], "   RAM 8 GB | ROM 128 GB | Pin 5000 mAh | Đã bán: 42 | ⭐ 4.5");
        assert_eq!(lines[6], "   Giá: 10.000.000 VNĐ");
        assert!(!reply.contains('<'));
    }
}

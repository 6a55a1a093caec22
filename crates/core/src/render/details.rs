use serde::Serialize;

use crate::domain::product::{Product, Variant};
use crate::domain::specs::{SpecEntry, SpecGroup};
use crate::render::listings::{non_blank, or_not_available};
use crate::render::{escape_html, final_price, format_vnd, RenderError, ReplyFormat, ReplyRenderer};

pub const NO_DESCRIPTION: &str = "Chưa có mô tả";

/// A product with the names and variants its detail card shows.
#[derive(Clone, Copy, Debug)]
pub struct ProductDetail<'a> {
    pub product: &'a Product,
    pub brand: Option<&'a str>,
    pub variants: &'a [Variant],
}

#[derive(Serialize)]
struct VariantDetailView {
    name: String,
    image_url: String,
    price: i64,
    final_price: i64,
    colors: String,
    ram: String,
    storage: String,
}

#[derive(Serialize)]
struct ProductInfoView {
    name: String,
    brand: String,
    discount: u8,
    view_count: u64,
    sold_count: u64,
    description: String,
    variant_count: usize,
    variants: Vec<VariantDetailView>,
    product_url: String,
}

#[derive(Serialize)]
struct SpecRowView {
    label: String,
    value: String,
}

#[derive(Serialize)]
struct SpecGroupView {
    title: String,
    rows: Vec<SpecRowView>,
}

#[derive(Serialize)]
struct SpecSheetView {
    product: String,
    groups: Vec<SpecGroupView>,
}

fn color_names(variant: &Variant) -> String {
    let names: Vec<&str> = variant
        .colors
        .iter()
        .map(|color| color.color_name.trim())
        .filter(|name| !name.is_empty())
        .collect();
    if names.is_empty() {
        or_not_available(None)
    } else {
        names.join(", ")
    }
}

fn variant_label(product: &Product, variant: &Variant) -> String {
    non_blank(variant.name.as_deref()).unwrap_or(&product.name).to_string()
}

impl ReplyRenderer {
    /// Product card followed by one line per variant. Callers handle the
    /// no-variant case before rendering.
    pub fn render_product_info(&self, detail: ProductDetail<'_>) -> Result<String, RenderError> {
        let product = detail.product;
        let discount = product.discount.min(100);
        let description =
            non_blank(product.description.as_deref()).unwrap_or(NO_DESCRIPTION).to_string();

        match self.format() {
            ReplyFormat::Html => {
                let variants = detail
                    .variants
                    .iter()
                    .map(|variant| VariantDetailView {
                        name: escape_html(&variant_label(product, variant)),
                        image_url: escape_html(
                            variant
                                .colors
                                .iter()
                                .flat_map(|color| color.images.iter())
                                .find(|url| !url.trim().is_empty())
                                .unwrap_or(&self.settings().placeholder_image),
                        ),
                        price: variant.price,
                        final_price: final_price(variant.price, discount),
                        colors: escape_html(&color_names(variant)),
                        ram: escape_html(&or_not_available(variant.memory.ram.as_deref())),
                        storage: escape_html(&or_not_available(variant.memory.storage.as_deref())),
                    })
                    .collect();
                self.render_html(
                    "product_info.html.tera",
                    &ProductInfoView {
                        name: escape_html(&product.name),
                        brand: escape_html(&or_not_available(detail.brand)),
                        discount,
                        view_count: product.view_count,
                        sold_count: product.sold_count,
                        description: escape_html(&description),
                        variant_count: detail.variants.len(),
                        variants,
                        product_url: escape_html(&self.settings().product_url(&product.id.0)),
                    },
                )
            }
            ReplyFormat::Text => {
                let mut lines = vec![
                    product.name.clone(),
                    format!("Thương hiệu: {}", or_not_available(detail.brand)),
                    format!("Giảm giá: {discount}%"),
                    format!("Lượt xem: {}", product.view_count),
                    format!("Lượt bán: {}", product.sold_count),
                    format!("Mô tả: {description}"),
                    format!(
                        "Có tổng cộng {} biến thể cho sản phẩm này:",
                        detail.variants.len()
                    ),
                ];
                for variant in detail.variants {
                    lines.push(format!(
                        "- {}: {} | Màu: {} | RAM: {} | Bộ nhớ trong: {}",
                        variant_label(product, variant),
                        format_vnd(final_price(variant.price, discount)),
                        color_names(variant),
                        or_not_available(variant.memory.ram.as_deref()),
                        or_not_available(variant.memory.storage.as_deref()),
                    ));
                }
                Ok(lines.join("\n"))
            }
        }
    }

    /// Answer to "what is the <topic> of <product>". `entries` is non-empty.
    pub fn render_spec_answer(&self, topic: &str, product_name: &str, entries: &[SpecEntry]) -> String {
        match self.format() {
            ReplyFormat::Html => {
                let items: String = entries
                    .iter()
                    .map(|entry| {
                        format!(
                            "<li style=\"margin-bottom:5px;\"><strong>{}:</strong> {}</li>",
                            escape_html(&entry.label),
                            escape_html(&entry.value)
                        )
                    })
                    .collect();
                format!(
                    "<span>Thông số <b>{}</b> của <b>{}</b>:</span><ul style=\"list-style-type:disc;padding-left:20px;margin-top:5px;\">{items}</ul>",
                    escape_html(topic),
                    escape_html(product_name)
                )
            }
            ReplyFormat::Text => {
                let mut lines = vec![format!("Thông số {topic} của {product_name}:")];
                lines.extend(entries.iter().map(|entry| format!("- {}: {}", entry.label, entry.value)));
                lines.join("\n")
            }
        }
    }

    pub fn render_spec_sheet(&self, product_name: &str, groups: &[SpecGroup]) -> Result<String, RenderError> {
        match self.format() {
            ReplyFormat::Html => {
                let groups = groups
                    .iter()
                    .map(|group| SpecGroupView {
                        title: escape_html(group.title),
                        rows: group
                            .entries
                            .iter()
                            .map(|entry| SpecRowView {
                                label: escape_html(&entry.label),
                                value: escape_html(&entry.value),
                            })
                            .collect(),
                    })
                    .collect();
                self.render_html(
                    "spec_sheet.html.tera",
                    &SpecSheetView { product: escape_html(product_name), groups },
                )
            }
            ReplyFormat::Text => {
                let mut lines = vec![format!("Thông số kỹ thuật {product_name}")];
                for group in groups {
                    lines.push(format!("{}:", group.title));
                    lines.extend(
                        group.entries.iter().map(|entry| format!("- {}: {}", entry.label, entry.value)),
                    );
                }
                Ok(lines.join("\n"))
            }
        }
    }
}

/// Listed price per variant, plus the discounted price when the product has
/// a discount. Plain text in both reply formats.
pub fn render_price_list(product: &Product, variants: &[Variant]) -> String {
    let discount = product.discount.min(100);
    let mut lines = vec![format!("Thông tin giá cho {}:", product.name)];
    for variant in variants {
        let memory = format!(
            "{} / {}",
            or_not_available(variant.memory.ram.as_deref()),
            or_not_available(variant.memory.storage.as_deref())
        );
        if discount > 0 {
            lines.push(format!(
                "- {memory}: {} (giảm {discount}%, còn {})",
                format_vnd(variant.price),
                format_vnd(final_price(variant.price, discount))
            ));
        } else {
            lines.push(format!("- {memory}: {}", format_vnd(variant.price)));
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{render_price_list, ProductDetail, NO_DESCRIPTION};
    use crate::domain::product::{ColorOption, Memory, Product, ProductId, Variant, VariantId};
    use crate::domain::specs::{spec_sheet, SpecEntry};
    use crate::render::{RenderSettings, ReplyFormat, ReplyRenderer};

    fn renderer(format: ReplyFormat) -> ReplyRenderer {
        ReplyRenderer::new(RenderSettings { format, ..RenderSettings::default() })
            .expect("templates compile")
    }

    fn product(discount: u8, description: Option<&str>) -> Product {
        Product {
            id: ProductId("p-a55".to_string()),
            name: "Galaxy A55".to_string(),
            description: description.map(str::to_string),
            category_id: None,
            brand_id: None,
            discount,
            variant_ids: vec![],
            attributes: BTreeMap::from([("screen_size".to_string(), "6.6 inch".to_string())]),
            sold_count: 12,
            view_count: 340,
            average_rating: 4.5,
        }
    }

    fn variants() -> Vec<Variant> {
        vec![Variant {
            id: VariantId("v-1".to_string()),
            product_id: ProductId("p-a55".to_string()),
            name: Some("8GB/128GB".to_string()),
            price: 10_000_000,
            memory: Memory { ram: Some("8 GB".to_string()), storage: Some("128 GB".to_string()) },
            colors: vec![
                ColorOption { color_name: "Xanh".to_string(), images: vec![] },
                ColorOption {
                    color_name: "Tím <Lilac>".to_string(),
                    images: vec!["https://cdn.example/a55-tim.png".to_string()],
                },
            ],
        }]
    }

    #[test]
    fn text_info_lists_card_fields_and_variants() {
        let product = product(10, None);
        let variants = variants();
        let reply = renderer(ReplyFormat::Text)
            .render_product_info(ProductDetail { product: &product, brand: Some("Samsung"), variants: &variants })
            .expect("render");

        assert!(reply.starts_with("Galaxy A55\nThương hiệu: Samsung\nGiảm giá: 10%"), "{reply}");
        assert!(reply.contains(&format!("Mô tả: {NO_DESCRIPTION}")));
        assert!(reply.contains("Có tổng cộng 1 biến thể"));
        assert!(reply.contains("- 8GB/128GB: 9.000.000 VNĐ | Màu: Xanh, Tím <Lilac> | RAM: 8 GB"));
    }

    #[test]
    fn html_info_escapes_values_and_uses_first_image() {
        let product = product(0, Some("Pin <trâu>"));
        let variants = variants();
        let reply = renderer(ReplyFormat::Html)
            .render_product_info(ProductDetail { product: &product, brand: None, variants: &variants })
            .expect("render");

        assert!(reply.contains("Pin &lt;trâu&gt;"));
        assert!(reply.contains("Tím &lt;Lilac&gt;"));
        assert!(reply.contains("https://cdn.example/a55-tim.png"));
        assert!(!reply.contains('\n'));
    }

    #[test]
    fn price_list_shows_discount_when_present() {
        assert_eq!(
            render_price_list(&product(0, None), &variants()),
            "Thông tin giá cho Galaxy A55:\n- 8 GB / 128 GB: 10.000.000 VNĐ"
        );
        assert!(render_price_list(&product(20, None), &variants())
            .ends_with("10.000.000 VNĐ (giảm 20%, còn 8.000.000 VNĐ)"));
    }

    #[test]
    fn spec_answer_and_sheet_in_both_formats() {
        let entries =
            vec![SpecEntry { label: "Screen Size".to_string(), value: "6.6 inch".to_string() }];

        assert_eq!(
            renderer(ReplyFormat::Text).render_spec_answer("màn hình", "Galaxy A55", &entries),
            "Thông số màn hình của Galaxy A55:\n- Screen Size: 6.6 inch"
        );
        assert!(renderer(ReplyFormat::Html)
            .render_spec_answer("màn hình", "Galaxy A55", &entries)
            .contains("<strong>Screen Size:</strong> 6.6 inch"));

        let groups = spec_sheet(&product(0, None).attributes);
        let sheet = renderer(ReplyFormat::Text).render_spec_sheet("Galaxy A55", &groups).expect("render");
        assert_eq!(sheet, "Thông số kỹ thuật Galaxy A55\nMàn hình:\n- Screen Size: 6.6 inch");
        let html = renderer(ReplyFormat::Html).render_spec_sheet("Galaxy A55", &groups).expect("render");
        assert!(html.contains("Màn hình") && html.contains("6.6 inch"));
    }
}

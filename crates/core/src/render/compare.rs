use std::collections::BTreeSet;

use serde::Serialize;

use crate::domain::product::{Category, Product};
use crate::domain::specs::readable_key;
use crate::render::{escape_html, format_vnd, RenderError, ReplyFormat, ReplyRenderer};

pub const MISSING_VALUE: &str = "—";
pub const CROSS_CATEGORY_NOTE: &str =
    "* Hai sản phẩm thuộc danh mục khác nhau nên chỉ so sánh thông tin cơ bản";

/// One side of a comparison, priced by its first variant.
#[derive(Clone, Copy, Debug)]
pub struct ComparedProduct<'a> {
    pub product: &'a Product,
    pub category: Option<&'a Category>,
    pub brand: Option<&'a str>,
    pub price: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ComparisonRow {
    pub label: String,
    pub values: [String; 2],
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Comparison {
    pub title: String,
    pub names: [String; 2],
    pub rows: Vec<ComparisonRow>,
    pub note: Option<&'static str>,
}

fn text_or_missing(value: Option<&str>) -> String {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(MISSING_VALUE)
        .to_string()
}

fn price_or_missing(price: Option<i64>) -> String {
    price.map(format_vnd).unwrap_or_else(|| MISSING_VALUE.to_string())
}

impl Comparison {
    /// Products in the same category are compared attribute by attribute over
    /// the union of their keys. Otherwise only category, brand and price.
    pub fn build(left: ComparedProduct<'_>, right: ComparedProduct<'_>) -> Self {
        let names = [left.product.name.clone(), right.product.name.clone()];
        let shared_category = match (left.category, right.category) {
            (Some(a), Some(b)) if a.id == b.id => Some(a),
            _ => None,
        };

        let Some(category) = shared_category else {
            return Self {
                title: "So sánh sản phẩm".to_string(),
                names,
                rows: vec![
                    ComparisonRow {
                        label: "Danh mục".to_string(),
                        values: [
                            text_or_missing(left.category.map(|category| category.name.as_str())),
                            text_or_missing(right.category.map(|category| category.name.as_str())),
                        ],
                    },
                    ComparisonRow {
                        label: "Thương hiệu".to_string(),
                        values: [text_or_missing(left.brand), text_or_missing(right.brand)],
                    },
                    ComparisonRow {
                        label: "Giá bán".to_string(),
                        values: [price_or_missing(left.price), price_or_missing(right.price)],
                    },
                ],
                note: Some(CROSS_CATEGORY_NOTE),
            };
        };

        let mut rows = vec![
            ComparisonRow {
                label: "Giá bán".to_string(),
                values: [price_or_missing(left.price), price_or_missing(right.price)],
            },
            ComparisonRow {
                label: "Thương hiệu".to_string(),
                values: [text_or_missing(left.brand), text_or_missing(right.brand)],
            },
        ];
        let keys: BTreeSet<&String> =
            left.product.attributes.keys().chain(right.product.attributes.keys()).collect();
        rows.extend(keys.into_iter().map(|key| ComparisonRow {
            label: readable_key(key),
            values: [
                text_or_missing(left.product.attributes.get(key).map(String::as_str)),
                text_or_missing(right.product.attributes.get(key).map(String::as_str)),
            ],
        }));

        Self { title: format!("So sánh chi tiết - {}", category.name), names, rows, note: None }
    }
}

#[derive(Serialize)]
struct ComparisonView {
    title: String,
    names: [String; 2],
    rows: Vec<ComparisonRow>,
    note: Option<&'static str>,
}

impl ReplyRenderer {
    pub fn render_comparison(&self, comparison: &Comparison) -> Result<String, RenderError> {
        match self.format() {
            ReplyFormat::Html => {
                let escape_pair =
                    |pair: &[String; 2]| [escape_html(&pair[0]), escape_html(&pair[1])];
                self.render_html(
                    "compare.html.tera",
                    &ComparisonView {
                        title: escape_html(&comparison.title),
                        names: escape_pair(&comparison.names),
                        rows: comparison
                            .rows
                            .iter()
                            .map(|row| ComparisonRow {
                                label: escape_html(&row.label),
                                values: escape_pair(&row.values),
                            })
                            .collect(),
                        note: comparison.note,
                    },
                )
            }
            ReplyFormat::Text => {
                let mut lines = vec![
                    comparison.title.clone(),
                    format!("{} vs {}", comparison.names[0], comparison.names[1]),
                ];
                lines.extend(comparison.rows.iter().map(|row| {
                    format!("- {}: {} | {}", row.label, row.values[0], row.values[1])
                }));
                if let Some(note) = comparison.note {
                    lines.push(note.to_string());
                }
                Ok(lines.join("\n"))
            }
        }
    }
}

//! Reply rendering. Every function here is pure: it takes records that were
//! already fetched and returns the message text, HTML or plain depending on
//! the configured [`ReplyFormat`].

pub mod compare;
pub mod currency;
pub mod details;
pub mod listings;
pub mod products;
pub mod promotions;
pub mod stock;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tera::{Context, Tera};
use thiserror::Error;

use crate::config::AppConfig;

pub use compare::{ComparedProduct, Comparison};
pub use currency::{final_price, format_vnd};
pub use details::{render_price_list, ProductDetail};
pub use stock::{render_stock, StockReply};

pub const NO_RESULTS_MESSAGE: &str =
    "Rất tiếc, không có sản phẩm nào phù hợp với yêu cầu của bạn";
pub const RESULTS_HEADING: &str = "Dưới đây là một số sản phẩm phù hợp với nhu cầu của bạn";
pub const NOT_AVAILABLE: &str = "N/A";

const TEMPLATES: [(&str, &str); 11] = [
    ("variants.html.tera", include_str!("../../../../templates/replies/variants.html.tera")),
    ("categories.html.tera", include_str!("../../../../templates/replies/categories.html.tera")),
    ("brands.html.tera", include_str!("../../../../templates/replies/brands.html.tera")),
    ("brand_info.html.tera", include_str!("../../../../templates/replies/brand_info.html.tera")),
    ("branches.html.tera", include_str!("../../../../templates/replies/branches.html.tera")),
    ("warranties.html.tera", include_str!("../../../../templates/replies/warranties.html.tera")),
    ("product_info.html.tera", include_str!("../../../../templates/replies/product_info.html.tera")),
    ("spec_sheet.html.tera", include_str!("../../../../templates/replies/spec_sheet.html.tera")),
    ("compare.html.tera", include_str!("../../../../templates/replies/compare.html.tera")),
    ("promotions.html.tera", include_str!("../../../../templates/replies/promotions.html.tera")),
    ("handoff.html.tera", include_str!("../../../../templates/replies/handoff.html.tera")),
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyFormat {
    #[default]
    Html,
    Text,
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template error: {0}")]
    Template(#[from] tera::Error),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderSettings {
    pub product_url_base: String,
    pub placeholder_image: String,
    pub support_hotline: String,
    pub support_email: String,
    pub format: ReplyFormat,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for RenderSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            product_url_base: config.storefront.product_url_base.clone(),
            placeholder_image: config.storefront.placeholder_image.clone(),
            support_hotline: config.storefront.support_hotline.clone(),
            support_email: config.storefront.support_email.clone(),
            format: config.search.reply_format,
        }
    }
}

impl RenderSettings {
    /// Storefront link for a product. The base may or may not end with `/`.
    pub fn product_url(&self, product_id: &str) -> String {
        format!("{}/{}", self.product_url_base.trim_end_matches('/'), product_id)
    }
}

/// Register the custom filters reply templates use.
///
/// - `vnd`: integer amount to `8.000.000 VNĐ`
pub fn register_template_filters(tera: &mut Tera) {
    tera.register_filter("vnd", tera_vnd_filter);
}

fn tera_vnd_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let amount = match value {
        tera::Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|float| float.round() as i64))
            .ok_or_else(|| tera::Error::msg("vnd filter expects an integer amount"))?,
        other => return Err(tera::Error::msg(format!("vnd filter expects a number, got {other}"))),
    };
    Ok(tera::Value::String(format_vnd(amount)))
}

#[derive(Debug)]
pub struct ReplyRenderer {
    tera: Tera,
    settings: RenderSettings,
}

impl ReplyRenderer {
    pub fn new(settings: RenderSettings) -> Result<Self, RenderError> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        register_template_filters(&mut tera);
        tera.add_raw_templates(TEMPLATES.to_vec())?;
        Ok(Self { tera, settings })
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn format(&self) -> ReplyFormat {
        self.settings.format
    }

    fn render_html<T: Serialize>(&self, template: &str, view: &T) -> Result<String, RenderError> {
        let context = Context::from_serialize(view)?;
        let html = self.tera.render(template, &context)?;
        Ok(collapse_whitespace(&html))
    }
}

/// Values are escaped before they reach the templates, which run with
/// autoescape off so URLs keep their slashes.
pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Chat widgets render newlines literally, so the HTML goes out on one line.
pub fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::{collapse_whitespace, escape_html, RenderSettings};

    #[test]
    fn escape_html_covers_markup_characters() {
        assert_eq!(
            escape_html(r#"<b>"Tai nghe" & 'Loa'</b>"#),
            "&lt;b&gt;&quot;Tai nghe&quot; &amp; &#x27;Loa&#x27;&lt;/b&gt;"
        );
        assert_eq!(escape_html("https://cdn.example/a.png"), "https://cdn.example/a.png");
    }

    #[test]
    fn collapse_whitespace_joins_lines() {
        assert_eq!(collapse_whitespace("  <div>\n   <p>a</p>\n</div> "), "<div> <p>a</p> </div>");
    }

    #[test]
    fn product_url_tolerates_trailing_slash() {
        let with_slash = RenderSettings::default();
        let without_slash = RenderSettings {
            product_url_base: "https://shop.example/product".to_string(),
            ..RenderSettings::default()
        };

        assert_eq!(with_slash.product_url("p-1"), "http://localhost:5173/product/p-1");
        assert_eq!(without_slash.product_url("p-1"), "https://shop.example/product/p-1");
    }
}

use serde::Serialize;

use crate::domain::product::{Brand, BrandSummary, Category};
use crate::domain::store::{Branch, WarrantyPolicy};
use crate::render::{escape_html, format_vnd, RenderError, ReplyFormat, ReplyRenderer, NOT_AVAILABLE};

pub const NO_CATEGORIES_MESSAGE: &str = "Hiện tại shop chưa có danh mục sản phẩm nào.";
pub const NO_BRANDS_MESSAGE: &str = "Hiện tại shop chưa có nhãn hiệu nào.";
pub const NO_BRANCHES_MESSAGE: &str = "Xin lỗi! Hiện chưa có bất kỳ chi nhánh nào.";
pub const NO_WARRANTIES_MESSAGE: &str = "Chưa có bất kỳ chính sách bảo hành nào.";
pub const FOLLOW_UP_MESSAGE: &str = "Nếu muốn biết thêm thông tin chi tiết, đừng ngại hỏi nhé!";
pub const HANDOFF_INTRO: &str = "Dạ, em đã ghi nhận yêu cầu. Hiện tại các bạn nhân viên đang bận, anh/chị vui lòng liên hệ qua:";
pub const HANDOFF_VISIT: &str = "Ghé trực tiếp cửa hàng gần nhất.";
pub const HANDOFF_APOLOGY: &str = "Em xin lỗi vì sự bất tiện này ạ!";

const SAMPLE_NAME_LIMIT: usize = 30;

#[derive(Serialize)]
struct CategoryView {
    name: String,
    description: Option<String>,
}

#[derive(Serialize)]
struct BrandView {
    name: String,
    initial: String,
    description: Option<String>,
    logo_url: Option<String>,
}

impl BrandView {
    fn from_brand(brand: &Brand) -> Self {
        Self {
            name: escape_html(&brand.name),
            initial: brand.name.chars().next().map(|ch| ch.to_uppercase().collect()).unwrap_or_default(),
            description: non_blank(brand.description.as_deref()).map(escape_html),
            logo_url: non_blank(brand.logo_url.as_deref()).map(escape_html),
        }
    }
}

#[derive(Serialize)]
struct SampleView {
    name: String,
    price: Option<i64>,
}

#[derive(Serialize)]
struct BrandInfoView {
    brand: BrandView,
    product_count: u64,
    samples: Vec<SampleView>,
}

#[derive(Serialize)]
struct BranchView {
    name: String,
    phone: String,
    email: String,
    address: String,
}

#[derive(Serialize)]
struct PolicyView {
    name: String,
    description: String,
}

#[derive(Serialize)]
struct HandoffView {
    intro: &'static str,
    hotline: String,
    hotline_dial: String,
    email: String,
    visit: &'static str,
    apology: &'static str,
}

#[derive(Serialize)]
struct CategoryListView {
    categories: Vec<CategoryView>,
}

#[derive(Serialize)]
struct BrandListView {
    brands: Vec<BrandView>,
}

#[derive(Serialize)]
struct BranchListView {
    branches: Vec<BranchView>,
    closing: &'static str,
}

#[derive(Serialize)]
struct PolicyListView {
    policies: Vec<PolicyView>,
    closing: &'static str,
}

impl ReplyRenderer {
    pub fn render_categories(&self, categories: &[Category]) -> Result<String, RenderError> {
        if categories.is_empty() {
            return Ok(NO_CATEGORIES_MESSAGE.to_string());
        }

        match self.format() {
            ReplyFormat::Html => {
                let categories = categories
                    .iter()
                    .map(|category| CategoryView {
                        name: escape_html(&category.name),
                        description: non_blank(category.description.as_deref()).map(escape_html),
                    })
                    .collect();
                self.render_html("categories.html.tera", &CategoryListView { categories })
            }
            ReplyFormat::Text => {
                let mut lines = vec!["Danh mục sản phẩm".to_string()];
                lines.extend(categories.iter().map(|category| {
                    match non_blank(category.description.as_deref()) {
                        Some(description) => format!("- {}: {description}", category.name),
                        None => format!("- {}", category.name),
                    }
                }));
                lines.push(format!("Tổng {} danh mục", categories.len()));
                Ok(lines.join("\n"))
            }
        }
    }

    pub fn render_brands(&self, brands: &[Brand]) -> Result<String, RenderError> {
        if brands.is_empty() {
            return Ok(NO_BRANDS_MESSAGE.to_string());
        }

        match self.format() {
            ReplyFormat::Html => {
                let brands = brands.iter().map(BrandView::from_brand).collect();
                self.render_html("brands.html.tera", &BrandListView { brands })
            }
            ReplyFormat::Text => {
                let mut lines = vec!["Nhãn hiệu".to_string()];
                lines.extend(brands.iter().map(|brand| format!("- {}", brand.name)));
                lines.push(format!("Tổng {} nhãn hiệu", brands.len()));
                Ok(lines.join("\n"))
            }
        }
    }

    pub fn render_brand_info(&self, summary: &BrandSummary) -> Result<String, RenderError> {
        match self.format() {
            ReplyFormat::Html => {
                let samples = summary
                    .samples
                    .iter()
                    .map(|sample| SampleView {
                        name: escape_html(&shorten(&sample.name, SAMPLE_NAME_LIMIT)),
                        price: sample.price.filter(|price| *price > 0),
                    })
                    .collect();
                self.render_html(
                    "brand_info.html.tera",
                    &BrandInfoView {
                        brand: BrandView::from_brand(&summary.brand),
                        product_count: summary.product_count,
                        samples,
                    },
                )
            }
            ReplyFormat::Text => {
                let mut lines = vec![format!(
                    "{}: {} sản phẩm",
                    summary.brand.name, summary.product_count
                )];
                if let Some(description) = non_blank(summary.brand.description.as_deref()) {
                    lines.push(description.to_string());
                }
                if !summary.samples.is_empty() {
                    lines.push("Sản phẩm nổi bật:".to_string());
                    for sample in &summary.samples {
                        let name = shorten(&sample.name, SAMPLE_NAME_LIMIT);
                        match sample.price.filter(|price| *price > 0) {
                            Some(price) => lines.push(format!("- {name}: {}", format_vnd(price))),
                            None => lines.push(format!("- {name}")),
                        }
                    }
                }
                Ok(lines.join("\n"))
            }
        }
    }

    pub fn render_branches(&self, branches: &[Branch]) -> Result<String, RenderError> {
        if branches.is_empty() {
            return Ok(NO_BRANCHES_MESSAGE.to_string());
        }

        match self.format() {
            ReplyFormat::Html => {
                let branches = branches
                    .iter()
                    .map(|branch| BranchView {
                        name: escape_html(&branch.name),
                        phone: escape_html(&or_not_available(branch.phone.as_deref())),
                        email: escape_html(&or_not_available(branch.email.as_deref())),
                        address: escape_html(&or_not_available(branch.address.as_deref())),
                    })
                    .collect();
                self.render_html(
                    "branches.html.tera",
                    &BranchListView { branches, closing: FOLLOW_UP_MESSAGE },
                )
            }
            ReplyFormat::Text => {
                let mut lines = vec!["Hiện tại, hệ thống có các chi nhánh như sau:".to_string()];
                for branch in branches {
                    lines.push(format!(
                        "- {} | SĐT: {} | Email: {} | Địa chỉ: {}",
                        branch.name,
                        or_not_available(branch.phone.as_deref()),
                        or_not_available(branch.email.as_deref()),
                        or_not_available(branch.address.as_deref()),
                    ));
                }
                lines.push(FOLLOW_UP_MESSAGE.to_string());
                Ok(lines.join("\n"))
            }
        }
    }

    pub fn render_warranties(&self, policies: &[WarrantyPolicy]) -> Result<String, RenderError> {
        if policies.is_empty() {
            return Ok(NO_WARRANTIES_MESSAGE.to_string());
        }

        match self.format() {
            ReplyFormat::Html => {
                let policies = policies
                    .iter()
                    .map(|policy| PolicyView {
                        name: escape_html(&policy.name),
                        description: escape_html(&or_not_available(policy.description.as_deref())),
                    })
                    .collect();
                self.render_html(
                    "warranties.html.tera",
                    &PolicyListView { policies, closing: FOLLOW_UP_MESSAGE },
                )
            }
            ReplyFormat::Text => {
                let mut lines = vec!["Hiện tại có các chính sách bảo hành như sau:".to_string()];
                for policy in policies {
                    lines.push(format!(
                        "- {}: {}",
                        policy.name,
                        or_not_available(policy.description.as_deref())
                    ));
                }
                lines.push(FOLLOW_UP_MESSAGE.to_string());
                Ok(lines.join("\n"))
            }
        }
    }

    /// Support contacts for a shopper who asked for a person.
    pub fn render_handoff(&self) -> Result<String, RenderError> {
        let hotline = self.settings().support_hotline.trim();
        let email = self.settings().support_email.trim();

        match self.format() {
            ReplyFormat::Html => self.render_html(
                "handoff.html.tera",
                &HandoffView {
                    intro: HANDOFF_INTRO,
                    hotline: escape_html(hotline),
                    hotline_dial: hotline.chars().filter(|ch| ch.is_ascii_digit() || *ch == '+').collect(),
                    email: escape_html(email),
                    visit: HANDOFF_VISIT,
                    apology: HANDOFF_APOLOGY,
                },
            ),
            ReplyFormat::Text => Ok([
                HANDOFF_INTRO.to_string(),
                format!("- Hotline: {hotline}"),
                format!("- Email: {email}"),
                format!("- {HANDOFF_VISIT}"),
                HANDOFF_APOLOGY.to_string(),
            ]
            .join("\n")),
        }
    }
}

pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

pub(crate) fn or_not_available(value: Option<&str>) -> String {
    non_blank(value).unwrap_or(NOT_AVAILABLE).to_string()
}

/// Cuts long product names to `limit` characters, ellipsis included.
fn shorten(name: &str, limit: usize) -> String {
    if name.chars().count() <= limit {
        return name.to_string();
    }
    let kept: String = name.chars().take(limit.saturating_sub(3)).collect();
    format!("{kept}...")
}

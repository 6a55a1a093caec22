//! Keyword lookup over the free-form attribute map.
//!
//! Attribute keys are whatever the admin typed (`batteryCapacity`,
//! `screen_size`, `Camera sau`), so a question like "pin" or "màn hình" is
//! answered by matching keywords against the keys rather than by fixed names.

use crate::domain::product::Variant;

const TOPIC_KEYWORDS: [(&str, &[&str]); 12] = [
    ("pin", &["battery", "mah", "sac", "charging", "capacity"]),
    ("ram", &["ram", "memory"]),
    ("bộ nhớ", &["storage", "rom", "capacity", "gb", "memory"]),
    ("camera", &["camera", "cam", "resolution", "megapixels", "mp"]),
    ("màn hình", &["screen", "display", "oled", "lcd", "inch", "resolution"]),
    ("cpu", &["cpu", "processor", "chip", "core", "ghz"]),
    ("chip", &["cpu", "processor", "chip"]),
    ("gpu", &["gpu", "graphics", "video"]),
    ("hệ điều hành", &["os", "android", "ios", "operating", "system"]),
    ("kích thước", &["size", "dimension", "width", "height", "depth"]),
    ("trọng lượng", &["weight", "mass", "kg", "gram"]),
    ("kết nối", &["wifi", "bluetooth", "gps", "nfc", "sim", "cellular", "5g"]),
];

const SHEET_GROUPS: [(&str, &[&str]); 8] = [
    ("Hiệu năng", &["cpu", "processor", "chip", "ram", "memory", "gpu"]),
    ("Lưu trữ", &["storage", "rom", "ssd", "hdd"]),
    ("Màn hình", &["screen", "display", "resolution", "inch", "oled", "lcd"]),
    ("Camera", &["camera", "cam", "megapixel", "mp", "lens"]),
    ("Pin & Sạc", &["battery", "mah", "charging", "charge"]),
    ("Kết nối", &["wifi", "bluetooth", "nfc", "sim", "5g"]),
    ("Thiết kế", &["size", "dimension", "weight", "color", "material"]),
    ("Hệ điều hành", &["os", "android", "ios", "operating"]),
];

pub const OTHER_GROUP: &str = "Thông tin khác";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpecEntry {
    pub label: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpecGroup {
    pub title: &'static str,
    pub entries: Vec<SpecEntry>,
}

/// Keywords for a spec question. Unknown topics search for themselves.
pub fn topic_keywords(topic: &str) -> Vec<String> {
    let topic = topic.trim().to_lowercase();
    TOPIC_KEYWORDS
        .iter()
        .find(|(name, _)| *name == topic)
        .map(|(_, keywords)| keywords.iter().map(|keyword| keyword.to_string()).collect())
        .unwrap_or_else(|| vec![topic])
}

fn key_matches(key: &str, keywords: &[impl AsRef<str>]) -> bool {
    let key = key.to_lowercase();
    keywords.iter().any(|keyword| key.contains(keyword.as_ref()))
}

/// Attributes whose key contains one of `keywords`, in the order given.
/// Blank values are skipped.
pub fn matching_entries<'a>(
    attributes: impl IntoIterator<Item = (&'a String, &'a String)>,
    keywords: &[String],
) -> Vec<SpecEntry> {
    attributes
        .into_iter()
        .filter(|(key, value)| !value.trim().is_empty() && key_matches(key, keywords))
        .map(|(key, value)| SpecEntry { label: readable_key(key), value: value.trim().to_string() })
        .collect()
}

/// The spec fields a variant carries on its own.
pub fn variant_attributes(variant: &Variant) -> Vec<(String, String)> {
    [("ram", variant.memory.ram.as_deref()), ("storage", variant.memory.storage.as_deref())]
        .into_iter()
        .filter_map(|(key, value)| {
            value.filter(|value| !value.trim().is_empty()).map(|value| (key.to_string(), value.to_string()))
        })
        .collect()
}

/// Every attribute sorted into the first group whose keywords match its key.
/// Unmatched attributes land in [`OTHER_GROUP`]; empty groups are dropped.
pub fn spec_sheet<'a>(attributes: impl IntoIterator<Item = (&'a String, &'a String)>) -> Vec<SpecGroup> {
    let mut groups: Vec<SpecGroup> = SHEET_GROUPS
        .iter()
        .map(|(title, _)| SpecGroup { title, entries: Vec::new() })
        .chain(std::iter::once(SpecGroup { title: OTHER_GROUP, entries: Vec::new() }))
        .collect();

    for (key, value) in attributes {
        if value.trim().is_empty() {
            continue;
        }
        let index = SHEET_GROUPS
            .iter()
            .position(|(_, keywords)| key_matches(key, keywords))
            .unwrap_or(SHEET_GROUPS.len());
        groups[index]
            .entries
            .push(SpecEntry { label: readable_key(key), value: value.trim().to_string() });
    }

    groups.retain(|group| !group.entries.is_empty());
    groups
}

/// `screen_size` → `Screen Size`, `batteryCapacity` → `Battery Capacity`.
pub fn readable_key(key: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut previous_lower = false;

    for ch in key.chars() {
        if ch == '_' || ch == '-' || ch.is_whitespace() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            previous_lower = false;
            continue;
        }
        if ch.is_uppercase() && previous_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        previous_lower = ch.is_lowercase();
        current.push(ch);
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
        .iter()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{matching_entries, readable_key, spec_sheet, topic_keywords, SpecEntry, OTHER_GROUP};

    fn attributes() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("batteryCapacity".to_string(), "5000 mAh".to_string()),
            ("screen_size".to_string(), "6.6 inch".to_string()),
            ("chipset".to_string(), "Exynos 1480".to_string()),
            ("origin".to_string(), "Việt Nam".to_string()),
            ("camera_rear".to_string(), " ".to_string()),
        ])
    }

    #[test]
    fn known_topics_expand_and_unknown_topics_search_themselves() {
        assert!(topic_keywords(" Màn Hình ").contains(&"display".to_string()));
        assert_eq!(topic_keywords("Sạc nhanh"), vec!["sạc nhanh".to_string()]);
    }

    #[test]
    fn entries_match_keywords_against_keys() {
        let attributes = attributes();

        assert_eq!(
            matching_entries(&attributes, &topic_keywords("pin")),
            vec![SpecEntry { label: "Battery Capacity".to_string(), value: "5000 mAh".to_string() }]
        );
        assert!(matching_entries(&attributes, &topic_keywords("camera")).is_empty());
    }

    #[test]
    fn sheet_groups_in_fixed_order_with_leftovers_last() {
        let sheet = spec_sheet(&attributes());
        let titles: Vec<&str> = sheet.iter().map(|group| group.title).collect();

        assert_eq!(titles, vec!["Hiệu năng", "Màn hình", "Pin & Sạc", OTHER_GROUP]);
        assert_eq!(sheet[3].entries[0].label, "Origin");
    }

    #[test]
    fn readable_key_splits_snake_and_camel_case() {
        assert_eq!(readable_key("screen_size"), "Screen Size");
        assert_eq!(readable_key("batteryCapacity"), "Battery Capacity");
        assert_eq!(readable_key("Camera sau"), "Camera Sau");
        assert_eq!(readable_key("RAM"), "RAM");
    }
}

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use techshop_core::config::{AppConfig, LoadOptions, DEFAULT_CONFIG_FILES};
use toml::Value;

/// One effective setting: dotted key, rendered value and the env var that can override it.
struct Setting {
    key: &'static str,
    value: String,
    env_key: &'static str,
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for setting in settings(&config) {
        let source =
            field_source(&setting, config_file_doc.as_ref(), config_file_path.as_deref());
        lines.push(format!("- {} = {} (source: {source})", setting.key, setting.value));
    }

    lines.join("\n")
}

fn settings(config: &AppConfig) -> Vec<Setting> {
    let thresholds = &config.search.thresholds;
    let setting = |key, value: String, env_key| Setting { key, value, env_key };

    vec![
        setting("database.url", config.database.url.clone(), "TECHSHOP_DATABASE_URL"),
        setting(
            "database.max_connections",
            config.database.max_connections.to_string(),
            "TECHSHOP_DATABASE_MAX_CONNECTIONS",
        ),
        setting(
            "database.timeout_secs",
            config.database.timeout_secs.to_string(),
            "TECHSHOP_DATABASE_TIMEOUT_SECS",
        ),
        setting(
            "server.bind_address",
            config.server.bind_address.clone(),
            "TECHSHOP_SERVER_BIND_ADDRESS",
        ),
        setting("server.port", config.server.port.to_string(), "TECHSHOP_SERVER_PORT"),
        setting(
            "server.graceful_shutdown_secs",
            config.server.graceful_shutdown_secs.to_string(),
            "TECHSHOP_SERVER_GRACEFUL_SHUTDOWN_SECS",
        ),
        setting("backend.base_url", config.backend.base_url.clone(), "TECHSHOP_BACKEND_BASE_URL"),
        setting(
            "backend.timeout_secs",
            config.backend.timeout_secs.to_string(),
            "TECHSHOP_BACKEND_TIMEOUT_SECS",
        ),
        setting(
            "storefront.product_url_base",
            config.storefront.product_url_base.clone(),
            "TECHSHOP_STOREFRONT_PRODUCT_URL_BASE",
        ),
        setting(
            "storefront.placeholder_image",
            config.storefront.placeholder_image.clone(),
            "TECHSHOP_STOREFRONT_PLACEHOLDER_IMAGE",
        ),
        setting(
            "storefront.support_hotline",
            config.storefront.support_hotline.clone(),
            "TECHSHOP_STOREFRONT_SUPPORT_HOTLINE",
        ),
        setting(
            "storefront.support_email",
            config.storefront.support_email.clone(),
            "TECHSHOP_STOREFRONT_SUPPORT_EMAIL",
        ),
        setting(
            "search.cheap_max_price",
            thresholds.cheap_max_price.to_string(),
            "TECHSHOP_SEARCH_CHEAP_MAX_PRICE",
        ),
        setting(
            "search.expensive_min_price",
            thresholds.expensive_min_price.to_string(),
            "TECHSHOP_SEARCH_EXPENSIVE_MIN_PRICE",
        ),
        setting(
            "search.low_ram_max_gb",
            thresholds.low_ram_max_gb.to_string(),
            "TECHSHOP_SEARCH_LOW_RAM_MAX_GB",
        ),
        setting(
            "search.high_ram_min_gb",
            thresholds.high_ram_min_gb.to_string(),
            "TECHSHOP_SEARCH_HIGH_RAM_MIN_GB",
        ),
        setting(
            "search.high_storage_min_gb",
            thresholds.high_storage_min_gb.to_string(),
            "TECHSHOP_SEARCH_HIGH_STORAGE_MIN_GB",
        ),
        setting(
            "search.high_battery_min_mah",
            thresholds.high_battery_min_mah.to_string(),
            "TECHSHOP_SEARCH_HIGH_BATTERY_MIN_MAH",
        ),
        setting(
            "search.result_limit",
            config.search.result_limit.to_string(),
            "TECHSHOP_SEARCH_RESULT_LIMIT",
        ),
        setting(
            "search.unparsed_spec",
            config.search.unparsed_spec.as_str().to_string(),
            "TECHSHOP_SEARCH_UNPARSED_SPEC",
        ),
        setting(
            "search.reply_format",
            format!("{:?}", config.search.reply_format).to_ascii_lowercase(),
            "TECHSHOP_SEARCH_REPLY_FORMAT",
        ),
        setting("logging.level", config.logging.level.clone(), "TECHSHOP_LOGGING_LEVEL"),
        setting(
            "logging.format",
            format!("{:?}", config.logging.format).to_ascii_lowercase(),
            "TECHSHOP_LOGGING_FORMAT",
        ),
    ]
}

fn detect_config_path() -> Option<PathBuf> {
    DEFAULT_CONFIG_FILES.iter().map(PathBuf::from).find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let raw = fs::read_to_string(path?).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    setting: &Setting,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if env::var_os(setting.env_key).is_some() {
        return format!("env ({})", setting.env_key);
    }

    match (config_file_doc, config_file_path) {
        (Some(doc), Some(path)) if contains_path(doc, setting.key) => {
            format!("file ({})", path.display())
        }
        _ => "default".to_string(),
    }
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    key_path
        .split('.')
        .try_fold(root, |current, key| current.get(key))
        .is_some()
}

#[cfg(test)]
mod tests {
    use toml::Value;

    use super::{contains_path, settings};
    use techshop_core::config::AppConfig;

    #[test]
    fn contains_path_walks_nested_tables() {
        let doc: Value = "[search]\ncheap_max_price = 4000000\n".parse().expect("toml");

        assert!(contains_path(&doc, "search.cheap_max_price"));
        assert!(!contains_path(&doc, "search.result_limit"));
        assert!(!contains_path(&doc, "backend.base_url"));
    }

    #[test]
    fn every_setting_has_a_distinct_env_key() {
        let listed = settings(&AppConfig::default());
        let mut env_keys = listed.iter().map(|setting| setting.env_key).collect::<Vec<_>>();
        env_keys.sort_unstable();
        env_keys.dedup();

        assert_eq!(env_keys.len(), listed.len());
        assert!(listed.iter().all(|setting| setting.env_key.starts_with("TECHSHOP_")));
    }

    #[test]
    fn defaults_render_lowercase_enums() {
        let listed = settings(&AppConfig::default());
        let value_of = |key: &str| {
            listed.iter().find(|setting| setting.key == key).map(|setting| setting.value.clone())
        };

        assert_eq!(value_of("search.reply_format").as_deref(), Some("html"));
        assert_eq!(value_of("search.unparsed_spec").as_deref(), Some("exclude"));
        assert_eq!(value_of("logging.format").as_deref(), Some("compact"));
    }
}

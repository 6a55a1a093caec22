use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::render::ReplyFormat;
use crate::search::{QualifierThresholds, UnparsedSpec};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub backend: BackendConfig,
    pub storefront: StorefrontConfig,
    pub search: SearchConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

/// REST backend that owns carts and orders.
#[derive(Clone, Debug)]
pub struct BackendConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

/// Customer-facing web shop the reply cards link to.
#[derive(Clone, Debug)]
pub struct StorefrontConfig {
    pub product_url_base: String,
    pub placeholder_image: String,
    /// Contacts offered when the shopper asks for a human.
    pub support_hotline: String,
    pub support_email: String,
}

#[derive(Clone, Debug)]
pub struct SearchConfig {
    pub thresholds: QualifierThresholds,
    pub result_limit: usize,
    pub unparsed_spec: UnparsedSpec,
    pub reply_format: ReplyFormat,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub backend_base_url: Option<String>,
    pub result_limit: Option<usize>,
    pub unparsed_spec: Option<UnparsedSpec>,
    pub reply_format: Option<ReplyFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

pub const DEFAULT_CONFIG_FILES: [&str; 2] = ["techshop.toml", "config/techshop.toml"];

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://techshop.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 5055,
                graceful_shutdown_secs: 15,
            },
            backend: BackendConfig {
                base_url: "http://localhost:8080/api/v1".to_string(),
                timeout_secs: 10,
            },
            storefront: StorefrontConfig {
                product_url_base: "http://localhost:5173/product/".to_string(),
                placeholder_image: "https://via.placeholder.com/90".to_string(),
                support_hotline: "1900 1234".to_string(),
                support_email: "support@techshop.com".to_string(),
            },
            search: SearchConfig {
                thresholds: QualifierThresholds::default(),
                result_limit: 10,
                unparsed_spec: UnparsedSpec::Exclude,
                reply_format: ReplyFormat::Html,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

fn parse_reply_format(key: &str, value: &str) -> Result<ReplyFormat, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "html" => Ok(ReplyFormat::Html),
        "text" => Ok(ReplyFormat::Text),
        _ => Err(invalid_env(key, value)),
    }
}

fn parse_unparsed_spec(key: &str, value: &str) -> Result<UnparsedSpec, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "exclude" => Ok(UnparsedSpec::Exclude),
        "include" => Ok(UnparsedSpec::Include),
        "treat_as_zero" => Ok(UnparsedSpec::TreatAsZero),
        _ => Err(invalid_env(key, value)),
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILES[0]));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(backend) = patch.backend {
            if let Some(base_url) = backend.base_url {
                self.backend.base_url = base_url;
            }
            if let Some(timeout_secs) = backend.timeout_secs {
                self.backend.timeout_secs = timeout_secs;
            }
        }

        if let Some(storefront) = patch.storefront {
            if let Some(product_url_base) = storefront.product_url_base {
                self.storefront.product_url_base = product_url_base;
            }
            if let Some(placeholder_image) = storefront.placeholder_image {
                self.storefront.placeholder_image = placeholder_image;
            }
            if let Some(support_hotline) = storefront.support_hotline {
                self.storefront.support_hotline = support_hotline;
            }
            if let Some(support_email) = storefront.support_email {
                self.storefront.support_email = support_email;
            }
        }

        if let Some(search) = patch.search {
            let thresholds = &mut self.search.thresholds;
            if let Some(value) = search.cheap_max_price {
                thresholds.cheap_max_price = value;
            }
            if let Some(value) = search.expensive_min_price {
                thresholds.expensive_min_price = value;
            }
            if let Some(value) = search.low_ram_max_gb {
                thresholds.low_ram_max_gb = value;
            }
            if let Some(value) = search.high_ram_min_gb {
                thresholds.high_ram_min_gb = value;
            }
            if let Some(value) = search.high_storage_min_gb {
                thresholds.high_storage_min_gb = value;
            }
            if let Some(value) = search.high_battery_min_mah {
                thresholds.high_battery_min_mah = value;
            }
            if let Some(result_limit) = search.result_limit {
                self.search.result_limit = result_limit;
            }
            if let Some(unparsed_spec) = search.unparsed_spec {
                self.search.unparsed_spec = unparsed_spec;
            }
            if let Some(reply_format) = search.reply_format {
                self.search.reply_format = reply_format;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("TECHSHOP_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("TECHSHOP_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_u32("TECHSHOP_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("TECHSHOP_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("TECHSHOP_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("TECHSHOP_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("TECHSHOP_SERVER_PORT") {
            self.server.port = parse_u16("TECHSHOP_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("TECHSHOP_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("TECHSHOP_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        if let Some(value) = read_env("TECHSHOP_BACKEND_BASE_URL") {
            self.backend.base_url = value;
        }
        if let Some(value) = read_env("TECHSHOP_BACKEND_TIMEOUT_SECS") {
            self.backend.timeout_secs = parse_u64("TECHSHOP_BACKEND_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("TECHSHOP_STOREFRONT_PRODUCT_URL_BASE") {
            self.storefront.product_url_base = value;
        }
        if let Some(value) = read_env("TECHSHOP_STOREFRONT_PLACEHOLDER_IMAGE") {
            self.storefront.placeholder_image = value;
        }
        if let Some(value) = read_env("TECHSHOP_STOREFRONT_SUPPORT_HOTLINE") {
            self.storefront.support_hotline = value;
        }
        if let Some(value) = read_env("TECHSHOP_STOREFRONT_SUPPORT_EMAIL") {
            self.storefront.support_email = value;
        }

        let thresholds = &mut self.search.thresholds;
        let threshold_vars: [(&str, &mut u64); 6] = [
            ("TECHSHOP_SEARCH_CHEAP_MAX_PRICE", &mut thresholds.cheap_max_price),
            ("TECHSHOP_SEARCH_EXPENSIVE_MIN_PRICE", &mut thresholds.expensive_min_price),
            ("TECHSHOP_SEARCH_LOW_RAM_MAX_GB", &mut thresholds.low_ram_max_gb),
            ("TECHSHOP_SEARCH_HIGH_RAM_MIN_GB", &mut thresholds.high_ram_min_gb),
            ("TECHSHOP_SEARCH_HIGH_STORAGE_MIN_GB", &mut thresholds.high_storage_min_gb),
            ("TECHSHOP_SEARCH_HIGH_BATTERY_MIN_MAH", &mut thresholds.high_battery_min_mah),
        ];
        for (key, target) in threshold_vars {
            if let Some(value) = read_env(key) {
                *target = parse_u64(key, &value)?;
            }
        }
        if let Some(value) = read_env("TECHSHOP_SEARCH_RESULT_LIMIT") {
            self.search.result_limit = parse_usize("TECHSHOP_SEARCH_RESULT_LIMIT", &value)?;
        }
        if let Some(value) = read_env("TECHSHOP_SEARCH_UNPARSED_SPEC") {
            self.search.unparsed_spec =
                parse_unparsed_spec("TECHSHOP_SEARCH_UNPARSED_SPEC", &value)?;
        }
        if let Some(value) = read_env("TECHSHOP_SEARCH_REPLY_FORMAT") {
            self.search.reply_format = parse_reply_format("TECHSHOP_SEARCH_REPLY_FORMAT", &value)?;
        }

        let log_level =
            read_env("TECHSHOP_LOGGING_LEVEL").or_else(|| read_env("TECHSHOP_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("TECHSHOP_LOGGING_FORMAT").or_else(|| read_env("TECHSHOP_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(bind_address) = overrides.bind_address {
            self.server.bind_address = bind_address;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(base_url) = overrides.backend_base_url {
            self.backend.base_url = base_url;
        }
        if let Some(result_limit) = overrides.result_limit {
            self.search.result_limit = result_limit;
        }
        if let Some(unparsed_spec) = overrides.unparsed_spec {
            self.search.unparsed_spec = unparsed_spec;
        }
        if let Some(reply_format) = overrides.reply_format {
            self.search.reply_format = reply_format;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_server(&self.server)?;
        validate_backend(&self.backend)?;
        validate_storefront(&self.storefront)?;
        validate_search(&self.search)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    DEFAULT_CONFIG_FILES.iter().map(PathBuf::from).find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_backend(backend: &BackendConfig) -> Result<(), ConfigError> {
    if !is_http_url(&backend.base_url) {
        return Err(ConfigError::Validation(
            "backend.base_url must start with http:// or https://".to_string(),
        ));
    }

    if backend.timeout_secs == 0 || backend.timeout_secs > 120 {
        return Err(ConfigError::Validation(
            "backend.timeout_secs must be in range 1..=120".to_string(),
        ));
    }

    Ok(())
}

fn validate_storefront(storefront: &StorefrontConfig) -> Result<(), ConfigError> {
    if !is_http_url(&storefront.product_url_base) {
        return Err(ConfigError::Validation(
            "storefront.product_url_base must start with http:// or https://".to_string(),
        ));
    }

    if storefront.placeholder_image.trim().is_empty() {
        return Err(ConfigError::Validation(
            "storefront.placeholder_image must not be empty".to_string(),
        ));
    }

    if storefront.support_hotline.trim().is_empty() {
        return Err(ConfigError::Validation(
            "storefront.support_hotline must not be empty".to_string(),
        ));
    }

    if !storefront.support_email.contains('@') {
        return Err(ConfigError::Validation(
            "storefront.support_email must be an email address".to_string(),
        ));
    }

    Ok(())
}

fn validate_search(search: &SearchConfig) -> Result<(), ConfigError> {
    if search.result_limit == 0 || search.result_limit > 50 {
        return Err(ConfigError::Validation(
            "search.result_limit must be in range 1..=50".to_string(),
        ));
    }

    let thresholds = &search.thresholds;
    if thresholds.cheap_max_price >= thresholds.expensive_min_price {
        return Err(ConfigError::Validation(
            "search.cheap_max_price must be lower than search.expensive_min_price".to_string(),
        ));
    }

    if thresholds.low_ram_max_gb > thresholds.high_ram_min_gb {
        return Err(ConfigError::Validation(
            "search.low_ram_max_gb must not exceed search.high_ram_min_gb".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn invalid_env(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() }
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| invalid_env(key, value))
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| invalid_env(key, value))
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| invalid_env(key, value))
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| invalid_env(key, value))
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    server: Option<ServerPatch>,
    backend: Option<BackendPatch>,
    storefront: Option<StorefrontPatch>,
    search: Option<SearchPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct BackendPatch {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct StorefrontPatch {
    product_url_base: Option<String>,
    placeholder_image: Option<String>,
    support_hotline: Option<String>,
    support_email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchPatch {
    cheap_max_price: Option<u64>,
    expensive_min_price: Option<u64>,
    low_ram_max_gb: Option<u64>,
    high_ram_min_gb: Option<u64>,
    high_storage_min_gb: Option<u64>,
    high_battery_min_mah: Option<u64>,
    result_limit: Option<usize>,
    unparsed_spec: Option<UnparsedSpec>,
    reply_format: Option<ReplyFormat>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

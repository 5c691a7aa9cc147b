use std::env;
use std::path::PathBuf;

use chrono_tz::Tz;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app_name: String,
    pub environment: String,
    pub api_prefix: String,
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub rate_limit_enabled: bool,
    pub rate_limit_per_second: u64,
    pub rate_limit_burst_size: u32,
    pub data_file: PathBuf,
    pub seed_default_data: bool,
    pub timezone: Tz,
    pub currency_code: String,
    pub whatsapp_country_code: String,
    pub claim_term_label: String,
    pub forecast_base_year: i32,
    pub default_apartment_rent: f64,
    pub default_suite_rent: f64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            app_name: env_or("APP_NAME", "Campus Housing API"),
            environment: env_or("ENVIRONMENT", "development"),
            api_prefix: normalize_prefix(&env_or("API_PREFIX", "/v1")),
            host: env_or("HOST", "0.0.0.0"),
            port: env_parse_or("PORT", 8000),
            cors_origins: parse_csv(&env_or("CORS_ORIGINS", "http://localhost:3000")),
            rate_limit_enabled: env_parse_bool_or("RATE_LIMIT_ENABLED", true),
            rate_limit_per_second: env_parse_or("RATE_LIMIT_PER_SECOND", 10),
            rate_limit_burst_size: env_parse_or("RATE_LIMIT_BURST_SIZE", 100),
            data_file: PathBuf::from(env_or("DATA_FILE", "data/app-data.json")),
            seed_default_data: env_parse_bool_or("SEED_DEFAULT_DATA", true),
            timezone: parse_timezone(env_opt("TIMEZONE").as_deref()),
            currency_code: env_or("CURRENCY_CODE", "SAR").to_ascii_uppercase(),
            whatsapp_country_code: normalize_country_code(&env_or("WHATSAPP_COUNTRY_CODE", "966")),
            claim_term_label: env_or(
                "CLAIM_TERM_LABEL",
                "الفصل الدراسي الأول لعام 1447هـ",
            ),
            forecast_base_year: env_parse_or("FORECAST_BASE_YEAR", 1447),
            default_apartment_rent: env_parse_or("DEFAULT_APARTMENT_RENT", 1700.0),
            default_suite_rent: env_parse_or("DEFAULT_SUITE_RENT", 3000.0),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment.trim().eq_ignore_ascii_case("production")
    }

    /// Settings for tests and tools that never touch the process environment.
    pub fn for_data_file(data_file: PathBuf) -> Self {
        Self {
            app_name: "Campus Housing API".to_string(),
            environment: "test".to_string(),
            api_prefix: "/v1".to_string(),
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
            rate_limit_enabled: false,
            rate_limit_per_second: 10,
            rate_limit_burst_size: 100,
            data_file,
            seed_default_data: false,
            timezone: chrono_tz::Asia::Riyadh,
            currency_code: "SAR".to_string(),
            whatsapp_country_code: "966".to_string(),
            claim_term_label: "الفصل الدراسي الأول لعام 1447هـ".to_string(),
            forecast_base_year: 1447,
            default_apartment_rent: 1700.0,
            default_suite_rent: 3000.0,
        }
    }
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    env_opt(key).unwrap_or_else(|| default.to_string())
}

fn env_parse_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    env_opt(key)
        .and_then(|raw| raw.parse::<T>().ok())
        .unwrap_or(default)
}

fn env_parse_bool_or(key: &str, default: bool) -> bool {
    match env_opt(key).as_deref().map(str::to_ascii_lowercase) {
        Some(value) if value == "1" || value == "true" || value == "yes" || value == "on" => true,
        Some(value) if value == "0" || value == "false" || value == "no" || value == "off" => false,
        Some(_) => default,
        None => default,
    }
}

fn parse_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

fn parse_timezone(raw: Option<&str>) -> Tz {
    raw.and_then(|name| name.parse::<Tz>().ok())
        .unwrap_or(chrono_tz::Asia::Riyadh)
}

fn normalize_country_code(raw: &str) -> String {
    let digits = raw
        .chars()
        .filter(char::is_ascii_digit)
        .collect::<String>();
    if digits.is_empty() {
        return "966".to_string();
    }
    digits
}

fn normalize_prefix(raw: &str) -> String {
    let mut prefix = raw.trim().to_string();
    if prefix.is_empty() {
        return "/v1".to_string();
    }
    if !prefix.starts_with('/') {
        prefix.insert(0, '/');
    }
    while prefix.ends_with('/') && prefix.len() > 1 {
        prefix.pop();
    }
    prefix
}

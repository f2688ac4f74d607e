//! Storefront server configuration

/// Configuration errors, reported before anything starts
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Where transactional email goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailBackend {
    Ses,
    /// Log instead of sending
    Log,
}

pub const DEFAULT_SHIPPING_COUNTRIES: [&str; 5] = ["LT", "LV", "EE", "PL", "DE"];

#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    pub stripe_secret_key: String,
    /// Stripe webhook signing secret
    pub stripe_webhook_secret: String,
    /// Override for tests against a mock Stripe
    pub stripe_api_base: Option<String>,
    pub stripe_shipping_rate_id: Option<String>,
    pub admin_user: String,
    pub admin_password: String,
    /// Public origin used for checkout return URLs
    pub site_url: Option<String>,
    pub shipping_countries: Vec<String>,
    pub email_backend: EmailBackend,
    /// Sender address; required with the SES backend
    pub email_from: Option<String>,
    /// Operator inbox for new-order notices
    pub admin_email: Option<String>,
    pub ses_region: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`; empty values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let environment = get("ENVIRONMENT").unwrap_or_else(|| "development".into());

        let http_port = match get("HTTP_PORT") {
            None => 8080,
            Some(p) => p.parse().map_err(|_| ConfigError::Invalid {
                name: "HTTP_PORT",
                value: p,
            })?,
        };

        let email_backend = match get("EMAIL_BACKEND").as_deref() {
            None if environment == "development" => EmailBackend::Log,
            None => EmailBackend::Ses,
            Some(v) if v.eq_ignore_ascii_case("ses") => EmailBackend::Ses,
            Some(v) if v.eq_ignore_ascii_case("log") => EmailBackend::Log,
            Some(v) => {
                return Err(ConfigError::Invalid {
                    name: "EMAIL_BACKEND",
                    value: v.to_string(),
                });
            }
        };

        let email_from = get("EMAIL_FROM");
        if email_backend == EmailBackend::Ses && email_from.is_none() {
            return Err(ConfigError::Missing("EMAIL_FROM"));
        }

        let shipping_countries = match get("SHIPPING_COUNTRIES") {
            None => DEFAULT_SHIPPING_COUNTRIES.iter().map(|c| c.to_string()).collect(),
            Some(list) => parse_countries(&list)?,
        };

        Ok(Self {
            database_url: require("DATABASE_URL")?,
            http_port,
            environment,
            stripe_secret_key: require("STRIPE_SECRET_KEY")?,
            stripe_webhook_secret: require("STRIPE_WEBHOOK_SECRET")?,
            stripe_api_base: get("STRIPE_API_BASE"),
            stripe_shipping_rate_id: get("STRIPE_SHIPPING_RATE_ID"),
            admin_user: require("ADMIN_USER")?,
            admin_password: require("ADMIN_PASSWORD")?,
            site_url: get("SITE_URL").map(|s| s.trim_end_matches('/').to_string()),
            shipping_countries,
            email_backend,
            email_from,
            admin_email: get("ADMIN_EMAIL"),
            ses_region: get("SES_REGION"),
        })
    }
}

fn parse_countries(list: &str) -> Result<Vec<String>, ConfigError> {
    let countries: Vec<String> = list
        .split(',')
        .map(|c| c.trim().to_ascii_uppercase())
        .filter(|c| !c.is_empty())
        .collect();
    let valid = !countries.is_empty()
        && countries
            .iter()
            .all(|c| c.len() == 2 && c.chars().all(|ch| ch.is_ascii_alphabetic()));
    if !valid {
        return Err(ConfigError::Invalid {
            name: "SHIPPING_COUNTRIES",
            value: list.to_string(),
        });
    }
    Ok(countries)
}

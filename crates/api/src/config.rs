//! Runtime configuration resolved from environment variables (and `.env`).

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

use quotedesk_crm::DEFAULT_BASE_URL;
use quotedesk_documents::CompanyInfo;
use quotedesk_quoting::{TaxRate, TaxSelection};

/// Pipedrive access; absent when no API token is configured.
#[derive(Debug, Clone)]
pub struct PipedriveConfig {
    pub api_token: String,
    pub base_url: String,
}

/// Everything the server needs at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub catalog_path: PathBuf,
    pub quotes_dir: PathBuf,
    /// Initial tax selection for newly opened quotes.
    pub default_tax: TaxSelection,
    pub company: CompanyInfo,
    pub pipedrive: Option<PipedriveConfig>,
}

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid BIND_ADDR value: {0}")]
    BindAddr(std::net::AddrParseError),

    #[error("invalid SALES_TAX_RATE_DEFAULT value (expected a fraction like 0.0975): {0}")]
    DefaultTaxRate(String),
}

impl AppConfig {
    /// Construct the configuration by reading and validating environment
    /// variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_addr = env_or("BIND_ADDR", "0.0.0.0:8080")
            .parse()
            .map_err(ConfigError::BindAddr)?;

        let raw_tax = env_or("SALES_TAX_RATE_DEFAULT", "0");
        let fraction: f64 = raw_tax
            .parse()
            .map_err(|_| ConfigError::DefaultTaxRate(raw_tax.clone()))?;
        let rate = TaxRate::from_percent(fraction * 100.0)
            .map_err(|_| ConfigError::DefaultTaxRate(raw_tax))?;

        let pipedrive = std::env::var("PIPEDRIVE_API_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty())
            .map(|api_token| PipedriveConfig {
                api_token,
                base_url: env_or("PIPEDRIVE_BASE_URL", DEFAULT_BASE_URL),
            });

        Ok(Self {
            bind_addr,
            catalog_path: PathBuf::from(env_or("PRODUCTS_CSV", "products.csv")),
            quotes_dir: PathBuf::from(env_or("QUOTES_DIR", "Quotes")),
            default_tax: TaxSelection::Manual(rate),
            company: company_from_env(),
            pipedrive,
        })
    }
}

fn company_from_env() -> CompanyInfo {
    CompanyInfo {
        name: env_or("COMPANY_NAME", "Disc Golf Association, Inc."),
        tagline: env_or("COMPANY_TAGLINE", "FIRST IN DISC GOLF"),
        phone: env_or("COMPANY_PHONE", "(831) 722-6037"),
        fax: env_or("COMPANY_FAX", "(831) 722-8176"),
        web: env_or("COMPANY_WEB", "www.discgolf.com"),
        addr1: env_or("COMPANY_ADDR_1", "73 Hangar Way"),
        city: env_or("COMPANY_ADDR_CITY", "Watsonville"),
        state: env_or("COMPANY_ADDR_STATE", "CA"),
        zip: env_or("COMPANY_ADDR_ZIP", "95076"),
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{LazyLock, Mutex};

    // Env vars are process-global; serialize tests that touch them.
    static ENV_GUARD: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

    fn set_env(key: &str, value: &str) {
        unsafe { std::env::set_var(key, value) };
    }

    fn clear_env(key: &str) {
        unsafe { std::env::remove_var(key) };
    }

    #[test]
    fn loads_defaults() {
        let _guard = ENV_GUARD.lock().expect("env guard poisoned");
        for key in ["BIND_ADDR", "SALES_TAX_RATE_DEFAULT", "PIPEDRIVE_API_TOKEN"] {
            clear_env(key);
        }

        let config = AppConfig::from_env().expect("config should load with defaults");
        assert_eq!(config.bind_addr.to_string(), "0.0.0.0:8080");
        assert_eq!(config.default_tax, TaxSelection::Manual(TaxRate::ZERO));
        assert_eq!(config.catalog_path, PathBuf::from("products.csv"));
        assert!(config.pipedrive.is_none());
        assert_eq!(config.company.name, "Disc Golf Association, Inc.");
    }

    #[test]
    fn parses_default_tax_fraction() {
        let _guard = ENV_GUARD.lock().expect("env guard poisoned");
        set_env("SALES_TAX_RATE_DEFAULT", "0.0975");

        let config = AppConfig::from_env().expect("config should load");
        assert_eq!(
            config.default_tax,
            TaxSelection::Manual(TaxRate::from_basis_points(975))
        );

        clear_env("SALES_TAX_RATE_DEFAULT");
    }

    #[test]
    fn rejects_garbage_tax_fraction() {
        let _guard = ENV_GUARD.lock().expect("env guard poisoned");
        set_env("SALES_TAX_RATE_DEFAULT", "lots");

        let err = AppConfig::from_env().expect_err("invalid fraction should error");
        assert!(matches!(err, ConfigError::DefaultTaxRate(v) if v == "lots"));

        clear_env("SALES_TAX_RATE_DEFAULT");
    }

    #[test]
    fn blank_pipedrive_token_counts_as_unconfigured() {
        let _guard = ENV_GUARD.lock().expect("env guard poisoned");
        set_env("PIPEDRIVE_API_TOKEN", "   ");

        let config = AppConfig::from_env().expect("config should load");
        assert!(config.pipedrive.is_none());

        clear_env("PIPEDRIVE_API_TOKEN");
    }
}

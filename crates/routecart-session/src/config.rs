//! # Session Configuration
//!
//! Store identity, currency display and checkout policy.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     ROUTECART_STORE_ID=route-07                                        │
//! │     ROUTECART_ENFORCE_CREDIT_LIMIT=true                                │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/routecart/session.toml (Linux)                           │
//! │     ~/Library/Application Support/com.routecart.routecart/ (macOS)     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [store]
//! id = "route-07"
//! name = "North Route Van 7"
//!
//! [currency]
//! symbol = "$"
//! decimals = 2
//!
//! [checkout]
//! require_customer = true
//! enforce_credit_limit = false
//! default_fulfillment = "pickup"   # pickup | delivery
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use routecart_core::Money;

use crate::error::{SessionError, SessionResult};

// =============================================================================
// Store
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    pub id: String,

    /// Printed at the top of receipts.
    #[serde(default)]
    pub name: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            id: "default-store".to_string(),
            name: "RouteCart".to_string(),
        }
    }
}

// =============================================================================
// Currency
// =============================================================================

/// How amounts are displayed. Amounts themselves are always integer cents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyConfig {
    #[serde(default = "default_symbol")]
    pub symbol: String,

    /// 2 shows cents, 0 rounds to whole units.
    #[serde(default = "default_decimals")]
    pub decimals: u8,
}

fn default_symbol() -> String {
    "$".to_string()
}

fn default_decimals() -> u8 {
    2
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        CurrencyConfig {
            symbol: default_symbol(),
            decimals: default_decimals(),
        }
    }
}

impl CurrencyConfig {
    /// Formats an amount for display.
    ///
    /// ## Example
    /// ```rust
    /// use routecart_core::Money;
    /// use routecart_session::config::CurrencyConfig;
    ///
    /// let currency = CurrencyConfig::default();
    /// assert_eq!(currency.format_money(Money::from_cents(125050)), "$1250.50");
    /// assert_eq!(currency.format_money(Money::from_cents(-550)), "-$5.50");
    /// ```
    pub fn format_money(&self, amount: Money) -> String {
        let sign = if amount.is_negative() { "-" } else { "" };
        let cents = amount.cents().unsigned_abs();
        match self.decimals {
            0 => format!("{}{}{}", sign, self.symbol, (cents + 50) / 100),
            _ => format!("{}{}{}.{:02}", sign, self.symbol, cents / 100, cents % 100),
        }
    }
}

// =============================================================================
// Checkout Policy
// =============================================================================

/// Fulfillment preselected for new sales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentMode {
    #[default]
    Pickup,
    Delivery,
}

impl std::str::FromStr for FulfillmentMode {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pickup" => Ok(FulfillmentMode::Pickup),
            "delivery" => Ok(FulfillmentMode::Delivery),
            other => Err(SessionError::InvalidConfig(format!(
                "Unknown fulfillment mode: '{}'. Valid options: pickup, delivery",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSettings {
    /// Every order is billed to a customer, even when paid in cash.
    #[serde(default)]
    pub require_customer: bool,

    /// Reject credit portions above the customer's remaining credit.
    #[serde(default)]
    pub enforce_credit_limit: bool,

    #[serde(default)]
    pub default_fulfillment: FulfillmentMode,
}

// =============================================================================
// Session Configuration
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub currency: CurrencyConfig,

    #[serde(default)]
    pub checkout: CheckoutSettings,
}

impl SessionConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (session.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SessionResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading session config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = Self::from_toml_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load session config: {}. Using defaults.", e);
            Self::default()
        })
    }

    pub fn from_toml_str(contents: &str) -> SessionResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn to_toml_string(&self) -> SessionResult<String> {
        toml::to_string_pretty(self).map_err(|e| SessionError::InvalidConfig(e.to_string()))
    }

    pub fn validate(&self) -> SessionResult<()> {
        if self.store.id.trim().is_empty() {
            return Err(SessionError::InvalidConfig("store.id must not be empty".into()));
        }

        if self.currency.symbol.is_empty() {
            return Err(SessionError::InvalidConfig(
                "currency.symbol must not be empty".into(),
            ));
        }

        if !matches!(self.currency.decimals, 0 | 2) {
            return Err(SessionError::InvalidConfig(format!(
                "currency.decimals must be 0 or 2, got {}",
                self.currency.decimals
            )));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies `ROUTECART_*` overrides read through `lookup`.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(id) = lookup("ROUTECART_STORE_ID") {
            debug!(store_id = %id, "Overriding store ID from environment");
            self.store.id = id;
        }

        if let Some(name) = lookup("ROUTECART_STORE_NAME") {
            self.store.name = name;
        }

        if let Some(symbol) = lookup("ROUTECART_CURRENCY_SYMBOL") {
            self.currency.symbol = symbol;
        }

        if let Some(decimals) = lookup("ROUTECART_CURRENCY_DECIMALS") {
            match decimals.parse::<u8>() {
                Ok(d) => self.currency.decimals = d,
                Err(_) => warn!(%decimals, "Ignoring invalid ROUTECART_CURRENCY_DECIMALS"),
            }
        }

        if let Some(flag) = lookup("ROUTECART_REQUIRE_CUSTOMER") {
            match parse_flag(&flag) {
                Some(value) => self.checkout.require_customer = value,
                None => warn!(%flag, "Ignoring invalid ROUTECART_REQUIRE_CUSTOMER"),
            }
        }

        if let Some(flag) = lookup("ROUTECART_ENFORCE_CREDIT_LIMIT") {
            match parse_flag(&flag) {
                Some(value) => {
                    debug!(enforce = value, "Overriding credit limit policy from environment");
                    self.checkout.enforce_credit_limit = value;
                }
                None => warn!(%flag, "Ignoring invalid ROUTECART_ENFORCE_CREDIT_LIMIT"),
            }
        }

        if let Some(mode) = lookup("ROUTECART_DEFAULT_FULFILLMENT") {
            match mode.parse() {
                Ok(parsed) => self.checkout.default_fulfillment = parsed,
                Err(e) => warn!("{}", e),
            }
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "routecart", "routecart")
            .map(|dirs| dirs.config_dir().join("session.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn store_id(&self) -> &str {
        &self.store.id
    }

    pub fn format_money(&self, amount: Money) -> String {
        self.currency.format_money(amount)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

//! Broker configuration.

use std::time::Duration;

/// Default backend CLI program.
pub const DEFAULT_PROGRAM: &str = "op";

/// Default vault consulted for every item.
pub const DEFAULT_VAULT: &str = "Private";

/// Default item-name prefix for provider credentials.
pub const DEFAULT_PREFIX: &str = "clustrix";

/// Configuration for a [`SecretBroker`](crate::SecretBroker) and its backend.
///
/// Use the builder methods for ergonomic configuration:
///
/// ```
/// use credmux::BrokerConfig;
/// use std::time::Duration;
///
/// let config = BrokerConfig::new()
///     .with_vault("Engineering")
///     .with_account("my-team")
///     .with_fetch_timeout(Duration::from_secs(20));
///
/// assert_eq!(config.vault, "Engineering");
/// assert_eq!(config.account.as_deref(), Some("my-team"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerConfig {
    /// Backend CLI executable (default: `op`)
    pub program: String,

    /// Vault name (default: "Private")
    pub vault: String,

    /// Account shorthand passed as `--account` when set
    pub account: Option<String>,

    /// Prefix for provider item names (default: "clustrix")
    pub prefix: String,

    /// Limit for the availability probe (default: 5 seconds)
    pub probe_timeout: Duration,

    /// Limit for field and item reads (default: 10 seconds)
    pub fetch_timeout: Duration,

    /// Limit for item creation (default: 15 seconds)
    pub store_timeout: Duration,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            vault: DEFAULT_VAULT.to_string(),
            account: None,
            prefix: DEFAULT_PREFIX.to_string(),
            probe_timeout: Duration::from_secs(5),
            fetch_timeout: Duration::from_secs(10),
            store_timeout: Duration::from_secs(15),
        }
    }
}

impl BrokerConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the backend CLI executable.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Sets the vault to read from and write to.
    pub fn with_vault(mut self, vault: impl Into<String>) -> Self {
        self.vault = vault.into();
        self
    }

    /// Sets the account shorthand.
    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = Some(account.into());
        self
    }

    /// Sets the item name prefix.
    ///
    /// Provider items are named `<prefix>-<provider>-validation`; with an
    /// empty prefix the leading dash is dropped.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Sets the availability probe timeout.
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Sets the field/item read timeout.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Sets the item creation timeout.
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    /// Builds the full item name for a provider slug.
    pub fn provider_item_name(&self, slug: &str) -> String {
        if self.prefix.is_empty() {
            format!("{}-validation", slug)
        } else {
            format!("{}-{}-validation", self.prefix, slug)
        }
    }
}

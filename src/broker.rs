//! The secret broker: cached availability plus best-effort reads and writes.
//!
//! Every method here is infallible from the caller's point of view. Backend
//! errors are logged and turned into `None` (reads) or `false` (writes), so
//! checking whether a credential is configured can never fail a caller.

use crate::validation::{validate_field_name, validate_item_name};
use crate::{Backend, BrokerConfig, BrokerError, FieldMap, ItemCategory};
use tokio::sync::OnceCell;
use tracing::{debug, error, warn};

/// Broker over a single [`Backend`].
///
/// Holds the backend, its configuration, and the availability flag. The flag
/// is resolved by the first call that needs it and never re-probed during
/// the broker's lifetime. Construct one broker per session and share it by
/// reference.
pub struct SecretBroker<B> {
    backend: B,
    config: BrokerConfig,
    availability: OnceCell<bool>,
}

#[cfg(feature = "onepassword")]
impl SecretBroker<crate::backends::onepassword::OnePasswordBackend> {
    /// Creates a broker over the 1Password CLI.
    ///
    /// The program, account and timeouts given to the backend and the vault
    /// used by the broker all come from `config`.
    pub fn onepassword(config: BrokerConfig) -> Self {
        let backend = crate::backends::onepassword::OnePasswordBackend::new(&config);
        Self::new(backend, config)
    }
}

impl<B: Backend> SecretBroker<B> {
    /// Creates a broker whose availability is probed on first use.
    ///
    /// Only the vault is read from `config`; everything that shapes how the
    /// backend runs is fixed when the backend is built. Use
    /// [`SecretBroker::onepassword`] to build both from one configuration.
    pub fn new(backend: B, config: BrokerConfig) -> Self {
        Self {
            backend,
            config,
            availability: OnceCell::new(),
        }
    }

    /// Creates a broker with a known availability; no probe is ever run.
    pub fn with_availability(backend: B, config: BrokerConfig, available: bool) -> Self {
        Self {
            backend,
            config,
            availability: OnceCell::new_with(Some(available)),
        }
    }

    /// Returns the backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Returns the configuration.
    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }

    /// Reports whether the backend is installed and signed in.
    ///
    /// The first call lists accounts; later calls return the cached answer.
    /// A missing CLI, a non-zero exit and a timeout all mean "unavailable".
    pub async fn is_available(&self) -> bool {
        *self
            .availability
            .get_or_init(|| async {
                match self.backend.list_accounts().await {
                    Ok(()) => {
                        debug!(backend = self.backend.name(), "Secret backend available");
                        true
                    }
                    Err(e) => {
                        debug!(
                            backend = self.backend.name(),
                            error = %e,
                            "Secret backend unavailable"
                        );
                        false
                    }
                }
            })
            .await
    }

    /// Reads one field of an item.
    ///
    /// Returns the trimmed value, or `None` when the backend is unavailable,
    /// the item or field is missing, the read fails, or the value is empty.
    pub async fn get_field(&self, item: &str, field: &str) -> Option<String> {
        if !self.is_available().await {
            return None;
        }

        if let Err(e) = validate_item_name(item).and_then(|_| validate_field_name(field)) {
            debug!(item, field, error = %e, "Refusing field lookup");
            return None;
        }

        match self.backend.get_field(item, field, &self.config.vault).await {
            Ok(value) => {
                let value = value.trim();
                if value.is_empty() {
                    debug!(item, field, "Field is empty");
                    None
                } else {
                    Some(value.to_string())
                }
            }
            Err(e) => {
                log_read_failure(item, Some(field), &e);
                None
            }
        }
    }

    /// Reads the `password` field of an item.
    pub async fn get_password(&self, item: &str) -> Option<String> {
        self.get_field(item, "password").await
    }

    /// Reads a whole item as a [`FieldMap`].
    ///
    /// Keys are field labels (ids when unlabeled); empty fields are dropped;
    /// pairs written in the notes field override same-named fields.
    pub async fn get_structured(&self, item: &str) -> Option<FieldMap> {
        if !self.is_available().await {
            return None;
        }

        if let Err(e) = validate_item_name(item) {
            debug!(item, error = %e, "Refusing item lookup");
            return None;
        }

        match self.backend.get_item(item, &self.config.vault).await {
            Ok(record) => {
                let fields = record.to_field_map();
                debug!(item, fields = fields.len(), "Structured credential loaded");
                Some(fields)
            }
            Err(e) => {
                log_read_failure(item, None, &e);
                None
            }
        }
    }

    /// Creates a new item from `fields`.
    ///
    /// Returns `true` only when the backend accepted the item.
    pub async fn store(&self, item: &str, fields: &FieldMap, category: ItemCategory) -> bool {
        if !self.is_available().await {
            warn!(item, "Secret backend unavailable; credential not stored");
            return false;
        }

        let valid = validate_item_name(item)
            .and_then(|_| fields.keys().try_for_each(|name| validate_field_name(name)));
        if let Err(e) = valid {
            error!(item, error = %e, "Refusing to store credential");
            return false;
        }

        match self
            .backend
            .create_item(category, &self.config.vault, item, fields)
            .await
        {
            Ok(()) => {
                debug!(item, %category, fields = fields.len(), "Credential stored");
                true
            }
            Err(e) => {
                error!(item, error = %e, "Failed to store credential");
                false
            }
        }
    }
}

/// A missing item is the normal "not configured" answer; a timeout points
/// at a hung CLI and is surfaced as a warning.
fn log_read_failure(item: &str, field: Option<&str>, err: &BrokerError) {
    if err.is_timeout() {
        warn!(item, field, error = %err, "Credential lookup timed out");
    } else if err.is_not_found() {
        debug!(item, field, "Credential not found");
    } else {
        debug!(item, field, error = %err, "Credential lookup failed");
    }
}

//! Backend trait definition.
//!
//! A [`Backend`] is the capability the broker uses to reach the external
//! secret manager. It exposes the four operations the broker needs and
//! nothing else, so tests can substitute canned responses for the real CLI.

use crate::{FieldMap, ItemCategory, ItemRecord, Result};
use async_trait::async_trait;

/// Secret manager reachable through four operations.
///
/// Implementations report failures through [`Result`]; the broker decides
/// how each failure is surfaced to callers. Each call is attempted exactly
/// once and must bound its own run time.
///
/// # Implementations
///
/// - [`OnePasswordBackend`](crate::backends::onepassword::OnePasswordBackend): the `op` CLI
/// - [`MockBackend`](crate::backends::mock::MockBackend): in-memory test double
#[async_trait]
pub trait Backend: Send + Sync {
    /// Returns the backend name (e.g., "onepassword").
    fn name(&self) -> &str;

    /// Lists accounts, succeeding only when the backend is installed and
    /// signed in. Output is ignored.
    async fn list_accounts(&self) -> Result<()>;

    /// Reads one field of one item as raw text.
    ///
    /// # Errors
    ///
    /// - [`BrokerError::NotFound`](crate::BrokerError::NotFound): item or field missing
    /// - [`BrokerError::Timeout`](crate::BrokerError::Timeout): backend did not answer in time
    async fn get_field(&self, item: &str, field: &str, vault: &str) -> Result<String>;

    /// Reads a whole item with all of its fields.
    ///
    /// # Errors
    ///
    /// - [`BrokerError::NotFound`](crate::BrokerError::NotFound): item missing
    /// - [`BrokerError::MalformedResponse`](crate::BrokerError::MalformedResponse):
    ///   output could not be parsed
    async fn get_item(&self, item: &str, vault: &str) -> Result<ItemRecord>;

    /// Creates an item holding one field per map entry.
    ///
    /// # Errors
    ///
    /// - [`BrokerError::CommandFailed`](crate::BrokerError::CommandFailed):
    ///   the backend rejected the item
    async fn create_item(
        &self,
        category: ItemCategory,
        vault: &str,
        title: &str,
        fields: &FieldMap,
    ) -> Result<()>;
}

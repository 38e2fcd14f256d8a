//! Mock backend for testing.
//!
//! This backend keeps items in memory, records every invocation, and
//! supports error injection, so code built on the broker can be tested
//! without a real secret manager.

use crate::{Backend, BrokerError, FieldMap, ItemCategory, ItemField, ItemRecord, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// One recorded backend invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    /// `list_accounts`
    ListAccounts,
    /// `get_field(item, field, vault)`
    GetField {
        /// Item name
        item: String,
        /// Field name
        field: String,
        /// Vault name
        vault: String,
    },
    /// `get_item(item, vault)`
    GetItem {
        /// Item name
        item: String,
        /// Vault name
        vault: String,
    },
    /// `create_item(category, vault, title, fields)`
    CreateItem {
        /// Category
        category: ItemCategory,
        /// Vault name
        vault: String,
        /// Item title
        title: String,
    },
}

/// Mock backend for testing.
///
/// # Example
///
/// ```
/// use credmux::backends::mock::MockBackend;
/// use credmux::{BrokerConfig, ItemRecord, SecretBroker};
///
/// #[tokio::main]
/// async fn main() {
///     let backend = MockBackend::new();
///     backend.set_item(ItemRecord::new("api").with_field("token", "t0k3n"));
///
///     let broker = SecretBroker::new(backend, BrokerConfig::new());
///     let fields = broker.get_structured("api").await.unwrap();
///     assert_eq!(fields["token"], "t0k3n");
///     assert_eq!(broker.backend().call_count(), 2);
/// }
/// ```
pub struct MockBackend {
    items: Arc<Mutex<HashMap<String, ItemRecord>>>,
    calls: Arc<Mutex<Vec<MockCall>>>,

    /// Whether `list_accounts` succeeds
    pub available: bool,
    /// Error to return from `get_field()` and `get_item()`
    pub get_error: Option<BrokerError>,
    /// Error to return from `create_item()`
    pub create_error: Option<BrokerError>,
}

impl MockBackend {
    /// Creates an available mock backend with empty storage.
    pub fn new() -> Self {
        Self {
            items: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            available: true,
            get_error: None,
            create_error: None,
        }
    }

    /// Creates a mock backend whose `list_accounts` fails.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    /// Pre-populates the backend with an item, keyed by its title.
    pub fn set_item(&self, item: ItemRecord) {
        let mut items = self.items.lock().unwrap_or_else(|e| e.into_inner());
        items.insert(item.title.clone(), item);
    }

    /// Returns a stored item by title.
    pub fn item(&self, title: &str) -> Option<ItemRecord> {
        let items = self.items.lock().unwrap_or_else(|e| e.into_inner());
        items.get(title).cloned()
    }

    /// Returns every invocation made so far, in order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Returns the number of invocations made so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn record(&self, call: MockCall) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
    }

    fn injected(err: &Option<BrokerError>) -> Result<()> {
        match err {
            Some(err) => Err(replay(err)),
            None => Ok(()),
        }
    }
}

/// Rebuilds an injected error, keeping the variants callers classify on.
fn replay(err: &BrokerError) -> BrokerError {
    match err {
        BrokerError::NotFound(item) => BrokerError::NotFound(item.clone()),
        BrokerError::Timeout { program, timeout } => BrokerError::Timeout {
            program: program.clone(),
            timeout: *timeout,
        },
        BrokerError::BackendOperation {
            backend,
            operation,
            item,
            source,
        } => BrokerError::backend_op(
            backend.as_str(),
            operation.as_str(),
            item.as_str(),
            replay(source),
        ),
        other => BrokerError::Other(anyhow::anyhow!("{}", other)),
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn list_accounts(&self) -> Result<()> {
        self.record(MockCall::ListAccounts);
        if self.available {
            Ok(())
        } else {
            Err(BrokerError::BackendNotInstalled("mock".to_string()))
        }
    }

    async fn get_field(&self, item: &str, field: &str, vault: &str) -> Result<String> {
        self.record(MockCall::GetField {
            item: item.to_string(),
            field: field.to_string(),
            vault: vault.to_string(),
        });
        Self::injected(&self.get_error)?;

        self.item(item)
            .as_ref()
            .and_then(|record| record.field(field))
            .and_then(ItemField::text)
            .map(|value| format!("{}\n", value))
            .ok_or_else(|| BrokerError::NotFound(format!("{}/{}", item, field)))
    }

    async fn get_item(&self, item: &str, vault: &str) -> Result<ItemRecord> {
        self.record(MockCall::GetItem {
            item: item.to_string(),
            vault: vault.to_string(),
        });
        Self::injected(&self.get_error)?;

        self.item(item)
            .ok_or_else(|| BrokerError::NotFound(item.to_string()))
    }

    async fn create_item(
        &self,
        category: ItemCategory,
        vault: &str,
        title: &str,
        fields: &FieldMap,
    ) -> Result<()> {
        self.record(MockCall::CreateItem {
            category,
            vault: vault.to_string(),
            title: title.to_string(),
        });
        Self::injected(&self.create_error)?;

        let mut record = ItemRecord::new(title);
        record.category = Some(category.to_string());
        let mut names: Vec<&String> = fields.keys().collect();
        names.sort();
        for name in names {
            record = record.with_field(name, fields[name].clone());
        }
        self.set_item(record);
        Ok(())
    }
}

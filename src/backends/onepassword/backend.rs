//! 1Password backend implementation.

use crate::cli::run_command;
use crate::{Backend, BrokerConfig, BrokerError, FieldMap, ItemCategory, ItemRecord, Result};
use async_trait::async_trait;
use std::time::Duration;

/// 1Password backend.
///
/// Integrates with 1Password via the `op` CLI tool. Every invocation is
/// bounded by the timeout configured for its operation.
#[derive(Debug, Clone)]
pub struct OnePasswordBackend {
    program: String,
    account: Option<String>,
    probe_timeout: Duration,
    fetch_timeout: Duration,
    store_timeout: Duration,
}

impl OnePasswordBackend {
    /// Creates a new 1Password backend from configuration.
    pub fn new(config: &BrokerConfig) -> Self {
        Self {
            program: config.program.clone(),
            account: config.account.clone(),
            probe_timeout: config.probe_timeout,
            fetch_timeout: config.fetch_timeout,
            store_timeout: config.store_timeout,
        }
    }

    /// Appends `--account` when one is configured.
    fn with_account<'a>(&'a self, mut args: Vec<&'a str>) -> Vec<&'a str> {
        if let Some(ref account) = self.account {
            args.push("--account");
            args.push(account);
        }
        args
    }

    async fn run(&self, args: Vec<&str>, timeout: Duration) -> Result<String> {
        let args = self.with_account(args);
        run_command(&self.program, &args, timeout).await
    }
}

/// Maps the CLI's "no such item/field" messages to [`BrokerError::NotFound`].
fn classify(err: BrokerError, item: &str) -> BrokerError {
    match err {
        BrokerError::CommandFailed(ref msg)
            if msg.contains("isn't an item") || msg.contains("isn't a field") =>
        {
            BrokerError::NotFound(item.to_string())
        }
        other => other,
    }
}

#[async_trait]
impl Backend for OnePasswordBackend {
    fn name(&self) -> &str {
        "onepassword"
    }

    async fn list_accounts(&self) -> Result<()> {
        self.run(vec!["account", "list"], self.probe_timeout)
            .await
            .map(|_| ())
    }

    async fn get_field(&self, item: &str, field: &str, vault: &str) -> Result<String> {
        self.run(
            vec![
                "item", "get", item, "--vault", vault, "--fields", field, "--reveal",
            ],
            self.fetch_timeout,
        )
        .await
        .map_err(|e| BrokerError::backend_op(self.name(), "get-field", item, classify(e, item)))
    }

    async fn get_item(&self, item: &str, vault: &str) -> Result<ItemRecord> {
        let output = self
            .run(
                vec![
                    "item", "get", item, "--vault", vault, "--format", "json", "--reveal",
                ],
                self.fetch_timeout,
            )
            .await
            .map_err(|e| BrokerError::backend_op(self.name(), "get", item, classify(e, item)))?;

        let record: ItemRecord = serde_json::from_str(&output)
            .map_err(|e| BrokerError::backend_op(self.name(), "get", item, e.into()))?;

        Ok(record)
    }

    async fn create_item(
        &self,
        category: ItemCategory,
        vault: &str,
        title: &str,
        fields: &FieldMap,
    ) -> Result<()> {
        let assignments: Vec<String> = fields
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect();

        let mut args = vec![
            "item",
            "create",
            "--category",
            category.as_str(),
            "--vault",
            vault,
            "--title",
            title,
        ];
        args.extend(assignments.iter().map(String::as_str));

        self.run(args, self.store_timeout)
            .await
            .map(|_| ())
            .map_err(|e| BrokerError::backend_op(self.name(), "create", title, e))
    }
}

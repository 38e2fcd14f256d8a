//! Credmux - credential broker for password-manager CLIs.
//!
//! Credmux resolves named credentials from a secret backend (the 1Password
//! `op` CLI by default), falling back to well-known environment variables
//! when the backend is missing, signed out, or does not hold the item.
//! Results come back as plain key/value maps or as typed, provider-shaped
//! credentials.
//!
//! # Features
//!
//! - **Cached availability**: the backend is probed once per broker
//! - **Never fails a lookup**: backend errors are logged and surface as
//!   `None` or `false`
//! - **Notes overrides**: `key: value` lines in an item's notes are merged
//!   into its fields
//! - **Provider shapes**: AWS, GCP, Lambda Cloud, Hugging Face, Docker, SSH
//! - **Local hardening**: owner-only credentials directory and `.gitignore`
//!   patterns
//!
//! # Quick Start
//!
//! ```no_run
//! use credmux::{BrokerConfig, ItemCategory, ProviderResolver, SecretBroker};
//!
//! #[tokio::main]
//! async fn main() -> credmux::Result<()> {
//!     let credentials_dir = credmux::ensure_secure_environment().await?;
//!     println!("credentials cache: {}", credentials_dir.display());
//!
//!     let broker = SecretBroker::onepassword(BrokerConfig::new());
//!
//!     // Raw field map
//!     if let Some(fields) = broker.get_structured("clustrix-aws-validation").await {
//!         println!("{} fields", fields.len());
//!     }
//!
//!     // Provider-shaped credential with environment fallback
//!     let resolver = ProviderResolver::new(&broker);
//!     if let Some(hf) = resolver.get_huggingface_credentials().await {
//!         println!("hub user: {}", hf.username);
//!     }
//!
//!     // Store a new item
//!     let mut fields = credmux::FieldMap::new();
//!     fields.insert("api_key".to_string(), "sk-example".to_string());
//!     broker.store("my-service", &fields, ItemCategory::ApiCredential).await;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Feature Flags
//!
//! | Feature | Default | Provides |
//! |---------|---------|----------|
//! | `onepassword` | yes | [`backends::onepassword::OnePasswordBackend`] |
//! | `mock` | yes | [`backends::mock::MockBackend`] for tests |

pub mod backend;
pub mod backends;
pub mod broker;
pub mod cli;
pub mod config;
pub mod env;
pub mod error;
pub mod hardening;
pub mod item;
pub mod notes;
pub mod providers;
pub mod validation;

pub use backend::Backend;
pub use broker::SecretBroker;
pub use config::BrokerConfig;
pub use env::{EnvLookup, ProcessEnv};
pub use error::{BrokerError, Result};
pub use hardening::{ensure_secure_environment, EnvironmentHardener};
pub use item::{FieldMap, ItemCategory, ItemField, ItemRecord};
pub use providers::{
    AwsCredentials, CredentialSource, DockerCredentials, GcpCredentials, HuggingFaceCredentials,
    LambdaCloudCredentials, Provider, ProviderCredential, ProviderResolver, ProviderStatus,
    Resolved, SshCredentials,
};

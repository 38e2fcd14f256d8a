//! 1Password CLI backend.
//!
//! This backend integrates with 1Password via the `op` command-line tool.
//! It requires the CLI to be installed and signed in; an `op account list`
//! that exits non-zero marks the backend as unavailable.
//!
//! # Configuration
//!
//! - `program`: CLI executable (default: `op`)
//! - `vault`: Vault name to use (default: "Private")
//! - `account`: account shorthand, passed as `--account` when set
//!
//! # Example
//!
//! ```
//! use credmux::BrokerConfig;
//! use credmux::backends::onepassword::OnePasswordBackend;
//!
//! let config = BrokerConfig::new().with_vault("Development");
//! let backend = OnePasswordBackend::new(&config);
//! ```

mod backend;

pub use backend::OnePasswordBackend;

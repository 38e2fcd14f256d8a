//! Backend implementations.

#[cfg(feature = "mock")]
pub mod mock;

#[cfg(feature = "onepassword")]
pub mod onepassword;

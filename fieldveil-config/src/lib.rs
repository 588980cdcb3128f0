//! Config feed and profile cache for Fieldveil.
//!
//! The feed (`ConfigLoader`) is the seam to whatever stores profile rules
//! and crypto definitions; this crate ships an in-memory feed for tests and
//! a JSON-file feed for development. `ConfigCache` sits in front of the feed
//! with a sliding idle expiry and reveals at-rest-encrypted columns exactly
//! once per load.

mod cache;
mod error;
mod file;
mod loader;
mod memory;

pub use cache::{CacheConfig, ConfigCache};
pub use error::{ConfigError, ConfigResult};
pub use file::JsonFileLoader;
pub use loader::{ConfigLoader, ContextRow, FieldRuleRow, SortRuleRow, TransformRow};
pub use memory::InMemoryLoader;

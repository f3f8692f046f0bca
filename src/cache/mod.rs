//! Cache addressing.

pub mod key;

pub use key::{CacheKey, CostDataType, KEY_VERSION};

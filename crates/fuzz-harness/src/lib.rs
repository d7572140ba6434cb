//! Fire-watch Fuzz Harness
//!
//! Reusable property-based testing strategies for the constellation crates:
//! orbital angles, Walker patterns, tick sizes, lat/lon sites and event lifetimes.
//!
//! # Usage
//!
//! ```rust
//! use fuzz_harness::prelude::*;
//!
//! proptest! {
//!     #[test]
//!     fn my_fuzz_test(angle in anomaly_rad()) {
//!         prop_assert!(angle.is_finite());
//!     }
//! }
//! ```

pub mod config;
pub mod generators;

pub mod prelude {
    pub use crate::config::FuzzConfig;
    pub use crate::generators::*;
    pub use proptest::prelude::*;
}

// Re-export proptest for convenience
pub use proptest;

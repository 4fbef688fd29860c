//! Adapters layer: Concrete implementations of ports.
//!
//! - `forest`: gradient-boosted tree ensemble loaded from a JSON artifact
//! - `sanitize`: biometric/secret filtering for logs

pub mod forest;
pub mod sanitize;

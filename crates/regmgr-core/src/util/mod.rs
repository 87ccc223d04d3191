//! Utility modules.
//!
//! # Modules
//!
//! - [`ids`]: Field identifier codec

pub mod ids;

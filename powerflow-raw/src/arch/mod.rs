//! Architecture-specific event and register definitions
//!
//! Each POWER core family has its own raw event encoding, constraint-field
//! layout and control-register packing. This module provides per-family
//! definitions selected by feature flag.
//!
//! ## Supported Architectures
//!
//! - **POWER8** (`power8` feature) - POWER8 / POWER8E / POWER8NVL
//! - POWER9 (`power9` feature) - Coming soon

#[cfg(feature = "power8")]
pub mod power8;

// POWER9 is not yet implemented
// #[cfg(feature = "power9")]
// pub mod power9;

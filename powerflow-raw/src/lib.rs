//! # powerflow-raw
//!
//! Event encoding and counter scheduling primitives for IBM POWER
//! performance monitoring.
//!
//! This crate decides whether a set of requested performance events can
//! share a core's counter pool and synthesizes the control-register images
//! that program them. Per architecture it provides: raw event-code
//! decoding, per-event scheduling constraint vectors, alternative-encoding
//! resolution, counter assignment and MMCR packing, all described by an
//! immutable [`pmu::PowerPmu`] capability descriptor. Everything is pure
//! per-call logic; deciding which events run when, accumulating constraint
//! vectors across events, and touching the hardware are the embedding
//! scheduler's business.
//!
//! ## Features
//!
//! Select the target architecture via feature flags:
//! - `power8` (default) - POWER8 definitions
//! - `power9` - Coming soon
//!
//! ## Usage
//!
//! ```ignore
//! use powerflow_raw::current_arch as power8;
//! use powerflow_raw::pmu::PmuRegistry;
//!
//! let mut registry = PmuRegistry::new();
//! power8::register(&mut registry, "ppc64/power8");
//!
//! let pmu = registry.lookup("ppc64/power8").unwrap();
//! let event = power8::events::PM_CYC;
//!
//! // Per-event feasibility input for the scheduler...
//! let vector = (pmu.get_constraint)(event)?;
//!
//! // ...and the register image once a group is accepted.
//! let (image, pmcs) = (pmu.compute_mmcr)(&[event]);
//! ```

pub mod arch;
pub mod bits;
pub mod constraint;
pub mod error;
pub mod pmu;
pub mod register;

// Re-export for convenience
pub use constraint::ConstraintVector;
pub use error::{EventError, Result};
pub use pmu::{GenericEvent, PmuRegistry, PowerPmu};
pub use register::{MmcrImage, RegisterLayout};

// Export current architecture based on feature flag
#[cfg(feature = "power8")]
pub use arch::power8 as current_arch;

// POWER9 is not yet implemented
// #[cfg(feature = "power9")]
// pub use arch::power9 as current_arch;

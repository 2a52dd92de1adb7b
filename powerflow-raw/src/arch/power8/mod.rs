//! POWER8 performance-monitor definitions
//!
//! POWER8 cores carry six performance counters. PMCs 1-4 are general
//! purpose and freely assignable; PMCs 5 and 6 are dedicated to the
//! run-latch instruction and cycle counts. Event codes, the constraint
//! layout used for schedulability checks, alternative encodings and the
//! control-register packing all live here; the generic abstractions they
//! plug into are at the crate root.
//!
//! ## References
//!
//! - POWER8 Processor User's Manual for the Single-Chip Module
//! - Power ISA Version 2.07, Book III-S, Performance Monitor Facility

use crate::pmu::{flags, PowerPmu};

pub mod alternatives;
pub mod constraint;
pub mod event;
pub mod events;
pub mod mmcr;

pub use constraint::N_COUNTER;

/// Platform identity string POWER8 systems report.
pub const CPU_TYPE: &str = "ppc64/power8";

/// SPR numbers of the control registers an image programs.
pub mod spr {
    pub const MMCR0: u32 = 795;
    pub const MMCR1: u32 = 798;
    pub const MMCRA: u32 = 786;
}

/// The POWER8 capability descriptor.
pub static POWER8_PMU: PowerPmu = PowerPmu {
    name: "POWER8",
    cpu_type: CPU_TYPE,
    n_counter: N_COUNTER,
    max_alternatives: alternatives::MAX_ALTERNATIVES,
    add_fields: constraint::ADD_FIELDS,
    test_adder: constraint::TEST_ADDER,
    flags: flags::HAS_SSLOT | flags::HAS_SIER,
    get_constraint: constraint::get_constraint,
    get_alternatives: alternatives::get_alternatives,
    compute_mmcr: mmcr::compute_mmcr,
    disable_pmc: mmcr::disable_pmc,
    generic_events: events::GENERIC_EVENTS,
};

/// Register the POWER8 descriptor if this is a POWER8 platform.
///
/// A different `running_cpu_type` is a deliberate no-op, mirroring how a
/// multi-arch build offers every descriptor and lets the platform pick.
pub fn register(registry: &mut crate::pmu::PmuRegistry, running_cpu_type: &str) -> bool {
    registry.register_if(running_cpu_type, &POWER8_PMU)
}

//! POWER8 native event codes
//!
//! The subset of the POWER8 event list this crate names directly: the codes
//! backing the cross-platform generic events, the run-state counterparts
//! used by alternative resolution, and the two fabric-match events.
//!
//! ## References
//!
//! - POWER8 Processor User's Manual, Performance Monitor Unit chapter

use crate::pmu::GenericEvent;

/// Processor cycles.
pub const PM_CYC: u64 = 0x0001e;

/// Cycles with no slot in the global completion table.
pub const PM_GCT_NOSLOT_CYC: u64 = 0x100f8;

/// Completion stall cycles.
pub const PM_CMPLU_STALL: u64 = 0x4000a;

/// Instructions completed.
pub const PM_INST_CMPL: u64 = 0x00002;

/// Branch instructions finished.
pub const PM_BRU_FIN: u64 = 0x10068;

/// Mispredicted branches completed.
pub const PM_BR_MPRED_CMPL: u64 = 0x400f6;

/// Cycles with the run latch set. The only event PMC 6 can count.
pub const PM_RUN_CYC: u64 = 0x600f4;

/// Instructions completed with the run latch set. The only event PMC 5 can
/// count.
pub const PM_RUN_INST_CMPL: u64 = 0x500fa;

/// Native codes for the cross-platform generic events.
pub const GENERIC_EVENTS: &[(GenericEvent, u64)] = &[
    (GenericEvent::CpuCycles, PM_CYC),
    (GenericEvent::StalledCyclesFrontend, PM_GCT_NOSLOT_CYC),
    (GenericEvent::StalledCyclesBackend, PM_CMPLU_STALL),
    (GenericEvent::Instructions, PM_INST_CMPL),
    (GenericEvent::BranchInstructions, PM_BRU_FIN),
    (GenericEvent::BranchMisses, PM_BR_MPRED_CMPL),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::power8::constraint::get_constraint;
    use crate::arch::power8::event::EventFields;

    #[test]
    fn test_run_latch_events_pin_their_counters() {
        assert_eq!(EventFields::decode(PM_RUN_INST_CMPL).pmc, 5);
        assert_eq!(EventFields::decode(PM_RUN_CYC).pmc, 6);
    }

    #[test]
    fn test_generic_events_are_schedulable() {
        for &(_, event) in GENERIC_EVENTS {
            assert!(get_constraint(event).is_ok(), "event {event:#x}");
        }
    }
}

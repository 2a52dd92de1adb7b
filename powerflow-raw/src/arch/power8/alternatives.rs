//! Alternative event encodings for POWER8
//!
//! Several POWER8 events exist under more than one code, each drawing on
//! different counter resources. When a scheduler cannot fit an event's
//! first-choice encoding it retries with the alternatives resolved here.

use super::events::{PM_CYC, PM_INST_CMPL, PM_RUN_CYC, PM_RUN_INST_CMPL};

/// Codes per group in [`EVENT_ALTERNATIVES`].
pub const MAX_ALT: usize = 2;

/// Upper bound on what [`get_alternatives`] returns, input included: a
/// group's worth of codes plus one run-state substitution.
pub const MAX_ALTERNATIVES: usize = MAX_ALT + 1;

/// Groups of mutually substitutable event codes, sorted ascending by each
/// group's first member.
static EVENT_ALTERNATIVES: [[u64; MAX_ALT]; 11] = [
    [0x10134, 0x301e2], // PM_MRK_ST_CMPL
    [0x10138, 0x40138], // PM_BR_MRK_2PATH
    [0x18082, 0x3e05e], // PM_L3_CO_MEPF
    [0x1d14e, 0x401e8], // PM_MRK_DATA_FROM_L2MISS
    [0x1e054, 0x4000a], // PM_CMPLU_STALL
    [0x20036, 0x40036], // PM_BR_2PATH
    [0x200f2, 0x300f2], // PM_INST_DISP
    [0x200f4, 0x600f4], // PM_RUN_CYC
    [0x2013c, 0x3012e], // PM_MRK_FILT_MATCH
    [0x3e054, 0x400f0], // PM_LD_MISS_L1
    [0x400fa, 0x500fa], // PM_RUN_INST_CMPL
];

/// Find the group containing `event`, if any.
///
/// The table is sorted by first member, so the scan stops as soon as a
/// group key exceeds the query.
fn find_alternative(event: u64) -> Option<usize> {
    for (i, group) in EVENT_ALTERNATIVES.iter().enumerate() {
        if event < group[0] {
            break;
        }

        if group.iter().any(|&alt| alt == event) {
            return Some(i);
        }
    }

    None
}

/// Resolve every encoding equivalent to `event`.
///
/// The input is always element 0, even when nothing else matches. With
/// `only_count_run` set, counting is restricted to run-latch-set cycles,
/// under which the total-cycle and run-cycle counts are provably equal
/// (likewise total and run instruction counts); the paired code is then
/// appended for every element matching one of those four events. Never
/// returns more than [`MAX_ALTERNATIVES`] codes.
pub fn get_alternatives(event: u64, only_count_run: bool) -> Vec<u64> {
    let mut alternatives = Vec::with_capacity(MAX_ALTERNATIVES);
    alternatives.push(event);

    if let Some(i) = find_alternative(event) {
        // The original is already in slot 0.
        alternatives.extend(EVENT_ALTERNATIVES[i].iter().filter(|&&alt| alt != event));
    }

    if only_count_run {
        let present = alternatives.len();
        for i in 0..present {
            let paired = match alternatives[i] {
                PM_CYC => Some(PM_RUN_CYC),
                PM_RUN_CYC => Some(PM_CYC),
                PM_INST_CMPL => Some(PM_RUN_INST_CMPL),
                PM_RUN_INST_CMPL => Some(PM_INST_CMPL),
                _ => None,
            };
            if let Some(alt) = paired {
                alternatives.push(alt);
            }
        }
    }

    alternatives
}

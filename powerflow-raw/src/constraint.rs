//! Scheduling constraint vectors
//!
//! Whether a set of events can be counted at the same time is decided with a
//! single (mask, value) pair per event. Both words are partitioned into the
//! same disjoint sub-ranges, of two kinds:
//!
//! - **value fields** carry a required register setting (threshold bits,
//!   sample mode, cache qualifier). Two events agree iff their masked values
//!   are equal, so a scheduler can OR the masks and values of any number of
//!   events and compare once.
//! - **adder fields** count resource usage. Each event contributes the low
//!   bit of the field to the accumulated *value*, while its *mask* exposes
//!   only the bit above the field. When more events contribute than the
//!   field can hold, the sum carries into the mask bit and the masked
//!   compare fails. This turns a bin-packing feasibility check into one
//!   addition and one compare.
//!
//! Accumulation across events is owned by the scheduler: masks combine by
//! OR, values by integer addition, plus the architecture's one-time
//! `test_adder` bias (see [`crate::pmu::PowerPmu`]). This crate only emits
//! the per-event vectors; the field layouts live with each architecture,
//! e.g. [`crate::arch::power8::constraint`].

/// One event's resource requirements, as a masked value over the
/// architecture's constraint-field layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConstraintVector {
    /// Bits the scheduler must check for this event.
    pub mask: u64,
    /// Required value under `mask`, plus adder-field contributions.
    pub value: u64,
}

impl ConstraintVector {
    /// An empty vector: no requirements.
    pub const fn new() -> Self {
        Self { mask: 0, value: 0 }
    }

    /// Contribute one (mask, value) fragment.
    ///
    /// Fragments produced for a single event occupy disjoint sub-ranges, so
    /// both halves merge by OR.
    pub fn add(&mut self, mask: u64, value: u64) {
        self.mask |= mask;
        self.value |= value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_vector() {
        let v = ConstraintVector::new();
        assert_eq!(v.mask, 0);
        assert_eq!(v.value, 0);
    }

    #[test]
    fn test_add_merges_disjoint_fragments() {
        let mut v = ConstraintVector::new();
        v.add(0x3 << 22, 0x2 << 22);
        v.add(0x1f << 16, 0x09 << 16);
        assert_eq!(v.mask, (0x3 << 22) | (0x1f << 16));
        assert_eq!(v.value, (0x2 << 22) | (0x09 << 16));
    }
}

//! Constraint-vector generation for POWER8
//!
//! Maps a raw event code onto the POWER8 constraint-field layout, rejecting
//! encodings the hardware cannot count. The scheduler accumulates the
//! resulting vectors (OR the masks, add the values plus [`TEST_ADDER`]) and
//! accepts a group iff the accumulated value survives its own mask.
//!
//! ## Constraint Field Layout
//!
//! | Bits   | Field      | Kind  | Description                         |
//! |--------|------------|-------|-------------------------------------|
//! | 0-11   | p1..p6     | adder | Two bits per counter, usage count   |
//! | 12-15  | nc         | adder | Counters needing free assignment    |
//! | 16-20  | sample     | value | Sampling mode and eligibility       |
//! | 22-23  | l1_qual    | value | L1 instruction/data qualifier       |
//! | 32-52  | thresh     | value | Full threshold super-field          |
//! | 56-63  | fab_match  | value | Fabric response/type match filter   |
//!
//! Adder fields hold the count of events using a resource; their masks
//! expose only the first bit above the field, so an over-subscribed
//! resource carries into the mask and fails the compare. `nc` counts up to
//! four freely assigned events in three bits and relies on the scheduler
//! adding the [`TEST_ADDER`] bias once, so the fifth event lands exactly on
//! the mask bit.

use crate::bits::extract;
use crate::constraint::ConstraintVector;
use crate::error::{EventError, Result};

use super::event;
use super::events::{PM_RUN_CYC, PM_RUN_INST_CMPL};

/// Counters in the pool. PMCs 5 and 6 only ever count their dedicated
/// run-latch events.
pub const N_COUNTER: usize = 6;

pub const fn fab_match_val(thresh_ctl: u64) -> u64 {
    (thresh_ctl & event::THRESH_CTL_MASK) << 56
}
pub const FAB_MATCH_MASK: u64 = fab_match_val(event::THRESH_CTL_MASK);

pub const fn thresh_val(thresh: u64) -> u64 {
    (thresh & event::THRESH_MASK) << 32
}
pub const THRESH_MASK: u64 = thresh_val(event::THRESH_MASK);

pub const fn l1_qual_val(cache_sel: u64) -> u64 {
    (cache_sel & 3) << 22
}
pub const L1_QUAL_MASK: u64 = l1_qual_val(3);

pub const fn sample_val(sample: u64) -> u64 {
    (sample & event::SAMPLE_MASK) << 16
}
pub const SAMPLE_MASK: u64 = sample_val(event::SAMPLE_MASK);

const NC_SHIFT: u32 = 12;
pub const NC_VAL: u64 = 1 << NC_SHIFT;
pub const NC_MASK: u64 = 8 << NC_SHIFT;

pub const fn pmc_shift(pmc: usize) -> u32 {
    ((pmc - 1) * 2) as u32
}
pub const fn pmc_val(pmc: usize) -> u64 {
    1 << pmc_shift(pmc)
}
pub const fn pmc_mask(pmc: usize) -> u64 {
    2 << pmc_shift(pmc)
}

/// Low bit of every adder field; the scheduler adds this per accepted
/// event.
pub const ADD_FIELDS: u64 = pmc_val(1)
    | pmc_val(2)
    | pmc_val(3)
    | pmc_val(4)
    | pmc_val(5)
    | pmc_val(6)
    | NC_VAL;

/// One-time accumulation bias: lifts the three-bit `nc` count by three so
/// the fifth freely assigned event overflows into the mask bit.
pub const TEST_ADDER: u64 = 3 << NC_SHIFT;

/// Build the constraint vector for one event, or reject it.
///
/// Rejections cover the whole malformed-encoding taxonomy: a pin beyond
/// the pool, a pin to PMC 5/6 with anything but the dedicated run-latch
/// event, a non-zero cache selector on the L2/L3 units (their event-select
/// register is hypervisor-owned and assumed pre-zeroed), and a denormal
/// threshold-compare encoding.
pub fn get_constraint(event: u64) -> Result<ConstraintVector> {
    let mut vector = ConstraintVector::new();

    let pmc = extract(event, event::PMC_SHIFT, event::PMC_MASK);
    let unit = extract(event, event::UNIT_SHIFT, event::UNIT_MASK);
    let cache = extract(event, event::CACHE_SEL_SHIFT, event::CACHE_SEL_MASK);

    if pmc != 0 {
        if pmc as usize > N_COUNTER {
            return Err(EventError::PmcOutOfRange {
                event,
                pmc: pmc as u8,
                max: N_COUNTER as u8,
            });
        }

        vector.add(pmc_mask(pmc as usize), pmc_val(pmc as usize));

        if pmc >= 5 && event != PM_RUN_INST_CMPL && event != PM_RUN_CYC {
            return Err(EventError::ReservedPmc {
                event,
                pmc: pmc as u8,
            });
        }
    }

    if pmc <= 4 {
        // Count towards the freely assignable pool. Unpinned events take a
        // PMC too, it is just chosen at synthesis time. PMCs 5 and 6 stay
        // out: each counts one fixed event, validated above.
        vector.add(NC_MASK, NC_VAL);
    }

    if (6..=9).contains(&unit) {
        // The L2/L3 cache selector would have to be programmed into an
        // event-select register this engine's callers cannot write; it is
        // assumed pre-zeroed, so only the zero selector is schedulable.
        if cache != 0 {
            return Err(EventError::CacheSelForbidden {
                event,
                unit: unit as u8,
                cache: cache as u8,
            });
        }
    } else if event & event::IS_L1 != 0 {
        vector.add(L1_QUAL_MASK, l1_qual_val(cache));
    }

    if event & event::IS_MARKED != 0 {
        vector.add(SAMPLE_MASK, sample_val(event >> event::SAMPLE_SHIFT));
    }

    if event::is_fab_match(event) {
        // Fabric-match events repurpose the threshold control byte as a
        // response/type filter; it constrains as its own value field.
        vector.add(FAB_MATCH_MASK, fab_match_val(event >> event::THRESH_CTL_SHIFT));
    } else {
        // The compare value is a 3-bit exponent over a 7-bit mantissa; a
        // non-zero exponent with both upper mantissa bits clear is a
        // denormal the hardware does not accept.
        let cmp = extract(event, event::THRESH_CMP_SHIFT, event::THRESH_CMP_MASK);
        let exp = cmp >> 7;

        if exp != 0 && (cmp & 0x60) == 0 {
            return Err(EventError::ThreshCmpDenormal {
                event,
                cmp: cmp as u16,
            });
        }

        vector.add(THRESH_MASK, thresh_val(event >> event::THRESH_SHIFT));
    }

    Ok(vector)
}

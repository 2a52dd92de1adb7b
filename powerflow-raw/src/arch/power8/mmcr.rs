//! Control-register synthesis for POWER8
//!
//! Turns an accepted group of events into the three-word register image and
//! a counter assignment. Groups reaching [`compute_mmcr`] have already
//! passed per-event constraint generation and the scheduler's combined
//! feasibility check; nothing is re-validated here.
//!
//! ## MMCR1 Format
//!
//! | Bits   | Field       | Description                            |
//! |--------|-------------|----------------------------------------|
//! | 0-24   | psel        | Selector per PMC, PMC 4 lowest         |
//! | 32-35  | combine     | Combine flag per PMC, PMC 4 lowest     |
//! | 46     | ic_qual     | L1 instruction-cache qualifier         |
//! | 47     | dc_qual     | L1 data-cache qualifier                |
//! | 48-63  | unit        | Unit per PMC, PMC 4 lowest             |
//!
//! The fabric response/type filter byte shares bits 0-7 with the PMC 4
//! selector.
//!
//! ## MMCRA Format
//!
//! | Bits   | Field         | Description                          |
//! |--------|---------------|--------------------------------------|
//! | 0      | sample_enable | Marked-event sampling enable         |
//! | 1-2    | sample_mode   | Random sampling mode                 |
//! | 4-6    | sample_elig   | Random sampling eligibility          |
//! | 8-15   | thresh_ctl    | Threshold start/stop                 |
//! | 16-18  | thresh_sel    | Threshold event select               |
//! | 32-41  | thresh_cmp    | Threshold compare                    |
//! | 42     | sdar_mode_tlb | Continuous SDAR update on TLB miss   |

use crate::bits::{extract, pack};
use crate::register::{MmcrImage, RegisterLayout};

use super::event;

/// MMCR0 bits: per-counter overflow-condition enables.
pub mod mmcr0 {
    /// Enable overflow conditions (freeze, interrupt) for PMC 1.
    pub const PMC1_COND_ENABLE: u64 = 0x8000;

    /// Enable overflow conditions for PMCs 2-6.
    pub const PMCJ_COND_ENABLE: u64 = 0x4000;
}

/// MMCR1 field offsets. Per-PMC fields are reverse ordered: higher counter
/// numbers sit at lower bit positions.
pub mod mmcr1 {
    /// Unit select for a PMC, 1-based, PMCs 1-4 only.
    pub const fn unit_shift(pmc: usize) -> u32 {
        (60 - 4 * (pmc - 1)) as u32
    }

    /// Combine flag for a PMC, 1-based, PMCs 1-4 only.
    pub const fn combine_shift(pmc: usize) -> u32 {
        (35 - (pmc - 1)) as u32
    }

    /// Event selector byte for a PMC, 1-based, PMCs 1-4 only.
    pub const fn pmcsel_shift(pmc: usize) -> u32 {
        (24 - (pmc - 1) * 8) as u32
    }

    /// L1 data-cache qualifier bit.
    pub const DC_QUAL_SHIFT: u32 = 47;

    /// L1 instruction-cache qualifier bit.
    pub const IC_QUAL_SHIFT: u32 = 46;
}

/// MMCRA field offsets.
pub mod mmcra {
    /// Marked-event sampling enable bit.
    pub const SAMPLE_ENABLE: u64 = 0x1;

    pub const SAMP_MODE_SHIFT: u32 = 1;
    pub const SAMP_ELIG_SHIFT: u32 = 4;
    pub const THR_CTL_SHIFT: u32 = 8;
    pub const THR_SEL_SHIFT: u32 = 16;
    pub const THR_CMP_SHIFT: u32 = 32;

    /// Continuous sampling: update the SDAR on TLB miss.
    pub const SDAR_MODE_TLB: u64 = 1 << 42;
}

/// Assign counters and synthesize the register image for one group.
///
/// Two passes over the group: the first collects every explicit counter
/// pin, the second assigns the lowest free PMC among 1-4 to each unpinned
/// event and packs all control fields. Free assignment has to run after
/// every pin is known, and packing needs the final counter numbers, hence
/// the split.
///
/// Returns the image and, per input index, the assigned zero-based
/// counter.
pub fn compute_mmcr(events: &[u64]) -> (MmcrImage, Vec<usize>) {
    let mut pmc_inuse: u32 = 0;

    for &event in events {
        let pmc = extract(event, event::PMC_SHIFT, event::PMC_MASK) as usize;
        if pmc != 0 {
            pmc_inuse |= 1 << pmc;
        }
    }

    // In continuous sampling mode, update the SDAR on TLB miss.
    let mut mmcra_word = mmcra::SDAR_MODE_TLB;
    let mut mmcr1_word = 0u64;
    let mut pmcs = Vec::with_capacity(events.len());

    for &event in events {
        let mut pmc = extract(event, event::PMC_SHIFT, event::PMC_MASK) as usize;
        let unit = extract(event, event::UNIT_SHIFT, event::UNIT_MASK);
        let combine = extract(event, event::COMBINE_SHIFT, event::COMBINE_MASK);
        let psel = event & event::PSEL_MASK;

        if pmc == 0 {
            // Accepted groups always leave a free PMC, enforced upstream by
            // the nc adder field.
            pmc = (1..=4).find(|p| pmc_inuse & (1 << p) == 0).unwrap_or(5);
            pmc_inuse |= 1 << pmc;
        }

        if pmc <= 4 {
            mmcr1_word |= pack(unit, mmcr1::unit_shift(pmc));
            mmcr1_word |= pack(combine, mmcr1::combine_shift(pmc));
            mmcr1_word |= pack(psel, mmcr1::pmcsel_shift(pmc));
        }

        if event & event::IS_L1 != 0 {
            let cache = event >> event::CACHE_SEL_SHIFT;
            mmcr1_word |= pack(cache & 1, mmcr1::IC_QUAL_SHIFT);
            mmcr1_word |= pack((cache >> 1) & 1, mmcr1::DC_QUAL_SHIFT);
        }

        if event & event::IS_MARKED != 0 {
            mmcra_word |= mmcra::SAMPLE_ENABLE;

            let sample = extract(event, event::SAMPLE_SHIFT, event::SAMPLE_MASK);
            if sample != 0 {
                mmcra_word |= pack(sample & 3, mmcra::SAMP_MODE_SHIFT);
                mmcra_word |= pack(sample >> 2, mmcra::SAMP_ELIG_SHIFT);
            }
        }

        if event::is_fab_match(event) {
            // The threshold control byte is a response/type filter here and
            // lands in MMCR1 instead of the threshold fields.
            mmcr1_word |= extract(event, event::THRESH_CTL_SHIFT, event::THRESH_CTL_MASK);
        } else {
            mmcra_word |= pack(
                extract(event, event::THRESH_CTL_SHIFT, event::THRESH_CTL_MASK),
                mmcra::THR_CTL_SHIFT,
            );
            mmcra_word |= pack(
                extract(event, event::THRESH_SEL_SHIFT, event::THRESH_SEL_MASK),
                mmcra::THR_SEL_SHIFT,
            );
            mmcra_word |= pack(
                extract(event, event::THRESH_CMP_SHIFT, event::THRESH_CMP_MASK),
                mmcra::THR_CMP_SHIFT,
            );
        }

        pmcs.push(pmc - 1);
    }

    let mut mmcr0_word = 0u64;

    // pmc_inuse is 1-based.
    if pmc_inuse & 0x2 != 0 {
        mmcr0_word = mmcr0::PMC1_COND_ENABLE;
    }
    if pmc_inuse & 0x7c != 0 {
        mmcr0_word |= mmcr0::PMCJ_COND_ENABLE;
    }

    (
        MmcrImage {
            mmcr0: mmcr0_word,
            mmcr1: mmcr1_word,
            mmcra: mmcra_word,
        },
        pmcs,
    )
}

/// Stop one counter without recomputing the group's image.
///
/// Clears the counter's selector byte in MMCR1; a zero selector counts
/// nothing. `pmc` is one-based. PMCs 5 and 6 have no selector field, so
/// this is a no-op for them.
pub fn disable_pmc(pmc: usize, mmcr: &mut MmcrImage) {
    if (1..=4).contains(&pmc) {
        mmcr.mmcr1 &= !(event::PSEL_MASK << mmcr1::pmcsel_shift(pmc));
    }
}

/// Structured view of MMCR0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GlobalControl {
    /// Overflow conditions enabled for PMC 1 (bit 15)
    pub pmc1_cond_enable: bool,

    /// Overflow conditions enabled for PMCs 2-6 (bit 14)
    pub pmcj_cond_enable: bool,
}

impl RegisterLayout for GlobalControl {
    fn to_spr_value(&self) -> u64 {
        (if self.pmc1_cond_enable {
            mmcr0::PMC1_COND_ENABLE
        } else {
            0
        }) | (if self.pmcj_cond_enable {
            mmcr0::PMCJ_COND_ENABLE
        } else {
            0
        })
    }

    fn from_spr_value(value: u64) -> Self {
        Self {
            pmc1_cond_enable: value & mmcr0::PMC1_COND_ENABLE != 0,
            pmcj_cond_enable: value & mmcr0::PMCJ_COND_ENABLE != 0,
        }
    }
}

/// Structured view of MMCR1.
///
/// Per-PMC arrays are indexed by `pmc - 1` for PMCs 1-4. The fabric
/// response/type filter aliases `psel[3]` and is not a separate field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventSelectControl {
    /// Unit select per PMC (4 bits each)
    pub unit: [u8; 4],

    /// Combine flag per PMC
    pub combine: [bool; 4],

    /// Event selector per PMC
    pub psel: [u8; 4],

    /// L1 instruction-cache qualifier (bit 46)
    pub ic_qual: bool,

    /// L1 data-cache qualifier (bit 47)
    pub dc_qual: bool,
}

impl RegisterLayout for EventSelectControl {
    fn to_spr_value(&self) -> u64 {
        let mut value = 0u64;
        for pmc in 1..=4usize {
            value |= pack(self.unit[pmc - 1] as u64 & 0xf, mmcr1::unit_shift(pmc));
            value |= pack(self.combine[pmc - 1] as u64, mmcr1::combine_shift(pmc));
            value |= pack(self.psel[pmc - 1] as u64, mmcr1::pmcsel_shift(pmc));
        }
        value
            | pack(self.ic_qual as u64, mmcr1::IC_QUAL_SHIFT)
            | pack(self.dc_qual as u64, mmcr1::DC_QUAL_SHIFT)
    }

    fn from_spr_value(value: u64) -> Self {
        let mut layout = Self {
            ic_qual: extract(value, mmcr1::IC_QUAL_SHIFT, 1) != 0,
            dc_qual: extract(value, mmcr1::DC_QUAL_SHIFT, 1) != 0,
            ..Self::default()
        };
        for pmc in 1..=4usize {
            layout.unit[pmc - 1] = extract(value, mmcr1::unit_shift(pmc), 0xf) as u8;
            layout.combine[pmc - 1] = extract(value, mmcr1::combine_shift(pmc), 1) != 0;
            layout.psel[pmc - 1] = extract(value, mmcr1::pmcsel_shift(pmc), 0xff) as u8;
        }
        layout
    }

    fn validate(&self) -> Result<(), &'static str> {
        if self.unit.iter().any(|&unit| unit > 0xf) {
            return Err("Unit select must be <= 0xF (4 bits)");
        }
        Ok(())
    }
}

/// Structured view of MMCRA.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SamplingControl {
    /// Marked-event sampling enable (bit 0)
    pub sample_enable: bool,

    /// Random sampling mode (bits 1-2)
    pub sample_mode: u8,

    /// Random sampling eligibility (bits 4-6)
    pub sample_elig: u8,

    /// Threshold start/stop control (bits 8-15)
    pub thresh_ctl: u8,

    /// Threshold event select (bits 16-18)
    pub thresh_sel: u8,

    /// Threshold compare (bits 32-41)
    pub thresh_cmp: u16,

    /// Continuous SDAR update on TLB miss (bit 42)
    pub sdar_mode_tlb: bool,
}

impl RegisterLayout for SamplingControl {
    fn to_spr_value(&self) -> u64 {
        (if self.sample_enable {
            mmcra::SAMPLE_ENABLE
        } else {
            0
        }) | pack(self.sample_mode as u64 & 0x3, mmcra::SAMP_MODE_SHIFT)
            | pack(self.sample_elig as u64 & 0x7, mmcra::SAMP_ELIG_SHIFT)
            | pack(self.thresh_ctl as u64, mmcra::THR_CTL_SHIFT)
            | pack(self.thresh_sel as u64 & 0x7, mmcra::THR_SEL_SHIFT)
            | pack(self.thresh_cmp as u64 & 0x3ff, mmcra::THR_CMP_SHIFT)
            | (if self.sdar_mode_tlb {
                mmcra::SDAR_MODE_TLB
            } else {
                0
            })
    }

    fn from_spr_value(value: u64) -> Self {
        Self {
            sample_enable: value & mmcra::SAMPLE_ENABLE != 0,
            sample_mode: extract(value, mmcra::SAMP_MODE_SHIFT, 0x3) as u8,
            sample_elig: extract(value, mmcra::SAMP_ELIG_SHIFT, 0x7) as u8,
            thresh_ctl: extract(value, mmcra::THR_CTL_SHIFT, 0xff) as u8,
            thresh_sel: extract(value, mmcra::THR_SEL_SHIFT, 0x7) as u8,
            thresh_cmp: extract(value, mmcra::THR_CMP_SHIFT, 0x3ff) as u16,
            sdar_mode_tlb: value & mmcra::SDAR_MODE_TLB != 0,
        }
    }

    fn validate(&self) -> Result<(), &'static str> {
        if self.sample_mode > 3 {
            return Err("Sampling mode must be <= 3 (2 bits)");
        }
        if self.sample_elig > 7 {
            return Err("Sampling eligibility must be <= 7 (3 bits)");
        }
        if self.thresh_sel > 7 {
            return Err("Threshold select must be <= 7 (3 bits)");
        }
        if self.thresh_cmp > 0x3ff {
            return Err("Threshold compare must be <= 0x3FF (10 bits)");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::power8::constraint::{get_constraint, pmc_mask, pmc_val};
    use crate::arch::power8::event::{EventFields, FAB_RSP_MATCH, FAB_RSP_MATCH_CYC};
    use crate::arch::power8::events::{PM_CYC, PM_INST_CMPL, PM_RUN_CYC, PM_RUN_INST_CMPL};

    fn event_with(fields: EventFields) -> u64 {
        fields.encode()
    }

    #[test]
    fn test_four_unpinned_events_fill_the_pool() {
        let events: Vec<u64> = (1..=4)
            .map(|unit| {
                event_with(EventFields {
                    psel: 0x10 + unit,
                    unit,
                    ..Default::default()
                })
            })
            .collect();

        let (image, pmcs) = compute_mmcr(&events);
        assert_eq!(pmcs, vec![0, 1, 2, 3]);

        let layout = EventSelectControl::from_spr_value(image.mmcr1);
        for (i, &event) in events.iter().enumerate() {
            assert_eq!(layout.psel[i], (event & event::PSEL_MASK) as u8);
            assert_eq!(layout.unit[i] as u64, (event >> event::UNIT_SHIFT) & 0xf);
        }

        assert_eq!(
            image.mmcr0,
            mmcr0::PMC1_COND_ENABLE | mmcr0::PMCJ_COND_ENABLE
        );
    }

    #[test]
    fn test_unpinned_events_skip_pinned_counters() {
        let pinned_1 = event_with(EventFields {
            psel: 0x68,
            pmc: 1,
            ..Default::default()
        });
        let pinned_3 = event_with(EventFields {
            psel: 0x36,
            pmc: 3,
            ..Default::default()
        });
        let events = [pinned_1, pinned_3, PM_CYC, PM_INST_CMPL];

        let (_, pmcs) = compute_mmcr(&events);
        assert_eq!(pmcs, vec![0, 2, 1, 3]);
    }

    #[test]
    fn test_constraint_and_synthesis_agree_on_pinning() {
        let pinned = event_with(EventFields {
            psel: 0x36,
            pmc: 3,
            ..Default::default()
        });

        let vector = get_constraint(pinned).unwrap();
        assert_eq!(vector.value & pmc_mask(3), 0);
        assert_eq!(vector.value & pmc_val(3), pmc_val(3));

        let (_, pmcs) = compute_mmcr(&[pinned]);
        assert_eq!(pmcs, vec![2]);

        let unpinned = PM_CYC;
        let vector = get_constraint(unpinned).unwrap();
        assert_eq!(vector.mask & 0xfff, 0);
        let (_, pmcs) = compute_mmcr(&[unpinned]);
        assert_eq!(pmcs, vec![0]);
    }

    #[test]
    fn test_run_latch_counters_bypass_mmcr1() {
        let (image, pmcs) = compute_mmcr(&[PM_RUN_INST_CMPL, PM_RUN_CYC]);
        assert_eq!(pmcs, vec![4, 5]);
        assert_eq!(image.mmcr1, 0);
        assert_eq!(image.mmcr0, mmcr0::PMCJ_COND_ENABLE);
    }

    #[test]
    fn test_l1_qualifier_bits() {
        // Cache code 0b10: data-cache qualifier set, instruction-cache
        // qualifier clear.
        let event = event_with(EventFields {
            psel: 0x3e,
            unit: 2,
            cache_sel: 0x4 | 0x2,
            ..Default::default()
        });

        let (image, _) = compute_mmcr(&[event]);
        let layout = EventSelectControl::from_spr_value(image.mmcr1);
        assert!(layout.dc_qual);
        assert!(!layout.ic_qual);

        // And the mirror image for 0b01.
        let event = event_with(EventFields {
            psel: 0x3e,
            unit: 2,
            cache_sel: 0x4 | 0x1,
            ..Default::default()
        });
        let (image, _) = compute_mmcr(&[event]);
        let layout = EventSelectControl::from_spr_value(image.mmcr1);
        assert!(!layout.dc_qual);
        assert!(layout.ic_qual);
    }

    #[test]
    fn test_marked_event_sampling_fields() {
        let event = event_with(EventFields {
            psel: 0x3c,
            marked: true,
            sample: 0b10110,
            ..Default::default()
        });

        let (image, _) = compute_mmcr(&[event]);
        let layout = SamplingControl::from_spr_value(image.mmcra);
        assert!(layout.sample_enable);
        assert_eq!(layout.sample_mode, 0b10);
        assert_eq!(layout.sample_elig, 0b101);
        assert!(layout.sdar_mode_tlb);
    }

    #[test]
    fn test_marked_event_with_zero_sample_only_enables() {
        let event = event_with(EventFields {
            psel: 0x3c,
            marked: true,
            ..Default::default()
        });

        let (image, _) = compute_mmcr(&[event]);
        let layout = SamplingControl::from_spr_value(image.mmcra);
        assert!(layout.sample_enable);
        assert_eq!(layout.sample_mode, 0);
        assert_eq!(layout.sample_elig, 0);
    }

    #[test]
    fn test_fab_match_packs_into_mmcr1() {
        // PMC 3 variant: selector lands at bits 8-15, so the low byte is
        // exactly the match filter.
        let event = FAB_RSP_MATCH | (0xa4 << event::THRESH_CTL_SHIFT);
        let (image, _) = compute_mmcr(&[event]);
        assert_eq!(image.mmcr1 & 0xff, 0xa4);

        // PMC 4 variant: the match filter shares the low byte with the
        // PMC 4 selector.
        let event = FAB_RSP_MATCH_CYC | (0xa4 << event::THRESH_CTL_SHIFT);
        let (image, _) = compute_mmcr(&[event]);
        assert_eq!(image.mmcr1 & 0xff, 0xa4 | 0x52);

        // Threshold fields stay untouched either way.
        let sampling = SamplingControl::from_spr_value(image.mmcra);
        assert_eq!(sampling.thresh_ctl, 0);
        assert_eq!(sampling.thresh_sel, 0);
        assert_eq!(sampling.thresh_cmp, 0);
    }

    #[test]
    fn test_threshold_fields_pack_into_mmcra() {
        let event = event_with(EventFields {
            psel: 0x1e,
            thresh_sel: 0x5,
            thresh_ctl: 0x42,
            thresh_cmp: 0x0e0,
            ..Default::default()
        });

        let (image, _) = compute_mmcr(&[event]);
        let layout = SamplingControl::from_spr_value(image.mmcra);
        assert_eq!(layout.thresh_ctl, 0x42);
        assert_eq!(layout.thresh_sel, 0x5);
        assert_eq!(layout.thresh_cmp, 0x0e0);
    }

    #[test]
    fn test_sdar_mode_always_set() {
        let (image, _) = compute_mmcr(&[]);
        assert_eq!(image.mmcra, mmcra::SDAR_MODE_TLB);
        assert_eq!(image.mmcr0, 0);
    }

    #[test]
    fn test_disable_pmc_clears_selector() {
        let events = [
            event_with(EventFields {
                psel: 0x68,
                pmc: 1,
                ..Default::default()
            }),
            event_with(EventFields {
                psel: 0x36,
                pmc: 2,
                ..Default::default()
            }),
        ];
        let (mut image, _) = compute_mmcr(&events);

        disable_pmc(1, &mut image);
        let layout = EventSelectControl::from_spr_value(image.mmcr1);
        assert_eq!(layout.psel[0], 0);
        assert_eq!(layout.psel[1], 0x36);

        // PMCs without a selector field are left untouched.
        let before = image;
        disable_pmc(5, &mut image);
        disable_pmc(6, &mut image);
        assert_eq!(image, before);
    }

    #[test]
    fn test_global_control_round_trip() {
        let ctrl = GlobalControl {
            pmc1_cond_enable: true,
            pmcj_cond_enable: false,
        };
        assert_eq!(GlobalControl::from_spr_value(ctrl.to_spr_value()), ctrl);
    }

    #[test]
    fn test_event_select_control_round_trip() {
        let ctrl = EventSelectControl {
            unit: [0x2, 0x0, 0xf, 0x6],
            combine: [true, false, false, true],
            psel: [0x1e, 0x02, 0x56, 0xf4],
            ic_qual: true,
            dc_qual: false,
        };
        assert!(ctrl.validate().is_ok());
        assert_eq!(EventSelectControl::from_spr_value(ctrl.to_spr_value()), ctrl);
    }

    #[test]
    fn test_sampling_control_round_trip() {
        let ctrl = SamplingControl {
            sample_enable: true,
            sample_mode: 0b01,
            sample_elig: 0b110,
            thresh_ctl: 0xa4,
            thresh_sel: 0x5,
            thresh_cmp: 0x1e3,
            sdar_mode_tlb: true,
        };
        assert!(ctrl.validate().is_ok());
        assert_eq!(SamplingControl::from_spr_value(ctrl.to_spr_value()), ctrl);
    }

    #[test]
    fn test_sampling_control_validation() {
        let mut ctrl = SamplingControl::default();
        assert!(ctrl.validate().is_ok());

        ctrl.sample_mode = 4; // Too large (2 bits = max 3)
        assert!(ctrl.validate().is_err());

        ctrl.sample_mode = 3;
        ctrl.thresh_sel = 8; // Too large (3 bits = max 7)
        assert!(ctrl.validate().is_err());
    }
}

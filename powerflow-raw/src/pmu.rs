//! Capability descriptors and the PMU registry
//!
//! Each supported core family exposes one immutable [`PowerPmu`] describing
//! its counter pool and the operations a scheduler needs: constraint
//! generation, alternative-encoding lookup, control-register synthesis and
//! the per-counter disable hook. Descriptors are constructed once as
//! statics and shared read-only; every operation they reference is a pure
//! function, safe to call concurrently without synchronization.
//!
//! Dispatch by CPU identity is explicit: callers build a [`PmuRegistry`] at
//! startup and register the architectures they compiled in, keyed by the
//! platform identity string. An identity mismatch is a deliberate no-op, not
//! an error, so a multi-arch binary can offer every descriptor and let the
//! running platform pick.

use crate::constraint::ConstraintVector;
use crate::error::Result;
use crate::register::MmcrImage;

/// Optional hardware features a descriptor advertises to its scheduler.
pub mod flags {
    /// The sampled-instruction address register reports the pipeline slot.
    pub const HAS_SSLOT: u32 = 0x20;

    /// A sampled-event register qualifies sampled-address validity.
    pub const HAS_SIER: u32 = 0x40;
}

/// Cross-platform event identifiers, mapped by each architecture to a
/// native event code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenericEvent {
    CpuCycles,
    StalledCyclesFrontend,
    StalledCyclesBackend,
    Instructions,
    BranchInstructions,
    BranchMisses,
}

/// Capability descriptor for one POWER core family.
///
/// Read-only after construction. The function members operate on raw event
/// codes; their contracts are documented with the architecture modules that
/// implement them, e.g. [`crate::arch::power8`].
pub struct PowerPmu {
    /// Platform name, e.g. `"POWER8"`.
    pub name: &'static str,

    /// Identity string this descriptor registers under, e.g.
    /// `"ppc64/power8"`.
    pub cpu_type: &'static str,

    /// Size of the counter pool.
    pub n_counter: usize,

    /// Upper bound on the sequence [`Self::get_alternatives`] returns,
    /// input included.
    pub max_alternatives: usize,

    /// OR of the low bit of every adder field in the constraint layout; a
    /// scheduler adds this per accepted event when accumulating values.
    pub add_fields: u64,

    /// One-time bias a scheduler adds before the masked compare so that
    /// adder-field overflow detection is exact.
    pub test_adder: u64,

    /// Feature bits from [`flags`].
    pub flags: u32,

    /// Per-event constraint generation; rejects malformed event codes.
    pub get_constraint: fn(event: u64) -> Result<ConstraintVector>,

    /// Equivalent encodings of an event on other counter resources. The
    /// input is always element 0 of the result.
    pub get_alternatives: fn(event: u64, only_count_run: bool) -> Vec<u64>,

    /// Counter assignment and control-register synthesis for an accepted
    /// group. Returns the register image and each event's zero-based
    /// counter.
    pub compute_mmcr: fn(events: &[u64]) -> (MmcrImage, Vec<usize>),

    /// Clear one counter's event selector in an existing image. The counter
    /// number is one-based.
    pub disable_pmc: fn(pmc: usize, mmcr: &mut MmcrImage),

    /// Native event codes for the cross-platform identifiers.
    pub generic_events: &'static [(GenericEvent, u64)],
}

impl PowerPmu {
    /// Native event code for a cross-platform identifier, if this hardware
    /// has one.
    pub fn generic_event(&self, event: GenericEvent) -> Option<u64> {
        self.generic_events
            .iter()
            .find(|(generic, _)| *generic == event)
            .map(|(_, native)| *native)
    }
}

impl std::fmt::Debug for PowerPmu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PowerPmu")
            .field("name", &self.name)
            .field("cpu_type", &self.cpu_type)
            .field("n_counter", &self.n_counter)
            .field("max_alternatives", &self.max_alternatives)
            .field("flags", &format_args!("{:#x}", self.flags))
            .finish_non_exhaustive()
    }
}

/// Registry mapping platform identity strings to capability descriptors.
///
/// Built by the embedding scheduler at startup and injected wherever
/// dispatch by CPU identity is needed; nothing in this crate holds global
/// state.
#[derive(Debug, Default)]
pub struct PmuRegistry {
    entries: Vec<&'static PowerPmu>,
}

impl PmuRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor unconditionally.
    pub fn register(&mut self, pmu: &'static PowerPmu) {
        tracing::info!(
            name = pmu.name,
            cpu_type = pmu.cpu_type,
            n_counter = pmu.n_counter,
            "registering PMU"
        );
        self.entries.push(pmu);
    }

    /// Register `pmu` only if `running_cpu_type` matches its identity
    /// string. Returns whether the descriptor was registered; a mismatch is
    /// not an error.
    pub fn register_if(&mut self, running_cpu_type: &str, pmu: &'static PowerPmu) -> bool {
        if running_cpu_type != pmu.cpu_type {
            tracing::debug!(
                running = running_cpu_type,
                supported = pmu.cpu_type,
                "PMU does not match running platform, skipping"
            );
            return false;
        }
        self.register(pmu);
        true
    }

    /// Look up the descriptor registered for a platform identity string.
    pub fn lookup(&self, cpu_type: &str) -> Option<&'static PowerPmu> {
        self.entries
            .iter()
            .find(|pmu| pmu.cpu_type == cpu_type)
            .copied()
    }
}

#[cfg(test)]
#[cfg(feature = "power8")]
mod tests {
    use super::*;
    use crate::arch::power8;

    #[test]
    fn test_register_if_matches_platform() {
        let mut registry = PmuRegistry::new();
        assert!(registry.register_if("ppc64/power8", &power8::POWER8_PMU));
        assert_eq!(registry.lookup("ppc64/power8").unwrap().name, "POWER8");
    }

    #[test]
    fn test_register_if_mismatch_is_noop() {
        let mut registry = PmuRegistry::new();
        assert!(!registry.register_if("ppc64/power7", &power8::POWER8_PMU));
        assert!(registry.lookup("ppc64/power8").is_none());
        assert!(registry.lookup("ppc64/power7").is_none());
    }

    #[test]
    fn test_generic_event_lookup() {
        let pmu = &power8::POWER8_PMU;
        assert_eq!(
            pmu.generic_event(GenericEvent::CpuCycles),
            Some(power8::events::PM_CYC)
        );
        assert_eq!(
            pmu.generic_event(GenericEvent::BranchMisses),
            Some(power8::events::PM_BR_MPRED_CMPL)
        );
    }

    #[test]
    fn test_descriptor_operations_are_wired() {
        let pmu = &power8::POWER8_PMU;
        assert_eq!(pmu.n_counter, 6);

        let vector = (pmu.get_constraint)(power8::events::PM_CYC).unwrap();
        assert_ne!(vector.mask, 0);

        let alts = (pmu.get_alternatives)(power8::events::PM_CYC, false);
        assert_eq!(alts[0], power8::events::PM_CYC);
        assert!(alts.len() <= pmu.max_alternatives);

        let (image, pmcs) = (pmu.compute_mmcr)(&[power8::events::PM_CYC]);
        assert_eq!(pmcs.len(), 1);

        let mut image = image;
        (pmu.disable_pmc)(pmcs[0] + 1, &mut image);
    }
}

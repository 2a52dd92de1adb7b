//! Event rejection errors
//!
//! A raw event code can be malformed in a handful of hardware-defined ways;
//! constraint generation rejects such events up front so a scheduler never
//! has to roll back a partially accepted group.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EventError>;

/// Reasons a raw event code cannot be scheduled on this hardware.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EventError {
    #[error("event 0x{event:X} pins PMC {pmc}, but only PMCs 1-{max} exist")]
    PmcOutOfRange { event: u64, pmc: u8, max: u8 },

    #[error("PMC {pmc} counts a single dedicated event, not 0x{event:X}")]
    ReservedPmc { event: u64, pmc: u8 },

    #[error("event 0x{event:X} selects cache sub-unit {cache} on unit {unit}, which only supports selector 0")]
    CacheSelForbidden { event: u64, unit: u8, cache: u8 },

    #[error("event 0x{event:X} carries denormal threshold compare value 0x{cmp:X}")]
    ThreshCmpDenormal { event: u64, cmp: u16 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_error_display() {
        let err = EventError::PmcOutOfRange {
            event: 0x7001e,
            pmc: 7,
            max: 6,
        };
        assert!(err.to_string().contains("PMC 7"));

        let err = EventError::ThreshCmpDenormal {
            event: 0x100001e,
            cmp: 0x80,
        };
        assert!(err.to_string().contains("denormal"));
    }
}

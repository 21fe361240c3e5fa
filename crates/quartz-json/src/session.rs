//! Host session model: warning sink, packet limit, current date.

use std::fmt;

use chrono::NaiveDate;
use quartz_json_dom::PackedTemporal;

/// Diagnostics that do not fail the operation. Coercions distinguish
/// a value that is numerically out of range from one that is not a
/// number at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    OutOfRange { target: &'static str, context: String },
    InvalidCast { target: &'static str, context: String },
    PacketOverflow { limit: usize },
    SortingNonScalar,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::OutOfRange { target, context } => {
                write!(f, "value out of range for cast to {target} in {context}")
            }
            Warning::InvalidCast { target, context } => {
                write!(f, "invalid value for cast to {target} in {context}")
            }
            Warning::PacketOverflow { limit } => {
                write!(f, "result exceeds max_allowed_packet ({limit} bytes), truncated")
            }
            Warning::SortingNonScalar => {
                write!(f, "sorting of non-scalar JSON values is not supported yet")
            }
        }
    }
}

/// The slice of the host session this core needs: the configured
/// packet limit, the current date for time-to-datetime promotion, and
/// a warning sink.
#[derive(Debug, Clone)]
pub struct Session {
    pub max_allowed_packet: usize,
    pub current_date: NaiveDate,
    warnings: Vec<Warning>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            max_allowed_packet: 64 * 1024 * 1024,
            current_date: chrono::Local::now().date_naive(),
            warnings: Vec::new(),
        }
    }

    pub fn with_max_packet(max_allowed_packet: usize) -> Self {
        Self {
            max_allowed_packet,
            ..Self::new()
        }
    }

    pub fn push_warning(&mut self, warning: Warning) {
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn take_warnings(&mut self) -> Vec<Warning> {
        std::mem::take(&mut self.warnings)
    }

    /// Promote a pure time of day to a datetime on the session's
    /// current date.
    pub fn time_to_datetime(&self, time: PackedTemporal) -> PackedTemporal {
        let date = PackedTemporal::from_date(self.current_date);
        PackedTemporal::from_raw(date.raw() | time.raw().abs())
    }
}

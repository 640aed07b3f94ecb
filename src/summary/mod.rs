//! Aggregation of raw load statistics into chart-ready counters.
//!
//! The instrumentation buckets every non-vector load by addressing mode and
//! access width, producing keys of the form `load.<MODE>.<SIZE>` and
//! `global_stable_loads.<MODE>.<SIZE>`. This module knows those key families
//! and folds them into [`AggregateCounters`].

mod charts;
mod counters;

pub use counters::{
    missing_keys, required_keys, unused_keys, AggregateCounters, ConsistencyIssue,
};

use std::fmt;

use thiserror::Error;

/// Errors raised while aggregating statistics.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SummaryError {
    /// A key required by an aggregation formula is absent.
    #[error("required stats key {key:?} is missing")]
    MissingKey {
        /// Key that was looked up.
        key: String,
    },

    /// A summed counter does not fit in 64 bits.
    #[error("counter {counter} overflows a 64-bit count")]
    Overflow {
        /// Key pattern of the overflowing sum, e.g. `load.RIP.*`.
        counter: String,
    },
}

/// Addressing-mode classification of a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum AddressingMode {
    /// PC-relative (`RIP`-based) addressing.
    Rip,
    /// Stack-pointer relative addressing.
    Stack,
    /// Any other base register.
    Reg,
}

impl AddressingMode {
    /// All modes in chart order.
    pub const ALL: [AddressingMode; 3] = [Self::Rip, Self::Stack, Self::Reg];

    /// Segment used in stats keys.
    pub fn key_segment(self) -> &'static str {
        match self {
            Self::Rip => "RIP",
            Self::Stack => "STACK",
            Self::Reg => "REG",
        }
    }

    /// Human readable chart label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Rip => "PC-rel",
            Self::Stack => "Stack-rel",
            Self::Reg => "Reg-rel",
        }
    }

    /// Position within [`AddressingMode::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for AddressingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key_segment())
    }
}

/// Access width bucket of a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum LoadSize {
    /// 1 byte.
    B1,
    /// 2 bytes.
    B2,
    /// 4 bytes.
    B4,
    /// 8 bytes.
    B8,
    /// 16 bytes.
    B16,
    /// 32 bytes.
    B32,
    /// 64 bytes.
    B64,
}

impl LoadSize {
    /// All sizes in ascending order.
    pub const ALL: [LoadSize; 7] = [
        Self::B1,
        Self::B2,
        Self::B4,
        Self::B8,
        Self::B16,
        Self::B32,
        Self::B64,
    ];

    /// Width in bytes.
    pub fn bytes(self) -> u32 {
        1 << self.index()
    }

    /// Segment used in stats keys and chart labels (`"4B"`).
    pub fn key_segment(self) -> &'static str {
        match self {
            Self::B1 => "1B",
            Self::B2 => "2B",
            Self::B4 => "4B",
            Self::B8 => "8B",
            Self::B16 => "16B",
            Self::B32 => "32B",
            Self::B64 => "64B",
        }
    }

    /// Position within [`LoadSize::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for LoadSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key_segment())
    }
}

use std::fmt;

use tracing::warn;

use super::{AddressingMode, LoadSize, SummaryError};
use crate::stats::StatRecord;

const VECTOR_KEY: &str = "load.vector";
const NON_VECTOR_KEY: &str = "load.non_vector";
const GLOBAL_STABLE_TOTAL_KEY: &str = "global_stable_loads.total";
const LOAD_PREFIX: &str = "load";
const GLOBAL_STABLE_PREFIX: &str = "global_stable_loads";

fn bucket_key(prefix: &str, mode: AddressingMode, size: LoadSize) -> String {
    format!("{prefix}.{}.{}", mode.key_segment(), size.key_segment())
}

/// Add `count` into `slot`, naming the sum in the error.
fn accumulate(
    slot: &mut u64,
    count: u64,
    counter: impl FnOnce() -> String,
) -> Result<(), SummaryError> {
    *slot = slot
        .checked_add(count)
        .ok_or_else(|| SummaryError::Overflow { counter: counter() })?;
    Ok(())
}

fn wide_sum(counts: &[u64]) -> u128 {
    counts.iter().map(|&c| u128::from(c)).sum()
}

/// Every key the aggregation formulas read, in a fixed order.
pub fn required_keys() -> Vec<String> {
    let mut keys = vec![NON_VECTOR_KEY.to_string(), VECTOR_KEY.to_string()];
    for mode in AddressingMode::ALL {
        for size in LoadSize::ALL {
            keys.push(bucket_key(LOAD_PREFIX, mode, size));
        }
    }
    keys.push(GLOBAL_STABLE_TOTAL_KEY.to_string());
    for mode in AddressingMode::ALL {
        for size in LoadSize::ALL {
            keys.push(bucket_key(GLOBAL_STABLE_PREFIX, mode, size));
        }
    }
    keys
}

/// Required keys absent from `record`, in [`required_keys`] order.
pub fn missing_keys(record: &StatRecord) -> Vec<String> {
    required_keys()
        .into_iter()
        .filter(|key| !record.contains_key(key))
        .collect()
}

/// Keys of `record` that no aggregation formula reads, sorted.
///
/// The instrumentation also dumps instruction counts, per-IP stability and an
/// `UNCATEGORIZED` width bucket; those are accepted and left out of the charts.
pub fn unused_keys(record: &StatRecord) -> Vec<String> {
    let required = required_keys();
    let mut unused: Vec<String> = record
        .iter()
        .map(|(key, _)| key)
        .filter(|key| !required.iter().any(|r| r == key))
        .map(str::to_string)
        .collect();
    unused.sort_unstable();
    unused
}

/// Derived counters backing the five charts.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AggregateCounters {
    /// Loads into vector registers.
    pub vector_loads: u64,
    /// Loads into scalar registers.
    pub non_vector_loads: u64,
    /// Loads per addressing mode, indexed by [`AddressingMode::index`].
    pub loads_by_mode: [u64; 3],
    /// Loads per access width, indexed by [`LoadSize::index`].
    pub loads_by_size: [u64; 7],
    /// Loads classified as globally stable.
    pub global_stable_loads: u64,
    /// `non_vector_loads - global_stable_loads`, saturating at zero.
    pub non_global_stable_loads: u64,
    /// Globally stable loads per addressing mode.
    pub global_stable_by_mode: [u64; 3],
}

impl AggregateCounters {
    /// Fold the required keys of `record` into counters.
    ///
    /// Fails on the first required key that is absent; nothing is defaulted.
    /// Per-mode and per-size sums must fit in a `u64`.
    pub fn from_record(record: &StatRecord) -> Result<Self, SummaryError> {
        let vector_loads = record.require(VECTOR_KEY)?;
        let non_vector_loads = record.require(NON_VECTOR_KEY)?;

        let mut loads_by_mode = [0u64; 3];
        let mut loads_by_size = [0u64; 7];
        for mode in AddressingMode::ALL {
            for size in LoadSize::ALL {
                let count = record.require(&bucket_key(LOAD_PREFIX, mode, size))?;
                accumulate(&mut loads_by_mode[mode.index()], count, || {
                    format!("{LOAD_PREFIX}.{mode}.*")
                })?;
                accumulate(&mut loads_by_size[size.index()], count, || {
                    format!("{LOAD_PREFIX}.*.{size}")
                })?;
            }
        }

        let global_stable_loads = record.require(GLOBAL_STABLE_TOTAL_KEY)?;
        let mut global_stable_by_mode = [0u64; 3];
        for mode in AddressingMode::ALL {
            for size in LoadSize::ALL {
                let count = record.require(&bucket_key(GLOBAL_STABLE_PREFIX, mode, size))?;
                accumulate(&mut global_stable_by_mode[mode.index()], count, || {
                    format!("{GLOBAL_STABLE_PREFIX}.{mode}.*")
                })?;
            }
        }

        // Stability is only tracked for non-vector loads.
        let non_global_stable_loads = match non_vector_loads.checked_sub(global_stable_loads) {
            Some(rest) => rest,
            None => {
                warn!(
                    non_vector_loads,
                    global_stable_loads, "global-stable loads exceed non-vector loads; clamping to 0"
                );
                0
            }
        };

        Ok(Self {
            vector_loads,
            non_vector_loads,
            loads_by_mode,
            loads_by_size,
            global_stable_loads,
            non_global_stable_loads,
            global_stable_by_mode,
        })
    }

    /// Loads using `mode`, across all widths.
    pub fn loads_for_mode(&self, mode: AddressingMode) -> u64 {
        self.loads_by_mode[mode.index()]
    }

    /// Loads of width `size`, across all modes.
    pub fn loads_for_size(&self, size: LoadSize) -> u64 {
        self.loads_by_size[size.index()]
    }

    /// Globally stable loads using `mode`.
    pub fn global_stable_for_mode(&self, mode: AddressingMode) -> u64 {
        self.global_stable_by_mode[mode.index()]
    }

    /// Sanity checks on how the input's counters relate to each other.
    ///
    /// None of these are enforced; the instrumentation may bucket loads
    /// differently (e.g. an uncategorized width).
    pub fn consistency_issues(&self) -> Vec<ConsistencyIssue> {
        let by_size = wide_sum(&self.loads_by_size);
        let by_mode = wide_sum(&self.loads_by_mode);
        let stable_by_mode = wide_sum(&self.global_stable_by_mode);

        let mut issues = Vec::new();
        if by_size != by_mode {
            issues.push(ConsistencyIssue::SizeModeMismatch { by_size, by_mode });
        }
        if by_mode != u128::from(self.non_vector_loads) {
            issues.push(ConsistencyIssue::ModeTotalMismatch {
                by_mode,
                non_vector: self.non_vector_loads,
            });
        }
        if self.global_stable_loads > self.non_vector_loads {
            issues.push(ConsistencyIssue::StableExceedsNonVector {
                global_stable: self.global_stable_loads,
                non_vector: self.non_vector_loads,
            });
        }
        if stable_by_mode != u128::from(self.global_stable_loads) {
            issues.push(ConsistencyIssue::StableBreakdownMismatch {
                by_mode: stable_by_mode,
                total: self.global_stable_loads,
            });
        }
        issues
    }
}

/// A relation between counters that the input was expected to satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsistencyIssue {
    /// Per-width and per-mode totals disagree.
    SizeModeMismatch {
        /// Sum over widths.
        by_size: u128,
        /// Sum over modes.
        by_mode: u128,
    },
    /// Per-mode total differs from `load.non_vector`.
    ModeTotalMismatch {
        /// Sum over modes.
        by_mode: u128,
        /// `load.non_vector`.
        non_vector: u64,
    },
    /// More global-stable loads than non-vector loads.
    StableExceedsNonVector {
        /// `global_stable_loads.total`.
        global_stable: u64,
        /// `load.non_vector`.
        non_vector: u64,
    },
    /// Per-mode global-stable breakdown differs from its total.
    StableBreakdownMismatch {
        /// Sum over modes.
        by_mode: u128,
        /// `global_stable_loads.total`.
        total: u64,
    },
}

impl fmt::Display for ConsistencyIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::SizeModeMismatch { by_size, by_mode } => write!(
                f,
                "loads summed by size ({by_size}) differ from loads summed by mode ({by_mode})"
            ),
            Self::ModeTotalMismatch { by_mode, non_vector } => write!(
                f,
                "loads summed by mode ({by_mode}) differ from {NON_VECTOR_KEY} ({non_vector})"
            ),
            Self::StableExceedsNonVector {
                global_stable,
                non_vector,
            } => write!(
                f,
                "{GLOBAL_STABLE_TOTAL_KEY} ({global_stable}) exceeds {NON_VECTOR_KEY} ({non_vector})"
            ),
            Self::StableBreakdownMismatch { by_mode, total } => write!(
                f,
                "global-stable loads summed by mode ({by_mode}) differ from {GLOBAL_STABLE_TOTAL_KEY} ({total})"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zeroed_record() -> StatRecord {
        required_keys().into_iter().map(|key| (key, 0u64)).collect()
    }

    #[test]
    fn required_keys_cover_both_families() {
        let keys = required_keys();
        assert_eq!(keys.len(), 45);
        assert_eq!(keys[0], "load.non_vector");
        assert_eq!(keys[2], "load.RIP.1B");
        assert!(keys.contains(&"global_stable_loads.REG.64B".to_string()));
        assert!(keys.contains(&"global_stable_loads.total".to_string()));
    }

    #[test]
    fn unused_keys_lists_extra_instrumentation_keys() {
        let mut record = zeroed_record();
        record.extend([
            ("load.total", 9u64),
            ("icount.total", 100),
            ("stable_loads.RIP.UNCATEGORIZED", 1),
        ]);
        assert_eq!(
            unused_keys(&record),
            ["icount.total", "load.total", "stable_loads.RIP.UNCATEGORIZED"]
        );
        assert!(unused_keys(&zeroed_record()).is_empty());
    }

    #[test]
    fn sums_by_mode_and_by_size() {
        let mut record = zeroed_record();
        record.extend([
            ("load.non_vector", 21u64),
            ("load.RIP.1B", 1),
            ("load.STACK.1B", 2),
            ("load.REG.8B", 4),
            ("load.REG.64B", 14),
            ("global_stable_loads.total", 5),
            ("global_stable_loads.STACK.2B", 3),
            ("global_stable_loads.STACK.32B", 2),
        ]);

        let counters = AggregateCounters::from_record(&record).unwrap();
        assert_eq!(counters.loads_for_mode(AddressingMode::Rip), 1);
        assert_eq!(counters.loads_for_mode(AddressingMode::Stack), 2);
        assert_eq!(counters.loads_for_mode(AddressingMode::Reg), 18);
        assert_eq!(counters.loads_for_size(LoadSize::B1), 3);
        assert_eq!(counters.loads_for_size(LoadSize::B8), 4);
        assert_eq!(counters.loads_for_size(LoadSize::B64), 14);
        assert_eq!(counters.global_stable_for_mode(AddressingMode::Stack), 5);
        assert_eq!(counters.non_global_stable_loads, 16);
        assert!(counters.consistency_issues().is_empty());
    }

    #[test]
    fn missing_key_is_fatal() {
        let mut record: StatRecord = required_keys()
            .into_iter()
            .filter(|key| key != "load.STACK.16B")
            .map(|key| (key, 1u64))
            .collect();
        let err = AggregateCounters::from_record(&record).unwrap_err();
        assert_eq!(
            err,
            SummaryError::MissingKey {
                key: "load.STACK.16B".to_string()
            }
        );
        assert_eq!(missing_keys(&record), vec!["load.STACK.16B".to_string()]);

        record.extend([("load.STACK.16B", 1u64)]);
        assert!(missing_keys(&record).is_empty());
    }

    #[test]
    fn overflowing_mode_sum_is_an_error() {
        let mut record = zeroed_record();
        record.extend([("load.RIP.1B", u64::MAX), ("load.RIP.2B", 1)]);

        let err = AggregateCounters::from_record(&record).unwrap_err();
        assert_eq!(
            err,
            SummaryError::Overflow {
                counter: "load.RIP.*".to_string()
            }
        );
    }

    #[test]
    fn overflowing_stable_sum_is_an_error() {
        let mut record = zeroed_record();
        record.extend([
            ("global_stable_loads.REG.8B", u64::MAX),
            ("global_stable_loads.REG.64B", 5),
        ]);

        let err = AggregateCounters::from_record(&record).unwrap_err();
        assert!(matches!(err, SummaryError::Overflow { ref counter } if counter == "global_stable_loads.REG.*"));
    }

    #[test]
    fn consistency_sums_do_not_wrap() {
        let mut record = zeroed_record();
        record.extend([
            ("load.non_vector", u64::MAX),
            ("load.RIP.1B", u64::MAX),
            ("load.STACK.2B", u64::MAX),
        ]);

        let counters = AggregateCounters::from_record(&record).unwrap();
        let wide = 2 * u128::from(u64::MAX);
        assert!(counters
            .consistency_issues()
            .contains(&ConsistencyIssue::ModeTotalMismatch {
                by_mode: wide,
                non_vector: u64::MAX
            }));
        assert!(!counters
            .consistency_issues()
            .iter()
            .any(|issue| matches!(issue, ConsistencyIssue::SizeModeMismatch { .. })));
    }

    #[test]
    fn stable_overflow_clamps_and_is_reported() {
        let mut record = zeroed_record();
        record.extend([("load.non_vector", 4u64), ("global_stable_loads.total", 9)]);

        let counters = AggregateCounters::from_record(&record).unwrap();
        assert_eq!(counters.non_global_stable_loads, 0);
        assert!(counters
            .consistency_issues()
            .contains(&ConsistencyIssue::StableExceedsNonVector {
                global_stable: 9,
                non_vector: 4
            }));
    }
}

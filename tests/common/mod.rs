#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use load_inspector::summary::required_keys;

/// Stats text with every required key set to zero, then `overrides` applied.
///
/// A few keys the instrumentation emits but the charts ignore are included so
/// that tests exercise realistic files.
pub fn stats_text(overrides: &[(&str, u64)]) -> String {
    let mut lines = vec![
        "icount.total 123456".to_string(),
        "icount.inside_roi 120000".to_string(),
        String::new(),
    ];
    for key in required_keys() {
        let value = overrides
            .iter()
            .rev()
            .find(|(k, _)| *k == key)
            .map_or(0, |(_, v)| *v);
        lines.push(format!("{key} {value}"));
    }
    lines.push("load.RIP.UNCATEGORIZED 0".to_string());
    lines.join("\n") + "\n"
}

/// The concrete scenario: 10 vector loads, 90 non-vector PC-relative 4B loads,
/// all of them global-stable.
pub fn rip_scenario() -> String {
    stats_text(&[
        ("load.vector", 10),
        ("load.non_vector", 90),
        ("load.RIP.4B", 90),
        ("global_stable_loads.total", 90),
        ("global_stable_loads.RIP.4B", 90),
    ])
}

/// Write `contents` into `dir/name` and return the path.
pub fn write_stats(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write stats fixture");
    path
}

use super::{AddressingMode, AggregateCounters, LoadSize};
use crate::render::{PieChart, Slice, PALETTE};

impl AggregateCounters {
    /// The five charts of the summary figure, left to right.
    pub fn charts(&self) -> [PieChart; 5] {
        [
            PieChart::new(
                "Vector load fraction",
                vec![
                    Slice::new("Vector", self.vector_loads, PALETTE[0]),
                    Slice::new("Non-vector", self.non_vector_loads, PALETTE[1]),
                ],
            ),
            PieChart::new(
                "Loads by size",
                LoadSize::ALL
                    .into_iter()
                    .map(|size| {
                        Slice::new(
                            size.key_segment(),
                            self.loads_for_size(size),
                            PALETTE[size.index()],
                        )
                    })
                    .collect(),
            ),
            PieChart::new(
                "Loads by addressing mode",
                mode_slices(|mode| self.loads_for_mode(mode)),
            ),
            PieChart::new(
                "Global-stable loads",
                vec![
                    Slice::new("Global-stable", self.global_stable_loads, PALETTE[0]),
                    Slice::new(
                        "Non-global-stable",
                        self.non_global_stable_loads,
                        PALETTE[1],
                    ),
                ],
            ),
            PieChart::new(
                "Global-stable loads by addressing mode",
                mode_slices(|mode| self.global_stable_for_mode(mode)),
            ),
        ]
    }
}

fn mode_slices(count: impl Fn(AddressingMode) -> u64) -> Vec<Slice> {
    AddressingMode::ALL
        .into_iter()
        .map(|mode| Slice::new(mode.label(), count(mode), PALETTE[mode.index()]))
        .collect()
}

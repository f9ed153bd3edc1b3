use serde::{Deserialize, Serialize};

/// Configuration of a packing run
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct PackerConfig {
    ///Expected number of bins, used to preallocate the bin arena
    pub bin_hint: Option<usize>,
    ///If defined, the applications are packed in consecutive batches of this size
    pub batch_size: Option<usize>,
    ///Growth of the upper bound while the spread search has not found a feasible bin count
    pub spread_ub_increment: usize,
}

impl Default for PackerConfig {
    fn default() -> Self {
        Self {
            bin_hint: None,
            batch_size: None,
            spread_ub_increment: 51,
        }
    }
}

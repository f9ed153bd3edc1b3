use std::time::{Duration, Instant};

use anyhow::{Result, anyhow};
use log::{info, warn};
use rayon::prelude::*;

use crate::entities::Instance;
use crate::lower_bounds::LowerBound;
use crate::packing::{AlgoRegistry, Packer};
use crate::resources::Demand;
use crate::util::PackerConfig;

/// Outcome of one algorithm of a sweep
#[derive(Debug)]
pub struct SweepResult {
    pub key: String,
    /// Number of bins, or why the algorithm could not produce a solution
    pub n_bins: Result<usize>,
    pub elapsed: Duration,
}

#[derive(Debug)]
pub struct SweepReport {
    pub instance: String,
    pub lower_bound: usize,
    /// Bins used by First-Fit, the upper bound handed to the spread algorithms
    pub upper_bound: usize,
    /// One result per requested key, in request order
    pub results: Vec<SweepResult>,
}

impl SweepReport {
    /// The result with the fewest bins, the first one among ties
    pub fn best(&self) -> Option<&SweepResult> {
        self.results
            .iter()
            .filter_map(|r| r.n_bins.as_ref().ok().map(|n| (*n, r)))
            .min_by_key(|(n, _)| *n)
            .map(|(_, r)| r)
    }
}

/// Runs every algorithm in `keys` on `instance`, in parallel.
/// Every run owns its own bins, the instance is shared read-only.
pub fn sweep<D: Demand>(
    instance: &Instance<D>,
    registry: &AlgoRegistry,
    keys: &[&str],
    config: PackerConfig,
) -> Result<SweepReport>
where
    Instance<D>: LowerBound,
{
    let lower_bound = instance.lower_bound().max(1);
    let upper_bound = registry
        .build("FF", instance, config)
        .ok_or_else(|| anyhow!("the registry needs an FF algorithm to bound the spread search"))?
        .solve()?;

    info!(
        "[SWEEP] {}: {} algorithms, bounds [{}, {}]",
        instance.name,
        keys.len(),
        lower_bound,
        upper_bound
    );

    let results = keys
        .par_iter()
        .map(|key| {
            let start = Instant::now();
            let n_bins = match registry.build(key, instance, config) {
                Some(packer) => run(packer, config, lower_bound, upper_bound),
                None => {
                    warn!("[SWEEP] unknown algorithm {key}, skipping");
                    Err(anyhow!("unknown algorithm: {key}"))
                }
            };
            SweepResult {
                key: key.to_string(),
                n_bins,
                elapsed: start.elapsed(),
            }
        })
        .collect::<Vec<_>>();

    Ok(SweepReport {
        instance: instance.name.clone(),
        lower_bound,
        upper_bound,
        results,
    })
}

fn run<D: Demand>(mut packer: Packer<D>, config: PackerConfig, lb: usize, ub: usize) -> Result<usize> {
    match (packer.strategy.is_spread(), config.batch_size) {
        (true, _) => packer.solve_spread(lb, ub),
        (false, Some(batch_size)) => packer.solve_per_batch(batch_size),
        (false, None) => packer.solve(),
    }
}

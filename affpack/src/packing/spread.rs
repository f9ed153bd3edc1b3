use std::time::Instant;

use anyhow::{Result, bail};
use log::{debug, info};

use crate::packing::packer::sort_apps;
use crate::packing::state::{Direction, RunStatus};
use crate::packing::{AppOrder, Measure, Packer, Reorder, Strategy};
use crate::resources::Demand;

impl<D: Demand> Packer<'_, D> {
    /// Searches the smallest number of bins for which the round-robin spread placement succeeds,
    /// between `lb` and `ub`. When `ub` itself is infeasible, the upper bound grows by
    /// [`spread_ub_increment`](crate::util::PackerConfig::spread_ub_increment) until it becomes feasible.
    ///
    /// The bins of the best probe are retained as the solution. Returns the number of bins.
    pub fn solve_spread(&mut self, lb: usize, ub: usize) -> Result<usize> {
        let Strategy::Spread {
            measure,
            replicas_per_visit,
        } = self.strategy
        else {
            bail!("{} is not a spread strategy", self.label);
        };
        match self.state.status {
            RunStatus::Solved => return Ok(self.n_bins()),
            RunStatus::Failed => bail!("{} previously failed, clear the solution first", self.label),
            RunStatus::Unsolved => {}
        }
        let start = Instant::now();
        let max_bins = self.instance.total_replicas().max(1);
        let k = replicas_per_visit.max(1);

        let mut low = lb.max(1).min(max_bins);
        let mut best = ub.max(low);

        if !self.try_spread(best, measure, k) {
            loop {
                if best >= max_bins {
                    self.state.clear();
                    bail!(
                        "{}: no feasible spread placement found with up to {} bins",
                        self.label,
                        best
                    );
                }
                low = best + 1;
                best = (best + self.config.spread_ub_increment.max(1)).min(max_bins);
                debug!("[SPREAD] {}: raising upper bound to {}", self.label, best);
                if self.try_spread(best, measure, k) {
                    break;
                }
            }
        }

        let mut best_bins = self.bins_snapshot();
        while low < best {
            let target = (low + best) / 2;
            debug!("[SPREAD] {}: probing {} bins ({}, {})", self.label, target, low, best);
            match self.try_spread(target, measure, k) {
                true => {
                    best = target;
                    best_bins = self.bins_snapshot();
                }
                false => low = target + 1,
            }
        }
        self.set_solution(best_bins);

        info!(
            "[SPREAD] {} solved {} with {} bins in {:.3}ms",
            self.label,
            self.instance.name,
            best,
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(best)
    }

    /// Tries to place all replicas round-robin over exactly `n_bins` bins.
    /// Each bin visit places at most `k` replicas of the current app.
    /// Fails as soon as a replica finds no host after a full wrap around the bins.
    fn try_spread(&mut self, n_bins: usize, measure: Measure, k: usize) -> bool {
        let instance = self.instance;
        let state = &mut self.state;
        state.clear();
        for _ in 0..n_bins {
            state.open_bin(instance);
        }
        state.update_bin_measures(instance, measure, 0);
        sort_apps(&mut state.app_order, instance, AppOrder::Size(measure));

        for pos in 0..state.app_order.len() {
            let app = &instance.apps[state.app_order[pos]];
            let mut cursor = 0;
            let mut remaining = app.n_replicas;
            while remaining > 0 {
                let start = cursor;
                loop {
                    let bin_id = state.bin_order[cursor];
                    let mut placed = 0;
                    while remaining > 0 && placed < k && state.can_host(bin_id, app) {
                        state.place(bin_id, app, remaining - 1);
                        remaining -= 1;
                        placed += 1;
                    }
                    cursor = (cursor + 1) % n_bins;
                    if placed > 0 {
                        break;
                    }
                    if cursor == start {
                        return false;
                    }
                }
            }
            state.update_bin_measures(instance, measure, 0);
            state.sort_bins(0, Direction::Decreasing, Reorder::StableSort);
        }
        true
    }
}

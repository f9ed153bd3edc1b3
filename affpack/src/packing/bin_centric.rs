use std::ops::Range;

use anyhow::Result;
use log::trace;

use crate::packing::{FitScore, Packer};
use crate::resources::Demand;
use crate::util::bubble_up;

impl<D: Demand> Packer<'_, D> {
    /// Bin-centric allocation: one bin is filled at a time.
    ///
    /// The remaining apps are scored against the residual of the open bin, the best one is packed
    /// with as many replicas as the bin accepts, and so on until the bin is saturated or every app
    /// was considered. Fully packed apps are swapped to the front of the range and never revisited.
    pub(crate) fn allocate_bin_centric(&mut self, range: Range<usize>, score: FitScore) -> Result<()> {
        let instance = self.instance;
        let state = &mut self.state;

        let mut next_replica = vec![0; instance.n_apps()];
        let mut treated = range.start;

        while treated < range.end {
            let bin_id = state.open_bin_guarded(instance)?;

            let mut current = treated;
            while current < range.end {
                state.update_fit_scores(instance, score, bin_id, current, range.end);
                let measures = &state.app_measures;
                bubble_up(&mut state.app_order[current..range.end], |x, y| {
                    measures[x] > measures[y]
                });

                let a = state.app_order[current];
                let app = &instance.apps[a];
                while next_replica[a] < app.n_replicas && state.can_host(bin_id, app) {
                    state.place(bin_id, app, next_replica[a]);
                    next_replica[a] += 1;
                }

                if next_replica[a] >= app.n_replicas {
                    state.app_order.swap(treated, current);
                    treated += 1;
                }
                current += 1;

                if state.bins[bin_id].is_saturated() {
                    trace!("[PACK] bin {} saturated", bin_id);
                    break;
                }
            }
        }
        Ok(())
    }
}

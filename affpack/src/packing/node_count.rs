use std::ops::Range;

use anyhow::Result;
use log::trace;

use crate::entities::Application;
use crate::packing::packer::sort_apps;
use crate::packing::state::PackState;
use crate::packing::{AppOrder, Packer};
use crate::resources::Demand;
use crate::util::bubble_up;

impl<D: Demand> Packer<'_, D> {
    /// Node-centric allocation, most constrained application first.
    ///
    /// Every application keeps the list of bins it can still be placed in (its candidates).
    /// After all replicas of an app are placed, only the candidates of its affinity neighbours
    /// can have become infeasible, and only for the bins that were just touched.
    /// The next application is the remaining one with the fewest candidates.
    pub(crate) fn allocate_node_count(&mut self, range: Range<usize>) -> Result<()> {
        let instance = self.instance;
        let state = &mut self.state;
        sort_apps(&mut state.app_order[range.clone()], instance, AppOrder::Degree);

        // bins may already be open from previous batches
        let mut candidates: Vec<Vec<usize>> = instance
            .apps
            .iter()
            .map(|app| {
                (0..state.n_bins())
                    .filter(|b| state.can_host(*b, app))
                    .collect()
            })
            .collect();
        for (a, c) in candidates.iter().enumerate() {
            state.app_measures[a] = c.len() as f64;
        }

        for pos in range.clone() {
            let a = state.app_order[pos];
            let app = &instance.apps[a];
            let mut touched: Vec<usize> = vec![];

            let mut cursor = 0;
            for replica in 0..app.n_replicas {
                let mut placed = false;
                while !placed && cursor < candidates[a].len() {
                    let bin_id = candidates[a][cursor];
                    if state.can_host(bin_id, app) {
                        state.place(bin_id, app, replica);
                        if !touched.contains(&bin_id) {
                            touched.push(bin_id);
                        }
                        placed = true;
                    } else {
                        cursor += 1;
                    }
                }
                if !placed {
                    let bin_id = state.open_bin_guarded(instance)?;
                    for &other in &state.app_order[pos + 1..range.end] {
                        candidates[other].push(bin_id);
                        state.app_measures[other] = candidates[other].len() as f64;
                    }
                    candidates[a].push(bin_id);
                    cursor = candidates[a].len() - 1;

                    state.place(bin_id, app, replica);
                    touched.push(bin_id);
                }
            }
            state.fully_packed[a] = true;

            let neighbours = app.affinity_in.keys().chain(app.affinity_out.keys());
            for &n in neighbours {
                if !state.fully_packed[n] {
                    prune_candidates(state, instance.app(n), &touched, &mut candidates[n]);
                }
            }
            trace!(
                "[PACK] NodeCount placed {} over {} bins",
                app.id,
                touched.len()
            );

            let measures = &state.app_measures;
            bubble_up(&mut state.app_order[pos + 1..range.end], |x, y| {
                measures[x] < measures[y]
            });
        }
        Ok(())
    }
}

/// Removes the bins of `touched` which can no longer host `app` from its candidates.
fn prune_candidates<D: Demand>(
    state: &mut PackState<D>,
    app: &Application<D>,
    touched: &[usize],
    candidates: &mut Vec<usize>,
) {
    for bin_id in touched {
        if !state.can_host(*bin_id, app) {
            if let Some(p) = candidates.iter().position(|b| b == bin_id) {
                candidates.remove(p);
                state.app_measures[app.internal_id] = candidates.len() as f64;
            }
        }
    }
}

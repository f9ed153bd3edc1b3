use std::cmp::Reverse;
use std::ops::Range;
use std::time::Instant;

use anyhow::{Result, bail, ensure};
use log::{debug, info};
use ordered_float::OrderedFloat;

use crate::entities::{Bin, Instance};
use crate::packing::state::{Direction, PackState, RunStatus};
use crate::packing::{AppOrder, BinSelection, Strategy};
use crate::resources::Demand;
use crate::util::PackerConfig;
use crate::util::assertions::solution_valid;

/// Runs one packing [`Strategy`] on an [`Instance`].
/// The packer owns all bins of its run; the instance is only ever read.
#[derive(Clone, Debug)]
pub struct Packer<'a, D: Demand> {
    pub instance: &'a Instance<D>,
    pub strategy: Strategy,
    pub config: PackerConfig,
    pub(crate) state: PackState<D>,
    /// Name under which the strategy is reported
    pub(crate) label: String,
}

impl<'a, D: Demand> Packer<'a, D> {
    pub fn new(instance: &'a Instance<D>, strategy: Strategy, config: PackerConfig) -> Self {
        Self {
            instance,
            strategy,
            config,
            state: PackState::new(instance, config.bin_hint),
            label: format!("{strategy:?}"),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Packs all applications in a single batch and returns the number of bins used.
    /// Solving an already solved run returns the cached result.
    pub fn solve(&mut self) -> Result<usize> {
        let n_apps = self.instance.n_apps();
        self.solve_batches(n_apps.max(1))
    }

    /// Packs the applications in consecutive batches of `batch_size`.
    /// Every batch continues to fill the bins opened by the previous ones.
    pub fn solve_per_batch(&mut self, batch_size: usize) -> Result<usize> {
        ensure!(batch_size > 0, "batch size must be positive");
        self.solve_batches(batch_size)
    }

    fn solve_batches(&mut self, batch_size: usize) -> Result<usize> {
        match self.state.status {
            RunStatus::Solved => return Ok(self.n_bins()),
            RunStatus::Failed => bail!(
                "{} previously failed on {}, clear the solution first",
                self.label,
                self.instance.name
            ),
            RunStatus::Unsolved => {}
        }
        ensure!(
            !self.strategy.is_spread(),
            "{} is a spread strategy, use solve_spread",
            self.label
        );

        let start = Instant::now();
        let n_apps = self.instance.n_apps();
        let mut first = 0;
        while first < n_apps {
            let end = (first + batch_size).min(n_apps);
            debug!("[PACK] {}: allocating apps {}..{}", self.label, first, end);
            self.allocate_batch(first..end)?;
            first = end;
        }
        self.state.status = RunStatus::Solved;

        debug_assert!(solution_valid(self.instance, &self.state.bins));

        info!(
            "[PACK] {} solved {} with {} bins in {:.3}ms",
            self.label,
            self.instance.name,
            self.n_bins(),
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(self.n_bins())
    }

    fn allocate_batch(&mut self, range: Range<usize>) -> Result<()> {
        match self.strategy {
            Strategy::ItemCentric { order, selection } => {
                self.allocate_item_centric(range, order, selection)
            }
            Strategy::NodeCount => self.allocate_node_count(range),
            Strategy::BinCentric(score) => self.allocate_bin_centric(range, score),
            Strategy::Spread { .. } => bail!("spread strategies do not allocate per batch"),
        }
    }

    /// Replica by replica: every replica goes to the first bin, in the current bin order,
    /// which can host it. A new bin is opened when none can.
    fn allocate_item_centric(
        &mut self,
        range: Range<usize>,
        order: AppOrder,
        selection: BinSelection,
    ) -> Result<()> {
        let instance = self.instance;
        sort_apps(&mut self.state.app_order[range.clone()], instance, order);

        for pos in range {
            let app = &instance.apps[self.state.app_order[pos]];
            // bins before the cursor cannot host any further replica of this app
            let mut cursor = 0;
            for replica in 0..app.n_replicas {
                self.sort_bins(cursor, selection);
                loop {
                    if cursor >= self.state.n_bins() {
                        self.state.open_bin_guarded(instance)?;
                    }
                    let bin_id = self.state.bin_order[cursor];
                    if self.state.can_host(bin_id, app) {
                        self.state.place(bin_id, app, replica);
                        self.update_bin_measures(cursor, bin_id, selection);
                        break;
                    }
                    cursor += 1;
                }
            }
        }
        Ok(())
    }

    fn sort_bins(&mut self, cursor: usize, selection: BinSelection) {
        match selection {
            BinSelection::FirstFit => {}
            BinSelection::BestFit { reorder, .. } => {
                self.state.sort_bins(cursor, Direction::Increasing, reorder)
            }
            BinSelection::WorstFit { reorder, .. } => {
                self.state.sort_bins(cursor, Direction::Decreasing, reorder)
            }
        }
    }

    fn update_bin_measures(&mut self, cursor: usize, bin_id: usize, selection: BinSelection) {
        if let Some(measure) = selection.measure() {
            match measure.is_global() {
                true => self.state.update_bin_measures(self.instance, measure, cursor),
                false => self.state.update_bin_measure(self.instance, measure, bin_id),
            }
        }
    }

    /// Number of bins of the current run
    pub fn n_bins(&self) -> usize {
        self.state.n_bins()
    }

    /// Number of bins, if the run is solved
    pub fn solution(&self) -> Option<usize> {
        match self.state.status {
            RunStatus::Solved => Some(self.state.n_bins()),
            _ => None,
        }
    }

    pub fn status(&self) -> RunStatus {
        self.state.status
    }

    pub fn is_solved(&self) -> bool {
        self.state.status == RunStatus::Solved
    }

    /// Bins of the run, in creation order
    pub fn bins(&self) -> &[Bin<D>] {
        &self.state.bins
    }

    pub fn bins_snapshot(&self) -> Vec<Bin<D>> {
        self.state.bins.clone()
    }

    /// Installs `bins` as the solution of this run.
    pub fn set_solution(&mut self, bins: Vec<Bin<D>>) {
        self.state.clear();
        self.state.set_bins(self.instance, bins);
        self.state.status = RunStatus::Solved;
        debug_assert!(solution_valid(self.instance, &self.state.bins));
    }

    /// Discards all bins, the run can be solved again afterwards.
    pub fn clear_solution(&mut self) {
        self.state.clear();
    }
}

/// Stable sort of the apps according to `order`, all orders are decreasing.
pub(crate) fn sort_apps<D: Demand>(apps: &mut [usize], instance: &Instance<D>, order: AppOrder) {
    match order {
        AppOrder::Input => {}
        AppOrder::Degree => apps.sort_by_key(|a| Reverse(instance.apps[*a].total_degree)),
        AppOrder::Size(measure) => {
            apps.sort_by_key(|a| Reverse(OrderedFloat(instance.apps[*a].size(measure))))
        }
    }
}

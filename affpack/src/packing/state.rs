use std::cmp::Reverse;

use anyhow::{Result, bail};
use log::error;
use ordered_float::OrderedFloat;

use crate::entities::{Application, Bin, Instance};
use crate::packing::measures::{MeasureContext, bin_measure, fit_score};
use crate::packing::{FitScore, Measure, Reorder};
use crate::resources::{Demand, Residual};
use crate::util::bubble_up;

/// Lifecycle of a packing run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunStatus {
    Unsolved,
    Solved,
    /// The run was abandoned, its bins are not a usable solution
    Failed,
}

/// All mutable state of one packing run. Bins and apps are addressed by index,
/// scores live in side tables owned by the run.
#[derive(Clone, Debug)]
pub struct PackState<D: Demand> {
    /// Bin arena, indexed by bin id (creation order)
    pub bins: Vec<Bin<D>>,
    /// Order in which the bins are searched
    pub bin_order: Vec<usize>,
    /// Score of every bin, indexed by bin id
    pub bin_measures: Vec<f64>,
    /// Order in which the apps are handled, as internal ids
    pub app_order: Vec<usize>,
    /// Score of every app, indexed by internal id
    pub app_measures: Vec<f64>,
    pub fully_packed: Vec<bool>,
    /// Residual cpu per step, summed over all open bins
    pub pool_cpu: Vec<f64>,
    /// Residual memory per step, summed over all open bins
    pub pool_mem: Vec<f64>,
    pub status: RunStatus,
}

impl<D: Demand> PackState<D> {
    pub fn new(instance: &Instance<D>, bin_hint: Option<usize>) -> Self {
        let n_apps = instance.n_apps();
        let hint = bin_hint.unwrap_or(0);
        Self {
            bins: Vec::with_capacity(hint),
            bin_order: Vec::with_capacity(hint),
            bin_measures: Vec::with_capacity(hint),
            app_order: (0..n_apps).collect(),
            app_measures: vec![0.0; n_apps],
            fully_packed: vec![false; n_apps],
            pool_cpu: vec![0.0; instance.n_steps],
            pool_mem: vec![0.0; instance.n_steps],
            status: RunStatus::Unsolved,
        }
    }

    /// Discards all bins and scheduling state
    pub fn clear(&mut self) {
        self.bins.clear();
        self.bin_order.clear();
        self.bin_measures.clear();
        let n_apps = self.app_order.len();
        self.app_order = (0..n_apps).collect();
        self.app_measures.iter_mut().for_each(|m| *m = 0.0);
        self.fully_packed.iter_mut().for_each(|p| *p = false);
        self.pool_cpu.iter_mut().for_each(|g| *g = 0.0);
        self.pool_mem.iter_mut().for_each(|g| *g = 0.0);
        self.status = RunStatus::Unsolved;
    }

    pub fn n_bins(&self) -> usize {
        self.bins.len()
    }

    /// Opens an empty bin at the back of the search order and returns its id.
    pub fn open_bin(&mut self, instance: &Instance<D>) -> usize {
        let id = self.bins.len();
        let bin: Bin<D> = Bin::new(id, instance.capacity, instance.n_steps);
        for t in 0..instance.n_steps {
            self.pool_cpu[t] += bin.residual.cpu_at(t);
            self.pool_mem[t] += bin.residual.mem_at(t);
        }
        self.bins.push(bin);
        self.bin_order.push(id);
        self.bin_measures.push(0.0);
        id
    }

    /// Opens a bin, unless the run has already created more bins than there are replicas.
    /// That can only happen through a defect in an allocation loop, so the run is marked failed.
    pub fn open_bin_guarded(&mut self, instance: &Instance<D>) -> Result<usize> {
        let id = self.open_bin(instance);
        if self.bins.len() > instance.total_replicas() {
            error!(
                "[PACK] there seems to be a problem with instance {}: created {} bins for {} replicas",
                instance.name,
                self.bins.len(),
                instance.total_replicas()
            );
            self.status = RunStatus::Failed;
            bail!(
                "runaway allocation on instance {}: {} bins created",
                instance.name,
                self.bins.len()
            );
        }
        Ok(id)
    }

    pub fn can_host(&self, bin_id: usize, app: &Application<D>) -> bool {
        self.bins[bin_id].can_host(app)
    }

    /// Places replica `replica` of `app` in bin `bin_id`
    pub fn place(&mut self, bin_id: usize, app: &Application<D>, replica: usize) {
        self.bins[bin_id].place(app, replica);
        for t in 0..app.demand.n_steps() {
            self.pool_cpu[t] -= app.demand.cpu_at(t);
            self.pool_mem[t] -= app.demand.mem_at(t);
        }
    }

    /// Replaces all bins, e.g. by a copy of an earlier run.
    pub fn set_bins(&mut self, instance: &Instance<D>, bins: Vec<Bin<D>>) {
        self.pool_cpu.iter_mut().for_each(|g| *g = 0.0);
        self.pool_mem.iter_mut().for_each(|g| *g = 0.0);
        for bin in &bins {
            for t in 0..instance.n_steps {
                self.pool_cpu[t] += bin.residual.cpu_at(t);
                self.pool_mem[t] += bin.residual.mem_at(t);
            }
        }
        self.bin_order = (0..bins.len()).collect();
        self.bin_measures = vec![0.0; bins.len()];
        self.bins = bins;
    }

    /// Rescores bin `bin_id`
    pub fn update_bin_measure(&mut self, instance: &Instance<D>, measure: Measure, bin_id: usize) {
        let ctx = MeasureContext::new(instance, self.bins.len(), &self.pool_cpu, &self.pool_mem);
        self.bin_measures[bin_id] = bin_measure(measure, &self.bins[bin_id].residual, &ctx);
    }

    /// Rescores every bin from position `from` of the search order onward
    pub fn update_bin_measures(&mut self, instance: &Instance<D>, measure: Measure, from: usize) {
        let ctx = MeasureContext::new(instance, self.bins.len(), &self.pool_cpu, &self.pool_mem);
        for &b in &self.bin_order[from..] {
            self.bin_measures[b] = bin_measure(measure, &self.bins[b].residual, &ctx);
        }
    }

    /// Scores the apps at positions `from..to` of the app order against the residual of `bin_id`
    pub fn update_fit_scores(
        &mut self,
        instance: &Instance<D>,
        score: FitScore,
        bin_id: usize,
        from: usize,
        to: usize,
    ) {
        let ctx = MeasureContext::new(instance, self.bins.len(), &self.pool_cpu, &self.pool_mem);
        let residual = &self.bins[bin_id].residual;
        for &a in &self.app_order[from..to] {
            self.app_measures[a] = fit_score(score, &instance.apps[a], residual, &ctx);
        }
    }

    /// Restores the bin order from position `from` onward after the measures changed.
    pub fn sort_bins(&mut self, from: usize, direction: Direction, reorder: Reorder) {
        let measures = &self.bin_measures;
        let order = &mut self.bin_order[from..];
        match (reorder, direction) {
            (Reorder::BubblePass, Direction::Increasing) => {
                bubble_up(order, |a, b| measures[a] < measures[b])
            }
            (Reorder::BubblePass, Direction::Decreasing) => {
                bubble_up(order, |a, b| measures[a] > measures[b])
            }
            (Reorder::StableSort, Direction::Increasing) => {
                order.sort_by_key(|b| OrderedFloat(measures[*b]))
            }
            (Reorder::StableSort, Direction::Decreasing) => {
                order.sort_by_key(|b| Reverse(OrderedFloat(measures[*b])))
            }
        }
    }
}

/// Direction in which scored entities are ordered
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Increasing,
    Decreasing,
}

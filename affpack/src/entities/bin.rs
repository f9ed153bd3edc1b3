use std::collections::BTreeMap;
use std::fmt::Write;

use itertools::Itertools;

use crate::entities::Application;
use crate::resources::{Capacity, Demand, Residual};

/// A bin and everything placed inside it.
#[derive(Clone, Debug)]
pub struct Bin<D: Demand> {
    /// Creation index of the bin within its run
    pub id: usize,
    pub capacity: Capacity,
    /// Remaining capacity, only ever decreases
    pub residual: D::Residual,
    /// Internal app id -> replica indices placed in this bin
    pub alloc_map: BTreeMap<usize, Vec<usize>>,
    /// Internal app id -> tightest number of replicas tolerated by the apps already present
    pub conflict_map: BTreeMap<usize, usize>,
}

impl<D: Demand> Bin<D> {
    pub fn new(id: usize, capacity: Capacity, n_steps: usize) -> Self {
        Self {
            id,
            capacity,
            residual: D::Residual::full(capacity, n_steps),
            alloc_map: BTreeMap::new(),
            conflict_map: BTreeMap::new(),
        }
    }

    pub fn fits(&self, app: &Application<D>) -> bool {
        app.demand.fits(&self.residual)
    }

    /// Checks whether one more replica of `app` respects all affinity rules in force in this bin:
    /// the ones other (present) apps impose on `app`, and the ones `app` imposes on the apps present.
    pub fn is_affinity_compliant(&self, app: &Application<D>) -> bool {
        let present = self.n_replicas_of(app.internal_id);
        if let Some(&tolerated) = self.conflict_map.get(&app.internal_id) {
            if tolerated <= present {
                return false;
            }
        }
        app.affinity_out
            .iter()
            .all(|(other, tolerated)| self.n_replicas_of(*other) <= *tolerated)
    }

    /// Feasibility gate of every placement
    pub fn can_host(&self, app: &Application<D>) -> bool {
        self.fits(app) && self.is_affinity_compliant(app)
    }

    /// Folds the affinity rules of `app` into the conflict map, keeping the tightest bound per app.
    pub fn add_new_conflict(&mut self, app: &Application<D>) {
        for (other, tolerated) in &app.affinity_out {
            self.conflict_map
                .entry(*other)
                .and_modify(|t| *t = (*t).min(*tolerated))
                .or_insert(*tolerated);
        }
    }

    pub fn add_item(&mut self, app: &Application<D>, replica: usize) {
        app.demand.consume(&mut self.residual);
        self.alloc_map
            .entry(app.internal_id)
            .or_default()
            .push(replica);
    }

    /// Places a replica. The conflicts of an app are registered when its first replica enters the bin.
    pub fn place(&mut self, app: &Application<D>, replica: usize) {
        debug_assert!(self.can_host(app), "{} cannot be hosted in bin {}", app.id, self.id);
        if !self.alloc_map.contains_key(&app.internal_id) {
            self.add_new_conflict(app);
        }
        self.add_item(app, replica);
    }

    pub fn n_replicas_of(&self, app_id: usize) -> usize {
        self.alloc_map.get(&app_id).map_or(0, |r| r.len())
    }

    pub fn n_replicas(&self) -> usize {
        self.alloc_map.values().map(|r| r.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.alloc_map.is_empty()
    }

    pub fn is_saturated(&self) -> bool {
        self.residual.is_saturated()
    }

    /// Allocation of the bin, with external application ids
    pub fn describe(&self, apps: &[Application<D>]) -> String {
        let mut s = format!(
            "bin {}: residual cpu {:.2}, mem {:.2} |",
            self.id,
            self.residual.total_cpu(),
            self.residual.total_mem()
        );
        for (app_id, replicas) in &self.alloc_map {
            let _ = write!(
                s,
                " {}[{}]",
                apps[*app_id].id,
                replicas.iter().join(",")
            );
        }
        s
    }
}

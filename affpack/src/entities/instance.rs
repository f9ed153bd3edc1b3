use std::collections::{BTreeMap, HashMap, HashSet};

use anyhow::{Result, bail, ensure};
use log::{debug, warn};

use crate::entities::Application;
use crate::resources::{Capacity, Demand, Scalar, Series};
use crate::util::assertions::instance_affinity_symmetric;

/// Raw description of an application, as produced by a loader.
#[derive(Clone, Debug)]
pub struct AppRecord<D> {
    pub id: String,
    pub n_replicas: usize,
    pub demand: D,
    pub degree: usize,
    /// (other application id, tolerated number of co-located replicas of it)
    pub affinity: Vec<(String, usize)>,
}

/// Aggregate demand of an instance, over all replicas.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InstanceTotals {
    /// Total cpu demand per step
    pub sum_cpu: Vec<f64>,
    /// Total memory demand per step
    pub sum_mem: Vec<f64>,
    /// Total cpu and memory demand over all steps
    pub sum_cpu_mem: f64,
    pub n_replicas: usize,
}

/// Read-only packing problem: the applications, the bin capacity and aggregate statistics.
#[derive(Clone, Debug)]
pub struct Instance<D: Demand> {
    pub name: String,
    pub capacity: Capacity,
    /// Number of time steps, 1 for scalar instances
    pub n_steps: usize,
    /// Applications, indexed by their internal id
    pub apps: Vec<Application<D>>,
    pub totals: InstanceTotals,
    /// Ids of the applications which could never fit in an empty bin
    pub dropped: Vec<String>,
}

impl Instance<Scalar> {
    pub fn scalar(
        name: impl Into<String>,
        capacity: Capacity,
        records: Vec<AppRecord<Scalar>>,
    ) -> Result<Self> {
        Self::new(name, capacity, 1, records)
    }
}

impl Instance<Series> {
    /// All series need exactly `series_len` steps.
    pub fn series(
        name: impl Into<String>,
        capacity: Capacity,
        series_len: usize,
        records: Vec<AppRecord<Series>>,
    ) -> Result<Self> {
        Self::new(name, capacity, series_len, records)
    }
}

impl<D: Demand> Instance<D> {
    pub(crate) fn new(
        name: impl Into<String>,
        capacity: Capacity,
        n_steps: usize,
        records: Vec<AppRecord<D>>,
    ) -> Result<Self> {
        let name = name.into();
        ensure!(
            capacity.cpu > 0 && capacity.mem > 0,
            "bin capacity must be positive in both dimensions: {capacity:?}"
        );
        ensure!(n_steps > 0, "instance {name} needs at least one time step");

        let mut seen = HashSet::new();
        for r in &records {
            ensure!(seen.insert(r.id.as_str()), "duplicate application id: {}", r.id);
            ensure!(r.n_replicas >= 1, "application {} has no replicas", r.id);
            if r.demand.n_steps() != n_steps {
                bail!(
                    "time series length mismatch for application {}: expected {}, got {}",
                    r.id,
                    n_steps,
                    r.demand.n_steps()
                );
            }
        }

        let (records, dropped): (Vec<_>, Vec<_>) = records
            .into_iter()
            .partition(|r| !r.demand.exceeds(capacity));
        let dropped = dropped
            .into_iter()
            .map(|r| {
                warn!(
                    "[IMPORT] dropping application {}: demand (cpu {}, mem {}) exceeds the bin capacity",
                    r.id,
                    r.demand.peak_cpu(),
                    r.demand.peak_mem()
                );
                r.id
            })
            .collect::<Vec<String>>();
        let dropped_set: HashSet<&str> = dropped.iter().map(|s| s.as_str()).collect();

        let index: HashMap<&str, usize> = records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id.as_str(), i))
            .collect();

        let mut affinity_outs = Vec::with_capacity(records.len());
        for r in &records {
            let mut out = BTreeMap::new();
            for (other, tolerated) in &r.affinity {
                match index.get(other.as_str()) {
                    Some(&o) => {
                        out.entry(o)
                            .and_modify(|t: &mut usize| *t = (*t).min(*tolerated))
                            .or_insert(*tolerated);
                    }
                    None if dropped_set.contains(other.as_str()) => {}
                    None => warn!(
                        "[IMPORT] application {} references unknown application {}, ignoring",
                        r.id, other
                    ),
                }
            }
            affinity_outs.push(out);
        }

        let mut apps = records
            .into_iter()
            .zip(affinity_outs)
            .enumerate()
            .map(|(internal_id, (r, affinity_out))| Application {
                id: r.id,
                internal_id,
                n_replicas: r.n_replicas,
                demand: r.demand,
                declared_degree: r.degree,
                affinity_out,
                affinity_in: BTreeMap::new(),
                total_degree: 0,
                sizes: Default::default(),
            })
            .collect::<Vec<_>>();

        let inward = apps
            .iter()
            .flat_map(|a| a.affinity_out.iter().map(|(b, k)| (*b, a.internal_id, *k)))
            .collect::<Vec<_>>();
        for (b, a, k) in inward {
            apps[b].affinity_in.insert(a, k);
        }
        apps.iter_mut().for_each(|a| a.compute_total_degree());

        let totals = compute_totals(&apps, n_steps);
        apps.iter_mut().for_each(|a| a.set_params(capacity, &totals));

        debug!(
            "[IMPORT] instance {}: {} apps, {} replicas, {} dropped",
            name,
            apps.len(),
            totals.n_replicas,
            dropped.len()
        );

        let instance = Self {
            name,
            capacity,
            n_steps,
            apps,
            totals,
            dropped,
        };
        debug_assert!(instance_affinity_symmetric(&instance));

        Ok(instance)
    }

    pub fn app(&self, internal_id: usize) -> &Application<D> {
        &self.apps[internal_id]
    }

    pub fn app_by_id(&self, id: &str) -> Option<&Application<D>> {
        self.apps.iter().find(|a| a.id == id)
    }

    pub fn n_apps(&self) -> usize {
        self.apps.len()
    }

    pub fn total_replicas(&self) -> usize {
        self.totals.n_replicas
    }
}

fn compute_totals<D: Demand>(apps: &[Application<D>], n_steps: usize) -> InstanceTotals {
    let mut totals = InstanceTotals {
        sum_cpu: vec![0.0; n_steps],
        sum_mem: vec![0.0; n_steps],
        ..Default::default()
    };
    for app in apps {
        let k = app.n_replicas as f64;
        for t in 0..n_steps {
            totals.sum_cpu[t] += k * app.demand.cpu_at(t);
            totals.sum_mem[t] += k * app.demand.mem_at(t);
        }
        totals.n_replicas += app.n_replicas;
    }
    totals.sum_cpu_mem = totals.sum_cpu.iter().chain(totals.sum_mem.iter()).sum();
    totals
}

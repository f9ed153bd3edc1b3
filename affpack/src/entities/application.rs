use std::collections::BTreeMap;
use std::fmt::Write;

use itertools::Itertools;

use crate::entities::InstanceTotals;
use crate::packing::Measure;
use crate::resources::{Capacity, Demand};
use crate::util::ratio;

/// A workload type: `n_replicas` identical replicas with the same demand and affinity rules.
#[derive(Clone, Debug)]
pub struct Application<D: Demand> {
    /// External identifier, unique within the instance
    pub id: String,
    /// Dense index of the application in its [`Instance`](crate::entities::Instance)
    pub internal_id: usize,
    pub n_replicas: usize,
    /// Demand of a single replica
    pub demand: D,
    /// Affinity degree as declared in the input, informational only
    pub declared_degree: usize,
    /// Internal id of `B` -> max number of replicas of `B` this app tolerates in the same bin
    pub affinity_out: BTreeMap<usize, usize>,
    /// Internal id of `B` -> max number of replicas of this app that `B` tolerates in the same bin
    pub affinity_in: BTreeMap<usize, usize>,
    /// Number of distinct applications appearing in either affinity map
    pub total_degree: usize,
    pub sizes: SizeMeasures,
}

impl<D: Demand> Application<D> {
    pub fn out_degree(&self) -> usize {
        self.affinity_out.len()
    }

    pub fn size(&self, measure: Measure) -> f64 {
        self.sizes.get(measure)
    }

    /// Normalized cpu demand at step `t`
    pub fn norm_cpu_at(&self, t: usize, capacity: Capacity) -> f64 {
        self.demand.cpu_at(t) / capacity.cpu_f64()
    }

    /// Normalized memory demand at step `t`
    pub fn norm_mem_at(&self, t: usize, capacity: Capacity) -> f64 {
        self.demand.mem_at(t) / capacity.mem_f64()
    }

    pub(crate) fn compute_total_degree(&mut self) {
        self.total_degree = self
            .affinity_out
            .keys()
            .chain(self.affinity_in.keys())
            .unique()
            .count();
    }

    /// Computes the sizing measures. These depend on instance-wide totals,
    /// so they can only be set once all applications are known.
    pub(crate) fn set_params(&mut self, capacity: Capacity, totals: &InstanceTotals) {
        let (c_cpu, c_mem) = (capacity.cpu_f64(), capacity.mem_f64());
        let k = self.n_replicas as f64;
        let total_rep = totals.n_replicas as f64;

        let mut sizes = SizeMeasures {
            max: f64::max(
                self.demand.peak_cpu() / c_cpu,
                self.demand.peak_mem() / c_mem,
            ),
            ..SizeMeasures::default()
        };

        for t in 0..self.demand.n_steps() {
            let (cpu, mem) = (self.demand.cpu_at(t), self.demand.mem_at(t));
            let (n_cpu, n_mem) = (cpu / c_cpu, mem / c_mem);
            let (s_cpu, s_mem) = (totals.sum_cpu[t], totals.sum_mem[t]);

            sizes.avg += n_cpu + n_mem;
            sizes.cpu += n_cpu;

            let lambda_cpu = ratio(s_cpu, totals.sum_cpu_mem);
            let lambda_mem = ratio(s_mem, totals.sum_cpu_mem);
            sizes.surrogate += lambda_cpu * n_cpu + lambda_mem * n_mem;

            sizes.ext_sum += ratio(k * cpu, s_cpu) + ratio(k * mem, s_mem);

            let w_cpu = ratio(s_cpu, total_rep * c_cpu);
            let w_mem = ratio(s_mem, total_rep * c_mem);
            sizes.avg_expo += (0.01 * w_cpu).exp() * n_cpu + (0.01 * w_mem).exp() * n_mem;
        }

        self.sizes = sizes;
    }

    /// Human readable summary. `full` adds both affinity maps.
    pub fn describe(&self, full: bool) -> String {
        let mut s = format!(
            "{} (#{}): {} replicas, peak cpu {}, peak mem {}, degree {}/{}",
            self.id,
            self.internal_id,
            self.n_replicas,
            self.demand.peak_cpu(),
            self.demand.peak_mem(),
            self.out_degree(),
            self.total_degree
        );
        if full {
            let fmt_map = |m: &BTreeMap<usize, usize>| {
                m.iter().map(|(id, k)| format!("#{id}:{k}")).join(", ")
            };
            let _ = write!(
                s,
                " | out {{{}}} | in {{{}}}",
                fmt_map(&self.affinity_out),
                fmt_map(&self.affinity_in)
            );
        }
        s
    }
}

/// Sizing measures of an application, fixed once the instance is built.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SizeMeasures {
    pub avg: f64,
    pub max: f64,
    pub cpu: f64,
    pub avg_expo: f64,
    pub surrogate: f64,
    pub ext_sum: f64,
}

impl SizeMeasures {
    pub fn get(&self, measure: Measure) -> f64 {
        match measure {
            Measure::Avg => self.avg,
            Measure::Max => self.max,
            Measure::Cpu => self.cpu,
            Measure::AvgExpo => self.avg_expo,
            Measure::Surrogate => self.surrogate,
            Measure::ExtendedSum => self.ext_sum,
        }
    }
}

use std::collections::BTreeSet;

use float_cmp::approx_eq;
use log::error;

use crate::entities::{Bin, Instance};
use crate::resources::{Demand, Residual};

//Various checks to verify correctness of the state of the system
//Used in debug_assert!() blocks and in the tests

pub fn instance_affinity_symmetric<D: Demand>(instance: &Instance<D>) -> bool {
    instance.apps.iter().enumerate().all(|(i, app)| {
        app.internal_id == i
            && app.affinity_out.iter().all(|(b, k)| {
                instance.apps[*b].affinity_in.get(&app.internal_id) == Some(k)
            })
            && app.affinity_in.iter().all(|(b, k)| {
                instance.apps[*b].affinity_out.get(&app.internal_id) == Some(k)
            })
            && app.out_degree() <= app.total_degree
    })
}

/// Demand placed in every bin stays within capacity at every step,
/// and matches the residual the bin keeps track of.
pub fn bins_respect_capacity<D: Demand>(instance: &Instance<D>, bins: &[Bin<D>]) -> bool {
    let (c_cpu, c_mem) = (instance.capacity.cpu_f64(), instance.capacity.mem_f64());
    for bin in bins {
        for t in 0..instance.n_steps {
            let (mut used_cpu, mut used_mem) = (0.0, 0.0);
            for (app_id, replicas) in &bin.alloc_map {
                let app = &instance.apps[*app_id];
                used_cpu += app.demand.cpu_at(t) * replicas.len() as f64;
                used_mem += app.demand.mem_at(t) * replicas.len() as f64;
            }
            let within = |used: f64, cap: f64| {
                used <= cap || approx_eq!(f64, used, cap, epsilon = 1e-6 * cap)
            };
            if !within(used_cpu, c_cpu) || !within(used_mem, c_mem) {
                error!(
                    "bin {} exceeds its capacity at step {}: cpu {}/{}, mem {}/{}",
                    bin.id, t, used_cpu, c_cpu, used_mem, c_mem
                );
                return false;
            }
            let tracked = approx_eq!(
                f64,
                bin.residual.cpu_at(t),
                c_cpu - used_cpu,
                epsilon = 1e-6 * c_cpu
            ) && approx_eq!(
                f64,
                bin.residual.mem_at(t),
                c_mem - used_mem,
                epsilon = 1e-6 * c_mem
            );
            if !tracked {
                error!("residual of bin {} is out of sync at step {}", bin.id, t);
                return false;
            }
        }
    }
    true
}

/// For every app `A` present in a bin, each app `B` it constrains has at most `A`'s tolerated
/// number of replicas in that bin. A self constraint never prevents a first replica.
pub fn bins_respect_affinity<D: Demand>(instance: &Instance<D>, bins: &[Bin<D>]) -> bool {
    for bin in bins {
        for a in bin.alloc_map.keys() {
            for (b, tolerated) in &instance.apps[*a].affinity_out {
                let limit = match a == b {
                    true => (*tolerated).max(1),
                    false => *tolerated,
                };
                let present = bin.n_replicas_of(*b);
                if present > limit {
                    error!(
                        "bin {} holds {} replicas of {} while {} tolerates {}",
                        bin.id, present, instance.apps[*b].id, instance.apps[*a].id, limit
                    );
                    return false;
                }
            }
        }
    }
    true
}

/// Every replica of every application is placed exactly once.
pub fn solution_complete<D: Demand>(instance: &Instance<D>, bins: &[Bin<D>]) -> bool {
    let mut placed = vec![BTreeSet::new(); instance.n_apps()];
    for bin in bins {
        for (app_id, replicas) in &bin.alloc_map {
            for r in replicas {
                if !placed[*app_id].insert(*r) {
                    error!(
                        "replica {} of {} is placed more than once",
                        r, instance.apps[*app_id].id
                    );
                    return false;
                }
            }
        }
    }
    instance.apps.iter().all(|app| {
        let expected = (0..app.n_replicas).collect::<BTreeSet<_>>();
        let ok = placed[app.internal_id] == expected;
        if !ok {
            error!("replicas of {} are not all placed", app.id);
        }
        ok
    })
}

pub fn bin_ids_correct<D: Demand>(bins: &[Bin<D>]) -> bool {
    bins.iter().enumerate().all(|(i, bin)| bin.id == i)
}

pub fn solution_valid<D: Demand>(instance: &Instance<D>, bins: &[Bin<D>]) -> bool {
    bin_ids_correct(bins)
        && bins_respect_capacity(instance, bins)
        && bins_respect_affinity(instance, bins)
        && solution_complete(instance, bins)
}

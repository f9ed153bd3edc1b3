use std::collections::BTreeSet;

use itertools::Itertools;
use ordered_float::OrderedFloat;

use crate::entities::Instance;
use crate::resources::{Scalar, Series};

/// Lower bound on the number of bins needed for an instance
pub trait LowerBound {
    fn lower_bound(&self) -> usize;
}

impl LowerBound for Instance<Scalar> {
    fn lower_bound(&self) -> usize {
        bpp2d_lower_bound(self)
    }
}

impl LowerBound for Instance<Series> {
    fn lower_bound(&self) -> usize {
        let (cpu, mem) = series_lower_bounds(self);
        cpu.max(mem)
    }
}

/// Dual-feasible-function bound for one dimension of a 1-D bin packing problem.
/// `items` holds (size, number of items of that size).
///
/// With `alpha <= capacity / 2`, items larger than `capacity - alpha` need a bin of their own (J1),
/// items larger than half the capacity cannot share a bin with each other (J2) and items of at least
/// `alpha` (J3) can only fill what the J2 bins leave free, plus additional bins.
pub fn lb_alpha(items: &[(u32, usize)], capacity: u32, alpha: u32) -> usize {
    let cap = capacity as f64;
    if alpha as f64 > cap / 2.0 {
        return 0;
    }
    let threshold1 = cap - alpha as f64;
    let threshold2 = cap / 2.0;

    let (mut n_j1, mut n_j2) = (0, 0);
    let (mut sum_j2, mut sum_j3) = (0.0, 0.0);
    for &(size, count) in items {
        let s = size as f64;
        if s > threshold1 {
            n_j1 += count;
        } else if s > threshold2 {
            n_j2 += count;
            sum_j2 += s * count as f64;
        } else if size >= alpha {
            sum_j3 += s * count as f64;
        }
    }
    let overflow = ((sum_j3 + sum_j2 - n_j2 as f64 * cap) / cap).ceil();
    n_j1 + n_j2 + overflow.max(0.0) as usize
}

/// Best [`lb_alpha`] over all distinct item sizes and `alpha = 0`
pub fn lb_dimension(items: &[(u32, usize)], capacity: u32) -> usize {
    let alphas: BTreeSet<u32> = items.iter().map(|(s, _)| *s).chain([0]).collect();
    alphas
        .into_iter()
        .map(|alpha| lb_alpha(items, capacity, alpha))
        .max()
        .unwrap_or(0)
}

pub fn lb_cpu(instance: &Instance<Scalar>) -> usize {
    let items = instance
        .apps
        .iter()
        .map(|a| (a.demand.cpu, a.n_replicas))
        .collect_vec();
    lb_dimension(&items, instance.capacity.cpu)
}

pub fn lb_mem(instance: &Instance<Scalar>) -> usize {
    let items = instance
        .apps
        .iter()
        .map(|a| (a.demand.mem, a.n_replicas))
        .collect_vec();
    lb_dimension(&items, instance.capacity.mem)
}

/// Bound of the scalar problem: the best of both dimensions
pub fn bpp2d_lower_bound(instance: &Instance<Scalar>) -> usize {
    lb_cpu(instance).max(lb_mem(instance))
}

/// Per dimension, the peak aggregate demand over all time steps divided by the bin capacity.
/// Returns `(cpu, mem)`.
pub fn series_lower_bounds(instance: &Instance<Series>) -> (usize, usize) {
    let peak = |sums: &[f64]| {
        sums.iter()
            .copied()
            .map(OrderedFloat)
            .max()
            .map_or(0.0, |p| p.0)
    };
    let cpu = (peak(&instance.totals.sum_cpu) / instance.capacity.cpu_f64()).ceil();
    let mem = (peak(&instance.totals.sum_mem) / instance.capacity.mem_f64()).ceil();
    (cpu as usize, mem as usize)
}

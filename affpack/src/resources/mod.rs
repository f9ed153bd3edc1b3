mod scalar;
mod series;

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

#[doc(inline)]
pub use scalar::Scalar;
#[doc(inline)]
pub use scalar::ScalarResidual;
#[doc(inline)]
pub use series::Series;
#[doc(inline)]
pub use series::SeriesResidual;

/// Capacity of a single bin. Every bin of an instance shares the same capacity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capacity {
    pub cpu: u32,
    pub mem: u32,
}

impl Capacity {
    pub fn new(cpu: u32, mem: u32) -> Self {
        Self { cpu, mem }
    }

    pub fn cpu_f64(&self) -> f64 {
        self.cpu as f64
    }

    pub fn mem_f64(&self) -> f64 {
        self.mem as f64
    }
}

/// Remaining capacity of a bin, viewed step by step.
/// A scalar residual has exactly one step.
pub trait Residual: Clone + Debug + Send + Sync {
    /// Residual of an empty bin
    fn full(capacity: Capacity, n_steps: usize) -> Self;

    fn n_steps(&self) -> usize;

    fn cpu_at(&self, t: usize) -> f64;

    fn mem_at(&self, t: usize) -> f64;

    /// Residual cpu summed over all steps
    fn total_cpu(&self) -> f64;

    /// Residual memory summed over all steps
    fn total_mem(&self) -> f64;

    /// A bin is saturated once any dimension is exhausted at any step.
    fn is_saturated(&self) -> bool;
}

/// Resource demand of a single replica of an application.
pub trait Demand: Clone + Debug + Send + Sync + 'static {
    type Residual: Residual;

    fn n_steps(&self) -> usize;

    fn cpu_at(&self, t: usize) -> f64;

    fn mem_at(&self, t: usize) -> f64;

    fn peak_cpu(&self) -> f64;

    fn peak_mem(&self) -> f64;

    /// Whether one replica fits in the residual, at every step
    fn fits(&self, residual: &Self::Residual) -> bool;

    /// Removes one replica's demand from the residual
    fn consume(&self, residual: &mut Self::Residual);

    /// True if a single replica cannot fit in an empty bin
    fn exceeds(&self, capacity: Capacity) -> bool {
        self.peak_cpu() > capacity.cpu_f64() || self.peak_mem() > capacity.mem_f64()
    }
}

use serde::{Deserialize, Serialize};

use crate::resources::{Capacity, Demand, Residual};

/// Fixed cpu and memory demand of a replica.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scalar {
    pub cpu: u32,
    pub mem: u32,
}

impl Scalar {
    pub fn new(cpu: u32, mem: u32) -> Self {
        Self { cpu, mem }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScalarResidual {
    pub cpu: u32,
    pub mem: u32,
}

impl Residual for ScalarResidual {
    fn full(capacity: Capacity, n_steps: usize) -> Self {
        debug_assert!(n_steps == 1);
        Self {
            cpu: capacity.cpu,
            mem: capacity.mem,
        }
    }

    fn n_steps(&self) -> usize {
        1
    }

    fn cpu_at(&self, _t: usize) -> f64 {
        self.cpu as f64
    }

    fn mem_at(&self, _t: usize) -> f64 {
        self.mem as f64
    }

    fn total_cpu(&self) -> f64 {
        self.cpu as f64
    }

    fn total_mem(&self) -> f64 {
        self.mem as f64
    }

    fn is_saturated(&self) -> bool {
        self.cpu == 0 || self.mem == 0
    }
}

impl Demand for Scalar {
    type Residual = ScalarResidual;

    fn n_steps(&self) -> usize {
        1
    }

    fn cpu_at(&self, _t: usize) -> f64 {
        self.cpu as f64
    }

    fn mem_at(&self, _t: usize) -> f64 {
        self.mem as f64
    }

    fn peak_cpu(&self) -> f64 {
        self.cpu as f64
    }

    fn peak_mem(&self) -> f64 {
        self.mem as f64
    }

    fn fits(&self, residual: &ScalarResidual) -> bool {
        self.cpu <= residual.cpu && self.mem <= residual.mem
    }

    fn consume(&self, residual: &mut ScalarResidual) {
        debug_assert!(self.fits(residual));
        residual.cpu -= self.cpu;
        residual.mem -= self.mem;
    }
}

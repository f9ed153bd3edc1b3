use anyhow::{Result, ensure};
use itertools::Itertools;
use ordered_float::OrderedFloat;

use crate::resources::{Capacity, Demand, Residual};

/// Resource usage of a replica over a fixed number of time steps.
#[derive(Clone, Debug, PartialEq)]
pub struct Series {
    cpu: Vec<f32>,
    mem: Vec<f32>,
    peak_cpu: f32,
    peak_mem: f32,
}

impl Series {
    /// Both series must be non-empty, of equal length and contain finite, non-negative values.
    pub fn new(cpu: Vec<f32>, mem: Vec<f32>) -> Result<Self> {
        ensure!(!cpu.is_empty(), "time series must contain at least one step");
        ensure!(
            cpu.len() == mem.len(),
            "cpu series has {} steps, memory series has {}",
            cpu.len(),
            mem.len()
        );
        ensure!(
            cpu.iter().chain(mem.iter()).all(|v| v.is_finite() && *v >= 0.0),
            "time series values must be finite and non-negative"
        );

        let peak = |s: &[f32]| s.iter().copied().map(OrderedFloat).max().map_or(0.0, |v| v.0);
        let peak_cpu = peak(&cpu);
        let peak_mem = peak(&mem);

        Ok(Self {
            cpu,
            mem,
            peak_cpu,
            peak_mem,
        })
    }

    pub fn len(&self) -> usize {
        self.cpu.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cpu.is_empty()
    }

    pub fn cpu(&self) -> &[f32] {
        &self.cpu
    }

    pub fn mem(&self) -> &[f32] {
        &self.mem
    }
}

/// Per-step residual of a time-series bin, with running totals over all steps.
#[derive(Clone, Debug, PartialEq)]
pub struct SeriesResidual {
    cpu: Vec<f64>,
    mem: Vec<f64>,
    total_cpu: f64,
    total_mem: f64,
}

impl SeriesResidual {
    pub fn cpu(&self) -> &[f64] {
        &self.cpu
    }

    pub fn mem(&self) -> &[f64] {
        &self.mem
    }
}

impl Residual for SeriesResidual {
    fn full(capacity: Capacity, n_steps: usize) -> Self {
        let cpu = vec![capacity.cpu_f64(); n_steps];
        let mem = vec![capacity.mem_f64(); n_steps];
        Self {
            total_cpu: capacity.cpu_f64() * n_steps as f64,
            total_mem: capacity.mem_f64() * n_steps as f64,
            cpu,
            mem,
        }
    }

    fn n_steps(&self) -> usize {
        self.cpu.len()
    }

    fn cpu_at(&self, t: usize) -> f64 {
        self.cpu[t]
    }

    fn mem_at(&self, t: usize) -> f64 {
        self.mem[t]
    }

    fn total_cpu(&self) -> f64 {
        self.total_cpu
    }

    fn total_mem(&self) -> f64 {
        self.total_mem
    }

    fn is_saturated(&self) -> bool {
        self.cpu.iter().chain(self.mem.iter()).any(|r| *r <= 0.0)
    }
}

impl Demand for Series {
    type Residual = SeriesResidual;

    fn n_steps(&self) -> usize {
        self.cpu.len()
    }

    fn cpu_at(&self, t: usize) -> f64 {
        self.cpu[t] as f64
    }

    fn mem_at(&self, t: usize) -> f64 {
        self.mem[t] as f64
    }

    fn peak_cpu(&self) -> f64 {
        self.peak_cpu as f64
    }

    fn peak_mem(&self) -> f64 {
        self.peak_mem as f64
    }

    fn fits(&self, residual: &SeriesResidual) -> bool {
        debug_assert!(self.cpu.len() == residual.cpu.len());
        let fits_cpu = self
            .cpu
            .iter()
            .zip_eq(residual.cpu.iter())
            .all(|(d, r)| *d as f64 <= *r);
        fits_cpu
            && self
                .mem
                .iter()
                .zip_eq(residual.mem.iter())
                .all(|(d, r)| *d as f64 <= *r)
    }

    fn consume(&self, residual: &mut SeriesResidual) {
        debug_assert!(self.fits(residual));
        for (r, d) in residual.cpu.iter_mut().zip_eq(self.cpu.iter()) {
            *r -= *d as f64;
            residual.total_cpu -= *d as f64;
        }
        for (r, d) in residual.mem.iter_mut().zip_eq(self.mem.iter()) {
            *r -= *d as f64;
            residual.total_mem -= *d as f64;
        }
    }
}

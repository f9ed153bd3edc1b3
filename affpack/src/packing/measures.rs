use crate::entities::{Application, Instance, InstanceTotals};
use crate::packing::{FitScore, Measure};
use crate::resources::{Capacity, Demand, Residual};
use crate::util::ratio;

/// Run-wide quantities some measures depend on.
#[derive(Clone, Copy, Debug)]
pub struct MeasureContext<'a> {
    pub capacity: Capacity,
    /// Number of open bins
    pub n_bins: usize,
    /// Residual cpu per step, summed over all open bins
    pub pool_cpu: &'a [f64],
    /// Residual memory per step, summed over all open bins
    pub pool_mem: &'a [f64],
    pub totals: &'a InstanceTotals,
}

impl<'a> MeasureContext<'a> {
    pub fn new<D: Demand>(
        instance: &'a Instance<D>,
        n_bins: usize,
        pool_cpu: &'a [f64],
        pool_mem: &'a [f64],
    ) -> Self {
        Self {
            capacity: instance.capacity,
            n_bins,
            pool_cpu,
            pool_mem,
            totals: &instance.totals,
        }
    }

    fn pool_totals(&self) -> (f64, f64) {
        (self.pool_cpu.iter().sum(), self.pool_mem.iter().sum())
    }
}

/// Scores the residual capacity of a bin.
/// Best-Fit tries bins by increasing score, Worst-Fit and Spread by decreasing score.
pub fn bin_measure<R: Residual>(measure: Measure, residual: &R, ctx: &MeasureContext) -> f64 {
    let (c_cpu, c_mem) = (ctx.capacity.cpu_f64(), ctx.capacity.mem_f64());
    let n_cpu = residual.total_cpu() / c_cpu;
    let n_mem = residual.total_mem() / c_mem;

    match measure {
        Measure::Avg => n_cpu + n_mem,
        Measure::Cpu => n_cpu,
        Measure::Max => (0..residual.n_steps())
            .map(|t| f64::max(residual.cpu_at(t) / c_cpu, residual.mem_at(t) / c_mem))
            .fold(f64::NEG_INFINITY, f64::max),
        Measure::AvgExpo => {
            let (g_cpu, g_mem) = ctx.pool_totals();
            let steps = (ctx.n_bins * residual.n_steps()) as f64;
            let w_cpu = ratio(g_cpu, c_cpu * steps);
            let w_mem = ratio(g_mem, c_mem * steps);
            (0.01 * w_cpu).exp() * n_cpu + (0.01 * w_mem).exp() * n_mem
        }
        Measure::Surrogate => {
            let (g_cpu, g_mem) = ctx.pool_totals();
            let lambda = match g_cpu + g_mem == 0.0 {
                true => 0.5,
                false => g_cpu / (g_cpu + g_mem),
            };
            lambda * n_cpu + (1.0 - lambda) * n_mem
        }
        Measure::ExtendedSum => (0..residual.n_steps())
            .map(|t| {
                ratio(residual.cpu_at(t), ctx.pool_cpu[t])
                    + ratio(residual.mem_at(t), ctx.pool_mem[t])
            })
            .sum(),
    }
}

/// Scores how well `app` matches the residual of the bin being filled. Higher is better.
pub fn fit_score<D: Demand>(
    score: FitScore,
    app: &Application<D>,
    residual: &D::Residual,
    ctx: &MeasureContext,
) -> f64 {
    let cap = ctx.capacity;
    let (c_cpu, c_mem) = (cap.cpu_f64(), cap.mem_f64());

    (0..residual.n_steps())
        .map(|t| {
            let (a_cpu, a_mem) = (app.norm_cpu_at(t, cap), app.norm_mem_at(t, cap));
            let (r_cpu, r_mem) = (residual.cpu_at(t) / c_cpu, residual.mem_at(t) / c_mem);
            match score {
                FitScore::DotProduct => a_cpu * r_cpu + a_mem * r_mem,
                FitScore::DotDivision => inverse_term(a_cpu, r_cpu) + inverse_term(a_mem, r_mem),
                FitScore::L2Norm => -((r_cpu - a_cpu).powi(2) + (r_mem - a_mem).powi(2)),
                FitScore::Fitness => {
                    let s_cpu = ctx.totals.sum_cpu[t] / c_cpu;
                    let s_mem = ctx.totals.sum_mem[t] / c_mem;
                    let g_cpu = ctx.pool_cpu[t] / c_cpu;
                    let g_mem = ctx.pool_mem[t] / c_mem;
                    ratio(a_cpu * r_cpu, s_cpu * g_cpu) + ratio(a_mem * r_mem, s_mem * g_mem)
                }
            }
        })
        .sum()
}

fn inverse_term(demand: f64, residual: f64) -> f64 {
    match residual <= 0.0 {
        true => 0.0,
        false => demand / residual,
    }
}

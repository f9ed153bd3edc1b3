use anyhow::{Context, Result, bail};

use crate::entities::{AppRecord, Instance};
use crate::io::ext_repr::{ExtApp, ExtDemand, ExtInstance};
use crate::resources::{Capacity, Scalar, Series};

/// Imports an instance with fixed demands
pub fn import_scalar(ext_instance: &ExtInstance) -> Result<Instance<Scalar>> {
    let records = ext_instance
        .apps
        .iter()
        .map(|ext_app| -> Result<AppRecord<Scalar>> {
            let demand = match &ext_app.demand {
                ExtDemand::Scalar { cpu, mem } => Scalar::new(*cpu, *mem),
                ExtDemand::Series { .. } => {
                    bail!("application {} has a time series demand", ext_app.id)
                }
            };
            Ok(record(ext_app, demand))
        })
        .collect::<Result<Vec<_>>>()?;

    Instance::scalar(&ext_instance.name, capacity(ext_instance), records)
}

/// Imports a time-series instance. Every series must have `series_len` steps.
pub fn import_series(ext_instance: &ExtInstance, series_len: usize) -> Result<Instance<Series>> {
    let records = ext_instance
        .apps
        .iter()
        .map(|ext_app| -> Result<AppRecord<Series>> {
            let demand = match &ext_app.demand {
                ExtDemand::Series { cpu, mem } => Series::new(cpu.clone(), mem.clone())
                    .with_context(|| format!("invalid demand for application {}", ext_app.id))?,
                ExtDemand::Scalar { .. } => {
                    bail!("application {} has a scalar demand", ext_app.id)
                }
            };
            Ok(record(ext_app, demand))
        })
        .collect::<Result<Vec<_>>>()?;

    Instance::series(&ext_instance.name, capacity(ext_instance), series_len, records)
}

fn capacity(ext_instance: &ExtInstance) -> Capacity {
    Capacity::new(ext_instance.capacity.cpu, ext_instance.capacity.mem)
}

fn record<D>(ext_app: &ExtApp, demand: D) -> AppRecord<D> {
    AppRecord {
        id: ext_app.id.clone(),
        n_replicas: ext_app.replicas,
        demand,
        degree: ext_app.degree,
        affinity: ext_app
            .affinity
            .iter()
            .map(|a| (a.app.clone(), a.tolerated))
            .collect(),
    }
}

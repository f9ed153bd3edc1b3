use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// External representation of an [`Instance`](crate::entities::Instance).
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ExtInstance {
    pub name: String,
    /// Capacity of every bin
    pub capacity: ExtCapacity,
    pub apps: Vec<ExtApp>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug)]
pub struct ExtCapacity {
    pub cpu: u32,
    pub mem: u32,
}

/// External representation of an [`Application`](crate::entities::Application).
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ExtApp {
    /// Unique identifier of the application
    pub id: String,
    /// Number of replicas to place
    pub replicas: usize,
    /// Demand of a single replica
    pub demand: ExtDemand,
    /// Declared affinity degree, informational
    #[serde(default)]
    pub degree: usize,
    /// Co-location limits this application imposes on others
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub affinity: Vec<ExtAffinity>,
}

/// Demand of one replica, fixed or as a time series
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(tag = "type")]
#[serde(rename_all = "snake_case")]
pub enum ExtDemand {
    Scalar { cpu: u32, mem: u32 },
    Series { cpu: Vec<f32>, mem: Vec<f32> },
}

/// At most `tolerated` replicas of `app` may share a bin with any replica of the declaring application
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ExtAffinity {
    pub app: String,
    pub tolerated: usize,
}

/// External representation of a solved run
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ExtSolution {
    pub instance: String,
    pub algorithm: String,
    pub n_bins: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lower_bound: Option<usize>,
    pub bins: Vec<ExtBin>,
}

/// External representation of a [`Bin`](crate::entities::Bin).
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ExtBin {
    pub id: usize,
    /// Application id -> replica indices placed in the bin
    pub allocation: BTreeMap<String, Vec<usize>>,
}

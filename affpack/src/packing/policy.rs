use serde::{Deserialize, Serialize};

/// Size measure of an application, or residual measure of a bin.
/// Both families share the same six formulas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Measure {
    Avg,
    Max,
    Cpu,
    AvgExpo,
    Surrogate,
    ExtendedSum,
}

impl Measure {
    pub const ALL: [Measure; 6] = [
        Measure::Avg,
        Measure::Max,
        Measure::Cpu,
        Measure::AvgExpo,
        Measure::Surrogate,
        Measure::ExtendedSum,
    ];

    /// Global bin measures depend on the residual of all open bins,
    /// so every candidate bin needs rescoring after each placement.
    pub fn is_global(&self) -> bool {
        matches!(
            self,
            Measure::AvgExpo | Measure::Surrogate | Measure::ExtendedSum
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            Measure::Avg => "Avg",
            Measure::Max => "Max",
            Measure::Cpu => "CPU",
            Measure::AvgExpo => "AvgExpo",
            Measure::Surrogate => "Surrogate",
            Measure::ExtendedSum => "ExtendedSum",
        }
    }
}

/// Order in which applications of a batch are handled. All orders are stable and decreasing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppOrder {
    /// Keep the input order
    Input,
    /// Decreasing total affinity degree
    Degree,
    /// Decreasing size measure
    Size(Measure),
}

/// How the bin order is restored after the measures changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reorder {
    /// A single bubble pass towards the search cursor.
    /// Exact when only one bin's measure changed and it moved towards the front.
    BubblePass,
    /// Full stable sort of the bins beyond the search cursor
    StableSort,
}

/// Which open bin is tried first for the next replica.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinSelection {
    /// Bins in creation order
    FirstFit,
    /// Bins ascending by residual measure: tightest bin first
    BestFit { measure: Measure, reorder: Reorder },
    /// Bins descending by residual measure: loosest bin first
    WorstFit { measure: Measure, reorder: Reorder },
}

impl BinSelection {
    pub fn measure(&self) -> Option<Measure> {
        match self {
            BinSelection::FirstFit => None,
            BinSelection::BestFit { measure, .. } | BinSelection::WorstFit { measure, .. } => {
                Some(*measure)
            }
        }
    }
}

/// Score of an application against the residual of the bin being filled (higher is better).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FitScore {
    DotProduct,
    DotDivision,
    L2Norm,
    Fitness,
}

impl FitScore {
    pub const ALL: [FitScore; 4] = [
        FitScore::DotProduct,
        FitScore::DotDivision,
        FitScore::L2Norm,
        FitScore::Fitness,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FitScore::DotProduct => "DotProduct",
            FitScore::DotDivision => "DotDivision",
            FitScore::L2Norm => "L2Norm",
            FitScore::Fitness => "Fitness",
        }
    }
}

/// A complete packing strategy, composed out of the orthogonal policies above.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    /// Replica by replica: order the apps, then scan the (reordered) bins for each replica
    ItemCentric {
        order: AppOrder,
        selection: BinSelection,
    },
    /// Most constrained application first, tracking the feasible bins of every application
    NodeCount,
    /// Fill one bin at a time with the best scoring applications
    BinCentric(FitScore),
    /// Round-robin over a fixed number of bins, searched for the smallest feasible count.
    /// Every bin visit places at most `replicas_per_visit` replicas of the current app.
    Spread {
        measure: Measure,
        replicas_per_visit: usize,
    },
}

impl Strategy {
    pub fn is_spread(&self) -> bool {
        matches!(self, Strategy::Spread { .. })
    }
}

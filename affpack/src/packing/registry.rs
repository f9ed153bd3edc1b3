use std::collections::BTreeMap;

use crate::entities::Instance;
use crate::packing::{AppOrder, BinSelection, FitScore, Measure, Packer, Reorder, Strategy};
use crate::resources::Demand;
use crate::util::PackerConfig;

/// Maps algorithm names to packing strategies.
/// [`AlgoRegistry::default`] contains every built-in algorithm, more can be registered alongside.
#[derive(Clone, Debug)]
pub struct AlgoRegistry {
    algos: BTreeMap<String, Strategy>,
}

impl AlgoRegistry {
    /// A registry without any algorithm
    pub fn empty() -> Self {
        Self {
            algos: BTreeMap::new(),
        }
    }

    /// Registers `strategy` under `key`, returning the strategy it replaces, if any.
    pub fn register(&mut self, key: impl Into<String>, strategy: Strategy) -> Option<Strategy> {
        self.algos.insert(key.into(), strategy)
    }

    pub fn get(&self, key: &str) -> Option<Strategy> {
        self.algos.get(key).copied()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.algos.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.algos.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.algos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.algos.is_empty()
    }

    /// Creates a packer for the algorithm named `key`, or `None` if the key is unknown.
    pub fn build<'a, D: Demand>(
        &self,
        key: &str,
        instance: &'a Instance<D>,
        config: PackerConfig,
    ) -> Option<Packer<'a, D>> {
        self.get(key)
            .map(|strategy| Packer::new(instance, strategy, config).with_label(key))
    }
}

impl Default for AlgoRegistry {
    fn default() -> Self {
        let mut reg = AlgoRegistry::empty();

        reg.register(
            "FF",
            Strategy::ItemCentric {
                order: AppOrder::Input,
                selection: BinSelection::FirstFit,
            },
        );
        reg.register(
            "FFD-Degree",
            Strategy::ItemCentric {
                order: AppOrder::Degree,
                selection: BinSelection::FirstFit,
            },
        );

        for m in Measure::ALL {
            let order = AppOrder::Size(m);
            reg.register(
                format!("FFD-{}", m.name()),
                Strategy::ItemCentric {
                    order,
                    selection: BinSelection::FirstFit,
                },
            );
            reg.register(
                format!("BFD-{}", m.name()),
                Strategy::ItemCentric {
                    order,
                    selection: BinSelection::BestFit {
                        measure: m,
                        reorder: best_fit_reorder(m),
                    },
                },
            );
            // the touched bin sinks towards the back, out of reach of a bubble pass
            reg.register(
                format!("WFD-{}", m.name()),
                Strategy::ItemCentric {
                    order,
                    selection: BinSelection::WorstFit {
                        measure: m,
                        reorder: Reorder::StableSort,
                    },
                },
            );

            let spread = Strategy::Spread {
                measure: m,
                replicas_per_visit: 1,
            };
            reg.register(format!("SpreadWFD-{}", m.name()), spread);
            reg.register(format!("SpreadWF-{}", m.name()), spread);
        }

        reg.register("NodeCount", Strategy::NodeCount);

        for s in FitScore::ALL {
            reg.register(format!("NCD-{}", s.name()), Strategy::BinCentric(s));
        }
        for s in [FitScore::DotProduct, FitScore::L2Norm, FitScore::Fitness] {
            reg.register(format!("FFD-{}", s.name()), Strategy::BinCentric(s));
        }

        for k in [2, 3, 5] {
            reg.register(
                format!("RefineWFD-Avg-{k}"),
                Strategy::Spread {
                    measure: Measure::Avg,
                    replicas_per_visit: k,
                },
            );
        }

        reg
    }
}

/// A placement only ever lowers the measure of one bin for local measures,
/// which a single bubble pass repairs. Global measures move every bin.
fn best_fit_reorder(measure: Measure) -> Reorder {
    match measure.is_global() {
        true => Reorder::StableSort,
        false => Reorder::BubblePass,
    }
}

/// Creates a packer for one of the built-in algorithms, `None` if `key` is unknown.
pub fn create_packer<'a, D: Demand>(
    key: &str,
    instance: &'a Instance<D>,
    config: PackerConfig,
) -> Option<Packer<'a, D>> {
    AlgoRegistry::default().build(key, instance, config)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use anyhow::Result;
    use float_cmp::approx_eq;
    use test_case::test_case;

    use affpack::entities::{AppRecord, Bin, Instance};
    use affpack::io::export::export;
    use affpack::io::{read_json_instance, write_json_solution};
    use affpack::io::ext_repr::ExtInstance;
    use affpack::io::import::{import_scalar, import_series};
    use affpack::lower_bounds::{
        LowerBound, bpp2d_lower_bound, lb_alpha, lb_cpu, lb_dimension, series_lower_bounds,
    };
    use affpack::packing::sweep::sweep;
    use affpack::packing::{
        AlgoRegistry, AppOrder, BinSelection, Measure, Packer, Reorder, RunStatus, Strategy,
        create_packer,
    };
    use affpack::resources::{Capacity, Demand, Scalar, Series};
    use affpack::util::PackerConfig;
    use affpack::util::assertions::{bins_respect_affinity, solution_valid};

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn scalar_app(id: &str, n: usize, cpu: u32, mem: u32, affinity: &[(&str, usize)]) -> AppRecord<Scalar> {
        AppRecord {
            id: id.to_string(),
            n_replicas: n,
            demand: Scalar::new(cpu, mem),
            degree: affinity.len(),
            affinity: affinity.iter().map(|(o, k)| (o.to_string(), *k)).collect(),
        }
    }

    fn series_app(id: &str, n: usize, cpu: Vec<f32>, mem: Vec<f32>, affinity: &[(&str, usize)]) -> AppRecord<Series> {
        AppRecord {
            id: id.to_string(),
            n_replicas: n,
            demand: Series::new(cpu, mem).unwrap(),
            degree: affinity.len(),
            affinity: affinity.iter().map(|(o, k)| (o.to_string(), *k)).collect(),
        }
    }

    /// Deterministic instance with a mix of sizes, replica counts and affinity rules
    fn generated_scalar(n_apps: usize) -> Instance<Scalar> {
        let records = (0..n_apps)
            .map(|i| {
                let mut affinity = vec![];
                if i % 5 == 0 {
                    affinity.push((format!("app{}", (i + 1) % n_apps), i % 3));
                }
                if i % 7 == 0 {
                    affinity.push((format!("app{i}"), 1));
                }
                AppRecord {
                    id: format!("app{i}"),
                    n_replicas: 1 + i % 4,
                    demand: Scalar::new(1 + (i as u32 * 37) % 23, 1 + (i as u32 * 53) % 29),
                    degree: affinity.len(),
                    affinity,
                }
            })
            .collect();
        Instance::scalar("generated", Capacity::new(40, 50), records).unwrap()
    }

    fn generated_series(n_apps: usize, n_steps: usize) -> Instance<Series> {
        let records = (0..n_apps)
            .map(|i| {
                let mut affinity = vec![];
                if i % 4 == 1 {
                    affinity.push((format!("app{}", (i + 2) % n_apps), i % 2));
                }
                let cpu = (0..n_steps)
                    .map(|t| (1 + (i * 13 + t * 7) % 17) as f32)
                    .collect();
                let mem = (0..n_steps)
                    .map(|t| (2 + (i * 11 + t * 5) % 19) as f32 * 0.5)
                    .collect();
                AppRecord {
                    id: format!("app{i}"),
                    n_replicas: 1 + i % 3,
                    demand: Series::new(cpu, mem).unwrap(),
                    degree: affinity.len(),
                    affinity,
                }
            })
            .collect();
        Instance::series("generated_ts", Capacity::new(30, 20), n_steps, records).unwrap()
    }

    /// Solves `key` the way it is meant to be solved, spread algorithms get the lower bound and First-Fit as bounds
    fn solve_key<'a, D: Demand>(instance: &'a Instance<D>, key: &str) -> Result<Packer<'a, D>>
    where
        Instance<D>: LowerBound,
    {
        let mut packer = create_packer(key, instance, PackerConfig::default()).unwrap();
        match packer.strategy.is_spread() {
            true => {
                let ub = create_packer("FF", instance, PackerConfig::default())
                    .unwrap()
                    .solve()?;
                packer.solve_spread(instance.lower_bound(), ub)?;
            }
            false => {
                packer.solve()?;
            }
        }
        Ok(packer)
    }

    fn allocations<D: Demand>(bins: &[Bin<D>]) -> Vec<BTreeMap<usize, Vec<usize>>> {
        bins.iter().map(|b| b.alloc_map.clone()).collect()
    }

    #[test]
    fn first_fit_scenario() -> Result<()> {
        init_logger();
        let instance = Instance::scalar(
            "ff",
            Capacity::new(4, 4),
            vec![scalar_app("A", 2, 3, 1, &[]), scalar_app("B", 1, 2, 3, &[])],
        )?;
        let mut packer = create_packer("FF", &instance, PackerConfig::default()).unwrap();
        assert_eq!(packer.solve()?, 3);

        let a = instance.app_by_id("A").unwrap().internal_id;
        let b = instance.app_by_id("B").unwrap().internal_id;
        let bins = packer.bins();
        assert_eq!(bins[0].alloc_map, BTreeMap::from([(a, vec![0])]));
        // all replicas of A are placed before B is considered
        assert_eq!(bins[1].alloc_map, BTreeMap::from([(a, vec![1])]));
        assert_eq!(bins[2].alloc_map, BTreeMap::from([(b, vec![0])]));
        assert_eq!(bins[0].residual.cpu, 1);
        assert_eq!(bins[0].residual.mem, 3);
        assert!(bins[0].describe(&instance.apps).ends_with(" A[0]"));
        assert!(instance.app(a).describe(false).starts_with("A (#0): 2 replicas"));
        Ok(())
    }

    #[test]
    fn every_key_respects_zero_tolerance() -> Result<()> {
        init_logger();
        let instance = Instance::scalar(
            "zero_tolerance",
            Capacity::new(100, 100),
            vec![
                scalar_app("A", 3, 5, 5, &[("B", 0)]),
                scalar_app("B", 1, 5, 5, &[]),
            ],
        )?;
        let a = instance.app_by_id("A").unwrap().internal_id;
        let b = instance.app_by_id("B").unwrap().internal_id;

        let registry = AlgoRegistry::default();
        for key in registry.keys() {
            let packer = solve_key(&instance, key)?;
            assert!(solution_valid(&instance, packer.bins()), "{key}");
            for bin in packer.bins() {
                assert!(
                    !(bin.alloc_map.contains_key(&a) && bin.alloc_map.contains_key(&b)),
                    "{key} co-located A and B in bin {}",
                    bin.id
                );
            }
        }
        Ok(())
    }

    #[test_case("FF")]
    #[test_case("FFD-Degree")]
    #[test_case("FFD-Avg")]
    #[test_case("BFD-Max")]
    #[test_case("BFD-Surrogate")]
    #[test_case("WFD-AvgExpo")]
    #[test_case("WFD-ExtendedSum")]
    #[test_case("NodeCount")]
    #[test_case("NCD-DotProduct")]
    #[test_case("NCD-L2Norm")]
    #[test_case("SpreadWFD-Avg")]
    #[test_case("RefineWFD-Avg-2")]
    fn pairs_fill_two_bins(key: &str) -> Result<()> {
        init_logger();
        let instance = Instance::scalar(
            "pairs",
            Capacity::new(10, 10),
            vec![scalar_app("A", 2, 5, 5, &[]), scalar_app("B", 2, 5, 5, &[])],
        )?;
        assert_eq!(instance.lower_bound(), 2);
        let packer = solve_key(&instance, key)?;
        assert_eq!(packer.solution(), Some(2));
        assert!(solution_valid(&instance, packer.bins()));
        Ok(())
    }

    #[test]
    fn self_affinity_spreads_replicas() -> Result<()> {
        let instance = Instance::scalar(
            "self",
            Capacity::new(100, 100),
            vec![scalar_app("A", 3, 1, 1, &[("A", 0)])],
        )?;
        let mut packer = create_packer("FF", &instance, PackerConfig::default()).unwrap();
        assert_eq!(packer.solve()?, 3);
        assert!(packer.bins().iter().all(|b| b.n_replicas() == 1));

        let instance = Instance::scalar(
            "self2",
            Capacity::new(100, 100),
            vec![scalar_app("A", 4, 1, 1, &[("A", 2)])],
        )?;
        let mut packer = create_packer("FF", &instance, PackerConfig::default()).unwrap();
        assert_eq!(packer.solve()?, 2);
        Ok(())
    }

    #[test]
    fn lower_bound_scenario() -> Result<()> {
        let instance = Instance::scalar(
            "lb",
            Capacity::new(10, 10),
            vec![scalar_app("A", 3, 6, 1, &[])],
        )?;
        let items = [(6, 3)];
        assert_eq!(lb_alpha(&items, 10, 6), 0);
        assert_eq!(lb_alpha(&items, 10, 0), 3);
        assert_eq!(lb_cpu(&instance), 3);
        assert_eq!(bpp2d_lower_bound(&instance), 3);
        Ok(())
    }

    #[test]
    fn lower_bound_alpha_classes() {
        // J1: 9 > 10 - 2, J2: 6, J3: 3 and 2
        let items = [(9, 1), (6, 2), (3, 2), (2, 1), (1, 4)];
        // 1 + 2 + ceil((8 + 12 - 20) / 10)
        assert_eq!(lb_alpha(&items, 10, 2), 3);
        // alpha = 3 drops the items of size 2, 6 stays in J2
        assert_eq!(lb_alpha(&items, 10, 3), 3);
        // alpha = 1: 9 > 9 does not hold, so J2 holds 9, 6, 6 and J3 the rest (6 + 2 + 4)
        assert_eq!(lb_alpha(&items, 10, 1), 4);
        assert_eq!(lb_dimension(&items, 10), 4);
    }

    #[test]
    fn series_lower_bound() -> Result<()> {
        let instance = Instance::series(
            "ts_lb",
            Capacity::new(10, 10),
            2,
            vec![
                series_app("A", 2, vec![3.0, 6.0], vec![1.0, 1.0], &[]),
                series_app("B", 1, vec![5.0, 1.0], vec![1.0, 1.0], &[]),
            ],
        )?;
        assert_eq!(series_lower_bounds(&instance), (2, 1));
        assert_eq!(instance.lower_bound(), 2);
        Ok(())
    }

    #[test]
    fn all_keys_valid_and_bounded_scalar() -> Result<()> {
        init_logger();
        let instance = generated_scalar(40);
        let lb = instance.lower_bound();
        let registry = AlgoRegistry::default();
        for key in registry.keys() {
            let packer = solve_key(&instance, key)?;
            let n_bins = packer.solution().unwrap();
            assert!(solution_valid(&instance, packer.bins()), "{key}");
            assert!(lb <= n_bins, "{key}: {n_bins} bins below the lower bound {lb}");
            assert_eq!(n_bins, packer.bins().len());
        }
        Ok(())
    }

    #[test]
    fn all_keys_valid_and_bounded_series() -> Result<()> {
        init_logger();
        let instance = generated_series(30, 6);
        let lb = instance.lower_bound();
        let registry = AlgoRegistry::default();
        for key in registry.keys() {
            let packer = solve_key(&instance, key)?;
            let n_bins = packer.solution().unwrap();
            assert!(solution_valid(&instance, packer.bins()), "{key}");
            assert!(lb <= n_bins, "{key}: {n_bins} bins below the lower bound {lb}");
        }
        Ok(())
    }

    #[test_case("FFD-Surrogate")]
    #[test_case("BFD-ExtendedSum")]
    #[test_case("WFD-Max")]
    #[test_case("NodeCount")]
    #[test_case("NCD-Fitness")]
    #[test_case("SpreadWFD-Max")]
    fn deterministic(key: &str) -> Result<()> {
        let first = generated_scalar(35);
        let second = generated_scalar(35);
        let p1 = solve_key(&first, key)?;
        let p2 = solve_key(&second, key)?;
        assert_eq!(p1.n_bins(), p2.n_bins());
        assert_eq!(allocations(p1.bins()), allocations(p2.bins()));
        Ok(())
    }

    #[test]
    fn resolve_is_idempotent() -> Result<()> {
        let instance = generated_scalar(20);
        let mut packer = create_packer("BFD-Avg", &instance, PackerConfig::default()).unwrap();
        let n = packer.solve()?;
        let before = allocations(packer.bins());
        assert_eq!(packer.solve()?, n);
        assert_eq!(packer.solve_per_batch(3)?, n);
        assert_eq!(allocations(packer.bins()), before);

        packer.clear_solution();
        assert_eq!(packer.status(), RunStatus::Unsolved);
        assert!(packer.bins().is_empty());
        assert_eq!(packer.solve()?, n);
        Ok(())
    }

    #[test_case("FF")]
    #[test_case("FFD-Avg")]
    #[test_case("BFD-AvgExpo")]
    #[test_case("NodeCount")]
    #[test_case("NCD-DotDivision")]
    fn batches(key: &str) -> Result<()> {
        let instance = generated_scalar(30);

        let mut batched = create_packer(key, &instance, PackerConfig::default()).unwrap();
        batched.solve_per_batch(4)?;
        assert!(solution_valid(&instance, batched.bins()));

        let mut whole = create_packer(key, &instance, PackerConfig::default()).unwrap();
        let mut single_batch = create_packer(key, &instance, PackerConfig::default()).unwrap();
        assert_eq!(whole.solve()?, single_batch.solve_per_batch(instance.n_apps())?);
        assert_eq!(allocations(whole.bins()), allocations(single_batch.bins()));

        let mut invalid = create_packer(key, &instance, PackerConfig::default()).unwrap();
        assert!(invalid.solve_per_batch(0).is_err());
        Ok(())
    }

    #[test_case("SpreadWFD-Avg")]
    #[test_case("SpreadWFD-Surrogate")]
    #[test_case("SpreadWF-CPU")]
    #[test_case("RefineWFD-Avg-3")]
    fn spread_search(key: &str) -> Result<()> {
        init_logger();
        let instance = generated_scalar(25);
        let lb = instance.lower_bound();
        let ub = instance.total_replicas();

        let mut packer = create_packer(key, &instance, PackerConfig::default()).unwrap();
        let n = packer.solve_spread(lb, ub)?;
        assert!(lb <= n && n <= ub);
        assert_eq!(packer.solution(), Some(n));
        assert_eq!(packer.bins().len(), n);
        assert!(solution_valid(&instance, packer.bins()));

        // a solved spread run is not solved again
        assert_eq!(packer.solve_spread(lb, ub)?, n);
        // spread runs are driven through solve_spread only
        let mut other = create_packer(key, &instance, PackerConfig::default()).unwrap();
        assert!(other.solve().is_err());
        Ok(())
    }

    #[test]
    fn spread_raises_infeasible_upper_bound() -> Result<()> {
        let instance = Instance::scalar(
            "spread_ub",
            Capacity::new(10, 10),
            vec![scalar_app("A", 6, 6, 6, &[])],
        )?;
        let config = PackerConfig {
            spread_ub_increment: 2,
            ..PackerConfig::default()
        };
        let mut packer = AlgoRegistry::default()
            .build("SpreadWFD-Max", &instance, config)
            .unwrap();
        // 1 bin is infeasible, the upper bound grows to 3, then 5, then 6
        assert_eq!(packer.solve_spread(1, 1)?, 6);
        assert!(solution_valid(&instance, packer.bins()));
        Ok(())
    }

    #[test]
    fn non_spread_strategy_rejects_spread_search() {
        let instance = generated_scalar(5);
        let mut packer = create_packer("FF", &instance, PackerConfig::default()).unwrap();
        assert!(packer.solve_spread(1, 10).is_err());
    }

    #[test]
    fn series_length_mismatch_is_fatal() {
        let result = Instance::series(
            "mismatch",
            Capacity::new(10, 10),
            3,
            vec![
                series_app("A", 1, vec![1.0, 1.0, 1.0], vec![1.0, 1.0, 1.0], &[]),
                series_app("B", 1, vec![1.0, 1.0], vec![1.0, 1.0], &[]),
            ],
        );
        assert!(result.is_err());
        assert!(Series::new(vec![1.0, 2.0], vec![1.0]).is_err());
        assert!(Series::new(vec![1.0, -2.0], vec![1.0, 1.0]).is_err());
    }

    #[test]
    fn invalid_records_are_rejected() {
        let duplicate = Instance::scalar(
            "dup",
            Capacity::new(10, 10),
            vec![scalar_app("A", 1, 1, 1, &[]), scalar_app("A", 1, 1, 1, &[])],
        );
        assert!(duplicate.is_err());
        let no_replicas = Instance::scalar("empty", Capacity::new(10, 10), vec![scalar_app("A", 0, 1, 1, &[])]);
        assert!(no_replicas.is_err());
        let no_capacity = Instance::scalar("cap", Capacity::new(0, 10), vec![scalar_app("A", 1, 1, 1, &[])]);
        assert!(no_capacity.is_err());
    }

    #[test]
    fn oversized_apps_are_dropped() -> Result<()> {
        init_logger();
        let instance = Instance::scalar(
            "oversized",
            Capacity::new(10, 10),
            vec![
                scalar_app("A", 1, 20, 1, &[]),
                scalar_app("B", 2, 2, 2, &[("A", 0), ("C", 1), ("ghost", 0)]),
                scalar_app("C", 1, 3, 3, &[("A", 1)]),
            ],
        )?;
        assert_eq!(instance.n_apps(), 2);
        assert_eq!(instance.dropped, vec!["A".to_string()]);
        assert!(instance.app_by_id("A").is_none());

        let b = instance.app_by_id("B").unwrap();
        let c = instance.app_by_id("C").unwrap();
        assert_eq!(b.affinity_out, BTreeMap::from([(c.internal_id, 1)]));
        assert!(c.affinity_out.is_empty());
        assert_eq!(c.affinity_in, BTreeMap::from([(b.internal_id, 1)]));
        assert_eq!(b.total_degree, 1);
        assert_eq!(c.total_degree, 1);
        assert_eq!(instance.total_replicas(), 3);
        Ok(())
    }

    #[test]
    fn sizing_measures() -> Result<()> {
        let instance = Instance::scalar(
            "sizes",
            Capacity::new(10, 10),
            vec![scalar_app("A", 1, 5, 5, &[]), scalar_app("B", 1, 5, 0, &[])],
        )?;
        let a = instance.app_by_id("A").unwrap();
        assert!(approx_eq!(f64, a.sizes.avg, 1.0));
        assert!(approx_eq!(f64, a.sizes.max, 0.5));
        assert!(approx_eq!(f64, a.sizes.cpu, 0.5));
        assert!(approx_eq!(f64, a.sizes.surrogate, 0.5, epsilon = 1e-12));
        assert!(approx_eq!(f64, a.sizes.ext_sum, 1.5, epsilon = 1e-12));
        let expo = 0.5 * (0.005f64).exp() + 0.5 * (0.0025f64).exp();
        assert!(approx_eq!(f64, a.sizes.avg_expo, expo, epsilon = 1e-12));
        assert!(approx_eq!(f64, a.size(Measure::Max), 0.5));
        Ok(())
    }

    #[test]
    fn series_and_scalar_measures_agree_on_one_step() -> Result<()> {
        let scalar = Instance::scalar(
            "one_step",
            Capacity::new(10, 20),
            vec![scalar_app("A", 2, 4, 6, &[]), scalar_app("B", 1, 3, 9, &[])],
        )?;
        let series = Instance::series(
            "one_step_ts",
            Capacity::new(10, 20),
            1,
            vec![
                series_app("A", 2, vec![4.0], vec![6.0], &[]),
                series_app("B", 1, vec![3.0], vec![9.0], &[]),
            ],
        )?;
        for (s, t) in scalar.apps.iter().zip(series.apps.iter()) {
            for m in Measure::ALL {
                assert!(approx_eq!(f64, s.size(m), t.size(m), epsilon = 1e-9), "{m:?}");
            }
        }
        Ok(())
    }

    #[test]
    fn bin_affinity_compliance() -> Result<()> {
        let instance = Instance::scalar(
            "compliance",
            Capacity::new(100, 100),
            vec![
                scalar_app("A", 1, 1, 1, &[("B", 1)]),
                scalar_app("B", 3, 1, 1, &[]),
            ],
        )?;
        let a = instance.app_by_id("A").unwrap();
        let b = instance.app_by_id("B").unwrap();

        let mut bin: Bin<Scalar> = Bin::new(0, instance.capacity, 1);
        bin.place(b, 0);
        assert!(bin.is_affinity_compliant(a));
        bin.place(b, 1);
        assert!(!bin.is_affinity_compliant(a));

        let mut bin: Bin<Scalar> = Bin::new(1, instance.capacity, 1);
        bin.place(a, 0);
        assert_eq!(bin.conflict_map.get(&b.internal_id), Some(&1));
        assert!(bin.is_affinity_compliant(b));
        bin.place(b, 2);
        assert!(!bin.is_affinity_compliant(b));
        assert!(bins_respect_affinity(&instance, &[bin]));
        Ok(())
    }

    #[test]
    fn unknown_key_has_no_algorithm() {
        let instance = generated_scalar(3);
        assert!(create_packer("FFD-Unknown", &instance, PackerConfig::default()).is_none());
        assert!(AlgoRegistry::empty().build("FF", &instance, PackerConfig::default()).is_none());
    }

    #[test]
    fn registry_is_extensible() -> Result<()> {
        let mut registry = AlgoRegistry::default();
        let n_builtin = registry.len();
        let bfd_avg = registry.get("BFD-Avg");

        let custom = Strategy::ItemCentric {
            order: AppOrder::Size(Measure::Max),
            selection: BinSelection::BestFit {
                measure: Measure::Avg,
                reorder: Reorder::StableSort,
            },
        };
        assert!(registry.register("BFD-MaxAvg", custom).is_none());
        assert_eq!(registry.len(), n_builtin + 1);
        assert_eq!(registry.get("BFD-Avg"), bfd_avg);

        let instance = generated_scalar(15);
        let mut packer = registry.build("BFD-MaxAvg", &instance, PackerConfig::default()).unwrap();
        packer.solve()?;
        assert_eq!(packer.label(), "BFD-MaxAvg");
        assert!(solution_valid(&instance, packer.bins()));
        Ok(())
    }

    #[test]
    fn aliases_share_strategies() {
        let registry = AlgoRegistry::default();
        assert_eq!(registry.get("FFD-DotProduct"), registry.get("NCD-DotProduct"));
        assert_eq!(registry.get("SpreadWF-Avg"), registry.get("SpreadWFD-Avg"));
        assert!(registry.contains("FFD-CPU"));
        assert!(registry.contains("BFD-CPU"));
        assert!(registry.contains("WFD-CPU"));
    }

    #[test]
    fn import_solve_export() -> Result<()> {
        init_logger();
        let json = r#"{
            "name": "tiny",
            "capacity": {"cpu": 4, "mem": 4},
            "apps": [
                {"id": "A", "replicas": 2, "demand": {"type": "scalar", "cpu": 3, "mem": 1}},
                {"id": "B", "replicas": 1, "demand": {"type": "scalar", "cpu": 2, "mem": 3},
                 "affinity": [{"app": "A", "tolerated": 1}]}
            ]
        }"#;
        let ext_instance: ExtInstance = serde_json::from_str(json)?;
        let instance = import_scalar(&ext_instance)?;
        assert!(import_series(&ext_instance, 1).is_err());

        let mut packer = create_packer("FF", &instance, PackerConfig::default()).unwrap();
        packer.solve()?;
        let solution = export(&packer, Some(instance.lower_bound()));
        assert_eq!(solution.n_bins, 3);
        assert_eq!(solution.algorithm, "FF");
        assert_eq!(
            solution.bins[1].allocation,
            BTreeMap::from([("A".to_string(), vec![1])])
        );
        assert_eq!(
            solution.bins[2].allocation,
            BTreeMap::from([("B".to_string(), vec![0])])
        );
        let serialized = serde_json::to_string(&solution)?;
        assert!(serialized.contains("\"tiny\""));
        Ok(())
    }

    #[test]
    fn import_series_instance() -> Result<()> {
        let json = r#"{
            "name": "tiny_ts",
            "capacity": {"cpu": 10, "mem": 10},
            "apps": [
                {"id": "A", "replicas": 2, "demand": {"type": "series", "cpu": [6, 2, 6], "mem": [1, 1, 1]}},
                {"id": "B", "replicas": 2, "demand": {"type": "series", "cpu": [2, 6, 2], "mem": [1, 1, 1]}}
            ]
        }"#;
        let ext_instance: ExtInstance = serde_json::from_str(json)?;
        assert!(import_series(&ext_instance, 4).is_err());
        let instance = import_series(&ext_instance, 3)?;

        // complementary series share a bin
        let mut packer = create_packer("FF", &instance, PackerConfig::default()).unwrap();
        assert_eq!(packer.solve()?, 2);
        assert!(solution_valid(&instance, packer.bins()));
        Ok(())
    }

    #[test]
    fn parallel_sweep() -> Result<()> {
        init_logger();
        let instance = generated_scalar(30);
        let registry = AlgoRegistry::default();
        let keys = ["FF", "FFD-Avg", "BFD-Max", "NodeCount", "NCD-Fitness", "SpreadWFD-Avg", "nope"];
        let report = sweep(&instance, &registry, &keys, PackerConfig::default())?;

        assert_eq!(report.results.len(), keys.len());
        assert_eq!(report.lower_bound, instance.lower_bound().max(1));
        assert!(report.results[6].n_bins.is_err());

        let ff = report.results[0].n_bins.as_ref().unwrap();
        assert_eq!(*ff, report.upper_bound);
        let best = report.best().unwrap();
        assert!(*best.n_bins.as_ref().unwrap() <= *ff);
        assert!(report.lower_bound <= *best.n_bins.as_ref().unwrap());
        Ok(())
    }

    #[test]
    fn json_files() -> Result<()> {
        let dir = std::env::temp_dir().join(format!("affpack_json_{}", std::process::id()));
        std::fs::create_dir_all(&dir)?;
        let instance_path = dir.join("instance.json");
        std::fs::write(
            &instance_path,
            r#"{"name": "file", "capacity": {"cpu": 8, "mem": 8},
                "apps": [{"id": "web", "replicas": 3, "demand": {"type": "scalar", "cpu": 4, "mem": 2}}]}"#,
        )?;

        let ext_instance = read_json_instance(&instance_path)?;
        let instance = import_scalar(&ext_instance)?;
        let mut packer = create_packer("BFD-Avg", &instance, PackerConfig::default()).unwrap();
        assert_eq!(packer.solve()?, 2);

        let solution_path = dir.join("solution.json");
        write_json_solution(&export(&packer, None), &solution_path)?;
        let written: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&solution_path)?)?;
        assert_eq!(written["n_bins"], 2);

        assert!(read_json_instance(&dir.join("missing.json")).is_err());
        std::fs::remove_dir_all(&dir)?;
        Ok(())
    }

    #[test]
    fn spread_keeps_best_bins_after_failed_probes() -> Result<()> {
        let instance = Instance::scalar(
            "spread_best",
            Capacity::new(10, 10),
            vec![scalar_app("A", 4, 6, 6, &[])],
        )?;
        let mut packer = create_packer("SpreadWFD-Avg", &instance, PackerConfig::default()).unwrap();
        // probes 8 and 4 succeed, 2 and 3 fail after 4 was found
        assert_eq!(packer.solve_spread(1, 8)?, 4);
        assert_eq!(packer.bins().len(), 4);
        assert!(packer.bins().iter().all(|b| b.n_replicas() == 1));
        assert!(solution_valid(&instance, packer.bins()));
        Ok(())
    }

    #[test]
    fn spread_lower_bound_above_replica_count() -> Result<()> {
        let instance = Instance::scalar(
            "spread_lb",
            Capacity::new(10, 10),
            vec![scalar_app("A", 3, 6, 6, &[])],
        )?;
        let mut packer = create_packer("SpreadWFD-Max", &instance, PackerConfig::default()).unwrap();
        assert_eq!(packer.solve_spread(10, 12)?, 3);
        assert_eq!(packer.bins().len(), 3);
        assert!(solution_valid(&instance, packer.bins()));
        Ok(())
    }

    #[test]
    fn empty_instance() -> Result<()> {
        let instance = Instance::scalar("empty", Capacity::new(10, 10), vec![])?;
        assert_eq!(instance.n_steps, 1);
        assert_eq!(instance.lower_bound(), 0);
        let mut packer = create_packer("BFD-Avg", &instance, PackerConfig::default()).unwrap();
        assert_eq!(packer.solve()?, 0);
        assert!(packer.bins().is_empty());
        Ok(())
    }

    #[test]
    fn sweep_in_batches() -> Result<()> {
        init_logger();
        let instance = generated_scalar(30);
        let registry = AlgoRegistry::default();
        let keys = ["FFD-Avg", "BFD-Surrogate", "NodeCount", "NCD-DotProduct", "SpreadWFD-Avg"];
        let config = PackerConfig {
            batch_size: Some(4),
            ..PackerConfig::default()
        };
        let report = sweep(&instance, &registry, &keys, config)?;
        assert_eq!(report.results.len(), keys.len());

        for result in &report.results {
            let n_bins = *result.n_bins.as_ref().unwrap();
            assert!(report.lower_bound <= n_bins, "{}", result.key);

            let mut packer = registry.build(&result.key, &instance, config).unwrap();
            let expected = match packer.strategy.is_spread() {
                true => packer.solve_spread(report.lower_bound, report.upper_bound)?,
                false => packer.solve_per_batch(4)?,
            };
            assert_eq!(n_bins, expected, "{}", result.key);
            assert!(solution_valid(&instance, packer.bins()));
        }
        Ok(())
    }
}

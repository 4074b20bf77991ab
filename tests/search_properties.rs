//! Property tests for scoring and search invariants.

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use bike_geometry_search::search::{
    r_partition, run_brute_force, DesignProblem, DomainSet, GaConfig, Genome, OperatorCounts, PartitionConfig,
    PartitionMode, ScoredGenome,
};
use bike_geometry_search::{
    compute_error, sum_of_squared_difference, Attribute, BikeGeometry, GeometryParams, RiderParams,
    SegmentMassFractions,
};

fn base_geometry() -> GeometryParams {
    GeometryParams {
        wheelbase: 1.0,
        hip_angle: 100.0,
        headtube_angle: 15.0,
        crank_radius: 0.1,
        crank_x_offset: 0.45,
        crank_z_offset: 0.55,
        fork_offset: 0.04,
        seat_height: 0.9,
        handlebar_radius: 0.3,
        front_wheel_radius: 0.35,
        rear_wheel_radius: 0.35,
        frame_mass: 8.0,
        crank_mass: 1.0,
        front_wheel_mass: 1.5,
        rear_wheel_mass: 1.5,
    }
}

fn rider() -> RiderParams {
    RiderParams {
        name: "alice".to_string(),
        rider_mass: 70.0,
        head_diameter: 0.2,
        torso_length: 0.6,
        torso_depth: 0.25,
        torso_width: 0.4,
        arm_length: 0.6,
        arm_diameter: 0.08,
        leg_length: 0.9,
        leg_diameter: 0.12,
    }
}

fn curve_strategy() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-100.0f64..100.0, 0..20)
}

fn scored_strategy() -> impl Strategy<Value = Vec<ScoredGenome>> {
    prop::collection::vec(
        (
            prop_oneof![4 => 0.0f64..10.0, 1 => Just(f64::INFINITY)],
            0usize..6,
            0usize..6,
        ),
        0..40,
    )
    .prop_map(|points| {
        points
            .into_iter()
            .map(|(score, seat, wheelbase)| {
                let mut genome = Genome::default();
                genome.set(Attribute::SeatHeight, seat);
                genome.set(Attribute::Wheelbase, wheelbase);
                ScoredGenome::new(score, genome)
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn squared_difference_is_symmetric_and_nonnegative(a in curve_strategy(), b in curve_strategy()) {
        let ab = sum_of_squared_difference(&a, &b);
        let ba = sum_of_squared_difference(&b, &a);
        prop_assert!(ab >= 0.0);
        prop_assert_eq!(ab, ba);
        prop_assert_eq!(sum_of_squared_difference(&a, &a), 0.0);
    }

    #[test]
    fn partitions_are_a_disjoint_cover_of_candidates(
        points in scored_strategy(),
        radius in 0.0f64..4.0,
        max_mode in any::<bool>(),
    ) {
        let mode = if max_mode { PartitionMode::Max } else { PartitionMode::Min };
        let config = PartitionConfig::new(radius, vec![Attribute::SeatHeight, Attribute::Wheelbase])
            .with_mode(mode);
        let partitions = r_partition(&points, &config);

        let mut seen = vec![false; points.len()];
        for partition in &partitions {
            prop_assert!(!partition.is_empty());
            for &index in partition {
                prop_assert!(!seen[index], "index {} in two partitions", index);
                seen[index] = true;
                prop_assert!(points[index].score.is_finite());
            }
        }

        let finite: Vec<f64> = points.iter().map(|p| p.score).filter(|s| s.is_finite()).collect();
        if !finite.is_empty() {
            let threshold = finite.iter().sum::<f64>() / finite.len() as f64 * config.threshold_factor;
            for (index, point) in points.iter().enumerate() {
                let kept = point.score.is_finite()
                    && match mode {
                        PartitionMode::Min => point.score <= threshold,
                        PartitionMode::Max => point.score >= threshold,
                    };
                prop_assert_eq!(seen[index], kept);
            }
        }
    }

    #[test]
    fn operator_counts_fill_the_population(
        population in 1usize..300,
        selection in 0.0f64..40.0,
        cross_over in 0.0f64..30.0,
        mutation in 0.0f64..30.0,
    ) {
        let config = GaConfig::default()
            .with_population(population, 1)
            .with_percentages(selection, cross_over, mutation);
        if let Ok(counts) = OperatorCounts::from_config(&config) {
            prop_assert_eq!(counts.total(), population);
        }
    }

    #[test]
    fn overlapping_wheels_never_fit(
        wheelbase in 0.5f64..1.2,
        front in 0.2f64..0.8,
        rear in 0.2f64..0.8,
    ) {
        prop_assume!(front + rear >= wheelbase);
        let mut params = base_geometry();
        params.wheelbase = wheelbase;
        params.front_wheel_radius = front;
        params.rear_wheel_radius = rear;

        let geometry = BikeGeometry::from_params(&params);
        let error = compute_error(&geometry, &[rider()], &[0.0, 1.0], 2, &SegmentMassFractions::default());
        prop_assert_eq!(error, f64::INFINITY);
    }
}

#[test]
fn zero_radius_gives_one_partition_per_distinct_point() {
    let mut points = Vec::new();
    for seat in 0..3 {
        let mut genome = Genome::default();
        genome.set(Attribute::SeatHeight, seat);
        points.push(ScoredGenome::new(1.0, genome));
    }
    let config = PartitionConfig::new(0.0, vec![Attribute::SeatHeight]).with_threshold_factor(1.0);
    assert_eq!(r_partition(&points, &config).len(), 3);
}

#[test]
fn single_value_domains_evaluate_exactly_one_design() {
    let problem = DesignProblem::new(DomainSet::single(&base_geometry()), vec![rider()], vec![0.0, 3.0, 6.0]);
    let result = run_brute_force(&problem, 5).unwrap();
    assert_eq!(result.evaluated, 1);
    assert_eq!(result.best.len(), 1);
    assert_eq!(result.best[0].params, base_geometry());
    assert!(result.best[0].score.is_finite());
}

#[test]
fn random_genomes_stay_in_range() {
    let mut domains: [Vec<f64>; Attribute::COUNT] = base_geometry().values().map(|v| vec![v]);
    domains[Attribute::SeatHeight.index()] = vec![0.8, 0.85, 0.9, 0.95];
    domains[Attribute::CrankXOffset.index()] = vec![0.4, 0.45, 0.5];
    let domains = DomainSet::new(domains).unwrap();

    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..200 {
        let genome = domains.random_genome(&mut rng);
        assert!(domains.contains(&genome));
        let params = domains.to_params(&genome);
        assert!(domains.domain(Attribute::SeatHeight).contains(&params.seat_height));
    }
}

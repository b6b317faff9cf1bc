use tablediff::sampling::SamplingPlanner;

#[test]
fn constructor_rejects_out_of_range_confidence_and_margin() {
    assert!(SamplingPlanner::new(0.0, 0.01).is_err());
    assert!(SamplingPlanner::new(1.0, 0.01).is_err());
    assert!(SamplingPlanner::new(0.95, 0.0).is_err());
    assert!(SamplingPlanner::new(0.95, 1.0).is_err());
    assert!(SamplingPlanner::new(0.95, 0.01).is_ok());
}

#[test]
fn sample_size_never_exceeds_the_population_when_population_exceeds_the_floor() {
    let planner = SamplingPlanner {
        min_sample_size: 10,
        max_sample_size: 1_000_000,
        ..SamplingPlanner::new(0.95, 0.01).unwrap()
    };
    // Population of 50 is above the floor of 10, so the finite-population
    // correction should cap the sample at the population itself.
    assert_eq!(planner.sample_size(50, 0.5), 50);
}

#[test]
fn sample_size_respects_the_configured_floor_on_a_large_population() {
    let planner = SamplingPlanner {
        min_sample_size: 2000,
        max_sample_size: 1_000_000,
        ..SamplingPlanner::new(0.99, 0.05).unwrap()
    };
    assert!(planner.sample_size(10_000_000, 0.5) >= 2000);
}

#[test]
fn sample_size_respects_the_configured_ceiling_on_an_enormous_population() {
    let planner = SamplingPlanner {
        min_sample_size: 1,
        max_sample_size: 5_000,
        ..SamplingPlanner::new(0.999, 0.001).unwrap()
    };
    assert!(planner.sample_size(10_000_000_000, 0.5) <= 5_000);
}

#[test]
fn tighter_margin_of_error_never_requires_a_smaller_sample() {
    let loose = SamplingPlanner::new(0.95, 0.05).unwrap();
    let tight = SamplingPlanner::new(0.95, 0.01).unwrap();
    assert!(tight.sample_size(1_000_000, 0.5) >= loose.sample_size(1_000_000, 0.5));
}

#[test]
fn higher_confidence_never_requires_a_smaller_sample() {
    let low = SamplingPlanner::new(0.90, 0.02).unwrap();
    let high = SamplingPlanner::new(0.999, 0.02).unwrap();
    assert!(high.sample_size(1_000_000, 0.5) >= low.sample_size(1_000_000, 0.5));
}

#[test]
fn confidence_interval_widens_as_sample_size_shrinks() {
    let planner = SamplingPlanner::new(0.95, 0.01).unwrap();
    let wide = planner.confidence_interval(100, 0.5);
    let narrow = planner.confidence_interval(10_000, 0.5);
    assert!(wide > narrow);
}

#[test]
fn confidence_interval_is_infinite_for_an_empty_sample() {
    let planner = SamplingPlanner::new(0.95, 0.01).unwrap();
    assert_eq!(planner.confidence_interval(0, 0.5), f64::INFINITY);
}

#[test]
fn confidence_interval_is_zero_at_the_extremes_of_observed_proportion() {
    let planner = SamplingPlanner::new(0.95, 0.01).unwrap();
    assert_eq!(planner.confidence_interval(1000, 0.0), 0.0);
    assert_eq!(planner.confidence_interval(1000, 1.0), 0.0);
}

#[test]
fn untabulated_confidence_levels_still_produce_a_usable_sample_size() {
    // 0.97 isn't in the internal z-score lookup table; this exercises the
    // rational-approximation fallback end to end.
    let planner = SamplingPlanner::new(0.97, 0.02).unwrap();
    let n = planner.sample_size(1_000_000, 0.5);
    assert!(n >= planner.min_sample_size && n <= planner.max_sample_size);
}

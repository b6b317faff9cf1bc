use tablediff::key::{self, KeyValue, Vector};

#[test]
fn validate_bounds_rejects_inverted_range() {
    let min = Vector::new(vec![KeyValue::Int(10)]);
    let max = Vector::new(vec![KeyValue::Int(1)]);
    assert!(key::validate_bounds(&min, &max).is_err());
}

#[test]
fn validate_bounds_accepts_equal_bounds() {
    let min = Vector::new(vec![KeyValue::Int(5)]);
    let max = Vector::new(vec![KeyValue::Int(5)]);
    assert!(key::validate_bounds(&min, &max).is_ok());
}

#[test]
fn split_key_space_produces_count_plus_one_checkpoints() {
    let points = key::split_key_space(&KeyValue::Int(0), &KeyValue::Int(1000), 4).unwrap();
    assert_eq!(points[0], KeyValue::Int(0));
    assert_eq!(*points.last().unwrap(), KeyValue::Int(1000));
    assert!(points.len() <= 5);
}

#[test]
fn split_key_space_rejects_mixed_variants() {
    let err = key::split_key_space(&KeyValue::Int(0), &KeyValue::Hex("ff".into()), 4);
    assert!(err.is_err());
}

#[test]
fn create_mesh_from_points_covers_the_full_range_with_no_gaps() {
    let points = vec![KeyValue::Int(0), KeyValue::Int(10), KeyValue::Int(20)];
    let boxes = key::create_mesh_from_points(&[points]).unwrap();
    assert_eq!(boxes.len(), 2);
    assert_eq!(boxes[0].0, Vector::new(vec![KeyValue::Int(0)]));
    assert_eq!(boxes[1].1, Vector::new(vec![KeyValue::Int(20)]));
}

#[test]
fn approximate_size_is_monotonic_in_range_width() {
    let narrow = key::approximate_size(
        &Vector::new(vec![KeyValue::Int(0)]),
        &Vector::new(vec![KeyValue::Int(10)]),
    );
    let wide = key::approximate_size(
        &Vector::new(vec![KeyValue::Int(0)]),
        &Vector::new(vec![KeyValue::Int(1000)]),
    );
    assert!(narrow.unwrap() < wide.unwrap());
}

#[test]
fn compound_key_space_splits_each_dimension() {
    let min = Vector::new(vec![KeyValue::Int(0), KeyValue::Int(0)]);
    let max = Vector::new(vec![KeyValue::Int(100), KeyValue::Int(100)]);
    let dims = key::split_compound_key_space(&min, &max, 4).unwrap();
    assert_eq!(dims.len(), 2);
    for dim in &dims {
        assert_eq!(dim.first(), Some(&KeyValue::Int(0)));
        assert_eq!(dim.last(), Some(&KeyValue::Int(100)));
    }
}

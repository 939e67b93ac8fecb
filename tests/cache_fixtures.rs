//! Fixture cache behaviour on a temporary directory

use std::fs;

use ec_fwht::bn256::{Fr, G1Affine};
use ec_fwht::random::{random_points_par, random_scalars_par};
use ec_fwht::{CacheError, FixtureCache};
use group::prime::PrimeCurveAffine;

#[test]
fn paths_follow_layout() {
    let dir = tempfile::tempdir().unwrap();
    let cache = FixtureCache::new(dir.path());

    let s = cache.scalar_path(10).unwrap();
    let p = cache.point_path(10).unwrap();
    assert!(s.ends_with("data/scalars/exp_10_scalar.json"));
    assert!(p.ends_with("data/points/exp_10_point.json"));
    assert!(dir.path().join("data/scalars").is_dir());
    assert!(dir.path().join("data/points").is_dir());
}

#[test]
fn saved_inputs_load_back() {
    let dir = tempfile::tempdir().unwrap();
    let cache = FixtureCache::new(dir.path());

    let scalars = random_scalars_par::<G1Affine>(32, 2, 3);
    let mut points = random_points_par::<G1Affine>(32, 2, 4);
    points[7] = G1Affine::identity();

    let s = cache.scalar_path(5).unwrap();
    let p = cache.point_path(5).unwrap();
    cache.save_scalars::<G1Affine>(&s, 5, &scalars).unwrap();
    cache.save_points(&p, 5, &points).unwrap();

    assert_eq!(cache.load_scalars::<G1Affine>(&s).unwrap(), (scalars, 5));
    assert_eq!(cache.load_points::<G1Affine>(&p).unwrap(), (points, 5));
}

#[test]
fn count_mismatch_is_malformed() {
    let dir = tempfile::tempdir().unwrap();
    let cache = FixtureCache::new(dir.path());
    let path = cache.scalar_path(1).unwrap();
    fs::write(&path, r#"{"exp":1,"n":2,"scalars_hex":["01"]}"#).unwrap();

    assert!(matches!(
        cache.load_scalars::<G1Affine>(&path),
        Err(CacheError::Malformed(_))
    ));
}

#[test]
fn bad_point_is_malformed() {
    let dir = tempfile::tempdir().unwrap();
    let cache = FixtureCache::new(dir.path());
    let path = cache.point_path(0).unwrap();
    fs::write(&path, r#"{"exp":0,"n":1,"points_b64":["not base64!"]}"#).unwrap();

    assert!(matches!(
        cache.load_points::<G1Affine>(&path),
        Err(CacheError::Malformed(_))
    ));
}

#[test]
fn missing_file_and_bad_json_surface_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let cache = FixtureCache::new(dir.path());

    let missing = dir.path().join("nope.json");
    assert!(matches!(
        cache.load_scalars::<G1Affine>(&missing),
        Err(CacheError::Io(_))
    ));

    let path = cache.point_path(2).unwrap();
    fs::write(&path, "{ not json").unwrap();
    assert!(matches!(
        cache.load_points::<G1Affine>(&path),
        Err(CacheError::Json(_))
    ));
}

#[test]
fn load_or_create_generates_then_reuses() {
    let dir = tempfile::tempdir().unwrap();
    let cache = FixtureCache::new(dir.path());

    let (first, cached) = cache
        .load_or_create_scalars::<G1Affine, _>(3, 8, |n| (1..=n as u64).map(Fr::from).collect())
        .unwrap();
    assert!(!cached);

    let (second, cached) = cache
        .load_or_create_scalars::<G1Affine, _>(3, 8, |_| panic!("cache should be used"))
        .unwrap();
    assert!(cached);
    assert_eq!(first, second);
}

#[test]
fn stale_cache_is_regenerated() {
    let dir = tempfile::tempdir().unwrap();
    let cache = FixtureCache::new(dir.path());

    let path = cache.point_path(4).unwrap();
    fs::write(&path, r#"{"exp":4,"n":3,"points_b64":[]}"#).unwrap();

    let (points, cached) = cache
        .load_or_create_points(4, 16, |n| vec![G1Affine::generator(); n])
        .unwrap();
    assert!(!cached);
    assert_eq!(points.len(), 16);

    // Wrong size for the requested n is also regenerated.
    let (_, cached) = cache
        .load_or_create_points(4, 8, |n| vec![G1Affine::generator(); n])
        .unwrap();
    assert!(!cached);
}

#[test]
fn load_or_create_inputs_reports_both_cached() {
    let dir = tempfile::tempdir().unwrap();
    let cache = FixtureCache::new(dir.path());
    let gen_s = |n| random_scalars_par::<G1Affine>(n, 1, 9);
    let gen_p = |n| random_points_par::<G1Affine>(n, 1, 9);

    let (s1, p1, cached) = cache.load_or_create_inputs::<G1Affine, _, _>(2, 4, gen_s, gen_p).unwrap();
    assert!(!cached);
    let (s2, p2, cached) = cache.load_or_create_inputs::<G1Affine, _, _>(2, 4, gen_s, gen_p).unwrap();
    assert!(cached);
    assert_eq!((s1, p1), (s2, p2));
}

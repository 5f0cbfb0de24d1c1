use kira_doseresp::dvh::{DvhConfig, build_dvh};
use kira_doseresp::error::EngineError;
use kira_doseresp::grid::{Contour, DoseGrid, Structure};
use kira_doseresp::mask::{FillRule, resolve_mask};

fn grid() -> DoseGrid {
    DoseGrid::new([10, 10, 5], [1.0, 1.0, 1.0], [0.0, 0.0, 0.0], vec![50.0; 500]).unwrap()
}

fn square(z: f64, lo: f64, hi: f64) -> Contour {
    Contour {
        z,
        points: vec![[lo, lo], [hi, lo], [hi, hi], [lo, hi]],
    }
}

#[test]
fn square_prism_covers_expected_voxels() {
    let s = Structure::new(
        1,
        "box",
        vec![square(0.0, 1.5, 4.5), square(1.0, 1.5, 4.5), square(2.0, 1.5, 4.5)],
    );
    let mask = resolve_mask(&grid(), &s, FillRule::EvenOdd).unwrap();
    assert_eq!(mask.len(), 27);
    assert_eq!(mask.out_of_grid, 0);
    assert!(mask.indices.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn nested_contour_is_a_hole_under_even_odd() {
    let s = Structure::new(
        2,
        "ring",
        vec![square(2.0, 0.5, 8.5), square(2.0, 2.5, 5.5)],
    );
    let even_odd = resolve_mask(&grid(), &s, FillRule::EvenOdd).unwrap();
    let non_zero = resolve_mask(&grid(), &s, FillRule::NonZero).unwrap();
    assert_eq!(even_odd.len(), 64 - 9);
    assert_eq!(non_zero.len(), 64);
}

#[test]
fn voxels_beyond_the_grid_are_counted_not_kept() {
    let g = grid();
    let s = Structure::new(3, "edge", vec![square(0.0, -2.5, 2.5)]);
    let mask = resolve_mask(&g, &s, FillRule::EvenOdd).unwrap();
    assert_eq!(mask.len(), 9);
    assert_eq!(mask.out_of_grid, 16);

    let dvh = build_dvh(&g, &mask, &DvhConfig::default()).unwrap();
    assert_eq!(dvh.out_of_grid_voxels(), 16);
    assert_eq!(dvh.sample_count(), 9);
}

#[test]
fn contour_between_voxel_centres_is_empty() {
    let s = Structure::new(4, "tiny", vec![square(1.0, 2.2, 2.8)]);
    let err = resolve_mask(&grid(), &s, FillRule::EvenOdd).unwrap_err();
    assert_eq!(err, EngineError::EmptyStructure("tiny".to_string()));

    let none = Structure::new(5, "none", Vec::new());
    assert!(matches!(
        resolve_mask(&grid(), &none, FillRule::EvenOdd),
        Err(EngineError::EmptyStructure(_))
    ));
}

#[test]
fn mask_from_another_grid_is_rejected() {
    let a = grid();
    let b = grid();
    let s = Structure::new(6, "s", vec![square(1.0, 1.5, 4.5)]);
    let mask = resolve_mask(&a, &s, FillRule::EvenOdd).unwrap();
    let err = build_dvh(&b, &mask, &DvhConfig::default()).unwrap_err();
    assert!(matches!(err, EngineError::GridMismatch { .. }));
}

#[test]
fn uneven_contour_spacing_leaves_no_gaps() {
    let g = DoseGrid::new([10, 10, 10], [1.0, 1.0, 1.0], [0.0, 0.0, 0.0], vec![50.0; 1000]).unwrap();
    let contours = [0.0, 1.0, 2.0, 5.0, 8.0]
        .iter()
        .map(|&z| square(z, 1.5, 4.5))
        .collect();
    let s = Structure::new(7, "uneven", contours);
    let mask = resolve_mask(&g, &s, FillRule::EvenOdd).unwrap();

    let mut per_slice = [0usize; 10];
    for idx in &mask.indices {
        per_slice[idx / 100] += 1;
    }
    assert_eq!(per_slice, [9, 9, 9, 9, 9, 9, 9, 9, 9, 0]);
}

#[test]
fn single_plane_claims_only_its_nearest_slice() {
    let s = Structure::new(8, "flat", vec![square(2.3, 1.5, 4.5)]);
    let mask = resolve_mask(&grid(), &s, FillRule::EvenOdd).unwrap();
    assert_eq!(mask.len(), 9);
    assert!(mask.indices.iter().all(|idx| idx / 100 == 2));
}

#[test]
fn far_outlying_contour_is_counted_without_scanning_it() {
    let s = Structure::new(
        9,
        "strip",
        vec![Contour {
            z: 1.0,
            points: vec![[0.5, 1.5], [1.0e7, 1.5], [1.0e7, 2.5], [0.5, 2.5]],
        }],
    );
    let mask = resolve_mask(&grid(), &s, FillRule::EvenOdd).unwrap();
    assert_eq!(mask.len(), 9);
    assert_eq!(mask.out_of_grid, 9_999_990);
}

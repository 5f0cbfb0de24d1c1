use kira_doseresp::dvh::Dvh;
use kira_doseresp::error::EngineError;
use kira_doseresp::metrics::{dx, eud, vx, vx_cc};

fn four_doses() -> Dvh {
    Dvh::from_doses("s", vec![3.0, 1.0, 4.0, 2.0], 0.5, 0.001).unwrap()
}

#[test]
fn uniform_dose_is_a_single_step() {
    let dvh = Dvh::from_doses("ptv", vec![70.0; 1000], 0.1, 0.008).unwrap();
    assert_eq!(dvh.differential().count(), 1);
    assert_eq!(dvh.cumulative_at(70.0 - 1e-6), 1.0);
    assert_eq!(dvh.cumulative_at(70.0 + 1e-6), 0.0);
    assert!((dvh.mean_dose() - 70.0).abs() < 1e-9);
    assert!((dvh.total_volume_cc() - 8.0).abs() < 1e-9);
}

#[test]
fn cumulative_bounds_hold() {
    let dvh = four_doses();
    assert_eq!(dvh.cumulative_at(0.0), 1.0);
    assert_eq!(dvh.cumulative_at(4.0 + 1e-9), 0.0);
    assert_eq!(dvh.cumulative_at(1e6), 0.0);
    let total: f64 = dvh.differential().map(|(_, v)| v).sum();
    assert!((total - 1.0).abs() < 1e-9);
}

#[test]
fn cumulative_points_are_non_increasing() {
    let doses: Vec<f64> = (0..500).map(|i| (i as f64 * 0.37) % 61.0).collect();
    let dvh = Dvh::from_doses("s", doses, 0.25, 0.001).unwrap();
    let points = dvh.points();
    assert_eq!(points[0].1, 1.0);
    for w in points.windows(2) {
        assert!(w[1].0 > w[0].0);
        assert!(w[1].1 <= w[0].1);
    }
    assert_eq!(points.last().unwrap().1, 0.0);
}

#[test]
fn dx_extremes_hit_min_and_max() {
    let dvh = four_doses();
    assert_eq!(dx(&dvh, 100.0).unwrap(), 1.0);
    assert!((dx(&dvh, 1e-7).unwrap() - 4.0).abs() < 1e-6);
    assert!((dx(&dvh, 50.0).unwrap() - 2.5).abs() < 1e-12);
}

#[test]
fn vx_on_a_bin_edge_counts_the_edge() {
    let dvh = four_doses();
    assert!((vx(&dvh, 2.0).unwrap() - 0.75).abs() < 1e-12);
    assert_eq!(vx(&dvh, 0.0).unwrap(), 1.0);
}

#[test]
fn eud_one_is_mean_dose() {
    let dvh = four_doses();
    assert!((eud(&dvh, 1.0).unwrap() - 2.5).abs() < 1e-12);
    assert!((eud(&dvh, 1.0).unwrap() - dvh.mean_dose()).abs() < 1e-12);
}

#[test]
fn synthetic_differential_dvh() {
    let dvh = Dvh::from_differential("oar", &[(10.0, 1.0), (20.0, 1.0)], 1.0, 50.0).unwrap();
    assert!((vx(&dvh, 15.0).unwrap() - 0.5).abs() < 1e-12);
    assert!((vx_cc(&dvh, 15.0).unwrap() - 25.0).abs() < 1e-9);
    assert!((dvh.mean_dose() - 15.0).abs() < 1e-12);
}

#[test]
fn invalid_dvh_inputs_are_rejected() {
    assert!(matches!(
        Dvh::from_doses("e", Vec::new(), 0.1, 0.001),
        Err(EngineError::EmptyStructure(_))
    ));
    assert!(matches!(
        Dvh::from_doses("n", vec![-1.0], 0.1, 0.001),
        Err(EngineError::InvalidInput(_))
    ));
    assert!(matches!(
        Dvh::from_doses("w", vec![1.0], 0.0, 0.001),
        Err(EngineError::InvalidParameter { name: "bin_width", .. })
    ));
}

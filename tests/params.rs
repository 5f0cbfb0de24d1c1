use std::fs;

use kira_doseresp::params::{
    OrganParameters, TumorParameters, builtin, load_tables, merge_tables, parse_params_tsv,
    resolve_organ, resolve_tumor,
};
use tempfile::TempDir;

#[test]
fn builtin_tables_load_once() {
    let a = builtin().unwrap();
    let b = builtin().unwrap();
    assert!(std::ptr::eq(a, b));
    assert_eq!(a.version, "v1");
    assert!(a.tumor("prostate").is_some());
    assert!(a.organ("Spinal_Cord").is_some());
    let lung = a.organ("lung").unwrap();
    assert_eq!(lung.params.td50, Some(24.5));
    assert_eq!(lung.endpoint.as_deref(), Some("pneumonitis"));
}

#[test]
fn overrides_do_not_touch_the_shared_table() {
    let tables = builtin().unwrap();
    let overrides = TumorParameters {
        td50: Some(80.0),
        ..TumorParameters::default()
    };
    let resolved = resolve_tumor(tables, "prostate", &overrides);
    assert!(resolved.known);
    assert_eq!(resolved.params.td50, Some(80.0));
    assert_eq!(resolved.params.gamma50, Some(2.0));
    assert_eq!(builtin().unwrap().tumor("prostate").unwrap().params.td50, Some(70.0));
}

#[test]
fn unknown_tissue_uses_only_explicit_values() {
    let overrides = OrganParameters {
        td50: Some(30.0),
        m: Some(0.2),
        n: Some(0.5),
        ..OrganParameters::default()
    };
    let resolved = resolve_organ(builtin().unwrap(), "pancreas", &overrides);
    assert!(!resolved.known);
    assert_eq!(resolved.params, overrides);
}

#[test]
fn user_tsv_overlays_builtin() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("params.tsv");
    let content = "# kind\tid\tparameter\tvalue\n\
                   organ\tlung\ttd50\t30.5\n\
                   organ\tesophagus\ttd50\t68\n\
                   organ\tesophagus\tm\t0.11\n\
                   organ\tesophagus\tn\t0.06\n\
                   tumor\tprostate\tclonogen_density\t1e7\n";
    fs::write(&path, content).unwrap();

    let tables = load_tables(Some(&path)).unwrap();
    let lung = tables.organ("lung").unwrap();
    assert_eq!(lung.params.td50, Some(30.5));
    assert_eq!(lung.params.m, Some(0.18));
    assert_eq!(tables.organ("esophagus").unwrap().params.n, Some(0.06));
    assert_eq!(
        tables.tumor("prostate").unwrap().params.clonogen_density,
        Some(1e7)
    );
    assert_eq!(builtin().unwrap().organ("lung").unwrap().params.td50, Some(24.5));
}

#[test]
fn merge_appends_new_ids_in_order() {
    let user = parse_params_tsv("tumor\tglioma\ttd50\t65\ntumor\tmelanoma\ttd50\t90\n", "t").unwrap();
    let merged = merge_tables(builtin().unwrap().clone(), user);
    let n = merged.tumors.len();
    assert_eq!(merged.tumors[n - 2].id, "glioma");
    assert_eq!(merged.tumors[n - 1].id, "melanoma");
}

#[test]
fn malformed_rows_report_their_line() {
    let err = parse_params_tsv("organ\tlung\ttd50\n", "bad.tsv").unwrap_err();
    assert!(err.to_string().contains("bad.tsv:1"));

    let err = parse_params_tsv("organ\tlung\tfoo\t1\n", "bad.tsv").unwrap_err();
    assert!(err.to_string().contains("unknown organ parameter 'foo'"));

    let err = parse_params_tsv("\norgan\tlung\ttd50\tabc\n", "bad.tsv").unwrap_err();
    assert!(err.to_string().contains("bad.tsv:2"));

    let err = parse_params_tsv("beam\tx\ty\t1\n", "bad.tsv").unwrap_err();
    assert!(err.to_string().contains("kind must be"));
}

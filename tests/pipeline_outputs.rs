use std::fs;
use std::path::{Path, PathBuf};

use kira_doseresp::ctx::{Assignment, Ctx, ParamOverride};
use kira_doseresp::io::summary::format_summary;
use kira_doseresp::models::{NtcpModel, TcpModel};
use kira_doseresp::pipeline::Pipeline;
use serde_json::{Value, json};
use tempfile::TempDir;

fn square(z: f64, lo: f64, hi: f64) -> Value {
    json!({ "z": z, "points": [[lo, lo], [hi, lo], [hi, hi], [lo, hi]] })
}

fn write_case(dir: &Path) -> PathBuf {
    let (nx, ny, nz) = (20usize, 20usize, 6usize);
    let mut values = Vec::with_capacity(nx * ny * nz);
    for _z in 0..nz {
        for y in 0..ny {
            for x in 0..nx {
                let hot = (6..14).contains(&x) && (6..14).contains(&y);
                values.push(if hot { 70.0f32 } else { 15.0 });
            }
        }
    }
    let doc = json!({
        "patient_id": "phantom",
        "dose": {
            "modality": "RTDOSE",
            "dims": [nx, ny, nz],
            "spacing": [2.0, 2.0, 3.0],
            "origin": [0.0, 0.0, 0.0],
            "values": values
        },
        "structure_set": {
            "modality": "RTSTRUCT",
            "rois": [
                { "number": 1, "name": "PTV",
                  "contours": [square(3.0, 11.0, 27.0), square(6.0, 11.0, 27.0), square(9.0, 11.0, 27.0)] },
                { "number": 2, "name": "Cord",
                  "contours": [square(3.0, 0.5, 5.5), square(6.0, 0.5, 5.5), square(9.0, 0.5, 5.5)] },
                { "number": 3, "name": "Lt_Parotid",
                  "contours": [square(6.0, 30.5, 37.5)] },
                { "number": 4, "name": "Ghost",
                  "contours": [square(6.0, 200.0, 210.0)] }
            ]
        }
    });
    let path = dir.join("case.json");
    fs::write(&path, serde_json::to_vec_pretty(&doc).unwrap()).unwrap();
    path
}

fn assign(structure: &str, tissue: &str) -> Assignment {
    Assignment {
        structure: structure.to_string(),
        tissue: tissue.to_string(),
    }
}

fn run(case: PathBuf, out: &Path, setup: impl FnOnce(&mut Ctx)) -> Ctx {
    let mut ctx = Ctx::new(case, out.to_path_buf(), true, true);
    ctx.targets = vec![assign("PTV", "prostate")];
    ctx.organs = vec![assign("Cord", "spinal_cord"), assign("Lt_Parotid", "parotid")];
    ctx.bin_width = 0.5;
    setup(&mut ctx);
    Pipeline::full().run(&mut ctx).unwrap();
    ctx
}

#[test]
fn full_run_writes_report_and_dvh_tsv() {
    let tmp = TempDir::new().unwrap();
    let case = write_case(tmp.path());
    let out = tmp.path().join("out");
    let ctx = run(case, &out, |ctx| {
        ctx.tcp_models = vec![TcpModel::Poisson, TcpModel::LinearQuadratic];
        ctx.prescription = Some(70.0);
        ctx.fractions = 35;
    });

    assert_eq!(ctx.dvhs.len(), 3);
    assert_eq!(ctx.metrics.len(), 3);
    assert_eq!(ctx.tcp_results.len(), 2);
    assert_eq!(ctx.ntcp_results.len(), 2);
    assert!(ctx.outcome.is_some());

    let v: Value = serde_json::from_slice(&fs::read(out.join("doseresp.json")).unwrap()).unwrap();
    assert_eq!(v["tool"], "kira-doseresp");
    assert_eq!(v["schema_version"], "v1");
    assert_eq!(v["case"]["patient_id"], "phantom");
    assert_eq!(v["settings"]["tcp_models"], json!(["poisson", "lq"]));
    assert_eq!(v["structures"].as_array().unwrap().len(), 3);
    assert_eq!(v["structures"][0]["role"], "target");
    assert_eq!(v["structures"][0]["tissue"], "prostate");
    assert!(v["structures"][0]["metrics"]["coverage"]["fraction"].is_number());
    let p = v["tcp"][0]["probability"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&p));
    assert_eq!(v["ntcp"][0]["model"], "lkb");
    assert_eq!(v["dvh_tsv_path"], "dvh.tsv");

    let tsv = fs::read_to_string(out.join("dvh.tsv")).unwrap();
    let mut lines = tsv.lines();
    assert_eq!(
        lines.next().unwrap(),
        "structure\tdose_gy\tvolume_fraction\tvolume_cc"
    );
    let first: Vec<&str> = lines.next().unwrap().split('\t').collect();
    assert_eq!(first[0], "PTV");
    assert_eq!(first[2], "1.000000");
}

#[test]
fn empty_structure_is_isolated() {
    let tmp = TempDir::new().unwrap();
    let case = write_case(tmp.path());
    let ctx = run(case, &tmp.path().join("out"), |_| {});

    assert_eq!(ctx.failures.len(), 1);
    assert_eq!(ctx.failures[0].structure, "Ghost");
    assert_eq!(ctx.failures[0].stage, "stage3_dvh");
    assert_eq!(ctx.tcp_results.len(), 1);
    let summary = format_summary(&ctx).unwrap();
    assert!(summary.contains("Failures: Ghost"));
    assert!(summary.contains("TCP[poisson] PTV (prostate)"));
}

#[test]
fn missing_model_parameter_is_recorded_not_fatal() {
    let tmp = TempDir::new().unwrap();
    let case = write_case(tmp.path());
    let ctx = run(case, &tmp.path().join("out"), |ctx| {
        ctx.tcp_models = vec![TcpModel::WebbNahum, TcpModel::Poisson];
    });
    assert!(
        ctx.failures
            .iter()
            .any(|f| f.structure == "PTV" && f.stage == "stage5_tcp")
    );
    assert_eq!(ctx.tcp_results.len(), 1);
    assert!(ctx.outcome.is_none());
}

#[test]
fn overrides_feed_the_model() {
    let tmp = TempDir::new().unwrap();
    let case = write_case(tmp.path());
    let ctx = run(case, &tmp.path().join("out"), |ctx| {
        ctx.tcp_models = vec![TcpModel::WebbNahum];
        ctx.ntcp_models = vec![NtcpModel::RelativeSeriality, NtcpModel::Lkb];
        ctx.overrides = vec![ParamOverride {
            structure: "PTV".to_string(),
            key: "clonogen_density".to_string(),
            value: 1e7,
        }];
    });
    assert_eq!(ctx.tcp_results.len(), 1);
    assert_eq!(ctx.tcp_results[0].parameters["clonogen_density"], 1e7);
    assert_eq!(ctx.ntcp_results.len(), 4);
    let outcome = ctx.outcome.unwrap();
    assert!(outcome.ucp <= outcome.tcp);
}

#[test]
fn bad_alpha_beta_keeps_the_rest_of_the_metrics() {
    let tmp = TempDir::new().unwrap();
    let case = write_case(tmp.path());
    let ctx = run(case, &tmp.path().join("out"), |ctx| {
        ctx.prescription = Some(70.0);
        ctx.overrides = vec![ParamOverride {
            structure: "PTV".to_string(),
            key: "alpha".to_string(),
            value: 0.0,
        }];
    });

    let ptv = ctx.metrics.iter().find(|m| m.structure == "PTV").unwrap();
    assert!(ptv.bed.is_none());
    assert!(ptv.eud.is_some());
    assert!(ptv.coverage.is_some());
    assert_eq!(ptv.dx.len(), 4);
    assert_eq!(ptv.vx.len(), 6);
    assert_eq!(ctx.metrics.len(), 3);

    let failure = ctx
        .failures
        .iter()
        .find(|f| f.structure == "PTV" && f.stage == "stage4_metrics")
        .unwrap();
    assert!(failure.error.starts_with("bed: "));
    assert_eq!(ctx.tcp_results.len(), 1);
}

#[test]
fn out_of_range_dx_is_rejected_before_any_work() {
    let tmp = TempDir::new().unwrap();
    let case = write_case(tmp.path());
    let mut ctx = Ctx::new(case, tmp.path().join("out"), false, false);
    ctx.dx_percents = vec![95.0, 150.0];
    let err = Pipeline::full().run(&mut ctx).unwrap_err();
    assert!(err.to_string().contains("--dx"));
    assert!(ctx.session.is_none());
}

use std::path::Path;

use anyhow::{Context, Result};

use crate::ctx::Ctx;
use crate::schema::v1::{DoseRespV1, Settings, StructureReport};

pub fn build_report(ctx: &Ctx) -> Result<DoseRespV1> {
    let structures = ctx
        .metrics
        .iter()
        .map(|m| {
            let role = ctx.role_of(&m.structure);
            StructureReport {
                name: m.structure.clone(),
                role: role.map(|r| r.0),
                tissue: role.map(|r| r.1.to_string()),
                metrics: m.clone(),
            }
        })
        .collect();

    let params_version = ctx
        .tables
        .as_ref()
        .map(|t| t.version.clone())
        .unwrap_or_default();

    let dvh_tsv_path = if ctx.write_tsv {
        ctx.output
            .tsv_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
    } else {
        None
    };

    Ok(DoseRespV1 {
        tool: "kira-doseresp".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        schema_version: "v1".to_string(),
        case: ctx.case_meta.clone(),
        settings: Settings {
            bin_width: ctx.bin_width,
            fill_rule: ctx.fill_rule.name().to_string(),
            fractions: ctx.fractions,
            prescription: ctx.prescription,
            tcp_models: ctx.tcp_models.iter().map(|m| m.to_string()).collect(),
            ntcp_models: ctx.ntcp_models.iter().map(|m| m.to_string()).collect(),
            params_version,
        },
        structures,
        tcp: ctx.tcp_results.clone(),
        ntcp: ctx.ntcp_results.clone(),
        outcome: ctx.outcome,
        dvh_tsv_path,
        failures: ctx.failures.clone(),
        warnings: ctx.warnings.clone(),
    })
}

pub fn write_json(path: &Path, report: &DoseRespV1) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let writer = std::io::BufWriter::new(file);
    serde_json::to_writer_pretty(writer, report)?;
    Ok(())
}

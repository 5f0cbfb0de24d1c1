use anyhow::Result;

use crate::ctx::Ctx;

pub fn format_summary(ctx: &Ctx) -> Result<String> {
    let version = env!("CARGO_PKG_VERSION");
    let mut out = String::new();
    out.push_str(&format!("kira-doseresp v{}\n", version));
    if let Some(meta) = &ctx.case_meta {
        out.push_str(&format!(
            "Case: grid {}x{}x{}, {} structures, max dose {:.2} Gy\n",
            meta.dims[0], meta.dims[1], meta.dims[2], meta.structures, meta.max_dose
        ));
    }

    for m in &ctx.metrics {
        out.push_str(&format!(
            "{}: {:.2} cc, mean {:.2} Gy, D95 {}, max {:.2} Gy\n",
            m.structure,
            m.volume_cc,
            m.mean_dose,
            m.dx
                .iter()
                .find(|d| d.percent == 95.0)
                .map(|d| format!("{:.2} Gy", d.dose))
                .unwrap_or_else(|| "-".to_string()),
            m.max_dose
        ));
    }

    for r in &ctx.tcp_results {
        out.push_str(&format!(
            "TCP[{}] {} ({}): {:.4}\n",
            r.model, r.structure, r.tissue, r.probability
        ));
    }
    for r in &ctx.ntcp_results {
        out.push_str(&format!(
            "NTCP[{}] {} ({}): {:.4}\n",
            r.model, r.structure, r.tissue, r.probability
        ));
    }

    if let Some(o) = &ctx.outcome {
        out.push_str(&format!(
            "Outcome: TCP {:.4}, CFP {:.4}, UCP {:.4}\n",
            o.tcp, o.cfp, o.ucp
        ));
    }

    if ctx.failures.is_empty() {
        out.push_str("Failures: none\n");
    } else {
        let names: Vec<&str> = ctx.failures.iter().map(|f| f.structure.as_str()).collect();
        out.push_str(&format!("Failures: {}\n", names.join(", ")));
    }
    Ok(out)
}

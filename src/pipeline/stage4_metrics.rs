use anyhow::Result;
use tracing::info;

use crate::ctx::Ctx;
use crate::metrics::{MetricRequest, compute_metrics};
use crate::pipeline::Stage;

pub struct Stage4Metrics;

impl Stage4Metrics {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage4Metrics {
    fn name(&self) -> &'static str {
        "stage4_metrics"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let mut metrics = Vec::with_capacity(ctx.dvhs.len());
        let mut failed = Vec::new();
        for dvh in &ctx.dvhs {
            let request = request_for(ctx, dvh.structure());
            match compute_metrics(dvh, &request) {
                Ok(m) => {
                    for f in &m.failed {
                        failed.push((m.structure.clone(), format!("{}: {}", f.metric, f.error)));
                    }
                    metrics.push(m);
                }
                Err(err) => failed.push((dvh.structure().to_string(), err.to_string())),
            }
        }
        let failed_count = failed.len();
        for (structure, err) in failed {
            ctx.record_failure(&structure, self.name(), err);
        }

        info!(structures = metrics.len(), failed = failed_count, "metrics_ready");
        ctx.metrics = metrics;
        Ok(())
    }
}

/// Targets use their tumor α/β and EUD exponent, organs `a = 1/n` and the
/// run's organ α/β. Unassigned structures get dose statistics only.
fn request_for(ctx: &Ctx, structure: &str) -> MetricRequest {
    let mut request = MetricRequest {
        dx_percents: ctx.dx_percents.clone(),
        vx_doses: ctx.vx_doses.clone(),
        fractions: ctx.fractions,
        ..MetricRequest::default()
    };
    if let Some(plan) = ctx.target_plans.iter().find(|p| p.structure == structure) {
        let p = &plan.resolved.params;
        request.eud_a = p.eud_a.filter(|a| *a != 0.0);
        request.alpha_beta = match (p.alpha, p.beta) {
            (Some(alpha), Some(beta)) if beta > 0.0 => Some(alpha / beta),
            _ => None,
        };
        request.prescription = ctx.prescription;
    } else if let Some(plan) = ctx.organ_plans.iter().find(|p| p.structure == structure) {
        request.eud_a = plan.resolved.params.n.filter(|n| *n > 0.0).map(|n| 1.0 / n);
        request.alpha_beta = Some(ctx.oar_alpha_beta);
    }
    request
}

use anyhow::Result;
use tracing::info;

use crate::ctx::Ctx;
use crate::models::summarize_outcome;
use crate::pipeline::Stage;

pub struct Stage7Outcome;

impl Stage7Outcome {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage7Outcome {
    fn name(&self) -> &'static str {
        "stage7_outcome"
    }

    /// Combines the primary (first-listed) TCP and NTCP model over all
    /// targets and organs, treating them as independent.
    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let (Some(tcp_model), Some(ntcp_model)) =
            (ctx.tcp_models.first(), ctx.ntcp_models.first())
        else {
            return Ok(());
        };
        let tcps: Vec<f64> = ctx
            .tcp_results
            .iter()
            .filter(|r| r.model == tcp_model.name())
            .map(|r| r.probability)
            .collect();
        if tcps.is_empty() {
            return Ok(());
        }
        if tcps.len() < ctx.target_plans.len() {
            ctx.warnings.push(format!(
                "outcome uses {} of {} targets",
                tcps.len(),
                ctx.target_plans.len()
            ));
        }
        let ntcps: Vec<f64> = ctx
            .ntcp_results
            .iter()
            .filter(|r| r.model == ntcp_model.name())
            .map(|r| r.probability)
            .collect();

        let tcp: f64 = tcps.iter().product();
        let summary = summarize_outcome(tcp, &ntcps);
        info!(
            tcp = summary.tcp,
            cfp = summary.cfp,
            ucp = summary.ucp,
            "outcome_ready"
        );
        ctx.outcome = Some(summary);
        Ok(())
    }
}

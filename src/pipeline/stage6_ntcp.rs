use anyhow::Result;
use tracing::info;

use crate::ctx::Ctx;
use crate::pipeline::Stage;

pub struct Stage6Ntcp;

impl Stage6Ntcp {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage6Ntcp {
    fn name(&self) -> &'static str {
        "stage6_ntcp"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let mut results = Vec::new();
        let mut failed = Vec::new();
        for plan in &ctx.organ_plans {
            let Some(dvh) = ctx.dvh(&plan.structure) else {
                continue;
            };
            for model in &ctx.ntcp_models {
                match model.evaluate(dvh, &plan.resolved.params, &plan.resolved.tissue) {
                    Ok(r) => results.push(r),
                    Err(err) => failed.push((plan.structure.clone(), format!("{}: {}", model, err))),
                }
            }
        }
        for (structure, err) in failed {
            ctx.record_failure(&structure, self.name(), err);
        }
        for r in results.iter().filter(|r| r.warning.is_some()) {
            ctx.warnings.push(format!(
                "{} ntcp[{}] clamped into [0, 1]",
                r.structure, r.model
            ));
        }

        info!(results = results.len(), "ntcp_ready");
        ctx.ntcp_results = results;
        Ok(())
    }
}

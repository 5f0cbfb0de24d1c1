use anyhow::Result;
use tracing::info;

use crate::ctx::Ctx;
use crate::pipeline::Stage;

pub struct Stage5Tcp;

impl Stage5Tcp {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage5Tcp {
    fn name(&self) -> &'static str {
        "stage5_tcp"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let mut results = Vec::new();
        let mut failed = Vec::new();
        for plan in &ctx.target_plans {
            let Some(dvh) = ctx.dvh(&plan.structure) else {
                continue;
            };
            for model in &ctx.tcp_models {
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
                "{} tcp[{}] clamped into [0, 1]",
                r.structure, r.model
            ));
        }

        info!(results = results.len(), "tcp_ready");
        ctx.tcp_results = results;
        Ok(())
    }
}

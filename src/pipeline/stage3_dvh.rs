use anyhow::{Context, Result};
use tracing::info;

use crate::ctx::Ctx;
use crate::pipeline::Stage;

pub struct Stage3Dvh;

impl Stage3Dvh {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage3Dvh {
    fn name(&self) -> &'static str {
        "stage3_dvh"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let session = ctx.session.as_ref().context("session not initialised")?;
        let outcomes = session.build_all(ctx.threads, &ctx.cancel)?;

        let mut dvhs = Vec::with_capacity(outcomes.len());
        let mut failed = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(dvh) => dvhs.push(dvh),
                Err(err) => failed.push(err),
            }
        }
        for err in failed {
            ctx.record_failure(&err.structure, self.name(), &err.source);
        }

        info!(built = dvhs.len(), failed = ctx.failures.len(), "dvh_ready");
        ctx.dvhs = dvhs;
        Ok(())
    }
}

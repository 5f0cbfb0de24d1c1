use anyhow::Result;
use std::time::Instant;
use tracing::{info, warn};

use crate::ctx::Ctx;

pub mod stage0_scaffold;
pub mod stage1_input;
pub mod stage2_params;
pub mod stage3_dvh;
pub mod stage4_metrics;
pub mod stage5_tcp;
pub mod stage6_ntcp;
pub mod stage7_outcome;
pub mod stage8_output;

pub trait Stage {
    fn name(&self) -> &'static str;
    fn run(&self, ctx: &mut Ctx) -> Result<()>;
}

pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        Self { stages }
    }

    pub fn full() -> Self {
        Self::new(vec![
            Box::new(stage0_scaffold::Stage0Scaffold::new()),
            Box::new(stage1_input::Stage1Input::new()),
            Box::new(stage2_params::Stage2Params::new()),
            Box::new(stage3_dvh::Stage3Dvh::new()),
            Box::new(stage4_metrics::Stage4Metrics::new()),
            Box::new(stage5_tcp::Stage5Tcp::new()),
            Box::new(stage6_ntcp::Stage6Ntcp::new()),
            Box::new(stage7_outcome::Stage7Outcome::new()),
            Box::new(stage8_output::Stage8Output::new()),
        ])
    }

    pub fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let started = Instant::now();
        for stage in &self.stages {
            let start = Instant::now();
            let failures_before = ctx.failures.len();
            info!(stage = stage.name(), "stage started");
            if let Err(err) = stage.run(ctx) {
                let elapsed_ms = start.elapsed().as_millis();
                warn!(
                    stage = stage.name(),
                    elapsed_ms = elapsed_ms as u64,
                    error = %err,
                    "stage failed"
                );
                return Err(err);
            }
            let elapsed_ms = start.elapsed().as_millis();
            info!(
                stage = stage.name(),
                elapsed_ms = elapsed_ms as u64,
                structures = ctx.dvhs.len(),
                failed = ctx.failures.len() - failures_before,
                "stage finished"
            );
        }
        info!(
            stages = self.stages.len(),
            failed = ctx.failures.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "pipeline finished"
        );
        Ok(())
    }
}

use anyhow::Result;
use tracing::info;

use crate::ctx::Ctx;
use crate::io::{json_writer, tsv_writer};
use crate::pipeline::Stage;

pub struct Stage8Output;

impl Stage8Output {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage8Output {
    fn name(&self) -> &'static str {
        "stage8_output"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        if ctx.write_tsv {
            tsv_writer::write_tsv(&ctx.output.tsv_path, &ctx.dvhs)?;
        }
        let report = json_writer::build_report(ctx)?;
        if ctx.write_json {
            json_writer::write_json(&ctx.output.json_path, &report)?;
        }
        ctx.report = Some(report);

        info!("stage8_output_ready");
        Ok(())
    }
}

use anyhow::{Result, bail};
use std::fs;
use tracing::info;

use crate::ctx::Ctx;
use crate::pipeline::Stage;

pub struct Stage0Scaffold;

impl Stage0Scaffold {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage0Scaffold {
    fn name(&self) -> &'static str {
        "stage0_scaffold"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        if !(ctx.bin_width.is_finite() && ctx.bin_width > 0.0) {
            bail!("--bin-width must be positive, got {}", ctx.bin_width);
        }
        if ctx.fractions == 0 {
            bail!("--fractions must be at least 1");
        }
        if let Some(p) = ctx.prescription {
            if !(p.is_finite() && p > 0.0) {
                bail!("--prescription must be positive, got {}", p);
            }
        }
        if let Some(x) = ctx.dx_percents.iter().find(|x| !(x.is_finite() && **x > 0.0 && **x <= 100.0)) {
            bail!("--dx percents must be in (0, 100], got {}", x);
        }
        if let Some(d) = ctx.vx_doses.iter().find(|d| !(d.is_finite() && **d >= 0.0)) {
            bail!("--vx doses must be non-negative, got {}", d);
        }
        for a in &ctx.targets {
            if ctx.organs.iter().any(|o| o.structure == a.structure) {
                bail!(
                    "structure '{}' is assigned as both target and organ",
                    a.structure
                );
            }
        }

        if ctx.write_json || ctx.write_tsv {
            fs::create_dir_all(&ctx.output.out_dir)?;
            info!(
                out_dir = %ctx.output.out_dir.display(),
                "output_dir_ready"
            );
        }
        Ok(())
    }
}

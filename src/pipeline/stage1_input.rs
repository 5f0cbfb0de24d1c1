use anyhow::{Result, bail};
use tracing::info;

use crate::ctx::Ctx;
use crate::io::case::read_case;
use crate::pipeline::Stage;

pub struct Stage1Input;

impl Stage1Input {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage1Input {
    fn name(&self) -> &'static str {
        "stage1_input"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let case = read_case(&ctx.case_path)?;

        let known: Vec<&str> = case.structures.iter().map(|s| s.name.as_str()).collect();
        for a in ctx.targets.iter().chain(ctx.organs.iter()) {
            if !known.contains(&a.structure.as_str()) {
                bail!(
                    "structure '{}' not found in case (available: {})",
                    a.structure,
                    known.join(", ")
                );
            }
        }
        for s in &case.structures {
            if s.contours.is_empty() {
                ctx.warnings
                    .push(format!("structure '{}' has no contours", s.name));
            }
        }

        ctx.set_case(case)?;
        info!(
            structures = ctx.case_meta.as_ref().map(|m| m.structures).unwrap_or(0),
            "input_loaded"
        );
        Ok(())
    }
}

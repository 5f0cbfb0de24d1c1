use anyhow::{Result, bail};
use tracing::info;

use crate::ctx::{Ctx, OrganPlan, ParamOverride, TargetPlan};
use crate::params::{OrganParameters, TumorParameters, load_tables, resolve_organ, resolve_tumor};
use crate::pipeline::Stage;

pub struct Stage2Params;

impl Stage2Params {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage2Params {
    fn name(&self) -> &'static str {
        "stage2_params"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let tables = load_tables(ctx.params_path.as_deref())?;

        for o in &ctx.overrides {
            let assigned = ctx
                .targets
                .iter()
                .chain(ctx.organs.iter())
                .any(|a| a.structure == o.structure);
            if !assigned {
                bail!(
                    "override '{}.{}' names a structure that is neither a target nor an organ",
                    o.structure,
                    o.key
                );
            }
        }

        let mut target_plans = Vec::with_capacity(ctx.targets.len());
        for a in &ctx.targets {
            let mut overrides = TumorParameters::default();
            for o in overrides_for(&ctx.overrides, &a.structure) {
                if !overrides.set(&o.key, o.value) {
                    bail!(
                        "unknown tumor parameter '{}' (expected one of {})",
                        o.key,
                        TumorParameters::KEYS.join(", ")
                    );
                }
            }
            let resolved = resolve_tumor(&tables, &a.tissue, &overrides);
            if !resolved.known {
                ctx.warnings.push(format!(
                    "tumor type '{}' for '{}' has no built-in parameters",
                    a.tissue, a.structure
                ));
            }
            target_plans.push(TargetPlan {
                structure: a.structure.clone(),
                resolved,
            });
        }

        let mut organ_plans = Vec::with_capacity(ctx.organs.len());
        for a in &ctx.organs {
            let mut overrides = OrganParameters::default();
            for o in overrides_for(&ctx.overrides, &a.structure) {
                if !overrides.set(&o.key, o.value) {
                    bail!(
                        "unknown organ parameter '{}' (expected one of {})",
                        o.key,
                        OrganParameters::KEYS.join(", ")
                    );
                }
            }
            let resolved = resolve_organ(&tables, &a.tissue, &overrides);
            if !resolved.known {
                ctx.warnings.push(format!(
                    "organ type '{}' for '{}' has no built-in parameters",
                    a.tissue, a.structure
                ));
            }
            organ_plans.push(OrganPlan {
                structure: a.structure.clone(),
                resolved,
            });
        }

        info!(
            version = %tables.version,
            targets = target_plans.len(),
            organs = organ_plans.len(),
            "params_resolved"
        );
        ctx.target_plans = target_plans;
        ctx.organ_plans = organ_plans;
        ctx.tables = Some(tables);
        Ok(())
    }
}

fn overrides_for<'a>(
    all: &'a [ParamOverride],
    structure: &'a str,
) -> impl Iterator<Item = &'a ParamOverride> + 'a {
    all.iter().filter(move |o| o.structure == structure)
}

//! Radiobiological parameter tables.
//!
//! Built-in defaults are parsed once into a process-wide table and never
//! mutated. User overlays and per-call overrides produce new records.

mod loader;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

use anyhow::Result;
use serde::Serialize;
use tracing::warn;

pub use loader::{load_builtin_v1, load_params_tsv, merge_tables, parse_params_tsv};

macro_rules! param_record {
    ($(#[$meta:meta])* $name:ident { $($field:ident),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Serialize)]
        pub struct $name {
            $(pub $field: Option<f64>,)+
        }

        impl $name {
            pub const KEYS: &'static [&'static str] = &[$(stringify!($field)),+];

            /// Fields set in `top` win over `self`.
            pub fn overlay(&self, top: &Self) -> Self {
                Self {
                    $($field: top.$field.or(self.$field),)+
                }
            }

            /// Sets one parameter by name; returns false for unknown names.
            pub fn set(&mut self, key: &str, value: f64) -> bool {
                match key {
                    $(stringify!($field) => {
                        self.$field = Some(value);
                        true
                    })+
                    _ => false,
                }
            }

            pub fn snapshot(&self) -> BTreeMap<String, f64> {
                let mut out = BTreeMap::new();
                $(if let Some(v) = self.$field {
                    out.insert(stringify!($field).to_string(), v);
                })+
                out
            }
        }
    };
}

param_record!(
    TumorParameters {
        td50,
        gamma50,
        alpha,
        beta,
        eud_a,
        clonogen_density,
    }
);

param_record!(
    OrganParameters {
        td50,
        m,
        n,
        d50,
        gamma,
        seriality,
        critical_fraction,
        cv_sigma,
    }
);

#[derive(Debug, Clone, Serialize)]
pub struct TumorDef {
    pub id: String,
    pub description: Option<String>,
    pub params: TumorParameters,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrganDef {
    pub id: String,
    pub endpoint: Option<String>,
    pub description: Option<String>,
    pub params: OrganParameters,
}

#[derive(Debug, Clone, Default)]
pub struct ParameterTables {
    pub version: String,
    pub tumors: Vec<TumorDef>,
    pub organs: Vec<OrganDef>,
}

impl ParameterTables {
    pub fn tumor(&self, id: &str) -> Option<&TumorDef> {
        self.tumors.iter().find(|d| d.id.eq_ignore_ascii_case(id))
    }

    pub fn organ(&self, id: &str) -> Option<&OrganDef> {
        self.organs.iter().find(|d| d.id.eq_ignore_ascii_case(id))
    }
}

static BUILTIN: OnceLock<ParameterTables> = OnceLock::new();

pub fn builtin() -> Result<&'static ParameterTables> {
    if let Some(tables) = BUILTIN.get() {
        return Ok(tables);
    }
    let parsed = load_builtin_v1()?;
    Ok(BUILTIN.get_or_init(|| parsed))
}

pub fn load_tables(user: Option<&Path>) -> Result<ParameterTables> {
    let base = builtin()?.clone();
    match user {
        Some(path) => Ok(merge_tables(base, load_params_tsv(path)?)),
        None => Ok(base),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolvedTumor {
    pub tissue: String,
    /// False when the tissue is not in the table and only the caller's
    /// explicit parameters are in effect.
    pub known: bool,
    pub params: TumorParameters,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolvedOrgan {
    pub tissue: String,
    pub known: bool,
    pub endpoint: Option<String>,
    pub params: OrganParameters,
}

pub fn resolve_tumor(
    tables: &ParameterTables,
    tissue: &str,
    overrides: &TumorParameters,
) -> ResolvedTumor {
    match tables.tumor(tissue) {
        Some(def) => ResolvedTumor {
            tissue: def.id.clone(),
            known: true,
            params: def.params.overlay(overrides),
        },
        None => {
            warn!(tissue, "unknown tumor type; using explicit parameters only");
            ResolvedTumor {
                tissue: tissue.to_string(),
                known: false,
                params: overrides.clone(),
            }
        }
    }
}

pub fn resolve_organ(
    tables: &ParameterTables,
    tissue: &str,
    overrides: &OrganParameters,
) -> ResolvedOrgan {
    match tables.organ(tissue) {
        Some(def) => ResolvedOrgan {
            tissue: def.id.clone(),
            known: true,
            endpoint: def.endpoint.clone(),
            params: def.params.overlay(overrides),
        },
        None => {
            warn!(tissue, "unknown organ type; using explicit parameters only");
            ResolvedOrgan {
                tissue: tissue.to_string(),
                known: false,
                endpoint: None,
                params: overrides.clone(),
            }
        }
    }
}

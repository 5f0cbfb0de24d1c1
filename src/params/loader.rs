use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::params::{OrganDef, OrganParameters, ParameterTables, TumorDef, TumorParameters};

pub fn load_builtin_v1() -> Result<ParameterTables> {
    let content = include_str!("../../assets/params/builtin_v1.tsv");
    let mut tables = parse_params_tsv(content, "built-in v1")?;
    tables.version = "v1".to_string();
    Ok(tables)
}

pub fn load_params_tsv(path: &Path) -> Result<ParameterTables> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read parameter TSV {}", path.display()))?;
    parse_params_tsv(&content, &path.display().to_string())
}

/// Overlays `user` on `builtin` field by field. Ids new to the built-in
/// table are appended in the user's order.
pub fn merge_tables(mut builtin: ParameterTables, user: ParameterTables) -> ParameterTables {
    for def in user.tumors {
        match builtin.tumors.iter_mut().find(|d| d.id == def.id) {
            Some(base) => {
                base.params = base.params.overlay(&def.params);
                if def.description.is_some() {
                    base.description = def.description;
                }
            }
            None => builtin.tumors.push(def),
        }
    }
    for def in user.organs {
        match builtin.organs.iter_mut().find(|d| d.id == def.id) {
            Some(base) => {
                base.params = base.params.overlay(&def.params);
                if def.endpoint.is_some() {
                    base.endpoint = def.endpoint;
                }
                if def.description.is_some() {
                    base.description = def.description;
                }
            }
            None => builtin.organs.push(def),
        }
    }
    builtin
}

/// Parses long-format rows `kind<TAB>id<TAB>parameter<TAB>value`, where kind
/// is `tumor` or `organ`. Rows for one id may be spread over the file; the
/// order of first appearance is kept.
pub fn parse_params_tsv(content: &str, source: &str) -> Result<ParameterTables> {
    let mut tumors: HashMap<String, TumorDef> = HashMap::new();
    let mut organs: HashMap<String, OrganDef> = HashMap::new();
    let mut tumor_order: Vec<String> = Vec::new();
    let mut organ_order: Vec<String> = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let parts: Vec<&str> = trimmed.split('\t').collect();
        if parts.len() != 4 {
            bail!("{}:{} malformed TSV (expected 4 columns)", source, line_no);
        }
        let kind = parts[0].trim();
        let id = parts[1].trim().to_ascii_lowercase();
        let key = parts[2].trim();
        let value = parts[3].trim();
        if id.is_empty() || key.is_empty() || value.is_empty() {
            bail!("{}:{} empty field in TSV", source, line_no);
        }

        match kind {
            "tumor" => {
                let def = tumors.entry(id.clone()).or_insert_with(|| {
                    tumor_order.push(id.clone());
                    TumorDef {
                        id: id.clone(),
                        description: None,
                        params: TumorParameters::default(),
                    }
                });
                if key == "description" {
                    def.description = Some(value.to_string());
                    continue;
                }
                let v = parse_value(value, source, line_no)?;
                if !def.params.set(key, v) {
                    bail!(
                        "{}:{} unknown tumor parameter '{}' (expected one of {})",
                        source,
                        line_no,
                        key,
                        TumorParameters::KEYS.join(", ")
                    );
                }
            }
            "organ" => {
                let def = organs.entry(id.clone()).or_insert_with(|| {
                    organ_order.push(id.clone());
                    OrganDef {
                        id: id.clone(),
                        endpoint: None,
                        description: None,
                        params: OrganParameters::default(),
                    }
                });
                match key {
                    "description" => def.description = Some(value.to_string()),
                    "endpoint" => def.endpoint = Some(value.to_string()),
                    _ => {
                        let v = parse_value(value, source, line_no)?;
                        if !def.params.set(key, v) {
                            bail!(
                                "{}:{} unknown organ parameter '{}' (expected one of {})",
                                source,
                                line_no,
                                key,
                                OrganParameters::KEYS.join(", ")
                            );
                        }
                    }
                }
            }
            other => bail!(
                "{}:{} kind must be 'tumor' or 'organ', got '{}'",
                source,
                line_no,
                other
            ),
        }
    }

    let tumors_out = tumor_order
        .into_iter()
        .filter_map(|id| tumors.remove(&id))
        .collect();
    let organs_out = organ_order
        .into_iter()
        .filter_map(|id| organs.remove(&id))
        .collect();

    Ok(ParameterTables {
        version: "user".to_string(),
        tumors: tumors_out,
        organs: organs_out,
    })
}

fn parse_value(value: &str, source: &str, line_no: usize) -> Result<f64> {
    let v: f64 = value
        .parse()
        .with_context(|| format!("{}:{} value '{}' is not a number", source, line_no, value))?;
    if !v.is_finite() {
        bail!("{}:{} value must be finite", source, line_no);
    }
    Ok(v)
}

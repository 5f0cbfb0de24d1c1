use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::ctx::{Assignment, ParamOverride};
use crate::mask::FillRule;

#[derive(Debug, Parser)]
#[command(
    name = "kira-doseresp",
    version,
    about = "Dose-volume histograms and TCP/NTCP response models"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    Run(RunArgs),
    Params(ParamsArgs),
    Validate(ValidateArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    #[arg(long, help = "Case JSON (RTDOSE grid + RTSTRUCT structure set)")]
    pub case: PathBuf,

    #[arg(long)]
    pub out: PathBuf,

    #[arg(
        long = "target",
        value_parser = parse_assignment,
        help = "Target structure, STRUCTURE[=tumor_type] (repeatable)"
    )]
    pub targets: Vec<Assignment>,

    #[arg(
        long = "oar",
        value_parser = parse_assignment,
        help = "Organ at risk, STRUCTURE[=organ_type] (repeatable)"
    )]
    pub organs: Vec<Assignment>,

    #[arg(
        long,
        value_delimiter = ',',
        default_value = "poisson",
        help = "TCP models: poisson|lq|webb_nahum|logistic"
    )]
    pub tcp_model: Vec<String>,

    #[arg(
        long,
        value_delimiter = ',',
        default_value = "lkb",
        help = "NTCP models: lkb|critical_volume|relative_seriality|logistic|poisson"
    )]
    pub ntcp_model: Vec<String>,

    #[arg(long, help = "Parameter TSV overlaid on the built-in tables")]
    pub params: Option<PathBuf>,

    #[arg(
        long = "set",
        value_parser = parse_override,
        help = "Parameter override, STRUCTURE.param=value (repeatable)"
    )]
    pub overrides: Vec<ParamOverride>,

    #[arg(long, default_value_t = 0.1, help = "DVH bin width (Gy)")]
    pub bin_width: f64,

    #[arg(long, value_enum, default_value_t = FillRuleArg::EvenOdd)]
    pub fill_rule: FillRuleArg,

    #[arg(long, default_value_t = 1, help = "Number of fractions for BED/EQD2")]
    pub fractions: u32,

    #[arg(long, help = "Prescription dose (Gy) for target coverage")]
    pub prescription: Option<f64>,

    #[arg(long, default_value_t = 3.0, help = "alpha/beta (Gy) used for organs at risk")]
    pub oar_alpha_beta: f64,

    #[arg(long, value_delimiter = ',', help = "Dx percents to report")]
    pub dx: Vec<f64>,

    #[arg(long, value_delimiter = ',', help = "Vx doses (Gy) to report")]
    pub vx: Vec<f64>,

    #[arg(long, default_value_t = false)]
    pub json: bool,

    #[arg(long, default_value_t = false)]
    pub tsv: bool,

    #[arg(long, default_value_t = 0, help = "Number of threads (0 = auto)")]
    pub threads: usize,
}

#[derive(Debug, Args)]
pub struct ParamsArgs {
    #[command(subcommand)]
    pub command: ParamsCommand,
}

#[derive(Debug, Subcommand)]
pub enum ParamsCommand {
    Show(ParamsShowArgs),
}

#[derive(Debug, Args)]
pub struct ParamsShowArgs {
    #[arg(long, help = "Optional parameter TSV to overlay on built-in tables")]
    pub params: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = TableKindArg::All)]
    pub kind: TableKindArg,
}

#[derive(Debug, Args)]
pub struct ValidateArgs {
    #[arg(long, help = "Case JSON to check")]
    pub case: PathBuf,

    #[arg(long, value_enum, default_value_t = FillRuleArg::EvenOdd)]
    pub fill_rule: FillRuleArg,

    #[arg(long, default_value_t = 0, help = "Number of threads (0 = auto)")]
    pub threads: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FillRuleArg {
    EvenOdd,
    NonZero,
}

impl From<FillRuleArg> for FillRule {
    fn from(arg: FillRuleArg) -> Self {
        match arg {
            FillRuleArg::EvenOdd => FillRule::EvenOdd,
            FillRuleArg::NonZero => FillRule::NonZero,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TableKindArg {
    All,
    Tumor,
    Organ,
}

/// `PTV` or `PTV=prostate`; without a type the structure name is used.
pub fn parse_assignment(s: &str) -> Result<Assignment, String> {
    let (structure, tissue) = match s.split_once('=') {
        Some((st, t)) => (st.trim(), t.trim()),
        None => (s.trim(), s.trim()),
    };
    if structure.is_empty() || tissue.is_empty() {
        return Err(format!("expected STRUCTURE[=type], got '{}'", s));
    }
    Ok(Assignment {
        structure: structure.to_string(),
        tissue: tissue.to_ascii_lowercase(),
    })
}

/// `STRUCTURE.param=value`. The structure may itself contain dots; the last
/// dot before `=` separates the parameter name.
pub fn parse_override(s: &str) -> Result<ParamOverride, String> {
    let (lhs, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected STRUCTURE.param=value, got '{}'", s))?;
    let (structure, key) = lhs
        .rsplit_once('.')
        .ok_or_else(|| format!("expected STRUCTURE.param=value, got '{}'", s))?;
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("override value '{}' is not a number", value.trim()))?;
    if !value.is_finite() {
        return Err(format!("override value for '{}' must be finite", lhs));
    }
    if structure.trim().is_empty() || key.trim().is_empty() {
        return Err(format!("expected STRUCTURE.param=value, got '{}'", s));
    }
    Ok(ParamOverride {
        structure: structure.trim().to_string(),
        key: key.trim().to_string(),
        value,
    })
}

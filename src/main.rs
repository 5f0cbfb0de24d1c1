use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use kira_doseresp::cli::{Cli, Commands, ParamsCommand, ParamsShowArgs, TableKindArg};
use kira_doseresp::ctx::Ctx;
use kira_doseresp::io;
use kira_doseresp::models::{NtcpModel, TcpModel};
use kira_doseresp::params::{self, ParameterTables};
use kira_doseresp::pipeline::Pipeline;
use kira_doseresp::pipeline::stage1_input::Stage1Input;
use kira_doseresp::pipeline::stage3_dvh::Stage3Dvh;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => {
            let mut ctx = Ctx::new(args.case, args.out, args.json, args.tsv);
            ctx.targets = args.targets;
            ctx.organs = args.organs;
            ctx.tcp_models = args
                .tcp_model
                .iter()
                .map(|s| s.parse::<TcpModel>())
                .collect::<Result<_, _>>()?;
            ctx.ntcp_models = args
                .ntcp_model
                .iter()
                .map(|s| s.parse::<NtcpModel>())
                .collect::<Result<_, _>>()?;
            ctx.params_path = args.params;
            ctx.overrides = args.overrides;
            ctx.bin_width = args.bin_width;
            ctx.fill_rule = args.fill_rule.into();
            ctx.fractions = args.fractions;
            ctx.prescription = args.prescription;
            ctx.oar_alpha_beta = args.oar_alpha_beta;
            if !args.dx.is_empty() {
                ctx.dx_percents = args.dx;
            }
            if !args.vx.is_empty() {
                ctx.vx_doses = args.vx;
            }
            ctx.threads = args.threads;

            Pipeline::full().run(&mut ctx)?;
            print_summary(&ctx)?;
        }
        Commands::Params(args) => match args.command {
            ParamsCommand::Show(show) => handle_params_show(show)?,
        },
        Commands::Validate(args) => {
            let mut ctx = Ctx::new(args.case, PathBuf::from("."), false, false);
            ctx.fill_rule = args.fill_rule.into();
            ctx.threads = args.threads;

            let pipeline = Pipeline::new(vec![
                Box::new(Stage1Input::new()),
                Box::new(Stage3Dvh::new()),
            ]);
            pipeline.run(&mut ctx)?;

            print_validate_summary(&ctx);
        }
    }

    Ok(())
}

fn print_summary(ctx: &Ctx) -> Result<()> {
    let summary = io::summary::format_summary(ctx)?;
    print!("{}", summary);
    if !ctx.warnings.is_empty() {
        println!("warnings:");
        for warning in &ctx.warnings {
            println!("- {}", warning);
        }
    }
    Ok(())
}

fn print_validate_summary(ctx: &Ctx) {
    println!("kira-doseresp validate ok");
    if let Some(meta) = &ctx.case_meta {
        println!(
            "grid: {}x{}x{} @ {:?} mm",
            meta.dims[0], meta.dims[1], meta.dims[2], meta.spacing
        );
        println!("structures: {}", meta.structures);
    }
    for dvh in &ctx.dvhs {
        println!(
            "{}\t{} voxels\t{:.3} cc\t{} outside grid",
            dvh.structure(),
            dvh.sample_count(),
            dvh.total_volume_cc(),
            dvh.out_of_grid_voxels()
        );
    }
    if !ctx.warnings.is_empty() {
        println!("warnings:");
        for warning in &ctx.warnings {
            println!("- {}", warning);
        }
    }
}

fn handle_params_show(args: ParamsShowArgs) -> Result<()> {
    let tables = params::load_tables(args.params.as_deref())?;
    print_tables(&tables, args.kind);
    Ok(())
}

fn print_tables(tables: &ParameterTables, kind: TableKindArg) {
    println!("parameters (version {}):", tables.version);
    if matches!(kind, TableKindArg::All | TableKindArg::Tumor) {
        for def in &tables.tumors {
            println!(
                "tumor\t{}\t{}\t{}",
                def.id,
                format_params(&def.params.snapshot()),
                def.description.as_deref().unwrap_or("")
            );
        }
    }
    if matches!(kind, TableKindArg::All | TableKindArg::Organ) {
        for def in &tables.organs {
            println!(
                "organ\t{}\t{}\t{}\t{}",
                def.id,
                format_params(&def.params.snapshot()),
                def.endpoint.as_deref().unwrap_or(""),
                def.description.as_deref().unwrap_or("")
            );
        }
    }
}

fn format_params(values: &std::collections::BTreeMap<String, f64>) -> String {
    values
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(" ")
}

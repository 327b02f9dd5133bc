mod error;

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use qdesign_core::{ComponentsTable, Design, DesignConfig};
use qdesign_file::{load_design, save_design, ComponentFactory};
use qdesign_parser::{parse_value, LengthUnit, ParamValue, Variables};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::error::{CliError, ErrorCode};

#[derive(Parser)]
#[command(version, about = "Inspect and rebuild quantum chip designs", long_about = None)]
struct Cli {
    /// Log at debug level (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a value or expression and print the result as JSON
    Parse {
        /// Read as YAML, so `{w: 1um, n: 2}` parses a whole mapping
        #[arg(value_name = "EXPR")]
        expr: String,

        /// Design variable, repeatable
        #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_var)]
        vars: Vec<(String, String)>,

        /// Design config (YAML) providing the default unit
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Default length unit, overrides the config
        #[arg(long, value_name = "UNIT")]
        units: Option<LengthUnit>,
    },

    /// Print components, connectors and variables of a design file
    Inspect {
        #[arg(value_name = "DESIGN")]
        design: PathBuf,
    },

    /// Remake every component of a design file and report the outcome
    Rebuild {
        #[arg(value_name = "DESIGN")]
        design: PathBuf,

        /// Save the rebuilt design here (.json, .yaml or .yml)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

fn parse_var(arg: &str) -> Result<(String, String), String> {
    let (name, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got {arg:?}"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing variable name in {arg:?}"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.use_stderr() {
                ErrorCode::Usage as i32
            } else {
                0
            };
            let _ = err.print();
            std::process::exit(code);
        }
    };

    init_logging(cli.verbose);

    if let Err(err) = run(cli.command) {
        eprintln!("error: {err}");
        std::process::exit(err.code as i32);
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Command) -> Result<(), CliError> {
    match command {
        Command::Parse {
            expr,
            vars,
            config,
            units,
        } => parse(&expr, vars, config.as_deref(), units),
        Command::Inspect { design } => inspect(&design),
        Command::Rebuild { design, output } => rebuild(&design, output.as_deref()),
    }
}

fn parse(
    expr: &str,
    vars: Vec<(String, String)>,
    config: Option<&Path>,
    units: Option<LengthUnit>,
) -> Result<(), CliError> {
    let config = match config {
        Some(path) => read_config(path).map_err(CliError::input)?,
        None => DesignConfig::default(),
    };
    let units = units.unwrap_or(config.units);
    let variables: Variables = vars.into_iter().collect();
    debug!(%units, variables = variables.len(), "parsing {expr:?}");

    let raw = ParamValue::from_yaml_str(expr)
        .with_context(|| format!("could not read {expr:?}"))
        .map_err(CliError::input)?;
    let value = parse_value(&raw, &variables, units)
        .with_context(|| format!("could not parse {expr:?}"))
        .map_err(CliError::input)?;
    let json = serde_json::to_string(&value).map_err(CliError::processing)?;
    println!("{json}");
    Ok(())
}

fn read_config(path: &Path) -> Result<DesignConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    DesignConfig::from_yaml_str(&raw)
        .with_context(|| format!("invalid config {}", path.display()))
}

fn load(path: &Path) -> Result<Design> {
    load_design(path, &ComponentFactory::with_builtin())
        .with_context(|| format!("failed to load design {}", path.display()))
}

fn inspect(path: &Path) -> Result<(), CliError> {
    let mut design = load(path).map_err(CliError::input)?;
    let table = ComponentsTable::new(&mut design);

    println!("Components ({}):", table.row_count());
    let mut rows = vec![(0..table.column_count())
        .filter_map(|c| table.header(c).map(str::to_string))
        .collect::<Vec<_>>()];
    rows.extend(table.rows(&design).into_iter().map(Vec::from));
    print_columns(&rows);

    println!();
    println!("Connectors ({}):", design.connectors().len());
    for (name, c) in design.connectors() {
        println!(
            "  {name}  parent={}  chip={}  middle=({:.6}, {:.6})  width={:.6}",
            c.parent_name, c.chip, c.middle[0], c.middle[1], c.width
        );
    }

    println!();
    println!("Variables ({}):", design.variables().len());
    for (name, value) in design.variables().iter() {
        println!("  {name} = {value}");
    }
    Ok(())
}

fn rebuild(path: &Path, output: Option<&Path>) -> Result<(), CliError> {
    let mut design = load(path).map_err(CliError::input)?;
    let report = design.make_all_components();

    println!(
        "Built {} component(s): {} good, {} failed.",
        report.built(),
        report.good.len(),
        report.failed.len()
    );
    for (name, err) in &report.failed {
        println!("  {name}: {err}");
    }

    if let Some(output) = output {
        save_design(&design, output)
            .with_context(|| format!("failed to save design {}", output.display()))
            .map_err(CliError::processing)?;
        println!("Saved {}.", output.display());
    }

    if report.is_success() {
        Ok(())
    } else {
        Err(CliError::processing(anyhow!(
            "{} component(s) failed to build",
            report.failed.len()
        )))
    }
}

fn print_columns(rows: &[Vec<String>]) {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let widths: Vec<usize> = (0..columns)
        .map(|c| {
            rows.iter()
                .filter_map(|r| r.get(c))
                .map(|s| s.chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();
    for row in rows {
        let line = row
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!("{cell:<w$}"))
            .collect::<Vec<_>>()
            .join("  ");
        println!("  {}", line.trim_end());
    }
}

//! # elec CLI
//!
//! Thin JSON shell over `elec_core`. Every calculation subcommand reads one
//! record or a list of records from `--input` (or stdin), prints
//! `{"results": [...]}` on stdout and exits 0. A failure prints the
//! structured error on stderr and exits 1.
//!
//! ```text
//! elec thermal --input circuitos.json --pretty
//! echo '{"id":"c1","corriente":20}' | elec voltage-drop
//! elec vd-suggest --current 20 --length 100
//! RUST_LOG=debug elec dpms --input ambientes.json
//! ```

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use elec_core::calculations::voltage_drop::CircuitClass;
use elec_core::calculations::{
    calculate_batch, dpms, into_records, loads_per_panel, record_id_of, short_circuit, thermal, voltage_drop,
    BatchMode, Engine,
};
use elec_core::electrical::validation::{validate_parameters, ElectricalParameters};
use elec_core::errors::CalcError;
use elec_core::file_io::{load_project, save_report};

#[derive(Parser)]
#[command(name = "elec")]
#[command(about = "Low-voltage electrical installation calculations", long_about = None)]
#[command(version)]
struct Cli {
    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Where records come from and how results are printed.
#[derive(Args)]
struct InputArgs {
    /// JSON file holding one record or a list of records (stdin when omitted)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Pretty-print the output JSON
    #[arg(long)]
    pretty: bool,
}

#[derive(Args)]
struct RecordArgs {
    #[command(flatten)]
    io: InputArgs,

    /// Failure policy for lists of records
    #[arg(long, default_value = "all-or-nothing", value_parser = parse_tag::<BatchMode>)]
    batch_mode: BatchMode,
}

#[derive(Subcommand)]
enum Commands {
    /// Simultaneous maximum demand per room/panel
    Dpms(RecordArgs),
    /// Per-circuit currents and powers
    LoadsPerPanel(RecordArgs),
    /// Conductor ampacity check
    Thermal(RecordArgs),
    /// Voltage drop along a cable run
    VoltageDrop(RecordArgs),
    /// Short-circuit currents at a point of the installation
    ShortCircuit(RecordArgs),

    /// General DPMS summary over a list of rooms
    DpmsSummary(InputArgs),
    /// Per-panel and installation totals over a list of circuit loads
    Panels {
        #[command(flatten)]
        io: InputArgs,

        /// Summarize only this panel
        #[arg(long)]
        panel: Option<String>,
    },
    /// Thermal checks of several circuits with a batch summary
    ThermalBatch(InputArgs),
    /// Voltage profile over several runs
    Profile(InputArgs),
    /// Fault levels over several points
    FaultLevels(InputArgs),

    /// Smallest section that carries a current with margin
    ThermalSuggest {
        /// Design current (A)
        #[arg(long)]
        current: f64,

        /// Ambient temperature (°C)
        #[arg(long, default_value_t = 40.0)]
        ambient: f64,

        /// Number of loaded conductors
        #[arg(long, default_value_t = 3)]
        conductors: u32,

        #[arg(long)]
        pretty: bool,
    },

    /// Smallest section that keeps the voltage drop within the limit
    VdSuggest {
        /// Load current (A)
        #[arg(long)]
        current: f64,

        /// Run length (m)
        #[arg(long)]
        length: f64,

        /// Nominal voltage (V)
        #[arg(long, default_value_t = 220.0)]
        voltage: f64,

        /// Circuit class, e.g. circuito_tomas or alimentacion_principal
        #[arg(long, default_value = "circuito_tomas", value_parser = parse_tag::<CircuitClass>)]
        class: CircuitClass,

        #[arg(long, default_value_t = 0.92)]
        cos_phi: f64,

        #[arg(long)]
        pretty: bool,
    },

    /// Protection settings for a fault current
    Protection {
        /// Prospective fault current (A)
        #[arg(long)]
        fault_current: f64,

        /// Nominal load current (A)
        #[arg(long)]
        nominal_current: f64,

        #[arg(long)]
        pretty: bool,
    },

    /// Check electrical parameters against their physical bounds
    Validate {
        #[arg(long)]
        voltage: Option<f64>,

        #[arg(long)]
        current: Option<f64>,

        #[arg(long)]
        power_factor: Option<f64>,

        /// Conductor section (mm²)
        #[arg(long)]
        section: Option<f64>,

        /// Temperature (°C)
        #[arg(long)]
        temperature: Option<f64>,

        #[arg(long)]
        pretty: bool,
    },

    /// Compute every item of a project file into a report
    Project {
        /// Project file
        #[arg(short, long)]
        input: PathBuf,

        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long)]
        pretty: bool,
    },
}

/// Parse a CLI value with the type's wire name, e.g. `isolated`.
fn parse_tag<T: DeserializeOwned>(s: &str) -> Result<T, String> {
    serde_json::from_value(Value::String(s.to_string())).map_err(|e| e.to_string())
}

fn init_tracing(json_logs: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if json_logs {
        registry.with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr)).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer().with_writer(io::stderr)).init();
    }
}

fn read_document(input: Option<&Path>) -> anyhow::Result<Value> {
    let contents = match input {
        Some(path) => fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf).context("reading stdin")?;
            buf
        }
    };
    let document = serde_json::from_str(&contents).map_err(|e| CalcError::serialization(e.to_string()))?;
    Ok(document)
}

/// Read the input document and deserialize every record as `T`.
fn read_records<T: DeserializeOwned>(engine: Engine, input: Option<&Path>) -> anyhow::Result<Vec<T>> {
    let records = into_records(read_document(input)?);
    debug!(engine = engine.slug(), count = records.len(), "records read");

    let typed = records
        .iter()
        .map(|record| {
            T::deserialize(record).map_err(|e| {
                CalcError::calculation_failed(engine.name(), record_id_of(record), CalcError::serialization(e.to_string()))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(typed)
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> anyhow::Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", out);
    Ok(())
}

/// Wrap a single value in the `{"results": [...]}` envelope.
fn print_results<T: Serialize>(value: &T, pretty: bool) -> anyhow::Result<()> {
    print_json(&json!({ "results": [value] }), pretty)
}

fn run_engine(engine: Engine, args: &RecordArgs) -> anyhow::Result<()> {
    let records = into_records(read_document(args.io.input.as_deref())?);
    let response = calculate_batch(engine, &records, args.batch_mode)?;
    print_json(&response, args.io.pretty)
}

fn run(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Dpms(args) => run_engine(Engine::Dpms, &args),
        Commands::LoadsPerPanel(args) => run_engine(Engine::LoadsPerPanel, &args),
        Commands::Thermal(args) => run_engine(Engine::Thermal, &args),
        Commands::VoltageDrop(args) => run_engine(Engine::VoltageDrop, &args),
        Commands::ShortCircuit(args) => run_engine(Engine::ShortCircuit, &args),

        Commands::DpmsSummary(io) => {
            let rooms: Vec<dpms::PanelEnvironment> = read_records(Engine::Dpms, io.input.as_deref())?;
            let results = dpms::calculate_multiple(&rooms)?;
            let summary = dpms::general_summary(&results);
            print_results(&json!({ "ambientes": results, "resumen": summary }), io.pretty)
        }
        Commands::Panels { io, panel } => {
            let loads: Vec<loads_per_panel::CircuitLoad> = read_records(Engine::LoadsPerPanel, io.input.as_deref())?;
            let results = loads_per_panel::calculate_multiple(&loads)?;
            match panel {
                Some(panel_id) => print_results(&loads_per_panel::panel_summary(&results, &panel_id), io.pretty),
                None => print_results(&loads_per_panel::all_panels_summary(&results), io.pretty),
            }
        }
        Commands::ThermalBatch(io) => {
            let checks: Vec<thermal::ThermalCheck> = read_records(Engine::Thermal, io.input.as_deref())?;
            print_results(&thermal::calculate_multiple_circuits(&checks)?, io.pretty)
        }
        Commands::Profile(io) => {
            let runs: Vec<voltage_drop::VoltageDropCheck> = read_records(Engine::VoltageDrop, io.input.as_deref())?;
            print_results(&voltage_drop::calculate_voltage_profile(&runs)?, io.pretty)
        }
        Commands::FaultLevels(io) => {
            let points: Vec<short_circuit::ShortCircuitPoint> =
                read_records(Engine::ShortCircuit, io.input.as_deref())?;
            print_results(&short_circuit::calculate_fault_levels(&points)?, io.pretty)
        }

        Commands::ThermalSuggest { current, ambient, conductors, pretty } => {
            print_results(&thermal::suggest_optimal_section(current, ambient, conductors)?, pretty)
        }
        Commands::VdSuggest { current, length, voltage, class, cos_phi, pretty } => print_results(
            &voltage_drop::suggest_optimal_section(current, length, voltage, class, cos_phi)?,
            pretty,
        ),
        Commands::Protection { fault_current, nominal_current, pretty } => {
            print_results(&short_circuit::suggest_protection_settings(fault_current, nominal_current)?, pretty)
        }
        Commands::Validate { voltage, current, power_factor, section, temperature, pretty } => {
            let params = ElectricalParameters {
                voltage,
                current,
                power_factor,
                conductor_section: section,
                temperature,
            };
            print_results(&validate_parameters(&params)?, pretty)
        }

        Commands::Project { input, output, pretty } => {
            let project = load_project(&input)?;
            let report = project.calculate_all()?;
            match output {
                Some(path) => {
                    save_report(&report, &path)?;
                    info!(path = %path.display(), entries = report.entries.len(), "report written");
                    Ok(())
                }
                None => print_json(&report, pretty),
            }
        }
    }
}

/// Print a failure on stderr. Calculation errors keep their structure.
fn report_error(err: &anyhow::Error) {
    let body = match err.downcast_ref::<CalcError>() {
        Some(calc) => json!({
            "error": calc,
            "code": calc.error_code(),
            "message": calc.to_string(),
        }),
        None => json!({
            "code": "INTERNAL_ERROR",
            "message": format!("{:#}", err),
        }),
    };
    eprintln!("{}", body);
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_tags() {
        assert_eq!(parse_tag::<BatchMode>("isolated").unwrap(), BatchMode::Isolated);
        assert_eq!(parse_tag::<CircuitClass>("emergencia").unwrap(), CircuitClass::Emergencia);
        assert!(parse_tag::<BatchMode>("sometimes").is_err());
    }

    #[test]
    fn test_subcommand_parsing() {
        let cli = Cli::try_parse_from(["elec", "thermal", "--input", "c.json", "--batch-mode", "isolated"]).unwrap();
        match cli.command {
            Commands::Thermal(args) => {
                assert_eq!(args.batch_mode, BatchMode::Isolated);
                assert_eq!(args.io.input.as_deref(), Some(Path::new("c.json")));
            }
            _ => panic!("expected thermal subcommand"),
        }

        let cli = Cli::try_parse_from(["elec", "vd-suggest", "--current", "20", "--length", "100"]).unwrap();
        match cli.command {
            Commands::VdSuggest { voltage, class, .. } => {
                assert!((voltage - 220.0).abs() < 1e-9);
                assert_eq!(class, CircuitClass::CircuitoTomas);
            }
            _ => panic!("expected vd-suggest subcommand"),
        }
    }
}

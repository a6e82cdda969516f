use std::path::{Path, PathBuf};

use neurite_core::{
    reconstruct_circuit_with, Circuit, CircuitReport, ImportSettings, MaterialLegend, MaterialPalette,
    ProgressEvent, ProgressSink,
};
use neurite_scene::CellGeometry;
use serde::Serialize;
use tracing_subscriber::filter::LevelFilter;

use crate::logging::parse_level;

#[derive(Debug, PartialEq)]
pub(crate) struct CliArgs {
    pub circuit_path: PathBuf,
    pub settings_path: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
    pub palette_path: Option<PathBuf>,
    pub log_level: LevelFilter,
}

#[derive(Debug, PartialEq)]
pub(crate) enum Command {
    Run(CliArgs),
    Help,
}

#[derive(Serialize)]
struct GeometryDump<'a> {
    cells: &'a [CellGeometry],
    legend: &'a MaterialLegend,
    failed_gids: Vec<u64>,
    cancelled: bool,
}

pub(crate) fn parse_args(args: &[String]) -> Result<Command, String> {
    let mut circuit_path = None;
    let mut settings_path = None;
    let mut output_path = None;
    let mut palette_path = None;
    let mut log_level = LevelFilter::INFO;
    let mut iter = args.iter().skip(1);

    while let Some(arg) = iter.next() {
        let mut value = |flag: &str| {
            iter.next()
                .cloned()
                .ok_or_else(|| format!("{flag} requires a value"))
        };
        match arg.as_str() {
            "--circuit" => circuit_path = Some(PathBuf::from(value("--circuit")?)),
            "--settings" => settings_path = Some(PathBuf::from(value("--settings")?)),
            "--output" => output_path = Some(PathBuf::from(value("--output")?)),
            "--palette" => palette_path = Some(PathBuf::from(value("--palette")?)),
            "--log-level" => log_level = parse_level(&value("--log-level")?)?,
            "--help" | "-h" => return Ok(Command::Help),
            other => return Err(format!("unexpected argument '{other}'")),
        }
    }

    let circuit_path = circuit_path.ok_or_else(|| "--circuit <path> is required".to_string())?;
    Ok(Command::Run(CliArgs {
        circuit_path,
        settings_path,
        output_path,
        palette_path,
        log_level,
    }))
}

pub(crate) fn print_help() {
    println!(
        "Usage: neurite --circuit <path> [options]\n  --settings <path>   import settings JSON\n  --palette <path>    material palette JSON\n  --output <path>     write cell geometry JSON\n  --log-level <level> off|error|warn|info|debug|trace (default info)"
    );
}

pub(crate) fn run(args: &CliArgs) -> Result<CircuitReport, String> {
    let circuit: Circuit = load_json(&args.circuit_path)?;
    let settings: ImportSettings = match args.settings_path.as_deref() {
        Some(path) => load_json(path)?,
        None => ImportSettings::default(),
    };
    let palette: MaterialPalette = match args.palette_path.as_deref() {
        Some(path) => load_json(path)?,
        None => MaterialPalette::default(),
    };
    tracing::info!(
        cells = circuit.cells.len(),
        circuit = ?args.circuit_path,
        "loaded circuit"
    );

    let progress: ProgressSink = std::sync::Arc::new(|event: ProgressEvent| {
        if let ProgressEvent::Advance { completed, total, .. } = event {
            tracing::debug!(completed, total, "cell finished");
        }
    });
    let report = reconstruct_circuit_with(&circuit, &settings, &palette, Some(progress), &|| true)
        .map_err(|err| err.to_string())?;

    if let Some(path) = args.output_path.as_deref() {
        save_report_json(&report, path)?;
        tracing::info!("saved geometry to {:?}", path);
    }
    Ok(report)
}

pub(crate) fn summary(report: &CircuitReport) -> String {
    format!(
        "cells: {}  failed: {}  primitives: {}  skipped sections: {}{}",
        report.cells.len(),
        report.failures.len(),
        report.primitive_count(),
        report.skipped_sections,
        if report.cancelled { "  (cancelled)" } else { "" }
    )
}

fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, String> {
    let data = std::fs::read(path).map_err(|err| format!("{}: {err}", path.display()))?;
    serde_json::from_slice(&data).map_err(|err| format!("{}: {err}", path.display()))
}

fn save_report_json(report: &CircuitReport, path: &Path) -> Result<(), String> {
    let dump = GeometryDump {
        cells: &report.cells,
        legend: &report.legend,
        failed_gids: report.failures.iter().map(|failure| failure.gid).collect(),
        cancelled: report.cancelled,
    };
    let data = serde_json::to_vec_pretty(&dump).map_err(|err| err.to_string())?;
    std::fs::write(path, data).map_err(|err| format!("{}: {err}", path.display()))
}

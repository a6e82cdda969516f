use neurite_scene::{Bounds, CellGeometry};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::cell::{reconstruct_cell, CellContext, CellInput, CellReconstruction};
use crate::error::{ReconstructionError, ReconstructionResult};
use crate::material::{assign_material, material_legend, CellAttributeTables, MaterialLegend, MaterialPalette};
use crate::parallel::map_indexed_in_pool;
use crate::progress::{ProgressSink, ProgressTracker};
use crate::settings::{ColorScheme, ImportSettings};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Circuit {
    pub cells: Vec<CellInput>,
    pub attributes: CellAttributeTables,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CellFailure {
    pub gid: u64,
    pub index: usize,
    pub error: ReconstructionError,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CircuitReport {
    pub cells: Vec<CellGeometry>,
    pub failures: Vec<CellFailure>,
    pub cancelled: bool,
    pub legend: MaterialLegend,
    pub bounds: Bounds,
    pub skipped_sections: usize,
}

impl CircuitReport {
    pub fn primitive_count(&self) -> usize {
        self.cells.iter().map(CellGeometry::len).sum()
    }
}

enum CellOutcome {
    Done(ReconstructionResult<CellReconstruction>),
    Cancelled,
}

pub fn reconstruct_circuit(
    circuit: &Circuit,
    settings: &ImportSettings,
    palette: &MaterialPalette,
) -> ReconstructionResult<CircuitReport> {
    reconstruct_circuit_with(circuit, settings, palette, None, &|| true)
}

/// Reconstructs every cell on the worker pool. Cells are independent: a
/// failing cell is reported and skipped, and once `should_continue` returns
/// false no new cell starts while in-flight cells finish.
pub fn reconstruct_circuit_with(
    circuit: &Circuit,
    settings: &ImportSettings,
    palette: &MaterialPalette,
    progress: Option<ProgressSink>,
    should_continue: &(dyn Fn() -> bool + Sync),
) -> ReconstructionResult<CircuitReport> {
    let mut scheme = settings.color_scheme;
    if !circuit.attributes.supports(scheme) {
        warn!(?scheme, "attribute table missing for color scheme, falling back to none");
        scheme = ColorScheme::None;
    }
    if settings.effective_soma_strategy() != settings.soma_strategy {
        warn!("sdf blending disabled, building somas as point and cones");
    }

    let tracker = ProgressTracker::new(circuit.cells.len(), progress);
    let outcomes = map_indexed_in_pool(&circuit.cells, settings.worker_threads, |index, cell| {
        if !should_continue() {
            return CellOutcome::Cancelled;
        }
        let context = CellContext {
            index,
            settings,
            palette,
            base_material: assign_material(scheme, index, &circuit.attributes, palette),
        };
        let result = reconstruct_cell(cell, &context);
        tracker.advance();
        CellOutcome::Done(result)
    })?;
    tracker.finish();

    let mut report = CircuitReport {
        legend: material_legend(scheme, &circuit.attributes, palette),
        ..CircuitReport::default()
    };
    for (index, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            CellOutcome::Cancelled => report.cancelled = true,
            CellOutcome::Done(Ok(cell)) => {
                report.bounds.merge(&cell.geometry.bounds);
                report.skipped_sections += cell.skipped_sections;
                report.cells.push(cell.geometry);
            }
            CellOutcome::Done(Err(error)) => {
                let gid = circuit.cells[index].gid;
                warn!(gid, index, %error, "cell reconstruction failed, skipping");
                report.failures.push(CellFailure { gid, index, error });
            }
        }
    }

    info!(
        cells = report.cells.len(),
        failed = report.failures.len(),
        primitives = report.primitive_count(),
        cancelled = report.cancelled,
        "circuit reconstructed"
    );
    Ok(report)
}

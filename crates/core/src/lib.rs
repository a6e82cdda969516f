mod builder;
mod cell;
mod circuit;
mod error;
mod material;
mod morphology;
mod neighbours;
mod offsets;
mod parallel;
mod progress;
mod sdf_data;
mod settings;
mod soma;
mod synapse;
mod tree;

pub use builder::{
    build_section, dampen_radius, radii_match, segment_geometry, SectionContext, SectionOutcome,
    MAX_RADIUS_CHANGE, RADIUS_EPSILON,
};
pub use cell::{reconstruct_cell, CellContext, CellInput, CellReconstruction};
pub use circuit::{
    reconstruct_circuit, reconstruct_circuit_with, CellFailure, Circuit, CircuitReport,
};
pub use error::{ReconstructionError, ReconstructionResult};
pub use material::{
    assign_material, material_legend, CellAttributeTables, CellMaterials, LegendEntry,
    MaterialElement, MaterialLegend, MaterialPalette, NO_MATERIAL,
};
pub use morphology::{Morphology, Sample, Section, SectionId, SectionType, Soma};
pub use neighbours::{resolve_neighbours, saturate};
pub use offsets::{
    proportional_offset, section_start_distances, CompartmentOffsetTable,
    SimulationOffsetMapper, DISTANCE_SCALE,
};
pub use parallel::{map_indexed, map_indexed_in_pool};
pub use progress::{ProgressEvent, ProgressSink, ProgressTracker};
pub use sdf_data::SdfMorphologyData;
pub use settings::{
    ColorScheme, GeometryQuality, ImportSettings, NeighbourSaturation, SectionTypeFilter,
    SomaStrategy, UserDataPolicy,
};
pub use soma::build_soma;
pub use synapse::{place_synapses, Synapse, SynapseDirection, SynapsePlacement};
pub use tree::{analyze_tree, MorphologyTreeStructure};

pub use neurite_scene::{
    Bounds, CellGeometry, MaterialId, RadiusProfile, SdfGeometry, SdfPrimitive, INVALID_USER_DATA,
};

use neurite_scene::{CellGeometry, MaterialId};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::builder::{build_section, SectionContext};
use crate::error::{ReconstructionError, ReconstructionResult};
use crate::material::{CellMaterials, MaterialElement, MaterialPalette};
use crate::morphology::{Morphology, Section, SectionId, SectionType};
use crate::neighbours::resolve_neighbours;
use crate::offsets::{section_start_distances, CompartmentOffsetTable, SimulationOffsetMapper};
use crate::sdf_data::SdfMorphologyData;
use crate::settings::{ImportSettings, UserDataPolicy};
use crate::soma::build_soma;
use crate::synapse::{place_synapses, Synapse, SynapseDirection, SynapsePlacement};
use crate::tree::analyze_tree;


#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellInput {
    pub gid: u64,
    pub morphology: Morphology,
    #[serde(default)]
    pub compartments: Option<CompartmentOffsetTable>,
    #[serde(default)]
    pub afferent_synapses: Vec<Synapse>,
    #[serde(default)]
    pub efferent_synapses: Vec<Synapse>,
}

#[derive(Debug, Clone, Copy)]
pub struct CellContext<'a> {
    pub index: usize,
    pub settings: &'a ImportSettings,
    pub palette: &'a MaterialPalette,
    /// Bucket chosen by the circuit color scheme, possibly `NO_MATERIAL`.
    pub base_material: MaterialId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CellReconstruction {
    pub geometry: CellGeometry,
    pub skipped_sections: usize,
    pub synapses: usize,
}

pub fn reconstruct_cell(
    cell: &CellInput,
    context: &CellContext<'_>,
) -> ReconstructionResult<CellReconstruction> {
    let settings = context.settings;
    let morphology = &cell.morphology;

    let mut policy = settings.user_data;
    if policy == UserDataPolicy::SimulationOffset && cell.compartments.is_none() {
        debug!(gid = cell.gid, "no compartment table, falling back to index user data");
        policy = UserDataPolicy::Index;
    }
    // Simulation coloring reads user data, so every primitive shares bucket 0.
    let materials = if policy == UserDataPolicy::SimulationOffset {
        CellMaterials::new(0, false, context.palette)
    } else {
        CellMaterials::new(context.base_material, settings.color_by_section_type, context.palette)
    };

    let soma_section = morphology
        .sections
        .iter()
        .find(|section| section.section_type == SectionType::Soma)
        .map_or(SectionId(0), |section| section.id);
    let mut mapper =
        SimulationOffsetMapper::new(policy, context.index as u64, cell.compartments.as_ref())?
            .with_soma_section(soma_section);

    let sections: Vec<&Section> = morphology
        .neurites()
        .filter(|section| settings.section_types.allows(section.section_type))
        .collect();
    let tree = analyze_tree(&sections, settings.dampen_thickness, settings.radius_multiplier);
    let start_distances = section_start_distances(&sections, &tree);

    let mut data = SdfMorphologyData::new();

    let soma = morphology.soma.as_ref().filter(|_| settings.section_types.soma);
    if let Some(soma) = soma {
        let mut children = Vec::with_capacity(soma.children.len());
        for &id in &soma.children {
            let section = morphology
                .section(id)
                .ok_or(ReconstructionError::UnknownSection(id))?;
            if settings.section_types.allows(section.section_type) {
                children.push(section);
            }
        }
        build_soma(
            &mut data,
            soma,
            &children,
            settings.effective_soma_strategy(),
            settings.radius_multiplier,
            materials.for_element(MaterialElement::Soma),
            mapper.soma_user_data()?,
        );
    }

    let mut end_radii: Vec<Option<f32>> = vec![None; sections.len()];
    let mut skipped_sections = 0;
    for &index in &tree.section_traverse_order {
        let section = sections
            .get(index)
            .ok_or(ReconstructionError::TreeMismatch {
                tree: tree.len(),
                sections: sections.len(),
            })?;
        let section_context = SectionContext {
            material: materials.for_element(MaterialElement::Section(section.section_type)),
            start_distance: start_distances[index],
            parent_end_radius: tree.section_parent[index].and_then(|parent| end_radii[parent]),
        };
        let outcome = build_section(&mut data, section, &section_context, settings, &mut mapper)?;
        if outcome.skipped {
            skipped_sections += 1;
        }
        end_radii[index] = outcome.end_radius;
    }

    if settings.use_sdf_blending {
        resolve_neighbours(&mut data, &sections, &tree, settings.neighbour_saturation)?;
    } else {
        data.neighbours.iter_mut().for_each(|set| set.clear());
    }

    let mut synapses = 0;
    let directions = [
        (
            settings.load_afferent_synapses,
            SynapseDirection::Afferent,
            &cell.afferent_synapses,
            MaterialElement::AfferentSynapse,
        ),
        (
            settings.load_efferent_synapses,
            SynapseDirection::Efferent,
            &cell.efferent_synapses,
            MaterialElement::EfferentSynapse,
        ),
    ];
    for (enabled, direction, records, element) in directions {
        if !enabled {
            continue;
        }
        let placement = SynapsePlacement {
            direction,
            radius: settings.synapse_radius,
            material: materials.for_element(element),
            cell_index: context.index as u64,
            table: cell.compartments.as_ref(),
            morphology: Some(morphology),
        };
        synapses += place_synapses(&mut data, records, &placement);
    }

    debug!(
        gid = cell.gid,
        primitives = data.len(),
        sections = sections.len(),
        skipped_sections,
        synapses,
        "cell reconstructed"
    );

    Ok(CellReconstruction {
        geometry: data.into_cell_geometry(cell.gid),
        skipped_sections,
        synapses,
    })
}

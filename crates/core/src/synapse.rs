use std::collections::BTreeSet;

use glam::Vec3;
use neurite_scene::{MaterialId, SdfGeometry};
use serde::{Deserialize, Serialize};

use crate::morphology::{Morphology, SectionId};
use crate::offsets::{proportional_offset, CompartmentOffsetTable};
use crate::sdf_data::SdfMorphologyData;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SynapseDirection {
    Afferent,
    Efferent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Synapse {
    pub pre_gid: u64,
    pub post_gid: u64,
    pub pre_section: SectionId,
    pub post_section: SectionId,
    pub pre_position: [f32; 3],
    pub post_position: [f32; 3],
}

impl Synapse {
    pub fn surface(&self, direction: SynapseDirection) -> Vec3 {
        match direction {
            SynapseDirection::Afferent => Vec3::from(self.post_position),
            SynapseDirection::Efferent => Vec3::from(self.pre_position),
        }
    }

    pub fn section(&self, direction: SynapseDirection) -> SectionId {
        match direction {
            SynapseDirection::Afferent => self.post_section,
            SynapseDirection::Efferent => self.pre_section,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SynapsePlacement<'a> {
    pub direction: SynapseDirection,
    pub radius: f32,
    pub material: MaterialId,
    pub cell_index: u64,
    pub table: Option<&'a CompartmentOffsetTable>,
    pub morphology: Option<&'a Morphology>,
}

impl SynapsePlacement<'_> {
    /// Simulation offset of the sample nearest to the synapse, or the cell
    /// index when the synapse cannot be tied to reported compartments.
    pub fn user_data(&self, synapse: &Synapse) -> u64 {
        let (Some(table), Some(morphology)) = (self.table, self.morphology) else {
            return self.cell_index;
        };
        let section_id = synapse.section(self.direction);
        let Some(section) = morphology.section(section_id) else {
            return self.cell_index;
        };
        let Ok((offset, count)) = table.entry(section_id) else {
            return self.cell_index;
        };
        if count == 0 {
            return self.cell_index;
        }
        let surface = synapse.surface(self.direction);
        let nearest = section
            .samples
            .iter()
            .enumerate()
            .map(|(idx, sample)| (idx, sample.point().distance_squared(surface)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(idx, _)| idx);
        match nearest {
            Some(idx) => proportional_offset(offset, count, idx, section.samples.len()),
            None => self.cell_index,
        }
    }
}

pub fn place_synapses(
    data: &mut SdfMorphologyData,
    synapses: &[Synapse],
    placement: &SynapsePlacement<'_>,
) -> usize {
    if placement.radius <= 0.0 {
        return 0;
    }
    for synapse in synapses {
        data.add_geometry(
            SdfGeometry::sphere(
                synapse.surface(placement.direction),
                placement.radius,
                placement.user_data(synapse),
            ),
            BTreeSet::new(),
            placement.material,
            None,
        );
    }
    synapses.len()
}

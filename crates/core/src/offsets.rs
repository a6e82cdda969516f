use std::borrow::Borrow;
use std::collections::BTreeMap;

use neurite_scene::INVALID_USER_DATA;
use serde::{Deserialize, Serialize};

use crate::error::{ReconstructionError, ReconstructionResult};
use crate::morphology::{Section, SectionId};
use crate::settings::UserDataPolicy;
use crate::tree::MorphologyTreeStructure;

/// Distances are stored in tenths so one decimal survives the integer slot.
pub const DISTANCE_SCALE: f32 = 10.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompartmentOffsetTable {
    pub offsets: Vec<u64>,
    pub compartment_counts: Vec<u16>,
}

impl CompartmentOffsetTable {
    pub fn new(offsets: Vec<u64>, compartment_counts: Vec<u16>) -> ReconstructionResult<Self> {
        let table = Self {
            offsets,
            compartment_counts,
        };
        table.validate()?;
        Ok(table)
    }

    pub fn validate(&self) -> ReconstructionResult<()> {
        if self.offsets.len() != self.compartment_counts.len() {
            return Err(ReconstructionError::InconsistentTable {
                offsets: self.offsets.len(),
                counts: self.compartment_counts.len(),
            });
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn entry(&self, section: SectionId) -> ReconstructionResult<(u64, u16)> {
        let index = section.index();
        match (
            self.offsets.get(index),
            self.compartment_counts.get(index),
        ) {
            (Some(&offset), Some(&count)) => Ok((offset, count)),
            _ => Err(ReconstructionError::SectionOutOfTable {
                section,
                len: self.len().min(self.compartment_counts.len()),
            }),
        }
    }

}

pub fn proportional_offset(offset: u64, count: u16, index: usize, sample_count: usize) -> u64 {
    if count == 0 || sample_count == 0 {
        return offset;
    }
    // floor(index / sample_count * count), kept in integers.
    let index = index.min(sample_count - 1) as u64;
    let compartment = index * count as u64 / sample_count as u64;
    offset + compartment.min(count as u64 - 1)
}

#[derive(Debug, Clone)]
pub struct SimulationOffsetMapper<'a> {
    policy: UserDataPolicy,
    cell_index: u64,
    table: Option<&'a CompartmentOffsetTable>,
    soma_section: SectionId,
    last_axon_offset: Option<u64>,
}

impl<'a> SimulationOffsetMapper<'a> {
    pub fn new(
        policy: UserDataPolicy,
        cell_index: u64,
        table: Option<&'a CompartmentOffsetTable>,
    ) -> ReconstructionResult<Self> {
        if policy == UserDataPolicy::SimulationOffset && table.is_none() {
            return Err(ReconstructionError::MissingCompartmentTable);
        }
        if let Some(table) = table {
            table.validate()?;
        }
        Ok(Self {
            policy,
            cell_index,
            table,
            soma_section: SectionId(0),
            last_axon_offset: None,
        })
    }

    pub fn with_soma_section(mut self, soma_section: SectionId) -> Self {
        self.soma_section = soma_section;
        self
    }

    pub fn soma_user_data(&self) -> ReconstructionResult<u64> {
        match self.policy {
            UserDataPolicy::Index => Ok(self.cell_index),
            UserDataPolicy::DistanceToSoma => Ok(0),
            UserDataPolicy::SimulationOffset => {
                let (offset, count) = self.table()?.entry(self.soma_section)?;
                Ok(if count > 0 { offset } else { INVALID_USER_DATA })
            }
        }
    }

    /// Sections must be fed in traversal order so under-reported axon
    /// sections borrow from the closest reported one upstream.
    pub fn resolve(
        &mut self,
        section: &Section,
        sample_index: usize,
        distance_to_soma: f32,
    ) -> ReconstructionResult<u64> {
        match self.policy {
            UserDataPolicy::Index => Ok(self.cell_index),
            UserDataPolicy::DistanceToSoma => {
                Ok((distance_to_soma.max(0.0) * DISTANCE_SCALE) as u64)
            }
            UserDataPolicy::SimulationOffset => {
                let (offset, count) = self.table()?.entry(section.id)?;
                if count > 0 {
                    if section.is_axon() {
                        // Borrowers continue from the distal end of the reported axon.
                        self.last_axon_offset = Some(offset + count as u64 - 1);
                    }
                    return Ok(proportional_offset(
                        offset,
                        count,
                        sample_index,
                        section.samples.len(),
                    ));
                }
                if section.is_axon() {
                    return Ok(self.last_axon_offset.unwrap_or(INVALID_USER_DATA));
                }
                Ok(INVALID_USER_DATA)
            }
        }
    }

    fn table(&self) -> ReconstructionResult<&'a CompartmentOffsetTable> {
        self.table
            .ok_or(ReconstructionError::MissingCompartmentTable)
    }
}

pub fn section_start_distances<S: Borrow<Section>>(
    sections: &[S],
    tree: &MorphologyTreeStructure,
) -> Vec<f32> {
    let by_id: BTreeMap<SectionId, usize> = sections
        .iter()
        .enumerate()
        .map(|(idx, section)| (section.borrow().id, idx))
        .collect();
    let lengths: Vec<f32> = sections.iter().map(|s| s.borrow().length()).collect();
    let parent_of = |idx: usize| -> Option<usize> {
        sections[idx]
            .borrow()
            .parent
            .and_then(|id| by_id.get(&id).copied())
            .or_else(|| tree.section_parent.get(idx).copied().flatten())
    };

    let mut distances = Vec::with_capacity(sections.len());
    for idx in 0..sections.len() {
        let mut total = 0.0;
        let mut current = idx;
        let mut hops = 0;
        while let Some(parent) = parent_of(current) {
            // Source links are not trusted to be acyclic.
            if parent == idx || hops > sections.len() {
                break;
            }
            total += lengths[parent];
            current = parent;
            hops += 1;
        }
        distances.push(total);
    }
    distances
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::morphology::{Sample, SectionType};

    fn section(id: u32, section_type: SectionType, samples: usize) -> Section {
        Section::new(
            id,
            section_type,
            (0..samples)
                .map(|i| Sample::new([i as f32, 0.0, 0.0], 1.0))
                .collect(),
        )
    }

    #[test]
    fn offsets_are_monotonic_and_in_range() {
        let table = CompartmentOffsetTable::new(vec![0, 10, 40], vec![10, 30, 3]).expect("table");
        let dendrite = section(1, SectionType::Dendrite, 17);
        let mut mapper =
            SimulationOffsetMapper::new(UserDataPolicy::SimulationOffset, 0, Some(&table))
                .expect("mapper");
        let offsets: Vec<u64> = (0..17)
            .map(|i| mapper.resolve(&dendrite, i, 0.0).expect("offset"))
            .collect();
        assert_eq!(offsets[0], 10);
        assert!(offsets.windows(2).all(|w| w[0] <= w[1]));
        assert!(offsets.iter().all(|&o| (10..40).contains(&o)));
    }

    #[test]
    fn under_reported_axon_borrows_last_axon_offset() {
        let table = CompartmentOffsetTable::new(vec![0, 100, 121], vec![1, 21, 0]).expect("table");
        let proximal = section(1, SectionType::Axon, 4);
        let distal = section(2, SectionType::Axon, 5);
        let mut mapper =
            SimulationOffsetMapper::new(UserDataPolicy::SimulationOffset, 3, Some(&table))
                .expect("mapper");
        assert_eq!(mapper.resolve(&proximal, 0, 0.0).expect("proximal"), 100);
        for i in 0..5 {
            assert_eq!(mapper.resolve(&distal, i, 0.0).expect("distal"), 120);
        }
    }

    #[test]
    fn unreported_sections_get_invalid_marker() {
        let table = CompartmentOffsetTable::new(vec![0, 5, 5], vec![5, 0, 0]).expect("table");
        let dendrite = section(1, SectionType::Dendrite, 2);
        let axon = section(2, SectionType::Axon, 2);
        let mut mapper =
            SimulationOffsetMapper::new(UserDataPolicy::SimulationOffset, 0, Some(&table))
                .expect("mapper");
        assert_eq!(mapper.resolve(&dendrite, 0, 0.0).expect("dendrite"), INVALID_USER_DATA);
        assert_eq!(mapper.resolve(&axon, 1, 0.0).expect("axon"), INVALID_USER_DATA);
    }

    #[test]
    fn out_of_table_section_is_an_error() {
        let table = CompartmentOffsetTable::new(vec![0], vec![1]).expect("table");
        let dendrite = section(7, SectionType::Dendrite, 2);
        let mut mapper =
            SimulationOffsetMapper::new(UserDataPolicy::SimulationOffset, 0, Some(&table))
                .expect("mapper");
        assert_eq!(
            mapper.resolve(&dendrite, 0, 0.0),
            Err(ReconstructionError::SectionOutOfTable {
                section: SectionId(7),
                len: 1
            })
        );
    }

    #[test]
    fn simulation_policy_requires_table() {
        assert_eq!(
            SimulationOffsetMapper::new(UserDataPolicy::SimulationOffset, 0, None).err(),
            Some(ReconstructionError::MissingCompartmentTable)
        );
        assert!(CompartmentOffsetTable::new(vec![0, 1], vec![1]).is_err());
    }

    #[test]
    fn index_and_distance_policies() {
        let dendrite = section(0, SectionType::Dendrite, 2);
        let mut index = SimulationOffsetMapper::new(UserDataPolicy::Index, 9, None).expect("mapper");
        assert_eq!(index.resolve(&dendrite, 1, 3.0).expect("index"), 9);
        assert_eq!(index.soma_user_data().expect("soma"), 9);

        let mut distance =
            SimulationOffsetMapper::new(UserDataPolicy::DistanceToSoma, 9, None).expect("mapper");
        assert_eq!(distance.resolve(&dendrite, 1, 12.34).expect("distance"), 123);
    }

    #[test]
    fn start_distances_sum_ancestor_lengths() {
        let root = section(0, SectionType::Dendrite, 3);
        let child = section(1, SectionType::Dendrite, 4).with_parent(0);
        let grandchild = section(2, SectionType::Dendrite, 2).with_parent(1);
        let sections = vec![root, child, grandchild];
        let tree = MorphologyTreeStructure::identity(3);
        let distances = section_start_distances(&sections, &tree);
        assert!((distances[0] - 0.0).abs() < 1.0e-5);
        assert!((distances[1] - 2.0).abs() < 1.0e-5);
        assert!((distances[2] - 5.0).abs() < 1.0e-5);
    }
}

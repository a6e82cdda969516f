use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionId(pub u32);

impl SectionId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionType {
    Soma,
    Axon,
    Dendrite,
    ApicalDendrite,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub position: [f32; 3],
    pub radius: f32,
}

impl Sample {
    pub fn new(position: [f32; 3], radius: f32) -> Self {
        Self { position, radius }
    }

    pub fn point(&self) -> Vec3 {
        Vec3::from(self.position)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    pub section_type: SectionType,
    pub samples: Vec<Sample>,
    #[serde(default)]
    pub parent: Option<SectionId>,
    #[serde(default)]
    pub children: Vec<SectionId>,
}

impl Section {
    pub fn new(id: u32, section_type: SectionType, samples: Vec<Sample>) -> Self {
        Self {
            id: SectionId(id),
            section_type,
            samples,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn with_parent(mut self, parent: u32) -> Self {
        self.parent = Some(SectionId(parent));
        self
    }

    pub fn first(&self) -> Option<&Sample> {
        self.samples.first()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }

    pub fn is_axon(&self) -> bool {
        self.section_type == SectionType::Axon
    }

    pub fn length(&self) -> f32 {
        self.samples
            .windows(2)
            .map(|pair| pair[0].point().distance(pair[1].point()))
            .sum()
    }

    pub fn cumulative_lengths(&self) -> Vec<f32> {
        let mut total = 0.0;
        let mut out = Vec::with_capacity(self.samples.len());
        for (idx, sample) in self.samples.iter().enumerate() {
            if idx > 0 {
                total += self.samples[idx - 1].point().distance(sample.point());
            }
            out.push(total);
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Soma {
    pub centroid: [f32; 3],
    pub mean_radius: f32,
    #[serde(default)]
    pub children: Vec<SectionId>,
}

impl Soma {
    pub fn center(&self) -> Vec3 {
        Vec3::from(self.centroid)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Morphology {
    #[serde(default)]
    pub soma: Option<Soma>,
    #[serde(default)]
    pub sections: Vec<Section>,
}

impl Morphology {
    pub fn new(soma: Option<Soma>, sections: Vec<Section>) -> Self {
        Self { soma, sections }
    }

    pub fn section(&self, id: SectionId) -> Option<&Section> {
        self.sections.iter().find(|section| section.id == id)
    }

    pub fn neurites(&self) -> impl Iterator<Item = &Section> {
        self.sections
            .iter()
            .filter(|section| section.section_type != SectionType::Soma)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cumulative_lengths_follow_polyline() {
        let section = Section::new(
            0,
            SectionType::Dendrite,
            vec![
                Sample::new([0.0, 0.0, 0.0], 1.0),
                Sample::new([3.0, 4.0, 0.0], 1.0),
                Sample::new([3.0, 4.0, 2.0], 1.0),
            ],
        );
        let lengths = section.cumulative_lengths();
        assert_eq!(lengths.len(), 3);
        assert!((lengths[1] - 5.0).abs() < 1.0e-5);
        assert!((lengths[2] - 7.0).abs() < 1.0e-5);
        assert!((section.length() - 7.0).abs() < 1.0e-5);
    }

    #[test]
    fn neurites_skip_soma_sections() {
        let morphology = Morphology::new(
            None,
            vec![
                Section::new(0, SectionType::Soma, vec![Sample::new([0.0; 3], 3.0)]),
                Section::new(1, SectionType::Axon, vec![Sample::new([1.0, 0.0, 0.0], 1.0)]),
            ],
        );
        let ids: Vec<_> = morphology.neurites().map(|s| s.id).collect();
        assert_eq!(ids, vec![SectionId(1)]);
        assert!(morphology.section(SectionId(0)).is_some());
        assert!(morphology.section(SectionId(9)).is_none());
    }
}

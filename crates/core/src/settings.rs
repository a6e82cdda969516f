use serde::{Deserialize, Serialize};

use crate::morphology::SectionType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryQuality {
    Low,
    Medium,
    #[default]
    High,
}

impl GeometryQuality {
    /// Sample indices visited for a section of `len` samples. Always starts at
    /// the first sample and ends at the last one.
    pub fn sample_indices(self, len: usize) -> Vec<usize> {
        if len == 0 {
            return Vec::new();
        }
        let last = len - 1;
        let step = match self {
            GeometryQuality::Low => last.max(1),
            GeometryQuality::Medium => 2,
            GeometryQuality::High => 1,
        };
        let mut indices: Vec<usize> = (0..len).step_by(step).collect();
        if indices.last() != Some(&last) {
            indices.push(last);
        }
        indices
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SomaStrategy {
    PointAndCones,
    #[default]
    SdfFused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserDataPolicy {
    #[default]
    Index,
    DistanceToSoma,
    SimulationOffset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorScheme {
    #[default]
    None,
    SingleMaterial,
    ById,
    ByTarget,
    ByEtype,
    ByMtype,
    ByLayer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeighbourSaturation {
    Passes(usize),
    Converge,
}

impl Default for NeighbourSaturation {
    fn default() -> Self {
        NeighbourSaturation::Passes(4)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionTypeFilter {
    pub soma: bool,
    pub axon: bool,
    pub dendrite: bool,
    pub apical_dendrite: bool,
}

impl Default for SectionTypeFilter {
    fn default() -> Self {
        Self {
            soma: true,
            axon: true,
            dendrite: true,
            apical_dendrite: true,
        }
    }
}

impl SectionTypeFilter {
    pub fn allows(&self, section_type: SectionType) -> bool {
        match section_type {
            SectionType::Soma => self.soma,
            SectionType::Axon => self.axon,
            SectionType::Dendrite => self.dendrite,
            SectionType::ApicalDendrite => self.apical_dendrite,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
    pub geometry_quality: GeometryQuality,
    pub dampen_thickness: bool,
    pub radius_multiplier: f32,
    pub max_distance_to_soma: Option<f32>,
    pub section_types: SectionTypeFilter,
    pub soma_strategy: SomaStrategy,
    pub use_sdf_blending: bool,
    pub user_data: UserDataPolicy,
    pub color_scheme: ColorScheme,
    pub color_by_section_type: bool,
    pub neighbour_saturation: NeighbourSaturation,
    pub load_afferent_synapses: bool,
    pub load_efferent_synapses: bool,
    pub synapse_radius: f32,
    pub worker_threads: Option<usize>,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            geometry_quality: GeometryQuality::High,
            dampen_thickness: true,
            radius_multiplier: 1.0,
            max_distance_to_soma: None,
            section_types: SectionTypeFilter::default(),
            soma_strategy: SomaStrategy::SdfFused,
            use_sdf_blending: true,
            user_data: UserDataPolicy::Index,
            color_scheme: ColorScheme::None,
            color_by_section_type: true,
            neighbour_saturation: NeighbourSaturation::default(),
            load_afferent_synapses: false,
            load_efferent_synapses: false,
            synapse_radius: 1.0,
            worker_threads: None,
        }
    }
}

impl ImportSettings {
    pub fn effective_soma_strategy(&self) -> SomaStrategy {
        if self.use_sdf_blending {
            self.soma_strategy
        } else {
            SomaStrategy::PointAndCones
        }
    }

    pub fn distance_cutoff(&self) -> f32 {
        self.max_distance_to_soma.unwrap_or(f32::INFINITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_indices_per_quality() {
        assert_eq!(GeometryQuality::High.sample_indices(4), vec![0, 1, 2, 3]);
        assert_eq!(GeometryQuality::Medium.sample_indices(5), vec![0, 2, 4]);
        assert_eq!(GeometryQuality::Medium.sample_indices(4), vec![0, 2, 3]);
        assert_eq!(GeometryQuality::Low.sample_indices(6), vec![0, 5]);
        assert_eq!(GeometryQuality::Low.sample_indices(1), vec![0]);
        assert!(GeometryQuality::High.sample_indices(0).is_empty());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let settings: ImportSettings = serde_json::from_str(
            r#"{ "geometry_quality": "low", "neighbour_saturation": "converge" }"#,
        )
        .expect("parse settings");
        assert_eq!(settings.geometry_quality, GeometryQuality::Low);
        assert_eq!(settings.neighbour_saturation, NeighbourSaturation::Converge);
        assert!(settings.dampen_thickness);
        assert_eq!(settings.soma_strategy, SomaStrategy::SdfFused);
        assert!(settings.section_types.axon);
    }

    #[test]
    fn passes_saturation_parses() {
        let settings: ImportSettings =
            serde_json::from_str(r#"{ "neighbour_saturation": { "passes": 2 } }"#)
                .expect("parse settings");
        assert_eq!(settings.neighbour_saturation, NeighbourSaturation::Passes(2));
    }

    #[test]
    fn disabling_blending_forces_point_soma() {
        let settings = ImportSettings {
            use_sdf_blending: false,
            ..ImportSettings::default()
        };
        assert_eq!(settings.effective_soma_strategy(), SomaStrategy::PointAndCones);
    }
}

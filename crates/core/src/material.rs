use std::collections::BTreeSet;

use neurite_scene::MaterialId;
use serde::{Deserialize, Serialize};

use crate::morphology::SectionType;
use crate::settings::ColorScheme;

/// Scheme result meaning "the caller picks the bucket".
pub const NO_MATERIAL: MaterialId = MaterialId::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialElement {
    Soma,
    Section(SectionType),
    AfferentSynapse,
    EfferentSynapse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialPalette {
    pub materials_per_cell: usize,
    pub single_material: MaterialId,
    pub soma: usize,
    pub axon: usize,
    pub dendrite: usize,
    pub apical_dendrite: usize,
    pub afferent_synapse: usize,
    pub efferent_synapse: usize,
}

impl Default for MaterialPalette {
    fn default() -> Self {
        Self {
            materials_per_cell: 10,
            single_material: 0,
            soma: 1,
            axon: 2,
            dendrite: 3,
            apical_dendrite: 4,
            afferent_synapse: 5,
            efferent_synapse: 6,
        }
    }
}

impl MaterialPalette {
    pub fn element_offset(&self, element: MaterialElement) -> usize {
        match element {
            MaterialElement::Soma | MaterialElement::Section(SectionType::Soma) => self.soma,
            MaterialElement::Section(SectionType::Axon) => self.axon,
            MaterialElement::Section(SectionType::Dendrite) => self.dendrite,
            MaterialElement::Section(SectionType::ApicalDendrite) => self.apical_dendrite,
            MaterialElement::AfferentSynapse => self.afferent_synapse,
            MaterialElement::EfferentSynapse => self.efferent_synapse,
        }
    }
}

/// Per-cell categorical attributes, indexed by the cell's ordinal in the
/// processed GID set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CellAttributeTables {
    pub layers: Option<Vec<usize>>,
    pub etypes: Option<Vec<usize>>,
    pub mtypes: Option<Vec<usize>>,
    /// Exclusive end index of every loaded target, ascending.
    pub target_offsets: Option<Vec<usize>>,
    pub layer_names: Vec<String>,
    pub etype_names: Vec<String>,
    pub mtype_names: Vec<String>,
    pub target_names: Vec<String>,
}

impl CellAttributeTables {
    pub fn supports(&self, scheme: ColorScheme) -> bool {
        match scheme {
            ColorScheme::None | ColorScheme::SingleMaterial | ColorScheme::ById => true,
            ColorScheme::ByTarget => self.target_offsets.is_some(),
            ColorScheme::ByEtype => self.etypes.is_some(),
            ColorScheme::ByMtype => self.mtypes.is_some(),
            ColorScheme::ByLayer => self.layers.is_some(),
        }
    }

    fn values(&self, scheme: ColorScheme) -> Option<(&[usize], &[String])> {
        match scheme {
            ColorScheme::ByEtype => self.etypes.as_deref().map(|v| (v, self.etype_names.as_slice())),
            ColorScheme::ByMtype => self.mtypes.as_deref().map(|v| (v, self.mtype_names.as_slice())),
            ColorScheme::ByLayer => self.layers.as_deref().map(|v| (v, self.layer_names.as_slice())),
            _ => None,
        }
    }

    fn target_of(&self, index: usize) -> Option<usize> {
        self.target_offsets
            .as_ref()?
            .iter()
            .position(|&end| index < end)
    }
}

// Buckets past the id range are treated as unassigned.
fn bucket(stride: usize, value: usize) -> MaterialId {
    stride.checked_mul(value).unwrap_or(NO_MATERIAL)
}

pub fn assign_material(
    scheme: ColorScheme,
    index: usize,
    tables: &CellAttributeTables,
    palette: &MaterialPalette,
) -> MaterialId {
    let stride = palette.materials_per_cell;
    match scheme {
        ColorScheme::None => NO_MATERIAL,
        ColorScheme::SingleMaterial => palette.single_material,
        ColorScheme::ById => bucket(stride, index),
        ColorScheme::ByTarget => tables
            .target_of(index)
            .map_or(NO_MATERIAL, |target| bucket(stride, target)),
        ColorScheme::ByEtype | ColorScheme::ByMtype | ColorScheme::ByLayer => tables
            .values(scheme)
            .and_then(|(values, _)| values.get(index))
            .map_or(NO_MATERIAL, |&value| bucket(stride, value)),
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CellMaterials<'a> {
    base: MaterialId,
    by_element: bool,
    palette: &'a MaterialPalette,
}

impl<'a> CellMaterials<'a> {
    pub fn new(base: MaterialId, by_element: bool, palette: &'a MaterialPalette) -> Self {
        let base = if base == NO_MATERIAL { 0 } else { base };
        Self {
            base,
            by_element,
            palette,
        }
    }

    pub fn for_element(&self, element: MaterialElement) -> MaterialId {
        if self.by_element {
            self.base
                .checked_add(self.palette.element_offset(element))
                .unwrap_or(self.base)
        } else {
            self.base
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegendEntry {
    pub label: String,
    pub material: MaterialId,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MaterialLegend {
    pub scheme: ColorScheme,
    pub entries: Vec<LegendEntry>,
}

pub fn material_legend(
    scheme: ColorScheme,
    tables: &CellAttributeTables,
    palette: &MaterialPalette,
) -> MaterialLegend {
    let stride = palette.materials_per_cell;
    let entry = |names: &[String], value: usize| {
        let material = bucket(stride, value);
        (material != NO_MATERIAL).then(|| LegendEntry {
            label: names
                .get(value)
                .cloned()
                .unwrap_or_else(|| value.to_string()),
            material,
        })
    };
    let entries = match scheme {
        ColorScheme::None | ColorScheme::ById => Vec::new(),
        ColorScheme::SingleMaterial => vec![LegendEntry {
            label: "all".to_string(),
            material: palette.single_material,
        }],
        ColorScheme::ByTarget => tables
            .target_offsets
            .as_ref()
            .map(|offsets| {
                (0..offsets.len())
                    .filter_map(|target| entry(&tables.target_names, target))
                    .collect()
            })
            .unwrap_or_default(),
        ColorScheme::ByEtype | ColorScheme::ByMtype | ColorScheme::ByLayer => tables
            .values(scheme)
            .map(|(values, names)| {
                values
                    .iter()
                    .copied()
                    .collect::<BTreeSet<_>>()
                    .into_iter()
                    .filter_map(|value| entry(names, value))
                    .collect()
            })
            .unwrap_or_default(),
    };
    MaterialLegend { scheme, entries }
}

use std::collections::{BTreeMap, BTreeSet};

use neurite_scene::{Bounds, CellGeometry, MaterialId, SdfGeometry};

use crate::morphology::SectionId;

#[derive(Debug, Clone, Default)]
pub struct SdfMorphologyData {
    pub geometries: Vec<SdfGeometry>,
    pub neighbours: Vec<BTreeSet<usize>>,
    pub materials: Vec<MaterialId>,
    pub geometry_section: BTreeMap<usize, SectionId>,
    pub section_geometries: BTreeMap<SectionId, Vec<usize>>,
    pub bifurcation_indices: Vec<usize>,
    pub soma_links: Vec<(usize, SectionId)>,
    pub bounds: Bounds,
}

impl SdfMorphologyData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.geometries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.geometries.is_empty()
    }

    pub fn add_geometry(
        &mut self,
        geometry: SdfGeometry,
        neighbours: BTreeSet<usize>,
        material: MaterialId,
        section: Option<SectionId>,
    ) -> usize {
        let index = self.geometries.len();
        self.bounds.merge_point(geometry.primitive.p0());
        self.bounds.merge_point(geometry.primitive.p1());
        self.geometries.push(geometry);
        self.neighbours.push(BTreeSet::new());
        self.materials.push(material);
        if let Some(section) = section {
            self.geometry_section.insert(index, section);
            self.section_geometries.entry(section).or_default().push(index);
        }
        for neighbour in neighbours {
            self.connect(index, neighbour);
        }
        index
    }

    pub fn connect(&mut self, a: usize, b: usize) {
        if a == b || a >= self.neighbours.len() || b >= self.neighbours.len() {
            return;
        }
        self.neighbours[a].insert(b);
        self.neighbours[b].insert(a);
    }

    pub fn geometries_of(&self, section: SectionId) -> &[usize] {
        self.section_geometries
            .get(&section)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn into_cell_geometry(mut self, gid: u64) -> CellGeometry {
        let neighbours = self
            .neighbours
            .iter_mut()
            .enumerate()
            .map(|(index, set)| {
                set.remove(&index);
                set.iter().map(|&n| n as u32).collect()
            })
            .collect();
        CellGeometry {
            gid,
            geometries: self.geometries,
            materials: self.materials,
            neighbours,
            bounds: self.bounds,
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;

    #[test]
    fn section_maps_stay_inverse() {
        let mut data = SdfMorphologyData::new();
        let a = data.add_geometry(
            SdfGeometry::sphere(Vec3::ZERO, 1.0, 0),
            BTreeSet::new(),
            0,
            Some(SectionId(3)),
        );
        let soma = data.add_geometry(
            SdfGeometry::sphere(Vec3::X, 1.0, 0),
            BTreeSet::new(),
            0,
            None,
        );
        let b = data.add_geometry(
            SdfGeometry::pill(Vec3::ZERO, Vec3::Y, 1.0, 0),
            BTreeSet::from([a]),
            0,
            Some(SectionId(3)),
        );

        assert_eq!(data.geometries_of(SectionId(3)), &[a, b]);
        for (index, section) in &data.geometry_section {
            assert!(data.geometries_of(*section).contains(index));
        }
        assert!(!data.geometry_section.contains_key(&soma));
        assert!(data.neighbours[a].contains(&b));
        assert!(data.neighbours[b].contains(&a));
    }

    #[test]
    fn finalization_removes_self_references() {
        let mut data = SdfMorphologyData::new();
        let a = data.add_geometry(
            SdfGeometry::sphere(Vec3::ZERO, 1.0, 0),
            BTreeSet::new(),
            0,
            None,
        );
        data.neighbours[a].insert(a);
        let cell = data.into_cell_geometry(42);
        assert_eq!(cell.gid, 42);
        assert!(cell.neighbours[0].is_empty());
    }
}

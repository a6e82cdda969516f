use std::borrow::Borrow;
use std::collections::BTreeMap;

use glam::Vec3;

use crate::error::{ReconstructionError, ReconstructionResult};
use crate::morphology::{Section, SectionId};
use crate::sdf_data::SdfMorphologyData;
use crate::settings::NeighbourSaturation;
use crate::tree::MorphologyTreeStructure;

/// Completes the neighbour relation so the renderer blends every touching
/// joint: soma cones to their sections, bifurcations to parent and child
/// sections, then a transitive spread over the result.
pub fn resolve_neighbours<S: Borrow<Section>>(
    data: &mut SdfMorphologyData,
    sections: &[S],
    tree: &MorphologyTreeStructure,
    saturation: NeighbourSaturation,
) -> ReconstructionResult<()> {
    if tree.len() != sections.len() {
        return Err(ReconstructionError::TreeMismatch {
            tree: tree.len(),
            sections: sections.len(),
        });
    }
    connect_soma_links(data);
    connect_bifurcations(data, sections, tree)?;
    saturate(data, saturation);
    Ok(())
}

fn connect_soma_links(data: &mut SdfMorphologyData) {
    let links = std::mem::take(&mut data.soma_links);
    for &(soma_index, section) in &links {
        if let Some(&first) = data.geometries_of(section).first() {
            data.connect(soma_index, first);
        }
    }
    data.soma_links = links;
}

fn connect_bifurcations<S: Borrow<Section>>(
    data: &mut SdfMorphologyData,
    sections: &[S],
    tree: &MorphologyTreeStructure,
) -> ReconstructionResult<()> {
    let bifurcations: BTreeMap<SectionId, usize> = data
        .bifurcation_indices
        .iter()
        .filter_map(|&index| data.geometry_section.get(&index).map(|&s| (s, index)))
        .collect();

    for (parent, children) in tree.section_children.iter().enumerate() {
        if children.is_empty() {
            continue;
        }
        let parent_id = sections[parent].borrow().id;
        let Some(&bifurcation) = bifurcations.get(&parent_id) else {
            continue;
        };
        for &child in children {
            let child_section = sections
                .get(child)
                .ok_or(ReconstructionError::TreeMismatch {
                    tree: child + 1,
                    sections: sections.len(),
                })?;
            connect_touching(data, bifurcation, child_section.borrow().id);
        }
        connect_touching(data, bifurcation, parent_id);
    }
    Ok(())
}

fn connect_touching(data: &mut SdfMorphologyData, bifurcation: usize, section: SectionId) {
    let anchor = data.geometries[bifurcation].primitive;
    let candidates = data.geometries_of(section).to_vec();
    for index in candidates {
        if index == bifurcation {
            continue;
        }
        let primitive = data.geometries[index].primitive;
        let touches = |point: Vec3, radius: f32| {
            let reach = radius + anchor.r0();
            point.distance_squared(anchor.p0()) < reach * reach
        };
        if touches(primitive.p0(), primitive.r0()) || touches(primitive.p1(), primitive.r1()) {
            data.connect(bifurcation, index);
        }
    }
}

pub fn saturate(data: &mut SdfMorphologyData, saturation: NeighbourSaturation) {
    match saturation {
        NeighbourSaturation::Passes(passes) => {
            for _ in 0..passes {
                if !saturation_pass(data) {
                    break;
                }
            }
        }
        NeighbourSaturation::Converge => while saturation_pass(data) {},
    }
}

fn saturation_pass(data: &mut SdfMorphologyData) -> bool {
    let snapshot = data.neighbours.clone();
    let mut changed = false;
    for (i, direct) in snapshot.iter().enumerate() {
        for &j in direct {
            for &k in &snapshot[j] {
                if k == i {
                    continue;
                }
                changed |= data.neighbours[i].insert(k);
                changed |= data.neighbours[k].insert(i);
            }
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use neurite_scene::SdfGeometry;

    use super::*;
    use crate::morphology::{Sample, SectionType};

    fn chain(data: &mut SdfMorphologyData, length: usize) -> Vec<usize> {
        let mut indices = Vec::new();
        for i in 0..length {
            let previous: BTreeSet<usize> = indices.last().copied().into_iter().collect();
            indices.push(data.add_geometry(
                SdfGeometry::sphere(Vec3::new(i as f32, 0.0, 0.0), 0.6, 0),
                previous,
                0,
                None,
            ));
        }
        indices
    }

    fn assert_symmetric(data: &SdfMorphologyData) {
        for (i, set) in data.neighbours.iter().enumerate() {
            assert!(!set.contains(&i));
            for &j in set {
                assert!(data.neighbours[j].contains(&i), "{i} -> {j} is one-sided");
            }
        }
    }

    #[test]
    fn fixed_passes_spread_a_bounded_distance() {
        let mut data = SdfMorphologyData::new();
        chain(&mut data, 40);
        saturate(&mut data, NeighbourSaturation::Passes(1));
        assert!(data.neighbours[0].contains(&2));
        assert!(!data.neighbours[0].contains(&3));
        assert_symmetric(&data);

        saturate(&mut data, NeighbourSaturation::Passes(3));
        assert!(data.neighbours[0].contains(&16));
        assert!(!data.neighbours[0].contains(&17));
        assert_symmetric(&data);
    }

    #[test]
    fn convergence_reaches_full_closure() {
        let mut data = SdfMorphologyData::new();
        chain(&mut data, 40);
        saturate(&mut data, NeighbourSaturation::Converge);
        assert_eq!(data.neighbours[0].len(), 39);
        assert_symmetric(&data);
    }

    #[test]
    fn bifurcation_connects_touching_children() {
        let parent = Section::new(
            0,
            SectionType::Dendrite,
            vec![Sample::new([0.0, 0.0, 0.0], 1.0), Sample::new([10.0, 0.0, 0.0], 1.0)],
        );
        let near = Section::new(
            1,
            SectionType::Dendrite,
            vec![Sample::new([10.5, 0.0, 0.0], 1.0), Sample::new([20.0, 0.0, 0.0], 1.0)],
        );
        let far = Section::new(
            2,
            SectionType::Dendrite,
            vec![Sample::new([50.0, 0.0, 0.0], 1.0), Sample::new([60.0, 0.0, 0.0], 1.0)],
        );
        let sections = vec![parent, near, far];

        let mut data = SdfMorphologyData::new();
        let add = |data: &mut SdfMorphologyData, section: &Section, bifurcation: bool| {
            let a = section.samples[0].point();
            let b = section.samples[1].point();
            let pill = data.add_geometry(SdfGeometry::pill(a, b, 1.0, 0), BTreeSet::new(), 0, Some(section.id));
            let sphere = data.add_geometry(
                SdfGeometry::sphere(b, 1.0, 0),
                BTreeSet::from([pill]),
                0,
                Some(section.id),
            );
            if bifurcation {
                data.bifurcation_indices.push(sphere);
            }
        };
        for section in &sections {
            add(&mut data, section, true);
        }

        let tree = MorphologyTreeStructure {
            section_parent: vec![None, Some(0), Some(0)],
            section_children: vec![vec![1, 2], Vec::new(), Vec::new()],
            section_traverse_order: vec![0, 2, 1],
        };
        resolve_neighbours(&mut data, &sections, &tree, NeighbourSaturation::Passes(0))
            .expect("resolve");

        let bifurcation = 1;
        assert!(data.neighbours[bifurcation].contains(&2), "near child pill");
        assert!(data.neighbours[bifurcation].contains(&0), "own pill");
        assert!(!data.neighbours[bifurcation].contains(&4), "far child pill");
        assert_symmetric(&data);
    }

    #[test]
    fn distal_end_reach_uses_distal_radius() {
        let mut data = SdfMorphologyData::new();
        let anchor = data.add_geometry(SdfGeometry::sphere(Vec3::ZERO, 1.0, 0), BTreeSet::new(), 0, None);
        // Wide proximal end far away, thin distal end 2.5 from the anchor.
        let outside = data.add_geometry(
            SdfGeometry::cone_pill(Vec3::new(10.0, 0.0, 0.0), Vec3::new(2.5, 0.0, 0.0), 3.0, 1.0, 0),
            BTreeSet::new(),
            0,
            Some(SectionId(1)),
        );
        let inside = data.add_geometry(
            SdfGeometry::cone_pill(Vec3::new(0.0, 10.0, 0.0), Vec3::new(0.0, 1.5, 0.0), 3.0, 1.0, 0),
            BTreeSet::new(),
            0,
            Some(SectionId(1)),
        );
        connect_touching(&mut data, anchor, SectionId(1));
        assert!(!data.neighbours[anchor].contains(&outside));
        assert!(data.neighbours[anchor].contains(&inside));
        assert_symmetric(&data);
    }

    #[test]
    fn soma_links_join_first_section_primitive() {
        let mut data = SdfMorphologyData::new();
        let soma = data.add_geometry(SdfGeometry::sphere(Vec3::ZERO, 2.0, 0), BTreeSet::new(), 0, None);
        let first = data.add_geometry(
            SdfGeometry::pill(Vec3::X, Vec3::Y, 1.0, 0),
            BTreeSet::new(),
            0,
            Some(SectionId(4)),
        );
        data.soma_links.push((soma, SectionId(4)));
        data.soma_links.push((soma, SectionId(9)));
        let sections: Vec<Section> = Vec::new();
        resolve_neighbours(
            &mut data,
            &sections,
            &MorphologyTreeStructure::identity(0),
            NeighbourSaturation::default(),
        )
        .expect("resolve");
        assert!(data.neighbours[soma].contains(&first));
        assert_symmetric(&data);
    }

    #[test]
    fn mismatched_tree_is_rejected() {
        let mut data = SdfMorphologyData::new();
        let sections: Vec<Section> = Vec::new();
        let result = resolve_neighbours(
            &mut data,
            &sections,
            &MorphologyTreeStructure::identity(2),
            NeighbourSaturation::default(),
        );
        assert_eq!(
            result,
            Err(ReconstructionError::TreeMismatch { tree: 2, sections: 0 })
        );
    }
}

use std::collections::BTreeSet;

use neurite_scene::{MaterialId, SdfGeometry};

use crate::morphology::{Section, Soma};
use crate::sdf_data::SdfMorphologyData;
use crate::settings::SomaStrategy;

const MIN_CONE_LENGTH: f32 = 1.0e-6;

pub fn build_soma(
    data: &mut SdfMorphologyData,
    soma: &Soma,
    children: &[&Section],
    strategy: SomaStrategy,
    radius_multiplier: f32,
    material: MaterialId,
    user_data: u64,
) -> Vec<usize> {
    let radius = soma.mean_radius * radius_multiplier;
    match strategy {
        SomaStrategy::PointAndCones => {
            add_point_and_cones(data, soma, children, radius, radius_multiplier, material, user_data)
        }
        SomaStrategy::SdfFused => {
            let fused = add_fused(data, soma, children, radius, radius_multiplier, material, user_data);
            if fused.is_empty() {
                // Nothing to fuse with, keep the cell body visible.
                add_point_and_cones(data, soma, &[], radius, radius_multiplier, material, user_data)
            } else {
                fused
            }
        }
    }
}

fn add_point_and_cones(
    data: &mut SdfMorphologyData,
    soma: &Soma,
    children: &[&Section],
    radius: f32,
    radius_multiplier: f32,
    material: MaterialId,
    user_data: u64,
) -> Vec<usize> {
    let center = soma.center();
    let mut emitted = Vec::new();
    if radius <= 0.0 {
        return emitted;
    }
    emitted.push(data.add_geometry(
        SdfGeometry::sphere(center, radius, user_data),
        BTreeSet::new(),
        material,
        None,
    ));
    for child in children {
        let Some(first) = child.first() else {
            continue;
        };
        let child_radius = first.radius * radius_multiplier;
        if child_radius <= 0.0 || center.distance(first.point()) <= MIN_CONE_LENGTH {
            continue;
        }
        emitted.push(data.add_geometry(
            SdfGeometry::cone_pill(center, first.point(), radius, child_radius, user_data),
            BTreeSet::new(),
            material,
            None,
        ));
    }
    emitted
}

fn add_fused(
    data: &mut SdfMorphologyData,
    soma: &Soma,
    children: &[&Section],
    radius: f32,
    radius_multiplier: f32,
    material: MaterialId,
    user_data: u64,
) -> Vec<usize> {
    let center = soma.center();
    let mut emitted = Vec::new();
    if radius <= 0.0 {
        return emitted;
    }
    for child in children {
        let Some(first) = child.first() else {
            continue;
        };
        let child_radius = first.radius * radius_multiplier;
        if child_radius <= 0.0 || center.distance(first.point()) <= MIN_CONE_LENGTH {
            continue;
        }
        let index = data.add_geometry(
            SdfGeometry::cone_pill_sigmoid(center, first.point(), radius * 0.5, child_radius, user_data),
            BTreeSet::new(),
            material,
            None,
        );
        data.soma_links.push((index, child.id));
        emitted.push(index);
    }
    // The fused cones form one cell body, so they all blend together.
    for (position, &a) in emitted.iter().enumerate() {
        for &b in &emitted[position + 1..] {
            data.connect(a, b);
        }
    }
    emitted
}

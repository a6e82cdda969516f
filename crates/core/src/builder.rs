use std::collections::BTreeSet;

use glam::Vec3;
use neurite_scene::{MaterialId, SdfGeometry};
use tracing::warn;

use crate::error::ReconstructionResult;
use crate::morphology::Section;
use crate::offsets::SimulationOffsetMapper;
use crate::sdf_data::SdfMorphologyData;
use crate::settings::ImportSettings;

pub const MAX_RADIUS_CHANGE: f32 = 0.1;

/// Relative radius difference under which a segment is emitted as a pill.
pub const RADIUS_EPSILON: f32 = 1.0e-5;

const MIN_SEGMENT_LENGTH: f32 = 1.0e-6;

pub fn dampen_radius(previous: f32, raw: f32, segment_length: f32) -> f32 {
    let limit = MAX_RADIUS_CHANGE * segment_length;
    let delta = raw - previous;
    if delta.abs() > limit {
        previous + limit.copysign(delta)
    } else {
        raw
    }
}

pub fn radii_match(r0: f32, r1: f32) -> bool {
    (r0 - r1).abs() <= RADIUS_EPSILON * r0.max(r1)
}

pub fn segment_geometry(p0: Vec3, p1: Vec3, r0: f32, r1: f32, user_data: u64) -> SdfGeometry {
    if radii_match(r0, r1) {
        SdfGeometry::pill(p0, p1, r0.max(r1), user_data)
    } else {
        SdfGeometry::cone_pill(p0, p1, r0, r1, user_data)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SectionContext {
    pub material: MaterialId,
    pub start_distance: f32,
    pub parent_end_radius: Option<f32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SectionOutcome {
    pub end_radius: Option<f32>,
    pub emitted: usize,
    pub skipped: bool,
}

/// Emits the primitives of one section: a pill or cone-pill per visited sample
/// step and a sphere closing the section, which doubles as its bifurcation
/// primitive.
pub fn build_section(
    data: &mut SdfMorphologyData,
    section: &Section,
    context: &SectionContext,
    settings: &ImportSettings,
    mapper: &mut SimulationOffsetMapper<'_>,
) -> ReconstructionResult<SectionOutcome> {
    let samples = &section.samples;
    if samples.is_empty() {
        warn!(section = %section.id, "section has no samples, skipping");
        return Ok(SectionOutcome {
            skipped: true,
            ..SectionOutcome::default()
        });
    }

    let multiplier = settings.radius_multiplier;
    let cutoff = settings.distance_cutoff();
    let dampen = settings.dampen_thickness;
    let cumulative = section.cumulative_lengths();
    let indices = settings.geometry_quality.sample_indices(samples.len());

    let mut radius = samples[0].radius * multiplier;
    if dampen {
        if let Some(cap) = context.parent_end_radius {
            radius = radius.min(cap);
        }
    }

    let mut previous: Option<usize> = None;
    let mut emitted = 0;
    for step in indices.windows(2) {
        let (from, to) = (step[0], step[1]);
        let start = samples[from].point();
        let end = samples[to].point();
        let length = start.distance(end);
        let raw = samples[to].radius * multiplier;
        let next_radius = if dampen {
            dampen_radius(radius, raw, length)
        } else {
            raw
        };

        if context.start_distance + cumulative[to] > cutoff {
            radius = next_radius;
            continue;
        }
        if length > MIN_SEGMENT_LENGTH && radius > 0.0 && next_radius > 0.0 {
            let user_data = mapper.resolve(section, from, context.start_distance + cumulative[from])?;
            let geometry = segment_geometry(start, end, radius, next_radius, user_data);
            let index = data.add_geometry(
                geometry,
                previous.into_iter().collect(),
                context.material,
                Some(section.id),
            );
            previous = Some(index);
            emitted += 1;
        }
        radius = next_radius;
    }

    let last = indices[indices.len() - 1];
    let distance = context.start_distance + cumulative[last];
    if distance <= cutoff && radius > 0.0 {
        let user_data = mapper.resolve(section, last, distance)?;
        let index = data.add_geometry(
            SdfGeometry::sphere(samples[last].point(), radius, user_data),
            previous.into_iter().collect::<BTreeSet<_>>(),
            context.material,
            Some(section.id),
        );
        data.bifurcation_indices.push(index);
        emitted += 1;
    }

    Ok(SectionOutcome {
        end_radius: Some(radius),
        emitted,
        skipped: false,
    })
}

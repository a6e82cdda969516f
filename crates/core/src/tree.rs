use std::borrow::Borrow;

use glam::Vec3;

use crate::morphology::Section;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MorphologyTreeStructure {
    pub section_parent: Vec<Option<usize>>,
    pub section_children: Vec<Vec<usize>>,
    pub section_traverse_order: Vec<usize>,
}

impl MorphologyTreeStructure {
    pub fn identity(count: usize) -> Self {
        Self {
            section_parent: vec![None; count],
            section_children: vec![Vec::new(); count],
            section_traverse_order: (0..count).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.section_parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.section_parent.is_empty()
    }


    fn is_ancestor(&self, ancestor: usize, mut section: usize) -> bool {
        while let Some(parent) = self.section_parent[section] {
            if parent == ancestor {
                return true;
            }
            section = parent;
        }
        false
    }

    fn link(&mut self, parent: usize, child: usize) -> bool {
        if self.section_parent[child].is_some() || parent == child {
            return false;
        }
        // A link that would close a loop leaves the child as a root.
        if self.is_ancestor(child, parent) {
            return false;
        }
        self.section_parent[child] = Some(parent);
        self.section_children[parent].push(child);
        true
    }
}

#[derive(Debug, Clone, Copy)]
struct EndpointSphere {
    center: Vec3,
    radius: f32,
}

impl EndpointSphere {
    fn overlaps(&self, other: &EndpointSphere) -> bool {
        let reach = self.radius + other.radius;
        self.center.distance_squared(other.center) < reach * reach
    }
}

/// Infers which section continues which from overlapping end and begin
/// spheres. Without thickness dampening there is nothing to propagate between
/// sections, so sections keep their index order and have no parents.
pub fn analyze_tree<S: Borrow<Section>>(
    sections: &[S],
    dampen_thickness: bool,
    radius_multiplier: f32,
) -> MorphologyTreeStructure {
    let count = sections.len();
    if !dampen_thickness {
        return MorphologyTreeStructure::identity(count);
    }

    let mut begins: Vec<Option<EndpointSphere>> = Vec::with_capacity(count);
    let mut ends: Vec<Option<EndpointSphere>> = Vec::with_capacity(count);
    for section in sections {
        let section = section.borrow();
        let sphere = |sample: &crate::morphology::Sample| EndpointSphere {
            center: sample.point(),
            radius: sample.radius * radius_multiplier,
        };
        begins.push(section.first().map(sphere));
        ends.push(section.last().map(sphere));
    }

    let mut tree = MorphologyTreeStructure {
        section_parent: vec![None; count],
        section_children: vec![Vec::new(); count],
        section_traverse_order: Vec::with_capacity(count),
    };

    for i in 0..count {
        for j in (i + 1)..count {
            // j continues i
            if let (Some(end), Some(begin)) = (ends[i], begins[j]) {
                if begin.overlaps(&end) {
                    tree.link(i, j);
                }
            }
            // i continues j
            if let (Some(end), Some(begin)) = (ends[j], begins[i]) {
                if begin.overlaps(&end) {
                    tree.link(j, i);
                }
            }
        }
    }

    tree.section_traverse_order = traverse(&tree.section_parent, &tree.section_children);
    tree
}

fn traverse(parents: &[Option<usize>], children: &[Vec<usize>]) -> Vec<usize> {
    let count = parents.len();
    let mut visited = vec![false; count];
    let mut order = Vec::with_capacity(count);
    let mut stack: Vec<usize> = (0..count).filter(|&idx| parents[idx].is_none()).collect();

    loop {
        while let Some(section) = stack.pop() {
            if visited[section] {
                continue;
            }
            visited[section] = true;
            order.push(section);
            stack.extend(children[section].iter().copied());
        }
        match visited.iter().position(|seen| !seen) {
            Some(unreached) => {
                tracing::warn!(section = unreached, "section unreachable from roots, treating as root");
                stack.push(unreached);
            }
            None => break,
        }
    }
    order
}

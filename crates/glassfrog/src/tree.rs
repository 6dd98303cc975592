use std::collections::{HashMap, HashSet};

use crate::types::{CircleListing, CircleRecord};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CircleNode {
    pub id: i64,
    pub name: String,
    pub children: Vec<CircleNode>,
}

/// Builds the circle hierarchy from the supported-role links of a `/circles` listing.
///
/// A supported role whose `circle` link is null marks a top-level circle. Circles
/// missing from the listing are skipped and no circle appears twice.
pub fn build_circle_tree(listing: &CircleListing) -> Vec<CircleNode> {
    let circles: HashMap<i64, &CircleRecord> =
        listing.circles.iter().map(|circle| (circle.id, circle)).collect();

    let mut children: HashMap<Option<i64>, Vec<i64>> = HashMap::new();
    for supported_role in &listing.linked.supported_roles {
        if let Some(child) = supported_role.links.supporting_circle {
            children.entry(supported_role.links.circle).or_default().push(child);
        }
    }

    let mut visited = HashSet::new();
    build_level(None, &children, &circles, &mut visited)
}

fn build_level(
    parent: Option<i64>,
    children: &HashMap<Option<i64>, Vec<i64>>,
    circles: &HashMap<i64, &CircleRecord>,
    visited: &mut HashSet<i64>,
) -> Vec<CircleNode> {
    let Some(child_ids) = children.get(&parent) else {
        return Vec::new();
    };

    let mut nodes = Vec::with_capacity(child_ids.len());
    for id in child_ids {
        let Some(circle) = circles.get(id) else {
            continue;
        };
        if !visited.insert(*id) {
            continue;
        }
        nodes.push(CircleNode {
            id: *id,
            name: circle.name.clone(),
            children: build_level(Some(*id), children, circles, visited),
        });
    }
    nodes
}

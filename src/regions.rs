// Region analysis: directional open space behind each first step, area
// ranking, area centres and chokepoints.

use std::collections::{BTreeSet, HashMap};

use crate::graph::OpenGraph;
use crate::planner::distances_from;
use crate::types::Coord;

/// Connected components of the graph with the head removed, and which
/// component each first-step neighbour of the head falls into
#[derive(Debug, Clone, Default)]
pub struct DirectionalSpaces {
    entries: Vec<(Coord, Option<usize>)>,
    components: Vec<BTreeSet<Coord>>,
}

/// One distinct region, possibly reached through several first steps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Area<'a> {
    pub members: &'a BTreeSet<Coord>,
    pub entries: Vec<Coord>,
}

impl Area<'_> {
    pub fn size(&self) -> usize {
        self.members.len()
    }
}

impl DirectionalSpaces {
    /// First-step neighbours of the head, in graph neighbour order
    pub fn neighbors(&self) -> impl Iterator<Item = Coord> + '_ {
        self.entries.iter().map(|(n, _)| *n)
    }

    /// True when no neighbour leads into any component
    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(|(_, c)| c.is_none())
    }

    /// Size of the region behind `neighbor`; 0 when it leads nowhere
    pub fn size(&self, neighbor: Coord) -> usize {
        self.area(neighbor).map_or(0, |a| a.len())
    }

    pub fn area(&self, neighbor: Coord) -> Option<&BTreeSet<Coord>> {
        self.entries
            .iter()
            .find(|(n, _)| *n == neighbor)
            .and_then(|(_, c)| c.map(|idx| &self.components[idx]))
    }

    /// Distinct regions, largest first
    ///
    /// Neighbours sharing a component collapse into one area. Equal sizes keep
    /// the order in which their first neighbour was encountered.
    pub fn ranked_areas(&self) -> Vec<Area<'_>> {
        let mut order: Vec<usize> = Vec::new();
        let mut entries_by_comp: HashMap<usize, Vec<Coord>> = HashMap::new();

        for (neighbor, comp) in &self.entries {
            if let Some(idx) = comp {
                let list = entries_by_comp.entry(*idx).or_default();
                if list.is_empty() {
                    order.push(*idx);
                }
                list.push(*neighbor);
            }
        }

        let mut areas: Vec<Area<'_>> = order
            .into_iter()
            .map(|idx| Area {
                members: &self.components[idx],
                entries: entries_by_comp.remove(&idx).unwrap_or_default(),
            })
            .collect();

        // stable sort keeps encounter order among equal sizes
        areas.sort_by(|a, b| b.size().cmp(&a.size()));
        areas
    }
}

/// Removes `head` from a copy of the graph and records, for each graph
/// neighbour of `head`, the component it lands in
pub fn directional_spaces(graph: &OpenGraph, head: Coord) -> DirectionalSpaces {
    let _guard = crate::simple_profiler::ProfileGuard::new("regions");

    if !graph.contains(&head) {
        return DirectionalSpaces::default();
    }

    let remainder = graph.without(head);
    let components = remainder.components();

    let mut comp_of: HashMap<Coord, usize> = HashMap::new();
    for (idx, comp) in components.iter().enumerate() {
        for v in comp {
            comp_of.insert(*v, idx);
        }
    }

    let entries = graph
        .neighbors(head)
        .map(|n| (n, comp_of.get(&n).copied()))
        .collect();

    DirectionalSpaces {
        entries,
        components,
    }
}

/// Graph-theoretic centre of the subgraph induced on `area`
///
/// Among several minimum-eccentricity nodes the one nearest `head` (by path
/// distance in `graph`) wins, then the smallest coordinate. Returns `None` for
/// an empty or internally disconnected area.
pub fn area_center(graph: &OpenGraph, area: &BTreeSet<Coord>, head: Coord) -> Option<Coord> {
    let _guard = crate::simple_profiler::ProfileGuard::new("area_center");

    let sub = graph.induced(area);
    if sub.is_empty() {
        return None;
    }

    let mut best_ecc = usize::MAX;
    let mut centers = Vec::new();
    for v in sub.nodes() {
        let dist = distances_from(&sub, v);
        if dist.len() != sub.len() {
            return None;
        }
        let ecc = dist.values().copied().max().unwrap_or(0);
        if ecc < best_ecc {
            best_ecc = ecc;
            centers.clear();
            centers.push(v);
        } else if ecc == best_ecc {
            centers.push(v);
        }
    }

    let from_head = distances_from(graph, head);
    centers
        .into_iter()
        .min_by_key(|c| from_head.get(c).copied().unwrap_or(usize::MAX))
}

/// Articulation points of the open graph
pub fn chokepoint_candidates(graph: &OpenGraph) -> BTreeSet<Coord> {
    graph.articulation_points()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;
    use std::collections::HashSet;

    fn set(cells: &[(i32, i32)]) -> HashSet<Coord> {
        cells.iter().map(|&(x, y)| Coord::new(x, y)).collect()
    }

    #[test]
    fn test_open_board_single_area_shared_by_all_neighbors() {
        let grid = Grid::new(5, 5).unwrap();
        let head = Coord::new(2, 2);
        let g = OpenGraph::build(grid, &HashSet::new(), head);
        let spaces = directional_spaces(&g, head);

        for n in spaces.neighbors() {
            assert_eq!(spaces.size(n), 24);
        }

        let ranked = spaces.ranked_areas();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].entries.len(), 4);
    }

    #[test]
    fn test_head_in_doorway_splits_regions() {
        // Head sits in the doorway between a 2x3 room (left) and a 3x3 room (right)
        let grid = Grid::new(6, 3).unwrap();
        let occupied = set(&[(2, 0), (2, 2)]);
        let head = Coord::new(2, 1);
        let g = OpenGraph::build(grid, &occupied, head);
        let spaces = directional_spaces(&g, head);

        assert_eq!(spaces.size(Coord::new(1, 1)), 6);
        assert_eq!(spaces.size(Coord::new(3, 1)), 9);

        let ranked = spaces.ranked_areas();
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].size(), 9);
        assert_eq!(ranked[0].entries, vec![Coord::new(3, 1)]);
        assert_eq!(ranked[1].size(), 6);
    }

    #[test]
    fn test_non_neighbor_has_size_zero() {
        let grid = Grid::new(3, 3).unwrap();
        let head = Coord::new(0, 0);
        let g = OpenGraph::build(grid, &HashSet::new(), head);
        let spaces = directional_spaces(&g, head);
        assert_eq!(spaces.size(Coord::new(2, 2)), 0);
        assert!(spaces.area(Coord::new(2, 2)).is_none());
    }

    #[test]
    fn test_head_outside_graph_yields_empty() {
        let grid = Grid::new(3, 3).unwrap();
        let g = OpenGraph::build(grid, &HashSet::new(), Coord::new(0, 0));
        let spaces = directional_spaces(&g, Coord::new(7, 7));
        assert!(spaces.is_empty());
        assert!(spaces.ranked_areas().is_empty());
    }

    #[test]
    fn test_area_center_of_odd_square() {
        let grid = Grid::new(5, 5).unwrap();
        let g = OpenGraph::build(grid, &HashSet::new(), Coord::new(0, 0));
        let area: BTreeSet<Coord> = g.nodes().collect();
        assert_eq!(area_center(&g, &area, Coord::new(0, 0)), Some(Coord::new(2, 2)));
    }

    #[test]
    fn test_area_center_prefers_closest_to_head() {
        // 4x1 corridor has two centres, (1,0) and (2,0)
        let grid = Grid::new(4, 1).unwrap();
        let head = Coord::new(3, 0);
        let g = OpenGraph::build(grid, &HashSet::new(), head);
        let area: BTreeSet<Coord> = g.nodes().collect();
        assert_eq!(area_center(&g, &area, head), Some(Coord::new(2, 0)));
    }

    #[test]
    fn test_area_center_degenerate() {
        let grid = Grid::new(5, 5).unwrap();
        let g = OpenGraph::build(grid, &HashSet::new(), Coord::new(0, 0));
        assert_eq!(area_center(&g, &BTreeSet::new(), Coord::new(0, 0)), None);

        let split: BTreeSet<Coord> = [Coord::new(0, 0), Coord::new(4, 4)].into_iter().collect();
        assert_eq!(area_center(&g, &split, Coord::new(0, 0)), None);
    }

    #[test]
    fn test_chokepoints_are_articulation_points() {
        let grid = Grid::new(5, 3).unwrap();
        let occupied = set(&[(2, 0), (2, 2)]);
        let g = OpenGraph::build(grid, &occupied, Coord::new(0, 0));
        let points = chokepoint_candidates(&g);
        assert_eq!(points.into_iter().collect::<Vec<_>>(), vec![Coord::new(2, 1)]);
    }
}

// Open-cell graph for a single turn
//
// Nodes are the traversable cells of the board; edges are implicit 4-neighbour
// adjacency restricted to the node set. A graph is built fresh every turn and
// dropped with the decision, so nothing here is ever shared or mutated in place.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::grid::Grid;
use crate::types::Coord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenGraph {
    grid: Grid,
    nodes: BTreeSet<Coord>,
}

impl OpenGraph {
    /// All in-bounds cells minus `occupied`, with `head` forced present
    pub fn build(grid: Grid, occupied: &HashSet<Coord>, head: Coord) -> Self {
        Self::build_with_origins(grid, occupied, &[head])
    }

    /// Like [`OpenGraph::build`] but forcing several search origins in
    pub fn build_with_origins(grid: Grid, occupied: &HashSet<Coord>, origins: &[Coord]) -> Self {
        let mut nodes: BTreeSet<Coord> = grid.cells().filter(|c| !occupied.contains(c)).collect();
        nodes.extend(origins.iter().copied().filter(|c| grid.contains(c)));
        OpenGraph { grid, nodes }
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    pub fn contains(&self, coord: &Coord) -> bool {
        self.nodes.contains(coord)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = Coord> + '_ {
        self.nodes.iter().copied()
    }

    /// Graph neighbours of `coord` in `Direction::all()` order
    pub fn neighbors(&self, coord: Coord) -> impl Iterator<Item = Coord> + '_ {
        self.grid.neighbors(coord).filter(move |n| self.nodes.contains(n))
    }

    pub fn degree(&self, coord: Coord) -> usize {
        if !self.contains(&coord) {
            return 0;
        }
        self.neighbors(coord).count()
    }

    /// Copy of this graph with `coord` removed
    pub fn without(&self, coord: Coord) -> OpenGraph {
        let mut nodes = self.nodes.clone();
        nodes.remove(&coord);
        OpenGraph {
            grid: self.grid,
            nodes,
        }
    }

    /// Subgraph induced on the members of `area` that are nodes of this graph
    pub fn induced(&self, area: &BTreeSet<Coord>) -> OpenGraph {
        OpenGraph {
            grid: self.grid,
            nodes: self.nodes.intersection(area).copied().collect(),
        }
    }

    /// Connected component containing `start`, or `None` if it is not a node
    pub fn component_of(&self, start: Coord) -> Option<BTreeSet<Coord>> {
        if !self.contains(&start) {
            return None;
        }

        let mut seen = BTreeSet::new();
        let mut stack = vec![start];
        seen.insert(start);

        while let Some(current) = stack.pop() {
            for next in self.neighbors(current) {
                if seen.insert(next) {
                    stack.push(next);
                }
            }
        }

        Some(seen)
    }

    /// All connected components, ordered by their smallest member
    pub fn components(&self) -> Vec<BTreeSet<Coord>> {
        let mut assigned: HashSet<Coord> = HashSet::with_capacity(self.nodes.len());
        let mut components = Vec::new();

        for node in self.nodes() {
            if assigned.contains(&node) {
                continue;
            }
            if let Some(component) = self.component_of(node) {
                assigned.extend(component.iter().copied());
                components.push(component);
            }
        }

        components
    }

    /// Nodes whose removal increases the number of connected components
    ///
    /// Hopcroft-Tarjan lowpoint computation, iterative so large boards cannot
    /// exhaust the stack.
    pub fn articulation_points(&self) -> BTreeSet<Coord> {
        let mut discovery: BTreeMap<Coord, usize> = BTreeMap::new();
        let mut low: BTreeMap<Coord, usize> = BTreeMap::new();
        let mut points = BTreeSet::new();
        let mut clock = 0;

        for root in self.nodes() {
            if discovery.contains_key(&root) {
                continue;
            }

            discovery.insert(root, clock);
            low.insert(root, clock);
            clock += 1;

            let mut root_children = 0;
            // (node, parent, remaining neighbours to visit)
            let mut stack: Vec<(Coord, Option<Coord>, Vec<Coord>)> =
                vec![(root, None, self.neighbors(root).collect())];

            while let Some((node, parent, pending)) = stack.last_mut() {
                let node = *node;
                let parent = *parent;

                if let Some(next) = pending.pop() {
                    if Some(next) == parent {
                        continue;
                    }
                    match discovery.get(&next) {
                        Some(&seen_at) => {
                            let entry = low.entry(node).or_insert(seen_at);
                            *entry = (*entry).min(seen_at);
                        }
                        None => {
                            discovery.insert(next, clock);
                            low.insert(next, clock);
                            clock += 1;
                            if node == root {
                                root_children += 1;
                            }
                            stack.push((next, Some(node), self.neighbors(next).collect()));
                        }
                    }
                    continue;
                }

                stack.pop();
                if let Some(parent) = parent {
                    let child_low = low[&node];
                    let parent_low = low.entry(parent).or_insert(child_low);
                    *parent_low = (*parent_low).min(child_low);

                    if parent != root && child_low >= discovery[&parent] {
                        points.insert(parent);
                    }
                }
            }

            if root_children > 1 {
                points.insert(root);
            }
        }

        points
    }
}

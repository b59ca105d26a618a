// Path planning over the open graph
//
// `astar` is generic over the node type and takes the neighbourhood, cost,
// heuristic and goal test as closures, so callers plug in whatever graph view
// they need without a search trait.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, VecDeque};
use std::hash::Hash;

use crate::graph::OpenGraph;
use crate::types::Coord;

/// A* search returning the path (start and goal inclusive) and its cost
///
/// # Arguments
/// * `start` - Search origin
/// * `successors` - Neighbours of a node paired with the edge cost
/// * `heuristic` - Admissible estimate of the remaining cost
/// * `success` - Goal test
///
/// Ties on `f` are broken by lower `g` and then by push order, which keeps the
/// result deterministic for a deterministic successor order.
pub fn astar<N, FN, IN, FH, FS>(
    start: N,
    mut successors: FN,
    mut heuristic: FH,
    mut success: FS,
) -> Option<(Vec<N>, u32)>
where
    N: Copy + Eq + Hash,
    FN: FnMut(&N) -> IN,
    IN: IntoIterator<Item = (N, u32)>,
    FH: FnMut(&N) -> u32,
    FS: FnMut(&N) -> bool,
{
    let _guard = crate::simple_profiler::ProfileGuard::new("path_search");

    let mut nodes: Vec<N> = vec![start];
    let mut index_of: HashMap<N, usize> = HashMap::new();
    index_of.insert(start, 0);

    let mut best_g: Vec<u32> = vec![0];
    let mut parent: Vec<Option<usize>> = vec![None];
    let mut closed: Vec<bool> = vec![false];

    let mut open = BinaryHeap::new();
    let mut pushes: usize = 0;
    open.push(Reverse((heuristic(&start), 0u32, pushes, 0usize)));

    while let Some(Reverse((_, g, _, idx))) = open.pop() {
        if closed[idx] || g > best_g[idx] {
            continue;
        }
        closed[idx] = true;

        let node = nodes[idx];
        if success(&node) {
            let mut path = vec![node];
            let mut cursor = parent[idx];
            while let Some(p) = cursor {
                path.push(nodes[p]);
                cursor = parent[p];
            }
            path.reverse();
            return Some((path, g));
        }

        for (next, cost) in successors(&node) {
            let tentative = g + cost;
            let next_idx = match index_of.get(&next) {
                Some(&i) => {
                    if closed[i] || tentative >= best_g[i] {
                        continue;
                    }
                    best_g[i] = tentative;
                    parent[i] = Some(idx);
                    i
                }
                None => {
                    let i = nodes.len();
                    nodes.push(next);
                    index_of.insert(next, i);
                    best_g.push(tentative);
                    parent.push(Some(idx));
                    closed.push(false);
                    i
                }
            };

            pushes += 1;
            open.push(Reverse((
                tentative + heuristic(&next),
                tentative,
                pushes,
                next_idx,
            )));
        }
    }

    None
}

/// Shortest path from `start` to `goal` over the open graph, both inclusive
///
/// Unit edge costs with a Manhattan heuristic. Returns `None` when either end
/// is not a node or the two lie in different components.
pub fn shortest_path(graph: &OpenGraph, start: Coord, goal: Coord) -> Option<Vec<Coord>> {
    if !graph.contains(&start) || !graph.contains(&goal) {
        return None;
    }

    astar(
        start,
        |c| graph.neighbors(*c).map(|n| (n, 1)).collect::<Vec<_>>(),
        |c| c.manhattan(&goal) as u32,
        |c| *c == goal,
    )
    .map(|(path, _)| path)
}

/// Breadth-first distances from `source` to every reachable node
pub fn distances_from(graph: &OpenGraph, source: Coord) -> HashMap<Coord, usize> {
    let mut dist = HashMap::new();
    if !graph.contains(&source) {
        return dist;
    }

    dist.insert(source, 0);
    let mut queue = VecDeque::from([source]);
    while let Some(current) = queue.pop_front() {
        let d = dist[&current];
        for next in graph.neighbors(current) {
            if !dist.contains_key(&next) {
                dist.insert(next, d + 1);
                queue.push_back(next);
            }
        }
    }

    dist
}

/// First step (the node after `start`) of the shortest path to `goal`
pub fn first_step(graph: &OpenGraph, start: Coord, goal: Coord) -> Option<Coord> {
    shortest_path(graph, start, goal).and_then(|path| path.get(1).copied())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;
    use std::collections::HashSet;

    fn open(w: i32, h: i32, blocked: &[(i32, i32)]) -> OpenGraph {
        let occupied: HashSet<Coord> = blocked.iter().map(|&(x, y)| Coord::new(x, y)).collect();
        OpenGraph::build(Grid::new(w, h).unwrap(), &occupied, Coord::new(0, 0))
    }

    #[test]
    fn test_straight_line_path() {
        let g = open(5, 5, &[]);
        let path = shortest_path(&g, Coord::new(0, 0), Coord::new(0, 4)).unwrap();
        assert_eq!(path.len(), 5);
        assert_eq!(path.first(), Some(&Coord::new(0, 0)));
        assert_eq!(path.last(), Some(&Coord::new(0, 4)));
    }

    #[test]
    fn test_path_around_wall() {
        // Wall at x=1 for y in 0..=3; must detour through (1,4)
        let g = open(3, 5, &[(1, 0), (1, 1), (1, 2), (1, 3)]);
        let path = shortest_path(&g, Coord::new(0, 0), Coord::new(2, 0)).unwrap();
        assert_eq!(path.len() - 1, 10);
        assert!(path.contains(&Coord::new(1, 4)));
        for pair in path.windows(2) {
            assert_eq!(pair[0].manhattan(&pair[1]), 1);
            assert!(g.contains(&pair[1]));
        }
    }

    #[test]
    fn test_no_path_between_components() {
        let g = open(3, 3, &[(1, 0), (1, 1), (1, 2)]);
        assert_eq!(shortest_path(&g, Coord::new(0, 0), Coord::new(2, 2)), None);
        assert_eq!(first_step(&g, Coord::new(0, 0), Coord::new(2, 2)), None);
    }

    #[test]
    fn test_goal_not_in_graph() {
        let g = open(3, 3, &[(2, 2)]);
        assert_eq!(shortest_path(&g, Coord::new(0, 0), Coord::new(2, 2)), None);
    }

    #[test]
    fn test_path_to_self() {
        let g = open(3, 3, &[]);
        let path = shortest_path(&g, Coord::new(1, 1), Coord::new(1, 1)).unwrap();
        assert_eq!(path, vec![Coord::new(1, 1)]);
        assert_eq!(first_step(&g, Coord::new(1, 1), Coord::new(1, 1)), None);
    }

    #[test]
    fn test_distances_from_corner() {
        let g = open(3, 3, &[]);
        let d = distances_from(&g, Coord::new(0, 0));
        assert_eq!(d.len(), 9);
        assert_eq!(d[&Coord::new(2, 2)], 4);
        assert_eq!(d[&Coord::new(0, 0)], 0);
    }

    #[test]
    fn test_distances_from_missing_source() {
        let g = open(3, 3, &[(1, 1)]);
        assert!(distances_from(&g, Coord::new(1, 1)).is_empty());
    }

    #[test]
    fn test_astar_with_weighted_edges() {
        // Line 0-1-2 where the direct hop 0->2 costs 5 and two unit hops cost 2
        let edges = |n: &u8| -> Vec<(u8, u32)> {
            match n {
                0 => vec![(2, 5), (1, 1)],
                1 => vec![(2, 1)],
                _ => vec![],
            }
        };
        let (path, cost) = astar(0u8, edges, |_| 0, |n| *n == 2).unwrap();
        assert_eq!(path, vec![0, 1, 2]);
        assert_eq!(cost, 2);
    }
}

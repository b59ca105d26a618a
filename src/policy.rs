// Move selection policy
//
// A strict fallback chain evaluated once per turn:
//   1. no legal move        -> fixed fallback direction
//   2. hazard filtering     -> candidate set (never emptied)
//   3. hungry foraging      -> nearest food inside the largest region
//   4. trap pursuit         -> chokepoint we win the race to
//   5. space maximisation   -> centre of the largest, then second region
//   6. local tie-break      -> our space minus weighted opponent space
//
// Everything is rebuilt from the board on every call; the only input besides
// the board is the random source used for fully tied candidates.

use log::debug;
use rand::seq::IndexedRandom;
use rand::Rng;
use serde_json::{json, Value};
use std::collections::HashSet;

use crate::config::PolicyConfig;
use crate::error::EngineError;
use crate::extract::{BoardView, Opponent};
use crate::graph::OpenGraph;
use crate::grid::Grid;
use crate::planner::{distances_from, first_step};
use crate::regions::{area_center, chokepoint_candidates, directional_spaces, DirectionalSpaces};
use crate::types::{Board, Coord, Direction};

/// Direction returned when no neighbouring cell is open
pub const FALLBACK_DIRECTION: Direction = Direction::Up;

/// The stage of the fallback chain that produced a move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    NoLegalMove,
    /// The decision task missed the response budget or failed; the fallback
    /// direction was sent
    Timeout,
    Forage,
    Trap,
    LargestArea,
    SecondArea,
    SpaceDelta,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::NoLegalMove => "no_legal_move",
            Stage::Timeout => "timeout",
            Stage::Forage => "forage",
            Stage::Trap => "trap",
            Stage::LargestArea => "largest_area",
            Stage::SecondArea => "second_area",
            Stage::SpaceDelta => "space_delta",
        }
    }
}

/// The single externally visible result of a turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveDecision {
    pub direction: Direction,
    pub stage: Stage,
    pub shout: Option<String>,
}

impl MoveDecision {
    pub fn with_shout(mut self, shout: impl Into<String>) -> Self {
        self.shout = Some(shout.into());
        self
    }

    /// Body of the POST /move response
    pub fn to_response(&self) -> Value {
        match &self.shout {
            Some(shout) => json!({ "move": self.direction.as_str(), "shout": shout }),
            None => json!({ "move": self.direction.as_str() }),
        }
    }
}

/// Everything the selector needs about one turn, extracted from the board
#[derive(Debug, Clone)]
pub struct TurnContext {
    pub grid: Grid,
    pub head: Coord,
    /// Snake bodies, our own head excluded, opponent halos not added
    pub blocked: HashSet<Coord>,
    pub food: Vec<Coord>,
    pub hungry: bool,
    /// Nearest opponent, used for hunger, trap and space scoring
    pub opponent: Option<Opponent>,
    pub hazards: HashSet<Coord>,
}

impl TurnContext {
    pub fn from_view(view: &BoardView<'_>, policy: &PolicyConfig) -> Self {
        let head = view.head();
        let opponent = view.nearest_opponent();
        let their_length = opponent
            .as_ref()
            .map(|o| o.length)
            .unwrap_or_else(|| view.opponent_lengths()[0]);

        TurnContext {
            grid: view.grid(),
            head,
            blocked: view.occupied(true),
            food: view.food(),
            hungry: policy.is_hungry(view.health(), view.length(), their_length),
            hazards: hazard_cells(
                view.grid(),
                head,
                view.length(),
                &view.opponents(),
                policy,
            ),
            opponent,
        }
    }
}

/// Opponent heads and every cell they could step into next turn, for each
/// opponent whose head is within the threat radius of ours
pub fn hazard_cells(
    grid: Grid,
    my_head: Coord,
    my_length: i32,
    opponents: &[Opponent],
    policy: &PolicyConfig,
) -> HashSet<Coord> {
    let mut hazards = HashSet::new();
    for opponent in opponents {
        let radius = policy.threat_radius(my_length, opponent.length);
        if my_head.manhattan(&opponent.head) > radius {
            continue;
        }
        hazards.insert(opponent.head);
        hazards.extend(grid.neighbors(opponent.head));
    }
    hazards
}

/// Legal moves minus hazards, or all legal moves if that leaves nothing
pub fn safe_candidates(legal: &[Coord], hazards: &HashSet<Coord>) -> Vec<Coord> {
    let safe: Vec<Coord> = legal
        .iter()
        .copied()
        .filter(|c| !hazards.contains(c))
        .collect();
    if safe.is_empty() {
        legal.to_vec()
    } else {
        safe
    }
}

pub struct MoveSelector<'p> {
    policy: &'p PolicyConfig,
}

impl<'p> MoveSelector<'p> {
    pub fn new(policy: &'p PolicyConfig) -> Self {
        MoveSelector { policy }
    }

    /// Picks the next cell for our head, with the stage that chose it
    ///
    /// Returns `None` only when the head has no open neighbour at all.
    pub fn choose_next_step<R: Rng + ?Sized>(
        &self,
        ctx: &TurnContext,
        rng: &mut R,
    ) -> Option<(Coord, Stage)> {
        let head = ctx.head;
        let graph = {
            let _guard = crate::simple_profiler::ProfileGuard::new("graph_build");
            OpenGraph::build(ctx.grid, &ctx.blocked, head)
        };

        let legal: Vec<Coord> = graph.neighbors(head).collect();
        if legal.is_empty() {
            return None;
        }

        let safe = safe_candidates(&legal, &ctx.hazards);
        debug!("legal {:?}, safe {:?}", legal, safe);

        let spaces = directional_spaces(&graph, head);
        let ranked = spaces.ranked_areas();
        // every legal neighbour lies in some area, so this only guards indexing
        let Some(largest) = ranked.first() else {
            return self
                .space_delta_choice(ctx, &graph, &safe, rng)
                .map(|step| (step, Stage::SpaceDelta));
        };

        if ctx.hungry {
            if let Some(step) = self.forage(ctx, &graph, &spaces, largest.size(), &safe) {
                return Some((step, Stage::Forage));
            }
        }

        if self.policy.trap_enabled {
            if let Some(door) = self.trap_target(ctx) {
                debug!("trap door at {:?}", door);
                if let Some(step) = step_toward(&graph, head, &safe, door) {
                    return Some((step, Stage::Trap));
                }
            }
        }

        // next to the centre already counts as being there
        if let Some(center) = area_center(&graph, largest.members, head) {
            if head.manhattan(&center) > 1 {
                if let Some(step) = step_toward(&graph, head, &safe, center) {
                    return Some((step, Stage::LargestArea));
                }
            }
        }

        if let Some(second) = ranked.get(1) {
            if let Some(center) = area_center(&graph, second.members, head) {
                if let Some(step) = step_toward(&graph, head, &safe, center) {
                    return Some((step, Stage::SecondArea));
                }
            }
        }

        self.space_delta_choice(ctx, &graph, &safe, rng)
            .map(|step| (step, Stage::SpaceDelta))
    }

    /// Nearest food lying in a region of maximum size
    fn forage(
        &self,
        ctx: &TurnContext,
        graph: &OpenGraph,
        spaces: &DirectionalSpaces,
        max_size: usize,
        safe: &[Coord],
    ) -> Option<Coord> {
        if ctx.food.is_empty() {
            return None;
        }

        let from_head = distances_from(graph, ctx.head);
        let mut best: Option<(Coord, Coord, usize)> = None;

        for entry in spaces.neighbors() {
            if spaces.size(entry) != max_size {
                continue;
            }
            let Some(area) = spaces.area(entry) else {
                continue;
            };
            for food in ctx.food.iter().filter(|f| area.contains(f)) {
                if let Some(&d) = from_head.get(food) {
                    if best.map_or(true, |(_, _, best_d)| d < best_d) {
                        best = Some((*food, entry, d));
                    }
                }
            }
        }

        let (food, entry, _) = best?;
        debug!("foraging toward {:?} via {:?}", food, entry);
        step_toward(graph, ctx.head, safe, food).or_else(|| safe.contains(&entry).then_some(entry))
    }

    /// Chokepoint we reach strictly before the opponent whose removal leaves
    /// the opponent fewer cells than its length plus the trap margin
    fn trap_target(&self, ctx: &TurnContext) -> Option<Coord> {
        let opponent = ctx.opponent.as_ref()?;
        let _guard = crate::simple_profiler::ProfileGuard::new("trap_search");

        let graph = OpenGraph::build_with_origins(ctx.grid, &ctx.blocked, &[ctx.head, opponent.head]);
        let ours = distances_from(&graph, ctx.head);
        let theirs = distances_from(&graph, opponent.head);
        let limit = opponent.length.max(0) as usize + self.policy.trap_margin;

        let mut best: Option<(Coord, usize)> = None;
        for door in chokepoint_candidates(&graph) {
            if door == ctx.head || door == opponent.head {
                continue;
            }
            let (Some(&ours_d), Some(&theirs_d)) = (ours.get(&door), theirs.get(&door)) else {
                continue;
            };
            if ours_d >= theirs_d {
                continue;
            }

            let confined = graph
                .without(door)
                .component_of(opponent.head)
                .map_or(0, |c| c.len());
            if confined < limit && best.map_or(true, |(_, d)| ours_d < d) {
                best = Some((door, ours_d));
            }
        }

        best.map(|(door, _)| door)
    }

    /// Candidate maximising our remaining space minus weighted opponent space
    ///
    /// Ties go to more open neighbours, then to distance from the opponent
    /// head, then to the random source.
    fn space_delta_choice<R: Rng + ?Sized>(
        &self,
        ctx: &TurnContext,
        graph: &OpenGraph,
        candidates: &[Coord],
        rng: &mut R,
    ) -> Option<Coord> {
        let _guard = crate::simple_profiler::ProfileGuard::new("space_delta");

        let without_head = graph.without(ctx.head);
        let opponent_head = ctx.opponent.as_ref().map(|o| o.head);

        let scored: Vec<(Coord, f64, usize, i32)> = candidates
            .iter()
            .map(|&next| {
                let (ours, theirs) = space_after_move(ctx, next, opponent_head);
                let score = ours as f64 - self.policy.opponent_space_weight * theirs as f64;
                let away = opponent_head.map_or(0, |o| next.manhattan(&o));
                (next, score, without_head.degree(next), away)
            })
            .collect();

        let best = scored.iter().max_by(|a, b| {
            a.1.total_cmp(&b.1)
                .then(a.2.cmp(&b.2))
                .then(a.3.cmp(&b.3))
        })?;

        let tied: Vec<Coord> = scored
            .iter()
            .filter(|s| s.1 == best.1 && s.2 == best.2 && s.3 == best.3)
            .map(|s| s.0)
            .collect();
        tied.choose(rng).copied()
    }
}

/// Sizes of our and the opponent's components once our head has moved to
/// `next` (the old head becoming body)
fn space_after_move(ctx: &TurnContext, next: Coord, opponent_head: Option<Coord>) -> (usize, usize) {
    let mut blocked = ctx.blocked.clone();
    blocked.insert(ctx.head);
    blocked.insert(next);

    let mut origins = vec![next];
    origins.extend(opponent_head);
    let after = OpenGraph::build_with_origins(ctx.grid, &blocked, &origins);

    let ours = after.component_of(next).map_or(0, |c| c.len());
    let theirs = opponent_head
        .and_then(|o| after.component_of(o))
        .map_or(0, |c| c.len());
    (ours, theirs)
}

/// First step toward `target`, restricted to `safe` candidates
///
/// Takes the shortest path's first step when it is safe, otherwise the safe
/// candidate closest to the target by graph distance. Returns `None` when no
/// safe candidate is strictly closer to the target than `head` itself.
pub fn step_toward(graph: &OpenGraph, head: Coord, safe: &[Coord], target: Coord) -> Option<Coord> {
    if !graph.contains(&target) || !graph.contains(&head) {
        return None;
    }

    if let Some(step) = first_step(graph, head, target) {
        if safe.contains(&step) {
            return Some(step);
        }
    }

    let to_target = distances_from(graph, target);
    let from_head = *to_target.get(&head)?;
    safe.iter()
        .filter_map(|c| to_target.get(c).map(|d| (*c, *d)))
        .filter(|(_, d)| *d < from_head)
        .min_by_key(|(_, d)| *d)
        .map(|(c, _)| c)
}

/// Decides our move for one turn
///
/// Pure with respect to the board: the same board, policy and random source
/// state always give the same decision.
///
/// # Errors
/// Propagates malformed-board errors from [`BoardView::new`].
pub fn decide<R: Rng + ?Sized>(
    board: &Board,
    you_id: &str,
    policy: &PolicyConfig,
    rng: &mut R,
) -> Result<MoveDecision, EngineError> {
    let view = BoardView::new(board, you_id)?;
    let ctx = TurnContext::from_view(&view, policy);

    let decision = match MoveSelector::new(policy).choose_next_step(&ctx, rng) {
        Some((next, stage)) => MoveDecision {
            direction: Direction::toward(&ctx.head, &next),
            stage,
            shout: None,
        },
        None => MoveDecision {
            direction: FALLBACK_DIRECTION,
            stage: Stage::NoLegalMove,
            shout: None,
        },
    };

    debug!(
        "decided {} via {} (hungry: {}, hazards: {})",
        decision.direction.as_str(),
        decision.stage.as_str(),
        ctx.hungry,
        ctx.hazards.len()
    );
    Ok(decision)
}

/// Seed for one turn's tie-break random source
///
/// The bot and the replay tool both seed from the game id and turn, so a
/// replayed turn repeats the same random choices.
pub fn turn_seed(game_id: &str, turn: i32) -> u64 {
    // FNV-1a
    game_id
        .bytes()
        .chain(turn.to_le_bytes())
        .fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
            (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn coords(cells: &[(i32, i32)]) -> Vec<Coord> {
        cells.iter().map(|&(x, y)| Coord::new(x, y)).collect()
    }

    fn ctx(w: i32, h: i32, head: (i32, i32), blocked: &[(i32, i32)]) -> TurnContext {
        TurnContext {
            grid: Grid::new(w, h).unwrap(),
            head: Coord::new(head.0, head.1),
            blocked: coords(blocked).into_iter().collect(),
            food: vec![],
            hungry: false,
            opponent: None,
            hazards: HashSet::new(),
        }
    }

    #[test]
    fn test_safe_candidates_filters_hazards() {
        let legal = coords(&[(0, 1), (1, 0)]);
        let hazards: HashSet<Coord> = coords(&[(0, 1)]).into_iter().collect();
        assert_eq!(safe_candidates(&legal, &hazards), coords(&[(1, 0)]));
    }

    #[test]
    fn test_safe_candidates_falls_back_to_legal() {
        let legal = coords(&[(0, 1), (1, 0)]);
        let hazards: HashSet<Coord> = legal.iter().copied().collect();
        assert_eq!(safe_candidates(&legal, &hazards), legal);
    }

    #[test]
    fn test_hazards_only_within_radius() {
        let grid = Grid::new(11, 11).unwrap();
        let policy = PolicyConfig::default();
        let opponent = Opponent {
            id: "o".to_string(),
            head: Coord::new(5, 7),
            length: 6,
        };

        let near = hazard_cells(grid, Coord::new(5, 5), 3, &[opponent.clone()], &policy);
        assert_eq!(near.len(), 5);
        assert!(near.contains(&Coord::new(5, 6)));

        let far = hazard_cells(grid, Coord::new(0, 0), 3, &[opponent.clone()], &policy);
        assert!(far.is_empty());

        // longer than the opponent: radius 0 never triggers
        let longer = hazard_cells(grid, Coord::new(5, 5), 9, &[opponent], &policy);
        assert!(longer.is_empty());
    }

    #[test]
    fn test_no_legal_move_returns_none() {
        let context = ctx(3, 3, (0, 0), &[(0, 1), (1, 0)]);
        let policy = PolicyConfig::default();
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(MoveSelector::new(&policy).choose_next_step(&context, &mut rng), None);
    }

    #[test]
    fn test_step_toward_prefers_safe_alternative() {
        let graph = OpenGraph::build(Grid::new(5, 5).unwrap(), &HashSet::new(), Coord::new(2, 2));
        let safe = coords(&[(1, 2), (3, 2)]);
        let step = step_toward(&graph, Coord::new(2, 2), &safe, Coord::new(3, 4));
        assert_eq!(step, Some(Coord::new(3, 2)));
    }

    #[test]
    fn test_step_toward_refuses_sideways_steps() {
        let graph = OpenGraph::build(Grid::new(5, 5).unwrap(), &HashSet::new(), Coord::new(2, 2));
        // Target straight up, up is unsafe and the sides get no closer
        let safe = coords(&[(1, 2), (3, 2)]);
        assert_eq!(step_toward(&graph, Coord::new(2, 2), &safe, Coord::new(2, 4)), None);
        assert_eq!(step_toward(&graph, Coord::new(2, 2), &safe, Coord::new(2, 2)), None);
    }

    #[test]
    fn test_step_toward_unreachable_target() {
        let blocked: HashSet<Coord> = coords(&[(1, 0), (1, 1), (1, 2)]).into_iter().collect();
        let graph = OpenGraph::build(Grid::new(3, 3).unwrap(), &blocked, Coord::new(0, 0));
        let safe = coords(&[(0, 1)]);
        assert_eq!(step_toward(&graph, Coord::new(0, 0), &safe, Coord::new(2, 2)), None);
    }

    #[test]
    fn test_trap_door_found_in_corridor() {
        // Opponent (length 2) sits at the closed end of a 1-wide corridor along
        // y=0, walled off by our body on y=1. We are one step from the mouth.
        let blocked = [(0, 0), (0, 1), (1, 1), (2, 1), (3, 1)];
        let mut context = ctx(6, 4, (4, 1), &blocked);
        context.opponent = Some(Opponent {
            id: "o".to_string(),
            head: Coord::new(0, 0),
            length: 2,
        });

        let policy = PolicyConfig::default();
        let selector = MoveSelector::new(&policy);
        assert_eq!(selector.trap_target(&context), Some(Coord::new(4, 0)));

        let mut rng = StdRng::seed_from_u64(3);
        let (step, stage) = selector.choose_next_step(&context, &mut rng).unwrap();
        assert_eq!(stage, Stage::Trap);
        assert_eq!(step, Coord::new(4, 0));
    }

    #[test]
    fn test_trap_ignored_when_pocket_is_roomy() {
        // Same corridor, but with no margin a length-1 opponent is never confined
        let blocked = [(0, 0), (0, 1), (1, 1), (2, 1), (3, 1)];
        let mut context = ctx(6, 4, (4, 1), &blocked);
        context.opponent = Some(Opponent {
            id: "o".to_string(),
            head: Coord::new(0, 0),
            length: 1,
        });
        let policy = PolicyConfig {
            trap_margin: 0,
            ..PolicyConfig::default()
        };
        assert_eq!(MoveSelector::new(&policy).trap_target(&context), None);
    }

    #[test]
    fn test_space_delta_prefers_open_side() {
        // Head in the doorway; left pocket has 1 cell, right has the rest
        let context = ctx(5, 3, (1, 1), &[(1, 0), (1, 2), (0, 0), (0, 2)]);
        let policy = PolicyConfig::default();
        let graph = OpenGraph::build(context.grid, &context.blocked, context.head);
        let candidates = coords(&[(0, 1), (2, 1)]);
        let mut rng = StdRng::seed_from_u64(1);
        let step = MoveSelector::new(&policy)
            .space_delta_choice(&context, &graph, &candidates, &mut rng)
            .unwrap();
        assert_eq!(step, Coord::new(2, 1));
    }

    #[test]
    fn test_space_delta_tie_goes_to_more_open_neighbours() {
        // Both moves keep all 11 cells; (2, 1) has three open neighbours
        let context = ctx(4, 3, (1, 1), &[]);
        let policy = PolicyConfig::default();
        let graph = OpenGraph::build(context.grid, &context.blocked, context.head);
        let candidates = coords(&[(0, 1), (2, 1)]);

        for seed in 0..8 {
            let mut rng = StdRng::seed_from_u64(seed);
            let step = MoveSelector::new(&policy)
                .space_delta_choice(&context, &graph, &candidates, &mut rng)
                .unwrap();
            assert_eq!(step, Coord::new(2, 1));
        }
    }

    #[test]
    fn test_space_delta_tie_goes_away_from_opponent() {
        // Up and down score and branch alike; up is farther from (0, 0)
        let mut context = ctx(5, 5, (2, 2), &[(0, 0)]);
        context.opponent = Some(Opponent {
            id: "o".to_string(),
            head: Coord::new(0, 0),
            length: 3,
        });
        let policy = PolicyConfig::default();
        let graph = OpenGraph::build(context.grid, &context.blocked, context.head);
        let candidates = coords(&[(2, 1), (2, 3)]);

        for seed in 0..8 {
            let mut rng = StdRng::seed_from_u64(seed);
            let step = MoveSelector::new(&policy)
                .space_delta_choice(&context, &graph, &candidates, &mut rng)
                .unwrap();
            assert_eq!(step, Coord::new(2, 3));
        }
    }

    #[test]
    fn test_next_to_centre_moves_on_to_second_area() {
        // Wall at x=1 with the head in its gap: right block of 10 cells whose
        // centre touches the head, left column of 5
        let context = ctx(4, 5, (1, 2), &[(1, 0), (1, 1), (1, 3), (1, 4)]);
        let policy = PolicyConfig::default();
        let mut rng = StdRng::seed_from_u64(5);
        let (step, stage) = MoveSelector::new(&policy)
            .choose_next_step(&context, &mut rng)
            .unwrap();
        assert_eq!(stage, Stage::SecondArea);
        assert_eq!(step, Coord::new(0, 2));
    }

    #[test]
    fn test_single_area_at_centre_falls_to_space_delta() {
        let context = ctx(3, 3, (1, 1), &[]);
        let policy = PolicyConfig::default();
        let mut rng = StdRng::seed_from_u64(9);
        let (step, stage) = MoveSelector::new(&policy)
            .choose_next_step(&context, &mut rng)
            .unwrap();
        assert_eq!(stage, Stage::SpaceDelta);
        assert_eq!(step.manhattan(&Coord::new(1, 1)), 1);
    }

    #[test]
    fn test_turn_seed_depends_on_game_and_turn() {
        assert_eq!(turn_seed("g", 4), turn_seed("g", 4));
        assert_ne!(turn_seed("g", 4), turn_seed("g", 5));
        assert_ne!(turn_seed("g", 4), turn_seed("h", 4));
    }

    #[test]
    fn test_decision_response_shape() {
        let decision = MoveDecision {
            direction: Direction::Left,
            stage: Stage::Forage,
            shout: None,
        }
        .with_shout("hi");
        let body = decision.to_response();
        assert_eq!(body["move"], "left");
        assert_eq!(body["shout"], "hi");
    }
}

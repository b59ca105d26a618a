// Replay module for analyzing logged decisions
//
// This module provides functionality to:
// 1. Parse JSONL debug logs
// 2. Re-run the decision engine on each logged board
// 3. Compare logged vs replayed moves
// 4. Generate analysis reports

use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Instant;

use crate::config::Config;
use crate::policy::{decide, turn_seed, Stage};
use crate::types::{Board, Direction};

/// Represents a single log entry from the debug JSONL file
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LogEntry {
    /// Older logs omit the game id; their turns replay with an empty one
    #[serde(default)]
    pub game_id: Option<String>,
    pub turn: i32,
    /// Snake that made the logged move; older logs omit it and mean the
    /// first snake on the board
    #[serde(default)]
    pub you_id: Option<String>,
    pub chosen_move: String,
    #[serde(default)]
    pub stage: Option<String>,
    pub board: Board,
    pub timestamp: String,
}

/// Result of replaying a single turn
#[derive(Debug, Clone)]
pub struct ReplayResult {
    pub turn: i32,
    pub original_move: Direction,
    pub replayed_move: Direction,
    pub replayed_stage: Stage,
    pub matches: bool,
    pub computation_time_us: u128,
}

/// Statistics for a complete replay session
#[derive(Debug, Default)]
pub struct ReplayStats {
    pub total_turns: usize,
    pub matches: usize,
    pub mismatches: usize,
    pub match_rate: f64,
}

/// Replay engine for analyzing debug logs
pub struct ReplayEngine {
    config: Config,
    verbose: bool,
}

impl ReplayEngine {
    /// Creates a new replay engine with the given configuration
    pub fn new(config: Config, verbose: bool) -> Self {
        ReplayEngine { config, verbose }
    }

    /// Loads all log entries from a JSONL file
    pub fn load_log_file<P: AsRef<Path>>(&self, log_path: P) -> Result<Vec<LogEntry>, String> {
        let file =
            File::open(log_path.as_ref()).map_err(|e| format!("Failed to open log file: {}", e))?;

        let reader = BufReader::new(file);
        let mut entries = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| format!("Failed to read line {}: {}", line_num + 1, e))?;

            if line.trim().is_empty() {
                continue;
            }

            let entry: LogEntry = serde_json::from_str(&line)
                .map_err(|e| format!("Failed to parse JSON on line {}: {}", line_num + 1, e))?;

            entries.push(entry);
        }

        info!("Loaded {} log entries", entries.len());
        Ok(entries)
    }

    /// Runs the decision engine on a single board
    ///
    /// The random source is seeded from the game id and turn exactly as the
    /// live bot seeds it, so random tie-breaks replay identically.
    pub fn replay_turn(
        &self,
        board: &Board,
        our_snake_id: &str,
        game_id: &str,
        turn: i32,
    ) -> Result<(Direction, Stage, u128), String> {
        let start_time = Instant::now();
        let mut rng = StdRng::seed_from_u64(turn_seed(game_id, turn));

        let decision = decide(board, our_snake_id, &self.config.policy, &mut rng)
            .map_err(|e| format!("Turn {}: {}", turn, e))?;
        crate::simple_profiler::merge_thread_local();

        Ok((
            decision.direction,
            decision.stage,
            start_time.elapsed().as_micros(),
        ))
    }

    /// Replays a single log entry and compares the result
    pub fn replay_entry(&self, entry: &LogEntry) -> Result<ReplayResult, String> {
        let our_snake_id = match &entry.you_id {
            Some(id) => id.clone(),
            None => entry
                .board
                .snakes
                .first()
                .map(|s| s.id.clone())
                .ok_or("No snakes found in board state")?,
        };

        let original_move = Self::parse_direction(&entry.chosen_move)?;
        let (replayed_move, replayed_stage, computation_time) =
            self.replay_turn(
                &entry.board,
                &our_snake_id,
                entry.game_id.as_deref().unwrap_or_default(),
                entry.turn,
            )?;

        let matches = original_move == replayed_move;

        if self.verbose {
            if matches {
                info!(
                    "Turn {}: ✓ MATCH - {} via {} ({}µs)",
                    entry.turn,
                    replayed_move.as_str(),
                    replayed_stage.as_str(),
                    computation_time
                );
            } else {
                warn!(
                    "Turn {}: ✗ MISMATCH - Original: {}, Replayed: {} via {} ({}µs)",
                    entry.turn,
                    original_move.as_str(),
                    replayed_move.as_str(),
                    replayed_stage.as_str(),
                    computation_time
                );
            }
        }

        Ok(ReplayResult {
            turn: entry.turn,
            original_move,
            replayed_move,
            replayed_stage,
            matches,
            computation_time_us: computation_time,
        })
    }

    /// Replays all entries in a log file
    ///
    /// Entries are independent, so they are replayed in parallel; results
    /// keep log order. Entries that fail to replay are logged and skipped.
    pub fn replay_all(&self, entries: &[LogEntry]) -> Result<Vec<ReplayResult>, String> {
        let results = entries
            .par_iter()
            .filter_map(|entry| match self.replay_entry(entry) {
                Ok(result) => Some(result),
                Err(e) => {
                    warn!("Failed to replay turn {}: {}", entry.turn, e);
                    None
                }
            })
            .collect();

        Ok(results)
    }

    /// Replays specific turns from a log file
    pub fn replay_turns(
        &self,
        entries: &[LogEntry],
        turn_numbers: &[i32],
    ) -> Result<Vec<ReplayResult>, String> {
        let mut results = Vec::new();

        for turn_num in turn_numbers {
            let entry = entries
                .iter()
                .find(|e| e.turn == *turn_num)
                .ok_or_else(|| format!("Turn {} not found in log file", turn_num))?;

            match self.replay_entry(entry) {
                Ok(result) => results.push(result),
                Err(e) => {
                    warn!("Failed to replay turn {}: {}", turn_num, e);
                }
            }
        }

        Ok(results)
    }

    /// Generates statistics from replay results
    pub fn generate_stats(&self, results: &[ReplayResult]) -> ReplayStats {
        let total_turns = results.len();
        let matches = results.iter().filter(|r| r.matches).count();
        let mismatches = total_turns - matches;
        let match_rate = if total_turns > 0 {
            (matches as f64 / total_turns as f64) * 100.0
        } else {
            0.0
        };

        ReplayStats {
            total_turns,
            matches,
            mismatches,
            match_rate,
        }
    }

    /// Prints a detailed report of replay results
    pub fn print_report(&self, results: &[ReplayResult]) {
        let stats = self.generate_stats(results);

        println!("\n═══════════════════════════════════════════════════════════");
        println!("                    REPLAY REPORT");
        println!("═══════════════════════════════════════════════════════════");
        println!("Total Turns:    {}", stats.total_turns);
        println!("Matches:        {} ({:.1}%)", stats.matches, stats.match_rate);
        println!("Mismatches:     {}", stats.mismatches);
        println!("═══════════════════════════════════════════════════════════\n");

        if !results.is_empty() {
            let avg_time: f64 = results
                .iter()
                .map(|r| r.computation_time_us as f64)
                .sum::<f64>()
                / results.len() as f64;
            println!("Average Computation Time:   {:.1}µs\n", avg_time);

            println!("Deciding stages:");
            for stage in [
                Stage::NoLegalMove,
                Stage::Timeout,
                Stage::Forage,
                Stage::Trap,
                Stage::LargestArea,
                Stage::SecondArea,
                Stage::SpaceDelta,
            ] {
                let count = results.iter().filter(|r| r.replayed_stage == stage).count();
                if count > 0 {
                    println!("  {:<14} {}", stage.as_str(), count);
                }
            }
            println!();
        }

        let mismatches: Vec<_> = results.iter().filter(|r| !r.matches).collect();
        if !mismatches.is_empty() {
            println!("═══════════════════════════════════════════════════════════");
            println!("                  DETAILED MISMATCHES");
            println!("═══════════════════════════════════════════════════════════");

            for result in mismatches {
                println!(
                    "Turn {}: {} → {} (via {}, {}µs)",
                    result.turn,
                    result.original_move.as_str(),
                    result.replayed_move.as_str(),
                    result.replayed_stage.as_str(),
                    result.computation_time_us
                );
            }
            println!();
        }
    }

    /// Validates that specific expected moves were made
    pub fn validate_expected_moves(
        &self,
        entries: &[LogEntry],
        expected_moves: &[(i32, Vec<Direction>)], // (turn, acceptable_moves)
    ) -> Result<(), String> {
        for (turn, acceptable) in expected_moves {
            let entry = entries
                .iter()
                .find(|e| e.turn == *turn)
                .ok_or_else(|| format!("Turn {} not found in log", turn))?;

            let actual_move = Self::parse_direction(&entry.chosen_move)?;

            if !acceptable.contains(&actual_move) {
                return Err(format!(
                    "Turn {}: Expected one of {:?}, but got {}",
                    turn,
                    acceptable.iter().map(|d| d.as_str()).collect::<Vec<_>>(),
                    actual_move.as_str()
                ));
            }
        }

        Ok(())
    }

    /// Helper to parse direction string
    pub fn parse_direction(s: &str) -> Result<Direction, String> {
        Direction::parse(s).ok_or_else(|| format!("Invalid direction: {}", s))
    }
}

// Welcome to
// __________         __    __  .__                               __
// \______   \_____ _/  |__/  |_|  |   ____   ______ ____ _____  |  | __ ____
//  |    |  _/\__  \\   __\   __\  | _/ __ \ /  ___//    \\__  \ |  |/ // __ \
//  |    |   \ / __ \|  |  |  | |  |_\  ___/ \___ \|   |  \/ __ \|    <\  ___/
//  |________/(______/__|  |__| |____/\_____>______>___|__(______/__|__\\_____>
//
// The bot wires the stateless decision engine into the Battlesnake endpoints.
// For more info see docs.battlesnake.com

use log::{error, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{json, Value};
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::debug_logger::DebugLogger;
use crate::error::EngineError;
use crate::policy::{decide, turn_seed, MoveDecision, Stage, FALLBACK_DIRECTION};
use crate::types::{Battlesnake, Board, Game};

/// Battlesnake bot holding static configuration
/// One method per API endpoint; the move logic itself lives in `policy::decide`
pub struct Bot {
    config: Config,
    logger: DebugLogger,
}

impl Bot {
    /// Creates a new Bot instance with the given configuration and no debug log
    ///
    /// # Arguments
    /// * `config` - Static configuration that does not change during the bot's lifetime
    pub fn new(config: Config) -> Self {
        Bot {
            config,
            logger: DebugLogger::disabled(),
        }
    }

    /// Creates a Bot that records every decision through `logger`
    pub fn with_logger(config: Config, logger: DebugLogger) -> Self {
        Bot { config, logger }
    }

    /// Returns bot metadata and appearance
    /// Corresponds to GET / endpoint
    pub fn info(&self) -> Value {
        info!("INFO");

        let appearance = &self.config.appearance;
        json!({
            "apiversion": "1",
            "author": appearance.author,
            "color": appearance.color,
            "head": appearance.head,
            "tail": appearance.tail,
        })
    }

    /// Called when a game starts
    /// Corresponds to POST /start endpoint
    pub fn start(&self, game: &Game, _turn: &i32, board: &Board, you: &Battlesnake) {
        info!(
            "GAME START {} ({}x{}, {} snakes, we are {})",
            game.id,
            board.width,
            board.height,
            board.snakes.len(),
            you.id
        );
    }

    /// Called when a game ends
    /// Corresponds to POST /end endpoint
    pub fn end(&self, game: &Game, turn: &i32, _board: &Board, _you: &Battlesnake) {
        info!("GAME OVER {} after {} turns", game.id, turn);
    }

    /// Computes the next move
    /// Corresponds to POST /move endpoint
    ///
    /// The decision itself is synchronous and CPU-bound, so it runs on the
    /// blocking pool with its own copy of the board. If it does not finish
    /// within the effective budget (or panics) the fallback direction is sent.
    /// The random source is seeded from the game id and turn, as in replay.
    ///
    /// # Errors
    /// Malformed boards (our snake missing, bad dimensions) are returned to the
    /// caller rather than answered with a guess.
    pub async fn get_move(
        &self,
        game: &Game,
        turn: &i32,
        board: &Board,
        you: &Battlesnake,
    ) -> Result<Value, EngineError> {
        let start_time = Instant::now();
        let budget = Duration::from_millis(self.config.timing.effective_budget_ms());

        let board_copy = board.clone();
        let you_id = you.id.clone();
        let policy = self.config.policy.clone();
        let seed = turn_seed(&game.id, *turn);

        let task = tokio::task::spawn_blocking(move || {
            let mut rng = StdRng::seed_from_u64(seed);
            let decision = decide(&board_copy, &you_id, &policy, &mut rng);
            crate::simple_profiler::merge_thread_local();
            decision
        });

        let decision = match tokio::time::timeout(budget, task).await {
            Ok(Ok(result)) => result?,
            Ok(Err(join_error)) => {
                error!("Turn {}: decision task failed: {}", turn, join_error);
                Self::fallback()
            }
            Err(_) => {
                warn!(
                    "Turn {}: decision exceeded {}ms budget, sending fallback",
                    turn,
                    budget.as_millis()
                );
                Self::fallback()
            }
        };

        let shout = match decision.stage {
            Stage::NoLegalMove => &self.config.appearance.trapped_shout,
            _ => &self.config.appearance.shout,
        };
        let decision = decision.with_shout(shout.as_str());

        info!(
            "Turn {}: Chose {} via {} (time: {}ms)",
            turn,
            decision.direction.as_str(),
            decision.stage.as_str(),
            start_time.elapsed().as_millis()
        );

        self.logger
            .log_move(&game.id, *turn, &you.id, board.clone(), &decision);

        Ok(decision.to_response())
    }

    fn fallback() -> MoveDecision {
        MoveDecision {
            direction: FALLBACK_DIRECTION,
            stage: Stage::Timeout,
            shout: None,
        }
    }
}

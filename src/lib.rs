// Library exports for the open-space Battlesnake
// The server binary, the replay tool and the integration tests all drive the
// same decision engine through these modules.

pub mod bot;
pub mod config;
pub mod debug_logger;
pub mod error;
pub mod extract;
pub mod graph;
pub mod grid;
pub mod planner;
pub mod policy;
pub mod regions;
pub mod replay;
pub mod simple_profiler;
pub mod types;

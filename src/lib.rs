pub mod belief;
pub mod card;
pub mod config;
pub mod display;
pub mod game;
pub mod logging;
pub mod scoring;
pub mod server;
pub mod simulation;
pub mod strategy;

pub use belief::*;
pub use card::*;
pub use game::*;
pub use scoring::*;
pub use strategy::*;

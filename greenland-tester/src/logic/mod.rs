pub mod bots;
pub mod loader;
pub mod reports;
pub mod seeds;
pub mod simulation;
pub mod tester;

pub use bots::BotStrategy;
pub use loader::FileCatalog;
pub use seeds::resolve_seed_inputs;
pub use simulation::{GameSimulator, SimulationPlan};
pub use tester::*;

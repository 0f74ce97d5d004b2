//! Headless session harness: fixture collaborators, scripted player
//! policies and the deterministic drive loop.

mod fixtures;
mod seeds;
mod simulation;

pub use seeds::resolve_seed_inputs;
pub use simulation::{
    PlayerPolicy, SessionOutcome, SessionReport, SimulationConfig, aggregate, run_session,
};

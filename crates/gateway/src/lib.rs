pub mod api;
pub mod bootstrap;
pub mod cli;
pub mod simulation;
pub mod state;

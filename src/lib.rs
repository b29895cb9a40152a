pub mod card;
pub mod game;
pub mod ids;
pub mod rng;
pub mod simulation;

#[cfg(test)]
mod integration_tests;

//! Compute module - Genomes, rocket kinematics and the evolution loop.
//!
//! # Overview
//!
//! - **Genome** (`genome`): fixed-length action tapes, seeded crossover and mutation
//! - **Rocket** (`rocket`): per-frame motion, hit-testing and fitness
//! - **Population** (`population`): evaluation, mating pool and reproduction
//! - **Trainer** (`trainer`): the frame-by-frame generation loop

mod error;
mod genome;
mod population;
mod rocket;
mod trainer;

pub use error::EvolutionError;
pub use genome::{Action, Genome, GenomeRng};
pub use population::{MatingPool, Population};
pub use rocket::{Kinematics, Rocket, distance, heading};
pub use trainer::{TickOutcome, Trainer};

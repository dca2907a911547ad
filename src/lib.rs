//! Rocket Evolution - Neuro-free genetic search for rockets that fly to a target.
//!
//! Every rocket carries a fixed-length tape of actions (its genome), one per
//! frame. A population flies its tapes through a 2-D arena with obstacles;
//! rockets that crash stop, rockets that reach the target stop early. When
//! the generation ends, fitness rewards closeness to the target (and speed of
//! arrival), and the next generation is bred by fitness-proportional
//! selection, single-point crossover and per-frame mutation.
//!
//! # Architecture
//!
//! - `schema`: Configuration, arena geometry and read-only snapshot types
//! - `compute`: Genomes, rocket kinematics, population and the generation loop
//! - `replay`: Optional on-disk capture of every tick for later playback
//!
//! # Example
//!
//! ```rust,no_run
//! use rocket_evolution::{
//!     compute::Trainer,
//!     schema::{Arena, EvolutionConfig, Obstacle},
//! };
//!
//! let arena = Arena::default().with_obstacle(Obstacle::from_corners((400.0, 150.0), (420.0, 450.0)));
//! let mut config = EvolutionConfig::for_arena(arena);
//! config.max_generations = Some(50);
//! config.random_seed = Some(7);
//!
//! let mut trainer = Trainer::new(config).expect("valid configuration");
//! let result = trainer
//!     .run_with_callback(|p| println!("gen {}: best {:.3e}", p.generation, p.best_fitness))
//!     .expect("training failed");
//!
//! println!("Stopped after {} generations ({:?})", result.stats.generations, result.stats.stop_reason);
//! ```

pub mod compute;
pub mod replay;
pub mod schema;

// Re-export commonly used types
pub use compute::{EvolutionError, Genome, TickOutcome, Trainer};
pub use schema::{Arena, EvolutionConfig, Obstacle, SimulationConfig, TickSnapshot};

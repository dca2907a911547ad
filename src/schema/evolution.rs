//! Evolution run configuration and progress/result types.
//!
//! The run configuration bundles the tunable simulation constants with the
//! arena a population trains in; the progress types feed real-time displays
//! and the final [`TrainingResult`].

use serde::{Deserialize, Serialize};

use super::{Arena, ConfigError, SimulationConfig};
use crate::compute::Genome;

/// Top-level configuration for a training run.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EvolutionConfig {
    /// Kinematic and genetic constants.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Bounds, obstacles and target.
    #[serde(default)]
    pub arena: Arena,
    /// Stop after this many generations (None = run until cancelled).
    #[serde(default)]
    pub max_generations: Option<usize>,
    /// Stop once this fraction of a generation reaches the target.
    #[serde(default)]
    pub target_arrival_rate: Option<f32>,
    /// Random seed for reproducibility.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

impl EvolutionConfig {
    /// Create a configuration for the given arena with default constants.
    pub fn for_arena(arena: Arena) -> Self {
        Self {
            arena,
            ..Default::default()
        }
    }

    /// Validate evolution configuration.
    pub fn validate(&self) -> Result<(), EvolutionConfigError> {
        self.simulation.validate()?;
        self.arena.validate()?;

        if let Some(rate) = self.target_arrival_rate
            && !(rate > 0.0 && rate <= 1.0)
        {
            return Err(EvolutionConfigError::InvalidArrivalRate(rate));
        }

        Ok(())
    }
}

/// Summary of one evaluated generation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct GenerationStats {
    /// Generation index (0-based).
    pub generation: usize,
    /// Best raw (unnormalized) fitness.
    pub best_fitness: f32,
    /// Mean raw fitness.
    pub avg_fitness: f32,
    /// Index of the best rocket within the generation.
    pub best_index: usize,
    /// Rockets that reached the target.
    pub arrivals: usize,
    /// Rockets that crashed.
    pub crashes: usize,
    /// Mating pool size after evaluation.
    pub pool_size: usize,
    /// Frames simulated before turnover.
    pub frames: usize,
    /// True if the degenerate-fitness fallback was applied.
    pub degenerate: bool,
}

impl GenerationStats {
    /// Fraction of the population that reached the target.
    pub fn arrival_rate(&self, population_size: usize) -> f32 {
        if population_size == 0 {
            0.0
        } else {
            self.arrivals as f32 / population_size as f32
        }
    }
}

/// Evolution history for plotting.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EvolutionHistory {
    /// Best fitness per generation.
    pub best_fitness: Vec<f32>,
    /// Average fitness per generation.
    pub avg_fitness: Vec<f32>,
    /// Arrivals per generation.
    pub arrivals: Vec<usize>,
    /// Crashes per generation.
    pub crashes: Vec<usize>,
    /// Mating pool size per generation.
    pub pool_size: Vec<usize>,
}

impl EvolutionHistory {
    pub fn record(&mut self, stats: &GenerationStats) {
        self.best_fitness.push(stats.best_fitness);
        self.avg_fitness.push(stats.avg_fitness);
        self.arrivals.push(stats.arrivals);
        self.crashes.push(stats.crashes);
        self.pool_size.push(stats.pool_size);
    }

    pub fn len(&self) -> usize {
        self.best_fitness.len()
    }

    pub fn is_empty(&self) -> bool {
        self.best_fitness.is_empty()
    }
}

/// Progress update delivered after every generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionProgress {
    /// Generations completed so far.
    pub generation: usize,
    /// Planned generations, if bounded.
    pub total_generations: Option<usize>,
    /// Best fitness seen over the whole run.
    pub best_fitness: f32,
    /// Stats of the generation that just finished.
    pub latest: GenerationStats,
    /// Statistics history for plotting.
    pub history: EvolutionHistory,
}

/// Final result of a training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingResult {
    /// Genome of the best rocket seen (by raw fitness).
    pub best_genome: Option<Genome>,
    /// Statistics from the run.
    pub stats: TrainingStats,
    /// Full history for analysis.
    pub history: EvolutionHistory,
}

/// Statistics from a training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingStats {
    /// Total generations run.
    pub generations: usize,
    /// Total simulated frames across all generations.
    pub total_frames: u64,
    /// Best fitness achieved.
    pub best_fitness: f32,
    /// Generation in which a rocket first reached the target.
    pub first_arrival: Option<usize>,
    /// Time taken (in seconds).
    pub elapsed_seconds: f64,
    /// Reason for stopping.
    pub stop_reason: StopReason,
}

/// Reason training stopped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum StopReason {
    /// Reached maximum generations.
    MaxGenerations,
    /// Enough rockets reached the target.
    TargetReached,
    /// User cancelled.
    Cancelled,
}

/// Evolution configuration validation errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvolutionConfigError {
    #[error("Target arrival rate {0} must be in (0, 1]")]
    InvalidArrivalRate(f32),
    #[error("Base config validation failed: {0}")]
    BaseConfigError(#[from] ConfigError),
}

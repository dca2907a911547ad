//! Configuration types for rocket kinematics and the genetic algorithm.

use serde::{Deserialize, Serialize};

fn default_population_size() -> usize {
    100
}
fn default_max_frames() -> usize {
    500
}
fn default_mutation_rate() -> f32 {
    0.02
}
fn default_turn_step() -> f32 {
    15.0
}
fn default_accel_step() -> f32 {
    2.0
}
fn default_decel_step() -> f32 {
    1.0
}
fn default_max_speed() -> f32 {
    10.0
}
fn default_capture_radius() -> f32 {
    10.0
}
fn default_pool_scale() -> u32 {
    100
}
fn default_start_position() -> (f32, f32) {
    (100.0, 300.0)
}
fn default_body_offset() -> (f32, f32) {
    (25.0, 25.0)
}
fn default_probe_radius() -> f32 {
    22.0
}
fn default_probe_angles() -> [f32; 3] {
    [0.0, 150.0, 210.0]
}

/// Tunable constants for the simulation and the evolution controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Number of rockets per generation.
    #[serde(default = "default_population_size")]
    pub population_size: usize,
    /// Frames per generation, which is also the genome length.
    #[serde(default = "default_max_frames")]
    pub max_frames: usize,
    /// Per-slot re-randomization probability applied to every child genome.
    #[serde(default = "default_mutation_rate")]
    pub mutation_rate: f32,
    /// Degrees added (left) or removed (right) per turn action.
    #[serde(default = "default_turn_step")]
    pub turn_step_degrees: f32,
    /// Speed gained per accelerate action.
    #[serde(default = "default_accel_step")]
    pub accel_step: f32,
    /// Speed lost per decelerate action.
    #[serde(default = "default_decel_step")]
    pub decel_step: f32,
    /// Upper speed clamp.
    #[serde(default = "default_max_speed")]
    pub max_speed: f32,
    /// Lower speed clamp.
    #[serde(default)]
    pub min_speed: f32,
    /// A probe closer than this to the target counts as an arrival.
    #[serde(default = "default_capture_radius")]
    pub target_capture_radius: f32,
    /// Mating pool entries granted to a rocket with normalized fitness 1.0.
    #[serde(default = "default_pool_scale")]
    pub mating_pool_scale: u32,
    /// Spawn position (top-left of the rocket body).
    #[serde(default = "default_start_position")]
    pub start_position: (f32, f32),
    /// Offset from position to the body center.
    #[serde(default = "default_body_offset")]
    pub body_offset: (f32, f32),
    /// Distance of each collision probe from the body center.
    #[serde(default = "default_probe_radius")]
    pub probe_radius: f32,
    /// Probe angles in degrees, relative to the heading.
    #[serde(default = "default_probe_angles")]
    pub probe_angles: [f32; 3],
    /// What to do when every rocket scores zero fitness.
    #[serde(default)]
    pub degenerate_fitness: DegenerateFitnessPolicy,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            population_size: default_population_size(),
            max_frames: default_max_frames(),
            mutation_rate: default_mutation_rate(),
            turn_step_degrees: default_turn_step(),
            accel_step: default_accel_step(),
            decel_step: default_decel_step(),
            max_speed: default_max_speed(),
            min_speed: 0.0,
            target_capture_radius: default_capture_radius(),
            mating_pool_scale: default_pool_scale(),
            start_position: default_start_position(),
            body_offset: default_body_offset(),
            probe_radius: default_probe_radius(),
            probe_angles: default_probe_angles(),
            degenerate_fitness: DegenerateFitnessPolicy::default(),
        }
    }
}

/// Policy applied when the best fitness of a generation is zero.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum DegenerateFitnessPolicy {
    /// Every rocket gets a single mating pool entry.
    #[default]
    UniformShare,
    /// Abort the generation with `EvolutionError::DegenerateFitness`.
    ///
    /// The generation is left unevaluated, so every later tick of the same
    /// trainer fails again with the same error. Build a new trainer to
    /// continue.
    Fail,
}

impl SimulationConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size == 0 {
            return Err(ConfigError::EmptyPopulation);
        }
        if self.max_frames == 0 {
            return Err(ConfigError::InvalidFrameCount);
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(ConfigError::InvalidMutationRate(self.mutation_rate));
        }
        for (name, value) in [
            ("turn_step_degrees", self.turn_step_degrees),
            ("accel_step", self.accel_step),
            ("decel_step", self.decel_step),
            ("target_capture_radius", self.target_capture_radius),
            ("probe_radius", self.probe_radius),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::NegativeParameter { name, value });
            }
        }
        if !(self.min_speed.is_finite() && self.max_speed.is_finite())
            || self.min_speed > self.max_speed
        {
            return Err(ConfigError::InvalidSpeedRange {
                min: self.min_speed,
                max: self.max_speed,
            });
        }
        if self.mating_pool_scale == 0 {
            return Err(ConfigError::InvalidPoolScale);
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Population size must be non-zero")]
    EmptyPopulation,
    #[error("Frames per generation must be non-zero")]
    InvalidFrameCount,
    #[error("Mutation rate {0} is outside [0, 1]")]
    InvalidMutationRate(f32),
    #[error("Parameter {name} must be finite and non-negative, got {value}")]
    NegativeParameter { name: &'static str, value: f32 },
    #[error("Speed range [{min}, {max}] is empty")]
    InvalidSpeedRange { min: f32, max: f32 },
    #[error("Mating pool scale must be non-zero")]
    InvalidPoolScale,
    #[error("Arena dimensions must be positive")]
    InvalidArena,
    #[error("Obstacle {0} has negative or non-finite size")]
    InvalidObstacle(usize),
    #[error("Target point must be finite")]
    InvalidTarget,
}

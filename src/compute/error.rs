//! Errors raised by the evolution core.

use crate::schema::EvolutionConfigError;

/// Failures of the genome, rocket, population and driver operations.
///
/// Every variant except `Config` is a driver-side precondition violation or a
/// generation-local failure; none of them leaves other generations corrupted.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvolutionError {
    #[error("Cannot cross genomes of different lengths ({left} vs {right})")]
    GenomeLengthMismatch { left: usize, right: usize },
    #[error("Mating pool is empty; evaluate the population before selecting")]
    EmptyMatingPool,
    #[error("Frame {frame} is outside the genome (length {length})")]
    FrameOutOfRange { frame: usize, length: usize },
    #[error("Rocket is no longer alive")]
    AgentNotAlive,
    #[error("Every rocket scored zero fitness in generation {generation}")]
    DegenerateFitness { generation: usize },
    #[error("Invalid configuration: {0}")]
    Config(#[from] EvolutionConfigError),
}

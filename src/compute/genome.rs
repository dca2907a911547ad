//! Genome representation and the seeded operators that evolve it.
//!
//! A genome is a fixed-length tape of per-frame actions. All randomness
//! (initialization, crossover split, mutation) flows through [`GenomeRng`]
//! so runs are reproducible from a single seed.

use rand::prelude::*;
use serde::{Deserialize, Serialize};

use super::EvolutionError;

/// Control inputs for a single frame. Flags are independent and may combine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub struct Action {
    pub decelerate: bool,
    pub accelerate: bool,
    pub turn_left: bool,
    pub turn_right: bool,
}

impl Action {
    /// No input.
    pub const IDLE: Action = Action {
        decelerate: false,
        accelerate: false,
        turn_left: false,
        turn_right: false,
    };

    /// Full throttle, no steering.
    pub const THRUST: Action = Action {
        decelerate: false,
        accelerate: true,
        turn_left: false,
        turn_right: false,
    };

    /// Decode from the low four bits: decelerate, accelerate, left, right.
    pub fn from_bits(bits: u8) -> Self {
        Self {
            decelerate: bits & 0b0001 != 0,
            accelerate: bits & 0b0010 != 0,
            turn_left: bits & 0b0100 != 0,
            turn_right: bits & 0b1000 != 0,
        }
    }

    pub fn to_bits(self) -> u8 {
        (self.decelerate as u8)
            | (self.accelerate as u8) << 1
            | (self.turn_left as u8) << 2
            | (self.turn_right as u8) << 3
    }
}

/// An agent's complete action sequence, indexed by frame.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Genome {
    actions: Vec<Action>,
    mutation_rate: f32,
}

impl Genome {
    /// Wrap an explicit action sequence.
    pub fn new(actions: Vec<Action>, mutation_rate: f32) -> Self {
        Self {
            actions,
            mutation_rate,
        }
    }

    /// A genome repeating one action for every frame.
    pub fn repeat(action: Action, length: usize, mutation_rate: f32) -> Self {
        Self::new(vec![action; length], mutation_rate)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Action for a frame, if the frame is within the genome.
    #[inline]
    pub fn action(&self, frame: usize) -> Option<Action> {
        self.actions.get(frame).copied()
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn mutation_rate(&self) -> f32 {
        self.mutation_rate
    }

    /// Single-point crossover at a fixed split.
    ///
    /// The child takes `self[..split]` followed by `other[split..]` and keeps
    /// `self`'s mutation rate. `split == len` yields a copy of `self`.
    pub fn crossover_at(&self, other: &Genome, split: usize) -> Result<Genome, EvolutionError> {
        if self.len() != other.len() {
            return Err(EvolutionError::GenomeLengthMismatch {
                left: self.len(),
                right: other.len(),
            });
        }
        let split = split.min(self.len());

        let mut actions = Vec::with_capacity(self.len());
        actions.extend_from_slice(&self.actions[..split]);
        actions.extend_from_slice(&other.actions[split..]);

        Ok(Genome::new(actions, self.mutation_rate))
    }

    /// Number of frames at which two genomes disagree.
    pub fn hamming_distance(&self, other: &Genome) -> usize {
        self.actions
            .iter()
            .zip(other.actions.iter())
            .filter(|(a, b)| a != b)
            .count()
            + self.len().abs_diff(other.len())
    }
}

/// Random number generator wrapper for genome operations.
pub struct GenomeRng {
    rng: StdRng,
}

impl GenomeRng {
    /// Create from seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Uniformly random action (each flag a fair coin).
    pub fn random_action(&mut self) -> Action {
        Action::from_bits(self.rng.gen_range(0..16u8))
    }

    /// Generate a genome of `length` random actions.
    pub fn random_genome(&mut self, length: usize, mutation_rate: f32) -> Genome {
        let actions = (0..length).map(|_| self.random_action()).collect();
        Genome::new(actions, mutation_rate)
    }

    /// Single-point crossover with the split drawn uniformly from `[0, len]`.
    ///
    /// Fails with `GenomeLengthMismatch` if the parents differ in length.
    pub fn crossover(&mut self, parent1: &Genome, parent2: &Genome) -> Result<Genome, EvolutionError> {
        let split = self.rng.gen_range(0..=parent1.len());
        parent1.crossover_at(parent2, split)
    }

    /// Re-randomize each slot independently with probability `rate`.
    ///
    /// Returns the number of slots that were redrawn (a redrawn slot may
    /// land on its previous value).
    pub fn mutate(&mut self, genome: &mut Genome, rate: f32) -> usize {
        let mut redrawn = 0;
        for slot in &mut genome.actions {
            if self.rng.r#gen::<f32>() < rate {
                *slot = Action::from_bits(self.rng.gen_range(0..16u8));
                redrawn += 1;
            }
        }
        redrawn
    }

    /// Uniform integer in `[0, n)`. `n` must be non-zero.
    pub fn below(&mut self, n: u64) -> u64 {
        self.rng.gen_range(0..n)
    }
}

//! Population of rockets and fitness-proportionate reproduction.

#[cfg(not(target_arch = "wasm32"))]
use rayon::prelude::*;

use crate::schema::{
    Arena, ConfigError, DegenerateFitnessPolicy, EvolutionConfigError, GenerationStats,
    RocketStatus, SimulationConfig,
};

use super::{EvolutionError, Genome, GenomeRng, Rocket};

/// Weighted sampler over population members.
///
/// Equivalent to a list holding `count` copies of each member index, stored
/// as a cumulative-count array and sampled by binary search.
#[derive(Debug, Clone, Default)]
pub struct MatingPool {
    members: Vec<usize>,
    cumulative: Vec<u64>,
}

impl MatingPool {
    /// Build from per-member entry counts. Members with zero entries are skipped.
    pub fn from_counts(counts: impl IntoIterator<Item = u64>) -> Self {
        let mut pool = Self::default();
        let mut total = 0u64;
        for (index, count) in counts.into_iter().enumerate() {
            if count == 0 {
                continue;
            }
            total += count;
            pool.members.push(index);
            pool.cumulative.push(total);
        }
        pool
    }

    /// Total number of entries (what a literal pool's length would be).
    pub fn len(&self) -> u64 {
        self.cumulative.last().copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries held by a member.
    pub fn count_for(&self, member: usize) -> u64 {
        match self.members.iter().position(|&m| m == member) {
            Some(0) => self.cumulative[0],
            Some(i) => self.cumulative[i] - self.cumulative[i - 1],
            None => 0,
        }
    }

    /// Draw one member index, uniformly over entries.
    pub fn sample(&self, rng: &mut GenomeRng) -> Result<usize, EvolutionError> {
        if self.is_empty() {
            return Err(EvolutionError::EmptyMatingPool);
        }
        let ticket = rng.below(self.len());
        let slot = self.cumulative.partition_point(|&c| c <= ticket);
        Ok(self.members[slot])
    }

    pub fn clear(&mut self) {
        self.members.clear();
        self.cumulative.clear();
    }
}

/// Fixed-size set of rockets making up one generation.
pub struct Population {
    members: Vec<Rocket>,
    mating_pool: MatingPool,
    config: SimulationConfig,
    generation: usize,
}

impl Population {
    /// Spawn `population_size` rockets with random genomes.
    pub fn new(config: SimulationConfig, rng: &mut GenomeRng) -> Self {
        let members = (0..config.population_size)
            .map(|_| {
                let genome = rng.random_genome(config.max_frames, config.mutation_rate);
                Rocket::new(genome, &config)
            })
            .collect();

        Self {
            members,
            mating_pool: MatingPool::default(),
            config,
            generation: 0,
        }
    }

    /// Spawn one rocket per supplied genome.
    ///
    /// Every genome must be exactly `max_frames` long.
    pub fn from_genomes(config: SimulationConfig, genomes: Vec<Genome>) -> Result<Self, EvolutionError> {
        if genomes.is_empty() {
            return Err(EvolutionConfigError::from(ConfigError::EmptyPopulation).into());
        }
        if let Some(bad) = genomes.iter().find(|g| g.len() != config.max_frames) {
            return Err(EvolutionError::GenomeLengthMismatch {
                left: bad.len(),
                right: config.max_frames,
            });
        }

        let members = genomes
            .into_iter()
            .map(|genome| Rocket::new(genome, &config))
            .collect();

        Ok(Self {
            members,
            mating_pool: MatingPool::default(),
            config,
            generation: 0,
        })
    }

    pub fn members(&self) -> &[Rocket] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn mating_pool(&self) -> &MatingPool {
        &self.mating_pool
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Generations completed by this population.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// True once no rocket is still flying.
    pub fn all_finished(&self) -> bool {
        self.members.iter().all(|r| !r.is_alive())
    }

    /// Simulate one frame for every rocket.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn advance(&mut self, frame: usize, arena: &Arena) -> Result<(), EvolutionError> {
        self.members
            .par_iter_mut()
            .try_for_each(|rocket| advance_rocket(rocket, frame, arena))
    }

    /// Simulate one frame for every rocket.
    #[cfg(target_arch = "wasm32")]
    pub fn advance(&mut self, frame: usize, arena: &Arena) -> Result<(), EvolutionError> {
        self.members
            .iter_mut()
            .try_for_each(|rocket| advance_rocket(rocket, frame, arena))
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn score_members(&mut self, target: (f32, f32)) -> Vec<f32> {
        self.members
            .par_iter_mut()
            .map(|rocket| rocket.compute_fitness(target))
            .collect()
    }

    #[cfg(target_arch = "wasm32")]
    fn score_members(&mut self, target: (f32, f32)) -> Vec<f32> {
        self.members
            .iter_mut()
            .map(|rocket| rocket.compute_fitness(target))
            .collect()
    }

    /// Score every rocket, normalize by the best score and rebuild the mating pool.
    ///
    /// After this call each rocket's `fitness()` is its normalized score in
    /// `[0, 1]`; the returned stats carry the raw scores.
    pub fn evaluate(&mut self, target: (f32, f32)) -> Result<GenerationStats, EvolutionError> {
        let mut raw = self.score_members(target);
        for (i, f) in raw.iter_mut().enumerate() {
            if !f.is_finite() {
                log::warn!("Rocket {i} produced non-finite fitness {f}; scoring as 0");
                *f = 0.0;
            }
        }

        let (best_index, best_fitness) = raw
            .iter()
            .copied()
            .enumerate()
            .fold((0, 0.0f32), |best, (i, f)| if f > best.1 { (i, f) } else { best });
        let avg_fitness = raw.iter().sum::<f32>() / raw.len().max(1) as f32;

        let scale = self.config.mating_pool_scale as f32;
        let degenerate = best_fitness <= 0.0;

        let counts: Vec<u64> = if degenerate {
            match self.config.degenerate_fitness {
                DegenerateFitnessPolicy::Fail => {
                    self.mating_pool.clear();
                    return Err(EvolutionError::DegenerateFitness {
                        generation: self.generation,
                    });
                }
                DegenerateFitnessPolicy::UniformShare => {
                    log::warn!(
                        "Generation {}: every rocket scored 0, giving each one pool entry",
                        self.generation
                    );
                    for rocket in &mut self.members {
                        rocket.set_fitness(0.0);
                    }
                    vec![1; self.members.len()]
                }
            }
        } else {
            self.members
                .iter_mut()
                .zip(&raw)
                .map(|(rocket, &f)| {
                    let normalized = f / best_fitness;
                    rocket.set_fitness(normalized);
                    (normalized * scale).round_ties_even() as u64
                })
                .collect()
        };

        self.mating_pool = MatingPool::from_counts(counts);

        let arrivals = self
            .members
            .iter()
            .filter(|r| r.status() == RocketStatus::ReachedTarget)
            .count();
        let crashes = self
            .members
            .iter()
            .filter(|r| r.status() == RocketStatus::Crashed)
            .count();

        let stats = GenerationStats {
            generation: self.generation,
            best_fitness,
            avg_fitness,
            best_index,
            arrivals,
            crashes,
            pool_size: self.mating_pool.len() as usize,
            frames: 0,
            degenerate,
        };
        log::debug!(
            "Generation {} evaluated: best={:.3e} avg={:.3e} arrivals={} crashes={} pool={}",
            stats.generation,
            stats.best_fitness,
            stats.avg_fitness,
            stats.arrivals,
            stats.crashes,
            stats.pool_size
        );

        Ok(stats)
    }

    /// Breed a full replacement generation from the mating pool.
    ///
    /// Each child is a crossover of two parents drawn with replacement,
    /// then mutated. The old rockets are dropped and the pool is cleared.
    pub fn select(&mut self, rng: &mut GenomeRng) -> Result<(), EvolutionError> {
        if self.mating_pool.is_empty() {
            return Err(EvolutionError::EmptyMatingPool);
        }

        let mut next = Vec::with_capacity(self.members.len());
        for _ in 0..self.members.len() {
            let a = self.mating_pool.sample(rng)?;
            let b = self.mating_pool.sample(rng)?;
            let mut child = rng.crossover(self.members[a].genome(), self.members[b].genome())?;
            rng.mutate(&mut child, self.config.mutation_rate);
            next.push(Rocket::new(child, &self.config));
        }

        self.members = next;
        self.mating_pool.clear();
        self.generation += 1;
        Ok(())
    }
}

fn advance_rocket(rocket: &mut Rocket, frame: usize, arena: &Arena) -> Result<(), EvolutionError> {
    if rocket.is_alive() {
        rocket.decide_and_accelerate(frame)?;
    }
    rocket.check_contacts(arena);
    rocket.step();
    Ok(())
}

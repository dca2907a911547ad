//! Generation loop: advances the population frame by frame and triggers
//! evaluation and reproduction at generation end.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::schema::{
    AgentView, EvolutionConfig, EvolutionHistory, EvolutionProgress, GenerationStats, StopReason,
    TickSnapshot, TrainingResult, TrainingStats,
};

use super::{EvolutionError, Genome, GenomeRng, Population};

/// Result of a single [`Trainer::tick`].
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Every rocket was advanced by one frame.
    Advanced,
    /// The generation ended; the population was evaluated and replaced.
    GenerationComplete(GenerationStats),
}

/// Drives a population through repeated generations.
pub struct Trainer {
    config: EvolutionConfig,
    rng: GenomeRng,
    population: Population,
    current_frame: usize,
    history: EvolutionHistory,
    latest: Option<GenerationStats>,
    best_fitness: f32,
    best_genome: Option<Genome>,
    first_arrival: Option<usize>,
    total_frames: u64,
    cancelled: Arc<AtomicBool>,
}

impl Trainer {
    /// Create a trainer with a random initial population.
    pub fn new(config: EvolutionConfig) -> Result<Self, EvolutionError> {
        config.validate()?;
        let mut rng = GenomeRng::new(config.random_seed.unwrap_or_else(rand::random));
        let population = Population::new(config.simulation.clone(), &mut rng);
        Ok(Self::assemble(config, rng, population))
    }

    /// Create a trainer whose first generation flies the given genomes.
    ///
    /// The population size follows `genomes.len()`.
    pub fn with_genomes(
        mut config: EvolutionConfig,
        genomes: Vec<Genome>,
    ) -> Result<Self, EvolutionError> {
        config.simulation.population_size = genomes.len();
        config.validate()?;
        let rng = GenomeRng::new(config.random_seed.unwrap_or_else(rand::random));
        let population = Population::from_genomes(config.simulation.clone(), genomes)?;
        Ok(Self::assemble(config, rng, population))
    }

    fn assemble(config: EvolutionConfig, rng: GenomeRng, population: Population) -> Self {
        Self {
            config,
            rng,
            population,
            current_frame: 0,
            history: EvolutionHistory::default(),
            latest: None,
            best_fitness: 0.0,
            best_genome: None,
            first_arrival: None,
            total_frames: 0,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get cancellation handle.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    /// Frames simulated so far in the current generation.
    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    /// Completed generations.
    pub fn generation(&self) -> usize {
        self.population.generation()
    }

    pub fn history(&self) -> &EvolutionHistory {
        &self.history
    }

    /// Best genome seen so far, by raw fitness.
    pub fn best_genome(&self) -> Option<&Genome> {
        self.best_genome.as_ref()
    }

    /// Advance the simulation by one tick.
    ///
    /// If the frame budget is spent or no rocket is still flying, the tick
    /// is spent on generation turnover instead of motion.
    pub fn tick(&mut self) -> Result<TickOutcome, EvolutionError> {
        if self.current_frame == self.config.simulation.max_frames
            || self.population.all_finished()
        {
            let stats = self.turnover()?;
            return Ok(TickOutcome::GenerationComplete(stats));
        }

        self.population
            .advance(self.current_frame, &self.config.arena)?;
        self.current_frame += 1;
        self.total_frames += 1;
        Ok(TickOutcome::Advanced)
    }

    fn turnover(&mut self) -> Result<GenerationStats, EvolutionError> {
        let mut stats = self.population.evaluate(self.config.arena.target)?;
        stats.frames = self.current_frame;

        if stats.best_fitness > self.best_fitness {
            self.best_fitness = stats.best_fitness;
            self.best_genome = Some(self.population.members()[stats.best_index].genome().clone());
        }
        if stats.arrivals > 0 && self.first_arrival.is_none() {
            self.first_arrival = Some(stats.generation);
        }

        log::info!(
            "Generation {}: {} frames, best={:.3e}, avg={:.3e}, arrived {}/{}, crashed {}",
            stats.generation,
            stats.frames,
            stats.best_fitness,
            stats.avg_fitness,
            stats.arrivals,
            self.population.len(),
            stats.crashes
        );

        self.population.select(&mut self.rng)?;
        self.history.record(&stats);
        self.latest = Some(stats.clone());
        self.current_frame = 0;

        Ok(stats)
    }

    /// Tick until the current generation turns over.
    pub fn run_generation(&mut self) -> Result<GenerationStats, EvolutionError> {
        loop {
            if let TickOutcome::GenerationComplete(stats) = self.tick()? {
                return Ok(stats);
            }
        }
    }

    /// Read-only view of every rocket at the current tick.
    pub fn snapshot(&self) -> TickSnapshot {
        let agents: Vec<AgentView> = self.population.members().iter().map(|r| r.view()).collect();
        TickSnapshot {
            generation: self.generation(),
            frame: self.current_frame,
            agents,
        }
    }

    /// Get current progress.
    pub fn progress(&self) -> EvolutionProgress {
        EvolutionProgress {
            generation: self.generation(),
            total_generations: self.config.max_generations,
            best_fitness: self.best_fitness,
            latest: self.latest.clone().unwrap_or_default(),
            history: self.history.clone(),
        }
    }

    /// Check if training should stop.
    fn should_stop(&self) -> Option<StopReason> {
        if self.cancelled.load(Ordering::Relaxed) {
            return Some(StopReason::Cancelled);
        }

        if let Some(limit) = self.config.max_generations
            && self.generation() >= limit
        {
            return Some(StopReason::MaxGenerations);
        }

        if let (Some(rate), Some(latest)) = (self.config.target_arrival_rate, &self.latest)
            && latest.arrival_rate(self.population.len()) >= rate
        {
            return Some(StopReason::TargetReached);
        }

        None
    }

    /// Run training, reporting progress after every generation.
    pub fn run_with_callback<F>(&mut self, on_generation: F) -> Result<TrainingResult, EvolutionError>
    where
        F: FnMut(&EvolutionProgress),
    {
        self.run_loop(on_generation, None)
    }

    /// Run training, additionally handing every advanced tick to `on_tick`.
    pub fn run_with_observer<F, G>(
        &mut self,
        on_generation: F,
        mut on_tick: G,
    ) -> Result<TrainingResult, EvolutionError>
    where
        F: FnMut(&EvolutionProgress),
        G: FnMut(&TickSnapshot),
    {
        self.run_loop(
            on_generation,
            Some(&mut on_tick as &mut dyn FnMut(&TickSnapshot)),
        )
    }

    /// Run training with no callbacks.
    pub fn run(&mut self) -> Result<TrainingResult, EvolutionError> {
        self.run_with_callback(|_| {})
    }

    fn run_loop<F>(
        &mut self,
        mut on_generation: F,
        mut on_tick: Option<&mut dyn FnMut(&TickSnapshot)>,
    ) -> Result<TrainingResult, EvolutionError>
    where
        F: FnMut(&EvolutionProgress),
    {
        let start_time = std::time::Instant::now();

        let stop_reason = loop {
            if let Some(reason) = self.should_stop() {
                break reason;
            }

            match self.tick()? {
                TickOutcome::Advanced => {
                    if let Some(observer) = on_tick.as_deref_mut() {
                        observer(&self.snapshot());
                    }
                }
                TickOutcome::GenerationComplete(_) => on_generation(&self.progress()),
            }
        };

        log::info!(
            "Training stopped after {} generations: {:?}",
            self.generation(),
            stop_reason
        );

        Ok(TrainingResult {
            best_genome: self.best_genome.clone(),
            stats: TrainingStats {
                generations: self.generation(),
                total_frames: self.total_frames,
                best_fitness: self.best_fitness,
                first_arrival: self.first_arrival,
                elapsed_seconds: start_time.elapsed().as_secs_f64(),
                stop_reason,
            },
            history: self.history.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::Action;
    use crate::schema::{
        Arena, ConfigError, DegenerateFitnessPolicy, EvolutionConfigError, Obstacle, RocketStatus,
        SimulationConfig,
    };

    fn test_config(size: usize, frames: usize) -> EvolutionConfig {
        EvolutionConfig {
            simulation: SimulationConfig {
                population_size: size,
                max_frames: frames,
                ..Default::default()
            },
            random_seed: Some(42),
            ..Default::default()
        }
    }

    #[test]
    fn test_trainer_creation() {
        let trainer = Trainer::new(test_config(10, 50)).unwrap();
        assert_eq!(trainer.population().len(), 10);
        assert_eq!(trainer.current_frame(), 0);
        assert_eq!(trainer.generation(), 0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = test_config(0, 50);
        assert!(matches!(
            Trainer::new(config),
            Err(EvolutionError::Config(EvolutionConfigError::BaseConfigError(
                ConfigError::EmptyPopulation
            )))
        ));
    }

    #[test]
    fn test_turnover_at_frame_budget() {
        let config = test_config(6, 20);
        let genomes = vec![Genome::repeat(Action::IDLE, 20, 0.02); 6];
        let mut trainer = Trainer::with_genomes(config, genomes).unwrap();

        for frame in 0..20 {
            assert_eq!(trainer.current_frame(), frame);
            assert_eq!(trainer.tick().unwrap(), TickOutcome::Advanced);
        }
        match trainer.tick().unwrap() {
            TickOutcome::GenerationComplete(stats) => {
                assert_eq!(stats.frames, 20);
                assert_eq!(stats.arrivals, 0);
                assert_eq!(stats.crashes, 0);
            }
            other => panic!("expected turnover, got {other:?}"),
        }
        assert_eq!(trainer.current_frame(), 0);
        assert_eq!(trainer.generation(), 1);
        assert_eq!(trainer.population().len(), 6);
    }

    #[test]
    fn test_turnover_when_everyone_is_down() {
        let mut config = test_config(5, 100);
        // Narrow arena: every nose probe starts out of bounds.
        config.arena = Arena::new(140.0, 600.0, (70.0, 100.0));
        let mut trainer = Trainer::new(config).unwrap();

        assert_eq!(trainer.tick().unwrap(), TickOutcome::Advanced);
        assert!(trainer.population().all_finished());
        match trainer.tick().unwrap() {
            TickOutcome::GenerationComplete(stats) => {
                assert_eq!(stats.frames, 1);
                assert_eq!(stats.crashes, 5);
            }
            other => panic!("expected turnover, got {other:?}"),
        }
    }

    #[test]
    fn test_fail_policy_keeps_failing_on_later_ticks() {
        let mut config = test_config(3, 4);
        config.simulation.degenerate_fitness = DegenerateFitnessPolicy::Fail;
        // Far enough away that every score underflows to zero.
        config.arena.target = (1.0e30, 1.0e30);
        let mut trainer = Trainer::new(config).unwrap();

        for _ in 0..4 {
            assert_eq!(trainer.tick().unwrap(), TickOutcome::Advanced);
        }
        for _ in 0..3 {
            assert_eq!(
                trainer.tick(),
                Err(EvolutionError::DegenerateFitness { generation: 0 })
            );
            assert_eq!(trainer.generation(), 0);
            assert_eq!(trainer.current_frame(), 4);
        }
        assert!(trainer.history().is_empty());
    }

    #[test]
    fn test_single_rocket_reaches_target_ahead() {
        let mut config = test_config(1, 500);
        config.arena = Arena::new(800.0, 600.0, (625.0, 325.0));
        let genomes = vec![Genome::repeat(Action::THRUST, 500, 0.02)];
        let mut trainer = Trainer::with_genomes(config, genomes).unwrap();

        let stats = trainer.run_generation().unwrap();
        assert_eq!(stats.arrivals, 1);
        // 500 units at top speed 10, plus the ramp-up.
        assert!(stats.frames <= 52, "took {} frames", stats.frames);
        assert!(trainer.best_genome().is_some());
    }

    #[test]
    fn test_obstacle_in_front_of_start() {
        let mut config = test_config(1, 500);
        config.arena = Arena::default().with_obstacle(Obstacle {
            x: 160.0,
            y: 280.0,
            width: 30.0,
            height: 100.0,
        });
        let genomes = vec![Genome::repeat(Action::THRUST, 500, 0.02)];
        let mut trainer = Trainer::with_genomes(config, genomes).unwrap();

        // Nose enters the obstacle on the fifth frame.
        for _ in 0..5 {
            trainer.tick().unwrap();
        }
        let snapshot = trainer.snapshot();
        assert_eq!(snapshot.agents[0].status, RocketStatus::Crashed);
    }

    #[test]
    fn test_snapshot_reflects_population() {
        let mut trainer = Trainer::new(test_config(4, 30)).unwrap();
        trainer.tick().unwrap();
        trainer.tick().unwrap();
        let snapshot = trainer.snapshot();
        assert_eq!(snapshot.frame, 2);
        assert_eq!(snapshot.generation, 0);
        assert_eq!(snapshot.agents.len(), 4);
        for (view, rocket) in snapshot.agents.iter().zip(trainer.population().members()) {
            assert_eq!(view.position, rocket.position());
            assert_eq!(view.probes, *rocket.probes());
        }
    }

    #[test]
    fn test_training_run() {
        let mut config = test_config(8, 40);
        config.max_generations = Some(3);
        let mut trainer = Trainer::new(config).unwrap();

        let mut reports = Vec::new();
        let result = trainer
            .run_with_callback(|progress| reports.push(progress.generation))
            .unwrap();

        assert_eq!(result.stats.generations, 3);
        assert_eq!(result.stats.stop_reason, StopReason::MaxGenerations);
        assert_eq!(result.history.len(), 3);
        assert_eq!(reports, vec![1, 2, 3]);
        assert!(result.stats.best_fitness > 0.0);
        assert!(result.best_genome.is_some());
    }

    #[test]
    fn test_observer_sees_every_advanced_tick() {
        let mut config = test_config(3, 15);
        config.max_generations = Some(2);
        let genomes = vec![Genome::repeat(Action::IDLE, 15, 0.0); 3];
        let mut trainer = Trainer::with_genomes(config, genomes).unwrap();

        let mut ticks = 0u64;
        let result = trainer
            .run_with_observer(|_| {}, |snapshot| {
                assert_eq!(snapshot.agents.len(), 3);
                ticks += 1;
            })
            .unwrap();
        assert_eq!(ticks, result.stats.total_frames);
    }

    #[test]
    fn test_cancellation() {
        let mut config = test_config(5, 20);
        config.max_generations = Some(100);
        let mut trainer = Trainer::new(config).unwrap();
        let cancel = trainer.cancel_handle();

        // Cancel immediately
        cancel.store(true, Ordering::Relaxed);

        let result = trainer.run().unwrap();
        assert_eq!(result.stats.stop_reason, StopReason::Cancelled);
        assert_eq!(result.stats.generations, 0);
    }

    #[test]
    fn test_stops_when_target_reached() {
        let mut config = test_config(1, 200);
        config.arena = Arena::new(800.0, 600.0, (625.0, 325.0));
        config.max_generations = Some(10);
        config.target_arrival_rate = Some(1.0);
        let genomes = vec![Genome::repeat(Action::THRUST, 200, 0.02)];
        let mut trainer = Trainer::with_genomes(config, genomes).unwrap();

        let result = trainer.run().unwrap();
        assert_eq!(result.stats.stop_reason, StopReason::TargetReached);
        assert_eq!(result.stats.generations, 1);
        assert_eq!(result.stats.first_arrival, Some(0));
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let run = || {
            let mut config = test_config(10, 60);
            config.max_generations = Some(3);
            config.random_seed = Some(1234);
            Trainer::new(config).unwrap().run().unwrap().history
        };
        let a = run();
        let b = run();
        assert_eq!(a.best_fitness, b.best_fitness);
        assert_eq!(a.pool_size, b.pool_size);
    }
}

//! Rocket Evolution CLI - Train a population from JSON configuration.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use rocket_evolution::{
    compute::Trainer,
    replay::{RecorderConfig, ReplayRecorder},
    schema::{Arena, EvolutionConfig, Obstacle},
};

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <config.json> [generations] [replay.rktr]", args[0]);
        eprintln!();
        eprintln!("Evolve rockets toward a target from JSON configuration.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  config.json  Path to evolution configuration file");
        eprintln!("  generations  Number of generations (default: config or 100)");
        eprintln!("  replay.rktr  Optional path to record every tick");
        eprintln!();
        eprintln!("Example configuration is generated with --example flag.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_config();
        return;
    }

    let config_path = PathBuf::from(&args[1]);

    let config_str = fs::read_to_string(&config_path).unwrap_or_else(|e| {
        eprintln!("Error reading config file: {}", e);
        std::process::exit(1);
    });

    let mut config: EvolutionConfig = serde_json::from_str(&config_str).unwrap_or_else(|e| {
        eprintln!("Error parsing config: {}", e);
        std::process::exit(1);
    });

    if let Some(generations) = args.get(2).and_then(|s| s.parse().ok()) {
        config.max_generations = Some(generations);
    } else if config.max_generations.is_none() && config.target_arrival_rate.is_none() {
        config.max_generations = Some(100);
    }

    println!("Rocket Evolution");
    println!("================");
    println!(
        "Arena: {}x{} ({} obstacles), target ({}, {})",
        config.arena.width,
        config.arena.height,
        config.arena.obstacles.len(),
        config.arena.target.0,
        config.arena.target.1
    );
    println!(
        "Population: {} rockets, {} frames per generation",
        config.simulation.population_size, config.simulation.max_frames
    );
    println!("Mutation rate: {}", config.simulation.mutation_rate);
    if let Some(generations) = config.max_generations {
        println!("Generations: {}", generations);
    }
    if let Some(rate) = config.target_arrival_rate {
        println!("Stop at arrival rate: {:.0}%", rate * 100.0);
    }
    println!();

    let population_size = config.simulation.population_size;
    let arena = config.arena.clone();

    let mut trainer = Trainer::new(config).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    let mut recorder = args.get(3).map(|path| {
        ReplayRecorder::new(path, population_size, &arena, RecorderConfig::default())
            .unwrap_or_else(|e| {
                eprintln!("Error creating replay file: {}", e);
                std::process::exit(1);
            })
    });

    println!("Training...");
    let start = Instant::now();

    let on_generation = |progress: &rocket_evolution::schema::EvolutionProgress| {
        let latest = &progress.latest;
        println!(
            "  Gen {:>4}: best={:.3e} avg={:.3e} arrived={:>3} crashed={:>3} pool={}",
            latest.generation,
            latest.best_fitness,
            latest.avg_fitness,
            latest.arrivals,
            latest.crashes,
            latest.pool_size
        );
    };

    let result = match recorder.as_mut() {
        Some(recorder) => trainer.run_with_observer(on_generation, |snapshot| {
            if let Err(e) = recorder.record_frame(snapshot) {
                log::warn!("Dropping replay frame: {}", e);
            }
        }),
        None => trainer.run_with_callback(on_generation),
    };

    let result = result.unwrap_or_else(|e| {
        eprintln!("Training failed: {}", e);
        std::process::exit(1);
    });

    let elapsed = start.elapsed();

    println!();
    println!("Finished: {:?}", result.stats.stop_reason);
    println!("  Generations: {}", result.stats.generations);
    println!("  Best fitness: {:.6e}", result.stats.best_fitness);
    match result.stats.first_arrival {
        Some(generation) => println!("  First arrival: generation {}", generation),
        None => println!("  First arrival: never"),
    }
    println!(
        "Time: {:.2}s ({:.0} frames/s)",
        elapsed.as_secs_f32(),
        result.stats.total_frames as f32 / elapsed.as_secs_f32().max(1e-6)
    );

    if let Some(recorder) = recorder {
        match recorder.finalize() {
            Ok(stats) => println!("Replay: {}", stats),
            Err(e) => eprintln!("Error finalizing replay: {}", e),
        }
    }
}

fn print_example_config() {
    let arena =
        Arena::default().with_obstacle(Obstacle::from_corners((400.0, 150.0), (420.0, 450.0)));
    let mut config = EvolutionConfig::for_arena(arena);
    config.max_generations = Some(100);

    match serde_json::to_string_pretty(&config) {
        Ok(json) => {
            println!("Example configuration (config.json):");
            println!("{}", json);
        }
        Err(e) => eprintln!("Error serializing example: {}", e),
    }
}

//! Neuroevolver CLI - Run an evolutionary project from JSON configuration.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::de::DeserializeOwned;

use neuroevolver::{
    compute::evolution::{AssociationPlugin, Evolver},
    schema::{AssociationConfig, EvolverConfig},
};

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <config.json>", args[0]);
        eprintln!();
        eprintln!("Evolve spiking networks for the association experiment.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  config.json  Path to evolution configuration file");
        eprintln!();
        eprintln!("Experiment settings are read from <config>.association.json when present.");
        eprintln!("Example configuration is generated with --example flag.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_config();
        return;
    }

    let config_path = PathBuf::from(&args[1]);
    let config: EvolverConfig = load_json(&config_path).unwrap_or_else(|e| {
        eprintln!("Error loading config: {}", e);
        std::process::exit(1);
    });

    let association_path = config_path.with_extension("association.json");
    let association: AssociationConfig = if association_path.exists() {
        load_json(&association_path).unwrap_or_else(|e| {
            eprintln!("Error loading experiment settings: {}", e);
            std::process::exit(1);
        })
    } else {
        AssociationConfig::default()
    };
    if let Err(e) = association.validate() {
        eprintln!("Invalid experiment settings: {}", e);
        std::process::exit(1);
    }

    println!("Neuroevolver");
    println!("============");
    println!("Project: {}", config.project_dir().display());
    println!(
        "Generations: {} x {} species",
        config.num_generations, config.population_size
    );
    println!(
        "Winners per generation: {} ({:.1}%)",
        config.winner_count(),
        config.selection_fraction * 100.0
    );
    println!(
        "Neurons: {}, protocol: {}s at dt={}",
        association.num_neurons, association.max_time, config.time_step
    );
    println!();

    let evolver = Evolver::new(config, AssociationPlugin::new(association)).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    let start = Instant::now();
    let result = evolver.run(|summary| {
        let best = summary
            .best
            .map(|b| format!("{:.4} (species {})", b.score, b.species_idx))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  Generation {}: {} simulated, {} resumed, best={}, mean={:.4}, {:.1}s elapsed",
            summary.generation,
            summary.computed,
            summary.skipped,
            best,
            summary.mean.unwrap_or(f64::NAN),
            start.elapsed().as_secs_f32()
        );
    });

    match result {
        Ok(summaries) => {
            println!();
            if let Some(last) = summaries.last() {
                println!("Final winners: {:?}", last.winners);
            }
            println!("Time: {:.2}s", start.elapsed().as_secs_f32());
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, String> {
    let content = fs::read_to_string(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    serde_json::from_str(&content).map_err(|e| format!("{}: {}", path.display(), e))
}

fn print_example_config() {
    let config = EvolverConfig {
        num_generations: 5,
        population_size: 100,
        random_seed: Some(42),
        ..Default::default()
    };
    let association = AssociationConfig::default();

    println!("// config.json");
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_default()
    );
    println!();
    println!("// config.association.json");
    println!(
        "{}",
        serde_json::to_string_pretty(&association).unwrap_or_default()
    );
}

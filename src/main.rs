use std::env;

use markov_cohort::{
    read_transition_counts, run_strategies, Cohort, CohortOutcomes, ModelConfig, ModelError,
    ParameterSet, Therapy, TransitionCounts,
};
use markov_cohort::economics::run_strategies_with_counts;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        return;
    }
    run_cli(&args[1..]);
}

fn run_cli(args: &[String]) {
    let opts = parse_options(&args[1..]);

    let result = match args[0].as_str() {
        "simulate" | "s" => run_simulate(&opts),
        "compare" | "c" => run_compare(&opts),
        "config" => ModelConfig::default().to_json().map(|json| println!("{}", json)),
        "help" | "-h" | "--help" => {
            print_usage();
            Ok(())
        }
        _ => {
            eprintln!("Unknown command: {}", args[0]);
            print_usage();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

// === COMMANDS ===

fn run_simulate(opts: &CliOptions) -> Result<(), ModelError> {
    let config = opts.resolve_config()?;
    let counts = opts.resolve_counts(&config)?;
    let therapy = opts.therapy.unwrap_or(Therapy::Mono);
    let seed = opts.seed.unwrap_or(config.seed);

    let params = ParameterSet::from_counts(&config, &counts, therapy)?;
    let cohort = Cohort::new(1, config.population_size, config.horizon, &params)?;
    let outcomes = cohort.simulate(seed);

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&outcomes)?);
        return Ok(());
    }

    println!("\n==========================================");
    println!("   {}", therapy);
    println!("==========================================\n");
    println!("Patients: {}  |  Horizon: {} years  |  Seed: {}", config.population_size, config.horizon, seed);
    print_outcomes(&outcomes);
    print_survival_curve(&outcomes);
    Ok(())
}

fn run_compare(opts: &CliOptions) -> Result<(), ModelError> {
    let config = opts.resolve_config()?;
    let seed = opts.seed.unwrap_or(config.seed);
    let results = match &opts.counts_path {
        Some(_) => run_strategies_with_counts(&config, &opts.resolve_counts(&config)?, seed)?,
        None => run_strategies(&config, seed)?,
    };

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    println!("\n==========================================");
    println!("   Mono vs Combination Therapy");
    println!("==========================================\n");
    println!("Patients: {}  |  Horizon: {} years  |  Seed: {}", config.population_size, config.horizon, seed);

    println!("\n--- {} ---", Therapy::Mono);
    print_outcomes(&results.mono);
    println!("\n--- {} ---", Therapy::Combo);
    print_outcomes(&results.combo);

    let cmp = &results.comparison;
    println!("\n--- Incremental (Combination - Mono) ---");
    println!("Survival time:   {:+.2} years", cmp.incremental_survival);
    println!("Discounted cost: {:+.2}", cmp.incremental_cost);
    println!("Discounted QALY: {:+.4}", cmp.incremental_utility);
    match cmp.icer {
        Some(icer) => println!("ICER:            {:.2} per QALY", icer),
        None => println!("ICER:            undefined (no utility difference)"),
    }
    Ok(())
}

fn print_outcomes(outcomes: &CohortOutcomes) {
    println!("Mean survival time:       {:.2} years", outcomes.mean_survival_time());
    println!("Median survival time:     {:.1} years", outcomes.median_survival_time());
    println!("Deaths within horizon:    {}/{}", outcomes.n_deaths(), outcomes.population_size());
    println!("Mean discounted cost:     {:.2}", outcomes.mean_discounted_cost());
    println!("Mean discounted utility:  {:.4}", outcomes.mean_discounted_utility());
}

fn print_survival_curve(outcomes: &CohortOutcomes) {
    println!("\nYear  Alive");
    for (t, alive) in outcomes.survival_curve().iter().enumerate() {
        println!("{:>4}  {:>5}", t, alive);
    }
}

// === OPTIONS ===

#[derive(Default)]
struct CliOptions {
    therapy: Option<Therapy>,
    seed: Option<u64>,
    population: Option<usize>,
    horizon: Option<usize>,
    config_path: Option<String>,
    counts_path: Option<String>,
    json: bool,
}

/// Config picked up from the working directory when `--config` is not given.
const DEFAULT_CONFIG_PATH: &str = "cohort.json";

impl CliOptions {
    fn resolve_config(&self) -> Result<ModelConfig, ModelError> {
        let mut config = match &self.config_path {
            Some(path) => ModelConfig::load(path)?,
            None => ModelConfig::load_or_default(DEFAULT_CONFIG_PATH),
        };
        if let Some(n) = self.population { config.population_size = n; }
        if let Some(h) = self.horizon { config.horizon = h; }
        Ok(config)
    }

    fn resolve_counts(&self, config: &ModelConfig) -> Result<TransitionCounts, ModelError> {
        match &self.counts_path {
            Some(path) => read_transition_counts(path),
            None => config.counts(),
        }
    }
}

fn parse_options(args: &[String]) -> CliOptions {
    let mut opts = CliOptions::default();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--therapy" | "-t" => {
                if i + 1 < args.len() {
                    opts.therapy = Therapy::parse(&args[i + 1]);
                    if opts.therapy.is_none() {
                        eprintln!("Unknown therapy {:?}, using mono", args[i + 1]);
                    }
                    i += 1;
                }
            }
            "--seed" | "-s" => {
                if i + 1 < args.len() {
                    opts.seed = args[i + 1].parse().ok();
                    i += 1;
                }
            }
            "--population" | "-n" => {
                if i + 1 < args.len() {
                    opts.population = args[i + 1].parse().ok();
                    i += 1;
                }
            }
            "--horizon" | "-y" => {
                if i + 1 < args.len() {
                    opts.horizon = args[i + 1].parse().ok();
                    i += 1;
                }
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    opts.config_path = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--counts" => {
                if i + 1 < args.len() {
                    opts.counts_path = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--json" => {
                opts.json = true;
            }
            other => eprintln!("Ignoring unknown option: {}", other),
        }
        i += 1;
    }
    opts
}

fn print_usage() {
    println!("cohort: Markov cohort model, mono vs combination therapy");
    println!();
    println!("USAGE:");
    println!("  cohort simulate [options]    Simulate one therapy");
    println!("  cohort compare [options]     Simulate both therapies and compare");
    println!("  cohort config                Print the default config as JSON");
    println!();
    println!("OPTIONS:");
    println!("  -t, --therapy <mono|combo>   Therapy for simulate (default: mono)");
    println!("  -s, --seed <N>               Random seed (default: from config)");
    println!("  -n, --population <N>         Cohort size (default: 2000)");
    println!("  -y, --horizon <N>            Time steps in years (default: 20)");
    println!("  -c, --config <file.json>     Model config (default: ./cohort.json, else built-in HIV model)");
    println!("  --counts <file.csv>          Transition counts: from,<state>,... one row per state");
    println!("  --json                       Print outcomes as JSON instead of a summary");
    println!();
    println!("Set RUST_LOG=info for progress logging.");
}

//! Mixed Combat - Main Binary
//!
//! Text-based fraction battles: play one, simulate many, evaluate sums

use clap::{Parser, Subcommand, ValueEnum};
use mixed_combat::{
    core::parse_operation,
    game::{
        agent::{AnswerController, ZeroController},
        arena::{Arena, BattleResult},
        interactive_controller::InteractiveController,
        random_controller::RandomController,
        scripted_controller::ScriptedController,
        CombatLogger, OutputFormat, VerbosityLevel,
    },
    loader::{BattleConfig, ConfigLoader},
    simulate::{run_batch, AgentKind, BatchOptions},
    CombatError, Result,
};
use std::path::PathBuf;

/// Who answers the questions
#[derive(Debug, Clone, Copy, ValueEnum)]
enum ControllerType {
    /// Human play via stdin
    Interactive,
    /// Always answers at once and correctly
    Zero,
    /// Thinks a random time and sometimes errs
    Random,
    /// Follows a fixed script (requires --script)
    Scripted,
}

/// Verbosity level for battle output (custom parser supporting both names and numbers)
#[derive(Debug, Clone, Copy)]
struct VerbosityArg(VerbosityLevel);

impl std::str::FromStr for VerbosityArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "silent" | "0" => Ok(VerbosityArg(VerbosityLevel::Silent)),
            "minimal" | "1" => Ok(VerbosityArg(VerbosityLevel::Minimal)),
            "normal" | "2" => Ok(VerbosityArg(VerbosityLevel::Normal)),
            "verbose" | "3" => Ok(VerbosityArg(VerbosityLevel::Verbose)),
            _ => Err(format!(
                "invalid verbosity level '{s}' (expected: silent/0, minimal/1, normal/2, verbose/3)"
            )),
        }
    }
}

impl From<VerbosityArg> for VerbosityLevel {
    fn from(arg: VerbosityArg) -> Self {
        arg.0
    }
}

#[derive(Parser)]
#[command(name = "combat")]
#[command(about = "Mixed Combat - fraction arithmetic battles", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play one battle
    Play {
        /// Battle file (.json); the built-in battle if omitted
        #[arg(long, short = 'c', value_name = "BATTLE_FILE")]
        config: Option<PathBuf>,

        /// Controller answering the questions
        #[arg(long, value_enum, default_value = "interactive")]
        agent: ControllerType,

        /// Script for the scripted controller, e.g. "correct, wrong@1.5, 3/4"
        #[arg(long, value_name = "STEPS")]
        script: Option<String>,

        /// Chance of a wrong answer for the random controller
        #[arg(long, default_value_t = 0.2)]
        error_rate: f64,

        /// Set random seed for deterministic battles
        #[arg(long)]
        seed: Option<u64>,

        /// Verbosity level for battle output (0=silent, 1=minimal, 2=normal, 3=verbose)
        #[arg(long, default_value = "normal", short = 'v')]
        verbosity: VerbosityArg,

        /// Print events and the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run many battles in parallel and print statistics
    Simulate {
        /// Battle file (.json); the built-in battle if omitted
        #[arg(long, short = 'c', value_name = "BATTLE_FILE")]
        config: Option<PathBuf>,

        /// Number of battles to run
        #[arg(long, short = 'n', default_value_t = 100)]
        battles: usize,

        /// Batch seed; every battle derives its own from it
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Controller for every battle (zero or random)
        #[arg(long, value_enum, default_value = "random")]
        agent: ControllerType,

        /// Chance of a wrong answer for the random controller
        #[arg(long, default_value_t = 0.2)]
        error_rate: f64,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Evaluate a filled operation, e.g. "1 1/2 + 3/4 - 1/3"
    Eval {
        #[arg(value_name = "OPERATION")]
        operation: String,
    },

    /// Validate a battle file
    Check {
        #[arg(value_name = "BATTLE_FILE")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            config,
            agent,
            script,
            error_rate,
            seed,
            verbosity,
            json,
        } => {
            run_play(
                config,
                agent,
                script,
                error_rate,
                seed,
                verbosity.into(),
                json,
            )
            .await?
        }
        Commands::Simulate {
            config,
            battles,
            seed,
            agent,
            error_rate,
            json,
        } => run_simulate(config, battles, seed, agent, error_rate, json).await?,
        Commands::Eval { operation } => run_eval(&operation)?,
        Commands::Check { config } => run_check(config).await?,
    }

    Ok(())
}

async fn load_config(path: Option<PathBuf>) -> Result<BattleConfig> {
    match path {
        Some(path) => ConfigLoader::load_async(&path).await,
        None => ConfigLoader::default_battle(),
    }
}

async fn run_play(
    config: Option<PathBuf>,
    agent: ControllerType,
    script: Option<String>,
    error_rate: f64,
    seed: Option<u64>,
    verbosity: VerbosityLevel,
    json: bool,
) -> Result<()> {
    let config = load_config(config).await?;
    let seed = seed.unwrap_or_else(rand::random);

    let mut controller: Box<dyn AnswerController> = match agent {
        ControllerType::Interactive => Box::new(InteractiveController::stdio()),
        ControllerType::Zero => Box::new(ZeroController::new()),
        ControllerType::Random => {
            Box::new(RandomController::with_seed(seed.wrapping_add(1)).with_error_rate(error_rate))
        }
        ControllerType::Scripted => {
            let script = script.ok_or_else(|| {
                CombatError::InvalidConfig("--agent scripted requires --script".to_string())
            })?;
            Box::new(ScriptedController::parse(&script)?)
        }
    };

    let mut logger = CombatLogger::with_verbosity(verbosity);
    if json {
        logger.set_output_format(OutputFormat::Json);
    } else {
        logger.minimal(&format!(
            "{}: {} ({} HP) vs {} ({} HP), seed {}",
            if config.name.is_empty() { "Battle" } else { config.name.as_str() },
            config.player.name,
            config.player.hp,
            config.enemy.name,
            config.enemy.hp,
            seed
        ));
    }

    let mut arena = Arena::new(&config, seed, logger)?;
    let result = arena.run(controller.as_mut());

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&result);
    }
    Ok(())
}

fn print_result(result: &BattleResult) {
    println!();
    println!("=== {} ===", result.reason);
    println!("Rounds:        {}", result.rounds);
    println!("Revives:       {}", result.revives);
    println!("Attack total:  {}", result.attack_total);
    println!("Defense total: {}", result.defense_total);
    println!(
        "HP:            player {:.2}, enemy {:.2}",
        result.player_hp, result.enemy_hp
    );
    if let Some(score) = &result.score {
        let flags = result.victory.as_ref().map(|v| v.flags).unwrap_or_default();
        let mut rows = Vec::new();
        if flags.attack {
            rows.push(format!("attack {}", score.attack));
        }
        if flags.defense {
            rows.push(format!("defense {}", score.defense));
        }
        if flags.rounds {
            rows.push(format!("rounds {}", score.rounds));
        }
        rows.push(format!("victory {}", score.victory));
        if flags.revive {
            rows.push(format!("revives -{}", score.revive_penalty));
        }
        println!("Score:         {} ({})", score.total, rows.join(", "));
    }
}

async fn run_simulate(
    config: Option<PathBuf>,
    battles: usize,
    seed: u64,
    agent: ControllerType,
    error_rate: f64,
    json: bool,
) -> Result<()> {
    let config = load_config(config).await?;
    let agent = match agent {
        ControllerType::Zero => AgentKind::Zero,
        ControllerType::Random => AgentKind::Random {
            error_rate,
            think_min: 0.5,
            think_max: 3.0,
        },
        other => {
            return Err(CombatError::InvalidConfig(format!(
                "{:?} controller cannot run simulations",
                other
            )))
        }
    };
    let options = BatchOptions {
        battles,
        seed,
        agent,
        ..BatchOptions::default()
    };

    let summary = tokio::task::spawn_blocking(move || run_batch(&config, &options)).await??;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("=== Simulation (seed {}) ===", seed);
        println!("{}", summary);
    }
    Ok(())
}

fn run_eval(operation: &str) -> Result<()> {
    let ops = parse_operation(operation)?;
    let value = ops.evaluate_strict().ok_or_else(|| {
        CombatError::InvalidOperation(format!("'{}' has empty operands", operation))
    })?;
    println!("{} = {}", ops, value.simplified());
    Ok(())
}

async fn run_check(path: PathBuf) -> Result<()> {
    let config = ConfigLoader::load_async(&path).await?;
    let phases: Vec<&str> = [
        config.attack.as_ref().map(|_| "attack"),
        config.defense.as_ref().map(|_| "defense"),
    ]
    .into_iter()
    .flatten()
    .collect();
    println!(
        "{}: ok ({} vs {}, phases: {})",
        path.display(),
        config.player.name,
        config.enemy.name,
        phases.join(", ")
    );
    Ok(())
}

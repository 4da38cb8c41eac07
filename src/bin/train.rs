use clap::Parser;
use copa_dqn::agent::DqnAgent;
use copa_dqn::config::Config;
use copa_dqn::context::Context;
use copa_dqn::environment::CorridorEnv;
use copa_dqn::error::Result;
use copa_dqn::trainer::Trainer;
use log::info;
use std::path::PathBuf;
use std::process::ExitCode;

/// Train a DQN agent on the corridor environment
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// YAML configuration file; defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of episodes, overriding `epoch_num`
    #[arg(long)]
    epochs: Option<usize>,

    /// Random seed, overriding `seed`
    #[arg(long)]
    seed: Option<u64>,

    /// Directory for the training data CSV and config copy
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Directory for the final checkpoint
    #[arg(long)]
    checkpoint_dir: Option<PathBuf>,

    /// Checkpoint directory to resume from
    #[arg(long)]
    resume: Option<PathBuf>,

    /// Number of cells in the corridor
    #[arg(long, default_value_t = 10)]
    corridor_length: usize,
}

fn run(args: Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(epochs) = args.epochs {
        config.trainer.epoch_num = epochs;
    }
    if let Some(seed) = args.seed {
        config.agent.seed = seed;
    }
    if args.output_dir.is_some() {
        config.trainer.output_dir = args.output_dir.clone();
    }
    if args.checkpoint_dir.is_some() {
        config.trainer.checkpoint_dir = args.checkpoint_dir.clone();
    }
    config.validate()?;

    let max_steps = config.trainer.max_episode_steps.unwrap_or(200);
    let mut env = CorridorEnv::new(args.corridor_length, max_steps)?;
    let mut ctx = Context::new(config.agent.seed);
    let mut agent = DqnAgent::from_env(&mut ctx, &config.agent, &env)?;
    if let Some(dir) = &args.resume {
        agent.load_checkpoint(dir)?;
    }

    let trainer = Trainer::new(config.trainer.clone());
    let record = trainer.train(&mut agent, &mut env)?;
    trainer.store_records(&record, &config)?;

    if let Some(best) = record.best_avg_score {
        info!("Best average score {:.3}", best);
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

// Command-line entry point: train a TD3 agent or evaluate a saved one
use anyhow::Context;
use burn::{
    backend::{Autodiff, NdArray},
    prelude::Backend,
};
use clap::{Args, Parser, Subcommand, ValueEnum};

use td3::{
    algo::td3::{TD3Agent, TD3AgentConfig, TD3TrainingConfig},
    env::Environment,
    gym::{GlucoseEnv, Pendulum},
    run::{evaluate_policy, RunConfig, Trainer},
};

type TD3Backend = Autodiff<NdArray>;

const PENDULUM_MAX_STEPS: usize = 200;

#[derive(Parser, Debug)]
#[command(name = "td3-glucose")]
#[command(about = "TD3 reinforcement learning for basal insulin control", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug-level logging
    #[arg(long, global = true, default_value_t = false)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Train an agent, evaluating and checkpointing periodically
    Train(RunArgs),
    /// Load the checkpoint of a finished run and report its mean return
    Evaluate(RunArgs),
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum EnvKind {
    Glucose,
    Pendulum,
}

#[derive(Args, Debug, Clone)]
struct RunArgs {
    /// Environment to train on
    #[arg(long, value_enum, default_value_t = EnvKind::Glucose)]
    env: EnvKind,

    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Steps of uniformly random actions before the actor takes over
    #[arg(long = "start-timesteps", default_value_t = 1000)]
    start_timesteps: usize,

    /// Environment steps between evaluations
    #[arg(long = "eval-freq", default_value_t = 500)]
    eval_freq: usize,

    #[arg(long = "max-timesteps", default_value_t = 50_000)]
    max_timesteps: usize,

    /// Std of the Gaussian exploration noise
    #[arg(long = "expl-noise", default_value_t = 0.1)]
    expl_noise: f32,

    #[arg(long = "eval-episodes", default_value_t = 10)]
    eval_episodes: usize,

    /// Skip writing actor/critic checkpoints
    #[arg(long = "no-save-models", default_value_t = false)]
    no_save_models: bool,

    #[arg(long = "replay-capacity", default_value_t = 1_000_000)]
    replay_capacity: usize,

    #[arg(long = "batch-size", default_value_t = 100)]
    batch_size: usize,

    /// Discount factor
    #[arg(long, default_value_t = 0.99)]
    discount: f32,

    /// Target network update rate
    #[arg(long, default_value_t = 0.005)]
    tau: f32,

    /// Noise added to the target policy during critic updates
    #[arg(long = "policy-noise", default_value_t = 0.2)]
    policy_noise: f32,

    /// Range to clip target policy noise
    #[arg(long = "noise-clip", default_value_t = 0.5)]
    noise_clip: f32,

    /// Frequency of delayed policy updates
    #[arg(long = "policy-freq", default_value_t = 2)]
    policy_freq: usize,

    #[arg(long = "lr-actor", default_value_t = 1e-3)]
    lr_actor: f64,

    #[arg(long = "lr-critic", default_value_t = 1e-3)]
    lr_critic: f64,

    /// Hidden layer widths of the actor and both critics
    #[arg(long = "hidden", value_delimiter = ',', default_value = "400,300")]
    hidden_layers: Vec<usize>,

    /// Value gradient clipping for both optimizers
    #[arg(long = "gradient-clip")]
    gradient_clip: Option<f32>,

    #[arg(long = "results-dir", default_value = "./results")]
    results_dir: String,

    #[arg(long = "models-dir", default_value = "./models")]
    models_dir: String,
}

impl RunArgs {
    fn env_name(&self) -> &'static str {
        match self.env {
            EnvKind::Glucose => GlucoseEnv::DEFAULT_NAME,
            EnvKind::Pendulum => Pendulum::NAME,
        }
    }

    fn run_config(&self) -> RunConfig {
        let training = TD3TrainingConfig::new()
            .with_batch_size(self.batch_size)
            .with_discount(self.discount)
            .with_tau(self.tau)
            .with_policy_noise(self.policy_noise)
            .with_noise_clip(self.noise_clip)
            .with_policy_freq(self.policy_freq);

        RunConfig::new(self.env_name().to_string(), training)
            .with_seed(self.seed)
            .with_start_timesteps(self.start_timesteps)
            .with_eval_freq(self.eval_freq)
            .with_max_timesteps(self.max_timesteps)
            .with_expl_noise(self.expl_noise)
            .with_eval_episodes(self.eval_episodes)
            .with_save_models(!self.no_save_models)
            .with_replay_capacity(self.replay_capacity)
            .with_results_dir(self.results_dir.clone())
            .with_models_dir(self.models_dir.clone())
    }

    fn agent_config(&self) -> TD3AgentConfig {
        TD3AgentConfig {
            hidden_layers: self.hidden_layers.clone(),
            lr_actor: self.lr_actor,
            lr_critic: self.lr_critic,
            gradient_clip: self.gradient_clip,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Commands::Train(args) => match args.env {
            EnvKind::Glucose => train(&args, GlucoseEnv::new(args.seed)),
            EnvKind::Pendulum => train(&args, Pendulum::with_seed(PENDULUM_MAX_STEPS, args.seed)),
        },
        Commands::Evaluate(args) => match args.env {
            EnvKind::Glucose => evaluate(&args, GlucoseEnv::new(args.seed)),
            EnvKind::Pendulum => evaluate(&args, Pendulum::with_seed(PENDULUM_MAX_STEPS, args.seed)),
        },
    }
}

fn build_agent<E: Environment>(args: &RunArgs, env: &E) -> anyhow::Result<TD3Agent<TD3Backend>> {
    let device = Default::default();
    TD3Backend::seed(&device, args.seed);

    let action_space = env.action_space();
    let max_action = action_space
        .high
        .iter()
        .copied()
        .fold(f32::NEG_INFINITY, f32::max);
    anyhow::ensure!(max_action.is_finite(), "action space has no upper bound");

    Ok(TD3Agent::from_dims(
        env.observation_space().dim(),
        action_space.dim(),
        max_action,
        &args.agent_config(),
        &device,
    ))
}

fn train<E: Environment>(args: &RunArgs, env: E) -> anyhow::Result<()> {
    let config = args.run_config();
    let agent = build_agent(args, &env)?;

    let mut trainer = Trainer::new(config, agent, env).context("invalid run configuration")?;
    let outcome = trainer.run().context("training run failed")?;

    let last = outcome.evaluations.last().copied().unwrap_or_default();
    println!(
        "Trained for {} timesteps over {} episodes, final evaluation {:.3}",
        outcome.counters.total_timesteps, outcome.counters.episode_num, last
    );
    Ok(())
}

fn evaluate<E: Environment>(args: &RunArgs, mut env: E) -> anyhow::Result<()> {
    let config = args.run_config();
    config.validate()?;

    let mut agent = build_agent(args, &env)?;
    let run_id = config.run_id();
    agent
        .load(&run_id, config.models_dir())
        .with_context(|| format!("failed to load checkpoint {}", run_id))?;

    let avg_reward = evaluate_policy(&agent, &mut env, config.eval_episodes)?;
    println!("{}: average reward {:.3} over {} episodes", run_id, avg_reward, config.eval_episodes);
    Ok(())
}

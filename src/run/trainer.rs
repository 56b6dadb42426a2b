//! The outer training loop: environment interaction, replay storage,
//! per-episode training, periodic evaluation and checkpointing.

use burn::{config::Config, tensor::backend::AutodiffBackend};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use std::fs;

use crate::{
    algo::td3::{TD3ActorModel, TD3Agent, TD3CriticModel},
    env::{BoxSpace, Environment},
    error::{Result, Td3Error},
    memory::{ReplayBuffer, Transition},
    nn::{Actor, TwinCritic},
};

use super::{evaluate_policy, EvaluationHistory, RunConfig};

/// Run-level counters owned by the driver
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunCounters {
    pub total_timesteps: usize,
    pub episode_num: usize,
    pub episode_timesteps: usize,
    pub episode_reward: f32,
    pub timesteps_since_eval: usize,
}

/// What a finished run produced
#[derive(Debug, Clone)]
pub struct TrainOutcome {
    /// Baseline, periodic and final evaluation means, in order
    pub evaluations: Vec<f32>,
    pub counters: RunCounters,
}

/// Done flag stored in the replay buffer.
///
/// An episode cut off by the step horizon is not terminal for bootstrapping,
/// so its last transition is stored with 0.
pub fn corrected_done(episode_timesteps: usize, max_episode_steps: usize, done: bool) -> f32 {
    if episode_timesteps + 1 == max_episode_steps {
        0.0
    } else if done {
        1.0
    } else {
        0.0
    }
}

/// Add `N(0, expl_noise)` to every component, then clip into `space`.
pub fn exploration_action<R: Rng + ?Sized>(
    mut action: Vec<f32>,
    expl_noise: f32,
    space: &BoxSpace,
    rng: &mut R,
) -> Result<Vec<f32>> {
    if action.len() != space.dim() {
        return Err(Td3Error::shape("action", space.dim(), action.len()));
    }
    if expl_noise != 0.0 {
        let normal = Normal::new(0.0, expl_noise)
            .map_err(|e| Td3Error::invalid(format!("exploration noise: {}", e)))?;
        for a in action.iter_mut() {
            *a += normal.sample(rng);
        }
    }
    space.clip(&mut action);
    Ok(action)
}

/// Synchronous TD3 training driver
///
/// Collection and learning never overlap: the agent trains only between
/// episodes, one gradient step per environment step of the finished episode.
pub struct Trainer<B, E, A = Actor<B>, C = TwinCritic<B>>
where
    B: AutodiffBackend,
    E: Environment,
    A: TD3ActorModel<B>,
    C: TD3CriticModel<B>,
{
    config: RunConfig,
    agent: TD3Agent<B, A, C>,
    env: E,
    buffer: ReplayBuffer,
    rng: StdRng,
    history: EvaluationHistory,
    counters: RunCounters,
}

impl<B, E, A, C> Trainer<B, E, A, C>
where
    B: AutodiffBackend,
    E: Environment,
    A: TD3ActorModel<B>,
    C: TD3CriticModel<B>,
{
    pub fn new(config: RunConfig, agent: TD3Agent<B, A, C>, env: E) -> Result<Self> {
        config.validate()?;
        if agent.state_dim() != env.observation_space().dim() {
            return Err(Td3Error::shape(
                "agent state",
                env.observation_space().dim(),
                agent.state_dim(),
            ));
        }
        if agent.action_dim() != env.action_space().dim() {
            return Err(Td3Error::shape(
                "agent action",
                env.action_space().dim(),
                agent.action_dim(),
            ));
        }

        Ok(Self {
            buffer: ReplayBuffer::with_seed(config.replay_capacity, config.seed),
            rng: StdRng::seed_from_u64(config.seed),
            history: EvaluationHistory::new(config.run_id()),
            counters: RunCounters::default(),
            config,
            agent,
            env,
        })
    }

    pub fn agent(&self) -> &TD3Agent<B, A, C> {
        &self.agent
    }

    pub fn buffer(&self) -> &ReplayBuffer {
        &self.buffer
    }

    pub fn counters(&self) -> &RunCounters {
        &self.counters
    }

    pub fn history(&self) -> &EvaluationHistory {
        &self.history
    }

    /// Train until `max_timesteps` environment steps have been taken.
    ///
    /// Evaluates the untrained policy first and the final policy last;
    /// both always end up in the evaluation history.
    pub fn run(&mut self) -> Result<TrainOutcome> {
        let run_id = self.config.run_id();
        let results_dir = self.config.results_dir();
        let models_dir = self.config.models_dir();

        fs::create_dir_all(&results_dir)?;
        if self.config.save_models {
            fs::create_dir_all(&models_dir)?;
        }
        self.config
            .save(results_dir.join(format!("{}_config.json", run_id)))?;
        log::info!("Settings: {}", run_id);

        let baseline = self.evaluate()?;
        self.history.push(baseline);

        let max_episode_steps = self.env.max_episode_steps();
        let mut state = Vec::new();
        let mut done = true;

        while self.counters.total_timesteps < self.config.max_timesteps {
            if done {
                if self.counters.total_timesteps != 0 {
                    log::info!(
                        "Total Timesteps: {} Episode Num: {} Reward: {:.3}",
                        self.counters.total_timesteps,
                        self.counters.episode_num,
                        self.counters.episode_reward
                    );
                    self.train_on_episode()?;
                }

                if self.counters.timesteps_since_eval >= self.config.eval_freq {
                    self.counters.timesteps_since_eval %= self.config.eval_freq;
                    let avg_reward = self.evaluate()?;
                    self.history.push(avg_reward);
                    if self.config.save_models {
                        self.agent.save(&run_id, &models_dir)?;
                    }
                    self.history.save(&results_dir)?;
                }

                state = self.env.reset();
                done = false;
                self.counters.episode_reward = 0.0;
                self.counters.episode_timesteps = 0;
                self.counters.episode_num += 1;
            }

            let action = if self.counters.total_timesteps < self.config.start_timesteps {
                self.env.action_space().sample(&mut self.rng)
            } else {
                let greedy = self.agent.select_action(&state)?;
                exploration_action(
                    greedy,
                    self.config.expl_noise,
                    self.env.action_space(),
                    &mut self.rng,
                )?
            };

            let step = self.env.step(&action)?;
            let done_flag = corrected_done(self.counters.episode_timesteps, max_episode_steps, step.done);
            self.counters.episode_reward += step.reward;

            let next_state = step.next_state;
            self.buffer.add(Transition {
                state: std::mem::replace(&mut state, next_state.clone()),
                next_state,
                action,
                reward: step.reward,
                done: done_flag,
            });
            done = step.done;

            self.counters.episode_timesteps += 1;
            self.counters.total_timesteps += 1;
            self.counters.timesteps_since_eval += 1;
        }

        let final_reward = self.evaluate()?;
        self.history.push(final_reward);
        if self.config.save_models {
            self.agent.save(&run_id, &models_dir)?;
        }
        let path = self.history.save(&results_dir)?;
        log::info!(
            "Finished {} after {} timesteps, {} evaluations written to {}",
            run_id,
            self.counters.total_timesteps,
            self.history.evaluations.len(),
            path.display()
        );

        Ok(TrainOutcome {
            evaluations: self.history.evaluations.clone(),
            counters: self.counters.clone(),
        })
    }

    /// One gradient step per environment step of the episode that just ended
    ///
    /// Fails when the buffer cannot yet provide a full batch; lower
    /// `batch_size` or raise `start_timesteps` for short episodes.
    fn train_on_episode(&mut self) -> Result<()> {
        let iterations = self.counters.episode_timesteps;
        if iterations == 0 {
            return Ok(());
        }

        let metrics = self
            .agent
            .train(&mut self.buffer, iterations, &self.config.training)?;
        log::debug!(
            "episode {}: critic loss {:.4}, actor loss {:.4}",
            self.counters.episode_num,
            metrics.critic_loss,
            metrics.actor_loss
        );
        Ok(())
    }

    fn evaluate(&mut self) -> Result<f32> {
        evaluate_policy(&self.agent, &mut self.env, self.config.eval_episodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn horizon_cutoff_is_not_terminal() {
        // last step of a 200-step horizon
        assert_eq!(corrected_done(199, 200, true), 0.0);
        // true terminal state before the horizon
        assert_eq!(corrected_done(10, 200, true), 1.0);
        assert_eq!(corrected_done(10, 200, false), 0.0);
    }

    #[test]
    fn exploration_actions_stay_in_bounds() {
        let space = BoxSpace::new(vec![0.0, -2.0], vec![0.05, 2.0]).unwrap();
        let mut rng = StdRng::seed_from_u64(11);

        for i in 0..2000 {
            let greedy = vec![(i as f32 % 7.0) - 3.0, (i as f32 % 5.0) - 2.5];
            let action = exploration_action(greedy, 5.0, &space, &mut rng).unwrap();
            assert!(space.contains(&action), "{:?} escaped the bounds", action);
        }
    }

    #[test]
    fn zero_noise_only_clips() {
        let space = BoxSpace::uniform(2, -1.0, 1.0).unwrap();
        let mut rng = StdRng::seed_from_u64(0);

        let action = exploration_action(vec![0.3, 4.0], 0.0, &space, &mut rng).unwrap();
        assert_eq!(action, vec![0.3, 1.0]);
    }

    #[test]
    fn exploration_rejects_wrong_width() {
        let space = BoxSpace::uniform(2, -1.0, 1.0).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        assert!(exploration_action(vec![0.0], 0.1, &space, &mut rng).is_err());
    }
}

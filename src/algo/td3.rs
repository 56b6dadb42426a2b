//! Twin Delayed Deep Deterministic Policy Gradient (TD3)
//!
//! TD3 is an off-policy actor-critic algorithm for continuous action spaces.
//! It improves upon DDPG with three key changes:
//! 1. Twin critic pathways, the bootstrap target uses the smaller of the two estimates
//! 2. Delayed policy updates (actor and targets move once every `policy_freq` critic steps)
//! 3. Target policy smoothing (clipped Gaussian noise on the target action)
//!
//! # Update rule
//!
//! For each of `iterations` steps of [`TD3Agent::train`]:
//!
//! ```text
//! a'  = clip(π'(s') + clip(N(0, σ), -c, c), -max_action, max_action)
//! y   = r + (1 - done) · γ · min(Q1'(s', a'), Q2'(s', a'))
//! L_Q = MSE(Q1(s, a), y) + MSE(Q2(s, a), y)            (every step)
//! L_π = -mean(Q1(s, π(s)))                             (every policy_freq-th step)
//! θ'  ← τθ + (1 − τ)θ'                                 (same steps as L_π)
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use burn::backend::{Autodiff, NdArray};
//! use td3::{algo::td3::{TD3Agent, TD3AgentConfig, TD3TrainingConfig}, memory::ReplayBuffer};
//!
//! type Backend = Autodiff<NdArray>;
//!
//! let device = Default::default();
//! let mut agent = TD3Agent::<Backend>::from_dims(3, 1, 2.0, &TD3AgentConfig::default(), &device);
//! let mut buffer = ReplayBuffer::new(1_000_000);
//! // ... fill the buffer from environment interaction ...
//! let metrics = agent.train(&mut buffer, 200, &TD3TrainingConfig::new())?;
//! ```
//!
//! Reference: "Addressing Function Approximation Error in Actor-Critic Methods" (Fujimoto et al., 2018)

use burn::{
    grad_clipping::GradientClippingConfig,
    module::AutodiffModule,
    nn::loss::{MseLoss, Reduction},
    optim::{adaptor::OptimizerAdaptor, AdamW, AdamWConfig, GradientsParams, Optimizer},
    prelude::*,
    record::{BinFileRecorder, FullPrecisionSettings},
    tensor::{backend::AutodiffBackend, Distribution, TensorData},
};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::{
    error::{Result as Td3Result, Td3Error},
    memory::{Batch, ReplayBuffer},
    nn::{Actor, ActorConfig, CriticConfig, TwinCritic},
    traits::{column, Policy, ToTensor, TrainingMetrics},
};

/// TD3 actor model trait - outputs deterministic actions
pub trait TD3ActorModel<B: AutodiffBackend>: AutodiffModule<B> {
    /// Forward pass: states `[batch, state_dim]` -> actions `[batch, action_dim]`,
    /// bounded in `[-max_action, max_action]`
    fn forward(&self, state: Tensor<B, 2>) -> Tensor<B, 2>;

    fn max_action(&self) -> f32;

    fn state_dim(&self) -> usize;

    fn action_dim(&self) -> usize;

    /// Soft update: θ′ ← τθ + (1 − τ)θ′
    fn soft_update(&mut self, other: &Self, tau: f32);
}

/// TD3 critic model trait - two Q-value estimates per state-action pair
pub trait TD3CriticModel<B: AutodiffBackend>: AutodiffModule<B> {
    /// Forward pass: (state, action) -> (Q1, Q2), each `[batch, 1]`
    fn forward(&self, state: Tensor<B, 2>, action: Tensor<B, 2>) -> (Tensor<B, 2>, Tensor<B, 2>);

    /// Q1 only, used by the actor loss
    fn q1(&self, state: Tensor<B, 2>, action: Tensor<B, 2>) -> Tensor<B, 2>;

    /// Width of the `(state, action)` input
    fn input_dim(&self) -> usize;

    /// Soft update: θ′ ← τθ + (1 − τ)θ′
    fn soft_update(&mut self, other: &Self, tau: f32);
}

impl<B: AutodiffBackend> TD3ActorModel<B> for Actor<B> {
    fn forward(&self, state: Tensor<B, 2>) -> Tensor<B, 2> {
        Actor::forward(self, state)
    }

    fn max_action(&self) -> f32 {
        Actor::max_action(self)
    }

    fn state_dim(&self) -> usize {
        Actor::state_dim(self)
    }

    fn action_dim(&self) -> usize {
        Actor::action_dim(self)
    }

    fn soft_update(&mut self, other: &Self, tau: f32) {
        Actor::soft_update(self, other, tau)
    }
}

impl<B: AutodiffBackend> TD3CriticModel<B> for TwinCritic<B> {
    fn forward(&self, state: Tensor<B, 2>, action: Tensor<B, 2>) -> (Tensor<B, 2>, Tensor<B, 2>) {
        TwinCritic::forward(self, state, action)
    }

    fn q1(&self, state: Tensor<B, 2>, action: Tensor<B, 2>) -> Tensor<B, 2> {
        TwinCritic::q1(self, state, action)
    }

    fn input_dim(&self) -> usize {
        TwinCritic::input_dim(self)
    }

    fn soft_update(&mut self, other: &Self, tau: f32) {
        TwinCritic::soft_update(self, other, tau)
    }
}

/// Network and optimizer settings for the TD3 agent
#[derive(Debug, Clone)]
pub struct TD3AgentConfig {
    /// Hidden layer sizes shared by the actor and both critic pathways (default: [400, 300])
    pub hidden_layers: Vec<usize>,
    /// Actor learning rate (default: 1e-3)
    pub lr_actor: f64,
    /// Critic learning rate (default: 1e-3)
    pub lr_critic: f64,
    /// Gradient clipping value (default: None)
    pub gradient_clip: Option<f32>,
}

impl Default for TD3AgentConfig {
    fn default() -> Self {
        Self {
            hidden_layers: vec![400, 300],
            lr_actor: 1e-3,
            lr_critic: 1e-3,
            gradient_clip: None,
        }
    }
}

/// Hyperparameters of a single `train` call
#[derive(Config, Debug)]
pub struct TD3TrainingConfig {
    /// Transitions sampled per gradient step
    #[config(default = 100)]
    pub batch_size: usize,
    /// Discount factor γ
    #[config(default = 0.99)]
    pub discount: f32,
    /// Polyak averaging weight τ for target networks
    #[config(default = 0.005)]
    pub tau: f32,
    /// Std of the Gaussian noise added to target actions
    #[config(default = 0.2)]
    pub policy_noise: f32,
    /// Target noise is clipped to [-noise_clip, noise_clip]
    #[config(default = 0.5)]
    pub noise_clip: f32,
    /// Actor and targets update once every `policy_freq` critic updates
    #[config(default = 2)]
    pub policy_freq: usize,
}

impl TD3TrainingConfig {
    pub fn validate(&self) -> Td3Result<()> {
        if self.batch_size == 0 {
            return Err(Td3Error::invalid("batch_size must be positive"));
        }
        if self.policy_freq == 0 {
            return Err(Td3Error::invalid("policy_freq must be positive"));
        }
        if !(0.0..=1.0).contains(&self.tau) {
            return Err(Td3Error::invalid(format!("tau {} is outside [0, 1]", self.tau)));
        }
        if self.policy_noise < 0.0 || self.noise_clip < 0.0 {
            return Err(Td3Error::invalid("policy_noise and noise_clip must be non-negative"));
        }
        Ok(())
    }
}

/// Adam without weight decay, optionally clipping gradients by value
fn adam_config(gradient_clip: Option<f32>) -> AdamWConfig {
    AdamWConfig::new()
        .with_weight_decay(0.0)
        .with_grad_clipping(gradient_clip.map(GradientClippingConfig::Value))
}

fn adamw<B, M>(gradient_clip: Option<f32>) -> OptimizerAdaptor<AdamW, M, B>
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
{
    adam_config(gradient_clip).init()
}

/// Dimensions stored next to a checkpoint, checked before any tensor is read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct CheckpointMeta {
    state_dim: usize,
    action_dim: usize,
    max_action: f32,
}

/// TD3 agent for continuous action spaces
///
/// Generic over:
/// - `B`: Autodiff backend (e.g., `Autodiff<NdArray>`)
/// - `A`: Actor network implementing [`TD3ActorModel`]
/// - `C`: Twin critic implementing [`TD3CriticModel`]
pub struct TD3Agent<B, A = Actor<B>, C = TwinCritic<B>>
where
    B: AutodiffBackend,
    A: AutodiffModule<B>,
    C: AutodiffModule<B>,
{
    actor: A,
    target_actor: A,
    critic: C,
    target_critic: C,

    device: B::Device,

    lr_actor: f64,
    lr_critic: f64,
    state_dim: usize,
    action_dim: usize,
    max_action: f32,

    // Lifetime update counters
    critic_updates: usize,
    actor_updates: usize,
    target_updates: usize,

    optimizer_actor: OptimizerAdaptor<AdamW, A, B>,
    optimizer_critic: OptimizerAdaptor<AdamW, C, B>,
}

impl<B: AutodiffBackend> TD3Agent<B> {
    /// Build the default MLP actor and twin critic for the given dimensions
    pub fn from_dims(
        state_dim: usize,
        action_dim: usize,
        max_action: f32,
        config: &TD3AgentConfig,
        device: &B::Device,
    ) -> Self {
        let actor = ActorConfig::new(state_dim, action_dim, max_action)
            .with_hidden_layers(config.hidden_layers.clone())
            .init(device);
        let critic = CriticConfig::new(state_dim, action_dim)
            .with_hidden_layers(config.hidden_layers.clone())
            .init(device);

        Self::new(actor, critic, config, device)
    }
}

impl<B, A, C> TD3Agent<B, A, C>
where
    B: AutodiffBackend,
    A: TD3ActorModel<B>,
    C: TD3CriticModel<B>,
{
    /// Create a new TD3 agent; the targets start as hard copies of the live networks
    ///
    /// # Panics
    /// If the critic input width is not `state_dim + action_dim` of the actor.
    pub fn new(actor: A, critic: C, config: &TD3AgentConfig, device: &B::Device) -> Self {
        let state_dim = actor.state_dim();
        let action_dim = actor.action_dim();
        let max_action = actor.max_action();
        assert_eq!(
            critic.input_dim(),
            state_dim + action_dim,
            "critic input must be the concatenated state and action"
        );

        Self {
            target_actor: actor.clone(),
            target_critic: critic.clone(),
            actor,
            critic,
            device: device.clone(),
            lr_actor: config.lr_actor,
            lr_critic: config.lr_critic,
            state_dim,
            action_dim,
            max_action,
            critic_updates: 0,
            actor_updates: 0,
            target_updates: 0,
            optimizer_actor: adamw(config.gradient_clip),
            optimizer_critic: adamw(config.gradient_clip),
        }
    }

    pub fn state_dim(&self) -> usize {
        self.state_dim
    }

    pub fn action_dim(&self) -> usize {
        self.action_dim
    }

    pub fn max_action(&self) -> f32 {
        self.max_action
    }

    pub fn actor(&self) -> &A {
        &self.actor
    }

    pub fn target_actor(&self) -> &A {
        &self.target_actor
    }

    pub fn critic(&self) -> &C {
        &self.critic
    }

    pub fn target_critic(&self) -> &C {
        &self.target_critic
    }

    /// Gradient steps applied to the live critics since construction
    pub fn critic_updates(&self) -> usize {
        self.critic_updates
    }

    /// Gradient steps applied to the live actor since construction
    pub fn actor_updates(&self) -> usize {
        self.actor_updates
    }

    /// Polyak averaging passes applied to the targets since construction
    pub fn target_updates(&self) -> usize {
        self.target_updates
    }

    /// Deterministic action π(s) for a single state, no exploration noise
    pub fn select_action(&self, state: &[f32]) -> Td3Result<Vec<f32>> {
        if state.len() != self.state_dim {
            return Err(Td3Error::shape("state", self.state_dim, state.len()));
        }

        let data = TensorData::new(state.to_vec(), [1, self.state_dim]).convert::<B::FloatElem>();
        let state = Tensor::<B, 2>::from_data(data, &self.device);
        let action = self.actor.forward(state).detach();

        action
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| Td3Error::Tensor(format!("{:?}", e)))
    }

    /// Run `iterations` TD3 update steps on batches sampled from `buffer`
    ///
    /// Fails without touching any parameter if the hyperparameters are invalid;
    /// fails as soon as the buffer cannot provide a batch.
    pub fn train(
        &mut self,
        buffer: &mut ReplayBuffer,
        iterations: usize,
        config: &TD3TrainingConfig,
    ) -> Td3Result<TrainingMetrics> {
        config.validate()?;

        let mut metrics = TrainingMetrics::default();
        let mut critic_loss_sum = 0.0;
        let mut actor_loss_sum = 0.0;

        for it in 0..iterations {
            let batch = buffer.sample(config.batch_size)?;
            self.check_batch(&batch)?;

            let states: Tensor<B, 2> = batch.states.as_slice().to_tensor(&self.device);
            let next_states: Tensor<B, 2> = batch.next_states.as_slice().to_tensor(&self.device);
            let actions: Tensor<B, 2> = batch.actions.as_slice().to_tensor(&self.device);
            let rewards = column::<B>(&batch.rewards, &self.device);
            let dones = column::<B>(&batch.dones, &self.device);

            critic_loss_sum += self.update_critic(&states, actions, next_states, rewards, dones, config);
            metrics.critic_updates += 1;

            // Delayed policy update
            if it % config.policy_freq == 0 {
                actor_loss_sum += self.update_actor(&states);
                metrics.actor_updates += 1;

                self.soft_update_targets(config.tau);
                metrics.target_updates += 1;
            }
        }

        if metrics.critic_updates > 0 {
            metrics.critic_loss = critic_loss_sum / metrics.critic_updates as f32;
        }
        if metrics.actor_updates > 0 {
            metrics.actor_loss = actor_loss_sum / metrics.actor_updates as f32;
        }

        log::debug!(
            "td3 train: {} critic / {} actor updates, critic loss {:.4}, actor loss {:.4}",
            metrics.critic_updates,
            metrics.actor_updates,
            metrics.critic_loss,
            metrics.actor_loss
        );

        Ok(metrics)
    }

    fn check_batch(&self, batch: &Batch) -> Td3Result<()> {
        let rows = [
            ("sampled state", &batch.states, self.state_dim),
            ("sampled next state", &batch.next_states, self.state_dim),
            ("sampled action", &batch.actions, self.action_dim),
        ];
        for (what, values, expected) in rows {
            if let Some(row) = values.iter().find(|row| row.len() != expected) {
                return Err(Td3Error::shape(what, expected, row.len()));
            }
        }
        Ok(())
    }

    /// One joint gradient step on both critic pathways, returns the loss
    fn update_critic(
        &mut self,
        states: &Tensor<B, 2>,
        actions: Tensor<B, 2>,
        next_states: Tensor<B, 2>,
        rewards: Tensor<B, 2>,
        dones: Tensor<B, 2>,
        config: &TD3TrainingConfig,
    ) -> f32 {
        // Target policy smoothing
        let next_actions = self.target_actor.forward(next_states.clone());
        let noise = Tensor::random_like(
            &next_actions,
            Distribution::Normal(0.0, config.policy_noise as f64),
        )
        .clamp(-config.noise_clip, config.noise_clip);
        let next_actions = next_actions
            .add(noise)
            .clamp(-self.max_action, self.max_action);

        // y = r + (1 - done) * γ * min(Q1', Q2'), a constant for this update
        let (target_q1, target_q2) = self.target_critic.forward(next_states, next_actions);
        let not_done = dones.neg().add_scalar(1.0);
        let target = rewards
            .add(target_q1.min_pair(target_q2).mul(not_done).mul_scalar(config.discount))
            .detach();

        let (q1, q2) = self.critic.forward(states.clone(), actions);
        let mse = MseLoss::new();
        let loss = mse.forward(q1, target.clone(), Reduction::Mean)
            + mse.forward(q2, target, Reduction::Mean);
        let loss_val = loss.clone().into_scalar().elem::<f32>();

        let grads = GradientsParams::from_grads(loss.backward(), &self.critic);
        self.critic = self
            .optimizer_critic
            .step(self.lr_critic, self.critic.clone(), grads);
        self.critic_updates += 1;

        loss_val
    }

    /// Gradient ascent on Q1(s, π(s)), returns the actor loss
    fn update_actor(&mut self, states: &Tensor<B, 2>) -> f32 {
        let actions = self.actor.forward(states.clone());
        let loss = self.critic.q1(states.clone(), actions).mean().neg();
        let loss_val = loss.clone().into_scalar().elem::<f32>();

        // Only the actor's gradients are applied; the critic stays untouched here.
        let grads = GradientsParams::from_grads(loss.backward(), &self.actor);
        self.actor = self
            .optimizer_actor
            .step(self.lr_actor, self.actor.clone(), grads);
        self.actor_updates += 1;

        loss_val
    }

    fn soft_update_targets(&mut self, tau: f32) {
        self.target_actor.soft_update(&self.actor, tau);
        self.target_critic.soft_update(&self.critic, tau);
        self.target_updates += 1;
    }

    /// Persist the live actor and critic as `{dir}/{id}_actor.bin` and `{dir}/{id}_critic.bin`
    ///
    /// Their dimensions go to `{dir}/{id}_meta.json`. Target networks are not saved.
    pub fn save(&self, id: &str, dir: impl AsRef<Path>) -> Td3Result<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let meta = CheckpointMeta {
            state_dim: self.state_dim,
            action_dim: self.action_dim,
            max_action: self.max_action,
        };
        fs::write(
            dir.join(format!("{}_meta.json", id)),
            serde_json::to_vec_pretty(&meta)?,
        )?;

        let recorder = BinFileRecorder::<FullPrecisionSettings>::new();
        self.actor
            .clone()
            .save_file(dir.join(format!("{}_actor.bin", id)), &recorder)
            .map_err(|e| Td3Error::Recorder(e.to_string()))?;
        self.critic
            .clone()
            .save_file(dir.join(format!("{}_critic.bin", id)), &recorder)
            .map_err(|e| Td3Error::Recorder(e.to_string()))?;

        log::debug!("saved {} to {}", id, dir.display());
        Ok(())
    }

    /// Restore the live actor and critic saved under `id`, then re-sync the
    /// targets from them
    ///
    /// A checkpoint with other state/action dimensions is rejected with
    /// [`Td3Error::ShapeMismatch`] and leaves the agent unchanged.
    pub fn load(&mut self, id: &str, dir: impl AsRef<Path>) -> Td3Result<()> {
        let dir = dir.as_ref();

        let meta: CheckpointMeta =
            serde_json::from_slice(&fs::read(dir.join(format!("{}_meta.json", id)))?)?;
        if meta.state_dim != self.state_dim {
            return Err(Td3Error::shape("checkpoint state", self.state_dim, meta.state_dim));
        }
        if meta.action_dim != self.action_dim {
            return Err(Td3Error::shape("checkpoint action", self.action_dim, meta.action_dim));
        }
        if meta.max_action != self.max_action {
            log::warn!(
                "checkpoint {} was trained with max_action {}, agent uses {}",
                id,
                meta.max_action,
                self.max_action
            );
        }

        let recorder = BinFileRecorder::<FullPrecisionSettings>::new();
        let actor = self
            .actor
            .clone()
            .load_file(dir.join(format!("{}_actor.bin", id)), &recorder, &self.device)
            .map_err(|e| Td3Error::Recorder(e.to_string()))?;
        let critic = self
            .critic
            .clone()
            .load_file(dir.join(format!("{}_critic.bin", id)), &recorder, &self.device)
            .map_err(|e| Td3Error::Recorder(e.to_string()))?;

        self.target_actor = actor.clone();
        self.target_critic = critic.clone();
        self.actor = actor;
        self.critic = critic;

        log::info!("loaded {} from {}", id, dir.display());
        Ok(())
    }
}

impl<B, A, C> Policy for TD3Agent<B, A, C>
where
    B: AutodiffBackend,
    A: TD3ActorModel<B>,
    C: TD3CriticModel<B>,
{
    fn select_action(&self, state: &[f32]) -> Td3Result<Vec<f32>> {
        TD3Agent::select_action(self, state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::Transition;
    use burn::backend::{Autodiff, NdArray};

    type TestBackend = Autodiff<NdArray>;

    fn small_agent(state_dim: usize, action_dim: usize) -> TD3Agent<TestBackend> {
        let config = TD3AgentConfig {
            hidden_layers: vec![16, 16],
            ..Default::default()
        };
        TD3Agent::from_dims(state_dim, action_dim, 1.0, &config, &Default::default())
    }

    fn filled_buffer(n: usize, state_dim: usize, action_dim: usize) -> ReplayBuffer {
        let mut buffer = ReplayBuffer::with_seed(1000, 5);
        for i in 0..n {
            let x = i as f32 / n as f32;
            buffer.add(Transition {
                state: vec![x; state_dim],
                next_state: vec![x + 0.01; state_dim],
                action: vec![x - 0.5; action_dim],
                reward: -x,
                done: if i % 10 == 9 { 1.0 } else { 0.0 },
            });
        }
        buffer
    }

    fn probe(rows: usize, width: usize) -> Tensor<TestBackend, 2> {
        let values: Vec<f32> = (0..rows * width)
            .map(|i| ((i * 7 % 11) as f32 - 5.0) / 5.0)
            .collect();
        Tensor::from_data(TensorData::new(values, [rows, width]), &Default::default())
    }

    /// Outputs on fixed inputs; any parameter change shows up here.
    fn actor_probe<A: TD3ActorModel<TestBackend>>(actor: &A) -> Vec<f32> {
        actor
            .forward(probe(4, actor.state_dim()))
            .into_data()
            .to_vec::<f32>()
            .unwrap()
    }

    fn critic_probe<C: TD3CriticModel<TestBackend>>(critic: &C, state_dim: usize) -> Vec<f32> {
        let states = probe(4, state_dim);
        let actions = probe(4, critic.input_dim() - state_dim);
        let (q1, q2) = critic.forward(states, actions);
        let mut values = q1.into_data().to_vec::<f32>().unwrap();
        values.extend(q2.into_data().to_vec::<f32>().unwrap());
        values
    }

    #[test]
    fn optimizers_apply_no_weight_decay() {
        let plain = serde_json::to_value(adam_config(None)).unwrap();
        assert_eq!(plain["weight_decay"], 0.0);
        assert!(plain["grad_clipping"].is_null());

        let clipped = serde_json::to_value(adam_config(Some(1.0))).unwrap();
        assert_eq!(clipped["weight_decay"], 0.0);
        assert!(!clipped["grad_clipping"].is_null());
    }

    #[test]
    fn select_action_is_deterministic_and_bounded() {
        let agent = small_agent(3, 2);
        let state = [0.3, -0.7, 12.0];

        let a1 = agent.select_action(&state).unwrap();
        let a2 = agent.select_action(&state).unwrap();

        assert_eq!(a1.len(), 2);
        assert_eq!(a1, a2);
        assert!(a1.iter().all(|a| a.abs() <= 1.0));
    }

    #[test]
    fn select_action_rejects_wrong_state_length() {
        let agent = small_agent(3, 1);
        assert!(matches!(
            agent.select_action(&[1.0, 2.0]),
            Err(Td3Error::ShapeMismatch { expected: 3, found: 2, .. })
        ));
    }

    #[test]
    fn targets_start_as_copies() {
        let agent = small_agent(3, 1);
        assert_eq!(actor_probe(agent.actor()), actor_probe(agent.target_actor()));
        assert_eq!(
            critic_probe(agent.critic(), 3),
            critic_probe(agent.target_critic(), 3)
        );
    }

    #[test]
    fn train_delays_actor_and_target_updates() {
        let mut agent = small_agent(2, 1);
        let mut buffer = filled_buffer(50, 2, 1);
        let config = TD3TrainingConfig::new().with_batch_size(8).with_policy_freq(3);

        let metrics = agent.train(&mut buffer, 9, &config).unwrap();

        assert_eq!(metrics.critic_updates, 9);
        // iterations 0, 3, 6
        assert_eq!(metrics.actor_updates, 3);
        assert_eq!(metrics.target_updates, 3);
        assert!(metrics.critic_loss.is_finite());
        assert!(metrics.actor_loss.is_finite());

        let config = TD3TrainingConfig::new().with_batch_size(8).with_policy_freq(2);
        let metrics = agent.train(&mut buffer, 4, &config).unwrap();
        assert_eq!(metrics.critic_updates, 4);
        assert_eq!(metrics.target_updates, 2);

        assert_eq!(agent.critic_updates(), 13);
        assert_eq!(agent.actor_updates(), 5);
        assert_eq!(agent.target_updates(), 5);
    }

    #[test]
    fn train_moves_live_and_target_networks() {
        let mut agent = small_agent(2, 1);
        let mut buffer = filled_buffer(50, 2, 1);

        let critic_before = critic_probe(agent.critic(), 2);
        let target_before = critic_probe(agent.target_critic(), 2);
        let actor_before = actor_probe(agent.actor());

        let config = TD3TrainingConfig::new().with_batch_size(16).with_tau(0.5);
        agent.train(&mut buffer, 2, &config).unwrap();

        let critic_after = critic_probe(agent.critic(), 2);
        let target_after = critic_probe(agent.target_critic(), 2);
        assert_ne!(critic_before, critic_after);
        assert_ne!(actor_before, actor_probe(agent.actor()));
        assert_ne!(target_before, target_after);
        // targets only blend towards the live weights
        assert_ne!(critic_after, target_after);
    }

    #[test]
    fn zero_tau_freezes_targets() {
        let mut agent = small_agent(2, 1);
        let mut buffer = filled_buffer(50, 2, 1);
        let target_critic = critic_probe(agent.target_critic(), 2);
        let target_actor = actor_probe(agent.target_actor());
        let critic = critic_probe(agent.critic(), 2);

        let config = TD3TrainingConfig::new().with_batch_size(8).with_tau(0.0);
        agent.train(&mut buffer, 4, &config).unwrap();

        assert_ne!(critic, critic_probe(agent.critic(), 2));
        assert_eq!(target_critic, critic_probe(agent.target_critic(), 2));
        assert_eq!(target_actor, actor_probe(agent.target_actor()));
    }

    #[test]
    fn train_fails_on_underfilled_buffer() {
        let mut agent = small_agent(2, 1);
        let mut buffer = filled_buffer(5, 2, 1);
        let config = TD3TrainingConfig::new().with_batch_size(10);

        let before = critic_probe(agent.critic(), 2);
        assert!(matches!(
            agent.train(&mut buffer, 3, &config),
            Err(Td3Error::InvalidArgument(_))
        ));
        assert_eq!(before, critic_probe(agent.critic(), 2));
        assert_eq!(agent.critic_updates(), 0);
    }

    #[test]
    fn train_rejects_zero_policy_freq() {
        let mut agent = small_agent(2, 1);
        let mut buffer = filled_buffer(20, 2, 1);
        let config = TD3TrainingConfig::new().with_batch_size(4).with_policy_freq(0);

        assert!(matches!(
            agent.train(&mut buffer, 1, &config),
            Err(Td3Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn train_with_zero_iterations_is_a_no_op() {
        let mut agent = small_agent(2, 1);
        let mut buffer = ReplayBuffer::with_seed(10, 0);
        let metrics = agent.train(&mut buffer, 0, &TD3TrainingConfig::new()).unwrap();
        assert_eq!(metrics, TrainingMetrics::default());
    }

    #[test]
    fn save_load_round_trip_reproduces_actions() {
        let dir = tempfile::tempdir().unwrap();
        let mut trained = small_agent(3, 1);
        let mut buffer = filled_buffer(50, 3, 1);
        trained
            .train(&mut buffer, 4, &TD3TrainingConfig::new().with_batch_size(8))
            .unwrap();
        trained.save("TD3_test_0", dir.path()).unwrap();

        assert!(dir.path().join("TD3_test_0_actor.bin").exists());
        assert!(dir.path().join("TD3_test_0_critic.bin").exists());

        let mut restored = small_agent(3, 1);
        let state = [0.1, 0.2, 0.3];
        restored.load("TD3_test_0", dir.path()).unwrap();

        assert_eq!(
            trained.select_action(&state).unwrap(),
            restored.select_action(&state).unwrap()
        );
        assert_eq!(
            critic_probe(trained.critic(), 3),
            critic_probe(restored.critic(), 3)
        );
        // targets are re-synced from the loaded weights
        assert_eq!(actor_probe(restored.actor()), actor_probe(restored.target_actor()));
        assert_eq!(
            critic_probe(restored.critic(), 3),
            critic_probe(restored.target_critic(), 3)
        );
    }

    #[test]
    fn load_rejects_mismatched_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        small_agent(3, 1).save("run", dir.path()).unwrap();

        let mut other = small_agent(4, 1);
        let before = actor_probe(other.actor());
        assert!(matches!(
            other.load("run", dir.path()),
            Err(Td3Error::ShapeMismatch { .. })
        ));
        assert_eq!(before, actor_probe(other.actor()));
    }

    #[test]
    fn load_missing_weights_fails() {
        let dir = tempfile::tempdir().unwrap();
        let agent = small_agent(3, 1);
        agent.save("run", dir.path()).unwrap();
        std::fs::remove_file(dir.path().join("run_critic.bin")).unwrap();

        let mut restored = small_agent(3, 1);
        assert!(matches!(
            restored.load("run", dir.path()),
            Err(Td3Error::Recorder(_))
        ));
    }

    #[test]
    fn load_missing_checkpoint_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut agent = small_agent(3, 1);
        assert!(matches!(
            agent.load("absent", dir.path()),
            Err(Td3Error::Io(_))
        ));
    }
}

//! Experience replay

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::error::{Result, Td3Error};

/// A single environment transition.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: Vec<f32>,
    pub next_state: Vec<f32>,
    pub action: Vec<f32>,
    pub reward: f32,
    /// 1.0 for a true terminal state, 0.0 otherwise (including horizon cut-offs)
    pub done: f32,
}

/// A batch of transitions laid out as five parallel sequences
#[derive(Debug, Clone, Default)]
pub struct Batch {
    pub states: Vec<Vec<f32>>,
    pub next_states: Vec<Vec<f32>>,
    pub actions: Vec<Vec<f32>>,
    pub rewards: Vec<f32>,
    pub dones: Vec<f32>,
}

impl Batch {
    fn with_capacity(size: usize) -> Self {
        Self {
            states: Vec::with_capacity(size),
            next_states: Vec::with_capacity(size),
            actions: Vec::with_capacity(size),
            rewards: Vec::with_capacity(size),
            dones: Vec::with_capacity(size),
        }
    }
}

/// Fixed-capacity ring buffer of transitions with uniform sampling.
///
/// Once full, each `add` overwrites the oldest stored transition.
pub struct ReplayBuffer {
    storage: Vec<Transition>,
    capacity: usize,
    ptr: usize,
    rng: StdRng,
}

impl ReplayBuffer {
    /// Default capacity used by the training driver.
    pub const DEFAULT_CAPACITY: usize = 1_000_000;

    /// Create a buffer sampling from an entropy-seeded generator.
    ///
    /// # Panics
    /// If `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        Self::with_rng(capacity, StdRng::from_entropy())
    }

    /// Create a buffer with a reproducible sampling sequence.
    pub fn with_seed(capacity: usize, seed: u64) -> Self {
        Self::with_rng(capacity, StdRng::seed_from_u64(seed))
    }

    fn with_rng(capacity: usize, rng: StdRng) -> Self {
        assert!(capacity > 0, "replay buffer capacity must be positive");
        Self {
            // Grow lazily: the default capacity is far larger than most runs.
            storage: Vec::with_capacity(capacity.min(4096)),
            capacity,
            ptr: 0,
            rng,
        }
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Store a transition, evicting the oldest one when full.
    pub fn add(&mut self, transition: Transition) {
        if self.storage.len() < self.capacity {
            self.storage.push(transition);
        } else {
            self.storage[self.ptr] = transition;
        }
        self.ptr = (self.ptr + 1) % self.capacity;
    }

    /// Draw `batch_size` transitions uniformly at random, with replacement.
    pub fn sample(&mut self, batch_size: usize) -> Result<Batch> {
        if self.storage.is_empty() {
            return Err(Td3Error::invalid("cannot sample from an empty replay buffer"));
        }
        if batch_size == 0 {
            return Err(Td3Error::invalid("batch size must be positive"));
        }
        if batch_size > self.storage.len() {
            return Err(Td3Error::invalid(format!(
                "batch size {} exceeds the {} stored transitions",
                batch_size,
                self.storage.len()
            )));
        }

        let mut batch = Batch::with_capacity(batch_size);
        for _ in 0..batch_size {
            let t = &self.storage[self.rng.gen_range(0..self.storage.len())];
            batch.states.push(t.state.clone());
            batch.next_states.push(t.next_state.clone());
            batch.actions.push(t.action.clone());
            batch.rewards.push(t.reward);
            batch.dones.push(t.done);
        }

        Ok(batch)
    }

    /// Stored transitions from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        let split = if self.storage.len() < self.capacity {
            0
        } else {
            self.ptr
        };
        self.storage[split..].iter().chain(self.storage[..split].iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transition(id: f32) -> Transition {
        Transition {
            state: vec![id, id],
            next_state: vec![id + 1.0, id + 1.0],
            action: vec![id * 0.1],
            reward: id,
            done: 0.0,
        }
    }

    #[test]
    fn add_evicts_oldest_when_full() {
        let mut buffer = ReplayBuffer::with_seed(3, 0);
        for id in 1..=4 {
            buffer.add(transition(id as f32));
        }

        assert_eq!(buffer.len(), 3);
        let rewards: Vec<f32> = buffer.iter().map(|t| t.reward).collect();
        assert_eq!(rewards, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn keeps_most_recent_insertions() {
        let capacity = 50;
        let mut buffer = ReplayBuffer::with_seed(capacity, 1);
        for id in 0..173 {
            buffer.add(transition(id as f32));
        }

        assert_eq!(buffer.len(), capacity);
        let rewards: Vec<f32> = buffer.iter().map(|t| t.reward).collect();
        let expected: Vec<f32> = (123..173).map(|id| id as f32).collect();
        assert_eq!(rewards, expected);
    }

    #[test]
    fn sample_draws_only_stored_transitions() {
        let mut buffer = ReplayBuffer::with_seed(3, 42);
        for id in 1..=4 {
            buffer.add(transition(id as f32));
        }

        for _ in 0..100 {
            let batch = buffer.sample(2).unwrap();
            assert_eq!(batch.rewards.len(), 2);
            for (i, reward) in batch.rewards.iter().enumerate() {
                assert!([2.0, 3.0, 4.0].contains(reward), "sampled evicted {}", reward);
                // parallel sequences must describe the same transition
                assert_eq!(batch.states[i], vec![*reward, *reward]);
                assert_eq!(batch.next_states[i], vec![reward + 1.0, reward + 1.0]);
                assert_eq!(batch.actions[i], vec![reward * 0.1]);
                assert_eq!(batch.dones[i], 0.0);
            }
        }
    }

    #[test]
    fn sample_shapes_match_batch_size() {
        let mut buffer = ReplayBuffer::with_seed(100, 3);
        for id in 0..20 {
            buffer.add(transition(id as f32));
        }

        for batch_size in 1..=20 {
            let batch = buffer.sample(batch_size).unwrap();
            assert_eq!(batch.states.len(), batch_size);
            assert_eq!(batch.next_states.len(), batch_size);
            assert_eq!(batch.actions.len(), batch_size);
            assert_eq!(batch.rewards.len(), batch_size);
            assert_eq!(batch.dones.len(), batch_size);
        }
    }

    #[test]
    fn sample_underflow_is_invalid_argument() {
        let mut buffer = ReplayBuffer::with_seed(10, 0);
        assert!(matches!(
            buffer.sample(1),
            Err(Td3Error::InvalidArgument(_))
        ));

        buffer.add(transition(0.0));
        buffer.add(transition(1.0));
        assert!(matches!(
            buffer.sample(3),
            Err(Td3Error::InvalidArgument(_))
        ));
        assert!(matches!(
            buffer.sample(0),
            Err(Td3Error::InvalidArgument(_))
        ));
        assert!(buffer.sample(2).is_ok());
    }

    #[test]
    fn sampling_is_with_replacement() {
        let mut buffer = ReplayBuffer::with_seed(2, 9);
        buffer.add(transition(0.0));
        buffer.add(transition(1.0));

        // with only two stored transitions, some batch of two must repeat one of them
        let repeated = (0..200).any(|_| {
            let batch = buffer.sample(2).unwrap();
            batch.rewards[0] == batch.rewards[1]
        });
        assert!(repeated);
    }
}

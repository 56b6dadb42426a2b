//! Environment contract consumed by the TD3 driver and evaluation routine.

use rand::Rng;
use std::collections::HashMap;

use crate::error::{Result, Td3Error};

/// A box-shaped continuous space: one `[low, high]` interval per component.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxSpace {
    pub low: Vec<f32>,
    pub high: Vec<f32>,
}

impl BoxSpace {
    /// Create a space from per-component bounds.
    ///
    /// Fails when the bound vectors differ in length or `low > high` anywhere.
    pub fn new(low: Vec<f32>, high: Vec<f32>) -> Result<Self> {
        if low.len() != high.len() {
            return Err(Td3Error::shape("space upper bound", low.len(), high.len()));
        }
        if let Some(i) = low.iter().zip(&high).position(|(l, h)| l > h) {
            return Err(Td3Error::invalid(format!(
                "space component {} has low {} > high {}",
                i, low[i], high[i]
            )));
        }
        Ok(Self { low, high })
    }

    /// Same bounds `[low, high]` for each of `dim` components.
    pub fn uniform(dim: usize, low: f32, high: f32) -> Result<Self> {
        Self::new(vec![low; dim], vec![high; dim])
    }

    pub fn dim(&self) -> usize {
        self.low.len()
    }

    pub fn shape(&self) -> [usize; 1] {
        [self.dim()]
    }

    /// Uniform sample inside the bounds.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<f32> {
        self.low
            .iter()
            .zip(&self.high)
            .map(|(&l, &h)| if l < h { rng.gen_range(l..=h) } else { l })
            .collect()
    }

    /// Clip every component into its bounds in place.
    pub fn clip(&self, values: &mut [f32]) {
        for ((v, &l), &h) in values.iter_mut().zip(&self.low).zip(&self.high) {
            *v = v.clamp(l, h);
        }
    }

    pub fn contains(&self, values: &[f32]) -> bool {
        values.len() == self.dim()
            && values
                .iter()
                .zip(self.low.iter().zip(&self.high))
                .all(|(v, (l, h))| *v >= *l && *v <= *h)
    }
}

/// Result of one environment transition.
#[derive(Debug, Clone)]
pub struct Step {
    pub next_state: Vec<f32>,
    pub reward: f32,
    /// True both for terminal states and for episodes cut by the step horizon.
    pub done: bool,
    pub info: HashMap<String, f32>,
}

impl Step {
    pub fn new(next_state: Vec<f32>, reward: f32, done: bool) -> Self {
        Self {
            next_state,
            reward,
            done,
            info: HashMap::new(),
        }
    }
}

/// A continuous-control environment.
///
/// Environments enforce their own horizon: `step` reports `done` once
/// `max_episode_steps` transitions have been taken in the current episode.
pub trait Environment {
    /// Start a new episode and return its first observation.
    fn reset(&mut self) -> Vec<f32>;

    /// Apply `action` and advance the simulation by one step.
    fn step(&mut self, action: &[f32]) -> Result<Step>;

    fn action_space(&self) -> &BoxSpace;

    fn observation_space(&self) -> &BoxSpace;

    /// Episode-step horizon after which the environment reports `done`.
    fn max_episode_steps(&self) -> usize;

    /// Environment identifier used in run ids and file names.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn box_space_rejects_bad_bounds() {
        assert!(BoxSpace::new(vec![0.0, 1.0], vec![1.0]).is_err());
        assert!(BoxSpace::new(vec![2.0], vec![1.0]).is_err());
    }

    #[test]
    fn box_space_sample_within_bounds() {
        let space = BoxSpace::new(vec![-2.0, 0.0], vec![2.0, 0.5]).unwrap();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..1000 {
            let sample = space.sample(&mut rng);
            assert_eq!(sample.len(), 2);
            assert!(space.contains(&sample), "sample {:?} out of bounds", sample);
        }
    }

    #[test]
    fn box_space_clip() {
        let space = BoxSpace::uniform(3, -1.0, 1.0).unwrap();
        let mut values = vec![-5.0, 0.25, 3.0];
        space.clip(&mut values);
        assert_eq!(values, vec![-1.0, 0.25, 1.0]);
        assert_eq!(space.shape(), [3]);
    }
}

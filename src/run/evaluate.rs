use crate::{
    env::Environment,
    error::{Result, Td3Error},
    traits::Policy,
};

/// Mean undiscounted return of `policy` over `episodes` greedy rollouts
///
/// Each rollout starts from `env.reset()` and runs until the environment
/// reports `done`. Actions are clipped to the action space and no noise is
/// added; nothing but the environment is mutated.
pub fn evaluate_policy<P, E>(policy: &P, env: &mut E, episodes: usize) -> Result<f32>
where
    P: Policy + ?Sized,
    E: Environment + ?Sized,
{
    if episodes == 0 {
        return Err(Td3Error::invalid("evaluation needs at least one episode"));
    }

    let mut total_reward = 0.0_f64;
    for _ in 0..episodes {
        let mut state = env.reset();
        loop {
            let mut action = policy.select_action(&state)?;
            env.action_space().clip(&mut action);

            let step = env.step(&action)?;
            total_reward += step.reward as f64;
            state = step.next_state;

            if step.done {
                break;
            }
        }
    }

    let avg_reward = (total_reward / episodes as f64) as f32;
    log::info!(
        "Average reward over {} evaluation episodes: {:.3}",
        episodes,
        avg_reward
    );

    Ok(avg_reward)
}

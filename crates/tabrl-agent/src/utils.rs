//! One-step lookahead helpers shared by the model-based updates

use tabrl_core::{argmax_first, checked_actions, Environment, RLError, Result, StateKey, ValueTable};

/// `r + γ·V[s']` for taking `action` from `state`, bootstrapping with 0 when
/// the probed transition ends the episode
pub fn lookahead<E>(
    env: &E,
    values: &ValueTable,
    state: &StateKey,
    action: E::Action,
    gamma: f64,
) -> Result<f64>
where
    E: Environment + ?Sized,
{
    let step = env.probe(state, action)?;
    let bootstrap = if step.done { 0.0 } else { values.get(&step.state) };
    Ok(step.reward.0 + gamma * bootstrap)
}

/// Best action from `state` by one-step lookahead, first maximum on ties
pub fn greedy_action<E>(
    env: &E,
    values: &ValueTable,
    state: &StateKey,
    gamma: f64,
) -> Result<(E::Action, f64)>
where
    E: Environment + ?Sized,
{
    let actions = checked_actions(env, state)?;
    let mut scored = Vec::with_capacity(actions.len());
    for action in actions {
        scored.push((action, lookahead(env, values, state, action, gamma)?));
    }
    argmax_first(scored).ok_or_else(|| RLError::EmptyActionSet(state.to_string()))
}

/// Largest absolute difference between two value tables over `states`
pub fn max_change<'a>(
    before: &ValueTable,
    after: &ValueTable,
    states: impl IntoIterator<Item = &'a StateKey>,
) -> f64 {
    states
        .into_iter()
        .map(|s| (after.get(s) - before.get(s)).abs())
        .fold(0.0, f64::max)
}

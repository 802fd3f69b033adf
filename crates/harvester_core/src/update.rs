use crate::{ActivityState, AgentState, Effect, IdleThreshold, Msg};

/// Pure update function: applies a message to state and returns any effects.
///
/// Only the transition *into* `Idle` starts a cycle, and never while another
/// cycle is running; such triggers are dropped rather than queued.
pub fn update(mut state: AgentState, msg: Msg) -> (AgentState, Vec<Effect>) {
    let effects = match msg {
        Msg::ActivityChanged(activity) => {
            let previous = state.activity();
            state.set_activity(activity);
            if activity == ActivityState::Idle && previous != ActivityState::Idle {
                vec![start_cycle(&mut state)]
            } else {
                Vec::new()
            }
        }
        Msg::HarvestRequested => vec![start_cycle(&mut state)],
        Msg::CycleFinished(summary) => {
            state.finish_cycle(summary);
            Vec::new()
        }
        Msg::ThresholdLoaded(raw) => {
            let threshold = IdleThreshold::from_raw(raw);
            if state.set_threshold(threshold) {
                vec![Effect::ApplyThreshold(threshold)]
            } else {
                Vec::new()
            }
        }
    };

    (state, effects)
}

fn start_cycle(state: &mut AgentState) -> Effect {
    match state.try_start_cycle() {
        Ok(cycle_id) => Effect::StartCycle { cycle_id },
        Err(active_cycle) => Effect::TriggerDropped { active_cycle },
    }
}

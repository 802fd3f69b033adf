use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use engine_logging::{engine_error, engine_info};
use futures_util::FutureExt;
use harvester_core::{update, AgentPhase, AgentState, CycleSummary, Effect, Msg};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::idle::IdleEventSource;
use crate::reclaim::{CycleReport, Reclaimer};

const MSG_CAPACITY: usize = 64;

/// The idle-triggered harvesting agent.
///
/// All inputs (activity transitions, threshold reloads, manual requests) go
/// through one channel whose only reader is the agent loop. Cycles run in a
/// spawned task and report back on a second channel, so the loop keeps
/// consuming (and dropping) triggers while a cycle is in flight.
pub struct Agent {
    reclaimer: Arc<Reclaimer>,
    idle_source: Arc<dyn IdleEventSource>,
    reports: Option<mpsc::UnboundedSender<CycleReport>>,
}

impl Agent {
    pub fn new(reclaimer: Arc<Reclaimer>, idle_source: Arc<dyn IdleEventSource>) -> Self {
        Self {
            reclaimer,
            idle_source,
            reports: None,
        }
    }

    /// Forward every finished cycle's report to `reports`.
    pub fn with_reports(mut self, reports: mpsc::UnboundedSender<CycleReport>) -> Self {
        self.reports = Some(reports);
        self
    }

    pub fn spawn(self) -> AgentHandle {
        let (msg_tx, msg_rx) = mpsc::channel(MSG_CAPACITY);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(self.run(msg_rx, cancel.clone()));
        AgentHandle {
            msg_tx,
            cancel,
            task,
        }
    }

    async fn run(self, mut msg_rx: mpsc::Receiver<Msg>, cancel: CancellationToken) -> AgentState {
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<CycleReport>();
        let mut state = AgentState::new();

        loop {
            // Queued messages are handled before a pending cancellation.
            tokio::select! {
                biased;
                Some(report) = done_rx.recv() => {
                    state = self.finish(state, report);
                }
                msg = msg_rx.recv() => match msg {
                    Some(msg) => state = self.dispatch(state, msg, &done_tx),
                    None => break,
                },
                _ = cancel.cancelled() => break,
            }
        }

        // Shutdown never interrupts a cycle.
        if let AgentPhase::Harvesting { cycle_id } = state.phase() {
            engine_info!("waiting for cycle {} before shutting down", cycle_id);
            if let Some(report) = done_rx.recv().await {
                state = self.finish(state, report);
            }
        }
        state
    }

    fn dispatch(
        &self,
        state: AgentState,
        msg: Msg,
        done_tx: &mpsc::UnboundedSender<CycleReport>,
    ) -> AgentState {
        let (state, effects) = update(state, msg);
        for effect in effects {
            match effect {
                Effect::StartCycle { cycle_id } => {
                    engine_info!("starting harvest cycle {}", cycle_id);
                    let reclaimer = self.reclaimer.clone();
                    let done_tx = done_tx.clone();
                    tokio::spawn(async move {
                        // A panicking capability must still hand the cycle back.
                        let report = match AssertUnwindSafe(reclaimer.run_cycle(cycle_id))
                            .catch_unwind()
                            .await
                        {
                            Ok(report) => report,
                            Err(_) => {
                                engine_error!("cycle {} panicked; counted as aborted", cycle_id);
                                CycleReport::without_candidates(CycleSummary::aborted(cycle_id))
                            }
                        };
                        let _ = done_tx.send(report);
                    });
                }
                Effect::ApplyThreshold(threshold) => {
                    engine_info!("idle threshold set to {}", threshold);
                    self.idle_source.set_threshold(threshold);
                }
                Effect::TriggerDropped { active_cycle } => {
                    engine_info!("idle trigger dropped; cycle {} still running", active_cycle);
                }
            }
        }
        state
    }

    fn finish(&self, state: AgentState, report: CycleReport) -> AgentState {
        let (state, _) = update(state, Msg::CycleFinished(report.summary));
        if let Some(reports) = &self.reports {
            if reports.send(report).is_err() {
                engine_error!("cycle report receiver dropped");
            }
        }
        state
    }
}

/// Handle to a running [`Agent`].
pub struct AgentHandle {
    msg_tx: mpsc::Sender<Msg>,
    cancel: CancellationToken,
    task: JoinHandle<AgentState>,
}

impl AgentHandle {
    /// Sender for event sources (idle detector, threshold watcher).
    pub fn sender(&self) -> mpsc::Sender<Msg> {
        self.msg_tx.clone()
    }

    pub async fn send(&self, msg: Msg) {
        if self.msg_tx.send(msg).await.is_err() {
            engine_error!("agent loop is gone; message dropped");
        }
    }

    /// Run a cycle now, subject to the same single-flight rule as idle triggers.
    pub async fn request_harvest(&self) {
        self.send(Msg::HarvestRequested).await;
    }

    /// Stops the loop after any in-flight cycle and returns the final state.
    pub async fn shutdown(self) -> AgentState {
        self.cancel.cancel();
        match self.task.await {
            Ok(state) => state,
            Err(err) => {
                engine_error!("agent loop panicked: {}", err);
                AgentState::new()
            }
        }
    }
}

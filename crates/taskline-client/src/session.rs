//! Task session controller: submit → wait for plan → execute → terminate.
//!
//! One [`TaskSession`] owns at most one live subscription and one
//! accumulated [`StreamState`] at a time. Submission is optimistic — the
//! user message is appended before the network round-trip and retracted by
//! exact snapshot rollback if the submission fails or is cancelled. Stopping
//! is local-first: the subscription closes and the phase flips to
//! [`SessionPhase::Stopped`] immediately, while the backend cancellation
//! request runs best-effort on a detached task.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use taskline_wire::StreamEvent;

use crate::error::GatewayError;
use crate::gateway::TaskGateway;
use crate::reducer::{reduce, StreamState};
use crate::subscriber::{StreamConnector, StreamSignal, Subscription};

/// Terminal transcript entry appended on explicit stop.
const STOP_NOTICE: &str = "Execution has been stopped.";

/// Where a session is in its life. The controller is the sole writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Submitting,
    WaitingForPlan,
    Executing,
    Stopped,
    Failed,
}

/// How a call to [`TaskSession::submit`] concluded without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Task accepted and the event stream is open.
    Submitted,
    /// Cancelled locally before completion; state rolled back, nothing to
    /// report to the user.
    Cancelled,
    /// Empty draft or a submission already in flight; nothing happened.
    Ignored,
}

/// Pure projection of controller + reducer state for the rendering layer.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub connected: bool,
    pub executing: bool,
    pub waiting_for_plan: bool,
    pub completed_steps: usize,
    pub total_steps: usize,
    pub progress: f64,
}

pub struct TaskSession {
    /// Client-assigned identity, constructed once per session and carried on
    /// every gateway request.
    agent_id: String,
    gateway: Arc<dyn TaskGateway>,
    connector: Arc<dyn StreamConnector>,
    phase: SessionPhase,
    state: StreamState,
    draft: String,
    current_task_id: Option<String>,
    subscription: Option<Subscription>,
    cancel: CancellationToken,
}

impl TaskSession {
    pub fn new(gateway: Arc<dyn TaskGateway>, connector: Arc<dyn StreamConnector>) -> Self {
        Self {
            agent_id: Uuid::new_v4().simple().to_string(),
            gateway,
            connector,
            phase: SessionPhase::Idle,
            state: StreamState::new(),
            draft: String::new(),
            current_task_id: None,
            subscription: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn state(&self) -> &StreamState {
        &self.state
    }

    pub fn current_task_id(&self) -> Option<&str> {
        self.current_task_id.as_deref()
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, draft: impl Into<String>) {
        self.draft = draft.into();
    }

    /// Handle for aborting an in-flight submission from outside the
    /// controller (e.g. on teardown). Stale once the session has been
    /// stopped and resubmitted.
    pub fn cancel_handle(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Submit the current draft as a new task.
    ///
    /// Any previous subscription is closed first — at most one is active per
    /// session. On gateway failure or local cancellation the optimistic user
    /// message is retracted and the draft restored; only a genuine failure
    /// returns `Err`.
    pub async fn submit(&mut self) -> Result<SubmitOutcome, GatewayError> {
        if self.draft.trim().is_empty() || self.phase == SessionPhase::Submitting {
            return Ok(SubmitOutcome::Ignored);
        }

        // Strict hand-off: tear down the old stream before opening a new one.
        self.close_subscription();
        self.current_task_id = None;
        if self.cancel.is_cancelled() {
            self.cancel = CancellationToken::new();
        }
        let cancel = self.cancel.clone();

        let input = std::mem::take(&mut self.draft);
        let snapshot = self.state.clone();

        self.phase = SessionPhase::Submitting;
        self.state.push_user_message(input.clone());
        self.state.plan.clear();
        self.state.waiting_for_plan = true;

        let submitted = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = self.gateway.submit_task(&input, &self.agent_id) => Some(result),
        };

        let task_id = match submitted {
            None => {
                self.roll_back(snapshot, input);
                return Ok(SubmitOutcome::Cancelled);
            }
            Some(Err(err)) => {
                self.roll_back(snapshot, input);
                return Err(err);
            }
            Some(Ok(task_id)) => task_id,
        };

        self.phase = SessionPhase::WaitingForPlan;

        let connected = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = self.connector.subscribe(&task_id) => Some(result),
        };

        match connected {
            None => {
                self.roll_back(snapshot, input);
                Ok(SubmitOutcome::Cancelled)
            }
            Some(Err(err)) => {
                warn!(task_id, error = %err, "could not open event stream");
                self.phase = SessionPhase::Failed;
                Err(GatewayError::Stream(err))
            }
            Some(Ok(subscription)) => {
                info!(task_id, agent_id = %self.agent_id, "watching task");
                self.current_task_id = Some(task_id);
                self.subscription = Some(subscription);
                Ok(SubmitOutcome::Submitted)
            }
        }
    }

    /// Next signal from the active subscription, `None` when there is none
    /// or it has ended.
    pub async fn next_signal(&mut self) -> Option<StreamSignal> {
        match self.subscription.as_mut() {
            Some(subscription) => subscription.next_signal().await,
            None => None,
        }
    }

    /// Fold one signal into session state. Signals arriving after stop are
    /// dropped.
    pub fn apply(&mut self, signal: StreamSignal) {
        if self.phase == SessionPhase::Stopped {
            return;
        }
        match signal {
            StreamSignal::Event(event) => {
                let is_plan = matches!(event, StreamEvent::Plan { .. });
                self.state = reduce(&self.state, &event);
                if is_plan && self.phase == SessionPhase::WaitingForPlan {
                    self.phase = SessionPhase::Executing;
                }
            }
            StreamSignal::Lost(err) => {
                warn!(error = %err, "event stream lost");
                self.close_subscription();
                if matches!(
                    self.phase,
                    SessionPhase::WaitingForPlan | SessionPhase::Executing
                ) {
                    self.phase = SessionPhase::Failed;
                }
            }
        }
    }

    /// Stop watching: close the stream, cancel any in-flight submission,
    /// append the terminal stop notice, and fire a best-effort cancellation
    /// at the backend. Local state is the source of truth — a failed cancel
    /// request is logged, never blocks the transition.
    pub fn stop(&mut self) {
        if matches!(self.phase, SessionPhase::Idle | SessionPhase::Stopped) {
            return;
        }
        self.cancel.cancel();
        self.close_subscription();
        self.state.waiting_for_plan = false;
        self.state.push_agent_message(STOP_NOTICE);
        self.phase = SessionPhase::Stopped;

        let gateway = Arc::clone(&self.gateway);
        let agent_id = self.agent_id.clone();
        tokio::spawn(async move {
            if let Err(err) = gateway.cancel_task(&agent_id).await {
                warn!(agent_id, error = %err, "backend cancellation request failed");
            }
        });
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let (completed_steps, total_steps) = self.state.progress();
        SessionSnapshot {
            phase: self.phase,
            connected: self.subscription.is_some(),
            executing: matches!(
                self.phase,
                SessionPhase::WaitingForPlan | SessionPhase::Executing
            ),
            waiting_for_plan: self.state.waiting_for_plan,
            completed_steps,
            total_steps,
            progress: self.state.progress_fraction(),
        }
    }

    fn roll_back(&mut self, snapshot: StreamState, draft: String) {
        self.state = snapshot;
        self.draft = draft;
        self.phase = SessionPhase::Idle;
    }

    fn close_subscription(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.close();
        }
    }
}

impl Drop for TaskSession {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.close_subscription();
    }
}

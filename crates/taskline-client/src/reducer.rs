//! Pure state reduction: fold one decoded event into plan + transcript
//! state.
//!
//! [`reduce`] has no side effects and no I/O; given the same `(state,
//! event)` pair it always produces the same next state, which is what makes
//! the whole pipeline unit-testable without a transport.

use taskline_wire::{Message, MessageRole, PlanStep, StepStatus, StreamEvent};

/// Accumulated view of one task session: the current plan and the chat
/// transcript. Owned exclusively by the session controller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamState {
    pub plan: Vec<PlanStep>,
    pub messages: Vec<Message>,
    /// Set between submission and the first `plan` event.
    pub waiting_for_plan: bool,
    next_message_id: u64,
}

impl StreamState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a user message (the optimistic entry added at submit time).
    pub fn push_user_message(&mut self, content: impl Into<String>) {
        let id = self.next_id();
        self.messages.push(Message {
            id,
            role: MessageRole::User,
            content: content.into(),
            step_id: None,
        });
    }

    /// Append a standalone agent message, e.g. the terminal stop notice.
    /// Not tied to a step, so later `text` fragments start a fresh entry.
    pub fn push_agent_message(&mut self, content: impl Into<String>) {
        let id = self.next_id();
        self.messages.push(Message {
            id,
            role: MessageRole::Agent,
            content: content.into(),
            step_id: None,
        });
    }

    /// Completed step count over total. `(0, 0)` when no plan has arrived.
    pub fn progress(&self) -> (usize, usize) {
        let completed = self
            .plan
            .iter()
            .filter(|step| step.status == StepStatus::Completed)
            .count();
        (completed, self.plan.len())
    }

    /// Progress as a fraction in `0.0..=1.0`; `0.0` for an empty plan.
    pub fn progress_fraction(&self) -> f64 {
        let (completed, total) = self.progress();
        if total == 0 {
            0.0
        } else {
            completed as f64 / total as f64
        }
    }

    fn next_id(&mut self) -> u64 {
        self.next_message_id += 1;
        self.next_message_id
    }

    fn append_fragment(&mut self, step_id: Option<&str>, text: &str) {
        // Consecutive fragments for the same step and speaker grow one
        // message in place; anything else starts a new entry.
        if let Some(last) = self.messages.last_mut() {
            if last.role == MessageRole::Agent && last.step_id.as_deref() == step_id {
                last.content.push_str(text);
                return;
            }
        }
        let id = self.next_id();
        self.messages.push(Message {
            id,
            role: MessageRole::Agent,
            content: text.to_string(),
            step_id: step_id.map(str::to_string),
        });
    }
}

/// Fold one event into the prior state and return the next state.
pub fn reduce(state: &StreamState, event: &StreamEvent) -> StreamState {
    let mut next = state.clone();
    match event {
        StreamEvent::Plan { plan } => {
            // A fresh plan fully supersedes any prior plan.
            next.plan = plan.clone();
            next.waiting_for_plan = false;
        }
        StreamEvent::StepStart { step_id } => {
            advance_step(&mut next.plan, step_id, StepStatus::Running);
        }
        StreamEvent::StepEnd { step_id } => {
            advance_step(&mut next.plan, step_id, StepStatus::Completed);
        }
        StreamEvent::Text { step_id, text } => {
            next.append_fragment(step_id.as_deref(), text);
        }
    }
    next
}

/// Unknown step ids are a no-op: the plan may not have arrived yet, or the
/// id is stale. Statuses never regress.
fn advance_step(plan: &mut [PlanStep], step_id: &str, to: StepStatus) {
    if let Some(step) = plan.iter_mut().find(|step| step.id == step_id) {
        if step.status.can_advance_to(to) {
            step.status = to;
        }
    }
}

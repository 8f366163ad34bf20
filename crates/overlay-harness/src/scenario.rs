#![forbid(unsafe_code)]

//! JSON scenario replay.
//!
//! A scenario names the initial inputs, scripts the resolver, and lists
//! steps. Replay drives an [`ErrorOverlay`] through a [`Program`] and
//! records the view after every step, so a scenario file doubles as a
//! regression fixture.
//!
//! ```json
//! {
//!   "events": [{"id": 1, "type": "unhandled-error", "reason": {"name": "Error", "message": "a", "stack": ""}}],
//!   "fail": [],
//!   "steps": [{"op": "resolve"}, {"op": "display", "action": "minimize"}]
//! }
//! ```

use std::io::Write;
use std::sync::Arc;

use overlay::{
    DiagnosticEvent, DiagnosticResolver, DisplayAction, ErrorOverlay, ErrorSource, EventId, Issue,
    Msg, OverlayConfig, OverlayView, Program, TabId,
};
use serde::{Deserialize, Serialize};

use crate::scripted::ScriptedResolver;

/// Errors loading or replaying a scenario.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("scenario parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Config(#[from] overlay::ConfigError),
    #[error("step {step}: no resolution task is queued")]
    NothingToResolve { step: usize },
}

/// One scripted server-side source.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceOverride {
    pub id: u64,
    pub source: ErrorSource,
}

/// A replayable scenario.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Scenario {
    pub config: OverlayConfig,
    pub issues: Vec<Issue>,
    pub events: Vec<DiagnosticEvent>,
    /// Event ids whose resolution always fails.
    pub fail: Vec<u64>,
    /// Event ids whose records carry a source.
    pub sources: Vec<SourceOverride>,
    pub steps: Vec<Step>,
}

/// One replay step.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Replace issues, events, or both.
    Inputs {
        #[serde(default)]
        issues: Option<Vec<Issue>>,
        #[serde(default)]
        events: Option<Vec<DiagnosticEvent>>,
    },
    /// Run the oldest queued resolution task.
    Resolve,
    /// Run every queued task until the program is idle.
    ResolveAll,
    /// Drop the oldest queued task without running it.
    DropTask,
    Display { action: DisplayAction },
    SelectTab { tab: TabId },
    Teardown,
}

impl Step {
    fn name(&self) -> &'static str {
        match self {
            Self::Inputs { .. } => "inputs",
            Self::Resolve => "resolve",
            Self::ResolveAll => "resolve_all",
            Self::DropTask => "drop_task",
            Self::Display { .. } => "display",
            Self::SelectTab { .. } => "select_tab",
            Self::Teardown => "teardown",
        }
    }
}

/// Observable state after one step.
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    /// Zero for the state right after mount.
    pub step: usize,
    pub op: &'static str,
    pub ready: Vec<EventId>,
    pub is_loading: bool,
    pub pending_tasks: usize,
    pub selected_tab: TabId,
    pub view: OverlayView,
}

impl Scenario {
    /// Parse a scenario from JSON.
    pub fn from_json_str(s: &str) -> Result<Self, ScenarioError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Parse a scenario file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ScenarioError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Resolver scripted by `fail` and `sources`.
    #[must_use]
    pub fn resolver(&self) -> ScriptedResolver {
        let mut resolver = ScriptedResolver::new();
        for &id in &self.fail {
            resolver = resolver.failing(id);
        }
        for o in &self.sources {
            resolver = resolver.with_source(o.id, o.source.clone());
        }
        resolver
    }

    /// Replay against the scripted resolver.
    pub fn replay(&self) -> Result<Vec<StepRecord>, ScenarioError> {
        self.replay_with(Arc::new(self.resolver()))
    }

    /// Replay against `backend`.
    pub fn replay_with(
        &self,
        backend: Arc<dyn DiagnosticResolver>,
    ) -> Result<Vec<StepRecord>, ScenarioError> {
        let config = self.config.clone().validated()?;
        let overlay = ErrorOverlay::new(backend, config, self.issues.clone(), self.events.clone());
        let mut program = Program::new(overlay);
        program.init();

        let mut records = Vec::with_capacity(self.steps.len() + 1);
        records.push(record(&program, 0, "mount"));

        for (i, step) in self.steps.iter().enumerate() {
            let index = i + 1;
            tracing::debug!(target: "overlay.replay", step = index, op = step.name(), "step");
            match step.clone() {
                Step::Inputs { issues, events } => match (issues, events) {
                    (Some(issues), Some(events)) => program.send(Msg::SetInputs { issues, events }),
                    (Some(issues), None) => program.send(Msg::SetIssues(issues)),
                    (None, Some(events)) => program.send(Msg::SetEvents(events)),
                    (None, None) => {}
                },
                Step::Resolve => {
                    if !program.run_next_task() {
                        return Err(ScenarioError::NothingToResolve { step: index });
                    }
                }
                Step::ResolveAll => {
                    program.run_until_idle();
                }
                Step::DropTask => {
                    if program.take_task(0).is_none() {
                        return Err(ScenarioError::NothingToResolve { step: index });
                    }
                }
                Step::Display { action } => program.send(Msg::Display(action)),
                Step::SelectTab { tab } => program.send(Msg::SelectTab(tab)),
                Step::Teardown => program.send(Msg::Teardown),
            }
            records.push(record(&program, index, step.name()));
        }
        Ok(records)
    }
}

fn record(program: &Program<ErrorOverlay>, step: usize, op: &'static str) -> StepRecord {
    let model = program.model();
    StepRecord {
        step,
        op,
        ready: model.ready_ids(),
        is_loading: model.is_loading(),
        pending_tasks: program.pending_count(),
        selected_tab: model.selected_tab(),
        view: program.view(),
    }
}

/// Write one JSON object per record.
pub fn write_jsonl(records: &[StepRecord], mut out: impl Write) -> Result<(), ScenarioError> {
    for r in records {
        serde_json::to_writer(&mut out, r)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}

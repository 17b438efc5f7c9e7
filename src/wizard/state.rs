//! Wizard step machine and submission bookkeeping.

use serde::Serialize;

use super::action::{Action, reduce};
use super::catalog::{STEPS, StepInfo};
use super::draft::PreferenceDraft;
use super::record::{PreferenceRecord, flatten};
use crate::error::{BackendError, WizardError};

/// Current wizard step, always within `1..=7`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Step(u8);

impl Step {
    pub const FIRST: Step = Step(1);
    pub const LAST: Step = Step(STEPS.len() as u8);

    /// Clamp any number into the valid range.
    pub fn new(n: u8) -> Self {
        Step(n.clamp(Self::FIRST.0, Self::LAST.0))
    }

    pub fn number(&self) -> u8 {
        self.0
    }

    pub fn next(self) -> Self {
        Step::new(self.0.saturating_add(1))
    }

    pub fn previous(self) -> Self {
        Step::new(self.0.saturating_sub(1))
    }

    pub fn is_first(&self) -> bool {
        *self == Self::FIRST
    }

    pub fn is_last(&self) -> bool {
        *self == Self::LAST
    }

    pub fn info(&self) -> &'static StepInfo {
        &STEPS[(self.0 - 1) as usize]
    }

    /// Progress bar fill, rounded to a whole percent.
    pub fn progress_percent(&self) -> u8 {
        ((self.0 as f64 / Self::LAST.0 as f64) * 100.0).round() as u8
    }
}

impl Default for Step {
    fn default() -> Self {
        Self::FIRST
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} of {}", self.0, Self::LAST.0)
    }
}

/// What the wizard should render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum View {
    Step { step: Step, info: StepInfo },
    ThankYou,
}

/// Full wizard state. Owned by exactly one wizard instance.
#[derive(Debug, Clone, Default)]
pub struct WizardState {
    pub step: Step,
    pub draft: PreferenceDraft,
    /// A write is in flight; the submit control is disabled.
    pub submitting: bool,
    /// Terminal: the record was stored.
    pub submitted: bool,
    /// Last user-facing error message, cleared on the next attempt.
    pub notice: Option<String>,
}

impl WizardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, action: Action) -> Result<(), WizardError> {
        if self.submitted {
            return Err(WizardError::AlreadySubmitted);
        }
        self.ensure_idle()?;
        self.draft = reduce(self.draft.clone(), action)?;
        Ok(())
    }

    pub fn next(&mut self) -> Result<(), WizardError> {
        self.ensure_idle()?;
        if !self.submitted {
            self.step = self.step.next();
        }
        Ok(())
    }

    pub fn previous(&mut self) -> Result<(), WizardError> {
        self.ensure_idle()?;
        if !self.submitted {
            self.step = self.step.previous();
        }
        Ok(())
    }

    /// The draft and step are frozen while a write is in flight.
    fn ensure_idle(&self) -> Result<(), WizardError> {
        if self.submitting {
            return Err(WizardError::SubmitInProgress);
        }
        Ok(())
    }

    pub fn view(&self) -> View {
        if self.submitted {
            View::ThankYou
        } else {
            View::Step {
                step: self.step,
                info: *self.step.info(),
            }
        }
    }

    /// Why the submit control is disabled, or `None` if it is enabled.
    pub fn submit_blocker(&self) -> Option<String> {
        if self.submitted {
            return Some("already submitted".to_string());
        }
        if self.submitting {
            return Some("submission in progress".to_string());
        }
        if !self.step.is_last() {
            return Some(format!("not on the final step ({})", self.step));
        }
        let missing = self.draft.missing_contact_fields();
        if !missing.is_empty() {
            let names: Vec<String> = missing.iter().map(ToString::to_string).collect();
            return Some(format!("{} required", names.join(", ")));
        }
        None
    }

    pub fn can_submit(&self) -> bool {
        self.submit_blocker().is_none()
    }

    /// Lock the submit control and build the record to send.
    pub fn begin_submit(&mut self) -> Result<PreferenceRecord, WizardError> {
        if self.submitted {
            return Err(WizardError::AlreadySubmitted);
        }
        if let Some(reason) = self.submit_blocker() {
            return Err(WizardError::SubmitDisabled { reason });
        }
        let record = flatten(&self.draft)?;
        self.submitting = true;
        self.notice = None;
        Ok(record)
    }

    /// Record the outcome of the write. On failure the draft and step are
    /// left untouched so the user can resubmit.
    pub fn finish_submit(&mut self, outcome: Result<(), BackendError>) -> Result<(), WizardError> {
        self.submitting = false;
        match outcome {
            Ok(()) => {
                self.submitted = true;
                self.draft = PreferenceDraft::default();
                Ok(())
            }
            Err(e) => {
                let err = WizardError::SubmitFailed(e);
                self.notice = Some(err.to_string());
                Err(err)
            }
        }
    }
}

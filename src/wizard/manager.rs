//! PreferenceWizard: owns one wizard state and performs the final write.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::action::Action;
use super::draft::PreferenceDraft;
use super::state::{View, WizardState};
use crate::backend::Backend;
use crate::config::tables;
use crate::error::{BackendError, WizardError};

/// Idle wizards are dropped after this long.
pub const WIZARD_IDLE_TTL: Duration = Duration::from_secs(2 * 60 * 60);

/// Most wizards held at once; the least recently used goes first.
pub const WIZARD_CAPACITY: usize = 10_000;

/// One visitor's run through the wizard.
pub struct PreferenceWizard {
    id: Uuid,
    backend: Arc<dyn Backend>,
    state: Arc<Mutex<WizardState>>,
}

impl PreferenceWizard {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            id: Uuid::new_v4(),
            backend,
            state: Arc::new(Mutex::new(WizardState::new())),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub async fn dispatch(&self, action: Action) -> Result<WizardView, WizardError> {
        let mut state = self.state.lock().await;
        state.apply(action)?;
        Ok(WizardView::from_state(self.id, &state))
    }

    pub async fn next(&self) -> Result<WizardView, WizardError> {
        let mut state = self.state.lock().await;
        state.next()?;
        Ok(WizardView::from_state(self.id, &state))
    }

    pub async fn previous(&self) -> Result<WizardView, WizardError> {
        let mut state = self.state.lock().await;
        state.previous()?;
        Ok(WizardView::from_state(self.id, &state))
    }

    pub async fn view(&self) -> WizardView {
        WizardView::from_state(self.id, &*self.state.lock().await)
    }

    /// Insert the flattened draft as one row.
    ///
    /// The write runs on its own task and always records its outcome, even
    /// if the caller stops waiting. The state lock is released meanwhile;
    /// the `submitting` flag freezes the draft and step. A failed write
    /// leaves the draft intact for a manual retry. Nothing deduplicates
    /// retries.
    pub async fn submit(&self) -> Result<WizardView, WizardError> {
        let record = self.state.lock().await.begin_submit()?;

        let id = self.id;
        let backend = Arc::clone(&self.backend);
        let state = Arc::clone(&self.state);
        let write = tokio::spawn(async move {
            let outcome = backend
                .insert_one(tables::BUYER_PREFERENCES, &record.to_value())
                .await;
            if let Err(ref e) = outcome {
                warn!(wizard_id = %id, "Error submitting preferences: {}", e);
            }
            let mut state = state.lock().await;
            state.finish_submit(outcome)?;
            info!(wizard_id = %id, "Buyer preferences submitted");
            Ok::<_, WizardError>(WizardView::from_state(id, &state))
        });

        match write.await {
            Ok(result) => result,
            Err(e) => {
                warn!(wizard_id = %id, "Submit task failed: {}", e);
                let mut state = self.state.lock().await;
                state.finish_submit(Err(BackendError::Request {
                    endpoint: tables::BUYER_PREFERENCES.to_string(),
                    reason: e.to_string(),
                }))?;
                Ok(WizardView::from_state(id, &state))
            }
        }
    }
}

/// Wizard state as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct WizardView {
    pub id: Uuid,
    #[serde(flatten)]
    pub view: View,
    pub progress_percent: u8,
    pub submitting: bool,
    pub submitted: bool,
    pub can_submit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft: Option<PreferenceDraft>,
}

impl WizardView {
    fn from_state(id: Uuid, state: &WizardState) -> Self {
        Self {
            id,
            view: state.view(),
            progress_percent: state.step.progress_percent(),
            submitting: state.submitting,
            submitted: state.submitted,
            can_submit: state.can_submit(),
            notice: state.notice.clone(),
            draft: (!state.submitted).then(|| state.draft.clone()),
        }
    }
}

struct Slot {
    wizard: Arc<PreferenceWizard>,
    last_seen: Instant,
}

/// Live wizards keyed by id.
///
/// Bounded two ways: wizards idle longer than the TTL are dropped, and
/// creating one past capacity evicts the least recently used. A wizard is
/// retired as soon as its submission is stored.
pub struct WizardRegistry {
    wizards: RwLock<HashMap<Uuid, Slot>>,
    idle_ttl: Duration,
    capacity: usize,
}

impl WizardRegistry {
    pub fn new() -> Arc<Self> {
        Self::with_limits(WIZARD_IDLE_TTL, WIZARD_CAPACITY)
    }

    pub fn with_limits(idle_ttl: Duration, capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            wizards: RwLock::new(HashMap::new()),
            idle_ttl,
            capacity: capacity.max(1),
        })
    }

    pub async fn create(&self, backend: Arc<dyn Backend>) -> Arc<PreferenceWizard> {
        let wizard = Arc::new(PreferenceWizard::new(backend));
        let now = Instant::now();
        let mut wizards = self.wizards.write().await;

        let before = wizards.len();
        wizards.retain(|_, slot| now.duration_since(slot.last_seen) < self.idle_ttl);
        while wizards.len() >= self.capacity {
            let Some(oldest) = wizards
                .iter()
                .min_by_key(|(_, slot)| slot.last_seen)
                .map(|(id, _)| *id)
            else {
                break;
            };
            wizards.remove(&oldest);
        }
        let evicted = before - wizards.len();
        if evicted > 0 {
            debug!(evicted, "Evicted idle wizards");
        }

        wizards.insert(
            wizard.id(),
            Slot {
                wizard: Arc::clone(&wizard),
                last_seen: now,
            },
        );
        wizard
    }

    /// Look up a live wizard and mark it as used.
    pub async fn get(&self, id: Uuid) -> Result<Arc<PreferenceWizard>, WizardError> {
        let now = Instant::now();
        let mut wizards = self.wizards.write().await;
        match wizards.get_mut(&id) {
            Some(slot) if now.duration_since(slot.last_seen) < self.idle_ttl => {
                slot.last_seen = now;
                Ok(Arc::clone(&slot.wizard))
            }
            Some(_) => {
                wizards.remove(&id);
                debug!(wizard_id = %id, "Wizard expired");
                Err(WizardError::NotFound { id: id.to_string() })
            }
            None => Err(WizardError::NotFound { id: id.to_string() }),
        }
    }

    /// Submit a wizard and retire it once the row is stored.
    pub async fn submit(&self, id: Uuid) -> Result<WizardView, WizardError> {
        let view = self.get(id).await?.submit().await?;
        self.wizards.write().await.remove(&id);
        debug!(wizard_id = %id, "Wizard retired after submission");
        Ok(view)
    }

    pub async fn len(&self) -> usize {
        self.wizards.read().await.len()
    }
}

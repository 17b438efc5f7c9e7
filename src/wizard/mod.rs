//! Buyer preference wizard. Seven fixed steps, one insert at the end.
//!
//! The draft is changed only through [`action::reduce`]; the step machine
//! in [`state`] never gates `next`, only the final submit.

pub mod action;
pub mod catalog;
pub mod draft;
pub mod manager;
pub mod record;
pub mod state;

pub use action::{Action, Flag, RangeField, TextField, reduce};
pub use catalog::Category;
pub use draft::{PreferenceDraft, TagSet};
pub use manager::{PreferenceWizard, WizardRegistry, WizardView};
pub use record::{PreferenceRecord, flatten};
pub use state::{Step, View, WizardState};

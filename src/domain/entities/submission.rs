use std::fmt;

use serde::Serialize;
use uuid::Uuid;

use crate::entities::{
    property::{Property, PropertyForm},
    upload::ImageFile,
};

/// Lifecycle of one submission. `Failed` is only reachable from `Persisting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SubmissionState {
    Idle,
    Compressing,
    Uploading,
    Aggregating { completed: usize, total: usize },
    Composing,
    Persisting,
    Done,
    Failed,
}

impl SubmissionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SubmissionState::Done | SubmissionState::Failed)
    }
}

impl fmt::Display for SubmissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionState::Idle => write!(f, "idle"),
            SubmissionState::Compressing => write!(f, "compressing"),
            SubmissionState::Uploading => write!(f, "uploading"),
            SubmissionState::Aggregating { completed, total } => {
                write!(f, "aggregating ({} of {})", completed, total)
            }
            SubmissionState::Composing => write!(f, "composing"),
            SubmissionState::Persisting => write!(f, "persisting"),
            SubmissionState::Done => write!(f, "done"),
            SubmissionState::Failed => write!(f, "failed"),
        }
    }
}

/// Everything the form hands over: fields, newly selected files, who is submitting,
/// and the listing being edited if any.
#[derive(Debug, Clone)]
pub struct PropertySubmission {
    pub form: PropertyForm,
    pub images: Vec<ImageFile>,
    pub admin_id: Uuid,
    pub property_id: Option<Uuid>,
}

impl PropertySubmission {
    pub fn create(form: PropertyForm, images: Vec<ImageFile>, admin_id: Uuid) -> Self {
        PropertySubmission { form, images, admin_id, property_id: None }
    }

    pub fn edit(property_id: Uuid, form: PropertyForm, images: Vec<ImageFile>, admin_id: Uuid) -> Self {
        PropertySubmission { form, images, admin_id, property_id: Some(property_id) }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum SubmissionOutcome {
    Saved {
        property: Property,
        uploaded: usize,
        failed: usize,
        warning: Option<String>,
    },
    Failed {
        message: String,
    },
}

impl SubmissionOutcome {
    pub fn property(&self) -> Option<&Property> {
        match self {
            SubmissionOutcome::Saved { property, .. } => Some(property),
            SubmissionOutcome::Failed { .. } => None,
        }
    }

    pub fn is_saved(&self) -> bool {
        matches!(self, SubmissionOutcome::Saved { .. })
    }
}

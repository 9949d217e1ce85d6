//! Registration dialog as a transport-independent state machine.
//!
//! Steps run in a fixed order: ifo → address (+ delivery option) → phone →
//! comment (skippable) → confirm. The Telegram layer turns updates into
//! [`RegistrationEvent`]s, feeds them to [`RegistrationFlow::handle`] and renders
//! whatever [`Transition`] comes back. Collected answers live in a
//! [`RegistrationDraft`] that is dropped on completion and on cancellation.

use thiserror::Error;

use crate::config::limits::{MAX_PHONE_CHARS, MAX_TEXT_CHARS};
use crate::types::DeliveryOption;

/// One step of the registration dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistrationStep {
    Ifo,
    Address,
    Phone,
    Comment,
    Confirm,
}

impl RegistrationStep {
    /// Steps in dialog order.
    pub const ORDER: [RegistrationStep; 5] = [
        RegistrationStep::Ifo,
        RegistrationStep::Address,
        RegistrationStep::Phone,
        RegistrationStep::Comment,
        RegistrationStep::Confirm,
    ];

    pub fn next(self) -> Option<Self> {
        match self {
            RegistrationStep::Ifo => Some(RegistrationStep::Address),
            RegistrationStep::Address => Some(RegistrationStep::Phone),
            RegistrationStep::Phone => Some(RegistrationStep::Comment),
            RegistrationStep::Comment => Some(RegistrationStep::Confirm),
            RegistrationStep::Confirm => None,
        }
    }
}

/// Why a typed answer was not accepted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("answer is empty")]
    Empty,

    #[error("answer is longer than {max} characters")]
    TooLong { max: usize },
}

/// Trims a mandatory answer and checks it is non-empty and within `max` chars.
pub fn normalize_required(text: &str, max: usize) -> Result<String, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty);
    }
    if trimmed.chars().count() > max {
        return Err(ValidationError::TooLong { max });
    }
    Ok(trimmed.to_string())
}

/// Trims an optional answer; blank input means "no value".
pub fn normalize_optional(text: &str, max: usize) -> Result<Option<String>, ValidationError> {
    match normalize_required(text, max) {
        Ok(value) => Ok(Some(value)),
        Err(ValidationError::Empty) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Answers collected so far. Transient: never persisted as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationDraft {
    pub ifo: Option<String>,
    pub delivery: DeliveryOption,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    /// `None` when skipped or left blank
    pub comment: Option<String>,
}

impl RegistrationDraft {
    /// Returns the finished registration once every mandatory answer is present.
    pub fn complete(&self) -> Option<CompletedRegistration> {
        Some(CompletedRegistration {
            ifo: self.ifo.clone()?,
            delivery: self.delivery,
            address: self.address.clone()?,
            phone_number: self.phone_number.clone()?,
            comment: self.comment.clone(),
        })
    }
}

/// A confirmed registration, ready to be written to the participant store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedRegistration {
    pub ifo: String,
    pub delivery: DeliveryOption,
    pub address: String,
    pub phone_number: String,
    pub comment: Option<String>,
}

/// User actions understood by the dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationEvent {
    /// Free-text message
    Text(String),
    /// Delivery radio button pressed
    SelectDelivery(DeliveryOption),
    /// "Skip" on the comment step
    SkipComment,
    /// "Confirm" on the last step
    Confirm,
    /// "Cancel" on any step
    Cancel,
}

/// Result of feeding one event to the flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Answer stored, moved to the next step
    Advanced(RegistrationFlow),
    /// Same step, data changed (delivery option switched)
    Updated(RegistrationFlow),
    /// Same step, answer refused
    Rejected(RegistrationFlow, ValidationError),
    /// Event has no meaning on this step
    Ignored(RegistrationFlow),
    /// User confirmed; the draft is consumed
    Completed(CompletedRegistration),
    /// User aborted; the draft is discarded
    Cancelled,
}

/// Current step plus the draft collected so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationFlow {
    step: RegistrationStep,
    draft: RegistrationDraft,
}

impl Default for RegistrationFlow {
    fn default() -> Self {
        Self::start()
    }
}

impl RegistrationFlow {
    /// A fresh flow on the first step with an empty draft.
    pub fn start() -> Self {
        Self {
            step: RegistrationStep::Ifo,
            draft: RegistrationDraft::default(),
        }
    }

    pub fn step(&self) -> RegistrationStep {
        self.step
    }

    pub fn draft(&self) -> &RegistrationDraft {
        &self.draft
    }

    /// Applies one event and returns the transition.
    pub fn handle(mut self, event: RegistrationEvent) -> Transition {
        use RegistrationEvent as E;
        use RegistrationStep as S;

        match (self.step, event) {
            (_, E::Cancel) => Transition::Cancelled,

            (S::Ifo, E::Text(text)) => match normalize_required(&text, MAX_TEXT_CHARS) {
                Ok(ifo) => {
                    self.draft.ifo = Some(ifo);
                    self.advance()
                }
                Err(e) => Transition::Rejected(self, e),
            },

            (S::Address, E::SelectDelivery(option)) => {
                self.draft.delivery = option;
                Transition::Updated(self)
            }
            (S::Address, E::Text(text)) => match normalize_required(&text, MAX_TEXT_CHARS) {
                Ok(address) => {
                    self.draft.address = Some(address);
                    self.advance()
                }
                Err(e) => Transition::Rejected(self, e),
            },

            (S::Phone, E::Text(text)) => match normalize_required(&text, MAX_PHONE_CHARS) {
                Ok(phone) => {
                    self.draft.phone_number = Some(phone);
                    self.advance()
                }
                Err(e) => Transition::Rejected(self, e),
            },

            (S::Comment, E::Text(text)) => match normalize_optional(&text, MAX_TEXT_CHARS) {
                Ok(comment) => {
                    self.draft.comment = comment;
                    self.advance()
                }
                Err(e) => Transition::Rejected(self, e),
            },
            (S::Comment, E::SkipComment) => {
                self.draft.comment = None;
                self.advance()
            }

            (S::Confirm, E::Confirm) => match self.draft.complete() {
                Some(registration) => Transition::Completed(registration),
                None => Transition::Rejected(self, ValidationError::Empty),
            },

            _ => Transition::Ignored(self),
        }
    }

    fn advance(mut self) -> Transition {
        match self.step.next() {
            Some(next) => {
                self.step = next;
                Transition::Advanced(self)
            }
            None => Transition::Ignored(self),
        }
    }
}

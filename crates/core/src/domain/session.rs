use serde::{Deserialize, Serialize};

use crate::domain::intent::Intent;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
}

/// Which slot of the lead-capture form a turn is about.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormField {
    Name,
    Email,
    Platform,
}

/// Explicit lead-capture form state.
///
/// The collection stages advance strictly `Name -> Email -> Platform`;
/// `Captured` is terminal until the session re-enters a high-intent flow.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormStage {
    #[default]
    Idle,
    CollectingName,
    CollectingEmail,
    CollectingPlatform,
    Captured,
}

impl FormStage {
    /// The field the form is currently waiting on, if any.
    pub fn pending_field(&self) -> Option<FormField> {
        match self {
            Self::CollectingName => Some(FormField::Name),
            Self::CollectingEmail => Some(FormField::Email),
            Self::CollectingPlatform => Some(FormField::Platform),
            Self::Idle | Self::Captured => None,
        }
    }

    pub fn is_collecting(&self) -> bool {
        self.pending_field().is_some()
    }
}

/// Mutable state of one conversation.
///
/// Created at session start, mutated exclusively by the dialogue
/// controller driving that conversation, discarded at session end.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionState {
    pub current_intent: Option<Intent>,
    pub form: FormStage,
    pub name: Option<String>,
    pub email: Option<String>,
    pub platform: Option<String>,
    pub history: Vec<Turn>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.history.push(Turn { speaker: Speaker::User, text: text.into() });
    }

    pub fn push_assistant(&mut self, text: impl Into<String>) {
        self.history.push(Turn { speaker: Speaker::Assistant, text: text.into() });
    }

    /// True once a lead has been durably captured in this session.
    ///
    /// `Captured` is only ever entered after all three fields are set, so
    /// this also implies the fields are present.
    pub fn lead_captured(&self) -> bool {
        self.form == FormStage::Captured
    }

    /// Clears the collected fields and restarts the form at the name stage.
    /// Used when a captured session expresses purchase interest again.
    pub fn reset_form(&mut self) {
        self.name = None;
        self.email = None;
        self.platform = None;
        self.form = FormStage::CollectingName;
    }
}

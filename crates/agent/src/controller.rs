use autostream_core::{FormField, FormStage, Intent, Lead, SessionState};
use autostream_store::{LeadSink, StoreError};
use thiserror::Error;
use tracing::{debug, info};

use crate::classifier::{ClassifyError, IntentClassifier};
use crate::heuristics;
use crate::retriever::AnswerRetriever;

const GREETING_REPLY: &str = "Hi! How can I help you with AutoStream today?";
const NAME_PROMPT: &str = "Great! May I know your name?";
const EMAIL_PROMPT: &str = "Thanks! Could you share your email?";
const PLATFORM_PROMPT: &str =
    "Which platform do you create content on? (YouTube, Instagram, etc.)";
const GRATITUDE_ACK: &str = "You're welcome! Is there anything else I can help you with?";

const NAME_EXPLANATION: &str =
    "I need your name to personalize your AutoStream account and set up your profile. \
     This helps us provide you with a better experience. Could you please share your name?";
const EMAIL_EXPLANATION: &str =
    "I need your email address to create your account and send you important updates about \
     your subscription and account. Could you please share your email?";
const PLATFORM_EXPLANATION: &str =
    "I need to know which platform you create content on (like YouTube, Instagram, TikTok, \
     etc.) so we can tailor our video editing features to your needs. Which platform do you use?";

const DATA_USE_EXPLANATION: &str =
    "I collected your details (name, email, and platform) to create your account and set up \
     your AutoStream subscription. This information helps us:\n\
     - Personalize your experience\n\
     - Send you important updates about your account\n\
     - Understand which platform you create content on to provide relevant features\n\n\
     Your information is secure and will only be used for account management and service delivery.";

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("intent classification failed: {0}")]
    Classify(#[from] ClassifyError),
    #[error("lead capture failed: {0}")]
    LeadCapture(#[from] StoreError),
}

/// Per-turn dialogue state machine.
///
/// Owns the collaborators; the per-conversation `SessionState` is passed in
/// by the surface driving the conversation, so concurrent sessions never
/// share mutable state.
pub struct DialogueController<C, S> {
    classifier: C,
    lead_sink: S,
    retriever: AnswerRetriever,
}

impl<C, S> DialogueController<C, S>
where
    C: IntentClassifier,
    S: LeadSink,
{
    pub fn new(classifier: C, lead_sink: S, retriever: AnswerRetriever) -> Self {
        Self { classifier, lead_sink, retriever }
    }

    /// Processes one user utterance and returns the agent reply.
    ///
    /// On failure the user turn stays in history but no assistant turn is
    /// appended; the caller may retry the turn.
    pub async fn take_turn(
        &self,
        state: &mut SessionState,
        utterance: &str,
    ) -> Result<String, AgentError> {
        state.push_user(utterance);
        let reply = self.next_reply(state, utterance).await?;
        state.push_assistant(reply.clone());
        Ok(reply)
    }

    async fn next_reply(
        &self,
        state: &mut SessionState,
        utterance: &str,
    ) -> Result<String, AgentError> {
        if state.form.is_collecting() {
            return self.form_turn(state, utterance).await;
        }

        if state.lead_captured() && heuristics::is_lead_data_question(utterance) {
            return Ok(DATA_USE_EXPLANATION.to_string());
        }

        // Gratitude never reaches the classifier and never moves
        // `current_intent`.
        if heuristics::is_gratitude(utterance) {
            return Ok(GRATITUDE_ACK.to_string());
        }

        let intent = self.classifier.classify(utterance).await?;
        debug!(intent = intent.as_str(), "utterance classified");
        state.current_intent = Some(intent);

        let reply = match intent {
            Intent::Greeting => GREETING_REPLY.to_string(),
            Intent::ProductInquiry => self.retriever.answer(utterance, &state.history),
            Intent::HighIntent => {
                if state.lead_captured() {
                    // A fresh purchase interest restarts the form from
                    // scratch.
                    state.reset_form();
                } else {
                    state.form = FormStage::CollectingName;
                }
                // This turn only prompts; collection starts next turn.
                NAME_PROMPT.to_string()
            }
        };

        Ok(reply)
    }

    async fn form_turn(
        &self,
        state: &mut SessionState,
        utterance: &str,
    ) -> Result<String, AgentError> {
        if heuristics::is_clarifying_question(utterance) {
            let explanation = match state.form.pending_field() {
                Some(FormField::Name) => NAME_EXPLANATION,
                Some(FormField::Email) => EMAIL_EXPLANATION,
                Some(FormField::Platform) => PLATFORM_EXPLANATION,
                None => return Ok(GRATITUDE_ACK.to_string()),
            };
            return Ok(explanation.to_string());
        }

        // Not a question: the utterance is the value for the next unset
        // field, in strict name -> email -> platform order. No format
        // validation is applied.
        let value = utterance.trim().to_string();
        match state.form {
            FormStage::CollectingName => {
                state.name = Some(value);
                state.form = FormStage::CollectingEmail;
                Ok(EMAIL_PROMPT.to_string())
            }
            FormStage::CollectingEmail => {
                state.email = Some(value);
                state.form = FormStage::CollectingPlatform;
                Ok(PLATFORM_PROMPT.to_string())
            }
            FormStage::CollectingPlatform => {
                // Name and email are guaranteed set by the stage order.
                let name = state.name.clone().unwrap_or_default();
                let email = state.email.clone().unwrap_or_default();
                let receipt =
                    self.lead_sink.capture(Lead::new(name, email, value.clone())).await?;

                // Only advance after the sink confirmed the append, so a
                // failed capture leaves the turn retryable.
                state.platform = Some(value);
                state.form = FormStage::Captured;
                info!(status = %receipt.status, "lead captured");
                Ok(receipt.status)
            }
            FormStage::Idle | FormStage::Captured => {
                // Unreachable via `is_collecting`; kept total for safety.
                Ok(GRATITUDE_ACK.to_string())
            }
        }
    }
}

//! Dialogue runtime for the AutoStream support agent.
//!
//! This crate is the "brain" of the system:
//! - Classifies utterances into one of three intents (`classifier`)
//! - Answers product questions from the knowledge document (`retriever`)
//! - Drives the name -> email -> platform lead-capture form (`controller`)
//!
//! # Architecture
//!
//! Each turn runs a fixed decision ladder:
//! 1. Mid-form? Answer clarifying questions or fill the next field.
//! 2. Question about already-collected lead data? Fixed explanation.
//! 3. Gratitude? Fixed acknowledgment, classifier untouched.
//! 4. Otherwise classify the utterance and dispatch on the intent.
//!
//! # Safety principle
//!
//! The remote model is strictly a labeler: it picks one of three intents and
//! nothing else. Every reply string and every state mutation is decided
//! deterministically by the controller and the keyword retriever.

pub mod classifier;
pub mod controller;
pub mod heuristics;
pub mod retriever;

pub use classifier::{ClassifyError, GeminiClassifier, IntentClassifier};
pub use controller::{AgentError, DialogueController};
pub use retriever::AnswerRetriever;

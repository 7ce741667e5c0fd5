use std::sync::Arc;

use autostream_agent::{
    AnswerRetriever, ClassifyError, DialogueController, GeminiClassifier, IntentClassifier,
};
use autostream_core::config::{AppConfig, ConfigError, LoadOptions};
use autostream_store::{FileLeadSink, KnowledgeStore, LeadSink, StoreError};
use thiserror::Error;
use tracing::info;

use crate::chat::ChatState;

pub struct Application {
    pub config: AppConfig,
    pub knowledge: KnowledgeStore,
    pub chat_state: ChatState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("knowledge store failed to load: {0}")]
    Knowledge(#[from] StoreError),
    #[error("classifier setup failed: {0}")]
    Classifier(#[from] ClassifyError),
}

pub fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config)
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let knowledge = KnowledgeStore::load(&config.storage.knowledge_path)?;
    info!(
        event_name = "system.bootstrap.knowledge_loaded",
        path = %config.storage.knowledge_path.display(),
        "knowledge document loaded"
    );

    let classifier: Arc<dyn IntentClassifier> =
        Arc::new(GeminiClassifier::from_config(&config.llm)?);
    let lead_sink: Arc<dyn LeadSink> =
        Arc::new(FileLeadSink::new(config.storage.leads_path.clone()));

    let controller =
        DialogueController::new(classifier, lead_sink, AnswerRetriever::new(knowledge.get()));
    let chat_state = ChatState::new(controller);

    Ok(Application { config, knowledge, chat_state })
}

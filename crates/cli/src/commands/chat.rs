use std::io::{self, BufRead, Write};

use autostream_agent::{AnswerRetriever, DialogueController, GeminiClassifier};
use autostream_core::config::{AppConfig, LoadOptions};
use autostream_core::SessionState;
use autostream_store::{FileLeadSink, KnowledgeStore};

use super::CommandResult;

const EXIT_SENTINEL: &str = "exit";

/// Line-based chat loop: read a line, print the agent reply, exit on the
/// sentinel word. One session per process invocation.
pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return CommandResult::failure("chat", "config_validation", error.to_string(), 2),
    };

    let knowledge = match KnowledgeStore::load(&config.storage.knowledge_path) {
        Ok(knowledge) => knowledge,
        Err(error) => return CommandResult::failure("chat", "knowledge_store", error.to_string(), 2),
    };

    let classifier = match GeminiClassifier::from_config(&config.llm) {
        Ok(classifier) => classifier,
        Err(error) => return CommandResult::failure("chat", "classifier", error.to_string(), 2),
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(error) => return CommandResult::failure("chat", "runtime", error.to_string(), 1),
    };

    let lead_sink = FileLeadSink::new(config.storage.leads_path.clone());
    let controller =
        DialogueController::new(classifier, lead_sink, AnswerRetriever::new(knowledge.get()));
    let mut state = SessionState::new();

    println!("AutoStream Agent (CLI mode). Type {EXIT_SENTINEL} to quit.");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        print!("User: ");
        if stdout.flush().is_err() {
            break;
        }

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(error) => {
                return CommandResult::failure("chat", "stdin", error.to_string(), 1);
            }
        }

        let utterance = line.trim();
        if utterance.is_empty() {
            continue;
        }
        if utterance.eq_ignore_ascii_case(EXIT_SENTINEL) {
            break;
        }

        match runtime.block_on(controller.take_turn(&mut state, utterance)) {
            Ok(reply) => println!("Agent: {reply}"),
            // Classifier/sink failures terminate the turn, not the session.
            Err(error) => eprintln!("error: {error}"),
        }
    }

    CommandResult { exit_code: 0, output: String::new() }
}

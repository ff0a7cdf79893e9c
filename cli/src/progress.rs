//! Live turn progress on stderr

use chorus_application::TurnProgressNotifier;
use chorus_domain::{DisplayNames, MessageId, ModelId, StreamState};
use colored::Colorize;
use std::collections::HashMap;
use std::sync::Mutex;

/// Prints one line per phase and per response as the turn runs.
///
/// Goes to stderr so `--json` output on stdout stays parseable.
pub struct ConsoleProgress {
    names: DisplayNames,
    models: Mutex<HashMap<MessageId, ModelId>>,
}

impl ConsoleProgress {
    pub fn new(names: DisplayNames) -> Self {
        Self {
            names,
            models: Mutex::new(HashMap::new()),
        }
    }

    fn name_of(&self, id: &MessageId) -> String {
        self.models
            .lock()
            .ok()
            .and_then(|models| models.get(id).cloned())
            .map(|model| self.names.name_for(&model).to_string())
            .unwrap_or_else(|| id.to_string())
    }
}

impl TurnProgressNotifier for ConsoleProgress {
    fn on_turn_start(&self, mode: &str, respondents: &[ModelId]) {
        let names: Vec<&str> = respondents.iter().map(|m| self.names.name_for(m)).collect();
        eprintln!(
            "{} {} ({})",
            "->".cyan(),
            mode.bold(),
            names.join(", ")
        );
    }

    fn on_phase_start(&self, phase: &str, respondents: &[ModelId]) {
        eprintln!(
            "{} phase {} ({} respondents)",
            "->".cyan(),
            phase.bold(),
            respondents.len()
        );
    }

    fn on_stream_start(&self, message_id: &MessageId, model: &ModelId) {
        if let Ok(mut models) = self.models.lock() {
            models.insert(message_id.clone(), model.clone());
        }
        eprintln!("  {} {}", "..".dimmed(), self.names.name_for(model));
    }

    fn on_stream_end(&self, message_id: &MessageId, state: StreamState, content: &str) {
        let name = self.name_of(message_id);
        let chars = content.chars().count();
        if state == StreamState::Completed {
            eprintln!("  {} {} ({} chars)", "v".green(), name, chars);
        } else {
            eprintln!("  {} {} ({})", "x".red(), name, state);
        }
    }

    fn on_turn_complete(&self, message_ids: &[MessageId]) {
        eprintln!("{} {} replies settled\n", "->".cyan(), message_ids.len());
    }
}

//! Conversation output

use chorus_application::SendTurnOutput;
use chorus_domain::{Conversation, DisplayNames, Sender};
use colored::Colorize;

/// Formats a settled conversation for the terminal
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Messages in timestamp order, each under a sender label.
    ///
    /// Replies that ended in an error state get a red label.
    pub fn format(chat: &Conversation, names: &DisplayNames, turn: &SendTurnOutput) -> String {
        let mut output = String::new();

        if !chat.summary.is_empty() {
            output.push_str(&format!("{}\n", Self::header(&chat.summary)));
        }

        for message in chat.ordered_messages() {
            let label = match (&message.sender, &message.model_id) {
                (Sender::User, _) => "You".cyan().bold(),
                (Sender::Assistant, Some(model)) => {
                    let name = format!("── {} ──", names.name_for(model));
                    match turn.outcome(&message.id) {
                        Some(outcome) if !outcome.is_success() => name.red().bold(),
                        _ => name.yellow().bold(),
                    }
                }
                (Sender::Assistant, None) => "── assistant ──".yellow().bold(),
            };
            output.push_str(&format!("\n{}\n{}\n", label, message.content));
        }

        output
    }

    pub fn format_json(chat: &Conversation) -> String {
        serde_json::to_string_pretty(chat).unwrap_or_else(|_| "{}".to_string())
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chorus_application::StreamOutcome;
    use chorus_domain::{ChatId, Message, ModelId, StreamState};

    #[test]
    fn test_format_orders_by_timestamp_and_flags_failures() {
        colored::control::set_override(false);

        let mut chat = Conversation::new(ChatId::new("c"), 0);
        let user = Message::user("Question?", 1);
        let late = Message::placeholder(ModelId::new("b"), 3).with_content("[Error: Response cancelled]");
        let early = Message::placeholder(ModelId::new("a"), 2).with_content("Answer A");
        chat.add_message(user.clone()).unwrap();
        chat.add_message(late.clone()).unwrap();
        chat.add_message(early.clone()).unwrap();

        let names: DisplayNames = [(ModelId::new("a"), "Model A".to_string())]
            .into_iter()
            .collect();
        let turn = SendTurnOutput {
            user_message_id: user.id.clone(),
            message_ids: vec![late.id.clone(), early.id.clone()],
            outcomes: vec![StreamOutcome {
                message_id: late.id.clone(),
                model_id: ModelId::new("b"),
                state: StreamState::Errored,
                content: late.content.clone(),
            }],
        };

        let text = ConsoleFormatter::format(&chat, &names, &turn);

        let you = text.find("You").unwrap();
        let a = text.find("── Model A ──").unwrap();
        let b = text.find("── b ──").unwrap();
        assert!(you < a && a < b);
        assert!(text.contains("Answer A"));
    }

    #[test]
    fn test_format_json() {
        let mut chat = Conversation::new(ChatId::new("c"), 0);
        chat.add_message(Message::user("hi", 1)).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&ConsoleFormatter::format_json(&chat)).unwrap();
        assert_eq!(value["id"], "c");
        assert_eq!(value["messages"][0]["content"], "hi");
    }
}

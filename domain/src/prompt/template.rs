//! Prompt templates for conversation turns

use crate::conversation::entities::{Message, Sender};

/// Templates for generating system prompts and attribution tags
pub struct PromptTemplate;

impl PromptTemplate {
    /// Default base system prompt when none is configured
    pub fn default_system() -> &'static str {
        r#"You are a helpful assistant taking part in a conversation that may include other AI models.
Answer clearly and accurately. When other participants' replies are shown, they are prefixed with the participant's name in square brackets."#
    }

    /// Attribution tag for a model's name, e.g. `[GPT-4o]:`
    pub fn attribution_tag(name: &str) -> String {
        format!("[{}]:", name)
    }

    /// Prefix `content` with the author's tag.
    ///
    /// Idempotent: content that already starts with the tag is returned
    /// unchanged.
    pub fn attributed(content: &str, name: &str) -> String {
        let tag = Self::attribution_tag(name);
        if content.starts_with(&tag) {
            content.to_string()
        } else {
            format!("{} {}", tag, content)
        }
    }

    /// Join system prompt parts, skipping empty ones.
    pub fn compose_system<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
        parts
            .into_iter()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Banner describing the current phase of a phase script
    pub fn phase_banner(
        script_name: &str,
        description: Option<&str>,
        phase_name: &str,
        phase_number: usize,
        phase_count: usize,
    ) -> String {
        let mut banner = format!("Conversation script: {}", script_name);
        if let Some(desc) = description.filter(|d| !d.trim().is_empty()) {
            banner.push_str(&format!("\nDescription: {}", desc.trim()));
        }
        banner.push_str(&format!(
            "\nCurrent phase: {} ({} of {})",
            phase_name, phase_number, phase_count
        ));
        banner
    }

    /// Role assignment wrapper appended to a system prompt
    pub fn role_section(role: &str) -> String {
        format!("Your role in this conversation:\n{}", role.trim())
    }

    /// System prompt for title generation
    pub fn summary_system() -> &'static str {
        r#"You write short titles for conversations.
Reply with a title of at most 8 words. Do not use quotes or trailing punctuation."#
    }

    /// User prompt for title generation
    pub fn summary_prompt(messages: &[Message]) -> String {
        let mut prompt = String::from("Write a title for the following conversation:\n");
        for message in messages {
            let who = match message.sender {
                Sender::User => "User",
                Sender::Assistant => "Assistant",
            };
            prompt.push_str(&format!("\n{}: {}\n", who, message.content));
        }
        prompt
    }
}

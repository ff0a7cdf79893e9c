//! Mode policies: who responds, and what context each respondent sees.
//!
//! Each [`ConversationMode`] maps to one [`ModePolicy`] implementation,
//! selected once per turn by [`policy_for`].

use crate::conversation::entities::{Message, MessageId};
use crate::core::model::ModelId;
use crate::orchestration::mode::ConversationMode;
use crate::prompt::roles::{
    self, CONSENSUS_ROLES, DEBATE_STANCES, EXPERT_DOMAINS, REFINEMENT_IMPROVE, REFINEMENT_INITIAL,
    REFINEMENT_SUMMARY,
};
use crate::prompt::template::PromptTemplate;
use std::collections::HashMap;

/// Display names used for attribution tags.
///
/// Unknown ids fall back to the id itself.
#[derive(Debug, Clone, Default)]
pub struct DisplayNames(HashMap<ModelId, String>);

impl DisplayNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: ModelId, name: impl Into<String>) {
        self.0.insert(id, name.into());
    }

    pub fn name_for<'a>(&'a self, id: &'a ModelId) -> &'a str {
        self.0.get(id).map(String::as_str).unwrap_or(id.as_str())
    }
}

impl FromIterator<(ModelId, String)> for DisplayNames {
    fn from_iter<T: IntoIterator<Item = (ModelId, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Which respondents take part in a sub-round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageParticipants {
    All,
    First,
}

/// One barrier-gated sub-round of a staged mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub name: &'static str,
    pub participants: StageParticipants,
    pub instruction: &'static str,
}

impl Stage {
    pub fn participants_from(&self, respondents: &[ModelId]) -> Vec<ModelId> {
        match self.participants {
            StageParticipants::All => respondents.to_vec(),
            StageParticipants::First => respondents.iter().take(1).cloned().collect(),
        }
    }
}

/// How a mode schedules its respondents
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scheduling {
    /// All respondents stream at once
    Concurrent,
    /// One respondent at a time, each waiting for the previous to settle
    Sequential,
    /// Ordered sub-rounds separated by full barriers
    Staged(Vec<Stage>),
}

/// Strategy for a conversation mode.
pub trait ModePolicy: Send + Sync {
    fn mode(&self) -> ConversationMode;

    /// Context visible to `responding` when it answers.
    ///
    /// `messages` must already be in timestamp order. `exclude` is the
    /// responding message's own placeholder. Empty assistant messages are
    /// placeholders of replies still in flight and are never shown.
    fn filter_messages(
        &self,
        messages: &[Message],
        responding: &ModelId,
        exclude: Option<&MessageId>,
        names: &DisplayNames,
    ) -> Vec<Message>;

    /// Respondents for this turn, in activation order.
    fn select_respondents(&self, _messages: &[Message], candidates: &[ModelId]) -> Vec<ModelId> {
        candidates.to_vec()
    }

    fn scheduling(&self) -> Scheduling {
        Scheduling::Concurrent
    }

    /// Role instruction for the respondent at `index` in the candidate list
    fn role_instruction(&self, _index: usize) -> Option<&'static str> {
        None
    }
}

/// Factory: the policy for a mode
pub fn policy_for(mode: ConversationMode) -> Box<dyn ModePolicy> {
    match mode {
        ConversationMode::Isolated => Box::new(IsolatedPolicy),
        ConversationMode::Discuss => Box::new(DiscussPolicy),
        ConversationMode::RoundRobin => Box::new(RoundRobinPolicy),
        ConversationMode::Debate => Box::new(RolePolicy::new(mode, &DEBATE_STANCES)),
        ConversationMode::ExpertPanel => Box::new(RolePolicy::new(mode, &EXPERT_DOMAINS)),
        ConversationMode::ConsensusBuilding => Box::new(RolePolicy::new(mode, &CONSENSUS_ROLES)),
        ConversationMode::CollaborativeRefinement => Box::new(CollaborativeRefinementPolicy),
    }
}

fn is_visible(message: &Message, exclude: Option<&MessageId>) -> bool {
    if exclude == Some(&message.id) {
        return false;
    }
    !(message.is_assistant() && message.content.is_empty())
}

/// Copy of `message` with an attribution tag when it is an assistant reply
pub fn attribute(message: &Message, names: &DisplayNames) -> Message {
    match (&message.model_id, message.is_assistant()) {
        (Some(model), true) => {
            let content = PromptTemplate::attributed(&message.content, names.name_for(model));
            message.clone().with_content(content)
        }
        _ => message.clone(),
    }
}

fn all_attributed(
    messages: &[Message],
    exclude: Option<&MessageId>,
    names: &DisplayNames,
) -> Vec<Message> {
    messages
        .iter()
        .filter(|m| is_visible(m, exclude))
        .map(|m| attribute(m, names))
        .collect()
}

/// Independent answers: user messages plus the model's own replies.
pub struct IsolatedPolicy;

impl ModePolicy for IsolatedPolicy {
    fn mode(&self) -> ConversationMode {
        ConversationMode::Isolated
    }

    fn filter_messages(
        &self,
        messages: &[Message],
        responding: &ModelId,
        exclude: Option<&MessageId>,
        _names: &DisplayNames,
    ) -> Vec<Message> {
        messages
            .iter()
            .filter(|m| is_visible(m, exclude))
            .filter(|m| m.is_user() || m.is_from(responding))
            .cloned()
            .collect()
    }
}

/// Shared visibility: everything, with replies attributed.
pub struct DiscussPolicy;

impl ModePolicy for DiscussPolicy {
    fn mode(&self) -> ConversationMode {
        ConversationMode::Discuss
    }

    fn filter_messages(
        &self,
        messages: &[Message],
        _responding: &ModelId,
        exclude: Option<&MessageId>,
        names: &DisplayNames,
    ) -> Vec<Message> {
        all_attributed(messages, exclude, names)
    }
}

/// Sequential turns, each respondent seeing its predecessors' replies.
pub struct RoundRobinPolicy;

impl ModePolicy for RoundRobinPolicy {
    fn mode(&self) -> ConversationMode {
        ConversationMode::RoundRobin
    }

    fn filter_messages(
        &self,
        messages: &[Message],
        _responding: &ModelId,
        exclude: Option<&MessageId>,
        names: &DisplayNames,
    ) -> Vec<Message> {
        let Some(latest_user) = messages.iter().rposition(|m| m.is_user()) else {
            return all_attributed(messages, exclude, names);
        };

        let history = all_attributed(&messages[..latest_user], exclude, names);
        let current_turn = messages[latest_user + 1..]
            .iter()
            .filter(|m| m.is_assistant() && is_visible(m, exclude))
            .map(|m| attribute(m, names));

        history
            .into_iter()
            .chain(std::iter::once(messages[latest_user].clone()))
            .chain(current_turn)
            .collect()
    }

    fn scheduling(&self) -> Scheduling {
        Scheduling::Sequential
    }
}

/// Shared visibility plus a positional role (debate, expert panel, consensus).
pub struct RolePolicy {
    mode: ConversationMode,
    roles: &'static [&'static str],
}

impl RolePolicy {
    pub fn new(mode: ConversationMode, roles: &'static [&'static str]) -> Self {
        Self { mode, roles }
    }
}

impl ModePolicy for RolePolicy {
    fn mode(&self) -> ConversationMode {
        self.mode
    }

    fn filter_messages(
        &self,
        messages: &[Message],
        _responding: &ModelId,
        exclude: Option<&MessageId>,
        names: &DisplayNames,
    ) -> Vec<Message> {
        all_attributed(messages, exclude, names)
    }

    fn role_instruction(&self, index: usize) -> Option<&'static str> {
        roles::role_for(self.roles, index)
    }
}

/// Draft, refine, summarize; each sub-round gated by a full barrier.
pub struct CollaborativeRefinementPolicy;

impl ModePolicy for CollaborativeRefinementPolicy {
    fn mode(&self) -> ConversationMode {
        ConversationMode::CollaborativeRefinement
    }

    fn filter_messages(
        &self,
        messages: &[Message],
        _responding: &ModelId,
        exclude: Option<&MessageId>,
        names: &DisplayNames,
    ) -> Vec<Message> {
        all_attributed(messages, exclude, names)
    }

    fn scheduling(&self) -> Scheduling {
        Scheduling::Staged(vec![
            Stage {
                name: "initial",
                participants: StageParticipants::All,
                instruction: REFINEMENT_INITIAL,
            },
            Stage {
                name: "refinement",
                participants: StageParticipants::All,
                instruction: REFINEMENT_IMPROVE,
            },
            Stage {
                name: "summary",
                participants: StageParticipants::First,
                instruction: REFINEMENT_SUMMARY,
            },
        ])
    }
}

//! Conversation mode definitions.
//!
//! [`ConversationMode`] is the user-facing interaction policy for a turn.
//! [`ModeSpec`] is what a turn is actually run with: either one of the fixed
//! modes, or a phase script ([`DslConversation`]).

use crate::dsl::entities::DslConversation;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed interaction policies.
///
/// | Mode | Visibility | Scheduling |
/// |------|-----------|------------|
/// | `Isolated` | user + own replies | concurrent |
/// | `Discuss` | everything, attributed | concurrent |
/// | `RoundRobin` | everything incl. this turn's earlier replies | one at a time |
/// | `Debate` / `ExpertPanel` / `ConsensusBuilding` | as Discuss + role | concurrent |
/// | `CollaborativeRefinement` | as Discuss + round instructions | three gated rounds |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationMode {
    #[default]
    Isolated,
    Discuss,
    RoundRobin,
    Debate,
    ExpertPanel,
    ConsensusBuilding,
    CollaborativeRefinement,
}

impl ConversationMode {
    pub const ALL: [ConversationMode; 7] = [
        ConversationMode::Isolated,
        ConversationMode::Discuss,
        ConversationMode::RoundRobin,
        ConversationMode::Debate,
        ConversationMode::ExpertPanel,
        ConversationMode::ConsensusBuilding,
        ConversationMode::CollaborativeRefinement,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationMode::Isolated => "isolated",
            ConversationMode::Discuss => "discuss",
            ConversationMode::RoundRobin => "round_robin",
            ConversationMode::Debate => "debate",
            ConversationMode::ExpertPanel => "expert_panel",
            ConversationMode::ConsensusBuilding => "consensus_building",
            ConversationMode::CollaborativeRefinement => "collaborative_refinement",
        }
    }

    /// Get a human-readable description of this mode
    pub fn description(&self) -> &'static str {
        match self {
            ConversationMode::Isolated => {
                "Isolated: every model answers independently, seeing only its own history"
            }
            ConversationMode::Discuss => {
                "Discuss: every model sees the whole conversation with attributed replies"
            }
            ConversationMode::RoundRobin => {
                "Round robin: models answer one after another, reacting to earlier replies"
            }
            ConversationMode::Debate => "Debate: models argue assigned stances",
            ConversationMode::ExpertPanel => "Expert panel: models answer from assigned domains",
            ConversationMode::ConsensusBuilding => {
                "Consensus building: models work toward a shared position"
            }
            ConversationMode::CollaborativeRefinement => {
                "Collaborative refinement: draft, refine, then one model summarizes"
            }
        }
    }

    /// Modes where each model sees every other model's replies
    pub fn is_shared_visibility(&self) -> bool {
        !matches!(self, ConversationMode::Isolated)
    }
}

impl fmt::Display for ConversationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ConversationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "isolated" => Ok(ConversationMode::Isolated),
            "discuss" => Ok(ConversationMode::Discuss),
            "round_robin" | "roundrobin" | "rr" => Ok(ConversationMode::RoundRobin),
            "debate" => Ok(ConversationMode::Debate),
            "expert_panel" | "expert" => Ok(ConversationMode::ExpertPanel),
            "consensus_building" | "consensus" => Ok(ConversationMode::ConsensusBuilding),
            "collaborative_refinement" | "refine" => Ok(ConversationMode::CollaborativeRefinement),
            _ => Err(format!("Invalid conversation mode: {}", s)),
        }
    }
}

/// How a turn is run: a fixed mode or a phase script
#[derive(Debug, Clone, PartialEq)]
pub enum ModeSpec {
    Fixed(ConversationMode),
    Dsl(DslConversation),
}

impl ModeSpec {
    pub fn is_dsl(&self) -> bool {
        matches!(self, ModeSpec::Dsl(_))
    }

    pub fn label(&self) -> String {
        match self {
            ModeSpec::Fixed(mode) => mode.to_string(),
            ModeSpec::Dsl(dsl) => format!("dsl:{}", dsl.name),
        }
    }
}

impl Default for ModeSpec {
    fn default() -> Self {
        ModeSpec::Fixed(ConversationMode::default())
    }
}

impl From<ConversationMode> for ModeSpec {
    fn from(mode: ConversationMode) -> Self {
        ModeSpec::Fixed(mode)
    }
}

impl From<DslConversation> for ModeSpec {
    fn from(dsl: DslConversation) -> Self {
        ModeSpec::Dsl(dsl)
    }
}

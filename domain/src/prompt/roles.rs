//! Role tables for the role-assigning modes.
//!
//! Respondents are assigned a role by their position in the turn's candidate
//! list, modulo the table length.

/// Debate stances
pub const DEBATE_STANCES: [&str; 3] = [
    "You are arguing IN FAVOR of the position under discussion. Present the strongest case for it \
     and respond directly to counterarguments raised by other participants.",
    "You are arguing AGAINST the position under discussion. Present the strongest case against it \
     and challenge weak points in the other participants' arguments.",
    "You are a critical analyst. Weigh the arguments made by both sides, point out flaws and \
     unsupported claims, and identify which points are best supported.",
];

/// Expert panel domains
pub const EXPERT_DOMAINS: [&str; 4] = [
    "You are the panel's technical expert. Focus on implementation details, feasibility and \
     technical trade-offs.",
    "You are the panel's business and strategy expert. Focus on cost, value, market impact and \
     long-term strategy.",
    "You are the panel's ethics and risk expert. Focus on safety, fairness, legal exposure and \
     unintended consequences.",
    "You are the panel's user experience expert. Focus on the people affected, usability and \
     day-to-day impact.",
];

/// Consensus-building round roles
pub const CONSENSUS_ROLES: [&str; 3] = [
    "You are the proposer. Put forward a concrete position that others could agree on, and revise \
     it in light of objections already raised.",
    "You are the evaluator. Identify where the participants already agree and where they still \
     differ, and propose wording that resolves the differences.",
    "You are the mediator. Summarize the emerging common ground and state explicitly what the \
     group agrees on and what remains open.",
];

/// Instruction for the first collaborative refinement round
pub const REFINEMENT_INITIAL: &str = "This is the initial drafting round. Write your own \
     independent answer to the user's request.";

/// Instruction for the second collaborative refinement round
pub const REFINEMENT_IMPROVE: &str = "This is the refinement round. Read the drafts written by \
     the other participants, then produce an improved answer that keeps their best ideas and \
     fixes any mistakes.";

/// Instruction for the final collaborative refinement round
pub const REFINEMENT_SUMMARY: &str = "This is the final round. Merge the refined answers above \
     into a single, complete final answer for the user.";

/// Pick a role from `table` for the respondent at `index`
pub fn role_for(table: &[&'static str], index: usize) -> Option<&'static str> {
    if table.is_empty() {
        return None;
    }
    Some(table[index % table.len()])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_for_wraps_around() {
        assert_eq!(role_for(&DEBATE_STANCES, 0), Some(DEBATE_STANCES[0]));
        assert_eq!(role_for(&DEBATE_STANCES, 3), Some(DEBATE_STANCES[0]));
        assert_eq!(role_for(&EXPERT_DOMAINS, 5), Some(EXPERT_DOMAINS[1]));
    }

    #[test]
    fn test_role_for_empty_table() {
        assert_eq!(role_for(&[], 2), None);
    }
}

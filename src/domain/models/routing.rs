//! Role/model routing types.

use serde::{Deserialize, Serialize};

use super::task::AgentRole;

/// Model quality tier an assignment runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelTier {
    /// Cheapest tier, for trivial work.
    Fast,
    /// Default tier for first attempts.
    Balanced,
    /// Escalation tier for retries and repair work.
    Powerful,
}

impl ModelTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Balanced => "balanced",
            Self::Powerful => "powerful",
        }
    }
}

/// A routing decision for one scheduling attempt.
///
/// Produced fresh by the distributor on every dispatch; never stored as
/// mutable state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleAssignment {
    /// Role the agent runs under for this attempt.
    pub role: AgentRole,
    /// Quality tier for this attempt.
    pub tier: ModelTier,
    /// Concrete model alias resolved from the tier.
    pub model: String,
    /// Human-readable justification for the decision.
    pub reason: String,
    /// Whether this assignment was escalated from the task's defaults.
    pub escalated: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_names() {
        assert_eq!(ModelTier::Fast.as_str(), "fast");
        assert_eq!(ModelTier::Balanced.as_str(), "balanced");
        assert_eq!(ModelTier::Powerful.as_str(), "powerful");
    }

    #[test]
    fn test_assignment_serde() {
        let assignment = RoleAssignment {
            role: AgentRole::Fixer,
            tier: ModelTier::Powerful,
            model: "opus".to_string(),
            reason: "second failure".to_string(),
            escalated: true,
        };
        let json = serde_json::to_string(&assignment).unwrap();
        assert!(json.contains("\"fixer\""));
        assert!(json.contains("\"powerful\""));
    }
}

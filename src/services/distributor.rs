//! Role/model routing policy.
//!
//! A pure escalation ladder: the first retry upgrades compute, repeated
//! failure swaps in the fixer role. Kept separate from the task master's
//! retry counting so "should we retry" and "how do we retry differently"
//! stay independently testable.

use crate::domain::models::{AgentRole, ModelTier, RoleAssignment, RoutingConfig, Task};

/// Stateless routing policy.
#[derive(Debug, Clone, Default)]
pub struct Distributor {
    config: RoutingConfig,
}

impl Distributor {
    pub fn new(config: RoutingConfig) -> Self {
        Self { config }
    }

    /// Route a task given how many times it has failed so far.
    ///
    /// - 0 failures: the task's own role on the balanced tier.
    /// - 1 failure: same role, powerful tier — upgrade compute, not role.
    /// - 2+ failures: fixer role on the powerful tier, regardless of the
    ///   original role.
    pub fn route(&self, task: &Task, failure_count: u32) -> RoleAssignment {
        let (role, tier, reason) = match failure_count {
            0 => (
                task.role,
                ModelTier::Balanced,
                format!("first attempt as {}", task.role.as_str()),
            ),
            1 => (
                task.role,
                ModelTier::Powerful,
                "first retry: upgraded to powerful tier".to_string(),
            ),
            n => (
                AgentRole::Fixer,
                ModelTier::Powerful,
                format!("{n} failures: escalated to fixer"),
            ),
        };

        RoleAssignment {
            role,
            tier,
            model: self.model_for(tier),
            reason,
            escalated: failure_count > 0,
        }
    }

    /// Resolve a tier to its configured model alias.
    pub fn model_for(&self, tier: ModelTier) -> String {
        match tier {
            ModelTier::Fast => self.config.fast_model.clone(),
            ModelTier::Balanced => self.config.balanced_model.clone(),
            ModelTier::Powerful => self.config.powerful_model.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task_with_role(role: AgentRole) -> Task {
        Task::new("t", "Test task").with_role(role)
    }

    #[test]
    fn test_first_attempt_keeps_role_balanced_tier() {
        let distributor = Distributor::default();
        let assignment = distributor.route(&task_with_role(AgentRole::Reviewer), 0);
        assert_eq!(assignment.role, AgentRole::Reviewer);
        assert_eq!(assignment.tier, ModelTier::Balanced);
        assert_eq!(assignment.model, "sonnet");
        assert!(!assignment.escalated);
    }

    #[test]
    fn test_first_retry_upgrades_tier_not_role() {
        let distributor = Distributor::default();
        let assignment = distributor.route(&task_with_role(AgentRole::Worker), 1);
        assert_eq!(assignment.role, AgentRole::Worker);
        assert_eq!(assignment.tier, ModelTier::Powerful);
        assert!(assignment.escalated);
    }

    #[test]
    fn test_repeated_failure_escalates_to_fixer() {
        let distributor = Distributor::default();
        for role in [
            AgentRole::Worker,
            AgentRole::Foreman,
            AgentRole::Reviewer,
            AgentRole::Fixer,
        ] {
            for failures in [2, 3, 10] {
                let assignment = distributor.route(&task_with_role(role), failures);
                assert_eq!(assignment.role, AgentRole::Fixer);
                assert_eq!(assignment.tier, ModelTier::Powerful);
                assert_eq!(assignment.model, "opus");
            }
        }
    }

    #[test]
    fn test_custom_model_aliases() {
        let distributor = Distributor::new(RoutingConfig {
            fast_model: "tiny".to_string(),
            balanced_model: "mid".to_string(),
            powerful_model: "big".to_string(),
        });
        assert_eq!(distributor.route(&task_with_role(AgentRole::Worker), 0).model, "mid");
        assert_eq!(distributor.route(&task_with_role(AgentRole::Worker), 2).model, "big");
    }

    #[test]
    fn test_route_is_pure() {
        let distributor = Distributor::default();
        let task = task_with_role(AgentRole::Foreman);
        let a = distributor.route(&task, 1);
        let b = distributor.route(&task, 1);
        assert_eq!(a, b);
    }
}

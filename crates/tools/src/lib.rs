//! Built-in tool implementations for TaskClaw.
//!
//! Every tool takes one line of free text and answers with one string:
//! arithmetic, text statistics, message templating, task planning and
//! TODO list management.

pub mod calculator;
pub mod message_creator;
pub mod task_planner;
pub mod text_analyzer;
pub mod todo_manager;

use std::sync::Arc;

use taskclaw_core::provider::Provider;
use taskclaw_core::tool::ToolRegistry;

pub use task_planner::PlannerSettings;

/// Create the registry with every built-in tool, in catalog order.
///
/// The task planner shares the agent's provider for its decomposition call.
pub fn default_registry(provider: Arc<dyn Provider>, planner: PlannerSettings) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(task_planner::TaskPlannerTool::new(provider, planner)));
    registry.register(Box::new(todo_manager::TodoManagerTool));
    registry.register(Box::new(calculator::CalculatorTool));
    registry.register(Box::new(text_analyzer::TextAnalyzerTool));
    registry.register(Box::new(message_creator::MessageCreatorTool));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use taskclaw_core::error::ProviderError;
    use taskclaw_core::provider::{ProviderRequest, ProviderResponse};

    struct Unused;

    #[async_trait]
    impl Provider for Unused {
        fn name(&self) -> &str {
            "unused"
        }

        async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            Err(ProviderError::NotConfigured("unused".into()))
        }
    }

    #[test]
    fn registry_has_all_tools_in_order() {
        let registry = default_registry(Arc::new(Unused), PlannerSettings::default());
        assert_eq!(
            registry.names(),
            vec!["task_planner", "todo_manager", "calculator", "text_analyzer", "message_creator"]
        );
        assert!(registry.catalog().starts_with("- task_planner: "));
        assert_eq!(registry.catalog().lines().count(), 5);
    }
}

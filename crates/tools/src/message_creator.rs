//! Message creator tool: fills a fixed greeting template.

use async_trait::async_trait;
use taskclaw_core::error::ToolError;
use taskclaw_core::session::Session;
use taskclaw_core::tool::{Tool, ToolResult};

pub struct MessageCreatorTool;

#[async_trait]
impl Tool for MessageCreatorTool {
    fn name(&self) -> &str {
        "message_creator"
    }

    fn description(&self) -> &str {
        "Creates a message or greeting. Input is the information the message should include"
    }

    async fn execute(&self, input: &str, _session: &Session) -> Result<ToolResult, ToolError> {
        let info = input.trim();
        Ok(ToolResult::ok(format!(
            "Created message: Using the information \"{info}\": Hello! Here are some great results to share: {info}. Have a wonderful day!"
        )))
    }
}

//! Text analyzer tool: word and character counts.

use async_trait::async_trait;
use taskclaw_core::error::ToolError;
use taskclaw_core::session::Session;
use taskclaw_core::tool::{Tool, ToolResult};

pub struct TextAnalyzerTool;

/// Words are whitespace-delimited tokens of the trimmed text; characters
/// are Unicode scalar values of the raw input, whitespace included.
pub fn analyze(text: &str) -> (usize, usize) {
    let words = text.split_whitespace().count();
    let chars = text.chars().count();
    (words, chars)
}

#[async_trait]
impl Tool for TextAnalyzerTool {
    fn name(&self) -> &str {
        "text_analyzer"
    }

    fn description(&self) -> &str {
        "Analyzes text and reports its word and character counts. Input is the text to analyze"
    }

    async fn execute(&self, input: &str, _session: &Session) -> Result<ToolResult, ToolError> {
        let (words, chars) = analyze(input);
        Ok(ToolResult::ok(format!(
            "Text analysis: \"{input}\" - {words} words, {chars} characters"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts() {
        assert_eq!(analyze("hello world"), (2, 11));
        assert_eq!(analyze("  spaced   out\ttext \n"), (3, 21));
        assert_eq!(analyze(""), (0, 0));
    }

    #[test]
    fn characters_are_scalar_values() {
        assert_eq!(analyze("こんにちは 世界"), (2, 8));
        assert_eq!(analyze("naïve café"), (2, 10));
    }

    #[tokio::test]
    async fn tool_output() {
        let session = Session::default();
        let result = TextAnalyzerTool.execute("hello world", &session).await.unwrap();
        assert!(result.success);
        assert_eq!(result.output, "Text analysis: \"hello world\" - 2 words, 11 characters");
    }
}

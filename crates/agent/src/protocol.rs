//! The line protocol the model answers in.
//!
//! ```text
//! reply := "FINAL:" answer
//!        | line*            (non-empty lines, trimmed)
//! line  := "THOUGHT:" text | "TOOL:" text | "INPUT:" text | other
//! ```
//!
//! When a field appears more than once, the last occurrence wins. Lines
//! that carry none of the three prefixes are ignored.

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub tool: String,
    pub input: String,
}

/// A parsed model reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// The model is done; the payload is the answer with the prefix removed.
    Final(String),

    /// Either a tool call (with an optional thought) or a bare thought.
    Step {
        thought: Option<String>,
        action: Option<Action>,
    },

    /// Neither a complete action nor a bare thought. A thought, if one
    /// was present, is still reported before the run stops.
    Unparseable { thought: Option<String> },
}

const FINAL: &str = "FINAL:";
const THOUGHT: &str = "THOUGHT:";
const TOOL: &str = "TOOL:";
const INPUT: &str = "INPUT:";

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

/// Parse a reply. The caller passes the trimmed model output.
pub fn parse_reply(content: &str) -> Reply {
    let content = content.trim();

    if let Some(answer) = content.strip_prefix(FINAL) {
        return Reply::Final(answer.trim().to_string());
    }

    let mut thought = None;
    let mut tool = None;
    let mut input = None;

    for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(rest) = line.strip_prefix(THOUGHT) {
            thought = non_empty(rest);
        } else if let Some(rest) = line.strip_prefix(TOOL) {
            tool = non_empty(rest);
        } else if let Some(rest) = line.strip_prefix(INPUT) {
            input = non_empty(rest);
        }
    }

    match (tool, input) {
        (Some(tool), Some(input)) => Reply::Step {
            thought,
            action: Some(Action { tool, input }),
        },
        (None, _) if thought.is_some() => Reply::Step {
            thought,
            action: None,
        },
        _ => Reply::Unparseable { thought },
    }
}

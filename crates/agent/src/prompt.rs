//! Prompt construction for each loop iteration.

/// The system instruction sent with every step.
pub fn system_instruction(language: &str) -> String {
    format!("You must respond in {language}. All of your output must be written in {language}.")
}

/// Build the user prompt for one iteration from the tool catalog, the
/// original task and the context accumulated so far.
pub fn step_prompt(catalog: &str, tool_names: &[&str], task: &str, context: &str, language: &str) -> String {
    let names = match tool_names.split_last() {
        Some((last, rest)) if !rest.is_empty() => format!("{}, or {last}", rest.join(", ")),
        Some((last, _)) => (*last).to_string(),
        None => String::new(),
    };

    format!(
        "You are an AI agent that MUST use tools to solve tasks step by step. You MUST respond in {language}.

WORKFLOW:
1. First, analyze if this is a new task that needs to be broken down
2. If it's a complex task, use task_planner to create a TODO list
3. Use todo_manager to track progress and get current tasks
4. Execute individual tasks using appropriate tools
5. Mark tasks as complete using todo_manager
6. Provide final summary when all tasks are done

Available tools:
{catalog}

Task: {task}
Previous context: {context}

You must respond with EXACTLY one of these formats (no additional text):

Format 1 - For continuing work:
THOUGHT: [your reasoning about what to do next, in {language}]
TOOL: [tool name: {names}]
INPUT: [input for the tool]

Format 2 - For completion:
FINAL: [the final answer once every task is done, in {language}]

CRITICAL RULES:
- For complex tasks, ALWAYS start with task_planner
- Use todo_manager to track progress: \"list\", \"current\", \"complete [number]\"
- You MUST use tools. You cannot calculate, analyze, or create messages directly.
- ALL text output including THOUGHT and FINAL must be in {language}.
- Response must be EXACTLY in the format shown above (3 lines for Format 1, 1 line for Format 2)
- No extra explanation or text outside the format."
    )
}

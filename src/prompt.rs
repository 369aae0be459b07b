//! System prompt construction.
//!
//! The system prompt is never stored in the conversation.  It is rebuilt from
//! the current decision context on every request, so editing the context
//! changes the instructions for all later turns without rewriting history.

/// Fixed behavioral instructions that open every system prompt.
pub const SYSTEM_PROMPT_TEMPLATE: &str = "You are Decidr, an expert decision-making assistant. Your role is to help users make thoughtful, well-informed decisions by:

1. Asking clarifying questions to understand the situation fully
2. Helping identify pros and cons
3. Considering different perspectives and potential outcomes
4. Suggesting decision-making frameworks when appropriate
5. Providing objective analysis while respecting the user's values and preferences

Be conversational, empathetic, and practical. Ask one question at a time to avoid overwhelming the user. Help them think through their decision systematically.";

/// Separates the template from the decision context.
pub const CONTEXT_DELIMITER: &str = "\n\nCurrent decision context: ";

/// Builds the system prompt for the given decision context.
///
/// The result always starts with [`SYSTEM_PROMPT_TEMPLATE`] verbatim.  A
/// non-empty context is appended after [`CONTEXT_DELIMITER`]; an empty one
/// yields the bare template.
///
/// ```
/// # use decidr::prompt::{build_system_prompt, SYSTEM_PROMPT_TEMPLATE};
/// assert_eq!(build_system_prompt(""), SYSTEM_PROMPT_TEMPLATE);
/// assert!(build_system_prompt("rent or buy").ends_with("rent or buy"));
/// ```
pub fn build_system_prompt(decision_context: &str) -> String {
    if decision_context.is_empty() {
        return SYSTEM_PROMPT_TEMPLATE.to_string();
    }
    let mut prompt = String::with_capacity(
        SYSTEM_PROMPT_TEMPLATE.len() + CONTEXT_DELIMITER.len() + decision_context.len(),
    );
    prompt.push_str(SYSTEM_PROMPT_TEMPLATE);
    prompt.push_str(CONTEXT_DELIMITER);
    prompt.push_str(decision_context);
    prompt
}

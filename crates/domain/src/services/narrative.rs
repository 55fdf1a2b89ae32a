//! Narrative engine capability and the fixed diff-prompt template.

use thiserror::Error;

/// Errors surfaced by a narrative engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Timeout, connection failure, or a rejected/unparseable completion
    /// response. Never retried: the analysis phase attempts each external
    /// call exactly once.
    #[error("completion transport failure: {0}")]
    Transport(String),
}

/// Prompt-completion engine producing free text from a bounded request.
#[async_trait::async_trait]
pub trait NarrativeEngine: Send + Sync {
    /// Complete a prompt, optionally bounding the response size.
    async fn complete(&self, prompt: &str, max_tokens: Option<u32>)
        -> Result<String, EngineError>;
}

/// Build the fixed diff prompt for two snapshots.
///
/// Both serialized snapshot bodies are embedded verbatim; the instructions
/// ask for new identifiers, count deltas, and qualitative trends.
pub fn build_diff_prompt(
    prior_key: &str,
    prior_text: &str,
    current_key: &str,
    current_text: &str,
) -> String {
    format!(
        r#"You are reviewing website visitor logs. Each snapshot below lists one
record per line as ("identifier", visit_count).

Prior snapshot {prior_key}:
{prior_text}

Current snapshot {current_key}:
{current_text}

Compare the two snapshots and enumerate:
1. Identifiers that appear in the current snapshot but not the prior one.
2. The change in visit count for identifiers present in both.
3. Any qualitative trends an operator should know about.
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_both_snapshots_verbatim() {
        let prior = "(\"1.1.1.1\", 24)";
        let current = "(\"1.1.1.1\", 30)\n(\"3.3.3.3\", 10)";

        let prompt = build_diff_prompt("visitors20260818", prior, "visitors20260825", current);

        assert!(prompt.contains(prior));
        assert!(prompt.contains(current));
        assert!(prompt.contains("visitors20260818"));
        assert!(prompt.contains("visitors20260825"));
    }

    #[test]
    fn test_prompt_lists_the_three_questions() {
        let prompt = build_diff_prompt("a", "", "b", "");
        assert!(prompt.contains("not the prior one"));
        assert!(prompt.contains("change in visit count"));
        assert!(prompt.contains("qualitative trends"));
    }
}

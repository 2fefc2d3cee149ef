//! Prompt templates for Svar.

use serde::{Deserialize, Serialize};

/// Collection of all prompt templates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Prompts {
    pub answer: AnswerPrompts,
    pub summary: SummaryPrompts,
}

/// Prompts for grounded answer generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerPrompts {
    pub system: String,
    pub user: String,
}

impl Default for AnswerPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are a helpful assistant that answers questions based on content retrieved from the user's knowledge base.

Guidelines:
- Answer the question using only the provided passage
- Quote or paraphrase the passage rather than inventing facts
- If the passage only partially answers the question, answer what it supports and say what is missing
- Be concise but complete"#
                .to_string(),

            user: r#"Question: {{question}}

Relevant passage from the knowledge base:
---
{{context}}
---

Please answer the question based on the passage above."#
                .to_string(),
        }
    }
}

/// Prompts for knowledge summary generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryPrompts {
    pub system: String,
    pub user: String,
}

impl Default for SummaryPrompts {
    fn default() -> Self {
        Self {
            system: "You are a helpful assistant that analyzes document collections and generates summaries. Always respond with valid JSON."
                .to_string(),

            user: r#"Based on the following indexed content, generate a comprehensive knowledge summary and suggested questions.

{{context}}

Please provide:
1. A brief overview of the main topics covered (2-3 sentences)
2. A list of 5-10 key topics/subjects
3. 8-12 example questions users can ask

Format your response as JSON:
{
  "overview": "Brief overview text...",
  "topics": ["Topic 1", "Topic 2", ...],
  "suggested_questions": [
    "Question 1?",
    "Question 2?",
    ...
  ]
}"#
            .to_string(),
        }
    }
}

impl Prompts {
    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &std::collections::HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(!prompts.answer.system.is_empty());
        assert!(prompts.summary.user.contains("{{context}}"));
    }

    #[test]
    fn test_render_template() {
        let template = "Question: {{question}}\nContext: {{context}}";
        let mut vars = std::collections::HashMap::new();
        vars.insert("question".to_string(), "What is OpenStax?".to_string());
        vars.insert("context".to_string(), "OpenStax is a publisher.".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(
            result,
            "Question: What is OpenStax?\nContext: OpenStax is a publisher."
        );
    }
}

use crate::types::RetrievedDocument;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

const SYSTEM_RULES: &str = "You are an expert Travel Agent. Your goal is to plan a detailed itinerary for the user based on their request.

RULES:
1. You MUST use the provided Context to find real hotels, restaurants, and attractions.
2. Do NOT hallucinate places. Only recommend places found in the Context.
3. Follow the schema strictly.
4. If the context doesn't contain enough info, do your best with what is available, but prioritize accuracy.
";

/// Instruction sent to the generation step: rules, context and examples in
/// the system turn, the traveller's request verbatim in the user turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptPayload {
    pub system: String,
    pub user: String,
}

impl PromptPayload {
    pub fn to_messages(&self) -> Vec<Value> {
        vec![
            json!({ "role": "system", "content": self.system }),
            json!({ "role": "user", "content": self.user }),
        ]
    }
}

/// Document contents separated by a blank line, in retrieval order.
pub fn format_context(documents: &[RetrievedDocument]) -> String {
    documents
        .iter()
        .map(|doc| doc.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn assemble_prompt(
    documents: &[RetrievedDocument],
    examples: &str,
    query: &str,
) -> PromptPayload {
    let system = format!(
        "{SYSTEM_RULES}\nCONTEXT:\n{}\n\nFEW-SHOT EXAMPLES:\n{examples}\n",
        format_context(documents)
    );

    PromptPayload {
        system,
        user: query.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn doc(content: &str) -> RetrievedDocument {
        RetrievedDocument::new(content, Map::new())
    }

    #[test]
    fn test_context_joined_with_blank_line() {
        let docs = vec![doc("Restaurant: Chez Janou"), doc("Hotel: Le Meurice")];
        assert_eq!(
            format_context(&docs),
            "Restaurant: Chez Janou\n\nHotel: Le Meurice"
        );
    }

    #[test]
    fn test_prompt_contains_rules_context_and_examples() {
        let docs = vec![doc("Attraction: Louvre")];
        let prompt = assemble_prompt(
            &docs,
            "\nExample 1:\nQuery: q\nAnswer: a\n",
            "2 days in Paris",
        );

        assert!(prompt.system.contains("Do NOT hallucinate places"));
        assert!(prompt.system.contains("Follow the schema strictly"));
        assert!(prompt.system.contains("prioritize accuracy"));
        assert!(prompt.system.contains("CONTEXT:\nAttraction: Louvre\n"));
        assert!(prompt.system.contains("FEW-SHOT EXAMPLES:\n\nExample 1:"));
        assert_eq!(prompt.user, "2 days in Paris");
    }

    #[test]
    fn test_context_braces_are_not_reinterpolated() {
        let docs = vec![doc("Menu: {examples}")];
        let prompt = assemble_prompt(&docs, "EX", "q");
        assert!(prompt.system.contains("Menu: {examples}"));
    }

    #[test]
    fn test_messages_roles() {
        let messages = assemble_prompt(&[], "none", "Rome").to_messages();
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["role"], "user");
        assert_eq!(messages[1]["content"], "Rome");
    }
}

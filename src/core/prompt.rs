//! Fixed instruction text and the prompt template for the templated
//! buffer mode.

use crate::core::store::ExchangePair;

/// System instruction seeded into the raw transcript at startup.
pub const SYSTEM_SEED: &str = "You are a knowledgeable and helpful AI assistant. \
Provide accurate, useful information, and keep a polite and friendly tone.";

/// Template rendered for every templated-mode turn. `{history}` receives
/// the accumulated exchange pairs as a linear transcript and `{input}`
/// the new user text.
const CHAT_TEMPLATE: &str = "\
You are a knowledgeable and helpful AI assistant.

Here is your conversation with the user so far:
{history}

User: {input}
Assistant:";

/// Render the fixed template around the accumulated pairs and the new
/// user input.
pub fn render_prompt(pairs: &[ExchangePair], input: &str) -> String {
    let mut history = String::new();
    for pair in pairs {
        history.push_str(&format!("User: {}\n", pair.user));
        history.push_str(&format!("Assistant: {}\n", pair.assistant));
    }

    CHAT_TEMPLATE
        .replace("{history}", history.trim_end())
        .replace("{input}", input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(user: &str, assistant: &str) -> ExchangePair {
        ExchangePair {
            user: user.to_string(),
            assistant: assistant.to_string(),
        }
    }

    #[test]
    fn renders_empty_history() {
        let prompt = render_prompt(&[], "hello");
        assert!(prompt.contains("conversation with the user so far:\n\n"));
        assert!(prompt.ends_with("User: hello\nAssistant:"));
        assert!(!prompt.contains("{history}"));
        assert!(!prompt.contains("{input}"));
    }

    #[test]
    fn renders_pairs_in_order() {
        let pairs = vec![pair("one", "first"), pair("two", "second")];
        let prompt = render_prompt(&pairs, "three");

        let one = prompt.find("User: one").unwrap();
        let first = prompt.find("Assistant: first").unwrap();
        let two = prompt.find("User: two").unwrap();
        let second = prompt.find("Assistant: second").unwrap();
        let three = prompt.find("User: three").unwrap();
        assert!(one < first && first < two && two < second && second < three);
    }
}

//! Name-hint heuristic.
//!
//! A single case-insensitive substring check, nothing more: no punctuation
//! handling, no validation that the remainder looks like a name. Kept as a
//! pure function so it can be swapped for a real entity extractor.

use crate::subsystems::memory::store::Fact;

/// Phrase that marks a name-sharing statement. Must stay ASCII so byte
/// offsets in the lowercased copy line up with the original text.
pub const TRIGGER_PHRASE: &str = "my name is";

/// Text after the last occurrence of [`TRIGGER_PHRASE`], trimmed.
///
/// Returns `None` when the phrase is absent or nothing but whitespace
/// follows it.
pub fn extract_name(message: &str) -> Option<String> {
    let lowered = message.to_ascii_lowercase();
    let start = lowered.rfind(TRIGGER_PHRASE)? + TRIGGER_PHRASE.len();
    let name = message[start..].trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// The fact injected into context for an extracted name.
pub fn name_fact(name: &str) -> Fact {
    Fact(format!("the user's name is {name}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_case_trigger() {
        assert_eq!(extract_name("My Name Is Alice").as_deref(), Some("Alice"));
        assert_eq!(extract_name("MY NAME IS ALICE").as_deref(), Some("ALICE"));
    }

    #[test]
    fn preserves_original_casing_of_name() {
        assert_eq!(extract_name("hi, my name is Bob").as_deref(), Some("Bob"));
    }

    #[test]
    fn absent_trigger_is_none() {
        assert_eq!(extract_name("Hello"), None);
        assert_eq!(extract_name("I'm called Carol"), None);
        assert_eq!(extract_name("name's Dave"), None);
    }

    #[test]
    fn trailing_whitespace_only_is_none() {
        assert_eq!(extract_name("my name is "), None);
        assert_eq!(extract_name("my name is"), None);
        assert_eq!(extract_name("My name is \t\n"), None);
    }

    #[test]
    fn last_occurrence_wins() {
        assert_eq!(
            extract_name("my name is Eve, well my name is Mallory").as_deref(),
            Some("Mallory")
        );
    }

    #[test]
    fn rest_of_sentence_is_kept() {
        // Heuristic: everything after the phrase counts, punctuation included.
        assert_eq!(
            extract_name("My name is Frank. What's yours?").as_deref(),
            Some("Frank. What's yours?")
        );
    }

    #[test]
    fn non_ascii_names_survive() {
        assert_eq!(extract_name("my name is Zoë").as_deref(), Some("Zoë"));
        assert_eq!(extract_name("Ça va? my name is Søren").as_deref(), Some("Søren"));
    }

    #[test]
    fn fact_wording() {
        assert_eq!(name_fact("Bob").as_str(), "the user's name is Bob");
    }
}

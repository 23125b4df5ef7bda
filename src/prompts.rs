//! Prompt sent alongside every exported PDF.
//!
//! The wording is a product requirement owned by marketing: a non-technical
//! audience, at most 80 words, no component name (the page title is shown
//! next to the text elsewhere) and a fixed opening style. It is kept as a
//! constant rather than a setting so every run produces comparable text.

/// Instruction for describing one strip component from its PDF export.
pub const DESCRIPTION_PROMPT: &str = "Please give a short and concise description of the \
functionality of this Bloomreach strip component. Your audience is non-technical, e.g. \
marketeer or UX designer. Use a maximum of 80 words and exclude technical details that are \
too specific. Don't mention the name of the strip component, this context will be provided \
elsewhere. Don't start with 'This component allows website visitors ...' but immediately \
start describing the functionality, like 'Allows website visitors to engage...'.";

/// Upper bound on description length requested by [`DESCRIPTION_PROMPT`].
pub const MAX_DESCRIPTION_WORDS: usize = 80;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_states_the_word_limit() {
        assert!(DESCRIPTION_PROMPT.contains(&format!("maximum of {MAX_DESCRIPTION_WORDS} words")));
    }

    #[test]
    fn prompt_forbids_the_stock_opening() {
        assert!(DESCRIPTION_PROMPT.contains("Don't start with 'This component allows"));
        assert!(DESCRIPTION_PROMPT.contains("non-technical"));
    }

    #[test]
    fn line_continuations_keep_single_spaces() {
        assert!(!DESCRIPTION_PROMPT.contains("  "));
        assert!(!DESCRIPTION_PROMPT.contains('\n'));
    }
}

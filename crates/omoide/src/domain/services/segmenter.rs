//! Response Segmenter
//!
//! Splits a generated reply into sentence-like chunks so it can be delivered
//! as several messages, like someone typing.

use std::time::Duration;

/// Delay per character of the chunk just sent
pub const PER_CHAR_DELAY: Duration = Duration::from_millis(50);

/// Lower bound for the pause between chunks
pub const MIN_CHUNK_DELAY: Duration = Duration::from_millis(200);

/// Split at `.`, `?` or `!` followed by whitespace.
///
/// The terminal mark stays with its chunk; the whitespace run after it is
/// dropped. Leading/trailing whitespace of the whole text is trimmed.
pub fn split_sentences(text: &str) -> Vec<String> {
    let text = text.trim();
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !matches!(c, '.' | '?' | '!') {
            continue;
        }
        let at_boundary = chars.peek().is_some_and(|&(_, next)| next.is_whitespace());
        if !at_boundary {
            continue;
        }

        chunks.push(text[start..i + c.len_utf8()].to_string());
        while chars.peek().is_some_and(|&(_, w)| w.is_whitespace()) {
            chars.next();
        }
        start = chars.peek().map_or(text.len(), |&(j, _)| j);
    }

    if start < text.len() {
        chunks.push(text[start..].to_string());
    }

    chunks
}

/// Pause after emitting `chunk`: `max(chars * 50ms, 200ms)`
pub fn pacing_delay(chunk: &str) -> Duration {
    let chars = chunk.chars().count() as u32;
    (PER_CHAR_DELAY * chars).max(MIN_CHUNK_DELAY)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Remove whitespace runs that follow a sentence mark
    fn without_boundaries(text: &str) -> String {
        let mut out = String::new();
        let mut skipping = false;
        let mut prev = None;
        for c in text.trim().chars() {
            if skipping && c.is_whitespace() {
                continue;
            }
            skipping = false;
            if c.is_whitespace() && matches!(prev, Some('.' | '?' | '!')) {
                skipping = true;
                continue;
            }
            out.push(c);
            prev = Some(c);
        }
        out
    }

    #[test]
    fn test_splits_on_each_mark() {
        let chunks = split_sentences("I'm home. Did you eat? I made curry!");
        assert_eq!(chunks, vec!["I'm home.", "Did you eat?", "I made curry!"]);
    }

    #[test]
    fn test_newline_is_a_boundary() {
        let chunks = split_sentences("Good morning.\n\nSleep well?");
        assert_eq!(chunks, vec!["Good morning.", "Sleep well?"]);
    }

    #[test]
    fn test_marks_without_whitespace_do_not_split() {
        let chunks = split_sentences("It costs 3.50 at the shop... really?! Yes.");
        assert_eq!(chunks, vec!["It costs 3.50 at the shop...", "really?!", "Yes."]);
    }

    #[test]
    fn test_trailing_text_without_mark() {
        let chunks = split_sentences("  Sure. see you tomorrow  ");
        assert_eq!(chunks, vec!["Sure.", "see you tomorrow"]);
    }

    #[test]
    fn test_empty_and_blank() {
        assert!(split_sentences("").is_empty());
        assert!(split_sentences("   \n ").is_empty());
    }

    #[test]
    fn test_concatenation_reconstructs_text() {
        let samples = [
            "One. Two? Three!",
            "No marks at all",
            "Line one.\nLine two.  Line three",
            "Wait... what?!  Okay.\tFine.",
            "안녕하세요. 반가워요!",
        ];
        for sample in samples {
            let joined: String = split_sentences(sample).concat();
            assert_eq!(joined, without_boundaries(sample), "sample: {sample:?}");
        }
    }

    #[test]
    fn test_pacing_delay() {
        assert_eq!(pacing_delay("Hi."), MIN_CHUNK_DELAY);
        assert_eq!(pacing_delay("Exactly ten"), Duration::from_millis(550));
        assert_eq!(pacing_delay(""), MIN_CHUNK_DELAY);
    }
}

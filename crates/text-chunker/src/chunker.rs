use crate::config::ChunkerConfig;
use crate::error::Result;

/// Splits raw text into bounded-size retrievable chunks.
///
/// Chunking is pure: the same input and config always produce the same
/// output, in the same order.
pub struct Chunker {
    config: ChunkerConfig,
}

impl Chunker {
    /// Create a chunker with the given configuration
    pub fn new(config: ChunkerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Split `text` into chunks.
    ///
    /// The text is split on blank-line boundaries into paragraphs;
    /// whitespace-only paragraphs are dropped. Paragraphs longer than the
    /// configured window are hard-split into fixed-width character windows.
    /// When the paragraph pass yields nothing at all (e.g. the text is pure
    /// whitespace), the whole original text is windowed instead, so any
    /// non-empty input produces at least one chunk.
    pub fn chunk_text(&self, text: &str) -> Vec<String> {
        let max = self.config.max_chunk_size;
        let mut chunks = Vec::new();

        for paragraph in text.split("\n\n") {
            let paragraph = paragraph.trim();
            if paragraph.is_empty() {
                continue;
            }
            if paragraph.chars().count() <= max {
                chunks.push(paragraph.to_string());
            } else {
                chunks.extend(char_windows(paragraph, max));
            }
        }

        if chunks.is_empty() {
            chunks = char_windows(text, max);
        }

        chunks
    }

    /// The configuration this chunker was built with
    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }
}

/// Split `text` into consecutive windows of `width` characters.
///
/// Windows are counted in characters, not bytes, so multi-byte input never
/// splits inside a code point. The last window may be shorter. Empty input
/// yields no windows.
fn char_windows(text: &str, width: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(width)
        .map(|window| window.iter().collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn chunker(max: usize) -> Chunker {
        Chunker::new(ChunkerConfig::with_max_chunk_size(max)).unwrap()
    }

    #[test]
    fn test_single_paragraph_within_limit() {
        let chunks = chunker(1000).chunk_text("A short paragraph.");
        assert_eq!(chunks, vec!["A short paragraph.".to_string()]);
    }

    #[test]
    fn test_paragraph_split_drops_blank_paragraphs() {
        let text = "First.\n\n\n\n   \n\nSecond.";
        let chunks = chunker(1000).chunk_text(text);
        assert_eq!(chunks, vec!["First.".to_string(), "Second.".to_string()]);
    }

    #[test]
    fn test_oversized_paragraph_is_windowed() {
        let text = "x".repeat(2500);
        let chunks = chunker(1000).chunk_text(&text);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].chars().count(), 1000);
        assert_eq!(chunks[1].chars().count(), 1000);
        assert_eq!(chunks[2].chars().count(), 500);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_windows_count_chars_not_bytes() {
        // 'é' is two bytes in UTF-8; windows must never split a code point.
        let text = "é".repeat(1500);
        let chunks = chunker(1000).chunk_text(&text);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chars().count(), 1000);
        assert_eq!(chunks[1].chars().count(), 500);
    }

    #[test]
    fn test_whitespace_only_text_falls_back_to_whole_text_window() {
        let text = "   \n\n   ";
        let chunks = chunker(1000).chunk_text(text);
        assert_eq!(chunks, vec![text.to_string()]);
    }

    #[test]
    fn test_empty_text_yields_no_chunks() {
        assert!(chunker(1000).chunk_text("").is_empty());
    }

    #[test]
    fn test_mixed_sizes_preserve_order() {
        let long = "y".repeat(1200);
        let text = format!("intro\n\n{long}\n\noutro");
        let chunks = chunker(1000).chunk_text(&text);
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[0], "intro");
        assert_eq!(chunks[1].chars().count(), 1000);
        assert_eq!(chunks[2].chars().count(), 200);
        assert_eq!(chunks[3], "outro");
    }

    #[test]
    fn test_chunking_is_deterministic() {
        let text = "alpha\n\nbeta\n\ngamma";
        let c = chunker(1000);
        assert_eq!(c.chunk_text(text), c.chunk_text(text));
    }

    #[test]
    fn test_non_blank_content_is_reproduced() {
        let text = "one two\n\nthree four\n\nfive";
        let chunks = chunker(1000).chunk_text(text);
        let rejoined = chunks.join("\n\n");
        assert_eq!(rejoined, text);
    }
}

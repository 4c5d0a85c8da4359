//! Text Chunker — splits long documents into overlapping character windows.
//!
//! Windows end on the best boundary available, in order of preference:
//! paragraph break, line break, sentence end, hard cut. Consecutive windows
//! always share exactly `overlap` characters.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
#[error("chunk_size ({chunk_size}) must be greater than overlap ({overlap})")]
pub struct ChunkerConfigError {
    pub chunk_size: usize,
    pub overlap: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct TextChunker {
    chunk_size: usize,
    overlap: usize,
}

impl TextChunker {
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self, ChunkerConfigError> {
        if chunk_size == 0 || chunk_size <= overlap {
            return Err(ChunkerConfigError {
                chunk_size,
                overlap,
            });
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    /// Lazily yields the windows of `text`. Always yields at least one chunk.
    pub fn chunks<'a>(&self, text: &'a str) -> Chunks<'a> {
        Chunks {
            text,
            chunk_size: self.chunk_size,
            overlap: self.overlap,
            start: 0,
            done: false,
        }
    }

    /// The first window of `text`; the whole text when it fits.
    pub fn first_window<'a>(&self, text: &'a str) -> &'a str {
        self.chunks(text).next().unwrap_or(text)
    }
}

/// Iterator over the windows of one document. Cloning restarts from the
/// clone point.
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    text: &'a str,
    chunk_size: usize,
    overlap: usize,
    /// Byte offset of the next window.
    start: usize,
    done: bool,
}

/// A window end: chars taken from the window start, and the byte just past them.
#[derive(Debug, Clone, Copy)]
struct Cut {
    chars: usize,
    byte: usize,
}

impl Chunks<'_> {
    /// Picks where the window over `rest` ends, or `None` when all of `rest`
    /// fits in one window.
    ///
    /// Boundaries only count in the back half of the window (and past the
    /// overlap), so a window always advances by a useful amount. Within that
    /// range the latest boundary of the best tier wins.
    fn window_cut(&self, rest: &str) -> Option<Cut> {
        let min_boundary = (self.overlap + 1).max(self.chunk_size / 2);
        let mut paragraph = None;
        let mut line = None;
        let mut sentence = None;
        let mut prev: Option<char> = None;

        for (taken, (offset, c)) in rest.char_indices().enumerate() {
            if taken == self.chunk_size {
                let hard = Cut {
                    chars: taken,
                    byte: offset,
                };
                return Some(paragraph.or(line).or(sentence).unwrap_or(hard));
            }

            let cut = Cut {
                chars: taken + 1,
                byte: offset + c.len_utf8(),
            };
            if cut.chars >= min_boundary {
                if c == '\n' {
                    line = Some(cut);
                    if prev == Some('\n') {
                        paragraph = Some(cut);
                    }
                }
                if c.is_whitespace() && matches!(prev, Some('.' | '!' | '?')) {
                    sentence = Some(cut);
                }
            }
            prev = Some(c);
        }
        None
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.done {
            return None;
        }

        let text = self.text;
        let rest = &text[self.start..];
        let Some(cut) = self.window_cut(rest) else {
            self.done = true;
            return Some(rest);
        };

        // Next window starts `overlap` chars before this one ends.
        let advance = cut.chars - self.overlap;
        self.start += rest
            .char_indices()
            .nth(advance)
            .map(|(offset, _)| offset)
            .unwrap_or(rest.len());
        Some(&rest[..cut.byte])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn char_len(s: &str) -> usize {
        s.chars().count()
    }

    fn head(s: &str, n: usize) -> String {
        s.chars().take(n).collect()
    }

    fn tail(s: &str, n: usize) -> String {
        let len = char_len(s);
        s.chars().skip(len.saturating_sub(n)).collect()
    }

    #[test]
    fn test_short_text_yields_single_identical_chunk() {
        let chunker = TextChunker::new(100, 20).unwrap();
        let text = "Senior Python developer with Django experience.";
        let chunks: Vec<&str> = chunker.chunks(text).collect();
        assert_eq!(chunks, vec![text]);
    }

    #[test]
    fn test_empty_text_yields_one_empty_chunk() {
        let chunker = TextChunker::new(100, 20).unwrap();
        let chunks: Vec<&str> = chunker.chunks("").collect();
        assert_eq!(chunks, vec![""]);
    }

    #[test]
    fn test_hard_cuts_share_exact_overlap() {
        let chunker = TextChunker::new(100, 20).unwrap();
        let text: String = "abcdefghijklmnopqrstuvwxyz".repeat(15);
        let chunks: Vec<&str> = chunker.chunks(&text).collect();

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(char_len(chunk) <= 100);
        }
        for pair in chunks.windows(2) {
            assert_eq!(tail(pair[0], 20), head(pair[1], 20));
        }
    }

    #[test]
    fn test_chunks_reassemble_to_original() {
        let chunker = TextChunker::new(100, 20).unwrap();
        let text = "Built data pipelines in Python. Led a team of four engineers.\n\
                    Migrated services to AWS. Reduced costs by 30%.\n\n\
                    Skills: Python, Django, PostgreSQL, Docker, Kubernetes, Terraform.\n\
                    Education: BSc Computer Science. Certifications: AWS Solutions Architect."
            .repeat(3);
        let chunks: Vec<&str> = chunker.chunks(&text).collect();

        let mut rebuilt = chunks[0].to_string();
        for chunk in &chunks[1..] {
            rebuilt.extend(chunk.chars().skip(20));
        }
        assert_eq!(rebuilt, text);
        for pair in chunks.windows(2) {
            assert_eq!(tail(pair[0], 20), head(pair[1], 20));
        }
    }

    #[test]
    fn test_prefers_paragraph_then_sentence_boundaries() {
        let chunker = TextChunker::new(60, 10).unwrap();
        let text = "First paragraph about Python work.\n\nSecond paragraph that keeps going on and on for a while.";
        let first = chunker.chunks(text).next().unwrap();
        assert!(first.ends_with("\n\n"), "got {first:?}");

        let text = "One sentence about Rust and its borrow checker. Another sentence about Go and more.";
        let first = chunker.chunks(text).next().unwrap();
        assert!(first.ends_with(". "), "got {first:?}");
    }

    #[test]
    fn test_early_paragraph_break_does_not_shrink_window() {
        let chunker = TextChunker::new(100, 20).unwrap();
        let mut text = format!("{}\n\n", "a".repeat(25));
        for _ in 0..12 {
            text.push_str(&"b".repeat(15));
            text.push('\n');
        }
        let chunks: Vec<&str> = chunker.chunks(&text).collect();

        let sizes: Vec<usize> = chunks.iter().map(|c| char_len(c)).collect();
        assert_eq!(sizes, vec![91, 100, 68]);
        assert!(chunks[0].ends_with('\n'));
        for pair in chunks.windows(2) {
            assert_eq!(tail(pair[0], 20), head(pair[1], 20));
        }
    }

    #[test]
    fn test_multibyte_characters_are_not_split() {
        let chunker = TextChunker::new(10, 3).unwrap();
        let text = "•é•é•é•é•é•é•é•é•é•é•é•é";
        let chunks: Vec<&str> = chunker.chunks(text).collect();
        for chunk in &chunks {
            assert!(char_len(chunk) <= 10);
        }
        for pair in chunks.windows(2) {
            assert_eq!(tail(pair[0], 3), head(pair[1], 3));
        }
    }

    #[test]
    fn test_iterator_is_restartable() {
        let chunker = TextChunker::new(30, 5).unwrap();
        let text = "x".repeat(100);
        let chunks = chunker.chunks(&text);
        let first_pass: Vec<&str> = chunks.clone().collect();
        let second_pass: Vec<&str> = chunks.collect();
        assert_eq!(first_pass, second_pass);
        assert_eq!(chunker.chunks(&text).count(), first_pass.len());
    }

    #[test]
    fn test_first_window_is_bounded() {
        let chunker = TextChunker::new(50, 10).unwrap();
        let text = "y".repeat(120);
        assert_eq!(char_len(chunker.first_window(&text)), 50);
        assert_eq!(chunker.first_window("short"), "short");
    }

    #[test]
    fn test_invalid_configuration_rejected() {
        assert!(TextChunker::new(20, 20).is_err());
        assert!(TextChunker::new(0, 0).is_err());
        assert!(TextChunker::new(21, 20).is_ok());
    }
}

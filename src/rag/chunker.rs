use std::collections::VecDeque;
use std::str::FromStr;

use crate::Error;

/// Separators tried in order by the recursive strategy; `""` splits into characters.
const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Text chunk produced by the chunker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// `{document}_part_{index}`
    pub id: String,
    /// Position of the chunk across the whole document
    pub index: usize,
    /// Raw text of the chunk
    pub text: String,
    /// Source document path
    pub source: String,
}

impl Chunk {
    pub fn new(document: &str, index: usize, text: String, source: impl Into<String>) -> Self {
        Self {
            id: chunk_id(document, index),
            index,
            text,
            source: source.into(),
        }
    }
}

/// Stable chunk id for the `index`-th chunk of `document`.
pub fn chunk_id(document: &str, index: usize) -> String {
    format!("{}_part_{}", document, index)
}

/// Chunking strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkingStrategy {
    /// Recursive split on paragraph, line, word, then character boundaries,
    /// sized in characters (default)
    Recursive,
    /// Split by words with overlap, sized in words
    Words,
}

impl FromStr for ChunkingStrategy {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "recursive" | "characters" | "chars" => Ok(Self::Recursive),
            "words" => Ok(Self::Words),
            other => Err(Error::Config(format!("unknown chunking strategy: {}", other))),
        }
    }
}

/// Splits text into bounded, overlapping windows.
#[derive(Debug, Clone)]
pub struct Chunker {
    size: usize,
    overlap: usize,
    strategy: ChunkingStrategy,
}

impl Chunker {
    /// Create a new recursive chunker.
    pub fn new(size: usize, overlap: usize) -> Self {
        Self::with_strategy(size, overlap, ChunkingStrategy::Recursive)
    }

    /// Create with custom strategy.
    pub fn with_strategy(size: usize, overlap: usize, strategy: ChunkingStrategy) -> Self {
        Self {
            size: size.max(1),
            overlap: overlap.min(size.saturating_sub(1)),
            strategy,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split text into overlapping pieces.
    pub fn split(&self, text: &str) -> Vec<String> {
        match self.strategy {
            ChunkingStrategy::Recursive => self
                .split_recursive(text, &SEPARATORS)
                .into_iter()
                .map(|piece| piece.trim().to_string())
                .filter(|piece| !piece.is_empty())
                .collect(),
            ChunkingStrategy::Words => self.split_words(text),
        }
    }

    /// Chunk every page of a document; indices continue across pages.
    pub fn chunk_pages<S: AsRef<str>>(
        &self,
        document: &str,
        source: &str,
        pages: &[S],
    ) -> Vec<Chunk> {
        pages
            .iter()
            .flat_map(|page| self.split(page.as_ref()))
            .enumerate()
            .map(|(index, text)| Chunk::new(document, index, text, source))
            .collect()
    }

    fn split_words(&self, text: &str) -> Vec<String> {
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.is_empty() {
            return Vec::new();
        }

        let step = self.size.saturating_sub(self.overlap).max(1);
        let mut chunks = Vec::new();
        let mut idx = 0;

        while idx < words.len() {
            let end = (idx + self.size).min(words.len());
            chunks.push(words[idx..end].join(" "));

            if end == words.len() {
                break;
            }
            idx += step;
        }

        chunks
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let (separator, rest) = pick_separator(text, separators);

        let pieces: Vec<&str> = if separator.is_empty() {
            text.char_indices()
                .map(|(i, c)| &text[i..i + c.len_utf8()])
                .collect()
        } else {
            text.split(separator).filter(|p| !p.is_empty()).collect()
        };

        let mut output = Vec::new();
        let mut pending: Vec<&str> = Vec::new();

        for piece in pieces {
            if char_len(piece) < self.size {
                pending.push(piece);
                continue;
            }

            if !pending.is_empty() {
                output.extend(self.merge(&pending, separator));
                pending.clear();
            }

            if rest.is_empty() {
                output.push(piece.to_string());
            } else {
                output.extend(self.split_recursive(piece, rest));
            }
        }

        if !pending.is_empty() {
            output.extend(self.merge(&pending, separator));
        }

        output
    }

    /// Greedily join small pieces up to `size`, carrying up to `overlap`
    /// characters of trailing pieces into the next window.
    fn merge(&self, pieces: &[&str], separator: &str) -> Vec<String> {
        let sep_len = char_len(separator);
        let mut docs = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut total = 0;

        for &piece in pieces {
            let len = char_len(piece);
            let joint = if window.is_empty() { 0 } else { sep_len };

            if total + joint + len > self.size && !window.is_empty() {
                docs.push(join(&window, separator));

                while total > self.overlap
                    || (total > 0
                        && total + len + if window.is_empty() { 0 } else { sep_len } > self.size)
                {
                    let Some(first) = window.pop_front() else {
                        break;
                    };
                    let joint = if window.is_empty() { 0 } else { sep_len };
                    total -= char_len(first) + joint;
                }
            }

            let joint = if window.is_empty() { 0 } else { sep_len };
            window.push_back(piece);
            total += len + joint;
        }

        if !window.is_empty() {
            docs.push(join(&window, separator));
        }

        docs
    }
}

fn pick_separator<'a>(text: &str, separators: &'a [&'a str]) -> (&'a str, &'a [&'a str]) {
    for (i, separator) in separators.iter().enumerate() {
        if separator.is_empty() || text.contains(separator) {
            return (*separator, &separators[i + 1..]);
        }
    }
    ("", &[])
}

fn join(window: &VecDeque<&str>, separator: &str) -> String {
    window
        .iter()
        .copied()
        .collect::<Vec<_>>()
        .join(separator)
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_ids_follow_document_part_scheme() {
        let chunk = Chunk::new("manual.pdf", 3, "text".into(), "docs/manual.pdf");
        assert_eq!(chunk.id, "manual.pdf_part_3");
        assert_eq!(chunk.source, "docs/manual.pdf");
        assert_eq!(chunk_id("doc", 0), "doc_part_0");
    }

    #[test]
    fn word_chunker_respects_overlap() {
        let chunker = Chunker::with_strategy(4, 1, ChunkingStrategy::Words);
        let chunks = chunker.split("one two three four five six seven");

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], "one two three four");
        assert_eq!(chunks[1], "four five six seven");
    }

    #[test]
    fn word_chunker_no_overlap() {
        let chunker = Chunker::with_strategy(2, 0, ChunkingStrategy::Words);
        let chunks = chunker.split("a b c d e f");
        assert_eq!(chunks, vec!["a b", "c d", "e f"]);
    }

    #[test]
    fn empty_and_whitespace_text_returns_empty() {
        for strategy in [ChunkingStrategy::Recursive, ChunkingStrategy::Words] {
            let chunker = Chunker::with_strategy(10, 2, strategy);
            assert!(chunker.split("").is_empty());
            assert!(chunker.split("   \t\n  ").is_empty());
        }
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        let chunker = Chunker::new(600, 50);
        let text = "RTX 2080 Ti 是一款由 NVIDIA 推出的高端顯卡，擁有 11GB VRAM。";
        assert_eq!(chunker.split(text), vec![text.to_string()]);
    }

    #[test]
    fn recursive_chunks_never_exceed_size() {
        let chunker = Chunker::new(20, 5);
        let text = "alpha beta gamma delta epsilon zeta eta theta iota kappa lambda mu";
        let chunks = chunker.split(text);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 20, "chunk too long: {chunk}");
        }
    }

    #[test]
    fn recursive_chunks_overlap_on_word_boundaries() {
        let chunker = Chunker::new(11, 5);
        let chunks = chunker.split("aaa bbb ccc ddd eee");

        assert_eq!(chunks, vec!["aaa bbb ccc", "ccc ddd eee"]);
    }

    #[test]
    fn recursive_prefers_paragraph_boundaries() {
        let chunker = Chunker::new(30, 0);
        let text = "first paragraph here\n\nsecond paragraph here";
        let chunks = chunker.split(text);

        assert_eq!(chunks, vec!["first paragraph here", "second paragraph here"]);
    }

    #[test]
    fn recursive_splits_cjk_text_without_spaces_by_characters() {
        let chunker = Chunker::new(10, 2);
        let text = "這是一段沒有空白的中文文字用來測試字元切分功能";
        let chunks = chunker.split(text);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 10);
        }
        // Consecutive windows share the configured overlap
        let first: Vec<char> = chunks[0].chars().collect();
        let tail: String = first[first.len() - 2..].iter().collect();
        assert!(chunks[1].starts_with(&tail));
    }

    #[test]
    fn chunk_pages_numbers_across_pages() {
        let chunker = Chunker::with_strategy(2, 0, ChunkingStrategy::Words);
        let pages = vec!["a b c d".to_string(), "e f".to_string()];
        let chunks = chunker.chunk_pages("guide.pdf", "pdfs/guide.pdf", &pages);

        let ids: Vec<&str> = chunks.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["guide.pdf_part_0", "guide.pdf_part_1", "guide.pdf_part_2"]);
        assert_eq!(chunks[2].text, "e f");
        assert!(chunks.iter().all(|c| c.source == "pdfs/guide.pdf"));
    }

    #[test]
    fn chunking_is_deterministic() {
        let chunker = Chunker::new(40, 10);
        let text = "Razer Pro Click Mini supports Bluetooth and 2.4 GHz wireless modes. ".repeat(10);
        let first = chunker.chunk_pages("mouse.pdf", "mouse.pdf", &[text.as_str()]);
        let second = chunker.chunk_pages("mouse.pdf", "mouse.pdf", &[text.as_str()]);
        assert_eq!(first, second);
    }

    #[test]
    fn overlap_larger_than_size_is_clamped() {
        let chunker = Chunker::new(3, 10);
        assert_eq!(chunker.size(), 3);
        assert_eq!(chunker.overlap(), 2);
    }

    #[test]
    fn zero_size_uses_minimum() {
        let chunker = Chunker::with_strategy(0, 0, ChunkingStrategy::Words);
        assert_eq!(chunker.split("word").len(), 1);
    }

    #[test]
    fn parses_strategy_names() {
        assert_eq!("recursive".parse::<ChunkingStrategy>().unwrap(), ChunkingStrategy::Recursive);
        assert_eq!("WORDS".parse::<ChunkingStrategy>().unwrap(), ChunkingStrategy::Words);
        assert!("sentences".parse::<ChunkingStrategy>().is_err());
    }
}

//! Splits file text into chunks for embedding and search.
//! Splitting is purely by words: whitespace-delimited words are accumulated greedily until
//! the next one would push the chunk past the character cap.

use std::path::PathBuf;
use std::str::SplitWhitespace;

use crate::repo::SourceFile;

/// Default maximum characters per chunk.
pub const DEFAULT_MAX_CHARS: usize = 2048;

/// A chunk of text from a file, with source reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub text: String,
    pub path: PathBuf,
}

/// Lazy chunk sequence over one text. Clone it to restart from the same position.
///
/// Every word costs its length plus one separator. A chunk is closed when the next word's
/// cost would exceed the cap; a single word longer than the cap still gets its own chunk.
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    words: std::iter::Peekable<SplitWhitespace<'a>>,
    max_chars: usize,
}

impl Iterator for Chunks<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let first = self.words.next()?;
        let mut chunk = String::from(first);
        let mut used = first.chars().count() + 1;
        while let Some(word) = self.words.peek() {
            let cost = word.chars().count() + 1;
            if used + cost > self.max_chars {
                break;
            }
            chunk.push(' ');
            chunk.push_str(word);
            used += cost;
            self.words.next();
        }
        Some(chunk)
    }
}

/// Chunk a text. Empty or all-whitespace input yields nothing.
pub fn split_text(text: &str, max_chars: usize) -> Chunks<'_> {
    Chunks {
        words: text.split_whitespace().peekable(),
        max_chars,
    }
}

/// Chunk one file, tagging every chunk with the file's path.
pub fn chunk_file(file: &SourceFile, max_chars: usize) -> Vec<Chunk> {
    split_text(&file.content, max_chars)
        .map(|text| Chunk {
            text,
            path: file.path.clone(),
        })
        .collect()
}

/// Chunk all files. Returns chunks from all files in order.
pub fn chunk_files(files: &[SourceFile], max_chars: usize) -> Vec<Chunk> {
    files.iter().flat_map(|f| chunk_file(f, max_chars)).collect()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn file(content: &str) -> SourceFile {
        SourceFile {
            path: PathBuf::from("src/main.rs"),
            content: content.to_string(),
        }
    }

    #[test]
    fn empty_text_has_no_chunks() {
        assert_eq!(split_text("", 2048).count(), 0);
        assert_eq!(split_text(" \n\t ", 2048).count(), 0);
    }

    #[test]
    fn short_text_is_one_normalized_chunk() {
        let c: Vec<_> = split_text("fn  main()\n{\tprintln!(); }", 2048).collect();
        assert_eq!(c, vec!["fn main() { println!(); }"]);
    }

    #[test]
    fn closes_chunk_when_next_word_would_overflow() {
        // "aaa " costs 4, so two words fit in 8 and the third starts a new chunk.
        let c: Vec<_> = split_text("aaa bbb ccc", 8).collect();
        assert_eq!(c, vec!["aaa bbb", "ccc"]);
    }

    #[test]
    fn oversized_word_gets_its_own_chunk() {
        let long = "x".repeat(50);
        let text = format!("a {long} b");
        let c: Vec<_> = split_text(&text, 10).collect();
        assert_eq!(c, vec!["a".to_string(), long, "b".to_string()]);
    }

    #[test]
    fn clone_restarts_from_same_position() {
        let mut chunks = split_text("one two three four", 8);
        assert_eq!(chunks.next().as_deref(), Some("one two"));
        let rest: Vec<_> = chunks.clone().collect();
        assert_eq!(rest, chunks.collect::<Vec<_>>());
        assert_eq!(rest, vec!["three", "four"]);
    }

    #[test]
    fn chunk_files_keeps_paths_in_order() {
        let a = file("alpha beta");
        let mut b = file("gamma");
        b.path = PathBuf::from("README.md");
        let chunks = chunk_files(&[a, b], 2048);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].path, PathBuf::from("src/main.rs"));
        assert_eq!(chunks[1].path, PathBuf::from("README.md"));
        assert_eq!(chunks[1].text, "gamma");
    }

    proptest! {
        #[test]
        fn chunks_rejoin_to_normalized_words(text in "[a-z \\n\\t]{0,400}", max in 1usize..64) {
            let chunks: Vec<String> = split_text(&text, max).collect();
            let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
            prop_assert_eq!(chunks.join(" "), normalized);
        }

        #[test]
        fn chunks_respect_cap_unless_single_word(text in "[a-z ]{0,400}", max in 1usize..64) {
            for chunk in split_text(&text, max) {
                let words: Vec<&str> = chunk.split(' ').collect();
                let used: usize = words.iter().map(|w| w.chars().count() + 1).sum();
                prop_assert!(!chunk.is_empty());
                prop_assert!(used <= max || words.len() == 1);
            }
        }
    }
}

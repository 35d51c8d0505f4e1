use crate::document::{Chunk, Document};

#[derive(Debug, Clone)]
pub struct SplitterConfig {
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Characters of trailing sentences repeated at the start of the next chunk.
    pub chunk_overlap: usize,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Sentence-aware splitter. Sentences are packed greedily into chunks; a
/// sentence longer than `chunk_size` is cut at character boundaries.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    config: SplitterConfig,
}

impl TextSplitter {
    #[must_use]
    pub fn new(config: SplitterConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn split(&self, document: &Document) -> Vec<Chunk> {
        let size = self.config.chunk_size.max(1);
        let pieces: Vec<String> = split_sentences(&document.content)
            .into_iter()
            .flat_map(|s| split_chars(s, size))
            .collect();

        merge_pieces(&pieces, size, self.config.chunk_overlap)
            .into_iter()
            .map(|c| c.trim().to_owned())
            .filter(|c| !c.is_empty())
            .enumerate()
            .map(|(chunk_index, content)| Chunk {
                content,
                metadata: document.metadata.clone(),
                chunk_index,
            })
            .collect()
    }
}

/// Split after `.`/`?`/`!` followed by whitespace and at blank lines. Each
/// sentence keeps its trailing whitespace so concatenation restores the text.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        let boundary = match c {
            '.' | '?' | '!' => chars.peek().is_some_and(|&(_, next)| next.is_whitespace()),
            '\n' => chars.peek().is_some_and(|&(_, next)| next == '\n'),
            _ => false,
        };
        if !boundary {
            continue;
        }

        let mut end = i + c.len_utf8();
        while let Some(&(j, next)) = chars.peek() {
            if !next.is_whitespace() {
                break;
            }
            end = j + next.len_utf8();
            chars.next();
        }
        if !text[start..end].trim().is_empty() {
            sentences.push(&text[start..end]);
        }
        start = end;
    }

    if !text[start..].trim().is_empty() {
        sentences.push(&text[start..]);
    }
    sentences
}

fn split_chars(text: &str, size: usize) -> Vec<String> {
    if text.chars().count() <= size {
        return vec![text.to_owned()];
    }
    let chars: Vec<char> = text.chars().collect();
    chars.chunks(size).map(|c| c.iter().collect()).collect()
}

fn merge_pieces(pieces: &[String], size: usize, overlap: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut window: Vec<&str> = Vec::new();
    let mut window_len = 0;

    for piece in pieces {
        let len = piece.chars().count();
        if !window.is_empty() && window_len + len > size {
            chunks.push(window.concat());

            let mut keep = 0;
            let mut kept_len = 0;
            for prev in window.iter().rev() {
                let prev_len = prev.chars().count();
                if kept_len + prev_len > overlap {
                    break;
                }
                kept_len += prev_len;
                keep += 1;
            }
            window.drain(..window.len() - keep);
            window_len = kept_len;

            while !window.is_empty() && window_len + len > size {
                window_len -= window.remove(0).chars().count();
            }
        }
        window.push(piece);
        window_len += len;
    }

    if !window.is_empty() {
        chunks.push(window.concat());
    }
    chunks
}

//! Chunking: cut the extracted text into bounded windows.
//!
//! Windows are measured in characters (Unicode scalar values) and cut at
//! plain offsets, so a boundary may land inside a word or sentence. The
//! model sees each window as "part i of n" and the caller reassembles the
//! translations by index.

/// A contiguous window of the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    /// 0-based position in the document.
    pub index: usize,
    /// Number of chunks the document was cut into.
    pub total: usize,
    pub text: &'a str,
}

impl Chunk<'_> {
    /// 1-based position, as shown to users and to the model.
    pub fn number(&self) -> usize {
        self.index + 1
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Split `text` into windows of at most `max_chars` characters.
///
/// Concatenating the returned slices in order yields `text` exactly. Empty
/// input yields no chunks. `max_chars` of 0 is treated as 1.
pub fn split_into_chunks(text: &str, max_chars: usize) -> Vec<Chunk<'_>> {
    let max_chars = max_chars.max(1);
    let mut bounds = Vec::new();
    let mut start = 0;
    let mut count = 0;

    for (offset, _) in text.char_indices() {
        if count == max_chars {
            bounds.push((start, offset));
            start = offset;
            count = 0;
        }
        count += 1;
    }
    if count > 0 {
        bounds.push((start, text.len()));
    }

    let total = bounds.len();
    bounds
        .into_iter()
        .enumerate()
        .map(|(index, (from, to))| Chunk {
            index,
            total,
            text: &text[from..to],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejoin(chunks: &[Chunk<'_>]) -> String {
        chunks.iter().map(|c| c.text).collect()
    }

    #[test]
    fn empty_text_has_no_chunks() {
        assert!(split_into_chunks("", 10).is_empty());
    }

    #[test]
    fn short_text_is_one_chunk() {
        let text = "Hello world.\n\nSecond paragraph.";
        let chunks = split_into_chunks(text, 1000);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, text);
        assert_eq!(chunks[0].number(), 1);
        assert_eq!(chunks[0].total, 1);
    }

    #[test]
    fn thirty_two_thousand_chars_make_three_chunks() {
        let text = "abcdefghij".repeat(3_200);
        let chunks = split_into_chunks(&text, 15_000);
        let sizes: Vec<usize> = chunks.iter().map(|c| c.char_count()).collect();
        assert_eq!(sizes, vec![15_000, 15_000, 2_000]);
        assert!(chunks.iter().all(|c| c.total == 3));
        assert_eq!(
            chunks.iter().map(|c| c.index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert_eq!(rejoin(&chunks), text);
    }

    #[test]
    fn exact_multiple_has_no_empty_tail() {
        let chunks = split_into_chunks("abcdef", 3);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].text, "def");
    }

    #[test]
    fn boundaries_may_split_words() {
        let chunks = split_into_chunks("hello world", 4);
        assert_eq!(
            chunks.iter().map(|c| c.text).collect::<Vec<_>>(),
            vec!["hell", "o wo", "rld"]
        );
    }

    #[test]
    fn counts_characters_not_bytes() {
        let text = "ñandú über straße 日本語";
        let chunks = split_into_chunks(text, 5);
        assert!(chunks.iter().all(|c| c.char_count() <= 5));
        assert_eq!(rejoin(&chunks), text);
    }

    #[test]
    fn zero_max_is_treated_as_one() {
        let chunks = split_into_chunks("abc", 0);
        assert_eq!(chunks.len(), 3);
    }

    #[test]
    fn round_trip_over_many_sizes() {
        let lorem = "lorem ipsum dolor sit amet ".repeat(97);
        let samples = [
            "",
            "a",
            "Hello world.\n\nSecond paragraph.",
            "Ünïcödé — “quotes” … and emoji 🎉 mixed in with plain ASCII text.",
            lorem.as_str(),
        ];
        for text in samples {
            let len = text.chars().count();
            for n in 1..=len.max(1) + 2 {
                let chunks = split_into_chunks(text, n);
                assert_eq!(rejoin(&chunks), text, "n={n}");
                let expected = len.div_ceil(n);
                assert_eq!(chunks.len(), expected, "n={n}, len={len}");
                assert!(chunks.iter().all(|c| c.char_count() <= n));
                // Every chunk but the last is full.
                if let Some((_, head)) = chunks.split_last() {
                    assert!(head.iter().all(|c| c.char_count() == n));
                }
            }
        }
    }
}

//! Utterance normalization shared by the resolver and the classifier.

use std::ops::Range;

/// Trailing particles and honorifics stripped from a word before partial or
/// fuzzy matching. Longer forms come first.
const SUFFIXES: &[&str] = &[
    "선수는", "선수가", "선수의", "선수를", "선수", "에서는", "에서", "까지", "부터", "이랑", "한테",
    "에게", "께서", "은", "는", "이", "가", "을", "를", "의", "에", "와", "과", "랑", "도", "만",
    "님", "팀", "들",
];

#[derive(Debug, Clone)]
struct CharPos {
    compact: usize,
    original: Range<usize>,
    word_start: bool,
}

/// Lowercased, whitespace-free view of an utterance that remembers where
/// each character came from.
#[derive(Debug, Clone)]
pub struct Compacted {
    text: String,
    chars: Vec<CharPos>,
}

impl Compacted {
    pub fn new(original: &str) -> Self {
        let mut text = String::with_capacity(original.len());
        let mut chars = Vec::new();
        let mut prev: Option<char> = None;

        for (idx, ch) in original.char_indices() {
            if ch.is_whitespace() {
                prev = Some(ch);
                continue;
            }
            chars.push(CharPos {
                compact: text.len(),
                original: idx..idx + ch.len_utf8(),
                word_start: prev.map_or(true, |p| !p.is_alphanumeric()),
            });
            text.push(ch.to_ascii_lowercase());
            prev = Some(ch);
        }

        Self { text, chars }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    fn index_of(&self, compact: usize) -> Option<usize> {
        self.chars.binary_search_by_key(&compact, |c| c.compact).ok()
    }

    /// True when the compacted byte offset begins a word in the original.
    pub fn is_word_start(&self, compact: usize) -> bool {
        self.index_of(compact)
            .map_or(false, |i| self.chars[i].word_start)
    }

    /// Original byte range covered by a compacted byte range.
    pub fn original_range(&self, range: Range<usize>) -> Option<Range<usize>> {
        let first = self.index_of(range.start)?;
        let last = self.chars[first..]
            .iter()
            .take_while(|c| c.compact < range.end)
            .last()?;
        Some(self.chars[first].original.start..last.original.end)
    }

    /// Every occurrence of `needle` as `(original range)`; `accept` sees the
    /// compacted start offset.
    pub fn find_all(
        &self,
        needle: &str,
        mut accept: impl FnMut(usize) -> bool,
    ) -> Vec<Range<usize>> {
        if needle.is_empty() {
            return Vec::new();
        }
        self.text
            .match_indices(needle)
            .filter(|(start, _)| accept(*start))
            .filter_map(|(start, m)| self.original_range(start..start + m.len()))
            .collect()
    }
}

/// Lowercase ASCII and drop whitespace, the form aliases are compared in.
pub fn compact(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// A whitespace-delimited word with edge punctuation trimmed.
#[derive(Debug, Clone, PartialEq)]
pub struct Word<'a> {
    pub text: &'a str,
    pub range: Range<usize>,
}

pub fn words(s: &str) -> Vec<Word<'_>> {
    let mut out = Vec::new();
    let mut start: Option<usize> = None;

    for (idx, ch) in s.char_indices().chain(std::iter::once((s.len(), ' '))) {
        match (ch.is_whitespace(), start) {
            (true, Some(st)) => {
                push_trimmed(s, st..idx, &mut out);
                start = None;
            }
            (false, None) => start = Some(idx),
            _ => {}
        }
    }
    out
}

fn push_trimmed<'a>(s: &'a str, range: Range<usize>, out: &mut Vec<Word<'a>>) {
    let raw = &s[range.clone()];
    let trimmed_start = raw.trim_start_matches(|c: char| !c.is_alphanumeric());
    let text = trimmed_start.trim_end_matches(|c: char| !c.is_alphanumeric());
    if text.is_empty() {
        return;
    }
    let start = range.start + (raw.len() - trimmed_start.len());
    out.push(Word {
        text,
        range: start..start + text.len(),
    });
}

/// Strip trailing particles while at least two characters remain.
pub fn strip_particles(word: &str) -> &str {
    let mut core = word;
    while let Some(rest) = SUFFIXES
        .iter()
        .filter_map(|s| core.strip_suffix(s))
        .find(|rest| rest.chars().count() >= 2)
    {
        core = rest;
    }
    core
}

pub fn has_hangul(s: &str) -> bool {
    s.chars().any(is_hangul_syllable)
}

fn is_hangul_syllable(c: char) -> bool {
    ('\u{AC00}'..='\u{D7A3}').contains(&c)
}

/// Decompose Hangul syllables into conjoining jamo so that one wrong vowel
/// costs one edit instead of a whole syllable.
pub fn jamo(s: &str) -> Vec<char> {
    let mut out = Vec::with_capacity(s.len());
    for ch in s.chars() {
        if !is_hangul_syllable(ch) {
            out.push(ch.to_ascii_lowercase());
            continue;
        }
        let idx = ch as u32 - 0xAC00;
        let (initial, medial, last) = (idx / 588, (idx % 588) / 28, idx % 28);
        out.extend(char::from_u32(0x1100 + initial));
        out.extend(char::from_u32(0x1161 + medial));
        if last > 0 {
            out.extend(char::from_u32(0x11A7 + last));
        }
    }
    out
}

/// True when the characters around `range` in `original` leave an ASCII
/// alias standing as its own token.
pub fn ascii_boundaries_ok(original: &str, range: &Range<usize>) -> bool {
    let Some(matched) = original.get(range.clone()) else {
        return false;
    };
    let is_word = |c: char| c.is_ascii_alphanumeric();
    let before_ok = !matched.starts_with(is_word)
        || !original[..range.start].chars().next_back().is_some_and(is_word);
    let after_ok = !matched.ends_with(is_word)
        || !original[range.end..].chars().next().is_some_and(is_word);
    before_ok && after_ok
}

pub fn overlaps(a: &Range<usize>, b: &Range<usize>) -> bool {
    a.start < b.end && b.start < a.end
}

//! # Tokenized Log Scanning
//!
//! A thin, allocation-light view over captured build-tool output. The
//! extractors need three lookups the standard iterators do not give them
//! directly:
//!
//! - substring containment on a single token (`does this token carry
//!   marker X`),
//! - substring containment on a whole line (for markers that span tokens,
//!   such as `exporting to image`),
//! - indexed back/forward reference to a token `k` positions away on the
//!   *same* line, because the tool logs place timestamps at fixed offsets
//!   relative to their markers.
//!
//! Scanning is a pure function of the input text: no state is kept between
//! calls and the same text can be scanned any number of times.

/// One log line with its whitespace-split tokens.
///
/// Token indices are stable for the lifetime of the scan; out-of-range
/// lookups return `None` rather than panicking, which the extractors treat
/// as a non-match for that line.
#[derive(Debug)]
pub struct Line<'a> {
    raw: &'a str,
    tokens: Vec<&'a str>,
}

impl<'a> Line<'a> {
    fn new(raw: &'a str) -> Self {
        Self {
            raw,
            tokens: raw.split_whitespace().collect(),
        }
    }

    /// Whether the whole line contains `phrase` (markers spanning tokens)
    pub fn contains(&self, phrase: &str) -> bool {
        self.raw.contains(phrase)
    }

    /// Tokens of this line, paired with their indices
    pub fn tokens(&self) -> impl Iterator<Item = (usize, &'a str)> + '_ {
        self.tokens.iter().copied().enumerate()
    }

    /// Token at absolute index `idx`, if in range
    pub fn token(&self, idx: usize) -> Option<&'a str> {
        self.tokens.get(idx).copied()
    }

    /// Token `k` positions before `idx` on this line
    pub fn back(&self, idx: usize, k: usize) -> Option<&'a str> {
        idx.checked_sub(k).and_then(|j| self.token(j))
    }

    /// Token `k` positions after `idx` on this line
    pub fn ahead(&self, idx: usize, k: usize) -> Option<&'a str> {
        idx.checked_add(k).and_then(|j| self.token(j))
    }
}

/// Iterate the lines of `text` as tokenized [`Line`]s.
pub fn lines(text: &str) -> impl Iterator<Item = Line<'_>> {
    text.lines().map(Line::new)
}

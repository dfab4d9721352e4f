//! Fuzzy filtering of resolved scripts
//!
//! Scores are on a 0-100 scale and rank, from best to worst: an exact name,
//! a prefix, a substring starting a word, a prefix of the word initials, a
//! subsequence of the word initials, any other substring, and finally a
//! scattered subsequence. The subsequence tier uses
//! nucleo's optimal alignment and rewards tight, early, contiguous matches,
//! so widely scattered matches fall below the default threshold.
//!
//! Matching is case-insensitive. Ties keep the input order.

use nucleo_matcher::pattern::{Atom, AtomKind, CaseMatching, Normalization};
use nucleo_matcher::{Matcher, Utf32Str};

use super::types::{CandidateEntry, ResultSet};
use crate::config::DEFAULT_MIN_SCORE;

/// Score and matched character positions of one haystack
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FuzzyMatch {
    pub score: u8,
    /// Char indices in the haystack, for highlighting
    pub indices: Vec<usize>,
}

/// A ranked item borrowed from the input
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ranked<'a, T> {
    pub item: &'a T,
    pub score: u8,
    pub indices: Vec<usize>,
}

/// Reusable scorer for one query.
///
/// Holds the nucleo matcher and a haystack buffer so scoring a list of
/// names doesn't allocate per item.
pub struct FuzzyScorer {
    query: Vec<char>,
    atom: Atom,
    matcher: Matcher,
    buf: Vec<char>,
    positions: Vec<u32>,
}

impl FuzzyScorer {
    pub fn new(query: &str) -> Self {
        let query = query.trim();
        Self {
            query: query.chars().map(fold).collect(),
            atom: Atom::new(
                query,
                CaseMatching::Ignore,
                Normalization::Smart,
                AtomKind::Fuzzy,
                false,
            ),
            matcher: Matcher::new(nucleo_matcher::Config::DEFAULT),
            buf: Vec::with_capacity(64),
            positions: Vec::new(),
        }
    }

    /// Score `haystack`, or None if the query isn't a subsequence of it
    pub fn score(&mut self, haystack: &str) -> Option<FuzzyMatch> {
        let original: Vec<char> = haystack.chars().collect();
        let lower: Vec<char> = original.iter().copied().map(fold).collect();
        let q = &self.query;
        let (m, n) = (q.len(), lower.len());
        if m == 0 || m > n {
            return None;
        }

        if lower == *q {
            return Some(FuzzyMatch {
                score: 100,
                indices: (0..n).collect(),
            });
        }

        let occurrences = find_all(&lower, q);
        let contiguous = |start: usize| (start..start + m).collect::<Vec<_>>();

        if occurrences.first() == Some(&0) {
            return Some(FuzzyMatch {
                score: 90 + ratio(9, m, n),
                indices: contiguous(0),
            });
        }

        if let Some(&start) = occurrences
            .iter()
            .find(|&&pos| is_word_start(&original, pos))
        {
            return Some(FuzzyMatch {
                score: 80 + ratio(9, m, n),
                indices: contiguous(start),
            });
        }

        let starts: Vec<usize> = (0..n).filter(|&i| is_word_start(&original, i)).collect();
        let initials: Vec<char> = starts.iter().map(|&i| lower[i]).collect();

        if initials.starts_with(q) {
            return Some(FuzzyMatch {
                score: 75 + ratio(4, m, initials.len()),
                indices: starts[..m].to_vec(),
            });
        }

        if let Some(picked) = subsequence(&initials, q) {
            return Some(FuzzyMatch {
                score: 70,
                indices: picked.into_iter().map(|i| starts[i]).collect(),
            });
        }

        if let Some(&start) = occurrences.first() {
            return Some(FuzzyMatch {
                score: 60 + ratio(9, m, n),
                indices: contiguous(start),
            });
        }

        self.scattered(haystack, &original, m)
    }

    /// Lowest tier: nucleo's best alignment, scored by compactness
    fn scattered(&mut self, haystack: &str, original: &[char], m: usize) -> Option<FuzzyMatch> {
        self.positions.clear();
        // One slot per char, not per grapheme, so indices line up with `original`
        let utf32 = if haystack.is_ascii() {
            Utf32Str::Ascii(haystack.as_bytes())
        } else {
            self.buf.clear();
            self.buf.extend_from_slice(original);
            Utf32Str::Unicode(&self.buf)
        };
        self.atom
            .indices(utf32, &mut self.matcher, &mut self.positions)?;

        let mut indices: Vec<usize> = self.positions.iter().map(|&i| i as usize).collect();
        indices.sort_unstable();
        indices.dedup();
        let (&first, &last) = (indices.first()?, indices.last()?);

        let span = last - first + 1;
        let runs = 1 + indices.windows(2).filter(|w| w[1] != w[0] + 1).count();

        let mut score = 25 + (30 * m / span) as i32;
        if is_word_start(original, first) {
            score += 4;
        }
        score -= first.min(10) as i32;
        score -= 2 * (runs as i32 - 1);

        Some(FuzzyMatch {
            score: score.clamp(1, 59) as u8,
            indices,
        })
    }
}

/// Ranks and filters result sets against a query
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FuzzyFilter {
    min_score: u8,
    max_results: Option<usize>,
}

impl Default for FuzzyFilter {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_SCORE)
    }
}

impl FuzzyFilter {
    /// Keep entries scoring strictly above `min_score`
    pub fn new(min_score: u8) -> Self {
        Self {
            min_score,
            max_results: None,
        }
    }

    pub fn with_max_results(mut self, max_results: Option<usize>) -> Self {
        self.max_results = max_results;
        self
    }

    /// Rank `items` by the string `key` returns. An empty query keeps every
    /// item in its original order.
    pub fn rank_by<'a, T, F>(&self, items: &'a [T], query: &str, key: F) -> Vec<Ranked<'a, T>>
    where
        F: Fn(&T) -> &str,
    {
        if query.trim().is_empty() {
            return items
                .iter()
                .map(|item| Ranked {
                    item,
                    score: 100,
                    indices: Vec::new(),
                })
                .collect();
        }

        let mut scorer = FuzzyScorer::new(query);
        let mut ranked: Vec<Ranked<'a, T>> = items
            .iter()
            .filter_map(|item| {
                let found = scorer.score(key(item))?;
                (found.score > self.min_score).then_some(Ranked {
                    item,
                    score: found.score,
                    indices: found.indices,
                })
            })
            .collect();

        // Stable: equal scores keep the input order
        ranked.sort_by(|a, b| b.score.cmp(&a.score));
        if let Some(max) = self.max_results {
            ranked.truncate(max);
        }
        ranked
    }

    /// Filter a result set by display name; `None` or blank returns it as is
    pub fn filter(&self, entries: &[CandidateEntry], query: Option<&str>) -> ResultSet {
        match query.map(str::trim) {
            None | Some("") => entries.to_vec(),
            Some(query) => self
                .rank_by(entries, query, |e| e.name.as_str())
                .into_iter()
                .map(|r| r.item.clone())
                .collect(),
        }
    }
}

fn fold(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

/// `part` of `whole`, as an integer share of `max`
fn ratio(max: usize, part: usize, whole: usize) -> u8 {
    (max * part / whole.max(1)).min(max) as u8
}

fn is_word_start(chars: &[char], pos: usize) -> bool {
    if pos == 0 {
        return true;
    }
    let (prev, cur) = (chars[pos - 1], chars[pos]);
    !prev.is_alphanumeric() && cur.is_alphanumeric()
        || prev.is_lowercase() && cur.is_uppercase()
        || !prev.is_numeric() && cur.is_numeric()
}

fn find_all(haystack: &[char], needle: &[char]) -> Vec<usize> {
    if needle.len() > haystack.len() {
        return Vec::new();
    }
    haystack
        .windows(needle.len())
        .enumerate()
        .filter(|(_, w)| *w == needle)
        .map(|(i, _)| i)
        .collect()
}

/// Greedy positions of `needle` as a subsequence of `haystack`
fn subsequence(haystack: &[char], needle: &[char]) -> Option<Vec<usize>> {
    let mut picked = Vec::with_capacity(needle.len());
    let mut rest = needle.iter().peekable();
    for (i, c) in haystack.iter().enumerate() {
        if rest.peek() == Some(&c) {
            picked.push(i);
            rest.next();
        }
    }
    rest.peek().is_none().then_some(picked)
}

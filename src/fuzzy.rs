//! Fuzzy comparison of free-text guesses against acceptable answers.
//!
//! The similarity score is the classic longest-matching-blocks ratio:
//! `2 * M / (len(a) + len(b))` where `M` is the total size of the matching
//! blocks found by recursively taking the longest common substring. Spaces and
//! tabs in the guess are treated as junk: a match may extend through them but
//! never start on them.

use std::collections::{HashMap, HashSet};

/// Separator between a candidate's alternative parts (e.g. "Artist: Title")
const PART_SEPARATOR: char = ':';

/// Guesses at least this long get their most frequent characters ignored
/// when seeding matches
const AUTOJUNK_MIN_LEN: usize = 200;

/// Best candidate found for a guess
#[derive(Debug, Clone, PartialEq)]
pub struct FuzzyResult {
    pub matched: String,
    pub score: f64,
}

/// Compare a guess against every candidate and return the highest scoring one.
///
/// Ties keep the first candidate in iteration order. Returns `None` only when
/// there are no candidates.
pub fn fuzzy_compare<I, S>(candidates: I, guess: &str) -> Option<FuzzyResult>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut best: Option<FuzzyResult> = None;

    for candidate in candidates {
        let candidate = candidate.as_ref();
        let score = compare_str(candidate, guess);

        if best.as_ref().map_or(true, |current| score > current.score) {
            best = Some(FuzzyResult {
                matched: candidate.to_string(),
                score,
            });
        }
    }

    best
}

/// Similarity between one candidate and a guess, case-insensitive.
///
/// A candidate containing separators is also compared part by part, and the
/// best of all these comparisons is kept.
pub fn compare_str(candidate: &str, guess: &str) -> f64 {
    let candidate = candidate.to_lowercase();
    let guess: Vec<char> = guess.to_lowercase().chars().collect();
    let matcher = SequenceMatcher::new(&guess, is_blank);

    candidate
        .split(PART_SEPARATOR)
        .chain(std::iter::once(candidate.as_str()))
        .map(|part| {
            let part: Vec<char> = part.chars().collect();
            matcher.ratio(&part)
        })
        .fold(0.0, f64::max)
}

fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// A matching block: `a[a_start..a_start + size] == b[b_start..b_start + size]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Block {
    a_start: usize,
    b_start: usize,
    size: usize,
}

/// Longest-matching-blocks matcher with the second sequence fixed.
///
/// The index of `b` is built once, so one guess can be compared against many
/// candidate parts cheaply.
struct SequenceMatcher<'b> {
    b: &'b [char],
    b2j: HashMap<char, Vec<usize>>,
    junk: HashSet<char>,
}

impl<'b> SequenceMatcher<'b> {
    fn new(b: &'b [char], is_junk: fn(char) -> bool) -> Self {
        let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, &c) in b.iter().enumerate() {
            b2j.entry(c).or_default().push(j);
        }

        let junk: HashSet<char> = b2j.keys().copied().filter(|&c| is_junk(c)).collect();
        for c in &junk {
            b2j.remove(c);
        }

        let n = b.len();
        if n >= AUTOJUNK_MIN_LEN {
            let threshold = n / 100 + 1;
            b2j.retain(|_, indices| indices.len() <= threshold);
        }

        Self { b, b2j, junk }
    }

    fn is_junk(&self, c: char) -> bool {
        self.junk.contains(&c)
    }

    fn ratio(&self, a: &[char]) -> f64 {
        let total = a.len() + self.b.len();
        if total == 0 {
            return 1.0;
        }

        let matches: usize = self.matching_blocks(a).iter().map(|block| block.size).sum();
        2.0 * matches as f64 / total as f64
    }

    fn matching_blocks(&self, a: &[char]) -> Vec<Block> {
        let mut queue = vec![(0, a.len(), 0, self.b.len())];
        let mut blocks = Vec::new();

        while let Some((a_lo, a_hi, b_lo, b_hi)) = queue.pop() {
            let block = self.find_longest_match(a, a_lo, a_hi, b_lo, b_hi);
            if block.size == 0 {
                continue;
            }

            blocks.push(block);
            if a_lo < block.a_start && b_lo < block.b_start {
                queue.push((a_lo, block.a_start, b_lo, block.b_start));
            }
            let (a_end, b_end) = (block.a_start + block.size, block.b_start + block.size);
            if a_end < a_hi && b_end < b_hi {
                queue.push((a_end, a_hi, b_end, b_hi));
            }
        }

        blocks.sort();
        blocks
    }

    fn find_longest_match(
        &self,
        a: &[char],
        a_lo: usize,
        a_hi: usize,
        b_lo: usize,
        b_hi: usize,
    ) -> Block {
        let b = self.b;
        let (mut best_i, mut best_j, mut best_size) = (a_lo, b_lo, 0);

        // j2len[j] = length of the longest match ending at a[i - 1] and b[j]
        let mut j2len: HashMap<usize, usize> = HashMap::new();
        for (i, c) in a.iter().enumerate().take(a_hi).skip(a_lo) {
            let mut next_j2len = HashMap::new();
            if let Some(indices) = self.b2j.get(c) {
                for &j in indices {
                    if j < b_lo {
                        continue;
                    }
                    if j >= b_hi {
                        break;
                    }
                    let k = j
                        .checked_sub(1)
                        .and_then(|prev| j2len.get(&prev))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    next_j2len.insert(j, k);
                    if k > best_size {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_size = k;
                    }
                }
            }
            j2len = next_j2len;
        }

        // Extend through equal non-junk neighbours first, then through junk
        for junk_pass in [false, true] {
            while best_i > a_lo
                && best_j > b_lo
                && self.is_junk(b[best_j - 1]) == junk_pass
                && a[best_i - 1] == b[best_j - 1]
            {
                best_i -= 1;
                best_j -= 1;
                best_size += 1;
            }
            while best_i + best_size < a_hi
                && best_j + best_size < b_hi
                && self.is_junk(b[best_j + best_size]) == junk_pass
                && a[best_i + best_size] == b[best_j + best_size]
            {
                best_size += 1;
            }
        }

        Block {
            a_start: best_i,
            b_start: best_j,
            size: best_size,
        }
    }
}

/// Exact byte-pattern search using the Knuth-Morris-Pratt algorithm.
///
/// The prefix table is computed once per pattern, so scanning a receive
/// buffer is O(buffer + pattern) regardless of how often the pattern
/// almost-matches. Patterns are small (a sync word is rarely more than a
/// handful of bytes), so `set_pattern` recomputation is negligible.
#[derive(Debug, Clone)]
pub struct SyncMatcher {
    pattern: Vec<u8>,
    lps: Vec<usize>,
}

impl SyncMatcher {
    /// Create a matcher for the given byte pattern.
    pub fn new(pattern: impl Into<Vec<u8>>) -> Self {
        let mut matcher = Self {
            pattern: pattern.into(),
            lps: Vec::new(),
        };
        matcher.compute_lps();
        matcher
    }

    /// Replace the pattern and rebuild the prefix table.
    pub fn set_pattern(&mut self, pattern: impl Into<Vec<u8>>) {
        self.pattern = pattern.into();
        self.compute_lps();
    }

    /// The pattern currently being matched.
    pub fn pattern(&self) -> &[u8] {
        &self.pattern
    }

    /// Longest-proper-prefix-which-is-also-suffix table.
    ///
    /// `lps[i]` is the length of the longest proper prefix of
    /// `pattern[..=i]` that is also a suffix of it.
    fn compute_lps(&mut self) {
        let m = self.pattern.len();
        self.lps = vec![0; m];
        if m == 0 {
            return;
        }

        let mut len = 0;
        let mut i = 1;
        while i < m {
            if self.pattern[i] == self.pattern[len] {
                len += 1;
                self.lps[i] = len;
                i += 1;
            } else if len != 0 {
                // Fall back without advancing i.
                len = self.lps[len - 1];
            } else {
                self.lps[i] = 0;
                i += 1;
            }
        }
    }

    /// Find the lowest index `>= start_pos` where the pattern occurs in
    /// `data`, or `None`.
    ///
    /// An empty pattern or empty buffer never matches.
    pub fn search(&self, data: &[u8], start_pos: usize) -> Option<usize> {
        let m = self.pattern.len();
        if m == 0 || data.is_empty() || start_pos >= data.len() {
            return None;
        }

        let mut i = start_pos;
        let mut j = 0;
        while i < data.len() {
            if data[i] == self.pattern[j] {
                i += 1;
                j += 1;
            }

            if j == m {
                return Some(i - j);
            }
            if i < data.len() && data[i] != self.pattern[j] {
                if j != 0 {
                    // A byte already proven mismatched is never re-examined
                    // against an earlier pattern position.
                    j = self.lps[j - 1];
                } else {
                    i += 1;
                }
            }
        }

        None
    }
}

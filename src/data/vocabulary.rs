// ============================================================
// Data — Vocabulary
// ============================================================
// Bijective token ↔ id mapping built from training text only.
//
// Id layout:
//   0          [PAD]
//   1          [UNK]
//   2..2+k     configured special tokens, in config order
//   rest       corpus tokens, most frequent first,
//              ties broken alphabetically
//
// The tie-break makes the layout a pure function of the token
// counts, so refitting the same corpus gives the same ids.
//
// Case folding goes one character at a time, the way the
// tokenizer's Lowercase normaliser does it. `str::to_lowercase`
// is context-sensitive (a word-final Σ becomes ς, not σ), which
// would store tokens the tokenizer can never look up.

use std::collections::{HashMap, HashSet};

pub const PAD_TOKEN: &str = "[PAD]";
pub const UNK_TOKEN: &str = "[UNK]";
pub const PAD_ID: u32 = 0;
pub const UNK_ID: u32 = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct Vocabulary {
    tokens: Vec<String>,
    index:  HashMap<String, u32>,
}

impl Vocabulary {
    /// Count whitespace tokens over `texts` and keep the most
    /// frequent ones.
    ///
    /// # Arguments
    /// * `special_tokens` - Extra reserved tokens placed after [PAD] and [UNK]
    /// * `max_size`       - Cap on the total size, reserved tokens included
    /// * `min_frequency`  - Tokens seen fewer times are left out
    /// * `lowercase`      - Fold case before counting
    pub fn build<'a>(
        texts:          impl IntoIterator<Item = &'a str>,
        special_tokens: &[String],
        max_size:       usize,
        min_frequency:  usize,
        lowercase:      bool,
    ) -> Self {
        let mut reserved = vec![PAD_TOKEN.to_string(), UNK_TOKEN.to_string()];
        reserved.extend(special_tokens.iter().cloned());
        let reserved_set: HashSet<&str> = reserved.iter().map(String::as_str).collect();

        let mut counts: HashMap<String, usize> = HashMap::new();
        for text in texts {
            for word in text.split_whitespace() {
                let token = if lowercase { fold_case(word) } else { word.to_string() };
                if !reserved_set.contains(token.as_str()) {
                    *counts.entry(token).or_insert(0) += 1;
                }
            }
        }

        let mut ranked: Vec<(String, usize)> = counts
            .into_iter()
            .filter(|(_, n)| *n >= min_frequency)
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(max_size.saturating_sub(reserved.len()));

        let mut tokens = reserved;
        tokens.extend(ranked.into_iter().map(|(t, _)| t));
        Self::from_validated(tokens)
    }

    /// Rebuild from an id-ordered token list, as read back from disk.
    pub fn from_tokens(tokens: Vec<String>) -> Result<Self, String> {
        if tokens.len() < 2 {
            return Err(format!("expected at least 2 tokens, found {}", tokens.len()));
        }
        if tokens[PAD_ID as usize] != PAD_TOKEN || tokens[UNK_ID as usize] != UNK_TOKEN {
            return Err(format!("ids 0 and 1 must be {PAD_TOKEN} and {UNK_TOKEN}"));
        }
        let mut seen = HashSet::new();
        for (id, token) in tokens.iter().enumerate() {
            if token.is_empty() || token.chars().any(char::is_whitespace) {
                return Err(format!("token at id {id} is blank or contains whitespace"));
            }
            if !seen.insert(token.as_str()) {
                return Err(format!("token '{token}' appears twice"));
            }
        }
        Ok(Self::from_validated(tokens))
    }

    fn from_validated(tokens: Vec<String>) -> Self {
        let index = tokens
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i as u32))
            .collect();
        Self { tokens, index }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Tokens in id order.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn token_to_id(&self, token: &str) -> Option<u32> {
        self.index.get(token).copied()
    }

}

/// Lowercase `word` character by character.
pub fn fold_case(word: &str) -> String {
    word.chars().flat_map(char::to_lowercase).collect()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn build(texts: &[&str]) -> Vocabulary {
        Vocabulary::build(texts.iter().copied(), &[], 100, 1, true)
    }

    #[test]
    fn test_reserved_ids_then_frequency_order() {
        let vocab = build(&["cat", "dog", "cat"]);
        assert_eq!(vocab.tokens(), &["[PAD]", "[UNK]", "cat", "dog"]);
        assert_eq!(vocab.token_to_id("cat"), Some(2));
        assert_eq!(vocab.token_to_id("dog"), Some(3));
        assert_eq!(vocab.token_to_id("zebra"), None);
    }

    #[test]
    fn test_ties_break_alphabetically() {
        let vocab = build(&["pear apple", "pear apple kiwi"]);
        assert_eq!(&vocab.tokens()[2..], &["apple", "pear", "kiwi"]);
    }

    #[test]
    fn test_min_frequency_and_cap() {
        let vocab = Vocabulary::build(["a a a b b c"], &[], 3, 1, true);
        assert_eq!(vocab.len(), 3);
        assert_eq!(&vocab.tokens()[2], "a");

        let vocab = Vocabulary::build(["a a a b b c"], &[], 100, 2, true);
        assert_eq!(vocab.token_to_id("c"), None);
        assert_eq!(vocab.len(), 4);
    }

    #[test]
    fn test_lowercase_folds_case() {
        assert_eq!(build(&["Cat cat CAT"]).len(), 3);
        assert_eq!(Vocabulary::build(["Cat cat"], &[], 100, 1, false).len(), 4);
    }

    #[test]
    fn test_lowercase_folds_greek_sigma_per_character() {
        let vocab = build(&["ΟΔΟΣ"]);
        assert_eq!(vocab.token_to_id("οδοσ"), Some(2));
        assert_eq!(vocab.token_to_id("οδος"), None);
        assert_eq!(fold_case("ΟΔΟΣ"), "οδοσ");
    }

    #[test]
    fn test_special_tokens_follow_reserved() {
        let specials = vec!["[SEP]".to_string()];
        let vocab = Vocabulary::build(["x [SEP] y"], &specials, 100, 1, false);
        assert_eq!(vocab.token_to_id("[SEP]"), Some(2));
        assert_eq!(vocab.len(), 5);
    }

    #[test]
    fn test_from_tokens_validates() {
        let ok = vec!["[PAD]".into(), "[UNK]".into(), "cat".into()];
        assert!(Vocabulary::from_tokens(ok).is_ok());

        let swapped = vec!["[UNK]".into(), "[PAD]".into()];
        assert!(Vocabulary::from_tokens(swapped).is_err());

        let dup = vec!["[PAD]".into(), "[UNK]".into(), "a".into(), "a".into()];
        assert!(Vocabulary::from_tokens(dup).is_err());

        let blank = vec!["[PAD]".into(), "[UNK]".into(), "".into()];
        assert!(Vocabulary::from_tokens(blank).is_err());

        assert!(Vocabulary::from_tokens(Vec::new()).is_err());
    }

    #[test]
    fn test_round_trip_through_token_list() {
        let vocab = build(&["the quick brown fox", "the lazy dog"]);
        let again = Vocabulary::from_tokens(vocab.tokens().to_vec()).unwrap();
        assert_eq!(again, vocab);
    }
}

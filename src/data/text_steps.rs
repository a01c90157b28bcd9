// ============================================================
// Data — Text Cleaning Steps
// ============================================================
// Stateless (and one fitted) text transforms used by the
// cleaning chain in preprocessor.rs:
//
//   HtmlStep          decode entities, strip tags
//   SpecialTokenStep  URLs / e-mails / @mentions / #hashtags → markers
//   PunctuationStep   NFC, drop apostrophes, everything else non-alphanumeric → space
//   NumberStep        standalone numbers → removed or `xxnum`
//   StopwordStep      case-insensitive stopword removal
//   RareWordStep      tokens outside the fitted frequent list → `xxrare` or removed
//   WhitespaceStep    collapse and trim
//
// Marker tokens all start with `xx` and contain only ASCII
// letters, so no later step ever rewrites or removes them.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

use crate::domain::traits::TextStep;
use crate::error::{PrepError, Result};

pub const URL_MARKER: &str = "xxurl";
pub const EMAIL_MARKER: &str = "xxemail";
pub const USER_MARKER: &str = "xxuser";
pub const HASHTAG_MARKER: &str = "xxhashtag";
pub const NUMBER_MARKER: &str = "xxnum";
pub const RARE_MARKER: &str = "xxrare";

const MARKERS: [&str; 6] = [
    URL_MARKER,
    EMAIL_MARKER,
    USER_MARKER,
    HASHTAG_MARKER,
    NUMBER_MARKER,
    RARE_MARKER,
];

/// True for tokens inserted by the cleaning chain itself.
pub fn is_marker(token: &str) -> bool {
    MARKERS.contains(&token)
}

fn compile(pattern: &str) -> Regex {
    // Patterns are string literals in this file
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid built-in pattern {pattern}: {e}"))
}

// ─── HTML ─────────────────────────────────────────────────────────────────────

pub struct HtmlStep {
    tag:    Regex,
    entity: Regex,
}

impl HtmlStep {
    pub fn new() -> Self {
        Self {
            tag:    compile(r"</?[A-Za-z!][^<>]*>"),
            entity: compile(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[A-Za-z]{2,8});"),
        }
    }

    fn decode_entities(&self, text: &str) -> String {
        self.entity
            .replace_all(text, |caps: &Captures| {
                let body = &caps[1];
                let decoded = if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
                    u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
                } else if let Some(dec) = body.strip_prefix('#') {
                    dec.parse::<u32>().ok().and_then(char::from_u32)
                } else {
                    match body {
                        "amp"  => Some('&'),
                        "lt"   => Some('<'),
                        "gt"   => Some('>'),
                        "quot" => Some('"'),
                        "apos" => Some('\''),
                        "nbsp" => Some(' '),
                        _      => None,
                    }
                };
                match decoded {
                    Some(c) => c.to_string(),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }
}

impl Default for HtmlStep {
    fn default() -> Self {
        Self::new()
    }
}

impl TextStep for HtmlStep {
    fn name(&self) -> &'static str {
        "html"
    }

    fn apply(&self, text: &str) -> String {
        // Decoding can expose new tags (&lt;b&gt;) and stripping can
        // join new entities, so iterate to a fixed point. Every change
        // shortens the text, which bounds the loop.
        let mut current = text.to_string();
        loop {
            let decoded = self.decode_entities(&current);
            let next = self.tag.replace_all(&decoded, " ").into_owned();
            if next == current {
                return next;
            }
            current = next;
        }
    }
}

// ─── Special tokens ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialToken {
    Url,
    Email,
    Mention,
    Hashtag,
}

impl SpecialToken {
    fn pattern(&self) -> &'static str {
        match self {
            SpecialToken::Url     => r"(?i)\b(?:https?://|www\.)\S+",
            SpecialToken::Email   => r"\b[\w.+-]+@[\w-]+(?:\.[\w-]+)+\b",
            SpecialToken::Mention => r"\B@\w+",
            SpecialToken::Hashtag => r"\B#\w+",
        }
    }

    fn marker(&self) -> &'static str {
        match self {
            SpecialToken::Url     => URL_MARKER,
            SpecialToken::Email   => EMAIL_MARKER,
            SpecialToken::Mention => USER_MARKER,
            SpecialToken::Hashtag => HASHTAG_MARKER,
        }
    }
}

pub struct SpecialTokenStep {
    rules: Vec<(Regex, String)>,
}

impl SpecialTokenStep {
    /// Recognisers always run URL → e-mail → mention → hashtag,
    /// whatever order they are listed in.
    pub fn new(kinds: &[SpecialToken]) -> Self {
        let mut kinds = kinds.to_vec();
        kinds.sort();
        kinds.dedup();
        let rules = kinds
            .iter()
            .map(|k| (compile(k.pattern()), format!(" {} ", k.marker())))
            .collect();
        Self { rules }
    }
}

impl TextStep for SpecialTokenStep {
    fn name(&self) -> &'static str {
        "special_tokens"
    }

    fn apply(&self, text: &str) -> String {
        self.rules.iter().fold(text.to_string(), |acc, (re, marker)| {
            re.replace_all(&acc, marker.as_str()).into_owned()
        })
    }
}

// ─── Punctuation ──────────────────────────────────────────────────────────────

/// Text is NFC-composed first, so a decomposed `e` + U+0301 becomes
/// one `é`. Marks with no precomposed form are kept when they follow
/// a letter or digit; a mark after anything else goes with it.
pub struct PunctuationStep;

impl TextStep for PunctuationStep {
    fn name(&self) -> &'static str {
        "punctuation"
    }

    fn apply(&self, text: &str) -> String {
        let mut out     = String::with_capacity(text.len());
        let mut in_word = false;

        for c in text.nfc().filter(|c| !matches!(c, '\'' | '\u{2018}' | '\u{2019}')) {
            let keep = c.is_alphanumeric() || (in_word && is_combining_mark(c));
            out.push(if keep || c.is_whitespace() { c } else { ' ' });
            in_word = keep;
        }
        out
    }
}

// ─── Numbers ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NumberMode {
    Keep,
    #[default]
    Remove,
    Mask,
}

pub struct NumberStep {
    number:      Regex,
    replacement: &'static str,
}

impl NumberStep {
    /// Returns None for `NumberMode::Keep`.
    pub fn new(mode: NumberMode) -> Option<Self> {
        let replacement = match mode {
            NumberMode::Keep   => return None,
            NumberMode::Remove => " ",
            NumberMode::Mask   => NUMBER_MARKER,
        };
        Some(Self {
            number: compile(r"\b\d+\b"),
            replacement,
        })
    }
}

impl TextStep for NumberStep {
    fn name(&self) -> &'static str {
        "numbers"
    }

    fn apply(&self, text: &str) -> String {
        self.number.replace_all(text, self.replacement).into_owned()
    }
}

// ─── Stopwords ────────────────────────────────────────────────────────────────

pub struct StopwordStep {
    words: HashSet<String>,
}

impl StopwordStep {
    pub fn english() -> Self {
        Self::from_words(DEFAULT_STOPWORDS.iter().copied())
    }

    pub fn from_words<'a>(words: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            words: words.into_iter().map(str::to_lowercase).collect(),
        }
    }

    /// One word per line; blank lines and `#` comments are skipped.
    pub fn from_file(path: &Path) -> Result<Self> {
        let body = std::fs::read_to_string(path).map_err(|e| {
            PrepError::Config(format!("cannot read stopwords '{}': {e}", path.display()))
        })?;
        Ok(Self::from_words(
            body.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#')),
        ))
    }

    pub fn contains(&self, token: &str) -> bool {
        self.words.contains(&token.to_lowercase())
    }
}

impl TextStep for StopwordStep {
    fn name(&self) -> &'static str {
        "stopwords"
    }

    fn apply(&self, text: &str) -> String {
        text.split_whitespace()
            .filter(|t| is_marker(t) || !self.contains(t))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

// ─── Rare words ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RareWordMode {
    /// Replace with `xxrare`
    #[default]
    Mark,
    Drop,
}

/// Keeps the most frequent training tokens; everything else is
/// marked or dropped. Comparison is case-insensitive.
pub struct RareWordStep {
    mode:      RareWordMode,
    top_k:     usize,
    min_count: usize,
    preloaded: bool,
    frequent:  Option<(Vec<String>, HashSet<String>)>,
}

impl RareWordStep {
    pub fn new(mode: RareWordMode, top_k: usize, min_count: usize) -> Self {
        Self {
            mode,
            top_k,
            min_count,
            preloaded: false,
            frequent: None,
        }
    }

    /// Use a fixed frequent-word list; `fit` becomes a no-op.
    pub fn with_words(mode: RareWordMode, words: Vec<String>) -> Self {
        let words: Vec<String> = words.into_iter().map(|w| w.to_lowercase()).collect();
        let set = words.iter().cloned().collect();
        Self {
            mode,
            top_k: words.len(),
            min_count: 1,
            preloaded: true,
            frequent: Some((words, set)),
        }
    }

    /// One word per line, most frequent first.
    pub fn from_file(mode: RareWordMode, path: &Path) -> Result<Self> {
        let body = std::fs::read_to_string(path).map_err(|e| {
            PrepError::Config(format!("cannot read frequent words '{}': {e}", path.display()))
        })?;
        let words = body
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        Ok(Self::with_words(mode, words))
    }

    /// The fitted or loaded list, most frequent first.
    pub fn frequent_words(&self) -> Option<&[String]> {
        self.frequent.as_ref().map(|(ordered, _)| ordered.as_slice())
    }
}

impl TextStep for RareWordStep {
    fn name(&self) -> &'static str {
        "rare_words"
    }

    fn fit(&mut self, corpus: &[String]) -> Result<()> {
        if self.preloaded {
            return Ok(());
        }

        let mut counts: HashMap<String, usize> = HashMap::new();
        for text in corpus {
            for token in text.split_whitespace().filter(|t| !is_marker(t)) {
                *counts.entry(token.to_lowercase()).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<(String, usize)> = counts
            .into_iter()
            .filter(|(_, n)| *n >= self.min_count)
            .collect();
        // Ties broken alphabetically so the list is reproducible
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(self.top_k);

        let ordered: Vec<String> = ranked.into_iter().map(|(w, _)| w).collect();
        let set = ordered.iter().cloned().collect();
        tracing::debug!("Fitted frequent-word list with {} entries", ordered.len());
        self.frequent = Some((ordered, set));
        Ok(())
    }

    fn apply(&self, text: &str) -> String {
        // Unfitted: nothing to compare against
        let Some((_, frequent)) = &self.frequent else {
            return text.to_string();
        };

        text.split_whitespace()
            .filter_map(|t| {
                if is_marker(t) || frequent.contains(&t.to_lowercase()) {
                    Some(t)
                } else {
                    match self.mode {
                        RareWordMode::Mark => Some(RARE_MARKER),
                        RareWordMode::Drop => None,
                    }
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn learned_words(&self) -> Option<&[String]> {
        self.frequent_words()
    }
}

// ─── Whitespace ───────────────────────────────────────────────────────────────

pub struct WhitespaceStep;

impl TextStep for WhitespaceStep {
    fn name(&self) -> &'static str {
        "whitespace"
    }

    fn apply(&self, text: &str) -> String {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

/// Built-in English stopword list.
pub const DEFAULT_STOPWORDS: &[&str] = &[
    "a", "an", "the",
    "i", "me", "my", "myself", "we", "us", "our", "ours", "ourselves",
    "you", "your", "yours", "yourself", "yourselves",
    "he", "him", "his", "himself", "she", "her", "hers", "herself",
    "it", "its", "itself", "they", "them", "their", "theirs", "themselves",
    "what", "which", "who", "whom", "whose", "this", "that", "these", "those",
    "am", "is", "are", "was", "were", "be", "been", "being",
    "have", "has", "had", "having", "do", "does", "did", "doing",
    "would", "should", "could", "shall", "will", "can", "may", "might", "must",
    "at", "by", "for", "from", "in", "into", "of", "on", "to", "with",
    "about", "against", "between", "through", "during", "before", "after",
    "above", "below", "up", "down", "out", "off", "over", "under",
    "again", "further", "then", "once",
    "and", "but", "or", "nor", "so", "if", "because", "as", "until", "while",
    "than", "when", "where", "why", "how",
    "here", "there", "all", "any", "both", "each", "few", "more", "most",
    "other", "some", "such", "no", "not", "only", "own", "same", "too", "very",
    "just", "also", "now",
];

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_strips_tags_and_decodes_entities() {
        let step = HtmlStep::new();
        let out  = WhitespaceStep.apply(&step.apply("<p>Fish &amp; chips</p><br/>"));
        assert_eq!(out, "Fish & chips");
    }

    #[test]
    fn test_html_escaped_markup_is_removed() {
        let step = HtmlStep::new();
        let out  = step.apply("a &lt;b&gt;bold&lt;/b&gt; move");
        assert!(!out.contains('<'));
        assert_eq!(WhitespaceStep.apply(&out), "a bold move");
        assert_eq!(step.apply(&out), out);
    }

    #[test]
    fn test_html_leaves_comparisons_alone() {
        let step = HtmlStep::new();
        assert_eq!(step.apply("3 < 4 > 2"), "3 < 4 > 2");
        assert_eq!(step.apply("&unknown; stays"), "&unknown; stays");
    }

    #[test]
    fn test_special_tokens_replaced_with_markers() {
        let step = SpecialTokenStep::new(&[
            SpecialToken::Hashtag,
            SpecialToken::Url,
            SpecialToken::Email,
            SpecialToken::Mention,
        ]);
        let out = WhitespaceStep.apply(&step.apply(
            "mail jo@example.com or see https://x.io/a?b=1 cc @ana #rust",
        ));
        assert_eq!(out, "mail xxemail or see xxurl cc xxuser xxhashtag");
    }

    #[test]
    fn test_special_tokens_only_enabled_kinds() {
        let step = SpecialTokenStep::new(&[SpecialToken::Url]);
        let out  = step.apply("@ana www.site.org");
        assert!(out.contains("@ana"));
        assert!(out.contains(URL_MARKER));
    }

    #[test]
    fn test_punctuation_drops_apostrophes() {
        let out = WhitespaceStep.apply(&PunctuationStep.apply("Don't stop—now!"));
        assert_eq!(out, "Dont stop now");
    }

    #[test]
    fn test_punctuation_keeps_combining_marks_inside_words() {
        let out = WhitespaceStep.apply(&PunctuationStep.apply("cafe\u{301} noir!"));
        assert_eq!(out, "caf\u{e9} noir");

        let kept = PunctuationStep.apply("x\u{301}y");
        assert_eq!(kept, "x\u{301}y");

        let stray = WhitespaceStep.apply(&PunctuationStep.apply("a !\u{301} b"));
        assert_eq!(stray, "a b");
    }

    #[test]
    fn test_numbers_remove_and_mask() {
        let remove = NumberStep::new(NumberMode::Remove).unwrap();
        let mask   = NumberStep::new(NumberMode::Mask).unwrap();
        assert_eq!(WhitespaceStep.apply(&remove.apply("room 101 covid19")), "room covid19");
        assert_eq!(mask.apply("room 101"), "room xxnum");
        assert!(NumberStep::new(NumberMode::Keep).is_none());
    }

    #[test]
    fn test_stopwords_case_insensitive_and_keep_markers() {
        let step = StopwordStep::from_words(["the", "xxurl", "and"]);
        assert_eq!(step.apply("The cat and THE xxurl"), "cat xxurl");
    }

    #[test]
    fn test_stopwords_from_file_skips_comments() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("stop.txt");
        std::fs::write(&path, "# header\nFoo\n\nbar\n").unwrap();
        let step = StopwordStep::from_file(&path).unwrap();
        assert!(step.contains("foo"));
        assert!(step.contains("BAR"));
        assert!(!step.contains("# header"));
    }

    #[test]
    fn test_rare_words_fit_marks_and_drops() {
        let corpus = vec!["apple apple pear".to_string(), "apple kiwi pear".to_string()];

        let mut mark = RareWordStep::new(RareWordMode::Mark, 2, 1);
        mark.fit(&corpus).unwrap();
        assert_eq!(mark.frequent_words().unwrap(), &["apple".to_string(), "pear".to_string()]);
        assert_eq!(mark.apply("Apple kiwi xxnum"), "Apple xxrare xxnum");

        let mut drop = RareWordStep::new(RareWordMode::Drop, 10, 2);
        drop.fit(&corpus).unwrap();
        assert_eq!(drop.apply("kiwi pear apple"), "pear apple");
    }

    #[test]
    fn test_rare_words_unfitted_passes_through() {
        let step = RareWordStep::new(RareWordMode::Mark, 5, 1);
        assert_eq!(step.apply("a  b"), "a  b");
    }

    #[test]
    fn test_rare_words_preloaded_ignore_fit() {
        let mut step = RareWordStep::with_words(RareWordMode::Mark, vec!["Cat".into()]);
        step.fit(&["dog dog dog".to_string()]).unwrap();
        assert_eq!(step.apply("cat dog"), "cat xxrare");
    }

    #[test]
    fn test_whitespace_collapses() {
        assert_eq!(WhitespaceStep.apply("  a \t b\n\nc  "), "a b c");
    }
}

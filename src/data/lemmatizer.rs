// ============================================================
// Data — Part-of-Speech Tagging and Lemmatisation
// ============================================================
// A small rule-based English tagger and lemmatiser.
//
// Tagging is context free: a word's coarse tag depends only on
// the word itself, looked up in this order:
//   1. closed-class lexicon (determiners, pronouns, ...)
//   2. irregular-form lexicon (went, children, better, ...)
//   3. suffix rules (-ly adverb, -ing/-ed verb, -ous adjective)
//   4. everything else is a noun
//
// Lemmatisation is POS aware: closed-class words are never
// touched, verbs lose -ing/-ed, nouns lose plural endings, and
// the rules are re-applied until the word stops changing. A
// lemma is therefore always a fixed point, which keeps the
// step idempotent.
//
// Two cleaning steps are built on top:
//   LemmatizeStep  — rewrite open-class words to their lemma
//   PosFilterStep  — keep only tokens whose tag is configured

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::data::text_steps::is_marker;
use crate::domain::traits::TextStep;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PosTag {
    Noun,
    Verb,
    Adjective,
    Adverb,
    Numeral,
    Determiner,
    Pronoun,
    Preposition,
    Conjunction,
    Auxiliary,
    Particle,
    Interjection,
}

fn closed_class(word: &str) -> Option<PosTag> {
    let tag = match word {
        "a" | "an" | "the" | "this" | "that" | "these" | "those" | "each" | "every"
        | "some" | "any" | "no" | "all" | "both" | "either" | "neither" | "another" => {
            PosTag::Determiner
        }

        "i" | "me" | "my" | "mine" | "myself" | "you" | "your" | "yours" | "yourself"
        | "yourselves" | "he" | "him" | "his" | "himself" | "she" | "her" | "hers"
        | "herself" | "it" | "its" | "itself" | "we" | "us" | "our" | "ours"
        | "ourselves" | "they" | "them" | "their" | "theirs" | "themselves" | "who"
        | "whom" | "whose" | "which" | "what" | "someone" | "anyone" | "everyone"
        | "nobody" | "something" | "anything" | "everything" | "nothing" => PosTag::Pronoun,

        "about" | "above" | "across" | "after" | "against" | "along" | "among" | "around"
        | "at" | "before" | "behind" | "below" | "beneath" | "beside" | "between"
        | "beyond" | "by" | "down" | "during" | "except" | "for" | "from" | "in"
        | "inside" | "into" | "near" | "of" | "off" | "on" | "onto" | "out" | "outside"
        | "over" | "past" | "since" | "through" | "throughout" | "to" | "toward"
        | "towards" | "under" | "until" | "up" | "upon" | "with" | "within" | "without" => {
            PosTag::Preposition
        }

        "and" | "but" | "or" | "nor" | "so" | "yet" | "because" | "although" | "though"
        | "while" | "if" | "unless" | "whereas" | "whether" | "than" | "as" => {
            PosTag::Conjunction
        }

        "am" | "is" | "are" | "was" | "were" | "be" | "been" | "being" | "have" | "has"
        | "had" | "having" | "do" | "does" | "did" | "doing" | "will" | "would" | "shall"
        | "should" | "can" | "could" | "may" | "might" | "must" => PosTag::Auxiliary,

        "not" | "dont" | "doesnt" | "didnt" | "wont" | "cant" | "isnt" | "arent" => {
            PosTag::Particle
        }

        "oh" | "ah" | "wow" | "hey" | "hello" | "hi" | "yes" | "ugh" | "oops" | "alas" => {
            PosTag::Interjection
        }

        _ => return None,
    };
    Some(tag)
}

fn irregular(word: &str) -> Option<(&'static str, PosTag)> {
    let entry = match word {
        "went" | "gone" => ("go", PosTag::Verb),
        "ran" => ("run", PosTag::Verb),
        "saw" | "seen" => ("see", PosTag::Verb),
        "took" | "taken" => ("take", PosTag::Verb),
        "made" => ("make", PosTag::Verb),
        "came" => ("come", PosTag::Verb),
        "got" | "gotten" => ("get", PosTag::Verb),
        "gave" | "given" => ("give", PosTag::Verb),
        "knew" | "known" => ("know", PosTag::Verb),
        "thought" => ("think", PosTag::Verb),
        "told" => ("tell", PosTag::Verb),
        "found" => ("find", PosTag::Verb),
        "felt" => ("feel", PosTag::Verb),
        "kept" => ("keep", PosTag::Verb),
        "brought" => ("bring", PosTag::Verb),
        "bought" => ("buy", PosTag::Verb),
        "began" | "begun" => ("begin", PosTag::Verb),
        "wrote" | "written" => ("write", PosTag::Verb),
        "spoke" | "spoken" => ("speak", PosTag::Verb),
        "ate" | "eaten" => ("eat", PosTag::Verb),
        "drove" | "driven" => ("drive", PosTag::Verb),
        "chose" | "chosen" => ("choose", PosTag::Verb),
        "became" => ("become", PosTag::Verb),
        "paid" => ("pay", PosTag::Verb),
        "said" => ("say", PosTag::Verb),
        "sold" => ("sell", PosTag::Verb),
        "sent" => ("send", PosTag::Verb),
        "built" => ("build", PosTag::Verb),
        "stood" => ("stand", PosTag::Verb),
        "understood" => ("understand", PosTag::Verb),
        "won" => ("win", PosTag::Verb),
        "lost" => ("lose", PosTag::Verb),
        "met" => ("meet", PosTag::Verb),
        "held" => ("hold", PosTag::Verb),

        "children" => ("child", PosTag::Noun),
        "men" => ("man", PosTag::Noun),
        "women" => ("woman", PosTag::Noun),
        "people" => ("person", PosTag::Noun),
        "mice" => ("mouse", PosTag::Noun),
        "feet" => ("foot", PosTag::Noun),
        "teeth" => ("tooth", PosTag::Noun),
        "geese" => ("goose", PosTag::Noun),
        "lives" => ("life", PosTag::Noun),
        "knives" => ("knife", PosTag::Noun),
        "wives" => ("wife", PosTag::Noun),

        "better" | "best" => ("good", PosTag::Adjective),
        "worse" | "worst" => ("bad", PosTag::Adjective),

        _ => return None,
    };
    Some(entry)
}

/// Coarse part-of-speech tag of a single word.
pub fn tag_word(word: &str) -> PosTag {
    let lower = word.to_lowercase();
    if let Some(tag) = closed_class(&lower) {
        return tag;
    }
    if let Some((_, tag)) = irregular(&lower) {
        return tag;
    }
    if lower.chars().all(|c| c.is_numeric()) && !lower.is_empty() {
        return PosTag::Numeral;
    }

    let long = lower.chars().count() > 4;
    if long && lower.ends_with("ly") {
        PosTag::Adverb
    } else if long && (lower.ends_with("ing") || (lower.ends_with("ed") && !lower.ends_with("eed"))) {
        PosTag::Verb
    } else if long && ["ize", "ise", "ify"].iter().any(|s| lower.ends_with(s)) {
        PosTag::Verb
    } else if long
        && ["ous", "ful", "ive", "able", "ible", "less", "ish", "ical"]
            .iter()
            .any(|s| lower.ends_with(s))
    {
        PosTag::Adjective
    } else {
        PosTag::Noun
    }
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

fn has_vowel(s: &str) -> bool {
    s.chars().any(|c| is_vowel(c) || c == 'y')
}

/// Consonant-vowel-consonant stems ("hop", "cod") had a silent e.
fn restore_e(stem: &str) -> String {
    let chars: Vec<char> = stem.chars().collect();
    if chars.len() == 3
        && !is_vowel(chars[0])
        && is_vowel(chars[1])
        && !is_vowel(chars[2])
        && !matches!(chars[2], 'w' | 'x' | 'y')
    {
        format!("{stem}e")
    } else {
        stem.to_string()
    }
}

fn strip_verb_suffix(word: &str) -> Option<String> {
    if let Some(stem) = word.strip_suffix("ied") {
        if stem.len() >= 2 {
            return Some(format!("{stem}y"));
        }
    }

    let stem = word
        .strip_suffix("ing")
        .or_else(|| word.strip_suffix("ed"))?;
    if stem.len() < 2 || !has_vowel(stem) {
        return None;
    }

    // running → runn → run, but falling → fall
    let mut chars: Vec<char> = stem.chars().collect();
    let n = chars.len();
    if n >= 3 && chars[n - 1] == chars[n - 2] && !is_vowel(chars[n - 1]) && !matches!(chars[n - 1], 'l' | 's' | 'z') {
        chars.pop();
        return Some(chars.into_iter().collect());
    }
    Some(restore_e(stem))
}

fn strip_plural(word: &str) -> Option<String> {
    if word.len() <= 3 {
        return None;
    }
    if let Some(stem) = word.strip_suffix("ies") {
        if stem.len() >= 2 {
            return Some(format!("{stem}y"));
        }
    }
    if let Some(stem) = word.strip_suffix("sses") {
        return Some(format!("{stem}ss"));
    }
    for suffix in ["xes", "ches", "shes", "zes"] {
        if word.ends_with(suffix) {
            return Some(word[..word.len() - 2].to_string());
        }
    }
    if word.ends_with('s') && !["ss", "us", "is", "ous"].iter().any(|s| word.ends_with(s)) {
        return Some(word[..word.len() - 1].to_string());
    }
    None
}

/// Lemma of a single word. Unchanged words keep their casing;
/// rewritten words come back lowercase.
pub fn lemmatize_word(word: &str) -> String {
    if is_marker(word) {
        return word.to_string();
    }
    let mut current = word.to_lowercase();
    if closed_class(&current).is_some() || !current.chars().all(char::is_alphabetic) {
        return word.to_string();
    }

    let mut changed = false;
    // Every rule shortens the word; the bound only guards lexicon cycles
    for _ in 0..8 {
        let next = if let Some((lemma, _)) = irregular(&current) {
            Some(lemma.to_string())
        } else {
            match tag_word(&current) {
                PosTag::Verb => strip_verb_suffix(&current),
                PosTag::Noun => strip_plural(&current),
                _ => None,
            }
        };

        match next {
            Some(n) if n != current => {
                current = n;
                changed = true;
            }
            _ => break,
        }
    }

    if changed {
        current
    } else {
        word.to_string()
    }
}

// ─── Steps ────────────────────────────────────────────────────────────────────

pub struct LemmatizeStep;

impl TextStep for LemmatizeStep {
    fn name(&self) -> &'static str {
        "lemmatize"
    }

    fn apply(&self, text: &str) -> String {
        text.split_whitespace()
            .map(lemmatize_word)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

pub struct PosFilterStep {
    keep: HashSet<PosTag>,
}

impl PosFilterStep {
    pub fn new(keep: &[PosTag]) -> Self {
        Self {
            keep: keep.iter().copied().collect(),
        }
    }
}

impl TextStep for PosFilterStep {
    fn name(&self) -> &'static str {
        "pos_filter"
    }

    fn apply(&self, text: &str) -> String {
        text.split_whitespace()
            .filter(|t| is_marker(t) || self.keep.contains(&tag_word(t)))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

// ============================================================
// Data — Cleaning Chain
// ============================================================
// Runs the enabled TextSteps over record text in one fixed
// order:
//
//   1. html            decode entities, strip tags
//   2. special_tokens  URLs, e-mails, @mentions, #hashtags → markers
//   3. punctuation     drop apostrophes, other symbols → space
//   4. numbers         remove or mask standalone numbers
//   5. lemmatize       POS-aware lemmas
//   6. stopwords       case-insensitive removal
//   7. pos_filter      keep configured coarse tags only
//   8. rare_words      frequent-word list fitted on train
//   9. whitespace      collapse runs, trim
//
// Every step is idempotent and no step produces input an
// earlier step would still change, so the chain as a whole is
// idempotent: clean(clean(x)) == clean(x).
//
// Fitting is sequential: each step fits on train text that has
// already passed through the steps before it.
//
// Per-record cleaning may run on the rayon pool; collecting an
// indexed parallel iterator keeps input order.

use rayon::prelude::*;

use crate::config::CleaningConfig;
use crate::data::lemmatizer::{LemmatizeStep, PosFilterStep};
use crate::data::text_steps::{
    HtmlStep, NumberStep, PunctuationStep, RareWordStep, SpecialTokenStep, StopwordStep,
    WhitespaceStep,
};
use crate::domain::record::Record;
use crate::domain::traits::TextStep;
use crate::error::Result;

pub struct CleaningChain {
    steps:    Vec<Box<dyn TextStep>>,
    parallel: bool,
}

impl CleaningChain {
    /// Chain over explicit steps, applied in the given order.
    pub fn new(steps: Vec<Box<dyn TextStep>>) -> Self {
        Self { steps, parallel: false }
    }

    /// Build the enabled steps in their fixed order.
    pub fn from_config(config: &CleaningConfig) -> Result<Self> {
        let mut steps: Vec<Box<dyn TextStep>> = Vec::new();

        if config.html {
            steps.push(Box::new(HtmlStep::new()));
        }
        if !config.special_tokens.is_empty() {
            steps.push(Box::new(SpecialTokenStep::new(&config.special_tokens)));
        }
        if config.punctuation {
            steps.push(Box::new(PunctuationStep));
        }
        if let Some(step) = NumberStep::new(config.numbers) {
            steps.push(Box::new(step));
        }
        if config.lemmatize {
            steps.push(Box::new(LemmatizeStep));
        }
        if config.stopwords {
            let step = match &config.stopwords_path {
                Some(path) => StopwordStep::from_file(path)?,
                None => StopwordStep::english(),
            };
            steps.push(Box::new(step));
        }
        if let Some(tags) = &config.pos_filter {
            steps.push(Box::new(PosFilterStep::new(tags)));
        }
        if let Some(rare) = &config.rare_words {
            let step = match &rare.path {
                Some(path) => RareWordStep::from_file(rare.mode, path)?,
                None => RareWordStep::new(rare.mode, rare.top_k, rare.min_count),
            };
            steps.push(Box::new(step));
        }
        if config.whitespace {
            steps.push(Box::new(WhitespaceStep));
        }

        Ok(Self::new(steps))
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Fit every step on the training corpus.
    pub fn fit(&mut self, corpus: &[String]) -> Result<()> {
        let mut current = corpus.to_vec();
        for step in self.steps.iter_mut() {
            step.fit(&current)?;
            let step: &dyn TextStep = &**step;
            current = if self.parallel {
                current.par_iter().map(|t| step.apply(t)).collect()
            } else {
                current.iter().map(|t| step.apply(t)).collect()
            };
        }
        tracing::debug!("Fitted cleaning chain on {} texts", corpus.len());
        Ok(())
    }

    pub fn clean(&self, text: &str) -> String {
        self.steps
            .iter()
            .fold(text.to_string(), |acc, step| step.apply(&acc))
    }

    /// Cleaned copies of `records`, in the same order.
    pub fn clean_records(&self, records: &[Record]) -> Vec<Record> {
        if self.parallel {
            records
                .par_iter()
                .map(|r| r.with_text(self.clean(&r.text)))
                .collect()
        } else {
            records
                .iter()
                .map(|r| r.with_text(self.clean(&r.text)))
                .collect()
        }
    }

    /// Frequent-word list learned by the rare-word step, if any.
    pub fn frequent_words(&self) -> Option<Vec<String>> {
        self.steps
            .iter()
            .find_map(|s| s.learned_words())
            .map(<[String]>::to_vec)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RareWordsConfig;
    use crate::data::lemmatizer::PosTag;
    use crate::data::text_steps::{NumberMode, RareWordMode};

    fn everything_on() -> CleaningConfig {
        CleaningConfig {
            lemmatize: true,
            pos_filter: Some(vec![PosTag::Noun, PosTag::Verb, PosTag::Adjective, PosTag::Adverb]),
            rare_words: Some(RareWordsConfig {
                mode:      RareWordMode::Mark,
                top_k:     6,
                min_count: 1,
                path:      None,
            }),
            ..CleaningConfig::default()
        }
    }

    fn corpus() -> Vec<String> {
        [
            "<p>Visit https://example.com NOW!!!</p>",
            "Cats &amp; dogs were running 24/7 with @bob #pets",
            "I don't like the studies of 3 mice.",
            "cats chase mice; dogs chase cats",
            "",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    #[test]
    fn test_punctuation_and_numbers() {
        let config = CleaningConfig {
            stopwords: false,
            numbers: NumberMode::Remove,
            ..CleaningConfig::default()
        };
        let chain = CleaningChain::from_config(&config).unwrap();
        assert_eq!(chain.clean("Hello, World! 123"), "Hello World");
    }

    #[test]
    fn test_documented_step_order() {
        let chain = CleaningChain::from_config(&everything_on()).unwrap();
        assert_eq!(
            chain.step_names(),
            vec![
                "html",
                "special_tokens",
                "punctuation",
                "numbers",
                "lemmatize",
                "stopwords",
                "pos_filter",
                "rare_words",
                "whitespace",
            ]
        );
    }

    #[test]
    fn test_disabled_steps_are_skipped() {
        let config = CleaningConfig {
            html: false,
            special_tokens: Vec::new(),
            punctuation: false,
            numbers: NumberMode::Keep,
            stopwords: false,
            whitespace: false,
            ..CleaningConfig::default()
        };
        let chain = CleaningChain::from_config(&config).unwrap();
        assert!(chain.step_names().is_empty());
        assert_eq!(chain.clean(" <b>raw</b> 42 "), " <b>raw</b> 42 ");
    }

    #[test]
    fn test_chain_is_idempotent() {
        let texts = corpus();
        let mut chain = CleaningChain::from_config(&everything_on()).unwrap();
        chain.fit(&texts).unwrap();

        for text in &texts {
            let once = chain.clean(text);
            assert_eq!(chain.clean(&once), once, "input: {text}");
        }
    }

    #[test]
    fn test_default_chain_output() {
        let chain = CleaningChain::from_config(&CleaningConfig::default()).unwrap();
        assert_eq!(
            chain.clean("<p>Visit https://example.com NOW!!!</p>"),
            "Visit xxurl"
        );
        assert_eq!(chain.clean("I don't like the 3 mice."), "dont like mice");
    }

    #[test]
    fn test_rare_words_fit_after_earlier_steps() {
        let mut chain = CleaningChain::from_config(&everything_on()).unwrap();
        chain.fit(&corpus()).unwrap();

        let words = chain.frequent_words().unwrap();
        assert_eq!(words.len(), 6);
        assert_eq!(words[0], "cat");
        assert!(!words.iter().any(|w| w == "the" || w == "cats"));
    }

    #[test]
    fn test_parallel_keeps_order() {
        let records: Vec<Record> = (0..200)
            .map(|i| Record::new(i, format!("Item {i}, the <b>best</b>!"), "x"))
            .collect();
        let seq = CleaningChain::from_config(&CleaningConfig::default()).unwrap();
        let par = CleaningChain::from_config(&CleaningConfig::default())
            .unwrap()
            .with_parallel(true);

        let a = seq.clean_records(&records);
        let b = par.clean_records(&records);
        assert_eq!(a, b);
        assert!(a.iter().enumerate().all(|(i, r)| r.id == i && r.label == "x"));
        assert_eq!(a[7].text, "Item best");
    }

    #[test]
    fn test_text_that_loses_every_token_stays_empty() {
        let chain = CleaningChain::from_config(&CleaningConfig::default()).unwrap();
        let out = chain.clean_records(&[Record::new(0, "the and of", "a")]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].text, "");
    }
}

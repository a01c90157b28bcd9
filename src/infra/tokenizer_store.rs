// ============================================================
// Infra — Tokenizer Store
// ============================================================
// Builds, saves and loads the fitted tokenizer state.
//
//   vocab_dir/vocab.txt            one token per line, line n = id n
//   vectorizer_dir/tokenizer.json  HuggingFace word-level tokenizer
//
// The tokenizer JSON is written out directly instead of going
// through a trainer: the Vocabulary already fixes every id, so
// the model is a WordLevel map over exactly those tokens with
// [UNK] as fallback, a WhitespaceSplit pre-tokenizer (the same
// split the vocabulary was counted with) and an optional
// Lowercase normalizer.
//
// Loading cross-checks the two files: every vocab.txt line must
// map to the same id inside tokenizer.json.
//
// Why keep vocab.txt at all when tokenizer.json has the map?
//   vocab.txt is the human-readable, diffable record of the id
//   layout. The cross-check means a hand-edited or half-written
//   pair is reported as CorruptArtifact instead of silently
//   giving different ids.
//
// Why fold case in the Vocabulary the same way?
//   Lowercase lowercases char by char. Vocabulary::build uses
//   fold_case for the same mapping, otherwise a word like ΟΔΟΣ
//   would be counted under one spelling and looked up under
//   another.
//
// Reference: tokenizers crate documentation (Tokenizer, WordLevel)

use serde_json::json;
use std::{
    fs,
    io,
    path::{Path, PathBuf},
};
use tokenizers::Tokenizer;

use crate::data::vocabulary::{Vocabulary, PAD_TOKEN, UNK_TOKEN};
use crate::error::{PrepError, Result};

pub const VOCAB_FILE:     &str = "vocab.txt";
pub const TOKENIZER_FILE: &str = "tokenizer.json";
const VOCAB_ARTIFACT:     &str = "vocabulary";
const TOKENIZER_ARTIFACT: &str = "tokenizer";

/// Word-level tokenizer over exactly the ids of `vocab`.
///
/// # Arguments
/// * `vocab`          - Fitted vocabulary; ids are taken from it verbatim
/// * `special_tokens` - Reserved tokens beyond [PAD] and [UNK]
/// * `lowercase`      - Add a Lowercase normalizer
pub fn build_tokenizer(
    vocab:          &Vocabulary,
    special_tokens: &[String],
    lowercase:      bool,
) -> Result<Tokenizer> {
    // ── Step 1: Reserved tokens ───────────────────────────────────────────────
    let mut added = Vec::new();
    for token in [PAD_TOKEN, UNK_TOKEN]
        .into_iter()
        .chain(special_tokens.iter().map(String::as_str))
    {
        let id = vocab.token_to_id(token).ok_or_else(|| {
            PrepError::Tokenizer(format!("reserved token '{token}' is not in the vocabulary"))
        })?;
        added.push(json!({
            "id": id,
            "content": token,
            "single_word": false,
            "lstrip": false,
            "rstrip": false,
            "normalized": false,
            "special": true
        }));
    }

    // ── Step 2: Vocabulary map ────────────────────────────────────────────────
    let model_vocab: serde_json::Map<String, serde_json::Value> = vocab
        .tokens()
        .iter()
        .enumerate()
        .map(|(id, token)| (token.clone(), json!(id)))
        .collect();

    // ── Step 3: Tokenizer JSON in HuggingFace format ──────────────────────────
    let normalizer = if lowercase {
        json!({ "type": "Lowercase" })
    } else {
        serde_json::Value::Null
    };
    let tokenizer_json = json!({
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": added,
        "normalizer": normalizer,
        "pre_tokenizer": { "type": "WhitespaceSplit" },
        "post_processor": null,
        "decoder": null,
        "model": {
            "type": "WordLevel",
            "vocab": model_vocab,
            "unk_token": UNK_TOKEN
        }
    });

    tokenizer_json
        .to_string()
        .parse::<Tokenizer>()
        .map_err(|e| PrepError::Tokenizer(format!("cannot build word-level tokenizer: {e}")))
}

/// Check that `tokenizer` assigns every vocabulary token its id.
pub fn check_consistent(vocab: &Vocabulary, tokenizer: &Tokenizer) -> std::result::Result<(), String> {
    let size = tokenizer.get_vocab_size(false);
    if size != vocab.len() {
        return Err(format!(
            "tokenizer has {size} tokens but the vocabulary has {}",
            vocab.len()
        ));
    }
    for (id, token) in vocab.tokens().iter().enumerate() {
        if tokenizer.token_to_id(token) != Some(id as u32) {
            return Err(format!("token '{token}' does not map to id {id}"));
        }
    }
    Ok(())
}

/// Reads and writes the two tokenizer artifacts.
pub struct TokenizerStore {
    /// Directory holding vocab.txt
    vocab_dir: PathBuf,

    /// Directory holding tokenizer.json
    vectorizer_dir: PathBuf,
}

impl TokenizerStore {
    pub fn new(vocab_dir: impl Into<PathBuf>, vectorizer_dir: impl Into<PathBuf>) -> Self {
        Self {
            vocab_dir:      vocab_dir.into(),
            vectorizer_dir: vectorizer_dir.into(),
        }
    }

    pub fn vocab_path(&self) -> PathBuf {
        self.vocab_dir.join(VOCAB_FILE)
    }

    pub fn tokenizer_path(&self) -> PathBuf {
        self.vectorizer_dir.join(TOKENIZER_FILE)
    }

    // ─── Vocabulary ───────────────────────────────────────────────────────────

    pub fn save_vocabulary(&self, vocab: &Vocabulary) -> Result<()> {
        let path = self.vocab_path();
        fs::create_dir_all(&self.vocab_dir)
            .map_err(|e| PrepError::persist(VOCAB_ARTIFACT, &self.vocab_dir, e))?;

        let mut body = vocab.tokens().join("\n");
        body.push('\n');
        fs::write(&path, body).map_err(|e| PrepError::persist(VOCAB_ARTIFACT, &path, e))?;

        tracing::debug!("Wrote {} tokens to '{}'", vocab.len(), path.display());
        Ok(())
    }

    pub fn load_vocabulary(&self) -> Result<Vocabulary> {
        let path = self.vocab_path();
        let body = read_artifact(VOCAB_ARTIFACT, &path)?;
        if body.trim().is_empty() {
            return Err(PrepError::corrupt(VOCAB_ARTIFACT, &path, "file is empty"));
        }

        let tokens = body
            .strip_suffix('\n')
            .unwrap_or(&body)
            .split('\n')
            .map(|l| l.trim_end_matches('\r').to_string())
            .collect();
        Vocabulary::from_tokens(tokens).map_err(|e| PrepError::corrupt(VOCAB_ARTIFACT, &path, e))
    }

    // ─── Tokenizer ────────────────────────────────────────────────────────────

    pub fn save_tokenizer(&self, tokenizer: &Tokenizer) -> Result<()> {
        let path = self.tokenizer_path();
        fs::create_dir_all(&self.vectorizer_dir)
            .map_err(|e| PrepError::persist(TOKENIZER_ARTIFACT, &self.vectorizer_dir, e))?;

        tokenizer
            .save(&path, true)
            .map_err(|e| PrepError::persist(TOKENIZER_ARTIFACT, &path, io::Error::other(e.to_string())))?;

        tracing::debug!("Wrote tokenizer to '{}'", path.display());
        Ok(())
    }

    pub fn load_tokenizer(&self) -> Result<Tokenizer> {
        let path = self.tokenizer_path();
        let raw  = read_artifact(TOKENIZER_ARTIFACT, &path)?;
        raw.parse::<Tokenizer>()
            .map_err(|e| PrepError::corrupt(TOKENIZER_ARTIFACT, &path, e))
    }

    /// Load both artifacts and verify they agree.
    pub fn load(&self) -> Result<(Vocabulary, Tokenizer)> {
        let vocab     = self.load_vocabulary()?;
        let tokenizer = self.load_tokenizer()?;
        check_consistent(&vocab, &tokenizer)
            .map_err(|e| PrepError::corrupt(TOKENIZER_ARTIFACT, self.tokenizer_path(), e))?;
        Ok((vocab, tokenizer))
    }
}

fn read_artifact(artifact: &str, path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(PrepError::MissingArtifact {
            artifact: artifact.into(),
            path:     path.to_path_buf(),
        });
    }
    fs::read_to_string(path).map_err(|e| PrepError::corrupt(artifact, path, e))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn vocab() -> Vocabulary {
        Vocabulary::build(["cat dog cat", "bird"], &[], 100, 1, true)
    }

    fn store(tmp: &tempfile::TempDir) -> TokenizerStore {
        TokenizerStore::new(tmp.path().join("vocab"), tmp.path().join("vectorizer"))
    }

    #[test]
    fn test_built_tokenizer_uses_vocab_ids() {
        let vocab     = vocab();
        let tokenizer = build_tokenizer(&vocab, &[], true).unwrap();
        assert!(check_consistent(&vocab, &tokenizer).is_ok());

        let encoding = tokenizer.encode("Cat zebra  dog", false).unwrap();
        assert_eq!(encoding.get_ids(), &[2, 1, 4]);
    }

    #[test]
    fn test_non_ascii_cased_words_stay_in_vocabulary() {
        let vocab     = Vocabulary::build(["ΟΔΟΣ Straße"], &[], 100, 1, true);
        let tokenizer = build_tokenizer(&vocab, &[], true).unwrap();
        let ids       = tokenizer.encode("ΟΔΟΣ STRASSE Straße", false).unwrap().get_ids().to_vec();

        assert_eq!(ids[0], vocab.token_to_id("οδοσ").unwrap());
        assert_eq!(ids[1], 1);
        assert_eq!(ids[2], vocab.token_to_id("straße").unwrap());
    }

    #[test]
    fn test_lowercase_off_keeps_case() {
        let vocab     = Vocabulary::build(["Cat cat"], &[], 100, 1, false);
        let tokenizer = build_tokenizer(&vocab, &[], false).unwrap();
        let upper     = vocab.token_to_id("Cat").unwrap();
        let ids       = tokenizer.encode("Cat cat", false).unwrap().get_ids().to_vec();
        assert_eq!(ids[0], upper);
        assert_ne!(ids[0], ids[1]);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let tmp   = tempfile::tempdir().unwrap();
        let store = store(&tmp);
        let vocab = vocab();
        store.save_vocabulary(&vocab).unwrap();
        store.save_tokenizer(&build_tokenizer(&vocab, &[], true).unwrap()).unwrap();

        let body = fs::read_to_string(store.vocab_path()).unwrap();
        assert!(body.starts_with("[PAD]\n[UNK]\ncat\n"));

        let (loaded, tokenizer) = store.load().unwrap();
        assert_eq!(loaded, vocab);
        assert_eq!(tokenizer.token_to_id("dog"), vocab.token_to_id("dog"));
    }

    #[test]
    fn test_missing_artifacts() {
        let tmp   = tempfile::tempdir().unwrap();
        let store = store(&tmp);
        assert!(matches!(store.load_vocabulary(), Err(PrepError::MissingArtifact { .. })));
        assert!(matches!(store.load_tokenizer(), Err(PrepError::MissingArtifact { .. })));
    }

    #[test]
    fn test_empty_or_malformed_vocab_is_corrupt() {
        let tmp   = tempfile::tempdir().unwrap();
        let store = store(&tmp);
        fs::create_dir_all(tmp.path().join("vocab")).unwrap();

        fs::write(store.vocab_path(), "").unwrap();
        assert!(matches!(store.load_vocabulary(), Err(PrepError::CorruptArtifact { .. })));

        fs::write(store.vocab_path(), "[PAD]\n[UNK]\ncat\n\ndog\n").unwrap();
        assert!(matches!(store.load_vocabulary(), Err(PrepError::CorruptArtifact { .. })));
    }

    #[test]
    fn test_malformed_tokenizer_is_corrupt() {
        let tmp   = tempfile::tempdir().unwrap();
        let store = store(&tmp);
        fs::create_dir_all(tmp.path().join("vectorizer")).unwrap();
        fs::write(store.tokenizer_path(), "{\"model\": 3}").unwrap();
        assert!(matches!(store.load_tokenizer(), Err(PrepError::CorruptArtifact { .. })));
    }

    #[test]
    fn test_mismatched_artifacts_are_corrupt() {
        let tmp   = tempfile::tempdir().unwrap();
        let store = store(&tmp);
        store.save_vocabulary(&vocab()).unwrap();

        let other = Vocabulary::build(["owl"], &[], 100, 1, true);
        store.save_tokenizer(&build_tokenizer(&other, &[], true).unwrap()).unwrap();
        assert!(matches!(store.load(), Err(PrepError::CorruptArtifact { .. })));
    }
}

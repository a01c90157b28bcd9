// ============================================================
// Domain — Record and Split
// ============================================================
// A Record is one labelled example. `id` is the row index in
// the raw source and never changes: it is what ties a cleaned
// text back to its label after every pipeline stage.
//
// A Split holds the three disjoint partitions produced from
// one source dataset.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One labelled example.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Row index in the raw source
    pub id: usize,

    /// Raw text before cleaning, normalised text after
    pub text: String,

    /// Raw label, rendered as a string whether the source was
    /// categorical or numeric
    pub label: String,

    /// Integer class id assigned by the label encoder
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_id: Option<u32>,

    /// One-hot vector over the label encoder's classes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub one_hot: Option<Vec<u8>>,
}

impl Record {
    pub fn new(id: usize, text: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id,
            text:     text.into(),
            label:    label.into(),
            label_id: None,
            one_hot:  None,
        }
    }

    /// Same record with its text replaced.
    pub fn with_text(&self, text: String) -> Self {
        Self { text, ..self.clone() }
    }
}

/// Name of one partition; also fixes its artifact file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SplitName {
    Train,
    Val,
    Test,
}

impl SplitName {
    pub const ALL: [SplitName; 3] = [SplitName::Train, SplitName::Val, SplitName::Test];

    pub fn as_str(&self) -> &'static str {
        match self {
            SplitName::Train => "train",
            SplitName::Val   => "val",
            SplitName::Test  => "test",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            SplitName::Train => "train.json",
            SplitName::Val   => "val.json",
            SplitName::Test  => "test.json",
        }
    }
}

impl fmt::Display for SplitName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Three disjoint partitions of one dataset.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Split {
    pub train: Vec<Record>,
    pub val:   Vec<Record>,
    pub test:  Vec<Record>,
}

impl Split {
    pub fn len(&self) -> usize {
        self.train.len() + self.val.len() + self.test.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

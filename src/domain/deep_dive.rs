use serde::{Deserialize, Serialize};

/// A supporting link returned alongside an analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub uri: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeepDive {
    pub text: String,
    pub references: Vec<Reference>,
}

impl DeepDive {
    pub fn new(text: String, references: Vec<Reference>) -> Self {
        Self { text, references }
    }

    /// Analysis made only of the given text, with no references
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            references: Vec::new(),
        }
    }
}

//! Practice skills and the prompts used to exercise them.

pub mod bank;

pub use bank::{Prompt, QuestionBank};

use crate::error::{FluentError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The six practice categories. The lowercase name is the persisted key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillType {
    Read,
    Word,
    Tongue,
    Question,
    Photo,
    Numbers,
}

impl SkillType {
    pub const ALL: [SkillType; 6] = [
        SkillType::Read,
        SkillType::Word,
        SkillType::Tongue,
        SkillType::Question,
        SkillType::Photo,
        SkillType::Numbers,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            SkillType::Read => "read",
            SkillType::Word => "word",
            SkillType::Tongue => "tongue",
            SkillType::Question => "question",
            SkillType::Photo => "photo",
            SkillType::Numbers => "numbers",
        }
    }

    /// Heading shown above a practice round, e.g. "Tongue Practice".
    pub fn title(&self) -> String {
        let key = self.key();
        let mut chars = key.chars();
        match chars.next() {
            Some(first) => format!("{}{} Practice", first.to_uppercase(), chars.as_str()),
            None => String::new(),
        }
    }
}

impl fmt::Display for SkillType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for SkillType {
    type Err = FluentError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        SkillType::ALL
            .into_iter()
            .find(|skill| skill.key() == wanted)
            .ok_or_else(|| FluentError::InvalidAssessment {
                reason: format!(
                    "unknown skill type '{}' (expected one of: {})",
                    s,
                    SkillType::ALL.map(|k| k.key()).join(", ")
                ),
            })
    }
}

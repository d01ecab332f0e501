//! Question bank: the prompts offered for each skill.
//!
//! The built-in bank carries five prompts per skill. A custom bank can be
//! loaded from TOML; skills it defines replace the built-in lists, the rest
//! keep theirs.
//!
//! ```toml
//! [[read]]
//! instruction = "Read this aloud:"
//! text = "Practice makes progress."
//! ```

use super::SkillType;
use crate::error::{FluentError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub instruction: String,
    /// Text to speak; also the reference the transcript is aligned against.
    pub text: String,
}

impl Prompt {
    pub fn new(instruction: &str, text: &str) -> Self {
        Self {
            instruction: instruction.to_string(),
            text: text.to_string(),
        }
    }
}

const READ: &str = "Read this aloud:";
const WORD: &str = "Say this word:";
const TONGUE: &str = "Say this tongue twister quickly:";
const QUESTION: &str = "Answer this question:";
const PHOTO: &str = "Describe this photo:";
const NUMBERS: &str = "Read these numbers aloud:";

const BUILTIN: &[(SkillType, &str, &[&str])] = &[
    (
        SkillType::Read,
        READ,
        &[
            "The quick brown fox jumps over the lazy dog.",
            "Artificial intelligence is shaping the future.",
            "Learning never exhausts the mind.",
            "Consistency is the key to success.",
            "Knowledge speaks, but wisdom listens.",
        ],
    ),
    (
        SkillType::Word,
        WORD,
        &[
            "Innovation",
            "Technology",
            "Entrepreneurship",
            "Creativity",
            "Collaboration",
        ],
    ),
    (
        SkillType::Tongue,
        TONGUE,
        &[
            "She sells seashells by the seashore.",
            "Peter Piper picked a peck of pickled peppers.",
            "How much wood would a woodchuck chuck?",
            "Fuzzy Wuzzy was a bear, Fuzzy Wuzzy had no hair.",
            "Red lorry, yellow lorry, red lorry, yellow lorry.",
        ],
    ),
    (
        SkillType::Question,
        QUESTION,
        &[
            "What is your favorite hobby?",
            "Describe your morning routine.",
            "What motivates you every day?",
            "How do you handle challenges?",
            "If you could travel anywhere, where would you go?",
        ],
    ),
    (
        SkillType::Photo,
        PHOTO,
        &[
            "🖼️ Imagine a park with children playing.",
            "🖼️ Imagine a busy street market.",
            "🖼️ Imagine a mountain landscape at sunset.",
            "🖼️ Imagine a calm beach with waves crashing.",
            "🖼️ Imagine a bustling city skyline at night.",
        ],
    ),
    (
        SkillType::Numbers,
        NUMBERS,
        &[
            "One, two, three, four, five.",
            "Ten, twenty, thirty, forty, fifty.",
            "Hundred, two hundred, three hundred, four hundred, five hundred.",
            "Eleven, twelve, thirteen, fourteen, fifteen.",
            "Sixty, seventy, eighty, ninety, one hundred.",
        ],
    ),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionBank {
    prompts: BTreeMap<SkillType, Vec<Prompt>>,
}

impl QuestionBank {
    pub fn builtin() -> Self {
        let prompts = BUILTIN
            .iter()
            .map(|(skill, instruction, texts)| {
                let list = texts
                    .iter()
                    .map(|text| Prompt::new(instruction, text))
                    .collect();
                (*skill, list)
            })
            .collect();
        Self { prompts }
    }

    /// Parses a custom bank and lays it over the built-in one.
    ///
    /// # Errors
    /// `ConfigParse` for malformed TOML, `ConfigInvalidValue` for a table
    /// named after an unknown skill.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let custom: HashMap<String, Vec<Prompt>> =
            toml::from_str(content).map_err(|e| FluentError::ConfigParse {
                message: format!("question bank: {}", e),
            })?;

        let mut bank = Self::builtin();
        for (key, list) in custom {
            let skill: SkillType = key.parse().map_err(|_| FluentError::ConfigInvalidValue {
                key: key.clone(),
                message: "not a known skill type".to_string(),
            })?;
            tracing::debug!(skill = %skill, prompts = list.len(), "custom prompts loaded");
            bank.prompts.insert(skill, list);
        }
        Ok(bank)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                FluentError::ConfigFileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                FluentError::Io(e)
            }
        })?;
        Self::from_toml_str(&content)
    }

    /// Prompts for a skill; empty when a custom bank cleared the list.
    pub fn prompts(&self, skill: SkillType) -> &[Prompt] {
        self.prompts.get(&skill).map(Vec::as_slice).unwrap_or_default()
    }

    /// Resolves a skill key to its prompt list, failing fast before capture.
    ///
    /// # Errors
    /// `InvalidAssessment` when the key is unknown or its list is empty.
    pub fn select(&self, key: &str) -> Result<(SkillType, &[Prompt])> {
        let skill: SkillType = key.parse()?;
        let prompts = self.prompts(skill);
        if prompts.is_empty() {
            return Err(FluentError::InvalidAssessment {
                reason: format!("no prompts available for skill '{}'", skill),
            });
        }
        Ok((skill, prompts))
    }

    /// One prompt by zero-based index.
    ///
    /// # Errors
    /// `InvalidAssessment` as for [`select`](Self::select), or when `index`
    /// is past the end of the list.
    pub fn prompt(&self, key: &str, index: usize) -> Result<(SkillType, &Prompt)> {
        let (skill, prompts) = self.select(key)?;
        let prompt = prompts
            .get(index)
            .ok_or_else(|| FluentError::InvalidAssessment {
                reason: format!(
                    "skill '{}' has {} prompts, no prompt #{}",
                    skill,
                    prompts.len(),
                    index + 1
                ),
            })?;
        Ok((skill, prompt))
    }
}

impl Default for QuestionBank {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_has_five_prompts_per_skill() {
        let bank = QuestionBank::builtin();
        for skill in SkillType::ALL {
            assert_eq!(bank.prompts(skill).len(), 5, "skill {skill}");
        }
    }

    #[test]
    fn test_builtin_first_read_prompt() {
        let bank = QuestionBank::builtin();
        let (skill, prompt) = bank.prompt("read", 0).unwrap();
        assert_eq!(skill, SkillType::Read);
        assert_eq!(prompt.instruction, "Read this aloud:");
        assert_eq!(prompt.text, "The quick brown fox jumps over the lazy dog.");
    }

    #[test]
    fn test_select_unknown_key_fails_fast() {
        let bank = QuestionBank::builtin();
        match bank.select("karaoke") {
            Err(FluentError::InvalidAssessment { reason }) => assert!(reason.contains("karaoke")),
            other => panic!("Expected InvalidAssessment, got {:?}", other),
        }
    }

    #[test]
    fn test_prompt_index_out_of_range() {
        let bank = QuestionBank::builtin();
        assert!(matches!(
            bank.prompt("word", 5),
            Err(FluentError::InvalidAssessment { .. })
        ));
    }

    #[test]
    fn test_custom_bank_overrides_only_its_skills() {
        let toml = r#"
            [[tongue]]
            instruction = "Say it fast:"
            text = "Unique New York."
        "#;
        let bank = QuestionBank::from_toml_str(toml).unwrap();

        let tongue = bank.prompts(SkillType::Tongue);
        assert_eq!(tongue.len(), 1);
        assert_eq!(tongue[0].text, "Unique New York.");
        assert_eq!(bank.prompts(SkillType::Read).len(), 5);
    }

    #[test]
    fn test_custom_bank_empty_list_is_invalid_on_select() {
        let bank = QuestionBank::from_toml_str("photo = []").unwrap();
        assert!(matches!(
            bank.select("photo"),
            Err(FluentError::InvalidAssessment { .. })
        ));
    }

    #[test]
    fn test_custom_bank_unknown_skill_rejected() {
        let toml = r#"
            [[dance]]
            instruction = "x"
            text = "y"
        "#;
        match QuestionBank::from_toml_str(toml) {
            Err(FluentError::ConfigInvalidValue { key, .. }) => assert_eq!(key, "dance"),
            other => panic!("Expected ConfigInvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn test_custom_bank_malformed() {
        assert!(matches!(
            QuestionBank::from_toml_str("[[read]]\ninstruction = 3"),
            Err(FluentError::ConfigParse { .. })
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let result = QuestionBank::load(Path::new("/nonexistent/bank.toml"));
        assert!(matches!(result, Err(FluentError::ConfigFileNotFound { .. })));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(
            &mut file,
            b"[[numbers]]\ninstruction = \"Count:\"\ntext = \"one two\"\n",
        )
        .unwrap();
        let bank = QuestionBank::load(file.path()).unwrap();
        assert_eq!(bank.prompts(SkillType::Numbers)[0].instruction, "Count:");
    }
}

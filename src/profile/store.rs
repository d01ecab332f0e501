//! Persisted practice profile.
//!
//! One JSON file holds the per-skill scores and the rolling overview:
//!
//! ```json
//! { "scores": { "read": 82, "word": 0, ... }, "overview": { "samples": 3, ... } }
//! ```

use crate::assessment::SkillType;
use crate::defaults;
use crate::error::{FluentError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Latest fluency score per skill, 0 to 100. Every skill is always present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scores {
    pub read: u8,
    pub word: u8,
    pub tongue: u8,
    pub question: u8,
    pub photo: u8,
    pub numbers: u8,
}

impl Scores {
    pub fn get(&self, skill: SkillType) -> u8 {
        match skill {
            SkillType::Read => self.read,
            SkillType::Word => self.word,
            SkillType::Tongue => self.tongue,
            SkillType::Question => self.question,
            SkillType::Photo => self.photo,
            SkillType::Numbers => self.numbers,
        }
    }

    /// Overwrites a skill's score, capped at 100.
    pub fn set(&mut self, skill: SkillType, score: u8) {
        let score = score.min(defaults::MAX_SCORE);
        let slot = match skill {
            SkillType::Read => &mut self.read,
            SkillType::Word => &mut self.word,
            SkillType::Tongue => &mut self.tongue,
            SkillType::Question => &mut self.question,
            SkillType::Photo => &mut self.photo,
            SkillType::Numbers => &mut self.numbers,
        };
        *slot = score;
    }

    pub fn iter(&self) -> impl Iterator<Item = (SkillType, u8)> + '_ {
        SkillType::ALL.into_iter().map(|skill| (skill, self.get(skill)))
    }
}

/// Rolling summary across all completed sessions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionOverview {
    pub samples: u64,
    pub time_spent_seconds: u64,
    /// Mean of `(1 - wer) * 100`; sessions without a WER count as 0.
    pub accuracy: f64,
    /// Mean fluency score.
    pub fluency: f64,
    /// Highest stutter events per word seen in any session.
    pub max_stutter_likelihood: f64,
    /// Carried through unchanged; nothing updates it yet.
    pub streak: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub scores: Scores,
    pub overview: SessionOverview,
}

impl Profile {
    /// Rejects values no sequence of sessions can produce.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if let Some((skill, score)) = self.scores.iter().find(|(_, s)| *s > defaults::MAX_SCORE) {
            return Err(format!("score for '{}' is {}, above 100", skill, score));
        }

        let o = &self.overview;
        if !o.accuracy.is_finite() {
            return Err(format!("overview.accuracy is {}", o.accuracy));
        }
        // Accuracy alone may be negative: WER exceeds 1 with insertions.
        for (name, value) in [
            ("fluency", o.fluency),
            ("max_stutter_likelihood", o.max_stutter_likelihood),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("overview.{} is {}", name, value));
            }
        }
        if o.accuracy > 100.0 || o.fluency > 100.0 {
            return Err("overview averages exceed 100".to_string());
        }
        Ok(())
    }
}

/// Reads and writes the profile file.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    path: PathBuf,
}

impl ProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data_dir>/fluentme/profile.json`.
    pub fn default_path() -> Result<PathBuf> {
        dirs::data_dir()
            .map(|dir| dir.join(defaults::APP_DIR).join(defaults::PROFILE_FILE))
            .ok_or_else(|| FluentError::Other("could not determine data directory".to_string()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Strict load: a missing file is a fresh profile, anything unreadable is
    /// `CorruptPersistedState`.
    pub fn try_load(&self) -> Result<Profile> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Profile::default()),
            Err(e) => return Err(FluentError::Io(e)),
        };

        let corrupt = |message: String| FluentError::CorruptPersistedState {
            path: self.path.display().to_string(),
            message,
        };

        let profile: Profile =
            serde_json::from_str(&contents).map_err(|e| corrupt(e.to_string()))?;
        profile.validate().map_err(corrupt)?;
        Ok(profile)
    }

    /// Load, resetting to defaults when the stored profile is corrupt.
    ///
    /// # Errors
    /// Only for I/O failures other than a missing file.
    pub fn load(&self) -> Result<Profile> {
        match self.try_load() {
            Err(e @ FluentError::CorruptPersistedState { .. }) => {
                tracing::warn!("{}; starting from an empty profile", e);
                Ok(Profile::default())
            }
            other => other,
        }
    }

    /// Write to a sibling temp file, then rename over the profile.
    pub fn save(&self, profile: &Profile) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(profile)?;
        let tmp = self.temp_path();
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        tracing::debug!(path = %self.path.display(), "profile saved");
        Ok(())
    }

    /// Overwrite the stored profile with an empty one.
    pub fn reset(&self) -> Result<Profile> {
        let profile = Profile::default();
        self.save(&profile)?;
        Ok(profile)
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| defaults::PROFILE_FILE.into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, ProfileStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::new(dir.path().join("nested").join("profile.json"));
        (dir, store)
    }

    fn sample_profile() -> Profile {
        let mut profile = Profile::default();
        profile.scores.set(SkillType::Tongue, 72);
        profile.overview = SessionOverview {
            samples: 3,
            time_spent_seconds: 41,
            accuracy: 62.5,
            fluency: 80.0,
            max_stutter_likelihood: 0.25,
            streak: 0,
        };
        profile
    }

    #[test]
    fn test_missing_file_is_empty_profile() {
        let (_dir, store) = store();
        assert_eq!(store.load().unwrap(), Profile::default());
    }

    #[test]
    fn test_round_trip_is_identical() {
        let (_dir, store) = store();
        let profile = sample_profile();
        store.save(&profile).unwrap();
        assert_eq!(store.load().unwrap(), profile);
        assert!(!store.temp_path().exists());
    }

    #[test]
    fn test_json_layout_uses_skill_keys() {
        let (_dir, store) = store();
        store.save(&sample_profile()).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();

        for skill in SkillType::ALL {
            assert!(value["scores"][skill.key()].is_u64(), "missing {skill}");
        }
        assert_eq!(value["scores"]["tongue"], 72);
        assert_eq!(value["overview"]["samples"], 3);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let (_dir, store) = store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), r#"{"scores": {"read": 90}}"#).unwrap();

        let profile = store.load().unwrap();
        assert_eq!(profile.scores.read, 90);
        assert_eq!(profile.scores.word, 0);
        assert_eq!(profile.overview, SessionOverview::default());
    }

    #[test]
    fn test_corrupt_json_resets_to_default() {
        let (_dir, store) = store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "{ not json").unwrap();

        assert!(matches!(
            store.try_load(),
            Err(FluentError::CorruptPersistedState { .. })
        ));
        assert_eq!(store.load().unwrap(), Profile::default());
    }

    #[test]
    fn test_out_of_range_values_are_corrupt() {
        let (_dir, store) = store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), r#"{"scores": {"photo": 250}}"#).unwrap();
        assert!(store.try_load().is_err());

        fs::write(store.path(), r#"{"overview": {"fluency": -3.0}}"#).unwrap();
        assert!(store.try_load().is_err());
        assert_eq!(store.load().unwrap(), Profile::default());
    }

    #[test]
    fn test_reset_overwrites() {
        let (_dir, store) = store();
        store.save(&sample_profile()).unwrap();
        store.reset().unwrap();
        assert_eq!(store.load().unwrap(), Profile::default());
    }

    #[test]
    fn test_scores_set_caps_at_100() {
        let mut scores = Scores::default();
        scores.set(SkillType::Numbers, 140);
        assert_eq!(scores.get(SkillType::Numbers), 100);
    }

    #[test]
    fn test_default_path_ends_with_profile_file() {
        if let Ok(path) = ProfileStore::default_path() {
            assert!(path.ends_with("fluentme/profile.json"));
        }
    }
}

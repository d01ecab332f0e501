//! Command-line interface for fluentme
//!
//! Provides argument parsing using clap derive macros.

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Speech fluency practice
#[derive(Parser, Debug)]
#[command(name = "fluentme", version = crate::VERSION, about = "Speech fluency practice")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress output (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: info log, -vv: debug log)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Parse a duration string into seconds.
///
/// Supports any duration format accepted by `humantime`: bare numbers (seconds),
/// single-unit (`30s`, `5m`), and compound (`1m30s`).
fn parse_duration_secs(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(secs);
    }
    humantime::parse_duration(s)
        .map(|d| d.as_secs())
        .map_err(|e| e.to_string())
}

/// Prompt numbers are 1-based on the command line.
fn parse_prompt_number(s: &str) -> Result<usize, String> {
    match s.trim().parse::<usize>() {
        Ok(0) => Err("prompt numbers start at 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

/// Where the transcript comes from; there is no bundled recognizer.
#[derive(Args, Debug, Clone, Default)]
pub struct TranscriptArgs {
    /// Recognized text for the session
    #[arg(long, value_name = "TEXT", conflicts_with = "transcript_file")]
    pub transcript: Option<String>,

    /// Read the recognized text from a file
    #[arg(long, value_name = "FILE")]
    pub transcript_file: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Practice a skill live from the microphone
    Practice {
        /// Skill to practice (read, word, tongue, question, photo, numbers)
        #[arg(long, short = 's', value_name = "SKILL")]
        skill: String,

        /// Start at this prompt (1-based)
        #[arg(long, short = 'p', value_name = "N", default_value = "1", value_parser = parse_prompt_number)]
        prompt: usize,

        /// Read each prompt aloud before recording
        #[arg(long)]
        speak: bool,

        /// Save each session's audio as WAV into this directory
        #[arg(long, value_name = "DIR")]
        save_audio: Option<PathBuf>,

        /// Stop recording automatically after this long. Examples: 30s, 2m
        #[arg(long, value_name = "DURATION", value_parser = parse_duration_secs)]
        max_duration: Option<u64>,

        /// Audio input device (overrides config)
        #[arg(long, value_name = "DEVICE")]
        device: Option<String>,

        #[command(flatten)]
        transcript: TranscriptArgs,
    },

    /// Analyze a recorded WAV file against a prompt
    Analyze {
        /// Skill the recording belongs to
        #[arg(long, short = 's', value_name = "SKILL")]
        skill: String,

        /// Prompt number (1-based)
        #[arg(long, short = 'p', value_name = "N", default_value = "1", value_parser = parse_prompt_number)]
        prompt: usize,

        /// WAV file to analyze
        #[arg(long, value_name = "FILE")]
        wav: PathBuf,

        #[command(flatten)]
        transcript: TranscriptArgs,

        /// Print results without updating the profile
        #[arg(long)]
        no_save: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List practice prompts
    Prompts {
        /// Only this skill
        #[arg(long, short = 's', value_name = "SKILL")]
        skill: Option<String>,
    },

    /// Show per-skill scores and the session overview
    Profile {
        /// Clear all scores and the overview
        #[arg(long)]
        reset: bool,
    },

    /// List available audio input devices
    #[cfg(feature = "cpal-audio")]
    Devices,

    /// Show configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Configuration actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Print the configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_version_flag_reports_build_version() {
        let err = Cli::try_parse_from(["fluentme", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
        assert_eq!(Cli::command().get_version(), Some(crate::version_string().as_str()));
        assert!(err.to_string().contains(crate::VERSION));
    }

    #[test]
    fn test_command_is_required() {
        let result = Cli::try_parse_from(["fluentme"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_practice_defaults() {
        let cli = Cli::try_parse_from(["fluentme", "practice", "--skill", "read"]).unwrap();
        match cli.command {
            Commands::Practice {
                skill,
                prompt,
                speak,
                save_audio,
                max_duration,
                device,
                transcript,
            } => {
                assert_eq!(skill, "read");
                assert_eq!(prompt, 1);
                assert!(!speak);
                assert!(save_audio.is_none());
                assert!(max_duration.is_none());
                assert!(device.is_none());
                assert!(transcript.transcript.is_none());
                assert!(transcript.transcript_file.is_none());
            }
            other => panic!("Expected Practice command, got {:?}", other),
        }
        assert!(!cli.quiet);
        assert_eq!(cli.verbose, 0);
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_parse_practice_with_options() {
        let cli = Cli::try_parse_from([
            "fluentme",
            "practice",
            "-s",
            "tongue",
            "-p",
            "3",
            "--speak",
            "--save-audio",
            "/tmp/rec",
            "--max-duration",
            "1m30s",
        ])
        .unwrap();
        match cli.command {
            Commands::Practice {
                skill,
                prompt,
                speak,
                save_audio,
                max_duration,
                ..
            } => {
                assert_eq!(skill, "tongue");
                assert_eq!(prompt, 3);
                assert!(speak);
                assert_eq!(save_audio, Some(PathBuf::from("/tmp/rec")));
                assert_eq!(max_duration, Some(90));
            }
            other => panic!("Expected Practice command, got {:?}", other),
        }
    }

    #[test]
    fn test_prompt_zero_is_rejected() {
        let result = Cli::try_parse_from(["fluentme", "practice", "--skill", "read", "-p", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_analyze() {
        let cli = Cli::try_parse_from([
            "fluentme",
            "analyze",
            "--skill",
            "read",
            "--prompt",
            "2",
            "--wav",
            "take.wav",
            "--transcript",
            "the quick brown fox",
            "--no-save",
        ])
        .unwrap();
        match cli.command {
            Commands::Analyze {
                skill,
                prompt,
                wav,
                transcript,
                no_save,
                json,
            } => {
                assert_eq!(skill, "read");
                assert_eq!(prompt, 2);
                assert_eq!(wav, PathBuf::from("take.wav"));
                assert_eq!(transcript.transcript.as_deref(), Some("the quick brown fox"));
                assert!(no_save);
                assert!(!json);
            }
            other => panic!("Expected Analyze command, got {:?}", other),
        }
    }

    #[test]
    fn test_analyze_requires_wav() {
        let result = Cli::try_parse_from(["fluentme", "analyze", "--skill", "read"]);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_transcript_sources_conflict() {
        let result = Cli::try_parse_from([
            "fluentme",
            "analyze",
            "--skill",
            "read",
            "--wav",
            "a.wav",
            "--transcript",
            "hello",
            "--transcript-file",
            "hello.txt",
        ]);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_parse_prompts_and_profile() {
        let cli = Cli::try_parse_from(["fluentme", "prompts"]).unwrap();
        assert!(matches!(cli.command, Commands::Prompts { skill: None }));

        let cli = Cli::try_parse_from(["fluentme", "prompts", "--skill", "photo"]).unwrap();
        match cli.command {
            Commands::Prompts { skill } => assert_eq!(skill.as_deref(), Some("photo")),
            other => panic!("Expected Prompts command, got {:?}", other),
        }

        let cli = Cli::try_parse_from(["fluentme", "profile", "--reset"]).unwrap();
        assert!(matches!(cli.command, Commands::Profile { reset: true }));
    }

    #[test]
    fn test_parse_config_actions() {
        let cli = Cli::try_parse_from(["fluentme", "config", "show"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigAction::Show
            }
        ));
        let cli = Cli::try_parse_from(["fluentme", "config", "path"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigAction::Path
            }
        ));
    }

    #[test]
    fn test_parse_verbose_double() {
        let cli = Cli::try_parse_from(["fluentme", "-vv", "prompts"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_global_options_after_command() {
        let cli = Cli::try_parse_from([
            "fluentme",
            "profile",
            "--config",
            "/tmp/config.toml",
            "-q",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/config.toml")));
        assert!(cli.quiet);
    }

    #[test]
    fn test_invalid_command_returns_error() {
        let err = Cli::try_parse_from(["fluentme", "invalid"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidSubcommand);
    }

    #[test]
    fn test_parse_completions() {
        let cli = Cli::try_parse_from(["fluentme", "completions", "bash"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Completions { shell: Shell::Bash }
        ));
    }

    #[test]
    fn test_parse_duration_secs() {
        assert_eq!(parse_duration_secs("45"), Ok(45));
        assert_eq!(parse_duration_secs("2m"), Ok(120));
        assert_eq!(parse_duration_secs(" 1m30s "), Ok(90));
        assert!(parse_duration_secs("soon").is_err());
    }
}

//! Terminal rendering of session results, the profile and the question bank.
//!
//! Functions return strings so the binary decides where they go.

use crate::analysis::metrics::SessionReport;
use crate::assessment::{QuestionBank, SkillType};
use crate::profile::Profile;

const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

const MISSING: &str = "—";
const BAR_WIDTH: usize = 20;

/// Clear the current terminal line (live transcript, elapsed time)
pub fn clear_line() {
    eprint!("\r\x1b[2K");
}

/// Color for a 0-100 score.
fn score_color(score: f64) -> &'static str {
    if score >= 75.0 {
        GREEN
    } else if score >= 50.0 {
        YELLOW
    } else {
        RED
    }
}

struct Style {
    colored: bool,
}

impl Style {
    fn paint(&self, code: &str, text: &str) -> String {
        if self.colored {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn label(&self, text: &str) -> String {
        self.paint(DIM, &format!("{:<14}", text))
    }
}

/// Result block shown after a session.
pub fn render_report(report: &SessionReport, colored: bool) -> String {
    let style = Style { colored };
    let m = &report.metrics;
    let mut out: Vec<String> = Vec::new();

    let transcript = match report.transcript.as_deref() {
        Some("") => MISSING.to_string(),
        Some(text) => text.to_string(),
        None => "(transcription unavailable)".to_string(),
    };
    let words = m.word_count.map_or(MISSING.to_string(), |w| w.to_string());
    let wpm = m.wpm.map_or(MISSING.to_string(), |w| w.to_string());
    let stutters = match (m.stutter_count, report.percent_words_stuttered) {
        (Some(count), Some(percent)) => format!("{} ({}%)", count, percent),
        _ => MISSING.to_string(),
    };
    let wer = m
        .wer_percent
        .map_or(MISSING.to_string(), |w| format!("{:.1}% (WER)", w));
    let accuracy = m
        .accuracy_percent
        .map_or(MISSING.to_string(), |a| format!("{}%", a));

    out.push(format!("{} {}", style.label("Transcript"), transcript));
    out.push(format!(
        "{} {:.1}s",
        style.label("Duration"),
        m.duration_seconds,
    ));
    out.push(format!(
        "{} {:.1}s",
        style.label("Speaking"),
        m.speaking_seconds,
    ));
    out.push(format!("{} {}", style.label("Words"), words));
    out.push(format!("{} {}", style.label("WPM"), wpm));
    out.push(format!(
        "{} {} (avg {:.2}s)",
        style.label("Pauses"),
        m.pause_count,
        m.avg_pause_seconds,
    ));
    out.push(format!("{} {}", style.label("Stutter-like"), stutters));
    out.push(format!("{} {}", style.label("Accuracy"), wer));
    out.push(format!("{} {}", style.label("Correct"), accuracy));

    let score = f64::from(m.fluency_score);
    out.push(format!(
        "{} {}",
        style.label("Fluency"),
        style.paint(score_color(score), &format!("{} / 100", m.fluency_score)),
    ));

    if !report.events.is_empty() {
        let listed: Vec<String> = report
            .events
            .iter()
            .map(|e| format!("{} \"{}\"", e.kind, e.token))
            .collect();
        out.push(format!("{} {}", style.label("Events"), listed.join(", ")));
    }
    if report.frames_dropped > 0 {
        out.push(style.paint(
            YELLOW,
            &format!(
                "note: session ran past the history limit, only the last part was analysed ({} frames dropped)",
                report.frames_dropped
            ),
        ));
    }
    out.join("\n") + "\n"
}

/// Fixed-width bar for a 0-100 value.
fn bar(value: f64) -> String {
    let filled = ((value.clamp(0.0, 100.0) / 100.0) * BAR_WIDTH as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

/// Whole seconds as "1h 2m 3s", dropping leading zero units.
pub fn format_time_spent(seconds: u64) -> String {
    let (h, m, s) = (seconds / 3600, (seconds % 3600) / 60, seconds % 60);
    if h > 0 {
        format!("{}h {}m {}s", h, m, s)
    } else if m > 0 {
        format!("{}m {}s", m, s)
    } else {
        format!("{}s", s)
    }
}

/// Per-skill scores and the overview.
pub fn render_profile(profile: &Profile, colored: bool) -> String {
    let style = Style { colored };
    let mut out: Vec<String> = Vec::new();

    out.push(style.paint(BOLD, "Skills"));
    for (skill, score) in profile.scores.iter() {
        let score = f64::from(score);
        out.push(format!(
            "  {:<10} {} {:>3}",
            skill.key(),
            style.paint(score_color(score), &bar(score)),
            score,
        ));
    }

    let o = &profile.overview;
    out.push(String::new());
    out.push(style.paint(BOLD, "Overview"));
    out.push(format!("  {} {}", style.label("Sessions"), o.samples));
    out.push(format!(
        "  {} {}",
        style.label("Time spent"),
        format_time_spent(o.time_spent_seconds),
    ));
    out.push(format!("  {} {:.0}%", style.label("Accuracy"), o.accuracy));
    out.push(format!("  {} {:.0} / 100", style.label("Fluency"), o.fluency));
    out.push(format!(
        "  {} {:.0}%",
        style.label("Max stutter"),
        o.max_stutter_likelihood * 100.0,
    ));
    out.push(format!("  {} {}", style.label("Streak"), o.streak));
    out.join("\n") + "\n"
}

/// Numbered prompt list, for one skill or all of them.
pub fn render_prompts(bank: &QuestionBank, only: Option<SkillType>, colored: bool) -> String {
    let style = Style { colored };
    let mut out: Vec<String> = Vec::new();
    let skills: Vec<SkillType> = match only {
        Some(skill) => vec![skill],
        None => SkillType::ALL.to_vec(),
    };

    for (n, skill) in skills.into_iter().enumerate() {
        if n > 0 {
            out.push(String::new());
        }
        out.push(format!(
            "{} {}",
            style.paint(BOLD, &skill.title()),
            style.paint(DIM, &format!("({})", skill.key())),
        ));
        for (i, prompt) in bank.prompts(skill).iter().enumerate() {
            out.push(format!("  {}. {} {}", i + 1, prompt.instruction, prompt.text));
        }
    }
    out.join("\n") + "\n"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::metrics::{SessionInput, analyze_session};
    use crate::assessment::Prompt;
    use crate::audio::frame::AudioFrame;
    use crate::profile::SessionAggregator;

    fn report(transcript: Option<&str>) -> SessionReport {
        let frames: Vec<AudioFrame> = (0..100)
            .map(|i| AudioFrame {
                time_seconds: i as f64 * 0.03,
                duration_seconds: 0.03,
                energy: 0.1,
                voiced: true,
            })
            .collect();
        let prompt = Prompt::new("Read this aloud:", "Learning never exhausts the mind.");
        analyze_session(SessionInput {
            skill: SkillType::Read,
            prompt: &prompt,
            frames: &frames,
            duration_seconds: 3.04,
            transcript,
            frames_dropped: 0,
        })
    }

    #[test]
    fn test_render_report_plain() {
        let text = render_report(
            &report(Some("learning learning never exhausts the mind")),
            false,
        );
        assert!(text.contains("Duration       3.0s"), "{text}");
        assert!(text.contains("Words          6"));
        assert!(text.contains("Pauses         0 (avg 0.00s)"));
        assert!(text.contains("Stutter-like   1 (16.7%)"));
        assert!(text.contains("20.0% (WER)"));
        assert!(text.contains("/ 100"));
        assert!(text.contains("repetition \"learning\""));
        assert!(!text.contains('\x1b'));
    }

    #[test]
    fn test_render_report_without_transcript() {
        let text = render_report(&report(None), false);
        assert!(text.contains("(transcription unavailable)"));
        assert!(text.contains("WPM            —"));
        assert!(text.contains("Accuracy       —"));
    }

    #[test]
    fn test_render_report_colored_uses_ansi() {
        let text = render_report(&report(None), true);
        assert!(text.contains(RESET));
    }

    #[test]
    fn test_render_profile_lists_every_skill() {
        let mut profile = Profile::default();
        let r = report(Some("learning never exhausts the mind"));
        SessionAggregator::record(&mut profile, SkillType::Read, &r.metrics);

        let text = render_profile(&profile, false);
        for skill in SkillType::ALL {
            assert!(text.contains(skill.key()));
        }
        assert!(text.contains("Sessions       1"));
        assert!(text.contains("Time spent     3s"));
    }

    #[test]
    fn test_render_prompts_single_skill() {
        let text = render_prompts(&QuestionBank::builtin(), Some(SkillType::Word), false);
        assert!(text.starts_with("Word Practice (word)"));
        assert!(text.contains("  3. Say this word: Entrepreneurship"));
        assert!(!text.contains("Read Practice"));
    }

    #[test]
    fn test_format_time_spent() {
        assert_eq!(format_time_spent(0), "0s");
        assert_eq!(format_time_spent(75), "1m 15s");
        assert_eq!(format_time_spent(3725), "1h 2m 5s");
    }

    #[test]
    fn test_bar_width_is_constant() {
        for v in [0.0, 33.0, 100.0, 150.0] {
            assert_eq!(bar(v).chars().count(), BAR_WIDTH);
        }
    }
}

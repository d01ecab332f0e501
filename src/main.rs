use anyhow::{Context, Result, bail};
use clap::{CommandFactory, Parser};
use crossbeam_channel::{Receiver, RecvTimeoutError};
use fluentme::analysis::metrics::SessionReport;
use fluentme::assessment::{Prompt, QuestionBank, SkillType};
use fluentme::audio::recorder::AudioSource;
use fluentme::audio::wav::{WavAudioSource, WavRecorder};
use fluentme::cli::{Cli, Commands, ConfigAction, TranscriptArgs};
use fluentme::config::Config;
use fluentme::output::{self, clear_line};
use fluentme::profile::{Profile, ProfileStore, SessionAggregator};
use fluentme::session::Session;
use fluentme::speech::{
    CommandSpeaker, NullSpeaker, Recognizer, Speaker, StaticRecognizer, UnavailableRecognizer,
};
use owo_colors::OwoColorize;
use std::io::{BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing_subscriber::EnvFilter;

/// How often the live line is refreshed while recording.
const TICK: Duration = Duration::from_millis(100);

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

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
            let config = load_config(cli.config.as_deref())?;
            let options = PracticeOptions {
                skill,
                start: prompt - 1,
                speak: speak || config.session.speak_prompts,
                save_audio,
                max_duration: max_duration.map(Duration::from_secs),
                device: device.or_else(|| config.audio.device.clone()),
                transcript,
                quiet: cli.quiet,
            };

            // Ctrl-C cancels the active session instead of killing the process
            let cancelled = Arc::new(AtomicBool::new(false));
            let flag = Arc::clone(&cancelled);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    flag.store(true, Ordering::SeqCst);
                }
            });

            tokio::task::spawn_blocking(move || run_practice(config, options, cancelled))
                .await
                .context("practice loop panicked")??;
        }
        Commands::Analyze {
            skill,
            prompt,
            wav,
            transcript,
            no_save,
            json,
        } => {
            let config = load_config(cli.config.as_deref())?;
            run_analyze(&config, &skill, prompt - 1, &wav, &transcript, no_save, json)?;
        }
        Commands::Prompts { skill } => {
            let config = load_config(cli.config.as_deref())?;
            let bank = load_bank(&config)?;
            let only = skill.as_deref().map(str::parse::<SkillType>).transpose()?;
            print!("{}", output::render_prompts(&bank, only, use_color()));
        }
        Commands::Profile { reset } => {
            let config = load_config(cli.config.as_deref())?;
            let store = ProfileStore::new(config.profile_path()?);
            let profile = if reset {
                let profile = store.reset()?;
                if !cli.quiet {
                    eprintln!("{} {}", "Profile reset:".green(), store.path().display());
                }
                profile
            } else {
                store.load()?
            };
            print!("{}", output::render_profile(&profile, use_color()));
        }
        #[cfg(feature = "cpal-audio")]
        Commands::Devices => {
            list_audio_devices()?;
        }
        Commands::Config { action } => {
            handle_config_command(action, cli.config.as_deref())?;
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "fluentme", &mut std::io::stdout());
        }
    }

    Ok(())
}

/// Install the stderr log subscriber.
///
/// `FLUENTME_LOG` wins when set; otherwise `-v` raises the level from warn.
fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, _) => "debug",
    };
    let filter = EnvFilter::try_from_env("FLUENTME_LOG").unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn use_color() -> bool {
    std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

/// Load configuration from file or use defaults.
///
/// Priority order:
/// 1. Custom config path from CLI (--config)
/// 2. Default config path (~/.config/fluentme/config.toml)
/// 3. Built-in defaults with environment variable overrides
fn load_config(custom_path: Option<&Path>) -> Result<Config> {
    let config = match custom_path {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(&Config::default_path()?)?,
    };
    let config = config.with_env_overrides();
    config.validate()?;
    Ok(config)
}

fn load_bank(config: &Config) -> Result<QuestionBank> {
    match &config.storage.question_bank {
        Some(path) => QuestionBank::load(path)
            .with_context(|| format!("loading question bank {}", path.display())),
        None => Ok(QuestionBank::builtin()),
    }
}

/// Text source for the session; falls back to no recognition at all.
fn make_recognizer(args: &TranscriptArgs) -> Result<Box<dyn Recognizer>> {
    if let Some(text) = &args.transcript {
        return Ok(Box::new(StaticRecognizer::new(text)));
    }
    if let Some(path) = &args.transcript_file {
        return Ok(Box::new(StaticRecognizer::from_file(path)?));
    }
    Ok(Box::new(UnavailableRecognizer::new(
        "no recognizer configured (pass --transcript or --transcript-file)",
    )))
}

#[cfg(feature = "cpal-audio")]
fn open_microphone(device: Option<&str>, sample_rate: u32) -> Result<Box<dyn AudioSource>> {
    let source = fluentme::audio::capture::CpalAudioSource::new(device, sample_rate)?;
    Ok(Box::new(source))
}

#[cfg(not(feature = "cpal-audio"))]
fn open_microphone(_device: Option<&str>, _sample_rate: u32) -> Result<Box<dyn AudioSource>> {
    bail!(
        "this build has no microphone support; rebuild with --features cpal-audio \
         or use `fluentme analyze --wav FILE`"
    )
}

struct PracticeOptions {
    skill: String,
    start: usize,
    speak: bool,
    save_audio: Option<PathBuf>,
    max_duration: Option<Duration>,
    device: Option<String>,
    transcript: TranscriptArgs,
    quiet: bool,
}

/// Line reader on its own thread so the loop can poll Enter presses.
fn spawn_enter_listener() -> Receiver<()> {
    let (tx, rx) = crossbeam_channel::unbounded();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            if line.is_err() || tx.send(()).is_err() {
                break;
            }
        }
    });
    rx
}

enum Wait {
    Enter,
    Cancelled,
}

fn wait_for_enter(enter: &Receiver<()>, cancelled: &AtomicBool) -> Wait {
    loop {
        if cancelled.load(Ordering::SeqCst) {
            return Wait::Cancelled;
        }
        match enter.recv_timeout(TICK) {
            Ok(()) => return Wait::Enter,
            Err(RecvTimeoutError::Timeout) => {}
            // stdin closed: nothing can start or stop a session any more
            Err(RecvTimeoutError::Disconnected) => return Wait::Cancelled,
        }
    }
}

fn run_practice(config: Config, options: PracticeOptions, cancelled: Arc<AtomicBool>) -> Result<()> {
    let bank = load_bank(&config)?;
    let (skill, prompts) = bank.select(&options.skill)?;
    if options.start >= prompts.len() {
        bail!(
            "skill '{}' has {} prompts, no prompt #{}",
            skill,
            prompts.len(),
            options.start + 1
        );
    }

    let store = ProfileStore::new(config.profile_path()?);
    let mut profile = store.load()?;
    let speaker: Box<dyn Speaker> = match (options.speak, CommandSpeaker::detect()) {
        (true, Some(speaker)) => Box::new(speaker),
        (true, None) => {
            eprintln!(
                "{}",
                "No text-to-speech tool found (spd-say, espeak-ng, espeak)".yellow()
            );
            Box::new(NullSpeaker)
        }
        (false, _) => Box::new(NullSpeaker),
    };
    let enter = spawn_enter_listener();
    let colored = use_color();

    println!("{}", skill.title().bold());
    for (index, prompt) in prompts.iter().enumerate().skip(options.start) {
        println!();
        println!(
            "{} {}",
            format!("[{}/{}]", index + 1, prompts.len()).dimmed(),
            prompt.instruction
        );
        println!("  {}", prompt.text.bold());

        if let Err(e) = speaker.speak(&prompt.text) {
            tracing::warn!(speaker = speaker.name(), "could not pronounce prompt: {}", e);
        }

        if !options.quiet {
            eprintln!("{}", "Press Enter to start recording, Ctrl-C to quit".dimmed());
        }
        if let Wait::Cancelled = wait_for_enter(&enter, &cancelled) {
            eprintln!("{}", "Cancelled".yellow());
            return Ok(());
        }

        let Some(report) = record_prompt(&config, &options, skill, prompt, &enter, &cancelled)?
        else {
            eprintln!("{}", "Session cancelled; nothing was saved".yellow());
            return Ok(());
        };

        print!("{}", output::render_report(&report, colored));
        SessionAggregator::record(&mut profile, skill, &report.metrics);
        if let Err(e) = store.save(&profile) {
            eprintln!("{} {}", "Could not save profile:".red(), e);
        }
    }

    println!();
    print!("{}", output::render_profile(&profile, colored));
    Ok(())
}

/// One live capture. `None` when the user cancelled.
fn record_prompt(
    config: &Config,
    options: &PracticeOptions,
    skill: SkillType,
    prompt: &Prompt,
    enter: &Receiver<()>,
    cancelled: &AtomicBool,
) -> Result<Option<SessionReport>> {
    let mut session_config = config.session_config();
    if let Some(dir) = &options.save_audio {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating recording directory {}", dir.display()))?;
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        session_config.record_to = Some(WavRecorder::session_path(dir, skill.key(), millis));
    }

    let source = open_microphone(options.device.as_deref(), config.audio.sample_rate)?;
    let recognizer = make_recognizer(&options.transcript)?;
    let mut session = Session::start(skill, prompt.clone(), source, recognizer, session_config)?;
    if !session.has_recognition() && !options.quiet {
        eprintln!(
            "{}",
            "Recognition unavailable: only timing metrics will be scored".yellow()
        );
    }

    loop {
        if cancelled.load(Ordering::SeqCst) {
            clear_line();
            session.cancel();
            return Ok(None);
        }
        match enter.recv_timeout(TICK) {
            Ok(()) => break,
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
        if !session.is_capturing() {
            break;
        }
        if let Some(limit) = options.max_duration
            && session.elapsed() >= limit
        {
            break;
        }
        if !options.quiet {
            let text = session.poll_transcript();
            clear_line();
            eprint!(
                "{} {:>5.1}s  {}",
                "● REC".red(),
                session.elapsed().as_secs_f64(),
                text
            );
            // Flush failures only affect the live line
            if std::io::stderr().flush().is_err() {
                tracing::debug!("stderr flush failed");
            }
        }
    }
    clear_line();

    let outcome = session.stop()?;
    if let Some(path) = &outcome.recording
        && !options.quiet
    {
        eprintln!("{} {}", "Saved recording:".green(), path.display());
    }
    Ok(Some(outcome.report))
}

fn run_analyze(
    config: &Config,
    skill: &str,
    index: usize,
    wav: &Path,
    transcript: &TranscriptArgs,
    no_save: bool,
    json: bool,
) -> Result<()> {
    let bank = load_bank(config)?;
    let (skill, prompt) = bank.prompt(skill, index)?;

    let source = WavAudioSource::open(wav, config.audio.sample_rate, config.audio.frame_samples)?;
    let recognizer = make_recognizer(transcript)?;
    let session = Session::start(
        skill,
        prompt.clone(),
        Box::new(source),
        recognizer,
        config.session_config(),
    )?;
    if !session.wait_for_source(Duration::from_secs(config.session.max_session_secs)) {
        tracing::warn!("file replay did not finish in time; analysing what was read");
    }
    let report = session.stop()?.report;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", output::render_report(&report, use_color()));
    }

    if !no_save {
        let store = ProfileStore::new(config.profile_path()?);
        let mut profile: Profile = store.load()?;
        SessionAggregator::record(&mut profile, skill, &report.metrics);
        store.save(&profile)?;
    }
    Ok(())
}

/// List available audio input devices.
#[cfg(feature = "cpal-audio")]
fn list_audio_devices() -> Result<()> {
    let devices = fluentme::audio::capture::list_devices()?;

    if devices.is_empty() {
        eprintln!("No audio input devices found");
        std::process::exit(1);
    }

    println!("Available audio input devices:");
    for (idx, device) in devices.iter().enumerate() {
        println!("  [{}] {}", idx, device);
    }

    Ok(())
}

fn handle_config_command(action: ConfigAction, custom_path: Option<&Path>) -> Result<()> {
    let config_path = match custom_path {
        Some(path) => path.to_path_buf(),
        None => Config::default_path()?,
    };

    match action {
        ConfigAction::Show => {
            let config = Config::load_or_default(&config_path)?.with_env_overrides();
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Path => {
            println!("{}", config_path.display());
        }
    }
    Ok(())
}

//! StudioFlow CLI — headless marker-driven rough-cut generation.
//!
//! Usage:
//!     studioflow analyze ./01_footage --json
//!     studioflow rough-cut ./01_footage --style documentary --edl out.edl --fcpxml out.fcpxml
//!     studioflow watch ./project --transcribe-cmd "whisper {input} --model base --output_dir {outdir}"

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use std::time::Instant;

use clap::{Parser, Subcommand};

use studioflow_core::background_services::{BackgroundServices, TranscriptionResult, TranscriptionService};
use studioflow_core::models::{CutStyle, ScoringConfig};
use studioflow_core::project_io::save_project;
use studioflow_core::rough_cut::{analyze_clip, discover_video_files, RoughCutEngine};
use studioflow_core::timeline_export::{export_edl, export_fcpxml, export_removed_footage_edl, summarize_plan};
use studioflow_core::transcript_analyzer::TranscriptAnalyzer;

#[derive(Parser)]
#[command(
    name = "studioflow",
    version,
    about = "StudioFlow — marker-driven rough-cut generation CLI",
    long_about = "Analyze raw footage for spoken audio markers, rank and order the resulting \
                  segments, and export an edit decision list or Final Cut XML timeline."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a footage directory and report per-clip statistics (no cut generated)
    Analyze {
        /// Footage directory to scan
        footage_dir: PathBuf,

        /// Save a project snapshot (.json) of the analyzed clips
        #[arg(long)]
        save: Option<PathBuf>,

        /// Output results as JSON to stdout
        #[arg(long)]
        json: bool,

        /// Verbose logging
        #[arg(short, long)]
        verbose: bool,
    },

    /// Analyze footage and generate a rough-cut plan
    RoughCut {
        /// Footage directory to scan
        footage_dir: PathBuf,

        /// Cut style: documentary, interview, episode, tutorial, review,
        /// unboxing, comparison, setup, explainer
        #[arg(long, default_value = "documentary")]
        style: String,

        /// Target duration in seconds (defaults to the style's target ratio)
        #[arg(long)]
        target_duration: Option<f64>,

        /// Disable the smart-documentary theme grouping for the documentary style
        #[arg(long)]
        no_smart: bool,

        /// Use spoken audio markers instead of quality heuristics, when present
        #[arg(long)]
        markers: bool,

        /// Export an EDL to this path
        #[arg(long)]
        edl: Option<PathBuf>,

        /// Export a removed-footage EDL to this path
        #[arg(long)]
        removed_edl: Option<PathBuf>,

        /// Export an FCPXML timeline to this path
        #[arg(long)]
        fcpxml: Option<PathBuf>,

        /// Save a project snapshot (.json) of the clips and plan
        #[arg(long)]
        save: Option<PathBuf>,

        /// Output results as JSON to stdout
        #[arg(long)]
        json: bool,

        /// Verbose logging
        #[arg(short, long)]
        verbose: bool,
    },

    /// Watch a project tree: transcribe new footage and auto-trigger rough cuts
    Watch {
        /// Project directory (expects a `01_footage` subdirectory unless --footage-dir is given)
        project_dir: PathBuf,

        /// Footage directory, if not `<project_dir>/01_footage`
        #[arg(long)]
        footage_dir: Option<PathBuf>,

        /// Number of transcription worker threads
        #[arg(long, default_value_t = 4)]
        workers: usize,

        /// Shell command template to run for transcription. `{input}` is
        /// replaced with the audio/video path, `{outdir}` with its parent
        /// directory. Must write `<stem>.srt` and `<stem>_transcript.json`
        /// next to the source file.
        #[arg(long)]
        transcribe_cmd: String,

        /// Verbose logging
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let verbose = match &cli.command {
        Commands::Analyze { verbose, .. } => *verbose,
        Commands::RoughCut { verbose, .. } => *verbose,
        Commands::Watch { verbose, .. } => *verbose,
    };
    let level = if verbose { "debug" } else { "info" };
    // SAFETY: called before any threads are spawned, at program start.
    unsafe {
        std::env::set_var("RUST_LOG", format!("studioflow={level}"));
    }
    env_logger::init();

    match cli.command {
        Commands::Analyze { footage_dir, save, json, .. } => cmd_analyze(footage_dir, save, json),
        Commands::RoughCut {
            footage_dir,
            style,
            target_duration,
            no_smart,
            markers,
            edl,
            removed_edl,
            fcpxml,
            save,
            json,
            ..
        } => cmd_rough_cut(footage_dir, style, target_duration, !no_smart, markers, edl, removed_edl, fcpxml, save, json),
        Commands::Watch { project_dir, footage_dir, workers, transcribe_cmd, .. } => {
            cmd_watch(project_dir, footage_dir, workers, transcribe_cmd)
        }
    }
}

// ---------------------------------------------------------------------------
//  Commands
// ---------------------------------------------------------------------------

fn cmd_analyze(footage_dir: PathBuf, save: Option<PathBuf>, json: bool) -> anyhow::Result<()> {
    let t0 = Instant::now();
    let clips = analyze_footage_dir(&footage_dir)?;
    let elapsed = t0.elapsed().as_secs_f64();

    if let Some(path) = &save {
        save_project(path, &footage_dir, &clips, None)?;
        if !json {
            eprintln!("Project saved: {}", path.display());
        }
    }

    if json {
        let output = serde_json::json!({
            "footage_dir": footage_dir,
            "clips": clips,
            "elapsed_s": elapsed,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        eprintln!("Analyzed {} clip(s) in {:.2}s", clips.len(), elapsed);
        for clip in &clips {
            let name = clip.file_path.file_stem().and_then(|s| s.to_str()).unwrap_or("?");
            eprintln!(
                "  {} — {:.1}s, speech={}, best_moments={}, markers={}",
                name,
                clip.duration,
                clip.has_speech,
                clip.best_moments.len(),
                clip.markers.len()
            );
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_rough_cut(
    footage_dir: PathBuf,
    style: String,
    target_duration: Option<f64>,
    use_smart_features: bool,
    use_audio_markers: bool,
    edl: Option<PathBuf>,
    removed_edl: Option<PathBuf>,
    fcpxml: Option<PathBuf>,
    save: Option<PathBuf>,
    json: bool,
) -> anyhow::Result<()> {
    let cut_style = CutStyle::parse(&style)
        .ok_or_else(|| anyhow::anyhow!("unknown cut style '{style}'"))?;

    let t0 = Instant::now();
    let clips = analyze_footage_dir(&footage_dir)?;
    if clips.is_empty() {
        anyhow::bail!("No analyzable video files found in {}", footage_dir.display());
    }

    let mut engine = RoughCutEngine::new(ScoringConfig::default());
    engine.clips = clips;
    let plan = engine.create_rough_cut(cut_style, target_duration, use_smart_features, use_audio_markers)?;
    let elapsed = t0.elapsed().as_secs_f64();

    if let Some(path) = &edl {
        export_edl(&plan, path)?;
    }
    if let Some(path) = &removed_edl {
        export_removed_footage_edl(&plan, path)?;
    }
    if let Some(path) = &fcpxml {
        export_fcpxml(&plan, path)?;
    }
    if let Some(path) = &save {
        save_project(path, &footage_dir, &engine.clips, Some(&plan))?;
    }

    if json {
        let output = serde_json::json!({
            "plan": plan,
            "elapsed_s": elapsed,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        eprintln!("{}", summarize_plan(&plan));
        eprintln!("Generated in {elapsed:.2}s");
    }

    Ok(())
}

fn cmd_watch(
    project_dir: PathBuf,
    footage_dir: Option<PathBuf>,
    workers: usize,
    transcribe_cmd: String,
) -> anyhow::Result<()> {
    let service: Arc<dyn TranscriptionService> = Arc::new(ShellTranscriptionService { template: transcribe_cmd });
    let services = Arc::new(BackgroundServices::new(workers, service));
    services.watch_project(project_dir.clone(), footage_dir);
    services.start();

    eprintln!("Watching {} — press Ctrl+C to stop.", project_dir.display());
    ctrlc_block();

    eprintln!("Shutting down...");
    services.stop();
    let status = services.status();
    eprintln!(
        "Final status: {} transcription job(s), {} rough-cut job(s) completed.",
        status.transcription_completed, status.rough_cut_completed
    );
    Ok(())
}

// ---------------------------------------------------------------------------
//  Helpers
// ---------------------------------------------------------------------------

/// Discovers video files under `footage_dir` and analyzes each against its
/// sidecar `.srt`/`_transcript.json`, if present.
fn analyze_footage_dir(footage_dir: &Path) -> anyhow::Result<Vec<studioflow_core::models::ClipAnalysis>> {
    let videos = discover_video_files(footage_dir);
    let mut analyzer = TranscriptAnalyzer::new();
    let mut clips = Vec::with_capacity(videos.len());

    for video in videos {
        let srt_path = video.with_extension("srt");
        let srt_content = std::fs::read_to_string(&srt_path).ok();

        let json_path = video.with_file_name(format!(
            "{}_transcript.json",
            video.file_stem().and_then(|s| s.to_str()).unwrap_or("clip")
        ));
        let transcript: Option<studioflow_core::models::Transcript> = std::fs::read_to_string(&json_path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok());

        let clip = analyze_clip(video, srt_content.as_deref(), transcript.as_ref(), &mut analyzer);
        clips.push(clip);
    }

    Ok(clips)
}

/// Blocks until Ctrl+C is received.
fn ctrlc_block() {
    let (tx, rx) = std::sync::mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = tx.send(());
    })
    .expect("failed to install SIGINT handler");
    let _ = rx.recv();
}

/// Shells out to a user-provided transcription command template (§6: the
/// `transcribe` boundary is an external collaborator — this crate never
/// bundles or invokes Whisper directly).
struct ShellTranscriptionService {
    template: String,
}

impl TranscriptionService for ShellTranscriptionService {
    fn transcribe(&self, audio_path: &Path, _model: &str, _language: &str) -> TranscriptionResult {
        let outdir = audio_path.parent().unwrap_or_else(|| Path::new("."));
        let cmd_str = self
            .template
            .replace("{input}", &audio_path.to_string_lossy())
            .replace("{outdir}", &outdir.to_string_lossy());

        let status = Command::new("sh").arg("-c").arg(&cmd_str).status();

        let srt_path = audio_path.with_extension("srt");
        let json_path = audio_path.with_file_name(format!(
            "{}_transcript.json",
            audio_path.file_stem().and_then(|s| s.to_str()).unwrap_or("clip")
        ));

        match status {
            Ok(s) if s.success() => TranscriptionResult {
                success: true,
                srt_path: srt_path.exists().then_some(srt_path),
                json_path: json_path.exists().then_some(json_path),
                error: None,
            },
            Ok(s) => TranscriptionResult {
                success: false,
                srt_path: None,
                json_path: None,
                error: Some(format!("transcription command exited with {s}")),
            },
            Err(e) => TranscriptionResult { success: false, srt_path: None, json_path: None, error: Some(e.to_string()) },
        }
    }
}

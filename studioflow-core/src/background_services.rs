//! Background services (§4.8): a directory watcher, a bounded transcription
//! worker pool, and a single rough-cut worker, coordinated over two FIFO
//! queues and guarded by one mutex each (§5).
//!
//! The actual transcription engine is an external collaborator (§6) — this
//! module only defines the boundary it calls through, [`TranscriptionService`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use chrono::Utc;
use log::error;

use crate::markers::detect_markers;
use crate::models::{
    ClipAnalysis, CutStyle, JobStatus, RoughCutJob, ScoringConfig, Transcript, TranscriptionJob,
};
use crate::rough_cut::{analyze_clip, discover_video_files, RoughCutEngine};
use crate::timeline_export::export_edl;
use crate::transcript_analyzer::TranscriptAnalyzer;

const WATCHER_POLL_INTERVAL: Duration = Duration::from_secs(10);
const QUEUE_RECV_TIMEOUT: Duration = Duration::from_secs(1);
const SHUTDOWN_DEADLINE: Duration = Duration::from_secs(30);
const DEFAULT_MAX_WORKERS: usize = 4;

/// Result of the external transcription contract (§6): `transcribe(audio_path,
/// model, language, output_formats) -> {success, output_files, error?}`.
pub struct TranscriptionResult {
    pub success: bool,
    pub srt_path: Option<PathBuf>,
    pub json_path: Option<PathBuf>,
    pub error: Option<String>,
}

/// The external transcription collaborator boundary (§6). Implementations
/// must write `<stem>.srt` and `<stem>_transcript.json` next to the source.
pub trait TranscriptionService: Send + Sync {
    fn transcribe(&self, audio_path: &Path, model: &str, language: &str) -> TranscriptionResult;
}

fn srt_path_for(video: &Path) -> PathBuf {
    video.with_extension("srt")
}

fn json_path_for(video: &Path) -> PathBuf {
    let stem = video.file_stem().and_then(|s| s.to_str()).unwrap_or("clip");
    video.with_file_name(format!("{stem}_transcript.json"))
}

fn needs_transcription(video: &Path) -> bool {
    !srt_path_for(video).exists() && !json_path_for(video).exists()
}

fn now_iso() -> String {
    Utc::now().to_rfc3339()
}

#[derive(Default)]
struct JobCounts {
    pending: usize,
    running: usize,
    completed: usize,
    failed: usize,
}

/// Aggregate job-state snapshot (§4.8 `get_status`).
pub struct ServiceStatus {
    pub running: bool,
    pub watched_projects: usize,
    pub transcription_pending: usize,
    pub transcription_running: usize,
    pub transcription_completed: usize,
    pub transcription_failed: usize,
    pub rough_cut_pending: usize,
    pub rough_cut_running: usize,
    pub rough_cut_completed: usize,
    pub rough_cut_failed: usize,
    pub transcription_queue_depth: usize,
    pub rough_cut_queue_depth: usize,
}

struct Shared {
    transcription_jobs: Mutex<HashMap<String, TranscriptionJob>>,
    rough_cut_jobs: Mutex<HashMap<String, RoughCutJob>>,
    watched_projects: Mutex<HashMap<PathBuf, PathBuf>>,
    running: std::sync::atomic::AtomicBool,
}

/// Watches project footage directories, drains a transcription queue across
/// a worker pool, and drains a single rough-cut queue (§4.8).
pub struct BackgroundServices {
    shared: Arc<Shared>,
    max_workers: usize,
    transcription_service: Arc<dyn TranscriptionService>,
    transcription_tx: Mutex<Option<mpsc::Sender<TranscriptionJob>>>,
    rough_cut_tx: Mutex<Option<mpsc::Sender<RoughCutJob>>>,
    handles: Mutex<Vec<thread::JoinHandle<()>>>,
}

impl BackgroundServices {
    pub fn new(max_workers: usize, transcription_service: Arc<dyn TranscriptionService>) -> Self {
        Self {
            shared: Arc::new(Shared {
                transcription_jobs: Mutex::new(HashMap::new()),
                rough_cut_jobs: Mutex::new(HashMap::new()),
                watched_projects: Mutex::new(HashMap::new()),
                running: std::sync::atomic::AtomicBool::new(false),
            }),
            max_workers: max_workers.max(1),
            transcription_service,
            transcription_tx: Mutex::new(None),
            rough_cut_tx: Mutex::new(None),
            handles: Mutex::new(Vec::new()),
        }
    }

    pub fn with_defaults(transcription_service: Arc<dyn TranscriptionService>) -> Self {
        Self::new(DEFAULT_MAX_WORKERS, transcription_service)
    }

    /// Registers a project for watching and immediately queues any clips
    /// already missing transcripts.
    pub fn watch_project(&self, project_path: PathBuf, footage_dir: Option<PathBuf>) {
        let footage_dir = footage_dir.unwrap_or_else(|| project_path.join("01_footage"));
        self.shared
            .watched_projects
            .lock()
            .unwrap()
            .insert(project_path.clone(), footage_dir.clone());
        self.scan_and_queue(&footage_dir, &project_path);
    }

    pub fn stop_watching(&self, project_path: &Path) {
        self.shared.watched_projects.lock().unwrap().remove(project_path);
    }

    fn scan_and_queue(&self, footage_dir: &Path, project_path: &Path) {
        if !footage_dir.exists() {
            return;
        }
        let Some(tx) = self.transcription_tx.lock().unwrap().clone() else {
            return;
        };
        let mut videos = discover_video_files(footage_dir);
        videos.sort();
        let mut jobs = self.shared.transcription_jobs.lock().unwrap();
        for video in videos {
            if !needs_transcription(&video) {
                continue;
            }
            let key = video.to_string_lossy().to_string();
            if jobs.contains_key(&key) {
                continue;
            }
            let job = TranscriptionJob {
                video_file: video,
                project_path: project_path.to_path_buf(),
                status: JobStatus::Pending,
                created_at: now_iso(),
                started_at: None,
                completed_at: None,
                error: None,
                srt_path: None,
                json_path: None,
            };
            jobs.insert(key, job.clone());
            let _ = tx.send(job);
        }
    }

    /// Spawns the directory watcher, `max_workers` transcription workers, and
    /// one rough-cut worker, all daemon-style (no join on drop).
    pub fn start(self: &Arc<Self>) {
        if self.shared.running.swap(true, std::sync::atomic::Ordering::SeqCst) {
            return;
        }

        let (t_tx, t_rx) = mpsc::channel::<TranscriptionJob>();
        let (r_tx, r_rx) = mpsc::channel::<RoughCutJob>();
        *self.transcription_tx.lock().unwrap() = Some(t_tx.clone());
        *self.rough_cut_tx.lock().unwrap() = Some(r_tx.clone());

        let t_rx = Arc::new(Mutex::new(t_rx));
        let r_rx = Arc::new(Mutex::new(r_rx));

        let mut handles = Vec::new();
        for _ in 0..self.max_workers {
            let this = Arc::clone(self);
            let rx = Arc::clone(&t_rx);
            let r_tx_for_trigger = r_tx.clone();
            handles.push(thread::spawn(move || this.transcription_worker(rx, r_tx_for_trigger)));
        }

        {
            let this = Arc::clone(self);
            let rx = Arc::clone(&r_rx);
            handles.push(thread::spawn(move || this.rough_cut_worker(rx)));
        }

        {
            let this = Arc::clone(self);
            handles.push(thread::spawn(move || this.directory_watcher()));
        }

        *self.handles.lock().unwrap() = handles;
    }

    /// Clears the running flag and waits (bounded) for queues to drain (§4.8).
    pub fn stop(&self) {
        self.shared.running.store(false, std::sync::atomic::Ordering::SeqCst);
        *self.transcription_tx.lock().unwrap() = None;
        *self.rough_cut_tx.lock().unwrap() = None;

        let deadline = std::time::Instant::now() + SHUTDOWN_DEADLINE;
        while std::time::Instant::now() < deadline {
            let drained = self
                .shared
                .transcription_jobs
                .lock()
                .unwrap()
                .values()
                .all(|j| !matches!(j.status, JobStatus::Pending | JobStatus::Running));
            if drained {
                break;
            }
            thread::sleep(Duration::from_millis(500));
        }
    }

    fn running(&self) -> bool {
        self.shared.running.load(std::sync::atomic::Ordering::SeqCst)
    }

    fn directory_watcher(&self) {
        while self.running() {
            let projects: Vec<(PathBuf, PathBuf)> = self
                .shared
                .watched_projects
                .lock()
                .unwrap()
                .iter()
                .map(|(p, f)| (p.clone(), f.clone()))
                .collect();

            for (project_path, footage_dir) in projects {
                if !footage_dir.exists() {
                    continue;
                }
                self.scan_and_queue(&footage_dir, &project_path);
            }
            thread::sleep(WATCHER_POLL_INTERVAL);
        }
    }

    fn transcription_worker(
        &self,
        rx: Arc<Mutex<mpsc::Receiver<TranscriptionJob>>>,
        rough_cut_tx: mpsc::Sender<RoughCutJob>,
    ) {
        while self.running() {
            let job = {
                let guard = rx.lock().unwrap();
                match guard.recv_timeout(QUEUE_RECV_TIMEOUT) {
                    Ok(job) => job,
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            };

            let key = job.video_file.to_string_lossy().to_string();
            let mut job = job;
            job.status = JobStatus::Running;
            job.started_at = Some(now_iso());
            self.shared.transcription_jobs.lock().unwrap().insert(key.clone(), job.clone());

            let result = self.transcription_service.transcribe(&job.video_file, "base", "auto");

            if result.success {
                job.status = JobStatus::Completed;
                job.completed_at = Some(now_iso());
                job.srt_path = result.srt_path.filter(|p| p.exists());
                job.json_path = result.json_path.filter(|p| p.exists());
            } else {
                job.status = JobStatus::Failed;
                job.completed_at = Some(now_iso());
                job.error = Some(result.error.unwrap_or_else(|| "transcription failed".to_string()));
            }
            self.shared.transcription_jobs.lock().unwrap().insert(key, job.clone());

            if job.status == JobStatus::Completed {
                if let Some(parent) = job.video_file.parent() {
                    self.check_rough_cut_trigger(&job.project_path, parent, &rough_cut_tx);
                }
            }
        }
    }

    /// A directory is eligible once every media file in it has both an SRT
    /// and a JSON transcript (§4.8).
    fn check_rough_cut_trigger(&self, project_path: &Path, footage_dir: &Path, tx: &mpsc::Sender<RoughCutJob>) {
        let videos = discover_video_files(footage_dir);
        if videos.is_empty() {
            return;
        }

        let mut all_transcribed = true;
        let mut has_markers = false;
        for video in &videos {
            let srt = srt_path_for(video);
            let json = json_path_for(video);
            if !srt.exists() || !json.exists() {
                all_transcribed = false;
                break;
            }
            if !has_markers {
                if let Ok(content) = std::fs::read_to_string(&json) {
                    if let Ok(transcript) = serde_json::from_str::<Transcript>(&content) {
                        if !detect_markers(&transcript).is_empty() {
                            has_markers = true;
                        }
                    }
                }
            }
        }

        if !all_transcribed {
            return;
        }

        let key = footage_dir.to_string_lossy().to_string();
        let mut jobs = self.shared.rough_cut_jobs.lock().unwrap();
        if jobs.contains_key(&key) {
            return;
        }
        let job = RoughCutJob {
            footage_dir: footage_dir.to_path_buf(),
            project_path: project_path.to_path_buf(),
            style: CutStyle::Doc,
            use_audio_markers: has_markers,
            status: JobStatus::Pending,
            created_at: now_iso(),
            started_at: None,
            completed_at: None,
            error: None,
            edl_path: None,
        };
        jobs.insert(key, job.clone());
        let _ = tx.send(job);
    }

    fn rough_cut_worker(&self, rx: Arc<Mutex<mpsc::Receiver<RoughCutJob>>>) {
        while self.running() {
            let job = {
                let guard = rx.lock().unwrap();
                match guard.recv_timeout(QUEUE_RECV_TIMEOUT) {
                    Ok(job) => job,
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            };

            let key = job.footage_dir.to_string_lossy().to_string();
            let mut job = job;
            job.status = JobStatus::Running;
            job.started_at = Some(now_iso());
            self.shared.rough_cut_jobs.lock().unwrap().insert(key.clone(), job.clone());

            match self.run_rough_cut_job(&job) {
                Ok(edl_path) => {
                    job.status = JobStatus::Completed;
                    job.completed_at = Some(now_iso());
                    job.edl_path = Some(edl_path);
                }
                Err(e) => {
                    error!("rough cut job failed for {}: {e}", job.footage_dir.display());
                    job.status = JobStatus::Failed;
                    job.completed_at = Some(now_iso());
                    job.error = Some(e.to_string());
                }
            }
            self.shared.rough_cut_jobs.lock().unwrap().insert(key, job);
        }
    }

    fn run_rough_cut_job(&self, job: &RoughCutJob) -> anyhow::Result<PathBuf> {
        // tutorial folds onto the episode pacing profile (§4.8), same as the
        // background trigger's style default.
        let cut_style = match job.style {
            CutStyle::Tutorial => CutStyle::Episode,
            other => other,
        };

        let videos = discover_video_files(&job.footage_dir);
        if videos.is_empty() {
            anyhow::bail!("no clips found in {}", job.footage_dir.display());
        }

        let mut analyzer = TranscriptAnalyzer::new();
        let mut engine = RoughCutEngine::new(ScoringConfig::default());
        let mut clips: Vec<ClipAnalysis> = Vec::new();
        for video in videos {
            let srt = srt_path_for(&video);
            let srt_content = std::fs::read_to_string(&srt).ok();
            let json = json_path_for(&video);
            let transcript = std::fs::read_to_string(&json)
                .ok()
                .and_then(|c| serde_json::from_str::<Transcript>(&c).ok());
            clips.push(analyze_clip(video, srt_content.as_deref(), transcript.as_ref(), &mut analyzer));
        }
        engine.clips = clips;
        engine.analyzer = analyzer;

        let use_smart = cut_style == CutStyle::Doc;
        let plan = engine.create_rough_cut(cut_style, None, use_smart, job.use_audio_markers)?;

        let output_dir = job.project_path.join("03_exports").join("rough_cuts");
        std::fs::create_dir_all(&output_dir)?;
        let edl_path = output_dir.join(format!("rough_cut_auto_{}.edl", job.style.as_str()));
        export_edl(&plan, &edl_path)?;
        Ok(edl_path)
    }

    pub fn status(&self) -> ServiceStatus {
        let transcription = self.shared.transcription_jobs.lock().unwrap();
        let rough_cut = self.shared.rough_cut_jobs.lock().unwrap();

        let mut t_counts = JobCounts::default();
        for job in transcription.values() {
            match job.status {
                JobStatus::Pending => t_counts.pending += 1,
                JobStatus::Running => t_counts.running += 1,
                JobStatus::Completed => t_counts.completed += 1,
                JobStatus::Failed => t_counts.failed += 1,
            }
        }
        let mut r_counts = JobCounts::default();
        for job in rough_cut.values() {
            match job.status {
                JobStatus::Pending => r_counts.pending += 1,
                JobStatus::Running => r_counts.running += 1,
                JobStatus::Completed => r_counts.completed += 1,
                JobStatus::Failed => r_counts.failed += 1,
            }
        }

        ServiceStatus {
            running: self.running(),
            watched_projects: self.shared.watched_projects.lock().unwrap().len(),
            transcription_pending: t_counts.pending,
            transcription_running: t_counts.running,
            transcription_completed: t_counts.completed,
            transcription_failed: t_counts.failed,
            rough_cut_pending: r_counts.pending,
            rough_cut_running: r_counts.running,
            rough_cut_completed: r_counts.completed,
            rough_cut_failed: r_counts.failed,
            transcription_queue_depth: transcription
                .values()
                .filter(|j| j.status == JobStatus::Pending)
                .count(),
            rough_cut_queue_depth: rough_cut.values().filter(|j| j.status == JobStatus::Pending).count(),
        }
    }

    pub fn job_details(&self) -> (Vec<TranscriptionJob>, Vec<RoughCutJob>) {
        let transcription = self.shared.transcription_jobs.lock().unwrap().values().cloned().collect();
        let rough_cut = self.shared.rough_cut_jobs.lock().unwrap().values().cloned().collect();
        (transcription, rough_cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubTranscriptionService;
    impl TranscriptionService for StubTranscriptionService {
        fn transcribe(&self, _audio_path: &Path, _model: &str, _language: &str) -> TranscriptionResult {
            TranscriptionResult { success: false, srt_path: None, json_path: None, error: Some("stub".into()) }
        }
    }

    #[test]
    fn test_needs_transcription_true_when_no_sidecars() {
        assert!(needs_transcription(Path::new("/tmp/definitely_missing_clip.mov")));
    }

    #[test]
    fn test_srt_and_json_sidecar_paths() {
        assert_eq!(srt_path_for(Path::new("/a/clip.mov")), PathBuf::from("/a/clip.srt"));
        assert_eq!(json_path_for(Path::new("/a/clip.mov")), PathBuf::from("/a/clip_transcript.json"));
    }

    #[test]
    fn test_status_reports_not_running_before_start() {
        let services = BackgroundServices::with_defaults(Arc::new(StubTranscriptionService));
        let status = services.status();
        assert!(!status.running);
        assert_eq!(status.watched_projects, 0);
    }

    #[test]
    fn test_rough_cut_trigger_requires_json_not_just_srt() {
        let dir = std::env::temp_dir().join(format!(
            "studioflow_test_trigger_{}_{}",
            std::process::id(),
            "srt_only"
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let video = dir.join("clip.mov");
        std::fs::write(&video, b"fake").unwrap();
        std::fs::write(srt_path_for(&video), "1\n00:00:00,000 --> 00:00:01,000\nhi\n").unwrap();
        // deliberately no _transcript.json sidecar

        let services = BackgroundServices::with_defaults(Arc::new(StubTranscriptionService));
        let (tx, _rx) = mpsc::channel();
        services.check_rough_cut_trigger(&dir, &dir, &tx);

        let (_, rough_cut_jobs) = services.job_details();
        assert!(rough_cut_jobs.is_empty());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_watch_project_registers_footage_dir() {
        let services = BackgroundServices::with_defaults(Arc::new(StubTranscriptionService));
        let project = PathBuf::from("/tmp/studioflow_test_project_unlikely_to_exist");
        services.watch_project(project.clone(), None);
        assert_eq!(services.status().watched_projects, 1);
        services.stop_watching(&project);
        assert_eq!(services.status().watched_projects, 0);
    }
}

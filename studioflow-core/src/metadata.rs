//! External collaborators for file probing and loudness normalization
//! (§6: "ffprobe/ffmpeg (collaborator)").
//!
//! All failures here are non-fatal by design (§7): a clip whose duration or
//! LUFS cannot be probed degrades gracefully rather than aborting a cut.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::mpsc;
use std::time::Duration;

use log::{debug, warn};
use serde::Deserialize;

const FFPROBE_TIMEOUT: Duration = Duration::from_secs(30);
const FFMPEG_CUT_TIMEOUT: Duration = Duration::from_secs(300);
const TARGET_LUFS: f64 = -14.0;
const LUFS_TOLERANCE: f64 = 0.5;

/// Runs `command` to completion off-thread and applies `timeout`, killing
/// the child on expiry (§5: "ffprobe probe 30s, cut 300s").
fn run_with_timeout(mut command: Command, timeout: Duration) -> Option<std::process::Output> {
    let mut child = command
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .spawn()
        .ok()?;

    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let result = child.wait_with_output();
        let _ = tx.send(result);
    });

    match rx.recv_timeout(timeout) {
        Ok(Ok(output)) => Some(output),
        // Either the child errored, or we hit the timeout and the waiter
        // thread is still blocked on it. Either way there is nothing more
        // to collect from here; the OS reclaims the child on exit.
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: Option<FfprobeFormat>,
}

/// Probes a media file's duration in seconds. Returns `0.0` (never an error)
/// when `ffprobe` is missing, times out, or the file is unreadable — the
/// clip still appears in analysis with `has_speech=false` per §7.
pub fn probe_duration(path: &Path) -> f64 {
    let mut cmd = Command::new("ffprobe");
    cmd.args([
        "-v",
        "quiet",
        "-print_format",
        "json",
        "-show_entries",
        "format=duration",
    ])
    .arg(path);

    let output = match run_with_timeout(cmd, FFPROBE_TIMEOUT) {
        Some(o) if o.status.success() => o,
        _ => {
            warn!("ffprobe duration probe failed for {}", path.display());
            return 0.0;
        }
    };

    serde_json::from_slice::<FfprobeOutput>(&output.stdout)
        .ok()
        .and_then(|v| v.format)
        .and_then(|f| f.duration)
        .and_then(|d| d.parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// Measures integrated loudness (LUFS) via ffmpeg's `loudnorm` filter in
/// measurement-only mode. Returns `None` on any failure.
pub fn measure_lufs(path: &Path) -> Option<f64> {
    let mut cmd = Command::new("ffmpeg");
    cmd.args(["-i"])
        .arg(path)
        .args(["-af", "loudnorm=print_format=json", "-f", "null", "-"]);

    let output = run_with_timeout(cmd, FFPROBE_TIMEOUT)?;
    let stderr = String::from_utf8_lossy(&output.stderr);
    parse_loudnorm_json(&stderr)
}

fn parse_loudnorm_json(stderr: &str) -> Option<f64> {
    let start = stderr.rfind('{')?;
    let end = stderr.rfind('}')?;
    if end <= start {
        return None;
    }
    let json = &stderr[start..=end];

    #[derive(Deserialize)]
    struct LoudnormReport {
        input_i: String,
    }

    let report: LoudnormReport = serde_json::from_str(json).ok()?;
    report.input_i.parse::<f64>().ok()
}

/// True when `path` is already within `LUFS_TOLERANCE` of `TARGET_LUFS`
/// (§4.6 LUFS side effect).
pub fn is_normalized(path: &Path) -> bool {
    measure_lufs(path)
        .map(|lufs| (lufs - TARGET_LUFS).abs() <= LUFS_TOLERANCE)
        .unwrap_or(true)
}

/// Sibling path a normalized copy of `path` would be written to:
/// `<stem>_normalized.<ext>`.
pub fn normalized_sibling(path: &Path) -> PathBuf {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("clip");
    let ext = path.extension().and_then(|s| s.to_str());
    let name = match ext {
        Some(ext) => format!("{stem}_normalized.{ext}"),
        None => format!("{stem}_normalized"),
    };
    path.with_file_name(name)
}

/// Writes a loudness-normalized sibling file targeting `TARGET_LUFS`,
/// returning its path on success. Returns `None` (never an error) if
/// normalization is unavailable — the caller falls back to the original
/// file per §4.6/§7.
pub fn normalize_audio(path: &Path) -> Option<PathBuf> {
    let out = normalized_sibling(path);
    let mut cmd = Command::new("ffmpeg");
    cmd.args(["-y", "-i"])
        .arg(path)
        .args(["-af", &format!("loudnorm=I={TARGET_LUFS}:TP=-1.5:LRA=11")])
        .arg(&out);

    match run_with_timeout(cmd, FFMPEG_CUT_TIMEOUT) {
        Some(o) if o.status.success() => Some(out),
        _ => {
            debug!("audio normalization unavailable for {}", path.display());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_sibling_name() {
        let p = normalized_sibling(Path::new("/a/clip.mov"));
        assert_eq!(p, PathBuf::from("/a/clip_normalized.mov"));
    }

    #[test]
    fn test_normalized_sibling_no_extension() {
        let p = normalized_sibling(Path::new("/a/clip"));
        assert_eq!(p, PathBuf::from("/a/clip_normalized"));
    }

    #[test]
    fn test_parse_loudnorm_json() {
        let stderr = "some ffmpeg banner\n{\n  \"input_i\" : \"-23.10\",\n  \"input_tp\" : \"-3.5\"\n}\ntrailer";
        assert_eq!(parse_loudnorm_json(stderr), Some(-23.10));
    }

    #[test]
    fn test_parse_loudnorm_json_missing() {
        assert_eq!(parse_loudnorm_json("no json here"), None);
    }
}

//! Timeline export (§4.7): EDL and FCPXML generation from a [`RoughCutPlan`].
//!
//! Produces industry-standard timeline formats for NLE import (Final Cut
//! Pro, DaVinci Resolve, Premiere Pro, etc.).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use log::info;

use crate::models::{ClipAnalysis, RemovedSegment, RoughCutPlan, Segment};

const FPS: f64 = 30.0;

// ---------------------------------------------------------------------------
//  Helpers
// ---------------------------------------------------------------------------

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Rounds to the nearest frame. Used for the EDL/FCPXML convenience timecode
/// helper tests; the EDL body itself uses [`format_timecode_truncating`].
fn seconds_to_timecode(seconds: f64, fps: f64) -> String {
    let total_frames = (seconds * fps).round() as i64;
    format_frames(total_frames, fps)
}

/// Truncating timecode (§4.7): `frames = floor((seconds % 1) * fps)`. This
/// differs deliberately from [`seconds_to_timecode`]'s rounding — the EDL
/// body needs in/out points that never round past a source frame boundary.
fn format_timecode_truncating(seconds: f64, fps: f64) -> String {
    let seconds = seconds.max(0.0);
    let whole = seconds.floor() as i64;
    let frames = ((seconds - seconds.floor()) * fps) as i64;
    let total_frames = whole * fps.round() as i64 + frames;
    format_frames(total_frames, fps)
}

fn format_frames(total_frames: i64, fps: f64) -> String {
    let fps_i = fps.round() as i64;
    let frames = total_frames.rem_euclid(fps_i);
    let total_seconds = total_frames / fps_i;
    let secs = total_seconds % 60;
    let mins = (total_seconds / 60) % 60;
    let hours = total_seconds / 3600;
    format!("{hours:02}:{mins:02}:{secs:02}:{frames:02}")
}

fn sanitize_edl_reel(name: &str) -> String {
    let clean: String = name.chars().filter(|c| c.is_alphanumeric() || *c == '_').take(8).collect();
    if clean.is_empty() {
        "AX".to_string()
    } else {
        clean
    }
}

fn clip_duration(clips: &[ClipAnalysis], path: &Path) -> f64 {
    clips.iter().find(|c| c.file_path == path).map(|c| c.duration).unwrap_or(0.0)
}

struct Handles {
    pre: f64,
    post: f64,
}

fn widened_range(seg: &Segment, clip_dur: f64, handles: &Handles) -> (f64, f64) {
    let start = (seg.start_time - handles.pre).max(0.0);
    let end = if clip_dur > 0.0 { (seg.end_time + handles.post).min(clip_dur) } else { seg.end_time + handles.post };
    (start, end)
}

// ---------------------------------------------------------------------------
//  EDL (§4.7)
// ---------------------------------------------------------------------------

/// Writes a CMX-style EDL: one numbered event per segment, source in/out and
/// record in/out widened by the style's pre/post handles.
pub fn export_edl(plan: &RoughCutPlan, output_path: &Path) -> Result<()> {
    let handles = Handles { pre: crate::models::style_profile(plan.style).pre_handle, post: crate::models::style_profile(plan.style).post_handle };

    let mut lines = Vec::new();
    lines.push("TITLE: StudioFlow Rough Cut".to_string());
    lines.push("FCM: NON-DROP FRAME".to_string());
    lines.push(String::new());

    let mut timeline_position = 0.0;
    for (i, seg) in plan.segments.iter().enumerate() {
        let dur = clip_duration(&plan.clips, &seg.source_file);
        let (src_in, src_out) = widened_range(seg, dur, &handles);
        let rec_in = timeline_position;
        let rec_out = timeline_position + (src_out - src_in);

        let reel = seg
            .source_file
            .file_stem()
            .and_then(|s| s.to_str())
            .map(sanitize_edl_reel)
            .unwrap_or_else(|| "AX".to_string());

        lines.push(format!(
            "{:03}  {:<8}  V  C  {} {} {} {}",
            i + 1,
            reel,
            format_timecode_truncating(src_in, FPS),
            format_timecode_truncating(src_out, FPS),
            format_timecode_truncating(rec_in, FPS),
            format_timecode_truncating(rec_out, FPS),
        ));

        let clip_name = seg.source_file.file_stem().and_then(|s| s.to_str()).unwrap_or("clip");
        lines.push(format!("* FROM CLIP NAME: {clip_name}"));
        if !seg.text.is_empty() {
            let comment: String = seg.text.chars().take(50).collect();
            lines.push(format!("* COMMENT: {comment}"));
        }
        if let Some(topic) = &seg.topic {
            lines.push(format!("* TOPIC: {topic}"));
        }
        if seg.segment_type != "content" {
            lines.push(format!("* TYPE: {}", seg.segment_type));
        }
        lines.push(String::new());

        timeline_position = rec_out;
    }

    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(output_path, lines.join("\n"))?;
    info!("EDL exported: {}", output_path.display());
    Ok(())
}

/// Parallel exporter (§4.7): every [`RemovedSegment`] with its reason and
/// score recorded as a comment, so discarded footage stays reviewable.
pub fn export_removed_footage_edl(plan: &RoughCutPlan, output_path: &Path) -> Result<()> {
    let mut lines = Vec::new();
    lines.push("TITLE: StudioFlow Removed Footage".to_string());
    lines.push("FCM: NON-DROP FRAME".to_string());
    lines.push(String::new());

    if plan.removed_segments.is_empty() {
        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(output_path, lines.join("\n"))?;
        info!("removed-footage EDL exported (empty): {}", output_path.display());
        return Ok(());
    }

    let mut sorted: Vec<&RemovedSegment> = plan.removed_segments.iter().collect();
    sorted.sort_by(|a, b| {
        (&a.segment.source_file, a.segment.start_time)
            .partial_cmp(&(&b.segment.source_file, b.segment.start_time))
            .unwrap()
    });

    for (i, removed) in sorted.iter().enumerate() {
        let seg = &removed.segment;
        let dur = clip_duration(&plan.clips, &seg.source_file);
        let src_in = seg.start_time.max(0.0);
        let src_out = if dur > 0.0 { seg.end_time.min(dur) } else { seg.end_time };

        let reel = seg
            .source_file
            .file_stem()
            .and_then(|s| s.to_str())
            .map(sanitize_edl_reel)
            .unwrap_or_else(|| "AX".to_string());

        lines.push(format!(
            "{:03}  {:<8}  V  C  {} {} {} {}",
            i + 1,
            reel,
            format_timecode_truncating(src_in, FPS),
            format_timecode_truncating(src_out, FPS),
            format_timecode_truncating(src_in, FPS),
            format_timecode_truncating(src_out, FPS),
        ));
        let clip_name = seg.source_file.file_stem().and_then(|s| s.to_str()).unwrap_or("clip");
        lines.push(format!("* FROM CLIP NAME: {clip_name}"));
        lines.push(format!("* REASON: {}", removed.reason.as_str()));
        lines.push(format!("* SCORE: {:.2}", removed.original_score));
        lines.push(String::new());
    }

    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(output_path, lines.join("\n"))?;
    info!("removed-footage EDL exported: {}", output_path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
//  FCPXML v1.9 (§4.7)
// ---------------------------------------------------------------------------

pub fn export_fcpxml(plan: &RoughCutPlan, output_path: &Path) -> Result<()> {
    let mut xml = String::new();
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<!DOCTYPE fcpxml>\n");
    xml.push_str("<fcpxml version=\"1.9\">\n");
    xml.push_str("  <resources>\n");
    xml.push_str(
        "    <format id=\"r1\" name=\"FFVideoFormat1080p30\" frameDuration=\"1001/30000s\" width=\"1920\" height=\"1080\"/>\n",
    );

    let mut asset_ids: HashMap<PathBuf, String> = HashMap::new();
    for (i, clip) in plan.clips.iter().enumerate() {
        let asset_id = format!("asset{i}");
        let name = clip.file_path.file_stem().and_then(|s| s.to_str()).unwrap_or("clip");
        xml.push_str(&format!(
            "    <asset id=\"{}\" name=\"{}\" src=\"file://{}\" format=\"r1\"/>\n",
            asset_id,
            escape_xml(name),
            escape_xml(&clip.file_path.to_string_lossy()),
        ));
        asset_ids.insert(clip.file_path.clone(), asset_id);
    }
    xml.push_str("  </resources>\n");

    xml.push_str("  <library>\n");
    xml.push_str("    <event name=\"StudioFlow Rough Cut\">\n");
    xml.push_str(&format!("      <project name=\"Rough Cut - {}\">\n", plan.style.as_str()));
    xml.push_str(&format!(
        "        <sequence format=\"r1\" duration=\"{}/30000s\">\n",
        (plan.total_duration * 30000.0) as i64
    ));
    xml.push_str("          <spine>\n");

    let mut offset = 0.0;
    for seg in &plan.segments {
        let Some(asset_id) = asset_ids.get(&seg.source_file) else {
            continue;
        };
        let duration = seg.duration();
        let name = seg.source_file.file_stem().and_then(|s| s.to_str()).unwrap_or("clip");

        xml.push_str(&format!(
            "            <asset-clip ref=\"{}\" name=\"{}\" offset=\"{}/30000s\" duration=\"{}/30000s\" start=\"{}/30000s\">\n",
            asset_id,
            escape_xml(name),
            (offset * 30000.0) as i64,
            (duration * 30000.0) as i64,
            (seg.start_time * 30000.0) as i64,
        ));

        let mut note_parts = Vec::new();
        if let Some(topic) = &seg.topic {
            note_parts.push(format!("Topic: {topic}"));
        }
        if seg.segment_type != "content" {
            note_parts.push(format!("Type: {}", seg.segment_type));
        }
        if !seg.text.is_empty() {
            let truncated: String = seg.text.chars().take(100).collect();
            note_parts.push(format!("Text: {truncated}"));
        }
        if !note_parts.is_empty() {
            xml.push_str(&format!("              <note>{}</note>\n", escape_xml(&note_parts.join(" | "))));
        }
        xml.push_str("            </asset-clip>\n");

        offset += duration;
    }

    xml.push_str("          </spine>\n");
    xml.push_str("        </sequence>\n");
    xml.push_str("      </project>\n");
    xml.push_str("    </event>\n");
    xml.push_str("  </library>\n");
    xml.push_str("</fcpxml>\n");

    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(output_path, &xml)?;
    info!("FCPXML exported: {}", output_path.display());
    Ok(())
}

/// Human-readable plan summary (§4.7 companion report): style, total
/// duration, per-section breakdown, and a top-5-by-score preview.
pub fn summarize_plan(plan: &RoughCutPlan) -> String {
    let mut out = String::new();
    out.push_str(&format!("Style: {}\n", plan.style.as_str()));
    out.push_str(&format!(
        "Total duration: {:.1}s ({:.1} min)\n",
        plan.total_duration,
        plan.total_duration / 60.0
    ));
    out.push_str(&format!("Segments: {}\n", plan.segments.len()));
    out.push_str(&format!("Clips: {}\n", plan.clips.len()));

    out.push_str("\nSections:\n");
    for (name, indices) in &plan.structure {
        let section_duration: f64 = indices.iter().map(|&i| plan.segments[i].duration()).sum();
        out.push_str(&format!("  {name}: {} segment(s), {:.1}s\n", indices.len(), section_duration));
    }

    let mut top: Vec<&Segment> = plan.segments.iter().collect();
    top.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
    out.push_str("\nTop segments:\n");
    for seg in top.into_iter().take(5) {
        let preview: String = seg.text.chars().take(60).collect();
        out.push_str(&format!("  [{:.2}] {}\n", seg.score, preview));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CutStyle, RemovedReason};
    use std::path::PathBuf;

    #[test]
    fn test_timecode_rounds() {
        assert_eq!(seconds_to_timecode(0.0, 30.0), "00:00:00:00");
        assert_eq!(seconds_to_timecode(61.5, 30.0), "00:01:01:15");
    }

    #[test]
    fn test_timecode_truncates() {
        // 1.999s at 30fps should truncate to frame 29, not round up to 2s.
        assert_eq!(format_timecode_truncating(1.999, 30.0), "00:00:01:29");
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a<b>c&d"), "a&lt;b&gt;c&amp;d");
    }

    #[test]
    fn test_sanitize_reel() {
        assert_eq!(sanitize_edl_reel("CamA_001.mp4"), "CamA_001");
        assert_eq!(sanitize_edl_reel(""), "AX");
    }

    fn sample_plan() -> RoughCutPlan {
        let seg = Segment {
            source_file: PathBuf::from("clip_a.mov"),
            start_time: 1.0,
            end_time: 5.0,
            text: "hello there".to_string(),
            speaker: None,
            topic: Some("intro".to_string()),
            score: 0.8,
            segment_type: "content".to_string(),
            marker_info: None,
        };
        let mut clip = ClipAnalysis::new(PathBuf::from("clip_a.mov"));
        clip.duration = 30.0;
        RoughCutPlan {
            style: CutStyle::Doc,
            clips: vec![clip],
            segments: vec![seg],
            total_duration: 4.0,
            structure: vec![("main_story".to_string(), vec![0])],
            themes: Vec::new(),
            narrative_arc: Default::default(),
            removed_segments: vec![RemovedSegment {
                segment: Segment {
                    source_file: PathBuf::from("clip_a.mov"),
                    start_time: 10.0,
                    end_time: 11.0,
                    text: String::new(),
                    speaker: None,
                    topic: None,
                    score: 0.1,
                    segment_type: "content".to_string(),
                    marker_info: None,
                },
                reason: RemovedReason::LowScore,
                original_score: 0.1,
            }],
        }
    }

    #[test]
    fn test_export_edl_writes_header_and_event() {
        let dir = std::env::temp_dir().join(format!("studioflow_test_edl_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("cut.edl");
        let plan = sample_plan();
        export_edl(&plan, &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("TITLE: StudioFlow Rough Cut"));
        assert!(content.contains("001"));
        assert!(content.contains("* FROM CLIP NAME: clip_a"));
    }

    #[test]
    fn test_export_removed_footage_edl_includes_reason() {
        let dir = std::env::temp_dir().join(format!("studioflow_test_removed_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("removed.edl");
        let plan = sample_plan();
        export_removed_footage_edl(&plan, &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("low_score"));
    }

    #[test]
    fn test_summarize_plan_includes_section_and_top_segment() {
        let plan = sample_plan();
        let summary = summarize_plan(&plan);
        assert!(summary.contains("main_story"));
        assert!(summary.contains("hello there"));
    }
}

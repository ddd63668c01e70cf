//! Subtitle output in SRT and WebVTT formats.

use std::path::Path;

use reelwright_common::ReelResult;
use reelwright_model::CaptionCue;

use crate::blocks::{parse_blocks, SubtitleBlock};
use crate::timestamp::{format_timestamp, secs_to_ms, Separator};

/// Generate SRT content from cues.
pub fn generate_srt(cues: &[CaptionCue]) -> String {
    let blocks: Vec<SubtitleBlock> = cues.iter().map(cue_block).collect();
    emit_srt(&blocks)
}

/// Generate WebVTT content from cues.
pub fn generate_vtt(cues: &[CaptionCue]) -> String {
    let blocks: Vec<SubtitleBlock> = cues.iter().map(cue_block).collect();
    emit_vtt(&blocks)
}

/// Re-emit a WebVTT (period separator) source as SRT: sequential indices
/// from 1, comma separators, original text lines kept.
pub fn vtt_to_srt(source: &str) -> String {
    emit_srt(&parse_blocks(source))
}

/// Re-emit an SRT source as WebVTT.
pub fn srt_to_vtt(source: &str) -> String {
    emit_vtt(&parse_blocks(source))
}

/// Write cues as an SRT file, e.g. for the subtitle-burn filter.
pub fn write_srt(cues: &[CaptionCue], path: &Path) -> ReelResult<()> {
    std::fs::write(path, generate_srt(cues))?;
    tracing::debug!(path = %path.display(), cues = cues.len(), "Wrote SRT");
    Ok(())
}

fn cue_block(cue: &CaptionCue) -> SubtitleBlock {
    SubtitleBlock {
        start_ms: secs_to_ms(cue.start_secs),
        end_ms: secs_to_ms(cue.end_secs),
        lines: cue.text.lines().map(str::to_string).collect(),
    }
}

fn emit_srt(blocks: &[SubtitleBlock]) -> String {
    let mut output = String::new();

    for (i, block) in blocks.iter().enumerate() {
        if i > 0 {
            output.push('\n');
        }
        output.push_str(&format!("{}\n", i + 1));
        push_block(&mut output, block, Separator::Comma);
    }

    output
}

fn emit_vtt(blocks: &[SubtitleBlock]) -> String {
    let mut output = String::from("WEBVTT\n");

    for block in blocks {
        output.push('\n');
        push_block(&mut output, block, Separator::Period);
    }

    output
}

fn push_block(output: &mut String, block: &SubtitleBlock, separator: Separator) {
    output.push_str(&format!(
        "{} --> {}\n",
        format_timestamp(block.start_ms, separator),
        format_timestamp(block.end_ms, separator),
    ));
    for line in &block.lines {
        output.push_str(line);
        output.push('\n');
    }
}

//! Block subtitle parsing (WebVTT and SRT).
//!
//! A source is a sequence of blank-line separated blocks. Each usable block
//! has a `start --> end` line followed by one or more text lines. Anything
//! before the time line (an SRT index, a WebVTT cue identifier, the
//! `WEBVTT` header) is ignored.

use reelwright_model::CaptionCue;

use crate::timestamp::{ms_to_secs, parse_time_range};

/// One timed block with its original text lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleBlock {
    pub start_ms: u64,
    pub end_ms: u64,
    pub lines: Vec<String>,
}

impl SubtitleBlock {
    /// Text lines joined with a single space.
    pub fn joined_text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn to_cue(&self) -> CaptionCue {
        CaptionCue::new(
            ms_to_secs(self.start_ms),
            ms_to_secs(self.end_ms),
            self.joined_text(),
        )
    }
}

/// Parse every block that has a valid time range and at least one
/// non-blank text line. Blocks are returned in source order.
pub fn parse_blocks(source: &str) -> Vec<SubtitleBlock> {
    let source = source.trim_start_matches('\u{feff}');
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in source.lines() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            if let Some(block) = parse_block(&current) {
                blocks.push(block);
            }
            current.clear();
        } else {
            current.push(line);
        }
    }
    if let Some(block) = parse_block(&current) {
        blocks.push(block);
    }

    blocks
}

fn parse_block(lines: &[&str]) -> Option<SubtitleBlock> {
    let time_pos = lines.iter().position(|l| l.contains("-->"))?;
    let (start_ms, end_ms) = parse_time_range(lines[time_pos])?;

    let text: Vec<String> = lines[time_pos + 1..]
        .iter()
        .map(|l| l.trim_end().to_string())
        .collect();
    if text.iter().all(|l| l.trim().is_empty()) {
        return None;
    }

    Some(SubtitleBlock {
        start_ms,
        end_ms,
        lines: text,
    })
}

/// Parse block text straight to cues, in source order.
pub fn cues_from_blocks(source: &str) -> Vec<CaptionCue> {
    parse_blocks(source).iter().map(SubtitleBlock::to_cue).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const VTT: &str = "WEBVTT\n\n\
        intro\n\
        00:00:00.000 --> 00:00:01.500\n\
        Meet the fan\n\
        that whispers.\n\n\
        00:00:01.500 --> 00:00:03.000 align:middle\n\
        Three speeds.\n";

    #[test]
    fn test_parse_vtt_blocks() {
        let blocks = parse_blocks(VTT);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].start_ms, 0);
        assert_eq!(blocks[0].end_ms, 1500);
        assert_eq!(blocks[0].lines, vec!["Meet the fan", "that whispers."]);
        assert_eq!(blocks[0].joined_text(), "Meet the fan that whispers.");
        assert_eq!(blocks[1].to_cue(), CaptionCue::new(1.5, 3.0, "Three speeds."));
    }

    #[test]
    fn test_parse_srt_with_indices_and_crlf() {
        let srt = "1\r\n00:00:01,000 --> 00:00:02,000\r\nHello\r\n\r\n2\r\n00:00:02,000 --> 00:00:04,250\r\nWorld\r\n";
        let cues = cues_from_blocks(srt);
        assert_eq!(
            cues,
            vec![
                CaptionCue::new(1.0, 2.0, "Hello"),
                CaptionCue::new(2.0, 4.25, "World"),
            ]
        );
    }

    #[test]
    fn test_invalid_blocks_dropped() {
        let source = "WEBVTT\n\nNOTE a comment\n\n\
            00:00:01.000 --> nonsense\nbroken\n\n\
            00:00:02.000 --> 00:00:03.000\n\n\
            00:00:04.000 --> 00:00:05.000\nkept\n";
        let blocks = parse_blocks(source);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].lines, vec!["kept"]);
    }

    #[test]
    fn test_header_without_blank_line() {
        let source = "WEBVTT\n00:00:00.500 --> 00:00:01.000\nHi\n";
        assert_eq!(cues_from_blocks(source), vec![CaptionCue::new(0.5, 1.0, "Hi")]);
    }
}

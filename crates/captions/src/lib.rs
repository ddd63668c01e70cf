//! Reelwright Captions
//!
//! Turns timed-caption sources into one normalized cue list:
//! - **Tick events:** JSON sentence-boundary events in 100 ns ticks
//! - **Block subtitles:** WebVTT and SRT text
//! - **Conversion:** WebVTT ⇄ SRT re-emission and SRT output for burning
//!
//! Every source is reduced to `CaptionCue`s sorted by start time, with
//! duplicates removed and overlaps resolved.

pub mod blocks;
pub mod normalize;
pub mod source;
pub mod subtitles;
pub mod ticks;
pub mod timestamp;

pub use blocks::{cues_from_blocks, parse_blocks, SubtitleBlock};
pub use normalize::normalize_cues;
pub use source::{load_caption_source, parse_caption_text, CaptionFormat};
pub use subtitles::{generate_srt, generate_vtt, srt_to_vtt, vtt_to_srt, write_srt};
pub use ticks::{cues_from_ticks, parse_tick_events, TickEvent};

//! Reelwright Processing Core
//!
//! Pure timing and text logic that feeds the render plan:
//! - **Duration:** Clamp the narration length and split it across slides
//! - **Script:** Build the narration text handed to a TTS service
//!
//! No I/O happens here. All inputs are data; all outputs are data.

pub mod duration;
pub mod script;

pub use duration::{build_timeline, resolve_duration, ResolvedDuration, MAX_SLIDES};
pub use script::{build_script, NarrationScript};

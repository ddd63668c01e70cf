//! Reelwright Data Model
//!
//! Defines the core data contracts for a reel:
//! - **Assets:** Normalized still images and the narration track
//! - **Cues:** Timed caption units
//! - **Timeline:** Contiguous slides covering the program length
//! - **Style:** Caption, logo, and music mix options
//! - **Job:** The job file tying inputs, style, and output together
//!
//! All times are in seconds as `f64` unless a name says otherwise.

pub mod asset;
pub mod cue;
pub mod job;
pub mod style;
pub mod timeline;

pub use asset::*;
pub use cue::*;
pub use job::*;
pub use style::*;
pub use timeline::*;

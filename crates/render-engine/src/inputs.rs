//! Encoder input roles and their numeric indices.
//!
//! The encoder receives inputs in a fixed role order: every image, then the
//! narration, then music and logo when present. Indices are looked up from
//! the role list, never written down as numbers, so an absent optional input
//! cannot shift a later one onto the wrong stream.

use std::fmt;
use std::path::PathBuf;

use reelwright_common::{ReelError, ReelResult};
use serde::{Deserialize, Serialize};

/// What an encoder input is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputRole {
    /// Slide image at the given timeline position.
    Image(usize),
    Narration,
    Music,
    Logo,
}

impl fmt::Display for InputRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputRole::Image(i) => write!(f, "image {i}"),
            InputRole::Narration => f.write_str("narration"),
            InputRole::Music => f.write_str("music"),
            InputRole::Logo => f.write_str("logo"),
        }
    }
}

/// Ordered role list; a role's index is its position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputIndexTable {
    roles: Vec<InputRole>,
}

impl InputIndexTable {
    /// Build the table in the standard order: images, narration, then
    /// music and logo if present.
    pub fn standard(image_count: usize, has_music: bool, has_logo: bool) -> Self {
        let mut roles: Vec<InputRole> = (0..image_count).map(InputRole::Image).collect();
        roles.push(InputRole::Narration);
        if has_music {
            roles.push(InputRole::Music);
        }
        if has_logo {
            roles.push(InputRole::Logo);
        }
        Self { roles }
    }

    pub fn index_of(&self, role: InputRole) -> Option<usize> {
        self.roles.iter().position(|r| *r == role)
    }

    /// Index of a role that must be present.
    pub fn require(&self, role: InputRole) -> ReelResult<usize> {
        self.index_of(role)
            .ok_or_else(|| ReelError::plan(format!("input role {role} missing from index table")))
    }

    pub fn roles(&self) -> &[InputRole] {
        &self.roles
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    pub fn image_count(&self) -> usize {
        self.roles
            .iter()
            .filter(|r| matches!(r, InputRole::Image(_)))
            .count()
    }
}

/// One encoder input and how it is read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanInput {
    pub role: InputRole,
    pub path: PathBuf,

    /// Read a still image as a looping video stream.
    pub loop_still: bool,

    /// Repeat the input indefinitely (music beds shorter than the program).
    pub stream_loop: bool,

    /// Read at most this many seconds.
    pub duration_secs: Option<f64>,
}

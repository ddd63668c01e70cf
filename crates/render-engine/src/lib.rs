//! Reelwright Render Engine
//!
//! Compiles a timeline and its optional overlays into a render plan and
//! hands it to an encoder.
//!
//! # Plan Architecture
//!
//! ```text
//! slide-0.jpg ── scale/pad/setsar ──┐
//! slide-1.jpg ── scale/pad/setsar ──┼── concat ── subtitles? ── overlay? ── [vout]
//! slide-N.jpg ── scale/pad/setsar ──┘                             │
//!                                                   logo.png ─────┘
//!
//! narration ───────────────────────┬── amix? ── [aout]
//! music ── volume ─────────────────┘
//! ```
//!
//! The thumbnail compositor draws the companion 1280x720 still from the
//! first slide.

pub mod compiler;
pub mod export;
pub mod graph;
pub mod inputs;
pub mod pipeline;
pub mod thumbnail;

pub use compiler::{compile_plan, CaptionTrack, CompileRequest, PlanWarning, RenderPlan};
pub use export::*;
pub use graph::{escape_filter_path, Filter, FilterGraph, Node, StreamKind, StreamRef};
pub use inputs::{InputIndexTable, InputRole, PlanInput};
pub use pipeline::{run_pipeline, RunOptions, RunReport, RunWarning};
pub use thumbnail::{
    compose_thumbnail, load_font, render_thumbnail, wrap_title, FontMeasure, TextMeasure,
    ThumbnailOutcome, ThumbnailSpec,
};

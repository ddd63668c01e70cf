//! Render plan compiler.
//!
//! Turns a timeline, the narration, optional captions, music and logo, and a
//! style into a [`RenderPlan`]: the encoder inputs in role order plus a
//! validated filter graph. Compilation is pure; nothing here touches the
//! filesystem.

use std::fmt;
use std::path::{Path, PathBuf};

use reelwright_common::{ReelError, ReelResult};
use reelwright_model::{CaptionStyle, LogoCorner, NarrationTrack, OutputSpec, StyleConfig, Timeline};
use serde::Serialize;

use crate::graph::{fmt_num, Filter, FilterGraph, StreamRef};
use crate::inputs::{InputIndexTable, InputRole, PlanInput};

/// Final video label in every plan.
pub const VIDEO_OUT: &str = "vout";
/// Final audio label when music is mixed in.
pub const AUDIO_OUT: &str = "aout";

/// A cue file ready for the subtitle-burn node.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionTrack {
    /// SRT file with normalized cues.
    pub path: PathBuf,
    pub cue_count: usize,
}

/// Everything the compiler needs for one reel.
#[derive(Debug, Clone)]
pub struct CompileRequest<'a> {
    pub timeline: &'a Timeline,
    pub narration: &'a NarrationTrack,
    pub captions: Option<&'a CaptionTrack>,
    pub music: Option<&'a Path>,
    pub logo: Option<&'a Path>,
    pub style: &'a StyleConfig,
    pub output: OutputSpec,
    pub output_path: &'a Path,
}

/// Non-fatal conditions noticed while compiling.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlanWarning {
    /// Captions were enabled but no usable cue file was supplied.
    CaptionsUnavailable { reason: String },
    /// The logo did not fit the frame at its configured width.
    LogoWidthClamped { requested: u32, applied: u32 },
}

impl fmt::Display for PlanWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanWarning::CaptionsUnavailable { reason } => {
                write!(f, "captions omitted: {reason}")
            }
            PlanWarning::LogoWidthClamped { requested, applied } => {
                write!(f, "logo width {requested}px clamped to {applied}px")
            }
        }
    }
}

/// A complete composition job for the encoder.
#[derive(Debug, Clone, Serialize)]
pub struct RenderPlan {
    pub inputs: Vec<PlanInput>,
    pub index: InputIndexTable,
    pub graph: FilterGraph,
    pub video_out: StreamRef,
    pub audio_out: StreamRef,
    pub total_secs: f64,
    pub per_slide_secs: f64,
    pub narration_secs: f64,
    pub output: OutputSpec,
    pub output_path: PathBuf,
    pub warnings: Vec<PlanWarning>,
}

impl RenderPlan {
    pub fn filter_complex(&self) -> String {
        self.graph.to_filter_complex()
    }

    pub fn has_captions(&self) -> bool {
        self.graph
            .find(|f| matches!(f, Filter::SubtitleBurn { .. }))
            .is_some()
    }

    pub fn input_for(&self, role: InputRole) -> Option<&PlanInput> {
        self.inputs.iter().find(|input| input.role == role)
    }
}

/// Compile a render plan.
///
/// Fails with `InsufficientAssets` when the timeline has no slides and with
/// `PlanCompilation` when the produced graph does not validate.
pub fn compile_plan(request: &CompileRequest<'_>) -> ReelResult<RenderPlan> {
    let timeline = request.timeline;
    if timeline.is_empty() {
        return Err(ReelError::insufficient_assets(
            "cannot compile a plan without images",
        ));
    }
    timeline.check_invariants().map_err(ReelError::plan)?;

    let output = request.output;
    let style = request.style;
    let per_slide = timeline.per_slide_secs();
    let mut warnings = Vec::new();

    let index = InputIndexTable::standard(
        timeline.len(),
        request.music.is_some(),
        request.logo.is_some(),
    );
    let inputs = plan_inputs(request, &index, per_slide);
    let mut graph = FilterGraph::new();

    let mut segments = Vec::with_capacity(timeline.len());
    for ordinal in 0..timeline.len() {
        let input = index.require(InputRole::Image(ordinal))?;
        let scaled = graph.push(
            vec![StreamRef::video(input)],
            Filter::Scale {
                width: output.width,
                height: output.height,
            },
            &format!("s{ordinal}"),
        );
        let padded = graph.push(
            vec![scaled],
            Filter::Pad {
                width: output.width,
                height: output.height,
                color: "black".to_string(),
            },
            &format!("p{ordinal}"),
        );
        segments.push(graph.push(
            vec![padded],
            Filter::SetAspect { num: 1, den: 1 },
            &format!("v{ordinal}"),
        ));
    }

    let captions = match request.captions {
        Some(track) if style.captions.enabled && track.cue_count > 0 => Some(track),
        Some(_) if style.captions.enabled => {
            warnings.push(PlanWarning::CaptionsUnavailable {
                reason: "caption source has no cues".to_string(),
            });
            None
        }
        None if style.captions.enabled => {
            warnings.push(PlanWarning::CaptionsUnavailable {
                reason: "no caption source supplied".to_string(),
            });
            None
        }
        _ => None,
    };
    let has_logo = request.logo.is_some();

    let concat_label = if captions.is_none() && !has_logo {
        VIDEO_OUT
    } else {
        "slides"
    };
    let mut video = graph.push(
        segments,
        Filter::Concat {
            segments: timeline.len(),
            video: 1,
            audio: 0,
        },
        concat_label,
    );

    if let Some(track) = captions {
        let label = if has_logo { "captioned" } else { VIDEO_OUT };
        video = graph.push(
            vec![video],
            Filter::SubtitleBurn {
                path: track.path.clone(),
                force_style: force_style(&style.captions),
            },
            label,
        );
    }

    if has_logo {
        let logo_input = index.require(InputRole::Logo)?;
        let requested = style.logo.width;
        let (applied, max_height) = style.logo.fit_box(output.width, output.height);
        if applied != requested {
            warnings.push(PlanWarning::LogoWidthClamped { requested, applied });
        }
        let scaled = graph.push(
            vec![StreamRef::video(logo_input)],
            Filter::Scale {
                width: applied,
                height: max_height,
            },
            "logo_scaled",
        );
        let faded = graph.push(
            vec![scaled],
            Filter::Opacity {
                alpha: style.logo.opacity.clamp(0.0, 1.0),
            },
            "logo",
        );
        let (x, y) = logo_position(style.logo.corner, style.logo.margin);
        video = graph.push(vec![video, faded], Filter::Overlay { x, y }, VIDEO_OUT);
    }

    let narration_input = index.require(InputRole::Narration)?;
    let audio = match index.index_of(InputRole::Music) {
        Some(music_input) => {
            let bed = graph.push(
                vec![StreamRef::audio(music_input)],
                Filter::VolumeAdjust {
                    gain: style.music.volume,
                },
                "music",
            );
            graph.push(
                vec![StreamRef::audio(narration_input), bed],
                Filter::AudioMix {
                    inputs: 2,
                    dropout_transition_secs: style.music.dropout_transition_secs,
                },
                AUDIO_OUT,
            )
        }
        None => StreamRef::audio(narration_input),
    };

    graph.validate(index.len(), &[&video, &audio])?;

    tracing::debug!(
        images = index.image_count(),
        inputs = index.len(),
        nodes = graph.len(),
        captions = captions.is_some(),
        logo = has_logo,
        music = request.music.is_some(),
        "Render plan compiled"
    );

    Ok(RenderPlan {
        inputs,
        index,
        graph,
        video_out: video,
        audio_out: audio,
        total_secs: timeline.total_secs,
        per_slide_secs: per_slide,
        narration_secs: request.narration.duration_secs,
        output,
        output_path: request.output_path.to_path_buf(),
        warnings,
    })
}

fn plan_inputs(
    request: &CompileRequest<'_>,
    index: &InputIndexTable,
    per_slide: f64,
) -> Vec<PlanInput> {
    index
        .roles()
        .iter()
        .map(|role| match role {
            InputRole::Image(ordinal) => PlanInput {
                role: *role,
                path: request.timeline.slides[*ordinal].asset.path.clone(),
                loop_still: true,
                stream_loop: false,
                duration_secs: Some(per_slide),
            },
            InputRole::Narration => PlanInput {
                role: *role,
                path: request.narration.path.clone(),
                loop_still: false,
                stream_loop: false,
                duration_secs: None,
            },
            InputRole::Music => PlanInput {
                role: *role,
                path: request.music.map(Path::to_path_buf).unwrap_or_default(),
                loop_still: false,
                stream_loop: true,
                duration_secs: None,
            },
            InputRole::Logo => PlanInput {
                role: *role,
                path: request.logo.map(Path::to_path_buf).unwrap_or_default(),
                loop_still: false,
                stream_loop: false,
                duration_secs: None,
            },
        })
        .collect()
}

/// libass style overrides for the subtitle-burn node.
pub fn force_style(style: &CaptionStyle) -> String {
    let mut parts = vec![
        format!("FontSize={}", style.font_size),
        format!("Alignment={}", style.alignment.ass_code()),
        format!("Outline={}", fmt_num(style.outline_width.max(0.0))),
        format!("MarginV={}", style.margin_v),
    ];
    let opacity = style.background_opacity.clamp(0.0, 1.0);
    if opacity > 0.0 {
        // ASS alpha runs the other way: 00 is opaque, FF transparent.
        let alpha = ((1.0 - opacity) * 255.0).round() as u8;
        parts.push("BorderStyle=3".to_string());
        parts.push(format!("BackColour=&H{alpha:02X}000000"));
        parts.push(format!("OutlineColour=&H{alpha:02X}000000"));
    } else {
        parts.push("BorderStyle=1".to_string());
    }
    parts.join(",")
}

/// Overlay position expressions for a corner, clamped so the logo stays
/// inside the frame even when the margin is too large.
pub fn logo_position(corner: LogoCorner, margin: u32) -> (String, String) {
    let x = if corner.is_left() {
        format!("{margin}")
    } else {
        format!("W-w-{margin}")
    };
    let y = if corner.is_top() {
        format!("{margin}")
    } else {
        format!("H-h-{margin}")
    };
    (
        format!("min(max({x},0),W-w)"),
        format!("min(max({y},0),H-h)"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use reelwright_model::{CaptionAlignment, MediaAsset};

    fn timeline(n: usize) -> Timeline {
        let assets = (0..n)
            .map(|i| MediaAsset::new(format!("/run/slide-{i}.jpg"), i, format!("p{i}.jpg")))
            .collect();
        let total = 25.0;
        Timeline::contiguous(assets, total / n as f64, total)
    }

    fn compile(
        n: usize,
        captions: Option<&CaptionTrack>,
        music: bool,
        logo: bool,
        style: &StyleConfig,
    ) -> ReelResult<RenderPlan> {
        let timeline = timeline(n);
        let narration = NarrationTrack::new("/job/voice.mp3", 25.0);
        let music_path = PathBuf::from("/job/bed.mp3");
        let logo_path = PathBuf::from("/job/logo.png");
        compile_plan(&CompileRequest {
            timeline: &timeline,
            narration: &narration,
            captions,
            music: music.then_some(music_path.as_path()),
            logo: logo.then_some(logo_path.as_path()),
            style,
            output: OutputSpec::default(),
            output_path: Path::new("/out/reel.mp4"),
        })
    }

    #[test]
    fn test_minimal_plan() {
        let plan = compile(1, None, false, false, &StyleConfig::default()).unwrap();
        assert_eq!(
            plan.filter_complex(),
            "[0:v]scale=1080:1920:force_original_aspect_ratio=decrease[s0];\
             [s0]pad=1080:1920:(ow-iw)/2:(oh-ih)/2:color=black[p0];\
             [p0]setsar=1[v0];\
             [v0]concat=n=1:v=1:a=0[vout]"
        );
        assert_eq!(plan.video_out, StreamRef::label(VIDEO_OUT));
        assert_eq!(plan.audio_out, StreamRef::audio(1));
        assert!(plan.warnings.is_empty());
    }

    #[test]
    fn test_full_plan_indices() {
        let style = StyleConfig::default();
        let plan = compile(5, None, true, true, &style).unwrap();

        assert_eq!(plan.index.require(InputRole::Narration).unwrap(), 5);
        assert_eq!(plan.index.require(InputRole::Music).unwrap(), 6);
        assert_eq!(plan.index.require(InputRole::Logo).unwrap(), 7);

        let graph = plan.filter_complex();
        assert!(graph.contains("[6:a]volume=0.15[music]"));
        assert!(graph.contains("[5:a][music]amix=inputs=2:duration=first:dropout_transition=2:normalize=0[aout]"));
        assert!(graph.contains("[7:v]scale=220:1864:force_original_aspect_ratio=decrease[logo_scaled]"));
        assert!(graph.contains("[slides][logo]overlay="));
        assert_eq!(plan.audio_out, StreamRef::label(AUDIO_OUT));

        let music = plan.input_for(InputRole::Music).unwrap();
        assert!(music.stream_loop);
        let slide = plan.input_for(InputRole::Image(4)).unwrap();
        assert!(slide.loop_still);
        assert!((slide.duration_secs.unwrap() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_logo_without_music() {
        let plan = compile(2, None, false, true, &StyleConfig::default()).unwrap();
        assert!(plan.filter_complex().contains("[3:v]scale=220:1864:force_original_aspect_ratio=decrease"));
        assert_eq!(plan.audio_out, StreamRef::audio(2));
    }

    #[test]
    fn test_captions_burned_when_enabled() {
        let mut style = StyleConfig::default();
        style.captions.enabled = true;
        let track = CaptionTrack {
            path: PathBuf::from("/run/captions.srt"),
            cue_count: 4,
        };
        let plan = compile(3, Some(&track), false, false, &style).unwrap();
        assert!(plan.has_captions());
        assert!(plan
            .filter_complex()
            .contains("[slides]subtitles=/run/captions.srt:force_style='FontSize=48,Alignment=2"));
        assert_eq!(plan.video_out, StreamRef::label(VIDEO_OUT));
    }

    #[test]
    fn test_captions_disabled_ignores_track() {
        let track = CaptionTrack {
            path: PathBuf::from("/run/captions.srt"),
            cue_count: 4,
        };
        let plan = compile(3, Some(&track), false, false, &StyleConfig::default()).unwrap();
        assert!(!plan.has_captions());
        assert!(plan.warnings.is_empty());
    }

    #[test]
    fn test_captions_requested_without_source_warns() {
        let mut style = StyleConfig::default();
        style.captions.enabled = true;
        let plan = compile(2, None, false, false, &style).unwrap();
        assert!(!plan.has_captions());
        assert!(matches!(
            plan.warnings.as_slice(),
            [PlanWarning::CaptionsUnavailable { .. }]
        ));

        let empty = CaptionTrack {
            path: PathBuf::from("/run/captions.srt"),
            cue_count: 0,
        };
        let plan = compile(2, Some(&empty), false, false, &style).unwrap();
        assert!(!plan.has_captions());
        assert_eq!(plan.warnings.len(), 1);
    }

    #[test]
    fn test_zero_images_is_insufficient_assets() {
        let err = compile(0, None, false, false, &StyleConfig::default()).unwrap_err();
        assert!(matches!(err, ReelError::InsufficientAssets { .. }));
    }

    #[test]
    fn test_logo_width_clamped() {
        let mut style = StyleConfig::default();
        style.logo.width = 5000;
        let plan = compile(1, None, false, true, &style).unwrap();
        assert!(plan.warnings.contains(&PlanWarning::LogoWidthClamped {
            requested: 5000,
            applied: 1080 - 2 * 28,
        }));
    }

    #[test]
    fn test_tall_logo_bounded_by_frame_height() {
        let mut style = StyleConfig::default();
        style.logo.margin = 100;
        let plan = compile(1, None, false, true, &style).unwrap();
        let node = plan
            .graph
            .nodes
            .iter()
            .find(|n| n.output == "logo_scaled")
            .unwrap();
        match &node.filter {
            Filter::Scale { width, height } => {
                assert_eq!(*width, 220);
                assert_eq!(*height, 1920 - 2 * 100);
                assert!(*height + 2 * style.logo.margin <= 1920);
            }
            other => panic!("unexpected logo filter {other:?}"),
        }
        assert!(plan
            .filter_complex()
            .contains("[2:v]scale=220:1720:force_original_aspect_ratio=decrease[logo_scaled]"));
    }

    #[test]
    fn test_logo_position_expressions() {
        let (x, y) = logo_position(LogoCorner::TopRight, 28);
        assert_eq!(x, "min(max(W-w-28,0),W-w)");
        assert_eq!(y, "min(max(28,0),H-h)");
        let (x, y) = logo_position(LogoCorner::BottomLeft, 10);
        assert_eq!(x, "min(max(10,0),W-w)");
        assert_eq!(y, "min(max(H-h-10,0),H-h)");
    }

    #[test]
    fn test_force_style_background_box() {
        let mut style = CaptionStyle::default();
        assert!(force_style(&style).ends_with("BorderStyle=1"));
        style.background_opacity = 0.5;
        style.alignment = CaptionAlignment::TopCenter;
        let text = force_style(&style);
        assert!(text.contains("Alignment=8"));
        assert!(text.contains("BorderStyle=3"));
        assert!(text.contains("BackColour=&H80000000"));
    }

    proptest! {
        #[test]
        fn plan_graph_always_validates(
            n in 1usize..=5,
            music in any::<bool>(),
            logo in any::<bool>(),
            captions in any::<bool>(),
        ) {
            let mut style = StyleConfig::default();
            style.captions.enabled = captions;
            let track = CaptionTrack { path: PathBuf::from("/run/c.srt"), cue_count: 2 };
            let plan = compile(n, Some(&track), music, logo, &style).unwrap();

            prop_assert_eq!(plan.inputs.len(), n + 1 + usize::from(music) + usize::from(logo));
            prop_assert_eq!(plan.index.index_of(InputRole::Narration), Some(n));
            prop_assert_eq!(
                plan.index.index_of(InputRole::Logo),
                logo.then_some(n + 1 + usize::from(music))
            );
            prop_assert_eq!(plan.has_captions(), captions);
            prop_assert_eq!(&plan.video_out, &StreamRef::label(VIDEO_OUT));
            for (i, input) in plan.inputs.iter().enumerate() {
                prop_assert_eq!(plan.index.index_of(input.role), Some(i));
            }
            prop_assert!(plan.graph.validate(plan.index.len(), &[&plan.video_out, &plan.audio_out]).is_ok());
        }
    }
}

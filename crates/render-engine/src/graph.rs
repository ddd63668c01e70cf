//! Typed ffmpeg filter graph.
//!
//! Nodes are built as data and serialized to `-filter_complex` syntax in one
//! place, so option escaping and label wiring can be checked before the
//! encoder ever sees them.

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use reelwright_common::{ReelError, ReelResult};
use serde::{Deserialize, Serialize};

/// Media type of an input stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    Video,
    Audio,
}

/// A stream a node reads or the plan outputs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamRef {
    /// A stream of an encoder input, e.g. `3:a`.
    Input { index: usize, kind: StreamKind },
    /// The output of another node.
    Label(String),
}

impl StreamRef {
    pub fn video(index: usize) -> Self {
        StreamRef::Input {
            index,
            kind: StreamKind::Video,
        }
    }

    pub fn audio(index: usize) -> Self {
        StreamRef::Input {
            index,
            kind: StreamKind::Audio,
        }
    }

    pub fn label(name: impl Into<String>) -> Self {
        StreamRef::Label(name.into())
    }

    /// Form used with `-map`: `[label]` or `index:kind`.
    pub fn map_arg(&self) -> String {
        match self {
            StreamRef::Label(name) => format!("[{name}]"),
            input => input.to_string(),
        }
    }
}

impl fmt::Display for StreamRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamRef::Input { index, kind } => {
                let suffix = match kind {
                    StreamKind::Video => 'v',
                    StreamKind::Audio => 'a',
                };
                write!(f, "{index}:{suffix}")
            }
            StreamRef::Label(name) => f.write_str(name),
        }
    }
}

/// A filter operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Filter {
    /// Scale to the largest size inside the box that keeps the source
    /// aspect ratio.
    Scale { width: u32, height: u32 },
    /// Pad to the frame with the content centered.
    Pad {
        width: u32,
        height: u32,
        color: String,
    },
    /// Set the sample (pixel) aspect ratio.
    SetAspect { num: u32, den: u32 },
    Concat {
        segments: usize,
        video: usize,
        audio: usize,
    },
    SubtitleBurn {
        path: PathBuf,
        force_style: String,
    },
    /// Multiply the alpha channel.
    Opacity { alpha: f64 },
    Overlay { x: String, y: String },
    VolumeAdjust { gain: f64 },
    /// Sum the inputs at their own gains. The first input decides the
    /// length of the mix.
    AudioMix {
        inputs: usize,
        dropout_transition_secs: f64,
    },
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Scale { width, height } => write!(
                f,
                "scale={width}:{height}:force_original_aspect_ratio=decrease"
            ),
            Filter::Pad {
                width,
                height,
                color,
            } => write!(f, "pad={width}:{height}:(ow-iw)/2:(oh-ih)/2:color={color}"),
            Filter::SetAspect { num, den } => {
                if *den == 1 {
                    write!(f, "setsar={num}")
                } else {
                    write!(f, "setsar={num}/{den}")
                }
            }
            Filter::Concat {
                segments,
                video,
                audio,
            } => write!(f, "concat=n={segments}:v={video}:a={audio}"),
            Filter::SubtitleBurn { path, force_style } => write!(
                f,
                "subtitles={}:force_style='{force_style}'",
                escape_filter_path(&path.to_string_lossy())
            ),
            Filter::Opacity { alpha } => {
                write!(f, "format=rgba,colorchannelmixer=aa={}", fmt_num(*alpha))
            }
            Filter::Overlay { x, y } => write!(f, "overlay=x='{x}':y='{y}'"),
            Filter::VolumeAdjust { gain } => write!(f, "volume={}", fmt_num(*gain)),
            Filter::AudioMix {
                inputs,
                dropout_transition_secs,
            } => write!(
                f,
                "amix=inputs={inputs}:duration=first:dropout_transition={}:normalize=0",
                fmt_num(*dropout_transition_secs)
            ),
        }
    }
}

/// Shortest decimal form with at most four fractional digits.
pub(crate) fn fmt_num(value: f64) -> String {
    let text = format!("{value:.4}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text.is_empty() || text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

/// Escape a path for use as a filter option value inside a filter graph.
///
/// Two levels apply: the option parser treats `\ ' :` specially, and the
/// graph parser then treats `\ ' [ ] , ;` specially.
pub fn escape_filter_path(path: &str) -> String {
    let mut option_level = String::with_capacity(path.len() + 8);
    for ch in path.chars() {
        if matches!(ch, '\\' | '\'' | ':') {
            option_level.push('\\');
        }
        option_level.push(ch);
    }

    let mut graph_level = String::with_capacity(option_level.len() + 8);
    for ch in option_level.chars() {
        if matches!(ch, '\\' | '\'' | '[' | ']' | ',' | ';') {
            graph_level.push('\\');
        }
        graph_level.push(ch);
    }
    graph_level
}

/// One filter application: `[inputs]filter[output]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub inputs: Vec<StreamRef>,
    pub filter: Filter,
    pub output: String,
}

impl Node {
    pub fn new(inputs: Vec<StreamRef>, filter: Filter, output: impl Into<String>) -> Self {
        Self {
            inputs,
            filter,
            output: output.into(),
        }
    }
}

/// Ordered list of nodes. Every node only reads streams produced by
/// earlier nodes or encoder inputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterGraph {
    pub nodes: Vec<Node>,
}

impl FilterGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node and return a reference to its output.
    pub fn push(&mut self, inputs: Vec<StreamRef>, filter: Filter, output: &str) -> StreamRef {
        self.nodes.push(Node::new(inputs, filter, output));
        StreamRef::label(output)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn find(&self, predicate: impl Fn(&Filter) -> bool) -> Option<&Node> {
        self.nodes.iter().find(|n| predicate(&n.filter))
    }

    /// Serialize as an ffmpeg `-filter_complex` argument.
    pub fn to_filter_complex(&self) -> String {
        self.nodes
            .iter()
            .map(|node| {
                let mut text = String::new();
                for input in &node.inputs {
                    text.push_str(&format!("[{input}]"));
                }
                text.push_str(&node.filter.to_string());
                text.push_str(&format!("[{}]", node.output));
                text
            })
            .collect::<Vec<_>>()
            .join(";")
    }

    /// Check the wiring: input indices in range, labels produced once and
    /// before use, every label consumed at most once, and every dangling
    /// label is one of `outputs`. Each output must exist.
    pub fn validate(&self, input_count: usize, outputs: &[&StreamRef]) -> ReelResult<()> {
        let mut produced: HashSet<&str> = HashSet::new();
        let mut consumed: HashSet<&str> = HashSet::new();
        let mut used_inputs: HashSet<(usize, StreamKind)> = HashSet::new();

        for node in &self.nodes {
            for input in &node.inputs {
                match input {
                    StreamRef::Input { index, kind } => {
                        if *index >= input_count {
                            return Err(ReelError::plan(format!(
                                "node [{}] reads input {index} but only {input_count} inputs exist",
                                node.output
                            )));
                        }
                        if !used_inputs.insert((*index, *kind)) {
                            return Err(ReelError::plan(format!(
                                "input stream {input} is read by more than one node"
                            )));
                        }
                    }
                    StreamRef::Label(label) => {
                        if !produced.contains(label.as_str()) {
                            return Err(ReelError::plan(format!(
                                "node [{}] reads [{label}] before it is produced",
                                node.output
                            )));
                        }
                        if !consumed.insert(label.as_str()) {
                            return Err(ReelError::plan(format!(
                                "label [{label}] is consumed more than once"
                            )));
                        }
                    }
                }
            }
            if !produced.insert(node.output.as_str()) {
                return Err(ReelError::plan(format!(
                    "label [{}] is produced more than once",
                    node.output
                )));
            }
        }

        let mut output_labels: HashSet<&str> = HashSet::new();
        for output in outputs {
            match output {
                StreamRef::Label(label) => {
                    if !produced.contains(label.as_str()) {
                        return Err(ReelError::plan(format!(
                            "output [{label}] is not produced by any node"
                        )));
                    }
                    if consumed.contains(label.as_str()) {
                        return Err(ReelError::plan(format!(
                            "output [{label}] is also consumed inside the graph"
                        )));
                    }
                    output_labels.insert(label.as_str());
                }
                StreamRef::Input { index, .. } => {
                    if *index >= input_count {
                        return Err(ReelError::plan(format!(
                            "output maps input {index} but only {input_count} inputs exist"
                        )));
                    }
                }
            }
        }

        if let Some(dangling) = produced
            .iter()
            .find(|label| !consumed.contains(*label) && !output_labels.contains(*label))
        {
            return Err(ReelError::plan(format!(
                "label [{dangling}] is produced but never used"
            )));
        }

        Ok(())
    }
}

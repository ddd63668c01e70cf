//! Encoder adapter: realizes a [`RenderPlan`] with ffmpeg.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use reelwright_common::{EncoderConfig, ReelError, ReelResult};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;

use crate::compiler::RenderPlan;
use crate::inputs::PlanInput;

/// Progress callback for encoding.
pub type ProgressCallback = Box<dyn Fn(RenderProgress) + Send + Sync>;

/// Encoding progress report.
#[derive(Debug, Clone)]
pub struct RenderProgress {
    /// Current progress [0.0, 1.0].
    pub progress: f64,

    /// Seconds of output written so far.
    pub out_time_secs: f64,

    /// Estimated time remaining in seconds.
    pub eta_secs: f64,

    pub stage: RenderStage,
}

/// Stages of the encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStage {
    Preparing,
    Encoding,
    Finalizing,
    Complete,
}

/// Something that can turn a plan into a video file.
pub trait RenderBackend: Send + Sync {
    /// Encode `plan` to `plan.output_path`.
    fn render(
        &self,
        plan: &RenderPlan,
        progress: Option<ProgressCallback>,
    ) -> impl Future<Output = ReelResult<()>> + Send;

    /// Check if this backend is available on the system.
    fn is_available(&self) -> impl Future<Output = bool> + Send;

    /// Backend name.
    fn name(&self) -> &str;
}

/// Runs the ffmpeg binary named in [`EncoderConfig`].
#[derive(Debug, Clone)]
pub struct FfmpegBackend {
    config: EncoderConfig,
}

impl FfmpegBackend {
    pub fn new(config: EncoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Full ffmpeg argument list for a plan.
    pub fn build_args(&self, plan: &RenderPlan) -> Vec<String> {
        let mut args: Vec<String> = [
            "-y",
            "-hide_banner",
            "-loglevel",
            "error",
            "-nostats",
            "-progress",
            "pipe:1",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        for input in &plan.inputs {
            args.extend(input_args(input, plan.output.fps));
        }

        args.push("-filter_complex".to_string());
        args.push(plan.filter_complex());
        args.push("-map".to_string());
        args.push(plan.video_out.map_arg());
        args.push("-map".to_string());
        args.push(plan.audio_out.map_arg());
        args.push("-r".to_string());
        args.push(plan.output.fps.to_string());
        args.push("-t".to_string());
        args.push(format!("{:.3}", plan.total_secs));

        args.extend(codec_args(&self.config));
        args.push(plan.output_path.to_string_lossy().into_owned());
        args
    }

    async fn run_ffmpeg(
        &self,
        plan: &RenderPlan,
        progress: Option<ProgressCallback>,
    ) -> ReelResult<()> {
        let args = self.build_args(plan);
        tracing::debug!(args = ?args, "Running ffmpeg");

        let mut child = Command::new(&self.config.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ReelError::render(format!("Failed to start {}: {e}", self.config.binary)))?;

        tracing::info!(
            pid = child.id(),
            args_len = args.len(),
            total_secs = plan.total_secs,
            "ffmpeg process started"
        );

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ReelError::render("Failed to capture ffmpeg stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ReelError::render("Failed to capture ffmpeg stderr"))?;

        // ffmpeg blocks once the stderr pipe fills, so drain it alongside.
        let stderr_task = tokio::spawn(async move {
            let mut output = String::new();
            let mut reader = BufReader::new(stderr);
            match reader.read_to_string(&mut output).await {
                Ok(_) => output,
                Err(err) => format!("<failed to read ffmpeg stderr: {err}>"),
            }
        });

        let start = Instant::now();
        let expected_secs = plan.total_secs;
        let watch = async {
            let mut lines = BufReader::new(stdout).lines();
            let mut state = ProgressState::default();
            while let Some(line) = lines
                .next_line()
                .await
                .map_err(|e| ReelError::render(format!("Failed reading ffmpeg progress: {e}")))?
            {
                let Some((key, value)) = line.trim().split_once('=') else {
                    continue;
                };
                state.update(key, value);
                if key == "progress" {
                    if let Some(cb) = &progress {
                        cb(progress_report(
                            &state,
                            expected_secs,
                            start.elapsed().as_secs_f64(),
                        ));
                    }
                }
            }
            child
                .wait()
                .await
                .map_err(|e| ReelError::render(format!("Failed to wait on ffmpeg: {e}")))
        };

        let status = match self.config.timeout_secs {
            Some(limit) => match tokio::time::timeout(Duration::from_secs(limit), watch).await {
                Ok(status) => status?,
                Err(_) => {
                    if let Err(err) = child.start_kill() {
                        tracing::warn!(error = %err, "Failed to kill timed-out ffmpeg");
                    }
                    if let Err(err) = child.wait().await {
                        tracing::warn!(error = %err, "Failed to reap timed-out ffmpeg");
                    }
                    stderr_task.abort();
                    return Err(ReelError::render(format!(
                        "ffmpeg exceeded the {limit}s encoder timeout and was killed"
                    )));
                }
            },
            None => watch.await?,
        };

        let stderr_output = stderr_task
            .await
            .unwrap_or_else(|_| "<failed to join stderr reader>".to_string());

        if !status.success() {
            return Err(ReelError::render(format!(
                "ffmpeg export failed (status {}): {}",
                status,
                stderr_output.trim()
            )));
        }

        if let Some(cb) = &progress {
            cb(RenderProgress {
                progress: 1.0,
                out_time_secs: expected_secs,
                eta_secs: 0.0,
                stage: RenderStage::Complete,
            });
        }

        Ok(())
    }
}

impl Default for FfmpegBackend {
    fn default() -> Self {
        Self::new(EncoderConfig::default())
    }
}

impl RenderBackend for FfmpegBackend {
    async fn render(&self, plan: &RenderPlan, progress: Option<ProgressCallback>) -> ReelResult<()> {
        let started = Instant::now();
        if let Some(parent) = plan.output_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        if let Some(cb) = &progress {
            cb(RenderProgress {
                progress: 0.0,
                out_time_secs: 0.0,
                eta_secs: 0.0,
                stage: RenderStage::Preparing,
            });
        }

        self.run_ffmpeg(plan, progress).await?;
        tracing::info!(
            output = %plan.output_path.display(),
            elapsed_secs = started.elapsed().as_secs_f64(),
            "Export finished"
        );
        Ok(())
    }

    async fn is_available(&self) -> bool {
        Command::new(&self.config.binary)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|status| status.success())
            .unwrap_or(false)
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

fn input_args(input: &PlanInput, fps: u32) -> Vec<String> {
    let mut args = Vec::new();
    if input.loop_still {
        args.extend(["-loop".to_string(), "1".to_string()]);
        args.extend(["-framerate".to_string(), fps.to_string()]);
    }
    if input.stream_loop {
        args.extend(["-stream_loop".to_string(), "-1".to_string()]);
    }
    if let Some(secs) = input.duration_secs {
        args.extend(["-t".to_string(), format!("{secs:.3}")]);
    }
    args.push("-i".to_string());
    args.push(input.path.to_string_lossy().into_owned());
    args
}

fn codec_args(config: &EncoderConfig) -> Vec<String> {
    vec![
        "-c:v".to_string(),
        "libx264".to_string(),
        "-preset".to_string(),
        config.preset.clone(),
        "-crf".to_string(),
        config.crf.to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-c:a".to_string(),
        "aac".to_string(),
        "-b:a".to_string(),
        format!("{}k", config.audio_bitrate_kbps),
        "-movflags".to_string(),
        "+faststart".to_string(),
    ]
}

/// Where the plan report for a video lives: `<stem>.plan.json` beside it.
pub fn plan_report_path(video: &Path) -> PathBuf {
    video.with_extension("plan.json")
}

/// Write the compiled plan and its filter graph as pretty JSON.
pub fn write_plan_report(plan: &RenderPlan, path: &Path) -> ReelResult<()> {
    let report = serde_json::json!({
        "output": plan.output_path,
        "total_secs": plan.total_secs,
        "per_slide_secs": plan.per_slide_secs,
        "narration_secs": plan.narration_secs,
        "filter_complex": plan.filter_complex(),
        "video_out": plan.video_out.map_arg(),
        "audio_out": plan.audio_out.map_arg(),
        "warnings": plan.warnings.iter().map(ToString::to_string).collect::<Vec<_>>(),
        "plan": plan,
    });
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(&report)?)?;
    tracing::info!(path = %path.display(), "Wrote render plan report");
    Ok(())
}

#[derive(Debug, Default)]
struct ProgressState {
    out_time_secs: f64,
    complete: bool,
}

impl ProgressState {
    fn update(&mut self, key: &str, value: &str) {
        match key {
            // ffmpeg reports microseconds under both names.
            "out_time_ms" | "out_time_us" => {
                if let Ok(us) = value.parse::<f64>() {
                    self.out_time_secs = us / 1_000_000.0;
                }
            }
            "progress" => {
                self.complete = value == "end";
            }
            _ => {}
        }
    }
}

fn progress_report(state: &ProgressState, expected_secs: f64, elapsed_secs: f64) -> RenderProgress {
    let progress = if expected_secs <= 0.0 {
        0.0
    } else {
        (state.out_time_secs / expected_secs).clamp(0.0, 1.0)
    };

    let eta_secs = if progress > 0.0 {
        (elapsed_secs / progress) - elapsed_secs
    } else {
        0.0
    }
    .max(0.0);

    RenderProgress {
        progress: if state.complete { 1.0 } else { progress },
        out_time_secs: state.out_time_secs,
        eta_secs,
        stage: if state.complete {
            RenderStage::Finalizing
        } else {
            RenderStage::Encoding
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{compile_plan, CompileRequest};
    use reelwright_model::{MediaAsset, NarrationTrack, OutputSpec, StyleConfig, Timeline};

    fn plan(music: bool) -> RenderPlan {
        let assets = (0..2)
            .map(|i| MediaAsset::new(format!("/run/slide-{i}.jpg"), i, "x"))
            .collect();
        let timeline = Timeline::contiguous(assets, 10.0, 20.0);
        let narration = NarrationTrack::new("/job/voice.mp3", 20.0);
        let bed = PathBuf::from("/job/bed.mp3");
        compile_plan(&CompileRequest {
            timeline: &timeline,
            narration: &narration,
            captions: None,
            music: music.then_some(bed.as_path()),
            logo: None,
            style: &StyleConfig::default(),
            output: OutputSpec::default(),
            output_path: Path::new("/out/reel.mp4"),
        })
        .unwrap()
    }

    fn position(args: &[String], needle: &str) -> usize {
        args.iter().position(|a| a == needle).unwrap()
    }

    #[test]
    fn test_build_args_layout() {
        let backend = FfmpegBackend::default();
        let args = backend.build_args(&plan(true));

        assert_eq!(&args[..3], ["-y", "-hide_banner", "-loglevel"]);
        assert_eq!(args.last().unwrap(), "/out/reel.mp4");

        let first_input = position(&args, "-i");
        assert_eq!(
            &args[first_input - 6..first_input + 2],
            ["-loop", "1", "-framerate", "30", "-t", "10.000", "-i", "/run/slide-0.jpg"]
        );
        let music = args.iter().position(|a| a == "/job/bed.mp3").unwrap();
        assert_eq!(&args[music - 3..music], ["-stream_loop", "-1", "-i"]);

        let map = position(&args, "-map");
        assert_eq!(args[map + 1], "[vout]");
        assert_eq!(args[map + 3], "[aout]");
        assert!(args.contains(&"+faststart".to_string()));
        assert!(args.contains(&"192k".to_string()));
    }

    #[test]
    fn test_narration_mapped_directly_without_music() {
        let args = FfmpegBackend::default().build_args(&plan(false));
        let map = args.iter().rposition(|a| a == "-map").unwrap();
        assert_eq!(args[map + 1], "2:a");
    }

    #[test]
    fn test_progress_report() {
        let mut state = ProgressState::default();
        state.update("out_time_us", "5000000");
        state.update("progress", "continue");
        let report = progress_report(&state, 20.0, 2.0);
        assert!((report.progress - 0.25).abs() < 1e-9);
        assert!((report.eta_secs - 6.0).abs() < 1e-9);
        assert_eq!(report.stage, RenderStage::Encoding);

        state.update("progress", "end");
        let report = progress_report(&state, 20.0, 8.0);
        assert_eq!(report.progress, 1.0);
        assert_eq!(report.stage, RenderStage::Finalizing);
    }

    #[test]
    fn test_plan_report_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = plan_report_path(&dir.path().join("reel.mp4"));
        assert!(path.to_string_lossy().ends_with("reel.plan.json"));
        write_plan_report(&plan(false), &path).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["video_out"], "[vout]");
        assert!(json["filter_complex"].as_str().unwrap().contains("concat=n=2"));
    }

    #[tokio::test]
    async fn test_missing_binary_is_unavailable() {
        let backend = FfmpegBackend::new(EncoderConfig {
            binary: "reelwright-no-such-encoder".to_string(),
            ..EncoderConfig::default()
        });
        assert!(!backend.is_available().await);

        let dir = tempfile::tempdir().unwrap();
        let mut plan = plan(false);
        plan.output_path = dir.path().join("reel.mp4");
        let err = backend.render(&plan, None).await.unwrap_err();
        assert!(matches!(err, ReelError::Render { .. }));
    }

    /// Write an executable shell script standing in for ffmpeg.
    #[cfg(unix)]
    fn fake_encoder(dir: &Path, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("fake-ffmpeg.sh");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_encoder_timeout_kills_process() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FfmpegBackend::new(EncoderConfig {
            binary: fake_encoder(dir.path(), "exec sleep 30"),
            timeout_secs: Some(1),
            ..EncoderConfig::default()
        });
        let mut plan = plan(false);
        plan.output_path = dir.path().join("out/reel.mp4");

        let started = Instant::now();
        let err = backend.render(&plan, None).await.unwrap_err();
        assert!(matches!(err, ReelError::Render { .. }));
        assert!(err.to_string().contains("timeout"), "{err}");
        assert!(started.elapsed() < Duration::from_secs(20));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_reports_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FfmpegBackend::new(EncoderConfig {
            binary: fake_encoder(dir.path(), "echo 'Invalid filter graph' >&2\nexit 3"),
            ..EncoderConfig::default()
        });
        let mut plan = plan(false);
        plan.output_path = dir.path().join("out/reel.mp4");

        let err = backend.render(&plan, None).await.unwrap_err();
        let message = err.to_string();
        assert!(matches!(err, ReelError::Render { .. }));
        assert!(message.contains("Invalid filter graph"), "{message}");
        assert!(message.contains('3'), "{message}");
    }
}

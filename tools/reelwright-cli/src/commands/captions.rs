//! Caption source utilities.

use std::path::PathBuf;

use reelwright_captions::{
    generate_srt, generate_vtt, load_caption_source, srt_to_vtt, vtt_to_srt, CaptionFormat,
};
use reelwright_model::CaptionCue;

pub fn convert(
    input: PathBuf,
    to: String,
    from: Option<String>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let target = match CaptionFormat::parse(&to) {
        Some(format @ (CaptionFormat::Srt | CaptionFormat::Vtt)) => format,
        _ => return Err(anyhow::anyhow!("Unknown target format: {to}. Use: srt, vtt")),
    };
    let source = match from.as_deref() {
        Some(name) => CaptionFormat::parse(name)
            .ok_or_else(|| anyhow::anyhow!("Unknown source format: {name}. Use: ticks, vtt, srt"))?,
        None => CaptionFormat::from_path(&input).ok_or_else(|| {
            anyhow::anyhow!("Cannot tell the format of {}; pass --from", input.display())
        })?,
    };

    // Block sources are re-emitted as written; tick events go through the
    // cue normalizer first.
    let text = match (source, target) {
        (CaptionFormat::Vtt, CaptionFormat::Srt) => vtt_to_srt(&std::fs::read_to_string(&input)?),
        (CaptionFormat::Srt, CaptionFormat::Vtt) => srt_to_vtt(&std::fs::read_to_string(&input)?),
        _ => {
            let cues = load_caption_source(&input, from.as_deref())?;
            match target {
                CaptionFormat::Vtt => generate_vtt(&cues),
                _ => generate_srt(&cues),
            }
        }
    };

    match output {
        Some(path) => {
            std::fs::write(&path, text)?;
            println!("Wrote {}", path.display());
        }
        None => print!("{text}"),
    }
    Ok(())
}

pub fn show(input: PathBuf, from: Option<String>, json: bool) -> anyhow::Result<()> {
    let cues = load_caption_source(&input, from.as_deref())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&cues)?);
        return Ok(());
    }

    println!("{} cue(s) in {}", cues.len(), input.display());
    for (i, cue) in cues.iter().enumerate() {
        println!("{}", cue_row(i + 1, cue));
    }
    Ok(())
}

fn cue_row(number: usize, cue: &CaptionCue) -> String {
    format!(
        "  {:>3}  {:>8.3} -> {:>8.3}  ({:>6.3}s)  {}",
        number,
        cue.start_secs,
        cue.end_secs,
        cue.duration_secs(),
        cue.text
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const VTT: &str = "WEBVTT\n\n00:00:01.000 --> 00:00:02.500\nHello there\n\n00:00:03.000 --> 00:00:04.000\nSecond line\n";

    #[test]
    fn test_convert_vtt_to_srt_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("voice.vtt");
        std::fs::write(&input, VTT).unwrap();
        let output = dir.path().join("voice.srt");

        convert(input, "srt".into(), None, Some(output.clone())).unwrap();
        let srt = std::fs::read_to_string(output).unwrap();
        assert!(srt.starts_with("1\n00:00:01,000 --> 00:00:02,500\nHello there\n"));
    }

    #[test]
    fn test_cue_row_shows_duration() {
        let cue = CaptionCue::new(1.0, 2.5, "Hello there");
        assert_eq!(cue_row(1, &cue), "    1     1.000 ->    2.500  ( 1.500s)  Hello there");
    }

    #[test]
    fn test_convert_rejects_unknown_target() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("voice.vtt");
        std::fs::write(&input, VTT).unwrap();
        assert!(convert(input, "ass".into(), None, None).is_err());
    }
}

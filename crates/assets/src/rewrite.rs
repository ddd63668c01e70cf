//! High-resolution reference rewriting.
//!
//! Product image CDNs encode the requested rendition in a modifier segment
//! just before the file extension, e.g. `71x._AC_SL320_.jpg`. Size tokens in
//! that segment below the target size are raised to it.

use std::sync::OnceLock;

use regex::Regex;

fn modifier_segment() -> &'static Regex {
    static SEGMENT_RE: OnceLock<Regex> = OnceLock::new();
    SEGMENT_RE.get_or_init(|| {
        Regex::new(r"\._([A-Za-z0-9_,]+?)_\.([A-Za-z0-9]+)(\?[^/]*)?$")
            .expect("modifier segment regex should compile")
    })
}

fn size_token() -> &'static Regex {
    static TOKEN_RE: OnceLock<Regex> = OnceLock::new();
    TOKEN_RE.get_or_init(|| {
        Regex::new(r"^(SL|SX|SY|UL|UX|UY|SR|SS)(\d+)(.*)$").expect("size token regex should compile")
    })
}

/// Rewrite `reference` to request at least `target_px` pixels.
///
/// Returns `None` when the reference has no modifier segment or no size
/// token below the target.
pub fn upscale_reference(reference: &str, target_px: u32) -> Option<String> {
    let captures = modifier_segment().captures(reference)?;
    let mods = captures.get(1)?;

    let mut changed = false;
    let rewritten: Vec<String> = mods
        .as_str()
        .split('_')
        .map(|token| match size_token().captures(token) {
            Some(parts) => {
                let size: u32 = parts[2].parse().unwrap_or(u32::MAX);
                if size < target_px {
                    changed = true;
                    format!("{}{}{}", &parts[1], target_px, &parts[3])
                } else {
                    token.to_string()
                }
            }
            None => token.to_string(),
        })
        .collect();

    if !changed {
        return None;
    }

    let mut out = String::with_capacity(reference.len() + 4);
    out.push_str(&reference[..mods.start()]);
    out.push_str(&rewritten.join("_"));
    out.push_str(&reference[mods.end()..]);
    Some(out)
}

/// References to try for one photo, in order: the upscaled rendition (when
/// enabled and different) and then the original.
pub fn candidate_references(reference: &str, upgrade: bool, target_px: u32) -> Vec<String> {
    let mut candidates = Vec::with_capacity(2);
    if upgrade {
        if let Some(upscaled) = upscale_reference(reference, target_px) {
            candidates.push(upscaled);
        }
    }
    candidates.push(reference.to_string());
    candidates
}

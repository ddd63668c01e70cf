//! Thumbnail compositor.
//!
//! Produces a 1280x720 still from the hero photo: a blurred fill background,
//! the photo fitted on top, a dark gradient across the bottom band, the
//! wrapped title in that band, and an optional brand badge in the top-right
//! corner.

use std::path::{Path, PathBuf};

use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use reelwright_common::{ReelError, ReelResult, ThumbnailConfig};

pub const THUMB_WIDTH: u32 = 1280;
pub const THUMB_HEIGHT: u32 = 720;

/// Share of the canvas width a title line may use.
pub const WRAP_WIDTH_RATIO: f32 = 0.92;
pub const MAX_TITLE_LINES: usize = 3;

const GRADIENT_HEIGHT_RATIO: f32 = 0.42;
const GRADIENT_MAX_ALPHA: f32 = 0.85;
const BACKGROUND_BLUR_SIGMA: f32 = 6.0;
const TITLE_PX: f32 = 64.0;
const LINE_GAP: u32 = 8;
const STROKE_PX: i32 = 3;
const BADGE_PX: f32 = 34.0;
const BADGE_PAD_X: u32 = 22;
const BADGE_PAD_Y: u32 = 12;
const BADGE_MARGIN: u32 = 28;
const BADGE_RADIUS: u32 = 14;
const BADGE_FILL: Rgba<u8> = Rgba([0, 0, 0, 170]);

/// Candidate system fonts, tried in order when no font is configured.
const FONT_SEARCH_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "/Library/Fonts/Arial Bold.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
];

/// Width and height of rendered text.
pub trait TextMeasure {
    fn text_width(&self, text: &str) -> u32;
    fn line_height(&self) -> u32;
}

/// Measures text with a real font at a fixed pixel size.
#[derive(Clone)]
pub struct FontMeasure<'a> {
    font: &'a FontArc,
    scale: PxScale,
}

impl<'a> FontMeasure<'a> {
    pub fn new(font: &'a FontArc, px: f32) -> Self {
        Self {
            font,
            scale: PxScale::from(px),
        }
    }
}

impl TextMeasure for FontMeasure<'_> {
    fn text_width(&self, text: &str) -> u32 {
        text_size(self.scale, self.font, text).0
    }

    fn line_height(&self) -> u32 {
        self.font.as_scaled(self.scale).height().ceil() as u32
    }
}

/// What goes on the thumbnail besides the photo.
#[derive(Debug, Clone, Default)]
pub struct ThumbnailSpec {
    pub title: String,
    pub brand: Option<String>,
}

/// Result of rendering a thumbnail.
#[derive(Debug, Clone)]
pub struct ThumbnailOutcome {
    pub path: PathBuf,
    /// False when no font was available and only the picture was drawn.
    pub text_drawn: bool,
}

/// Greedily wrap `title` into at most `max_lines` lines no wider than
/// `max_width`.
///
/// Words that do not fit after the last line are dropped. A word wider than
/// `max_width` on its own is broken between characters.
pub fn wrap_title(
    title: &str,
    measure: &impl TextMeasure,
    max_width: u32,
    max_lines: usize,
) -> Vec<String> {
    let mut pieces = Vec::new();
    for word in title.split_whitespace() {
        if measure.text_width(word) <= max_width {
            pieces.push(word.to_string());
        } else {
            pieces.extend(split_word(word, measure, max_width));
        }
    }

    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    for piece in pieces {
        if current.is_empty() {
            current = piece;
            continue;
        }
        let candidate = format!("{current} {piece}");
        if measure.text_width(&candidate) <= max_width {
            current = candidate;
        } else {
            lines.push(std::mem::replace(&mut current, piece));
            if lines.len() == max_lines {
                return lines;
            }
        }
    }
    if !current.is_empty() && lines.len() < max_lines {
        lines.push(current);
    }
    lines
}

fn split_word(word: &str, measure: &impl TextMeasure, max_width: u32) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut chunk = String::new();
    for ch in word.chars() {
        chunk.push(ch);
        if measure.text_width(&chunk) > max_width && chunk.chars().count() > 1 {
            chunk.pop();
            chunks.push(std::mem::take(&mut chunk));
            chunk.push(ch);
        }
    }
    if !chunk.is_empty() {
        chunks.push(chunk);
    }
    chunks
}

/// Load the configured font, or the first usable system font.
pub fn load_font(configured: Option<&Path>) -> Option<FontArc> {
    if let Some(path) = configured {
        match read_font(path) {
            Some(font) => return Some(font),
            None => tracing::warn!(path = %path.display(), "Configured font unusable, searching system fonts"),
        }
    }
    FONT_SEARCH_PATHS
        .iter()
        .map(Path::new)
        .filter(|p| p.exists())
        .find_map(read_font)
}

fn read_font(path: &Path) -> Option<FontArc> {
    let bytes = std::fs::read(path).ok()?;
    match FontArc::try_from_vec(bytes) {
        Ok(font) => {
            tracing::debug!(path = %path.display(), "Loaded thumbnail font");
            Some(font)
        }
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "Not a usable font");
            None
        }
    }
}

/// Compose the thumbnail in memory. Text is skipped when `font` is `None`.
pub fn compose_thumbnail(hero: &RgbImage, spec: &ThumbnailSpec, font: Option<&FontArc>) -> RgbImage {
    let hero = DynamicImage::ImageRgb8(hero.clone());

    let small = hero
        .resize_to_fill(THUMB_WIDTH / 4, THUMB_HEIGHT / 4, FilterType::Triangle)
        .to_rgb8();
    let blurred = imageproc::filter::gaussian_blur_f32(&small, BACKGROUND_BLUR_SIGMA);
    let mut canvas = imageops::resize(&blurred, THUMB_WIDTH, THUMB_HEIGHT, FilterType::Triangle);

    let foreground = hero.resize(THUMB_WIDTH, THUMB_HEIGHT, FilterType::Lanczos3).to_rgb8();
    let fx = (THUMB_WIDTH - foreground.width()) / 2;
    let fy = (THUMB_HEIGHT - foreground.height()) / 2;
    imageops::overlay(&mut canvas, &foreground, i64::from(fx), i64::from(fy));

    let band_top = draw_gradient(&mut canvas);

    if let Some(font) = font {
        draw_title(&mut canvas, &spec.title, font, band_top);
        if let Some(brand) = spec.brand.as_deref().map(str::trim).filter(|b| !b.is_empty()) {
            draw_badge(&mut canvas, brand, font);
        }
    }

    canvas
}

/// Darken the bottom band, returning its top row.
fn draw_gradient(canvas: &mut RgbImage) -> u32 {
    let (width, height) = canvas.dimensions();
    let band = ((height as f32) * GRADIENT_HEIGHT_RATIO).round() as u32;
    let top = height - band;
    let span = band.saturating_sub(1).max(1) as f32;

    for y in top..height {
        let alpha = GRADIENT_MAX_ALPHA * (y - top) as f32 / span;
        let keep = 1.0 - alpha;
        for x in 0..width {
            let pixel = canvas.get_pixel_mut(x, y);
            for channel in pixel.0.iter_mut() {
                *channel = (*channel as f32 * keep).round() as u8;
            }
        }
    }
    top
}

fn draw_title(canvas: &mut RgbImage, title: &str, font: &FontArc, band_top: u32) {
    let measure = FontMeasure::new(font, TITLE_PX);
    let max_width = (THUMB_WIDTH as f32 * WRAP_WIDTH_RATIO) as u32;
    let lines = wrap_title(title, &measure, max_width, MAX_TITLE_LINES);
    if lines.is_empty() {
        return;
    }

    let line_height = measure.line_height();
    let count = lines.len() as u32;
    let block = line_height * count + LINE_GAP * (count - 1);
    let band = THUMB_HEIGHT - band_top;
    let mut y = band_top as i32 + (band.saturating_sub(block) / 2) as i32;
    let scale = PxScale::from(TITLE_PX);

    for line in &lines {
        let x = (THUMB_WIDTH.saturating_sub(measure.text_width(line)) / 2) as i32;
        draw_stroked_text(canvas, line, font, scale, x, y);
        y += (line_height + LINE_GAP) as i32;
    }
}

fn draw_stroked_text(canvas: &mut RgbImage, text: &str, font: &FontArc, scale: PxScale, x: i32, y: i32) {
    for dx in -STROKE_PX..=STROKE_PX {
        for dy in -STROKE_PX..=STROKE_PX {
            if (dx, dy) != (0, 0) {
                draw_text_mut(canvas, Rgb([0, 0, 0]), x + dx, y + dy, scale, font, text);
            }
        }
    }
    draw_text_mut(canvas, Rgb([255, 255, 255]), x, y, scale, font, text);
}

fn draw_badge(canvas: &mut RgbImage, brand: &str, font: &FontArc) {
    let measure = FontMeasure::new(font, BADGE_PX);
    let max_text = THUMB_WIDTH - 2 * BADGE_MARGIN - 2 * BADGE_PAD_X;
    let brand = fit_text(brand, &measure, max_text);
    if brand.is_empty() {
        return;
    }
    let width = measure.text_width(&brand) + 2 * BADGE_PAD_X;
    let height = measure.line_height() + 2 * BADGE_PAD_Y;

    let layer = rounded_rect(width, height, BADGE_RADIUS, BADGE_FILL);
    let x = THUMB_WIDTH - BADGE_MARGIN - width;
    let y = BADGE_MARGIN;
    blend_layer(canvas, &layer, x, y);

    draw_text_mut(
        canvas,
        Rgb([255, 255, 255]),
        (x + BADGE_PAD_X) as i32,
        (y + BADGE_PAD_Y) as i32,
        PxScale::from(BADGE_PX),
        font,
        &brand,
    );
}

/// Shorten `text` with a trailing ellipsis until it is no wider than
/// `max_width`. Empty when not even the ellipsis fits.
fn fit_text(text: &str, measure: &impl TextMeasure, max_width: u32) -> String {
    if measure.text_width(text) <= max_width {
        return text.to_string();
    }
    let mut kept: Vec<char> = text.chars().collect();
    while !kept.is_empty() {
        kept.pop();
        let candidate = format!("{}...", kept.iter().collect::<String>().trim_end());
        if measure.text_width(&candidate) <= max_width {
            return candidate;
        }
    }
    String::new()
}

fn rounded_rect(width: u32, height: u32, radius: u32, fill: Rgba<u8>) -> RgbaImage {
    let mut layer = RgbaImage::new(width, height);
    let r = radius.min(width / 2).min(height / 2);
    if width > 2 * r {
        draw_filled_rect_mut(&mut layer, Rect::at(r as i32, 0).of_size(width - 2 * r, height), fill);
    }
    if height > 2 * r {
        draw_filled_rect_mut(&mut layer, Rect::at(0, r as i32).of_size(width, height - 2 * r), fill);
    }
    let (ri, wi, hi) = (r as i32, width as i32, height as i32);
    for (cx, cy) in [
        (ri, ri),
        (wi - 1 - ri, ri),
        (ri, hi - 1 - ri),
        (wi - 1 - ri, hi - 1 - ri),
    ] {
        draw_filled_circle_mut(&mut layer, (cx, cy), ri, fill);
    }
    layer
}

/// Alpha-blend an RGBA layer onto the canvas at (x, y).
fn blend_layer(canvas: &mut RgbImage, layer: &RgbaImage, x: u32, y: u32) {
    for (lx, ly, pixel) in layer.enumerate_pixels() {
        let (cx, cy) = (x + lx, y + ly);
        if cx >= canvas.width() || cy >= canvas.height() {
            continue;
        }
        let alpha = pixel.0[3] as f32 / 255.0;
        if alpha == 0.0 {
            continue;
        }
        let target = canvas.get_pixel_mut(cx, cy);
        for c in 0..3 {
            let blended = pixel.0[c] as f32 * alpha + target.0[c] as f32 * (1.0 - alpha);
            target.0[c] = blended.round() as u8;
        }
    }
}

/// Render the thumbnail for `hero` and write it as JPEG to `out`.
///
/// A hero that cannot be read or decoded is a `Thumbnail` error.
pub fn render_thumbnail(
    hero: &Path,
    spec: &ThumbnailSpec,
    config: &ThumbnailConfig,
    out: &Path,
) -> ReelResult<ThumbnailOutcome> {
    let bytes = std::fs::read(hero)
        .map_err(|e| ReelError::thumbnail(format!("cannot read hero {}: {e}", hero.display())))?;
    let hero_image = reelwright_assets::decode_upright_rgb(&bytes)
        .map_err(|e| ReelError::thumbnail(format!("cannot decode hero {}: {e}", hero.display())))?;

    let font = load_font(config.font_path.as_deref());
    if font.is_none() {
        tracing::warn!("No usable font found; thumbnail text skipped");
    }
    let canvas = compose_thumbnail(&hero_image, spec, font.as_ref());

    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(out)?;
    let mut writer = std::io::BufWriter::new(file);
    JpegEncoder::new_with_quality(&mut writer, config.jpeg_quality.clamp(1, 100))
        .encode_image(&canvas)
        .map_err(|e| ReelError::thumbnail(format!("JPEG encode failed: {e}")))?;

    tracing::info!(path = %out.display(), text = font.is_some(), "Thumbnail written");
    Ok(ThumbnailOutcome {
        path: out.to_path_buf(),
        text_drawn: font.is_some(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Every character is `advance` pixels wide.
    struct FixedMeasure {
        advance: u32,
    }

    impl TextMeasure for FixedMeasure {
        fn text_width(&self, text: &str) -> u32 {
            text.chars().count() as u32 * self.advance
        }

        fn line_height(&self) -> u32 {
            self.advance * 2
        }
    }

    #[test]
    fn test_wrap_greedy() {
        let m = FixedMeasure { advance: 10 };
        let lines = wrap_title("Ultra quiet desk fan with three speeds", &m, 120, 3);
        assert_eq!(lines, vec!["Ultra quiet", "desk fan", "with three"]);
    }

    #[test]
    fn test_wrap_fits_on_one_line() {
        let m = FixedMeasure { advance: 10 };
        assert_eq!(wrap_title("  Desk   fan ", &m, 1000, 3), vec!["Desk fan"]);
        assert!(wrap_title("   ", &m, 1000, 3).is_empty());
    }

    #[test]
    fn test_wrap_splits_long_word() {
        let m = FixedMeasure { advance: 10 };
        let lines = wrap_title("Supercalifragilistic", &m, 80, 3);
        assert_eq!(lines, vec!["Supercal", "ifragili", "stic"]);
    }

    fn fixture_font() -> FontArc {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../../fixtures/fonts/DejaVuSans-Bold.ttf");
        load_font(Some(path.as_path())).unwrap()
    }

    #[test]
    fn test_fit_text_truncates_long_brand() {
        let m = FixedMeasure { advance: 10 };
        assert_eq!(fit_text("Acme", &m, 100), "Acme");
        assert_eq!(fit_text("Acme Industrial Holdings", &m, 100), "Acme In...");
        assert_eq!(fit_text("Acme Industrial", &m, 20), "");
    }

    #[test]
    fn test_long_brand_badge_stays_on_canvas() {
        let font = fixture_font();
        let measure = FontMeasure::new(&font, BADGE_PX);
        let max_text = THUMB_WIDTH - 2 * BADGE_MARGIN - 2 * BADGE_PAD_X;
        let brand = "Extraordinarily Long Brand Name ".repeat(6);
        let fitted = fit_text(&brand, &measure, max_text);
        assert!(fitted.ends_with("..."));
        assert!(measure.text_width(&fitted) <= max_text);

        let hero = RgbImage::from_pixel(300, 200, Rgb([30, 120, 200]));
        let spec = ThumbnailSpec {
            title: "Fan".to_string(),
            brand: Some(brand),
        };
        let canvas = compose_thumbnail(&hero, &spec, Some(&font));
        assert_eq!(canvas.dimensions(), (THUMB_WIDTH, THUMB_HEIGHT));
    }

    #[test]
    fn test_font_measure_reports_real_widths() {
        let font = fixture_font();
        let measure = FontMeasure::new(&font, TITLE_PX);
        let narrow = measure.text_width("il");
        let wide = measure.text_width("WWWW");
        assert!(narrow > 0);
        assert!(wide > narrow);
        assert!(measure.line_height() >= TITLE_PX as u32 / 2);
    }

    #[test]
    fn test_render_with_configured_font_draws_text() {
        let dir = tempfile::tempdir().unwrap();
        let hero = dir.path().join("hero.png");
        RgbImage::from_pixel(300, 200, Rgb([30, 120, 200])).save(&hero).unwrap();
        let config = ThumbnailConfig {
            font_path: Some(
                PathBuf::from(env!("CARGO_MANIFEST_DIR"))
                    .join("../../fixtures/fonts/DejaVuSans-Bold.ttf"),
            ),
            ..ThumbnailConfig::default()
        };
        let spec = ThumbnailSpec {
            title: "Ultra Quiet Desk Fan".to_string(),
            brand: None,
        };
        let outcome = render_thumbnail(&hero, &spec, &config, &dir.path().join("t.jpg")).unwrap();
        assert!(outcome.text_drawn);
    }

    #[test]
    fn test_compose_without_font() {
        let hero = RgbImage::from_pixel(400, 800, Rgb([240, 240, 240]));
        let canvas = compose_thumbnail(&hero, &ThumbnailSpec::default(), None);
        assert_eq!(canvas.dimensions(), (THUMB_WIDTH, THUMB_HEIGHT));
        let top = canvas.get_pixel(THUMB_WIDTH / 2, 10).0[0];
        let bottom = canvas.get_pixel(THUMB_WIDTH / 2, THUMB_HEIGHT - 1).0[0];
        assert!(bottom < top / 2, "gradient should darken the bottom: {top} vs {bottom}");
    }

    #[test]
    fn test_rounded_rect_corners_transparent() {
        let layer = rounded_rect(100, 40, 14, BADGE_FILL);
        assert_eq!(layer.get_pixel(0, 0).0[3], 0);
        assert_eq!(layer.get_pixel(50, 20).0[3], BADGE_FILL.0[3]);
    }

    #[test]
    fn test_render_thumbnail_writes_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let hero = dir.path().join("hero.png");
        RgbImage::from_pixel(300, 200, Rgb([30, 120, 200])).save(&hero).unwrap();
        let out = dir.path().join("out/thumb.jpg");

        let spec = ThumbnailSpec {
            title: "Ultra Quiet Desk Fan".to_string(),
            brand: Some("Acme".to_string()),
        };
        let outcome = render_thumbnail(&hero, &spec, &ThumbnailConfig::default(), &out).unwrap();
        let written = image::open(&outcome.path).unwrap();
        assert_eq!((written.width(), written.height()), (THUMB_WIDTH, THUMB_HEIGHT));
    }

    #[test]
    fn test_bad_hero_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let hero = dir.path().join("hero.jpg");
        std::fs::write(&hero, b"not an image").unwrap();
        let err = render_thumbnail(
            &hero,
            &ThumbnailSpec::default(),
            &ThumbnailConfig::default(),
            &dir.path().join("t.jpg"),
        )
        .unwrap_err();
        assert!(matches!(err, ReelError::Thumbnail { .. }));
    }

    proptest! {
        #[test]
        fn wrapped_lines_respect_bounds(
            words in prop::collection::vec("[A-Za-z]{1,40}", 0..30),
            advance in 5u32..40,
        ) {
            let m = FixedMeasure { advance };
            let max_width = (THUMB_WIDTH as f32 * WRAP_WIDTH_RATIO) as u32;
            let lines = wrap_title(&words.join(" "), &m, max_width, MAX_TITLE_LINES);
            prop_assert!(lines.len() <= MAX_TITLE_LINES);
            for line in &lines {
                prop_assert!(m.text_width(line) <= max_width, "line too wide: {}", line);
                prop_assert!(!line.is_empty());
            }
        }

        #[test]
        fn font_wrapped_lines_fit_canvas(
            words in prop::collection::vec("[A-Za-z0-9&'-]{1,24}", 1..20),
            px in 24.0f32..120.0,
        ) {
            let font = fixture_font();
            let m = FontMeasure::new(&font, px);
            let max_width = (THUMB_WIDTH as f32 * WRAP_WIDTH_RATIO) as u32;
            let lines = wrap_title(&words.join(" "), &m, max_width, MAX_TITLE_LINES);
            prop_assert!(!lines.is_empty());
            prop_assert!(lines.len() <= MAX_TITLE_LINES);
            for line in &lines {
                prop_assert!(m.text_width(line) <= max_width, "line too wide: {}", line);
            }
        }
    }
}

//! SVG word clouds for topics.
//!
//! Words are placed heaviest first along an Archimedean spiral from the
//! canvas centre. A word that cannot be placed without overlap is skipped.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use sotong_core::Topic;

const PALETTE: &[&str] = &[
    "#440154", "#3b528b", "#21918c", "#5ec962", "#31688e", "#443983", "#35b779", "#90d743",
];

#[derive(Debug, Clone)]
pub struct WordCloudOptions {
    pub width: u32,
    pub height: u32,
    pub background: String,
    pub max_words: usize,
    pub max_font_size: f64,
    pub min_font_size: f64,
    /// Font file to embed. When `None` the generic `sans-serif` family is used.
    pub font_path: Option<PathBuf>,
}

impl Default for WordCloudOptions {
    fn default() -> Self {
        Self {
            width: 800,
            height: 400,
            background: "white".to_string(),
            max_words: 50,
            max_font_size: 96.0,
            min_font_size: 12.0,
            font_path: None,
        }
    }
}

impl WordCloudOptions {
    /// Uses `font` if the file exists, otherwise warns and falls back to the
    /// default family.
    #[must_use]
    pub fn with_font(mut self, font: &Path) -> Self {
        if font.is_file() {
            self.font_path = Some(font.to_path_buf());
        } else {
            tracing::warn!(
                font = %font.display(),
                "font file not found; word clouds use the default font"
            );
            self.font_path = None;
        }
        self
    }
}

#[derive(Debug, Clone, Copy)]
struct Rect {
    x: f64,
    y: f64,
    w: f64,
    h: f64,
}

impl Rect {
    fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.x + other.w
            && other.x < self.x + self.w
            && self.y < other.y + other.h
            && other.y < self.y + self.h
    }

    fn inside(&self, width: f64, height: f64) -> bool {
        self.x >= 0.0 && self.y >= 0.0 && self.x + self.w <= width && self.y + self.h <= height
    }
}

/// Approximate rendered width: full-width for Hangul, narrower otherwise.
fn text_width(word: &str, size: f64) -> f64 {
    word.chars()
        .map(|c| if c.is_ascii() { 0.6 } else { 1.0 })
        .sum::<f64>()
        * size
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn place(size: (f64, f64), placed: &[Rect], canvas: (f64, f64)) -> Option<Rect> {
    let (w, h) = size;
    let (width, height) = canvas;
    let (cx, cy) = (width / 2.0, height / 2.0);
    let mut theta: f64 = 0.0;
    while theta < 200.0 * std::f64::consts::PI {
        let r = 2.0 * theta;
        let rect = Rect {
            x: cx + r * theta.cos() - w / 2.0,
            y: cy + r * theta.sin() - h / 2.0,
            w,
            h,
        };
        if rect.inside(width, height) && !placed.iter().any(|p| p.overlaps(&rect)) {
            return Some(rect);
        }
        theta += 0.1;
    }
    None
}

/// Renders `weights` (word, weight) as an SVG document.
#[must_use]
pub fn render_svg(weights: &[(String, f64)], options: &WordCloudOptions) -> String {
    let width = f64::from(options.width);
    let height = f64::from(options.height);

    let mut words: Vec<&(String, f64)> = weights.iter().filter(|(_, w)| *w > 0.0).collect();
    words.sort_by(|a, b| b.1.total_cmp(&a.1));
    words.truncate(options.max_words);
    let max_weight = words.first().map_or(1.0, |(_, w)| *w);

    let family = if options.font_path.is_some() {
        "'TopicFont', sans-serif"
    } else {
        "sans-serif"
    };

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">"#,
        options.width, options.height, options.width, options.height
    );
    if let Some(font) = &options.font_path {
        let _ = writeln!(
            svg,
            "<style>@font-face {{ font-family: 'TopicFont'; src: url('file://{}'); }}</style>",
            escape_xml(&font.display().to_string())
        );
    }
    let _ = writeln!(
        svg,
        r#"<rect width="100%" height="100%" fill="{}"/>"#,
        escape_xml(&options.background)
    );

    let mut placed: Vec<Rect> = Vec::new();
    for (i, (word, weight)) in words.iter().enumerate() {
        let size = options.min_font_size
            + (options.max_font_size - options.min_font_size) * (weight / max_weight);
        let Some(rect) = place((text_width(word, size), size), &placed, (width, height)) else {
            tracing::debug!(word = %word, "no room left for word");
            continue;
        };
        placed.push(rect);
        let _ = writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" font-family="{family}" font-size="{size:.1}" fill="{}">{}</text>"#,
            rect.x,
            rect.y + rect.h * 0.85,
            PALETTE[i % PALETTE.len()],
            escape_xml(word)
        );
    }
    svg.push_str("</svg>\n");
    svg
}

/// File name of a topic's word cloud, numbered from 1.
#[must_use]
pub fn cloud_file_name(topic: &Topic) -> String {
    format!("topic_{}_wordcloud.svg", topic.topic_id + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weights(words: &[(&str, f64)]) -> Vec<(String, f64)> {
        words.iter().map(|(w, x)| ((*w).to_string(), *x)).collect()
    }

    #[test]
    fn renders_canvas_and_background() {
        let svg = render_svg(&weights(&[("서버", 0.5)]), &WordCloudOptions::default());
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r#"width="800" height="400""#));
        assert!(svg.contains(r#"fill="white""#));
        assert!(svg.contains(">서버</text>"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn heaviest_word_gets_largest_font() {
        let svg = render_svg(
            &weights(&[("작은", 0.1), ("크다", 0.4)]),
            &WordCloudOptions::default(),
        );
        let big = svg.find("font-size=\"96.0\"").expect("max size present");
        let big_word = svg[big..].find("크다").unwrap();
        let small_word = svg[big..].find("작은").unwrap();
        assert!(big_word < small_word);
    }

    #[test]
    fn max_words_limits_output() {
        let many: Vec<(String, f64)> = (0..80).map(|i| (format!("w{i}"), 1.0 / f64::from(i + 1))).collect();
        let options = WordCloudOptions {
            max_words: 5,
            ..WordCloudOptions::default()
        };
        let svg = render_svg(&many, &options);
        assert!(svg.matches("<text").count() <= 5);
    }

    #[test]
    fn words_are_escaped() {
        let svg = render_svg(&weights(&[("<a&b>", 1.0)]), &WordCloudOptions::default());
        assert!(svg.contains("&lt;a&amp;b&gt;"));
    }

    #[test]
    fn missing_font_falls_back_to_default_family() {
        let options = WordCloudOptions::default().with_font(Path::new("/no/such/font.ttf"));
        assert!(options.font_path.is_none());
        let svg = render_svg(&weights(&[("화질", 1.0)]), &options);
        assert!(!svg.contains("@font-face"));
        assert!(svg.contains(r#"font-family="sans-serif""#));
    }

    #[test]
    fn existing_font_is_embedded() {
        let dir = tempfile::tempdir().unwrap();
        let font = dir.path().join("font.ttf");
        std::fs::write(&font, b"not really a font").unwrap();

        let options = WordCloudOptions::default().with_font(&font);
        let svg = render_svg(&weights(&[("화질", 1.0)]), &options);
        assert!(svg.contains("@font-face"));
        assert!(svg.contains("TopicFont"));
    }

    #[test]
    fn placed_words_do_not_overlap() {
        let words: Vec<(String, f64)> = (0..20)
            .map(|i| (format!("단어{i}"), 1.0 - f64::from(i) * 0.04))
            .collect();
        let width = 800.0;
        let height = 400.0;
        let mut placed = Vec::new();
        for (word, weight) in &words {
            let size = 12.0 + 84.0 * weight;
            if let Some(rect) = place((text_width(word, size), size), &placed, (width, height)) {
                assert!(rect.inside(width, height));
                placed.push(rect);
            }
        }
        for (i, a) in placed.iter().enumerate() {
            for b in &placed[i + 1..] {
                assert!(!a.overlaps(b));
            }
        }
        assert!(!placed.is_empty());
    }

    #[test]
    fn cloud_files_are_numbered_from_one() {
        let topic = Topic {
            topic_id: 0,
            words: Vec::new(),
        };
        assert_eq!(cloud_file_name(&topic), "topic_1_wordcloud.svg");
    }
}

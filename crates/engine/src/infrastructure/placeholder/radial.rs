//! Radial diagram placeholder: a central node with up to four satellites.
//!
//! Labels are recovered from the prompt text itself, so a story prompt
//! renders its central situation and factor names without any other input.

use std::sync::LazyLock;

use regex_lite::Regex;

use super::abstract_art::select_palette;
use super::canvas::{rgb, Canvas, Color, Point};
use super::font;

pub const MAX_NODES: usize = 4;

/// Satellite node centers as fractions of the canvas, in drawing order
pub const NODE_POSITIONS: [(f32, f32); MAX_NODES] =
    [(0.22, 0.22), (0.78, 0.22), (0.22, 0.78), (0.78, 0.78)];

/// Characters per wrapped label line
pub const LABEL_LINE_CHARS: usize = 14;
const MAX_LABEL_LINES: usize = 3;

const BACKGROUND: Color = rgb(0xFA, 0xF8, 0xF3);
const LINE_COLOR: Color = rgb(0xC8, 0xC4, 0xBA);
const GLYPH_COLOR: Color = rgb(0xFF, 0xFF, 0xFF);
const LABEL_COLOR: Color = rgb(0x4A, 0x4A, 0x48);

/// Satellite fills, one per quadrant
const NODE_COLORS: [Color; MAX_NODES] = [
    rgb(0xFF, 0xB8, 0x99),
    rgb(0xA8, 0xE6, 0xCF),
    rgb(0xC8, 0xA0, 0xE8),
    rgb(0xA0, 0xB8, 0xD4),
];

const CENTER_RADIUS: f32 = 0.14;
const NODE_RADIUS: f32 = 0.09;
const LINE_WIDTH: f32 = 0.008;

/// Shape drawn inside a satellite node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeGlyph {
    Triangle,
    Circle,
    Square,
    Diamond,
}

pub const NODE_GLYPHS: [NodeGlyph; MAX_NODES] = [
    NodeGlyph::Triangle,
    NodeGlyph::Circle,
    NodeGlyph::Square,
    NodeGlyph::Diamond,
];

static CENTRAL_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(?:CENTRAL SITUATION|STORY TO ILLUSTRATE):[ \t]*\r?\n[ \t]*([^\r\n]+)")
        .expect("valid regex")
});
static FACTOR_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^EMOTIONAL FACTORS TO SHOW AS ICONS:[ \t]*\r?\n((?:[ \t]*- [^\r\n]*(?:\r?\n|$))+)")
        .expect("valid regex")
});

/// Labels recovered from a prompt
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagramLabels {
    pub central: Option<String>,
    pub factors: Vec<String>,
}

pub fn extract_labels(prompt: &str) -> DiagramLabels {
    let central = CENTRAL_LABEL_RE
        .captures(prompt)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty());

    let factors = FACTOR_BLOCK_RE
        .captures(prompt)
        .and_then(|c| c.get(1))
        .map(|block| {
            block
                .as_str()
                .lines()
                .filter_map(|line| line.trim().strip_prefix("- "))
                .map(|label| label.trim().to_string())
                .filter(|label| !label.is_empty())
                .take(MAX_NODES)
                .collect()
        })
        .unwrap_or_default();

    DiagramLabels { central, factors }
}

/// Greedy word wrap to `max_chars` per line.
///
/// Words longer than a line are split. Output is capped at three lines; a
/// zero width yields no lines.
pub fn wrap_label(label: &str, max_chars: usize) -> Vec<String> {
    if max_chars == 0 {
        return Vec::new();
    }
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in label.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > max_chars {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            lines.push(word.drain(..max_chars).collect());
        }
        let word: String = word.into_iter().collect();
        if word.is_empty() {
            continue;
        }

        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }
    if !current.is_empty() {
        lines.push(current);
    }

    lines.truncate(MAX_LABEL_LINES);
    lines
}

pub fn compose(canvas: &mut Canvas, prompt: &str) {
    let labels = extract_labels(prompt);
    let center_fill = select_palette(prompt).start;

    let size = canvas.width().min(canvas.height()) as f32;
    let (w, h) = (canvas.width() as f32, canvas.height() as f32);
    let center = Point::new(w / 2.0, h / 2.0);
    let center_radius = size * CENTER_RADIUS;
    let node_radius = size * NODE_RADIUS;
    let text_scale = (canvas.width().min(canvas.height()) / 256).max(1);

    let node_count = if labels.factors.is_empty() {
        MAX_NODES
    } else {
        labels.factors.len().min(MAX_NODES)
    };
    let nodes: Vec<Point> = NODE_POSITIONS[..node_count]
        .iter()
        .map(|(fx, fy)| Point::new(w * fx, h * fy))
        .collect();

    canvas.fill(BACKGROUND);

    // Connectors go down first so nodes sit on top of them.
    let line_width = (size * LINE_WIDTH).max(1.0);
    for node in &nodes {
        canvas.line(center, *node, line_width, LINE_COLOR);
    }

    canvas.disc(center, center_radius, center_fill);
    for (i, node) in nodes.iter().enumerate() {
        canvas.disc(*node, node_radius, NODE_COLORS[i]);
        draw_glyph(canvas, NODE_GLYPHS[i], *node, node_radius * 0.5);
    }

    let label_gap = (font::GLYPH_HEIGHT * text_scale) as f32;
    if let Some(central) = &labels.central {
        draw_label(canvas, central, center, center_radius + label_gap, text_scale);
    }
    for (label, node) in labels.factors.iter().zip(&nodes) {
        draw_label(canvas, label, *node, node_radius + label_gap, text_scale);
    }
}

fn draw_glyph(canvas: &mut Canvas, glyph: NodeGlyph, at: Point, r: f32) {
    match glyph {
        NodeGlyph::Triangle => {
            canvas.polygon(
                vec![
                    Point::new(at.x, at.y - r),
                    Point::new(at.x + r * 0.87, at.y + r * 0.5),
                    Point::new(at.x - r * 0.87, at.y + r * 0.5),
                ],
                GLYPH_COLOR,
            );
        }
        NodeGlyph::Circle => {
            canvas.disc(at, r * 0.8, GLYPH_COLOR);
        }
        NodeGlyph::Square => {
            let half = r * 0.7;
            canvas.rect(
                Point::new(at.x - half, at.y - half),
                Point::new(at.x + half, at.y + half),
                GLYPH_COLOR,
            );
        }
        NodeGlyph::Diamond => {
            canvas.polygon(
                vec![
                    Point::new(at.x, at.y - r),
                    Point::new(at.x + r, at.y),
                    Point::new(at.x, at.y + r),
                    Point::new(at.x - r, at.y),
                ],
                GLYPH_COLOR,
            );
        }
    }
}

fn draw_label(canvas: &mut Canvas, label: &str, anchor: Point, offset: f32, scale: u32) {
    let line_height = ((font::GLYPH_HEIGHT + 2) * scale) as f32;
    for (i, line) in wrap_label(label, LABEL_LINE_CHARS).into_iter().enumerate() {
        let top = anchor.y + offset + i as f32 * line_height;
        canvas.text(anchor.x, top, line.to_uppercase(), scale, LABEL_COLOR);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::placeholder::canvas::DrawOp;
    use crate::use_cases::visualization::prompt_builder::build_story_prompt;
    use moodscape_domain::{AnalysisFactor, EmotionId, FeelingCategory};

    fn story_prompt(stressor: Option<&str>, factors: &[&str]) -> String {
        let factors: Vec<AnalysisFactor> = factors
            .iter()
            .map(|f| AnalysisFactor::new(*f, "insight"))
            .collect();
        build_story_prompt(
            "I kept replaying the argument with my sister all night and could not rest.",
            FeelingCategory::Bad,
            &[EmotionId::Down],
            stressor,
            Some(factors.as_slice()),
        )
    }

    #[test]
    fn extracts_stressor_and_factor_bullets() {
        let prompt = story_prompt(
            Some("Family Conflict"),
            &["Guilt", "Fear Of Rejection", "Rumination", "Loyalty", "Fatigue"],
        );
        let labels = extract_labels(&prompt);
        assert_eq!(labels.central.as_deref(), Some("Family Conflict"));
        assert_eq!(
            labels.factors,
            vec!["Guilt", "Fear Of Rejection", "Rumination", "Loyalty"]
        );
    }

    #[test]
    fn central_label_falls_back_to_story_summary() {
        let prompt = story_prompt(None, &[]);
        let labels = extract_labels(&prompt);
        assert!(labels
            .central
            .as_deref()
            .is_some_and(|c| c.starts_with("I kept replaying")));
        assert!(labels.factors.is_empty());
    }

    #[test]
    fn wraps_on_word_boundaries() {
        assert_eq!(
            wrap_label("Work Performance Pressure", 14),
            vec!["Work", "Performance", "Pressure"]
        );
        assert_eq!(wrap_label("Fear Of Judgment", 14), vec!["Fear Of", "Judgment"]);
        assert_eq!(
            wrap_label("Overcommitment", 8),
            vec!["Overcomm", "itment"]
        );
    }

    #[test]
    fn wrap_caps_line_count() {
        let lines = wrap_label("one two three four five six seven eight", 5);
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn zero_width_wraps_to_nothing() {
        assert!(wrap_label("anything at all", 0).is_empty());
    }

    #[test]
    fn lines_precede_nodes_and_labels_come_last() {
        let prompt = story_prompt(Some("Work Stress"), &["Deadlines", "Self Doubt"]);
        let mut canvas = Canvas::new(512, 512);
        compose(&mut canvas, &prompt);
        let ops = canvas.ops();

        let first_disc = ops
            .iter()
            .position(|op| matches!(op, DrawOp::Disc { .. }))
            .expect("nodes drawn");
        let last_line = ops
            .iter()
            .rposition(|op| matches!(op, DrawOp::Line { .. }))
            .expect("connectors drawn");
        assert!(last_line < first_disc);
        assert_eq!(
            ops.iter().filter(|op| matches!(op, DrawOp::Line { .. })).count(),
            2
        );

        let texts: Vec<&str> = ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["WORK STRESS", "DEADLINES", "SELF DOUBT"]);
    }

    #[test]
    fn satellites_sit_at_fixed_quadrants() {
        let mut canvas = Canvas::new(100, 100);
        compose(&mut canvas, "radial");
        let centers: Vec<Point> = canvas
            .ops()
            .iter()
            .filter_map(|op| match op {
                DrawOp::Disc { center, radius, .. } if (*radius - 9.0).abs() < 1e-3 => {
                    Some(*center)
                }
                _ => None,
            })
            .collect();
        let expected = [(22.0, 22.0), (78.0, 22.0), (22.0, 78.0), (78.0, 78.0)];
        assert_eq!(centers.len(), expected.len());
        for (got, (x, y)) in centers.iter().zip(expected) {
            assert!((got.x - x).abs() < 1e-3 && (got.y - y).abs() < 1e-3, "{:?}", got);
        }
    }
}

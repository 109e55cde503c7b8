//! Image prompt construction from the emotion vocabulary.
//!
//! Two prompt families are built here:
//! - Feeling prompts: abstract art driven purely by the selected emotions
//! - Story prompts: a flat 2D radial infographic around the narrative's
//!   central situation, with one icon per analysis factor
//!
//! Every function is deterministic. Emotion order is preserved throughout,
//! so the same request always produces the same prompt text.

use moodscape_domain::{AnalysisFactor, EmotionId, EnergyLevel, FeelingCategory};

/// Section headers. The placeholder renderer keys its layout and labels off
/// these, so they are shared rather than repeated as literals.
pub const CENTRAL_SITUATION_HEADER: &str = "CENTRAL SITUATION:";
pub const STORY_HEADER: &str = "STORY TO ILLUSTRATE:";
pub const FACTORS_HEADER: &str = "EMOTIONAL FACTORS TO SHOW AS ICONS:";

/// Narrative summaries are hard-capped at this many characters.
pub const STORY_SUMMARY_MAX_CHARS: usize = 300;

const MAX_PALETTE_COLORS: usize = 5;
const MAX_SHAPE_PHRASES: usize = 3;

const MIN_DOMINANT_COLORS: usize = 3;
const MAX_DOMINANT_COLORS: usize = 4;

/// Padding for `dominant_colors` when the selection yields fewer than three.
pub const FALLBACK_COLORS: [&str; 4] = ["#FFD700", "#FF6B6B", "#4ECDC4", "#A78BFA"];

const FEELING_BASE_STYLE: &str = "
Abstract art visualization with these characteristics:
- Abstract style with no recognizable objects or people
- Soft, muted colors with low saturation (pastel tones)
- Symmetrical or balanced composition
- Smooth gradients and flowing shapes
- Absolutely NO text, letters, words, or numbers
";

const STORY_BASE_STYLE: &str = "
Create a minimalist 2D cartoon illustration with these characteristics:
- Minimalist, flat 2D cartoon style (clean, simple, not detailed)
- SYMMETRICAL composition - balanced layout with central focus
- White or light neutral background
- Gentle pastel colors
- No text, letters, words, or numbers in the image
- Clean lines, minimal detail
- Friendly and non-threatening visual style
";

const FEELING_CLOSING: &str = "\nCreate a calming, aesthetically pleasing square image.";

const STORY_LAYOUT: &str = r"
Create a minimalist 2D cartoon infographic:
- SYMMETRICAL composition with balanced layout
- Central icon in the middle representing the main situation
- Surrounding icons arranged symmetrically around the center (like a mind-map)
- Clean lines, flat design, minimal detail
- NO text labels in the image
- White or light neutral background
- Connected with simple lines from center to surrounding icons
- Soft pastel colors based on emotional tone
- Child-friendly, non-threatening visual style

Example composition:
        [Factor]          [Factor]
              \              /
               \            /
                [ Central  ]
               /            \
              /              \
        [Factor]          [Factor]";

/// Abstract-art prompt for a feeling visualization.
pub fn build_feeling_prompt(category: FeelingCategory, emotions: &[EmotionId]) -> String {
    let mut parts = vec![FEELING_BASE_STYLE.to_string()];

    parts.push(format!(
        "\nMOOD TO VISUALIZE:\n{}",
        emotion_description(category, emotions)
    ));
    parts.push(format!("\nCOLOR PALETTE:\n{}", color_palette(category, emotions)));

    if let Some(shapes) = shape_guidance(emotions) {
        parts.push(format!("\nSHAPE GUIDANCE:\n{}", shapes));
    }

    parts.push(FEELING_CLOSING.to_string());
    parts.join("\n")
}

/// Radial infographic prompt for a story visualization.
///
/// `central_stressor` and `factors` come from narrative analysis; without a
/// stressor the (summarized) narrative itself is used as the central subject.
pub fn build_story_prompt(
    narrative: &str,
    category: FeelingCategory,
    emotions: &[EmotionId],
    central_stressor: Option<&str>,
    factors: Option<&[AnalysisFactor]>,
) -> String {
    let mut parts = vec![STORY_BASE_STYLE.to_string()];

    match central_stressor.filter(|s| !s.trim().is_empty()) {
        Some(stressor) => {
            parts.push(format!("\n{}\n{}", CENTRAL_SITUATION_HEADER, stressor));
        }
        None => {
            parts.push(format!("\n{}\n{}", STORY_HEADER, summarize_story(narrative)));
        }
    }

    let factor_names: Vec<&str> = factors
        .unwrap_or_default()
        .iter()
        .map(|f| f.factor.as_str())
        .filter(|name| !name.is_empty())
        .collect();
    if !factor_names.is_empty() {
        let bullets: Vec<String> = factor_names.iter().map(|n| format!("- {}", n)).collect();
        parts.push(format!("\n{}\n{}", FACTORS_HEADER, bullets.join("\n")));
    }

    parts.push(format!("\nEMOTIONAL CONTEXT:\n{}", emotion_context(emotions)));
    parts.push(format!("\nCOLOR MOOD:\n{}", color_palette(category, emotions)));
    parts.push(STORY_LAYOUT.to_string());

    parts.join("\n")
}

/// First hex color of each emotion, padded from [`FALLBACK_COLORS`] to at
/// least three entries and truncated to four.
pub fn dominant_colors(emotions: &[EmotionId]) -> Vec<String> {
    let mut colors: Vec<String> = emotions
        .iter()
        .filter_map(|id| id.profile().primary_hex())
        .map(str::to_string)
        .collect();

    if colors.len() < MIN_DOMINANT_COLORS {
        for fallback in FALLBACK_COLORS {
            if !colors.iter().any(|c| c == fallback) {
                colors.push(fallback.to_string());
            }
            if colors.len() >= MAX_DOMINANT_COLORS {
                break;
            }
        }
    }

    colors.truncate(MAX_DOMINANT_COLORS);
    colors
}

/// Trim and cap a narrative at [`STORY_SUMMARY_MAX_CHARS`] characters.
pub fn summarize_story(text: &str) -> String {
    let text = text.trim();
    if text.chars().count() <= STORY_SUMMARY_MAX_CHARS {
        return text.to_string();
    }
    let head: String = text.chars().take(STORY_SUMMARY_MAX_CHARS - 3).collect();
    format!("{}...", head)
}

fn category_phrase(category: FeelingCategory) -> &'static str {
    match category {
        FeelingCategory::Good => "overall positive emotional state",
        FeelingCategory::Bad => "challenging emotional state",
        FeelingCategory::NotSure => "mixed or uncertain emotional state",
    }
}

fn neutral_palette(category: FeelingCategory) -> &'static [&'static str] {
    match category {
        FeelingCategory::Good => &["soft warm tones", "light pastels", "gentle yellows"],
        FeelingCategory::Bad => &["muted cool tones", "soft grays", "pale blues"],
        FeelingCategory::NotSure => &["neutral pastels", "soft balanced tones"],
    }
}

fn emotion_description(category: FeelingCategory, emotions: &[EmotionId]) -> String {
    let mut descriptions: Vec<&str> = emotions.iter().map(|id| id.profile().description).collect();
    descriptions.push(category_phrase(category));
    descriptions.join(" ")
}

fn color_palette(category: FeelingCategory, emotions: &[EmotionId]) -> String {
    let mut colors: Vec<&str> = Vec::new();
    for color in emotions.iter().flat_map(|id| id.profile().colors.iter().copied()) {
        if !colors.contains(&color) {
            colors.push(color);
        }
    }
    if colors.is_empty() {
        colors = neutral_palette(category).to_vec();
    }
    colors.truncate(MAX_PALETTE_COLORS);
    format!("Use {}", colors.join(", "))
}

fn shape_guidance(emotions: &[EmotionId]) -> Option<String> {
    let shapes: Vec<&str> = emotions
        .iter()
        .take(MAX_SHAPE_PHRASES)
        .map(|id| id.profile().shapes)
        .collect();
    if shapes.is_empty() {
        None
    } else {
        Some(format!("Incorporate {}", shapes.join(" and ")))
    }
}

fn emotion_context(emotions: &[EmotionId]) -> String {
    let mut parts = Vec::new();
    if !emotions.is_empty() {
        let names: Vec<String> = emotions.iter().map(|id| id.readable_name()).collect();
        parts.push(format!("The person feels: {}", names.join(", ")));
    }

    let energies = emotions.iter().map(|id| id.profile().energy);
    let intensity = if energies.clone().any(|e| e == EnergyLevel::Intense) {
        "The emotional intensity is high."
    } else if energies.clone().all(|e| e == EnergyLevel::Calm) {
        "The emotional state is calm and subdued."
    } else {
        "The emotional state is moderate."
    };
    parts.push(intensity.to_string());

    parts.join(" ")
}

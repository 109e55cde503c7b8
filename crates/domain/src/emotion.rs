//! Emotion vocabulary and visual profiles
//!
//! - EmotionId: The closed set of emotions a user can select
//! - FeelingCategory: Coarse valence chosen alongside the emotions
//! - EmotionProfile: Static visual/psychological guidance for one emotion
//!
//! The registry is plain `'static` data, so lookups are lock-free and safe to
//! share across every request.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;

/// Overall valence the user picked before choosing emotions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeelingCategory {
    Good,
    Bad,
    NotSure,
}

impl FeelingCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeelingCategory::Good => "good",
            FeelingCategory::Bad => "bad",
            FeelingCategory::NotSure => "not_sure",
        }
    }
}

impl fmt::Display for FeelingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for FeelingCategory {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "good" => Ok(FeelingCategory::Good),
            "bad" => Ok(FeelingCategory::Bad),
            "not_sure" => Ok(FeelingCategory::NotSure),
            _ => Err(DomainError::validation(format!(
                "Invalid category '{}'. Must be one of: good, bad, not_sure",
                s
            ))),
        }
    }
}

/// How much energy an emotion carries, used to phrase the emotional context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyLevel {
    Calm,
    Moderate,
    Intense,
}

/// One of the emotions in the closed vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmotionId {
    SuperHappy,
    Pumped,
    Cozy,
    Chill,
    Content,
    Fuming,
    FreakedOut,
    MadAsHell,
    Blah,
    Down,
    BoredStiff,
}

impl EmotionId {
    /// Every emotion, positive group first, in discovery order
    pub fn all() -> &'static [EmotionId] {
        &[
            EmotionId::SuperHappy,
            EmotionId::Pumped,
            EmotionId::Cozy,
            EmotionId::Chill,
            EmotionId::Content,
            EmotionId::Fuming,
            EmotionId::FreakedOut,
            EmotionId::MadAsHell,
            EmotionId::Blah,
            EmotionId::Down,
            EmotionId::BoredStiff,
        ]
    }

    pub fn positive() -> &'static [EmotionId] {
        &EmotionId::all()[..5]
    }

    pub fn negative() -> &'static [EmotionId] {
        &EmotionId::all()[5..]
    }

    /// Wire identifier, e.g. `"mad_as_hell"`
    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionId::SuperHappy => "super_happy",
            EmotionId::Pumped => "pumped",
            EmotionId::Cozy => "cozy",
            EmotionId::Chill => "chill",
            EmotionId::Content => "content",
            EmotionId::Fuming => "fuming",
            EmotionId::FreakedOut => "freaked_out",
            EmotionId::MadAsHell => "mad_as_hell",
            EmotionId::Blah => "blah",
            EmotionId::Down => "down",
            EmotionId::BoredStiff => "bored_stiff",
        }
    }

    /// Identifier with underscores turned into spaces, for prose
    pub fn readable_name(&self) -> String {
        self.as_str().replace('_', " ")
    }

    pub fn profile(&self) -> &'static EmotionProfile {
        match self {
            EmotionId::SuperHappy => &PROFILES[0],
            EmotionId::Pumped => &PROFILES[1],
            EmotionId::Cozy => &PROFILES[2],
            EmotionId::Chill => &PROFILES[3],
            EmotionId::Content => &PROFILES[4],
            EmotionId::Fuming => &PROFILES[5],
            EmotionId::FreakedOut => &PROFILES[6],
            EmotionId::MadAsHell => &PROFILES[7],
            EmotionId::Blah => &PROFILES[8],
            EmotionId::Down => &PROFILES[9],
            EmotionId::BoredStiff => &PROFILES[10],
        }
    }
}

impl fmt::Display for EmotionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EmotionId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EmotionId::all()
            .iter()
            .copied()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| DomainError::not_found("Emotion", s))
    }
}

/// Static visual profile for an emotion
#[derive(Debug, PartialEq, Eq)]
pub struct EmotionProfile {
    pub id: EmotionId,
    pub description: &'static str,
    /// Color names used in prompt text
    pub colors: &'static [&'static str],
    /// Hex colors parallel to `colors`
    pub hex_colors: &'static [&'static str],
    pub shapes: &'static str,
    pub energy: EnergyLevel,
}

impl EmotionProfile {
    /// Look up a profile by its wire identifier.
    pub fn lookup(id: &str) -> Option<&'static EmotionProfile> {
        PROFILES.iter().find(|p| p.id.as_str() == id)
    }

    pub fn primary_hex(&self) -> Option<&'static str> {
        self.hex_colors.first().copied()
    }
}

// Order must match `EmotionId::profile`.
static PROFILES: [EmotionProfile; 11] = [
    EmotionProfile {
        id: EmotionId::SuperHappy,
        description: "joyful, bright, and uplifting energy",
        colors: &["warm yellow", "soft orange", "light pink"],
        hex_colors: &["#FFE4A0", "#FFB899", "#FFD4E5"],
        shapes: "rising curves and radiating patterns",
        energy: EnergyLevel::Moderate,
    },
    EmotionProfile {
        id: EmotionId::Pumped,
        description: "dynamic, energetic, and vibrant spirit",
        colors: &["coral", "peach", "warm gold"],
        hex_colors: &["#FFB5A0", "#FFDAB9", "#FFD700"],
        shapes: "bold curves and expanding circles",
        energy: EnergyLevel::Intense,
    },
    EmotionProfile {
        id: EmotionId::Cozy,
        description: "warm, comfortable, and enveloping feeling",
        colors: &["warm beige", "soft terracotta", "cream"],
        hex_colors: &["#D4B896", "#E2A68F", "#FFFDD0"],
        shapes: "rounded and nested shapes",
        energy: EnergyLevel::Calm,
    },
    EmotionProfile {
        id: EmotionId::Chill,
        description: "calm, relaxed, and flowing state",
        colors: &["cool mint", "soft sage", "pale blue"],
        hex_colors: &["#A8E6CF", "#9DC183", "#ADD8E6"],
        shapes: "gentle waves and horizontal flow",
        energy: EnergyLevel::Calm,
    },
    EmotionProfile {
        id: EmotionId::Content,
        description: "peaceful, balanced, and satisfied feeling",
        colors: &["soft lavender", "dusty rose", "warm gray"],
        hex_colors: &["#D4C4E8", "#D4A5A5", "#C4C4BC"],
        shapes: "centered, symmetrical, complete circles",
        energy: EnergyLevel::Calm,
    },
    EmotionProfile {
        id: EmotionId::Fuming,
        description: "contained intensity and simmering energy",
        colors: &["muted coral", "dusty red", "warm gray"],
        hex_colors: &["#E8A0A0", "#C25A5A", "#A89F9F"],
        shapes: "contained spirals with inward pressure",
        energy: EnergyLevel::Intense,
    },
    EmotionProfile {
        id: EmotionId::FreakedOut,
        description: "scattered, anxious, and unsettled feeling",
        colors: &["pale violet", "soft gray", "muted blue"],
        hex_colors: &["#C8A0E8", "#B0B0B0", "#8FA8C8"],
        shapes: "dispersed elements and irregular patterns",
        energy: EnergyLevel::Intense,
    },
    EmotionProfile {
        id: EmotionId::MadAsHell,
        description: "heavy, dense, and pressured energy",
        colors: &["deep mauve", "muted burgundy", "charcoal"],
        hex_colors: &["#8B4570", "#722F37", "#36454F"],
        shapes: "dense centers and heavy forms",
        energy: EnergyLevel::Intense,
    },
    EmotionProfile {
        id: EmotionId::Blah,
        description: "flat, neutral, and unmotivated state",
        colors: &["gray tones", "muted beige", "pale taupe"],
        hex_colors: &["#B0C4D4", "#C4B8A8", "#B8AFA0"],
        shapes: "horizontal layers and static forms",
        energy: EnergyLevel::Calm,
    },
    EmotionProfile {
        id: EmotionId::Down,
        description: "low, weighted, and subdued feeling",
        colors: &["cool gray-blue", "pale indigo", "soft navy"],
        hex_colors: &["#A0B8D4", "#9FA8DA", "#6B7B8C"],
        shapes: "downward curves and sinking shapes",
        energy: EnergyLevel::Calm,
    },
    EmotionProfile {
        id: EmotionId::BoredStiff,
        description: "empty, monotonous, and unstimulated feeling",
        colors: &["neutral grays", "pale olive", "muted tan"],
        hex_colors: &["#D4D0C4", "#C5C99B", "#C2B280"],
        shapes: "regular, repetitive, sparse patterns",
        energy: EnergyLevel::Calm,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_id_maps_to_its_own_profile() {
        for id in EmotionId::all() {
            assert_eq!(id.profile().id, *id);
        }
    }

    #[test]
    fn groups_partition_the_vocabulary() {
        assert_eq!(EmotionId::positive().len(), 5);
        assert_eq!(EmotionId::negative().len(), 6);
        assert_eq!(EmotionId::positive()[0], EmotionId::SuperHappy);
        assert_eq!(EmotionId::negative()[0], EmotionId::Fuming);
        assert!(EmotionId::positive()
            .iter()
            .all(|id| !EmotionId::negative().contains(id)));
    }

    #[test]
    fn lookup_by_wire_id() {
        let profile = EmotionProfile::lookup("freaked_out").expect("known emotion");
        assert_eq!(profile.id, EmotionId::FreakedOut);
        assert_eq!(profile.energy, EnergyLevel::Intense);
        assert!(EmotionProfile::lookup("ecstatic").is_none());
    }

    #[test]
    fn parse_rejects_unknown_emotion() {
        assert_eq!("mad_as_hell".parse::<EmotionId>().ok(), Some(EmotionId::MadAsHell));
        let err = "ecstatic".parse::<EmotionId>().unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[test]
    fn profiles_have_parallel_valid_hex_colors() {
        for id in EmotionId::all() {
            let profile = id.profile();
            assert_eq!(profile.colors.len(), profile.hex_colors.len());
            for hex in profile.hex_colors {
                assert_eq!(hex.len(), 7);
                assert!(hex.starts_with('#'));
                assert!(hex[1..].chars().all(|c| c.is_ascii_hexdigit()));
            }
        }
    }

    #[test]
    fn category_round_trips_through_str() {
        for category in [FeelingCategory::Good, FeelingCategory::Bad, FeelingCategory::NotSure] {
            assert_eq!(category.as_str().parse::<FeelingCategory>().ok(), Some(category));
        }
        assert!("meh".parse::<FeelingCategory>().is_err());
    }

    #[test]
    fn readable_name_replaces_underscores() {
        assert_eq!(EmotionId::BoredStiff.readable_name(), "bored stiff");
    }
}

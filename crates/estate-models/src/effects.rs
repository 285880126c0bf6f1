//! Effects configuration and the free-text effects parser.
//!
//! The reel composition accepts four independent rendering parameters. They
//! arrive either as structured JSON or as a Polish description such as
//! "szybkie tempo, napisy na dole, kinowy klimat", which is mapped onto the
//! closed value sets below.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Pacing of the reel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum Tempo {
    #[default]
    Normal,
    Fast,
    Slow,
}

/// Vertical placement of captions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum TextPosition {
    #[default]
    Center,
    Bottom,
    Top,
}

/// Photo-to-photo transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum Transition {
    #[default]
    Slide,
    Fade,
    Zoom,
}

/// Overlay drawn over each photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum Overlay {
    #[default]
    Dark,
    Light,
    None,
    Cinematic,
    Gradient,
}

macro_rules! categorical {
    ($ty:ident, $field:literal, { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            /// All allowed values, default first.
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            /// Wire name of the value.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $name),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = EffectValueError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($name => Ok($ty::$variant),)+
                    _ => Err(EffectValueError {
                        field: $field,
                        value: s.to_string(),
                    }),
                }
            }
        }
    };
}

categorical!(Tempo, "tempo", { Normal => "normal", Fast => "fast", Slow => "slow" });
categorical!(TextPosition, "textPosition", { Center => "center", Bottom => "bottom", Top => "top" });
categorical!(Transition, "transition", { Slide => "slide", Fade => "fade", Zoom => "zoom" });
categorical!(Overlay, "overlay", {
    Dark => "dark",
    Light => "light",
    None => "none",
    Cinematic => "cinematic",
    Gradient => "gradient",
});

/// Unknown value for one of the effect fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown {field} value: {value}")]
pub struct EffectValueError {
    pub field: &'static str,
    pub value: String,
}

/// Complete effects configuration. Always carries all four keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct EffectsConfig {
    pub tempo: Tempo,
    pub text_position: TextPosition,
    pub transition: Transition,
    pub overlay: Overlay,
}

/// Structured effects as submitted by the client. Any key may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EffectsInput {
    #[serde(default)]
    pub tempo: Option<String>,
    #[serde(default)]
    pub text_position: Option<String>,
    #[serde(default)]
    pub transition: Option<String>,
    #[serde(default)]
    pub overlay: Option<String>,
}

impl EffectsInput {
    /// Resolve into a complete configuration, filling gaps with defaults.
    pub fn resolve(&self) -> Result<EffectsConfig, EffectValueError> {
        fn field<T: FromStr<Err = EffectValueError> + Default>(
            value: &Option<String>,
        ) -> Result<T, EffectValueError> {
            match value.as_deref().map(str::trim) {
                None | Some("") => Ok(T::default()),
                Some(v) => v.parse(),
            }
        }

        Ok(EffectsConfig {
            tempo: field(&self.tempo)?,
            text_position: field(&self.text_position)?,
            transition: field(&self.transition)?,
            overlay: field(&self.overlay)?,
        })
    }
}

// Keyword groups, in priority order per dimension.

const TEMPO_KEYWORDS: &[(Tempo, &[&str])] = &[
    (Tempo::Fast, &["szybk", "dynamiczn", "krotk", "fast", "energiczn"]),
    (Tempo::Slow, &["woln", "spokoj", "slow", "powol", "delikat"]),
];

const TEXT_POSITION_KEYWORDS: &[(TextPosition, &[&str])] = &[
    (TextPosition::Bottom, &["na dole", "na dol", "dolna", "bottom", "pod spodem"]),
    (TextPosition::Top, &["na gorze", "gora", "top", "u gory"]),
];

const TRANSITION_KEYWORDS: &[(Transition, &[&str])] = &[
    (Transition::Fade, &["fade", "zanik", "przenik", "plynn"]),
    (Transition::Zoom, &["zoom", "przybliz", "zbliz", "powieksz"]),
    (Transition::Slide, &["slide", "przesun", "wysuw"]),
];

const OVERLAY_KEYWORDS: &[(Overlay, &[&str])] = &[
    (Overlay::Light, &["jasn", "light", "lekk"]),
    (Overlay::None, &["brak overlay", "bez overlay", "bez nakl", "none", "czyst"]),
    (Overlay::Cinematic, &["kinow", "cinemat", "film"]),
    (Overlay::Gradient, &["gradient", "cieniow"]),
];

/// First group with any keyword contained in `text`.
///
/// Plain substring containment, so "stop" matches "top". Kept that way for
/// compatibility with descriptions written against the existing frontend.
fn first_match<T: Copy>(text: &str, groups: &[(T, &[&str])]) -> Option<T> {
    groups
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| text.contains(k)))
        .map(|(value, _)| *value)
}

/// Parse a free-text (Polish) effects description.
///
/// Never fails: unmatched or empty text yields the defaults.
pub fn parse_effects_description(description: &str) -> EffectsConfig {
    let text = description.trim().to_lowercase();
    let defaults = EffectsConfig::default();

    EffectsConfig {
        tempo: first_match(&text, TEMPO_KEYWORDS).unwrap_or(defaults.tempo),
        text_position: first_match(&text, TEXT_POSITION_KEYWORDS).unwrap_or(defaults.text_position),
        transition: first_match(&text, TRANSITION_KEYWORDS).unwrap_or(defaults.transition),
        overlay: first_match(&text, OVERLAY_KEYWORDS).unwrap_or(defaults.overlay),
    }
}

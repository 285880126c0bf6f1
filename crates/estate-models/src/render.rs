//! Render request and template definitions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::effects::{parse_effects_description, EffectValueError, EffectsConfig, EffectsInput};
use crate::id::RenderId;

/// Output templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum Template {
    /// 9:16 listing reel (video)
    #[default]
    Reel,
    /// Instagram carousel (still images, zipped)
    Carousel,
    /// "Sprzedane!" announcement (video)
    Sold,
}

impl Template {
    pub const ALL: &'static [Template] = &[Template::Reel, Template::Carousel, Template::Sold];

    pub fn as_str(&self) -> &'static str {
        match self {
            Template::Reel => "reel",
            Template::Carousel => "carousel",
            Template::Sold => "sold",
        }
    }

    /// Composition rendered by the external tool.
    pub fn composition(&self) -> &'static str {
        match self {
            Template::Reel => "RealEstateReel",
            Template::Carousel => "CarouselSlide",
            Template::Sold => "SoldVideo",
        }
    }

    /// Polish file stem used in output and download names.
    fn file_stem(&self) -> &'static str {
        match self {
            Template::Reel => "rolka",
            Template::Carousel => "karuzela",
            Template::Sold => "sprzedane",
        }
    }

    fn extension(&self) -> &'static str {
        match self {
            Template::Carousel => "zip",
            Template::Reel | Template::Sold => "mp4",
        }
    }

    /// Name of the final output file in the output directory.
    pub fn output_file_name(&self, render_id: &RenderId) -> String {
        format!("{}-{}.{}", render_id, self.file_stem(), self.extension())
    }

    /// Name offered to the client when downloading.
    pub fn download_name(&self, render_id: &RenderId) -> String {
        format!("{}-{}.{}", self.file_stem(), render_id, self.extension())
    }

    /// Output kind reported to the client.
    pub fn output_kind(&self) -> &'static str {
        match self {
            Template::Carousel => "carousel",
            Template::Reel | Template::Sold => "video",
        }
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Template {
    type Err = TemplateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "reel" => Ok(Template::Reel),
            "carousel" => Ok(Template::Carousel),
            "sold" => Ok(Template::Sold),
            _ => Err(TemplateParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Nieznany szablon: {0}")]
pub struct TemplateParseError(pub String);

/// Photo entry of a render request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PhotoInput {
    /// Path relative to the public directory
    pub path: String,
    #[serde(default)]
    pub label: Option<String>,
}

impl PhotoInput {
    /// Label if one was given and is not blank.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref().filter(|l| !l.trim().is_empty())
    }
}

/// Agency branding passed to the compositions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BrandConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style_preset: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cta_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cta_subtext: Option<String>,
    /// Logo path relative to the public directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_src: Option<String>,
}

/// Render request body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    /// Template discriminator; reel when absent
    #[serde(default)]
    pub template: Option<String>,

    // Listing fields
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub area: String,
    #[serde(default)]
    pub rooms: String,
    #[serde(default)]
    pub floor: String,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub agent: String,
    #[serde(default)]
    pub agent_phone: String,

    #[serde(default)]
    pub photos: Vec<PhotoInput>,

    // Brand fields
    #[serde(default)]
    pub style_preset: Option<String>,
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub cta_text: Option<String>,
    #[serde(default)]
    pub cta_subtext: Option<String>,
    #[serde(default)]
    pub logo_path: Option<String>,

    /// Structured effects; takes precedence over the description
    #[serde(default)]
    pub effects: Option<EffectsInput>,
    /// Free-text effects description
    #[serde(default)]
    pub effects_description: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl RenderRequest {
    /// Resolve the template discriminator.
    pub fn template(&self) -> Result<Template, TemplateParseError> {
        match self.template.as_deref() {
            None => Ok(Template::default()),
            Some(t) => t.parse(),
        }
    }

    /// Brand configuration, or `None` when no brand field is set.
    pub fn brand(&self) -> Option<BrandConfig> {
        let brand = BrandConfig {
            style_preset: non_empty(&self.style_preset),
            headline: non_empty(&self.headline),
            cta_text: non_empty(&self.cta_text),
            cta_subtext: non_empty(&self.cta_subtext),
            logo_src: non_empty(&self.logo_path),
        };
        if brand == BrandConfig::default() {
            None
        } else {
            Some(brand)
        }
    }

    /// Effects for this request.
    ///
    /// Structured input wins; otherwise a non-blank description is parsed.
    pub fn effects(&self) -> Result<Option<EffectsConfig>, EffectValueError> {
        if let Some(input) = &self.effects {
            return input.resolve().map(Some);
        }
        Ok(non_empty(&self.effects_description).map(|d| parse_effects_description(&d)))
    }
}

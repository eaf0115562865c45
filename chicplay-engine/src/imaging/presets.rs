//! Body-type lookup tables for garment placement and shadow styling.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BodyType {
    Petite,
    #[default]
    Average,
    Tall,
    Curvy,
}

impl BodyType {
    pub const ALL: [Self; 4] = [Self::Petite, Self::Average, Self::Tall, Self::Curvy];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Petite => "petite",
            Self::Average => "average",
            Self::Tall => "tall",
            Self::Curvy => "curvy",
        }
    }
}

impl fmt::Display for BodyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BodyType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "petite" => Ok(Self::Petite),
            "average" => Ok(Self::Average),
            "tall" => Ok(Self::Tall),
            "curvy" => Ok(Self::Curvy),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct BodyConfig {
    #[serde(rename = "type")]
    pub body_type: BodyType,
}

impl BodyConfig {
    #[must_use]
    pub const fn new(body_type: BodyType) -> Self {
        Self { body_type }
    }
}

/// CSS-ready placement of the garment layer over the body silhouette.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Positioning {
    /// Offset from the top of the silhouette, as a CSS length.
    pub top: String,
    pub scale: f32,
    /// Horizontal anchor as a fraction of the layer width.
    pub anchor_x: f32,
    /// Vertical anchor as a fraction of the layer height.
    pub anchor_y: f32,
    /// Perspective tilt in degrees.
    pub perspective: f32,
    pub transform: String,
}

/// CSS shadow values that seat the garment on the body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shadows {
    pub drop_shadow: String,
    pub inner_shadow: String,
    pub ambient_blur: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
}

struct PlacementPreset {
    top_pct: f32,
    scale: f32,
    anchor_x: f32,
    anchor_y: f32,
    perspective: f32,
}

const fn placement(body_type: BodyType) -> PlacementPreset {
    match body_type {
        BodyType::Petite => PlacementPreset {
            top_pct: 16.0,
            scale: 0.88,
            anchor_x: 0.5,
            anchor_y: 0.02,
            perspective: 1.5,
        },
        BodyType::Average => PlacementPreset {
            top_pct: 14.0,
            scale: 0.95,
            anchor_x: 0.5,
            anchor_y: 0.0,
            perspective: 1.0,
        },
        BodyType::Tall => PlacementPreset {
            top_pct: 12.0,
            scale: 1.02,
            anchor_x: 0.5,
            anchor_y: -0.01,
            perspective: 0.5,
        },
        BodyType::Curvy => PlacementPreset {
            top_pct: 14.5,
            scale: 1.08,
            anchor_x: 0.5,
            anchor_y: 0.01,
            perspective: 2.0,
        },
    }
}

/// Placement for a body type. Pure table lookup and formatting.
#[must_use]
pub fn positioning_for(body_type: BodyType) -> Positioning {
    let preset = placement(body_type);
    let translate_x = -preset.anchor_x * 100.0;
    let translate_y = preset.anchor_y * 100.0;
    Positioning {
        top: format!("{}%", preset.top_pct),
        scale: preset.scale,
        anchor_x: preset.anchor_x,
        anchor_y: preset.anchor_y,
        perspective: preset.perspective,
        transform: format!(
            "translate({translate_x}%, {translate_y}%) scale({}) perspective(1000px) rotateX({}deg)",
            preset.scale, preset.perspective
        ),
    }
}

/// Shadow styling for a body type. Pure table lookup.
#[must_use]
pub fn shadows_for(body_type: BodyType) -> Shadows {
    let (drop, inner, blur) = match body_type {
        BodyType::Petite => (
            "drop-shadow(0 4px 8px rgba(0, 0, 0, 0.18))",
            "inset 0 -6px 12px rgba(0, 0, 0, 0.08)",
            "blur(0.4px)",
        ),
        BodyType::Average => (
            "drop-shadow(0 6px 12px rgba(0, 0, 0, 0.2))",
            "inset 0 -8px 16px rgba(0, 0, 0, 0.1)",
            "blur(0.5px)",
        ),
        BodyType::Tall => (
            "drop-shadow(0 8px 14px rgba(0, 0, 0, 0.2))",
            "inset 0 -10px 18px rgba(0, 0, 0, 0.1)",
            "blur(0.5px)",
        ),
        BodyType::Curvy => (
            "drop-shadow(0 6px 16px rgba(0, 0, 0, 0.24))",
            "inset 0 -8px 20px rgba(0, 0, 0, 0.12)",
            "blur(0.6px)",
        ),
    };
    Shadows {
        drop_shadow: drop.to_string(),
        inner_shadow: inner.to_string(),
        ambient_blur: blur.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_stay_within_preset_range() {
        for body_type in BodyType::ALL {
            let pos = positioning_for(body_type);
            assert!((0.88..=1.08).contains(&pos.scale), "{body_type}");
            assert!(pos.transform.contains(&format!("scale({})", pos.scale)));
        }
    }

    #[test]
    fn average_transform_is_formatted() {
        let pos = positioning_for(BodyType::Average);
        assert_eq!(pos.top, "14%");
        assert_eq!(
            pos.transform,
            "translate(-50%, 0%) scale(0.95) perspective(1000px) rotateX(1deg)"
        );
    }

    #[test]
    fn every_body_type_has_distinct_shadows() {
        let petite = shadows_for(BodyType::Petite);
        let curvy = shadows_for(BodyType::Curvy);
        assert_ne!(petite, curvy);
        assert!(curvy.drop_shadow.starts_with("drop-shadow("));
    }

    #[test]
    fn body_config_uses_type_key() {
        let cfg: BodyConfig = serde_json::from_str(r#"{"type":"tall"}"#).unwrap();
        assert_eq!(cfg.body_type, BodyType::Tall);
        assert_eq!("Curvy".parse::<BodyType>(), Ok(BodyType::Curvy));
    }
}

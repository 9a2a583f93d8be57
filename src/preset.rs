//! Lighting presets as supplied by configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// Animation applied to a preset's colors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum AnimationKind {
    #[default]
    Static,
    Breathe,
    GradientSweep,
}

impl AnimationKind {
    pub const ALL: [AnimationKind; 3] = [
        AnimationKind::Static,
        AnimationKind::Breathe,
        AnimationKind::GradientSweep,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AnimationKind::Static => "Static",
            AnimationKind::Breathe => "Breathe",
            AnimationKind::GradientSweep => "GradientSweep",
        }
    }

    /// Lenient lookup used for stored presets: blank or unknown names fall
    /// back to `Static`.
    pub fn from_name_or_static(name: Option<&str>) -> Self {
        name.and_then(|n| n.parse().ok()).unwrap_or_default()
    }
}

impl fmt::Display for AnimationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AnimationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "static" => Ok(AnimationKind::Static),
            "breathe" => Ok(AnimationKind::Breathe),
            "gradientsweep" | "gradient-sweep" | "gradient" => Ok(AnimationKind::GradientSweep),
            _ => {
                let known: Vec<&str> = AnimationKind::ALL.iter().map(|k| k.name()).collect();
                Err(format!(
                    "unknown animation: \"{s}\". Use one of: {}",
                    known.join(", ")
                ))
            }
        }
    }
}

impl<'de> Deserialize<'de> for AnimationKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = Option::<String>::deserialize(deserializer)?;
        Ok(AnimationKind::from_name_or_static(name.as_deref()))
    }
}

/// A named set of LED colors plus the animation that renders them.
///
/// Colors are kept as text exactly as configured; they are validated and
/// normalized when the preset is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Preset {
    pub name: String,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub animation: AnimationKind,
}

impl Preset {
    pub fn new(
        name: impl Into<String>,
        colors: impl IntoIterator<Item = impl Into<String>>,
        animation: AnimationKind,
    ) -> Self {
        Self {
            name: name.into(),
            colors: colors.into_iter().map(Into::into).collect(),
            animation,
        }
    }
}

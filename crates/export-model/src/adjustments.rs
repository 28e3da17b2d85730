//! Global and per-range color corrections.
//!
//! [`PartialAdjustments`] is what an editor session accumulates: any field may be
//! missing. [`ColorAdjustments`] is the complete form sent to the engine. The two are
//! connected by [`PartialAdjustments::resolve`], which fills every gap with its
//! documented default. Values are never range-checked here; the engine clamps them.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Default color-grading blending.
pub const DEFAULT_BLENDING: f64 = 50.0;

/// The eight HSL mixer bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HslBand {
    Reds,
    Oranges,
    Yellows,
    Greens,
    Aquas,
    Blues,
    Purples,
    Magentas,
}

impl HslBand {
    pub const ALL: [HslBand; 8] = [
        HslBand::Reds,
        HslBand::Oranges,
        HslBand::Yellows,
        HslBand::Greens,
        HslBand::Aquas,
        HslBand::Blues,
        HslBand::Purples,
        HslBand::Magentas,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            HslBand::Reds => "reds",
            HslBand::Oranges => "oranges",
            HslBand::Yellows => "yellows",
            HslBand::Greens => "greens",
            HslBand::Aquas => "aquas",
            HslBand::Blues => "blues",
            HslBand::Purples => "purples",
            HslBand::Magentas => "magentas",
        }
    }
}

/// Tonal range of the three-way color grading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradingRange {
    Shadows,
    Midtones,
    Highlights,
}

impl GradingRange {
    pub const ALL: [GradingRange; 3] = [
        GradingRange::Shadows,
        GradingRange::Midtones,
        GradingRange::Highlights,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            GradingRange::Shadows => "shadows",
            GradingRange::Midtones => "midtones",
            GradingRange::Highlights => "highlights",
        }
    }
}

/// Hue / saturation / luminance component of a grading wheel or HSL band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Hue,
    Saturation,
    Luminance,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Hue, Channel::Saturation, Channel::Luminance];

    pub fn as_str(self) -> &'static str {
        match self {
            Channel::Hue => "hue",
            Channel::Saturation => "saturation",
            Channel::Luminance => "luminance",
        }
    }
}

/// Address of one leaf value in an adjustments record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdjustmentField {
    Temperature,
    Tint,
    Vibrance,
    Saturation,
    Grading { range: GradingRange, channel: Channel },
    GradingBlending,
    GradingBalance,
    Hsl { band: HslBand, channel: Channel },
}

impl AdjustmentField {
    /// Every leaf field, in a stable order.
    pub fn all() -> Vec<AdjustmentField> {
        let mut fields = vec![
            AdjustmentField::Temperature,
            AdjustmentField::Tint,
            AdjustmentField::Vibrance,
            AdjustmentField::Saturation,
        ];
        for range in GradingRange::ALL {
            for channel in Channel::ALL {
                fields.push(AdjustmentField::Grading { range, channel });
            }
        }
        fields.push(AdjustmentField::GradingBlending);
        fields.push(AdjustmentField::GradingBalance);
        for band in HslBand::ALL {
            for channel in Channel::ALL {
                fields.push(AdjustmentField::Hsl { band, channel });
            }
        }
        fields
    }

    /// Value a missing field resolves to.
    pub fn default_value(self) -> f64 {
        match self {
            AdjustmentField::GradingBlending => DEFAULT_BLENDING,
            _ => 0.0,
        }
    }
}

impl fmt::Display for AdjustmentField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdjustmentField::Temperature => f.write_str("temperature"),
            AdjustmentField::Tint => f.write_str("tint"),
            AdjustmentField::Vibrance => f.write_str("vibrance"),
            AdjustmentField::Saturation => f.write_str("saturation"),
            AdjustmentField::Grading { range, channel } => {
                write!(f, "colorGrading.{}.{}", range.as_str(), channel.as_str())
            }
            AdjustmentField::GradingBlending => f.write_str("colorGrading.blending"),
            AdjustmentField::GradingBalance => f.write_str("colorGrading.balance"),
            AdjustmentField::Hsl { band, channel } => {
                write!(f, "hsl.{}.{}", band.as_str(), channel.as_str())
            }
        }
    }
}

/// Unknown adjustment field path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown adjustment field `{0}`")]
pub struct UnknownField(pub String);

impl FromStr for AdjustmentField {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AdjustmentField::all()
            .into_iter()
            .find(|field| field.to_string() == s)
            .ok_or_else(|| UnknownField(s.to_string()))
    }
}

/// Hue/saturation/luminance triple with every component present.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Tone {
    pub hue: f64,
    pub saturation: f64,
    pub luminance: f64,
}

impl Tone {
    fn get(&self, channel: Channel) -> f64 {
        match channel {
            Channel::Hue => self.hue,
            Channel::Saturation => self.saturation,
            Channel::Luminance => self.luminance,
        }
    }

    fn set(&mut self, channel: Channel, value: f64) {
        match channel {
            Channel::Hue => self.hue = value,
            Channel::Saturation => self.saturation = value,
            Channel::Luminance => self.luminance = value,
        }
    }
}

/// Complete three-way color grading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorGrading {
    pub shadows: Tone,
    pub midtones: Tone,
    pub highlights: Tone,
    pub blending: f64,
    pub balance: f64,
}

impl Default for ColorGrading {
    fn default() -> Self {
        Self {
            shadows: Tone::default(),
            midtones: Tone::default(),
            highlights: Tone::default(),
            blending: DEFAULT_BLENDING,
            balance: 0.0,
        }
    }
}

impl ColorGrading {
    pub fn wheel(&self, range: GradingRange) -> &Tone {
        match range {
            GradingRange::Shadows => &self.shadows,
            GradingRange::Midtones => &self.midtones,
            GradingRange::Highlights => &self.highlights,
        }
    }

    fn wheel_mut(&mut self, range: GradingRange) -> &mut Tone {
        match range {
            GradingRange::Shadows => &mut self.shadows,
            GradingRange::Midtones => &mut self.midtones,
            GradingRange::Highlights => &mut self.highlights,
        }
    }
}

/// Complete adjustments, as submitted to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorAdjustments {
    pub temperature: f64,
    pub tint: f64,
    pub vibrance: f64,
    pub saturation: f64,
    pub color_grading: ColorGrading,
    /// All eight bands, always present.
    pub hsl: BTreeMap<HslBand, Tone>,
}

impl Default for ColorAdjustments {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            tint: 0.0,
            vibrance: 0.0,
            saturation: 0.0,
            color_grading: ColorGrading::default(),
            hsl: HslBand::ALL
                .into_iter()
                .map(|band| (band, Tone::default()))
                .collect(),
        }
    }
}

impl ColorAdjustments {
    /// Read one leaf value.
    pub fn value(&self, field: AdjustmentField) -> f64 {
        match field {
            AdjustmentField::Temperature => self.temperature,
            AdjustmentField::Tint => self.tint,
            AdjustmentField::Vibrance => self.vibrance,
            AdjustmentField::Saturation => self.saturation,
            AdjustmentField::Grading { range, channel } => {
                self.color_grading.wheel(range).get(channel)
            }
            AdjustmentField::GradingBlending => self.color_grading.blending,
            AdjustmentField::GradingBalance => self.color_grading.balance,
            AdjustmentField::Hsl { band, channel } => self
                .hsl
                .get(&band)
                .map(|tone| tone.get(channel))
                .unwrap_or_else(|| field.default_value()),
        }
    }

    fn set(&mut self, field: AdjustmentField, value: f64) {
        match field {
            AdjustmentField::Temperature => self.temperature = value,
            AdjustmentField::Tint => self.tint = value,
            AdjustmentField::Vibrance => self.vibrance = value,
            AdjustmentField::Saturation => self.saturation = value,
            AdjustmentField::Grading { range, channel } => {
                self.color_grading.wheel_mut(range).set(channel, value)
            }
            AdjustmentField::GradingBlending => self.color_grading.blending = value,
            AdjustmentField::GradingBalance => self.color_grading.balance = value,
            AdjustmentField::Hsl { band, channel } => {
                self.hsl.entry(band).or_default().set(channel, value)
            }
        }
    }
}

/// Hue/saturation/luminance triple where any component may be missing.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialTone {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hue: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saturation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub luminance: Option<f64>,
}

impl PartialTone {
    fn get(&self, channel: Channel) -> Option<f64> {
        match channel {
            Channel::Hue => self.hue,
            Channel::Saturation => self.saturation,
            Channel::Luminance => self.luminance,
        }
    }

    fn set(&mut self, channel: Channel, value: f64) {
        match channel {
            Channel::Hue => self.hue = Some(value),
            Channel::Saturation => self.saturation = Some(value),
            Channel::Luminance => self.luminance = Some(value),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hue.is_none() && self.saturation.is_none() && self.luminance.is_none()
    }
}

/// Color grading where any field may be missing.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialColorGrading {
    #[serde(skip_serializing_if = "PartialTone::is_empty")]
    pub shadows: PartialTone,
    #[serde(skip_serializing_if = "PartialTone::is_empty")]
    pub midtones: PartialTone,
    #[serde(skip_serializing_if = "PartialTone::is_empty")]
    pub highlights: PartialTone,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blending: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<f64>,
}

impl PartialColorGrading {
    fn wheel(&self, range: GradingRange) -> &PartialTone {
        match range {
            GradingRange::Shadows => &self.shadows,
            GradingRange::Midtones => &self.midtones,
            GradingRange::Highlights => &self.highlights,
        }
    }

    fn wheel_mut(&mut self, range: GradingRange) -> &mut PartialTone {
        match range {
            GradingRange::Shadows => &mut self.shadows,
            GradingRange::Midtones => &mut self.midtones,
            GradingRange::Highlights => &mut self.highlights,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.shadows.is_empty()
            && self.midtones.is_empty()
            && self.highlights.is_empty()
            && self.blending.is_none()
            && self.balance.is_none()
    }
}

/// Adjustments as edited: every field optional.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartialAdjustments {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tint: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vibrance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saturation: Option<f64>,
    #[serde(skip_serializing_if = "PartialColorGrading::is_empty")]
    pub color_grading: PartialColorGrading,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub hsl: BTreeMap<HslBand, PartialTone>,
}

impl PartialAdjustments {
    /// Read one leaf value if it has been set.
    pub fn get(&self, field: AdjustmentField) -> Option<f64> {
        match field {
            AdjustmentField::Temperature => self.temperature,
            AdjustmentField::Tint => self.tint,
            AdjustmentField::Vibrance => self.vibrance,
            AdjustmentField::Saturation => self.saturation,
            AdjustmentField::Grading { range, channel } => {
                self.color_grading.wheel(range).get(channel)
            }
            AdjustmentField::GradingBlending => self.color_grading.blending,
            AdjustmentField::GradingBalance => self.color_grading.balance,
            AdjustmentField::Hsl { band, channel } => {
                self.hsl.get(&band).and_then(|tone| tone.get(channel))
            }
        }
    }

    /// Copy of `self` with exactly one leaf replaced. `self` is left untouched.
    pub fn merge_field(&self, field: AdjustmentField, value: f64) -> Self {
        let mut next = self.clone();
        match field {
            AdjustmentField::Temperature => next.temperature = Some(value),
            AdjustmentField::Tint => next.tint = Some(value),
            AdjustmentField::Vibrance => next.vibrance = Some(value),
            AdjustmentField::Saturation => next.saturation = Some(value),
            AdjustmentField::Grading { range, channel } => {
                next.color_grading.wheel_mut(range).set(channel, value)
            }
            AdjustmentField::GradingBlending => next.color_grading.blending = Some(value),
            AdjustmentField::GradingBalance => next.color_grading.balance = Some(value),
            AdjustmentField::Hsl { band, channel } => {
                next.hsl.entry(band).or_default().set(channel, value)
            }
        }
        next
    }

    /// Fill every missing field with its default.
    pub fn resolve(&self) -> ColorAdjustments {
        let mut complete = ColorAdjustments::default();
        for field in AdjustmentField::all() {
            if let Some(value) = self.get(field) {
                complete.set(field, value);
            }
        }
        complete
    }

    /// Whether nothing has been set.
    pub fn is_empty(&self) -> bool {
        self.temperature.is_none()
            && self.tint.is_none()
            && self.vibrance.is_none()
            && self.saturation.is_none()
            && self.color_grading.is_empty()
            && self.hsl.values().all(PartialTone::is_empty)
    }
}

impl From<&ColorAdjustments> for PartialAdjustments {
    fn from(complete: &ColorAdjustments) -> Self {
        AdjustmentField::all()
            .into_iter()
            .fold(PartialAdjustments::default(), |acc, field| {
                acc.merge_field(field, complete.value(field))
            })
    }
}

impl From<ColorAdjustments> for PartialAdjustments {
    fn from(complete: ColorAdjustments) -> Self {
        PartialAdjustments::from(&complete)
    }
}

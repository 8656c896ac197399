//! Shadow Configuration
//!
//! Per-frame shadow settings with serde support for hot-reload. Settings are
//! treated as immutable for the duration of a frame; the host swaps them
//! between frames.

use serde::{Serialize, Deserialize};

use crate::cascade::MAX_CASCADES;
use crate::error::Result;

/// Global shadow settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowSettings {
    /// Maximum distance from the camera at which shadows are rendered
    pub max_distance: f32,

    /// Fraction of `max_distance` over which shadows fade out (0-1]
    pub distance_fade: f32,

    /// Directional light atlas and cascade settings
    pub directional: DirectionalShadowSettings,

    /// Spot and point light atlas settings
    pub other: OtherShadowSettings,

    /// How baked shadow masks combine with realtime shadows
    pub shadow_mask_mode: ShadowMaskMode,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            max_distance: 100.0,
            distance_fade: 0.1,
            directional: DirectionalShadowSettings::default(),
            other: OtherShadowSettings::default(),
            shadow_mask_mode: ShadowMaskMode::DistanceShadowmask,
        }
    }
}

impl ShadowSettings {
    /// Parse settings from JSON, validating the result
    pub fn from_json(json: &str) -> Result<Self> {
        let mut settings: Self = serde_json::from_str(json)?;
        settings.validate();
        Ok(settings)
    }

    /// Serialize settings to pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Shadow distance handed to the culling collaborator
    pub fn culling_distance(&self, camera_far: f32) -> f32 {
        self.max_distance.min(camera_far)
    }

    /// Validate settings and clamp values to valid ranges
    ///
    /// Out-of-range values are logged and corrected rather than rejected, so a
    /// bad hot-reload never takes shadows down.
    pub fn validate(&mut self) {
        if self.max_distance < 0.001 {
            log::warn!("Shadow max distance {} clamped to 0.001", self.max_distance);
            self.max_distance = 0.001;
        }
        self.distance_fade = clamp_fade("distance fade", self.distance_fade);
        self.directional.validate();
    }
}

fn clamp_fade(name: &str, value: f32) -> f32 {
    let clamped = value.clamp(0.001, 1.0);
    if clamped != value {
        log::warn!("Shadow {} {} clamped to {}", name, value, clamped);
    }
    clamped
}

/// Directional light shadow settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectionalShadowSettings {
    /// Atlas resolution
    pub atlas_size: AtlasSize,

    /// Percentage-closer filter kernel
    pub filter: FilterMode,

    /// Number of cascades (0-4)
    pub cascade_count: u32,

    /// Fractional split ratios for the first three cascades, non-decreasing
    pub cascade_ratios: [f32; 3],

    /// Fraction of each cascade over which it fades into the next (0-1]
    pub cascade_fade: f32,

    /// How adjacent cascades are blended in the shading pass
    pub cascade_blend: CascadeBlendMode,
}

impl Default for DirectionalShadowSettings {
    fn default() -> Self {
        Self {
            atlas_size: AtlasSize::S1024,
            filter: FilterMode::Pcf2x2,
            cascade_count: 4,
            cascade_ratios: [0.1, 0.25, 0.5],
            cascade_fade: 0.1,
            cascade_blend: CascadeBlendMode::Hard,
        }
    }
}

impl DirectionalShadowSettings {
    fn validate(&mut self) {
        if self.cascade_count > MAX_CASCADES as u32 {
            log::warn!(
                "Cascade count {} exceeds capacity, clamped to {}",
                self.cascade_count,
                MAX_CASCADES
            );
            self.cascade_count = MAX_CASCADES as u32;
        }

        let mut previous = 0.0f32;
        for ratio in self.cascade_ratios.iter_mut() {
            let clamped = ratio.clamp(f32::EPSILON, 1.0).max(previous);
            if clamped != *ratio {
                log::warn!("Cascade ratio {} clamped to {}", ratio, clamped);
                *ratio = clamped;
            }
            previous = *ratio;
        }

        self.cascade_fade = clamp_fade("cascade fade", self.cascade_fade);
    }
}

/// Spot and point light shadow settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OtherShadowSettings {
    /// Atlas resolution
    pub atlas_size: AtlasSize,

    /// Percentage-closer filter kernel
    pub filter: FilterMode,
}

impl Default for OtherShadowSettings {
    fn default() -> Self {
        Self {
            atlas_size: AtlasSize::S1024,
            filter: FilterMode::Pcf2x2,
        }
    }
}

/// Shadow atlas resolution (square, power of two)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AtlasSize {
    S256,
    S512,
    S1024,
    S2048,
    S4096,
    S8192,
}

impl AtlasSize {
    /// Edge length in texels
    pub fn texels(self) -> u32 {
        match self {
            Self::S256 => 256,
            Self::S512 => 512,
            Self::S1024 => 1024,
            Self::S2048 => 2048,
            Self::S4096 => 4096,
            Self::S8192 => 8192,
        }
    }
}

/// Percentage-closer filter kernel
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterMode {
    /// Hardware 2x2 bilinear comparison only
    #[default]
    Pcf2x2,
    Pcf3x3,
    Pcf5x5,
    Pcf7x7,
}

impl FilterMode {
    /// Multiplier applied to the texel size to get the filter footprint
    pub fn kernel_width(self) -> f32 {
        match self {
            Self::Pcf2x2 => 1.0,
            Self::Pcf3x3 => 2.0,
            Self::Pcf5x5 => 3.0,
            Self::Pcf7x7 => 4.0,
        }
    }

    /// Index of the shader keyword to enable, `None` for the built-in 2x2
    pub fn keyword_index(self) -> Option<usize> {
        match self {
            Self::Pcf2x2 => None,
            Self::Pcf3x3 => Some(0),
            Self::Pcf5x5 => Some(1),
            Self::Pcf7x7 => Some(2),
        }
    }
}

/// Cascade transition mode
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CascadeBlendMode {
    #[default]
    Hard,
    Soft,
    Dither,
}

impl CascadeBlendMode {
    /// Index of the shader keyword to enable, `None` for hard transitions
    pub fn keyword_index(self) -> Option<usize> {
        match self {
            Self::Hard => None,
            Self::Soft => Some(0),
            Self::Dither => Some(1),
        }
    }
}

/// Baked shadow mask mode
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShadowMaskMode {
    /// Baked shadows are always used for static casters
    Shadowmask,
    /// Baked shadows only beyond the realtime shadow distance
    #[default]
    DistanceShadowmask,
}

impl ShadowMaskMode {
    /// Index of the shader keyword to enable when a shadow mask is in use
    pub fn keyword_index(self) -> usize {
        match self {
            Self::Shadowmask => 0,
            Self::DistanceShadowmask => 1,
        }
    }
}

/// Shadow quality preset
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShadowQuality {
    Low,
    Medium,
    High,
    Ultra,
}

impl ShadowQuality {
    /// Convert to settings
    pub fn to_settings(self) -> ShadowSettings {
        match self {
            Self::Low => ShadowSettings {
                max_distance: 50.0,
                directional: DirectionalShadowSettings {
                    atlas_size: AtlasSize::S1024,
                    cascade_count: 2,
                    cascade_ratios: [0.25, 0.5, 0.75],
                    ..Default::default()
                },
                other: OtherShadowSettings {
                    atlas_size: AtlasSize::S512,
                    filter: FilterMode::Pcf2x2,
                },
                ..Default::default()
            },
            Self::Medium => ShadowSettings::default(),
            Self::High => ShadowSettings {
                directional: DirectionalShadowSettings {
                    atlas_size: AtlasSize::S2048,
                    filter: FilterMode::Pcf5x5,
                    cascade_blend: CascadeBlendMode::Soft,
                    ..Default::default()
                },
                other: OtherShadowSettings {
                    atlas_size: AtlasSize::S2048,
                    filter: FilterMode::Pcf5x5,
                },
                ..Default::default()
            },
            Self::Ultra => ShadowSettings {
                max_distance: 150.0,
                directional: DirectionalShadowSettings {
                    atlas_size: AtlasSize::S4096,
                    filter: FilterMode::Pcf7x7,
                    cascade_blend: CascadeBlendMode::Dither,
                    ..Default::default()
                },
                other: OtherShadowSettings {
                    atlas_size: AtlasSize::S4096,
                    filter: FilterMode::Pcf7x7,
                },
                shadow_mask_mode: ShadowMaskMode::Shadowmask,
                ..Default::default()
            },
        }
    }
}

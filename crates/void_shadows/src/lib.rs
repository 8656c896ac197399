//! # void_shadows - Shadow Atlas Allocation and Projection
//!
//! Backend-agnostic shadow mapping bookkeeping for directional, spot and
//! point lights. Each frame the system decides which lights get shadow-map
//! space, tiles two depth atlases among them, builds atlas-space sampling
//! matrices and publishes the per-tile data a shading pass needs.
//!
//! ## Architecture
//!
//! - **Config**: Shadow settings with serde support for hot-reload
//! - **Reservation**: Admission control and slot allocation per light
//! - **Atlas**: Tile grid selection for both atlases
//! - **Projection**: Atlas-space matrices and border-corrected tiles
//! - **Cascade**: Culling spheres and blend data for directional cascades
//! - **Renderer**: Frame protocol, rendering and publishing
//! - **Lighting**: Light arrays for the shading pass
//!
//! Culling, rasterization and GPU resources belong to the host and are reached
//! through the traits in [`collaborators`].
//!
//! ## Example
//!
//! ```ignore
//! use void_shadows::prelude::*;
//!
//! let mut shadows = ShadowSystem::new(DeviceConventions::reversed_z());
//! let mut lighting = LightingSetup::default();
//! let settings = ShadowQuality::High.to_settings();
//!
//! // Per frame
//! shadows.begin_frame(&settings)?;
//! lighting.setup(&visible_lights, &mut shadows, &culling)?;
//! lighting.publish(&mut commands);
//! shadows.render(&mut culling, &mut commands, &mut NoDebugHooks)?;
//!
//! // ... shading pass samples the atlases ...
//!
//! shadows.cleanup(&mut commands)?;
//! ```

pub mod error;
pub mod config;
pub mod light;
pub mod collaborators;
pub mod properties;
pub mod keywords;
pub mod atlas;
pub mod projection;
pub mod cascade;
pub mod reservation;
pub mod data;
pub mod renderer;
pub mod lighting;

pub use error::{ShadowError, Result};

pub use config::{
    ShadowSettings, DirectionalShadowSettings, OtherShadowSettings,
    AtlasSize, FilterMode, CascadeBlendMode, ShadowMaskMode, ShadowQuality,
};

pub use light::{
    LightId, LightKind, VisibleLight, ShadowMode,
    BakeType, MixedLightingMode, LightBakeOutput,
};

pub use collaborators::{
    CasterBounds, ShadowSplitData, ShadowMatrices, CubeFace, ShadowMapDesc,
    ShadowCulling, ShadowCommandBuffer, ShadowDebugHooks, NoDebugHooks,
};

pub use properties::{
    PropertyId, PropertyResolver, HashedPropertyResolver, ShadowPropertyIds,
};

pub use keywords::KeywordGroup;

pub use atlas::{AtlasKind, AtlasLayout, TileRect};

pub use projection::{
    DepthConvention, DeviceConventions, OtherTile, TileFilter,
    to_atlas_matrix, flip_view_y,
};

pub use cascade::{
    CascadeDatum, CascadeSet, cascade_blend_culling_factor, MAX_CASCADES,
};

pub use reservation::{
    ShadowReservation, ShadowParams, ShadowedDirectionalLight, ShadowedOtherLight,
    MAX_SHADOWED_DIRECTIONAL_LIGHTS, MAX_SHADOWED_OTHER_LIGHTS,
};

pub use data::{
    GpuShadowGlobals, GpuDirectionalShadows, GpuOtherShadows, ShadowFrameData,
    MAX_DIRECTIONAL_TILES,
};

pub use renderer::{FramePhase, ShadowFrameStats, ShadowRenderer, ShadowSystem};

pub use lighting::{
    LightingSetup, LightingPropertyIds, GpuDirectionalLight, GpuOtherLight,
    MAX_DIRECTIONAL_LIGHTS, MAX_OTHER_LIGHTS,
};

/// Prelude - commonly used types
pub mod prelude {
    pub use crate::config::{ShadowSettings, ShadowQuality, FilterMode, CascadeBlendMode, ShadowMaskMode};
    pub use crate::light::{VisibleLight, LightKind, ShadowMode, LightBakeOutput};
    pub use crate::collaborators::{
        ShadowCulling, ShadowCommandBuffer, ShadowDebugHooks, NoDebugHooks,
        ShadowMatrices, ShadowSplitData, CubeFace, CasterBounds,
    };
    pub use crate::projection::DeviceConventions;
    pub use crate::renderer::{ShadowSystem, FramePhase, ShadowFrameStats};
    pub use crate::lighting::LightingSetup;
    pub use crate::error::{ShadowError, Result};
}

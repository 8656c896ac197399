//! Shadow Reservation
//!
//! Admission control for the shadow atlases. During lighting setup every
//! visible light asks for shadow space; lights that qualify get the next free
//! slot(s) and everyone gets back a [`ShadowParams`] vector telling the
//! shading pass how to sample (or fade) its shadows.
//!
//! # Slot allocation
//!
//! - Directional lights take one slot each, up to
//!   [`MAX_SHADOWED_DIRECTIONAL_LIGHTS`]; a light's cascades start at tile
//!   `slot * cascade_count`.
//! - Spot lights take one other-light slot, point lights six contiguous ones
//!   (one per cube face), up to [`MAX_SHADOWED_OTHER_LIGHTS`] slots.
//! - Slots are handed out in request order and never reused within a frame.
//!
//! Storage is fixed-size and reset in place each frame.

use glam::Vec4;

use crate::collaborators::ShadowCulling;
use crate::light::VisibleLight;

/// Maximum directional lights with shadows per frame
pub const MAX_SHADOWED_DIRECTIONAL_LIGHTS: usize = 4;

/// Other-light atlas slots per frame (a point light uses six)
pub const MAX_SHADOWED_OTHER_LIGHTS: usize = 16;

/// Shadow parameters returned to lighting setup for one light
///
/// Layout (x, y, z, w):
/// - directional: strength, first cascade tile, normal bias, mask channel
/// - other: strength, first tile, 1 if point light else 0, mask channel
///
/// A negative strength means "no realtime shadow geometry, but keep the baked
/// shadow fade"; zero strength means no shadows at all.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ShadowParams {
    pub strength: f32,
    pub tile_index: f32,
    pub bias_or_kind: f32,
    pub mask_channel: f32,
}

impl ShadowParams {
    /// No shadows for a directional light
    pub fn none() -> Self {
        Self::default()
    }

    fn new(strength: f32, tile_index: usize, bias_or_kind: f32, mask_channel: i32) -> Self {
        Self {
            strength,
            tile_index: tile_index as f32,
            bias_or_kind,
            mask_channel: mask_channel as f32,
        }
    }

    /// Whether the light received atlas space
    pub fn is_reserved(&self) -> bool {
        self.strength > 0.0
    }

    pub fn to_vec4(&self) -> Vec4 {
        Vec4::new(self.strength, self.tile_index, self.bias_or_kind, self.mask_channel)
    }
}

/// A directional light that received atlas space
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ShadowedDirectionalLight {
    /// Index into this frame's visible-light list
    pub visible_light_index: usize,

    pub slope_scale_bias: f32,

    pub near_plane_offset: f32,
}

/// A spot or point light that received atlas space
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ShadowedOtherLight {
    /// Index into this frame's visible-light list
    pub visible_light_index: usize,

    pub slope_scale_bias: f32,

    pub normal_bias: f32,

    pub is_point: bool,
}

impl ShadowedOtherLight {
    /// Slots this light occupies
    pub fn slot_count(&self) -> usize {
        if self.is_point { 6 } else { 1 }
    }
}

/// Per-frame reservation tables
#[derive(Clone, Debug)]
pub struct ShadowReservation {
    directional: [ShadowedDirectionalLight; MAX_SHADOWED_DIRECTIONAL_LIGHTS],
    directional_count: usize,

    /// Indexed by first slot; the remaining slots of a point light are unused
    other: [ShadowedOtherLight; MAX_SHADOWED_OTHER_LIGHTS],
    other_slot_count: usize,

    cascade_count: usize,

    uses_shadow_mask: bool,

    /// Lights that wanted shadows but were turned away this frame
    rejected: u32,
}

impl Default for ShadowReservation {
    fn default() -> Self {
        Self::new()
    }
}

impl ShadowReservation {
    pub fn new() -> Self {
        Self {
            directional: [ShadowedDirectionalLight::default(); MAX_SHADOWED_DIRECTIONAL_LIGHTS],
            directional_count: 0,
            other: [ShadowedOtherLight::default(); MAX_SHADOWED_OTHER_LIGHTS],
            other_slot_count: 0,
            cascade_count: 0,
            uses_shadow_mask: false,
            rejected: 0,
        }
    }

    /// Discard the previous frame's reservations
    pub fn reset(&mut self, cascade_count: usize) {
        self.directional_count = 0;
        self.other_slot_count = 0;
        self.cascade_count = cascade_count;
        self.uses_shadow_mask = false;
        self.rejected = 0;
    }

    /// Request atlas space for a directional light
    pub fn reserve_directional(
        &mut self,
        light: &VisibleLight,
        visible_light_index: usize,
        culling: &impl ShadowCulling,
    ) -> ShadowParams {
        if !light.casts_shadows() {
            return ShadowParams::none();
        }

        if self.directional_count >= MAX_SHADOWED_DIRECTIONAL_LIGHTS {
            log::warn!(
                "Directional shadow capacity reached, light {} unshadowed",
                light.id
            );
            self.rejected += 1;
            return ShadowParams::none();
        }

        let mask_channel = self.track_shadow_mask(light);

        if culling.shadow_caster_bounds(visible_light_index).is_none() {
            return ShadowParams::new(-light.shadow_strength, 0, 0.0, mask_channel);
        }

        let slot = self.directional_count;
        self.directional[slot] = ShadowedDirectionalLight {
            visible_light_index,
            slope_scale_bias: light.shadow_bias,
            near_plane_offset: light.shadow_near_plane,
        };
        self.directional_count += 1;

        log::trace!("Directional light {} reserved slot {}", light.id, slot);

        ShadowParams::new(
            light.shadow_strength,
            slot * self.cascade_count,
            light.shadow_normal_bias,
            mask_channel,
        )
    }

    /// Request atlas space for a spot or point light
    ///
    /// Point lights need six contiguous slots; if they do not fit, nothing is
    /// taken.
    pub fn reserve_other(
        &mut self,
        light: &VisibleLight,
        visible_light_index: usize,
        culling: &impl ShadowCulling,
    ) -> ShadowParams {
        let is_point = light.is_point();
        let kind = if is_point { 1.0 } else { 0.0 };

        if !light.casts_shadows() {
            return ShadowParams::new(0.0, 0, kind, -1);
        }

        let mask_channel = self.track_shadow_mask(light);

        let slots = if is_point { 6 } else { 1 };
        let new_count = self.other_slot_count + slots;

        if new_count > MAX_SHADOWED_OTHER_LIGHTS {
            log::warn!(
                "Other shadow capacity reached ({} + {} slots), light {} unshadowed",
                self.other_slot_count,
                slots,
                light.id
            );
            self.rejected += 1;
            return ShadowParams::new(-light.shadow_strength, 0, kind, mask_channel);
        }

        if culling.shadow_caster_bounds(visible_light_index).is_none() {
            return ShadowParams::new(-light.shadow_strength, 0, kind, mask_channel);
        }

        let slot = self.other_slot_count;
        self.other[slot] = ShadowedOtherLight {
            visible_light_index,
            slope_scale_bias: light.shadow_bias,
            normal_bias: light.shadow_normal_bias,
            is_point,
        };
        self.other_slot_count = new_count;

        log::trace!("Light {} reserved other slots {}..{}", light.id, slot, new_count);

        ShadowParams::new(light.shadow_strength, slot, kind, mask_channel)
    }

    fn track_shadow_mask(&mut self, light: &VisibleLight) -> i32 {
        match light.bake.shadow_mask_channel() {
            Some(channel) => {
                self.uses_shadow_mask = true;
                channel
            }
            None => -1,
        }
    }

    /// Reserved directional lights in slot order
    pub fn directional_lights(&self) -> &[ShadowedDirectionalLight] {
        &self.directional[..self.directional_count]
    }

    /// Reserved other lights with their first slot, in slot order
    pub fn other_lights(&self) -> impl Iterator<Item = (usize, &ShadowedOtherLight)> + '_ {
        let mut slot = 0;
        core::iter::from_fn(move || {
            if slot >= self.other_slot_count {
                return None;
            }
            let light = &self.other[slot];
            let first = slot;
            slot += light.slot_count();
            Some((first, light))
        })
    }

    pub fn directional_count(&self) -> usize {
        self.directional_count
    }

    /// Occupied other-light slots (six per point light)
    pub fn other_slot_count(&self) -> usize {
        self.other_slot_count
    }

    /// Directional atlas tiles needed this frame
    pub fn directional_tile_count(&self) -> usize {
        self.directional_count * self.cascade_count
    }

    pub fn cascade_count(&self) -> usize {
        self.cascade_count
    }

    /// Whether any shadow-casting light uses a baked shadow mask
    pub fn uses_shadow_mask(&self) -> bool {
        self.uses_shadow_mask
    }

    pub fn rejected_count(&self) -> u32 {
        self.rejected
    }
}

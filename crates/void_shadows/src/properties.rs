//! Shader property handles
//!
//! Global shader data is addressed through opaque [`PropertyId`]s. The host
//! resolves every name once at start-up through a [`PropertyResolver`] and
//! hands the resulting table to the publish step.

use core::fmt;

/// Opaque handle for a global shader property
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PropertyId(pub u64);

impl PropertyId {
    /// Create an ID from a name using FNV-1a
    pub const fn from_name(name: &str) -> Self {
        let bytes = name.as_bytes();
        let mut hash = 0xcbf29ce484222325u64;
        let mut i = 0;
        while i < bytes.len() {
            hash ^= bytes[i] as u64;
            hash = hash.wrapping_mul(0x100000001b3);
            i += 1;
        }
        Self(hash)
    }
}

impl fmt::Debug for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PropertyId({:016x})", self.0)
    }
}

/// Maps property names to backend handles
pub trait PropertyResolver {
    fn resolve(&self, name: &str) -> PropertyId;
}

/// Resolver that hashes names, for backends keyed by name hash
#[derive(Clone, Copy, Debug, Default)]
pub struct HashedPropertyResolver;

impl PropertyResolver for HashedPropertyResolver {
    fn resolve(&self, name: &str) -> PropertyId {
        PropertyId::from_name(name)
    }
}

/// Every global property the shadow system reads or writes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShadowPropertyIds {
    pub directional_atlas: PropertyId,
    pub directional_matrices: PropertyId,
    pub cascade_culling_spheres: PropertyId,
    pub cascade_count: PropertyId,
    pub cascade_data: PropertyId,
    pub other_atlas: PropertyId,
    pub other_matrices: PropertyId,
    pub other_tiles: PropertyId,
    pub distance_fade: PropertyId,
    pub atlas_size: PropertyId,
    pub pancaking: PropertyId,
}

impl ShadowPropertyIds {
    /// Property names, in field order
    pub const NAMES: [&'static str; 11] = [
        "_DirectionalShadowAtlas",
        "_DirectionalShadowMatrices",
        "_CascadeCullingSpheres",
        "_CascadeCount",
        "_CascadeData",
        "_OtherShadowAtlas",
        "_OtherShadowMatrices",
        "_OtherShadowTiles",
        "_ShadowDistanceFade",
        "_ShadowAtlasSize",
        "_ShadowPancaking",
    ];

    /// Resolve all handles once
    pub fn resolve(resolver: &impl PropertyResolver) -> Self {
        let [
            directional_atlas,
            directional_matrices,
            cascade_culling_spheres,
            cascade_count,
            cascade_data,
            other_atlas,
            other_matrices,
            other_tiles,
            distance_fade,
            atlas_size,
            pancaking,
        ] = Self::NAMES.map(|name| resolver.resolve(name));

        Self {
            directional_atlas,
            directional_matrices,
            cascade_culling_spheres,
            cascade_count,
            cascade_data,
            other_atlas,
            other_matrices,
            other_tiles,
            distance_fade,
            atlas_size,
            pancaking,
        }
    }
}

impl Default for ShadowPropertyIds {
    fn default() -> Self {
        Self::resolve(&HashedPropertyResolver)
    }
}

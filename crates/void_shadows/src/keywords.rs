//! Shader keyword selectors
//!
//! Each group is a set of mutually exclusive keywords; at most one is enabled.

use crate::collaborators::ShadowCommandBuffer;

/// A mutually exclusive set of shader keywords
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeywordGroup {
    pub keywords: &'static [&'static str],
}

/// Directional filter kernels (3x3, 5x5, 7x7)
pub const DIRECTIONAL_FILTER: KeywordGroup = KeywordGroup {
    keywords: &["_DIRECTIONAL_PCF3", "_DIRECTIONAL_PCF5", "_DIRECTIONAL_PCF7"],
};

/// Spot and point filter kernels (3x3, 5x5, 7x7)
pub const OTHER_FILTER: KeywordGroup = KeywordGroup {
    keywords: &["_OTHER_PCF3", "_OTHER_PCF5", "_OTHER_PCF7"],
};

/// Cascade transitions
pub const CASCADE_BLEND: KeywordGroup = KeywordGroup {
    keywords: &["_CASCADE_BLEND_SOFT", "_CASCADE_BLEND_DITHER"],
};

/// Baked shadow mask mode
pub const SHADOW_MASK: KeywordGroup = KeywordGroup {
    keywords: &["_SHADOW_MASK_ALWAYS", "_SHADOW_MASK_DISTANCE"],
};

impl KeywordGroup {
    /// Enable the keyword at `enabled` and disable the rest
    pub fn apply(&self, commands: &mut impl ShadowCommandBuffer, enabled: Option<usize>) {
        for (i, keyword) in self.keywords.iter().enumerate() {
            commands.set_keyword(keyword, Some(i) == enabled);
        }
    }

    /// Keyword that would be enabled for `enabled`, if any
    pub fn selected(&self, enabled: Option<usize>) -> Option<&'static str> {
        enabled.and_then(|i| self.keywords.get(i).copied())
    }
}

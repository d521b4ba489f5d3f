//! Compilation settings
//!
//! Author: Moroya Sakamoto

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Target GLSL dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlslVersion {
    /// GLSL ES 1.00 (WebGL 1): `texture2D`, `gl_FragColor`
    #[default]
    Es100,
    /// GLSL ES 3.00 (WebGL 2): `texture`, `out vec4`
    Es300,
}

impl GlslVersion {
    /// `#version` directive
    pub fn directive(self) -> &'static str {
        match self {
            GlslVersion::Es100 => "#version 100",
            GlslVersion::Es300 => "#version 300 es",
        }
    }

    /// Name of the 2D texture lookup builtin
    pub fn texture_fn(self) -> &'static str {
        match self {
            GlslVersion::Es100 => "texture2D",
            GlslVersion::Es300 => "texture",
        }
    }
}

/// Default float precision qualifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Precision {
    /// `lowp`
    Low,
    /// `mediump`
    Medium,
    /// `highp`
    #[default]
    High,
}

impl Precision {
    /// GLSL qualifier keyword
    pub fn qualifier(self) -> &'static str {
        match self {
            Precision::Low => "lowp",
            Precision::Medium => "mediump",
            Precision::High => "highp",
        }
    }
}

/// Visible plot region.
///
/// Image reads without explicit corners place the image's bottom edge on
/// the segment from `lower_left` to `lower_right`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Lower-left corner in plot coordinates
    pub lower_left: DVec2,
    /// Lower-right corner in plot coordinates
    pub lower_right: DVec2,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            lower_left: DVec2::ZERO,
            lower_right: DVec2::X,
        }
    }
}

/// Settings for a compilation session
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileConfig {
    /// Plot region for default image corners
    pub viewport: Viewport,
    /// Float precision of generated fragment shaders
    pub precision: Precision,
    /// GLSL dialect
    pub version: GlslVersion,
}

impl CompileConfig {
    /// Settings targeting WebGL 2
    pub fn webgl2() -> Self {
        Self {
            version: GlslVersion::Es300,
            ..Default::default()
        }
    }
}

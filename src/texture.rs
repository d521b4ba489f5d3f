//! Texture reader generation
//!
//! Each image referenced by compiled code gets its own sampler uniform and a
//! pair of GLSL functions:
//!
//! ```glsl
//! vec4 _imagergba_<name>(vec2 A, vec2 B, vec2 p);
//! vec3 _imagergb_<name>(vec2 A, vec2 B, vec2 p);
//! ```
//!
//! The segment `A → B` is the image's bottom edge in plot coordinates. `p`
//! is projected into the frame spanned by `B - A` and its perpendicular
//! (scaled by the image aspect ratio); points outside the unit square read
//! as transparent black.
//!
//! Readers are generated once per image name and session, however many
//! expressions sample the image.
//!
//! Author: Moroya Sakamoto

use crate::codegen::{float_literal, is_identifier};
use crate::config::{GlslVersion, Viewport};
use crate::error::{Error, Result};
use crate::registry::{Category, CodeRegistry, Emission};
use glam::DVec2;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write;

/// What the resource resolver knows about an image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDescriptor {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Whether pixel data is available
    #[serde(default = "default_ready")]
    pub ready: bool,
    /// Size of the backing texture when the image is padded (e.g. to powers
    /// of two)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texture_size: Option<(u32, u32)>,
}

fn default_ready() -> bool {
    true
}

impl ImageDescriptor {
    /// A loaded, unpadded image
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ready: true,
            texture_size: None,
        }
    }

    /// Whether the image can be sampled
    pub fn is_usable(&self) -> bool {
        self.ready && self.width > 0 && self.height > 0
    }

    /// Width over height
    pub fn ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    /// Fraction of the texture covered by the image
    pub fn crop_factor(&self) -> DVec2 {
        match self.texture_size {
            Some((tw, th)) if tw > 0 && th > 0 => DVec2::new(
                self.width as f64 / tw as f64,
                self.height as f64 / th as f64,
            ),
            _ => DVec2::ONE,
        }
    }
}

/// Resolves image names to descriptors
pub trait ImageResolver {
    /// Descriptor for `name`, or `None` if no such image exists
    fn image(&self, name: &str) -> Option<ImageDescriptor>;
}

/// In-memory [`ImageResolver`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageTable {
    images: BTreeMap<String, ImageDescriptor>,
}

impl ImageTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) an image
    pub fn insert(&mut self, name: impl Into<String>, descriptor: ImageDescriptor) {
        self.images.insert(name.into(), descriptor);
    }

    /// Builder-style [`insert`](Self::insert)
    pub fn with(mut self, name: impl Into<String>, descriptor: ImageDescriptor) -> Self {
        self.insert(name, descriptor);
        self
    }

    /// Number of registered images
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Whether no image is registered
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

impl ImageResolver for ImageTable {
    fn image(&self, name: &str) -> Option<ImageDescriptor> {
        self.images.get(name).copied()
    }
}

impl ImageResolver for HashMap<String, ImageDescriptor> {
    fn image(&self, name: &str) -> Option<ImageDescriptor> {
        self.get(name).copied()
    }
}

/// Uniforms the renderer has to upload for one image
#[derive(Debug, Clone, PartialEq)]
pub struct TextureBinding {
    /// Image name
    pub image: String,
    /// `sampler2D` uniform
    pub sampler_uniform: String,
    /// `float` uniform holding width / height
    pub ratio_uniform: String,
    /// `vec2` uniform holding the crop factor
    pub cropfact_uniform: String,
    /// Value for the ratio uniform
    pub ratio: f64,
    /// Value for the crop factor uniform
    pub cropfact: DVec2,
}

/// Texture readers of one compilation session
#[derive(Debug, Clone)]
pub struct TextureReaders {
    version: GlslVersion,
    registry: CodeRegistry,
    bindings: Vec<TextureBinding>,
}

impl TextureReaders {
    /// Create an empty set of readers for `version`
    pub fn new(version: GlslVersion) -> Self {
        Self {
            version,
            registry: CodeRegistry::new(),
            bindings: Vec::new(),
        }
    }

    /// Generate the reader pair for `name` unless it already exists.
    ///
    /// Fails with [`Error::MissingResource`] when the resolver does not know
    /// the image or it is not loaded yet.
    pub fn ensure(&mut self, resolver: &dyn ImageResolver, name: &str) -> Result<Emission> {
        if !is_identifier(name) {
            return Err(Error::InvalidIdentifier(name.to_string()));
        }
        let descriptor = match resolver.image(name) {
            Some(d) if d.is_usable() => d,
            _ => {
                return Err(Error::MissingResource {
                    name: name.to_string(),
                })
            }
        };

        let version = self.version;
        let emission = self
            .registry
            .add(Category::Functions, name, || reader_source(version, name));
        if emission == Emission::Generated {
            log::debug!("generated texture reader for image '{}'", name);
            self.bindings.push(TextureBinding {
                image: name.to_string(),
                sampler_uniform: format!("_sampler_{}", name),
                ratio_uniform: format!("_ratio_{}", name),
                cropfact_uniform: format!("_cropfact_{}", name),
                ratio: descriptor.ratio(),
                cropfact: descriptor.crop_factor(),
            });
        }
        Ok(emission)
    }

    /// RGBA read of image `name` with explicit corners `a`, `b` at point `p`
    pub fn rgba(&mut self, resolver: &dyn ImageResolver, name: &str, a: &str, b: &str, p: &str) -> Result<String> {
        self.ensure(resolver, name)?;
        Ok(format!("_imagergba_{}({},{},{})", name, a, b, p))
    }

    /// RGB read of image `name` with explicit corners `a`, `b` at point `p`
    pub fn rgb(&mut self, resolver: &dyn ImageResolver, name: &str, a: &str, b: &str, p: &str) -> Result<String> {
        self.ensure(resolver, name)?;
        Ok(format!("_imagergb_{}({},{},{})", name, a, b, p))
    }

    /// RGBA read with the image's bottom edge on the viewport's bottom edge
    pub fn rgba_default(&mut self, resolver: &dyn ImageResolver, viewport: &Viewport, name: &str, p: &str) -> Result<String> {
        let (a, b) = default_corners(viewport)?;
        self.rgba(resolver, name, &a, &b, p)
    }

    /// RGB read with the image's bottom edge on the viewport's bottom edge
    pub fn rgb_default(&mut self, resolver: &dyn ImageResolver, viewport: &Viewport, name: &str, p: &str) -> Result<String> {
        let (a, b) = default_corners(viewport)?;
        self.rgb(resolver, name, &a, &b, p)
    }

    /// All reader definitions, one image per line
    pub fn header(&self) -> String {
        self.registry.render_header()
    }

    /// Uniforms to bind, in generation order
    pub fn bindings(&self) -> &[TextureBinding] {
        &self.bindings
    }

    /// Number of images with a generated reader
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// Whether no reader was generated
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }
}

fn vec2_literal(v: DVec2) -> Result<String> {
    Ok(format!("vec2({},{})", float_literal(v.x)?, float_literal(v.y)?))
}

fn default_corners(viewport: &Viewport) -> Result<(String, String)> {
    Ok((
        vec2_literal(viewport.lower_left)?,
        vec2_literal(viewport.lower_right)?,
    ))
}

fn reader_source(version: GlslVersion, name: &str) -> String {
    let mut s = String::with_capacity(640);
    writeln!(s, "uniform sampler2D _sampler_{};", name).unwrap();
    writeln!(s, "uniform float _ratio_{};", name).unwrap();
    writeln!(s, "uniform vec2 _cropfact_{};", name).unwrap();
    writeln!(s, "vec4 _imagergba_{}(vec2 A, vec2 B, vec2 p) {{", name).unwrap();
    writeln!(s, "    p -= A; B -= A;").unwrap();
    writeln!(s, "    float b = dot(B, B);").unwrap();
    writeln!(
        s,
        "    p = vec2(dot(p, B), _ratio_{} * dot(p, vec2(-B.y, B.x))) / b;",
        name
    )
    .unwrap();
    writeln!(
        s,
        "    if (0.0 <= p.x && p.x <= 1.0 && 0.0 <= p.y && p.y <= 1.0)"
    )
    .unwrap();
    writeln!(
        s,
        "        return {}(_sampler_{n}, p * _cropfact_{n});",
        version.texture_fn(),
        n = name
    )
    .unwrap();
    writeln!(s, "    return vec4(0.0);").unwrap();
    writeln!(s, "}}").unwrap();
    writeln!(s, "vec3 _imagergb_{}(vec2 A, vec2 B, vec2 p) {{", name).unwrap();
    writeln!(s, "    return _imagergba_{}(A, B, p).rgb;", name).unwrap();
    write!(s, "}}").unwrap();
    s
}

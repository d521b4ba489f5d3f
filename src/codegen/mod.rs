//! GLSL code generation for the vector algebra
//!
//! [`ShaderBuilder`] owns the [`CodeRegistry`] of one compilation session.
//! Expression builders (`construct`, `access`, `constant_fill`) and operator
//! generators (`add`, `mat_mult`, `complex_dot`, ...) are methods on it; each
//! returns the GLSL expression for its result and, for composite types,
//! registers the struct and helper function definitions it relies on.
//!
//! # Usage
//!
//! ```rust
//! use glsl_synth::codegen::ShaderBuilder;
//! use glsl_synth::types::{ScalarKind, Type};
//!
//! let mut builder = ShaderBuilder::new();
//! let vec6 = Type::vector(6, ScalarKind::Real).unwrap();
//!
//! let sum = builder.add(&vec6, "a", "b").unwrap();
//! assert_eq!(sum, "addvec6(a,b)");
//!
//! let header = builder.header();
//! assert!(header.contains("struct vec6 { vec2 a0; vec4 a1; };"));
//! assert!(header.contains("vec6 addvec6(vec6 a, vec6 b)"));
//! ```
//!
//! Author: Moroya Sakamoto

mod expr;
mod ops;

pub use expr::Accessor;
pub use ops::Operation;

use crate::error::{Error, Result};
use crate::registry::{Category, CodeRegistry, Emission};

/// Per-session GLSL generator
#[derive(Debug, Default, Clone)]
pub struct ShaderBuilder {
    registry: CodeRegistry,
}

impl ShaderBuilder {
    /// Create a builder with an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry of everything generated so far
    pub fn registry(&self) -> &CodeRegistry {
        &self.registry
    }

    /// Struct and function definitions generated so far
    pub fn header(&self) -> String {
        self.registry.render_header()
    }

    /// Generate `(category, name)` through `factory` unless already present.
    ///
    /// The factory gets the builder back so it can request the definitions
    /// it depends on; those land in the registry before this one.
    pub(crate) fn ensure<F>(&mut self, category: Category, name: &str, factory: F) -> Result<Emission>
    where
        F: FnOnce(&mut Self) -> Result<String>,
    {
        if self.registry.contains(category, name) {
            log::trace!("registry hit: {:?} {}", category, name);
            return Ok(Emission::AlreadyPresent);
        }
        let body = factory(self)?;
        self.registry.insert(category, name, body)
    }
}

/// GLSL spelling of a float constant
pub fn float_literal(value: f64) -> Result<String> {
    if !value.is_finite() {
        return Err(Error::InvalidLiteral(value));
    }
    let s = format!("{:?}", value);
    if s.contains('.') || s.contains('e') {
        Ok(s)
    } else {
        Ok(format!("{}.0", s))
    }
}

/// Whether `name` can be used as (part of) a GLSL identifier
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_') && !name.starts_with("gl_")
}

//! # glsl-synth
//!
//! **GLSL code synthesis for linear algebra over real and complex numbers**
//!
//! GLSL ES only knows `float`, `vec2`..`vec4` and square `mat2`..`mat4`.
//! This crate compiles typed expressions over arbitrary-width real and
//! complex vectors and matrices into plain GLSL: wide types become structs
//! of native chunks, complex values become `vec2` or `{real; imag;}` pairs,
//! and every operation a program needs is emitted exactly once as a helper
//! function.
//!
//! ## Features
//!
//! - **Types**: scalars, vectors of any length, matrices of any shape,
//!   real or complex
//! - **Operations**: add, sub, scalar product, matrix-vector product, dot,
//!   sum, and their complex variants
//! - **Expressions**: construct, element access, constant fill
//! - **Textures**: image readers mapping plot coordinates to texels
//! - **File I/O**: JSON program files
//!
//! ## Example
//!
//! ```rust
//! use glsl_synth::prelude::*;
//!
//! let images = ImageTable::new();
//! let mut compiler = Compiler::new(CompileConfig::default(), &images);
//!
//! // Two complex 3-vectors
//! let ty = Type::vector(3, ScalarKind::Complex).unwrap();
//! let a = Expr::uniform("a", ty.clone());
//! let b = Expr::uniform("b", ty);
//!
//! let program = compiler.compile(&a.dot(b)).unwrap();
//! assert_eq!(program.ty, Type::COMPLEX);
//! assert_eq!(program.expression, "cdot3(a,b)");
//! assert!(program.header.contains("struct cvec3 { vec3 real; vec3 imag; };"));
//! ```
//!
//! ## Author
//!
//! Moroya Sakamoto

#![warn(missing_docs)]

pub mod codegen;
pub mod compiler;
pub mod config;
pub mod error;
pub mod io;
pub mod layout;
pub mod registry;
pub mod texture;
pub mod types;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude - commonly used types and functions
pub mod prelude {
    pub use crate::codegen::{Operation, ShaderBuilder};
    pub use crate::compiler::{Compiler, Diagnostic, Expr, Program};
    pub use crate::config::{CompileConfig, GlslVersion, Precision, Viewport};
    pub use crate::error::{Error, Result};
    pub use crate::io::{load_program, ProgramFile};
    pub use crate::layout::decompose;
    pub use crate::registry::{Category, CodeRegistry, Emission};
    pub use crate::texture::{ImageDescriptor, ImageResolver, ImageTable, TextureReaders};
    pub use crate::types::{ScalarKind, Type};
    pub use glam::DVec2;
}

// Re-exports for convenience
pub use compiler::{Compiler, Expr, Program};
pub use error::{Error, Result};
pub use types::Type;

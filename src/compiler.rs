//! Compiler: typed expression tree → GLSL
//!
//! The evaluator of the host language hands over an [`Expr`] tree. The
//! [`Compiler`] resolves operand types bottom-up, dispatches each node to the
//! expression builders and operator generators of its [`ShaderBuilder`], and
//! returns a [`Program`]: generated definitions, texture readers and the
//! final GLSL expression.
//!
//! One `Compiler` is one compilation session. Definitions and texture
//! readers generated for one program are reused by later programs compiled
//! in the same session.
//!
//! # Usage
//!
//! ```rust
//! use glsl_synth::prelude::*;
//!
//! let images = ImageTable::new();
//! let mut compiler = Compiler::new(CompileConfig::default(), &images);
//!
//! let a = Expr::list((1..=6).map(|i| Expr::real(i as f64)).collect());
//! let b = Expr::list((1..=6).rev().map(|i| Expr::real(i as f64)).collect());
//! let program = compiler.compile(&a.dot(b)).unwrap();
//!
//! assert_eq!(program.ty, Type::REAL);
//! assert!(program.header.contains("float dot6(vec6 a, vec6 b)"));
//! ```
//!
//! Author: Moroya Sakamoto

use crate::codegen::{float_literal, is_identifier, ShaderBuilder};
use crate::config::{CompileConfig, GlslVersion};
use crate::error::{Error, Result};
use crate::texture::{ImageResolver, TextureBinding, TextureReaders};
use crate::types::{ScalarKind, Type};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Name of the varying carrying the plot coordinate of the current pixel
pub const PIXEL_VARYING: &str = "cgl_pixel";

/// Typed expression tree handed over by the evaluator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Expr {
    /// Real constant
    Real {
        /// Value
        value: f64,
    },
    /// Complex constant
    Complex {
        /// Real part
        re: f64,
        /// Imaginary part
        im: f64,
    },
    /// Vector (from scalars) or matrix (from row vectors)
    List {
        /// Elements
        items: Vec<Expr>,
    },
    /// Named program input of a fixed type
    Uniform {
        /// GLSL identifier
        name: String,
        /// Declared type
        ty: Type,
    },
    /// Plot coordinate of the current pixel (`vec2`)
    Pixel,
    /// Sum of two values
    Add {
        /// Left operand
        lhs: Box<Expr>,
        /// Right operand
        rhs: Box<Expr>,
    },
    /// Difference of two values
    Sub {
        /// Left operand
        lhs: Box<Expr>,
        /// Right operand
        rhs: Box<Expr>,
    },
    /// Product: scalar product, matrix-vector product or dot product,
    /// depending on operand types
    Mul {
        /// Left operand
        lhs: Box<Expr>,
        /// Right operand
        rhs: Box<Expr>,
    },
    /// Dot product of two vectors
    Dot {
        /// Left operand
        lhs: Box<Expr>,
        /// Right operand
        rhs: Box<Expr>,
    },
    /// Sum of the elements of a vector or the rows of a matrix
    Sum {
        /// Operand
        arg: Box<Expr>,
    },
    /// Element of a vector or row of a matrix (0-based)
    Access {
        /// Operand
        arg: Box<Expr>,
        /// Element index
        index: usize,
    },
    /// RGBA color of an image at a point
    ImageRgba {
        /// Image name
        image: String,
        /// Bottom-left and bottom-right corners; viewport corners if absent
        #[serde(default, skip_serializing_if = "Option::is_none")]
        corners: Option<Box<[Expr; 2]>>,
        /// Sample point
        point: Box<Expr>,
    },
    /// RGB color of an image at a point
    ImageRgb {
        /// Image name
        image: String,
        /// Bottom-left and bottom-right corners; viewport corners if absent
        #[serde(default, skip_serializing_if = "Option::is_none")]
        corners: Option<Box<[Expr; 2]>>,
        /// Sample point
        point: Box<Expr>,
    },
}

impl Expr {
    /// Real constant
    pub fn real(value: f64) -> Self {
        Expr::Real { value }
    }

    /// Complex constant
    pub fn complex(re: f64, im: f64) -> Self {
        Expr::Complex { re, im }
    }

    /// Vector or matrix literal
    pub fn list(items: Vec<Expr>) -> Self {
        Expr::List { items }
    }

    /// Named input
    pub fn uniform(name: impl Into<String>, ty: Type) -> Self {
        Expr::Uniform {
            name: name.into(),
            ty,
        }
    }

    /// Dot product with `rhs`
    pub fn dot(self, rhs: Expr) -> Self {
        Expr::Dot {
            lhs: Box::new(self),
            rhs: Box::new(rhs),
        }
    }

    /// Sum of elements
    pub fn sum(self) -> Self {
        Expr::Sum {
            arg: Box::new(self),
        }
    }

    /// Element `index`
    pub fn at(self, index: usize) -> Self {
        Expr::Access {
            arg: Box::new(self),
            index,
        }
    }

    /// RGBA read of `image` at `point` with the default corners
    pub fn image_rgba(image: impl Into<String>, point: Expr) -> Self {
        Expr::ImageRgba {
            image: image.into(),
            corners: None,
            point: Box::new(point),
        }
    }

    /// RGB read of `image` at `point` with the default corners
    pub fn image_rgb(image: impl Into<String>, point: Expr) -> Self {
        Expr::ImageRgb {
            image: image.into(),
            corners: None,
            point: Box::new(point),
        }
    }

    /// Attach explicit corners to an image read; other nodes are returned
    /// unchanged
    pub fn with_corners(self, a: Expr, b: Expr) -> Self {
        match self {
            Expr::ImageRgba { image, point, .. } => Expr::ImageRgba {
                image,
                corners: Some(Box::new([a, b])),
                point,
            },
            Expr::ImageRgb { image, point, .. } => Expr::ImageRgb {
                image,
                corners: Some(Box::new([a, b])),
                point,
            },
            other => other,
        }
    }
}

impl std::ops::Add for Expr {
    type Output = Expr;
    fn add(self, rhs: Expr) -> Expr {
        Expr::Add {
            lhs: Box::new(self),
            rhs: Box::new(rhs),
        }
    }
}

impl std::ops::Sub for Expr {
    type Output = Expr;
    fn sub(self, rhs: Expr) -> Expr {
        Expr::Sub {
            lhs: Box::new(self),
            rhs: Box::new(rhs),
        }
    }
}

impl std::ops::Mul for Expr {
    type Output = Expr;
    fn mul(self, rhs: Expr) -> Expr {
        Expr::Mul {
            lhs: Box::new(self),
            rhs: Box::new(rhs),
        }
    }
}

/// A node that compiled to a placeholder value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Kind of node (`image_rgba`, `image_rgb`)
    pub node: &'static str,
    /// What went wrong
    pub message: String,
}

/// Result of compiling one expression tree
#[derive(Debug, Clone)]
pub struct Program {
    /// Struct and function definitions (all generated so far in the session)
    pub header: String,
    /// Texture reader definitions (all generated so far in the session)
    pub texture_header: String,
    /// GLSL expression computing the value
    pub expression: String,
    /// Type of the value
    pub ty: Type,
    /// Uniform inputs referenced by the expression, in first-use order
    pub uniforms: Vec<(String, Type)>,
    /// Texture uniforms to bind
    pub textures: Vec<TextureBinding>,
    /// Nodes replaced by placeholder values
    pub diagnostics: Vec<Diagnostic>,
    /// Settings the program was compiled with
    pub config: CompileConfig,
}

impl Program {
    /// Definitions followed by the expression
    pub fn source(&self) -> String {
        format!("{}{}{}", self.header, self.texture_header, self.expression)
    }

    /// Complete fragment shader writing the value as the pixel color.
    ///
    /// Real values become gray levels, `vec3` values opaque RGB colors and
    /// `vec4` values RGBA colors.
    pub fn to_fragment_shader(&self) -> Result<String> {
        let color = match self.ty {
            Type::Scalar(ScalarKind::Real) | Type::Vector { length: 1, scalar: ScalarKind::Real } => {
                format!("vec4(vec3({}), 1.0)", self.expression)
            }
            Type::Vector {
                length: 3,
                scalar: ScalarKind::Real,
            } => format!("vec4({}, 1.0)", self.expression),
            Type::Vector {
                length: 4,
                scalar: ScalarKind::Real,
            } => self.expression.clone(),
            _ => {
                return Err(Error::UnsupportedType {
                    ty: self.ty.clone(),
                    op: "color",
                })
            }
        };

        let version = self.config.version;
        let mut s = String::with_capacity(1024);
        writeln!(s, "{}", version.directive()).unwrap();
        writeln!(s, "precision {} float;", self.config.precision.qualifier()).unwrap();
        writeln!(s).unwrap();
        s.push_str(&self.header);
        for (name, ty) in &self.uniforms {
            writeln!(s, "uniform {} {};", ty.glsl_name(), name).unwrap();
        }
        match version {
            GlslVersion::Es100 => {
                writeln!(s, "varying vec2 {};", PIXEL_VARYING).unwrap();
            }
            GlslVersion::Es300 => {
                writeln!(s, "in vec2 {};", PIXEL_VARYING).unwrap();
                writeln!(s, "out vec4 fragColor;").unwrap();
            }
        }
        s.push_str(&self.texture_header);
        writeln!(s).unwrap();
        writeln!(s, "void main() {{").unwrap();
        match version {
            GlslVersion::Es100 => writeln!(s, "    gl_FragColor = {};", color).unwrap(),
            GlslVersion::Es300 => writeln!(s, "    fragColor = {};", color).unwrap(),
        }
        writeln!(s, "}}").unwrap();
        Ok(s)
    }
}

/// One compilation session
pub struct Compiler<'r> {
    config: CompileConfig,
    resolver: &'r dyn ImageResolver,
    builder: ShaderBuilder,
    textures: TextureReaders,
    uniforms: Vec<(String, Type)>,
    diagnostics: Vec<Diagnostic>,
}

impl<'r> Compiler<'r> {
    /// Start a session with an empty registry
    pub fn new(config: CompileConfig, resolver: &'r dyn ImageResolver) -> Self {
        Self {
            config,
            resolver,
            builder: ShaderBuilder::new(),
            textures: TextureReaders::new(config.version),
            uniforms: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Settings of this session
    pub fn config(&self) -> &CompileConfig {
        &self.config
    }

    /// Generator state of this session
    pub fn builder(&self) -> &ShaderBuilder {
        &self.builder
    }

    /// Struct and function definitions generated so far
    pub fn header(&self) -> String {
        self.builder.header()
    }

    /// Texture readers generated so far
    pub fn texture_header(&self) -> String {
        self.textures.header()
    }

    /// Compile one expression tree.
    ///
    /// Errors other than unavailable images abort the compilation; the
    /// session should then be discarded.
    pub fn compile(&mut self, expr: &Expr) -> Result<Program> {
        self.uniforms.clear();
        self.diagnostics.clear();
        let (ty, expression) = self.compile_node(expr)?;
        log::debug!(
            "compiled program of type {} ({} definitions, {} texture readers)",
            ty,
            self.builder.registry().len(),
            self.textures.len()
        );
        Ok(Program {
            header: self.builder.header(),
            texture_header: self.textures.header(),
            expression,
            ty,
            uniforms: self.uniforms.clone(),
            textures: self.textures.bindings().to_vec(),
            diagnostics: std::mem::take(&mut self.diagnostics),
            config: self.config,
        })
    }

    fn compile_node(&mut self, expr: &Expr) -> Result<(Type, String)> {
        match expr {
            Expr::Real { value } => Ok((Type::REAL, float_literal(*value)?)),
            Expr::Complex { re, im } => Ok((
                Type::COMPLEX,
                format!("vec2({},{})", float_literal(*re)?, float_literal(*im)?),
            )),
            Expr::List { items } => self.compile_list(items),
            Expr::Uniform { name, ty } => self.compile_uniform(name, ty),
            Expr::Pixel => Ok((Type::rvec(2), PIXEL_VARYING.to_string())),
            Expr::Add { lhs, rhs } => self.compile_additive(lhs, rhs, true),
            Expr::Sub { lhs, rhs } => self.compile_additive(lhs, rhs, false),
            Expr::Mul { lhs, rhs } => self.compile_mul(lhs, rhs),
            Expr::Dot { lhs, rhs } => {
                let (lt, lc) = self.compile_node(lhs)?;
                let (rt, rc) = self.compile_node(rhs)?;
                self.compile_dot(&lt, &lc, &rt, &rc)
            }
            Expr::Sum { arg } => {
                let (ty, code) = self.compile_node(arg)?;
                let element = ty.parameters().ok_or_else(|| Error::UnsupportedType {
                    ty: ty.clone(),
                    op: "sum",
                })?;
                let code = self.builder.sum(&ty, &code)?;
                Ok((element, code))
            }
            Expr::Access { arg, index } => {
                let (ty, code) = self.compile_node(arg)?;
                let accessor = self.builder.access(&ty, *index)?;
                let element = ty.parameters().ok_or_else(|| {
                    Error::InvariantViolation(format!("{} has no element type", ty))
                })?;
                Ok((element, accessor(&code)))
            }
            Expr::ImageRgba {
                image,
                corners,
                point,
            } => self.compile_image(image, corners.as_deref(), point, true),
            Expr::ImageRgb {
                image,
                corners,
                point,
            } => self.compile_image(image, corners.as_deref(), point, false),
        }
    }

    fn compile_list(&mut self, items: &[Expr]) -> Result<(Type, String)> {
        if items.is_empty() {
            return Err(Error::InvalidDimension {
                dim: 0,
                what: "list length",
            });
        }
        let mut compiled = Vec::with_capacity(items.len());
        for item in items {
            compiled.push(self.compile_node(item)?);
        }

        // Real scalars mixed with complex ones are promoted
        let any_complex = compiled.iter().any(|(t, _)| *t == Type::COMPLEX);
        if any_complex {
            for (t, c) in compiled.iter_mut() {
                if *t == Type::REAL {
                    *c = format!("vec2({},0.0)", c);
                    *t = Type::COMPLEX;
                }
            }
        }

        let element = compiled[0].0.clone();
        if let Some((other, _)) = compiled.iter().find(|(t, _)| *t != element) {
            return Err(Error::TypeMismatch {
                op: "list",
                lhs: element,
                rhs: other.clone(),
            });
        }

        let ty = match element {
            Type::Scalar(scalar) => Type::vector(items.len(), scalar)?,
            Type::Vector { length, scalar } => Type::matrix(items.len(), length, scalar)?,
            Type::Matrix { .. } => {
                return Err(Error::UnsupportedType {
                    ty: element,
                    op: "list",
                })
            }
        };
        let args: Vec<String> = compiled.into_iter().map(|(_, c)| c).collect();
        let code = self.builder.construct(&ty, &args)?;
        Ok((ty, code))
    }

    fn compile_uniform(&mut self, name: &str, ty: &Type) -> Result<(Type, String)> {
        if !is_identifier(name) || name == PIXEL_VARYING || name.starts_with('_') {
            return Err(Error::InvalidIdentifier(name.to_string()));
        }
        ty.validate()?;
        match self.uniforms.iter().find(|(n, _)| n == name) {
            Some((_, known)) if known != ty => {
                return Err(Error::TypeMismatch {
                    op: "uniform",
                    lhs: known.clone(),
                    rhs: ty.clone(),
                })
            }
            Some(_) => {}
            None => {
                self.builder.ensure_struct(ty)?;
                self.uniforms.push((name.to_string(), ty.clone()));
            }
        }
        Ok((ty.clone(), name.to_string()))
    }

    fn compile_additive(&mut self, lhs: &Expr, rhs: &Expr, add: bool) -> Result<(Type, String)> {
        let op = if add { "add" } else { "sub" };
        let (lt, lc) = self.compile_node(lhs)?;
        let (rt, rc) = self.compile_node(rhs)?;
        let (lt, rt) = unify_scalars(lt, rt);
        let (ty, lc, rc) = if lt == rt {
            (lt, lc, rc)
        } else if lt == Type::REAL && rt == Type::COMPLEX {
            (Type::COMPLEX, format!("vec2({},0.0)", lc), rc)
        } else if lt == Type::COMPLEX && rt == Type::REAL {
            (Type::COMPLEX, lc, format!("vec2({},0.0)", rc))
        } else {
            return Err(Error::TypeMismatch {
                op,
                lhs: lt,
                rhs: rt,
            });
        };
        let code = if add {
            self.builder.add(&ty, &lc, &rc)?
        } else {
            self.builder.sub(&ty, &lc, &rc)?
        };
        Ok((ty, code))
    }

    fn compile_mul(&mut self, lhs: &Expr, rhs: &Expr) -> Result<(Type, String)> {
        let (lt, lc) = self.compile_node(lhs)?;
        let (rt, rc) = self.compile_node(rhs)?;
        let (lt, rt) = unify_scalars(lt, rt);
        let mismatch = |lt: &Type, rt: &Type| Error::TypeMismatch {
            op: "mul",
            lhs: lt.clone(),
            rhs: rt.clone(),
        };

        match (&lt, &rt) {
            (Type::Scalar(a), Type::Scalar(b)) => match (a, b) {
                (ScalarKind::Real, ScalarKind::Real) => Ok((Type::REAL, format!("({}*{})", lc, rc))),
                (ScalarKind::Real, ScalarKind::Complex) | (ScalarKind::Complex, ScalarKind::Real) => {
                    Ok((Type::COMPLEX, format!("({}*{})", lc, rc)))
                }
                (ScalarKind::Complex, ScalarKind::Complex) => {
                    Ok((Type::COMPLEX, self.builder.complex_mult(&lc, &rc)?))
                }
                _ => Err(mismatch(&lt, &rt)),
            },
            (&Type::REAL, _) => Ok((rt.clone(), self.builder.scalar_mult(&rt, &lc, &rc)?)),
            (_, &Type::REAL) => Ok((lt.clone(), self.builder.scalar_mult(&lt, &rc, &lc)?)),
            (&Type::COMPLEX, _) if rt.final_parameter() == ScalarKind::Complex => Ok((rt.clone(), self.builder.complex_scalar_mult(&rt, &lc, &rc)?)),
            (_, &Type::COMPLEX) if lt.final_parameter() == ScalarKind::Complex => Ok((lt.clone(), self.builder.complex_scalar_mult(&lt, &rc, &lc)?)),
            (
                Type::Matrix { rows, cols, scalar },
                Type::Vector {
                    length,
                    scalar: vscalar,
                },
            ) if cols == length && scalar == vscalar => {
                let out = Type::vector(*rows, *scalar)?;
                let code = if *scalar == ScalarKind::Complex {
                    self.builder.complex_mat_mult(&lt, &lc, &rc)?
                } else {
                    self.builder.mat_mult(&lt, &lc, &rc)?
                };
                Ok((out, code))
            }
            (Type::Vector { .. }, Type::Vector { .. }) => self.compile_dot(&lt, &lc, &rt, &rc),
            _ => Err(mismatch(&lt, &rt)),
        }
    }

    fn compile_dot(&mut self, lt: &Type, lc: &str, rt: &Type, rc: &str) -> Result<(Type, String)> {
        if lt != rt {
            return Err(Error::TypeMismatch {
                op: "dot",
                lhs: lt.clone(),
                rhs: rt.clone(),
            });
        }
        match lt.final_parameter() {
            ScalarKind::Complex if lt.depth() == 1 => {
                Ok((Type::COMPLEX, self.builder.complex_dot(lt, lc, rc)?))
            }
            _ => Ok((Type::REAL, self.builder.dot(lt, lc, rc)?)),
        }
    }

    fn compile_image(&mut self, image: &str, corners: Option<&[Expr; 2]>, point: &Expr, rgba: bool) -> Result<(Type, String)> {
        let (node, ty) = if rgba {
            ("image_rgba", Type::rvec(4))
        } else {
            ("image_rgb", Type::rvec(3))
        };

        let p = self.compile_point(point)?;
        let corners = match corners {
            Some([a, b]) => Some((self.compile_point(a)?, self.compile_point(b)?)),
            None => None,
        };

        let call = match (&corners, rgba) {
            (Some((a, b)), true) => self.textures.rgba(self.resolver, image, a, b, &p),
            (Some((a, b)), false) => self.textures.rgb(self.resolver, image, a, b, &p),
            (None, true) => self
                .textures
                .rgba_default(self.resolver, &self.config.viewport, image, &p),
            (None, false) => self
                .textures
                .rgb_default(self.resolver, &self.config.viewport, image, &p),
        };

        match call {
            Ok(code) => Ok((ty, code)),
            Err(e) if e.is_recoverable() => {
                log::warn!("{}: {}; reading zero instead", node, e);
                self.diagnostics.push(Diagnostic {
                    node,
                    message: e.to_string(),
                });
                let zero = self.builder.constant_fill(&ty, 0.0)?;
                Ok((ty, zero))
            }
            Err(e) => Err(e),
        }
    }

    /// Compile a 2D point operand; real `vec2` and complex scalars are both
    /// `vec2` in GLSL.
    fn compile_point(&mut self, expr: &Expr) -> Result<String> {
        let (ty, code) = self.compile_node(expr)?;
        if ty == Type::rvec(2) || ty == Type::COMPLEX {
            Ok(code)
        } else {
            Err(Error::TypeMismatch {
                op: "image point",
                lhs: Type::rvec(2),
                rhs: ty,
            })
        }
    }
}

/// Operands spelled like a scalar in GLSL are read as that scalar when the
/// other side is one: a real `vec2` next to a complex number is complex, and
/// a one-element real vector next to any scalar is a `float`.
fn unify_scalars(lt: Type, rt: Type) -> (Type, Type) {
    let plane = Type::rvec(2);
    let single = Type::rvec(1);
    if lt == Type::COMPLEX && rt == plane {
        (lt, Type::COMPLEX)
    } else if lt == plane && rt == Type::COMPLEX {
        (Type::COMPLEX, rt)
    } else if lt == single && rt.depth() == 0 {
        (Type::REAL, rt)
    } else if rt == single && lt.depth() == 0 {
        (lt, Type::REAL)
    } else {
        (lt, rt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::{ImageDescriptor, ImageTable};

    fn reals(values: &[f64]) -> Expr {
        Expr::list(values.iter().map(|&v| Expr::real(v)).collect())
    }

    #[test]
    fn test_compile_scalar_arithmetic() {
        let images = ImageTable::new();
        let mut c = Compiler::new(CompileConfig::default(), &images);
        let p = c
            .compile(&(Expr::real(1.0) + Expr::real(2.0) * Expr::real(3.0)))
            .unwrap();
        assert_eq!(p.ty, Type::REAL);
        assert_eq!(p.expression, "(1.0+(2.0*3.0))");
        assert!(p.header.is_empty());
    }

    #[test]
    fn test_compile_wide_vector_add() {
        let images = ImageTable::new();
        let mut c = Compiler::new(CompileConfig::default(), &images);
        let a = reals(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let b = reals(&[6.0, 5.0, 4.0, 3.0, 2.0, 1.0]);
        let p = c.compile(&(a + b)).unwrap();
        assert_eq!(p.ty, Type::rvec(6));
        assert!(p.expression.starts_with("addvec6(vec6(vec2(1.0,2.0),vec4(3.0,4.0,5.0,6.0)),"));
        assert!(p.source().starts_with("struct vec6"));
    }

    #[test]
    fn test_compile_mul_dispatch() {
        let images = ImageTable::new();
        let mut c = Compiler::new(CompileConfig::default(), &images);

        let v = reals(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let p = c.compile(&(Expr::real(2.0) * v.clone())).unwrap();
        assert_eq!(p.ty, Type::rvec(5));
        assert!(p.expression.starts_with("scalarmultvec5(2.0,"));

        let p = c.compile(&(v.clone() * v.clone())).unwrap();
        assert_eq!(p.ty, Type::REAL);
        assert!(p.expression.starts_with("dot5("));

        let m = Expr::list(vec![v.clone(), v.clone()]);
        let p = c.compile(&(m * v)).unwrap();
        assert_eq!(p.ty, Type::rvec(2));
        assert!(p.expression.starts_with("mult2_5("));

        let p = c
            .compile(&(Expr::complex(2.0, 3.0) * Expr::complex(4.0, -1.0)))
            .unwrap();
        assert_eq!(p.ty, Type::COMPLEX);
        assert_eq!(p.expression, "multc(vec2(2.0,3.0),vec2(4.0,-1.0))");
    }

    #[test]
    fn test_compile_complex_list_promotes_reals() {
        let images = ImageTable::new();
        let mut c = Compiler::new(CompileConfig::default(), &images);
        let p = c
            .compile(&Expr::list(vec![Expr::real(1.0), Expr::complex(0.0, 1.0)]))
            .unwrap();
        assert_eq!(p.ty, Type::vector(2, ScalarKind::Complex).unwrap());
        assert!(p.expression.contains("(vec2(1.0,0.0)).x"));
    }

    #[test]
    fn test_compile_type_mismatch() {
        let images = ImageTable::new();
        let mut c = Compiler::new(CompileConfig::default(), &images);
        let err = c
            .compile(&(reals(&[1.0, 2.0]) + reals(&[1.0, 2.0, 3.0])))
            .unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { op: "add", .. }));
        assert!(c.compile(&Expr::list(vec![])).is_err());
        let err = c
            .compile(&(Expr::complex(0.0, 1.0) * reals(&[1.0, 2.0, 3.0])))
            .unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { op: "mul", .. }));
    }

    #[test]
    fn test_single_element_list_is_a_float() {
        let images = ImageTable::new();
        let mut c = Compiler::new(CompileConfig::default(), &images);
        let one = reals(&[2.0]);

        let p = c.compile(&(one.clone() + Expr::real(3.0))).unwrap();
        assert_eq!(p.ty, Type::REAL);
        assert_eq!(p.expression, "(float(2.0)+3.0)");

        let p = c.compile(&(Expr::real(3.0) - one.clone())).unwrap();
        assert_eq!(p.ty, Type::REAL);
        assert_eq!(p.expression, "(3.0-float(2.0))");

        let p = c.compile(&(Expr::complex(0.0, 1.0) + one.clone())).unwrap();
        assert_eq!(p.ty, Type::COMPLEX);
        assert_eq!(p.expression, "(vec2(0.0,1.0)+vec2(float(2.0),0.0))");

        let p = c.compile(&(one.clone() + one)).unwrap();
        assert_eq!(p.ty, Type::rvec(1));
    }

    #[test]
    fn test_compile_sum_and_access() {
        let images = ImageTable::new();
        let mut c = Compiler::new(CompileConfig::default(), &images);
        let v = reals(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        let p = c.compile(&v.clone().sum()).unwrap();
        assert_eq!(p.ty, Type::REAL);
        assert!(p.expression.starts_with("dot7("));

        let p = c.compile(&v.at(4)).unwrap();
        assert_eq!(p.ty, Type::REAL);
        assert!(p.expression.ends_with(").a1[1]"));
    }

    #[test]
    fn test_uniforms_are_collected() {
        let images = ImageTable::new();
        let mut c = Compiler::new(CompileConfig::default(), &images);
        let ty = Type::vector(6, ScalarKind::Complex).unwrap();
        let u = Expr::uniform("z", ty.clone());
        let p = c.compile(&(u.clone() + u)).unwrap();
        assert_eq!(p.uniforms, vec![("z".to_string(), ty.clone())]);

        let clash = Expr::uniform("z", ty) + Expr::uniform("z", Type::rvec(6));
        assert!(c.compile(&clash).is_err());
        assert!(matches!(
            c.compile(&Expr::uniform("not valid", Type::REAL)),
            Err(Error::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn test_missing_image_degrades_to_zero() {
        let images = ImageTable::new();
        let mut c = Compiler::new(CompileConfig::default(), &images);
        let p = c
            .compile(&Expr::image_rgb("nope", Expr::Pixel))
            .unwrap();
        assert_eq!(p.expression, "vec3(0.0)");
        assert_eq!(p.diagnostics.len(), 1);
        assert!(p.diagnostics[0].message.contains("nope"));
        assert!(p.texture_header.is_empty());
    }

    #[test]
    fn test_image_reads() {
        let images = ImageTable::new().with("pic", ImageDescriptor::new(64, 32));
        let mut c = Compiler::new(CompileConfig::default(), &images);
        let read = Expr::image_rgba("pic", Expr::Pixel).with_corners(
            Expr::list(vec![Expr::real(0.0), Expr::real(0.0)]),
            Expr::complex(1.0, 0.0),
        );
        let p = c.compile(&read).unwrap();
        assert_eq!(p.ty, Type::rvec(4));
        assert_eq!(
            p.expression,
            "_imagergba_pic(vec2(0.0,0.0),vec2(1.0,0.0),cgl_pixel)"
        );
        assert_eq!(p.textures.len(), 1);
        assert!((p.textures[0].ratio - 2.0).abs() < 1e-12);

        let bad = Expr::image_rgb("pic", Expr::real(1.0));
        assert!(matches!(c.compile(&bad), Err(Error::TypeMismatch { .. })));
    }

    #[test]
    fn test_fragment_shader() {
        let images = ImageTable::new().with("pic", ImageDescriptor::new(64, 64));
        let mut c = Compiler::new(CompileConfig::default(), &images);
        let p = c.compile(&Expr::image_rgb("pic", Expr::Pixel)).unwrap();
        let fs = p.to_fragment_shader().unwrap();
        assert!(fs.starts_with("#version 100\nprecision highp float;"));
        assert!(fs.contains("varying vec2 cgl_pixel;"));
        assert!(fs.contains("gl_FragColor = vec4(_imagergb_pic(vec2(0.0,0.0),vec2(1.0,0.0),cgl_pixel), 1.0);"));

        let p = c.compile(&Expr::complex(1.0, 1.0)).unwrap();
        assert!(p.to_fragment_shader().is_err());
    }

    #[test]
    fn test_fragment_shader_webgl2_declares_uniforms_after_structs() {
        let images = ImageTable::new();
        let mut c = Compiler::new(CompileConfig::webgl2(), &images);
        let u = Expr::uniform("w", Type::rvec(6));
        let p = c.compile(&u.sum()).unwrap();
        let fs = p.to_fragment_shader().unwrap();
        assert!(fs.starts_with("#version 300 es"));
        assert!(fs.contains("out vec4 fragColor;"));
        assert!(fs.find("struct vec6").unwrap() < fs.find("uniform vec6 w;").unwrap());
        assert!(fs.contains("fragColor = vec4(vec3(dot6(w,"));
    }

    #[test]
    fn test_expr_json() {
        let e = Expr::complex(2.0, 3.0) * Expr::uniform("z", Type::COMPLEX);
        let json = serde_json::to_string(&e).unwrap();
        assert!(json.starts_with(r#"{"op":"mul","lhs":{"op":"complex","re":2.0,"im":3.0}"#));
        let back: Expr = serde_json::from_str(&json).unwrap();
        assert_eq!(back, e);
    }
}

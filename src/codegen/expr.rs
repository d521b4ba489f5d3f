//! Expression builders: constructors, element access, constant fills and
//! struct synthesis for composite types.
//!
//! Author: Moroya Sakamoto

use super::{float_literal, ShaderBuilder};
use crate::error::{Error, Result};
use crate::layout::{decompose, locate};
use crate::registry::Category;
use crate::types::{ScalarKind, Type};

/// Maps a base expression to one of its elements
pub type Accessor = Box<dyn Fn(&str) -> String>;

impl ShaderBuilder {
    /// Emit the struct definition for `ty` (and for every member type).
    ///
    /// Native types need no definition and are skipped.
    pub fn ensure_struct(&mut self, ty: &Type) -> Result<()> {
        ty.validate()?;
        if ty.is_native() {
            return Ok(());
        }
        if !ty.final_parameter().is_field() {
            return Err(Error::UnsupportedType {
                ty: ty.clone(),
                op: "struct",
            });
        }
        let name = ty.glsl_name();
        self.ensure(Category::Structs, &name, |b| {
            let mut members = Vec::new();
            for child in ty.children() {
                b.ensure_struct(&child.ty)?;
                members.push(format!("{} {};", child.ty.glsl_name(), child.name));
            }
            Ok(format!("struct {} {{ {} }};", name, members.join(" ")))
        })?;
        Ok(())
    }

    /// GLSL expression constructing a value of `ty` from its elements.
    ///
    /// `args` holds one expression per element: scalars for vectors, row
    /// vectors for matrices. A scalar type takes its single argument as is.
    pub fn construct(&mut self, ty: &Type, args: &[String]) -> Result<String> {
        ty.validate()?;
        let expected = ty.length().unwrap_or(1);
        if args.len() != expected {
            return Err(Error::ArityMismatch {
                ty: ty.clone(),
                expected,
                got: args.len(),
            });
        }

        match *ty {
            Type::Scalar(_) => Ok(args[0].clone()),

            Type::Vector { length, scalar } | Type::Matrix { rows: length, scalar, .. }
                if scalar == ScalarKind::Complex =>
            {
                self.ensure_struct(ty)?;
                let rt = ty.replace_complex_by_real();
                // Elements of complex vectors are vec2, rows of complex
                // matrices are cvec structs
                let (re, im) = if ty.depth() == 1 {
                    ("x", "y")
                } else {
                    ("real", "imag")
                };
                let real_parts: Vec<String> =
                    args.iter().map(|a| format!("({}).{}", a, re)).collect();
                let imag_parts: Vec<String> =
                    args.iter().map(|a| format!("({}).{}", a, im)).collect();
                debug_assert_eq!(real_parts.len(), length);
                let real = self.construct(&rt, &real_parts)?;
                let imag = self.construct(&rt, &imag_parts)?;
                Ok(format!("{}({},{})", ty.glsl_name(), real, imag))
            }

            Type::Vector { length: 1, .. } => Ok(format!("float({})", args[0])),

            Type::Vector { length, .. } if ty.is_native() => {
                Ok(format!("vec{}({})", length, args.join(",")))
            }

            Type::Vector { length, .. } => {
                self.ensure_struct(ty)?;
                let mut parts = Vec::new();
                let mut start = 0;
                for size in decompose(length) {
                    parts.push(self.construct(&Type::rvec(size), &args[start..start + size])?);
                    start += size;
                }
                Ok(format!("{}({})", ty.glsl_name(), parts.join(",")))
            }

            Type::Matrix { rows, .. } if ty.is_native() => {
                // GLSL matrices are column-major: column k gathers entry k
                // of every row
                let cols: Vec<String> = (0..rows)
                    .map(|k| {
                        let entries: Vec<String> =
                            args.iter().map(|row| format!("({})[{}]", row, k)).collect();
                        format!("vec{}({})", rows, entries.join(","))
                    })
                    .collect();
                Ok(format!("mat{}({})", rows, cols.join(",")))
            }

            Type::Matrix { .. } => {
                self.ensure_struct(ty)?;
                Ok(format!("{}({})", ty.glsl_name(), args.join(",")))
            }
        }
    }

    /// Accessor for element `index` of `ty` (a scalar for vectors, a row
    /// vector for matrices).
    pub fn access(&mut self, ty: &Type, index: usize) -> Result<Accessor> {
        ty.validate()?;
        let len = match ty.length() {
            Some(len) => len,
            None => {
                return Err(Error::UnsupportedType {
                    ty: ty.clone(),
                    op: "access",
                })
            }
        };
        if index >= len {
            return Err(Error::IndexOutOfBounds {
                ty: ty.clone(),
                index,
                len,
            });
        }

        if ty.final_parameter() == ScalarKind::Complex {
            let element = ty.parameters().ok_or_else(|| {
                Error::InvariantViolation(format!("{} has no element type", ty))
            })?;
            self.ensure_struct(&element)?;
            let inner = self.access(&ty.replace_complex_by_real(), index)?;
            let name = element.glsl_name();
            return Ok(Box::new(move |base: &str| {
                format!(
                    "{}({},{})",
                    name,
                    inner(&format!("({}).real", base)),
                    inner(&format!("({}).imag", base))
                )
            }));
        }

        match *ty {
            Type::Vector { length: 1, .. } => Ok(Box::new(|base: &str| format!("({})", base))),
            Type::Vector { length, .. } if length <= 4 => {
                Ok(Box::new(move |base: &str| format!("({})[{}]", base, index)))
            }
            Type::Vector { length, .. } => {
                let (chunk, offset) = locate(index, length)?;
                Ok(Box::new(move |base: &str| {
                    format!("({}).a{}[{}]", base, chunk, offset)
                }))
            }
            Type::Matrix { rows, .. } if ty.is_native() => Ok(Box::new(move |base: &str| {
                let entries: Vec<String> = (0..rows)
                    .map(|c| format!("({})[{}][{}]", base, c, index))
                    .collect();
                format!("vec{}({})", rows, entries.join(","))
            })),
            Type::Matrix { .. } => Ok(Box::new(move |base: &str| format!("({}).a{}", base, index))),
            Type::Scalar(_) => unreachable!("scalars have no length"),
        }
    }

    /// `value` broadcast into every scalar slot of `ty`.
    ///
    /// For complex types both the real and imaginary parts are filled.
    pub fn constant_fill(&mut self, ty: &Type, value: f64) -> Result<String> {
        if !ty.final_parameter().is_field() {
            return Err(Error::UnsupportedType {
                ty: ty.clone(),
                op: "constant_fill",
            });
        }
        ty.validate()?;
        let lit = float_literal(value)?;
        match *ty {
            Type::Scalar(ScalarKind::Complex) => Ok(format!("vec2({})", lit)),
            Type::Scalar(_) | Type::Vector { length: 1, .. } if ty.is_native() => Ok(lit),
            Type::Vector { length, .. } if ty.is_native() => Ok(format!("vec{}({})", length, lit)),
            Type::Matrix { rows, .. } if ty.is_native() => {
                let col = format!("vec{}({})", rows, lit);
                Ok(format!("mat{}({})", rows, vec![col; rows].join(",")))
            }
            _ => {
                self.ensure_struct(ty)?;
                let mut parts = Vec::new();
                for child in ty.children() {
                    parts.push(self.constant_fill(&child.ty, value)?);
                }
                Ok(format!("{}({})", ty.glsl_name(), parts.join(",")))
            }
        }
    }
}

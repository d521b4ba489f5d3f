//! Core types for GLSL synthesis
//!
//! Defines the closed value-shape algebra (scalars, vectors, matrices over
//! real or complex numbers) that the code generators work on, and how each
//! shape maps onto GLSL ES types.
//!
//! Native GLSL ES tops out at 4-component vectors and square matrices up to
//! `mat4`. Everything beyond that is a composite: a synthesized struct whose
//! members follow [`decompose`](crate::layout::decompose).
//!
//! Author: Moroya Sakamoto

use crate::error::{Error, Result};
use crate::layout::decompose;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Widest vector GLSL ES supports natively
pub const MAX_NATIVE_WIDTH: usize = 4;

/// Largest vector length or matrix dimension accepted by [`Type::validate`].
///
/// Composite types are spelled out member by member in the generated
/// header, so the source text grows linearly with every dimension.
pub const MAX_DIMENSION: usize = 1024;

/// Innermost scalar kind of a type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
    /// Boolean (only as a pass-through scalar)
    Bool,
    /// Integer (only as a pass-through scalar)
    Int,
    /// Real number, `float` in GLSL
    Real,
    /// Complex number, stored as a `vec2` (x = real part, y = imaginary part)
    Complex,
}

impl ScalarKind {
    /// Real or complex, i.e. something vectors and matrices can be built over
    #[inline]
    pub fn is_field(self) -> bool {
        matches!(self, ScalarKind::Real | ScalarKind::Complex)
    }
}

/// Shape of a value
///
/// A matrix is a vector of `rows` row vectors of length `cols`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Type {
    /// Single scalar
    Scalar(ScalarKind),
    /// Vector of scalars
    Vector {
        /// Number of components
        length: usize,
        /// Component kind
        scalar: ScalarKind,
    },
    /// Vector of row vectors
    Matrix {
        /// Number of rows
        rows: usize,
        /// Number of columns (length of every row)
        cols: usize,
        /// Entry kind
        scalar: ScalarKind,
    },
}

/// A member of a synthesized struct
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Child {
    /// Member name (`a0`, `real`, `x`, ...)
    pub name: String,
    /// Member type
    pub ty: Type,
}

impl Child {
    fn new(name: impl Into<String>, ty: Type) -> Self {
        Child {
            name: name.into(),
            ty,
        }
    }
}

impl Type {
    /// Real scalar (`float`)
    pub const REAL: Type = Type::Scalar(ScalarKind::Real);
    /// Complex scalar (`vec2`)
    pub const COMPLEX: Type = Type::Scalar(ScalarKind::Complex);

    /// Create a vector type, rejecting shapes outside the algebra
    pub fn vector(length: usize, scalar: ScalarKind) -> Result<Self> {
        let ty = Type::Vector { length, scalar };
        ty.validate()?;
        Ok(ty)
    }

    /// Create a matrix type, rejecting shapes outside the algebra
    pub fn matrix(rows: usize, cols: usize, scalar: ScalarKind) -> Result<Self> {
        let ty = Type::Matrix { rows, cols, scalar };
        ty.validate()?;
        Ok(ty)
    }

    /// Real vector of the given length. The caller guarantees `length >= 1`.
    pub(crate) fn rvec(length: usize) -> Self {
        Type::Vector {
            length,
            scalar: ScalarKind::Real,
        }
    }

    /// Check the shape invariants: dimensions in `1..=MAX_DIMENSION` and
    /// field entries for vectors and matrices.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Type::Scalar(_) => Ok(()),
            Type::Vector { length, scalar } => {
                check_dimension(length, "vector length")?;
                if !scalar.is_field() {
                    return Err(Error::UnsupportedType {
                        ty: self.clone(),
                        op: "vector",
                    });
                }
                Ok(())
            }
            Type::Matrix { rows, cols, scalar } => {
                check_dimension(rows, "matrix rows")?;
                check_dimension(cols, "matrix columns")?;
                if !scalar.is_field() {
                    return Err(Error::UnsupportedType {
                        ty: self.clone(),
                        op: "matrix",
                    });
                }
                Ok(())
            }
        }
    }

    /// Nesting depth: 0 for scalars, 1 for vectors, 2 for matrices
    #[inline]
    pub fn depth(&self) -> usize {
        match self {
            Type::Scalar(_) => 0,
            Type::Vector { .. } => 1,
            Type::Matrix { .. } => 2,
        }
    }

    /// Innermost scalar kind after unwrapping all nesting
    #[inline]
    pub fn final_parameter(&self) -> ScalarKind {
        match *self {
            Type::Scalar(s) => s,
            Type::Vector { scalar, .. } | Type::Matrix { scalar, .. } => scalar,
        }
    }

    /// Outer dimension (vector length / row count); `None` for scalars
    #[inline]
    pub fn length(&self) -> Option<usize> {
        match *self {
            Type::Scalar(_) => None,
            Type::Vector { length, .. } => Some(length),
            Type::Matrix { rows, .. } => Some(rows),
        }
    }

    /// Element type (scalar for a vector, row vector for a matrix)
    pub fn parameters(&self) -> Option<Type> {
        match *self {
            Type::Scalar(_) => None,
            Type::Vector { scalar, .. } => Some(Type::Scalar(scalar)),
            Type::Matrix { cols, scalar, .. } => Some(Type::Vector {
                length: cols,
                scalar,
            }),
        }
    }

    /// Whether the type maps directly onto a GLSL ES scalar, vector or matrix
    pub fn is_native(&self) -> bool {
        match *self {
            Type::Scalar(_) => true,
            Type::Vector {
                length,
                scalar: ScalarKind::Real,
            } => length <= MAX_NATIVE_WIDTH,
            Type::Matrix {
                rows,
                cols,
                scalar: ScalarKind::Real,
            } => rows == cols && (2..=MAX_NATIVE_WIDTH).contains(&rows),
            Type::Vector { .. } | Type::Matrix { .. } => false,
        }
    }

    /// Real vector (any length)
    #[inline]
    pub fn is_real_vector(&self) -> bool {
        matches!(
            self,
            Type::Vector {
                scalar: ScalarKind::Real,
                ..
            }
        )
    }

    /// Canonical GLSL name.
    ///
    /// Doubles as the suffix of generated function names, so it must be a
    /// deterministic function of the shape.
    pub fn glsl_name(&self) -> String {
        match *self {
            Type::Scalar(ScalarKind::Real) => "float".to_string(),
            Type::Scalar(ScalarKind::Int) => "int".to_string(),
            Type::Scalar(ScalarKind::Bool) => "bool".to_string(),
            Type::Scalar(ScalarKind::Complex) => "vec2".to_string(),
            Type::Vector { length, scalar } => match scalar {
                ScalarKind::Real if length == 1 => "float".to_string(),
                ScalarKind::Real => format!("vec{}", length),
                ScalarKind::Complex => format!("cvec{}", length),
                ScalarKind::Int => format!("ivec{}", length),
                ScalarKind::Bool => format!("bvec{}", length),
            },
            Type::Matrix { rows, cols, scalar } => match scalar {
                ScalarKind::Complex => format!("cmat{}_{}", rows, cols),
                _ if self.is_native() => format!("mat{}", rows),
                _ => format!("mat{}_{}", rows, cols),
            },
        }
    }

    /// Replace the complex leaf by a real one, keeping all dimensions.
    ///
    /// A complex value of type `T` is stored as the pair `(real, imag)` of
    /// values of type `T.replace_complex_by_real()`.
    pub fn replace_complex_by_real(&self) -> Type {
        let swap = |s: ScalarKind| match s {
            ScalarKind::Complex => ScalarKind::Real,
            other => other,
        };
        match *self {
            Type::Scalar(s) => Type::Scalar(swap(s)),
            Type::Vector { length, scalar } => Type::Vector {
                length,
                scalar: swap(scalar),
            },
            Type::Matrix { rows, cols, scalar } => Type::Matrix {
                rows,
                cols,
                scalar: swap(scalar),
            },
        }
    }

    /// Members of the struct representing this type.
    ///
    /// Complex types split into `x`/`y` (scalars) or `real`/`imag`; real
    /// vectors wider than 4 split along [`decompose`]; non-native real
    /// matrices split into their rows. Native and pass-through types have no
    /// members.
    pub fn children(&self) -> Vec<Child> {
        match *self {
            Type::Scalar(ScalarKind::Complex) => {
                vec![Child::new("x", Type::REAL), Child::new("y", Type::REAL)]
            }
            Type::Scalar(_) => Vec::new(),
            _ if self.final_parameter() == ScalarKind::Complex => {
                let rt = self.replace_complex_by_real();
                vec![Child::new("real", rt.clone()), Child::new("imag", rt)]
            }
            _ if self.is_native() => Vec::new(),
            Type::Vector { length, .. } => decompose(length)
                .into_iter()
                .enumerate()
                .map(|(i, k)| Child::new(format!("a{}", i), Type::rvec(k)))
                .collect(),
            Type::Matrix { rows, cols, .. } => (0..rows)
                .map(|i| Child::new(format!("a{}", i), Type::rvec(cols)))
                .collect(),
        }
    }
}

fn check_dimension(dim: usize, what: &'static str) -> Result<()> {
    if (1..=MAX_DIMENSION).contains(&dim) {
        Ok(())
    } else {
        Err(Error::InvalidDimension { dim, what })
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.glsl_name())
    }
}

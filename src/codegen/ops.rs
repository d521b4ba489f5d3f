//! Operator generators
//!
//! Native operands compile to GLSL infix operators or `dot`. Composite
//! operands get one helper function per `(Operation, Type)`, emitted once and
//! recursing into the struct members:
//!
//! | Operation   | Helper signature                                 |
//! |-------------|--------------------------------------------------|
//! | Add         | `T addT(T a, T b)`                               |
//! | Sub         | `T subT(T a, T b)`                               |
//! | ScalarMult  | `T scalarmultT(float a, T b)`                    |
//! | MatMult     | `vec<n> mult<n>_<m>(mat<n>_<m> a, vec<m> b)`     |
//! | Dot         | `float dot<n>(vec<n> a, vec<n> b)`               |
//! | Sum         | `E sumT(T a)`                                    |
//! | CMult       | `vec2 multc(vec2 a, vec2 b)`                     |
//! | CScalarMult | `T cscalarmultT(vec2 a, T b)`                    |
//! | CMatMult    | `cvec<n> cmult<n>_<m>(cmat<n>_<m> a, cvec<m> b)` |
//! | CDot        | `vec2 cdot<n>(cvec<n> a, cvec<n> b)`             |
//!
//! Complex helpers are written against the real helpers of the desugared
//! type, e.g. `(ar*br - ai*bi, ar*bi + ai*br)`.
//!
//! Author: Moroya Sakamoto

use super::ShaderBuilder;
use crate::error::{Error, Result};
use crate::registry::Category;
use crate::types::{ScalarKind, Type};
use std::fmt::Write;

/// Algebraic operations with generated implementations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Component-wise addition (also complex addition)
    Add,
    /// Component-wise subtraction
    Sub,
    /// Real scalar times value
    ScalarMult,
    /// Real matrix times real vector
    MatMult,
    /// Real dot product
    Dot,
    /// Sum of the elements of a vector or the rows of a matrix
    Sum,
    /// Product of two complex scalars
    CMult,
    /// Complex scalar times complex value
    CScalarMult,
    /// Complex matrix times complex vector
    CMatMult,
    /// Bilinear complex dot product
    CDot,
}

impl Operation {
    /// All operations
    pub const ALL: [Operation; 10] = [
        Operation::Add,
        Operation::Sub,
        Operation::ScalarMult,
        Operation::MatMult,
        Operation::Dot,
        Operation::Sum,
        Operation::CMult,
        Operation::CScalarMult,
        Operation::CMatMult,
        Operation::CDot,
    ];

    /// Short name used in diagnostics
    pub fn name(self) -> &'static str {
        match self {
            Operation::Add => "add",
            Operation::Sub => "sub",
            Operation::ScalarMult => "scalarmult",
            Operation::MatMult => "matmult",
            Operation::Dot => "dot",
            Operation::Sum => "sum",
            Operation::CMult => "cmult",
            Operation::CScalarMult => "cscalarmult",
            Operation::CMatMult => "cmatmult",
            Operation::CDot => "cdot",
        }
    }

    /// Number of GLSL arguments the operation takes
    pub fn arity(self) -> usize {
        match self {
            Operation::Sum => 1,
            _ => 2,
        }
    }

    /// Name of the helper function implementing the operation on `ty`.
    ///
    /// `ty` is the operand type for `Add`, `Sub`, `Sum` and the scalar
    /// multiplications, the matrix type for `MatMult`/`CMatMult` and the
    /// vector type for `Dot`/`CDot`.
    pub fn function_name(self, ty: &Type) -> String {
        let name = ty.glsl_name();
        let (n, m) = match *ty {
            Type::Matrix { rows, cols, .. } => (rows, cols),
            Type::Vector { length, .. } => (length, 0),
            Type::Scalar(_) => (1, 0),
        };
        match self {
            Operation::Add => format!("add{}", name),
            Operation::Sub => format!("sub{}", name),
            Operation::ScalarMult => format!("scalarmult{}", name),
            Operation::MatMult => format!("mult{}_{}", n, m),
            Operation::Dot => format!("dot{}", n),
            Operation::Sum => format!("sum{}", name),
            Operation::CMult => "multc".to_string(),
            Operation::CScalarMult => format!("cscalarmult{}", name),
            Operation::CMatMult => format!("cmult{}_{}", n, m),
            Operation::CDot => format!("cdot{}", n),
        }
    }

    /// Whether `ty` is handled by a GLSL builtin rather than a helper
    pub fn is_native_on(self, ty: &Type) -> bool {
        match self {
            Operation::Add | Operation::Sub | Operation::ScalarMult | Operation::MatMult => {
                ty.is_native()
            }
            Operation::Dot => ty.length().is_some_and(|n| n <= 4),
            Operation::Sum => ty.is_real_vector(),
            Operation::CMult | Operation::CScalarMult | Operation::CMatMult | Operation::CDot => {
                false
            }
        }
    }
}

fn require_field(op: Operation, ty: &Type) -> Result<()> {
    ty.validate()?;
    if ty.final_parameter().is_field() {
        Ok(())
    } else {
        Err(Error::UnsupportedType {
            ty: ty.clone(),
            op: op.name(),
        })
    }
}

fn require(op: Operation, ty: &Type, ok: bool) -> Result<()> {
    if ok {
        Ok(())
    } else {
        Err(Error::UnsupportedType {
            ty: ty.clone(),
            op: op.name(),
        })
    }
}

impl ShaderBuilder {
    /// Apply `op` keyed by `ty` to already compiled arguments.
    ///
    /// See [`Operation::function_name`] for what `ty` denotes per operation.
    pub fn apply(&mut self, op: Operation, ty: &Type, args: &[String]) -> Result<String> {
        if args.len() != op.arity() {
            return Err(Error::ArityMismatch {
                ty: ty.clone(),
                expected: op.arity(),
                got: args.len(),
            });
        }
        match op {
            Operation::Add => self.add(ty, &args[0], &args[1]),
            Operation::Sub => self.sub(ty, &args[0], &args[1]),
            Operation::ScalarMult => self.scalar_mult(ty, &args[0], &args[1]),
            Operation::MatMult => self.mat_mult(ty, &args[0], &args[1]),
            Operation::Dot => self.dot(ty, &args[0], &args[1]),
            Operation::Sum => self.sum(ty, &args[0]),
            Operation::CMult => {
                require(op, ty, *ty == Type::COMPLEX)?;
                self.complex_mult(&args[0], &args[1])
            }
            Operation::CScalarMult => self.complex_scalar_mult(ty, &args[0], &args[1]),
            Operation::CMatMult => self.complex_mat_mult(ty, &args[0], &args[1]),
            Operation::CDot => self.complex_dot(ty, &args[0], &args[1]),
        }
    }

    /// `a + b` for values of type `ty`
    pub fn add(&mut self, ty: &Type, a: &str, b: &str) -> Result<String> {
        self.componentwise(Operation::Add, "+", ty, a, b)
    }

    /// `a - b` for values of type `ty`
    pub fn sub(&mut self, ty: &Type, a: &str, b: &str) -> Result<String> {
        self.componentwise(Operation::Sub, "-", ty, a, b)
    }

    fn componentwise(&mut self, op: Operation, infix: &str, ty: &Type, a: &str, b: &str) -> Result<String> {
        require_field(op, ty)?;
        if ty.is_native() {
            return Ok(format!("({}{}{})", a, infix, b));
        }
        let fname = op.function_name(ty);
        self.ensure_struct(ty)?;
        self.ensure(Category::Functions, &fname, |s| {
            let t = ty.glsl_name();
            let mut parts = Vec::new();
            for child in ty.children() {
                let lhs = format!("a.{}", child.name);
                let rhs = format!("b.{}", child.name);
                parts.push(s.componentwise(op, infix, &child.ty, &lhs, &rhs)?);
            }
            Ok(format!(
                "{t} {f}({t} a, {t} b) {{ return {t}({}); }}",
                parts.join(","),
                t = t,
                f = fname
            ))
        })?;
        Ok(format!("{}({},{})", fname, a, b))
    }

    /// Real scalar `s` times value `v` of type `ty`
    pub fn scalar_mult(&mut self, ty: &Type, s: &str, v: &str) -> Result<String> {
        let op = Operation::ScalarMult;
        require_field(op, ty)?;
        if ty.is_native() {
            return Ok(format!("({}*{})", s, v));
        }
        let fname = op.function_name(ty);
        self.ensure_struct(ty)?;
        self.ensure(Category::Functions, &fname, |b| {
            let t = ty.glsl_name();
            let mut parts = Vec::new();
            for child in ty.children() {
                parts.push(b.scalar_mult(&child.ty, "a", &format!("b.{}", child.name))?);
            }
            Ok(format!(
                "{t} {f}(float a, {t} b) {{ return {t}({}); }}",
                parts.join(","),
                t = t,
                f = fname
            ))
        })?;
        Ok(format!("{}({},{})", fname, s, v))
    }

    /// Real matrix `m` (type `ty`) times real vector `v`
    pub fn mat_mult(&mut self, ty: &Type, m: &str, v: &str) -> Result<String> {
        let op = Operation::MatMult;
        let (rows, cols) = match *ty {
            Type::Matrix {
                rows,
                cols,
                scalar: ScalarKind::Real,
            } => (rows, cols),
            _ => return Err(Error::UnsupportedType { ty: ty.clone(), op: op.name() }),
        };
        ty.validate()?;
        if ty.is_native() {
            return Ok(format!("({}*{})", m, v));
        }
        let fname = op.function_name(ty);
        let out = Type::rvec(rows);
        let input = Type::rvec(cols);
        self.ensure_struct(ty)?;
        self.ensure_struct(&input)?;
        self.ensure_struct(&out)?;
        self.ensure(Category::Functions, &fname, |b| {
            let mut dots = Vec::with_capacity(rows);
            for k in 0..rows {
                dots.push(b.dot(&input, &format!("a.a{}", k), "b")?);
            }
            let result = b.construct(&out, &dots)?;
            Ok(format!(
                "{} {}({} a, {} b) {{ return {}; }}",
                out.glsl_name(),
                fname,
                ty.glsl_name(),
                input.glsl_name(),
                result
            ))
        })?;
        Ok(format!("{}({},{})", fname, m, v))
    }

    /// Dot product of two real vectors of type `ty`
    pub fn dot(&mut self, ty: &Type, a: &str, b: &str) -> Result<String> {
        let op = Operation::Dot;
        let n = match *ty {
            Type::Vector {
                length,
                scalar: ScalarKind::Real,
            } => length,
            _ => return Err(Error::UnsupportedType { ty: ty.clone(), op: op.name() }),
        };
        ty.validate()?;
        if op.is_native_on(ty) {
            return Ok(format!("dot({},{})", a, b));
        }
        let fname = op.function_name(ty);
        self.ensure_struct(ty)?;
        self.ensure(Category::Functions, &fname, |_| {
            let terms: Vec<String> = (0..ty.children().len())
                .map(|k| format!("dot(a.a{k},b.a{k})", k = k))
                .collect();
            Ok(format!(
                "float {f}(vec{n} a, vec{n} b) {{ return {}; }}",
                terms.join("+"),
                f = fname,
                n = n
            ))
        })?;
        Ok(format!("{}({},{})", fname, a, b))
    }

    /// Sum of the elements of `a` (a vector) or of its rows (a matrix)
    pub fn sum(&mut self, ty: &Type, a: &str) -> Result<String> {
        let op = Operation::Sum;
        require_field(op, ty)?;
        let element = match ty.parameters() {
            Some(element) => element,
            None => return Err(Error::UnsupportedType { ty: ty.clone(), op: op.name() }),
        };

        if ty.is_real_vector() {
            let ones = self.constant_fill(ty, 1.0)?;
            return self.dot(ty, a, &ones);
        }

        let fname = op.function_name(ty);
        self.ensure_struct(ty)?;
        self.ensure_struct(&element)?;
        self.ensure(Category::Functions, &fname, |b| {
            let e = element.glsl_name();
            let zero = b.constant_fill(&element, 0.0)?;
            let mut body = String::new();
            writeln!(body, "{} {}({} a) {{", e, fname, ty.glsl_name()).unwrap();
            writeln!(body, "    {} res = {};", e, zero).unwrap();
            for k in 0..ty.length().unwrap_or(0) {
                let item = b.access(ty, k)?("a");
                writeln!(body, "    res = {};", b.add(&element, "res", &item)?).unwrap();
            }
            body.push_str("    return res;\n}");
            Ok(body)
        })?;
        Ok(format!("{}({})", fname, a))
    }

    /// Product of two complex scalars
    pub fn complex_mult(&mut self, a: &str, b: &str) -> Result<String> {
        let fname = Operation::CMult.function_name(&Type::COMPLEX);
        self.ensure(Category::Functions, &fname, |_| {
            Ok(format!(
                "vec2 {}(vec2 a, vec2 b) {{ return vec2(a.x*b.x-a.y*b.y, a.x*b.y+a.y*b.x); }}",
                fname
            ))
        })?;
        Ok(format!("{}({},{})", fname, a, b))
    }

    /// Complex scalar `s` times complex value `v` of type `ty`
    pub fn complex_scalar_mult(&mut self, ty: &Type, s: &str, v: &str) -> Result<String> {
        let op = Operation::CScalarMult;
        ty.validate()?;
        require(op, ty, ty.final_parameter() == ScalarKind::Complex)?;
        if *ty == Type::COMPLEX {
            return self.complex_mult(s, v);
        }
        let fname = op.function_name(ty);
        let rt = ty.replace_complex_by_real();
        self.ensure_struct(ty)?;
        self.ensure(Category::Functions, &fname, |b| {
            let xr = b.scalar_mult(&rt, "a.x", "b.real")?;
            let yi = b.scalar_mult(&rt, "a.y", "b.imag")?;
            let xi = b.scalar_mult(&rt, "a.x", "b.imag")?;
            let yr = b.scalar_mult(&rt, "a.y", "b.real")?;
            let real = b.sub(&rt, &xr, &yi)?;
            let imag = b.add(&rt, &xi, &yr)?;
            Ok(format!(
                "{t} {f}(vec2 a, {t} b) {{ return {t}({},{}); }}",
                real,
                imag,
                t = ty.glsl_name(),
                f = fname
            ))
        })?;
        Ok(format!("{}({},{})", fname, s, v))
    }

    /// Complex matrix `m` (type `ty`) times complex vector `v`
    pub fn complex_mat_mult(&mut self, ty: &Type, m: &str, v: &str) -> Result<String> {
        let op = Operation::CMatMult;
        let (rows, cols) = match *ty {
            Type::Matrix {
                rows,
                cols,
                scalar: ScalarKind::Complex,
            } => (rows, cols),
            _ => return Err(Error::UnsupportedType { ty: ty.clone(), op: op.name() }),
        };
        ty.validate()?;
        let fname = op.function_name(ty);
        let rt = ty.replace_complex_by_real();
        let out = Type::Vector {
            length: rows,
            scalar: ScalarKind::Complex,
        };
        let input = Type::Vector {
            length: cols,
            scalar: ScalarKind::Complex,
        };
        self.ensure_struct(ty)?;
        self.ensure_struct(&input)?;
        self.ensure_struct(&out)?;
        self.ensure(Category::Functions, &fname, |b| {
            let real_out = out.replace_complex_by_real();
            let rr = b.mat_mult(&rt, "a.real", "b.real")?;
            let ii = b.mat_mult(&rt, "a.imag", "b.imag")?;
            let ri = b.mat_mult(&rt, "a.real", "b.imag")?;
            let ir = b.mat_mult(&rt, "a.imag", "b.real")?;
            let real = b.sub(&real_out, &rr, &ii)?;
            let imag = b.add(&real_out, &ri, &ir)?;
            Ok(format!(
                "{o} {f}({t} a, {i} b) {{ return {o}({},{}); }}",
                real,
                imag,
                o = out.glsl_name(),
                f = fname,
                t = ty.glsl_name(),
                i = input.glsl_name()
            ))
        })?;
        Ok(format!("{}({},{})", fname, m, v))
    }

    /// Bilinear dot product `sum(a_k * b_k)` of two complex vectors of type
    /// `ty`; the result is a complex scalar
    pub fn complex_dot(&mut self, ty: &Type, a: &str, b: &str) -> Result<String> {
        let op = Operation::CDot;
        let n = match *ty {
            Type::Vector {
                length,
                scalar: ScalarKind::Complex,
            } => length,
            _ => return Err(Error::UnsupportedType { ty: ty.clone(), op: op.name() }),
        };
        ty.validate()?;
        let fname = op.function_name(ty);
        let rt = Type::rvec(n);
        self.ensure_struct(ty)?;
        self.ensure(Category::Functions, &fname, |s| {
            let rr = s.dot(&rt, "a.real", "b.real")?;
            let ii = s.dot(&rt, "a.imag", "b.imag")?;
            let ri = s.dot(&rt, "a.real", "b.imag")?;
            let ir = s.dot(&rt, "a.imag", "b.real")?;
            Ok(format!(
                "vec2 {f}({t} a, {t} b) {{ return vec2({}-{}, {}+{}); }}",
                rr,
                ii,
                ri,
                ir,
                f = fname,
                t = ty.glsl_name()
            ))
        })?;
        Ok(format!("{}({},{})", fname, a, b))
    }
}

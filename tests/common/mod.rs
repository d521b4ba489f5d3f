//! Common test helpers for glsl-synth integration tests
//!
//! A small interpreter for the GLSL subset the generators emit: struct
//! definitions, single-expression functions, the `res = ...` accumulator
//! form, builtin constructors, `dot`, swizzles, indexing and `+ - *`.
//!
//! Author: Moroya Sakamoto

#![allow(dead_code)]

use glsl_synth::prelude::*;
use std::collections::HashMap;

// ============================================================================
// Values
// ============================================================================

/// Runtime value. Matrices are stored as columns.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Float(f64),
    Vec(Vec<f64>),
    Mat(Vec<Vec<f64>>),
    Struct(String, Vec<(String, Value)>),
}

impl Value {
    /// All scalars in declaration order (matrices column by column)
    pub fn flatten(&self) -> Vec<f64> {
        match self {
            Value::Float(x) => vec![*x],
            Value::Vec(v) => v.clone(),
            Value::Mat(cols) => cols.iter().flatten().copied().collect(),
            Value::Struct(_, members) => members.iter().flat_map(|(_, v)| v.flatten()).collect(),
        }
    }

    fn scalar(&self) -> f64 {
        match self {
            Value::Float(x) => *x,
            other => panic!("expected float, got {:?}", other),
        }
    }

    fn member(&self, name: &str) -> Value {
        match self {
            Value::Struct(_, members) => members
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.clone())
                .unwrap_or_else(|| panic!("no member {} in {:?}", name, self)),
            Value::Vec(v) => {
                let picked: Vec<f64> = name
                    .chars()
                    .map(|c| {
                        let k = match c {
                            'x' | 'r' => 0,
                            'y' | 'g' => 1,
                            'z' | 'b' => 2,
                            'w' | 'a' => 3,
                            _ => panic!("bad swizzle {}", name),
                        };
                        v[k]
                    })
                    .collect();
                if picked.len() == 1 {
                    Value::Float(picked[0])
                } else {
                    Value::Vec(picked)
                }
            }
            other => panic!("member {} of {:?}", name, other),
        }
    }

    fn index(&self, k: usize) -> Value {
        match self {
            Value::Vec(v) => Value::Float(v[k]),
            Value::Mat(cols) => Value::Vec(cols[k].clone()),
            other => panic!("index into {:?}", other),
        }
    }
}

fn zip_with(a: &[f64], b: &[f64], f: impl Fn(f64, f64) -> f64) -> Vec<f64> {
    assert_eq!(a.len(), b.len(), "length mismatch");
    a.iter().zip(b).map(|(x, y)| f(*x, *y)).collect()
}

fn binop(op: char, a: Value, b: Value) -> Value {
    let f = move |x: f64, y: f64| match op {
        '+' => x + y,
        '-' => x - y,
        '*' => x * y,
        _ => unreachable!(),
    };
    match (a, b) {
        (Value::Float(x), Value::Float(y)) => Value::Float(f(x, y)),
        (Value::Vec(u), Value::Vec(v)) => Value::Vec(zip_with(&u, &v, f)),
        (Value::Float(s), Value::Vec(v)) => Value::Vec(v.iter().map(|x| f(s, *x)).collect()),
        (Value::Vec(v), Value::Float(s)) => Value::Vec(v.iter().map(|x| f(*x, s)).collect()),
        (Value::Mat(m), Value::Vec(v)) if op == '*' => {
            let n = m[0].len();
            Value::Vec(
                (0..n)
                    .map(|i| m.iter().zip(&v).map(|(col, x)| col[i] * x).sum::<f64>())
                    .collect(),
            )
        }
        (Value::Mat(m), Value::Mat(n)) if op != '*' => {
            Value::Mat(m.iter().zip(&n).map(|(a, b)| zip_with(a, b, f)).collect())
        }
        (Value::Float(s), Value::Mat(m)) | (Value::Mat(m), Value::Float(s)) if op == '*' => {
            Value::Mat(m.iter().map(|c| c.iter().map(|x| x * s).collect()).collect())
        }
        (a, b) => panic!("unsupported {:?} {} {:?}", a, op, b),
    }
}

// ============================================================================
// Syntax
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Num(f64),
    Ident(String),
    Sym(char),
}

fn tokenize(src: &str) -> Vec<Tok> {
    let chars: Vec<char> = src.chars().collect();
    let mut out = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
        } else if c.is_ascii_digit() || (c == '.' && chars.get(i + 1).map_or(false, |d| d.is_ascii_digit())) {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                i += 1;
            }
            if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                i += 1;
                if i < chars.len() && (chars[i] == '+' || chars[i] == '-') {
                    i += 1;
                }
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
            }
            let text: String = chars[start..i].iter().collect();
            out.push(Tok::Num(text.parse().unwrap_or_else(|_| panic!("bad number {}", text))));
        } else if c.is_ascii_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            out.push(Tok::Ident(chars[start..i].iter().collect()));
        } else {
            out.push(Tok::Sym(c));
            i += 1;
        }
    }
    out
}

#[derive(Debug, Clone)]
enum Ast {
    Num(f64),
    Var(String),
    Call(String, Vec<Ast>),
    Member(Box<Ast>, String),
    Index(Box<Ast>, Box<Ast>),
    Bin(char, Box<Ast>, Box<Ast>),
    Neg(Box<Ast>),
}

#[derive(Debug, Clone)]
enum Stmt {
    Assign(String, Ast),
    Return(Ast),
}

#[derive(Debug, Clone)]
struct Function {
    params: Vec<String>,
    body: Vec<Stmt>,
}

struct Parser {
    toks: Vec<Tok>,
    pos: usize,
}

impl Parser {
    fn new(src: &str) -> Self {
        Self {
            toks: tokenize(src),
            pos: 0,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.toks.len()
    }

    fn peek(&self) -> Option<&Tok> {
        self.toks.get(self.pos)
    }

    fn peek_sym(&self, c: char) -> bool {
        self.peek() == Some(&Tok::Sym(c))
    }

    fn next(&mut self) -> Tok {
        let t = self.toks[self.pos].clone();
        self.pos += 1;
        t
    }

    fn expect(&mut self, c: char) {
        match self.next() {
            Tok::Sym(s) if s == c => {}
            other => panic!("expected '{}', got {:?}", c, other),
        }
    }

    fn ident(&mut self) -> String {
        match self.next() {
            Tok::Ident(s) => s,
            other => panic!("expected identifier, got {:?}", other),
        }
    }

    fn expr(&mut self) -> Ast {
        let mut lhs = self.term();
        while self.peek_sym('+') || self.peek_sym('-') {
            let op = match self.next() {
                Tok::Sym(c) => c,
                _ => unreachable!(),
            };
            let rhs = self.term();
            lhs = Ast::Bin(op, Box::new(lhs), Box::new(rhs));
        }
        lhs
    }

    fn term(&mut self) -> Ast {
        let mut lhs = self.unary();
        while self.peek_sym('*') {
            self.next();
            let rhs = self.unary();
            lhs = Ast::Bin('*', Box::new(lhs), Box::new(rhs));
        }
        lhs
    }

    fn unary(&mut self) -> Ast {
        if self.peek_sym('-') {
            self.next();
            return Ast::Neg(Box::new(self.unary()));
        }
        let mut e = self.primary();
        loop {
            if self.peek_sym('.') {
                self.next();
                e = Ast::Member(Box::new(e), self.ident());
            } else if self.peek_sym('[') {
                self.next();
                let i = self.expr();
                self.expect(']');
                e = Ast::Index(Box::new(e), Box::new(i));
            } else {
                return e;
            }
        }
    }

    fn primary(&mut self) -> Ast {
        match self.next() {
            Tok::Num(x) => Ast::Num(x),
            Tok::Sym('(') => {
                let e = self.expr();
                self.expect(')');
                e
            }
            Tok::Ident(name) => {
                if self.peek_sym('(') {
                    self.next();
                    let mut args = Vec::new();
                    if !self.peek_sym(')') {
                        loop {
                            args.push(self.expr());
                            if self.peek_sym(',') {
                                self.next();
                            } else {
                                break;
                            }
                        }
                    }
                    self.expect(')');
                    Ast::Call(name, args)
                } else {
                    Ast::Var(name)
                }
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}

// ============================================================================
// Interpreter
// ============================================================================

/// Definitions parsed from a generated header
#[derive(Default)]
pub struct Glsl {
    structs: HashMap<String, Vec<String>>,
    functions: HashMap<String, Function>,
}

impl Glsl {
    /// Parse struct and function definitions
    pub fn parse(header: &str) -> Self {
        let mut glsl = Glsl::default();
        let mut p = Parser::new(header);
        while !p.at_end() {
            let first = p.ident();
            if first == "struct" {
                let name = p.ident();
                p.expect('{');
                let mut members = Vec::new();
                while !p.peek_sym('}') {
                    let _ty = p.ident();
                    members.push(p.ident());
                    p.expect(';');
                }
                p.expect('}');
                p.expect(';');
                glsl.structs.insert(name, members);
                continue;
            }

            // `first` is the return type
            let name = p.ident();
            p.expect('(');
            let mut params = Vec::new();
            while !p.peek_sym(')') {
                let _ty = p.ident();
                params.push(p.ident());
                if p.peek_sym(',') {
                    p.next();
                }
            }
            p.expect(')');
            p.expect('{');
            let mut body = Vec::new();
            while !p.peek_sym('}') {
                let head = p.ident();
                if head == "return" {
                    body.push(Stmt::Return(p.expr()));
                } else if p.peek_sym('=') {
                    p.next();
                    body.push(Stmt::Assign(head, p.expr()));
                } else {
                    let var = p.ident();
                    p.expect('=');
                    body.push(Stmt::Assign(var, p.expr()));
                }
                p.expect(';');
            }
            p.expect('}');
            glsl.functions.insert(name, Function { params, body });
        }
        glsl
    }

    /// Whether a function named `name` was defined
    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Evaluate a closed expression
    pub fn eval(&self, expr: &str) -> Value {
        self.eval_with(expr, &HashMap::new())
    }

    /// Evaluate an expression with free variables bound in `vars`
    pub fn eval_with(&self, expr: &str, vars: &HashMap<String, Value>) -> Value {
        let mut p = Parser::new(expr);
        let ast = p.expr();
        assert!(p.at_end(), "trailing input in {}", expr);
        self.run(&ast, vars)
    }

    fn run(&self, ast: &Ast, env: &HashMap<String, Value>) -> Value {
        match ast {
            Ast::Num(x) => Value::Float(*x),
            Ast::Var(name) => env
                .get(name)
                .cloned()
                .unwrap_or_else(|| panic!("unbound {}", name)),
            Ast::Neg(e) => binop('*', Value::Float(-1.0), self.run(e, env)),
            Ast::Bin(op, a, b) => binop(*op, self.run(a, env), self.run(b, env)),
            Ast::Member(e, name) => self.run(e, env).member(name),
            Ast::Index(e, i) => {
                let k = self.run(i, env).scalar() as usize;
                self.run(e, env).index(k)
            }
            Ast::Call(name, args) => {
                let args: Vec<Value> = args.iter().map(|a| self.run(a, env)).collect();
                self.call(name, args)
            }
        }
    }

    fn call(&self, name: &str, args: Vec<Value>) -> Value {
        match name {
            "float" => Value::Float(args[0].scalar()),
            "vec2" | "vec3" | "vec4" => {
                let n = name[3..].parse::<usize>().unwrap();
                if let [Value::Float(x)] = args.as_slice() {
                    return Value::Vec(vec![*x; n]);
                }
                let v: Vec<f64> = args.iter().flat_map(Value::flatten).collect();
                assert_eq!(v.len(), n, "{} from {:?}", name, args);
                Value::Vec(v)
            }
            "mat2" | "mat3" | "mat4" => {
                let n = name[3..].parse::<usize>().unwrap();
                let cols: Vec<Vec<f64>> = args.iter().map(Value::flatten).collect();
                assert_eq!(cols.len(), n);
                assert!(cols.iter().all(|c| c.len() == n));
                Value::Mat(cols)
            }
            "dot" => {
                let (a, b) = (args[0].flatten(), args[1].flatten());
                Value::Float(zip_with(&a, &b, |x, y| x * y).iter().sum())
            }
            _ => {
                if let Some(members) = self.structs.get(name) {
                    assert_eq!(members.len(), args.len(), "constructor {}", name);
                    return Value::Struct(name.to_string(), members.iter().cloned().zip(args).collect());
                }
                let f = self
                    .functions
                    .get(name)
                    .unwrap_or_else(|| panic!("unknown function {}", name));
                let mut env: HashMap<String, Value> = f.params.iter().cloned().zip(args).collect();
                for stmt in &f.body {
                    match stmt {
                        Stmt::Assign(var, e) => {
                            let v = self.run(e, &env);
                            env.insert(var.clone(), v);
                        }
                        Stmt::Return(e) => return self.run(e, &env),
                    }
                }
                panic!("{} did not return", name)
            }
        }
    }
}

// ============================================================================
// Program helpers
// ============================================================================

/// Vector literal of real constants
pub fn reals(values: &[f64]) -> Expr {
    Expr::list(values.iter().map(|&v| Expr::real(v)).collect())
}

/// Vector literal of complex constants
pub fn complexes(values: &[(f64, f64)]) -> Expr {
    Expr::list(values.iter().map(|&(re, im)| Expr::complex(re, im)).collect())
}

/// Compile in a fresh session without images
pub fn compile(expr: &Expr) -> Program {
    let images = ImageTable::new();
    let mut compiler = Compiler::new(CompileConfig::default(), &images);
    compiler.compile(expr).unwrap()
}

/// Compile and evaluate a closed expression
pub fn run(expr: &Expr) -> Value {
    let program = compile(expr);
    Glsl::parse(&program.header).eval(&program.expression)
}

/// Assert two scalar sequences agree within `1e-9`
pub fn assert_close(actual: &[f64], expected: &[f64]) {
    assert_eq!(actual.len(), expected.len(), "{:?} vs {:?}", actual, expected);
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert!((a - e).abs() < 1e-9, "slot {}: {} != {} ({:?} vs {:?})", i, a, e, actual, expected);
    }
}

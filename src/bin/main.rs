//! glsl-synth CLI
//!
//! Command-line interface for compiling program files to GLSL.
//!
//! Author: Moroya Sakamoto

#![allow(clippy::uninlined_format_args, clippy::needless_pass_by_value)]

#[cfg(feature = "cli")]
use glsl_synth::prelude::*;
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "glsl-synth")]
#[command(author = "Moroya Sakamoto")]
#[command(version = glsl_synth::VERSION)]
#[command(about = "GLSL code synthesis for real and complex linear algebra", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Compile a program file
    Compile {
        /// Input program file (.json)
        input: PathBuf,
        /// Extra image, as NAME=WIDTHxHEIGHT (repeatable)
        #[arg(long = "image", value_parser = parse_image)]
        images: Vec<(String, ImageDescriptor)>,
        /// Emit a complete fragment shader
        #[arg(long)]
        fragment: bool,
        /// Output file (stdout if absent)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the definitions a program file needs
    Header {
        /// Input program file (.json)
        input: PathBuf,
    },

    /// Show how a width is split into native chunks
    Types {
        /// Vector width
        n: usize,
    },
}

#[cfg(feature = "cli")]
fn parse_image(s: &str) -> std::result::Result<(String, ImageDescriptor), String> {
    let (name, size) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=WIDTHxHEIGHT, got '{}'", s))?;
    let (w, h) = size
        .split_once('x')
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", size))?;
    let width: u32 = w.parse().map_err(|e| format!("bad width '{}': {}", w, e))?;
    let height: u32 = h.parse().map_err(|e| format!("bad height '{}': {}", h, e))?;
    if width == 0 || height == 0 {
        return Err(format!("image '{}' has zero size", name));
    }
    Ok((name.to_string(), ImageDescriptor::new(width, height)))
}

#[cfg(feature = "cli")]
fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Compile {
            input,
            images,
            fragment,
            output,
        } => cmd_compile(input, images, fragment, output),
        Commands::Header { input } => cmd_header(input),
        Commands::Types { n } => cmd_types(n),
    }
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI not enabled. Build with --features cli");
    std::process::exit(1);
}

#[cfg(feature = "cli")]
fn load_or_exit(input: &PathBuf) -> ProgramFile {
    match load_program(input) {
        Ok(program) => program,
        Err(e) => {
            eprintln!("Load error: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(feature = "cli")]
fn compile_or_exit(file: &ProgramFile) -> Program {
    let mut compiler = Compiler::new(file.config, &file.images);
    match compiler.compile(&file.expr) {
        Ok(program) => program,
        Err(e) => {
            eprintln!("Compile error: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(feature = "cli")]
fn cmd_compile(input: PathBuf, images: Vec<(String, ImageDescriptor)>, fragment: bool, output: Option<PathBuf>) {
    let mut file = load_or_exit(&input);
    for (name, descriptor) in images {
        file.images.insert(name, descriptor);
    }

    let program = compile_or_exit(&file);
    for d in &program.diagnostics {
        eprintln!("Warning: {}: {}", d.node, d.message);
    }

    let text = if fragment {
        match program.to_fragment_shader() {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Compile error: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        let mut s = program.source();
        s.push('\n');
        s
    };

    match output {
        Some(path) => match std::fs::write(&path, text) {
            Ok(()) => {
                println!("Wrote {} ({} : {})", path.display(), program.ty, program.ty.glsl_name());
                for t in &program.textures {
                    println!(
                        "  texture {}: {} ratio={} {} cropfact=({}, {})",
                        t.image, t.ratio_uniform, t.ratio, t.cropfact_uniform, t.cropfact.x, t.cropfact.y
                    );
                }
            }
            Err(e) => {
                eprintln!("Write error: {}", e);
                std::process::exit(1);
            }
        },
        None => print!("{}", text),
    }
}

#[cfg(feature = "cli")]
fn cmd_header(input: PathBuf) {
    let file = load_or_exit(&input);
    let program = compile_or_exit(&file);
    print!("{}{}", program.header, program.texture_header);
}

#[cfg(feature = "cli")]
fn cmd_types(n: usize) {
    if let Err(e) = Type::vector(n, ScalarKind::Real) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    let chunks = decompose(n);
    println!("decompose({}) = {:?}", n, chunks);

    let mut builder = ShaderBuilder::new();
    for scalar in [ScalarKind::Real, ScalarKind::Complex] {
        let ty = match Type::vector(n, scalar) {
            Ok(ty) => ty,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        };
        if let Err(e) = builder.ensure_struct(&ty) {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
        println!("{} -> {}", ty.glsl_name(), if ty.is_native() { "native" } else { "struct" });
    }
    print!("{}", builder.header());
}

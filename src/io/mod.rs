//! Program files
//!
//! A program file is a JSON document holding an expression tree, the images
//! it may read and the compilation settings:
//!
//! ```json
//! {
//!   "expr": { "op": "image_rgb", "image": "pic", "point": { "op": "pixel" } },
//!   "images": { "pic": { "width": 64, "height": 32 } },
//!   "config": { "version": "es300" }
//! }
//! ```
//!
//! `images` and `config` may be omitted.
//!
//! Author: Moroya Sakamoto

mod json;

pub use json::{from_json_string, load_program, save_program, to_json_string};

use crate::compiler::Expr;
use crate::config::CompileConfig;
use crate::texture::ImageTable;
use serde::{Deserialize, Serialize};

/// Contents of a program file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramFile {
    /// Expression to compile
    pub expr: Expr,
    /// Images available to image reads
    #[serde(default)]
    pub images: ImageTable,
    /// Compilation settings
    #[serde(default)]
    pub config: CompileConfig,
}

impl ProgramFile {
    /// Program with no images and default settings
    pub fn new(expr: Expr) -> Self {
        Self {
            expr,
            images: ImageTable::default(),
            config: CompileConfig::default(),
        }
    }
}

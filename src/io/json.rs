//! JSON program files
//!
//! Streaming reads and writes through `BufReader`/`BufWriter`.
//!
//! Author: Moroya Sakamoto

use super::ProgramFile;
use crate::error::Result;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Save a program file (pretty-printed)
pub fn save_program(program: &ProgramFile, path: impl AsRef<Path>) -> Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, program)?;
    Ok(())
}

/// Load a program file
pub fn load_program(path: impl AsRef<Path>) -> Result<ProgramFile> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let program: ProgramFile = serde_json::from_reader(reader)?;
    log::debug!("loaded program with {} images", program.images.len());
    Ok(program)
}

/// Serialize a program file to a JSON string
pub fn to_json_string(program: &ProgramFile) -> Result<String> {
    Ok(serde_json::to_string_pretty(program)?)
}

/// Parse a program file from a JSON string
pub fn from_json_string(json: &str) -> Result<ProgramFile> {
    Ok(serde_json::from_str(json)?)
}

//! `hdml` is a checker for a tiny hardware description language in which every circuit
//! is built out of `nand` gates.
//!
//! A program is a list of definitions, eg:
//!
//! ```text
//! and p q = let n = nand ( p q ) in nand ( n n )
//! ```
//!
//! Checking a program builds one circuit graph per definition, which can then be
//! written out as a JSON [`Netlist`] or tabulated with [`analysis::truth_table`].

mod loc;
mod parse;

pub mod analysis;
pub mod ast;
pub mod check;
pub mod error;
pub mod graph;
pub mod netlist;


pub use check::{check_program, CheckedDefinition, CheckedProgram};
pub use error::HdmlError;
pub use loc::{HasLoc, LineCol, Loc, Source, SourceInfo};
pub use netlist::Netlist;
pub use parse::{parse_program_from_file, parse_program_from_string};

use log::*;

/// Parses and checks a program.
pub fn load_program_from_string(text: &str) -> Result<CheckedProgram, Vec<HdmlError>> {
    let program = parse_program_from_string(text)?;
    check_program(&program).map_err(|error| vec![error])
}

/// Reads, parses and checks a program.
pub fn load_program_from_file<P: AsRef<std::path::Path>>(path: P) -> Result<CheckedProgram, Vec<HdmlError>> {
    info!("Loading {}", path.as_ref().display());
    let program = parse_program_from_file(path)?;
    check_program(&program).map_err(|error| vec![error])
}

pub fn load_netlist_from_string(text: &str) -> Result<Netlist, Vec<HdmlError>> {
    let program = load_program_from_string(text)?;
    Ok(Netlist::from(&program))
}

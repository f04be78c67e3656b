use super::ast::Program;
use super::error::HdmlError;
use super::loc::{Loc, SourceInfo};

use lalrpop_util::lalrpop_mod;
use lalrpop_util::ParseError;
use log::*;

lalrpop_mod!(grammar);

pub fn parse_program_from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Program, Vec<HdmlError>> {
    let program_text = match std::fs::read_to_string(path.as_ref()) {
        Ok(text) => text,
        Err(error) => {
            let message = format!("Couldn't read {}: {error}", path.as_ref().display());
            return Err(vec![HdmlError::ParseError(Loc::unknown(), message)]);
        },
    };
    let source_info = SourceInfo::from_file(path.as_ref(), &program_text);
    program_from_string(source_info, &program_text)
}

pub fn parse_program_from_string(program_text: &str) -> Result<Program, Vec<HdmlError>> {
    let source_info = SourceInfo::from_string(program_text);
    program_from_string(source_info, program_text)
}

fn program_from_string(source_info: SourceInfo, program_text: &str) -> Result<Program, Vec<HdmlError>> {
    match grammar::ProgramParser::new().parse(&source_info, program_text) {
        Ok(program) => {
            info!("Parsed {} definitions", program.definitions.len());
            Ok(program)
        },
        Err(ParseError::UnrecognizedToken { token, expected }) => {
            let (start_idx, _token, end_idx) = token;
            let loc = Loc::from(&source_info, start_idx, end_idx);
            let message = format!("Parse error: Expected one of {}", expected.join(" "));
            Err(vec![HdmlError::ParseError(loc, message)])
        },
        Err(ParseError::InvalidToken { location }) => {
            let loc = Loc::from(&source_info, location, location + 1);
            Err(vec![HdmlError::ParseError(loc, "Parse error: invalid token".to_string())])
        },
        Err(ParseError::ExtraToken { token }) => {
            let (start_idx, token, end_idx) = token;
            let loc = Loc::from(&source_info, start_idx, end_idx);
            let message = format!("Parse error: extra token: {token}");
            Err(vec![HdmlError::ParseError(loc, message)])
        },
        Err(ParseError::UnrecognizedEof { location, expected }) => {
            let loc = Loc::from(&source_info, location, location);
            let message = format!("Parse error: Unexpected end of file: Expected one of {}", expected.join(" "));
            Err(vec![HdmlError::ParseError(loc, message)])
        },
        Err(ParseError::User { error }) => {
            let message = format!("Parse error: {error}");
            Err(vec![HdmlError::ParseError(Loc::unknown(), message)])
        },
    }
}

use super::ast::Ident;
use super::loc::{HasLoc, Loc};

/// Everything that can go wrong between source text and a checked program.
///
/// The checker stops at the first error it finds.
#[derive(Debug, Clone)]
pub enum HdmlError {
    ParseError(Loc, String),
    /// A top-level definition reuses the name of an earlier one (including `nand`).
    DuplicateName(Ident),
    /// A parameter or `let` binding reuses a name already bound in its definition.
    DuplicateLocalIdentifier(Ident),
    /// A bare identifier which is never bound in its definition.
    SymbolNotFound(Ident),
    /// A call whose target is not a definition.
    NotCallable(Ident),
    /// A bare identifier naming something that has no value, such as a definition.
    NotAValue(Ident),
    /// A call with more arguments than its callee has parameters: (callee, expected, found).
    TooManyArguments(Ident, usize, usize),
    /// A literal other than `0` or `1`.
    InvalidLiteral(Loc, u64),
    /// A literal in place of a parameter name.
    InvalidPattern(Loc, u64),
    /// A call of a name which is not defined anywhere in the program.
    UnresolvedForwardReference(Ident),
}

impl std::fmt::Display for HdmlError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            HdmlError::ParseError(_loc, message) => write!(f, "{message}"),
            HdmlError::DuplicateName(ident) => write!(f, "Duplicate function name: {ident}"),
            HdmlError::DuplicateLocalIdentifier(ident) => write!(f, "Duplicate local identifier: {ident}"),
            HdmlError::SymbolNotFound(ident) => write!(f, "Symbol not found: {ident}"),
            HdmlError::NotCallable(ident) => write!(f, "Can't call something that's not a function: {ident}"),
            HdmlError::NotAValue(ident) => write!(f, "Not a value: {ident}"),
            HdmlError::TooManyArguments(ident, expected, found) => {
                write!(f, "Too many arguments: {ident} takes {expected} but was given {found}")
            },
            HdmlError::InvalidLiteral(_loc, value) => write!(f, "Invalid literal: {value} isn't real"),
            HdmlError::InvalidPattern(_loc, value) => write!(f, "Invalid parameter: {value} is not a name"),
            HdmlError::UnresolvedForwardReference(ident) => write!(f, "Function is never defined: {ident}"),
        }
    }
}

impl std::error::Error for HdmlError {}

impl HasLoc for HdmlError {
    fn loc(&self) -> Loc {
        match self {
            HdmlError::ParseError(loc, _message) => loc.clone(),
            HdmlError::DuplicateName(ident) => ident.loc(),
            HdmlError::DuplicateLocalIdentifier(ident) => ident.loc(),
            HdmlError::SymbolNotFound(ident) => ident.loc(),
            HdmlError::NotCallable(ident) => ident.loc(),
            HdmlError::NotAValue(ident) => ident.loc(),
            HdmlError::TooManyArguments(ident, _expected, _found) => ident.loc(),
            HdmlError::InvalidLiteral(loc, _value) => loc.clone(),
            HdmlError::InvalidPattern(loc, _value) => loc.clone(),
            HdmlError::UnresolvedForwardReference(ident) => ident.loc(),
        }
    }
}

use super::loc::{HasLoc, Loc};

pub type Name = String;

/// A `Program` is a compilation unit built from a single file.
/// It is an ordered list of [`Definition`]s.
#[derive(Debug, Clone)]
pub struct Program {
    pub definitions: Vec<Definition>,
}

/// A named circuit. Eg, `and p q = let n = nand ( p q ) in nand ( n n )`.
#[derive(Debug, Clone)]
pub struct Definition {
    pub ident: Ident,
    pub patterns: Vec<Pattern>,
    pub body: Expr,
}

/// A formal parameter of a [`Definition`].
#[derive(Debug, Clone)]
pub enum Pattern {
    /// An unnamed input. Written `_`. Occupies a pin but cannot be referenced.
    Underscore(Loc),
    /// A named input.
    Ident(Ident),
    /// A literal. Parses, but is rejected by the checker.
    Literal(Loc, u64),
}

/// An expression.
#[derive(Debug, Clone)]
pub enum Expr {
    /// A constant signal. Only `0` and `1` pass the checker.
    Literal(Loc, u64),
    /// A reference to an input, a constant, or a `let`-bound variable.
    Ident(Ident),
    /// Let binding. Eg, `let n = nand ( p q ) in nand ( n n )`.
    Let(Loc, Ident, Box<Expr>, Box<Expr>),
    /// An instance of a definition or of the `nand` primitive. Eg, `nand ( p q )`.
    Call(Loc, Ident, Vec<Expr>),
}

/// An identifier in the grammar.
#[derive(Debug, Clone)]
pub struct Ident {
    pub loc: Loc,
    pub name: Name,
}

impl Ident {
    pub fn new<S: Into<Name>>(name: S) -> Ident {
        Ident {
            loc: Loc::unknown(),
            name: name.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl PartialEq for Ident {
    fn eq(&self, other: &Ident) -> bool {
        self.name == other.name
    }
}

impl Eq for Ident {}

impl Expr {
    /// The tag a node produced by this expression carries in the netlist.
    ///
    /// For a call, this is the name of the callee.
    /// For a `let`, it is the tag of its body.
    pub fn tag(&self) -> String {
        match self {
            Expr::Literal(_loc, value) => value.to_string(),
            Expr::Ident(ident) => ident.to_string(),
            Expr::Let(_loc, _ident, _def, body) => body.tag(),
            Expr::Call(_loc, callee, _args) => callee.to_string(),
        }
    }

    /// Whether checking this expression synthesizes a fresh call instance as its value.
    pub fn produces_call(&self) -> bool {
        match self {
            Expr::Call(_loc, _callee, _args) => true,
            Expr::Let(_loc, _ident, _def, body) => body.produces_call(),
            Expr::Literal(_loc, _value) => false,
            Expr::Ident(_ident) => false,
        }
    }
}

impl HasLoc for Ident {
    fn loc(&self) -> Loc {
        self.loc.clone()
    }
}

impl HasLoc for Expr {
    fn loc(&self) -> Loc {
        match self {
            Expr::Literal(loc, _value) => loc.clone(),
            Expr::Ident(ident) => ident.loc(),
            Expr::Let(loc, _ident, _def, _body) => loc.clone(),
            Expr::Call(loc, _callee, _args) => loc.clone(),
        }
    }
}

impl HasLoc for Pattern {
    fn loc(&self) -> Loc {
        match self {
            Pattern::Underscore(loc) => loc.clone(),
            Pattern::Ident(ident) => ident.loc(),
            Pattern::Literal(loc, _value) => loc.clone(),
        }
    }
}

impl std::fmt::Display for Ident {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Pattern::Underscore(_loc) => write!(f, "_"),
            Pattern::Ident(ident) => write!(f, "{ident}"),
            Pattern::Literal(_loc, value) => write!(f, "{value}"),
        }
    }
}

impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Literal(_loc, value) => write!(f, "{value}"),
            Expr::Ident(ident) => write!(f, "{ident}"),
            Expr::Let(_loc, ident, def, body) => write!(f, "let {ident} = {def} in {body}"),
            Expr::Call(_loc, callee, args) => {
                write!(f, "{callee} (")?;
                for arg in args {
                    write!(f, " {arg}")?;
                }
                write!(f, " )")
            },
        }
    }
}

impl std::fmt::Display for Definition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.ident)?;
        for pattern in &self.patterns {
            write!(f, " {pattern}")?;
        }
        write!(f, " = {}", self.body)
    }
}

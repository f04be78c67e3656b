use super::ast::{Definition, Expr, Ident, Name, Pattern, Program};
use super::error::HdmlError;
use super::graph::{CallSite, Graph, Node, NodeKind, Pin, Symbol};

use log::*;
use std::collections::BTreeSet;

/// The name of the primitive gate.
pub const NAND: &str = "nand";
/// The pins of the primitive gate.
pub const NAND_PARAMS: [&str; 2] = ["x", "y"];
/// The constant sources present in every definition.
pub const CONSTANTS: [&str; 2] = ["0", "1"];

/// The name of the output node of the definition named `name`.
pub fn output_name(name: &str) -> Name {
    format!("{name}_OUTPUT")
}

/// A definition whose body has been checked.
/// Its graph holds every node of the circuit it describes.
#[derive(Debug, Clone)]
pub struct CheckedDefinition {
    pub ident: Ident,
    pub patterns: Vec<Pattern>,
    pub body: Expr,
    /// The pin names of the definition, in order.
    pub inputs: Vec<Name>,
    pub graph: Graph,
}

impl CheckedDefinition {
    pub fn name(&self) -> &str {
        self.ident.as_str()
    }
}

#[derive(Debug, Clone)]
pub struct CheckedProgram {
    pub definitions: Vec<CheckedDefinition>,
    /// The top-level definitions, `nand` included.
    pub symbols: Graph,
}

impl CheckedProgram {
    pub fn definition(&self, name: &str) -> Option<&CheckedDefinition> {
        self.definitions.iter().find(|definition| definition.name() == name)
    }
}

/// Checks every definition of `program` in order, building the graph of each.
pub fn check_program(program: &Program) -> Result<CheckedProgram, HdmlError> {
    let mut checker = Checker::for_program(program);
    let mut definitions = vec![];
    for definition in &program.definitions {
        definitions.push(checker.check_definition(definition)?);
    }
    checker.resolve_forward_references(&mut definitions)?;
    Ok(CheckedProgram {
        definitions,
        symbols: checker.symbols,
    })
}

/// State shared by every definition of a program while it is being checked.
pub struct Checker {
    symbols: Graph,
    gensym_id: usize,
    /// Names written anywhere in the program. Instance names never take one of these.
    reserved: BTreeSet<Name>,
}

impl Checker {
    pub fn new() -> Checker {
        let mut symbols = Graph::new();
        let params = NAND_PARAMS.iter().map(|param| param.to_string()).collect();
        symbols.insert(NAND, Node::new(Symbol::Definition { params }));
        Checker {
            symbols,
            gensym_id: 0,
            reserved: BTreeSet::new(),
        }
    }

    pub fn for_program(program: &Program) -> Checker {
        let mut checker = Checker::new();
        for definition in &program.definitions {
            checker.reserved.insert(definition.ident.to_string());
            for pattern in &definition.patterns {
                if let Pattern::Ident(ident) = pattern {
                    checker.reserved.insert(ident.to_string());
                }
            }
            reserve_names(&mut checker.reserved, &definition.body);
        }
        checker
    }

    pub fn check_definition(&mut self, definition: &Definition) -> Result<CheckedDefinition, HdmlError> {
        info!("Checking definition {}", definition.ident);
        debug!("Definition {definition}");

        let name = definition.ident.as_str();
        if self.symbols.contains(name) {
            return Err(HdmlError::DuplicateName(definition.ident.clone()));
        }

        let inputs = pin_names(&definition.patterns)?;
        // registered before the body is checked so that a definition may call itself
        self.symbols.insert(name, Node::new(Symbol::Definition { params: inputs.clone() }));

        let mut graph = self.symbols.clone();
        if graph.insert(output_name(name), Node::new(Symbol::Output)).is_some() {
            return Err(HdmlError::DuplicateName(definition.ident.clone()));
        }
        for constant in CONSTANTS {
            graph.insert(constant, Node::new(Symbol::Input));
        }

        for pattern in &definition.patterns {
            bind_pattern(&mut graph, pattern)?;
        }
        self.check_expr(&mut graph, &definition.body, &output_name(name), Pin::Unnamed)?;

        if let Some(placeholder) = graph.placeholders(NodeKind::Variable).first() {
            if let Some(Symbol::Undefined { first_use, .. }) = graph.get(placeholder).map(|node| &node.symbol) {
                return Err(HdmlError::SymbolNotFound(first_use.clone()));
            }
        }

        debug!("Definition {name} has {} nodes", graph.len());
        Ok(CheckedDefinition {
            ident: definition.ident.clone(),
            patterns: definition.patterns.clone(),
            body: definition.body.clone(),
            inputs,
            graph,
        })
    }

    /// Checks `expr`, wiring its value to `pin` of `sink`.
    /// Returns the name of the node which holds the value of `expr`.
    fn check_expr(&mut self, graph: &mut Graph, expr: &Expr, sink: &str, pin: Pin) -> Result<Name, HdmlError> {
        debug!("Expression {expr}");
        match expr {
            Expr::Literal(loc, value) => {
                let name = match value {
                    0 => CONSTANTS[0],
                    1 => CONSTANTS[1],
                    _ => return Err(HdmlError::InvalidLiteral(loc.clone(), *value)),
                };
                graph.connect(name, sink, pin);
                Ok(name.to_string())
            },
            Expr::Ident(ident) => {
                let name = ident.as_str();
                match graph.get(name).map(Node::is_value) {
                    Some(true) => (),
                    Some(false) => return Err(HdmlError::NotAValue(ident.clone())),
                    None => {
                        debug!("Forward reference to {name}");
                        graph.insert(name, Node::undefined(ident, &[NodeKind::Input, NodeKind::Variable]));
                    },
                }
                graph.connect(name, sink, pin);
                Ok(name.to_string())
            },
            Expr::Let(_loc, ident, def, body) => {
                self.check_let(graph, ident, def)?;
                self.check_expr(graph, body, sink, pin)
            },
            Expr::Call(_loc, callee, args) => self.check_call(graph, callee, args, sink, pin),
        }
    }

    fn check_call(
        &mut self,
        graph: &mut Graph,
        callee: &Ident,
        args: &[Expr],
        sink: &str,
        pin: Pin,
    ) -> Result<Name, HdmlError> {
        if !graph.contains(callee.as_str()) {
            debug!("Forward reference to function {callee}");
            graph.insert(callee.as_str(), Node::undefined(callee, &[NodeKind::Definition]));
        }

        // None when the callee has not been declared yet
        let params: Option<Vec<Name>> = match graph.get(callee.as_str()).map(|node| &node.symbol) {
            Some(Symbol::Definition { params }) => Some(params.clone()),
            Some(Symbol::Undefined { expected, .. }) if expected.contains(&NodeKind::Definition) => None,
            // already used as a bare value further left
            Some(Symbol::Undefined { first_use, .. }) => return Err(HdmlError::NotAValue(first_use.clone())),
            _ => return Err(HdmlError::NotCallable(callee.clone())),
        };

        let instance = self.gensym(graph, callee.as_str());
        let call_site = CallSite {
            callee: callee.clone(),
            args: args.len(),
        };
        graph.insert(instance.as_str(), Node::new(Symbol::Call(call_site)));
        graph.connect(&instance, sink, pin);

        if let Some(params) = &params {
            if args.len() > params.len() {
                return Err(HdmlError::TooManyArguments(callee.clone(), params.len(), args.len()));
            }
        }

        for (i, arg) in args.iter().enumerate() {
            let arg_pin = match &params {
                Some(params) => Pin::Named(params[i].clone()),
                None => Pin::Positional(i),
            };
            self.check_expr(graph, arg, &instance, arg_pin)?;
        }
        Ok(instance)
    }

    /// Binds `ident` to the value of `def`.
    ///
    /// When `def` yields a fresh call instance, the instance is merged into the variable:
    /// its inputs are rewired to the variable and the instance node is removed.
    /// Otherwise the variable is an alias driven by whatever node `def` yields.
    fn check_let(&mut self, graph: &mut Graph, ident: &Ident, def: &Expr) -> Result<(), HdmlError> {
        let name = ident.as_str();
        let references = match graph.get(name) {
            None => vec![],
            Some(node) if node.awaits(NodeKind::Variable) => node.references.clone(),
            Some(_node) => return Err(HdmlError::DuplicateLocalIdentifier(ident.clone())),
        };

        let variable = Symbol::Variable {
            value: def.clone(),
            call: None,
        };
        graph.insert(name, Node::with_references(variable, references));

        let produced = self.check_expr(graph, def, name, Pin::Unnamed)?;
        if !def.produces_call() {
            return Ok(());
        }

        debug!("Merging {produced} into {name}");
        let merged = graph.rename(&produced, name).and_then(|node| node.call_site().cloned());
        if let Some(Node { symbol: Symbol::Variable { call, .. }, .. }) = graph.get_mut(name) {
            *call = merged;
        }
        Ok(())
    }

    /// Resolves every call of a function that was not declared yet at the time of the call.
    ///
    /// Runs once the whole program has been checked, so every top-level definition is known.
    pub fn resolve_forward_references(&self, definitions: &mut [CheckedDefinition]) -> Result<(), HdmlError> {
        for definition in definitions.iter_mut() {
            let graph = &mut definition.graph;
            for placeholder in graph.placeholders(NodeKind::Definition) {
                let first_use = match graph.get(&placeholder).map(|node| &node.symbol) {
                    Some(Symbol::Undefined { first_use, .. }) => first_use.clone(),
                    _ => continue,
                };

                let params = match self.symbols.get(&placeholder).map(|node| &node.symbol) {
                    Some(Symbol::Definition { params }) => params.clone(),
                    _ => return Err(HdmlError::UnresolvedForwardReference(first_use)),
                };
                debug!("Resolved {placeholder} in {}", definition.ident);

                for (instance, call_site) in graph.call_sites_of(&placeholder) {
                    if call_site.args > params.len() {
                        return Err(HdmlError::TooManyArguments(call_site.callee, params.len(), call_site.args));
                    }
                    graph.name_pins(&instance, &params);
                }
                graph.insert(placeholder, Node::new(Symbol::Definition { params }));
            }
        }
        Ok(())
    }

    /// A fresh name for an instance of `callee`, unique across the program.
    fn gensym(&mut self, graph: &Graph, callee: &str) -> Name {
        loop {
            let name = format!("{callee}{:06}", self.gensym_id);
            self.gensym_id += 1;
            if !graph.contains(&name) && !self.reserved.contains(&name) {
                return name;
            }
        }
    }
}

impl Default for Checker {
    fn default() -> Checker {
        Checker::new()
    }
}

fn reserve_names(reserved: &mut BTreeSet<Name>, expr: &Expr) {
    match expr {
        Expr::Literal(_loc, _value) => (),
        Expr::Ident(ident) => {
            reserved.insert(ident.to_string());
        },
        Expr::Let(_loc, ident, def, body) => {
            reserved.insert(ident.to_string());
            reserve_names(reserved, def);
            reserve_names(reserved, body);
        },
        Expr::Call(_loc, callee, args) => {
            reserved.insert(callee.to_string());
            for arg in args {
                reserve_names(reserved, arg);
            }
        },
    }
}

/// Binds a formal parameter as an input of the definition being checked.
fn bind_pattern(graph: &mut Graph, pattern: &Pattern) -> Result<(), HdmlError> {
    debug!("Pattern {pattern}");
    match pattern {
        Pattern::Underscore(_loc) => Ok(()),
        Pattern::Literal(loc, value) => Err(HdmlError::InvalidPattern(loc.clone(), *value)),
        Pattern::Ident(ident) => {
            let references = match graph.get(ident.as_str()) {
                None => vec![],
                Some(node) if node.awaits(NodeKind::Input) => node.references.clone(),
                Some(_node) => return Err(HdmlError::DuplicateLocalIdentifier(ident.clone())),
            };
            graph.insert(ident.as_str(), Node::with_references(Symbol::Input, references));
            Ok(())
        },
    }
}

/// The pin name of each formal parameter. An `_` in position `i` is named `_i`.
fn pin_names(patterns: &[Pattern]) -> Result<Vec<Name>, HdmlError> {
    let mut names = vec![];
    for (i, pattern) in patterns.iter().enumerate() {
        match pattern {
            Pattern::Underscore(_loc) => names.push(format!("_{i}")),
            Pattern::Ident(ident) => names.push(ident.to_string()),
            Pattern::Literal(loc, value) => return Err(HdmlError::InvalidPattern(loc.clone(), *value)),
        }
    }
    Ok(names)
}

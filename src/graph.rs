use super::ast::{Expr, Ident, Name};

use std::collections::{BTreeMap, BTreeSet};

/// The kinds of [`Node`] a [`Graph`] can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeKind {
    Definition,
    Input,
    Output,
    Variable,
    Call,
    Undefined,
}

/// The input of a node that a wire drives.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Pin {
    /// The only input of an output or a variable.
    Unnamed,
    /// A parameter of the callee of a call instance.
    Named(Name),
    /// The i-th argument of a call whose callee has not been declared yet.
    Positional(usize),
}

impl std::fmt::Display for Pin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Pin::Unnamed => Ok(()),
            Pin::Named(name) => write!(f, "{name}"),
            Pin::Positional(i) => write!(f, "#{i}"),
        }
    }
}

/// A wire leaving a node: it drives `pin` of the node named `sink`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub sink: Name,
    pub pin: Pin,
}

/// One invocation of a definition, with the number of arguments it was given.
#[derive(Debug, Clone)]
pub struct CallSite {
    pub callee: Ident,
    pub args: usize,
}

#[derive(Debug, Clone)]
pub enum Symbol {
    /// A callable definition and the names of its pins, in order.
    Definition { params: Vec<Name> },
    /// A parameter, or one of the constants `0` and `1`.
    Input,
    /// The value of a definition's body.
    Output,
    /// A `let` binding. When its value was a call, the call site was merged into it.
    Variable { value: Expr, call: Option<CallSite> },
    Call(CallSite),
    /// A name used before it was bound, and the kinds it may still become.
    Undefined { first_use: Ident, expected: BTreeSet<NodeKind> },
}

#[derive(Debug, Clone)]
pub struct Node {
    pub symbol: Symbol,
    pub references: Vec<Reference>,
}

impl Node {
    pub fn new(symbol: Symbol) -> Node {
        Node {
            symbol,
            references: vec![],
        }
    }

    pub fn with_references(symbol: Symbol, references: Vec<Reference>) -> Node {
        Node {
            symbol,
            references,
        }
    }

    pub fn undefined(first_use: &Ident, expected: &[NodeKind]) -> Node {
        Node::new(Symbol::Undefined {
            first_use: first_use.clone(),
            expected: expected.iter().copied().collect(),
        })
    }

    pub fn kind(&self) -> NodeKind {
        match &self.symbol {
            Symbol::Definition { .. } => NodeKind::Definition,
            Symbol::Input => NodeKind::Input,
            Symbol::Output => NodeKind::Output,
            Symbol::Variable { .. } => NodeKind::Variable,
            Symbol::Call(_call_site) => NodeKind::Call,
            Symbol::Undefined { .. } => NodeKind::Undefined,
        }
    }

    /// Whether this node is a placeholder which may still resolve to `kind`.
    pub fn awaits(&self, kind: NodeKind) -> bool {
        match &self.symbol {
            Symbol::Undefined { expected, .. } => expected.contains(&kind),
            _ => false,
        }
    }

    /// Whether this node has a value which can drive a wire.
    pub fn is_value(&self) -> bool {
        match &self.symbol {
            Symbol::Input => true,
            Symbol::Variable { .. } => true,
            Symbol::Call(_call_site) => true,
            Symbol::Undefined { .. } => self.awaits(NodeKind::Input) || self.awaits(NodeKind::Variable),
            Symbol::Definition { .. } => false,
            Symbol::Output => false,
        }
    }

    /// The call site this node stands for, if it is a call instance or a variable merged with one.
    pub fn call_site(&self) -> Option<&CallSite> {
        match &self.symbol {
            Symbol::Call(call_site) => Some(call_site),
            Symbol::Variable { call, .. } => call.as_ref(),
            _ => None,
        }
    }
}

/// A symbol table which is also the circuit graph of a definition under construction.
///
/// Each node owns the list of wires leaving it.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: BTreeMap<Name, Node>,
}

impl Graph {
    pub fn new() -> Graph {
        Graph::default()
    }

    pub fn get(&self, name: &str) -> Option<&Node> {
        self.nodes.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.nodes.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn insert<S: Into<Name>>(&mut self, name: S, node: Node) -> Option<Node> {
        self.nodes.insert(name.into(), node)
    }

    pub fn remove(&mut self, name: &str) -> Option<Node> {
        self.nodes.remove(name)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (&Name, &Node)> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Adds a wire from `source` to `pin` of `sink`.
    /// Returns false, and does nothing, when there is no node named `source`.
    pub fn connect(&mut self, source: &str, sink: &str, pin: Pin) -> bool {
        match self.nodes.get_mut(source) {
            Some(node) => {
                node.references.push(Reference { sink: sink.to_string(), pin });
                true
            },
            None => false,
        }
    }

    /// Every wire arriving at `sink`, as (source, pin) pairs.
    pub fn references_to(&self, sink: &str) -> Vec<(Name, Pin)> {
        let mut results = vec![];
        for (name, node) in &self.nodes {
            for reference in &node.references {
                if reference.sink == sink {
                    results.push((name.clone(), reference.pin.clone()));
                }
            }
        }
        results
    }

    /// Retargets every wire arriving at `old` so that it arrives at `new` instead,
    /// then removes `old` and returns it.
    ///
    /// The wires leaving `old` go with it.
    pub fn rename(&mut self, old: &str, new: &str) -> Option<Node> {
        if old == new {
            return None;
        }
        for node in self.nodes.values_mut() {
            for reference in node.references.iter_mut() {
                if reference.sink == old {
                    reference.sink = new.to_string();
                }
            }
        }
        self.remove(old)
    }

    /// Replaces the positional pins of wires arriving at `sink` with the names in `params`.
    pub fn name_pins(&mut self, sink: &str, params: &[Name]) {
        for node in self.nodes.values_mut() {
            for reference in node.references.iter_mut() {
                if reference.sink != sink {
                    continue;
                }
                if let Pin::Positional(i) = reference.pin {
                    if let Some(param) = params.get(i) {
                        reference.pin = Pin::Named(param.clone());
                    }
                }
            }
        }
    }

    /// The names of placeholders which may still resolve to `kind`.
    pub fn placeholders(&self, kind: NodeKind) -> Vec<Name> {
        self.nodes
            .iter()
            .filter(|(_name, node)| node.awaits(kind))
            .map(|(name, _node)| name.clone())
            .collect()
    }

    /// Every node standing for an invocation of `callee`, with its call site.
    pub fn call_sites_of(&self, callee: &str) -> Vec<(Name, CallSite)> {
        let mut results = vec![];
        for (name, node) in &self.nodes {
            if let Some(call_site) = node.call_site() {
                if call_site.callee.as_str() == callee {
                    results.push((name.clone(), call_site.clone()));
                }
            }
        }
        results
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn call(callee: &str, args: usize) -> Node {
        Node::new(Symbol::Call(CallSite { callee: Ident::new(callee), args }))
    }

    #[test]
    fn rename_retargets_and_removes() {
        let mut graph = Graph::new();
        graph.insert("a", Node::new(Symbol::Input));
        graph.insert("b", Node::new(Symbol::Input));
        graph.insert("x", Node::new(Symbol::Variable { value: Expr::Ident(Ident::new("a")), call: None }));
        graph.insert("nand000000", call("nand", 2));
        graph.insert("f_OUTPUT", Node::new(Symbol::Output));

        graph.connect("a", "nand000000", Pin::Named("x".to_string()));
        graph.connect("b", "nand000000", Pin::Named("y".to_string()));
        graph.connect("nand000000", "x", Pin::Unnamed);
        graph.connect("x", "f_OUTPUT", Pin::Unnamed);

        let removed = graph.rename("nand000000", "x").unwrap();
        assert_eq!(removed.kind(), NodeKind::Call);
        assert!(!graph.contains("nand000000"));

        assert_eq!(
            graph.references_to("x"),
            vec![
                ("a".to_string(), Pin::Named("x".to_string())),
                ("b".to_string(), Pin::Named("y".to_string())),
            ],
        );
        assert!(graph.references_to("nand000000").is_empty());
        assert_eq!(graph.references_to("f_OUTPUT"), vec![("x".to_string(), Pin::Unnamed)]);
    }

    #[test]
    fn rename_to_self_is_a_no_op() {
        let mut graph = Graph::new();
        graph.insert("x", Node::new(Symbol::Input));
        graph.connect("x", "x", Pin::Unnamed);
        assert!(graph.rename("x", "x").is_none());
        assert!(graph.contains("x"));
        assert_eq!(graph.references_to("x").len(), 1);
    }

    #[test]
    fn connect_requires_source() {
        let mut graph = Graph::new();
        graph.insert("o", Node::new(Symbol::Output));
        assert!(!graph.connect("missing", "o", Pin::Unnamed));
        assert!(graph.references_to("o").is_empty());
    }

    #[test]
    fn positional_pins_get_names() {
        let mut graph = Graph::new();
        graph.insert("p", Node::new(Symbol::Input));
        graph.insert("g000003", call("g", 2));
        graph.connect("p", "g000003", Pin::Positional(0));
        graph.connect("p", "g000003", Pin::Positional(1));

        graph.name_pins("g000003", &["a".to_string(), "b".to_string()]);
        assert_eq!(
            graph.references_to("g000003"),
            vec![
                ("p".to_string(), Pin::Named("a".to_string())),
                ("p".to_string(), Pin::Named("b".to_string())),
            ],
        );
        assert_eq!(graph.call_sites_of("g").len(), 1);
    }

    #[test]
    fn placeholders() {
        let mut graph = Graph::new();
        graph.insert("q", Node::undefined(&Ident::new("q"), &[NodeKind::Input, NodeKind::Variable]));
        graph.insert("g", Node::undefined(&Ident::new("g"), &[NodeKind::Definition]));
        assert_eq!(graph.placeholders(NodeKind::Variable), vec!["q".to_string()]);
        assert_eq!(graph.placeholders(NodeKind::Definition), vec!["g".to_string()]);
        assert!(graph.get("q").unwrap().is_value());
        assert!(!graph.get("g").unwrap().is_value());
    }
}

//! The netlist: the serialized form of a checked program.
//!
//! A netlist is a JSON object keyed by definition name. Each entry is a [`Gate`]
//! listing its inputs, its nodes, and the wires leaving each node.
//! A gate can also be drawn as a Graphviz digraph with [`Gate::to_dot`].

use super::check::{CheckedDefinition, CheckedProgram};
use super::graph::Symbol;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Netlist(BTreeMap<String, Gate>);

/// The circuit of one definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gate {
    pub inputs: Vec<String>,
    pub nodes: BTreeMap<String, Node>,
    pub edges: BTreeMap<String, Vec<Edge>>,
}

/// A node within a gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    #[serde(rename = "type")]
    pub type_: Type,
    pub name: String,
}

/// A wire within a gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// name of the driving node
    pub source: String,
    /// (name of node, name of the input on that node)
    pub sink: (String, String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    /// An input of the gate, or one of the constants `0` and `1`.
    Input,
    /// The output of the gate.
    Output,
    /// An internal node. Contains the name of the gate it instantiates,
    /// or, for an alias, the name of the node it aliases.
    Internal(String),
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Input => write!(f, "Input"),
            Type::Output => write!(f, "Output"),
            Type::Internal(tag) => write!(f, "{tag}"),
        }
    }
}

impl Netlist {
    pub fn gate(&self, name: &str) -> Option<&Gate> {
        self.0.get(name)
    }

    pub fn gates(&self) -> impl Iterator<Item = (&String, &Gate)> {
        self.0.iter()
    }

    pub fn insert(&mut self, name: String, gate: Gate) {
        self.0.insert(name, gate);
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(text: &str) -> serde_json::Result<Netlist> {
        serde_json::from_str(text)
    }
}

impl From<&CheckedProgram> for Netlist {
    fn from(program: &CheckedProgram) -> Netlist {
        let mut netlist = Netlist::default();
        for definition in &program.definitions {
            netlist.insert(definition.name().to_string(), Gate::from(definition));
        }
        netlist
    }
}

impl From<&CheckedDefinition> for Gate {
    fn from(definition: &CheckedDefinition) -> Gate {
        let mut nodes = BTreeMap::new();
        let mut edges = BTreeMap::new();

        for (name, node) in definition.graph.nodes() {
            let type_ = match &node.symbol {
                Symbol::Input => Type::Input,
                Symbol::Output => Type::Output,
                Symbol::Call(call_site) => Type::Internal(call_site.callee.to_string()),
                Symbol::Variable { value, .. } => Type::Internal(value.tag()),
                Symbol::Definition { .. } => continue,
                Symbol::Undefined { .. } => continue,
            };
            nodes.insert(name.clone(), Node { type_, name: name.clone() });

            let node_edges = node.references
                .iter()
                .map(|reference| Edge {
                    source: name.clone(),
                    sink: (reference.sink.clone(), reference.pin.to_string()),
                })
                .collect();
            edges.insert(name.clone(), node_edges);
        }

        Gate {
            inputs: definition.inputs.clone(),
            nodes,
            edges,
        }
    }
}

impl Gate {
    /// Every wire arriving at `sink`.
    pub fn edges_into<'a>(&'a self, sink: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.values().flatten().filter(move |edge| edge.sink.0 == sink)
    }

    /// The gate in Graphviz dot syntax.
    /// Nodes are labelled `name : type` and wires with the pin they drive.
    /// Nodes with no wires in or out are left out.
    pub fn to_dot(&self) -> String {
        use petgraph::dot::Dot;
        use petgraph::graph::{DiGraph, NodeIndex};

        let mut graph: DiGraph<String, String> = DiGraph::new();
        let mut indexes: BTreeMap<&str, NodeIndex> = BTreeMap::new();
        for (name, node) in &self.nodes {
            let drives = self.edges.get(name).map_or(false, |edges| !edges.is_empty());
            let driven = self.edges_into(name).next().is_some();
            if drives || driven {
                indexes.insert(name, graph.add_node(format!("{name} : {}", node.type_)));
            }
        }

        for edge in self.edges.values().flatten() {
            let source = indexes.get(edge.source.as_str());
            let sink = indexes.get(edge.sink.0.as_str());
            if let (Some(source), Some(sink)) = (source, sink) {
                graph.add_edge(*source, *sink, edge.sink.1.clone());
            }
        }
        format!("{}", Dot::new(&graph))
    }

    /// Whether an internal node of type `Internal(name)` is an alias of another node of this gate.
    pub fn is_alias(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn json_shape() {
        let text = r#"{
            "not": {
                "inputs": ["a"],
                "nodes": {
                    "a": { "type": "Input", "name": "a" },
                    "nand000000": { "type": { "Internal": "nand" }, "name": "nand000000" },
                    "not_OUTPUT": { "type": "Output", "name": "not_OUTPUT" }
                },
                "edges": {
                    "a": [
                        { "source": "a", "sink": ["nand000000", "x"] },
                        { "source": "a", "sink": ["nand000000", "y"] }
                    ],
                    "nand000000": [
                        { "source": "nand000000", "sink": ["not_OUTPUT", ""] }
                    ],
                    "not_OUTPUT": []
                }
            }
        }"#;
        let netlist = Netlist::from_json(text).unwrap();
        let gate = netlist.gate("not").unwrap();
        assert_eq!(gate.inputs, vec!["a".to_string()]);
        assert_eq!(gate.nodes["nand000000"].type_, Type::Internal("nand".to_string()));
        assert_eq!(gate.edges_into("nand000000").count(), 2);
        assert!(gate.is_alias("a"));
        assert!(!gate.is_alias("nand"));

        let reparsed = Netlist::from_json(&netlist.to_json().unwrap()).unwrap();
        assert_eq!(reparsed, netlist);
    }

    #[test]
    fn dot_drops_unconnected_nodes() {
        let netlist = crate::load_netlist_from_string("not a = nand ( a a )").unwrap();
        let dot = netlist.gate("not").unwrap().to_dot();

        assert!(dot.starts_with("digraph {"), "{dot}");
        assert!(dot.contains("\"a : Input\""), "{dot}");
        assert!(dot.contains("\"nand000000 : nand\""), "{dot}");
        assert!(dot.contains("\"not_OUTPUT : Output\""), "{dot}");
        assert!(dot.contains("\"x\""), "{dot}");
        assert!(dot.contains("\"y\""), "{dot}");
        assert!(!dot.contains("0 : Input"), "{dot}");
        assert!(!dot.contains("1 : Input"), "{dot}");
        assert_eq!(dot.matches("->").count(), 3);
    }
}

//! Truth tables for the gates of a [`Netlist`].
//!
//! A gate is evaluated by pushing values from its inputs and constants along its wires.
//! Internal nodes fire as soon as their known pins decide their output, so feedback loops
//! and floating pins produce undetermined rows instead of failing.

use super::check::{NAND, NAND_PARAMS};
use super::netlist::{Gate, Netlist, Type};

use log::*;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Gates with more inputs than this are not tabulated.
pub const MAX_INPUTS: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TruthTable {
    inputs: Vec<String>,
    /// One row per assignment of the inputs. `None` when the output is undetermined.
    rows: Vec<(Vec<bool>, Option<bool>)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    UnknownGate(String),
    RecursiveGate(String),
    TooManyInputs(String, usize),
}

impl std::fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            AnalysisError::UnknownGate(name) => write!(f, "Gate does not exist: {name}"),
            AnalysisError::RecursiveGate(name) => write!(f, "Gate instantiates itself: {name}"),
            AnalysisError::TooManyInputs(name, n) => {
                write!(f, "Gate {name} has {n} inputs, which is more than {MAX_INPUTS}")
            },
        }
    }
}

impl std::error::Error for AnalysisError {}

impl TruthTable {
    pub fn nand() -> TruthTable {
        let mut rows = vec![];
        for (x, y) in [(false, false), (false, true), (true, false), (true, true)] {
            rows.push((vec![x, y], Some(!(x && y))));
        }
        TruthTable {
            inputs: NAND_PARAMS.iter().map(|param| param.to_string()).collect(),
            rows,
        }
    }

    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    pub fn rows(&self) -> &[(Vec<bool>, Option<bool>)] {
        &self.rows
    }

    /// The output for a full assignment of the inputs, in input order.
    pub fn output(&self, inputs: &[bool]) -> Option<bool> {
        self.rows
            .iter()
            .find(|(row, _output)| row.as_slice() == inputs)
            .and_then(|(_row, output)| *output)
    }

    /// The output when only the pins in `pins` are known.
    /// Defined only when every row agreeing with `pins` has the same, defined, output.
    fn output_given(&self, pins: &BTreeMap<String, bool>) -> Option<bool> {
        let mut result = None;
        for (row, output) in &self.rows {
            let consistent = self.inputs
                .iter()
                .zip(row)
                .all(|(name, value)| pins.get(name).map_or(true, |pin| pin == value));
            if !consistent {
                continue;
            }

            let output = (*output)?;
            match result {
                None => result = Some(output),
                Some(previous) if previous != output => return None,
                Some(_previous) => (),
            }
        }
        result
    }
}

impl std::fmt::Display for TruthTable {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for input in &self.inputs {
            write!(f, "{input} ")?;
        }
        writeln!(f, "| out")?;

        for (row, output) in &self.rows {
            for (input, value) in self.inputs.iter().zip(row) {
                write!(f, "{:<width$} ", *value as u8, width = input.len())?;
            }
            match output {
                Some(value) => writeln!(f, "| {}", *value as u8)?,
                None => writeln!(f, "| X")?,
            }
        }
        Ok(())
    }
}

/// The truth table of the gate named `gate_name`.
///
/// The tables of the gates it instantiates are computed first.
pub fn truth_table(netlist: &Netlist, gate_name: &str) -> Result<TruthTable, AnalysisError> {
    let mut tables = truth_tables_for(netlist, &[gate_name])?;
    tables.remove(gate_name).ok_or_else(|| AnalysisError::UnknownGate(gate_name.to_string()))
}

/// The truth table of every gate in `netlist`.
pub fn truth_tables(netlist: &Netlist) -> Result<BTreeMap<String, TruthTable>, AnalysisError> {
    let names: Vec<&str> = netlist.gates().map(|(name, _gate)| name.as_str()).collect();
    let mut tables = truth_tables_for(netlist, &names)?;
    if netlist.gate(NAND).is_none() {
        tables.remove(NAND);
    }
    Ok(tables)
}

fn truth_tables_for(netlist: &Netlist, roots: &[&str]) -> Result<BTreeMap<String, TruthTable>, AnalysisError> {
    let mut tables = BTreeMap::new();
    tables.insert(NAND.to_string(), TruthTable::nand());

    for name in dependency_order(netlist, roots)? {
        let gate = netlist.gate(&name).ok_or_else(|| AnalysisError::UnknownGate(name.clone()))?;
        let table = tabulate(&name, gate, &tables)?;
        info!("Tabulated {name}: {} rows", table.rows.len());
        tables.insert(name, table);
    }
    Ok(tables)
}

/// The gates reachable from `roots`, each after every gate it instantiates.
fn dependency_order(netlist: &Netlist, roots: &[&str]) -> Result<Vec<String>, AnalysisError> {
    use petgraph::algo::toposort;
    use petgraph::graph::{DiGraph, NodeIndex};

    let mut graph: DiGraph<String, ()> = DiGraph::new();
    let mut indexes: BTreeMap<String, NodeIndex> = BTreeMap::new();
    let mut index_of = |graph: &mut DiGraph<String, ()>, name: &str| -> NodeIndex {
        *indexes.entry(name.to_string()).or_insert_with(|| graph.add_node(name.to_string()))
    };

    let mut visited = BTreeSet::new();
    let mut pending: Vec<String> = roots
        .iter()
        .filter(|root| **root != NAND)
        .map(|root| root.to_string())
        .collect();

    while let Some(name) = pending.pop() {
        if !visited.insert(name.clone()) {
            continue;
        }
        let gate = netlist.gate(&name).ok_or_else(|| AnalysisError::UnknownGate(name.clone()))?;
        let node = index_of(&mut graph, &name);
        for callee in callees(gate) {
            if callee == NAND {
                continue;
            }
            let dependency = index_of(&mut graph, &callee);
            graph.add_edge(node, dependency, ());
            pending.push(callee);
        }
    }

    let mut sorted = match toposort(&graph, None) {
        Ok(sorted) => sorted,
        Err(cycle) => return Err(AnalysisError::RecursiveGate(graph[cycle.node_id()].clone())),
    };
    sorted.reverse();
    Ok(sorted.into_iter().map(|node| graph[node].clone()).collect())
}

/// The names of the gates instantiated inside `gate`.
fn callees(gate: &Gate) -> BTreeSet<String> {
    let mut results = BTreeSet::new();
    for node in gate.nodes.values() {
        if let Type::Internal(tag) = &node.type_ {
            if !gate.is_alias(tag) {
                results.insert(tag.clone());
            }
        }
    }
    results
}

fn tabulate(name: &str, gate: &Gate, tables: &BTreeMap<String, TruthTable>) -> Result<TruthTable, AnalysisError> {
    let n = gate.inputs.len();
    if n > MAX_INPUTS {
        return Err(AnalysisError::TooManyInputs(name.to_string(), n));
    }

    let mut rows = vec![];
    for row in 0..(1usize << n) {
        // the first input is the most significant bit
        let assignment: Vec<bool> = (0..n).map(|bit| row & (1 << (n - 1 - bit)) != 0).collect();
        let output = simulate(gate, &assignment, tables)?;
        rows.push((assignment, output));
    }

    Ok(TruthTable {
        inputs: gate.inputs.clone(),
        rows,
    })
}

/// The value reaching the output of `gate` when its inputs are set to `assignment`.
fn simulate(gate: &Gate, assignment: &[bool], tables: &BTreeMap<String, TruthTable>) -> Result<Option<bool>, AnalysisError> {
    let edge_count: usize = gate.edges.values().map(|edges| edges.len()).sum();
    let step_limit = 64 + 8 * (gate.nodes.len() + edge_count);

    let mut values: BTreeMap<&str, bool> = BTreeMap::new();
    let mut pins: BTreeMap<&str, BTreeMap<String, bool>> = BTreeMap::new();
    let mut queue: VecDeque<(&str, bool)> = VecDeque::new();
    for (input, value) in gate.inputs.iter().zip(assignment) {
        queue.push_back((input.as_str(), *value));
    }
    queue.push_back(("0", false));
    queue.push_back(("1", true));

    let mut output = None;
    let mut steps = 0;
    while let Some((source, value)) = queue.pop_front() {
        steps += 1;
        if steps > step_limit {
            debug!("Gate does not settle on {assignment:?}");
            return Ok(None);
        }

        let edges = match gate.edges.get(source) {
            Some(edges) => edges,
            None => continue,
        };

        for edge in edges {
            let (sink, pin) = (edge.sink.0.as_str(), &edge.sink.1);
            let sink_pins = pins.entry(sink).or_default();
            sink_pins.insert(pin.clone(), value);

            let computed = match gate.nodes.get(sink).map(|node| &node.type_) {
                None => continue,
                Some(Type::Input) => continue,
                Some(Type::Output) => {
                    output = Some(value);
                    continue;
                },
                Some(Type::Internal(tag)) if gate.is_alias(tag) => Some(value),
                Some(Type::Internal(tag)) => {
                    let table = tables.get(tag).ok_or_else(|| AnalysisError::UnknownGate(tag.clone()))?;
                    table.output_given(sink_pins)
                },
            };

            if let Some(computed) = computed {
                if values.insert(sink, computed) != Some(computed) {
                    queue.push_back((sink, computed));
                }
            }
        }
    }
    Ok(output)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::load_netlist_from_string;

    fn bits(s: &str) -> Vec<bool> {
        s.chars().map(|ch| ch == '1').collect()
    }

    #[test]
    fn nand() {
        let table = TruthTable::nand();
        assert_eq!(table.output(&bits("00")), Some(true));
        assert_eq!(table.output(&bits("01")), Some(true));
        assert_eq!(table.output(&bits("10")), Some(true));
        assert_eq!(table.output(&bits("11")), Some(false));
    }

    #[test]
    fn and_or_xor() {
        let netlist = load_netlist_from_string("
            not a = nand ( a a )
            and p q = let n = nand ( p q ) in not ( n )
            or p q = nand ( not ( p ) not ( q ) )
            xor p q = and ( or ( p q ) nand ( p q ) )
        ").unwrap();

        let and = truth_table(&netlist, "and").unwrap();
        let or = truth_table(&netlist, "or").unwrap();
        let xor = truth_table(&netlist, "xor").unwrap();
        for (row, a, o, x) in [("00", false, false, false), ("01", false, true, true), ("10", false, true, true), ("11", true, true, false)] {
            assert_eq!(and.output(&bits(row)), Some(a), "and {row}");
            assert_eq!(or.output(&bits(row)), Some(o), "or {row}");
            assert_eq!(xor.output(&bits(row)), Some(x), "xor {row}");
        }
    }

    #[test]
    fn floating_pin() {
        let netlist = load_netlist_from_string("half a = nand ( a )").unwrap();
        let table = truth_table(&netlist, "half").unwrap();
        assert_eq!(table.output(&bits("0")), Some(true));
        assert_eq!(table.output(&bits("1")), None);
    }

    #[test]
    fn constants_and_aliases() {
        let netlist = load_netlist_from_string("
            high = let h = 1 in h
            pass a = let b = a in b
        ").unwrap();
        assert_eq!(truth_table(&netlist, "high").unwrap().output(&[]), Some(true));
        let pass = truth_table(&netlist, "pass").unwrap();
        assert_eq!(pass.output(&bits("0")), Some(false));
        assert_eq!(pass.output(&bits("1")), Some(true));
    }

    #[test]
    fn latch_holds() {
        let netlist = load_netlist_from_string("
            latch s r = let q = nand ( s qn ) in let qn = nand ( r q ) in q
        ").unwrap();
        let table = truth_table(&netlist, "latch").unwrap();
        assert_eq!(table.output(&bits("01")), Some(true));
        assert_eq!(table.output(&bits("10")), Some(false));
        assert_eq!(table.output(&bits("00")), Some(true));
        assert_eq!(table.output(&bits("11")), None);
    }

    #[test]
    fn recursive_gate() {
        let netlist = load_netlist_from_string("loop a = loop ( a )").unwrap();
        assert_eq!(truth_table(&netlist, "loop"), Err(AnalysisError::RecursiveGate("loop".to_string())));
    }

    #[test]
    fn unknown_gate() {
        let netlist = load_netlist_from_string("not a = nand ( a a )").unwrap();
        assert_eq!(truth_table(&netlist, "and"), Err(AnalysisError::UnknownGate("and".to_string())));
        assert_eq!(truth_table(&netlist, "nand"), Ok(TruthTable::nand()));
    }

    #[test]
    fn display() {
        let netlist = load_netlist_from_string("not a = nand ( a a )").unwrap();
        let tables = truth_tables(&netlist).unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables["not"].to_string(), "a | out\n0 | 1\n1 | 0\n");
    }
}

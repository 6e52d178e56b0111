/*!
The positive dependency graph of a set of definitions.

Nodes are defined atoms; edges follow *positive* body occurrences only — a rule `h ← a ∧ ¬b`
contributes the edge `h → a` (when `a` is itself defined) and nothing for `b`, as well-founded
negation is external to a definition.
A definitional aggregate contributes edges from its head to the atoms of the positive literals of
its set.

The graph is partitioned into strongly connected components
([tarjan_scc](petgraph::algo::tarjan_scc)); only atoms in a non-trivial component — a component
of more than one atom, or an atom depending positively on itself — require unfounded set
reasoning, everything else is settled by completion.
*/

use std::collections::{HashMap, HashSet};

use petgraph::graph::{DiGraph, NodeIndex};

use crate::structures::atom::Atom;

/// The positive dependency graph, under construction and after partitioning.
#[derive(Default)]
pub struct DependencyGraph {
    graph: DiGraph<Atom, ()>,
    nodes: HashMap<Atom, NodeIndex>,
    self_loops: HashSet<Atom>,
}

impl DependencyGraph {
    /// Ensures a node for the atom.
    pub fn note_atom(&mut self, atom: Atom) {
        if !self.nodes.contains_key(&atom) {
            let index = self.graph.add_node(atom);
            self.nodes.insert(atom, index);
        }
    }

    /// Notes `from` depends positively on `to` — both must have been noted.
    pub fn note_edge(&mut self, from: Atom, to: Atom) {
        if from == to {
            self.self_loops.insert(from);
        }
        let from = self.nodes[&from];
        let to = self.nodes[&to];
        self.graph.add_edge(from, to, ());
    }

    /// Partitions the graph, returning the component of each atom and the set of atoms in
    /// non-trivial components.
    pub fn partition(&self) -> (HashMap<Atom, usize>, HashSet<Atom>) {
        let mut components: HashMap<Atom, usize> = HashMap::new();
        let mut cyclic: HashSet<Atom> = HashSet::new();

        for (id, component) in petgraph::algo::tarjan_scc(&self.graph).iter().enumerate() {
            for node in component {
                let atom = self.graph[*node];
                components.insert(atom, id);
                if component.len() > 1 || self.self_loops.contains(&atom) {
                    cyclic.insert(atom);
                }
            }
        }

        (components, cyclic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_cycle() {
        let mut graph = DependencyGraph::default();
        for atom in [1, 2, 3] {
            graph.note_atom(atom);
        }
        graph.note_edge(1, 2);
        graph.note_edge(2, 1);
        graph.note_edge(3, 1);

        let (components, cyclic) = graph.partition();
        assert_eq!(components[&1], components[&2]);
        assert_ne!(components[&1], components[&3]);
        assert!(cyclic.contains(&1));
        assert!(cyclic.contains(&2));
        assert!(!cyclic.contains(&3));
    }

    #[test]
    fn self_loop_is_cyclic() {
        let mut graph = DependencyGraph::default();
        graph.note_atom(7);
        graph.note_edge(7, 7);

        let (_, cyclic) = graph.partition();
        assert!(cyclic.contains(&7));
    }
}

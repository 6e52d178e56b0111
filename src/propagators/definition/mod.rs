/*!
The definition propagator.

Inductive definitions are Horn-like rules `head ← body`, with a positive atom as head and a
conjunction of literals as body — a disjunctive body is split into one rule per disjunct at
addition, and a definitional aggregate may define its head in place of rules.

# Completion

At finalization the *completion* of the definitions is emitted as clauses: a representative
literal stands for each body (multi-literal bodies are given a fresh atom), the head implies the
disjunction of its representatives, and each representative implies the head.
Every boolean consequence of a definition thereafter flows through ordinary clause propagation —
what remains for the propagator is the part completion cannot express: ruling out
*self-supporting* cycles.

# Sources and unfounded sets

Atoms in a non-trivial strongly connected component of the
[positive dependency graph](graph) carry a *source*: a rule whose body does not conflict with the
valuation and whose positive in-component body atoms are themselves sourced.
When an assignment falsifies the body of a rule acting as a source, its head becomes a *cycle
source*, and at the end of each propagation round an [unfounded set search](unfounded) runs from
the cycle sources.
A non-empty unfounded set is dealt with by asserting loop formulas — one clause per unfounded
atom, over the external supports of the set — falsifying the set or raising a conflict.

A state machine per defined atom, in effect: unknown → supported (a source is held) → justified
(the source survives the final model check) or unfounded.
*/

pub mod graph;
pub mod unfounded;

use std::collections::{HashMap, HashSet};

use crate::{
    context::GenericContext,
    db::ClauseKey,
    misc::log::targets::{self},
    structures::{atom::Atom, clause::ClauseSource, literal::CLiteral},
    types::err::{self, ErrorKind},
};

use graph::DependencyGraph;

/// A (conjunctive) rule of a definition.
pub struct Rule {
    /// The defined atom.
    pub head: Atom,

    /// The literals of the body.
    pub body: Vec<CLiteral>,

    /// The literal standing for the body in completion and loop formulas.
    ///
    /// The body literal itself for a singleton body, a fresh atom for longer bodies, and absent
    /// for an empty body (the head is a fact).
    pub repr: Option<CLiteral>,
}

/// How an atom is defined.
pub enum DefHead {
    /// By the given rules — an empty list leaves the atom false by completion.
    Rules(Vec<usize>),

    /// By a definitional aggregate.
    Aggregate {
        /// The set of the aggregate.
        set: usize,

        /// The aggregate within the set.
        agg: usize,
    },
}

/// The current source of support for a defined atom in a non-trivial component.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Source {
    /// The rule at the given index.
    Rule(usize),

    /// The definitional aggregate of the atom.
    Aggregate,

    /// No source is held.
    None,
}

/// The definition propagator.
#[derive(Default)]
pub struct Definitions {
    /// Every rule added, in order of addition.
    pub rules: Vec<Rule>,

    /// The definition of each defined atom.
    pub heads: HashMap<Atom, DefHead>,

    /// Rules to revisit when a literal becomes true, indexed by literal — registration is under
    /// the negation of each body literal of each rule with a cyclic head.
    body_watch: HashMap<usize, Vec<usize>>,

    /// Aggregate-defined heads to revisit when a literal becomes true.
    agg_watch: HashMap<usize, Vec<Atom>>,

    /// The component of each defined atom.
    pub components: HashMap<Atom, usize>,

    /// Atoms in non-trivial components.
    cyclic: HashSet<Atom>,

    /// The source of each cyclic atom.
    sources: HashMap<Atom, Source>,

    /// Cyclic heads depending positively on an atom, within its component.
    dependents: HashMap<Atom, Vec<Atom>>,

    /// Atoms whose source was weakened, awaiting the next unfounded set search.
    cycle_sources: Vec<Atom>,

    /// Membership of `cycle_sources`.
    cycle_flags: HashSet<Atom>,

    /// The index of the first trail assignment not yet observed.
    trail_cursor: usize,

    /// Rules below this index have their completion emitted.
    completed_rules: usize,

    /// Heads whose completion is emitted.
    completed_heads: HashSet<Atom>,

    /// True once the theory is frozen.
    finalized: bool,
}

impl Definitions {
    /// True if the atom is defined, by rules or by an aggregate.
    pub fn defines(&self, atom: Atom) -> bool {
        self.heads.contains_key(&atom)
    }

    /// True if the atom requires unfounded set reasoning.
    pub fn cyclic(&self, atom: Atom) -> bool {
        self.cyclic.contains(&atom)
    }

    /// An iterator over the atoms requiring unfounded set reasoning.
    pub(crate) fn cyclic_atoms(&self) -> impl Iterator<Item = Atom> + '_ {
        self.cyclic.iter().copied()
    }

    /// True if some atom is defined by an aggregate.
    pub(crate) fn has_aggregate_definitions(&self) -> bool {
        self.heads
            .values()
            .any(|head| matches!(head, DefHead::Aggregate { .. }))
    }

    /// Records a rule — parse phase only.
    ///
    /// A disjunctive body is split into one rule per disjunct, so every stored rule is
    /// conjunctive.
    pub fn add_rule(
        &mut self,
        head: Atom,
        body: Vec<CLiteral>,
        conjunctive: bool,
    ) -> Result<(), ErrorKind> {
        if matches!(self.heads.get(&head), Some(DefHead::Aggregate { .. })) {
            return Err(err::ParseError::MultipleDefinitions(head).into());
        }

        // Extending a frozen definition would invalidate its completion.
        if self.finalized && self.heads.contains_key(&head) {
            return Err(err::StateError::NotYetImplemented.into());
        }

        let entry = match self.heads.entry(head).or_insert_with(|| DefHead::Rules(Vec::default()))
        {
            DefHead::Rules(rules) => rules,
            DefHead::Aggregate { .. } => unreachable!("checked above"),
        };

        match conjunctive {
            true => {
                entry.push(self.rules.len());
                self.rules.push(Rule {
                    head,
                    body,
                    repr: None,
                });
            }
            false => {
                for literal in body {
                    entry.push(self.rules.len());
                    self.rules.push(Rule {
                        head,
                        body: vec![literal],
                        repr: None,
                    });
                }
            }
        }

        Ok(())
    }

    /// Records an atom as defined by an aggregate — parse phase only.
    pub fn note_aggregate_head(
        &mut self,
        atom: Atom,
        set: usize,
        agg: usize,
    ) -> Result<(), ErrorKind> {
        match self.heads.get(&atom) {
            Some(_) => Err(err::ParseError::MultipleDefinitions(atom).into()),
            None => {
                self.heads.insert(atom, DefHead::Aggregate { set, agg });
                Ok(())
            }
        }
    }

    /// Freezes the theory: the dependency graph is built and partitioned, completion clauses
    /// emitted, watches registered, and initial sources computed — with the greatest unfounded
    /// set of the root level falsified outright.
    ///
    /// Re-runnable — completion is emitted only for rules and heads added since the last pass,
    /// while the graph, watches, and sources are rebuilt, so lazy grounding may extend the
    /// theory at the root mid-search with definitions of fresh atoms.
    pub(crate) fn finalize<R: rand::Rng + std::default::Default>(
        &mut self,
        ctx: &mut GenericContext<R>,
    ) -> Result<(), ErrorKind> {
        // The graph and its partition.
        let mut dependency_graph = DependencyGraph::default();
        for &atom in self.heads.keys() {
            dependency_graph.note_atom(atom);
        }
        for rule in &self.rules {
            for literal in &rule.body {
                if literal.polarity() && self.heads.contains_key(&literal.atom()) {
                    dependency_graph.note_edge(rule.head, literal.atom());
                }
            }
        }
        for (&atom, head) in &self.heads {
            if let DefHead::Aggregate { set, .. } = head {
                let dependencies: Vec<Atom> = ctx
                    .aggregates
                    .positive_set_atoms(*set)
                    .filter(|dependency| self.heads.contains_key(dependency))
                    .collect();
                for dependency in dependencies {
                    dependency_graph.note_edge(atom, dependency);
                }
            }
        }

        let (components, cyclic) = dependency_graph.partition();
        self.components = components;
        self.cyclic = cyclic;
        log::info!(target: targets::FINALIZE, "{} defined atoms, {} cyclic.", self.heads.len(), self.cyclic.len());

        // Recursion through an aggregate is restricted to monotone shapes.
        for (atom, head) in &self.heads {
            if let DefHead::Aggregate { set, agg } = head {
                if self.cyclic.contains(atom) && !ctx.aggregates.monotone_recursive(*set, *agg) {
                    return Err(err::ParseError::UnsupportedRecursiveAggregate(*atom).into());
                }
            }
        }

        // Body representatives: fresh atoms for multi-literal bodies.
        for ri in self.completed_rules..self.rules.len() {
            self.rules[ri].repr = match self.rules[ri].body.len() {
                0 => None,
                1 => Some(self.rules[ri].body[0]),
                _ => {
                    let body = self.rules[ri].body.clone();
                    let tseitin = CLiteral::new(ctx.fresh_atom()?, true);

                    let mut reverse: Vec<CLiteral> =
                        body.iter().map(|literal| literal.negate()).collect();
                    reverse.push(tseitin);

                    for literal in body {
                        ctx.add_clause_internal(
                            vec![tseitin.negate(), literal],
                            ClauseSource::Completion,
                        )?;
                    }
                    ctx.add_clause_internal(reverse, ClauseSource::Completion)?;

                    Some(tseitin)
                }
            };
        }

        // Completion of each rule-defined head not yet completed.
        let head_atoms: Vec<Atom> = self.heads.keys().copied().collect();
        for atom in head_atoms {
            if !self.completed_heads.insert(atom) {
                continue;
            }
            let DefHead::Rules(rule_indices) = &self.heads[&atom] else {
                continue;
            };
            let rule_indices = rule_indices.clone();
            let head_literal = CLiteral::new(atom, true);

            let mut fact = false;
            let mut support_clause = vec![head_literal.negate()];

            for ri in &rule_indices {
                match self.rules[*ri].repr {
                    None => fact = true,
                    Some(repr) => {
                        support_clause.push(repr);
                        ctx.add_clause_internal(
                            vec![head_literal, repr.negate()],
                            ClauseSource::Completion,
                        )?;
                    }
                }
            }

            match fact {
                true => ctx.add_clause_internal(vec![head_literal], ClauseSource::Completion)?,
                false => ctx.add_clause_internal(support_clause, ClauseSource::Completion)?,
            };
        }

        // Watches and reverse dependencies, for cyclic heads only — rebuilt wholesale, as a
        // fresh definition may draw an old atom into a cycle.
        self.body_watch.clear();
        self.agg_watch.clear();
        self.dependents.clear();

        for (ri, rule) in self.rules.iter().enumerate() {
            if !self.cyclic.contains(&rule.head) {
                continue;
            }
            for literal in &rule.body {
                self.body_watch
                    .entry(literal.negate().index())
                    .or_default()
                    .push(ri);
                if literal.polarity()
                    && self.cyclic.contains(&literal.atom())
                    && self.components.get(&literal.atom()) == self.components.get(&rule.head)
                {
                    self.dependents
                        .entry(literal.atom())
                        .or_default()
                        .push(rule.head);
                }
            }
        }
        let aggregate_heads: Vec<(Atom, usize)> = self
            .heads
            .iter()
            .filter_map(|(&atom, head)| match head {
                DefHead::Aggregate { set, .. } if self.cyclic.contains(&atom) => {
                    Some((atom, *set))
                }
                _ => None,
            })
            .collect();
        for (atom, set) in aggregate_heads {
            let literals: Vec<CLiteral> = ctx.aggregates.set_literals(set).collect();
            for literal in literals {
                self.agg_watch
                    .entry(literal.negate().index())
                    .or_default()
                    .push(atom);
                if literal.polarity()
                    && self.cyclic.contains(&literal.atom())
                    && self.components.get(&literal.atom()) == self.components.get(&atom)
                {
                    self.dependents.entry(literal.atom()).or_default().push(atom);
                }
            }
        }

        // Initial sources, with the greatest unfounded set of the root falsified.
        let mut blocked: HashSet<Atom> = self.cyclic.iter().copied().collect();
        for &atom in &self.cyclic {
            self.sources.insert(atom, Source::None);
        }
        self.resource_fixpoint(&mut blocked, ctx)?;

        if !blocked.is_empty() {
            log::info!(target: targets::UNFOUNDED, "Root unfounded set of {} atoms.", blocked.len());
            ctx.counters.unfounded_sets += 1;
            for atom in blocked {
                ctx.add_clause_internal(
                    vec![CLiteral::new(atom, false)],
                    ClauseSource::LoopFormula,
                )?;
            }
        }

        self.completed_rules = self.rules.len();
        self.finalized = true;
        Ok(())
    }

    /// True once the theory is frozen.
    pub(crate) fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Attempts a source for the atom: a rule with a non-conflicting body whose positive
    /// in-component atoms avoid `blocked`, or a justifiable definitional aggregate.
    pub(crate) fn find_source<R: rand::Rng + std::default::Default>(
        &self,
        atom: Atom,
        blocked: &HashSet<Atom>,
        ctx: &GenericContext<R>,
    ) -> Result<Source, ErrorKind> {
        match &self.heads[&atom] {
            DefHead::Rules(rule_indices) => {
                'rules: for &ri in rule_indices {
                    let rule = &self.rules[ri];
                    for literal in &rule.body {
                        if ctx.atom_db.is_false(*literal) {
                            continue 'rules;
                        }
                        if literal.polarity() && self.blocks(atom, literal.atom(), blocked) {
                            continue 'rules;
                        }
                    }
                    return Ok(Source::Rule(ri));
                }
                Ok(Source::None)
            }

            DefHead::Aggregate { set, agg } => {
                let permitted = |dependency: Atom| !self.blocks(atom, dependency, blocked);
                match ctx
                    .aggregates
                    .can_justify_head(*set, *agg, &ctx.atom_db, &permitted)?
                {
                    true => Ok(Source::Aggregate),
                    false => Ok(Source::None),
                }
            }
        }
    }

    /// True if support for `head` through `dependency` circles inside the component.
    fn blocks(&self, head: Atom, dependency: Atom, blocked: &HashSet<Atom>) -> bool {
        self.cyclic.contains(&dependency)
            && self.components.get(&dependency) == self.components.get(&head)
            && blocked.contains(&dependency)
    }

    /// Sources every atom of `blocked` which can be sourced, removing it from the set — the
    /// remainder is unfounded.
    pub(crate) fn resource_fixpoint<R: rand::Rng + std::default::Default>(
        &mut self,
        blocked: &mut HashSet<Atom>,
        ctx: &GenericContext<R>,
    ) -> Result<(), ErrorKind> {
        loop {
            let mut sourced: Vec<(Atom, Source)> = Vec::new();
            for &atom in blocked.iter() {
                match self.find_source(atom, blocked, ctx)? {
                    Source::None => {}
                    source => sourced.push((atom, source)),
                }
            }
            if sourced.is_empty() {
                return Ok(());
            }
            for (atom, source) in sourced {
                self.sources.insert(atom, source);
                blocked.remove(&atom);
            }
        }
    }

    /// Propagates the definitions given the assignments the propagator has yet to observe:
    /// broken sources are collected, and an unfounded set search run if any remain broken.
    pub(crate) fn propagate_at_end_of_queue<R: rand::Rng + std::default::Default>(
        &mut self,
        ctx: &mut GenericContext<R>,
    ) -> Result<Option<ClauseKey>, ErrorKind> {
        if !self.finalized {
            return Ok(None);
        }

        while self.trail_cursor < ctx.trail.assignments.len() {
            let literal = ctx.trail.assignments[self.trail_cursor];
            self.trail_cursor += 1;

            let mut weakened: Vec<Atom> = Vec::new();

            if let Some(rules) = self.body_watch.get(&literal.index()) {
                for &ri in rules {
                    let head = self.rules[ri].head;
                    if self.sources.get(&head) == Some(&Source::Rule(ri)) {
                        weakened.push(head);
                    }
                }
            }
            if let Some(heads) = self.agg_watch.get(&literal.index()) {
                for &head in heads {
                    if self.sources.get(&head) == Some(&Source::Aggregate) {
                        weakened.push(head);
                    }
                }
            }

            for atom in weakened {
                self.queue_cycle_source(atom);
            }
        }

        if self.cycle_sources.is_empty() {
            return Ok(None);
        }

        unfounded::process(self, ctx)
    }

    /// Queues an atom for the next unfounded set search.
    pub(crate) fn queue_cycle_source(&mut self, atom: Atom) {
        if self.cycle_flags.insert(atom) {
            log::trace!(target: targets::DEFINITION, "Cycle source {atom}.");
            self.cycle_sources.push(atom);
        }
    }

    /// Takes the queued cycle sources.
    pub(crate) fn take_cycle_sources(&mut self) -> Vec<Atom> {
        self.cycle_flags.clear();
        std::mem::take(&mut self.cycle_sources)
    }

    /// The source of the atom, if tracked.
    pub(crate) fn source_of(&self, atom: Atom) -> Source {
        self.sources.get(&atom).copied().unwrap_or(Source::None)
    }

    /// Revises the source of the atom.
    pub(crate) fn set_source(&mut self, atom: Atom, source: Source) {
        self.sources.insert(atom, source);
    }

    /// The cyclic heads depending positively on the atom, within its component.
    pub(crate) fn dependents_of(&self, atom: Atom) -> &[Atom] {
        match self.dependents.get(&atom) {
            Some(dependents) => dependents,
            None => &[],
        }
    }

    /// Restores the propagator to the remaining trail.
    ///
    /// Sources are left in place: a source does not become invalid by unassignment, and pending
    /// cycle sources are rechecked against the valuation before any search.
    pub(crate) fn backtrack(&mut self, trail_length: usize) {
        self.trail_cursor = std::cmp::min(self.trail_cursor, trail_length);
    }
}

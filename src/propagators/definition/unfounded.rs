/*!
Unfounded set search, and the loop formulas which answer one.

# The search

An *unfounded set* is a set `U` of atoms such that every rule of every atom of `U` either has a
body literal conflicting with the valuation or a positive body atom inside `U` — no support
enters from outside, so making any of `U` true could only be self-justifying.

The search runs from the *cycle sources* — atoms whose source was weakened since the last round:
1. The source of the start atom is invalidated, and the invalidation cascades along reverse
   positive dependencies within the component.
2. Every invalidated atom is re-sourced if possible, permitting support from outside the
   invalidated set, to a fixpoint.
3. What remains is unfounded.

The strategy option orders the work: [Bfs](crate::config::UnfoundedStrategy::Bfs) takes cycle
sources in the order support was lost, while
[Adaptive](crate::config::UnfoundedStrategy::Adaptive) takes the most recent first, grouped by
component, favouring the region of the graph the search last touched.

# Loop formulas

For a non-empty unfounded set `U` the *external supports* are gathered: the body representatives
of every rule of an atom of `U` whose positive body atoms all lie outside `U`, together with the
currently false positive set literals of any definitional aggregate in `U`.
Each atom of `U` then yields a learned clause — its negation, or one of the external supports —
which is false for the atom and true supports on the current valuation, and so either falsifies
the atom or raises a conflict.
*/

use std::collections::HashSet;

use crate::{
    config::UnfoundedStrategy,
    context::GenericContext,
    db::ClauseKey,
    misc::log::targets::{self},
    procedures::addition::SearchAddition,
    structures::{
        atom::Atom,
        clause::{CClause, ClauseSource},
        consequence::AssignmentSource,
        literal::CLiteral,
    },
    types::err::{self, ErrorKind},
};

use super::{DefHead, Definitions, Source};

/// Processes the queued cycle sources, searching for unfounded sets and asserting loop formulas
/// for any found.
pub(crate) fn process<R: rand::Rng + std::default::Default>(
    definitions: &mut Definitions,
    ctx: &mut GenericContext<R>,
) -> Result<Option<ClauseKey>, ErrorKind> {
    let mut queue = definitions.take_cycle_sources();

    match ctx.config.ufs_strategy {
        UnfoundedStrategy::Bfs => {}
        UnfoundedStrategy::Adaptive => {
            queue.reverse();
            queue.sort_by_key(|atom| definitions.components.get(atom).copied());
        }
    }

    for (position, &start) in queue.iter().enumerate() {
        if ctx.atom_db.value_of(start) == Some(false) || !definitions.cyclic(start) {
            continue;
        }

        // A source may have been weakened and recovered, or replaced, since queuing.
        if source_intact(definitions, start, ctx)? {
            continue;
        }

        let mut blocked = invalidate_from(definitions, start);
        definitions.resource_fixpoint(&mut blocked, ctx)?;

        let unfounded: Vec<Atom> = blocked
            .iter()
            .copied()
            .filter(|atom| ctx.atom_db.value_of(*atom) != Some(false))
            .collect();
        if unfounded.is_empty() {
            continue;
        }

        ctx.counters.unfounded_sets += 1;
        log::info!(target: targets::UNFOUNDED, "Unfounded set of {} atoms from {start}.", unfounded.len());

        if let Some(key) = assert_loop_formulas(definitions, &blocked, &unfounded, ctx)? {
            // The conflict interrupts the pass — whatever was not examined stays queued.
            for &pending in &queue[position + 1..] {
                definitions.queue_cycle_source(pending);
            }
            return Ok(Some(key));
        }
    }

    Ok(None)
}

/// True if the source the atom holds survives the current valuation.
fn source_intact<R: rand::Rng + std::default::Default>(
    definitions: &Definitions,
    atom: Atom,
    ctx: &GenericContext<R>,
) -> Result<bool, ErrorKind> {
    match definitions.source_of(atom) {
        Source::None => Ok(false),

        Source::Rule(ri) => Ok(definitions.rules[ri]
            .body
            .iter()
            .all(|literal| !ctx.atom_db.is_false(*literal))),

        Source::Aggregate => {
            // The aggregate check folds over permitted literals, and a vanished source of a
            // positive dependency surfaces through the dependency's own cycle source.
            let no_block = HashSet::default();
            match definitions.find_source(atom, &no_block, ctx)? {
                Source::None => Ok(false),
                _ => Ok(true),
            }
        }
    }
}

/// Invalidates the source of `start` and cascades along reverse positive dependencies,
/// returning the invalidated set.
fn invalidate_from(definitions: &mut Definitions, start: Atom) -> HashSet<Atom> {
    let mut blocked: HashSet<Atom> = HashSet::default();
    let mut stack = vec![start];

    while let Some(atom) = stack.pop() {
        if !blocked.insert(atom) {
            continue;
        }
        definitions.set_source(atom, Source::None);

        for &dependent in definitions.dependents_of(atom) {
            if blocked.contains(&dependent) {
                continue;
            }
            let through_atom = match definitions.source_of(dependent) {
                Source::None => true,

                // Precise for rules: only a source whose body holds the atom positively falls.
                Source::Rule(ri) => definitions.rules[ri]
                    .body
                    .iter()
                    .any(|literal| literal.polarity() && literal.atom() == atom),

                // Conservative for aggregates — re-sourcing restores any overreach.
                Source::Aggregate => true,
            };
            if through_atom {
                stack.push(dependent);
            }
        }
    }

    blocked
}

/// Asserts a loop formula for each unfounded atom: the negation of the atom, or one of the
/// external supports of the unfounded set.
fn assert_loop_formulas<R: rand::Rng + std::default::Default>(
    definitions: &Definitions,
    blocked: &HashSet<Atom>,
    unfounded: &[Atom],
    ctx: &mut GenericContext<R>,
) -> Result<Option<ClauseKey>, ErrorKind> {
    let supports = external_supports(definitions, blocked, ctx);

    for &atom in unfounded {
        let mut clause: CClause = vec![CLiteral::new(atom, false)];
        clause.extend(supports.iter().copied());

        match ctx.add_clause_during_search(clause, ClauseSource::LoopFormula)? {
            SearchAddition::Conflict(key) => return Ok(Some(key)),

            SearchAddition::Asserting { key, literal } => {
                match ctx.record_assignment(literal, AssignmentSource::BCP(key)) {
                    crate::db::atom::ValuationStatus::Conflict => {
                        return Err(err::DefinitionError::CorruptSource.into());
                    }
                    _ => {}
                }
            }

            SearchAddition::Stored(_) | SearchAddition::Tautology | SearchAddition::Recorded => {}
        }
    }

    Ok(None)
}

/// The external supports of the invalidated set: body representatives of rules supported from
/// outside, and false positive set literals of definitional aggregates inside.
fn external_supports<R: rand::Rng + std::default::Default>(
    definitions: &Definitions,
    blocked: &HashSet<Atom>,
    ctx: &GenericContext<R>,
) -> Vec<CLiteral> {
    let mut supports: Vec<CLiteral> = Vec::new();
    let mut seen: HashSet<CLiteral> = HashSet::default();

    for &atom in blocked {
        match &definitions.heads[&atom] {
            DefHead::Rules(rule_indices) => {
                for &ri in rule_indices {
                    let rule = &definitions.rules[ri];
                    let internal = rule
                        .body
                        .iter()
                        .any(|literal| literal.polarity() && blocked.contains(&literal.atom()));
                    if internal {
                        continue;
                    }
                    if let Some(repr) = rule.repr {
                        if seen.insert(repr) {
                            supports.push(repr);
                        }
                    }
                }
            }

            DefHead::Aggregate { set, .. } => {
                for witness in ctx.aggregates.loop_formula_witnesses(*set, &ctx.atom_db) {
                    if seen.insert(witness) {
                        supports.push(witness);
                    }
                }
            }
        }
    }

    supports
}

/// Verifies a total assignment: every true cyclic atom must be externally justified, and a
/// violation is answered with loop formulas — necessarily a conflict on a total valuation.
pub(crate) fn final_check<R: rand::Rng + std::default::Default>(
    definitions: &mut Definitions,
    ctx: &mut GenericContext<R>,
) -> Result<Option<ClauseKey>, ErrorKind> {
    if definitions.cyclic_atoms().next().is_none() {
        return Ok(None);
    }

    let mut blocked: HashSet<Atom> = definitions.cyclic_atoms().collect();
    for atom in blocked.iter().copied().collect::<Vec<_>>() {
        definitions.set_source(atom, Source::None);
    }
    definitions.resource_fixpoint(&mut blocked, ctx)?;

    let unfounded: Vec<Atom> = blocked
        .iter()
        .copied()
        .filter(|atom| ctx.atom_db.value_of(*atom) == Some(true))
        .collect();

    if unfounded.is_empty() {
        return Ok(None);
    }

    ctx.counters.unfounded_sets += 1;
    log::info!(target: targets::UNFOUNDED, "Total assignment hides an unfounded set of {} atoms.", unfounded.len());

    assert_loop_formulas(definitions, &blocked, &unfounded, ctx)
}

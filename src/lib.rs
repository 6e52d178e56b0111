/*!
A library for determining the satisfiability of extended boolean formulas.

stoat_sat decides theories composed of clauses, inductive definitions (rules under well-founded or
stable semantics), and pseudo-Boolean aggregate constraints (sum, cardinality, product, min, max,
with lower and/or upper bounds, optionally reifying a boolean head), using conflict-driven
clause-learning together with two tightly coupled theory propagators:

- An *aggregate* propagator, maintaining watched-literal schemes over weighted sets and producing
  minimal explanations of each propagation on demand.
- A *definition* propagator, detecting unfounded sets in the positive dependency graph of the
  rules and asserting loop formulas to rule out self-supporting cycles.

# Orientation

The library is designed around the core structure of a [context](crate::context).

Constraints are added programmatically: [add_clause](crate::context::GenericContext::add_clause),
[add_rule](crate::context::GenericContext::add_rule),
[add_set](crate::context::GenericContext::add_set) and
[add_aggregate](crate::context::GenericContext::add_aggregate).
Once every constraint is present, [finish_parsing](crate::context::GenericContext::finish_parsing)
freezes the theory — indexes are built, watches installed — and
[solve](crate::context::GenericContext::solve) may be called, followed by
[next_model](crate::context::GenericContext::next_model) for model enumeration.

Internally, and at a high level, a solve is viewed in terms of the manipulation of, and
relationships between, a handful of databases:
- The formula is stored in a clause database.
- The valuation is stored in an atom database.
- Assignments are logged on a trail, whose order every propagator observes.

The clause engine and the theory propagators all push assignments through the trail.
Each new assignment fires watches which enqueue theory work, and theory propagators either derive
further literals or raise a conflict.
During conflict analysis the engine may request an explanation from the theory which produced a
given propagation, and the theory materializes the clause on demand.

Useful starting points, then, may be:
- The high-level [solve procedure](crate::procedures::solve) to inspect the dynamics of a solve.
- The [database module](crate::db) to inspect the data considered during a solve.
- The [propagators](crate::propagators) for the aggregate and definition theories.
- The [configuration](crate::config) to see what is adjustable.

# Example

```rust
# use stoat_sat::{config::Config, context::Context, reports::Report, structures::literal::CLiteral};
let mut ctx = Context::from_config(Config::default());

let p = ctx.fresh_atom().unwrap();
let q = ctx.fresh_atom().unwrap();

ctx.add_clause(vec![CLiteral::new(p, true), CLiteral::new(q, true)]).unwrap();
ctx.add_clause(vec![CLiteral::new(p, false)]).unwrap();

assert!(ctx.solve().is_ok());
assert_eq!(ctx.report(), Report::Satisfiable);
assert_eq!(ctx.value_of(q), Some(true));
```

# Logs

To help diagnose issues (somewhat) detailed calls to [log!](log) are made, with a variety of
targets defined to narrow output to relevant parts of the library — see [misc::log].
No log implementation is provided.
*/

#![allow(clippy::collapsible_else_if)]
#![allow(clippy::single_match)]

pub mod builder;
pub mod procedures;

pub mod config;
pub mod context;
pub mod structures;
pub mod types;

pub mod generic;

pub mod reports;

pub mod db;

pub mod propagators;

pub mod misc;

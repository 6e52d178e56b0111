use stoat_sat::{
    config::Config,
    context::Context,
    reports::Report,
    structures::{
        aggregate::{AggKind, AggSemantics, AggSign, WeightedLiteral},
        literal::CLiteral,
    },
    types::err::{ErrorKind, ParseError},
};

fn weighted(atoms: &[(u32, i64)]) -> Vec<WeightedLiteral> {
    atoms
        .iter()
        .map(|(atom, weight)| WeightedLiteral::new(CLiteral::new(*atom, true), *weight))
        .collect()
}

mod cardinality {
    use super::*;

    /// Five unit-weight literals, a head over `count ≥ 3`, and the first two forced false: the
    /// remaining three are forced true.
    fn at_least_three(config: Config) {
        let mut ctx = Context::from_config(config);
        let atoms: Vec<u32> = (0..5).map(|_| ctx.fresh_atom().unwrap()).collect();
        let h = CLiteral::new(ctx.fresh_atom().unwrap(), true);

        ctx.add_set(1, weighted(&atoms.iter().map(|a| (*a, 1)).collect::<Vec<_>>()))
            .unwrap();
        ctx.add_aggregate(h, 1, 3, AggSign::AtLeast, AggKind::Card, AggSemantics::Equivalence)
            .unwrap();

        ctx.add_clause(vec![h]).unwrap();
        ctx.add_clause(vec![CLiteral::new(atoms[0], false)]).unwrap();
        ctx.add_clause(vec![CLiteral::new(atoms[1], false)]).unwrap();

        assert_eq!(ctx.solve(), Ok(Report::Satisfiable));

        for atom in &atoms[2..] {
            assert_eq!(ctx.value_of(*atom), Some(true));
        }
    }

    #[test]
    fn at_least_three_fully_watched() {
        // The default threshold leaves a five literal set fully watched.
        at_least_three(Config::default());
    }

    #[test]
    fn at_least_three_partially_watched() {
        let config = Config {
            partial_watch_threshold: 0,
            ..Config::default()
        };
        at_least_three(config);
    }

    #[test]
    fn head_follows_the_count() {
        let mut ctx = Context::from_config(Config::default());
        let atoms: Vec<u32> = (0..3).map(|_| ctx.fresh_atom().unwrap()).collect();
        let h = CLiteral::new(ctx.fresh_atom().unwrap(), true);

        ctx.add_set(1, weighted(&atoms.iter().map(|a| (*a, 1)).collect::<Vec<_>>()))
            .unwrap();
        ctx.add_aggregate(h, 1, 2, AggSign::AtLeast, AggKind::Card, AggSemantics::Equivalence)
            .unwrap();

        for atom in &atoms {
            ctx.add_clause(vec![CLiteral::new(*atom, true)]).unwrap();
        }

        assert_eq!(ctx.solve(), Ok(Report::Satisfiable));
        assert_eq!(ctx.value_of(h.atom()), Some(true));
    }

    #[test]
    fn unreachable_count_falsifies_the_head() {
        let mut ctx = Context::from_config(Config::default());
        let atoms: Vec<u32> = (0..3).map(|_| ctx.fresh_atom().unwrap()).collect();
        let h = CLiteral::new(ctx.fresh_atom().unwrap(), true);

        ctx.add_set(1, weighted(&atoms.iter().map(|a| (*a, 1)).collect::<Vec<_>>()))
            .unwrap();
        ctx.add_aggregate(h, 1, 2, AggSign::AtLeast, AggKind::Card, AggSemantics::Equivalence)
            .unwrap();

        ctx.add_clause(vec![CLiteral::new(atoms[0], false)]).unwrap();
        ctx.add_clause(vec![CLiteral::new(atoms[1], false)]).unwrap();

        assert_eq!(ctx.solve(), Ok(Report::Satisfiable));
        assert_eq!(ctx.value_of(h.atom()), Some(false));
    }
}

mod sums {
    use super::*;

    /// Weights 3, 5, 7 under `sum ≤ 8`: valuing the 7 and the 5 overshoots, falsifying the
    /// head.
    #[test]
    fn upper_bound_falsifies_the_head() {
        let mut ctx = Context::from_config(Config::default());
        let set = [
            (ctx.fresh_atom().unwrap(), 3),
            (ctx.fresh_atom().unwrap(), 5),
            (ctx.fresh_atom().unwrap(), 7),
        ];
        let h = CLiteral::new(ctx.fresh_atom().unwrap(), true);

        ctx.add_set(1, weighted(&set)).unwrap();
        ctx.add_aggregate(h, 1, 8, AggSign::AtMost, AggKind::Sum, AggSemantics::Equivalence)
            .unwrap();

        ctx.add_clause(vec![CLiteral::new(set[2].0, true)]).unwrap();
        ctx.add_clause(vec![CLiteral::new(set[1].0, true)]).unwrap();

        assert_eq!(ctx.solve(), Ok(Report::Satisfiable));
        assert_eq!(ctx.value_of(h.atom()), Some(false));
    }

    /// As above, with the head also required true: unsatisfiable without a decision.
    #[test]
    fn upper_bound_conflict() {
        let mut ctx = Context::from_config(Config::default());
        let set = [
            (ctx.fresh_atom().unwrap(), 3),
            (ctx.fresh_atom().unwrap(), 5),
            (ctx.fresh_atom().unwrap(), 7),
        ];
        let h = CLiteral::new(ctx.fresh_atom().unwrap(), true);

        ctx.add_set(1, weighted(&set)).unwrap();
        ctx.add_aggregate(h, 1, 8, AggSign::AtMost, AggKind::Sum, AggSemantics::Equivalence)
            .unwrap();

        ctx.add_clause(vec![h]).unwrap();
        ctx.add_clause(vec![CLiteral::new(set[2].0, true)]).unwrap();
        ctx.add_clause(vec![CLiteral::new(set[1].0, true)]).unwrap();

        assert!(ctx.solve().is_ok());
        assert_eq!(ctx.report(), Report::Unsatisfiable);
    }

    /// A true head under an upper bound forces out any literal which would overshoot.
    #[test]
    fn a_true_head_excludes_heavy_literals() {
        let mut ctx = Context::from_config(Config::default());
        let set = [
            (ctx.fresh_atom().unwrap(), 3),
            (ctx.fresh_atom().unwrap(), 5),
            (ctx.fresh_atom().unwrap(), 7),
        ];
        let h = CLiteral::new(ctx.fresh_atom().unwrap(), true);

        ctx.add_set(1, weighted(&set)).unwrap();
        ctx.add_aggregate(h, 1, 11, AggSign::AtMost, AggKind::Sum, AggSemantics::Equivalence)
            .unwrap();

        ctx.add_clause(vec![h]).unwrap();
        ctx.add_clause(vec![CLiteral::new(set[2].0, true)]).unwrap();

        assert_eq!(ctx.solve(), Ok(Report::Satisfiable));
        // 7 is in, so 5 would overshoot; 3 still fits.
        assert_eq!(ctx.value_of(set[1].0), Some(false));
    }

    #[test]
    fn lower_bound_forces_support() {
        let mut ctx = Context::from_config(Config::default());
        let set = [
            (ctx.fresh_atom().unwrap(), 3),
            (ctx.fresh_atom().unwrap(), 5),
        ];
        let h = CLiteral::new(ctx.fresh_atom().unwrap(), true);

        ctx.add_set(1, weighted(&set)).unwrap();
        ctx.add_aggregate(h, 1, 8, AggSign::AtLeast, AggKind::Sum, AggSemantics::Equivalence)
            .unwrap();

        ctx.add_clause(vec![h]).unwrap();

        assert_eq!(ctx.solve(), Ok(Report::Satisfiable));
        // Both are needed to reach 8.
        assert_eq!(ctx.value_of(set[0].0), Some(true));
        assert_eq!(ctx.value_of(set[1].0), Some(true));
    }

    #[cfg(not(feature = "bigint"))]
    #[test]
    fn overflow_is_an_error() {
        let mut ctx = Context::from_config(Config::default());
        let a = ctx.fresh_atom().unwrap();
        let b = ctx.fresh_atom().unwrap();
        let h = CLiteral::new(ctx.fresh_atom().unwrap(), true);

        ctx.add_set(1, weighted(&[(a, i64::MAX), (b, i64::MAX)])).unwrap();
        ctx.add_aggregate(h, 1, 8, AggSign::AtLeast, AggKind::Sum, AggSemantics::Equivalence)
            .unwrap();

        assert_eq!(ctx.finish_parsing(), Err(ErrorKind::Overflow));
    }
}

mod products {
    use super::*;

    #[test]
    fn zero_weight_is_rejected() {
        let mut ctx = Context::from_config(Config::default());
        let a = ctx.fresh_atom().unwrap();
        let b = ctx.fresh_atom().unwrap();
        let h = CLiteral::new(ctx.fresh_atom().unwrap(), true);

        ctx.add_set(1, weighted(&[(a, 0), (b, 3)])).unwrap();
        assert_eq!(
            ctx.add_aggregate(h, 1, 6, AggSign::AtLeast, AggKind::Prod, AggSemantics::Equivalence),
            Err(ErrorKind::Parse(ParseError::ZeroProductWeight))
        );
    }

    #[test]
    fn both_polarities_are_rejected() {
        let mut ctx = Context::from_config(Config::default());
        let a = ctx.fresh_atom().unwrap();
        let h = CLiteral::new(ctx.fresh_atom().unwrap(), true);

        let set = vec![
            WeightedLiteral::new(CLiteral::new(a, true), 2),
            WeightedLiteral::new(CLiteral::new(a, false), 3),
        ];
        ctx.add_set(1, set).unwrap();
        ctx.add_aggregate(h, 1, 6, AggSign::AtLeast, AggKind::Prod, AggSemantics::Equivalence)
            .unwrap();

        assert_eq!(
            ctx.finish_parsing(),
            Err(ErrorKind::Parse(ParseError::BothPolaritiesInProduct))
        );
    }

    #[test]
    fn lower_bound_forces_every_factor() {
        let mut ctx = Context::from_config(Config::default());
        let set = [
            (ctx.fresh_atom().unwrap(), 2),
            (ctx.fresh_atom().unwrap(), 3),
        ];
        let h = CLiteral::new(ctx.fresh_atom().unwrap(), true);

        ctx.add_set(1, weighted(&set)).unwrap();
        ctx.add_aggregate(h, 1, 6, AggSign::AtLeast, AggKind::Prod, AggSemantics::Equivalence)
            .unwrap();

        ctx.add_clause(vec![h]).unwrap();

        assert_eq!(ctx.solve(), Ok(Report::Satisfiable));
        assert_eq!(ctx.value_of(set[0].0), Some(true));
        assert_eq!(ctx.value_of(set[1].0), Some(true));
    }
}

mod extrema {
    use super::*;

    #[test]
    fn max_lower_bound_selects_the_unique_candidate() {
        let mut ctx = Context::from_config(Config::default());
        let set = [
            (ctx.fresh_atom().unwrap(), 3),
            (ctx.fresh_atom().unwrap(), 5),
            (ctx.fresh_atom().unwrap(), 7),
        ];
        let h = CLiteral::new(ctx.fresh_atom().unwrap(), true);

        ctx.add_set(1, weighted(&set)).unwrap();
        ctx.add_aggregate(h, 1, 6, AggSign::AtLeast, AggKind::Max, AggSemantics::Equivalence)
            .unwrap();

        ctx.add_clause(vec![h]).unwrap();

        assert_eq!(ctx.solve(), Ok(Report::Satisfiable));
        // Only the weight 7 literal reaches the bound.
        assert_eq!(ctx.value_of(set[2].0), Some(true));
    }

    #[test]
    fn max_upper_bound_excludes_heavy_literals() {
        let mut ctx = Context::from_config(Config::default());
        let set = [
            (ctx.fresh_atom().unwrap(), 3),
            (ctx.fresh_atom().unwrap(), 5),
            (ctx.fresh_atom().unwrap(), 7),
        ];
        let h = CLiteral::new(ctx.fresh_atom().unwrap(), true);

        ctx.add_set(1, weighted(&set)).unwrap();
        ctx.add_aggregate(h, 1, 4, AggSign::AtMost, AggKind::Max, AggSemantics::Equivalence)
            .unwrap();

        ctx.add_clause(vec![h]).unwrap();

        assert_eq!(ctx.solve(), Ok(Report::Satisfiable));
        assert_eq!(ctx.value_of(set[1].0), Some(false));
        assert_eq!(ctx.value_of(set[2].0), Some(false));
    }

    #[test]
    fn min_normalizes_to_max() {
        let mut ctx = Context::from_config(Config::default());
        let set = [
            (ctx.fresh_atom().unwrap(), 3),
            (ctx.fresh_atom().unwrap(), 5),
        ];
        let h = CLiteral::new(ctx.fresh_atom().unwrap(), true);

        ctx.add_set(1, weighted(&set)).unwrap();
        ctx.add_aggregate(h, 1, 4, AggSign::AtMost, AggKind::Min, AggSemantics::Equivalence)
            .unwrap();

        // With the 3 in, the minimum is at most 3 ≤ 4 and the head holds.
        ctx.add_clause(vec![CLiteral::new(set[0].0, true)]).unwrap();
        ctx.add_clause(vec![CLiteral::new(set[1].0, false)]).unwrap();

        assert_eq!(ctx.solve(), Ok(Report::Satisfiable));
        assert_eq!(ctx.value_of(h.atom()), Some(true));
    }

    #[test]
    fn min_over_nothing_fails_an_upper_bound() {
        let mut ctx = Context::from_config(Config::default());
        let set = [
            (ctx.fresh_atom().unwrap(), 3),
            (ctx.fresh_atom().unwrap(), 5),
        ];
        let h = CLiteral::new(ctx.fresh_atom().unwrap(), true);

        ctx.add_set(1, weighted(&set)).unwrap();
        ctx.add_aggregate(h, 1, 4, AggSign::AtMost, AggKind::Min, AggSemantics::Equivalence)
            .unwrap();

        ctx.add_clause(vec![CLiteral::new(set[0].0, false)]).unwrap();
        ctx.add_clause(vec![CLiteral::new(set[1].0, false)]).unwrap();

        assert_eq!(ctx.solve(), Ok(Report::Satisfiable));
        assert_eq!(ctx.value_of(h.atom()), Some(false));
    }
}

mod structure {
    use super::*;

    #[test]
    fn duplicate_set_ids_are_rejected() {
        let mut ctx = Context::from_config(Config::default());
        let a = ctx.fresh_atom().unwrap();

        ctx.add_set(1, weighted(&[(a, 1)])).unwrap();
        assert_eq!(
            ctx.add_set(1, weighted(&[(a, 2)])),
            Err(ErrorKind::Parse(ParseError::DuplicateSetId(1)))
        );
    }

    #[test]
    fn empty_sets_are_rejected() {
        let mut ctx = Context::from_config(Config::default());
        assert_eq!(
            ctx.add_set(1, Vec::new()),
            Err(ErrorKind::Parse(ParseError::EmptySet))
        );
    }

    #[test]
    fn negative_weights_are_rejected() {
        let mut ctx = Context::from_config(Config::default());
        let a = ctx.fresh_atom().unwrap();
        assert_eq!(
            ctx.add_set(1, weighted(&[(a, -1)])),
            Err(ErrorKind::Parse(ParseError::NegativeWeight))
        );
    }

    #[test]
    fn aggregates_over_a_set_share_its_kind() {
        let mut ctx = Context::from_config(Config::default());
        let a = ctx.fresh_atom().unwrap();
        let h = CLiteral::new(ctx.fresh_atom().unwrap(), true);
        let g = CLiteral::new(ctx.fresh_atom().unwrap(), true);

        ctx.add_set(1, weighted(&[(a, 1)])).unwrap();
        ctx.add_aggregate(h, 1, 1, AggSign::AtLeast, AggKind::Sum, AggSemantics::Equivalence)
            .unwrap();
        assert_eq!(
            ctx.add_aggregate(g, 1, 1, AggSign::AtLeast, AggKind::Max, AggSemantics::Equivalence),
            Err(ErrorKind::Parse(ParseError::KindMismatch(1)))
        );
    }

    #[test]
    fn implication_heads_do_not_reflect_the_constraint() {
        let mut ctx = Context::from_config(Config::default());
        let a = ctx.fresh_atom().unwrap();
        let h = CLiteral::new(ctx.fresh_atom().unwrap(), true);

        ctx.add_set(1, weighted(&[(a, 1)])).unwrap();
        ctx.add_aggregate(h, 1, 1, AggSign::AtLeast, AggKind::Card, AggSemantics::Implication)
            .unwrap();

        // The constraint holds outright, but an implication-only head is not derived.
        ctx.add_clause(vec![CLiteral::new(a, true)]).unwrap();
        ctx.add_clause(vec![-h]).unwrap();

        assert_eq!(ctx.solve(), Ok(Report::Satisfiable));
        assert_eq!(ctx.value_of(h.atom()), Some(false));
    }
}

use stoat_sat::{
    config::{Config, DefinitionSemantics, UnfoundedStrategy},
    context::Context,
    reports::Report,
    structures::{
        aggregate::{AggKind, AggSemantics, AggSign, WeightedLiteral},
        literal::CLiteral,
    },
};

mod foundations {
    use super::*;

    #[test]
    fn a_fact_is_true() {
        let mut ctx = Context::from_config(Config::default());
        let a = ctx.fresh_atom().unwrap();

        ctx.add_rule(a, Vec::new(), true).unwrap();

        assert_eq!(ctx.solve(), Ok(Report::Satisfiable));
        assert_eq!(ctx.value_of(a), Some(true));
    }

    #[test]
    fn completion_derives_heads_and_bodies() {
        let mut ctx = Context::from_config(Config::default());
        let a = ctx.fresh_atom().unwrap();
        let b = ctx.fresh_atom().unwrap();

        ctx.add_rule(b, Vec::new(), true).unwrap();
        ctx.add_rule(a, vec![CLiteral::new(b, true)], true).unwrap();

        assert_eq!(ctx.solve(), Ok(Report::Satisfiable));
        assert_eq!(ctx.value_of(a), Some(true));
        assert_eq!(ctx.value_of(b), Some(true));
    }

    #[test]
    fn an_undefined_head_is_false() {
        // A head with no usable rule is false by completion.
        let mut ctx = Context::from_config(Config::default());
        let a = ctx.fresh_atom().unwrap();
        let b = ctx.fresh_atom().unwrap();

        ctx.add_rule(a, vec![CLiteral::new(b, true)], true).unwrap();
        ctx.add_clause(vec![CLiteral::new(b, false)]).unwrap();

        assert_eq!(ctx.solve(), Ok(Report::Satisfiable));
        assert_eq!(ctx.value_of(a), Some(false));
    }

    #[test]
    fn conjunctive_bodies_require_every_literal() {
        let mut ctx = Context::from_config(Config::default());
        let a = ctx.fresh_atom().unwrap();
        let b = ctx.fresh_atom().unwrap();
        let c = ctx.fresh_atom().unwrap();

        ctx.add_rule(a, vec![CLiteral::new(b, true), CLiteral::new(c, true)], true)
            .unwrap();
        ctx.add_clause(vec![CLiteral::new(b, true)]).unwrap();
        ctx.add_clause(vec![CLiteral::new(c, false)]).unwrap();

        assert_eq!(ctx.solve(), Ok(Report::Satisfiable));
        assert_eq!(ctx.value_of(a), Some(false));
    }

    #[test]
    fn disjunctive_bodies_require_some_literal() {
        let mut ctx = Context::from_config(Config::default());
        let a = ctx.fresh_atom().unwrap();
        let b = ctx.fresh_atom().unwrap();
        let c = ctx.fresh_atom().unwrap();

        ctx.add_rule(a, vec![CLiteral::new(b, true), CLiteral::new(c, true)], false)
            .unwrap();
        ctx.add_clause(vec![CLiteral::new(b, false)]).unwrap();
        ctx.add_clause(vec![CLiteral::new(c, true)]).unwrap();

        assert_eq!(ctx.solve(), Ok(Report::Satisfiable));
        assert_eq!(ctx.value_of(a), Some(true));
    }
}

mod loops {
    use super::*;

    /// `a ← b`, `b ← a`, no external support: both false, under either semantics.
    fn unsupported_loop(semantics: DefinitionSemantics) {
        let config = Config {
            semantics,
            ..Config::default()
        };
        let mut ctx = Context::from_config(config);
        let a = ctx.fresh_atom().unwrap();
        let b = ctx.fresh_atom().unwrap();

        ctx.add_rule(a, vec![CLiteral::new(b, true)], true).unwrap();
        ctx.add_rule(b, vec![CLiteral::new(a, true)], true).unwrap();

        assert_eq!(ctx.solve(), Ok(Report::Satisfiable));
        assert_eq!(ctx.value_of(a), Some(false));
        assert_eq!(ctx.value_of(b), Some(false));
    }

    #[test]
    fn unsupported_loop_well_founded() {
        unsupported_loop(DefinitionSemantics::WellFounded);
    }

    #[test]
    fn unsupported_loop_stable() {
        unsupported_loop(DefinitionSemantics::Stable);
    }

    #[test]
    fn a_loop_with_support_follows_the_support() {
        // a ← b, b ← a, a ← c: the loop stands or falls with c.
        let mut ctx = Context::from_config(Config::default());
        let a = ctx.fresh_atom().unwrap();
        let b = ctx.fresh_atom().unwrap();
        let c = ctx.fresh_atom().unwrap();

        ctx.add_rule(a, vec![CLiteral::new(b, true)], true).unwrap();
        ctx.add_rule(b, vec![CLiteral::new(a, true)], true).unwrap();
        ctx.add_rule(a, vec![CLiteral::new(c, true)], true).unwrap();

        ctx.add_clause(vec![CLiteral::new(c, true)]).unwrap();

        assert_eq!(ctx.solve(), Ok(Report::Satisfiable));
        assert_eq!(ctx.value_of(a), Some(true));
        assert_eq!(ctx.value_of(b), Some(true));
    }

    #[test]
    fn a_loop_without_support_collapses() {
        let mut ctx = Context::from_config(Config::default());
        let a = ctx.fresh_atom().unwrap();
        let b = ctx.fresh_atom().unwrap();
        let c = ctx.fresh_atom().unwrap();

        ctx.add_rule(a, vec![CLiteral::new(b, true)], true).unwrap();
        ctx.add_rule(b, vec![CLiteral::new(a, true)], true).unwrap();
        ctx.add_rule(a, vec![CLiteral::new(c, true)], true).unwrap();

        ctx.add_clause(vec![CLiteral::new(c, false)]).unwrap();

        assert_eq!(ctx.solve(), Ok(Report::Satisfiable));
        assert_eq!(ctx.value_of(a), Some(false));
        assert_eq!(ctx.value_of(b), Some(false));
    }

    /// Whatever the model, a loop atom and its sibling agree, and hold exactly when the
    /// external support does.
    fn loop_discovered_during_search(strategy: UnfoundedStrategy) {
        let config = Config {
            ufs_strategy: strategy,
            ..Config::default()
        };
        let mut ctx = Context::from_config(config);
        let a = ctx.fresh_atom().unwrap();
        let b = ctx.fresh_atom().unwrap();
        let c = ctx.fresh_atom().unwrap();

        ctx.add_rule(a, vec![CLiteral::new(b, true)], true).unwrap();
        ctx.add_rule(b, vec![CLiteral::new(a, true)], true).unwrap();
        ctx.add_rule(a, vec![CLiteral::new(c, true)], true).unwrap();

        assert_eq!(ctx.solve(), Ok(Report::Satisfiable));

        assert_eq!(ctx.value_of(a), ctx.value_of(b));
        assert_eq!(ctx.value_of(a), ctx.value_of(c));
    }

    #[test]
    fn loop_discovered_during_search_bfs() {
        loop_discovered_during_search(UnfoundedStrategy::Bfs);
    }

    #[test]
    fn loop_discovered_during_search_adaptive() {
        loop_discovered_during_search(UnfoundedStrategy::Adaptive);
    }

    #[test]
    fn a_three_cycle_collapses() {
        let mut ctx = Context::from_config(Config::default());
        let a = ctx.fresh_atom().unwrap();
        let b = ctx.fresh_atom().unwrap();
        let c = ctx.fresh_atom().unwrap();

        ctx.add_rule(a, vec![CLiteral::new(b, true)], true).unwrap();
        ctx.add_rule(b, vec![CLiteral::new(c, true)], true).unwrap();
        ctx.add_rule(c, vec![CLiteral::new(a, true)], true).unwrap();

        assert_eq!(ctx.solve(), Ok(Report::Satisfiable));
        assert_eq!(ctx.value_of(a), Some(false));
        assert_eq!(ctx.value_of(b), Some(false));
        assert_eq!(ctx.value_of(c), Some(false));
    }

    #[test]
    fn negation_is_external() {
        // a ← ¬b: a well-founded support, no loop.
        let mut ctx = Context::from_config(Config::default());
        let a = ctx.fresh_atom().unwrap();
        let b = ctx.fresh_atom().unwrap();

        ctx.add_rule(a, vec![CLiteral::new(b, false)], true).unwrap();
        ctx.add_clause(vec![CLiteral::new(b, false)]).unwrap();

        assert_eq!(ctx.solve(), Ok(Report::Satisfiable));
        assert_eq!(ctx.value_of(a), Some(true));
    }
}

mod recursive_aggregates {
    use super::*;

    #[test]
    fn an_aggregate_cycle_without_external_support_collapses() {
        // h ⟷ card{a} ≥ 1 (definitional), a ← h: pure mutual support.
        let mut ctx = Context::from_config(Config::default());
        let a = ctx.fresh_atom().unwrap();
        let h = ctx.fresh_atom().unwrap();

        ctx.add_set(1, vec![WeightedLiteral::new(CLiteral::new(a, true), 1)])
            .unwrap();
        ctx.add_aggregate(
            CLiteral::new(h, true),
            1,
            1,
            AggSign::AtLeast,
            AggKind::Card,
            AggSemantics::Definitional,
        )
        .unwrap();
        ctx.add_rule(a, vec![CLiteral::new(h, true)], true).unwrap();

        assert_eq!(ctx.solve(), Ok(Report::Satisfiable));
        assert_eq!(ctx.value_of(a), Some(false));
        assert_eq!(ctx.value_of(h), Some(false));
    }

    #[test]
    fn an_aggregate_cycle_with_external_support_stands() {
        // As above, with a free atom in the set to justify the head externally.
        let mut ctx = Context::from_config(Config::default());
        let a = ctx.fresh_atom().unwrap();
        let b = ctx.fresh_atom().unwrap();
        let h = ctx.fresh_atom().unwrap();

        ctx.add_set(
            1,
            vec![
                WeightedLiteral::new(CLiteral::new(a, true), 1),
                WeightedLiteral::new(CLiteral::new(b, true), 1),
            ],
        )
        .unwrap();
        ctx.add_aggregate(
            CLiteral::new(h, true),
            1,
            1,
            AggSign::AtLeast,
            AggKind::Card,
            AggSemantics::Definitional,
        )
        .unwrap();
        ctx.add_rule(a, vec![CLiteral::new(h, true)], true).unwrap();

        ctx.add_clause(vec![CLiteral::new(b, true)]).unwrap();

        assert_eq!(ctx.solve(), Ok(Report::Satisfiable));
        assert_eq!(ctx.value_of(h), Some(true));
        assert_eq!(ctx.value_of(a), Some(true));
    }

    #[test]
    fn non_monotone_recursion_is_rejected() {
        use stoat_sat::types::err::{ErrorKind, ParseError};

        // An upper bound cannot sit inside a positive cycle.
        let mut ctx = Context::from_config(Config::default());
        let a = ctx.fresh_atom().unwrap();
        let h = ctx.fresh_atom().unwrap();

        ctx.add_set(1, vec![WeightedLiteral::new(CLiteral::new(a, true), 1)])
            .unwrap();
        ctx.add_aggregate(
            CLiteral::new(h, true),
            1,
            1,
            AggSign::AtMost,
            AggKind::Card,
            AggSemantics::Definitional,
        )
        .unwrap();
        ctx.add_rule(a, vec![CLiteral::new(h, true)], true).unwrap();

        assert_eq!(
            ctx.finish_parsing(),
            Err(ErrorKind::Parse(ParseError::UnsupportedRecursiveAggregate(h)))
        );
    }

    #[test]
    fn definitional_heads_are_positive() {
        use stoat_sat::types::err::{ErrorKind, ParseError};

        let mut ctx = Context::from_config(Config::default());
        let a = ctx.fresh_atom().unwrap();
        let h = ctx.fresh_atom().unwrap();

        ctx.add_set(1, vec![WeightedLiteral::new(CLiteral::new(a, true), 1)])
            .unwrap();
        assert_eq!(
            ctx.add_aggregate(
                CLiteral::new(h, false),
                1,
                1,
                AggSign::AtLeast,
                AggKind::Card,
                AggSemantics::Definitional,
            ),
            Err(ErrorKind::Parse(ParseError::NegativeDefinedHead))
        );
    }
}

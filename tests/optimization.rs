use stoat_sat::{
    config::Config,
    context::Context,
    reports::Report,
    structures::{
        aggregate::{AggKind, MinimizeObjective, WeightedLiteral},
        literal::CLiteral,
    },
};

mod optimization {
    use super::*;

    #[test]
    fn subset_minimal_models_drop_literals() {
        let mut ctx = Context::from_config(Config::default());
        let p = CLiteral::new(ctx.fresh_atom().unwrap(), true);
        let q = CLiteral::new(ctx.fresh_atom().unwrap(), true);

        ctx.add_clause(vec![p, q]).unwrap();
        ctx.add_minimize(MinimizeObjective::Subset(vec![p, q])).unwrap();

        assert_eq!(ctx.solve(), Ok(Report::Satisfiable));

        let best = ctx.best_model().expect("a model was found");
        let p_true = best[p.atom() as usize] == Some(true);
        let q_true = best[q.atom() as usize] == Some(true);
        // One of the pair suffices, and minimality discards the other.
        assert!(p_true ^ q_true);
    }

    #[test]
    fn aggregate_minimization_reaches_the_optimum() {
        let mut ctx = Context::from_config(Config::default());
        let p = CLiteral::new(ctx.fresh_atom().unwrap(), true);
        let q = CLiteral::new(ctx.fresh_atom().unwrap(), true);

        ctx.add_clause(vec![p, q]).unwrap();
        ctx.add_set(
            7,
            vec![WeightedLiteral::new(p, 2), WeightedLiteral::new(q, 3)],
        )
        .unwrap();
        ctx.add_minimize(MinimizeObjective::Aggregate { set: 7, kind: AggKind::Sum })
            .unwrap();

        assert_eq!(ctx.solve(), Ok(Report::Satisfiable));

        assert_eq!(ctx.best_objective_value(), Some(&2));
        let best = ctx.best_model().expect("a model was found");
        assert_eq!(best[p.atom() as usize], Some(true));
        assert_eq!(best[q.atom() as usize], Some(false));
    }

    #[test]
    fn single_literal_preference() {
        let mut ctx = Context::from_config(Config::default());
        let p = CLiteral::new(ctx.fresh_atom().unwrap(), true);
        let q = CLiteral::new(ctx.fresh_atom().unwrap(), true);

        ctx.add_clause(vec![p, q]).unwrap();
        ctx.add_minimize(MinimizeObjective::SingleLiteral(p)).unwrap();

        assert_eq!(ctx.solve(), Ok(Report::Satisfiable));

        let best = ctx.best_model().expect("a model was found");
        assert_eq!(best[p.atom() as usize], Some(false));
        assert_eq!(best[q.atom() as usize], Some(true));
    }

    #[test]
    fn ordered_lists_prefer_early_literals_false() {
        let mut ctx = Context::from_config(Config::default());
        let p = CLiteral::new(ctx.fresh_atom().unwrap(), true);
        let q = CLiteral::new(ctx.fresh_atom().unwrap(), true);

        // One of the pair must hold; dropping p outweighs dropping q.
        ctx.add_clause(vec![p, q]).unwrap();
        ctx.add_minimize(MinimizeObjective::OrderedList(vec![p, q])).unwrap();

        assert_eq!(ctx.solve(), Ok(Report::Satisfiable));

        let best = ctx.best_model().expect("a model was found");
        assert_eq!(best[p.atom() as usize], Some(false));
        assert_eq!(best[q.atom() as usize], Some(true));
    }

    #[test]
    fn a_second_objective_is_rejected() {
        use stoat_sat::types::err::{ErrorKind, ParseError};

        let mut ctx = Context::from_config(Config::default());
        let p = CLiteral::new(ctx.fresh_atom().unwrap(), true);

        ctx.add_minimize(MinimizeObjective::SingleLiteral(p)).unwrap();
        assert_eq!(
            ctx.add_minimize(MinimizeObjective::SingleLiteral(p)),
            Err(ErrorKind::Parse(ParseError::MultipleObjectives))
        );
    }

    #[test]
    fn an_unsatisfiable_objective_reports_unsatisfiable() {
        let mut ctx = Context::from_config(Config::default());
        let p = CLiteral::new(ctx.fresh_atom().unwrap(), true);

        ctx.add_minimize(MinimizeObjective::SingleLiteral(p)).unwrap();
        ctx.add_clause(vec![p]).unwrap();
        assert!(ctx.add_clause(vec![-p]).is_err());

        assert_eq!(ctx.solve(), Ok(Report::Unsatisfiable));
        assert!(ctx.best_model().is_none());
    }
}

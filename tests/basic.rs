use stoat_sat::{
    config::Config,
    context::Context,
    reports::Report,
    structures::literal::CLiteral,
};

mod basic {
    use super::*;

    #[test]
    fn one_literal() {
        let mut ctx = Context::from_config(Config::default());
        let p = ctx.fresh_atom().unwrap();

        assert!(ctx.add_clause(vec![CLiteral::new(p, true)]).is_ok());
        assert!(ctx.solve().is_ok());

        assert_eq!(ctx.report(), Report::Satisfiable);
        assert_eq!(ctx.value_of(p), Some(true));
    }

    #[test]
    fn implication_chain() {
        // 1 ∨ 2, ¬1 ∨ 2, ¬2 ∨ 3 — satisfiable with 2 and 3 true, 1 free.
        let mut ctx = Context::from_config(Config::default());
        let one = CLiteral::new(ctx.fresh_atom().unwrap(), true);
        let two = CLiteral::new(ctx.fresh_atom().unwrap(), true);
        let three = CLiteral::new(ctx.fresh_atom().unwrap(), true);

        assert!(ctx.add_clause(vec![one, two]).is_ok());
        assert!(ctx.add_clause(vec![-one, two]).is_ok());
        assert!(ctx.add_clause(vec![-two, three]).is_ok());

        assert_eq!(ctx.solve(), Ok(Report::Satisfiable));

        assert_eq!(ctx.value_of(two.atom()), Some(true));
        assert_eq!(ctx.value_of(three.atom()), Some(true));
        assert!(ctx.value_of(one.atom()).is_some());
    }

    #[test]
    fn conflict() {
        let mut ctx = Context::from_config(Config::default());
        let p = CLiteral::new(ctx.fresh_atom().unwrap(), true);
        let q = CLiteral::new(ctx.fresh_atom().unwrap(), true);

        assert!(ctx.add_clause(vec![p, q]).is_ok());
        assert!(ctx.add_clause(vec![-p, -q]).is_ok());
        assert!(ctx.add_clause(vec![p, -q]).is_ok());
        assert!(ctx.add_clause(vec![-p, q]).is_ok());

        assert!(ctx.solve().is_ok());
        assert_eq!(ctx.report(), Report::Unsatisfiable);
    }

    #[test]
    fn unit_conjunct() {
        let mut ctx = Context::from_config(Config::default());
        let p = CLiteral::new(ctx.fresh_atom().unwrap(), true);
        let q = CLiteral::new(ctx.fresh_atom().unwrap(), true);

        assert!(ctx.add_clause(vec![p, q]).is_ok());
        assert!(ctx.add_clause(vec![-p]).is_ok());

        assert_eq!(ctx.solve(), Ok(Report::Satisfiable));

        assert_eq!(ctx.value_of(p.atom()), Some(false));
        assert_eq!(ctx.value_of(q.atom()), Some(true));
    }

    #[test]
    fn duplicate_literals_collapse() {
        let mut ctx = Context::from_config(Config::default());
        let p = CLiteral::new(ctx.fresh_atom().unwrap(), true);
        let q = CLiteral::new(ctx.fresh_atom().unwrap(), true);

        assert!(ctx.add_clause(vec![p, p, q, q]).is_ok());
        assert!(ctx.add_clause(vec![-p]).is_ok());

        assert_eq!(ctx.solve(), Ok(Report::Satisfiable));
        assert_eq!(ctx.value_of(q.atom()), Some(true));
    }

    #[test]
    fn tautologies_are_skipped() {
        let mut ctx = Context::from_config(Config::default());
        let p = CLiteral::new(ctx.fresh_atom().unwrap(), true);

        assert!(ctx.add_clause(vec![p, -p]).is_ok());
        assert!(ctx.add_clause(vec![-p]).is_ok());

        assert_eq!(ctx.solve(), Ok(Report::Satisfiable));
        assert_eq!(ctx.value_of(p.atom()), Some(false));
    }

    #[test]
    fn empty_clause_is_unsatisfiable() {
        use stoat_sat::types::err::ErrorKind;

        let mut ctx = Context::from_config(Config::default());
        let _ = ctx.fresh_atom().unwrap();

        assert_eq!(
            ctx.add_clause(Vec::<CLiteral>::new()),
            Err(ErrorKind::FundamentalConflict)
        );
        assert_eq!(ctx.report(), Report::Unsatisfiable);
    }

    #[test]
    fn determinism() {
        let solve_once = || {
            let mut ctx = Context::from_config(Config::default());
            let atoms: Vec<_> = (0..8)
                .map(|_| CLiteral::new(ctx.fresh_atom().unwrap(), true))
                .collect();
            for window in atoms.windows(2) {
                ctx.add_clause(vec![-window[0], window[1]]).unwrap();
            }
            ctx.add_clause(vec![atoms[0], atoms[3]]).unwrap();
            ctx.solve().unwrap();
            ctx.valuation().collect::<Vec<_>>()
        };

        assert_eq!(solve_once(), solve_once());
    }

    #[test]
    fn interrupt_reports_unknown() {
        let mut ctx = Context::from_config(Config::default());
        let p = CLiteral::new(ctx.fresh_atom().unwrap(), true);
        let q = CLiteral::new(ctx.fresh_atom().unwrap(), true);
        ctx.add_clause(vec![p, q]).unwrap();

        ctx.set_callback_terminate(Box::new(|| true));
        assert_eq!(ctx.solve(), Ok(Report::Unknown));
    }
}

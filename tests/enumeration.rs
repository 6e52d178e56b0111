use stoat_sat::{
    config::Config,
    context::Context,
    reports::Report,
    structures::literal::CLiteral,
};

mod enumeration {
    use super::*;

    #[test]
    fn two_free_atoms_have_four_models() {
        let mut ctx = Context::from_config(Config::default());
        let _p = ctx.fresh_atom().unwrap();
        let _q = ctx.fresh_atom().unwrap();

        let mut models = 0;
        if ctx.solve() == Ok(Report::Satisfiable) {
            models += 1;
            while ctx.next_model() == Ok(Report::Satisfiable) {
                models += 1;
            }
        }

        assert_eq!(models, 4);
        assert_eq!(ctx.next_model(), Ok(Report::Exhausted));
    }

    #[test]
    fn a_forced_model_is_unique() {
        let mut ctx = Context::from_config(Config::default());
        let p = CLiteral::new(ctx.fresh_atom().unwrap(), true);

        ctx.add_clause(vec![p]).unwrap();

        assert_eq!(ctx.solve(), Ok(Report::Satisfiable));
        assert_eq!(ctx.next_model(), Ok(Report::Exhausted));
    }

    #[test]
    fn models_respect_the_clauses() {
        let mut ctx = Context::from_config(Config::default());
        let p = CLiteral::new(ctx.fresh_atom().unwrap(), true);
        let q = CLiteral::new(ctx.fresh_atom().unwrap(), true);

        // Exclusive or — exactly two models.
        ctx.add_clause(vec![p, q]).unwrap();
        ctx.add_clause(vec![-p, -q]).unwrap();

        let mut models = 0;
        if ctx.solve() == Ok(Report::Satisfiable) {
            loop {
                models += 1;
                assert_ne!(ctx.value_of(p.atom()), ctx.value_of(q.atom()));
                if ctx.next_model() != Ok(Report::Satisfiable) {
                    break;
                }
            }
        }

        assert_eq!(models, 2);
    }

    #[test]
    fn an_unsatisfiable_theory_has_no_models() {
        let mut ctx = Context::from_config(Config::default());
        let p = CLiteral::new(ctx.fresh_atom().unwrap(), true);

        ctx.add_clause(vec![p]).unwrap();
        assert!(ctx.add_clause(vec![-p]).is_err());

        assert_eq!(ctx.solve(), Ok(Report::Unsatisfiable));
        assert_eq!(ctx.next_model(), Ok(Report::Exhausted));
    }
}

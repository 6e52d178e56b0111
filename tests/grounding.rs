use stoat_sat::{
    config::Config,
    context::Context,
    propagators::residual::{LazyGroundingCommand, TheoryAddition, WatchedValue},
    reports::Report,
    structures::{atom::Atom, literal::CLiteral},
};

/// A command which hands over a fixed batch of additions when fired.
struct FixedGrounding {
    additions: Vec<TheoryAddition>,
    fired: std::rc::Rc<std::cell::Cell<bool>>,
}

impl LazyGroundingCommand for FixedGrounding {
    fn ground(&mut self, _atom: Atom, _value: Option<bool>) -> Vec<TheoryAddition> {
        self.fired.set(true);
        std::mem::take(&mut self.additions)
    }
}

mod grounding {
    use super::*;

    #[test]
    fn a_value_watch_extends_the_theory() {
        let mut ctx = Context::from_config(Config::default());
        let t = ctx.fresh_atom().unwrap();
        let u = ctx.fresh_atom().unwrap();

        let fired = std::rc::Rc::new(std::cell::Cell::new(false));
        let command = FixedGrounding {
            additions: vec![TheoryAddition::Clause(vec![
                CLiteral::new(t, false),
                CLiteral::new(u, true),
            ])],
            fired: fired.clone(),
        };

        ctx.register_lazy_residual(t, WatchedValue::True, Box::new(command))
            .unwrap();
        ctx.add_clause(vec![CLiteral::new(t, true)]).unwrap();

        assert_eq!(ctx.solve(), Ok(Report::Satisfiable));
        assert!(fired.get());
        assert_eq!(ctx.value_of(u), Some(true));
    }

    #[test]
    fn an_unmatched_watch_stays_quiet() {
        let mut ctx = Context::from_config(Config::default());
        let t = ctx.fresh_atom().unwrap();
        let u = ctx.fresh_atom().unwrap();

        let fired = std::rc::Rc::new(std::cell::Cell::new(false));
        let command = FixedGrounding {
            additions: vec![TheoryAddition::Clause(vec![CLiteral::new(u, true)])],
            fired: fired.clone(),
        };

        ctx.register_lazy_residual(t, WatchedValue::False, Box::new(command))
            .unwrap();
        ctx.add_clause(vec![CLiteral::new(t, true)]).unwrap();

        assert_eq!(ctx.solve(), Ok(Report::Satisfiable));
        assert!(!fired.get());
    }

    #[test]
    fn immediate_expansion_fires_everything() {
        let config = Config {
            expand_lazy_immediately: true,
            ..Config::default()
        };
        let mut ctx = Context::from_config(config);
        let t = ctx.fresh_atom().unwrap();
        let u = ctx.fresh_atom().unwrap();

        let fired = std::rc::Rc::new(std::cell::Cell::new(false));
        let command = FixedGrounding {
            additions: vec![TheoryAddition::Clause(vec![CLiteral::new(u, true)])],
            fired: fired.clone(),
        };

        // Watched value notwithstanding, expansion is immediate.
        ctx.register_lazy_residual(t, WatchedValue::False, Box::new(command))
            .unwrap();
        ctx.add_clause(vec![CLiteral::new(t, true)]).unwrap();

        assert_eq!(ctx.solve(), Ok(Report::Satisfiable));
        assert!(fired.get());
        assert_eq!(ctx.value_of(u), Some(true));
    }

    #[test]
    fn a_decidable_watch_fires_before_the_decision() {
        let mut ctx = Context::from_config(Config::default());
        let t = ctx.fresh_atom().unwrap();

        let fired = std::rc::Rc::new(std::cell::Cell::new(false));
        let command = FixedGrounding {
            additions: vec![TheoryAddition::Clause(vec![CLiteral::new(t, true)])],
            fired: fired.clone(),
        };

        ctx.register_lazy_residual(t, WatchedValue::Decidable, Box::new(command))
            .unwrap();

        assert_eq!(ctx.solve(), Ok(Report::Satisfiable));
        assert!(fired.get());
        // The grounding fixed the atom before any decision on it.
        assert_eq!(ctx.value_of(t), Some(true));
    }

    #[test]
    fn structural_extension_mid_search() {
        // The grounding introduces a rule and an unsupported loop over fresh atoms.
        let mut ctx = Context::from_config(Config::default());
        let t = ctx.fresh_atom().unwrap();
        let a = ctx.fresh_atom().unwrap();
        let b = ctx.fresh_atom().unwrap();

        let fired = std::rc::Rc::new(std::cell::Cell::new(false));
        let command = FixedGrounding {
            additions: vec![
                TheoryAddition::Rule {
                    head: a,
                    body: vec![CLiteral::new(b, true)],
                    conjunctive: true,
                },
                TheoryAddition::Rule {
                    head: b,
                    body: vec![CLiteral::new(a, true)],
                    conjunctive: true,
                },
            ],
            fired: fired.clone(),
        };

        ctx.register_lazy_residual(t, WatchedValue::True, Box::new(command))
            .unwrap();
        ctx.add_clause(vec![CLiteral::new(t, true)]).unwrap();

        assert_eq!(ctx.solve(), Ok(Report::Satisfiable));
        assert!(fired.get());
        assert_eq!(ctx.value_of(a), Some(false));
        assert_eq!(ctx.value_of(b), Some(false));
    }
}

/*!
Reports from a context.

A report is a synopsis of some aspect of a context, fixed relative to the moment the report is
made — in particular, a report of satisfiability holds relative to the formula at the time of the
report, and additions may invalidate it.
*/

/// High-level reports regarding a solve.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Report {
    /// The formula of the context is satisfiable, with the valuation as a witness.
    Satisfiable,

    /// The formula of the context is unsatisfiable.
    Unsatisfiable,

    /// Every model has been enumerated.
    Exhausted,

    /// Satisfiability of the formula is unknown, e.g. as a solve was interrupted.
    Unknown,
}

impl Report {
    /// The conventional process exit code associated with the report.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Satisfiable => 10,
            Self::Unsatisfiable => 20,
            Self::Exhausted => 30,
            Self::Unknown => 0,
        }
    }
}

impl std::fmt::Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Satisfiable => write!(f, "SATISFIABLE"),
            Self::Unsatisfiable => write!(f, "UNSATISFIABLE"),
            Self::Exhausted => write!(f, "EXHAUSTED"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/*!
The propagation fixpoint.

Clause propagation and each theory propagator are interleaved, in registration order, until no
further assignment follows or a conflict is found:

1. Boolean constraint propagation consumes the trail from the queue head.
2. The aggregate propagator observes the remaining trail and derives through its watches.
3. The definition propagator observes the remaining trail and searches for unfounded sets.
4. Lazy grounding residuals fired by fresh assignments extend the theory.

A theory which extends the trail hands control back to clause propagation, so each propagator
always observes a boolean fixpoint.
Running the loop twice from the same state yields no further assignments — propagation is
idempotent.

A theory conflict arrives as the key of a clause the theory materialized, unsatisfiable on the
current valuation, and is handled by the same analysis as a clause conflict.
*/

use crate::{
    context::GenericContext,
    db::ClauseKey,
    types::err::{self, ErrorKind},
};

/// Possible 'Ok' results of the propagation fixpoint.
pub enum FixpointOk {
    /// Nothing further follows from the current valuation.
    Quiescent,

    /// The clause behind the key is unsatisfiable on the current valuation.
    Conflict(ClauseKey),
}

impl<R: rand::Rng + std::default::Default> GenericContext<R> {
    /// Interleaves clause and theory propagation until fixpoint or conflict.
    pub(crate) fn propagation_fixpoint(&mut self) -> Result<FixpointOk, ErrorKind> {
        loop {
            // Clause propagation, to fixpoint.
            while self.trail.q_head < self.trail.assignments.len() {
                let literal = self.trail.assignments[self.trail.q_head];
                self.trail.q_head += 1;

                match self.bcp(literal) {
                    Ok(()) => {}
                    Err(err::BCPError::Conflict(key)) => return Ok(FixpointOk::Conflict(key)),
                    Err(e) => return Err(e.into()),
                }
            }

            let mark = self.trail.assignments.len();

            // Theory propagators, in registration order.
            if let Some(key) = self.aggregate_propagation()? {
                return Ok(FixpointOk::Conflict(key));
            }
            if self.trail.assignments.len() > mark {
                continue;
            }

            if let Some(key) = self.definition_propagation()? {
                return Ok(FixpointOk::Conflict(key));
            }
            if self.trail.assignments.len() > mark {
                continue;
            }

            // Residual status is re-checked after each propagation round.
            match self.residual_round()? {
                ResidualRound::Quiet => return Ok(FixpointOk::Quiescent),
                ResidualRound::Extended => continue,
                ResidualRound::Conflict(key) => return Ok(FixpointOk::Conflict(key)),
            }
        }
    }

    /// Runs the aggregate propagator over the assignments it has yet to observe.
    fn aggregate_propagation(&mut self) -> Result<Option<ClauseKey>, ErrorKind> {
        // Taken to appease the borrow checker — the propagator walks the trail and records
        // assignments through the context.
        let mut aggregates = std::mem::take(&mut self.aggregates);
        let result = aggregates.propagate_at_end_of_queue(self);
        self.aggregates = aggregates;
        result
    }

    /// Runs the definition propagator over the assignments it has yet to observe.
    fn definition_propagation(&mut self) -> Result<Option<ClauseKey>, ErrorKind> {
        let mut definitions = std::mem::take(&mut self.definitions);
        let result = definitions.propagate_at_end_of_queue(self);
        self.definitions = definitions;
        result
    }

    /// Verifies a total assignment with each propagator which may still invalidate one.
    ///
    /// Under well-founded semantics the source-pointer search at each fixpoint is already
    /// complete for rule loops, and the re-check is required only when a definitional aggregate
    /// may have been justified conservatively.
    /// Stable semantics demands an external justification of every true atom of the model, and
    /// always re-checks.
    pub(crate) fn full_assignment_check(&mut self) -> Result<Option<ClauseKey>, ErrorKind> {
        use crate::config::DefinitionSemantics;

        if self.config.semantics == DefinitionSemantics::WellFounded
            && !self.definitions.has_aggregate_definitions()
        {
            return Ok(None);
        }

        let mut definitions = std::mem::take(&mut self.definitions);
        let result = crate::propagators::definition::unfounded::final_check(&mut definitions, self);
        self.definitions = definitions;
        result
    }
}

/// The outcome of a residual round.
pub(crate) enum ResidualRound {
    /// No residual fired.
    Quiet,

    /// The theory was extended.
    Extended,

    /// An extension conflicts with the current valuation.
    Conflict(ClauseKey),
}

impl<R: rand::Rng + std::default::Default> GenericContext<R> {
    /// Fires the residuals triggered by fresh assignments, applying their extensions.
    pub(crate) fn residual_round(&mut self) -> Result<ResidualRound, ErrorKind> {
        let fired = self
            .residuals
            .take_fired(&self.trail.assignments);

        if fired.is_empty() {
            return Ok(ResidualRound::Quiet);
        }

        match self.apply_residuals(fired)? {
            Some(key) => Ok(ResidualRound::Conflict(key)),
            None => Ok(ResidualRound::Extended),
        }
    }
}

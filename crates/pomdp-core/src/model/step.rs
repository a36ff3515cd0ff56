//! Immutable records produced by one simulation step.

/// Outcome of a complete step in the model: `(s, a) => (o, r, s')`.
///
/// For convenience this also carries the action taken and whether the
/// resulting next state is terminal. Created fresh per call to
/// [`generate_step`](crate::model::GenerativeModel::generate_step) and owned
/// exclusively by its caller.
#[derive(Debug, Clone)]
pub struct StepResult<S, A, O> {
    pub action: A,
    pub observation: O,
    pub reward: f64,
    pub next_state: S,
    pub is_terminal: bool,
}

/// A [`StepResult`] together with the legality of the queried action.
///
/// Illegal queries are a normal, handled outcome: `is_legal` is `false` and
/// `result` holds a placeholder step that leaves the state unchanged, never
/// a failure.
#[derive(Debug, Clone)]
pub struct GeneratedStep<S, A, O> {
    pub result: StepResult<S, A, O>,
    pub is_legal: bool,
}

impl<S, A, O> GeneratedStep<S, A, O> {
    pub fn legal(result: StepResult<S, A, O>) -> Self {
        Self {
            result,
            is_legal: true,
        }
    }

    pub fn illegal(result: StepResult<S, A, O>) -> Self {
        Self {
            result,
            is_legal: false,
        }
    }
}

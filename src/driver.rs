//! Convergence driver: re-renders until every reference is page-annotated or
//! another pass can no longer help.

use std::num::NonZeroU32;

use crate::error::Error;
use crate::registry::DestinationRegistry;
use crate::render::RenderPass;

/// Default safety cap on render passes per generation run.
pub const DEFAULT_MAX_PASSES: NonZeroU32 = NonZeroU32::new(5).expect("non-zero literal");

/// The result of a generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Convergence {
    /// How the run ended.
    pub outcome: Outcome,
    /// Markup from the final pass.
    pub output: String,
    /// Unresolved count after each pass, in pass order.
    pub unresolved_per_pass: Vec<usize>,
}

impl Convergence {
    /// Number of render passes performed.
    pub fn passes(&self) -> usize {
        return self.unresolved_per_pass.len();
    }

    /// Names left without a page in the final output.
    pub fn residual(&self) -> &[String] {
        return match &self.outcome {
            Outcome::Converged => &[],
            Outcome::Stalled { unresolved, .. } => unresolved,
        };
    }
}

/// Driver states. `Done` and `Stalled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// Final pass left no unresolved references.
    Done,
    /// A pass finished; its unresolved count is being compared.
    Evaluating,
    /// No pass has started.
    Idle,
    /// A full document pass is running.
    Rendering,
    /// Progress stopped or the pass cap was hit; output keeps placeholders.
    Stalled,
}

/// How a generation run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Every reference was page-annotated.
    Converged,
    /// Some references still carry placeholders.
    Stalled {
        /// Why the driver stopped.
        reason: StallReason,
        /// Destination names still unplaced after the final pass, sorted.
        unresolved: Vec<String>,
    },
}

/// Why a run stalled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StallReason {
    /// The unresolved count did not shrink between two passes.
    NoProgress,
    /// The configured pass cap was reached while still making progress.
    PassLimit,
}

/// What to do after evaluating a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    /// Accept the output as final.
    Finish,
    /// Reset pass state and render again.
    Retry,
    /// Accept the output with placeholders.
    Stall(StallReason),
}

/// Runs render passes until the unresolved set is empty, stops shrinking, or
/// the pass cap is reached.
#[derive(Debug)]
pub struct ConvergenceDriver {
    /// Unresolved count after each pass of the current run.
    history: Vec<usize>,
    /// Safety cap on passes.
    max_passes: NonZeroU32,
    /// Current state.
    state: DriverState,
}

impl ConvergenceDriver {
    /// Decide the next step from the count after pass `pass` (1-based).
    fn evaluate(&self, unresolved: usize, previous: Option<usize>, pass: usize) -> Step {
        if unresolved == 0 {
            return Step::Finish;
        }
        if previous.is_some_and(|p| return unresolved >= p) {
            return Step::Stall(StallReason::NoProgress);
        }
        let cap = usize::try_from(self.max_passes.get()).unwrap_or(usize::MAX);
        if pass >= cap {
            return Step::Stall(StallReason::PassLimit);
        }
        return Step::Retry;
    }

    /// Driver with the given pass cap, in the `Idle` state.
    pub const fn new(max_passes: NonZeroU32) -> Self {
        return Self {
            history: Vec::new(),
            max_passes,
            state: DriverState::Idle,
        };
    }

    /// Render until a terminal state. `registry` must belong to this generation
    /// run; its known pages carry from one pass into the next.
    ///
    /// # Errors
    ///
    /// Returns the first error reported by `renderer`.
    pub fn run<R: RenderPass + ?Sized>(
        &mut self,
        renderer: &mut R,
        registry: &mut DestinationRegistry,
    ) -> Result<Convergence, Error> {
        self.history.clear();
        self.state = DriverState::Idle;

        loop {
            registry.reset_pass_state();
            self.state = DriverState::Rendering;
            let output = renderer.render_pass(registry)?;

            self.state = DriverState::Evaluating;
            let unresolved = registry.unresolved_count();
            let previous = self.history.last().copied();
            self.history.push(unresolved);
            let pass = self.history.len();
            tracing::debug!(pass, unresolved, known = registry.len(), "render pass complete");

            match self.evaluate(unresolved, previous, pass) {
                Step::Finish => {
                    self.state = DriverState::Done;
                    tracing::info!(passes = pass, state = ?self.state(), "all references resolved");
                    return Ok(self.finish(output, Outcome::Converged));
                },
                Step::Retry => {},
                Step::Stall(reason) => {
                    self.state = DriverState::Stalled;
                    tracing::warn!(
                        passes = pass,
                        ?reason,
                        state = ?self.state(),
                        "{unresolved} references could not be page-annotated"
                    );
                    let outcome = Outcome::Stalled {
                        reason,
                        unresolved: registry.unresolved_names(),
                    };
                    return Ok(self.finish(output, outcome));
                },
            }
        }
    }

    /// Package the final pass.
    fn finish(&self, output: String, outcome: Outcome) -> Convergence {
        return Convergence {
            outcome,
            output,
            unresolved_per_pass: self.history.clone(),
        };
    }

    /// Current state.
    pub const fn state(&self) -> DriverState {
        return self.state;
    }
}

impl Default for ConvergenceDriver {
    fn default() -> Self {
        return Self::new(DEFAULT_MAX_PASSES);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PageNumber;

    /// Scripted renderer: each pass looks up `references`, then registers
    /// whatever `defines` says for that pass.
    struct Scripted {
        defines: Vec<Vec<&'static str>>,
        passes: usize,
        references: Vec<&'static str>,
    }

    impl RenderPass for Scripted {
        fn render_pass(&mut self, registry: &mut DestinationRegistry) -> Result<String, Error> {
            let mut out = Vec::new();
            for name in &self.references {
                match registry.lookup_and_mark(name) {
                    Some(page) => out.push(format!("{name}@{page}")),
                    None => out.push(format!("{name}@???")),
                }
            }
            let index = self.passes.min(self.defines.len().saturating_sub(1));
            for (offset, name) in self.defines.get(index).into_iter().flatten().enumerate() {
                registry.register(name, PageNumber(u32::try_from(offset).unwrap() + 2));
            }
            self.passes += 1;
            return Ok(out.join(" "));
        }
    }

    fn scripted(references: Vec<&'static str>, defines: Vec<Vec<&'static str>>) -> Scripted {
        return Scripted { defines, passes: 0, references };
    }

    #[test]
    fn no_references_finishes_after_one_pass() {
        let mut renderer = scripted(vec![], vec![vec!["Aaa"]]);
        let mut driver = ConvergenceDriver::default();
        let result = driver.run(&mut renderer, &mut DestinationRegistry::new()).unwrap();
        assert_eq!(result.outcome, Outcome::Converged);
        assert_eq!(result.passes(), 1);
        assert_eq!(driver.state(), DriverState::Done);
    }

    #[test]
    fn single_forward_reference_converges_in_two_passes() {
        let mut renderer = scripted(vec!["Bbb"], vec![vec!["Bbb"]]);
        let mut driver = ConvergenceDriver::default();
        let result = driver.run(&mut renderer, &mut DestinationRegistry::new()).unwrap();
        assert_eq!(result.unresolved_per_pass, vec![1, 0]);
        assert_eq!(result.output, "Bbb@2");
        assert_eq!(result.outcome, Outcome::Converged);
    }

    #[test]
    fn no_progress_stalls_after_second_pass() {
        let mut renderer = scripted(vec!["Xxx", "Yyy"], vec![vec!["Aaa"]]);
        let mut driver = ConvergenceDriver::default();
        let result = driver.run(&mut renderer, &mut DestinationRegistry::new()).unwrap();
        assert_eq!(result.unresolved_per_pass, vec![2, 2]);
        assert_eq!(driver.state(), DriverState::Stalled);
        assert_eq!(
            result.outcome,
            Outcome::Stalled {
                reason: StallReason::NoProgress,
                unresolved: vec!["Xxx".to_string(), "Yyy".to_string()],
            }
        );
        assert_eq!(result.output, "Xxx@??? Yyy@???");
    }

    #[test]
    fn progress_continues_until_resolved() {
        // Each pass places one more of the referenced names.
        let mut renderer = scripted(
            vec!["Aaa", "Bbb", "Ccc"],
            vec![vec!["Aaa"], vec!["Bbb"], vec!["Ccc"], vec![]],
        );
        let mut driver = ConvergenceDriver::default();
        let result = driver.run(&mut renderer, &mut DestinationRegistry::new()).unwrap();
        assert_eq!(result.unresolved_per_pass, vec![3, 2, 1, 0]);
        assert_eq!(result.outcome, Outcome::Converged);
    }

    #[test]
    fn pass_limit_stops_a_progressing_run() {
        let mut renderer = scripted(
            vec!["Aaa", "Bbb", "Ccc"],
            vec![vec!["Aaa"], vec!["Bbb"], vec!["Ccc"], vec![]],
        );
        let mut driver = ConvergenceDriver::new(NonZeroU32::new(2).unwrap());
        let result = driver.run(&mut renderer, &mut DestinationRegistry::new()).unwrap();
        assert_eq!(result.unresolved_per_pass, vec![3, 2]);
        assert_eq!(
            result.outcome,
            Outcome::Stalled {
                reason: StallReason::PassLimit,
                unresolved: vec!["Bbb".to_string(), "Ccc".to_string()],
            }
        );
        assert_eq!(result.residual().len(), 2);
    }

    #[test]
    fn renderer_error_propagates() {
        struct Failing;
        impl RenderPass for Failing {
            fn render_pass(&mut self, _registry: &mut DestinationRegistry) -> Result<String, Error> {
                return Err(Error::InvalidConfig { reason: "boom".to_string() });
            }
        }
        let mut driver = ConvergenceDriver::default();
        let err = driver.run(&mut Failing, &mut DestinationRegistry::new()).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
        assert_eq!(driver.state(), DriverState::Rendering);
    }
}

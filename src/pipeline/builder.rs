use super::middleware::MiddlewareFactory;
use super::stage::Pipeline;

/// Compose `factories` around `terminal`.
///
/// Factories are applied in reverse registration order, so `factories[0]`
/// ends up outermost. With no factories the result is `terminal` itself.
/// Building has no side effects beyond calling each factory once.
pub fn build(factories: &[MiddlewareFactory], terminal: Pipeline) -> Pipeline {
    factories
        .iter()
        .rev()
        .fold(terminal, |next, factory| factory(next))
}

//! The service provider contract.

use std::any::Any;
use std::sync::Arc;

use crate::container::{Container, Service};
use crate::error::BoxError;

/// A parameter handed to a provider's factory.
pub type Param = Arc<dyn Any + Send + Sync>;

/// Builds one service instance from its parameters.
pub type NewInstance = Arc<dyn Fn(&[Param]) -> Result<Service, BoxError> + Send + Sync>;

/// Describes how and when the [`Container`] builds a service.
///
/// The container calls these methods while holding its lock, so none of
/// them may call back into the same container (`make`, `bind`, …): that
/// would deadlock. Keep them free of heavy side effects.
///
/// ```rust,ignore
/// struct ClockProvider;
///
/// impl ServiceProvider for ClockProvider {
///     fn name(&self) -> &str { "clock" }
///     fn is_defer(&self) -> bool { true }
///     fn boot(&self, _: &Container) -> Result<(), BoxError> { Ok(()) }
///     fn params(&self, _: &Container) -> Vec<Param> { Vec::new() }
///     fn register(&self, _: &Container) -> NewInstance {
///         Arc::new(|_| Ok(Arc::new(SystemClock) as Service))
///     }
/// }
/// ```
pub trait ServiceProvider: Send + Sync + 'static {
    /// The key the service is bound under.
    fn name(&self) -> &str;

    /// `true` to build the service on first use, `false` to build it as
    /// soon as it is bound.
    fn is_defer(&self) -> bool;

    /// Preparation run before every instantiation. An error aborts it.
    fn boot(&self, container: &Container) -> Result<(), BoxError>;

    /// Default parameters for the factory.
    fn params(&self, container: &Container) -> Vec<Param>;

    /// Returns the factory that builds the service.
    fn register(&self, container: &Container) -> NewInstance;
}

//! Service container.
//!
//! A name-keyed registry of [`ServiceProvider`]s plus a cache of the
//! singletons built from them. The router owns one and hands a clone to
//! every request [`Context`](crate::Context); clones share the same registry.
//!
//! Rebinding a name swaps the provider but leaves an already built singleton
//! in the cache. Call [`Container::forget`] to have the next
//! [`make`](Container::make) use the new provider.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::error::Error;
use crate::provider::{Param, ServiceProvider};

/// A built service instance.
pub type Service = Arc<dyn Any + Send + Sync>;

/// Shared service registry. Cloning is cheap and yields a handle to the
/// same registry.
#[derive(Clone, Default)]
pub struct Container {
    registry: Arc<Mutex<Registry>>,
}

#[derive(Default)]
struct Registry {
    providers: HashMap<String, Arc<dyn ServiceProvider>>,
    instances: HashMap<String, Service>,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `provider` under its name, replacing any previous provider.
    ///
    /// A provider that is not deferred is instantiated right away. If its
    /// boot step or factory fails, the error is returned and nothing is
    /// registered.
    pub fn bind(&self, provider: impl ServiceProvider) -> Result<(), Error> {
        let provider: Arc<dyn ServiceProvider> = Arc::new(provider);
        let name = provider.name().to_owned();
        let mut registry = self.registry.lock();

        if !provider.is_defer() {
            let instance = self.instantiate(provider.as_ref(), None)?;
            registry.instances.insert(name.clone(), instance);
        }
        registry.providers.insert(name.clone(), provider);
        debug!(service = %name, "bound service provider");
        Ok(())
    }

    /// Whether a provider is registered under `name`, built or not.
    pub fn is_bind(&self, name: &str) -> bool {
        self.registry.lock().providers.contains_key(name)
    }

    /// Returns the singleton for `name`, building and caching it on first use.
    pub fn make(&self, name: &str) -> Result<Service, Error> {
        let mut registry = self.registry.lock();
        let provider = registry
            .providers
            .get(name)
            .cloned()
            .ok_or_else(|| Error::ServiceNotFound(name.to_owned()))?;
        if let Some(instance) = registry.instances.get(name) {
            return Ok(Arc::clone(instance));
        }

        let instance = self.instantiate(provider.as_ref(), None)?;
        registry.instances.insert(name.to_owned(), Arc::clone(&instance));
        Ok(instance)
    }

    /// Like [`make`](Self::make), for callers that cannot continue without
    /// the service.
    ///
    /// # Panics
    ///
    /// Panics if no provider is bound under `name` or the provider fails.
    pub fn must_make(&self, name: &str) -> Service {
        match self.make(name) {
            Ok(service) => service,
            Err(e) => panic!("{e}"),
        }
    }

    /// Builds a fresh instance, bypassing the singleton cache.
    ///
    /// `params` replaces the provider's default parameters when given. The
    /// cache is neither read nor updated.
    pub fn make_new(&self, name: &str, params: Option<Vec<Param>>) -> Result<Service, Error> {
        let registry = self.registry.lock();
        let provider = registry
            .providers
            .get(name)
            .ok_or_else(|| Error::ServiceNotFound(name.to_owned()))?;
        self.instantiate(provider.as_ref(), params)
    }

    /// [`make`](Self::make) followed by a downcast to the concrete type.
    pub fn make_as<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>, Error> {
        self.make(name)?
            .downcast::<T>()
            .map_err(|_| Error::ServiceType(name.to_owned()))
    }

    /// Drops the cached singleton for `name`. Returns whether one existed.
    pub fn forget(&self, name: &str) -> bool {
        self.registry.lock().instances.remove(name).is_some()
    }

    /// Boot, parameters, factory. Runs with the registry lock held.
    fn instantiate(
        &self,
        provider: &dyn ServiceProvider,
        params: Option<Vec<Param>>,
    ) -> Result<Service, Error> {
        let name = provider.name();
        let failed = |source| Error::Provider { name: name.to_owned(), source };

        provider.boot(self).map_err(failed)?;
        let params = params.unwrap_or_else(|| provider.params(self));
        let factory = provider.register(self);
        let instance = factory(&params).map_err(failed)?;
        debug!(service = %name, "instantiated service");
        Ok(instance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::error::BoxError;
    use crate::provider::NewInstance;

    struct Greeter {
        greeting: String,
    }

    struct GreeterProvider {
        defer: bool,
        boots: Arc<AtomicUsize>,
        fail_boot: bool,
    }

    impl GreeterProvider {
        fn new(defer: bool) -> Self {
            Self { defer, boots: Arc::default(), fail_boot: false }
        }
    }

    impl ServiceProvider for GreeterProvider {
        fn name(&self) -> &str { "greeter" }
        fn is_defer(&self) -> bool { self.defer }

        fn boot(&self, _: &Container) -> Result<(), BoxError> {
            self.boots.fetch_add(1, Ordering::SeqCst);
            if self.fail_boot { Err("boot failed".into()) } else { Ok(()) }
        }

        fn params(&self, _: &Container) -> Vec<Param> {
            vec![Arc::new("hello".to_owned())]
        }

        fn register(&self, _: &Container) -> NewInstance {
            Arc::new(|params: &[Param]| -> Result<Service, BoxError> {
                let greeting = params
                    .first()
                    .and_then(|p| p.downcast_ref::<String>())
                    .ok_or("greeting parameter missing")?;
                Ok(Arc::new(Greeter { greeting: greeting.clone() }) as Service)
            })
        }
    }

    #[test]
    fn make_returns_the_same_singleton() {
        let container = Container::new();
        container.bind(GreeterProvider::new(true)).unwrap();

        let a = container.make("greeter").unwrap();
        let b = container.make("greeter").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(container.make_as::<Greeter>("greeter").unwrap().greeting, "hello");
    }

    #[test]
    fn make_new_returns_distinct_instances() {
        let container = Container::new();
        container.bind(GreeterProvider::new(true)).unwrap();
        let singleton = container.make("greeter").unwrap();

        let a = container.make_new("greeter", None).unwrap();
        let b = container.make_new("greeter", None).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &singleton));
        assert!(Arc::ptr_eq(&singleton, &container.make("greeter").unwrap()));

        let custom = container
            .make_new("greeter", Some(vec![Arc::new("hi".to_owned()) as Param]))
            .unwrap();
        assert_eq!(custom.downcast_ref::<Greeter>().unwrap().greeting, "hi");
    }

    #[test]
    fn deferred_provider_boots_on_first_make() {
        let container = Container::new();
        let provider = GreeterProvider::new(true);
        let boots = Arc::clone(&provider.boots);

        container.bind(provider).unwrap();
        assert!(container.is_bind("greeter"));
        assert_eq!(boots.load(Ordering::SeqCst), 0);

        container.make("greeter").unwrap();
        container.make("greeter").unwrap();
        assert_eq!(boots.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn eager_provider_is_built_on_bind() {
        let container = Container::new();
        let provider = GreeterProvider::new(false);
        let boots = Arc::clone(&provider.boots);

        container.bind(provider).unwrap();
        assert_eq!(boots.load(Ordering::SeqCst), 1);
        let a = container.make("greeter").unwrap();
        let b = container.make("greeter").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(boots.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_eager_bind_registers_nothing() {
        let container = Container::new();
        let mut provider = GreeterProvider::new(false);
        provider.fail_boot = true;

        let err = container.bind(provider).unwrap_err();
        assert!(matches!(err, Error::Provider { ref name, .. } if name == "greeter"));
        assert!(!container.is_bind("greeter"));
        assert!(!container.forget("greeter"));
    }

    #[test]
    fn unknown_service_is_not_found() {
        let container = Container::new();
        assert!(!container.is_bind("missing"));
        assert!(matches!(container.make("missing"), Err(Error::ServiceNotFound(_))));
        assert!(matches!(container.make_new("missing", None), Err(Error::ServiceNotFound(_))));
    }

    #[test]
    #[should_panic(expected = "service `missing` not found")]
    fn must_make_panics_when_unbound() {
        Container::new().must_make("missing");
    }

    #[test]
    fn wrong_type_is_reported() {
        let container = Container::new();
        container.bind(GreeterProvider::new(true)).unwrap();
        assert!(matches!(container.make_as::<String>("greeter"), Err(Error::ServiceType(_))));
    }

    #[test]
    fn rebinding_keeps_the_cached_singleton_until_forgotten() {
        let container = Container::new();
        container.bind(GreeterProvider::new(true)).unwrap();
        let first = container.make("greeter").unwrap();

        container.bind(GreeterProvider::new(true)).unwrap();
        assert!(Arc::ptr_eq(&first, &container.make("greeter").unwrap()));

        assert!(container.forget("greeter"));
        assert!(!Arc::ptr_eq(&first, &container.make("greeter").unwrap()));
    }
}

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Display;
use tracing::debug;

use jsonrpc_lb_protocol::Params;

use crate::error::RegistryError;
use crate::handler::{MethodHandler, TypedHandler};

/// Method name to handler map. Built before serving, read-only afterwards.
#[derive(Default)]
pub struct MethodRegistry {
    handlers: HashMap<String, Arc<dyn MethodHandler>>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a standalone handler under `name`.
    ///
    /// # Panics
    ///
    /// Panics if `name` is already registered. Use
    /// [`MethodRegistry::try_register_function`] to get an error instead.
    pub fn register_function<F, Fut, P, R, E>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
        P: Params + DeserializeOwned + 'static,
        R: Serialize + 'static,
        E: Display + 'static,
    {
        if let Err(err) = self.try_register_function(name, handler) {
            panic!("{}", err);
        }
    }

    pub fn try_register_function<F, Fut, P, R, E>(
        &mut self,
        name: impl Into<String>,
        handler: F,
    ) -> Result<(), RegistryError>
    where
        F: Fn(P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
        P: Params + DeserializeOwned + 'static,
        R: Serialize + 'static,
        E: Display + 'static,
    {
        self.insert(name.into(), Arc::new(TypedHandler::new(handler)))
    }

    /// Register every method `T` exports, each as `"<name>.<Method>"`.
    ///
    /// # Panics
    ///
    /// Panics if any of the resulting names is already registered.
    pub fn register_object<T: RpcObject>(&mut self, name: &str, object: Arc<T>) {
        if let Err(err) = self.try_register_object(name, object) {
            panic!("{}", err);
        }
    }

    /// Like [`MethodRegistry::register_object`]; on a name clash nothing is registered.
    pub fn try_register_object<T: RpcObject>(
        &mut self,
        name: &str,
        object: Arc<T>,
    ) -> Result<(), RegistryError> {
        let mut methods = ObjectMethods::new(object);
        T::register_methods(&mut methods);

        let entries: Vec<(String, Arc<dyn MethodHandler>)> = methods
            .entries
            .into_iter()
            .map(|(method, handler)| (format!("{}.{}", name, method), handler))
            .collect();

        for (i, (qualified, _)) in entries.iter().enumerate() {
            let repeated = entries[..i].iter().any(|(other, _)| other == qualified);
            if repeated || self.handlers.contains_key(qualified) {
                return Err(RegistryError::DuplicateMethod(qualified.clone()));
            }
        }

        for (qualified, handler) in entries {
            self.insert(qualified, handler)?;
        }
        Ok(())
    }

    fn insert(&mut self, name: String, handler: Arc<dyn MethodHandler>) -> Result<(), RegistryError> {
        if self.handlers.contains_key(&name) {
            return Err(RegistryError::DuplicateMethod(name));
        }
        debug!(method = %name, "Registered method");
        self.handlers.insert(name, handler);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn MethodHandler>> {
        self.handlers.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Registered method names, sorted
    pub fn methods(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for MethodRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodRegistry")
            .field("methods", &self.methods())
            .finish()
    }
}

/// A service object whose methods are exported under a common prefix.
///
/// Only the methods listed in [`RpcObject::register_methods`] become callable;
/// helpers on the type stay private.
///
/// ```
/// use std::sync::Arc;
/// use jsonrpc_lb_protocol::EmptyParams;
/// use jsonrpc_lb_server::{MethodRegistry, ObjectMethods, RpcObject};
///
/// struct Greeter {
///     greeting: String,
/// }
///
/// impl RpcObject for Greeter {
///     fn register_methods(methods: &mut ObjectMethods<Self>) {
///         methods.method("Hello", |greeter: Arc<Greeter>, _: EmptyParams| async move {
///             Ok::<_, String>(greeter.greeting.clone())
///         });
///     }
/// }
///
/// let mut registry = MethodRegistry::new();
/// registry.register_object("Greeter", Arc::new(Greeter { greeting: "hi".into() }));
/// assert!(registry.contains("Greeter.Hello"));
/// ```
pub trait RpcObject: Send + Sync + 'static {
    fn register_methods(methods: &mut ObjectMethods<Self>)
    where
        Self: Sized;
}

/// Collects the exported methods of one [`RpcObject`]
pub struct ObjectMethods<T> {
    object: Arc<T>,
    entries: Vec<(String, Arc<dyn MethodHandler>)>,
}

impl<T: RpcObject> ObjectMethods<T> {
    fn new(object: Arc<T>) -> Self {
        Self {
            object,
            entries: Vec::new(),
        }
    }

    /// Export `handler` as `method`; it receives a shared handle to the object
    pub fn method<F, Fut, P, R, E>(&mut self, method: impl Into<String>, handler: F) -> &mut Self
    where
        F: Fn(Arc<T>, P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
        P: Params + DeserializeOwned + 'static,
        R: Serialize + 'static,
        E: Display + 'static,
    {
        let object = Arc::clone(&self.object);
        let bound = move |params: P| handler(Arc::clone(&object), params);
        self.entries
            .push((method.into(), Arc::new(TypedHandler::new(bound))));
        self
    }
}

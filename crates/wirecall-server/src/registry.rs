//! Method Registry
//!
//! A [`Service`] contributes its exported methods to the registry under its
//! concrete type name; the dispatcher routes `Service.Method` names to the
//! registered entries.
//!
//! Methods are type-erased at registration: a typed
//! `(args, &mut reply) -> error` closure is wrapped into a function over
//! opaque payload bytes, so the dispatcher never sees concrete handler types.
//! The active codec materializes the argument container and encodes the reply.
//!
//! Registration rules:
//!
//! - service and method names must be non-empty and start with an upper-case
//!   letter (exported); a service violating this fails registration, a method
//!   violating it is skipped with a warning;
//! - each `(service, method)` pair has at most one entry;
//! - re-registering a service name fails; [`Registry::register_name`] is the
//!   additive form that inserts a single method into an existing service.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::de::DeserializeOwned;
use serde::Serialize;

use wirecall_common::codec::Codec;
use wirecall_common::protocol::{Result, WirecallError};

/// Error type handler methods return; the message collapses to an
/// `INTERNAL_ERROR` protocol error, preserved verbatim.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Outcome of invoking an erased method, before protocol-error mapping.
#[derive(Debug)]
pub(crate) enum MethodError {
    /// The argument payload did not decode into the method's argument type.
    Body(WirecallError),
    /// The handler returned an error.
    Handler(String),
    /// The reply value did not encode.
    Encode(WirecallError),
}

pub(crate) type ErasedMethod =
    Arc<dyn Fn(&Codec, &[u8]) -> std::result::Result<Vec<u8>, MethodError> + Send + Sync>;

/// One callable method: an exported name plus the erased handler.
///
/// Built from a typed closure over a shared receiver. The reply container is
/// `R::default()`, so maps and vectors start empty but present.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use wirecall_server::Method;
///
/// struct Counter;
///
/// let counter = Arc::new(Counter);
/// let method = Method::new("Add", &counter, |_recv: &Counter, n: u64, reply: &mut u64| {
///     *reply = n + 1;
///     Ok(())
/// });
/// assert_eq!(method.name(), "Add");
/// ```
pub struct Method {
    name: String,
    func: ErasedMethod,
}

impl Method {
    pub fn new<S, A, R, F>(name: impl Into<String>, receiver: &Arc<S>, call: F) -> Self
    where
        S: Send + Sync + 'static,
        A: DeserializeOwned + 'static,
        R: Serialize + Default + 'static,
        F: Fn(&S, A, &mut R) -> std::result::Result<(), BoxError> + Send + Sync + 'static,
    {
        let receiver = Arc::clone(receiver);
        let func: ErasedMethod = Arc::new(move |codec, payload| {
            let args: A = codec.read_request_body(payload).map_err(MethodError::Body)?;
            let mut reply = R::default();
            call(&receiver, args, &mut reply).map_err(|e| MethodError::Handler(e.to_string()))?;
            codec.encode_payload(&reply).map_err(MethodError::Encode)
        });
        Method {
            name: name.into(),
            func,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A handler object exposing methods to remote callers.
///
/// `name` is the concrete type name; `methods` enumerates every candidate
/// method. Entries whose names are not exported are skipped at registration.
pub trait Service: Send + Sync + 'static {
    fn name(&self) -> &'static str;
    fn methods(self: Arc<Self>) -> Vec<Method>;
}

struct ServiceRecord {
    methods: HashMap<String, ErasedMethod>,
}

/// Result of a dispatch-time lookup.
pub(crate) enum Lookup {
    Found(ErasedMethod),
    NoService,
    NoMethod,
}

/// Mapping from service name to service record.
///
/// Written during registration, read concurrently during dispatch; the
/// read-write lock keeps `register_name`'s method-table mutation safe against
/// in-flight lookups.
#[derive(Default)]
pub struct Registry {
    services: RwLock<HashMap<String, ServiceRecord>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers every exported method of `service` under its type name.
    ///
    /// Fails if the service name is empty, not exported, or already defined.
    pub fn register<S: Service>(&self, service: S) -> Result<()> {
        let service = Arc::new(service);
        let name = service.name().to_string();
        validate_service_name(&name)?;

        let mut methods = HashMap::new();
        for method in Arc::clone(&service).methods() {
            if !is_exported(method.name()) {
                tracing::warn!(
                    service = %name,
                    method = %method.name(),
                    "rpc: method name is not exported; skipping"
                );
                continue;
            }
            methods.insert(method.name, method.func);
        }

        let mut services = write_lock(&self.services);
        if services.contains_key(&name) {
            return Err(WirecallError::Registration(format!(
                "rpc: service already defined: {name}"
            )));
        }
        services.insert(name, ServiceRecord { methods });
        Ok(())
    }

    /// Adds the one named method of `service`, creating the service record if
    /// it does not exist yet.
    pub fn register_name<S: Service>(&self, service: S, method_name: &str) -> Result<()> {
        let service = Arc::new(service);
        let name = service.name().to_string();

        let method = Arc::clone(&service)
            .methods()
            .into_iter()
            .find(|m| m.name() == method_name)
            .ok_or_else(|| {
                WirecallError::Registration(format!("rpc: no such method {name}.{method_name}"))
            })?;
        if !is_exported(method.name()) {
            return Err(WirecallError::Registration(format!(
                "rpc: method {method_name} is not exported"
            )));
        }

        let mut services = write_lock(&self.services);
        if let Some(record) = services.get_mut(&name) {
            record.methods.insert(method.name, method.func);
        } else {
            validate_service_name(&name)?;
            let mut methods = HashMap::new();
            methods.insert(method.name, method.func);
            services.insert(name, ServiceRecord { methods });
        }
        Ok(())
    }

    pub(crate) fn find(&self, service: &str, method: &str) -> Lookup {
        let services = match self.services.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match services.get(service) {
            None => Lookup::NoService,
            Some(record) => match record.methods.get(method) {
                Some(func) => Lookup::Found(Arc::clone(func)),
                None => Lookup::NoMethod,
            },
        }
    }

    /// Number of methods registered under `service`, if it exists.
    pub fn method_count(&self, service: &str) -> Option<usize> {
        let services = match self.services.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        services.get(service).map(|record| record.methods.len())
    }
}

fn write_lock(
    lock: &RwLock<HashMap<String, ServiceRecord>>,
) -> std::sync::RwLockWriteGuard<'_, HashMap<String, ServiceRecord>> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn validate_service_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(WirecallError::Registration("rpc: no service name".into()));
    }
    if !is_exported(name) {
        return Err(WirecallError::Registration(format!(
            "rpc: service {name} is not exported"
        )));
    }
    Ok(())
}

fn is_exported(name: &str) -> bool {
    name.chars().next().map(char::is_uppercase).unwrap_or(false)
}

//! Capability traits implemented by resource types, and the registration-time
//! `Endpoint` that advertises which of them a type supports.
//!
//! A resource type is its own wire format: what a GET echoes back is exactly
//! what a PUT or POST to the same URL accepts.
//!
//! ```ignore
//! let endpoint = Endpoint::<Widget>::default_allocated().readable().writable();
//! registry.register("/widget/", r"^(?P<id>[^/]+)/$", endpoint)?;
//! ```

use crate::error::AppError;
use crate::mapper::Mapper;
use crate::outcome::Outcome;
use crate::request::{Method, Request};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Capability {
    Read,
    Write,
    Create,
    Delete,
}

/// Fixed set of capabilities of one registration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Capabilities(u8);

impl Capabilities {
    fn bit(cap: Capability) -> u8 {
        match cap {
            Capability::Read => 1,
            Capability::Write => 2,
            Capability::Create => 4,
            Capability::Delete => 8,
        }
    }

    pub fn with(self, cap: Capability) -> Self {
        Capabilities(self.0 | Self::bit(cap))
    }

    pub fn contains(self, cap: Capability) -> bool {
        self.0 & Self::bit(cap) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// GET and HEAD. Fill `self` from the store.
#[async_trait]
pub trait Readable {
    async fn read(&mut self, request: &Request, mapper: &Mapper) -> Result<Outcome, AppError>;
}

/// PUT. Overwrite the object at the request path with `self`.
#[async_trait]
pub trait Writable {
    async fn write(&mut self, request: &Request, mapper: &Mapper) -> Result<Outcome, AppError>;
}

/// POST. Store `self`, possibly assigning it an id.
#[async_trait]
pub trait Creatable {
    async fn create(&mut self, request: &Request, mapper: &Mapper) -> Result<Outcome, AppError>;
}

/// DELETE. Should be safe to repeat on an already-deleted object.
#[async_trait]
pub trait Deletable {
    async fn delete(&mut self, request: &Request, mapper: &Mapper) -> Result<Outcome, AppError>;
}

/// Anything that can be decoded from a request body and echoed back as JSON.
pub trait Resource: Serialize + DeserializeOwned + Send + 'static {}

impl<T> Resource for T where T: Serialize + DeserializeOwned + Send + 'static {}

type Invoker<T> = for<'a> fn(&'a mut T, &'a Request, &'a Mapper) -> BoxFuture<'a, Result<Outcome, AppError>>;

fn invoke_read<'a, T: Readable>(r: &'a mut T, q: &'a Request, m: &'a Mapper) -> BoxFuture<'a, Result<Outcome, AppError>> {
    r.read(q, m)
}

fn invoke_write<'a, T: Writable>(r: &'a mut T, q: &'a Request, m: &'a Mapper) -> BoxFuture<'a, Result<Outcome, AppError>> {
    r.write(q, m)
}

fn invoke_create<'a, T: Creatable>(r: &'a mut T, q: &'a Request, m: &'a Mapper) -> BoxFuture<'a, Result<Outcome, AppError>> {
    r.create(q, m)
}

fn invoke_delete<'a, T: Deletable>(r: &'a mut T, q: &'a Request, m: &'a Mapper) -> BoxFuture<'a, Result<Outcome, AppError>> {
    r.delete(q, m)
}

/// Result of running one request against a handler.
#[derive(Debug, Default)]
pub struct Handled {
    pub outcome: Outcome,
    /// The resource instance after the call, for verbs that echo it.
    pub data: Option<serde_json::Value>,
}

impl Handled {
    fn outcome(outcome: Outcome) -> Self {
        Handled { outcome, data: None }
    }
}

/// Type-erased endpoint, stored by the router.
#[async_trait]
pub trait Handler: Send + Sync {
    fn capabilities(&self) -> Capabilities;

    /// Name of the resource type, for logs.
    fn type_name(&self) -> &'static str;

    async fn handle(&self, method: Method, body: &[u8], request: &Request, mapper: &Mapper) -> Handled;
}

/// Allocator plus the capabilities advertised for `T`.
pub struct Endpoint<T> {
    allocator: Arc<dyn Fn() -> T + Send + Sync>,
    read: Option<Invoker<T>>,
    write: Option<Invoker<T>>,
    create: Option<Invoker<T>>,
    delete: Option<Invoker<T>>,
}

impl<T: Resource> Endpoint<T> {
    /// `allocator` produces the fresh instance every request starts from.
    pub fn new(allocator: impl Fn() -> T + Send + Sync + 'static) -> Self {
        Endpoint {
            allocator: Arc::new(allocator),
            read: None,
            write: None,
            create: None,
            delete: None,
        }
    }

    pub fn default_allocated() -> Self
    where
        T: Default,
    {
        Self::new(T::default)
    }

    pub fn readable(mut self) -> Self
    where
        T: Readable,
    {
        self.read = Some(invoke_read::<T>);
        self
    }

    pub fn writable(mut self) -> Self
    where
        T: Writable,
    {
        self.write = Some(invoke_write::<T>);
        self
    }

    pub fn creatable(mut self) -> Self
    where
        T: Creatable,
    {
        self.create = Some(invoke_create::<T>);
        self
    }

    pub fn deletable(mut self) -> Self
    where
        T: Deletable,
    {
        self.delete = Some(invoke_delete::<T>);
        self
    }

    fn invoker(&self, cap: Capability) -> Option<Invoker<T>> {
        match cap {
            Capability::Read => self.read,
            Capability::Write => self.write,
            Capability::Create => self.create,
            Capability::Delete => self.delete,
        }
    }
}

#[async_trait]
impl<T: Resource> Handler for Endpoint<T> {
    fn capabilities(&self) -> Capabilities {
        [
            (self.read.is_some(), Capability::Read),
            (self.write.is_some(), Capability::Write),
            (self.create.is_some(), Capability::Create),
            (self.delete.is_some(), Capability::Delete),
        ]
        .into_iter()
        .filter(|(set, _)| *set)
        .fold(Capabilities::default(), |caps, (_, cap)| caps.with(cap))
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    async fn handle(&self, method: Method, body: &[u8], request: &Request, mapper: &Mapper) -> Handled {
        if method == Method::Options {
            return Handled::default();
        }
        let Some(invoke) = method.required_capability().and_then(|cap| self.invoker(cap)) else {
            return Handled::outcome(Outcome::method_not_allowed());
        };

        let mut item = (self.allocator)();
        if method.decodes_body() && !body.is_empty() {
            item = match serde_json::from_slice::<T>(body) {
                Ok(decoded) => decoded,
                Err(e) => {
                    tracing::trace!(error = %e, "failed to decode body for endpoint");
                    return Handled::outcome(Outcome::bad_request("malformed data for endpoint"));
                }
            };
        }

        let mut outcome = match invoke(&mut item, request, mapper).await {
            Ok(outcome) => outcome,
            Err(e) => Outcome::failed(e),
        };

        let data = if method.echoes_data() {
            match serde_json::to_value(&item) {
                Ok(value) => Some(value),
                Err(e) => {
                    outcome.error = Some(e.into());
                    None
                }
            }
        } else {
            None
        };
        Handled { outcome, data }
    }
}

//! The asynchronous boundary between the compiler and a server.
//!
//! A transport posts one statement and yields exactly one outcome. Dropping
//! the returned future cancels the request; there are no partial results.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::trace;

use crate::error::{MdxError, MdxResult};
use crate::response::Response;

/// Sends a compiled statement and returns the decoded cellset.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, statement: &str) -> MdxResult<Response>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn post(&self, statement: &str) -> MdxResult<Response> {
        (**self).post(statement).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn post(&self, statement: &str) -> MdxResult<Response> {
        (**self).post(statement).await
    }
}

type StatementFn = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;
type ResponseFn = Box<dyn Fn(Response) -> MdxResult<Response> + Send + Sync>;
type ErrorFn = Box<dyn Fn(MdxError) -> MdxError + Send + Sync>;

/// Decorates a transport with statement, response and error hooks.
pub struct ProxyTransport<T> {
    inner: T,
    statement: Option<StatementFn>,
    response: Option<ResponseFn>,
    error: Option<ErrorFn>,
}

impl<T: Transport> ProxyTransport<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            statement: None,
            response: None,
            error: None,
        }
    }

    /// Called with every outgoing statement. Returning `Some` replaces it.
    pub fn intercept_statement<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.statement = Some(Box::new(f));
        self
    }

    pub fn map_response<F>(mut self, f: F) -> Self
    where
        F: Fn(Response) -> MdxResult<Response> + Send + Sync + 'static,
    {
        self.response = Some(Box::new(f));
        self
    }

    pub fn map_error<F>(mut self, f: F) -> Self
    where
        F: Fn(MdxError) -> MdxError + Send + Sync + 'static,
    {
        self.error = Some(Box::new(f));
        self
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

#[async_trait]
impl<T: Transport> Transport for ProxyTransport<T> {
    async fn post(&self, statement: &str) -> MdxResult<Response> {
        let rewritten = self.statement.as_ref().and_then(|f| f(statement));
        if rewritten.is_some() {
            trace!("Statement rewritten by proxy");
        }
        let statement = rewritten.as_deref().unwrap_or(statement);

        let outcome = match self.inner.post(statement).await {
            Ok(response) => match &self.response {
                Some(f) => f(response),
                None => Ok(response),
            },
            Err(err) => Err(err),
        };

        match (outcome, &self.error) {
            (Err(err), Some(f)) => Err(f(err)),
            (outcome, _) => outcome,
        }
    }
}

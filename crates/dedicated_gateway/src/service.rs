// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! [`layered::Service`] integration.

use gateway_store::{BackingStore, Result};
use layered::Service;

use crate::{GatewayDispatcher, Operation, RequestOptions, Response};

/// An operation together with its request options.
///
/// The input of the [`Service`] implementation of [`GatewayDispatcher`],
/// which lets a gateway be composed with middleware such as retries or
/// timeouts.
///
/// # Examples
///
/// ```
/// use dedicated_gateway::{GatewayDispatcher, GatewayRequest, Operation};
/// use gateway_store::{InMemoryStore, Payload};
/// use layered::Service;
/// use tick::Clock;
/// # futures::executor::block_on(async {
///
/// let gateway = GatewayDispatcher::builder(InMemoryStore::new(), Clock::new_frozen()).build();
///
/// let request = GatewayRequest::new(Operation::create("doc", "doc", Payload::new()));
/// let response = gateway.execute(request).await?;
/// assert_eq!(response.item().map(|item| item.version()), Some(1));
/// # Ok::<(), gateway_store::Error>(())
/// # });
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GatewayRequest {
    /// The operation to dispatch.
    pub operation: Operation,
    /// Per-request options.
    pub options: RequestOptions,
}

impl GatewayRequest {
    /// Creates a request with default options.
    #[must_use]
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            options: RequestOptions::default(),
        }
    }

    /// Replaces the request options.
    #[must_use]
    pub fn with_options(self, options: RequestOptions) -> Self {
        Self { options, ..self }
    }
}

impl From<Operation> for GatewayRequest {
    fn from(operation: Operation) -> Self {
        Self::new(operation)
    }
}

impl<S> Service<GatewayRequest> for GatewayDispatcher<S>
where
    S: BackingStore,
{
    type Out = Result<Response>;

    async fn execute(&self, input: GatewayRequest) -> Self::Out {
        self.dispatch(input.operation, &input.options).await
    }
}

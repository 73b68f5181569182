// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#[cfg(any(feature = "metrics", test))]
pub(crate) const GATEWAY_NAME: &str = "gateway.name";

#[cfg(test)]
pub(crate) const GATEWAY_EVENT_NAME: &str = "gateway.event";

#[cfg(any(feature = "metrics", test))]
pub(crate) const GATEWAY_OPERATION_NAME: &str = "gateway.operation";

#[cfg(any(feature = "metrics", test))]
pub(crate) const GATEWAY_ACTIVITY_NAME: &str = "gateway.activity";

#[cfg(any(feature = "metrics", test))]
pub(crate) const GATEWAY_SERVED_FROM_NAME: &str = "gateway.served_from";

#[cfg(test)]
pub(crate) const GATEWAY_REQUEST_CHARGE_NAME: &str = "gateway.request_charge";

#[cfg(test)]
pub(crate) const GATEWAY_DURATION_NAME: &str = "gateway.duration_ns";

#[cfg(test)]
pub(crate) const GATEWAY_ERROR_KIND_NAME: &str = "gateway.error_kind";

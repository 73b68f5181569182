// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Gateway telemetry.
//!
//! Every dispatch emits one `gateway.event` through `tracing` when logging is
//! enabled, and updates OpenTelemetry instruments when a meter is configured
//! (`metrics` feature).

use std::time::Duration;

use gateway_store::{ErrorKind, RequestCharge};
#[cfg(any(feature = "metrics", test))]
use opentelemetry::{
    KeyValue,
    metrics::{Counter, Histogram, Meter},
};
use tracing::Level;

use crate::{OperationKind, ServedFrom};

pub(crate) mod attributes;
#[cfg(any(feature = "metrics", test))]
pub(crate) mod metrics;
#[cfg(test)]
pub(crate) mod testing;

/// What happened during a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GatewayActivity {
    Hit,
    Miss,
    PartialHit,
    Bypass,
    Written,
    Invalidated,
    Error,
}

impl GatewayActivity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "gateway.hit",
            Self::Miss => "gateway.miss",
            Self::PartialHit => "gateway.partial_hit",
            Self::Bypass => "gateway.bypass",
            Self::Written => "gateway.written",
            Self::Invalidated => "gateway.invalidated",
            Self::Error => "gateway.error",
        }
    }

    pub fn level(self) -> Level {
        match self {
            Self::Hit | Self::Miss | Self::PartialHit | Self::Bypass => Level::DEBUG,
            Self::Written | Self::Invalidated => Level::INFO,
            Self::Error => Level::ERROR,
        }
    }
}

/// One telemetry record.
#[derive(Debug, Clone, Copy)]
pub(crate) struct GatewayEvent {
    pub operation: OperationKind,
    pub activity: GatewayActivity,
    pub served_from: Option<ServedFrom>,
    pub charge: Option<RequestCharge>,
    pub duration: Option<Duration>,
    pub error_kind: Option<ErrorKind>,
}

impl GatewayEvent {
    pub fn new(operation: OperationKind, activity: GatewayActivity) -> Self {
        Self {
            operation,
            activity,
            served_from: None,
            charge: None,
            duration: None,
            error_kind: None,
        }
    }
}

#[cfg(any(feature = "metrics", test))]
#[derive(Clone, Debug)]
struct GatewayInstruments {
    event_counter: Counter<u64>,
    request_charge: Counter<f64>,
    operation_duration: Histogram<f64>,
}

#[cfg(any(feature = "metrics", test))]
impl GatewayInstruments {
    fn new(meter: &Meter) -> Self {
        Self {
            event_counter: metrics::create_event_counter(meter),
            request_charge: metrics::create_request_charge_counter(meter),
            operation_duration: metrics::create_operation_duration_histogram(meter),
        }
    }

    fn record(&self, name: &'static str, event: &GatewayEvent) {
        let mut attrs = vec![
            KeyValue::new(attributes::GATEWAY_NAME, name),
            KeyValue::new(attributes::GATEWAY_OPERATION_NAME, event.operation.as_str()),
            KeyValue::new(attributes::GATEWAY_ACTIVITY_NAME, event.activity.as_str()),
        ];
        if let Some(served_from) = event.served_from {
            attrs.push(KeyValue::new(attributes::GATEWAY_SERVED_FROM_NAME, served_from.as_str()));
        }

        self.event_counter.add(1, &attrs);
        if let Some(charge) = event.charge {
            self.request_charge.add(charge.units(), &attrs);
        }
        if let Some(duration) = event.duration {
            self.operation_duration.record(duration.as_secs_f64(), &attrs);
        }
    }
}

/// Records gateway events to logs and metrics.
#[derive(Clone, Debug, Default)]
pub(crate) struct GatewayTelemetry {
    logging_enabled: bool,
    #[cfg(any(feature = "metrics", test))]
    instruments: Option<GatewayInstruments>,
}

impl GatewayTelemetry {
    #[cfg(any(feature = "metrics", test))]
    pub fn new(logging_enabled: bool, meter: Option<&Meter>) -> Self {
        Self {
            logging_enabled,
            instruments: meter.map(GatewayInstruments::new),
        }
    }

    #[cfg(not(any(feature = "metrics", test)))]
    pub fn new(logging_enabled: bool) -> Self {
        Self { logging_enabled }
    }

    pub fn record(&self, name: &'static str, event: &GatewayEvent) {
        #[cfg(any(feature = "metrics", test))]
        if let Some(instruments) = &self.instruments {
            instruments.record(name, event);
        }

        if self.logging_enabled {
            Self::emit(name, event);
        }
    }

    fn emit(name: &'static str, event: &GatewayEvent) {
        let operation = event.operation.as_str();
        let activity = event.activity.as_str();
        let served_from = event.served_from.map(ServedFrom::as_str);
        let request_charge = event.charge.map(RequestCharge::units);
        let duration_ns = event.duration.map(|d| d.as_nanos());
        let error_kind = event.error_kind.map(ErrorKind::as_str);

        // Field names must match the constants in attributes.rs.
        macro_rules! emit_event {
            ($level:ident) => {
                tracing::$level!(
                    gateway.name = name,
                    gateway.operation = operation,
                    gateway.activity = activity,
                    gateway.served_from = ?served_from,
                    gateway.request_charge = ?request_charge,
                    gateway.duration_ns = ?duration_ns,
                    gateway.error_kind = ?error_kind,
                    "gateway.event"
                )
            };
        }

        match event.activity.level() {
            Level::ERROR => emit_event!(error),
            Level::INFO => emit_event!(info),
            _ => emit_event!(debug),
        }
    }
}

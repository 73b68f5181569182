// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use opentelemetry::{
    InstrumentationScope,
    metrics::{Counter, Histogram, Meter, MeterProvider},
};

const METER_NAME: &str = "dedicated_gateway";
const VERSION: &str = "v0.1.0";
const SCHEMA_URL: &str = "https://opentelemetry.io/schemas/1.47.0";
const GATEWAY_EVENT_COUNT_NAME: &str = "gateway.event.count";
const GATEWAY_REQUEST_CHARGE_NAME: &str = "gateway.request_charge";
const GATEWAY_OPERATION_DURATION_NAME: &str = "gateway.operation.duration";

pub(crate) fn create_meter(meter_provider: &dyn MeterProvider) -> Meter {
    meter_provider.meter_with_scope(
        InstrumentationScope::builder(METER_NAME)
            .with_version(VERSION)
            .with_schema_url(SCHEMA_URL)
            .build(),
    )
}

pub(crate) fn create_event_counter(meter: &Meter) -> Counter<u64> {
    meter
        .u64_counter(GATEWAY_EVENT_COUNT_NAME)
        .with_description("Gateway events")
        .with_unit("{event}")
        .build()
}

pub(crate) fn create_request_charge_counter(meter: &Meter) -> Counter<f64> {
    meter
        .f64_counter(GATEWAY_REQUEST_CHARGE_NAME)
        .with_description("Request units charged by dispatched operations")
        .with_unit("{request_unit}")
        .build()
}

pub(crate) fn create_operation_duration_histogram(meter: &Meter) -> Histogram<f64> {
    meter
        .f64_histogram(GATEWAY_OPERATION_DURATION_NAME)
        .with_description("Gateway dispatch duration")
        .with_unit("s")
        .build()
}

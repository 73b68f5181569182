// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integrated Cache Demo
//!
//! Runs a scripted sequence of writes, point reads, queries and batched reads
//! through a gateway and prints the request charge of every call, showing how
//! the integrated cache lowers the cost of repeated reads.
//!
//! Settings are read from the environment:
//!
//! - `GATEWAY_DEMO_DATABASE` (default `demo`)
//! - `GATEWAY_DEMO_CONTAINER` (default `items`)
//! - `GATEWAY_DEMO_STALENESS_SECS` (default `5`)
//!
//! Set `RUST_LOG=dedicated_gateway=debug` to see the gateway events.

use std::time::Duration;

use dedicated_gateway::{GatewayDispatcher, Operation, RequestOptions};
use gateway_store::{ConsistencyLevel, InMemoryStore, ItemIdentity, Payload, Result};
use tick::Clock;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

type Gateway = GatewayDispatcher<InMemoryStore>;

const QUERY_TEXT: &str = "SELECT * FROM c";

struct DemoSettings {
    database: String,
    container: String,
    staleness_secs: f64,
}

impl DemoSettings {
    fn from_env() -> Self {
        Self {
            database: std::env::var("GATEWAY_DEMO_DATABASE").unwrap_or_else(|_| "demo".to_string()),
            container: std::env::var("GATEWAY_DEMO_CONTAINER").unwrap_or_else(|_| "items".to_string()),
            staleness_secs: std::env::var("GATEWAY_DEMO_STALENESS_SECS")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or(5.0),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = DemoSettings::from_env();
    let clock = Clock::new_tokio();
    let gateway = GatewayDispatcher::builder(InMemoryStore::new(), clock.clone())
        .name("integrated_cache_demo")
        .logs()
        .build();

    println!("Integrated Cache Demo ({}/{})\n", settings.database, settings.container);

    let doc_id = uuid::Uuid::new_v4().to_string();

    println!("\nSample write: ");
    write_item(&gateway, &doc_id).await?;

    println!("\nTest item cache: ");
    test_item_cache(&gateway, &doc_id).await?;

    println!("\nTest query cache: ");
    test_query_cache(&gateway, false).await?;
    test_query_cache(&gateway, false).await?;

    println!("\nTest bypassing query cache: ");
    test_query_cache(&gateway, true).await?;

    println!("\nTest ReadMany: ");
    let mut doc_ids = vec![uuid::Uuid::new_v4().to_string(), uuid::Uuid::new_v4().to_string()];
    test_read_many(&gateway, &doc_ids, true).await?;
    test_read_many(&gateway, &doc_ids, false).await?;
    doc_ids.push(doc_id.clone());
    test_read_many(&gateway, &doc_ids, false).await?;
    test_read_many(&gateway, &doc_ids, false).await?;

    println!("\nTest Update then ReadMany: ");
    update_item(&gateway, &doc_id).await?;
    test_read_many(&gateway, &doc_ids, false).await?;
    test_read_many(&gateway, &doc_ids, false).await?;

    println!("\nTest cache staleness: ");
    test_cache_staleness(&gateway, &clock, &doc_id, settings.staleness_secs).await?;

    let summary = gateway.accounting().summary();
    println!(
        "\n{} operations, {} served from cache, {} from store, total {:.2} RU/s",
        summary.operations,
        summary.served_from_cache,
        summary.served_from_store,
        summary.total.units()
    );

    Ok(())
}

async fn write_item(gateway: &Gateway, doc_id: &str) -> Result<()> {
    let options = RequestOptions::new().with_consistency(ConsistencyLevel::Session);
    let response = gateway
        .dispatch(Operation::create(doc_id, doc_id, Payload::new()), &options)
        .await?;
    println!(
        "Write item request charge for document id {doc_id}:\t{:.2} RU/s\n",
        response.request_charge().units()
    );
    Ok(())
}

async fn update_item(gateway: &Gateway, doc_id: &str) -> Result<()> {
    let mut payload = Payload::new();
    payload.insert("update", true);

    let response = gateway
        .dispatch(Operation::replace(ItemIdentity::new(doc_id, doc_id), payload), &RequestOptions::new())
        .await?;
    println!(
        "Update item request charge for document id {doc_id}:\t{:.2} RU/s",
        response.request_charge().units()
    );
    if let Some(item) = response.item() {
        println!("Updated item:\t{item}\n");
    }
    Ok(())
}

async fn test_item_cache(gateway: &Gateway, doc_id: &str) -> Result<()> {
    let options = RequestOptions::new().with_consistency(ConsistencyLevel::Session);

    for attempt in 1..=2 {
        let response = gateway.dispatch(Operation::point_read(doc_id, doc_id), &options).await?;
        println!(
            "Point read {attempt} request charge for document id {doc_id}:\t{:.2} RU/s",
            response.request_charge().units()
        );
    }
    println!();
    Ok(())
}

async fn test_query_cache(gateway: &Gateway, bypass_cache: bool) -> Result<()> {
    let options = RequestOptions::new()
        .with_consistency(ConsistencyLevel::Eventual)
        .with_bypass_cache(bypass_cache);

    let response = gateway.dispatch(Operation::query(QUERY_TEXT), &options).await?;

    // A cached query has no store pages; report it as one page.
    if response.page_charges().is_empty() {
        println!("Query request charge:\t\t{:.2} RU/s", response.request_charge().units());
    }
    for charge in response.page_charges() {
        println!("Query request charge:\t\t{:.2} RU/s", charge.units());
    }
    println!("Total query request charge:\t{:.2} RU/s\n", response.request_charge().units());
    Ok(())
}

async fn test_read_many(gateway: &Gateway, doc_ids: &[String], create_docs: bool) -> Result<()> {
    let mut identities = Vec::with_capacity(doc_ids.len());
    for id in doc_ids {
        if create_docs {
            let response = gateway
                .dispatch(Operation::create(id.as_str(), id.as_str(), Payload::new()), &RequestOptions::new())
                .await?;
            println!(
                "Write item request charge for document id {id}:\t{:.2} RU/s",
                response.request_charge().units()
            );
        }
        identities.push(ItemIdentity::new(id.as_str(), id.as_str()));
    }

    let response = gateway
        .dispatch(Operation::read_many(identities), &RequestOptions::new())
        .await?;
    println!("Read many request charge:\t{:.2} RU/s", response.request_charge().units());
    for item in response.items() {
        println!("Read many item: {item}");
    }
    println!();
    Ok(())
}

async fn test_cache_staleness(gateway: &Gateway, clock: &Clock, doc_id: &str, staleness_secs: f64) -> Result<()> {
    let options = RequestOptions::new()
        .with_consistency(ConsistencyLevel::Session)
        .with_max_staleness_secs(staleness_secs)?;
    let staleness = options.max_staleness().unwrap_or(Duration::ZERO);

    for attempt in 1..=2 {
        let response = gateway.dispatch(Operation::point_read(doc_id, doc_id), &options).await?;
        println!(
            "Point read {attempt} request charge for document id {doc_id}:\t{:.2} RU/s",
            response.request_charge().units()
        );
    }
    println!();

    println!("Waiting {staleness_secs} seconds for the cache to expire...\n");
    clock.delay(staleness).await;

    for attempt in 3..=4 {
        let response = gateway.dispatch(Operation::point_read(doc_id, doc_id), &options).await?;
        println!(
            "Point read {attempt} request charge for document id {doc_id}:\t{:.2} RU/s",
            response.request_charge().units()
        );
    }
    println!();
    Ok(())
}

use std::path::Path;

use anyhow::Context;
use specdex_core::Services;
use specdex_core::config::Config;
use specdex_index::loader::{load_markdown, load_spec, source_id};
use specdex_index::{IngestReport, QueryResponse, TokenCounter, format_results};
use specdex_memory::VectorStore;

const DEMO_COLLECTION: &str = "demo";

pub async fn ingest_spec(
    config: Config,
    file: &Path,
    collection: &str,
    source: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let services = Services::build(config)?;
    let report = ingest_spec_with(&services, file, collection, source).await?;
    print_report(&report, json)
}

pub async fn ingest_markdown(
    config: Config,
    file: &Path,
    collection: &str,
    source: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let services = Services::build(config)?;
    let doc = load_markdown(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    let source = source.unwrap_or_else(|| source_id(file));
    let report = services
        .indexer()
        .ingest_markdown(collection, &source, &doc)
        .await?;
    print_report(&report, json)
}

pub async fn query(
    config: Config,
    text: &str,
    collection: &str,
    limit: usize,
    endpoint_first: bool,
    json: bool,
) -> anyhow::Result<()> {
    let services = Services::build(config)?;
    let response = run_query(&services, text, collection, limit, endpoint_first).await;
    print_response(&response, json)
}

pub async fn list_collections(config: Config, json: bool) -> anyhow::Result<()> {
    let services = Services::build(config)?;
    let mut names = services.store.list_collections().await?;
    names.sort();
    if json {
        println!("{}", serde_json::to_string_pretty(&names)?);
    } else if names.is_empty() {
        println!("no collections");
    } else {
        for name in names {
            let points = services.store.count(&name).await?;
            println!("{name}\t{points}");
        }
    }
    Ok(())
}

pub async fn delete_collection(config: Config, name: &str, json: bool) -> anyhow::Result<()> {
    let services = Services::build(config)?;
    services
        .store
        .delete_collection(name)
        .await
        .with_context(|| format!("failed to delete collection {name}"))?;
    if json {
        println!("{}", serde_json::json!({ "deleted": name }));
    } else {
        println!("deleted {name}");
    }
    Ok(())
}

pub fn count(text: &str, json: bool) -> anyhow::Result<()> {
    let tokens = TokenCounter::new()?.count(text);
    if json {
        println!("{}", serde_json::json!({ "tokens": tokens }));
    } else {
        println!("{tokens}");
    }
    Ok(())
}

pub async fn demo(
    config: Config,
    file: &Path,
    text: &str,
    limit: usize,
    endpoint_first: bool,
    json: bool,
) -> anyhow::Result<()> {
    let services = Services::build(config)?;
    let report = ingest_spec_with(&services, file, DEMO_COLLECTION, None).await?;
    if !json {
        print_report(&report, false)?;
    }
    let response = run_query(&services, text, DEMO_COLLECTION, limit, endpoint_first).await;
    print_response(&response, json)
}

async fn ingest_spec_with(
    services: &Services,
    file: &Path,
    collection: &str,
    source: Option<String>,
) -> anyhow::Result<IngestReport> {
    let spec = load_spec(file)
        .await
        .with_context(|| format!("failed to load {}", file.display()))?;
    let source = source.unwrap_or_else(|| source_id(file));
    Ok(services
        .indexer()
        .ingest_spec(collection, &source, &spec)
        .await?)
}

async fn run_query(
    services: &Services,
    text: &str,
    collection: &str,
    limit: usize,
    endpoint_first: bool,
) -> QueryResponse {
    let engine = services.query_engine();
    if endpoint_first {
        engine.endpoint_first_query(text, collection, limit).await
    } else {
        engine.enhanced_query(text, collection, limit).await
    }
}

fn print_report(report: &IngestReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        println!(
            "ingested {} chunks into {} ({} batches, {} skipped nodes)",
            report.chunks, report.collection, report.batches, report.skipped
        );
    }
    Ok(())
}

fn print_response(response: &QueryResponse, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(response)?);
        return Ok(());
    }
    if let Some(note) = &response.note {
        eprintln!("note: {note}");
    }
    if response.results.is_empty() {
        println!("no results");
    } else {
        print!("{}", format_results(&response.results));
    }
    Ok(())
}

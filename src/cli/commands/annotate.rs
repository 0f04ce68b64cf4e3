//! Local annotation of a payload file, without the HTTP server.

use std::io::Read;

use anyhow::Context;
use console::style;

use crate::config::Settings;
use crate::models::{parse_bulk, parse_single};
use crate::services::Processor;

/// Annotate a single or bulk payload and print the JSON response.
pub async fn cmd_annotate(settings: &Settings, input: &str, bulk: bool) -> anyhow::Result<()> {
    let payload = read_payload(input).await?;
    let processor = Processor::from_settings(settings)?;

    let result = if bulk {
        let documents = parse_bulk(&payload)?;
        eprintln!(
            "{} Annotating {} documents",
            style("→").cyan(),
            documents.len()
        );
        serde_json::to_value(processor.process_bulk(documents).await)?
    } else {
        let document = parse_single(&payload)?;
        serde_json::to_value(processor.process_one(document).await?)?
    };

    let response = serde_json::json!({
        "result": result,
        "service_info": processor.app_info(),
    });
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

async fn read_payload(input: &str) -> anyhow::Result<Vec<u8>> {
    if input == "-" {
        let mut buffer = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buffer)
            .context("Failed to read payload from stdin")?;
        return Ok(buffer);
    }

    tokio::fs::read(input)
        .await
        .with_context(|| format!("Failed to read payload file {}", input))
}

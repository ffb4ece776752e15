//! Record command handlers

use anyhow::{Context, Result, bail};
use colored::*;
use serde_json::{Map, Value, json};

use super::{CreateArgs, DeleteArgs, GetArgs, ListArgs, SearchArgs, UpdateArgs};
use crate::cli::commands::print_json;
use hellohi_cli::api::{Entity, Page};

pub async fn handle_get(args: GetArgs) -> Result<()> {
    let session = crate::client_manager().session()?;

    let entity = Entity::fetch_by_id(&session, &args.endpoint, &args.id, &args.include)
        .await
        .with_context(|| format!("Failed to fetch {}/{}", args.endpoint, args.id))?;

    match entity {
        Some(entity) => print_json(&entity),
        None => bail!("{}/{} did not return a record", args.endpoint, args.id),
    }
}

pub async fn handle_list(args: ListArgs) -> Result<()> {
    let session = crate::client_manager().session()?;

    let page = Entity::fetch_all(&session, &args.endpoint, &args.page.to_query())
        .await
        .with_context(|| format!("Failed to list {}", args.endpoint))?;

    print_json(&page)?;
    print_page_status(&page);
    Ok(())
}

pub async fn handle_search(args: SearchArgs) -> Result<()> {
    let session = crate::client_manager().session()?;

    let page = Entity::search(&session, &args.endpoint, &args.params, &args.page.to_query())
        .await
        .with_context(|| format!("Failed to search {}", args.endpoint))?;

    print_json(&page)?;
    print_page_status(&page);
    Ok(())
}

pub async fn handle_create(args: CreateArgs) -> Result<()> {
    let session = crate::client_manager().session()?;
    let data = parse_object(&args.json)?;

    let created = Entity::create(&session, &args.endpoint, &data, &[])
        .await
        .with_context(|| format!("Failed to create {}", args.endpoint))?;

    match created {
        Some(entity) => {
            print_json(&entity)?;
            eprintln!(
                "{} Created {} {}",
                "✓".green(),
                args.endpoint,
                entity.id().unwrap_or_default().bold()
            );
        }
        None => eprintln!(
            "{} {} accepted the request without returning a record",
            "!".yellow(),
            args.endpoint
        ),
    }
    Ok(())
}

pub async fn handle_update(args: UpdateArgs) -> Result<()> {
    let session = crate::client_manager().session()?;
    let data = parse_object(&args.json)?;

    let mut entity = local_entity(&args.endpoint, &args.id);
    entity
        .update(&session, &data, &[])
        .await
        .with_context(|| format!("Failed to update {}/{}", args.endpoint, args.id))?;

    print_json(&entity)?;
    eprintln!("{} Updated {}/{}", "✓".green(), args.endpoint, args.id);
    Ok(())
}

pub async fn handle_delete(args: DeleteArgs) -> Result<()> {
    let session = crate::client_manager().session()?;

    let response = local_entity(&args.endpoint, &args.id)
        .delete(&session)
        .await
        .with_context(|| format!("Failed to delete {}/{}", args.endpoint, args.id))?;

    if !response.is_null() {
        print_json(&response)?;
    }
    eprintln!("{} Deleted {}/{}", "✓".green(), args.endpoint, args.id);
    Ok(())
}

/// An entity that only knows its id, enough to address it remotely
fn local_entity(endpoint: &str, id: &str) -> Entity {
    let mut attributes = Map::new();
    attributes.insert("id".to_string(), json!(id));
    Entity::new(attributes, endpoint)
}

fn parse_object(input: &str) -> Result<Value> {
    let value: Value = serde_json::from_str(input).context("Attributes are not valid JSON")?;
    if !value.is_object() {
        bail!("Attributes must be a JSON object");
    }
    Ok(value)
}

fn print_page_status(page: &Page) {
    if page.is_paginated() {
        eprintln!(
            "{} Page {}/{} ({} of {} records)",
            "·".dimmed(),
            page.current_page(),
            page.last_page(),
            page.len(),
            page.total()
        );
    } else {
        eprintln!("{} {} records", "·".dimmed(), page.len());
    }
}

use crate::github::GraphqlRequest;
use anyhow::{Context, Result};
use serde_json::Value;

use super::CommandContext;
use super::utils::arg_or_stdin;

fn split_assignment(item: &str) -> Result<(&str, &str)> {
    match item.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name, value)),
        _ => anyhow::bail!("Expected name=value, got '{}'", item),
    }
}

/// `-F` values: JSON scalars when they parse, plain strings otherwise.
fn typed_value(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw) {
        Ok(v @ (Value::Number(_) | Value::Bool(_) | Value::Null)) => v,
        _ => Value::String(raw.to_string()),
    }
}

fn load_query(query: String) -> Result<String> {
    match query.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read query from {}", path)),
        None => arg_or_stdin(Some(query)),
    }
}

pub fn handle_graphql(
    ctx: &CommandContext,
    query: String,
    vars: Vec<String>,
    fields: Vec<String>,
) -> Result<()> {
    let mut request = GraphqlRequest::new(load_query(query)?);
    for item in &vars {
        let (name, value) = split_assignment(item)?;
        request = request.var(name, value);
    }
    for item in &fields {
        let (name, value) = split_assignment(item)?;
        request = request.var(name, typed_value(value));
    }

    let data = ctx.client()?.query(&request)?;
    println!("{}", serde_json::to_string_pretty(&data)?);
    Ok(())
}

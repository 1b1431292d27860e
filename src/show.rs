//! Node resolution and display.
//!
//! Backs the `vocab load`, `vocab parse`, `vocab list`, and `vocab random`
//! commands.

use anyhow::{bail, Result};
use serde::Serialize;

use vocab_core::{Archive, LoadRequest, Node, Registry};

use crate::config::Config;

/// JSON view of a node.
#[derive(Debug, Clone, Serialize)]
pub struct NodeResponse {
    pub uid: String,
    pub kind: String,
    pub namespace: String,
    pub canonical_name: String,
    pub raw_name: String,
    pub label: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub status: String,
    pub synonyms: Vec<String>,
    pub create_date: String, // ISO8601
    pub data: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idx: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub term_regex: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternative_name: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_virtual: bool,
    pub children: Vec<String>,
}

impl NodeResponse {
    pub fn from_node(archive: &Archive, node: &Node) -> Self {
        Self {
            uid: node.uid.to_string(),
            kind: node.kind().to_string(),
            namespace: archive.namespace(node),
            canonical_name: node.canonical_name.clone(),
            raw_name: node.raw_name.clone(),
            label: node.label.clone(),
            description: node.description.clone(),
            url: node.url.clone(),
            status: node.status.to_string(),
            synonyms: node.synonyms.clone(),
            create_date: node.create_date.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            data: serde_json::Value::Object(node.data.clone()),
            idx: node.idx(),
            term_regex: node.term_regex().map(|r| r.as_str().to_string()),
            alternative_name: node.alternative_name().map(str::to_string),
            is_virtual: node.is_virtual(),
            children: node
                .children()
                .iter()
                .filter_map(|c| archive.node(*c))
                .map(|c| c.canonical_name.clone())
                .collect(),
        }
    }
}

/// Resolves `segments` and returns the node view, or `None` if not found.
pub fn load_node(registry: &Registry, segments: &[String]) -> Result<Option<NodeResponse>> {
    let archive = registry.read();
    let request = LoadRequest::from_args(segments);
    let resolved = archive.load(&request)?;
    Ok(resolved.map(|node| NodeResponse::from_node(&archive, &node)))
}

/// CLI entry point for `vocab load`.
pub fn run_load(registry: &Registry, segments: &[String], json: bool) -> Result<()> {
    let Some(node) = load_node(registry, segments)? else {
        bail!("not found: {}", segments.join(" "));
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&node)?);
        return Ok(());
    }

    print_node(&node);
    Ok(())
}

fn print_node(node: &NodeResponse) {
    println!("--- {} ---", node.kind);
    println!("namespace:    {}", node.namespace);
    println!("uid:          {}", node.uid);
    println!("name:         {}", node.raw_name);
    println!("status:       {}", node.status);
    if let Some(ref label) = node.label {
        println!("label:        {}", label);
    }
    if let Some(ref description) = node.description {
        println!("description:  {}", description);
    }
    if let Some(ref url) = node.url {
        println!("url:          {}", url);
    }
    if let Some(idx) = node.idx {
        println!("idx:          {}", idx);
    }
    if let Some(ref alt) = node.alternative_name {
        println!("alt_name:     {}", alt);
    }
    if let Some(ref re) = node.term_regex {
        println!("term_regex:   {}", re);
    }
    if !node.synonyms.is_empty() {
        println!("synonyms:     {}", node.synonyms.join(", "));
    }
    println!("created:      {}", node.create_date);
    if node.is_virtual {
        println!("virtual:      true");
    }
    if node.data.as_object().is_some_and(|m| !m.is_empty()) {
        println!("data:         {}", node.data);
    }
    if !node.children.is_empty() {
        println!();
        println!("--- Children ({}) ---", node.children.len());
        for child in &node.children {
            println!("{}", child);
        }
    }
}

/// CLI entry point for `vocab parse`.
pub fn run_parse(
    registry: &Registry,
    config: &Config,
    segments: &[String],
    strict: Option<bool>,
) -> Result<()> {
    let strict = strict.unwrap_or(config.parse.strict);
    let name = registry
        .read()
        .parse(&LoadRequest::from_args(segments), strict)?;
    println!("{}", name);
    Ok(())
}

/// CLI entry point for `vocab list`: authorities, or the children of a node.
pub fn run_list(registry: &Registry, segments: &[String], json: bool) -> Result<()> {
    let archive = registry.read();

    let rows: Vec<&Node> = if segments.is_empty() {
        archive.authorities().collect()
    } else {
        let Some(resolved) = archive.load(&LoadRequest::from_args(segments))? else {
            bail!("not found: {}", segments.join(" "));
        };
        match resolved.id() {
            Some(id) => archive.children(id).collect(),
            None => Vec::new(),
        }
    };

    if json {
        let views: Vec<NodeResponse> = rows
            .into_iter()
            .map(|node| NodeResponse::from_node(&archive, node))
            .collect();
        println!("{}", serde_json::to_string_pretty(&views)?);
        return Ok(());
    }

    println!("{:<40} {:<12} {:<10} LABEL", "NAMESPACE", "KIND", "STATUS");
    for node in rows {
        println!(
            "{:<40} {:<12} {:<10} {}",
            archive.namespace(node),
            node.kind(),
            node.status,
            node.label.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

/// CLI entry point for `vocab random`.
pub fn run_random(registry: &Registry, namespace: &str) -> Result<()> {
    println!("{}", registry.get_random_term(namespace)?);
    Ok(())
}

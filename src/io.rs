//! File-backed persistence of vocabularies.
//!
//! Each authority is stored as a directory under the archive root:
//!
//! ```text
//! <dir>/
//!   wcrp/
//!     MANIFEST                    # authority, scopes, collections (JSON)
//!     cmip6/
//!       realm/
//!         ocnbgchem               # one JSON file per term
//!         atmos
//! ```
//!
//! Writing overwrites files by canonical path. Reading registers every node
//! through the core factories with its persisted uid, so loading a
//! directory that is already cached is a no-op.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use uuid::Uuid;
use walkdir::WalkDir;

use vocab_core::{Archive, NewNode, Node, NodeId, NodeKind, Registry, Status};

/// File name of the per-authority manifest.
pub const MANIFEST: &str = "MANIFEST";

/// Derives a data payload from a node at write time.
pub type DataTransform<'a> = &'a dyn Fn(&Node) -> Map<String, Value>;

// ═══════════════════════════════════════════════════════════════════════
// Records
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Serialize, Deserialize)]
struct NodeRecord {
    uid: Uuid,
    name: String,
    canonical_name: String,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    synonyms: Vec<String>,
    #[serde(default)]
    status: Status,
    create_date: DateTime<Utc>,
    #[serde(default)]
    data: Map<String, Value>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ManifestRecord {
    #[serde(flatten)]
    node: NodeRecord,
    #[serde(default)]
    scopes: Vec<ScopeRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ScopeRecord {
    #[serde(flatten)]
    node: NodeRecord,
    #[serde(default)]
    collections: Vec<CollectionRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CollectionRecord {
    #[serde(flatten)]
    node: NodeRecord,
    #[serde(default)]
    term_regex: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TermRecord {
    #[serde(flatten)]
    node: NodeRecord,
    idx: u32,
    #[serde(default)]
    alternative_name: Option<String>,
    #[serde(default)]
    alternative_url: Option<String>,
    #[serde(default)]
    associations: Vec<Uuid>,
}

impl NodeRecord {
    fn from_node(node: &Node, transform: Option<DataTransform<'_>>) -> Self {
        Self {
            uid: node.uid,
            name: node.raw_name.clone(),
            canonical_name: node.canonical_name.clone(),
            label: node.label.clone(),
            description: node.description.clone(),
            url: node.url.clone(),
            synonyms: node.synonyms.clone(),
            status: node.status,
            create_date: node.create_date,
            data: match transform {
                Some(f) => f(node),
                None => node.data.clone(),
            },
        }
    }

    fn into_spec(self) -> NewNode {
        NewNode {
            name: self.name,
            description: self.description,
            label: self.label,
            url: self.url,
            synonyms: self.synonyms,
            create_date: Some(self.create_date),
            uid: Some(self.uid),
            status: self.status,
            data: self.data,
            ..Default::default()
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Writing
// ═══════════════════════════════════════════════════════════════════════

/// Writes `node` and everything below it.
///
/// Authorities write their manifest and every term; scopes and collections
/// refresh the manifest and write the terms beneath them; terms write their
/// own file. Virtual terms are rejected.
pub fn write(archive: &Archive, node: &Node, dir: &Path) -> Result<usize> {
    write_with(archive, node, dir, None)
}

/// Like [`write`], deriving each node's data payload with `transform`.
pub fn write_with(
    archive: &Archive,
    node: &Node,
    dir: &Path,
    transform: Option<DataTransform<'_>>,
) -> Result<usize> {
    if node.is_virtual() {
        bail!("virtual term '{}' cannot be persisted", node.canonical_name);
    }
    let id = archive
        .id_of(node)
        .with_context(|| format!("node {} is not cached", node.uid))?;

    let hierarchy = archive.hierarchy(node);
    let authority = hierarchy[0];
    let authority_id = archive
        .id_of(authority)
        .with_context(|| format!("authority {} is not cached", authority.uid))?;

    let mut written = 0;
    if node.kind() != NodeKind::Term {
        write_manifest(archive, authority_id, dir, transform)?;
        written += 1;
    }

    for term_id in terms_under(archive, id) {
        if let Some(term) = archive.node(term_id) {
            write_term(archive, term, dir, transform)?;
            written += 1;
        }
    }

    tracing::debug!(
        namespace = %archive.namespace(node),
        files = written,
        "wrote vocabulary node"
    );
    Ok(written)
}

/// Writes every cached authority under a single read lock.
///
/// Returns the number of authorities written.
pub fn save(registry: &Registry, dir: &Path) -> Result<usize> {
    let archive = registry.read();
    let mut count = 0;
    for authority in archive.authorities() {
        write(&archive, authority, dir)?;
        count += 1;
    }
    tracing::info!(authorities = count, dir = %dir.display(), "saved archive");
    Ok(count)
}

fn terms_under(archive: &Archive, id: NodeId) -> Vec<NodeId> {
    let Some(node) = archive.node(id) else {
        return Vec::new();
    };
    if node.kind() == NodeKind::Term {
        return vec![id];
    }
    node.children()
        .iter()
        .flat_map(|child| terms_under(archive, *child))
        .collect()
}

fn write_manifest(
    archive: &Archive,
    authority_id: NodeId,
    dir: &Path,
    transform: Option<DataTransform<'_>>,
) -> Result<()> {
    let authority = archive
        .node(authority_id)
        .with_context(|| format!("unknown authority handle {}", authority_id.index()))?;

    let scopes = authority
        .children()
        .iter()
        .filter_map(|s| archive.node(*s))
        .map(|scope| ScopeRecord {
            node: NodeRecord::from_node(scope, transform),
            collections: scope
                .children()
                .iter()
                .filter_map(|c| archive.node(*c))
                .map(|collection| CollectionRecord {
                    node: NodeRecord::from_node(collection, transform),
                    term_regex: collection.term_regex().map(|r| r.as_str().to_string()),
                })
                .collect(),
        })
        .collect();

    let manifest = ManifestRecord {
        node: NodeRecord::from_node(authority, transform),
        scopes,
    };

    let path = node_path(archive, authority, dir)?.join(MANIFEST);
    write_json(&path, &manifest)
}

fn write_term(
    archive: &Archive,
    term: &Node,
    dir: &Path,
    transform: Option<DataTransform<'_>>,
) -> Result<()> {
    let Some(detail) = term.as_term() else {
        bail!("'{}' is not a term", term.canonical_name);
    };
    let record = TermRecord {
        node: NodeRecord::from_node(term, transform),
        idx: detail.idx,
        alternative_name: detail.alternative_name.clone(),
        alternative_url: detail.alternative_url.clone(),
        associations: detail.associations.clone(),
    };
    let path = node_path(archive, term, dir)?;
    write_json(&path, &record)
}

/// Filesystem path of a node: one component per canonical name.
fn node_path(archive: &Archive, node: &Node, dir: &Path) -> Result<PathBuf> {
    let mut path = dir.to_path_buf();
    for n in archive.hierarchy(node) {
        let name = n.canonical_name.as_str();
        if name.contains(['/', '\\']) || name == "." || name == ".." {
            bail!("'{}' cannot be used as a file name", name);
        }
        path.push(name);
    }
    Ok(path)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

// ═══════════════════════════════════════════════════════════════════════
// Reading
// ═══════════════════════════════════════════════════════════════════════

/// Loads every authority directory found under `dir` into `archive`.
///
/// Authorities are registered in directory-name order. A missing `dir`
/// loads nothing. Returns the number of authorities read.
pub fn read(archive: &mut Archive, dir: &Path) -> Result<usize> {
    if !dir.exists() {
        tracing::debug!(dir = %dir.display(), "archive directory does not exist");
        return Ok(0);
    }

    let mut authority_dirs: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read archive directory: {}", dir.display()))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.join(MANIFEST).is_file())
        .collect();
    authority_dirs.sort();

    for authority_dir in &authority_dirs {
        read_authority(archive, authority_dir)?;
    }

    tracing::info!(
        authorities = authority_dirs.len(),
        nodes = archive.len(),
        dir = %dir.display(),
        "loaded archive"
    );
    Ok(authority_dirs.len())
}

/// Loads the archive directory into a fresh [`Registry`].
pub fn load_registry(dir: &Path) -> Result<Registry> {
    let mut archive = Archive::new();
    read(&mut archive, dir)?;
    Ok(Registry::from_archive(archive))
}

fn read_authority(archive: &mut Archive, authority_dir: &Path) -> Result<NodeId> {
    let manifest_path = authority_dir.join(MANIFEST);
    let manifest: ManifestRecord = read_json(&manifest_path)?;

    let authority = archive
        .create_authority(manifest.node.into_spec())
        .with_context(|| format!("Invalid authority in {}", manifest_path.display()))?;

    let mut collections: Vec<(String, String, NodeId)> = Vec::new();
    for scope_record in manifest.scopes {
        let scope_name = scope_record.node.canonical_name.clone();
        let scope = archive
            .create_scope(authority, scope_record.node.into_spec())
            .with_context(|| format!("Invalid scope '{}' in {}", scope_name, manifest_path.display()))?;

        for collection_record in scope_record.collections {
            let collection_name = collection_record.node.canonical_name.clone();
            let spec = NewNode {
                term_regex: collection_record.term_regex,
                ..collection_record.node.into_spec()
            };
            let collection = archive.create_collection(scope, spec).with_context(|| {
                format!(
                    "Invalid collection '{}:{}' in {}",
                    scope_name,
                    collection_name,
                    manifest_path.display()
                )
            })?;
            collections.push((scope_name.clone(), collection_name, collection));
        }
    }

    let mut terms = read_terms(authority_dir)?;
    for (scope_name, collection_name, collection) in collections {
        let Some(mut records) = terms.remove(&(scope_name.clone(), collection_name.clone())) else {
            continue;
        };
        records.sort_by_key(|(_, r)| r.idx);
        for (path, record) in records {
            let spec = NewNode {
                idx: Some(record.idx),
                alternative_name: record.alternative_name,
                alternative_url: record.alternative_url,
                associations: record.associations,
                ..record.node.into_spec()
            };
            archive
                .create_term(collection, spec)
                .with_context(|| format!("Invalid term in {}", path.display()))?;
        }
    }

    for ((scope_name, collection_name), records) in terms {
        tracing::warn!(
            scope = %scope_name,
            collection = %collection_name,
            files = records.len(),
            "skipping terms of a collection missing from the manifest"
        );
    }

    Ok(authority)
}

type TermsByCollection = HashMap<(String, String), Vec<(PathBuf, TermRecord)>>;

fn read_terms(authority_dir: &Path) -> Result<TermsByCollection> {
    let mut out: TermsByCollection = HashMap::new();
    // No min_depth: filter_entry must see scope and collection directories
    // to prune hidden ones.
    for entry in WalkDir::new(authority_dir)
        .max_depth(3)
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
    {
        let entry = entry.with_context(|| format!("Failed to walk {}", authority_dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let components: Vec<String> = path
            .strip_prefix(authority_dir)
            .unwrap_or(path)
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        let [scope, collection, _term] = components.as_slice() else {
            continue;
        };
        let record: TermRecord = read_json(path)?;
        out.entry((scope.clone(), collection.clone()))
            .or_default()
            .push((path.to_path_buf(), record));
    }
    Ok(out)
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|s| s.starts_with('.'))
            .unwrap_or(false)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

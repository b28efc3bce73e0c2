//! Threat catalog loading and validation.
//!
//! A catalog is a JSON document holding the root threat, either wrapped as
//! `{"threats": {...}}` or bare. The root must be the "Combined" threat with
//! id 1, its children are branches or leaves, and branches hold leaves only.

use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{ROOT_THREAT_CATEGORY, ROOT_THREAT_ID};
use crate::errors::{AttackTreeError, AttackTreeResult};
use crate::models::ThreatNode;

/// A parsed and validated threat catalog.
#[derive(Debug, Clone)]
pub struct ThreatCatalog {
    pub root: ThreatNode,
    /// Hex SHA-256 of the raw document, for tracing which catalog was drawn
    pub digest: String,
    pub source: Option<PathBuf>,
}

impl ThreatCatalog {
    /// Read, parse and validate the catalog at `path`.
    pub fn load(path: &Path) -> AttackTreeResult<Self> {
        log::debug!("Reading threat catalog: {}", path.display());

        let bytes = fs::read(path).map_err(|e| {
            log::error!("Failed to read threat catalog {}: {}", path.display(), e);
            AttackTreeError::io(e, path.to_path_buf())
        })?;

        let mut catalog = Self::from_slice(&bytes).map_err(|e| match e {
            AttackTreeError::Json { source, .. } => {
                log::error!("Failed to parse threat catalog {}: {}", path.display(), source);
                AttackTreeError::json(source, path.to_path_buf())
            }
            other => other,
        })?;
        catalog.source = Some(path.to_path_buf());

        log::debug!("Catalog sha256: {}", catalog.digest);
        Ok(catalog)
    }

    /// Parse and validate a catalog held in memory.
    pub fn from_slice(bytes: &[u8]) -> AttackTreeResult<Self> {
        let value: Value = serde_json::from_slice(bytes)?;
        let root_value = match value {
            Value::Object(mut map) => match map.remove("threats") {
                Some(inner) => inner,
                None => Value::Object(map),
            },
            other => other,
        };
        let root: ThreatNode = serde_json::from_value(root_value)?;

        validate(&root)?;

        Ok(Self {
            root,
            digest: hex::encode(Sha256::digest(bytes)),
            source: None,
        })
    }

    /// Immediate children of the root.
    pub fn branches(&self) -> &[ThreatNode] {
        self.root.children()
    }

    /// Number of threats directly below the root's children.
    pub fn grandchild_count(&self) -> usize {
        self.branches().iter().map(|c| c.children().len()).sum()
    }
}

/// Check the root invariant and the two-level shape of the tree.
pub fn validate(root: &ThreatNode) -> AttackTreeResult<()> {
    validate_root(root)?;

    if !root.is_branch() {
        return Err(AttackTreeError::EmptyChildren);
    }

    let mut seen = HashSet::new();
    seen.insert(root.id);

    for child in root.children() {
        register_id(&mut seen, child)?;
        if child.is_branch() {
            for grandchild in child.children() {
                register_id(&mut seen, grandchild)?;
                if grandchild.is_branch() {
                    return Err(AttackTreeError::UnsupportedDepth { id: grandchild.id });
                }
                grandchild.leaf_data()?;
            }
        } else {
            child.leaf_data()?;
        }
    }

    Ok(())
}

/// The root must be the "Combined" threat with id 1.
pub fn validate_root(root: &ThreatNode) -> AttackTreeResult<()> {
    if root.id == ROOT_THREAT_ID && root.category == ROOT_THREAT_CATEGORY {
        return Ok(());
    }

    log::warn!(
        "The first node has not been defined correctly: expected id '{}' and category '{}', found id '{}' and category '{}'",
        ROOT_THREAT_ID,
        ROOT_THREAT_CATEGORY,
        root.id,
        root.category
    );
    Err(AttackTreeError::InvariantViolation(format!(
        "root threat must have id {} and category '{}', found id {} and category '{}'",
        ROOT_THREAT_ID, ROOT_THREAT_CATEGORY, root.id, root.category
    )))
}

fn register_id(seen: &mut HashSet<u64>, node: &ThreatNode) -> AttackTreeResult<()> {
    if !seen.insert(node.id) {
        return Err(AttackTreeError::InvariantViolation(format!(
            "threat id {} is used more than once",
            node.id
        )));
    }
    Ok(())
}

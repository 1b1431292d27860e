//! Process-wide registry.
//!
//! [`Registry`] wraps an [`Archive`] in a single reader-writer lock.
//! Resolution and lookups take the read side and run concurrently; node
//! registration and mutation take the write side. Callers that need a
//! consistent snapshot (e.g. persisting every authority) hold one read
//! guard for the whole operation.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::archive::Archive;
use crate::error::Result;
use crate::models::{Node, NodeId, Status};
use crate::resolver::{LoadRequest, Resolved};

/// Shareable, lock-guarded vocabulary cache.
#[derive(Debug, Default)]
pub struct Registry {
    archive: RwLock<Archive>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_archive(archive: Archive) -> Self {
        Self {
            archive: RwLock::new(archive),
        }
    }

    /// Shared access for resolution and lookups.
    pub fn read(&self) -> RwLockReadGuard<'_, Archive> {
        self.archive.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Exclusive access for registration and mutation.
    pub fn write(&self) -> RwLockWriteGuard<'_, Archive> {
        self.archive.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn into_inner(self) -> Archive {
        self.archive
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a node. Idempotent by uid.
    pub fn put(&self, node: Node) -> Result<NodeId> {
        self.write().put(node)
    }

    /// Resolves `request` and returns an owned copy of the node.
    ///
    /// Cached nodes are cloned out of the lock; use [`read`](Self::read)
    /// and [`Archive::load`] to borrow the cached instance instead.
    pub fn load(&self, request: &LoadRequest) -> Result<Option<Node>> {
        let archive = self.read();
        let node = archive.load(request)?.map(Resolved::into_owned);
        Ok(node)
    }

    pub fn get_random_term(&self, namespace: &str) -> Result<String> {
        self.read().get_random_term(namespace)
    }

    pub fn set_status(&self, id: NodeId, status: Status) -> Result<()> {
        self.write().set_status(id, status)
    }

    pub fn add_synonym(&self, id: NodeId, synonym: &str) -> Result<bool> {
        self.write().add_synonym(id, synonym)
    }
}

//! # Vocab Core
//!
//! I/O-free logic for the vocabulary registry: the four-level node model,
//! identity matching, the uid/authority cache, and the namespace resolver.
//!
//! ```text
//! ┌──────────┐   ┌──────────┐   ┌──────────┐   ┌──────────┐
//! │  models  │──▶│ matcher  │──▶│ resolver │◀──│ archive  │
//! │ Node/Kind│   │ matches()│   │  load()  │   │  cache   │
//! └──────────┘   └──────────┘   └──────────┘   └────┬─────┘
//!                                                   │
//!                                             ┌─────▼─────┐
//!                                             │ registry  │
//!                                             │ (RwLock)  │
//!                                             └───────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use vocab_core::{Archive, LoadRequest, NewNode};
//!
//! let mut archive = Archive::new();
//! let wcrp = archive.create_authority(NewNode::named("WCRP")).unwrap();
//! let cmip6 = archive.create_scope(wcrp, NewNode::named("CMIP6")).unwrap();
//! let realm = archive.create_collection(cmip6, NewNode::named("realm")).unwrap();
//! archive
//!     .create_term(realm, NewNode::named("ocnBgchem").with_synonyms(["ocean-bgc"]))
//!     .unwrap();
//!
//! let term = archive
//!     .load(&LoadRequest::path(["wcrp", "cmip6", "realm", "ocean-bgc"]))
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(archive.namespace(&term), "wcrp:cmip6:realm:ocnbgchem");
//! ```

pub mod archive;
pub mod canonical;
pub mod error;
pub mod factory;
pub mod matcher;
pub mod models;
pub mod registry;
pub mod resolver;

pub use archive::Archive;
pub use error::VocabError;
pub use factory::NewNode;
pub use models::{Node, NodeDetail, NodeId, NodeKind, Status};
pub use registry::Registry;
pub use resolver::{LoadRequest, Resolved};

//! # Vocab Registry
//!
//! A controlled-vocabulary registry: a hierarchical namespace of governed
//! terms (authority → scope → collection → term) with lookup by name,
//! synonym, index, or uid, and file-backed persistence.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │   Archive    │──▶│  vocab-core  │──▶│     CLI      │
//! │ dir (JSON)   │◀──│  Registry    │   │   (vocab)    │
//! └──────────────┘   └──────────────┘   └──────────────┘
//!       io              resolver           show / edit
//! ```
//!
//! The resolution core (node model, matcher, cache, resolver) lives in the
//! I/O-free [`vocab_core`] crate and is re-exported here.
//!
//! ## Quick Start
//!
//! ```bash
//! vocab create authority WCRP --description "World Climate Research Program"
//! vocab create scope CMIP6 --parent wcrp
//! vocab create collection realm --parent wcrp:cmip6
//! vocab create term ocnBgchem --parent wcrp:cmip6:realm --synonym ocean-bgc
//! vocab load wcrp cmip6 realm ocean-bgc
//! vocab parse wcrp:cmip6:realm:OCNBGCHEM
//! vocab random wcrp:cmip6:realm
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`io`] | Archive directory reading and writing |
//! | [`show`] | Resolution and display commands |
//! | [`edit`] | Node creation and mutation commands |

pub mod config;
pub mod edit;
pub mod io;
pub mod show;

pub use vocab_core;

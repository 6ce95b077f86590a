//! outline-sync — bidirectional reconciliation between a remote,
//! hierarchical document collection and a local tree of markdown files
//! with front-matter headers.
//!
//! The reconciliation engine is the crate's core: [`orchestrator`] wires
//! together [`scanner`] and [`remote`] (the two snapshots), [`state`] (the
//! last-known baseline), [`change_detector`] and [`conflict`] (the
//! three-way diff and its conflict policy), and [`push_engine`] /
//! [`pull_engine`] / [`parent_converter`] (the two execution engines and
//! the structural file/folder conversion between them).
//!
//! ```rust,ignore
//! use outline_sync::orchestrator::Orchestrator;
//! use outline_sync::remote::http::HttpRemoteGateway;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let gateway = HttpRemoteGateway::new("https://app.getoutline.com", "token");
//! let orchestrator =
//!     Orchestrator::new("./docs".into(), "collection-id".to_string(), &gateway);
//! orchestrator.run(false).await?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(dead_code)]

pub mod change_detector;
pub mod collection;
pub mod config;
pub mod conflict;
pub mod error;
pub mod front_matter;
pub mod hierarchy;
pub mod logging;
pub mod orchestrator;
pub mod parent_converter;
pub mod path_mapper;
pub mod pull_engine;
pub mod push_engine;
pub mod remote;
pub mod scanner;
pub mod state;
pub mod text_clean;

pub use conflict::{Conflict, ConflictKind};
pub use error::{StateError, SyncError, TransportError};
pub use orchestrator::{Orchestrator, RunOutcome};
pub use remote::{Collection, RemoteDoc, RemoteGateway};
pub use state::SyncState;

// vim: ts=4

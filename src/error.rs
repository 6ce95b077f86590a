//! Error types for the reconciliation engine.
//!
//! Mirrors the taxonomy in the design: a fatal error aborts the run before
//! any state is written; a per-operation error is logged and the run
//! continues, leaving that document or file to be retried on the next run.

use std::error::Error;
use std::fmt;
use std::io;

/// Top-level error returned by fatal failures only.
///
/// Per-operation failures (a single document's push, a single file's pull)
/// are not represented here; they are logged and folded into the
/// `PhaseReport` returned alongside a successful `Ok(RunOutcome)`.
#[derive(Debug)]
pub enum SyncError {
	/// Configuration file missing, unreadable, or malformed. Fatal, exits
	/// before Phase 1.
	Config { message: String },

	/// The sync-root walk itself failed (root missing, not a directory,
	/// permission denied on the root). Fatal, aborts without writing state.
	Io { message: String, source: io::Error },

	/// The sidecar state file could not be parsed in a way that is safe to
	/// recover from (this is rare; `StateStore::load` normally degrades a
	/// corrupted sidecar to "first run" rather than erroring).
	State(StateError),

	/// Listing collections or documents failed. Unlike a per-operation
	/// `TransportError` during Phase 4, a failure here is fatal: there is no
	/// delta to compute without a remote listing.
	Remote(TransportError),

	/// The remote listing violated an invariant the core relies on (e.g. a
	/// parent-id cycle). Fatal, state is not updated.
	InvariantViolation { message: String },
}

impl fmt::Display for SyncError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			SyncError::Config { message } => write!(f, "configuration error: {}", message),
			SyncError::Io { message, source } => write!(f, "{}: {}", message, source),
			SyncError::State(e) => write!(f, "{}", e),
			SyncError::Remote(e) => write!(f, "{}", e),
			SyncError::InvariantViolation { message } => {
				write!(f, "invariant violation: {}", message)
			}
		}
	}
}

impl Error for SyncError {}

impl From<StateError> for SyncError {
	fn from(e: StateError) -> Self {
		SyncError::State(e)
	}
}

impl From<TransportError> for SyncError {
	fn from(e: TransportError) -> Self {
		SyncError::Remote(e)
	}
}

/// Errors from loading/saving the sidecar state file.
#[derive(Debug)]
pub enum StateError {
	/// Failed to read the sidecar from disk.
	LoadFailed { source: io::Error },

	/// Failed to write the sidecar (temp file or rename).
	SaveFailed { source: io::Error },

	/// Sidecar JSON did not parse at all. `StateStore::load` treats this as
	/// "no previous state" rather than propagating the error, per the
	/// first-run-safety invariant; this variant exists for callers that
	/// want to distinguish "absent" from "corrupt" in logs.
	Corrupted { message: String },
}

impl fmt::Display for StateError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			StateError::LoadFailed { source } => write!(f, "failed to load sync state: {}", source),
			StateError::SaveFailed { source } => write!(f, "failed to save sync state: {}", source),
			StateError::Corrupted { message } => write!(f, "sync state corrupted: {}", message),
		}
	}
}

impl Error for StateError {}

/// Errors from a single `RemoteGateway` call. Always per-operation: a
/// `TransportError` is logged and the run continues with the next
/// operation in the same phase.
#[derive(Debug)]
pub enum TransportError {
	/// The HTTP request could not be completed (DNS, connection refused,
	/// TLS failure, timeout).
	RequestFailed { message: String },

	/// The server responded with a non-success status code.
	Status { code: u16, body: String },

	/// The response body did not decode into the expected shape.
	Decode { message: String },
}

impl fmt::Display for TransportError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			TransportError::RequestFailed { message } => write!(f, "request failed: {}", message),
			TransportError::Status { code, body } => {
				write!(f, "remote returned {}: {}", code, body)
			}
			TransportError::Decode { message } => write!(f, "failed to decode response: {}", message),
		}
	}
}

impl Error for TransportError {}

/// Errors from an individual local file operation during Phase 4 (read,
/// write, rename, mkdir, rmdir). Per-operation, same treatment as
/// `TransportError`.
#[derive(Debug)]
pub struct FileOpError {
	pub path: std::path::PathBuf,
	pub source: io::Error,
}

impl fmt::Display for FileOpError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}: {}", self.path.display(), self.source)
	}
}

impl Error for FileOpError {}

use clap::{Arg, ArgAction, Command};
use std::path::PathBuf;
use std::process::ExitCode;

use outline_sync::collection;
use outline_sync::config::{Config, DEFAULT_CONFIG_PATH};
use outline_sync::logging::{self, info, warn};
use outline_sync::remote::http::HttpRemoteGateway;
use outline_sync::{Orchestrator, RunOutcome};

#[tokio::main]
async fn main() -> ExitCode {
	let matches = Command::new("outline-sync")
		.version("0.1.0")
		.about("Bidirectional sync between an Outline-style document collection and a local markdown tree")
		.arg(
			Arg::new("config")
				.long("config")
				.value_name("PATH")
				.help("Path to the configuration file")
				.default_value(DEFAULT_CONFIG_PATH),
		)
		.arg(
			Arg::new("dry_run")
				.long("dry-run")
				.action(ArgAction::SetTrue)
				.help("Report the operations Phase 4 would perform without mutating either side"),
		)
		.arg(
			Arg::new("verbose")
				.short('v')
				.long("verbose")
				.action(ArgAction::Count)
				.help("Increase log verbosity (repeatable)"),
		)
		.get_matches();

	let verbosity = matches.get_count("verbose");
	logging::init_tracing(verbosity);

	let config_path = PathBuf::from(matches.get_one::<String>("config").expect("has default"));
	let dry_run = matches.get_flag("dry_run");

	match run(&config_path, dry_run).await {
		Ok(()) => ExitCode::SUCCESS,
		Err(message) => {
			eprintln!("outline-sync: {}", message);
			ExitCode::FAILURE
		}
	}
}

async fn run(config_path: &std::path::Path, dry_run: bool) -> Result<(), String> {
	let config = Config::load(config_path).await.map_err(|e| e.to_string())?;
	let token = config.require_token().map_err(|e| e.to_string())?;
	let gateway = HttpRemoteGateway::new(config.api_base_url.as_str(), token);

	let collection_id = collection::resolve(&gateway, config.collection_id.as_deref())
		.await
		.map_err(|e| e.to_string())?;

	tokio::fs::create_dir_all(&config.sync_root)
		.await
		.map_err(|e| format!("cannot create sync root {}: {}", config.sync_root.display(), e))?;

	let orchestrator = Orchestrator::new(config.sync_root.clone(), collection_id, &gateway);

	match orchestrator.run(dry_run).await {
		Ok(RunOutcome::Clean) => {
			info!("sync complete");
			Ok(())
		}
		Ok(RunOutcome::ConflictsFound(conflicts)) => {
			warn!("sync halted: {} conflict(s) require manual review", conflicts.len());
			for conflict in &conflicts {
				let suggestion = suggest(&conflict.kind, conflict.local_mtime, conflict.remote_updated_at);
				eprintln!(
					"  {:?} at {} (id {}): local edited {}, remote updated {} -- {}",
					conflict.kind, conflict.path, conflict.id, conflict.local_mtime, conflict.remote_updated_at,
					suggestion
				);
			}
			// A conflict is a terminal outcome, not a failure:
			// exit 0 with the report already printed above.
			Ok(())
		}
		Err(e) => Err(e.to_string()),
	}
}

/// A suggestion derived from `sign(localMtime - remoteUpdatedAt)` once the
/// gap exceeds the simultaneous-edit tolerance; within the gap, the two
/// sides are too close in time to prefer one, so the suggestion is always
/// "manual review".
fn suggest(
	kind: &outline_sync::ConflictKind,
	local_mtime: chrono::DateTime<chrono::Utc>,
	remote_updated_at: chrono::DateTime<chrono::Utc>,
) -> &'static str {
	use outline_sync::ConflictKind;
	if matches!(kind, ConflictKind::SimultaneousEdit) {
		return "manual review";
	}
	let delta = (local_mtime - remote_updated_at).num_seconds();
	if delta.abs() < outline_sync::conflict::SIMULTANEOUS_TOLERANCE_SECS {
		"manual review"
	} else if delta > 0 {
		"local copy is newer; consider pushing it"
	} else {
		"remote copy is newer; consider pulling it"
	}
}

// vim: ts=4

//! End-to-end reconciliation scenarios.

mod common;

use chrono::{Duration, Utc};
use common::{doc, FakeGateway};
use outline_sync::front_matter;
use outline_sync::orchestrator::{Orchestrator, RunOutcome};
use tempfile::tempdir;

async fn read(root: &std::path::Path, rel: &str) -> String {
	tokio::fs::read_to_string(root.join(rel)).await.unwrap()
}

#[tokio::test]
async fn s1_new_remote_document_is_pulled() {
	let dir = tempdir().unwrap();
	let gateway = FakeGateway::new("col1", vec![doc("A", "Hello", "hi", None, Utc::now())]);
	let orchestrator = Orchestrator::new(dir.path().to_path_buf(), "col1".to_string(), &gateway);

	let outcome = orchestrator.run(false).await.unwrap();
	assert!(matches!(outcome, RunOutcome::Clean));

	let contents = read(dir.path(), "Hello.md").await;
	let (fm, body) = front_matter::parse(&contents);
	assert_eq!(fm.get("id_outline"), Some("A"));
	assert_eq!(body.trim(), "hi");
	assert!(dir.path().join(".outline").exists());
}

#[tokio::test]
async fn s2_new_local_document_waits_for_second_run() {
	let dir = tempdir().unwrap();
	tokio::fs::write(dir.path().join("Note.md"), "body\n").await.unwrap();

	let gateway = FakeGateway::empty("col1");
	let orchestrator = Orchestrator::new(dir.path().to_path_buf(), "col1".to_string(), &gateway);

	// First run: first-run rule means no local deltas are emitted yet.
	orchestrator.run(false).await.unwrap();
	assert!(gateway.snapshot().is_empty());
	assert!(dir.path().join(".outline").exists());

	// Second run: the baseline now exists, so the untouched file is "new".
	orchestrator.run(false).await.unwrap();
	let remote_docs = gateway.snapshot();
	assert_eq!(remote_docs.len(), 1);
	assert_eq!(remote_docs[0].title, "Note");
	assert_eq!(remote_docs[0].text, "body\n");

	let contents = read(dir.path(), "Note.md").await;
	let (fm, _) = front_matter::parse(&contents);
	assert_eq!(fm.get("id_outline"), Some(remote_docs[0].id.as_str()));
}

#[tokio::test]
async fn s3_promotion_when_a_document_gains_a_child() {
	let dir = tempdir().unwrap();
	let gateway = FakeGateway::new("col1", vec![doc("T", "Topic", "topic body", None, Utc::now())]);
	let orchestrator = Orchestrator::new(dir.path().to_path_buf(), "col1".to_string(), &gateway);

	orchestrator.run(false).await.unwrap();
	assert!(dir.path().join("Topic.md").exists());

	gateway.add_child("T", "S", "Sub", "sub body", Utc::now());
	orchestrator.run(false).await.unwrap();

	assert!(dir.path().join("Topic/README.md").exists());
	assert!(dir.path().join("Topic/Sub.md").exists());
	assert!(!dir.path().join("Topic.md").exists());

	let index_contents = read(dir.path(), "Topic/README.md").await;
	let (fm, _) = front_matter::parse(&index_contents);
	assert_eq!(fm.get("id_outline"), Some("T"));
}

#[tokio::test]
async fn s4_demotion_when_the_last_child_is_deleted() {
	let dir = tempdir().unwrap();
	let gateway = FakeGateway::new(
		"col1",
		vec![
			doc("T", "Topic", "topic body", None, Utc::now()),
			doc("S", "Sub", "sub body", Some("T"), Utc::now()),
		],
	);
	let orchestrator = Orchestrator::new(dir.path().to_path_buf(), "col1".to_string(), &gateway);

	orchestrator.run(false).await.unwrap();
	assert!(dir.path().join("Topic/README.md").exists());
	assert!(dir.path().join("Topic/Sub.md").exists());

	gateway.remove("S");
	orchestrator.run(false).await.unwrap();

	assert!(!dir.path().join("Topic/Sub.md").exists());
	assert!(!dir.path().join("Topic").exists());
	assert!(dir.path().join("Topic.md").exists());
}

#[tokio::test]
async fn s5_local_move_updates_remote_parent_and_title() {
	// Both A and B are already folders (each has an existing child), so
	// moving X between them exercises the "real" move path: PushEngine
	// resolves the new parent id from the destination folder's own
	// README.md, not from a bare directory PathMapper never assigned.
	let dir = tempdir().unwrap();
	let gateway = FakeGateway::new(
		"col1",
		vec![
			doc("A", "A", "a body", None, Utc::now()),
			doc("B", "B", "b body", None, Utc::now()),
			doc("X", "X", "x body", Some("A"), Utc::now()),
			doc("Y", "Y", "y body", Some("B"), Utc::now()),
		],
	);
	let orchestrator = Orchestrator::new(dir.path().to_path_buf(), "col1".to_string(), &gateway);

	orchestrator.run(false).await.unwrap();
	assert!(dir.path().join("A/X.md").exists());
	assert!(dir.path().join("B/README.md").exists());

	tokio::fs::rename(dir.path().join("A/X.md"), dir.path().join("B/X.md")).await.unwrap();

	orchestrator.run(false).await.unwrap();

	let moved = gateway.snapshot().into_iter().find(|d| d.id == "X").unwrap();
	assert_eq!(moved.parent_id.as_deref(), Some("B"));
	assert_eq!(moved.title, "X");
}

#[tokio::test]
async fn s6_bidirectional_edit_halts_without_mutating_either_side() {
	let dir = tempdir().unwrap();
	let gateway =
		FakeGateway::new("col1", vec![doc("Q", "Quarterly", "v0", None, Utc::now() - Duration::hours(1))]);
	let orchestrator = Orchestrator::new(dir.path().to_path_buf(), "col1".to_string(), &gateway);

	orchestrator.run(false).await.unwrap();
	// `last_sync` as actually persisted by Phase 5, the baseline both
	// deltas below must land after.
	let last_sync = Utc::now();

	// Remote edited 5 minutes after the last sync.
	gateway.touch("Q", "remote edit", last_sync + Duration::minutes(5));

	// Local edited 10 minutes after the last sync.
	let local_path = dir.path().join("Quarterly.md");
	let contents = read(dir.path(), "Quarterly.md").await;
	let (fm, _) = front_matter::parse(&contents);
	let rewritten = front_matter::write(&fm, "local edit\n");
	tokio::fs::write(&local_path, rewritten).await.unwrap();
	let local_edit_time = (last_sync + Duration::minutes(10)).into();
	filetime::set_file_mtime(&local_path, filetime::FileTime::from_system_time(local_edit_time)).unwrap();

	let outcome = orchestrator.run(false).await.unwrap();
	let conflicts = match outcome {
		RunOutcome::ConflictsFound(conflicts) => conflicts,
		RunOutcome::Clean => panic!("expected a conflict to be reported"),
	};
	assert_eq!(conflicts.len(), 1);
	assert_eq!(conflicts[0].kind, outline_sync::ConflictKind::BidirectionalEdit);

	// Neither side was mutated by the halted run.
	assert_eq!(gateway.snapshot().into_iter().find(|d| d.id == "Q").unwrap().text, "remote edit");
	let after = read(dir.path(), "Quarterly.md").await;
	assert!(after.contains("local edit"));
}

//! Full-mirror mode integration: clone-if-absent on the first run,
//! fast-forward update on the next.

use git2::{Repository, Signature};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use omir_core::catalog::CatalogEntry;
use omir_core::config::SyncMode;
use omir_core::endpoints::Endpoints;
use omir_core::fetch::FetchOptions;
use omir_core::scheduler::{self, ProgressTracker};
use omir_core::sync::SyncContext;
use omir_core::target::build_targets;

fn commit_file(repo: &Repository, name: &str, content: &str, message: &str) {
    let workdir = repo.workdir().unwrap();
    fs::write(workdir.join(name), content).unwrap();
    let mut index = repo.index().unwrap();
    index.add_path(Path::new(name)).unwrap();
    index.write().unwrap();
    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();
    let sig = Signature::now("omir-test", "omir@example.com").unwrap();
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit> = parent.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .unwrap();
}

async fn run_one(entry: CatalogEntry, root: &Path, ctx: &SyncContext) -> omir_core::outcome::RunSummary {
    let targets = build_targets(vec![entry], root);
    let progress = Arc::new(ProgressTracker::new(targets.len()));
    scheduler::run_targets(targets, ctx, 2, progress)
        .await
        .expect("run_targets")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn full_mirror_clones_then_fast_forwards() {
    let src_root = tempfile::tempdir().unwrap();
    let src_path = src_root.path().join("owner/repo");
    fs::create_dir_all(&src_path).unwrap();
    let source = Repository::init(&src_path).unwrap();
    commit_file(&source, "theme.css", "body { background: #111; }\n", "initial");

    let hub = format!("file://{}/", src_root.path().display());
    let ctx = SyncContext {
        mode: SyncMode::Full,
        endpoints: Endpoints::new(&hub, &hub).unwrap(),
        fetch: FetchOptions::default(),
    };
    let entry = CatalogEntry {
        repo: "owner/repo".to_string(),
        plugin: false,
        theme: true,
        extra_files: Vec::new(),
    };

    let mirror_root = tempfile::tempdir().unwrap();
    let summary = run_one(entry.clone(), mirror_root.path(), &ctx).await;
    assert_eq!(summary.ok, 1);
    let mirrored = mirror_root.path().join("owner/repo/theme.css");
    assert!(mirrored.is_file());
    assert!(summary.disk_bytes > 0);

    commit_file(&source, "theme.css", "body { background: #eeeeee; }\n", "lighten");
    let summary = run_one(entry, mirror_root.path(), &ctx).await;
    assert_eq!(summary.ok, 1);
    let css = fs::read_to_string(&mirrored).unwrap();
    assert!(css.contains("#eeeeee"), "fast-forward updated the working tree");
}

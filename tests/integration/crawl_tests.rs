//! Integration tests for the harvester
//!
//! These tests use wiremock to stand in for the GitHub API and run full
//! harvesting passes against a temporary state directory.

use commit_harvester::config::Config;
use commit_harvester::crawler::{clear_errors, reset_repo, RunController};
use commit_harvester::output::UnitOutcome;
use commit_harvester::state::{CompletedRegistry, CrawlProgress, CrawlStatus, ProgressMap};
use commit_harvester::storage::{JsonStore, StateStore, TrainingPair};
use commit_harvester::SourceUnit;
use serde_json::json;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const PATCH: &str = "@@ -1,2 +1,3 @@\n class A {\n+    int x = 1;\n }";

/// Creates a test configuration pointed at the mock server
fn create_test_config(base_url: &str, state_dir: &Path) -> Config {
    let mut config = Config::default();
    config.api.base_url = base_url.to_string();
    config.crawler.request_delay_ms = 0;
    config.crawler.max_repos_per_run = 5;
    config.retry.max_attempts = 2;
    config.retry.base_delay_ms = 1;
    config.search.sorts = vec!["stars".to_string()];
    config.search.pages = 1;
    config.output.state_dir = state_dir.display().to_string();
    config
}

fn repo_json(full_name: &str) -> serde_json::Value {
    let (owner, name) = full_name.split_once('/').unwrap();
    json!({
        "name": name,
        "full_name": full_name,
        "owner": {"login": owner},
        "stargazers_count": 100,
        "forks_count": 10,
        "language": "Java"
    })
}

fn sha(n: u32) -> String {
    format!("c{:03}", n)
}

/// Answers every commit detail request with a distinct Java change
fn detail_for(request: &Request) -> ResponseTemplate {
    let sha = request.url.path().rsplit('/').next().unwrap_or_default().to_string();
    ResponseTemplate::new(200).set_body_json(json!({
        "sha": sha,
        "commit": {"message": format!("Change {}", sha)},
        "files": [{"filename": "src/A.java", "patch": PATCH}]
    }))
}

async fn mount_repo(server: &MockServer, full_name: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/repos/{}", full_name)))
        .respond_with(ResponseTemplate::new(200).set_body_json(repo_json(full_name)))
        .mount(server)
        .await;
}

async fn mount_search(server: &MockServer, names: &[&str]) {
    let items: Vec<_> = names.iter().map(|name| repo_json(name)).collect();
    Mock::given(method("GET"))
        .and(path("/search/repositories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": items })))
        .mount(server)
        .await;
}

async fn mount_commit_page(server: &MockServer, full_name: &str, page: u32, shas: &[String]) {
    let body: Vec<_> = shas.iter().map(|sha| json!({ "sha": sha })).collect();
    Mock::given(method("GET"))
        .and(path(format!("/repos/{}/commits", full_name)))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Fails the test if any commit of `full_name` is listed
async fn forbid_commit_listing(server: &MockServer, full_name: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/repos/{}/commits", full_name)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(server)
        .await;
}

async fn mount_details(server: &MockServer, full_name: &str) {
    Mock::given(method("GET"))
        .and(path_regex(format!(r"^/repos/{}/commits/c\d+$", full_name)))
        .respond_with(detail_for)
        .mount(server)
        .await;
}

fn unit(full_name: &str) -> SourceUnit {
    let (owner, name) = full_name.split_once('/').unwrap();
    SourceUnit {
        owner: owner.to_string(),
        name: name.to_string(),
        full_name: full_name.to_string(),
        stars: 1,
        forks: 0,
        language: None,
        created_at: None,
        updated_at: None,
    }
}

#[tokio::test]
async fn test_failure_then_resume_then_idle() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let store = JsonStore::new(dir.path()).unwrap();

    let page1: Vec<_> = (0..100).map(sha).collect();
    let page2: Vec<_> = (100..200).map(sha).collect();

    // Run 1: item 150 (c149) keeps failing with a server error
    mount_repo(&server, "acme/widgets").await;
    mount_commit_page(&server, "acme/widgets", 1, &page1).await;
    mount_commit_page(&server, "acme/widgets", 2, &page2).await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/commits/c149"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_details(&server, "acme/widgets").await;

    let mut config = create_test_config(&server.uri(), dir.path());
    config.search.target_repos = vec!["acme/widgets".to_string()];

    let controller = RunController::new(config.clone(), "token").unwrap();
    let summary = controller.run().await.unwrap();

    assert_eq!(summary.scheduled, 1);
    assert_eq!(summary.failed(), 1);
    assert!(matches!(summary.units[0].outcome, UnitOutcome::Failed { .. }));

    let progress = store.load_progress().unwrap();
    let record = &progress["acme/widgets"];
    assert_eq!(record.status, CrawlStatus::Error);
    assert_eq!(record.last_page, 2);
    assert_eq!(record.collected_count, 149);
    assert!(record.error_message.as_deref().unwrap().contains("500"));
    assert!(record.error_time.is_some());

    let seen = store.load_seen().unwrap();
    assert_eq!(seen.repo_len("acme/widgets"), 149);
    assert!(seen.contains("acme/widgets", "c148"));
    assert!(!seen.contains("acme/widgets", "c149"));
    assert_eq!(store.read_temp_pairs("acme/widgets").unwrap().len(), 149);
    assert!(store.load_completed().unwrap().is_empty());

    // Run 2: resumes at page 2 and never refetches seen commits
    server.reset().await;
    mount_repo(&server, "acme/widgets").await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/commits"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;
    mount_commit_page(&server, "acme/widgets", 2, &page2).await;
    mount_commit_page(&server, "acme/widgets", 3, &[]).await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/repos/acme/widgets/commits/c(0\d\d|1[0-3]\d|14[0-8])$"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    mount_details(&server, "acme/widgets").await;

    let controller = RunController::new(config.clone(), "token").unwrap();
    let summary = controller.run().await.unwrap();

    assert_eq!(summary.succeeded(), 1);
    assert_eq!(summary.pairs_written(), 200);

    let completed = store.load_completed().unwrap();
    let entry = completed.get("acme/widgets").unwrap();
    assert_eq!(entry.total_commits, 200);
    assert_eq!(entry.stars, Some(100));
    let output_file = entry.output_file.clone().unwrap();

    let written: Vec<TrainingPair> = serde_json::from_str(
        &std::fs::read_to_string(store.training_dir().join(&output_file)).unwrap(),
    )
    .unwrap();
    assert_eq!(written.len(), 200);
    assert!(!store.temp_path("acme/widgets").exists());
    assert!(store.load_progress().unwrap().is_empty());
    assert_eq!(store.load_seen().unwrap().repo_len("acme/widgets"), 200);
    server.verify().await;

    // Run 3: nothing left to do, no commit requests
    server.reset().await;
    mount_repo(&server, "acme/widgets").await;
    forbid_commit_listing(&server, "acme/widgets").await;

    let controller = RunController::new(config, "token").unwrap();
    let summary = controller.run().await.unwrap();

    assert!(summary.is_idle());
    assert_eq!(summary.skipped_completed, 1);
    assert_eq!(store.load_completed().unwrap().len(), 1);
}

#[tokio::test]
async fn test_legacy_registry_is_honored_and_upgraded() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("completed_repos.json"), r#"["old/done"]"#).unwrap();

    mount_search(&server, &["old/done", "new/repo"]).await;
    forbid_commit_listing(&server, "old/done").await;
    mount_commit_page(&server, "new/repo", 1, &[sha(1), sha(2)]).await;
    mount_commit_page(&server, "new/repo", 2, &[]).await;
    mount_details(&server, "new/repo").await;

    let config = create_test_config(&server.uri(), dir.path());
    let controller = RunController::new(config, "token").unwrap();
    let summary = controller.run().await.unwrap();

    assert_eq!(summary.discovered, 2);
    assert_eq!(summary.skipped_completed, 1);
    assert_eq!(summary.succeeded(), 1);

    let registry = controller.store().load_completed().unwrap();
    let legacy = registry.get("old/done").unwrap();
    assert_eq!(legacy.completed_at, "unknown");
    assert_eq!(legacy.total_commits, 0);
    assert_eq!(registry.get("new/repo").unwrap().total_commits, 2);

    // The file is rewritten in the keyed format
    let raw: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join("completed_repos.json")).unwrap(),
    )
    .unwrap();
    assert!(raw.is_object());
}

#[tokio::test]
async fn test_resumable_first_and_cap_respected() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let store = JsonStore::new(dir.path()).unwrap();

    let mut failed = CrawlProgress::new(&unit("r/failed"));
    failed.mark_error("HTTP 502").unwrap();
    let mut progress = ProgressMap::new();
    progress.insert("r/failed".to_string(), failed);
    store.save_progress(&progress).unwrap();

    mount_search(&server, &["a/x", "b/y"]).await;
    forbid_commit_listing(&server, "a/x").await;
    forbid_commit_listing(&server, "b/y").await;
    mount_commit_page(&server, "r/failed", 1, &[sha(1)]).await;
    mount_commit_page(&server, "r/failed", 2, &[]).await;
    mount_details(&server, "r/failed").await;

    let mut config = create_test_config(&server.uri(), dir.path());
    config.crawler.max_repos_per_run = 1;
    let controller = RunController::new(config, "token").unwrap();
    let summary = controller.run().await.unwrap();

    assert_eq!(summary.scheduled, 1);
    assert_eq!(summary.deferred, 2);
    assert_eq!(summary.units[0].full_name, "r/failed");
    assert_eq!(summary.succeeded(), 1);
    assert!(store.load_completed().unwrap().contains("r/failed"));
}

#[tokio::test]
async fn test_repository_without_usable_commits_is_completed_with_note() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_search(&server, &["docs/only"]).await;
    mount_commit_page(&server, "docs/only", 1, &[sha(1)]).await;
    mount_commit_page(&server, "docs/only", 2, &[]).await;
    Mock::given(method("GET"))
        .and(path("/repos/docs/only/commits/c001"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sha": "c001",
            "commit": {"message": "Update README"},
            "files": [{"filename": "README.md", "patch": "+text"}]
        })))
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri(), dir.path());
    let controller = RunController::new(config, "token").unwrap();
    controller.run().await.unwrap();

    let registry = controller.store().load_completed().unwrap();
    let entry = registry.get("docs/only").unwrap();
    assert_eq!(entry.total_commits, 0);
    assert!(entry.output_file.is_none());
    assert_eq!(entry.note.as_deref(), Some("no usable commits"));
}

#[tokio::test]
async fn test_empty_repository_completes() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_search(&server, &["empty/repo"]).await;
    Mock::given(method("GET"))
        .and(path("/repos/empty/repo/commits"))
        .respond_with(ResponseTemplate::new(409))
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri(), dir.path());
    let controller = RunController::new(config, "token").unwrap();
    let summary = controller.run().await.unwrap();

    assert_eq!(summary.succeeded(), 1);
    assert!(controller.store().load_completed().unwrap().contains("empty/repo"));
}

#[test]
fn test_admin_operations() {
    let dir = TempDir::new().unwrap();
    let store = JsonStore::new(dir.path()).unwrap();

    let mut failed = CrawlProgress::new(&unit("a/failed"));
    failed.mark_error("HTTP 500").unwrap();
    let mut progress = ProgressMap::new();
    progress.insert("a/failed".to_string(), failed);
    progress.insert("b/open".to_string(), CrawlProgress::new(&unit("b/open")));
    store.save_progress(&progress).unwrap();

    assert_eq!(clear_errors(&store).unwrap(), vec!["a/failed".to_string()]);
    assert!(reset_repo(&store, "b/open").unwrap());
    assert!(store.load_progress().unwrap().is_empty());
    assert_eq!(store.load_completed().unwrap(), CompletedRegistry::new());
}

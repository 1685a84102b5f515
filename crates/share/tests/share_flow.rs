use std::sync::Arc;

use serde_json::Value;
use stagecast_notify::{QueueReporter, TracingAnalytics};
use stagecast_share::{
    PackageIdentifier, RetryPolicy, ShareError, ShareRequest, ShareStatus, ShareWorkflow,
    StagingProvisioner,
};

fn workflow(root: &std::path::Path) -> (ShareWorkflow, Arc<QueueReporter>) {
    let reporter = Arc::new(QueueReporter::new());
    let workflow = ShareWorkflow::with_default_collaborators(
        StagingProvisioner::new(root).with_retry(RetryPolicy::immediate()),
        reporter.clone(),
        Arc::new(TracingAnalytics),
    );
    (workflow, reporter)
}

fn manifest(dir: &std::path::Path) -> Value {
    serde_json::from_slice(&std::fs::read(dir.join("package.json")).unwrap()).unwrap()
}

#[tokio::test]
async fn single_file_share_produces_content_and_manifest() {
    let input = tempfile::tempdir().unwrap();
    let staging_root = tempfile::tempdir().unwrap();
    let photo = input.path().join("photo.png");
    std::fs::write(&photo, [0x89, b'P', b'N', b'G', 0, 1, 2, 3]).unwrap();
    let (workflow, reporter) = workflow(staging_root.path());

    let area = workflow.share(ShareRequest::new(&photo)).await.unwrap();

    let expected_id = PackageIdentifier::derive(&photo);
    assert!(expected_id.as_str().starts_with("shared-"));
    assert_eq!(area.path(), staging_root.path().join(expected_id.as_str()));
    assert_eq!(
        std::fs::read(area.path().join("content").join("photo.png")).unwrap(),
        std::fs::read(&photo).unwrap()
    );

    let m = manifest(area.path());
    assert_eq!(m["name"], "photo");
    assert_eq!(m["scripts"]["start"], "serve ./content");
    assert_eq!(m["dependencies"]["serve"], "3.2.7");

    assert!(reporter.drain().is_empty());
    assert_eq!(workflow.status().current(), ShareStatus::Idle);
}

#[tokio::test]
async fn directory_share_copies_tree_under_content() {
    let input = tempfile::tempdir().unwrap();
    let staging_root = tempfile::tempdir().unwrap();
    let site = input.path().join("My Site");
    std::fs::create_dir_all(site.join("img")).unwrap();
    std::fs::write(site.join("index.html"), b"<html></html>").unwrap();
    std::fs::write(site.join("img").join("logo.svg"), b"<svg/>").unwrap();
    let (workflow, _reporter) = workflow(staging_root.path());

    let area = workflow.share(ShareRequest::new(&site)).await.unwrap();

    assert!(area.path().join("content/index.html").is_file());
    assert!(area.path().join("content/img/logo.svg").is_file());
    assert_eq!(manifest(area.path())["name"], "my-site");
}

#[tokio::test]
async fn missing_path_reports_notice() {
    let staging_root = tempfile::tempdir().unwrap();
    let (workflow, reporter) = workflow(staging_root.path());

    let err = workflow
        .share(ShareRequest::new("/definitely/not/here/photo.png"))
        .await
        .unwrap_err();

    assert!(matches!(err, ShareError::PathNotFound(_)));
    let notices = reporter.drain();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].title, "Path doesn't exist!");
}

#[tokio::test]
async fn share_then_discard_leaves_nothing_behind() {
    let input = tempfile::tempdir().unwrap();
    let staging_root = tempfile::tempdir().unwrap();
    let file = input.path().join("report.pdf");
    std::fs::write(&file, b"%PDF-1.4").unwrap();
    let (workflow, _reporter) = workflow(staging_root.path());

    workflow.share(ShareRequest::new(&file)).await.unwrap();
    assert!(workflow.discard(&file).await.unwrap());

    assert_eq!(std::fs::read_dir(staging_root.path()).unwrap().count(), 0);
}

use hicfront_common::BuildError;
use hicfront_runner::{Runner, TaskContext, TaskRegistry};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

/// A project with every source directory, one file per pipeline and the
/// default vendor packages installed
fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(
        root,
        "package.json",
        r#"{"name": "site", "version": "1.0.0", "homepage": "https://example.org", "author": "Jo"}"#,
    );
    write(root, "src/scss/main.scss", ".a { .b { color: red; } }\n");
    write(root, "src/js/app.js", "var answer = 42;\n");
    write(root, "src/index.html", "<body>@@include('partials/nav.html')</body>");
    write(root, "src/partials/nav.html", "<nav></nav>");
    write(root, "src/images/logo.svg", "<svg/>");

    write(root, "node_modules/bootstrap/dist/css/bootstrap.css", "b");
    write(root, "node_modules/bootstrap-icons/font/bootstrap-icons.css", "i");
    write(root, "node_modules/jquery/dist/jquery.js", "j");
    write(root, "node_modules/jquery/dist/core.js", "c");
    write(root, "node_modules/@popperjs/core/dist/cjs/popper.js", "p");
    dir
}

async fn run(root: &Path, task: &str) -> hicfront_common::Result<()> {
    let runner = Runner::new(TaskRegistry::standard())?;
    let context = Arc::new(TaskContext::load(root)?);
    runner.run(task, context).await
}

#[tokio::test]
async fn test_build() {
    let dir = project();
    let root = dir.path();
    write(root, "src/vendor/stale.js", "old");

    run(root, "build").await.unwrap();

    assert!(root.join("dist/css/main.css").is_file());
    assert!(root.join("dist/css/main.min.css").is_file());
    assert!(root.join("dist/js/app.min.js").is_file());
    assert_eq!(
        std::fs::read_to_string(root.join("dist/index.html")).unwrap(),
        "<body><nav></nav></body>"
    );
    assert!(root.join("dist/images/logo.svg").is_file());
    assert!(root.join("dist/vendor/jquery/jquery.js").is_file());
    assert!(!root.join("dist/vendor/jquery/core.js").exists());
    assert!(!root.join("src/vendor/stale.js").exists());
}

#[tokio::test]
async fn test_default_does_not_clean() {
    let dir = project();
    let root = dir.path();
    write(root, "dist/vendor/keep.txt", "keep");

    run(root, "default").await.unwrap();

    assert!(root.join("dist/vendor/keep.txt").is_file());
    assert!(root.join("src/vendor/popper.js/popper.js").is_file());
    assert!(root.join("dist/css/main.min.css").is_file());
}

#[tokio::test]
async fn test_clean_only_touches_vendor() {
    let dir = project();
    let root = dir.path();
    run(root, "build").await.unwrap();
    run(root, "clean").await.unwrap();

    assert!(!root.join("src/vendor").exists());
    assert!(!root.join("dist/vendor").exists());
    assert!(root.join("dist/css/main.css").is_file());
}

#[tokio::test]
async fn test_compile_error_does_not_fail_build() {
    let dir = project();
    let root = dir.path();
    write(root, "src/scss/broken.scss", ".a { color: red;\n");

    run(root, "build").await.unwrap();
    assert!(root.join("dist/css/main.css").is_file());
    assert!(!root.join("dist/css/broken.css").exists());
}

#[tokio::test]
async fn test_missing_vendor_package_stops_build() {
    let dir = project();
    let root = dir.path();
    std::fs::remove_dir_all(root.join("node_modules/jquery")).unwrap();

    let err = run(root, "build").await.unwrap_err();
    assert!(matches!(err, BuildError::VendorPackageMissing { ref name, .. } if name == "jquery"));
    // Content pipelines come after vendor staging and never started
    assert!(!root.join("dist/css").exists());
}

#[tokio::test]
async fn test_unknown_task() {
    let dir = project();
    let err = run(dir.path(), "deploy").await.unwrap_err();
    assert!(matches!(err, BuildError::UnknownTask(_)));
}

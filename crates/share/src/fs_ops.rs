//! Default filesystem collaborators: recursive tree copy and manifest merge.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::composer::{BoxFuture, ContentCopier, ManifestInjector};
use crate::error::ShareError;
use crate::manifest::{CONTENT_DIR, MANIFEST_FILE, PackageManifest};

/// Copies a directory tree into a staging area and injects the manifest.
///
/// A source that already carries a `package.json` is a project and lands at
/// the staging root; any other directory is staged under `content/` so the
/// default start script serves it.
#[derive(Clone)]
pub struct TreeCopier {
    injector: Arc<dyn ManifestInjector>,
}

impl TreeCopier {
    pub fn new(injector: Arc<dyn ManifestInjector>) -> Self {
        Self { injector }
    }
}

impl Default for TreeCopier {
    fn default() -> Self {
        Self::new(Arc::new(PackageJsonInjector))
    }
}

impl ContentCopier for TreeCopier {
    fn copy_contents<'a>(
        &'a self,
        source: &'a Path,
        destination: &'a Path,
        manifest: &'a PackageManifest,
    ) -> BoxFuture<'a, Result<(), ShareError>> {
        Box::pin(async move {
            let is_project = tokio::fs::try_exists(source.join(MANIFEST_FILE)).await?;
            let target = if is_project {
                destination.to_path_buf()
            } else {
                destination.join(CONTENT_DIR)
            };

            let (files, bytes) = copy_tree(source, &target, destination).await?;
            debug!(
                source = %source.display(),
                target = %target.display(),
                is_project,
                files,
                bytes,
                "copied directory tree"
            );

            self.injector.inject(destination, manifest).await
        })
    }
}

/// Copies every regular file under `source` into `target`, keeping the
/// relative layout. Symlinks, special entries and `skip` itself are left out.
async fn copy_tree(source: &Path, target: &Path, skip: &Path) -> Result<(u64, u64), ShareError> {
    let mut files = 0u64;
    let mut bytes = 0u64;
    let mut pending: Vec<(PathBuf, PathBuf)> = vec![(source.to_path_buf(), target.to_path_buf())];

    while let Some((from_dir, to_dir)) = pending.pop() {
        tokio::fs::create_dir_all(&to_dir)
            .await
            .map_err(|e| ShareError::Copy {
                from: from_dir.clone(),
                to: to_dir.clone(),
                source: e,
            })?;

        let mut entries = tokio::fs::read_dir(&from_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let from = entry.path();
            if from == skip {
                continue;
            }
            let to = to_dir.join(entry.file_name());
            let file_type = entry.file_type().await?;

            if file_type.is_dir() {
                pending.push((from, to));
            } else if file_type.is_file() {
                let n = tokio::fs::copy(&from, &to)
                    .await
                    .map_err(|e| ShareError::Copy {
                        from: from.clone(),
                        to: to.clone(),
                        source: e,
                    })?;
                files += 1;
                bytes += n;
            } else {
                trace!(path = %from.display(), "skipping non-regular entry");
            }
        }
    }

    Ok((files, bytes))
}

/// Writes `package.json` at the staging root, merging into an existing one.
///
/// Existing values always win. Missing top-level keys are filled from the
/// defaults, and so are missing entries of `scripts` and `dependencies`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PackageJsonInjector;

impl ManifestInjector for PackageJsonInjector {
    fn inject<'a>(
        &'a self,
        root: &'a Path,
        manifest: &'a PackageManifest,
    ) -> BoxFuture<'a, Result<(), ShareError>> {
        Box::pin(async move {
            let path = root.join(MANIFEST_FILE);
            let defaults = serde_json::to_value(manifest)?;

            let merged = match tokio::fs::read(&path).await {
                Ok(raw) => {
                    let existing: Value = serde_json::from_slice(&raw)?;
                    merge_defaults(existing, defaults)?
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => defaults,
                Err(e) => return Err(e.into()),
            };

            let mut out = serde_json::to_vec_pretty(&merged)?;
            out.push(b'\n');
            tokio::fs::write(&path, out).await?;
            debug!(path = %path.display(), "wrote package manifest");
            Ok(())
        })
    }
}

const MERGED_SECTIONS: [&str; 2] = ["scripts", "dependencies"];

fn merge_defaults(existing: Value, defaults: Value) -> Result<Value, ShareError> {
    let Value::Object(mut current) = existing else {
        return Err(ShareError::Manifest(format!(
            "existing {MANIFEST_FILE} is not a JSON object"
        )));
    };
    let Value::Object(defaults) = defaults else {
        return Err(ShareError::Manifest("defaults are not a JSON object".into()));
    };

    for (key, value) in defaults {
        match current.get_mut(&key) {
            None => {
                current.insert(key, value);
            }
            Some(Value::Object(section)) if MERGED_SECTIONS.contains(&key.as_str()) => {
                if let Value::Object(entries) = value {
                    fill_missing(section, entries);
                }
            }
            Some(_) => {}
        }
    }

    Ok(Value::Object(current))
}

fn fill_missing(section: &mut Map<String, Value>, entries: Map<String, Value>) {
    for (k, v) in entries {
        section.entry(k).or_insert(v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn read_json(path: &Path) -> Value {
        serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn inject_writes_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        PackageJsonInjector
            .inject(tmp.path(), &PackageManifest::named("photo"))
            .await
            .unwrap();

        assert_eq!(
            read_json(&tmp.path().join("package.json")),
            json!({
                "name": "photo",
                "scripts": { "start": "serve ./content" },
                "dependencies": { "serve": "3.2.7" }
            })
        );
    }

    #[tokio::test]
    async fn inject_keeps_existing_values() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join("package.json"),
            r#"{"name":"my-app","version":"1.0.0","scripts":{"start":"node index.js"},"dependencies":{"express":"4.0.0"}}"#,
        )
        .unwrap();

        PackageJsonInjector
            .inject(tmp.path(), &PackageManifest::named("site"))
            .await
            .unwrap();

        assert_eq!(
            read_json(&tmp.path().join("package.json")),
            json!({
                "name": "my-app",
                "version": "1.0.0",
                "scripts": { "start": "node index.js" },
                "dependencies": { "express": "4.0.0", "serve": "3.2.7" }
            })
        );
    }

    #[tokio::test]
    async fn inject_rejects_non_object_manifest() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("package.json"), "[1, 2]").unwrap();

        let err = PackageJsonInjector
            .inject(tmp.path(), &PackageManifest::named("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, ShareError::Manifest(_)));
    }

    #[tokio::test]
    async fn tree_copy_plain_directory_goes_to_content() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("site");
        std::fs::create_dir_all(src.join("css")).unwrap();
        std::fs::write(src.join("index.html"), b"<h1>hi</h1>").unwrap();
        std::fs::write(src.join("css").join("main.css"), b"body{}").unwrap();
        let dest = tmp.path().join("staging");
        std::fs::create_dir(&dest).unwrap();

        TreeCopier::default()
            .copy_contents(&src, &dest, &PackageManifest::named("site"))
            .await
            .unwrap();

        assert_eq!(
            std::fs::read(dest.join("content/index.html")).unwrap(),
            b"<h1>hi</h1>"
        );
        assert_eq!(
            std::fs::read(dest.join("content/css/main.css")).unwrap(),
            b"body{}"
        );
        assert_eq!(read_json(&dest.join("package.json"))["name"], "site");
    }

    #[tokio::test]
    async fn tree_copy_project_lands_at_root() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("app");
        std::fs::create_dir(&src).unwrap();
        std::fs::write(src.join("package.json"), r#"{"name":"app"}"#).unwrap();
        std::fs::write(src.join("index.js"), b"console.log(1)").unwrap();
        let dest = tmp.path().join("staging");
        std::fs::create_dir(&dest).unwrap();

        TreeCopier::default()
            .copy_contents(&src, &dest, &PackageManifest::named("app"))
            .await
            .unwrap();

        assert!(dest.join("index.js").is_file());
        assert!(!dest.join("content").exists());
        let manifest = read_json(&dest.join("package.json"));
        assert_eq!(manifest["name"], "app");
        assert_eq!(manifest["scripts"]["start"], "serve ./content");
    }

    #[tokio::test]
    async fn tree_copy_skips_staging_area_nested_in_source() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("root");
        std::fs::create_dir(&src).unwrap();
        std::fs::write(src.join("a.txt"), b"a").unwrap();
        let dest = src.join("shared-nested");
        std::fs::create_dir(&dest).unwrap();

        TreeCopier::default()
            .copy_contents(&src, &dest, &PackageManifest::named("root"))
            .await
            .unwrap();

        assert!(dest.join("content/a.txt").is_file());
        assert!(!dest.join("content/shared-nested").exists());
    }

    #[test]
    fn merge_fills_missing_sections() {
        let merged = merge_defaults(
            json!({ "name": "kept", "scripts": "not-an-object" }),
            serde_json::to_value(PackageManifest::named("ignored")).unwrap(),
        )
        .unwrap();
        assert_eq!(merged["name"], "kept");
        assert_eq!(merged["scripts"], "not-an-object");
        assert_eq!(merged["dependencies"]["serve"], "3.2.7");
    }
}

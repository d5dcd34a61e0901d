//! Vendor staging: allowlisted files from `node_modules` copied into the
//! source tree and the output tree.

use crate::source::SourceSet;
use hicfront_common::{BuildError, ProjectLayout, Result, VendorPackage};
use std::path::PathBuf;

/// Files copied by one staging run
#[derive(Debug, Clone, Default)]
pub struct VendorReport {
    /// Packages staged
    pub packages: usize,

    /// Paths relative to a vendor root, e.g. `jquery/jquery.min.js`
    pub files: Vec<PathBuf>,
}

/// Copies the vendor allowlist into both vendor roots
#[derive(Debug, Clone)]
pub struct VendorStager {
    layout: ProjectLayout,
    packages: Vec<VendorPackage>,
}

impl VendorStager {
    pub fn new(layout: ProjectLayout, packages: Vec<VendorPackage>) -> Self {
        Self { layout, packages }
    }

    /// Remove both vendor roots. Missing roots are not an error.
    pub async fn clean(&self) -> Result<()> {
        for dir in self.layout.vendor_dirs() {
            match tokio::fs::remove_dir_all(&dir).await {
                Ok(()) => tracing::info!("Removed {}", dir.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    tracing::debug!("Nothing to remove at {}", dir.display());
                }
                Err(e) => return Err(BuildError::io(&dir, e)),
            }
        }
        Ok(())
    }

    fn source_set(&self, package: &VendorPackage) -> Result<SourceSet> {
        let base = self.layout.node_modules().join(&package.source);
        if !base.is_dir() {
            return Err(BuildError::VendorPackageMissing {
                name: package.name.clone(),
                path: base,
            });
        }

        let patterns: Vec<&str> = package.patterns.iter().map(String::as_str).collect();
        let exclude: Vec<&str> = package.exclude.iter().map(String::as_str).collect();
        SourceSet::new(base, &patterns)?.exclude(&exclude)
    }

    /// Copy every allowlisted file into both vendor roots.
    ///
    /// Existing files are overwritten; nothing is deleted.
    pub async fn stage(&self) -> Result<VendorReport> {
        let mut report = VendorReport::default();
        let roots = self.layout.vendor_dirs();

        for package in &self.packages {
            let set = self.source_set(package)?;
            let files = set.collect()?;
            tracing::debug!("Staging {} ({} files)", package.name, files.len());

            for relative in files {
                let from = set.base().join(&relative);
                let target = package.dest.join(&relative);

                for root in &roots {
                    let to = root.join(&target);
                    if let Some(parent) = to.parent() {
                        tokio::fs::create_dir_all(parent)
                            .await
                            .map_err(|e| BuildError::io(parent, e))?;
                    }
                    tokio::fs::copy(&from, &to)
                        .await
                        .map_err(|e| BuildError::io(&from, e))?;
                }
                report.files.push(target);
            }
            report.packages += 1;
        }

        tracing::info!(
            packages = report.packages,
            files = report.files.len(),
            "Vendor files staged"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::tempdir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, relative).unwrap();
    }

    #[tokio::test]
    async fn test_missing_package() {
        let dir = tempdir().unwrap();
        let stager = VendorStager::new(ProjectLayout::new(dir.path()), VendorPackage::defaults());

        let err = stager.stage().await.unwrap_err();
        match err {
            BuildError::VendorPackageMissing { name, .. } => assert_eq!(name, "bootstrap"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_clean_without_roots() {
        let dir = tempdir().unwrap();
        let stager = VendorStager::new(ProjectLayout::new(dir.path()), Vec::new());
        stager.clean().await.unwrap();
    }

    #[tokio::test]
    async fn test_stage_keeps_unrelated_files() {
        let dir = tempdir().unwrap();
        let layout = ProjectLayout::new(dir.path());
        touch(&layout.node_modules(), "jquery/dist/jquery.js");
        touch(&layout.vendor_publish_dir(), "old/keep.txt");

        let package = VendorPackage {
            name: "jquery".into(),
            source: "jquery/dist".into(),
            patterns: vec!["*".into()],
            exclude: Vec::new(),
            dest: "jquery".into(),
        };
        let report = VendorStager::new(layout.clone(), vec![package])
            .stage()
            .await
            .unwrap();

        assert_eq!(report.files, vec![PathBuf::from("jquery/jquery.js")]);
        assert!(layout.vendor_publish_dir().join("old/keep.txt").exists());
        assert!(layout.vendor_staging_dir().join("jquery/jquery.js").exists());
    }
}

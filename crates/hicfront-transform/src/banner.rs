use crate::{FileUnit, Transform, TransformError};
use hicfront_common::BannerMetadata;

/// Prepend the rendered banner comment
#[derive(Debug, Clone)]
pub struct StampBanner {
    header: String,
}

impl StampBanner {
    pub fn new(banner: &BannerMetadata) -> Self {
        Self {
            header: banner.render(),
        }
    }
}

impl Transform for StampBanner {
    fn name(&self) -> &'static str {
        "banner"
    }

    fn apply(&self, unit: FileUnit) -> Result<FileUnit, TransformError> {
        let mut contents = Vec::with_capacity(self.header.len() + unit.contents.len());
        contents.extend_from_slice(self.header.as_bytes());
        contents.extend_from_slice(&unit.contents);
        Ok(FileUnit { contents, ..unit })
    }
}

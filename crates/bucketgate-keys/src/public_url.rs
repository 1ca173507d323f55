//! Public retrieval URLs for stored objects
//!
//! `base [/bucket] /key`, with every key segment percent-encoded on its own
//! so the separators between segments survive.

use crate::ObjectKey;

/// Builds public URLs for a deployment's base origin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicUrlBuilder {
    base: String,
    include_bucket: bool,
}

impl PublicUrlBuilder {
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            base: base.trim_end_matches('/').to_string(),
            include_bucket: false,
        }
    }

    /// Cloudflare R2 development URL for an account
    pub fn r2_dev(account_id: &str) -> Self {
        Self::new(format!("https://pub-{account_id}.r2.dev"))
    }

    /// Insert the bucket name as the first path segment
    #[must_use]
    pub const fn include_bucket(mut self, include_bucket: bool) -> Self {
        self.include_bucket = include_bucket;
        self
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn build(&self, bucket: &str, key: &ObjectKey) -> String {
        let mut url = self.base.clone();
        if self.include_bucket {
            url.push('/');
            url.push_str(&urlencoding::encode(bucket));
        }
        for segment in key.segments() {
            url.push('/');
            url.push_str(&urlencoding::encode(segment));
        }
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SanitizePolicy, sanitize};

    fn key(folder: Option<&str>, name: &str) -> ObjectKey {
        let folder = folder.map(|f| sanitize(f, &SanitizePolicy::folder()).unwrap());
        let name = sanitize(name, &SanitizePolicy::file_name()).unwrap();
        ObjectKey::compose(folder.as_ref(), &name)
    }

    #[test]
    fn test_build_without_bucket() {
        let builder = PublicUrlBuilder::new("https://cdn.example.com/");
        assert_eq!(
            builder.build("photos", &key(None, "cat.png")),
            "https://cdn.example.com/cat.png"
        );
    }

    #[test]
    fn test_build_with_bucket_and_folder() {
        let builder = PublicUrlBuilder::r2_dev("abc123").include_bucket(true);
        assert_eq!(
            builder.build("photos", &key(Some("2024/june"), "cat.png")),
            "https://pub-abc123.r2.dev/photos/2024/june/cat.png"
        );
    }

    #[test]
    fn test_segments_are_percent_encoded() {
        let builder = PublicUrlBuilder::new("https://cdn.example.com");
        assert_eq!(
            builder.build("photos", &key(None, "my photo (1).JPG")),
            "https://cdn.example.com/my_photo_%281%29.JPG"
        );
    }
}

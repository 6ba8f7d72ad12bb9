//! Mock tagger for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{dedupe_tags, TagError, Tagger};

/// Canned outcome for one image.
#[derive(Debug, Clone)]
pub enum MockResponse {
    Tags(Vec<String>),
    /// Fail as a transport error with this message
    Fail(String),
}

/// Mock tagger that answers by exact image content.
///
/// Images without a registered response get an empty tag set.
#[derive(Debug, Default)]
pub struct MockTagger {
    responses: HashMap<Vec<u8>, MockResponse>,
    calls: AtomicUsize,
}

impl MockTagger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `image` with `tags`.
    pub fn with_tags(mut self, image: impl Into<Vec<u8>>, tags: &[&str]) -> Self {
        self.responses.insert(
            image.into(),
            MockResponse::Tags(tags.iter().map(|t| t.to_string()).collect()),
        );
        self
    }

    /// Fail requests for `image`.
    pub fn with_failure(mut self, image: impl Into<Vec<u8>>, message: impl Into<String>) -> Self {
        self.responses
            .insert(image.into(), MockResponse::Fail(message.into()));
        self
    }

    /// Number of `tag_image` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Tagger for MockTagger {
    async fn tag_image(&self, image: &[u8]) -> Result<Vec<String>, TagError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.responses.get(image) {
            Some(MockResponse::Tags(tags)) => Ok(dedupe_tags(tags.iter().cloned())),
            Some(MockResponse::Fail(message)) => Err(TagError::Transport(message.clone())),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_responses() {
        let tagger = MockTagger::new()
            .with_tags(b"one".to_vec(), &["car", "road"])
            .with_failure(b"two".to_vec(), "connection reset");

        assert_eq!(tagger.tag_image(b"one").await.unwrap(), vec!["car", "road"]);
        assert!(matches!(
            tagger.tag_image(b"two").await,
            Err(TagError::Transport(_))
        ));
        assert!(tagger.tag_image(b"three").await.unwrap().is_empty());
        assert_eq!(tagger.calls(), 3);
    }
}

use crate::config::BatchConfig;
use crate::error_utils::ErrorExt;
use crate::extractor::Extractor;
use crate::types::ExtractionResult;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchFailure {
    pub url: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome {
    pub posts_data: Vec<ExtractionResult>,
    pub failures: Vec<BatchFailure>,
}

/// Runs an extractor over many URLs, `chunk_size` at a time.
///
/// Every extraction in a chunk finishes, successfully or not, before the
/// next chunk starts. Results keep input order.
pub struct BatchExtractor<'a, E: Extractor + ?Sized> {
    extractor: &'a E,
    chunk_size: usize,
    delay_between_chunks: Duration,
}

impl<'a, E: Extractor + ?Sized> BatchExtractor<'a, E> {
    pub fn new(extractor: &'a E, config: &BatchConfig) -> Self {
        Self {
            extractor,
            chunk_size: config.chunk_size.max(1),
            delay_between_chunks: config.delay_between_chunks(),
        }
    }

    pub async fn batch_extract(&self, urls: &[String]) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        let chunk_count = urls.len().div_ceil(self.chunk_size);
        info!(
            "Batch extracting {} URLs in {} chunks of up to {}",
            urls.len(),
            chunk_count,
            self.chunk_size
        );

        for (index, chunk) in urls.chunks(self.chunk_size).enumerate() {
            if index > 0 && !self.delay_between_chunks.is_zero() {
                debug!("Waiting {:?} before chunk {}", self.delay_between_chunks, index + 1);
                sleep(self.delay_between_chunks).await;
            }

            let results = join_all(chunk.iter().map(|url| self.extractor.extract(url))).await;

            for (url, result) in chunk.iter().zip(results) {
                match result {
                    Ok(data) => outcome.posts_data.push(data),
                    Err(e) => {
                        e.log(&format!("Extraction failed for {}", url));
                        outcome.failures.push(BatchFailure {
                            url: url.clone(),
                            error: e.user_friendly_message(),
                        });
                    }
                }
            }
            debug!("Chunk {}/{} complete", index + 1, chunk_count);
        }

        info!(
            "Batch complete: {} extracted, {} failed",
            outcome.posts_data.len(),
            outcome.failures.len()
        );
        outcome
    }
}

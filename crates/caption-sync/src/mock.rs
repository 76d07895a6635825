use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use caption_core::errors::RemoteError;
use caption_core::record::TranscriptRow;
use caption_core::remote::RemoteStore;

/// Pre-programmed outcomes for deterministic testing without a network.
pub enum MockResponse {
    Ok,
    Error(RemoteError),
    /// Wait a duration, then yield the inner response.
    Delay(Duration, Box<MockResponse>),
}

impl MockResponse {
    pub fn delayed(delay: Duration, inner: MockResponse) -> Self {
        Self::Delay(delay, Box::new(inner))
    }
}

/// Mock remote that plays responses in sequence and records every batch
/// it is handed. Once the script is exhausted every call succeeds.
pub struct MockRemote {
    responses: Mutex<VecDeque<MockResponse>>,
    batches: Mutex<Vec<Vec<TranscriptRow>>>,
}

impl MockRemote {
    pub fn new(responses: Vec<MockResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            batches: Mutex::new(Vec::new()),
        }
    }

    /// A remote that accepts everything.
    pub fn accepting() -> Self {
        Self::new(Vec::new())
    }

    /// How many upsert calls reached the remote.
    pub fn call_count(&self) -> usize {
        self.batches.lock().len()
    }

    /// Every batch received, in call order.
    pub fn batches(&self) -> Vec<Vec<TranscriptRow>> {
        self.batches.lock().clone()
    }

    /// Every row id received across all calls, in order.
    pub fn seen_ids(&self) -> Vec<String> {
        self.batches
            .lock()
            .iter()
            .flatten()
            .map(|r| r.id.as_str().to_owned())
            .collect()
    }
}

#[async_trait]
impl RemoteStore for MockRemote {
    fn name(&self) -> &str {
        "mock"
    }

    async fn upsert(&self, _table: &str, rows: &[TranscriptRow]) -> Result<(), RemoteError> {
        self.batches.lock().push(rows.to_vec());

        // Take the scripted response before awaiting anything
        let mut response = match self.responses.lock().pop_front() {
            Some(r) => r,
            None => return Ok(()),
        };

        loop {
            match response {
                MockResponse::Ok => return Ok(()),
                MockResponse::Error(e) => return Err(e),
                MockResponse::Delay(duration, inner) => {
                    tokio::time::sleep(duration).await;
                    response = *inner;
                }
            }
        }
    }
}

//! Scripted places provider for tests and offline development.
//!
//! Responses are served in the order they were pushed; once the script
//! runs out the last entry keeps being served.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use futures::future::BoxFuture;

use super::PlacesProvider;
use super::error::PlacesError;
use super::types::{Geometry, LatLng, PlaceResult, PlacesStatus, UpstreamRequest, UpstreamResponse};

#[derive(Debug, Default)]
pub struct MockPlacesProvider {
    script: Mutex<VecDeque<Result<UpstreamResponse, PlacesError>>>,
    requests: Mutex<Vec<UpstreamRequest>>,
    calls: AtomicUsize,
    latency: Duration,
}

impl MockPlacesProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every response, so concurrent callers overlap.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Append a result to the script.
    pub fn push(&self, result: Result<UpstreamResponse, PlacesError>) -> &Self {
        lock(&self.script).push_back(result);
        self
    }

    /// Number of upstream calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every request received, in order.
    pub fn requests(&self) -> Vec<UpstreamRequest> {
        lock(&self.requests).clone()
    }

    fn next_result(&self) -> Result<UpstreamResponse, PlacesError> {
        let mut script = lock(&self.script);
        if script.len() > 1 {
            script.pop_front().unwrap_or_else(|| Ok(response(PlacesStatus::Ok, &[])))
        } else {
            script
                .front()
                .cloned()
                .unwrap_or_else(|| Ok(response(PlacesStatus::Ok, &[])))
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl PlacesProvider for MockPlacesProvider {
    fn nearby<'a>(
        &'a self,
        request: &'a UpstreamRequest,
    ) -> BoxFuture<'a, Result<UpstreamResponse, PlacesError>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            lock(&self.requests).push(request.clone());
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
            self.next_result()
        })
    }
}

/// An upstream response with one place per name.
pub fn response(status: PlacesStatus, names: &[&str]) -> UpstreamResponse {
    let results = names
        .iter()
        .enumerate()
        .map(|(i, name)| PlaceResult {
            place_id: format!("place-{i}"),
            name: name.to_string(),
            vicinity: None,
            geometry: Some(Geometry {
                location: LatLng {
                    lat: 51.5 + i as f64 * 0.001,
                    lng: -0.1,
                },
            }),
            rating: None,
            user_ratings_total: None,
        })
        .collect();

    UpstreamResponse {
        status: Some(status),
        results,
        next_page_token: None,
        error_message: None,
    }
}

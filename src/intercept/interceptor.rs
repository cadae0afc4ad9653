//! Interceptor implementation

use super::types::{CapturedPayload, CapturedRequest};
use crate::config::{EndpointMatcher, EngineConfig};
use crate::decode::interpret_response;
use crate::engine::{Aggregator, AggregationSummary};
use crate::error::Result;
use crate::http::Transport;
use crate::pagination::{locate, rewrite};
use crate::request::{RequestDescriptor, ResponseSnapshot};
use crate::settings::SettingsStore;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Middleware that enlarges and fills list requests
pub struct Interceptor<T> {
    transport: Arc<T>,
    config: Arc<EngineConfig>,
    matcher: EndpointMatcher,
    settings: SettingsStore,
    last_request: Arc<RwLock<Option<CapturedRequest>>>,
    last_payload: Arc<RwLock<Option<CapturedPayload>>>,
    last_summary: Arc<RwLock<Option<AggregationSummary>>>,
}

impl<T> Clone for Interceptor<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            config: Arc::clone(&self.config),
            matcher: self.matcher.clone(),
            settings: self.settings.clone(),
            last_request: Arc::clone(&self.last_request),
            last_payload: Arc::clone(&self.last_payload),
            last_summary: Arc::clone(&self.last_summary),
        }
    }
}

impl<T: Transport> Interceptor<T> {
    /// Create an interceptor over `transport`
    pub fn new(transport: T, config: EngineConfig, settings: SettingsStore) -> Result<Self> {
        let matcher = config.matcher()?;
        Ok(Self {
            transport: Arc::new(transport),
            config: Arc::new(config),
            matcher,
            settings,
            last_request: Arc::new(RwLock::new(None)),
            last_payload: Arc::new(RwLock::new(None)),
            last_summary: Arc::new(RwLock::new(None)),
        })
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    /// Whether the request targets the list endpoint
    pub fn is_in_scope(&self, request: &RequestDescriptor) -> bool {
        self.matcher.matches(&request.url)
    }

    /// Whether the persisted page size turns enlargement on
    pub async fn is_enabled(&self) -> bool {
        self.config
            .is_enabled_for(self.settings.desired_page_size().await)
    }

    /// Summary of the most recent aggregation
    pub async fn last_summary(&self) -> Option<AggregationSummary> {
        self.last_summary.read().await.clone()
    }

    /// Most recent in-scope request
    pub async fn last_request(&self) -> Option<CapturedRequest> {
        self.last_request.read().await.clone()
    }

    /// Records of the most recent in-scope response
    pub async fn last_payload(&self) -> Option<CapturedPayload> {
        self.last_payload.read().await.clone()
    }

    /// Send `request`, enlarging and filling it when it is an in-scope list
    /// request and enlargement is enabled.
    ///
    /// Only a failure of the request the caller asked for is an error;
    /// follow-up failures shorten the merged result instead.
    pub async fn handle(&self, request: &RequestDescriptor) -> Result<ResponseSnapshot> {
        if !self.is_in_scope(request) {
            debug!("{} {} out of scope", request.method, request.url);
            return self.transport.send(request).await;
        }

        *self.last_request.write().await = Some(CapturedRequest {
            request: request.clone(),
            captured_at: Utc::now(),
        });

        let desired = self.settings.desired_page_size().await;
        let meta = locate(request);

        if !self.config.is_enabled_for(desired) || meta.is_empty() {
            debug!(
                "Forwarding {} unchanged (desired {desired}, convention {:?})",
                request.url,
                meta.convention()
            );
            let response = self.transport.send(request).await?;
            self.capture_response(&response).await;
            return Ok(response);
        }

        let enlarged = rewrite(request, &meta, desired, &self.config.range_unit);
        let enlarged_meta = locate(&enlarged);
        info!(
            "Enlarging {} to {desired} records ({:?})",
            request.url,
            enlarged_meta.convention()
        );

        let response = self.transport.send(&enlarged).await?;
        let limit = usize::try_from(desired).unwrap_or(usize::MAX);
        let outcome = Aggregator::new(
            self.transport.as_ref(),
            self.config.max_follow_up_pages,
            self.config.range_unit.as_str(),
        )
        .aggregate(&enlarged, &enlarged_meta, response, limit)
        .await;

        // an unrecognized or failed first page leaves nothing to report
        if outcome.summary.pages_fetched > 0 {
            *self.last_payload.write().await = Some(CapturedPayload::new(
                outcome.items,
                outcome.summary.total,
            ));
            *self.last_summary.write().await = Some(outcome.summary);
        }

        Ok(outcome.response)
    }

    async fn capture_response(&self, response: &ResponseSnapshot) {
        if !response.is_success() {
            return;
        }
        if let Some((_, envelope)) = interpret_response(response) {
            let total = envelope.reported_total();
            *self.last_payload.write().await = Some(CapturedPayload::new(envelope.items, total));
        }
    }
}

#[async_trait]
impl<T: Transport> Transport for Interceptor<T> {
    async fn send(&self, request: &RequestDescriptor) -> Result<ResponseSnapshot> {
        self.handle(request).await
    }
}

impl<T> std::fmt::Debug for Interceptor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interceptor")
            .field("config", &self.config)
            .field("matcher", &self.matcher)
            .finish_non_exhaustive()
    }
}

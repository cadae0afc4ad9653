//! Export orchestration

use super::derive::derive_display_value;
use super::writer::{build_csv, export_filename, Deriver};
use crate::engine::Aggregator;
use crate::error::{Error, Result};
use crate::http::Transport;
use crate::intercept::Interceptor;
use crate::pagination::{locate, rewrite};
use crate::types::Record;
use chrono::Local;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Records gathered for one export
#[derive(Debug, Clone, PartialEq)]
pub struct ExportData {
    pub items: Vec<Record>,
    pub total: Option<u64>,
    /// Whether the captured payload was complete and no request was sent
    pub reused: bool,
}

/// A rendered export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub filename: String,
    pub contents: String,
    pub records: usize,
}

/// Exports the records behind the interceptor's last captured request
#[derive(Debug, Clone)]
pub struct Exporter<T> {
    interceptor: Interceptor<T>,
}

impl<T: Transport> Exporter<T> {
    pub fn new(interceptor: Interceptor<T>) -> Self {
        Self { interceptor }
    }

    pub fn interceptor(&self) -> &Interceptor<T> {
        &self.interceptor
    }

    /// Gather every record of the last captured query.
    ///
    /// A captured payload that already holds the whole result set is reused.
    /// Otherwise the request is replayed with the export page size and
    /// aggregated until the total, an empty page or the follow-up ceiling.
    /// Requests without a page or offset cursor get a range cursor added.
    pub async fn collect(&self) -> Result<ExportData> {
        let captured = self
            .interceptor
            .last_request()
            .await
            .ok_or(Error::NothingCaptured)?;

        if let Some(payload) = self.interceptor.last_payload().await {
            if payload.is_complete() && payload.captured_at >= captured.captured_at {
                debug!("Reusing captured payload of {} records", payload.items.len());
                return finish(payload.items, Some(payload.total), true);
            }
        }

        let config = self.interceptor.config();
        let unit = config.range_unit.as_str();
        let request = captured.request;

        let mut meta = locate(&request);
        if !meta.convention().can_follow_up() {
            meta = meta.with_synthesized_range(unit);
        }
        let replay = rewrite(&request, &meta, config.export.page_size, unit);
        let replay_meta = locate(&replay);
        info!(
            "Exporting from {} ({:?}, {} per page)",
            replay.url,
            replay_meta.convention(),
            config.export.page_size
        );

        let transport = self.interceptor.transport();
        let response = transport
            .send(&replay)
            .await
            .map_err(|e| Error::export(e.to_string()))?;
        if !response.is_success() {
            return Err(Error::export(format!(
                "server returned HTTP {}",
                response.status.as_u16()
            )));
        }

        let outcome = Aggregator::new(transport, config.max_follow_up_pages, unit)
            .aggregate(&replay, &replay_meta, response, usize::MAX)
            .await;

        let mut items = outcome.items;
        let total = outcome.summary.total;
        if let Some(total) = total {
            let total = usize::try_from(total).unwrap_or(usize::MAX);
            if items.len() > total {
                items.truncate(total);
            }
        }
        info!(
            "Export collected {} records ({})",
            items.len(),
            outcome.summary.stop_reason
        );

        finish(items, total, false)
    }

    /// Collect and render the CSV, named for the current local time
    pub async fn export(&self) -> Result<ExportFile> {
        let data = self.collect().await?;
        let export = &self.interceptor.config().export;

        let derived = export
            .derived_column
            .as_deref()
            .map(|name| (name, derive_display_value as Deriver));
        let contents = build_csv(&data.items, derived)?;

        Ok(ExportFile {
            filename: export_filename(&export.file_prefix, &Local::now()),
            contents,
            records: data.items.len(),
        })
    }

    /// Export into `dir`, returning the written path
    pub async fn write_to(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let file = self.export().await?;
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir).await?;

        let path = dir.join(&file.filename);
        tokio::fs::write(&path, file.contents.as_bytes()).await?;
        info!("Wrote {} records to {}", file.records, path.display());
        Ok(path)
    }
}

fn finish(items: Vec<Record>, total: Option<u64>, reused: bool) -> Result<ExportData> {
    if items.is_empty() {
        return Err(Error::NoData);
    }
    Ok(ExportData {
        items,
        total,
        reused,
    })
}

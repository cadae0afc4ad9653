//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, RequestArgs};
use crate::config::EngineConfig;
use crate::error::{Error, Result, ResultExt};
use crate::export::Exporter;
use crate::http::HttpClient;
use crate::intercept::Interceptor;
use crate::pagination::{locate, rewrite};
use crate::request::{RequestBody, RequestDescriptor, ResponseSnapshot};
use crate::settings::SettingsStore;
use crate::types::OptionStringExt;
use reqwest::Method;
use serde_json::{json, Map, Value};
use std::path::Path;
use std::time::Instant;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Inspect { request } => self.inspect(request).await,
            Commands::Fetch { request } => self.fetch(request).await,
            Commands::Export { request, output } => self.export(request, output).await,
            Commands::PageSize { value } => self.page_size(*value).await,
            Commands::Serve { port, upstream } => {
                let config = crate::cli::ServerConfig {
                    upstream: upstream.clone(),
                };
                let interceptor = self.interceptor()?;
                crate::cli::serve(config, interceptor, *port).await
            }
        }
    }

    /// Load the engine config, falling back to defaults
    fn engine_config(&self) -> Result<EngineConfig> {
        match &self.cli.config {
            Some(path) => EngineConfig::load(path)
                .with_context(|| format!("Loading config {}", path.display())),
            None => Ok(EngineConfig::default()),
        }
    }

    fn settings_store(&self, config: &EngineConfig) -> Result<SettingsStore> {
        SettingsStore::open(&self.cli.settings, config.default_page_size)
    }

    /// Interceptor over a live HTTP client
    fn interceptor(&self) -> Result<Interceptor<HttpClient>> {
        let config = self.engine_config()?;
        let settings = self.settings_store(&config)?;
        let client = HttpClient::with_config(config.http.client_config())?;
        Interceptor::new(client, config, settings)
    }

    /// Print the detected convention and the enlarged request
    async fn inspect(&self, args: &RequestArgs) -> Result<()> {
        let config = self.engine_config()?;
        let settings = self.settings_store(&config)?;
        let request = build_request(args)?;

        let desired = settings.desired_page_size().await;
        let meta = locate(&request);
        let in_scope = config.matcher()?.matches(&request.url);
        let rewritten = if meta.is_empty() {
            Value::Null
        } else {
            describe_request(&rewrite(&request, &meta, desired, &config.range_unit))
        };

        let report = json!({
            "in_scope": in_scope,
            "enabled": config.is_enabled_for(desired),
            "desired_page_size": desired,
            "convention": meta.convention(),
            "meta": meta,
            "rewritten": rewritten,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        Ok(())
    }

    /// Send the request through the interceptor
    async fn fetch(&self, args: &RequestArgs) -> Result<()> {
        let interceptor = self.interceptor()?;
        let request = build_request(args)?;

        let start = Instant::now();
        let response = interceptor.handle(&request).await?;
        let elapsed = start.elapsed();

        let summary = interceptor.last_summary().await;
        if let Some(summary) = &summary {
            tracing::info!(
                "Loaded {} records in {} pages ({}) in {:.2}s",
                summary.loaded,
                summary.pages_fetched,
                summary.stop_reason,
                elapsed.as_secs_f64()
            );
        }

        let report = json!({
            "status": response.status.as_u16(),
            "summary": summary,
            "body": describe_body(&response),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        Ok(())
    }

    /// Capture the request, then export everything behind it
    async fn export(&self, args: &RequestArgs, output: &Path) -> Result<()> {
        let interceptor = self.interceptor()?;
        let request = build_request(args)?;

        let response = interceptor.handle(&request).await?;
        if !response.is_success() {
            return Err(Error::http_status(
                response.status.as_u16(),
                String::from_utf8_lossy(&response.body),
            ));
        }

        let path = Exporter::new(interceptor).write_to(output).await?;
        println!("{}", path.display());
        Ok(())
    }

    /// Show or persist the desired page size
    async fn page_size(&self, value: Option<u64>) -> Result<()> {
        let config = self.engine_config()?;
        let settings = self.settings_store(&config)?;

        if let Some(value) = value {
            settings.set_desired_page_size(value).await?;
            tracing::info!("Saved desired page size to {}", settings.path().display());
        }

        let desired = settings.desired_page_size().await;
        let report = json!({
            "desired_page_size": desired,
            "enabled": config.is_enabled_for(desired),
            "enable_threshold": config.enable_threshold,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        Ok(())
    }
}

/// Build a request descriptor from command-line arguments
pub(crate) fn build_request(args: &RequestArgs) -> Result<RequestDescriptor> {
    let method = Method::from_bytes(args.method.to_uppercase().as_bytes())
        .map_err(|_| Error::invalid_request(format!("Invalid method: {}", args.method)))?;
    let mut request = RequestDescriptor::new(method, &args.url)?;

    for header in &args.headers {
        let (name, value) = parse_header(header)?;
        request.set_header(name, value)?;
    }

    if let Some(body) = args.body.clone().none_if_empty() {
        request = request.with_body(RequestBody::Text(body));
    }
    Ok(request)
}

/// Split a `Name: value` header argument
pub(crate) fn parse_header(header: &str) -> Result<(&str, &str)> {
    let (name, value) = header
        .split_once(':')
        .ok_or_else(|| Error::invalid_request(format!("Header must be 'Name: value': {header}")))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::invalid_request(format!(
            "Header name is empty: {header}"
        )));
    }
    Ok((name, value.trim()))
}

/// JSON view of a request for display
pub(crate) fn describe_request(request: &RequestDescriptor) -> Value {
    let headers: Map<String, Value> = request
        .headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), Value::String(v.to_string())))
        })
        .collect();

    json!({
        "method": request.method.as_str(),
        "url": request.url.as_str(),
        "headers": headers,
        "body": request.body.as_ref().and_then(RequestBody::to_text),
    })
}

/// Response body as JSON when it parses, otherwise as text
fn describe_body(response: &ResponseSnapshot) -> Value {
    response
        .json_body()
        .unwrap_or_else(|| Value::String(String::from_utf8_lossy(&response.body).into_owned()))
}

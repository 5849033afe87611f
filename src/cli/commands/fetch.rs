//! Fetch command - resolve a resource through the cache

use super::disk_cache;
use crate::cache::{parse_origin, Request, ResourceKey, ResponseSource};
use crate::cli::args::FetchArgs;
use crate::config::Config;
use crate::error::{ShellError, ShellResult};
use crate::shell::cache_target;
use console::style;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Execute the fetch command
pub async fn execute(args: FetchArgs, config: &Config) -> ShellResult<()> {
    let (version, manifest) = cache_target(config)?;
    let origin = parse_origin(&config.cache.origin)?;
    let key = ResourceKey::resolve(&origin, &args.resource)?;
    let cache = disk_cache(config);

    // Serve from the current version only if an earlier install left it
    // complete on disk; other stores are never touched here
    match cache.adopt(&manifest, &version).await {
        Ok(true) => debug!("Serving {} from disk", version),
        Ok(false) => debug!("{} is not installed, using the network only", version),
        Err(e) => warn!("Could not use {}: {}", version, e),
    }

    let mut request = Request::new(args.method.as_str(), key);
    for header in &args.headers {
        let (name, value) = parse_header(header)?;
        request = request.with_header(name, value);
    }
    if let Some(data) = args.data {
        request = request.with_body(data);
    }
    let served = cache.serve(&request).await?;

    let source = match served.source {
        ResponseSource::Cache => style("cache").green(),
        ResponseSource::Network => style("network").yellow(),
    };
    eprintln!(
        "{} {} {} ({} bytes, from {})",
        request.method,
        request.key,
        served.response.status,
        served.response.body.len(),
        source
    );

    match args.output {
        Some(path) => tokio::fs::write(&path, &served.response.body)
            .await
            .map_err(|e| ShellError::io(format!("writing {}", path.display()), e))?,
        None => {
            let mut stdout = tokio::io::stdout();
            stdout
                .write_all(&served.response.body)
                .await
                .map_err(|e| ShellError::io("writing response body", e))?;
            stdout
                .flush()
                .await
                .map_err(|e| ShellError::io("flushing stdout", e))?;
        }
    }

    Ok(())
}

/// Split a "Name: value" header argument
fn parse_header(raw: &str) -> ShellResult<(&str, &str)> {
    match raw.split_once(':') {
        Some((name, value)) if !name.trim().is_empty() => Ok((name.trim(), value.trim())),
        _ => Err(ShellError::User(format!(
            "invalid header '{}', expected \"Name: value\"",
            raw
        ))),
    }
}

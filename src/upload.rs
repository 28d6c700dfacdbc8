//! Image upload storage: file naming, disk persistence, public URLs.
//!
//! Uploaded bytes are written as-is. Nothing checks the content type and
//! files are never removed, even when no record references them any more.

use axum::http::{header, HeaderMap};
use rand::Rng;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::constants::UPLOADS_ROUTE;
use crate::db::DynError;

/// Extension of the client's file name, with the leading dot, when it is
/// plain ASCII alphanumeric
pub fn extension_of(original_name: &str) -> Option<String> {
    Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.bytes().all(|b| b.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext))
}

/// `<unix-millis>-<random below 1e9><.ext>`
pub fn generate_filename(original_name: Option<&str>) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
    let ext = original_name.and_then(extension_of).unwrap_or_default();
    format!("{}-{}{}", millis, suffix, ext)
}

/// Create the upload directory (and parents) if absent
pub async fn ensure_upload_dir(dir: &Path) -> Result<(), DynError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| format!("Failed to create upload directory {}: {}", dir.display(), e))?;
    Ok(())
}

/// Write one uploaded file into `dir`, returning the stored file name
pub async fn store_upload(
    dir: &Path,
    original_name: Option<&str>,
    data: &[u8],
) -> Result<String, DynError> {
    let filename = generate_filename(original_name);
    let path = dir.join(&filename);

    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .await
        .map_err(|e| format!("Failed to create {}: {}", path.display(), e))?;
    file.write_all(data).await?;
    file.flush().await?;

    log::info!("Stored upload {} ({} bytes)", filename, data.len());
    Ok(filename)
}

/// Base URL a request reached us on: `X-Forwarded-Proto` (or http) plus `Host`
pub fn request_base_url(headers: &HeaderMap) -> Result<Url, DynError> {
    let proto = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim())
        .filter(|v| *v == "http" || *v == "https")
        .unwrap_or("http");
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .ok_or("Request has no Host header")?;

    Ok(Url::parse(&format!("{}://{}", proto, host))?)
}

/// Public URL of a stored file
pub fn public_url(base: &Url, filename: &str) -> Result<String, DynError> {
    let mut url = base.clone();
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| format!("Cannot use '{}' as a base URL", base))?;
        segments.pop_if_empty();
        segments.push(UPLOADS_ROUTE.trim_start_matches('/'));
        segments.push(filename);
    }
    Ok(url.to_string())
}

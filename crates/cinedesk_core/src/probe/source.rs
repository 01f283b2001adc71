//! Where image bytes come from.
//!
//! # Responsibility
//! - Resolve `http(s)`, `data:` and local-file URLs to a byte prefix.
//! - Stop reading as soon as the header reveals the image size.
//!
//! # Invariants
//! - At most `max_bytes` are read per probe.
//! - Sources are stateless between calls and safe to share across tasks.

use super::sniff::{sniff_dimensions, Sniff};
use super::{Dimensions, ProbeError, ProbeResult};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::path::PathBuf;
use tokio::io::AsyncReadExt;

pub const DEFAULT_MAX_PROBE_BYTES: usize = 1024 * 1024;

const READ_CHUNK_BYTES: usize = 8 * 1024;

/// Resolves an image URL to its natural size.
///
/// `Ok(None)` means the image loaded but carries no intrinsic size.
#[async_trait]
pub trait DimensionSource: Send + Sync {
    async fn fetch_dimensions(&self, url: &str) -> ProbeResult<Option<Dimensions>>;
}

/// Production source backed by `reqwest` and the local filesystem.
#[derive(Debug, Clone)]
pub struct HttpDimensionSource {
    client: reqwest::Client,
    max_bytes: usize,
}

impl HttpDimensionSource {
    pub fn new(max_bytes: usize) -> ProbeResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("cinedesk/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client, max_bytes))
    }

    pub fn with_client(client: reqwest::Client, max_bytes: usize) -> Self {
        Self {
            client,
            max_bytes: max_bytes.max(1),
        }
    }

    async fn fetch_http(&self, url: &str) -> ProbeResult<Option<Dimensions>> {
        let mut response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(ProbeError::Status(response.status().as_u16()));
        }

        let mut prefix = PrefixBuffer::new(self.max_bytes);
        while let Some(chunk) = response.chunk().await? {
            if let Some(done) = prefix.push(&chunk) {
                return done;
            }
        }
        prefix.finish()
    }

    async fn fetch_file(&self, path: PathBuf) -> ProbeResult<Option<Dimensions>> {
        let mut file = tokio::fs::File::open(path).await?;
        let mut prefix = PrefixBuffer::new(self.max_bytes);
        let mut chunk = vec![0u8; READ_CHUNK_BYTES];
        loop {
            let read = file.read(&mut chunk).await?;
            if read == 0 {
                return prefix.finish();
            }
            if let Some(done) = prefix.push(&chunk[..read]) {
                return done;
            }
        }
    }
}

#[async_trait]
impl DimensionSource for HttpDimensionSource {
    async fn fetch_dimensions(&self, url: &str) -> ProbeResult<Option<Dimensions>> {
        let trimmed = url.trim();
        let lowered = trimmed.to_ascii_lowercase();
        if lowered.starts_with("http://") || lowered.starts_with("https://") {
            self.fetch_http(trimmed).await
        } else if lowered.starts_with("data:") {
            let bytes = decode_data_url(trimmed)?;
            let mut prefix = PrefixBuffer::new(self.max_bytes);
            match prefix.push(&bytes) {
                Some(done) => done,
                None => prefix.finish(),
            }
        } else {
            let path = trimmed.strip_prefix("file://").unwrap_or(trimmed);
            self.fetch_file(PathBuf::from(path)).await
        }
    }
}

/// Accumulates bytes until the sniffer decides or the cap is hit.
struct PrefixBuffer {
    bytes: Vec<u8>,
    max_bytes: usize,
}

impl PrefixBuffer {
    fn new(max_bytes: usize) -> Self {
        Self {
            bytes: Vec::new(),
            max_bytes,
        }
    }

    /// Returns `Some` once the outcome is decided.
    fn push(&mut self, chunk: &[u8]) -> Option<ProbeResult<Option<Dimensions>>> {
        let room = self.max_bytes.saturating_sub(self.bytes.len());
        self.bytes.extend_from_slice(&chunk[..chunk.len().min(room)]);

        match sniff_dimensions(&self.bytes) {
            Sniff::Found(dimensions) => Some(Ok(Some(dimensions))),
            Sniff::Unsized => Some(Ok(None)),
            Sniff::Unsupported(kind) => Some(Err(ProbeError::UnsupportedFormat(kind))),
            // Header larger than the cap: loaded, size unknown.
            Sniff::NeedMore if self.bytes.len() >= self.max_bytes => Some(Ok(None)),
            Sniff::NeedMore => None,
        }
    }

    fn finish(self) -> ProbeResult<Option<Dimensions>> {
        Err(ProbeError::Truncated)
    }
}

/// Decodes `data:[<mime>][;base64],<payload>`.
fn decode_data_url(url: &str) -> ProbeResult<Vec<u8>> {
    let rest = &url["data:".len()..];
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| ProbeError::InvalidDataUrl("missing `,` separator".to_string()))?;

    if meta
        .split(';')
        .any(|part| part.trim().eq_ignore_ascii_case("base64"))
    {
        let compact = payload
            .chars()
            .filter(|ch| !ch.is_ascii_whitespace())
            .collect::<String>();
        STANDARD
            .decode(compact.as_bytes())
            .map_err(|err| ProbeError::InvalidDataUrl(err.to_string()))
    } else {
        Ok(percent_decode(payload))
    }
}

fn percent_decode(payload: &str) -> Vec<u8> {
    let raw = payload.as_bytes();
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'%' && i + 2 < raw.len() {
            let decoded = std::str::from_utf8(&raw[i + 1..i + 3])
                .ok()
                .and_then(|hex| u8::from_str_radix(hex, 16).ok());
            if let Some(byte) = decoded {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(raw[i]);
        i += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{decode_data_url, DimensionSource, HttpDimensionSource};
    use crate::probe::{Dimensions, ProbeError};
    use std::io::Write;

    const GIF_2X3: &[u8] = b"GIF89a\x02\x00\x03\x00\x00\x00\x00";

    #[test]
    fn data_url_decodes_base64_and_percent_payloads() {
        assert_eq!(
            decode_data_url("data:image/gif;base64,R0lGODlh").unwrap(),
            b"GIF89a"
        );
        assert_eq!(
            decode_data_url("data:image/svg+xml,%3Csvg%3E").unwrap(),
            b"<svg>"
        );
        assert!(matches!(
            decode_data_url("data:image/png;base64"),
            Err(ProbeError::InvalidDataUrl(_))
        ));
    }

    #[tokio::test]
    async fn reads_local_files_by_path_and_file_url() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(GIF_2X3).unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let source = HttpDimensionSource::new(1024).unwrap();
        assert_eq!(
            source.fetch_dimensions(&path).await.unwrap(),
            Some(Dimensions::new(2, 3))
        );
        assert_eq!(
            source
                .fetch_dimensions(&format!("file://{path}"))
                .await
                .unwrap(),
            Some(Dimensions::new(2, 3))
        );
    }

    #[tokio::test]
    async fn svg_data_url_without_size_loads_unsized() {
        let source = HttpDimensionSource::new(1024).unwrap();
        let dims = source
            .fetch_dimensions("data:image/svg+xml,%3Csvg%20width%3D%22100%25%22%3E%3C%2Fsvg%3E")
            .await
            .unwrap();
        assert_eq!(dims, None);
    }

    #[tokio::test]
    async fn truncated_and_missing_inputs_fail() {
        let source = HttpDimensionSource::new(1024).unwrap();
        let truncated = source.fetch_dimensions("data:image/png;base64,iVBORw0KGgo=").await;
        assert!(matches!(truncated, Err(ProbeError::Truncated)));

        let missing = source
            .fetch_dimensions("/definitely/not/here/poster.png")
            .await;
        assert!(matches!(missing, Err(ProbeError::Io(_))));
    }
}

//! Receipt image sources: inline base64 (optionally as a data URI) or a URL.

use crate::errors::{Error, Result};
use base64::{Engine as _, engine::general_purpose};
use std::time::Duration;

/// Largest accepted image.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Timeout for downloading an image URL.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Decodes base64 image data, with or without a `data:image/...;base64,` prefix.
pub fn decode_base64_image(data: &str) -> Result<Vec<u8>> {
    let data = data.trim();
    let payload = match data.strip_prefix("data:") {
        Some(rest) => {
            let (meta, payload) = rest
                .split_once(',')
                .ok_or_else(|| Error::validation("Malformed data URI"))?;
            if !meta.starts_with("image/") {
                return Err(Error::validation("Data URI is not an image"));
            }
            payload
        }
        None => data,
    };

    let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = general_purpose::STANDARD.decode(cleaned)?;
    check_image_bytes(&bytes)?;
    Ok(bytes)
}

/// Rejects empty and oversized images.
pub fn check_image_bytes(bytes: &[u8]) -> Result<()> {
    if bytes.is_empty() {
        return Err(Error::validation("Image is empty"));
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(Error::validation(format!(
            "Image is larger than {} MB",
            MAX_IMAGE_BYTES / (1024 * 1024)
        )));
    }
    Ok(())
}

/// Downloads an image from an `http(s)` URL.
pub async fn fetch_image(client: &reqwest::Client, url: &str) -> Result<Vec<u8>> {
    let url = url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(Error::validation("image_url must be an http(s) URL"));
    }

    let response = client.get(url).timeout(FETCH_TIMEOUT).send().await?;
    if !response.status().is_success() {
        return Err(Error::validation(format!(
            "Could not download image: HTTP {}",
            response.status()
        )));
    }

    let bytes = response.bytes().await?.to_vec();
    check_image_bytes(&bytes)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_decode_raw_base64() {
        let encoded = general_purpose::STANDARD.encode(b"\x89PNG fake");
        assert_eq!(decode_base64_image(&encoded).unwrap(), b"\x89PNG fake");
    }

    #[test]
    fn test_decode_data_uri() {
        let encoded = general_purpose::STANDARD.encode(b"jpeg bytes");
        let uri = format!("data:image/jpeg;base64,{encoded}");
        assert_eq!(decode_base64_image(&uri).unwrap(), b"jpeg bytes");
    }

    #[test]
    fn test_decode_rejects_bad_input() {
        assert!(matches!(
            decode_base64_image("data:text/plain;base64,aGVsbG8="),
            Err(Error::Validation { .. })
        ));
        assert!(matches!(decode_base64_image("%%%"), Err(Error::Base64(_))));
        assert!(matches!(decode_base64_image(""), Err(Error::Validation { .. })));
    }

    #[tokio::test]
    async fn test_fetch_rejects_non_http() {
        let client = reqwest::Client::new();
        let result = fetch_image(&client, "file:///etc/passwd").await;
        assert!(matches!(result, Err(Error::Validation { .. })));
    }
}

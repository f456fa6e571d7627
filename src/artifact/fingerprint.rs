// ABOUTME: Cheap content fingerprint over the first bytes of a stream.
// ABOUTME: SHA-1 of at most 5 KiB, encoded as URL-safe base64.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use sha1::{Digest, Sha1};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Number of leading bytes that feed a fingerprint.
pub const FINGERPRINT_PREFIX_LEN: u64 = 5 * 1024;

/// Fingerprint a stream from its first [`FINGERPRINT_PREFIX_LEN`] bytes.
///
/// This is a change detector, not an integrity digest: two streams that share
/// their first 5 KiB fingerprint identically. The reader is consumed and dropped
/// once the prefix is read, so callers must not expect to reuse it.
pub async fn fingerprint<R>(reader: R) -> std::io::Result<String>
where
    R: AsyncRead + Unpin,
{
    let mut prefix = Vec::with_capacity(FINGERPRINT_PREFIX_LEN as usize);
    reader
        .take(FINGERPRINT_PREFIX_LEN)
        .read_to_end(&mut prefix)
        .await?;
    Ok(fingerprint_bytes(&prefix))
}

/// Fingerprint an in-memory buffer, applying the same prefix cap.
pub fn fingerprint_bytes(bytes: &[u8]) -> String {
    let cap = bytes.len().min(FINGERPRINT_PREFIX_LEN as usize);
    let digest = Sha1::digest(&bytes[..cap]);
    URL_SAFE.encode(digest)
}

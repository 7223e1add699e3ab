use sha2::{Digest, Sha256};
use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::{SystemTime, UNIX_EPOCH},
};

/// Root for UIDs derived from a UUID (ISO/IEC 9834-8).
const UUID_ROOT: &str = "2.25";

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// New UID of the form `2.25.<uuid as decimal>`.
///
/// The UUID is taken from a SHA-256 digest of `seed`, the clock, the
/// process id and a process-wide counter, then stamped with version 4 and
/// the RFC 4122 variant.
pub fn generate_uid(seed: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or_default();

    let mut hasher = Sha256::new();
    hasher.update(seed.as_bytes());
    hasher.update(nanos.to_le_bytes());
    hasher.update(std::process::id().to_le_bytes());
    hasher.update(COUNTER.fetch_add(1, Ordering::Relaxed).to_le_bytes());
    let digest = hasher.finalize();

    let mut uuid = [0u8; 16];
    uuid.copy_from_slice(&digest[..16]);
    uuid[6] = (uuid[6] & 0x0f) | 0x40;
    uuid[8] = (uuid[8] & 0x3f) | 0x80;

    format!("{UUID_ROOT}.{}", u128::from_be_bytes(uuid))
}

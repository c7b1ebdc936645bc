//! Subject → bucket hashing.
//!
//! Stored partition assignments only mean something if every client version
//! derives the same bucket for the same subject, so this mapping is frozen:
//! MD5 over `exp_id ++ subject_id`, the last 8 hex digits of the digest read
//! as an unsigned integer, reduced modulo the bucket count.

use md5::{Digest, Md5};

/// Bucket in `[0, total_buckets)` for `subject_id` within experiment `exp_id`.
///
/// Returns 0 when `total_buckets` is 0.
pub fn bucket_index(exp_id: &str, subject_id: &str, total_buckets: u64) -> u64 {
    if total_buckets == 0 {
        return 0;
    }

    let mut hasher = Md5::new();
    hasher.update(exp_id.as_bytes());
    hasher.update(subject_id.as_bytes());
    let digest = hasher.finalize();

    // Final 8 hex digits of the 32-digit digest == last 4 bytes, big-endian.
    let tail = digest
        .iter()
        .skip(12)
        .fold(0_u64, |acc, byte| (acc << 8) | u64::from(*byte));

    tail % total_buckets
}

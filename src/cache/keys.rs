//! Cache key derivation.

/// Sentinel used in place of an absent cursor.
const NO_CURSOR: &str = "none";

/// Deterministic key for one normalized parameter triple.
///
/// The turbo flag is not part of the key: the cache is only consulted when
/// turbo is set, so both modes share a single namespace.
pub fn listing_key(limit: u32, offset: u64, after_id: Option<i64>) -> String {
    match after_id {
        Some(id) => format!("items_{limit}_{offset}_{id}"),
        None => format!("items_{limit}_{offset}_{NO_CURSOR}"),
    }
}

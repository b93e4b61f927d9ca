//! Key layouts.
//!
//! Integers are big-endian so LMDB's byte order matches numeric order.
//! Composite keys put the fixed-width part first where a prefix scan needs
//! it; reporter keys and addresses never contain a NUL byte, so `0x00`
//! separates them from what follows.

use layer_types::AccountAddress;

use crate::LmdbError;

pub(crate) fn id_key(id: u64) -> [u8; 8] {
    id.to_be_bytes()
}

pub(crate) fn decode_id(bytes: &[u8]) -> Result<u64, LmdbError> {
    let arr: [u8; 8] = bytes
        .get(..8)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| LmdbError::Corrupt(format!("id key of {} bytes", bytes.len())))?;
    Ok(u64::from_be_bytes(arr))
}

/// `dispute_id ++ address`: every entry of one round shares an 8-byte prefix.
pub(crate) fn round_account_key(dispute_id: u64, account: &AccountAddress) -> Vec<u8> {
    let addr = account.as_str().as_bytes();
    let mut key = Vec::with_capacity(8 + addr.len());
    key.extend_from_slice(&dispute_id.to_be_bytes());
    key.extend_from_slice(addr);
    key
}

/// `reporter_key ++ 0x00`, the prefix of every round in one lineage.
pub(crate) fn reporter_prefix(reporter_key: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(reporter_key.len() + 9);
    key.extend_from_slice(reporter_key.as_bytes());
    key.push(0);
    key
}

pub(crate) fn reporter_round_key(reporter_key: &str, dispute_id: u64) -> Vec<u8> {
    let mut key = reporter_prefix(reporter_key);
    key.extend_from_slice(&dispute_id.to_be_bytes());
    key
}

/// `reporter ++ 0x00 ++ dispute_id`.
pub(crate) fn delegated_key(reporter: &AccountAddress, dispute_id: u64) -> Vec<u8> {
    let mut key = reporter_prefix(reporter.as_str());
    key.extend_from_slice(&dispute_id.to_be_bytes());
    key
}

pub(crate) fn decode_u128(bytes: &[u8]) -> Result<u128, LmdbError> {
    let arr: [u8; 16] = bytes
        .try_into()
        .map_err(|_| LmdbError::Corrupt(format!("u128 value of {} bytes", bytes.len())))?;
    Ok(u128::from_be_bytes(arr))
}

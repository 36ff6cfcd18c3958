//! Concat KDF (NIST SP 800-56A §5.8.1) as profiled by RFC 7518 §4.6.2.
//!
//! Derives the key-encryption key for ECDH-ES+AxxxKW from the raw ECDH
//! shared secret `Z`:
//!
//!   K(i) = SHA-256(counter_i || Z || algID || partyUInfo || partyVInfo || suppPubInfo)
//!
//! Where each info field is `[len:4 BE][bytes]` and suppPubInfo is the key
//! length in bits as a 4-byte big-endian integer.

use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

const HASH_LEN: usize = 32;

/// Derive `key_len` bytes from shared secret `z`.
///
/// `apu` and `apv` are the decoded `apu`/`apv` header parameters (empty when
/// absent).
pub fn concat_kdf(z: &[u8], alg: &str, apu: &[u8], apv: &[u8], key_len: usize) -> Zeroizing<Vec<u8>> {
    let key_data_len_bits = (key_len * 8) as u32;
    let mut output = Zeroizing::new(Vec::with_capacity(key_len.div_ceil(HASH_LEN) * HASH_LEN));

    let mut counter: u32 = 1;
    while output.len() < key_len {
        let mut hasher = Sha256::new();
        hasher.update(counter.to_be_bytes());
        hasher.update(z);
        hasher.update((alg.len() as u32).to_be_bytes());
        hasher.update(alg.as_bytes());
        hasher.update((apu.len() as u32).to_be_bytes());
        hasher.update(apu);
        hasher.update((apv.len() as u32).to_be_bytes());
        hasher.update(apv);
        hasher.update(key_data_len_bits.to_be_bytes());
        output.extend_from_slice(&hasher.finalize());
        counter += 1;
    }

    output.truncate(key_len);
    output
}

//! Hash and key-derivation kit shared by the authentication and PKEX
//! schedules.
//!
//! The digest is always chosen from the negotiated key length (Easy Connect
//! 2.0 table 3): 32-byte keys hash with SHA-256, 48-byte keys with SHA-384
//! and 64-byte keys with SHA-512. Nonce lengths follow the same table.

use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use rand_core::{CryptoRng, RngCore};
use sha2::{Digest, Sha256, Sha384, Sha512};
use zeroize::Zeroizing;

use crate::errors::{Error, Result};

/// Digest selected by the negotiated key length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashId {
    /// SHA-256, used with 32-byte keys (P-256)
    Sha256,
    /// SHA-384, used with 48-byte keys (P-384)
    Sha384,
    /// SHA-512, used with 64-byte keys
    Sha512,
}

impl HashId {
    /// Digest output length in bytes
    pub const fn digest_len(self) -> usize {
        match self {
            HashId::Sha256 => 32,
            HashId::Sha384 => 48,
            HashId::Sha512 => 64,
        }
    }
}

/// Select the digest for a key length of 32, 48 or 64 bytes
pub fn hash_for_key_len(key_len: usize) -> Result<HashId> {
    match key_len {
        32 => Ok(HashId::Sha256),
        48 => Ok(HashId::Sha384),
        64 => Ok(HashId::Sha512),
        _ => Err(Error::UnsupportedParameter),
    }
}

/// Nonce length paired with a key length of 32, 48 or 64 bytes
pub fn nonce_len_for_key_len(key_len: usize) -> Result<usize> {
    match key_len {
        32 => Ok(16),
        48 => Ok(24),
        64 => Ok(32),
        _ => Err(Error::UnsupportedParameter),
    }
}

macro_rules! with_hash {
    ($id:expr, $D:ident, $body:block) => {
        match $id {
            HashId::Sha256 => {
                type $D = Sha256;
                $body
            }
            HashId::Sha384 => {
                type $D = Sha384;
                $body
            }
            HashId::Sha512 => {
                type $D = Sha512;
                $body
            }
        }
    };
}

/// H(): hash the concatenation of `parts`
pub fn hash(id: HashId, parts: &[&[u8]]) -> Vec<u8> {
    with_hash!(id, D, {
        let mut digest = D::new();
        for part in parts {
            digest.update(part);
        }
        digest.finalize().to_vec()
    })
}

/// HMAC over the concatenation of `parts`
pub fn hmac(id: HashId, key: &[u8], parts: &[&[u8]]) -> Zeroizing<Vec<u8>> {
    with_hash!(id, D, {
        let mut mac =
            Hmac::<D>::new_from_slice(key).expect("HMAC accepts keys of any length");
        for part in parts {
            mac.update(part);
        }
        Zeroizing::new(mac.finalize().into_bytes().to_vec())
    })
}

/// HKDF-Extract over the concatenation of `ikm_parts`.
///
/// A `None` salt stands for a digest-sized zero buffer, per RFC 5869.
pub fn hkdf_extract(id: HashId, salt: Option<&[u8]>, ikm_parts: &[&[u8]]) -> Zeroizing<Vec<u8>> {
    let mut ikm = Zeroizing::new(Vec::new());
    for part in ikm_parts {
        ikm.extend_from_slice(part);
    }

    with_hash!(id, D, {
        let (prk, _) = Hkdf::<D>::extract(salt, &ikm);
        Zeroizing::new(prk.to_vec())
    })
}

/// HKDF-Expand a pseudorandom key into `out_len` bytes
pub fn hkdf_expand(id: HashId, prk: &[u8], info: &[u8], out_len: usize) -> Result<Zeroizing<Vec<u8>>> {
    with_hash!(id, D, {
        let hk = Hkdf::<D>::from_prk(prk).map_err(|_| Error::MalformedInput)?;
        let mut out = Zeroizing::new(vec![0u8; out_len]);
        hk.expand(info, &mut out).map_err(|_| Error::MalformedInput)?;
        Ok(out)
    })
}

/// HKDF(salt, info, ikm) = HKDF-Expand(HKDF-Extract(salt, ikm), info, out_len)
pub fn hkdf(
    id: HashId,
    salt: Option<&[u8]>,
    info: &[u8],
    ikm: &[u8],
    out_len: usize,
) -> Result<Zeroizing<Vec<u8>>> {
    let prk = hkdf_extract(id, salt, &[ikm]);
    hkdf_expand(id, &prk, info, out_len)
}

/// prf+: iterated HMAC expansion of `prk` over multi-part data.
///
/// `T(1) = HMAC(prk, parts ‖ 0x01)`, `T(i) = HMAC(prk, T(i-1) ‖ parts ‖ i)`,
/// with a single-octet counter. Equivalent to HKDF-Expand with
/// `info = concat(parts)` for outputs up to 255 digest blocks.
pub fn prf_plus(id: HashId, prk: &[u8], out_len: usize, parts: &[&[u8]]) -> Result<Zeroizing<Vec<u8>>> {
    let digest_len = id.digest_len();
    if out_len > 255 * digest_len {
        return Err(Error::UnsupportedParameter);
    }

    let mut out = Zeroizing::new(Vec::with_capacity(out_len));
    let mut previous: Option<Zeroizing<Vec<u8>>> = None;
    let mut counter = 1u8;

    while out.len() < out_len {
        let block = {
            let mut input: Vec<&[u8]> = Vec::with_capacity(parts.len() + 2);
            if let Some(prev) = &previous {
                input.push(prev);
            }
            input.extend_from_slice(parts);
            let count = [counter];
            input.push(&count);
            hmac(id, prk, &input)
        };

        let take = usize::min(digest_len, out_len - out.len());
        out.extend_from_slice(&block[..take]);
        previous = Some(block);
        counter += 1;
    }

    Ok(out)
}

/// Draw a protocol nonce sized for the given key length
pub fn generate_nonce<R>(key_len: usize, rng: &mut R) -> Result<Zeroizing<Vec<u8>>>
where
    R: RngCore + CryptoRng,
{
    let mut nonce = Zeroizing::new(vec![0u8; nonce_len_for_key_len(key_len)?]);
    rng.try_fill_bytes(&mut nonce)
        .map_err(|_| Error::ResourceExhaustion)?;
    Ok(nonce)
}

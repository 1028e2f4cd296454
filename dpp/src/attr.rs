//! Attribute TLV codec and the AES-SIV wrapping used for the Wrapped Data
//! attribute.
//!
//! Attributes are a little-endian 16-bit type, a 16-bit length and the
//! value. Wrapped Data carries `ciphertext ‖ 16-byte SIV`, encrypted with
//! RFC 5297 AES-SIV under the key negotiated for the current frame (`k1`,
//! `k2` or `ke`) and up to two pieces of associated data chosen by the frame
//! type.

use aes_siv::aead::generic_array::GenericArray;
use aes_siv::siv::{Aes128Siv, Aes256Siv, CmacSiv};
use aes_siv::KeyInit;
use zeroize::Zeroizing;

use crate::errors::{Error, Result};

/// AES-CMAC-SIV with a 192-bit key (not provided directly by `aes_siv`).
type Aes192Siv = CmacSiv<aes::Aes192>;

/// Length of the synthetic initialization vector appended to the ciphertext
pub const SIV_TAG_LEN: usize = 16;

/// DPP attribute identifiers (Easy Connect table 28)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum AttributeType {
    /// DPP status code
    Status = 0x1000,
    /// SHA-256 hash of the initiator's bootstrapping key
    InitiatorBootKeyHash = 0x1001,
    /// SHA-256 hash of the responder's bootstrapping key
    ResponderBootKeyHash = 0x1002,
    /// Initiator protocol key (`PI`)
    InitiatorProtocolKey = 0x1003,
    /// AES-SIV encrypted attributes
    WrappedData = 0x1004,
    /// Initiator nonce
    InitiatorNonce = 0x1005,
    /// Initiator capabilities bitmask
    InitiatorCapabilities = 0x1006,
    /// Responder nonce
    ResponderNonce = 0x1007,
    /// Responder capabilities bitmask
    ResponderCapabilities = 0x1008,
    /// Responder protocol key (`PR`)
    ResponderProtocolKey = 0x1009,
    /// Initiator authenticating tag (`I-auth`)
    InitiatorAuthTag = 0x100a,
    /// Responder authenticating tag (`R-auth`)
    ResponderAuthTag = 0x100b,
    /// JSON configuration object
    ConfigurationObject = 0x100c,
    /// DPP connector
    Connector = 0x100d,
    /// JSON configuration request object
    ConfigurationRequest = 0x100e,
    /// Bootstrapping key
    BootstrappingKey = 0x100f,
    /// Finite cyclic group number (PKEX)
    FiniteCyclicGroup = 0x1012,
    /// Encrypted key (PKEX)
    EncryptedKey = 0x1013,
    /// Enrollee nonce
    EnrolleeNonce = 0x1014,
    /// PKEX code identifier
    CodeIdentifier = 0x1015,
    /// Transaction identifier
    TransactionId = 0x1016,
    /// Bootstrapping info
    BootstrappingInfo = 0x1017,
    /// Channel attribute
    Channel = 0x1018,
    /// Protocol version
    ProtocolVersion = 0x1019,
    /// Enveloped data
    EnvelopedData = 0x101a,
    /// Send connection status request
    SendConnStatus = 0x101b,
    /// Connection status result
    ConnStatus = 0x101c,
    /// Reconfiguration flags
    ReconfigFlags = 0x101d,
}

impl AttributeType {
    /// Wire value of this attribute type
    pub const fn to_u16(self) -> u16 {
        self as u16
    }

    /// Look up a known attribute type by wire value
    pub fn from_u16(value: u16) -> Option<Self> {
        use AttributeType::*;

        Some(match value {
            0x1000 => Status,
            0x1001 => InitiatorBootKeyHash,
            0x1002 => ResponderBootKeyHash,
            0x1003 => InitiatorProtocolKey,
            0x1004 => WrappedData,
            0x1005 => InitiatorNonce,
            0x1006 => InitiatorCapabilities,
            0x1007 => ResponderNonce,
            0x1008 => ResponderCapabilities,
            0x1009 => ResponderProtocolKey,
            0x100a => InitiatorAuthTag,
            0x100b => ResponderAuthTag,
            0x100c => ConfigurationObject,
            0x100d => Connector,
            0x100e => ConfigurationRequest,
            0x100f => BootstrappingKey,
            0x1012 => FiniteCyclicGroup,
            0x1013 => EncryptedKey,
            0x1014 => EnrolleeNonce,
            0x1015 => CodeIdentifier,
            0x1016 => TransactionId,
            0x1017 => BootstrappingInfo,
            0x1018 => Channel,
            0x1019 => ProtocolVersion,
            0x101a => EnvelopedData,
            0x101b => SendConnStatus,
            0x101c => ConnStatus,
            0x101d => ReconfigFlags,
            _ => return None,
        })
    }
}

/// Iterator over a buffer of attribute TLVs.
///
/// Yields `(type, value)` pairs; a declared length overrunning the buffer
/// yields a single `Err` and ends the iteration.
pub struct AttrIterator<'a> {
    data: &'a [u8],
    failed: bool,
}

/// Iterate the attributes in `data`
pub fn attr_iter(data: &[u8]) -> AttrIterator<'_> {
    AttrIterator { data, failed: false }
}

impl<'a> Iterator for AttrIterator<'a> {
    type Item = Result<(u16, &'a [u8])>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.data.len() < 4 {
            return None;
        }

        let typ = u16::from_le_bytes([self.data[0], self.data[1]]);
        let len = u16::from_le_bytes([self.data[2], self.data[3]]) as usize;
        let rest = &self.data[4..];

        if rest.len() < len {
            self.failed = true;
            return Some(Err(Error::MalformedInput));
        }

        let (value, rest) = rest.split_at(len);
        self.data = rest;
        Some(Ok((typ, value)))
    }
}

/// Append one attribute TLV to `buf`
pub fn attr_append(buf: &mut Vec<u8>, typ: AttributeType, value: &[u8]) -> Result<()> {
    let len = u16::try_from(value.len()).map_err(|_| Error::MalformedInput)?;

    buf.extend_from_slice(&typ.to_u16().to_le_bytes());
    buf.extend_from_slice(&len.to_le_bytes());
    buf.extend_from_slice(value);

    Ok(())
}

fn siv_headers<'a>(ad0: Option<&'a [u8]>, ad1: Option<&'a [u8]>) -> Vec<&'a [u8]> {
    [ad0, ad1].into_iter().flatten().collect()
}

/// Serialize `attrs` back-to-back, encrypt them with AES-SIV under `key` and
/// the given associated data, and return a complete Wrapped Data TLV.
///
/// The key is `k1`, `k2` or `ke` for authentication frames, so its length
/// (32, 48 or 64 bytes) selects AES-SIV-256/384/512. Either associated-data
/// component may be omitted; the frame type defines which are present.
pub fn wrap(
    ad0: Option<&[u8]>,
    ad1: Option<&[u8]>,
    key: &[u8],
    attrs: &[(AttributeType, &[u8])],
) -> Result<Vec<u8>> {
    let mut body = Zeroizing::new(Vec::new());
    for (typ, value) in attrs {
        attr_append(&mut body, *typ, value)?;
    }

    let headers = siv_headers(ad0, ad1);
    let tag = match key.len() {
        32 => Aes128Siv::new_from_slice(key)
            .map_err(|_| Error::UnsupportedParameter)?
            .encrypt_in_place_detached(&headers, &mut body)
            .map_err(|_| Error::CryptoVerifyFailure)?,
        48 => Aes192Siv::new_from_slice(key)
            .map_err(|_| Error::UnsupportedParameter)?
            .encrypt_in_place_detached(&headers, &mut body)
            .map_err(|_| Error::CryptoVerifyFailure)?,
        64 => Aes256Siv::new_from_slice(key)
            .map_err(|_| Error::UnsupportedParameter)?
            .encrypt_in_place_detached(&headers, &mut body)
            .map_err(|_| Error::CryptoVerifyFailure)?,
        _ => return Err(Error::UnsupportedParameter),
    };

    let value_len =
        u16::try_from(body.len() + SIV_TAG_LEN).map_err(|_| Error::MalformedInput)?;

    let mut out = Vec::with_capacity(4 + body.len() + SIV_TAG_LEN);
    out.extend_from_slice(&AttributeType::WrappedData.to_u16().to_le_bytes());
    out.extend_from_slice(&value_len.to_le_bytes());
    out.extend_from_slice(&body);
    out.extend_from_slice(&tag);

    Ok(out)
}

/// Decrypt the value of a Wrapped Data attribute (`ciphertext ‖ SIV`) and
/// return the inner attribute buffer.
///
/// An authentication failure returns [`Error::CryptoVerifyFailure`] and no
/// plaintext.
pub fn unwrap(
    ad0: Option<&[u8]>,
    ad1: Option<&[u8]>,
    key: &[u8],
    wrapped: &[u8],
) -> Result<Zeroizing<Vec<u8>>> {
    if wrapped.len() < SIV_TAG_LEN {
        return Err(Error::MalformedInput);
    }
    let (ciphertext, tag) = wrapped.split_at(wrapped.len() - SIV_TAG_LEN);
    let tag = GenericArray::from_slice(tag);

    let headers = siv_headers(ad0, ad1);
    let mut body = Zeroizing::new(ciphertext.to_vec());

    match key.len() {
        32 => Aes128Siv::new_from_slice(key)
            .map_err(|_| Error::UnsupportedParameter)?
            .decrypt_in_place_detached(&headers, &mut body, tag)
            .map_err(|_| Error::CryptoVerifyFailure)?,
        48 => Aes192Siv::new_from_slice(key)
            .map_err(|_| Error::UnsupportedParameter)?
            .decrypt_in_place_detached(&headers, &mut body, tag)
            .map_err(|_| Error::CryptoVerifyFailure)?,
        64 => Aes256Siv::new_from_slice(key)
            .map_err(|_| Error::UnsupportedParameter)?
            .decrypt_in_place_detached(&headers, &mut body, tag)
            .map_err(|_| Error::CryptoVerifyFailure)?,
        _ => return Err(Error::UnsupportedParameter),
    }

    Ok(body)
}

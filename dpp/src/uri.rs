//! Bootstrapping-URI codec.
//!
//! A bootstrapping URI is the ASCII string printed in a QR code or carried
//! over NFC/Bluetooth, e.g.:
//!
//! ```text
//! DPP:C:81/1,115/36;I:SN=4774LH2b4044;M:5254005828e5;V:2;K:MDkwEwYHK...;;
//! ```
//!
//! It starts with the literal `DPP:`, carries single-letter tokens separated
//! by `;` and is terminated by `;;`. The base64 `K:` token (the peer's
//! bootstrapping public key as a SubjectPublicKeyInfo) is the only mandatory
//! one.

use std::collections::BTreeSet;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::band;
use crate::ecc::Point;
use crate::errors::{Error, Result};
use crate::spki;

/// Parsed contents of a bootstrapping URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriInfo {
    /// The peer's bootstrapping public key (`K:`, mandatory)
    pub boot_public: Point,
    /// Station MAC address hint (`M:`)
    pub mac: Option<[u8; 6]>,
    /// Protocol version, 1 or 2 (`V:`)
    pub version: Option<u8>,
    /// Listen frequencies in MHz, resolved from the `C:` class/channel list
    pub freqs: Option<BTreeSet<u32>>,
    /// Free-form information string (`I:`)
    pub information: Option<String>,
    /// Host name or address for bootstrapping over TCP (`H:`)
    pub host: Option<String>,
}

fn parse_decimal_u8(text: &str) -> Result<u8> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::MalformedInput);
    }
    text.parse().map_err(|_| Error::MalformedInput)
}

fn parse_class_and_channel(value: &str) -> Result<BTreeSet<u32>> {
    let mut freqs = BTreeSet::new();

    for entry in value.split(',') {
        let (class, channel) = entry.split_once('/').ok_or(Error::MalformedInput)?;
        let class = parse_decimal_u8(class)?;
        let channel = parse_decimal_u8(channel)?;

        let freq = band::freq_of(class, channel).ok_or(Error::UnsupportedParameter)?;
        freqs.insert(freq);
    }

    Ok(freqs)
}

fn parse_mac(value: &str) -> Result<[u8; 6]> {
    let bytes = value.as_bytes();
    if bytes.len() != 12 || !bytes.iter().all(u8::is_ascii_hexdigit) {
        return Err(Error::MalformedInput);
    }

    let mut mac = [0u8; 6];
    for (i, octet) in mac.iter_mut().enumerate() {
        *octet = u8::from_str_radix(&value[i * 2..i * 2 + 2], 16)
            .map_err(|_| Error::MalformedInput)?;
    }

    // Group addresses are not valid station addresses
    if mac[0] & 0x01 != 0 {
        return Err(Error::MalformedInput);
    }

    Ok(mac)
}

fn parse_version(value: &str) -> Result<u8> {
    match value {
        "1" => Ok(1),
        "2" => Ok(2),
        _ => Err(Error::UnsupportedParameter),
    }
}

fn parse_key(value: &str) -> Result<Point> {
    let decoded = BASE64.decode(value).map_err(|_| Error::MalformedInput)?;
    spki::spki_decode(&decoded)
}

/// Parse a bootstrapping URI.
///
/// The token values are verified beyond the grammar: the bootstrapping key
/// must decode to a point on a supported curve, every class/channel pair
/// must map to a known frequency, the version must be 1 or 2 and the MAC
/// must be a valid station address. Any failure yields a single
/// "invalid URI" error with no partial result.
pub fn parse_uri(uri: &str) -> Result<UriInfo> {
    let rest = uri.strip_prefix("DPP:").ok_or(Error::MalformedInput)?;
    let body = rest.strip_suffix(";;").ok_or(Error::MalformedInput)?;

    let mut boot_public = None;
    let mut mac = None;
    let mut version = None;
    let mut freqs = None;
    let mut information = None;
    let mut host = None;

    for token in body.split(';') {
        let bytes = token.as_bytes();
        // One ASCII letter, a colon, and a non-empty value
        if bytes.len() < 3 || bytes[1] != b':' {
            return Err(Error::MalformedInput);
        }
        let value = &token[2..];

        let duplicate = match bytes[0] {
            b'C' => freqs.replace(parse_class_and_channel(value)?).is_some(),
            b'M' => mac.replace(parse_mac(value)?).is_some(),
            b'V' => version.replace(parse_version(value)?).is_some(),
            b'K' => boot_public.replace(parse_key(value)?).is_some(),
            b'I' => information.replace(value.to_string()).is_some(),
            b'H' => host.replace(value.to_string()).is_some(),
            _ => return Err(Error::MalformedInput),
        };
        if duplicate {
            return Err(Error::MalformedInput);
        }
    }

    // The public bootstrapping key is the only required token
    let boot_public = boot_public.ok_or(Error::MalformedInput)?;

    Ok(UriInfo {
        boot_public,
        mac,
        version,
        freqs,
        information,
        host,
    })
}

fn append_freqs(uri: &mut String, freqs: &BTreeSet<u32>) -> Result<()> {
    uri.push_str("C:");

    let mut first = true;
    for &freq in freqs {
        let (class, channel) = band::class_of(freq).ok_or(Error::UnsupportedParameter)?;
        if !first {
            uri.push(',');
        }
        uri.push_str(&format!("{class}/{channel}"));
        first = false;
    }

    uri.push(';');
    Ok(())
}

fn check_text_token(value: &str) -> Result<()> {
    if value.is_empty() || value.contains(';') {
        return Err(Error::MalformedInput);
    }
    Ok(())
}

/// Emit a bootstrapping URI.
///
/// The key token always comes first; the optional tokens follow in `M:`,
/// `C:`, `I:`, `H:`, `V:` order.
pub fn generate_uri(info: &UriInfo) -> Result<String> {
    let mut uri = String::with_capacity(256);

    uri.push_str("DPP:K:");
    uri.push_str(&BASE64.encode(spki::spki_encode(&info.boot_public)?));
    uri.push(';');

    if let Some(mac) = &info.mac {
        uri.push_str(&format!(
            "M:{:02x}{:02x}{:02x}{:02x}{:02x}{:02x};",
            mac[0], mac[1], mac[2], mac[3], mac[4], mac[5]
        ));
    }

    if let Some(freqs) = &info.freqs {
        if freqs.is_empty() {
            return Err(Error::MalformedInput);
        }
        append_freqs(&mut uri, freqs)?;
    }

    if let Some(information) = &info.information {
        check_text_token(information)?;
        uri.push_str(&format!("I:{information};"));
    }

    if let Some(host) = &info.host {
        check_text_token(host)?;
        uri.push_str(&format!("H:{host};"));
    }

    if let Some(version) = info.version {
        if version != 1 && version != 2 {
            return Err(Error::UnsupportedParameter);
        }
        uri.push_str(&format!("V:{version};"));
    }

    uri.push(';');
    Ok(uri)
}

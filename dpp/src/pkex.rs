//! PKEX key schedule: password-authenticated exchange of bootstrapping
//! keys.
//!
//! Derives the role-blinded base points `Qi`/`Qr`, the exchange secret `z`
//! and the commit-reveal tags `u`/`v` from a shared code, an optional code
//! identifier and the two station MAC addresses.
//!
//! Whether the MAC addresses enter the derivations depends on the protocol
//! version negotiated by the host; every function here takes them as an
//! `Option` and both sides of a session must make the same choice.

use zeroize::Zeroizing;

use crate::ecc::{CurveId, Point, PointEncoding, Scalar};
use crate::errors::{Error, Result};
use crate::kdf;

/// WFA Easy Connect v3.0 C.1 role-specific element `Pi` for NIST P-256
const PKEX_INITIATOR_P256: [u8; 64] = [
    // X
    0x56, 0x26, 0x12, 0xcf, 0x36, 0x48, 0xfe, 0x0b, 0x07, 0x04, 0xbb, 0x12, 0x22, 0x50, 0xb2,
    0x54, 0xb1, 0x94, 0x64, 0x7e, 0x54, 0xce, 0x08, 0x07, 0x2e, 0xec, 0xca, 0x74, 0x5b, 0x61,
    0x2d, 0x25,
    // Y
    0x3e, 0x44, 0xc7, 0xc9, 0x8c, 0x1c, 0xa1, 0x0b, 0x20, 0x09, 0x93, 0xb2, 0xfd, 0xe5, 0x69,
    0xdc, 0x75, 0xbc, 0xad, 0x33, 0xc1, 0xe7, 0xc6, 0x45, 0x4d, 0x10, 0x1e, 0x6a, 0x3d, 0x84,
    0x3c, 0xa4,
];

/// WFA Easy Connect v3.0 C.1 role-specific element `Pr` for NIST P-256
const PKEX_RESPONDER_P256: [u8; 64] = [
    // X
    0x1e, 0xa4, 0x8a, 0xb1, 0xa4, 0xe8, 0x42, 0x39, 0xad, 0x73, 0x07, 0xf2, 0x34, 0xdf, 0x57,
    0x4f, 0xc0, 0x9d, 0x54, 0xbe, 0x36, 0x1b, 0x31, 0x0f, 0x59, 0x91, 0x52, 0x33, 0xac, 0x19,
    0x9d, 0x76,
    // Y
    0xd9, 0xfb, 0xf6, 0xb9, 0xf5, 0xfa, 0xdf, 0x19, 0x58, 0xd8, 0x3e, 0xc9, 0x89, 0x7a, 0x35,
    0xc1, 0xbd, 0xe9, 0x0b, 0x77, 0x7a, 0xcb, 0x91, 0x2a, 0xe8, 0x21, 0x3f, 0x47, 0x52, 0x02,
    0x4d, 0x67,
];

/// `Q = H([MAC ‖] [identifier ‖] code) · P` for a role-specific `P`
fn derive_q(
    curve: CurveId,
    role_point: &[u8; 64],
    code: &str,
    identifier: Option<&str>,
    mac: Option<&[u8; 6]>,
) -> Result<Point> {
    let mut parts: Vec<&[u8]> = Vec::with_capacity(3);
    if let Some(mac) = mac {
        parts.push(mac.as_slice());
    }
    if let Some(identifier) = identifier {
        parts.push(identifier.as_bytes());
    }
    parts.push(code.as_bytes());

    let digest = kdf::hash(curve.hash(), &parts);
    let scalar = Scalar::reduce_from_hash(curve, &digest)?;

    Point::from_data(curve, PointEncoding::Full, role_point)?.mul(&scalar)
}

/// Initiator base point `Qi = H([MAC-Initiator ‖] [identifier ‖] code) · Pi`.
///
/// Only P-256 carries published role-specific elements.
pub fn derive_qi(
    curve: CurveId,
    code: &str,
    identifier: Option<&str>,
    mac_initiator: Option<&[u8; 6]>,
) -> Result<Point> {
    match curve {
        CurveId::P256 => derive_q(curve, &PKEX_INITIATOR_P256, code, identifier, mac_initiator),
        _ => Err(Error::UnsupportedParameter),
    }
}

/// Responder base point `Qr = H([MAC-Responder ‖] [identifier ‖] code) · Pr`
pub fn derive_qr(
    curve: CurveId,
    code: &str,
    identifier: Option<&str>,
    mac_responder: Option<&[u8; 6]>,
) -> Result<Point> {
    match curve {
        CurveId::P256 => derive_q(curve, &PKEX_RESPONDER_P256, code, identifier, mac_responder),
        _ => Err(Error::UnsupportedParameter),
    }
}

fn same_curve(points: &[&Point]) -> Result<CurveId> {
    let curve = points[0].curve();
    if points.iter().any(|p| p.curve() != curve) {
        return Err(Error::CryptoVerifyFailure);
    }
    Ok(curve)
}

/// Exchange secret `z = prf+(HKDF-Extract(<>, K.x), [macs ‖] M.x ‖ N.x ‖ code)`
pub fn derive_z(
    mac_i: Option<&[u8; 6]>,
    mac_r: Option<&[u8; 6]>,
    m: &Point,
    n: &Point,
    k: &Point,
    code: &str,
) -> Result<Zeroizing<Vec<u8>>> {
    let curve = same_curve(&[m, n, k])?;
    let hash = curve.hash();

    let kx = k.x();
    let mx = m.x();
    let nx = n.x();

    let prk = kdf::hkdf_extract(hash, None, &[&kx]);

    let mut parts: Vec<&[u8]> = Vec::with_capacity(5);
    if let Some(mac) = mac_i {
        parts.push(mac.as_slice());
    }
    if let Some(mac) = mac_r {
        parts.push(mac.as_slice());
    }
    parts.push(&mx);
    parts.push(&nx);
    parts.push(code.as_bytes());

    kdf::prf_plus(hash, &prk, curve.scalar_bytes(), &parts)
}

/// Initiator commit-reveal tag
/// `u = HMAC(J.x, [MAC-Initiator ‖] A.x ‖ Y'.x ‖ X.x)`.
///
/// The responder computes the same shape over its own view (`J'`, `A'`,
/// `Y`, `X'`); the byte order inside the MAC is invariant.
pub fn derive_u(
    j: &Point,
    mac_i: Option<&[u8; 6]>,
    a: &Point,
    y: &Point,
    x: &Point,
) -> Result<Zeroizing<Vec<u8>>> {
    let curve = same_curve(&[j, a, y, x])?;

    let jx = j.x();
    let ax = a.x();
    let yx = y.x();
    let xx = x.x();

    let mut parts: Vec<&[u8]> = Vec::with_capacity(4);
    if let Some(mac) = mac_i {
        parts.push(mac.as_slice());
    }
    parts.push(&ax);
    parts.push(&yx);
    parts.push(&xx);

    Ok(kdf::hmac(curve.hash(), &jx, &parts))
}

/// Responder commit-reveal tag
/// `v = HMAC(L.x, [MAC-Responder ‖] B.x ‖ X'.x ‖ Y.x)`
pub fn derive_v(
    l: &Point,
    mac_r: Option<&[u8; 6]>,
    b: &Point,
    x: &Point,
    y: &Point,
) -> Result<Zeroizing<Vec<u8>>> {
    let curve = same_curve(&[l, b, x, y])?;

    let lx = l.x();
    let bx = b.x();
    let xx = x.x();
    let yx = y.x();

    let mut parts: Vec<&[u8]> = Vec::with_capacity(4);
    if let Some(mac) = mac_r {
        parts.push(mac.as_slice());
    }
    parts.push(&bx);
    parts.push(&xx);
    parts.push(&yx);

    Ok(kdf::hmac(curve.hash(), &lx, &parts))
}

//! SubjectPublicKeyInfo codec for the bootstrapping key carried in the URI
//! `K:` token.
//!
//! The encoded form is fixed:
//!
//! ```text
//! SEQUENCE {
//!     SEQUENCE { OID ecPublicKey, OID prime256v1 | secp384r1 },
//!     BIT STRING { 0 unused bits, SEC1 compressed point }
//! }
//! ```
//!
//! which is exactly 59 bytes for P-256 and 72 bytes for P-384. Decoding is
//! strict: both OIDs must match, the BIT STRING must have no unused bits and
//! the point must lie on the curve.

use const_oid::db::rfc5912::{ID_EC_PUBLIC_KEY, SECP_256_R_1, SECP_384_R_1};
use der::asn1::BitString;
use der::{Any, Decode, Encode, Tag};
use ::spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned, SubjectPublicKeyInfoRef};

use crate::ecc::{CurveId, Point};
use crate::errors::{Error, Result};

/// Encode a public point as a SubjectPublicKeyInfo with a compressed
/// SEC1 point whose tag byte matches the y-coordinate's parity
pub fn spki_encode(point: &Point) -> Result<Vec<u8>> {
    let curve_oid = match point.curve() {
        CurveId::P256 => SECP_256_R_1,
        CurveId::P384 => SECP_384_R_1,
    };

    let parameters = Any::new(Tag::ObjectIdentifier, curve_oid.as_bytes())
        .map_err(|_| Error::MalformedInput)?;
    let subject_public_key =
        BitString::from_bytes(&point.to_sec1_compressed()).map_err(|_| Error::MalformedInput)?;

    let info = SubjectPublicKeyInfoOwned {
        algorithm: AlgorithmIdentifierOwned {
            oid: ID_EC_PUBLIC_KEY,
            parameters: Some(parameters),
        },
        subject_public_key,
    };

    info.to_der().map_err(|_| Error::ResourceExhaustion)
}

/// Decode a SubjectPublicKeyInfo into a public point on P-256 or P-384
pub fn spki_decode(bytes: &[u8]) -> Result<Point> {
    let info = SubjectPublicKeyInfoRef::from_der(bytes).map_err(|_| Error::MalformedInput)?;

    if info.algorithm.oid != ID_EC_PUBLIC_KEY {
        return Err(Error::MalformedInput);
    }

    let curve_oid = info
        .algorithm
        .parameters_oid()
        .map_err(|_| Error::MalformedInput)?;
    let curve = if curve_oid == SECP_256_R_1 {
        CurveId::P256
    } else if curve_oid == SECP_384_R_1 {
        CurveId::P384
    } else {
        return Err(Error::UnsupportedParameter);
    };

    // as_bytes() is None when the BIT STRING declares unused bits
    let key = info
        .subject_public_key
        .as_bytes()
        .ok_or(Error::MalformedInput)?;

    Point::from_sec1_bytes(curve, key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecc::PointEncoding;
    use hex_literal::hex;

    // Easy Connect B.1 responder bootstrapping key and its encoding
    const R_BOOT_PUBLIC: [u8; 64] = hex!(
        "09c585a91b4df9fd25a045201885c39cc5cfae397ddaeda957dec57fa0e3503f"
        "52bf05968198a2f92883e96a386d767579883302dbf292105c90a43694c2fd5c"
    );
    const R_BOOT_ASN1: [u8; 59] = hex!(
        "3039301306072a8648ce3d020106082a8648ce3d0301070322000209c585a91b"
        "4df9fd25a045201885c39cc5cfae397ddaeda957dec57fa0e3503f"
    );

    // B.1 initiator bootstrapping key, also with an even y
    const I_BOOT_PUBLIC: [u8; 64] = hex!(
        "88b37ed91938b5197097808a6244847617892046d93b9501afd48fa0f148dfde"
        "00f73b6991287884a9c9a33f8e0691f14d44b59811e9d8242d010270b0d33ec0"
    );
    const I_BOOT_ASN1: [u8; 59] = hex!(
        "3039301306072a8648ce3d020106082a8648ce3d0301070322000288b37ed919"
        "38b5197097808a6244847617892046d93b9501afd48fa0f148dfde"
    );

    fn r_boot_point() -> Point {
        Point::from_data(CurveId::P256, PointEncoding::Full, &R_BOOT_PUBLIC).unwrap()
    }

    #[test]
    fn encoding_is_bit_exact() {
        assert_eq!(spki_encode(&r_boot_point()).unwrap(), R_BOOT_ASN1);

        let i_boot =
            Point::from_data(CurveId::P256, PointEncoding::Full, &I_BOOT_PUBLIC).unwrap();
        assert_eq!(spki_encode(&i_boot).unwrap(), I_BOOT_ASN1);
    }

    #[test]
    fn p256_encoding_is_59_bytes() {
        assert_eq!(spki_encode(&r_boot_point()).unwrap().len(), 59);
    }

    #[test]
    fn decode_round_trips() {
        let point = r_boot_point();
        let decoded = spki_decode(&spki_encode(&point).unwrap()).unwrap();
        assert_eq!(decoded, point);

        let p384 = Point::generator(CurveId::P384);
        let encoded = spki_encode(&p384).unwrap();
        assert_eq!(encoded.len(), 72);
        assert_eq!(spki_decode(&encoded).unwrap(), p384);
    }

    #[test]
    fn decode_rejects_wrong_algorithm_oid() {
        let mut bytes = R_BOOT_ASN1;
        bytes[12] ^= 1;
        assert!(spki_decode(&bytes).is_err());
    }

    #[test]
    fn decode_rejects_unknown_curve_oid() {
        let mut bytes = R_BOOT_ASN1;
        // Last byte of the curve OID
        bytes[22] ^= 1;
        assert!(spki_decode(&bytes).is_err());
    }

    #[test]
    fn decode_rejects_nonzero_unused_bits() {
        let mut bytes = R_BOOT_ASN1;
        assert_eq!(bytes[25], 0x00);
        bytes[25] = 0x01;
        assert!(spki_decode(&bytes).is_err());
    }

    #[test]
    fn decode_rejects_a_bad_point_tag() {
        let mut bytes = R_BOOT_ASN1;
        assert_eq!(bytes[26], 0x02);
        bytes[26] = 0x05;
        assert_eq!(spki_decode(&bytes), Err(Error::MalformedInput));
    }

    #[test]
    fn decode_rejects_trailing_data() {
        let mut bytes = R_BOOT_ASN1.to_vec();
        bytes.push(0x00);
        assert_eq!(spki_decode(&bytes), Err(Error::MalformedInput));
    }

    #[test]
    fn decode_rejects_truncation() {
        assert!(spki_decode(&R_BOOT_ASN1[..58]).is_err());
    }
}

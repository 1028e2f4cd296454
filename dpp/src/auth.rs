//! DPP Authentication key schedule.
//!
//! Derives the intermediate keys `k1` and `k2`, the session key `ke`, the
//! mutual-authentication secret `L` and the confirmation tags `R-auth` and
//! `I-auth`. The host state machine drives the frame exchange; this module
//! only computes.
//!
//! Naming follows the protocol: `bI`/`bR` are the bootstrap private keys
//! with public points `BI`/`BR`, `pI`/`pR` the ephemeral protocol keys with
//! public points `PI`/`PR`. Mutual authentication is in use exactly when the
//! initiator's bootstrapping key is known to both sides; all derivations
//! here take that key as an `Option` and the caller must pass it
//! consistently for the whole session.

use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::ecc::{ecdh, CurveId, Point, Scalar};
use crate::errors::{Error, Result};
use crate::kdf;

fn session_curve(points: &[&Point]) -> Result<CurveId> {
    let curve = points[0].curve();
    if points.iter().any(|p| p.curve() != curve) {
        return Err(Error::CryptoVerifyFailure);
    }
    Ok(curve)
}

fn check_nonce_len(curve: CurveId, nonce: &[u8]) -> Result<()> {
    if nonce.len() != curve.nonce_bytes() {
        return Err(Error::MalformedInput);
    }
    Ok(())
}

/// Derive `k1` from a peer protocol key and an own private key.
///
/// The responder passes (`PI`, `bR`), the initiator (`BR`, `pI`); both reach
/// the same secret `M`. Returns `k1` together with `M`'s x-coordinate, which
/// [`derive_ke`] consumes later.
pub fn derive_k1(peer_public: &Point, own_private: &Scalar) -> Result<(Zeroizing<Vec<u8>>, Scalar)> {
    let m = ecdh(own_private, peer_public)?;
    let curve = m.curve();

    let k1 = kdf::hkdf(
        curve.hash(),
        None,
        b"first intermediate key",
        &m.to_bytes(),
        curve.scalar_bytes(),
    )?;

    Ok((k1, m))
}

/// Derive `k2` from a peer protocol key and an own protocol private key.
///
/// The responder passes (`PI`, `pR`), the initiator (`PR`, `pI`); both reach
/// the same secret `N`. Returns `k2` together with `N`'s x-coordinate.
pub fn derive_k2(peer_public: &Point, own_private: &Scalar) -> Result<(Zeroizing<Vec<u8>>, Scalar)> {
    let n = ecdh(own_private, peer_public)?;
    let curve = n.curve();

    let k2 = kdf::hkdf(
        curve.hash(),
        None,
        b"second intermediate key",
        &n.to_bytes(),
        curve.scalar_bytes(),
    )?;

    Ok((k2, n))
}

/// Initiator-side mutual-authentication secret: `L = bI · (BR + PR)`
pub fn derive_li(
    r_boot_public: &Point,
    r_proto_public: &Point,
    i_boot_private: &Scalar,
) -> Result<Point> {
    r_boot_public.add(r_proto_public)?.mul(i_boot_private)
}

/// Responder-side mutual-authentication secret: `L = ((bR + pR) mod n) · BI`.
///
/// The sum is reduced modulo the group order before the multiplication; both
/// sides then agree on `L.x`.
pub fn derive_lr(
    r_boot_private: &Scalar,
    r_proto_private: &Scalar,
    i_boot_public: &Point,
) -> Result<Point> {
    let sum = r_boot_private.add_mod_n(r_proto_private)?;
    i_boot_public.mul(&sum)
}

/// Derive the session key `ke`.
///
/// `bk = HKDF-Extract(I-nonce ‖ R-nonce, M.x ‖ N.x [‖ L.x])` and
/// `ke = HKDF-Expand(bk, "DPP Key", key_len)`. `l` is present exactly when
/// the session uses mutual authentication.
pub fn derive_ke(
    i_nonce: &[u8],
    r_nonce: &[u8],
    m: &Scalar,
    n: &Scalar,
    l: Option<&Point>,
) -> Result<Zeroizing<Vec<u8>>> {
    let curve = m.curve();
    if n.curve() != curve {
        return Err(Error::CryptoVerifyFailure);
    }
    check_nonce_len(curve, i_nonce)?;
    check_nonce_len(curve, r_nonce)?;

    let lx = match l {
        Some(l) => {
            if l.curve() != curve {
                return Err(Error::CryptoVerifyFailure);
            }
            Some(l.x())
        }
        None => None,
    };

    let mut salt = Vec::with_capacity(i_nonce.len() * 2);
    salt.extend_from_slice(i_nonce);
    salt.extend_from_slice(r_nonce);

    let mx = m.to_bytes();
    let nx = n.to_bytes();
    let mut ikm: Vec<&[u8]> = vec![&mx, &nx];
    if let Some(lx) = &lx {
        ikm.push(lx);
    }

    let bk = kdf::hkdf_extract(curve.hash(), Some(&salt), &ikm);
    kdf::hkdf_expand(curve.hash(), &bk, b"DPP Key", curve.scalar_bytes())
}

/// Responder confirmation tag:
/// `R-auth = H(I-nonce ‖ R-nonce ‖ PI.x ‖ PR.x ‖ [BI.x ‖] BR.x ‖ 0)`
pub fn derive_r_auth(
    i_nonce: &[u8],
    r_nonce: &[u8],
    i_proto_public: &Point,
    r_proto_public: &Point,
    i_boot_public: Option<&Point>,
    r_boot_public: &Point,
) -> Result<Zeroizing<Vec<u8>>> {
    let mut points = vec![i_proto_public, r_proto_public, r_boot_public];
    points.extend(i_boot_public);
    let curve = session_curve(&points)?;
    check_nonce_len(curve, i_nonce)?;
    check_nonce_len(curve, r_nonce)?;

    let pix = i_proto_public.x();
    let prx = r_proto_public.x();
    let brx = r_boot_public.x();
    let bix = i_boot_public.map(Point::x);

    let mut parts: Vec<&[u8]> = vec![i_nonce, r_nonce, &pix, &prx];
    if let Some(bix) = &bix {
        parts.push(bix);
    }
    parts.push(&brx);
    parts.push(&[0x00]);

    Ok(Zeroizing::new(kdf::hash(curve.hash(), &parts)))
}

/// Initiator confirmation tag:
/// `I-auth = H(R-nonce ‖ I-nonce ‖ PR.x ‖ PI.x ‖ BR.x ‖ [BI.x ‖] 1)`
///
/// The trailing octet domain-separates the two tags and must never be
/// dropped.
pub fn derive_i_auth(
    r_nonce: &[u8],
    i_nonce: &[u8],
    r_proto_public: &Point,
    i_proto_public: &Point,
    r_boot_public: &Point,
    i_boot_public: Option<&Point>,
) -> Result<Zeroizing<Vec<u8>>> {
    let mut points = vec![r_proto_public, i_proto_public, r_boot_public];
    points.extend(i_boot_public);
    let curve = session_curve(&points)?;
    check_nonce_len(curve, i_nonce)?;
    check_nonce_len(curve, r_nonce)?;

    let prx = r_proto_public.x();
    let pix = i_proto_public.x();
    let brx = r_boot_public.x();
    let bix = i_boot_public.map(Point::x);

    let mut parts: Vec<&[u8]> = vec![r_nonce, i_nonce, &prx, &pix, &brx];
    if let Some(bix) = &bix {
        parts.push(bix);
    }
    parts.push(&[0x01]);

    Ok(Zeroizing::new(kdf::hash(curve.hash(), &parts)))
}

/// Compare a computed confirmation tag against a received one in constant
/// time
pub fn verify_auth_tag(expected: &[u8], received: &[u8]) -> Result<()> {
    if expected.ct_eq(received).into() {
        Ok(())
    } else {
        Err(Error::CryptoVerifyFailure)
    }
}

/// The public inputs both confirmation tags are computed over.
///
/// `i_boot_public` is present exactly when the session uses mutual
/// authentication; [`AuthTranscript::r_auth`] and [`AuthTranscript::i_auth`]
/// then include `BI.x` and [`derive_ke`] should be fed the matching `L`.
#[derive(Debug, Clone)]
pub struct AuthTranscript {
    /// Initiator nonce
    pub i_nonce: Vec<u8>,
    /// Responder nonce
    pub r_nonce: Vec<u8>,
    /// Initiator protocol public key `PI`
    pub i_proto_public: Point,
    /// Responder protocol public key `PR`
    pub r_proto_public: Point,
    /// Initiator bootstrapping public key `BI`, when mutually authenticating
    pub i_boot_public: Option<Point>,
    /// Responder bootstrapping public key `BR`
    pub r_boot_public: Point,
}

impl AuthTranscript {
    /// Whether this session mutually authenticates
    pub fn is_mutual(&self) -> bool {
        self.i_boot_public.is_some()
    }

    /// Compute `R-auth` over this transcript
    pub fn r_auth(&self) -> Result<Zeroizing<Vec<u8>>> {
        derive_r_auth(
            &self.i_nonce,
            &self.r_nonce,
            &self.i_proto_public,
            &self.r_proto_public,
            self.i_boot_public.as_ref(),
            &self.r_boot_public,
        )
    }

    /// Compute `I-auth` over this transcript
    pub fn i_auth(&self) -> Result<Zeroizing<Vec<u8>>> {
        derive_i_auth(
            &self.r_nonce,
            &self.i_nonce,
            &self.r_proto_public,
            &self.i_proto_public,
            &self.r_boot_public,
            self.i_boot_public.as_ref(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecc::PointEncoding;
    use hex_literal::hex;

    // Easy Connect appendix B.1/B.2 key material (P-256)
    const I_PROTO_PUBLIC: [u8; 64] = hex!(
        "50a532ae2a07207276418d2fa630295d45569be425aa634f02014d00a7d1f61a"
        "e14f35a5a858bccad90d126c46594c49ef82655e78888e15a32d916ac2172491"
    );
    const I_PROTO_PRIVATE: [u8; 32] =
        hex!("a87de9afbb406c96e5f79a3df895ecac3ad406f95da66314c8cb3165e0c61783");
    const I_BOOT_PUBLIC: [u8; 64] = hex!(
        "88b37ed91938b5197097808a6244847617892046d93b9501afd48fa0f148dfde"
        "00f73b6991287884a9c9a33f8e0691f14d44b59811e9d8242d010270b0d33ec0"
    );
    const I_BOOT_PRIVATE: [u8; 32] =
        hex!("15b2a83c5a0a38b61f2aa8200ee4994b8afdc01c58507d10d0a38f7eedf051bb");
    const I_NONCE: [u8; 16] = hex!("13f4602a16daeb69712263b9c46cba31");

    const R_PROTO_PUBLIC: [u8; 64] = hex!(
        "5e3fb3576884887f17c3203d8a3a6c2fac722ef0e2201b61ac73bc655c709a90"
        "2d4b030669fb9eff8b0a79fa7c1a172ac2a92c626256963f9274dc90682c81e5"
    );
    const R_PROTO_PRIVATE: [u8; 32] =
        hex!("f798ed2e19286f6a6efe210b1863badb99af2a14b497634dbfd2a97394fb5aa5");
    const R_BOOT_PUBLIC: [u8; 64] = hex!(
        "09c585a91b4df9fd25a045201885c39cc5cfae397ddaeda957dec57fa0e3503f"
        "52bf05968198a2f92883e96a386d767579883302dbf292105c90a43694c2fd5c"
    );
    const R_BOOT_PRIVATE: [u8; 32] =
        hex!("54ce181a98525f217216f59b245f60e9df30ac7f6b26c939418cfc3c42d1afa0");
    const R_NONCE: [u8; 16] = hex!("3d0cfb011ca916d796f7029ff0b43393");

    const K1: [u8; 32] = hex!("3d832a02ed6d7fc1dc96d2eceab738cf01c0028eb256be33d5a21a720bfcf949");
    const K2: [u8; 32] = hex!("ca08bdeeef838ddf897a5f01f20bb93dc5a895cb86788ca8c00a7664899bc310");
    const MX: [u8; 32] = hex!("dde2878117d69745be4f916a2dd14269d783d1d788c603bb8746beabbd1dbbbc");
    const NX: [u8; 32] = hex!("92118478b75c21c2c59340c842b5bce560a535f60bc37a75fe390d738c58d8e8");
    const LX: [u8; 32] = hex!("fb737234c973cc3a36e64e5170a32f12089d198c73c2fd85a53d0b282530fd02");

    const KE_MUTUAL: [u8; 32] =
        hex!("b6db65526c9a0174c3bed56f7e614f3a656233c078693249ac3516425127e5d5");
    const R_AUTH_MUTUAL: [u8; 32] =
        hex!("a725abe6dc66ccf3aa3d6d61a19932fcbb0799ed09ff78e5bc6d4ea5ef8e8670");
    const I_AUTH_MUTUAL: [u8; 32] =
        hex!("d34944bb4b1f05caebda762c6e4ae034c819ec2f62a57dcfade2473876e007b2");

    const KE_RESPONDER_ONLY: [u8; 32] =
        hex!("c8882a8ab30c878467822534138c704ede0ab1e873fe03b601a7908463fec87a");
    const R_AUTH_RESPONDER_ONLY: [u8; 32] =
        hex!("43509ef7137d8c2fbe66d802ae09dedd94d41b8cbfafb4954782014ff4a3f91c");
    const I_AUTH_RESPONDER_ONLY: [u8; 32] =
        hex!("787d1189b526448d2901e7f6c22775ce514fce52fc886c1e924f2fbb8d97b210");

    fn point(data: &[u8; 64]) -> Point {
        Point::from_data(CurveId::P256, PointEncoding::Full, data).unwrap()
    }

    fn scalar(data: &[u8; 32]) -> Scalar {
        Scalar::from_bytes(CurveId::P256, data).unwrap()
    }

    #[test]
    fn k1_matches_the_published_vector() {
        // Responder view
        let (k1, m) = derive_k1(&point(&I_PROTO_PUBLIC), &scalar(&R_BOOT_PRIVATE)).unwrap();
        assert_eq!(&k1[..], K1);
        assert_eq!(&m.to_bytes()[..], MX);

        // Initiator view reaches the same secret
        let (k1, m) = derive_k1(&point(&R_BOOT_PUBLIC), &scalar(&I_PROTO_PRIVATE)).unwrap();
        assert_eq!(&k1[..], K1);
        assert_eq!(&m.to_bytes()[..], MX);
    }

    #[test]
    fn k2_matches_the_published_vector() {
        let (k2, n) = derive_k2(&point(&I_PROTO_PUBLIC), &scalar(&R_PROTO_PRIVATE)).unwrap();
        assert_eq!(&k2[..], K2);
        assert_eq!(&n.to_bytes()[..], NX);
    }

    #[test]
    fn both_l_derivations_agree_with_the_vector() {
        let li = derive_li(
            &point(&R_BOOT_PUBLIC),
            &point(&R_PROTO_PUBLIC),
            &scalar(&I_BOOT_PRIVATE),
        )
        .unwrap();
        assert_eq!(li.x(), LX);

        let lr = derive_lr(
            &scalar(&R_BOOT_PRIVATE),
            &scalar(&R_PROTO_PRIVATE),
            &point(&I_BOOT_PUBLIC),
        )
        .unwrap();
        assert_eq!(lr.x(), LX);
        assert_eq!(li.x(), lr.x());
    }

    #[test]
    fn mutual_session_keys_match_the_vector() {
        let (_, m) = derive_k1(&point(&I_PROTO_PUBLIC), &scalar(&R_BOOT_PRIVATE)).unwrap();
        let (_, n) = derive_k2(&point(&I_PROTO_PUBLIC), &scalar(&R_PROTO_PRIVATE)).unwrap();
        let l = derive_li(
            &point(&R_BOOT_PUBLIC),
            &point(&R_PROTO_PUBLIC),
            &scalar(&I_BOOT_PRIVATE),
        )
        .unwrap();

        let ke = derive_ke(&I_NONCE, &R_NONCE, &m, &n, Some(&l)).unwrap();
        assert_eq!(&ke[..], KE_MUTUAL);
    }

    #[test]
    fn responder_only_session_keys_match_the_vector() {
        let (_, m) = derive_k1(&point(&I_PROTO_PUBLIC), &scalar(&R_BOOT_PRIVATE)).unwrap();
        let (_, n) = derive_k2(&point(&I_PROTO_PUBLIC), &scalar(&R_PROTO_PRIVATE)).unwrap();

        let ke = derive_ke(&I_NONCE, &R_NONCE, &m, &n, None).unwrap();
        assert_eq!(&ke[..], KE_RESPONDER_ONLY);
    }

    #[test]
    fn mutual_confirmation_tags_match_the_vector() {
        let transcript = AuthTranscript {
            i_nonce: I_NONCE.to_vec(),
            r_nonce: R_NONCE.to_vec(),
            i_proto_public: point(&I_PROTO_PUBLIC),
            r_proto_public: point(&R_PROTO_PUBLIC),
            i_boot_public: Some(point(&I_BOOT_PUBLIC)),
            r_boot_public: point(&R_BOOT_PUBLIC),
        };

        assert!(transcript.is_mutual());
        assert_eq!(&transcript.r_auth().unwrap()[..], R_AUTH_MUTUAL);
        assert_eq!(&transcript.i_auth().unwrap()[..], I_AUTH_MUTUAL);
    }

    #[test]
    fn responder_only_confirmation_tags_match_the_vector() {
        let transcript = AuthTranscript {
            i_nonce: I_NONCE.to_vec(),
            r_nonce: R_NONCE.to_vec(),
            i_proto_public: point(&I_PROTO_PUBLIC),
            r_proto_public: point(&R_PROTO_PUBLIC),
            i_boot_public: None,
            r_boot_public: point(&R_BOOT_PUBLIC),
        };

        assert!(!transcript.is_mutual());
        assert_eq!(&transcript.r_auth().unwrap()[..], R_AUTH_RESPONDER_ONLY);
        assert_eq!(&transcript.i_auth().unwrap()[..], I_AUTH_RESPONDER_ONLY);
    }

    #[test]
    fn confirmation_tags_are_domain_separated() {
        // Swap every pairwise argument; the trailing octet still keeps the
        // tags distinct.
        let r_auth = derive_r_auth(
            &I_NONCE,
            &R_NONCE,
            &point(&I_PROTO_PUBLIC),
            &point(&R_PROTO_PUBLIC),
            None,
            &point(&R_BOOT_PUBLIC),
        )
        .unwrap();
        let i_auth = derive_i_auth(
            &I_NONCE,
            &R_NONCE,
            &point(&I_PROTO_PUBLIC),
            &point(&R_PROTO_PUBLIC),
            &point(&R_BOOT_PUBLIC),
            None,
        )
        .unwrap();

        assert_ne!(&r_auth[..], &i_auth[..]);
    }

    #[test]
    fn tag_verification_is_exact() {
        assert!(verify_auth_tag(&R_AUTH_MUTUAL, &R_AUTH_MUTUAL).is_ok());
        assert!(verify_auth_tag(&R_AUTH_MUTUAL, &I_AUTH_MUTUAL).is_err());
        assert!(verify_auth_tag(&R_AUTH_MUTUAL, &R_AUTH_MUTUAL[..31]).is_err());
    }

    #[test]
    fn wrong_nonce_length_is_rejected() {
        let (_, m) = derive_k1(&point(&I_PROTO_PUBLIC), &scalar(&R_BOOT_PRIVATE)).unwrap();
        let (_, n) = derive_k2(&point(&I_PROTO_PUBLIC), &scalar(&R_PROTO_PRIVATE)).unwrap();
        assert!(derive_ke(&I_NONCE[..15], &R_NONCE, &m, &n, None).is_err());
    }
}

//! Elliptic-curve backend adapter over the NIST P-256 and P-384 groups.
//!
//! Every [`Scalar`] and [`Point`] carries its curve with the value and all
//! binary operations reject mixed-curve inputs. Scalars are zeroized when
//! dropped; the point at infinity is never representable through the public
//! constructors and never returned from an operation.

use core::fmt;

use elliptic_curve::{
    bigint::{U256, U384},
    ops::Reduce,
    sec1::{FromEncodedPoint, ToEncodedPoint},
    Field, PrimeField,
};
use rand_core::{CryptoRng, RngCore};
use zeroize::{Zeroize, Zeroizing};

use crate::errors::{Error, Result};
use crate::kdf::HashId;

/// Curve negotiated for a DPP session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CurveId {
    /// NIST P-256 (prime256v1)
    P256,
    /// NIST P-384 (secp384r1)
    P384,
}

impl CurveId {
    /// Width of a scalar or coordinate in bytes
    pub const fn scalar_bytes(self) -> usize {
        match self {
            CurveId::P256 => 32,
            CurveId::P384 => 48,
        }
    }

    /// Width of an uncompressed point (x ‖ y) in bytes
    pub const fn point_bytes(self) -> usize {
        self.scalar_bytes() * 2
    }

    /// Protocol nonce length paired with this curve
    pub const fn nonce_bytes(self) -> usize {
        match self {
            CurveId::P256 => 16,
            CurveId::P384 => 24,
        }
    }

    /// Digest paired with this curve's key length
    pub const fn hash(self) -> HashId {
        match self {
            CurveId::P256 => HashId::Sha256,
            CurveId::P384 => HashId::Sha384,
        }
    }
}

/// Accepted serializations for [`Point::from_data`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointEncoding {
    /// Raw affine coordinates, `x ‖ y`
    Full,
    /// x-coordinate only; y is recovered as the even square root
    Compliant,
    /// x-coordinate only, even y (SEC1 tag 0x02 carried out of band)
    CompressedEven,
    /// x-coordinate only, odd y (SEC1 tag 0x03 carried out of band)
    CompressedOdd,
}

#[derive(Clone, PartialEq, Eq)]
enum ScalarInner {
    P256(p256::Scalar),
    P384(p384::Scalar),
}

/// An integer in `[1, n-1]` where `n` is the group order.
///
/// Zeroized on drop; the `Debug` impl never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct Scalar {
    inner: ScalarInner,
}

impl Scalar {
    /// Curve this scalar belongs to
    pub fn curve(&self) -> CurveId {
        match self.inner {
            ScalarInner::P256(_) => CurveId::P256,
            ScalarInner::P384(_) => CurveId::P384,
        }
    }

    /// Build a scalar from a fixed-width big-endian byte string.
    ///
    /// Zero and values not below the group order are rejected.
    pub fn from_bytes(curve: CurveId, bytes: &[u8]) -> Result<Self> {
        if bytes.len() != curve.scalar_bytes() {
            return Err(Error::MalformedInput);
        }

        let inner = match curve {
            CurveId::P256 => {
                let repr = *p256::FieldBytes::from_slice(bytes);
                let scalar = Option::<p256::Scalar>::from(p256::Scalar::from_repr(repr))
                    .ok_or(Error::CryptoVerifyFailure)?;
                ScalarInner::P256(scalar)
            }
            CurveId::P384 => {
                let repr = *p384::FieldBytes::from_slice(bytes);
                let scalar = Option::<p384::Scalar>::from(p384::Scalar::from_repr(repr))
                    .ok_or(Error::CryptoVerifyFailure)?;
                ScalarInner::P384(scalar)
            }
        };

        let scalar = Self { inner };
        if scalar.is_zero() {
            return Err(Error::CryptoVerifyFailure);
        }
        Ok(scalar)
    }

    /// Interpret a digest as a scalar, reducing it modulo the group order.
    ///
    /// The digest must be exactly one coordinate wide. The reduction landing
    /// on zero is rejected.
    pub fn reduce_from_hash(curve: CurveId, digest: &[u8]) -> Result<Self> {
        if digest.len() != curve.scalar_bytes() {
            return Err(Error::MalformedInput);
        }

        let inner = match curve {
            CurveId::P256 => {
                let repr = *p256::FieldBytes::from_slice(digest);
                ScalarInner::P256(<p256::Scalar as Reduce<U256>>::reduce_bytes(&repr))
            }
            CurveId::P384 => {
                let repr = *p384::FieldBytes::from_slice(digest);
                ScalarInner::P384(<p384::Scalar as Reduce<U384>>::reduce_bytes(&repr))
            }
        };

        let scalar = Self { inner };
        if scalar.is_zero() {
            return Err(Error::CryptoVerifyFailure);
        }
        Ok(scalar)
    }

    /// Draw a uniform scalar in `[1, n-1]` by rejection sampling
    pub fn random<R>(curve: CurveId, rng: &mut R) -> Result<Self>
    where
        R: RngCore + CryptoRng,
    {
        let mut candidate = Zeroizing::new(vec![0u8; curve.scalar_bytes()]);
        loop {
            rng.try_fill_bytes(&mut candidate)
                .map_err(|_| Error::ResourceExhaustion)?;
            match Self::from_bytes(curve, &candidate) {
                Ok(scalar) => return Ok(scalar),
                Err(Error::CryptoVerifyFailure) => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// `(self + other) mod n`. Both scalars must share a curve and the sum
    /// must not be zero.
    pub fn add_mod_n(&self, other: &Self) -> Result<Self> {
        let inner = match (&self.inner, &other.inner) {
            (ScalarInner::P256(a), ScalarInner::P256(b)) => ScalarInner::P256(a + b),
            (ScalarInner::P384(a), ScalarInner::P384(b)) => ScalarInner::P384(a + b),
            _ => return Err(Error::CryptoVerifyFailure),
        };

        let sum = Self { inner };
        if sum.is_zero() {
            return Err(Error::CryptoVerifyFailure);
        }
        Ok(sum)
    }

    /// Fixed-width big-endian byte representation
    pub fn to_bytes(&self) -> Zeroizing<Vec<u8>> {
        match &self.inner {
            ScalarInner::P256(s) => Zeroizing::new(s.to_repr().to_vec()),
            ScalarInner::P384(s) => Zeroizing::new(s.to_repr().to_vec()),
        }
    }

    fn is_zero(&self) -> bool {
        match &self.inner {
            ScalarInner::P256(s) => s.is_zero().into(),
            ScalarInner::P384(s) => s.is_zero().into(),
        }
    }
}

impl fmt::Debug for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Scalar({:?})", self.curve())
    }
}

impl Zeroize for Scalar {
    fn zeroize(&mut self) {
        match &mut self.inner {
            ScalarInner::P256(s) => s.zeroize(),
            ScalarInner::P384(s) => s.zeroize(),
        }
    }
}

impl Drop for Scalar {
    fn drop(&mut self) {
        self.zeroize();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PointInner {
    P256(p256::AffinePoint),
    P384(p384::AffinePoint),
}

/// A point in the curve's prime-order group, never the point at infinity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    inner: PointInner,
}

fn decode_p256(sec1: &[u8]) -> Result<p256::AffinePoint> {
    let encoded = p256::EncodedPoint::from_bytes(sec1).map_err(|_| Error::MalformedInput)?;
    let point = Option::<p256::AffinePoint>::from(p256::AffinePoint::from_encoded_point(&encoded))
        .ok_or(Error::CryptoVerifyFailure)?;
    if point == p256::AffinePoint::IDENTITY {
        return Err(Error::CryptoVerifyFailure);
    }
    Ok(point)
}

fn decode_p384(sec1: &[u8]) -> Result<p384::AffinePoint> {
    let encoded = p384::EncodedPoint::from_bytes(sec1).map_err(|_| Error::MalformedInput)?;
    let point = Option::<p384::AffinePoint>::from(p384::AffinePoint::from_encoded_point(&encoded))
        .ok_or(Error::CryptoVerifyFailure)?;
    if point == p384::AffinePoint::IDENTITY {
        return Err(Error::CryptoVerifyFailure);
    }
    Ok(point)
}

impl Point {
    /// Curve this point lies on
    pub fn curve(&self) -> CurveId {
        match self.inner {
            PointInner::P256(_) => CurveId::P256,
            PointInner::P384(_) => CurveId::P384,
        }
    }

    /// The group generator
    pub fn generator(curve: CurveId) -> Self {
        let inner = match curve {
            CurveId::P256 => PointInner::P256(p256::AffinePoint::GENERATOR),
            CurveId::P384 => PointInner::P384(p384::AffinePoint::GENERATOR),
        };
        Self { inner }
    }

    /// Decode a point from one of the serializations in [`PointEncoding`].
    ///
    /// The decoded point is verified to lie on the curve.
    pub fn from_data(curve: CurveId, encoding: PointEncoding, data: &[u8]) -> Result<Self> {
        let coord = curve.scalar_bytes();

        let sec1 = match encoding {
            PointEncoding::Full => {
                if data.len() != coord * 2 {
                    return Err(Error::MalformedInput);
                }
                let mut bytes = Vec::with_capacity(1 + coord * 2);
                bytes.push(0x04);
                bytes.extend_from_slice(data);
                bytes
            }
            PointEncoding::Compliant | PointEncoding::CompressedEven => {
                if data.len() != coord {
                    return Err(Error::MalformedInput);
                }
                let mut bytes = Vec::with_capacity(1 + coord);
                bytes.push(0x02);
                bytes.extend_from_slice(data);
                bytes
            }
            PointEncoding::CompressedOdd => {
                if data.len() != coord {
                    return Err(Error::MalformedInput);
                }
                let mut bytes = Vec::with_capacity(1 + coord);
                bytes.push(0x03);
                bytes.extend_from_slice(data);
                bytes
            }
        };

        Self::from_sec1_bytes(curve, &sec1)
    }

    /// Decode a SEC1-encoded point (leading tag byte 0x02/0x03/0x04)
    pub fn from_sec1_bytes(curve: CurveId, sec1: &[u8]) -> Result<Self> {
        let inner = match curve {
            CurveId::P256 => PointInner::P256(decode_p256(sec1)?),
            CurveId::P384 => PointInner::P384(decode_p384(sec1)?),
        };
        Ok(Self { inner })
    }

    /// Raw affine serialization, `x ‖ y`
    pub fn to_bytes(&self) -> Vec<u8> {
        match &self.inner {
            PointInner::P256(p) => p.to_encoded_point(false).as_bytes()[1..].to_vec(),
            PointInner::P384(p) => p.to_encoded_point(false).as_bytes()[1..].to_vec(),
        }
    }

    /// SEC1 compressed serialization (tag byte plus x-coordinate)
    pub fn to_sec1_compressed(&self) -> Vec<u8> {
        match &self.inner {
            PointInner::P256(p) => p.to_encoded_point(true).as_bytes().to_vec(),
            PointInner::P384(p) => p.to_encoded_point(true).as_bytes().to_vec(),
        }
    }

    /// Big-endian x-coordinate
    pub fn x(&self) -> Vec<u8> {
        let mut bytes = self.to_bytes();
        bytes.truncate(self.curve().scalar_bytes());
        bytes
    }

    /// Whether the y-coordinate is odd
    pub fn y_is_odd(&self) -> bool {
        self.to_sec1_compressed()[0] == 0x03
    }

    /// Point addition. The result must not be the point at infinity.
    pub fn add(&self, other: &Self) -> Result<Self> {
        let inner = match (&self.inner, &other.inner) {
            (PointInner::P256(a), PointInner::P256(b)) => {
                let sum = p256::ProjectivePoint::from(*a) + p256::ProjectivePoint::from(*b);
                if sum == p256::ProjectivePoint::IDENTITY {
                    return Err(Error::CryptoVerifyFailure);
                }
                PointInner::P256(sum.to_affine())
            }
            (PointInner::P384(a), PointInner::P384(b)) => {
                let sum = p384::ProjectivePoint::from(*a) + p384::ProjectivePoint::from(*b);
                if sum == p384::ProjectivePoint::IDENTITY {
                    return Err(Error::CryptoVerifyFailure);
                }
                PointInner::P384(sum.to_affine())
            }
            _ => return Err(Error::CryptoVerifyFailure),
        };
        Ok(Self { inner })
    }

    /// Scalar multiplication. The result must not be the point at infinity.
    pub fn mul(&self, scalar: &Scalar) -> Result<Self> {
        let inner = match (&self.inner, &scalar.inner) {
            (PointInner::P256(p), ScalarInner::P256(s)) => {
                let product = p256::ProjectivePoint::from(*p) * s;
                if product == p256::ProjectivePoint::IDENTITY {
                    return Err(Error::CryptoVerifyFailure);
                }
                PointInner::P256(product.to_affine())
            }
            (PointInner::P384(p), ScalarInner::P384(s)) => {
                let product = p384::ProjectivePoint::from(*p) * s;
                if product == p384::ProjectivePoint::IDENTITY {
                    return Err(Error::CryptoVerifyFailure);
                }
                PointInner::P384(product.to_affine())
            }
            _ => return Err(Error::CryptoVerifyFailure),
        };
        Ok(Self { inner })
    }

    /// Point negation
    pub fn negate(&self) -> Self {
        let inner = match &self.inner {
            PointInner::P256(p) => {
                PointInner::P256((-p256::ProjectivePoint::from(*p)).to_affine())
            }
            PointInner::P384(p) => {
                PointInner::P384((-p384::ProjectivePoint::from(*p)).to_affine())
            }
        };
        Self { inner }
    }
}

/// Diffie-Hellman: the x-coordinate of `private · peer_public`, as a scalar.
///
/// A derivation reaching the point at infinity is rejected.
pub fn ecdh(private: &Scalar, peer_public: &Point) -> Result<Scalar> {
    let shared = peer_public.mul(private)?;
    Scalar::from_bytes(shared.curve(), &shared.x())
}

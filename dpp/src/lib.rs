#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

//! # Protocol summary
//!
//! DPP bootstraps trust from an out-of-band channel (usually a QR code)
//! carrying the responder's public bootstrapping key, then runs an
//! ECDH-based authentication to derive a session key `ke` under which the
//! network credential travels.
//!
//! | Step               | Material                                            |
//! |--------------------|-----------------------------------------------------|
//! | Bootstrapping      | `DPP:` URI with SubjectPublicKeyInfo key (`K:`)     |
//! | Authentication     | `k1 = HKDF(M.x)`, `k2 = HKDF(N.x)`                  |
//! | Mutual auth        | `L = bI·(BR + PR) = ((bR + pR) mod n)·BI`           |
//! | Session key        | `ke = HKDF-Expand(bk, "DPP Key")`                   |
//! | Confirmation       | `R-auth`/`I-auth` hashes over nonces and keys       |
//! | PKEX               | `Qi`/`Qr`, `z`, `u`, `v` from a shared code         |
//! | Configuration      | JSON credential object, AES-SIV wrapped             |
//!
//! The frame state machines, radio scheduling and netlink plumbing live in
//! the host; everything here is a pure, synchronous computation.

pub mod attr;
pub mod auth;
pub mod band;
pub mod config;
pub mod ecc;
pub mod errors;
pub mod kdf;
pub mod pkex;
pub mod spki;
pub mod uri;

pub use crate::config::{
    configuration_to_json, parse_configuration_object, AkmSuite, Configuration,
    ConfigurationSecret,
};
pub use crate::ecc::{CurveId, Point, PointEncoding, Scalar};
pub use crate::errors::{Error, Result};
pub use crate::spki::{spki_decode, spki_encode};
pub use crate::uri::{generate_uri, parse_uri, UriInfo};

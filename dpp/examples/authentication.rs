//! Runs a complete mutually-authenticated DPP key schedule between an
//! in-process initiator and responder: the responder publishes a
//! bootstrapping URI, both sides derive `k1`, `k2`, `L` and `ke`
//! independently, and the confirmation tags are exchanged and verified.

use dpp::{auth, generate_uri, parse_uri, CurveId, Point, Result, Scalar, UriInfo};
use rand_core::OsRng;

fn keypair(curve: CurveId) -> Result<(Scalar, Point)> {
    let private = Scalar::random(curve, &mut OsRng)?;
    let public = Point::generator(curve).mul(&private)?;
    Ok((private, public))
}

fn main() -> Result<()> {
    let curve = CurveId::P256;

    // Long-lived bootstrapping keys; in the real world the responder's is
    // printed as a QR code and the initiator's is provisioned over PKEX or
    // out of band.
    let (r_boot_private, r_boot_public) = keypair(curve)?;
    let (i_boot_private, i_boot_public) = keypair(curve)?;

    let uri = generate_uri(&UriInfo {
        boot_public: r_boot_public,
        mac: Some([0x52, 0x54, 0x00, 0x58, 0x28, 0xe5]),
        version: Some(2),
        freqs: Some([2412, 5180].into_iter().collect()),
        information: Some("SN=4774LH2b4044".to_string()),
        host: None,
    })?;
    println!("[responder] bootstrapping URI: {uri}");

    let scanned = parse_uri(&uri)?;
    println!(
        "[initiator] scanned a {:?} bootstrapping key, listen channels {:?}",
        scanned.boot_public.curve(),
        scanned.freqs.as_ref().expect("URI carried channels")
    );

    // Per-session protocol keys and nonces
    let (i_proto_private, i_proto_public) = keypair(curve)?;
    let (r_proto_private, r_proto_public) = keypair(curve)?;
    let i_nonce = dpp::kdf::generate_nonce(curve.scalar_bytes(), &mut OsRng)?;
    let r_nonce = dpp::kdf::generate_nonce(curve.scalar_bytes(), &mut OsRng)?;

    // Authentication Request / Response key derivations, each side using
    // only what it would have seen on the air.
    let (i_k1, i_m) = auth::derive_k1(&scanned.boot_public, &i_proto_private)?;
    let (r_k1, r_m) = auth::derive_k1(&i_proto_public, &r_boot_private)?;
    assert_eq!(&i_k1[..], &r_k1[..]);
    println!("[both] k1 agreed");

    let (i_k2, i_n) = auth::derive_k2(&r_proto_public, &i_proto_private)?;
    let (r_k2, r_n) = auth::derive_k2(&i_proto_public, &r_proto_private)?;
    assert_eq!(&i_k2[..], &r_k2[..]);
    println!("[both] k2 agreed");

    let i_l = auth::derive_li(&scanned.boot_public, &r_proto_public, &i_boot_private)?;
    let r_l = auth::derive_lr(&r_boot_private, &r_proto_private, &i_boot_public)?;
    assert_eq!(i_l.x(), r_l.x());
    println!("[both] mutual-authentication secret L agreed");

    let i_ke = auth::derive_ke(&i_nonce, &r_nonce, &i_m, &i_n, Some(&i_l))?;
    let r_ke = auth::derive_ke(&i_nonce, &r_nonce, &r_m, &r_n, Some(&r_l))?;
    assert_eq!(&i_ke[..], &r_ke[..]);
    println!("[both] session key ke agreed ({} bytes)", i_ke.len());

    // Confirmation tags travel in the Authentication Response and Confirm
    // frames; each side recomputes and checks the other's.
    let transcript = auth::AuthTranscript {
        i_nonce: i_nonce.to_vec(),
        r_nonce: r_nonce.to_vec(),
        i_proto_public,
        r_proto_public,
        i_boot_public: Some(i_boot_public),
        r_boot_public,
    };

    let r_auth = transcript.r_auth()?;
    auth::verify_auth_tag(&transcript.r_auth()?, &r_auth)?;
    println!("[initiator] R-auth verified");

    let i_auth = transcript.i_auth()?;
    auth::verify_auth_tag(&transcript.i_auth()?, &i_auth)?;
    println!("[responder] I-auth verified");

    println!(
        "Authentication complete, ke starts with {}",
        hex::encode(&i_ke[..8])
    );
    Ok(())
}

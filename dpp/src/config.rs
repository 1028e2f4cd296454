//! Configuration-object codec.
//!
//! After authentication the configurator hands the enrollee a JSON
//! credential object:
//!
//! ```json
//! {
//!     "wi-fi_tech": "infra",
//!     "discovery": { "ssid": "mynetwork" },
//!     "cred": { "akm": "psk", "pass": "secret123" },
//!     "/rust/dpp": { "send_hostname": true, "hidden": false }
//! }
//! ```
//!
//! The credential carries exactly one of a passphrase or a 64-hex-digit
//! pre-shared key. The vendor-extension object is optional; when present its
//! fields must be booleans.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::errors::{Error, Result};

/// Key of the optional vendor-extension object
pub const VENDOR_NAMESPACE: &str = "/rust/dpp";

bitflags! {
    /// Authentication and key management suites selected by the `akm` string
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AkmSuite: u32 {
        /// WPA2 pre-shared key
        const PSK = 1 << 0;
        /// WPA2 pre-shared key with SHA-256
        const PSK_SHA256 = 1 << 1;
        /// Fast transition using pre-shared key
        const FT_PSK = 1 << 2;
        /// WPA3 simultaneous authentication of equals
        const SAE = 1 << 3;
        /// Fast transition over SAE
        const FT_SAE = 1 << 4;
    }
}

/// The secret side of a credential: a passphrase or a pre-computed PSK
#[derive(Debug, Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub enum ConfigurationSecret {
    /// WPA passphrase
    Passphrase(String),
    /// Pre-shared key as 64 hexadecimal digits
    Psk(String),
}

/// A parsed network credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    /// Network name, 1 to 32 UTF-8 bytes
    pub ssid: String,
    /// Key management suites the network accepts
    pub akm_suites: AkmSuite,
    /// Passphrase or PSK
    pub secret: ConfigurationSecret,
    /// Ask the DHCP server to register our hostname
    pub send_hostname: bool,
    /// The network does not broadcast its SSID
    pub hidden: bool,
}

#[derive(Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
struct CredentialObject {
    akm: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pass: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    psk: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct DiscoveryObject {
    ssid: String,
}

#[derive(Serialize, Deserialize)]
struct ExtraOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    send_hostname: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    hidden: Option<bool>,
}

#[derive(Serialize, Deserialize)]
struct ConfigurationObject {
    #[serde(rename = "wi-fi_tech")]
    wifi_tech: String,
    discovery: DiscoveryObject,
    cred: CredentialObject,
    #[serde(rename = "/rust/dpp", default, skip_serializing_if = "Option::is_none")]
    extra: Option<ExtraOptions>,
}

/// Map an `akm` string to a suite set.
///
/// Sub-tokens are separated by `+`; unknown ones are ignored, but at least
/// one must be recognised.
fn parse_akm(akm: &str) -> Result<AkmSuite> {
    let mut suites = AkmSuite::empty();

    for token in akm.split('+') {
        if token.starts_with("psk") {
            suites |= AkmSuite::PSK;
        } else if token.starts_with("sae") {
            suites |= AkmSuite::SAE;
        }
    }

    if suites.is_empty() {
        return Err(Error::UnsupportedParameter);
    }
    Ok(suites)
}

/// The configuration object does not distinguish fast-transition AKMs from
/// their base suite, so both families collapse to "psk"/"sae".
fn akm_to_string(suites: AkmSuite) -> Result<&'static str> {
    let psk = suites.intersects(AkmSuite::PSK | AkmSuite::PSK_SHA256 | AkmSuite::FT_PSK);
    let sae = suites.intersects(AkmSuite::SAE | AkmSuite::FT_SAE);

    match (psk, sae) {
        (true, true) => Ok("psk+sae"),
        (true, false) => Ok("psk"),
        (false, true) => Ok("sae"),
        (false, false) => Err(Error::UnsupportedParameter),
    }
}

fn check_ssid(ssid: &str) -> Result<()> {
    if ssid.is_empty() || ssid.len() > 32 {
        return Err(Error::MalformedInput);
    }
    Ok(())
}

/// Parse a configuration object received from the configurator
pub fn parse_configuration_object(json: &str) -> Result<Configuration> {
    let object: ConfigurationObject =
        serde_json::from_str(json).map_err(|_| Error::MalformedInput)?;

    if object.wifi_tech != "infra" {
        return Err(Error::MalformedInput);
    }
    check_ssid(&object.discovery.ssid)?;

    let akm_suites = parse_akm(&object.cred.akm)?;

    let secret = match (object.cred.pass.clone(), object.cred.psk.clone()) {
        (Some(pass), None) => ConfigurationSecret::Passphrase(pass),
        (None, Some(psk)) => {
            if psk.len() != 64 || !psk.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(Error::MalformedInput);
            }
            ConfigurationSecret::Psk(psk)
        }
        _ => return Err(Error::MalformedInput),
    };

    let (send_hostname, hidden) = match &object.extra {
        Some(extra) => (
            extra.send_hostname.unwrap_or(false),
            extra.hidden.unwrap_or(false),
        ),
        None => (false, false),
    };

    Ok(Configuration {
        ssid: object.discovery.ssid.clone(),
        akm_suites,
        secret,
        send_hostname,
        hidden,
    })
}

/// Emit a configuration object for an enrollee.
///
/// The inverse of [`parse_configuration_object`]: parsing the emitted JSON
/// yields an equal [`Configuration`].
pub fn configuration_to_json(config: &Configuration) -> Result<String> {
    check_ssid(&config.ssid)?;

    let (pass, psk) = match &config.secret {
        ConfigurationSecret::Passphrase(pass) => (Some(pass.clone()), None),
        ConfigurationSecret::Psk(psk) => (None, Some(psk.clone())),
    };

    let object = ConfigurationObject {
        wifi_tech: "infra".to_string(),
        discovery: DiscoveryObject {
            ssid: config.ssid.clone(),
        },
        cred: CredentialObject {
            akm: akm_to_string(config.akm_suites)?.to_string(),
            pass,
            psk,
        },
        extra: Some(ExtraOptions {
            send_hostname: Some(config.send_hostname),
            hidden: Some(config.hidden),
        }),
    };

    Ok(serde_json::to_string(&object).expect("plain string/bool object serializes"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_passphrase_object_parses() {
        let config = parse_configuration_object(
            r#"{"wi-fi_tech":"infra",
                "discovery":{"ssid":"mynetwork"},
                "cred":{"akm":"psk","pass":"secret123"}}"#,
        )
        .unwrap();

        assert_eq!(config.ssid, "mynetwork");
        assert_eq!(config.akm_suites, AkmSuite::PSK);
        assert_eq!(
            config.secret,
            ConfigurationSecret::Passphrase("secret123".to_string())
        );
        assert!(!config.send_hostname);
        assert!(!config.hidden);
    }

    #[test]
    fn psk_object_parses() {
        let psk = "aa".repeat(32);
        let json = format!(
            r#"{{"wi-fi_tech":"infra",
                 "discovery":{{"ssid":"mynetwork"}},
                 "cred":{{"akm":"sae","psk":"{psk}"}}}}"#
        );

        let config = parse_configuration_object(&json).unwrap();
        assert_eq!(config.akm_suites, AkmSuite::SAE);
        assert_eq!(config.secret, ConfigurationSecret::Psk(psk));
    }

    #[test]
    fn combined_akm_parses() {
        let config = parse_configuration_object(
            r#"{"wi-fi_tech":"infra",
                "discovery":{"ssid":"x"},
                "cred":{"akm":"psk+sae","pass":"p"}}"#,
        )
        .unwrap();
        assert_eq!(config.akm_suites, AkmSuite::PSK | AkmSuite::SAE);
    }

    #[test]
    fn unknown_akm_tokens_are_ignored_but_not_alone() {
        let config = parse_configuration_object(
            r#"{"wi-fi_tech":"infra",
                "discovery":{"ssid":"x"},
                "cred":{"akm":"dpp+psk","pass":"p"}}"#,
        )
        .unwrap();
        assert_eq!(config.akm_suites, AkmSuite::PSK);

        assert_eq!(
            parse_configuration_object(
                r#"{"wi-fi_tech":"infra",
                    "discovery":{"ssid":"x"},
                    "cred":{"akm":"dpp","pass":"p"}}"#,
            ),
            Err(Error::UnsupportedParameter)
        );
    }

    #[test]
    fn wifi_tech_must_be_infra() {
        assert!(parse_configuration_object(
            r#"{"wi-fi_tech":"mesh",
                "discovery":{"ssid":"x"},
                "cred":{"akm":"psk","pass":"p"}}"#,
        )
        .is_err());
    }

    #[test]
    fn exactly_one_of_pass_and_psk() {
        // Neither
        assert!(parse_configuration_object(
            r#"{"wi-fi_tech":"infra","discovery":{"ssid":"x"},"cred":{"akm":"psk"}}"#,
        )
        .is_err());

        // Both
        let psk = "aa".repeat(32);
        let json = format!(
            r#"{{"wi-fi_tech":"infra","discovery":{{"ssid":"x"}},
                 "cred":{{"akm":"psk","pass":"p","psk":"{psk}"}}}}"#
        );
        assert!(parse_configuration_object(&json).is_err());
    }

    #[test]
    fn psk_must_be_64_hex_digits() {
        for psk in ["aabb".to_string(), "zz".repeat(32), "aa".repeat(33)] {
            let json = format!(
                r#"{{"wi-fi_tech":"infra","discovery":{{"ssid":"x"}},
                     "cred":{{"akm":"psk","psk":"{psk}"}}}}"#
            );
            assert!(parse_configuration_object(&json).is_err(), "psk {psk:?}");
        }
    }

    #[test]
    fn ssid_length_is_bounded() {
        for ssid in ["".to_string(), "s".repeat(33)] {
            let json = format!(
                r#"{{"wi-fi_tech":"infra","discovery":{{"ssid":"{ssid}"}},
                     "cred":{{"akm":"psk","pass":"p"}}}}"#
            );
            assert!(parse_configuration_object(&json).is_err());
        }
    }

    #[test]
    fn vendor_extension_is_honoured() {
        let config = parse_configuration_object(
            r#"{"wi-fi_tech":"infra",
                "discovery":{"ssid":"x"},
                "cred":{"akm":"psk","pass":"p"},
                "/rust/dpp":{"send_hostname":true,"hidden":true}}"#,
        )
        .unwrap();
        assert!(config.send_hostname);
        assert!(config.hidden);
    }

    #[test]
    fn vendor_extension_booleans_must_be_booleans() {
        assert!(parse_configuration_object(
            r#"{"wi-fi_tech":"infra",
                "discovery":{"ssid":"x"},
                "cred":{"akm":"psk","pass":"p"},
                "/rust/dpp":{"send_hostname":"yes"}}"#,
        )
        .is_err());
    }

    #[test]
    fn missing_mandatory_objects_fail() {
        assert!(parse_configuration_object(r#"{"wi-fi_tech":"infra"}"#).is_err());
        assert!(parse_configuration_object("not json at all").is_err());
    }

    #[test]
    fn emission_round_trips() {
        let config = Configuration {
            ssid: "mynetwork".to_string(),
            akm_suites: AkmSuite::PSK | AkmSuite::SAE,
            secret: ConfigurationSecret::Passphrase("secret123".to_string()),
            send_hostname: true,
            hidden: false,
        };

        let json = configuration_to_json(&config).unwrap();
        assert!(json.contains(VENDOR_NAMESPACE));
        assert_eq!(parse_configuration_object(&json).unwrap(), config);
    }

    #[test]
    fn ft_suites_emit_their_base_akm() {
        let config = Configuration {
            ssid: "x".to_string(),
            akm_suites: AkmSuite::FT_PSK | AkmSuite::PSK_SHA256,
            secret: ConfigurationSecret::Psk("ab".repeat(32)),
            send_hostname: false,
            hidden: false,
        };

        let json = configuration_to_json(&config).unwrap();
        assert!(json.contains(r#""akm":"psk""#));

        let parsed = parse_configuration_object(&json).unwrap();
        assert_eq!(parsed.akm_suites, AkmSuite::PSK);
    }
}

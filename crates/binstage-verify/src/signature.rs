use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ed25519_dalek::pkcs8::DecodePublicKey;
use ed25519_dalek::{SIGNATURE_LENGTH, Signature, Verifier, VerifyingKey};
use pgp::{Deserializable, SignedPublicKey, StandaloneSignature};

use crate::{Result, VerifyError};

const PGP_KEY_HEADER: &str = "-----BEGIN PGP PUBLIC KEY BLOCK-----";
const PGP_SIGNATURE_HEADER: &[u8] = b"-----BEGIN PGP SIGNATURE-----";

/// Public key used to authenticate checksum manifests.
///
/// Two armored forms are accepted:
///
/// - an OpenPGP `PUBLIC KEY BLOCK`, paired with binary or armored detached
///   OpenPGP signatures made by the primary key or any of its subkeys;
/// - a PEM `PUBLIC KEY` (SubjectPublicKeyInfo) holding an Ed25519 key, paired
///   with a raw or base64 64-byte signature.
#[derive(Debug, Clone)]
pub struct PublicKey(Scheme);

#[derive(Debug, Clone)]
enum Scheme {
    OpenPgp(Box<SignedPublicKey>),
    Ed25519(VerifyingKey),
}

impl PublicKey {
    /// Parse an ASCII-armored key, detecting the scheme from its header.
    pub fn from_armored(armored: &str) -> Result<Self> {
        let armored = armored.trim();
        if armored.starts_with(PGP_KEY_HEADER) {
            let (key, _headers) = SignedPublicKey::from_string(armored).map_err(invalid_key)?;
            key.verify().map_err(invalid_key)?;
            return Ok(Self(Scheme::OpenPgp(Box::new(key))));
        }
        VerifyingKey::from_public_key_pem(armored)
            .map(|key| Self(Scheme::Ed25519(key)))
            .map_err(invalid_key)
    }

    /// Raw Ed25519 verifying key bytes.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self> {
        VerifyingKey::from_bytes(bytes)
            .map(|key| Self(Scheme::Ed25519(key)))
            .map_err(invalid_key)
    }

    pub fn is_openpgp(&self) -> bool { matches!(self.0, Scheme::OpenPgp(_)) }

    /// Verify a detached signature over `message`.
    pub fn verify_detached(&self, message: &[u8], signature: &[u8]) -> Result<()> {
        match &self.0 {
            Scheme::OpenPgp(key) => verify_openpgp(key, message, signature),
            Scheme::Ed25519(key) => {
                let sig = decode_ed25519_signature(signature)?;
                key.verify(message, &sig).map_err(|_| VerifyError::BadSignature)
            }
        }
    }
}

fn invalid_key(e: impl std::fmt::Display) -> VerifyError { VerifyError::InvalidPublicKey(e.to_string()) }

fn verify_openpgp(key: &SignedPublicKey, message: &[u8], signature: &[u8]) -> Result<()> {
    let sig = decode_openpgp_signature(signature)?;
    if sig.verify(key, message).is_ok() {
        return Ok(());
    }
    // Release keys usually sign with a subkey.
    if key.public_subkeys.iter().any(|sub| sig.verify(sub, message).is_ok()) {
        return Ok(());
    }
    Err(VerifyError::BadSignature)
}

fn decode_openpgp_signature(raw: &[u8]) -> Result<StandaloneSignature> {
    let parsed = if raw.trim_ascii_start().starts_with(PGP_SIGNATURE_HEADER) {
        let text = std::str::from_utf8(raw).map_err(|e| VerifyError::InvalidSignature(e.to_string()))?;
        StandaloneSignature::from_string(text).map(|(sig, _headers)| sig)
    } else {
        StandaloneSignature::from_bytes(Cursor::new(raw))
    };
    parsed.map_err(|e| VerifyError::InvalidSignature(e.to_string()))
}

fn decode_ed25519_signature(raw: &[u8]) -> Result<Signature> {
    if let Ok(bytes) = <[u8; SIGNATURE_LENGTH]>::try_from(raw) {
        return Ok(Signature::from_bytes(&bytes));
    }

    let text = std::str::from_utf8(raw)
        .map_err(|_| VerifyError::InvalidSignature(format!("expected {SIGNATURE_LENGTH} bytes, got {}", raw.len())))?;
    let decoded = STANDARD
        .decode(text.trim())
        .map_err(|e| VerifyError::InvalidSignature(e.to_string()))?;
    let bytes = <[u8; SIGNATURE_LENGTH]>::try_from(decoded.as_slice()).map_err(|_| {
        VerifyError::InvalidSignature(format!("expected {SIGNATURE_LENGTH} bytes, got {}", decoded.len()))
    })?;
    Ok(Signature::from_bytes(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signer, SigningKey};

    const SPKI_PREFIX: [u8; 12] = [0x30, 0x2a, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70, 0x03, 0x21, 0x00];

    const RELEASE_KEY: &str = include_str!("../tests/fixtures/release-key.asc");
    const UNRELATED_KEY: &str = include_str!("../tests/fixtures/unrelated-key.asc");
    const SUMS: &[u8] = include_bytes!("../tests/fixtures/SHA256SUMS");
    const SUMS_SIG: &[u8] = include_bytes!("../tests/fixtures/SHA256SUMS.sig");
    const SUMS_SIG_ARMORED: &[u8] = include_bytes!("../tests/fixtures/SHA256SUMS.sig.asc");
    const SUMS_SIG_UNRELATED: &[u8] = include_bytes!("../tests/fixtures/SHA256SUMS.unrelated.sig");

    fn pem_for(key: &SigningKey) -> String {
        let mut der = SPKI_PREFIX.to_vec();
        der.extend_from_slice(key.verifying_key().as_bytes());
        format!("-----BEGIN PUBLIC KEY-----\n{}\n-----END PUBLIC KEY-----\n", STANDARD.encode(der))
    }

    #[test]
    fn openpgp_subkey_signature_verifies() {
        let key = PublicKey::from_armored(RELEASE_KEY).unwrap();
        assert!(key.is_openpgp());

        key.verify_detached(SUMS, SUMS_SIG).unwrap();
        key.verify_detached(SUMS, SUMS_SIG_ARMORED).unwrap();
    }

    #[test]
    fn openpgp_rejects_tampering_and_foreign_signers() {
        let key = PublicKey::from_armored(RELEASE_KEY).unwrap();
        let mut tampered = SUMS.to_vec();
        tampered[0] ^= 1;

        assert!(matches!(key.verify_detached(&tampered, SUMS_SIG), Err(VerifyError::BadSignature)));
        assert!(matches!(key.verify_detached(SUMS, SUMS_SIG_UNRELATED), Err(VerifyError::BadSignature)));

        let unrelated = PublicKey::from_armored(UNRELATED_KEY).unwrap();
        assert!(matches!(unrelated.verify_detached(SUMS, SUMS_SIG), Err(VerifyError::BadSignature)));
        unrelated.verify_detached(SUMS, SUMS_SIG_UNRELATED).unwrap();
    }

    #[test]
    fn openpgp_rejects_undecodable_signatures() {
        let key = PublicKey::from_armored(RELEASE_KEY).unwrap();
        assert!(matches!(key.verify_detached(SUMS, b"garbage"), Err(VerifyError::InvalidSignature(_))));
        assert!(matches!(
            key.verify_detached(SUMS, b"-----BEGIN PGP SIGNATURE-----\n\nnope\n"),
            Err(VerifyError::InvalidSignature(_))
        ));
    }

    #[test]
    fn raw_and_base64_ed25519_signatures_verify() {
        let signer = SigningKey::from_bytes(&[7; 32]);
        let key = PublicKey::from_armored(&pem_for(&signer)).unwrap();
        assert!(!key.is_openpgp());
        let message = b"manifest contents\n";
        let sig = signer.sign(message).to_bytes();

        key.verify_detached(message, &sig).unwrap();
        key.verify_detached(message, STANDARD.encode(sig).as_bytes()).unwrap();
    }

    #[test]
    fn wrong_key_is_rejected() {
        let signer = SigningKey::from_bytes(&[7; 32]);
        let other = PublicKey::from_armored(&pem_for(&SigningKey::from_bytes(&[8; 32]))).unwrap();
        let sig = signer.sign(b"payload").to_bytes();

        assert!(matches!(other.verify_detached(b"payload", &sig), Err(VerifyError::BadSignature)));
    }

    #[test]
    fn tampered_message_is_rejected() {
        let signer = SigningKey::from_bytes(&[3; 32]);
        let key = PublicKey::from_bytes(signer.verifying_key().as_bytes()).unwrap();
        let sig = signer.sign(b"payload").to_bytes();

        assert!(matches!(key.verify_detached(b"payloaD", &sig), Err(VerifyError::BadSignature)));
    }

    #[test]
    fn malformed_inputs() {
        assert!(matches!(PublicKey::from_armored("not a key"), Err(VerifyError::InvalidPublicKey(_))));
        assert!(matches!(
            PublicKey::from_armored("-----BEGIN PGP PUBLIC KEY BLOCK-----\n\n=AAAA\n-----END PGP PUBLIC KEY BLOCK-----"),
            Err(VerifyError::InvalidPublicKey(_))
        ));

        let key = PublicKey::from_armored(&pem_for(&SigningKey::from_bytes(&[1; 32]))).unwrap();
        assert!(matches!(key.verify_detached(b"m", b"short"), Err(VerifyError::InvalidSignature(_))));
        assert!(matches!(key.verify_detached(b"m", &[0xff; 10]), Err(VerifyError::InvalidSignature(_))));
        assert!(matches!(key.verify_detached(SUMS, SUMS_SIG), Err(VerifyError::InvalidSignature(_))));
    }
}

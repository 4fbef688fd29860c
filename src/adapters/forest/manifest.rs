//! Signed model manifests.
//!
//! A manifest lists the SHA-256 of every file it binds and is signed with an
//! Ed25519 key. `model.sig` holds the raw 64-byte signature over the exact
//! manifest bytes on disk.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use base64::Engine;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::ports::PredictorError;

/// File name of the signed manifest, next to the model artifact.
pub const MANIFEST_FILE: &str = "manifest.json";

/// File name of the detached signature, next to the model artifact.
pub const SIGNATURE_FILE: &str = "model.sig";

/// Only manifest layout understood by the loader.
pub const MANIFEST_VERSION: u32 = 1;

/// Allowed clock skew for `created_at`, in seconds.
const MAX_FUTURE_SKEW_SECS: i64 = 300;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelManifest {
    pub version: u32,
    /// Monotonic serial, e.g. a CI build number.
    pub serial: u64,
    /// Unix seconds.
    pub created_at: i64,
    /// Random 16 bytes, base64.
    pub nonce_b64: String,
    /// File name → lowercase hex SHA-256.
    pub files: BTreeMap<String, String>,
}

/// How strictly the loader treats model signatures.
#[derive(Debug, Clone, Default)]
pub struct SignaturePolicy {
    /// Refuse artifacts that come without `manifest.json` + `model.sig`.
    pub require_signature: bool,
    /// Base64 Ed25519 verifying key. Needed whenever a signature is present.
    pub verifying_key_b64: Option<String>,
}

#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

pub fn unix_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Decode a base64 Ed25519 verifying key.
///
/// # Errors
/// Returns `PredictorError::Signature` on bad base64, wrong length or an
/// invalid curve point.
pub fn verifying_key_from_b64(b64: &str) -> Result<VerifyingKey, PredictorError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(b64.trim())
        .map_err(|_| PredictorError::Signature("invalid public key base64".into()))?;
    let key: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
        PredictorError::Signature("invalid public key length (expected 32 bytes)".into())
    })?;
    VerifyingKey::from_bytes(&key)
        .map_err(|_| PredictorError::Signature("invalid verifying key".into()))
}

fn validate_nonce_b64(nonce_b64: &str) -> Result<(), PredictorError> {
    let raw = base64::engine::general_purpose::STANDARD
        .decode(nonce_b64.trim())
        .map_err(|e| PredictorError::Signature(format!("invalid nonce base64: {e}")))?;
    if raw.len() != 16 {
        return Err(PredictorError::Signature(
            "nonce must decode to exactly 16 bytes".into(),
        ));
    }
    Ok(())
}

// Constant-time compare for ASCII hex digests.
fn constant_time_eq_str(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes().iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

/// Verify the signed manifest that accompanies `artifact`, if any.
///
/// Returns `Ok(None)` when no signature files exist and the policy allows
/// unsigned artifacts, `Ok(Some(manifest))` once the signature and every bound
/// file hash check out.
///
/// # Errors
/// Returns `PredictorError::Signature` for a missing-but-required signature,
/// a bad signature, an unsupported manifest, or a hash mismatch.
pub fn verify_artifact(
    artifact: &Path,
    policy: &SignaturePolicy,
) -> Result<Option<ModelManifest>, PredictorError> {
    let base_dir = artifact.parent().unwrap_or_else(|| Path::new("."));
    let sig_path = base_dir.join(SIGNATURE_FILE);
    let manifest_path = base_dir.join(MANIFEST_FILE);

    if !sig_path.exists() || !manifest_path.exists() {
        if policy.require_signature {
            tracing::error!("Model signature not found at {:?}", sig_path);
            return Err(PredictorError::Signature(format!(
                "signed model required but {SIGNATURE_FILE} or {MANIFEST_FILE} is missing"
            )));
        }
        tracing::warn!("Loading UNSIGNED model artifact {:?}", artifact);
        return Ok(None);
    }

    let key_b64 = policy.verifying_key_b64.as_deref().ok_or_else(|| {
        PredictorError::Signature("model is signed but no verifying key is configured".into())
    })?;
    let public_key = verifying_key_from_b64(key_b64)?;

    let sig_bytes = fs::read(&sig_path)
        .map_err(|e| PredictorError::Signature(format!("failed to read signature: {e}")))?;
    let sig_array: [u8; 64] = sig_bytes.as_slice().try_into().map_err(|_| {
        PredictorError::Signature("invalid signature length (expected 64 bytes)".into())
    })?;
    let signature = Signature::from_bytes(&sig_array);

    let manifest_content = fs::read(&manifest_path)
        .map_err(|e| PredictorError::Signature(format!("failed to read manifest: {e}")))?;

    public_key
        .verify(&manifest_content, &signature)
        .map_err(|_| PredictorError::Signature("invalid model signature".into()))?;

    let manifest: ModelManifest = serde_json::from_slice(&manifest_content)
        .map_err(|e| PredictorError::Signature(format!("invalid {MANIFEST_FILE} format: {e}")))?;
    if manifest.version != MANIFEST_VERSION {
        return Err(PredictorError::Signature(format!(
            "unsupported manifest version: {}",
            manifest.version
        )));
    }
    validate_nonce_b64(&manifest.nonce_b64)?;
    if manifest.created_at > unix_now() + MAX_FUTURE_SKEW_SECS {
        return Err(PredictorError::Signature(
            "manifest created_at is in the future".into(),
        ));
    }

    let artifact_name = artifact
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| PredictorError::Signature("artifact path has no file name".into()))?;
    if !manifest.files.contains_key(artifact_name) {
        return Err(PredictorError::Signature(format!(
            "{MANIFEST_FILE} does not bind {artifact_name}"
        )));
    }

    for (rel, expected_hex) in &manifest.files {
        let path = base_dir.join(rel);
        let bytes = fs::read(&path).map_err(|e| {
            PredictorError::Signature(format!(
                "manifest references missing/unreadable file {path:?}: {e}"
            ))
        })?;
        if !constant_time_eq_str(&sha256_hex(&bytes), expected_hex) {
            return Err(PredictorError::Signature(format!(
                "file hash mismatch for {rel}"
            )));
        }
    }

    tracing::info!(
        "Model signature and hashes verified (serial={})",
        manifest.serial
    );
    Ok(Some(manifest))
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_unsigned_allowed_by_default() {
        let temp = tempdir().expect("tempdir");
        let artifact = temp.path().join("model.json");
        fs::write(&artifact, b"{}").expect("write");

        let verified = verify_artifact(&artifact, &SignaturePolicy::default()).expect("allowed");
        assert!(verified.is_none());
    }

    #[test]
    fn test_unsigned_rejected_when_required() {
        let temp = tempdir().expect("tempdir");
        let artifact = temp.path().join("model.json");
        fs::write(&artifact, b"{}").expect("write");

        let policy = SignaturePolicy {
            require_signature: true,
            verifying_key_b64: None,
        };
        let err = verify_artifact(&artifact, &policy).expect_err("must fail");
        assert!(matches!(err, PredictorError::Signature(_)));
    }

    #[test]
    fn test_signed_manifest_verifies() {
        let temp = tempdir().expect("tempdir");
        let artifact = temp.path().join("model.json");
        fs::write(&artifact, b"{\"a\":1}").expect("write");

        let key = signing_key();
        write_signed_manifest(temp.path(), &key, &[("model.json", b"{\"a\":1}".to_vec())]);

        let policy = SignaturePolicy {
            require_signature: true,
            verifying_key_b64: Some(pubkey_b64(&key)),
        };
        let manifest = verify_artifact(&artifact, &policy)
            .expect("verifies")
            .expect("manifest returned");
        assert_eq!(manifest.files.len(), 1);
    }

    #[test]
    fn test_tampered_artifact_is_rejected() {
        let temp = tempdir().expect("tempdir");
        let artifact = temp.path().join("model.json");
        let key = signing_key();
        write_signed_manifest(temp.path(), &key, &[("model.json", b"original".to_vec())]);
        fs::write(&artifact, b"tampered").expect("write");

        let policy = SignaturePolicy {
            require_signature: false,
            verifying_key_b64: Some(pubkey_b64(&key)),
        };
        let err = verify_artifact(&artifact, &policy).expect_err("must fail");
        assert!(err.to_string().contains("hash mismatch"));
    }

    #[test]
    fn test_wrong_key_is_rejected() {
        let temp = tempdir().expect("tempdir");
        let artifact = temp.path().join("model.json");
        fs::write(&artifact, b"x").expect("write");
        write_signed_manifest(temp.path(), &signing_key(), &[("model.json", b"x".to_vec())]);

        let policy = SignaturePolicy {
            require_signature: true,
            verifying_key_b64: Some(pubkey_b64(&signing_key())),
        };
        let err = verify_artifact(&artifact, &policy).expect_err("must fail");
        assert!(err.to_string().contains("invalid model signature"));
    }

    #[test]
    fn test_manifest_must_bind_the_artifact() {
        let temp = tempdir().expect("tempdir");
        let artifact = temp.path().join("model.json");
        fs::write(&artifact, b"x").expect("write");
        fs::write(temp.path().join("other.json"), b"y").expect("write");
        let key = signing_key();
        write_signed_manifest(temp.path(), &key, &[("other.json", b"y".to_vec())]);

        let policy = SignaturePolicy {
            require_signature: true,
            verifying_key_b64: Some(pubkey_b64(&key)),
        };
        let err = verify_artifact(&artifact, &policy).expect_err("must fail");
        assert!(err.to_string().contains("does not bind"));
    }
}

//! Key generation and signing utility for Dietwise model artifacts.
//!
//! # Usage
//!
//! ```bash
//! sign_model keygen --out-seed <path> [--out-pub <path>] [--force]
//! sign_model sign <model_dir> [--serial <n>]
//! ```
//!
//! `sign` writes `manifest.json` (SHA-256 of every bound file, serial,
//! timestamp, random nonce) and `model.sig` (Ed25519 over the manifest
//! bytes). The signing seed is read from `DIETWISE_MODEL_SIGNING_KEY_B64_FILE`,
//! or from `DIETWISE_MODEL_SIGNING_KEY_B64` in debug builds.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::io::Write;
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use base64::engine::general_purpose;
use base64::Engine;
use ed25519_dalek::{Signature, Signer, SigningKey};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use dietwise::adapters::forest::manifest::{
    sha256_hex, unix_now, ModelManifest, MANIFEST_FILE, MANIFEST_VERSION, SIGNATURE_FILE,
};
use dietwise::adapters::forest::DEFAULT_MODEL_FILE;

const USAGE: &str = "Usage:\n  sign_model keygen --out-seed <path> [--out-pub <path>] [--force]\n  sign_model sign <model_dir> [--serial <u64>]";

#[derive(Zeroize, ZeroizeOnDrop)]
struct Seed([u8; 32]);

enum Command {
    Keygen {
        out_seed: PathBuf,
        out_pub: Option<PathBuf>,
        force: bool,
    },
    Sign {
        model_dir: PathBuf,
        serial: Option<u64>,
    },
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Command> {
    let sub = args.next().ok_or_else(|| anyhow!(USAGE))?;
    match sub.as_str() {
        "keygen" => {
            let mut out_seed = None;
            let mut out_pub = None;
            let mut force = false;
            while let Some(arg) = args.next() {
                match arg.as_str() {
                    "--out-seed" => {
                        out_seed = Some(PathBuf::from(args.next().ok_or_else(|| anyhow!(USAGE))?))
                    }
                    "--out-pub" => {
                        out_pub = Some(PathBuf::from(args.next().ok_or_else(|| anyhow!(USAGE))?))
                    }
                    "--force" => force = true,
                    other => bail!("Unknown arg: {other}\n{USAGE}"),
                }
            }
            Ok(Command::Keygen {
                out_seed: out_seed.ok_or_else(|| anyhow!(USAGE))?,
                out_pub,
                force,
            })
        }
        "sign" => {
            let mut model_dir = None;
            let mut serial = None;
            while let Some(arg) = args.next() {
                match arg.as_str() {
                    "--serial" => {
                        let v = args.next().ok_or_else(|| anyhow!(USAGE))?;
                        serial = Some(v.trim().parse::<u64>().context("--serial must be a u64")?);
                    }
                    _ if model_dir.is_none() => model_dir = Some(PathBuf::from(arg)),
                    other => bail!("Unexpected argument: {other}\n{USAGE}"),
                }
            }
            Ok(Command::Sign {
                model_dir: model_dir.ok_or_else(|| anyhow!(USAGE))?,
                serial,
            })
        }
        _ => bail!(USAGE),
    }
}

fn write_new_file(path: &Path, contents: &[u8], mode: u32, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("Refusing to overwrite existing file {path:?}. Use --force.");
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {parent:?}"))?;
    }

    let mut opts = fs::OpenOptions::new();
    opts.write(true).create(true).truncate(true);
    #[cfg(unix)]
    opts.mode(mode);
    #[cfg(not(unix))]
    let _ = mode;

    let mut file = opts
        .open(path)
        .with_context(|| format!("opening {path:?}"))?;
    file.write_all(contents)?;
    file.write_all(b"\n")?;
    Ok(())
}

fn keygen(out_seed: &Path, out_pub: Option<&Path>, force: bool) -> Result<()> {
    let mut seed = Seed([0u8; 32]);
    OsRng.fill_bytes(&mut seed.0);

    let verifying_key = SigningKey::from_bytes(&seed.0).verifying_key();
    let seed_b64 = Zeroizing::new(general_purpose::STANDARD.encode(&seed.0));
    let pub_b64 = general_purpose::STANDARD.encode(verifying_key.as_bytes());

    write_new_file(out_seed, seed_b64.as_bytes(), 0o600, force)?;
    println!("Wrote signing seed (base64) to {out_seed:?}");

    if let Some(out_pub) = out_pub {
        write_new_file(out_pub, pub_b64.as_bytes(), 0o644, force)?;
        println!("Wrote public key (base64) to {out_pub:?}");
    }

    // Only non-secret material goes to stdout.
    println!("DIETWISE_MODEL_SIGNING_PUBKEY_B64={pub_b64}");
    Ok(())
}

fn read_signing_seed() -> Result<Seed> {
    let secret = if let Ok(path) = env::var("DIETWISE_MODEL_SIGNING_KEY_B64_FILE") {
        let content = Zeroizing::new(
            fs::read_to_string(path.trim()).context("reading signing key file")?,
        );
        Zeroizing::new(content.trim().to_string())
    } else if cfg!(debug_assertions) {
        let v = env::var("DIETWISE_MODEL_SIGNING_KEY_B64").map_err(|_| {
            anyhow!("Missing signing key. Set DIETWISE_MODEL_SIGNING_KEY_B64_FILE (or DIETWISE_MODEL_SIGNING_KEY_B64 in debug builds).")
        })?;
        Zeroizing::new(v.trim().to_string())
    } else {
        bail!("Missing signing key. Set DIETWISE_MODEL_SIGNING_KEY_B64_FILE.");
    };

    if secret.is_empty() {
        bail!("Empty signing key");
    }

    let raw = Zeroizing::new(
        general_purpose::STANDARD
            .decode(secret.as_bytes())
            .context("invalid base64 in signing key")?,
    );
    let bytes: [u8; 32] = raw.as_slice().try_into().map_err(|_| {
        anyhow!(
            "Signing key seed must be 32 bytes after base64 decode (got {})",
            raw.len()
        )
    })?;
    Ok(Seed(bytes))
}

fn sign(model_path: &Path, serial: Option<u64>) -> Result<()> {
    // Accept either the artifact itself or the directory holding it.
    let (model_dir, artifact) = if model_path.is_file() {
        let dir = model_path
            .parent()
            .ok_or_else(|| anyhow!("Model path has no parent directory"))?;
        (dir, model_path.to_path_buf())
    } else {
        (model_path, model_path.join(DEFAULT_MODEL_FILE))
    };
    let artifact_name = artifact
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow!("Artifact path has no UTF-8 file name"))?
        .to_string();

    let bytes = fs::read(&artifact)
        .with_context(|| format!("No model artifact at {artifact:?}"))?;
    let mut files = BTreeMap::new();
    files.insert(artifact_name, sha256_hex(&bytes));

    let seed = read_signing_seed()?;
    let signing_key = SigningKey::from_bytes(&seed.0);

    let mut nonce = [0u8; 16];
    OsRng.fill_bytes(&mut nonce);

    let created_at = unix_now();
    let manifest = ModelManifest {
        version: MANIFEST_VERSION,
        serial: serial.unwrap_or_else(|| u64::try_from(created_at).unwrap_or(1)),
        created_at,
        nonce_b64: general_purpose::STANDARD.encode(nonce),
        files,
    };
    let manifest_bytes = serde_json::to_vec_pretty(&manifest)?;

    let manifest_path = model_dir.join(MANIFEST_FILE);
    fs::write(&manifest_path, &manifest_bytes)
        .with_context(|| format!("writing {manifest_path:?}"))?;

    let signature: Signature = signing_key.sign(&manifest_bytes);
    let sig_path = model_dir.join(SIGNATURE_FILE);
    fs::write(&sig_path, signature.to_bytes()).with_context(|| format!("writing {sig_path:?}"))?;

    println!("Signed manifest: {manifest_path:?} (serial={})", manifest.serial);
    println!("Wrote signature: {sig_path:?}");
    println!(
        "DIETWISE_MODEL_SIGNING_PUBKEY_B64={}",
        general_purpose::STANDARD.encode(signing_key.verifying_key().as_bytes())
    );
    Ok(())
}

fn main() -> Result<()> {
    match parse_args(env::args().skip(1))? {
        Command::Keygen {
            out_seed,
            out_pub,
            force,
        } => keygen(&out_seed, out_pub.as_deref(), force),
        Command::Sign { model_dir, serial } => sign(&model_dir, serial),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|s| (*s).to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn test_parse_sign() {
        match parse_args(args(&["sign", "models", "--serial", "42"])).expect("parse") {
            Command::Sign { model_dir, serial } => {
                assert_eq!(model_dir, PathBuf::from("models"));
                assert_eq!(serial, Some(42));
            }
            Command::Keygen { .. } => panic!("expected sign"),
        }
    }

    #[test]
    fn test_parse_keygen_requires_seed_path() {
        assert!(parse_args(args(&["keygen", "--out-pub", "pub.b64"])).is_err());
        assert!(parse_args(args(&["keygen", "--out-seed", "seed.b64", "--force"])).is_ok());
    }

    #[test]
    fn test_parse_rejects_unknown_subcommand() {
        assert!(parse_args(args(&["verify"])).is_err());
        assert!(parse_args(args(&[])).is_err());
    }

    #[test]
    fn test_keygen_refuses_overwrite() {
        let temp = tempfile::tempdir().expect("tempdir");
        let seed = temp.path().join("seed.b64");
        keygen(&seed, None, false).expect("first keygen");
        assert!(keygen(&seed, None, false).is_err());
        keygen(&seed, None, true).expect("forced keygen");
    }
}

//! Client certificate resolution for mutual TLS.
//!
//! Certificates come from one of three sources: the personal certificate
//! store (looked up by thumbprint), a file on disk, or a base64 string.
//! File and string sources accept PKCS#12 archives guarded by a key phrase
//! as well as PEM bundles. Resolution happens fresh on every client
//! construction; the resolved material is never mutated after load.
//!
//! The store itself is an injected capability. The default implementation
//! is a directory of PEM identity bundles: each file holds a leaf
//! certificate, optionally its private key, and optionally the chain
//! certificates behind it. A certificate's thumbprint is the uppercase hex
//! SHA-1 of its DER encoding.

use std::path::{Path, PathBuf};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use sha1::{Digest, Sha1};
use tracing::debug;

use crate::defaults;
use crate::error::HttpTaskError;
use crate::types::{CertificateSource, Options};

const CERTIFICATE_LABEL: &str = "CERTIFICATE";
const PRIVATE_KEY_LABEL: &str = "PRIVATE KEY";

/// One identity held by a certificate store.
#[derive(Debug, Clone)]
pub struct StoredIdentity {
    /// Uppercase hex SHA-1 thumbprint of the leaf certificate.
    pub thumbprint: String,
    /// PEM block of the leaf certificate.
    pub certificate_pem: String,
    /// PEM block of the private key, when the store holds one.
    pub private_key_pem: Option<String>,
    /// PEM blocks of the chain certificates behind the leaf.
    pub chain_pem: Vec<String>,
}

/// A personal certificate store the resolver can query.
pub trait CertificateStore: Send + Sync {
    /// All identities whose leaf certificate matches the normalized
    /// thumbprint.
    fn find_by_thumbprint(&self, thumbprint: &str) -> Result<Vec<StoredIdentity>, HttpTaskError>;

    /// Certificate PEM blocks forming the identity's trust chain, leaf
    /// included, private-key-bearing entries first. Revocation is never
    /// consulted.
    fn build_chain(&self, identity: &StoredIdentity) -> Result<Vec<String>, HttpTaskError>;
}

/// Directory-backed personal certificate store. Every `.pem`/`.crt`/`.cer`
/// file under the root is one identity bundle.
#[derive(Debug, Clone)]
pub struct DirectoryCertificateStore {
    root: PathBuf,
}

impl DirectoryCertificateStore {
    /// Store rooted at an explicit directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store at the location named by `FLOWLINK_CERT_STORE`, falling back to
    /// `~/.flowlink/certstore`.
    pub fn from_env() -> Self {
        let root = std::env::var_os(defaults::certs::STORE_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                let home = std::env::var_os("HOME").map(PathBuf::from).unwrap_or_default();
                home.join(defaults::certs::STORE_HOME_DIR)
            });
        Self::new(root)
    }

    /// The store's root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn load_identities(&self) -> Result<Vec<StoredIdentity>, HttpTaskError> {
        // A store that does not exist yet simply holds no certificates.
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }
        let entries = std::fs::read_dir(&self.root).map_err(|e| {
            HttpTaskError::certificate(format!(
                "cannot read certificate store '{}': {e}",
                self.root.display()
            ))
        })?;

        let mut identities = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| {
                    HttpTaskError::certificate(format!(
                        "cannot read certificate store '{}': {e}",
                        self.root.display()
                    ))
                })?
                .path();
            let is_certificate_file = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| matches!(ext, "pem" | "crt" | "cer"));
            if !is_certificate_file {
                continue;
            }
            let text = std::fs::read_to_string(&path).map_err(|e| {
                HttpTaskError::certificate(format!(
                    "cannot read certificate file '{}': {e}",
                    path.display()
                ))
            })?;
            match identity_from_bundle(&text) {
                Ok(identity) => identities.push(identity),
                Err(e) => {
                    // A malformed bundle does not poison the rest of the store.
                    debug!(path = %path.display(), error = %e, "skipping unparseable store entry");
                }
            }
        }
        Ok(identities)
    }
}

impl CertificateStore for DirectoryCertificateStore {
    fn find_by_thumbprint(&self, thumbprint: &str) -> Result<Vec<StoredIdentity>, HttpTaskError> {
        let identities = self.load_identities()?;
        Ok(identities
            .into_iter()
            .filter(|identity| identity.thumbprint == thumbprint)
            .collect())
    }

    fn build_chain(&self, identity: &StoredIdentity) -> Result<Vec<String>, HttpTaskError> {
        // The chain lives in the identity's own bundle; the key-bearing leaf
        // comes first.
        let mut chain = Vec::with_capacity(1 + identity.chain_pem.len());
        chain.push(identity.certificate_pem.clone());
        chain.extend(identity.chain_pem.iter().cloned());
        Ok(chain)
    }
}

/// Certificate material ready to attach to a transport client.
#[derive(Debug, Clone)]
pub enum CertificateMaterial {
    /// A PKCS#12 archive imported with its key phrase.
    Pkcs12 {
        /// Raw archive bytes.
        der: Vec<u8>,
        /// Key phrase guarding the archive; empty is allowed.
        key_phrase: String,
    },
    /// PEM certificates (leaf first) plus the private key.
    PemBundle {
        /// Concatenated certificate PEM blocks.
        certificates_pem: String,
        /// Private key PEM block.
        private_key_pem: Option<String>,
    },
}

impl CertificateMaterial {
    /// Convert into a transport identity.
    pub fn into_identity(self) -> Result<reqwest::Identity, HttpTaskError> {
        match self {
            Self::Pkcs12 { der, key_phrase } => {
                reqwest::Identity::from_pkcs12_der(&der, &key_phrase).map_err(|e| {
                    HttpTaskError::certificate(format!("cannot import PKCS#12 archive: {e}"))
                })
            }
            Self::PemBundle {
                certificates_pem,
                private_key_pem,
            } => {
                let key = private_key_pem.ok_or_else(|| {
                    HttpTaskError::certificate(
                        "certificate bundle holds no private key; a client certificate requires one",
                    )
                })?;
                reqwest::Identity::from_pkcs8_pem(certificates_pem.as_bytes(), key.as_bytes())
                    .map_err(|e| {
                        HttpTaskError::certificate(format!("cannot import PEM bundle: {e}"))
                    })
            }
        }
    }
}

/// Resolve the client certificate material selected by the options.
pub fn resolve(
    options: &Options,
    store: &dyn CertificateStore,
) -> Result<CertificateMaterial, HttpTaskError> {
    match options.certificate_source {
        CertificateSource::CertificateStore => {
            let thumbprint = normalize_thumbprint(&options.certificate_thumbprint);
            if thumbprint.is_empty() {
                return Err(HttpTaskError::configuration(
                    "certificate thumbprint must be set when loading from the certificate store",
                ));
            }
            let mut matches = store.find_by_thumbprint(&thumbprint)?;
            if matches.is_empty() {
                return Err(HttpTaskError::CertificateNotFound { thumbprint });
            }
            let identity = matches.swap_remove(0);
            let certificates_pem = if options.load_entire_chain {
                store.build_chain(&identity)?.join("\n")
            } else {
                identity.certificate_pem
            };
            Ok(CertificateMaterial::PemBundle {
                certificates_pem,
                private_key_pem: identity.private_key_pem,
            })
        }
        CertificateSource::File => {
            if options.certificate_file_path.is_empty() {
                return Err(HttpTaskError::configuration(
                    "certificate file path must be set when loading from a file",
                ));
            }
            let bytes = std::fs::read(&options.certificate_file_path).map_err(|e| {
                HttpTaskError::certificate(format!(
                    "cannot read certificate file '{}': {e}",
                    options.certificate_file_path
                ))
            })?;
            import_bytes(bytes, &options.certificate_key_phrase)
        }
        CertificateSource::String => {
            if options.certificate_base64.is_empty() {
                return Err(HttpTaskError::configuration(
                    "certificate content must be set when loading from a string",
                ));
            }
            let bytes = BASE64
                .decode(options.certificate_base64.trim())
                .map_err(|e| {
                    HttpTaskError::certificate(format!("certificate content is not valid base64: {e}"))
                })?;
            import_bytes(bytes, &options.certificate_key_phrase)
        }
    }
}

/// Strip every non-hex character and uppercase the rest.
pub fn normalize_thumbprint(thumbprint: &str) -> String {
    thumbprint
        .chars()
        .filter(|c| c.is_ascii_hexdigit())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Import raw certificate bytes: PEM bundles are recognized by their armor,
/// anything else is treated as a PKCS#12 archive with the key phrase.
fn import_bytes(bytes: Vec<u8>, key_phrase: &str) -> Result<CertificateMaterial, HttpTaskError> {
    if looks_like_pem(&bytes) {
        let text = String::from_utf8(bytes).map_err(|e| {
            HttpTaskError::certificate(format!("certificate PEM is not valid UTF-8: {e}"))
        })?;
        let blocks = parse_pem_blocks(&text)?;
        let certificates: Vec<&PemBlock> = blocks
            .iter()
            .filter(|block| block.label == CERTIFICATE_LABEL)
            .collect();
        if certificates.is_empty() {
            return Err(HttpTaskError::certificate(
                "certificate PEM holds no certificate blocks",
            ));
        }
        let private_key_pem = blocks
            .iter()
            .find(|block| block.label.ends_with(PRIVATE_KEY_LABEL))
            .map(|block| block.text.clone());
        let certificates_pem = certificates
            .iter()
            .map(|block| block.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        Ok(CertificateMaterial::PemBundle {
            certificates_pem,
            private_key_pem,
        })
    } else {
        Ok(CertificateMaterial::Pkcs12 {
            der: bytes,
            key_phrase: key_phrase.to_string(),
        })
    }
}

fn looks_like_pem(bytes: &[u8]) -> bool {
    let text = match std::str::from_utf8(bytes) {
        Ok(text) => text,
        Err(_) => return false,
    };
    text.trim_start().starts_with("-----BEGIN ")
}

/// One armored PEM block.
#[derive(Debug)]
struct PemBlock {
    label: String,
    text: String,
    der: Vec<u8>,
}

/// Split PEM text into armored blocks, decoding each body.
fn parse_pem_blocks(text: &str) -> Result<Vec<PemBlock>, HttpTaskError> {
    let mut blocks = Vec::new();
    let mut label: Option<String> = None;
    let mut armored_lines: Vec<&str> = Vec::new();
    let mut body = String::new();

    for line in text.lines() {
        let trimmed = line.trim();
        if let Some(rest) = trimmed.strip_prefix("-----BEGIN ") {
            label = Some(rest.trim_end_matches('-').trim().to_string());
            armored_lines = vec![trimmed];
            body.clear();
        } else if trimmed.starts_with("-----END ") {
            let Some(block_label) = label.take() else {
                return Err(HttpTaskError::certificate(
                    "certificate PEM has an END marker without a matching BEGIN",
                ));
            };
            armored_lines.push(trimmed);
            let der = BASE64.decode(&body).map_err(|e| {
                HttpTaskError::certificate(format!(
                    "certificate PEM block '{block_label}' is not valid base64: {e}"
                ))
            })?;
            blocks.push(PemBlock {
                label: block_label,
                text: armored_lines.join("\n"),
                der,
            });
        } else if label.is_some() && !trimmed.is_empty() {
            armored_lines.push(trimmed);
            body.push_str(trimmed);
        }
    }

    if label.is_some() {
        return Err(HttpTaskError::certificate(
            "certificate PEM ends inside an unterminated block",
        ));
    }
    Ok(blocks)
}

/// Build a [`StoredIdentity`] from one bundle file's text.
fn identity_from_bundle(text: &str) -> Result<StoredIdentity, HttpTaskError> {
    let blocks = parse_pem_blocks(text)?;
    let mut certificates = blocks
        .iter()
        .filter(|block| block.label == CERTIFICATE_LABEL);
    let leaf = certificates.next().ok_or_else(|| {
        HttpTaskError::certificate("certificate bundle holds no certificate blocks")
    })?;
    let chain_pem: Vec<String> = certificates.map(|block| block.text.clone()).collect();
    let private_key_pem = blocks
        .iter()
        .find(|block| block.label.ends_with(PRIVATE_KEY_LABEL))
        .map(|block| block.text.clone());

    Ok(StoredIdentity {
        thumbprint: thumbprint_of(&leaf.der),
        certificate_pem: leaf.text.clone(),
        private_key_pem,
        chain_pem,
    })
}

/// Uppercase hex SHA-1 of a certificate's DER encoding.
fn thumbprint_of(der: &[u8]) -> String {
    let digest = Sha1::digest(der);
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{byte:02X}"));
    }
    out
}

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use anyhow::Context;
use jsonwebtoken::DecodingKey;

use crate::config::{Auth, SessionKey};

fn read_key_from_file(filename: &Path) -> anyhow::Result<DecodingKey> {
    let key_content = std::fs::read_to_string(filename)
        .with_context(|| format!("reading key {}", filename.display()))?;
    DecodingKey::from_ed_pem(key_content.as_bytes()).context("parsing key")
}

/// Configures the EdDSA public key(s) used to verify session tokens from a single `kid`.
///
/// The `Debug` implementation omits key material and only reports the number of versions.
pub struct PublicKeyConfig {
    /// Versions of this key's key material which may be used to verify signatures.
    ///
    /// If a key is being rotated, the old and new versions of that key should both be
    /// configured so filestore can verify signatures while the updated key is still
    /// rolling out. Otherwise, this should only contain the most recent version of a key.
    pub key_versions: Vec<DecodingKey>,
}

impl fmt::Debug for PublicKeyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKeyConfig")
            .field("key_versions", &self.key_versions.len())
            .finish_non_exhaustive()
    }
}

impl TryFrom<&SessionKey> for PublicKeyConfig {
    type Error = anyhow::Error;

    fn try_from(key_config: &SessionKey) -> Result<Self, anyhow::Error> {
        Ok(Self {
            key_versions: key_config
                .key_files
                .iter()
                .map(|filename| read_key_from_file(filename))
                .collect::<anyhow::Result<Vec<DecodingKey>>>()?,
        })
    }
}

/// Directory of keys that may be used to verify a request's session token.
///
/// This directory contains a map that is keyed on a key's ID. When verifying a JWT, the `kid`
/// field is read from the JWT header and used to index into this directory to select the
/// appropriate key.
#[derive(Debug, Default)]
pub struct PublicKeyDirectory {
    /// Mapping from key ID to key configuration.
    pub keys: BTreeMap<String, PublicKeyConfig>,
}

impl TryFrom<&Auth> for PublicKeyDirectory {
    type Error = anyhow::Error;

    fn try_from(auth_config: &Auth) -> Result<Self, Self::Error> {
        Ok(Self {
            keys: auth_config
                .session_keys
                .iter()
                .map(|(kid, key)| {
                    let config = PublicKeyConfig::try_from(key)
                        .with_context(|| format!("loading session key `{kid}`"))?;
                    Ok((kid.clone(), config))
                })
                .collect::<Result<BTreeMap<String, PublicKeyConfig>, anyhow::Error>>()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_PUBLIC_KEY: &str = r#"-----BEGIN PUBLIC KEY-----
MCowBQYDK2VwAyEA/TOsO19FvHFTsZqcYiO8HGfm02Df5oWBXgzulxYPvSs=
-----END PUBLIC KEY-----
"#;

    #[test]
    fn test_load_and_debug_redacts_keys() {
        let mut key_file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut key_file, TEST_PUBLIC_KEY.as_bytes()).unwrap();

        let session_key = SessionKey {
            key_files: vec![key_file.path().to_owned()],
        };
        let config = PublicKeyConfig::try_from(&session_key).unwrap();
        assert_eq!(config.key_versions.len(), 1);

        let debug = format!("{config:?}");
        assert_eq!(debug, "PublicKeyConfig { key_versions: 1, .. }");
        assert!(!debug.contains("MCowBQYDK2Vw"));
    }

    #[test]
    fn test_missing_key_file() {
        let session_key = SessionKey {
            key_files: vec!["/nonexistent/session.pem".into()],
        };
        assert!(PublicKeyConfig::try_from(&session_key).is_err());
    }
}

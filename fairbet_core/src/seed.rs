use serde::{Deserialize, Serialize};

use crate::{error::VerifyError, rng::server_seed_hash};

/// Seeds of one committed round. `server_seed` stays secret until the round resolves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedBundle {
    pub server_seed: String,
    pub client_seed: String,
    pub nonce: u64,
}

impl SeedBundle {
    pub fn new(server_seed: impl Into<String>, client_seed: impl Into<String>, nonce: u64) -> Self {
        Self {
            server_seed: server_seed.into(),
            client_seed: client_seed.into(),
            nonce,
        }
    }

    /// Rejects bundles that cannot be hashed meaningfully.
    pub fn validate(&self) -> Result<(), VerifyError> {
        if self.server_seed.trim().is_empty() {
            return Err(VerifyError::MalformedSeed("server seed is empty"));
        }
        if self.client_seed.trim().is_empty() {
            return Err(VerifyError::MalformedSeed("client seed is empty"));
        }
        Ok(())
    }

    pub fn server_seed_hash(&self) -> String {
        server_seed_hash(&self.server_seed)
    }

    /// True when the revealed server seed hashes to the commitment published before the round.
    pub fn matches_commitment(&self, commitment_hex: &str) -> bool {
        self.server_seed_hash()
            .eq_ignore_ascii_case(commitment_hex.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_empty_seeds() {
        assert_eq!(
            SeedBundle::new("", "c", 0).validate(),
            Err(VerifyError::MalformedSeed("server seed is empty"))
        );
        assert_eq!(
            SeedBundle::new("s", "  ", 0).validate(),
            Err(VerifyError::MalformedSeed("client seed is empty"))
        );
        assert!(SeedBundle::new("s", "c", 0).validate().is_ok());
    }

    #[test]
    fn test_commitment() {
        let bundle = SeedBundle::new("abc", "xyz", 5);
        assert!(bundle.matches_commitment(
            "BA7816BF8F01CFEA414140DE5DAE2223B00361A396177A9CB410FF61F20015AD"
        ));
        assert!(!bundle.matches_commitment("00"));
    }

    #[test]
    fn test_json_shape() {
        let bundle: SeedBundle =
            serde_json::from_str(r#"{"serverSeed":"s","clientSeed":"c","nonce":3}"#).unwrap();
        assert_eq!(bundle, SeedBundle::new("s", "c", 3));
    }
}

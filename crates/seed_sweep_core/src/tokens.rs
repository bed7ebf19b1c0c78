use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::ConfigError;

const TOKEN_BYTES: usize = 16;

/// Identifiers attached to one queue entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntryTokens {
    pub entry_id: String,
    pub group_token: String,
    pub dedup_token: String,
}

/// Source of the per-entry identifiers handed to the queue transport.
pub trait TokenSource {
    fn tokens_for(&self, job_id: &str, min_seed: u64, max_seed: u64) -> EntryTokens;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TokenMode {
    /// Independent 128-bit values from the operating system CSPRNG.
    #[default]
    Random,
    /// 128-bit values derived from the job identifier and block range, so a
    /// re-dispatch of the same job produces the same dedup tokens.
    Deterministic,
}

impl TokenMode {
    pub fn from_setting(raw: Option<&str>) -> Result<Self, ConfigError> {
        match raw.map(str::trim) {
            None | Some("") => Ok(Self::default()),
            Some(value) if value.eq_ignore_ascii_case("random") => Ok(Self::Random),
            Some(value) if value.eq_ignore_ascii_case("deterministic") => Ok(Self::Deterministic),
            Some(value) => Err(ConfigError::UnknownTokenMode(value.to_string())),
        }
    }

    pub fn source(self) -> Box<dyn TokenSource + Send + Sync> {
        match self {
            Self::Random => Box::new(RandomTokens),
            Self::Deterministic => Box::new(DeterministicTokens),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RandomTokens;

impl TokenSource for RandomTokens {
    fn tokens_for(&self, _job_id: &str, _min_seed: u64, _max_seed: u64) -> EntryTokens {
        EntryTokens {
            entry_id: random_hex_id(),
            group_token: random_hex_id(),
            dedup_token: random_hex_id(),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DeterministicTokens;

impl TokenSource for DeterministicTokens {
    fn tokens_for(&self, job_id: &str, min_seed: u64, max_seed: u64) -> EntryTokens {
        let derive = |role: &str| {
            let mut hasher = Sha256::new();
            hasher.update(format!("{job_id}:{min_seed}:{max_seed}:{role}"));
            hex::encode(&hasher.finalize()[..TOKEN_BYTES])
        };

        EntryTokens {
            entry_id: derive("entry"),
            group_token: derive("group"),
            dedup_token: derive("dedup"),
        }
    }
}

/// 128-bit lowercase hex identifier from the operating system CSPRNG.
pub fn random_hex_id() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn is_token(value: &str) -> bool {
        value.len() == 32
            && value
                .chars()
                .all(|ch| ch.is_ascii_digit() || ('a'..='f').contains(&ch))
    }

    #[test]
    fn random_tokens_are_lowercase_128_bit_hex() {
        let tokens = RandomTokens.tokens_for("job", 0, 10);
        assert!(is_token(&tokens.entry_id));
        assert!(is_token(&tokens.group_token));
        assert!(is_token(&tokens.dedup_token));
    }

    #[test]
    fn random_tokens_are_independent() {
        let tokens = RandomTokens.tokens_for("job", 0, 10);
        assert_ne!(tokens.entry_id, tokens.dedup_token);
        assert_ne!(tokens.group_token, tokens.dedup_token);

        let ids: HashSet<String> = (0..1_000).map(|_| random_hex_id()).collect();
        assert_eq!(ids.len(), 1_000);
    }

    #[test]
    fn deterministic_tokens_repeat_for_same_range() {
        let first = DeterministicTokens.tokens_for("job-a", 100, 200);
        let second = DeterministicTokens.tokens_for("job-a", 100, 200);
        assert_eq!(first, second);
        assert!(is_token(&first.dedup_token));
        assert_ne!(first.entry_id, first.dedup_token);
    }

    #[test]
    fn deterministic_tokens_differ_across_ranges_and_jobs() {
        let base = DeterministicTokens.tokens_for("job-a", 100, 200);
        assert_ne!(base, DeterministicTokens.tokens_for("job-a", 200, 300));
        assert_ne!(base, DeterministicTokens.tokens_for("job-b", 100, 200));
    }

    #[test]
    fn token_mode_parses_setting() {
        assert_eq!(TokenMode::from_setting(None), Ok(TokenMode::Random));
        assert_eq!(
            TokenMode::from_setting(Some("Deterministic")),
            Ok(TokenMode::Deterministic)
        );
        assert_eq!(
            TokenMode::from_setting(Some("sequential")),
            Err(ConfigError::UnknownTokenMode("sequential".to_string()))
        );
    }
}

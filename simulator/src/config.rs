use commonware_codec::DecodeExt;
use commonware_cryptography::ed25519::PublicKey;
use commonware_utils::from_hex_formatted;
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, str::FromStr};
use thiserror::Error;
use tracing::Level;

/// Configuration for the [crate::Simulator] binary.
#[derive(Deserialize, Serialize)]
pub struct Config {
    pub port: u16,
    pub log_level: String,

    /// Custodian of escrowed stakes (hex ed25519 public key).
    pub house: String,
    /// Genesis balances, credited before any transaction executes.
    #[serde(default)]
    pub allocations: Vec<Allocation>,
}

#[derive(Clone, Deserialize, Serialize)]
pub struct Allocation {
    pub public: String,
    pub balance: u64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be hex: {value}")]
    InvalidHex { field: &'static str, value: String },
    #[error("{field} is invalid: {value}")]
    InvalidDecode {
        field: &'static str,
        value: String,
        #[source]
        source: commonware_codec::Error,
    },
    #[error("invalid log level: {value}")]
    InvalidLogLevel { value: String },
    #[error("duplicate allocation for {public}")]
    DuplicateAllocation { public: String },
    #[error("house cannot receive a genesis allocation: {public}")]
    HouseAllocation { public: String },
}

pub struct ValidatedConfig {
    pub port: u16,
    pub log_level: Level,

    pub house: PublicKey,
    pub allocations: Vec<(PublicKey, u64)>,
}

fn parse_hex(field: &'static str, value: &str) -> Result<Vec<u8>, ConfigError> {
    from_hex_formatted(value).ok_or(ConfigError::InvalidHex {
        field,
        value: value.to_string(),
    })
}

fn decode_hex<T: DecodeExt<()>>(field: &'static str, value: &str) -> Result<T, ConfigError> {
    let bytes = parse_hex(field, value)?;
    T::decode(bytes.as_ref()).map_err(|source| ConfigError::InvalidDecode {
        field,
        value: value.to_string(),
        source,
    })
}

/// Parses a hex-encoded address, as found in config files and request paths.
pub fn parse_public_key(value: &str) -> Option<PublicKey> {
    from_hex_formatted(value).and_then(|key| PublicKey::decode(key.as_ref()).ok())
}

impl Config {
    pub fn validate(self) -> Result<ValidatedConfig, ConfigError> {
        let house: PublicKey = decode_hex("house", &self.house)?;

        let mut seen = HashSet::new();
        let mut allocations = Vec::with_capacity(self.allocations.len());
        for allocation in self.allocations {
            let public: PublicKey = decode_hex("allocations.public", &allocation.public)?;
            // The house balance must always equal the open escrow
            if public == house {
                return Err(ConfigError::HouseAllocation {
                    public: allocation.public,
                });
            }
            if !seen.insert(public.clone()) {
                return Err(ConfigError::DuplicateAllocation {
                    public: allocation.public,
                });
            }
            allocations.push((public, allocation.balance));
        }

        let log_level =
            Level::from_str(&self.log_level).map_err(|_| ConfigError::InvalidLogLevel {
                value: self.log_level.clone(),
            })?;

        Ok(ValidatedConfig {
            port: self.port,
            log_level,
            house,
            allocations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commonware_codec::Encode;
    use commonware_utils::hex;
    use tictactoe_execution::mocks::{create_account_keypair, create_house};

    fn address(seed: u64) -> String {
        hex(&create_account_keypair(seed).1.encode())
    }

    fn config(allocations: Vec<Allocation>) -> Config {
        Config {
            port: 8080,
            log_level: "info".to_string(),
            house: hex(&create_house().encode()),
            allocations,
        }
    }

    #[test]
    fn test_validate_from_yaml() {
        let yaml = format!(
            "port: 9000\nlog_level: debug\nhouse: \"0x{}\"\nallocations:\n  - public: \"{}\"\n    balance: 500\n",
            hex(&create_house().encode()),
            address(1),
        );
        let config: Config = serde_yaml::from_str(&yaml).unwrap();
        let validated = config.validate().unwrap();

        assert_eq!(validated.port, 9000);
        assert_eq!(validated.log_level, Level::DEBUG);
        assert_eq!(validated.house, create_house());
        assert_eq!(
            validated.allocations,
            vec![(create_account_keypair(1).1, 500)]
        );
    }

    #[test]
    fn test_allocations_default_to_empty() {
        let yaml = format!(
            "port: 8080\nlog_level: info\nhouse: \"{}\"\n",
            hex(&create_house().encode())
        );
        let config: Config = serde_yaml::from_str(&yaml).unwrap();
        assert!(config.validate().unwrap().allocations.is_empty());
    }

    #[test]
    fn test_rejects_bad_house() {
        let mut bad = config(vec![]);
        bad.house = "not hex".to_string();
        assert!(matches!(
            bad.validate(),
            Err(ConfigError::InvalidHex { field: "house", .. })
        ));

        let mut short = config(vec![]);
        short.house = "abcd".to_string();
        assert!(matches!(
            short.validate(),
            Err(ConfigError::InvalidDecode { field: "house", .. })
        ));
    }

    #[test]
    fn test_rejects_bad_log_level() {
        let mut bad = config(vec![]);
        bad.log_level = "loud".to_string();
        assert!(matches!(
            bad.validate(),
            Err(ConfigError::InvalidLogLevel { .. })
        ));
    }

    #[test]
    fn test_rejects_duplicate_allocation() {
        let allocation = Allocation {
            public: address(1),
            balance: 10,
        };
        let duplicate = config(vec![allocation.clone(), allocation]);
        assert!(matches!(
            duplicate.validate(),
            Err(ConfigError::DuplicateAllocation { .. })
        ));
    }

    #[test]
    fn test_rejects_house_allocation() {
        let house = config(vec![Allocation {
            public: hex(&create_house().encode()),
            balance: 1,
        }]);
        assert!(matches!(
            house.validate(),
            Err(ConfigError::HouseAllocation { .. })
        ));

        // Same key written with a 0x prefix
        let prefixed = config(vec![
            Allocation {
                public: address(1),
                balance: 10,
            },
            Allocation {
                public: format!("0x{}", hex(&create_house().encode())),
                balance: 0,
            },
        ]);
        assert!(matches!(
            prefixed.validate(),
            Err(ConfigError::HouseAllocation { .. })
        ));
    }

    #[test]
    fn test_parse_public_key() {
        let (_, public) = create_account_keypair(4);
        assert_eq!(parse_public_key(&address(4)), Some(public));
        assert_eq!(parse_public_key("zz"), None);
        assert_eq!(parse_public_key("00"), None);
    }
}

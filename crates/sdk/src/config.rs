use aave_borrow_types::{LendingError, LendingResult, DEV_PRIVATE_KEYS, LOCAL_CHAIN_ID};
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::http::reqwest::Url;

/// SDK configuration for connecting to an EVM node
#[derive(Clone, Debug)]
pub struct SdkConfig {
    /// Network name, for logs and errors
    pub network: String,

    /// JSON-RPC endpoint URL
    pub rpc_url: Url,

    /// Chain id the node must report; `None` skips the check
    pub chain_id: Option<u64>,

    /// Signer for every submitted transaction
    pub signer: PrivateKeySigner,
}

impl SdkConfig {
    pub fn new(network: &str, rpc_url: &str, signer: PrivateKeySigner) -> LendingResult<Self> {
        let rpc_url = rpc_url.parse::<Url>().map_err(|e| {
            LendingError::invalid_config(network, &format!("rpc url '{}': {}", rpc_url, e))
        })?;

        Ok(Self {
            network: network.to_string(),
            rpc_url,
            chain_id: None,
            signer,
        })
    }

    /// Local development node on the default port, signing with dev account #0
    pub fn localnet() -> LendingResult<Self> {
        let signer = dev_signer(0)?;
        Ok(Self::new("localnet", "http://127.0.0.1:8545", signer)?.with_chain_id(LOCAL_CHAIN_ID))
    }

    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = Some(chain_id);
        self
    }
}

/// Parse a hex private key into a signer
pub fn signer_from_key(key: &str) -> LendingResult<PrivateKeySigner> {
    key.trim()
        .parse::<PrivateKeySigner>()
        .map_err(|e| LendingError::invalid_config("signer", &format!("invalid private key: {}", e)))
}

/// Signer for a well-known development account of a local node
pub fn dev_signer(index: usize) -> LendingResult<PrivateKeySigner> {
    let key = DEV_PRIVATE_KEYS.get(index).ok_or_else(|| {
        LendingError::invalid_config(
            "signer",
            &format!(
                "development account index {} out of range (have {})",
                index,
                DEV_PRIVATE_KEYS.len()
            ),
        )
    })?;
    signer_from_key(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    #[test]
    fn test_dev_signers() {
        assert_eq!(
            dev_signer(0).unwrap().address(),
            address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266")
        );
        assert_eq!(
            dev_signer(1).unwrap().address(),
            address!("70997970C51812dc3A010C7d01b50e0d17dc79C8")
        );
        assert!(dev_signer(2).is_err());
    }

    #[test]
    fn test_localnet_config() {
        let config = SdkConfig::localnet().unwrap();
        assert_eq!(config.chain_id, Some(31337));
        assert_eq!(config.rpc_url.as_str(), "http://127.0.0.1:8545/");
    }

    #[test]
    fn test_bad_inputs_rejected() {
        assert!(signer_from_key("not-a-key").is_err());
        let signer = dev_signer(0).unwrap();
        assert!(SdkConfig::new("rinkeby", "not a url", signer).is_err());
    }
}

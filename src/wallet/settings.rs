//! Wallet connection settings
//!
//! ```bash
//! # Comma-separated; later ids are tried when an earlier one fails
//! export WALLETCONNECT_PROJECT_ID="PRIMARY_ID,BACKUP_ID"
//! export SOLANA_CLUSTER="mainnet-beta"   # or testnet, devnet (default)
//! export ENABLE_WALLET_GUARD="false"     # preview gated views without a wallet
//! ```

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Environment variable names
pub mod env_vars {
    pub const WALLETCONNECT_PROJECT_ID: &str = "WALLETCONNECT_PROJECT_ID";
    pub const SOLANA_CLUSTER: &str = "SOLANA_CLUSTER";
    pub const ENABLE_WALLET_GUARD: &str = "ENABLE_WALLET_GUARD";
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SolanaCluster {
    MainnetBeta,
    Testnet,
    #[default]
    Devnet,
}

impl SolanaCluster {
    /// Lenient parse; anything unrecognised is devnet
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "mainnet" | "mainnet-beta" => SolanaCluster::MainnetBeta,
            "testnet" => SolanaCluster::Testnet,
            _ => SolanaCluster::Devnet,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SolanaCluster::MainnetBeta => "mainnet-beta",
            SolanaCluster::Testnet => "testnet",
            SolanaCluster::Devnet => "devnet",
        }
    }

    /// Network switch target: mainnet goes to devnet, everything else to mainnet
    pub fn toggled(&self) -> Self {
        match self {
            SolanaCluster::MainnetBeta => SolanaCluster::Devnet,
            SolanaCluster::Testnet | SolanaCluster::Devnet => SolanaCluster::MainnetBeta,
        }
    }
}

impl fmt::Display for SolanaCluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone)]
pub struct WalletSettings {
    /// WalletConnect project ids in fallback order (never logged)
    pub project_ids: Vec<SecretString>,
    pub cluster: SolanaCluster,
    /// When false, gated views are open without a wallet
    pub guard_enabled: bool,
}

impl Default for WalletSettings {
    fn default() -> Self {
        Self {
            project_ids: Vec::new(),
            cluster: SolanaCluster::default(),
            guard_enabled: true,
        }
    }
}

impl WalletSettings {
    pub fn from_env() -> Self {
        let project_ids = std::env::var(env_vars::WALLETCONNECT_PROJECT_ID)
            .map(|raw| parse_project_ids(&raw))
            .unwrap_or_default();
        if project_ids.is_empty() {
            tracing::warn!("WALLETCONNECT_PROJECT_ID not set, wallet connections will fail");
        }
        let cluster = std::env::var(env_vars::SOLANA_CLUSTER)
            .map(|raw| SolanaCluster::parse(&raw))
            .unwrap_or_default();
        let guard_enabled = parse_guard_flag(std::env::var(env_vars::ENABLE_WALLET_GUARD).ok().as_deref());
        if !guard_enabled {
            tracing::info!("Wallet guard disabled, gated views are open");
        }
        Self {
            project_ids,
            cluster,
            guard_enabled,
        }
    }
}

/// Split a comma-separated id list, dropping blanks
pub fn parse_project_ids(raw: &str) -> Vec<SecretString> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| SecretString::from(id.to_string()))
        .collect()
}

/// The guard is on unless the flag is set to something other than "true"
pub fn parse_guard_flag(raw: Option<&str>) -> bool {
    raw.map_or(true, |v| v.trim().eq_ignore_ascii_case("true"))
}

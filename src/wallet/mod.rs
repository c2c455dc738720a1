//! Wallet connection gate
//!
//! The concrete wallet SDK sits behind [`WalletConnector`]. [`WalletSession`]
//! is constructed explicitly and cloned into whatever needs it; clones share
//! one connection state.

mod settings;

pub use settings::{env_vars, parse_guard_flag, parse_project_ids, SolanaCluster, WalletSettings};

use crate::error::{Error, Result};
use async_trait::async_trait;
use secrecy::SecretString;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Why a connect attempt did not produce an account
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectError {
    #[error("User rejected the connection request")]
    UserCancelled,
    #[error("{0}")]
    Failed(String),
}

/// Connected wallet account
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalletAccount {
    pub address: String,
    pub cluster: SolanaCluster,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WalletState {
    Disconnected,
    Connecting,
    Connected(WalletAccount),
}

/// What a protected view should render
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "view", content = "detail", rename_all = "snake_case")]
pub enum GateView {
    /// Disconnected after a failed attempt; retry is allowed
    Error(String),
    Connecting,
    /// Disconnected, connect prompt
    Locked,
    Open(WalletAccount),
    /// Guard disabled, content shown without a wallet
    Unguarded,
}

impl GateView {
    /// Whether the protected content is shown
    pub fn grants_access(&self) -> bool {
        matches!(self, GateView::Open(_) | GateView::Unguarded)
    }
}

/// Adapter over a third-party wallet SDK
#[async_trait]
pub trait WalletConnector: Send + Sync {
    /// Ask the wallet for an account on `cluster`; returns its address
    async fn connect(
        &self,
        project_id: &SecretString,
        cluster: SolanaCluster,
    ) -> std::result::Result<String, ConnectError>;

    async fn disconnect(&self) -> std::result::Result<(), ConnectError>;

    fn name(&self) -> &str;
}

#[derive(Debug)]
struct SessionInner {
    state: WalletState,
    cluster: SolanaCluster,
    last_error: Option<String>,
}

#[derive(Clone)]
pub struct WalletSession {
    connector: Arc<dyn WalletConnector>,
    settings: Arc<WalletSettings>,
    inner: Arc<RwLock<SessionInner>>,
}

impl WalletSession {
    pub fn new(connector: Arc<dyn WalletConnector>, settings: WalletSettings) -> Self {
        let cluster = settings.cluster;
        Self {
            connector,
            settings: Arc::new(settings),
            inner: Arc::new(RwLock::new(SessionInner {
                state: WalletState::Disconnected,
                cluster,
                last_error: None,
            })),
        }
    }

    pub fn settings(&self) -> &WalletSettings {
        &self.settings
    }

    pub async fn state(&self) -> WalletState {
        self.inner.read().await.state.clone()
    }

    /// Active cluster, including any switch made this session
    pub async fn cluster(&self) -> SolanaCluster {
        self.inner.read().await.cluster
    }

    pub async fn last_error(&self) -> Option<String> {
        self.inner.read().await.last_error.clone()
    }

    /// Connect through the SDK adapter
    ///
    /// Project ids are tried in order until one yields an account. A
    /// cancelled prompt is not an error and stops the attempt. Any other
    /// failure is recorded and leaves the session disconnected so the user
    /// can retry.
    pub async fn connect(&self) -> Result<()> {
        let cluster = {
            let mut inner = self.inner.write().await;
            match inner.state {
                WalletState::Connected(_) | WalletState::Connecting => return Ok(()),
                WalletState::Disconnected => {}
            }
            if self.settings.project_ids.is_empty() {
                let msg = "WALLETCONNECT_PROJECT_ID is not configured".to_string();
                inner.last_error = Some(msg.clone());
                return Err(Error::Config(msg));
            }
            inner.state = WalletState::Connecting;
            inner.last_error = None;
            inner.cluster
        };

        let mut result = Err(ConnectError::Failed("no project id accepted".to_string()));
        for (attempt, project_id) in self.settings.project_ids.iter().enumerate() {
            result = self.connector.connect(project_id, cluster).await;
            match &result {
                Err(ConnectError::Failed(msg)) => {
                    tracing::debug!(connector = self.connector.name(), attempt, error = %msg, "Project id rejected, trying next");
                }
                _ => break,
            }
        }

        let mut inner = self.inner.write().await;
        match result {
            Ok(address) => {
                tracing::info!(connector = self.connector.name(), %cluster, "Wallet connected");
                inner.state = WalletState::Connected(WalletAccount { address, cluster });
                Ok(())
            }
            Err(ConnectError::UserCancelled) => {
                tracing::debug!(connector = self.connector.name(), "Wallet connection cancelled by user");
                inner.state = WalletState::Disconnected;
                Ok(())
            }
            Err(ConnectError::Failed(msg)) => {
                tracing::warn!(connector = self.connector.name(), error = %msg, "Wallet connection failed");
                inner.state = WalletState::Disconnected;
                inner.last_error = Some(msg.clone());
                Err(Error::Wallet(msg))
            }
        }
    }

    /// Always ends disconnected, even if the adapter reports an error
    pub async fn disconnect(&self) {
        if let Err(e) = self.connector.disconnect().await {
            tracing::warn!(connector = self.connector.name(), error = %e, "Wallet disconnect reported an error");
        }
        let mut inner = self.inner.write().await;
        inner.state = WalletState::Disconnected;
        inner.last_error = None;
    }

    /// Toggle between mainnet-beta and devnet
    ///
    /// Any open connection is dropped; the user reconnects on the new cluster.
    pub async fn switch_cluster(&self) -> SolanaCluster {
        let connected = !matches!(self.inner.read().await.state, WalletState::Disconnected);
        if connected {
            self.disconnect().await;
        }
        let mut inner = self.inner.write().await;
        inner.cluster = inner.cluster.toggled();
        tracing::info!(cluster = %inner.cluster, "Switched wallet cluster");
        inner.cluster
    }

    /// Dismiss the recorded error so the gate shows the connect prompt
    pub async fn clear_error(&self) {
        self.inner.write().await.last_error = None;
    }

    pub async fn gate(&self) -> GateView {
        if !self.settings.guard_enabled {
            return GateView::Unguarded;
        }
        let inner = self.inner.read().await;
        match (&inner.state, &inner.last_error) {
            (WalletState::Connected(account), _) => GateView::Open(account.clone()),
            (WalletState::Connecting, _) => GateView::Connecting,
            (WalletState::Disconnected, Some(msg)) => GateView::Error(msg.clone()),
            (WalletState::Disconnected, None) => GateView::Locked,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::sync::Mutex;

    /// Replays queued connect results and records the ids and clusters seen
    struct MockConnector {
        results: Mutex<Vec<std::result::Result<String, ConnectError>>>,
        seen: Mutex<Vec<(String, SolanaCluster)>>,
        fail_disconnect: bool,
    }

    impl MockConnector {
        fn new(results: Vec<std::result::Result<String, ConnectError>>) -> Arc<Self> {
            Arc::new(Self {
                results: Mutex::new(results),
                seen: Mutex::new(Vec::new()),
                fail_disconnect: false,
            })
        }
    }

    #[async_trait]
    impl WalletConnector for MockConnector {
        async fn connect(
            &self,
            project_id: &SecretString,
            cluster: SolanaCluster,
        ) -> std::result::Result<String, ConnectError> {
            self.seen
                .lock()
                .unwrap()
                .push((project_id.expose_secret().to_string(), cluster));
            let mut results = self.results.lock().unwrap();
            if results.is_empty() {
                return Err(ConnectError::Failed("no scripted result".to_string()));
            }
            results.remove(0)
        }

        async fn disconnect(&self) -> std::result::Result<(), ConnectError> {
            if self.fail_disconnect {
                Err(ConnectError::Failed("adapter gone".to_string()))
            } else {
                Ok(())
            }
        }

        fn name(&self) -> &str {
            "mock"
        }
    }

    fn settings() -> WalletSettings {
        WalletSettings {
            project_ids: parse_project_ids("test-project"),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_connect_opens_gate() {
        let session = WalletSession::new(MockConnector::new(vec![Ok("7xKX".to_string())]), settings());
        assert_eq!(session.gate().await, GateView::Locked);

        session.connect().await.unwrap();
        let gate = session.gate().await;
        assert!(gate.grants_access());
        assert_eq!(
            gate,
            GateView::Open(WalletAccount {
                address: "7xKX".to_string(),
                cluster: SolanaCluster::Devnet,
            })
        );

        // Clones share state
        let other = session.clone();
        other.disconnect().await;
        assert_eq!(session.gate().await, GateView::Locked);
    }

    #[tokio::test]
    async fn test_user_cancel_is_swallowed() {
        let session = WalletSession::new(MockConnector::new(vec![Err(ConnectError::UserCancelled)]), settings());
        session.connect().await.unwrap();
        assert_eq!(session.state().await, WalletState::Disconnected);
        assert!(session.last_error().await.is_none());
        assert_eq!(session.gate().await, GateView::Locked);
    }

    #[tokio::test]
    async fn test_failure_is_retryable() {
        let connector = MockConnector::new(vec![
            Err(ConnectError::Failed("wallet not installed".to_string())),
            Ok("9abc".to_string()),
        ]);
        let session = WalletSession::new(connector, settings());

        let err = session.connect().await.unwrap_err();
        assert!(matches!(err, Error::Wallet(_)));
        assert_eq!(session.gate().await, GateView::Error("wallet not installed".to_string()));

        session.connect().await.unwrap();
        assert!(matches!(session.gate().await, GateView::Open(_)));
        assert!(session.last_error().await.is_none());
    }

    #[tokio::test]
    async fn test_falls_back_to_next_project_id() {
        let connector = MockConnector::new(vec![
            Err(ConnectError::Failed("project id expired".to_string())),
            Ok("5fallback".to_string()),
        ]);
        let session = WalletSession::new(
            connector.clone(),
            WalletSettings {
                project_ids: parse_project_ids("expired,backup"),
                ..Default::default()
            },
        );

        session.connect().await.unwrap();
        let seen: Vec<String> = connector.seen.lock().unwrap().iter().map(|(id, _)| id.clone()).collect();
        assert_eq!(seen, vec!["expired", "backup"]);
        assert!(matches!(session.state().await, WalletState::Connected(_)));
    }

    #[tokio::test]
    async fn test_cancel_stops_fallback() {
        let connector = MockConnector::new(vec![Err(ConnectError::UserCancelled), Ok("never".to_string())]);
        let session = WalletSession::new(
            connector.clone(),
            WalletSettings {
                project_ids: parse_project_ids("a,b"),
                ..Default::default()
            },
        );

        session.connect().await.unwrap();
        assert_eq!(connector.seen.lock().unwrap().len(), 1);
        assert_eq!(session.state().await, WalletState::Disconnected);
    }

    #[tokio::test]
    async fn test_missing_project_id() {
        let session = WalletSession::new(
            MockConnector::new(vec![Ok("never".to_string())]),
            WalletSettings::default(),
        );
        let err = session.connect().await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(matches!(session.gate().await, GateView::Error(_)));
    }

    #[tokio::test]
    async fn test_clear_error_returns_to_prompt() {
        let session = WalletSession::new(
            MockConnector::new(vec![Err(ConnectError::Failed("timeout".to_string()))]),
            settings(),
        );
        assert!(session.connect().await.is_err());
        assert!(matches!(session.gate().await, GateView::Error(_)));

        session.clear_error().await;
        assert!(session.last_error().await.is_none());
        assert_eq!(session.gate().await, GateView::Locked);
    }

    #[tokio::test]
    async fn test_switch_cluster_disconnects() {
        let connector = MockConnector::new(vec![Ok("devnet-addr".to_string()), Ok("main-addr".to_string())]);
        let session = WalletSession::new(connector.clone(), settings());
        session.connect().await.unwrap();

        assert_eq!(session.switch_cluster().await, SolanaCluster::MainnetBeta);
        assert_eq!(session.state().await, WalletState::Disconnected);
        assert_eq!(session.cluster().await, SolanaCluster::MainnetBeta);

        session.connect().await.unwrap();
        assert_eq!(
            session.state().await,
            WalletState::Connected(WalletAccount {
                address: "main-addr".to_string(),
                cluster: SolanaCluster::MainnetBeta,
            })
        );
        let clusters: Vec<SolanaCluster> = connector.seen.lock().unwrap().iter().map(|(_, c)| *c).collect();
        assert_eq!(clusters, vec![SolanaCluster::Devnet, SolanaCluster::MainnetBeta]);

        assert_eq!(session.switch_cluster().await, SolanaCluster::Devnet);
    }

    #[tokio::test]
    async fn test_disabled_guard_is_open() {
        let session = WalletSession::new(
            MockConnector::new(Vec::new()),
            WalletSettings {
                guard_enabled: false,
                ..Default::default()
            },
        );
        let gate = session.gate().await;
        assert_eq!(gate, GateView::Unguarded);
        assert!(gate.grants_access());
        assert!(!GateView::Locked.grants_access());
    }

    #[tokio::test]
    async fn test_disconnect_error_still_disconnects() {
        let connector = Arc::new(MockConnector {
            results: Mutex::new(vec![Ok("abc".to_string())]),
            seen: Mutex::new(Vec::new()),
            fail_disconnect: true,
        });
        let session = WalletSession::new(connector, settings());
        session.connect().await.unwrap();
        session.disconnect().await;
        assert_eq!(session.state().await, WalletState::Disconnected);
    }
}

//! Shared utilities for integration testing.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use ledger_runtime::blockchain::{
    ConfirmationStatus, LatestReference, LedgerConnector, LedgerRpc, RpcError, RpcErrorKind,
    RpcResult, SignedPayload, SignerError, TxId, TxSigner, UnsignedPayload,
};
use ledger_runtime::config::RuntimeConfig;

pub const NODE_A: &str = "http://node-a:8545";
pub const NODE_B: &str = "http://node-b:8545";
pub const NODE_C: &str = "http://node-c:8545";

/// Config with three endpoints and the periodic probe disabled.
pub fn test_config() -> RuntimeConfig {
    let mut config = RuntimeConfig::default();
    config.endpoints = vec![NODE_A.into(), NODE_B.into(), NODE_C.into()];
    config.health_check.enabled = false;
    config
}

/// One simulated chain reachable through several endpoints.
#[derive(Default)]
pub struct MockNetwork {
    down: Mutex<HashMap<String, RpcErrorKind>>,
    method_faults: Mutex<HashMap<(String, &'static str), RpcErrorKind>>,
    submit_rejection: Mutex<Option<RpcErrorKind>>,
    status_script: Mutex<VecDeque<ConfirmationStatus>>,
    final_status: Mutex<Option<ConfirmationStatus>>,
    balances: Mutex<HashMap<String, u128>>,
    submitted: Mutex<Vec<(String, SignedPayload)>>,
    calls: Mutex<Vec<(String, &'static str)>>,
    height: AtomicU32,
}

impl MockNetwork {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Every call through `endpoint` fails with `kind`.
    pub fn fail_endpoint(&self, endpoint: &str, kind: RpcErrorKind) {
        self.down.lock().unwrap().insert(endpoint.to_string(), kind);
    }

    /// Calls of `method` through `endpoint` fail with `kind`.
    pub fn fail_method(&self, endpoint: &str, method: &'static str, kind: RpcErrorKind) {
        self.method_faults
            .lock()
            .unwrap()
            .insert((endpoint.to_string(), method), kind);
    }

    pub fn restore(&self, endpoint: &str) {
        self.down.lock().unwrap().remove(endpoint);
        self.method_faults
            .lock()
            .unwrap()
            .retain(|(ep, _), _| ep != endpoint);
    }

    /// The ledger answers but refuses every submission.
    pub fn reject_submissions(&self, kind: RpcErrorKind) {
        *self.submit_rejection.lock().unwrap() = Some(kind);
    }

    /// Statuses returned in order, then `final_status` forever.
    pub fn script_statuses(&self, statuses: Vec<ConfirmationStatus>) {
        *self.status_script.lock().unwrap() = statuses.into();
    }

    pub fn set_final_status(&self, status: ConfirmationStatus) {
        *self.final_status.lock().unwrap() = Some(status);
    }

    pub fn set_balance(&self, account: &str, balance: u128) {
        self.balances
            .lock()
            .unwrap()
            .insert(account.to_string(), balance);
    }

    pub fn submitted(&self) -> Vec<(String, SignedPayload)> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<(String, &'static str)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, method: &'static str) -> usize {
        self.calls().iter().filter(|(_, m)| *m == method).count()
    }

    fn enter(&self, endpoint: &str, method: &'static str) -> RpcResult<()> {
        self.calls
            .lock()
            .unwrap()
            .push((endpoint.to_string(), method));

        let fault = self.down.lock().unwrap().get(endpoint).copied().or_else(|| {
            self.method_faults
                .lock()
                .unwrap()
                .get(&(endpoint.to_string(), method))
                .copied()
        });
        match fault {
            Some(kind) => Err(RpcError::new(kind, endpoint, format!("{method} failed"))),
            None => Ok(()),
        }
    }

    fn next_status(&self) -> ConfirmationStatus {
        if let Some(status) = self.status_script.lock().unwrap().pop_front() {
            return status;
        }
        self.final_status
            .lock()
            .unwrap()
            .clone()
            .unwrap_or(ConfirmationStatus::Pending)
    }
}

/// `LedgerRpc` view of the network through one endpoint.
pub struct MockLedger {
    endpoint: String,
    network: Arc<MockNetwork>,
}

#[async_trait]
impl LedgerRpc for MockLedger {
    async fn get_latest_reference(&self) -> RpcResult<LatestReference> {
        self.network.enter(&self.endpoint, "get_latest_reference")?;
        let height = self.network.height.fetch_add(1, Ordering::SeqCst) as u64 + 100;
        Ok(LatestReference {
            height,
            hash: Some(format!("blockhash-{height}")),
        })
    }

    async fn get_account_balance(&self, account: &str) -> RpcResult<u128> {
        self.network.enter(&self.endpoint, "get_account_balance")?;
        Ok(self
            .network
            .balances
            .lock()
            .unwrap()
            .get(account)
            .copied()
            .unwrap_or(0))
    }

    async fn submit(&self, payload: &SignedPayload) -> RpcResult<TxId> {
        self.network.enter(&self.endpoint, "submit")?;
        if let Some(kind) = *self.network.submit_rejection.lock().unwrap() {
            return Err(RpcError::new(kind, &self.endpoint, "submission rejected"));
        }
        let mut submitted = self.network.submitted.lock().unwrap();
        submitted.push((self.endpoint.clone(), payload.clone()));
        Ok(TxId(format!("tx-{}", submitted.len())))
    }

    async fn get_confirmation_status(&self, _tx_id: &TxId) -> RpcResult<ConfirmationStatus> {
        self.network
            .enter(&self.endpoint, "get_confirmation_status")?;
        Ok(self.network.next_status())
    }
}

pub struct MockConnector {
    network: Arc<MockNetwork>,
    pub connects: AtomicU32,
}

impl MockConnector {
    pub fn new(network: Arc<MockNetwork>) -> Arc<Self> {
        Arc::new(Self {
            network,
            connects: AtomicU32::new(0),
        })
    }
}

#[async_trait]
impl LedgerConnector for MockConnector {
    async fn connect(&self, endpoint: &str) -> RpcResult<Arc<dyn LedgerRpc>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockLedger {
            endpoint: endpoint.to_string(),
            network: self.network.clone(),
        }))
    }
}

/// Records what it signs; the signature is the payload rendered as text.
#[derive(Default)]
pub struct MockSigner {
    pub signed: Mutex<Vec<UnsignedPayload>>,
}

#[async_trait]
impl TxSigner for MockSigner {
    async fn sign(&self, payload: &UnsignedPayload) -> Result<SignedPayload, SignerError> {
        self.signed.lock().unwrap().push(payload.clone());
        Ok(SignedPayload(
            format!("{}:{}:{}", payload.recipient, payload.amount, payload.reference.height)
                .into_bytes(),
        ))
    }
}

/// Start a programmable JSON-RPC backend on an ephemeral port.
///
/// `f` receives the JSON-RPC method and returns the HTTP status plus either a
/// `result` or an `error` object; the request id is echoed back.
pub async fn start_json_rpc_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, serde_json::Value)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let Some(request) = read_json_body(&mut socket).await else {
                            return;
                        };
                        let method = request["method"].as_str().unwrap_or_default().to_string();
                        let (status, outcome) = f(method).await;

                        let mut body = serde_json::json!({ "jsonrpc": "2.0", "id": request["id"] });
                        if outcome.get("code").is_some() {
                            body["error"] = outcome;
                        } else {
                            body["result"] = outcome;
                        }
                        let body = body.to_string();

                        let status_text = match status {
                            200 => "200 OK",
                            403 => "403 Forbidden",
                            429 => "429 Too Many Requests",
                            500 => "500 Internal Server Error",
                            502 => "502 Bad Gateway",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };
                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

async fn read_json_body(socket: &mut tokio::net::TcpStream) -> Option<serde_json::Value> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf);
        let Some(split) = text.find("\r\n\r\n") else {
            continue;
        };
        let length = text[..split]
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);

        let body_start = split + 4;
        if buf.len() >= body_start + length {
            return serde_json::from_slice(&buf[body_start..body_start + length]).ok();
        }
    }
}

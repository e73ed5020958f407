//! alloy adapter tests against a local JSON-RPC backend.

use std::time::Duration;

use ledger_runtime::blockchain::{
    AlloyLedger, ConfirmationStatus, LedgerRpc, RpcErrorKind, SignedPayload, TxId,
};
use serde_json::json;

mod common;

const TX_HASH: &str = "0x88df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a713944b";

fn ledger(addr: std::net::SocketAddr) -> AlloyLedger {
    AlloyLedger::connect(&format!("http://{addr}"), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_latest_reference_and_balance() {
    let addr = common::start_json_rpc_backend(|method| async move {
        match method.as_str() {
            "eth_blockNumber" => (200, json!("0x10")),
            "eth_getBalance" => (200, json!("0xde0b6b3a7640000")),
            _ => (200, json!({ "code": -32601, "message": "method not found" })),
        }
    })
    .await;
    let ledger = ledger(addr);

    let reference = ledger.get_latest_reference().await.unwrap();
    assert_eq!(reference.height, 16);

    let balance = ledger
        .get_account_balance("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266")
        .await
        .unwrap();
    assert_eq!(balance, 1_000_000_000_000_000_000);
}

#[tokio::test]
async fn test_http_429_is_rate_limited() {
    let addr = common::start_json_rpc_backend(|_| async move {
        (429, json!({ "code": 429, "message": "Too Many Requests" }))
    })
    .await;

    let err = ledger(addr).get_latest_reference().await.unwrap_err();
    assert_eq!(err.kind, RpcErrorKind::RateLimited);
    assert!(err.is_endpoint_fault());
}

#[tokio::test]
async fn test_json_rpc_codes_are_classified() {
    let addr = common::start_json_rpc_backend(|method| async move {
        match method.as_str() {
            "eth_blockNumber" => (200, json!({ "code": -32005, "message": "limit exceeded" })),
            "eth_sendRawTransaction" => (
                200,
                json!({ "code": -32000, "message": "insufficient funds for gas * price + value" }),
            ),
            _ => (200, json!({ "code": -32602, "message": "invalid params" })),
        }
    })
    .await;
    let ledger = ledger(addr);

    let err = ledger.get_latest_reference().await.unwrap_err();
    assert_eq!(err.kind, RpcErrorKind::RateLimited);

    // No structured code for this one, so the message decides
    let err = ledger
        .submit(&SignedPayload(vec![0x02, 0xf8, 0x6c]))
        .await
        .unwrap_err();
    assert_eq!(err.kind, RpcErrorKind::InsufficientFunds);
    assert!(!err.is_endpoint_fault());
}

fn receipt(status: &str, block: &str) -> serde_json::Value {
    json!({
        "type": "0x2",
        "status": status,
        "cumulativeGasUsed": "0x5208",
        "logs": [],
        "logsBloom": format!("0x{}", "00".repeat(256)),
        "transactionHash": TX_HASH,
        "transactionIndex": "0x0",
        "blockHash": "0x1111111111111111111111111111111111111111111111111111111111111111",
        "blockNumber": block,
        "gasUsed": "0x5208",
        "effectiveGasPrice": "0x3b9aca00",
        "from": "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266",
        "to": "0x70997970c51812dc3a010c7d01b50e0d17dc79c8",
        "contractAddress": null
    })
}

#[tokio::test]
async fn test_receipt_states() {
    let addr = common::start_json_rpc_backend(|_| async move { (200, json!(null)) }).await;
    let status = ledger(addr)
        .get_confirmation_status(&TxId::from(TX_HASH))
        .await
        .unwrap();
    assert_eq!(status, ConfirmationStatus::Pending);

    let addr = common::start_json_rpc_backend(|_| async move { (200, receipt("0x1", "0x2a")) }).await;
    let status = ledger(addr)
        .get_confirmation_status(&TxId::from(TX_HASH))
        .await
        .unwrap();
    assert_eq!(status, ConfirmationStatus::Confirmed { block: Some(42) });

    let addr = common::start_json_rpc_backend(|_| async move { (200, receipt("0x0", "0x2b")) }).await;
    let status = ledger(addr)
        .get_confirmation_status(&TxId::from(TX_HASH))
        .await
        .unwrap();
    assert!(matches!(status, ConfirmationStatus::Failed(_)));
}

#[tokio::test]
async fn test_insufficient_funds_with_large_amounts_in_message() {
    let addr = common::start_json_rpc_backend(|_| async move {
        (
            200,
            json!({
                "code": -32000,
                "message": "insufficient funds for gas * price + value: address 0x70997970C51812dc3A010C7d01b50e0d17dc79C8 have 4290000000000 want 21000000000000"
            }),
        )
    })
    .await;

    let err = ledger(addr)
        .submit(&SignedPayload(vec![0x02, 0xf8, 0x6c]))
        .await
        .unwrap_err();
    assert_eq!(err.kind, RpcErrorKind::InsufficientFunds);
    assert!(!err.is_endpoint_fault());
    assert_eq!(
        ledger_runtime::Error::from(err).disposition(),
        ledger_runtime::Disposition::FixInput
    );
}

#[tokio::test]
async fn test_submit_returns_hash() {
    let addr = common::start_json_rpc_backend(|method| async move {
        match method.as_str() {
            "eth_sendRawTransaction" => (200, json!(TX_HASH)),
            _ => (200, json!({ "code": -32601, "message": "method not found" })),
        }
    })
    .await;

    let tx_id = ledger(addr)
        .submit(&SignedPayload(vec![0x02, 0xf8, 0x6c]))
        .await
        .unwrap();
    assert_eq!(tx_id.as_str(), TX_HASH);
}

#[tokio::test]
async fn test_slow_endpoint_times_out() {
    let addr = common::start_json_rpc_backend(|_| async move {
        tokio::time::sleep(Duration::from_secs(2)).await;
        (200, json!("0x1"))
    })
    .await;

    let ledger = AlloyLedger::connect(&format!("http://{addr}"), Duration::from_millis(200)).unwrap();
    let err = ledger.get_latest_reference().await.unwrap_err();
    assert_eq!(err.kind, RpcErrorKind::Timeout);
    assert!(err.message.contains("timed out"));
}

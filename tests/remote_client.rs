//! End-to-end client scenarios against a mock peer.

use std::sync::{Arc, Mutex};

use ledger_client::{AccountKey, Address, ClientError, Connection, Hash, Signature, Signer};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Deterministic signer that records every hash it is asked to sign.
struct RecordingSigner {
    signed: Mutex<Vec<Hash>>,
}

impl RecordingSigner {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            signed: Mutex::new(Vec::new()),
        })
    }

    fn signed_hashes(&self) -> Vec<Hash> {
        self.signed.lock().unwrap().clone()
    }
}

impl Signer for RecordingSigner {
    fn account_key(&self) -> AccountKey {
        AccountKey::from_bytes([0x11; 32])
    }

    fn sign(&self, hash: &Hash) -> Signature {
        self.signed.lock().unwrap().push(*hash);
        Signature::from_bytes([0xcd; 64])
    }
}

fn connection(server: &MockServer, address: u64, signer: Arc<RecordingSigner>) -> Connection {
    Connection::connect_as(&server.uri(), Address::new(address), signer).unwrap()
}

#[tokio::test]
async fn query_returns_the_peer_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/query"))
        .and(body_json(json!({"address": "#12", "source": "(+ 1 2)"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": 3})))
        .expect(1)
        .mount(&server)
        .await;

    let conn = connection(&server, 12, RecordingSigner::new());
    let result = conn.query("(+ 1 2)").await.unwrap();
    assert_eq!(result["value"], 3);
}

#[tokio::test]
async fn query_account_payload_is_returned_unmodified() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/accounts/12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sequence": 5,
            "balance": 1000,
            "memory_size": 42,
        })))
        .mount(&server)
        .await;

    let conn = connection(&server, 12, RecordingSigner::new());
    let account = conn.query_account(Address::new(12)).await.unwrap();
    assert_eq!(account["sequence"], 5);
    assert_eq!(account["balance"], 1000);
    assert_eq!(account["memory_size"], 42);
}

#[tokio::test]
async fn query_sequence_is_none_for_a_missing_account() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/accounts/404"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"errorCode": "NOBODY"})))
        .mount(&server)
        .await;

    let conn = connection(&server, 12, RecordingSigner::new());
    let sequence = conn.query_sequence(Address::new(404)).await.unwrap();
    assert_eq!(sequence, None);
}

#[tokio::test]
async fn get_sequence_caches_after_one_network_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/accounts/12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"sequence": 7, "balance": 0})))
        .expect(1)
        .mount(&server)
        .await;

    let mut conn = connection(&server, 12, RecordingSigner::new());
    assert_eq!(conn.get_sequence().await.unwrap(), 7);
    assert_eq!(conn.get_sequence().await.unwrap(), 7);
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn get_sequence_for_a_missing_account_is_a_protocol_error() {
    let server = MockServer::start().await;
    // The peer answers for unknown accounts with a payload that simply
    // lacks the sequence field.
    Mock::given(method("GET"))
        .and(path("/api/v1/accounts/12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"errorCode": "NOBODY"})))
        .mount(&server)
        .await;

    let mut conn = connection(&server, 12, RecordingSigner::new());
    let err = conn.get_sequence().await.unwrap_err();
    assert!(matches!(err, ClientError::Protocol { field: "sequence", .. }));
}

#[tokio::test]
async fn rebinding_the_address_invalidates_the_sequence_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/accounts/12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"sequence": 7})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/accounts/13"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"sequence": 1})))
        .mount(&server)
        .await;

    let mut conn = connection(&server, 12, RecordingSigner::new());
    assert_eq!(conn.get_sequence().await.unwrap(), 7);
    conn.set_address(Address::new(13));
    assert_eq!(conn.get_sequence().await.unwrap(), 1);
}

#[tokio::test]
async fn create_account_parses_numeric_and_string_addresses() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/create-account"))
        .and(body_json(json!({"public_key": "11".repeat(32)})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"address": 1001})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/create-account"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"address": "#1002"})))
        .mount(&server)
        .await;

    let conn = Connection::connect(&server.uri()).unwrap();
    let signer = RecordingSigner::new();
    assert_eq!(
        conn.create_account(&signer.account_key()).await.unwrap(),
        Address::new(1001)
    );
    assert_eq!(
        conn.create_account(&signer.account_key()).await.unwrap(),
        Address::new(1002)
    );
}

#[tokio::test]
async fn create_account_with_missing_address_is_a_protocol_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/create-account"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"errorCode": "FULL"})))
        .mount(&server)
        .await;

    let conn = Connection::connect(&server.uri()).unwrap();
    let err = conn
        .create_account(&AccountKey::from_bytes([0x11; 32]))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Protocol { field: "address", .. }));
}

#[tokio::test]
async fn use_new_account_rebinds_the_connection_identity() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/create-account"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"address": 77})))
        .mount(&server)
        .await;

    let mut conn = Connection::connect(&server.uri()).unwrap();
    let address = conn.use_new_account(RecordingSigner::new()).await.unwrap();
    assert_eq!(address, Address::new(77));
    assert_eq!(conn.address(), Some(Address::new(77)));
}

#[tokio::test]
async fn faucet_grant_shows_up_in_the_balance() {
    let server = MockServer::start().await;
    // Balance before the grant, consumed by the first lookup only.
    Mock::given(method("GET"))
        .and(path("/api/v1/accounts/12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"balance": 100, "sequence": 0})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/faucet"))
        .and(body_json(json!({"address": 12, "amount": 999})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"address": 12, "amount": 999})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/accounts/12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"balance": 1099, "sequence": 0})))
        .mount(&server)
        .await;

    let conn = connection(&server, 12, RecordingSigner::new());
    let before = conn.query_balance().await.unwrap().unwrap();
    let grant = conn.faucet(Address::new(12), 999).await.unwrap();
    assert_eq!(grant["amount"], 999);
    let after = conn.query_balance().await.unwrap().unwrap();
    assert_eq!(after - before, 999);
}

#[tokio::test]
async fn transact_submits_exactly_the_prepared_hash_and_signature() {
    let server = MockServer::start().await;
    let hash_hex = "ab12".repeat(16);
    Mock::given(method("POST"))
        .and(path("/api/v1/transaction/prepare"))
        .and(header("Content-Type", "application/json"))
        .and(body_json(json!({"address": "#12", "source": "(* 3 4)"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"hash": &hash_hex})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/transaction/submit"))
        .and(body_json(json!({
            "address": 12,
            "hash": &hash_hex,
            "account_key": "11".repeat(32),
            "sig": "cd".repeat(64),
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": 12})))
        .expect(1)
        .mount(&server)
        .await;

    let signer = RecordingSigner::new();
    let conn = connection(&server, 12, signer.clone());
    let result = conn.transact("(* 3 4)").await.unwrap();

    // The pipeline resolves with the submit result, not the prepare result.
    assert_eq!(result["value"], 12);
    // The signature covers exactly the hash prepare returned.
    assert_eq!(signer.signed_hashes(), vec![Hash::from_hex(&hash_hex).unwrap()]);
}

#[tokio::test]
async fn failed_prepare_means_submit_is_never_attempted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/transaction/prepare"))
        .respond_with(ResponseTemplate::new(500).set_body_string("peer exploded"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/transaction/submit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let signer = RecordingSigner::new();
    let conn = connection(&server, 12, signer.clone());
    let err = conn.transact("(def a 1)").await.unwrap_err();

    assert!(matches!(err, ClientError::Transport(_)));
    assert!(signer.signed_hashes().is_empty());
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn prepare_without_a_hash_is_a_protocol_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/transaction/prepare"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"source": "(def a 1)"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/transaction/submit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let conn = connection(&server, 12, RecordingSigner::new());
    let err = conn.transact("(def a 1)").await.unwrap_err();
    assert!(matches!(err, ClientError::Protocol { field: "hash", .. }));
}

#[tokio::test]
async fn prepare_with_a_malformed_hash_is_a_protocol_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/transaction/prepare"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"hash": "ab12"})))
        .mount(&server)
        .await;

    let conn = connection(&server, 12, RecordingSigner::new());
    let err = conn.transact("(def a 1)").await.unwrap_err();
    assert!(matches!(err, ClientError::Protocol { field: "hash", .. }));
}

#[tokio::test]
async fn execution_failures_come_back_as_payload_data() {
    let server = MockServer::start().await;
    let hash_hex = "ee".repeat(32);
    Mock::given(method("POST"))
        .and(path("/api/v1/transaction/prepare"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"hash": hash_hex})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/transaction/submit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errorCode": "FUNDS",
            "value": "insufficient balance",
        })))
        .mount(&server)
        .await;

    let conn = connection(&server, 12, RecordingSigner::new());
    let result = conn.transact("(transfer #13 1000000)").await.unwrap();
    assert_eq!(result["errorCode"], "FUNDS");
}

#[tokio::test]
async fn concurrent_pipelines_on_one_connection_both_complete() {
    let server = MockServer::start().await;
    let hash_hex = "0f".repeat(32);
    Mock::given(method("POST"))
        .and(path("/api/v1/transaction/prepare"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"hash": hash_hex})))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/transaction/submit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": 1})))
        .expect(2)
        .mount(&server)
        .await;

    let conn = connection(&server, 12, RecordingSigner::new());
    let (a, b) = tokio::join!(conn.transact("(def a 1)"), conn.transact("(def b 2)"));
    assert_eq!(a.unwrap()["value"], 1);
    assert_eq!(b.unwrap()["value"], 1);
}

//! A caller-owned connection to a ledger peer.
//!
//! [`Connection`] bundles the peer's base URL, the caller's current identity
//! (address and key pair) and a lazily cached sequence number, and exposes
//! the peer operations on top of the [`http`](crate::http) transport:
//! queries, account creation, faucet funding and the two-stage
//! prepare/sign/submit transaction pipeline.
//!
//! # Ownership and concurrency
//!
//! A `Connection` is owned by its caller. Read-only operations take `&self`
//! and may run concurrently from multiple tasks; rebinding the identity
//! (`set_address`, `set_key_pair`, `use_new_account`) and the sequence cache
//! take `&mut self`, so the borrow checker enforces what the protocol only
//! documents: the same connection must not be mutated while operations are
//! in flight. There is no ordering guarantee between concurrent pipelines,
//! even on one connection; callers that need sequential transactions must
//! serialize them.

use std::sync::Arc;
use std::time::Duration;

use log::debug;
use reqwest::Method;
use serde_json::{Value, json};
use url::Url;

use crate::error::ClientError;
use crate::http::HttpClient;
use crate::keys::Signer;
use crate::types::{AccountKey, Address, Hash};

/// A shareable signing capability, as bound to a connection.
pub type KeyPair = Arc<dyn Signer + Send + Sync>;

/// A client connection to a ledger peer.
///
/// ```no_run
/// use std::sync::Arc;
/// use ledger_client::Connection;
///
/// # async fn example() -> Result<(), ledger_client::ClientError> {
/// let key = ed25519_dalek::SigningKey::from_bytes(&[1u8; 32]);
/// let mut conn = Connection::connect("http://localhost:3000")?;
/// let address = conn.use_new_account_with_funds(Arc::new(key), 1_000_000).await?;
///
/// let result = conn.transact("(def counter 1)").await?;
/// if let Some(code) = result.get("errorCode") {
///     eprintln!("transaction failed on the peer: {code}");
/// }
/// # Ok(())
/// # }
/// ```
pub struct Connection {
    http: HttpClient,
    address: Option<Address>,
    key_pair: Option<KeyPair>,
    /// Lazily resolved sequence number for the bound address. A hint only:
    /// the peer is authoritative for sequencing and no request ever carries
    /// this value.
    sequence: Option<u64>,
}

impl Connection {
    /// Connects to the peer at `base_url` with no identity bound.
    ///
    /// Account-scoped operations fail with a precondition error until an
    /// address (and, for transactions, a key pair) is bound via
    /// [`set_address`](Self::set_address) /
    /// [`set_key_pair`](Self::set_key_pair) or
    /// [`use_new_account`](Self::use_new_account).
    pub fn connect(base_url: &str) -> Result<Self, ClientError> {
        let url = Url::parse(base_url).map_err(crate::http::HttpError::from)?;
        Ok(Self {
            http: HttpClient::new(url),
            address: None,
            key_pair: None,
            sequence: None,
        })
    }

    /// Connects with an address and key pair already bound.
    pub fn connect_as(base_url: &str, address: Address, key_pair: KeyPair) -> Result<Self, ClientError> {
        let mut conn = Self::connect(base_url)?;
        conn.address = Some(address);
        conn.key_pair = Some(key_pair);
        Ok(conn)
    }

    /// Connects with explicit transport settings.
    ///
    /// `max_retries` opts in to transparent retries of transient transport
    /// failures; it defaults to zero elsewhere because replaying a
    /// state-changing request is a caller decision, not the client's.
    pub fn connect_with_config(base_url: &str, max_retries: u32, timeout: Duration) -> Result<Self, ClientError> {
        let url = Url::parse(base_url).map_err(crate::http::HttpError::from)?;
        Ok(Self {
            http: HttpClient::with_config(url, max_retries, timeout),
            address: None,
            key_pair: None,
            sequence: None,
        })
    }

    pub fn base_url(&self) -> &Url {
        self.http.base_url()
    }

    pub fn address(&self) -> Option<Address> {
        self.address
    }

    /// Rebinds the connection to a different account address.
    ///
    /// Clears the cached sequence number, which was a hint for the previous
    /// account.
    pub fn set_address(&mut self, address: Address) {
        self.address = Some(address);
        self.sequence = None;
    }

    pub fn set_key_pair(&mut self, key_pair: KeyPair) {
        self.key_pair = Some(key_pair);
    }

    /// Round-trip latency of the most recent request, if any was made.
    pub async fn last_request_latency(&self) -> Option<Duration> {
        self.http.get_latency().await
    }

    fn require_address(&self) -> Result<Address, ClientError> {
        self.address.ok_or(ClientError::NoAddress)
    }

    fn require_key_pair(&self) -> Result<&KeyPair, ClientError> {
        self.key_pair.as_ref().ok_or(ClientError::NoKeyPair)
    }

    /// Executes a read-only query with the given source code.
    ///
    /// The response payload is returned unmodified; a logical failure on the
    /// peer comes back as a payload with an `errorCode` field, not as `Err`.
    pub async fn query(&self, source: &str) -> Result<Value, ClientError> {
        let address = self.require_address()?;
        debug!(address:% = address; "Querying peer");
        let payload = json!({ "address": address.to_string(), "source": source });
        Ok(self
            .http
            .send_request(Method::POST, "/api/v1/query", Some(payload))
            .await?)
    }

    /// Fetches account details (balance, sequence, memory usage, ...) for
    /// `address`. The payload is returned unmodified; a non-existent account
    /// yields a payload without a `sequence` field.
    pub async fn query_account(&self, address: Address) -> Result<Value, ClientError> {
        let path = format!("/api/v1/accounts/{}", address.value());
        Ok(self.http.send_request(Method::GET, &path, None).await?)
    }

    /// Account details for the connection's own bound address.
    pub async fn query_own_account(&self) -> Result<Value, ClientError> {
        let address = self.require_address()?;
        self.query_account(address).await
    }

    /// The current sequence number of `address`, or `None` if the account
    /// does not exist on the peer.
    pub async fn query_sequence(&self, address: Address) -> Result<Option<u64>, ClientError> {
        let account = self.query_account(address).await?;
        Ok(account.get("sequence").and_then(Value::as_u64))
    }

    /// The current balance of the connection's bound address, or `None` if
    /// the account does not exist on the peer.
    pub async fn query_balance(&self) -> Result<Option<u64>, ClientError> {
        let account = self.query_own_account().await?;
        Ok(account.get("balance").and_then(Value::as_u64))
    }

    /// The sequence number of the bound address, resolved lazily and cached.
    ///
    /// At most one network call is made per connection until the cache is
    /// invalidated by rebinding the address. The cached value is a hint for
    /// the caller; it is never attached to any request (this peer protocol
    /// is fully server-sequenced).
    pub async fn get_sequence(&mut self) -> Result<u64, ClientError> {
        let address = self.require_address()?;
        if let Some(sequence) = self.sequence {
            return Ok(sequence);
        }
        let sequence = self
            .query_sequence(address)
            .await?
            .ok_or_else(|| ClientError::protocol("sequence", format!("account {address} does not exist")))?;
        self.sequence = Some(sequence);
        Ok(sequence)
    }

    /// Creates a new account on the peer for the given public account key
    /// and returns its freshly assigned address.
    pub async fn create_account(&self, account_key: &AccountKey) -> Result<Address, ClientError> {
        debug!("Creating account");
        let payload = json!({ "public_key": account_key.to_hex() });
        let resp = self
            .http
            .send_request(Method::POST, "/api/v1/create-account", Some(payload))
            .await?;
        resp.get("address")
            .and_then(Address::from_json)
            .ok_or_else(|| ClientError::protocol("address", format!("create-account response: {resp}")))
    }

    /// Creates a new account for the signer's key and rebinds this
    /// connection to it, clearing the cached sequence number.
    pub async fn use_new_account(&mut self, key_pair: KeyPair) -> Result<Address, ClientError> {
        let address = self.create_account(&key_pair.account_key()).await?;
        debug!(address:% = address; "Bound connection to new account");
        self.address = Some(address);
        self.key_pair = Some(key_pair);
        self.sequence = None;
        Ok(address)
    }

    /// [`use_new_account`](Self::use_new_account) followed by a faucet
    /// request for `amount` to the new address.
    pub async fn use_new_account_with_funds(&mut self, key_pair: KeyPair, amount: u64) -> Result<Address, ClientError> {
        let address = self.use_new_account(key_pair).await?;
        self.faucet(address, amount).await?;
        Ok(address)
    }

    /// Requests `amount` of test funds for `address` from the peer's
    /// faucet. The response payload (including the granted `amount`) is
    /// returned unmodified; no client-side validation beyond the
    /// non-negativity the type already carries.
    pub async fn faucet(&self, address: Address, amount: u64) -> Result<Value, ClientError> {
        debug!(address:% = address, amount = amount; "Requesting faucet funds");
        let payload = json!({ "address": address.value(), "amount": amount });
        Ok(self
            .http
            .send_request(Method::POST, "/api/v1/faucet", Some(payload))
            .await?)
    }

    /// Executes a signed transaction through the peer's two-phase protocol.
    ///
    /// The pipeline is a chain of two dependent network calls with a local
    /// signing step between them:
    ///
    /// 1. **prepare** — POST `{address, source}`; the response must carry a
    ///    hex `hash`, the digest the peer expects a signature over.
    /// 2. **sign** — the bound key pair signs exactly that hash (local,
    ///    non-suspending).
    /// 3. **submit** — POST `{address, hash, account_key, sig}`; the
    ///    response payload is the transaction result, returned verbatim.
    ///
    /// Submit is only attempted once prepare has resolved; any failure
    /// (transport, missing or malformed hash) short-circuits the chain and
    /// no retries are made. A logical execution failure is reported by the
    /// peer as a payload with an `errorCode` field and surfaces as `Ok`.
    ///
    /// Both the address and the key pair are required up front; either
    /// missing is a precondition error raised before any network call.
    /// Awaiting the returned future to completion is the synchronous form
    /// of the operation; the future resolves with the submit result, never
    /// the intermediate prepare result.
    pub async fn transact(&self, source: &str) -> Result<Value, ClientError> {
        let address = self.require_address()?;
        let key_pair = self.require_key_pair()?;

        debug!(address:% = address; "Preparing transaction");
        let payload = json!({ "address": address.to_string(), "source": source });
        let resp = self
            .http
            .send_request(Method::POST, "/api/v1/transaction/prepare", Some(payload))
            .await?;

        let hash_hex = resp
            .get("hash")
            .and_then(Value::as_str)
            .ok_or_else(|| ClientError::protocol("hash", format!("prepare response: {resp}")))?;
        let hash = Hash::from_hex(hash_hex).map_err(|e| ClientError::protocol("hash", e.to_string()))?;

        self.submit(address, key_pair, hash).await
    }

    /// Stage two of the pipeline: sign the prepared hash and submit it.
    async fn submit(&self, address: Address, key_pair: &KeyPair, hash: Hash) -> Result<Value, ClientError> {
        let signature = key_pair.sign(&hash);
        debug!(address:% = address, hash:% = hash; "Submitting transaction");
        let payload = json!({
            "address": address.value(),
            "hash": hash.to_hex(),
            "account_key": key_pair.account_key().to_hex(),
            "sig": signature.to_hex(),
        });
        Ok(self
            .http
            .send_request(Method::POST, "/api/v1/transaction/submit", Some(payload))
            .await?)
    }
}

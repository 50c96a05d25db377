//! Shared fixtures for integration tests: an in-process chain and a canned compiler.
#![allow(dead_code)]

use alloy::consensus::{Transaction, TxEnvelope};
use alloy::eips::eip2718::Decodable2718;
use alloy::json_abi::JsonAbi;
use alloy::primitives::{keccak256, Address, Bytes, TxHash};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use contract_deployer::chain::{ChainError, ChainResult, ChainRpc, ReceiptInfo, TransactionInfo};
use contract_deployer::compiler::{
    CompilationOutput, CompileError, CompiledArtifact, SolidityCompiler,
};
use contract_deployer::signer::Wallet;
use contract_deployer::{DeploymentSettings, Orchestrator};

/// Well-known development key (first Anvil/Hardhat account).
pub const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

pub const CHAIN_ID: u64 = 31337;
pub const GAS_PRICE: u128 = 2_000_000_000;
pub const GAS_USED: u64 = 150_000;

pub const COUNTER_SOURCE: &str = "contract Counter { uint256 public count; }";
pub const TOKEN_SOURCE: &str =
    "contract Token { constructor(uint256 supply) {} } contract Helper {}";
pub const BROKEN_SOURCE: &str = "contract Broken { uint256 x }";

pub fn dev_wallet() -> Wallet {
    Wallet::from_private_key(DEV_KEY).unwrap()
}

// ---------------------------------------------------------------------------
// Compiler
// ---------------------------------------------------------------------------

fn artifact(name: &str, abi: &str, init: &[u8], runtime: &[u8]) -> CompiledArtifact {
    let mut bytecode = init.to_vec();
    bytecode.extend_from_slice(runtime);
    CompiledArtifact {
        name: name.to_string(),
        abi: serde_json::from_str::<JsonAbi>(abi).unwrap(),
        bytecode: Bytes::from(bytecode),
        runtime_bytecode: Bytes::from(runtime.to_vec()),
    }
}

fn output(artifacts: Vec<CompiledArtifact>) -> CompilationOutput {
    CompilationOutput {
        artifacts: artifacts
            .into_iter()
            .map(|a| (a.name.clone(), a))
            .collect::<BTreeMap<_, _>>(),
        compiler_version: Some("0.8.24+fake".to_string()),
    }
}

pub fn counter_output() -> CompilationOutput {
    output(vec![artifact(
        "Counter",
        r#"[{"type":"function","name":"count","inputs":[],"outputs":[{"name":"","type":"uint256"}],"stateMutability":"view"}]"#,
        &[0x60, 0x80, 0x60, 0x40, 0x52],
        &[0x60, 0x80, 0x60, 0x40, 0x52, 0x34, 0x80, 0x15, 0x00],
    )])
}

pub fn token_output() -> CompilationOutput {
    output(vec![
        artifact(
            "Helper",
            "[]",
            &[0x60, 0x80, 0x60, 0x40],
            &[0x60, 0x80, 0x60, 0x40, 0x52, 0xfe],
        ),
        artifact(
            "Token",
            r#"[{"type":"constructor","inputs":[{"name":"supply","type":"uint256"}],"stateMutability":"nonpayable"}]"#,
            &[0x60, 0x80, 0x60, 0x40, 0x52, 0x60],
            &[0x60, 0x80, 0x60, 0x40, 0x52, 0x36, 0x15, 0x00],
        ),
    ])
}

/// Compiler returning canned output for known sources.
#[derive(Default)]
pub struct FakeCompiler {
    calls: AtomicUsize,
}

impl FakeCompiler {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SolidityCompiler for FakeCompiler {
    async fn compile(&self, source: &str) -> Result<CompilationOutput, CompileError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match source {
            COUNTER_SOURCE => Ok(counter_output()),
            TOKEN_SOURCE => Ok(token_output()),
            "" => Err(CompileError::NoContracts),
            _ => Err(CompileError::Diagnostics(
                "ParserError: Expected ';' but got '}'".to_string(),
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Chain
// ---------------------------------------------------------------------------

struct PendingTx {
    hash: TxHash,
    sender: Address,
    nonce: u64,
    input: Bytes,
    revert: bool,
}

struct State {
    next_nonce: u64,
    block: u64,
    mempool: Vec<PendingTx>,
    receipts: HashMap<TxHash, ReceiptInfo>,
    transactions: HashMap<TxHash, TransactionInfo>,
    code: HashMap<Address, Bytes>,
    /// (creation bytecode, runtime bytecode) pairs the chain knows how to deploy.
    runtimes: Vec<(Bytes, Bytes)>,
    call_result: Bytes,
    last_call: Option<(Address, Bytes)>,
}

/// In-process chain with strict nonce ordering and manual or automatic mining.
pub struct MockChain {
    sender: Address,
    auto_mine: AtomicBool,
    fail_next_send: AtomicBool,
    revert_next: AtomicBool,
    sends: AtomicUsize,
    state: Mutex<State>,
}

impl MockChain {
    pub fn new(sender: Address) -> Arc<Self> {
        let chain = Self {
            sender,
            auto_mine: AtomicBool::new(true),
            fail_next_send: AtomicBool::new(false),
            revert_next: AtomicBool::new(false),
            sends: AtomicUsize::new(0),
            state: Mutex::new(State {
                next_nonce: 0,
                block: 1,
                mempool: Vec::new(),
                receipts: HashMap::new(),
                transactions: HashMap::new(),
                code: HashMap::new(),
                runtimes: Vec::new(),
                call_result: Bytes::new(),
                last_call: None,
            }),
        };
        chain.register(&counter_output());
        chain.register(&token_output());
        Arc::new(chain)
    }

    fn register(&self, output: &CompilationOutput) {
        let mut state = self.state.lock().unwrap();
        for a in output.iter() {
            state
                .runtimes
                .push((a.bytecode.clone(), a.runtime_bytecode.clone()));
        }
    }

    pub fn set_auto_mine(&self, enabled: bool) {
        self.auto_mine.store(enabled, Ordering::SeqCst);
    }

    /// Fail the next `eth_sendRawTransaction` with a transport error.
    pub fn fail_next_send(&self) {
        self.fail_next_send.store(true, Ordering::SeqCst);
    }

    /// Mine the next submitted transaction with receipt status 0.
    pub fn revert_next(&self) {
        self.revert_next.store(true, Ordering::SeqCst);
    }

    /// Consume a nonce outside this process.
    pub fn bump_nonce(&self, by: u64) {
        self.state.lock().unwrap().next_nonce += by;
    }

    pub fn set_code(&self, address: Address, code: Bytes) {
        self.state.lock().unwrap().code.insert(address, code);
    }

    pub fn code(&self, address: Address) -> Bytes {
        self.state
            .lock()
            .unwrap()
            .code
            .get(&address)
            .cloned()
            .unwrap_or_default()
    }

    pub fn set_call_result(&self, data: Bytes) {
        self.state.lock().unwrap().call_result = data;
    }

    pub fn last_call(&self) -> Option<(Address, Bytes)> {
        self.state.lock().unwrap().last_call.clone()
    }

    pub fn sends(&self) -> usize {
        self.sends.load(Ordering::SeqCst)
    }

    pub fn mempool_len(&self) -> usize {
        self.state.lock().unwrap().mempool.len()
    }

    pub fn current_block(&self) -> u64 {
        self.state.lock().unwrap().block
    }

    /// Include every pending transaction in a new block.
    pub fn mine(&self) {
        let mut state = self.state.lock().unwrap();
        Self::mine_locked(&mut state);
    }

    /// Mine `n` blocks without transactions.
    pub fn mine_empty(&self, n: u64) {
        self.state.lock().unwrap().block += n;
    }

    fn mine_locked(state: &mut State) {
        state.block += 1;
        let block = state.block;

        let mut pending = std::mem::take(&mut state.mempool);
        pending.sort_by_key(|tx| tx.nonce);
        for tx in pending {
            let contract_address = if tx.revert {
                None
            } else {
                let address = tx.sender.create(tx.nonce);
                let runtime = state
                    .runtimes
                    .iter()
                    .find(|(creation, _)| tx.input.starts_with(creation))
                    .map(|(_, runtime)| runtime.clone())
                    .unwrap_or_default();
                state.code.insert(address, runtime);
                Some(address)
            };

            if let Some(info) = state.transactions.get_mut(&tx.hash) {
                info.block_number = Some(block);
            }
            state.receipts.insert(
                tx.hash,
                ReceiptInfo {
                    tx_hash: tx.hash,
                    block_number: block,
                    gas_used: GAS_USED,
                    effective_gas_price: GAS_PRICE,
                    contract_address,
                    success: !tx.revert,
                },
            );
        }
    }

    fn rejected(message: &str) -> ChainError {
        ChainError::Rejected {
            op: "eth_sendRawTransaction",
            code: -32000,
            message: message.to_string(),
        }
    }
}

#[async_trait]
impl ChainRpc for MockChain {
    async fn chain_id(&self) -> ChainResult<u64> {
        Ok(CHAIN_ID)
    }

    async fn pending_nonce(&self, address: Address) -> ChainResult<u64> {
        if address != self.sender {
            return Ok(0);
        }
        Ok(self.state.lock().unwrap().next_nonce)
    }

    async fn gas_price(&self) -> ChainResult<u128> {
        Ok(GAS_PRICE)
    }

    async fn estimate_deploy_gas(&self, _from: Address, payload: Bytes) -> ChainResult<u64> {
        if payload.is_empty() {
            return Err(ChainError::Rejected {
                op: "eth_estimateGas",
                code: -32000,
                message: "empty init code".to_string(),
            });
        }
        Ok(GAS_USED)
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> ChainResult<TxHash> {
        self.sends.fetch_add(1, Ordering::SeqCst);
        if self.fail_next_send.swap(false, Ordering::SeqCst) {
            return Err(ChainError::Transport {
                op: "eth_sendRawTransaction",
                message: "connection reset".to_string(),
            });
        }

        let envelope = TxEnvelope::decode_2718(&mut &raw[..])
            .map_err(|e| Self::rejected(&format!("invalid transaction: {}", e)))?;
        if envelope.chain_id() != Some(CHAIN_ID) {
            return Err(Self::rejected("invalid chain id"));
        }

        let hash = keccak256(&raw[..]);
        let mut state = self.state.lock().unwrap();
        let nonce = envelope.nonce();
        if nonce < state.next_nonce {
            return Err(Self::rejected("nonce too low"));
        }
        if nonce > state.next_nonce {
            return Err(Self::rejected("nonce too high"));
        }
        state.next_nonce += 1;

        state.transactions.insert(
            hash,
            TransactionInfo {
                hash,
                from: self.sender,
                nonce,
                gas_price: GAS_PRICE,
                block_number: None,
            },
        );
        state.mempool.push(PendingTx {
            hash,
            sender: self.sender,
            nonce,
            input: envelope.input().clone(),
            revert: self.revert_next.swap(false, Ordering::SeqCst),
        });

        if self.auto_mine.load(Ordering::SeqCst) {
            Self::mine_locked(&mut state);
        }
        Ok(hash)
    }

    async fn transaction_receipt(&self, hash: TxHash) -> ChainResult<Option<ReceiptInfo>> {
        Ok(self.state.lock().unwrap().receipts.get(&hash).cloned())
    }

    async fn transaction_by_hash(&self, hash: TxHash) -> ChainResult<Option<TransactionInfo>> {
        Ok(self.state.lock().unwrap().transactions.get(&hash).cloned())
    }

    async fn block_number(&self) -> ChainResult<u64> {
        Ok(self.current_block())
    }

    async fn code_at(&self, address: Address) -> ChainResult<Bytes> {
        Ok(self.code(address))
    }

    async fn call(&self, to: Address, data: Bytes) -> ChainResult<Bytes> {
        let mut state = self.state.lock().unwrap();
        state.last_call = Some((to, data));
        Ok(state.call_result.clone())
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

pub fn fast_settings() -> DeploymentSettings {
    DeploymentSettings {
        confirmation_timeout: Duration::from_millis(300),
        poll_interval: Duration::from_millis(10),
        ..DeploymentSettings::default()
    }
}

/// Orchestrator wired to a fresh mock chain and the dev key.
pub async fn setup() -> (Arc<Orchestrator>, Arc<MockChain>, Arc<FakeCompiler>) {
    let wallet = dev_wallet();
    let chain = MockChain::new(wallet.address());
    let compiler = Arc::new(FakeCompiler::default());

    let orchestrator = Orchestrator::new(compiler.clone(), chain.clone(), Ok(wallet), fast_settings())
        .await
        .unwrap();

    (Arc::new(orchestrator), chain, compiler)
}

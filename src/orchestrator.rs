//! Deployment orchestrator: the library entry point.
//!
//! # Responsibilities
//! - Wire the compiler, chain connector, key and nonce sequencer together
//! - Resolve the network identity once at startup
//! - Expose compile / build / deploy / estimate / status / verify / call
//!
//! # Data Flow
//! ```text
//! deploy_source(request)
//!     → compile → select(contract_name)
//!     → build (nonce lease held)
//!     → deploy (submit, commit lease, bounded receipt wait)
//!     → DeploymentResult
//! ```

use alloy::primitives::{Address, Bytes, TxHash};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::chain::{AlloyChainClient, ChainError, ChainId, ChainRpc, TransactionInfo};
use crate::compiler::{CompilationOutput, CompileError, CompiledArtifact, SolcCompiler, SolidityCompiler};
use crate::config::DeployerConfig;
use crate::deploy::{
    encoding, Broadcaster, BuildError, CallError, CostEstimate, CostEstimator, DeployError,
    DeploymentRequest, DeploymentResult, EstimateError, PreparedDeployment, SetupError,
    SourceVerifier, StatusError, StatusPoller, SubmitError, TransactionStatus, TxBuilder,
    VerificationReport, VerifyError,
};
use crate::signer::{KeyError, NonceSequencer, Wallet};

/// Tunables of the deployment pipeline.
#[derive(Debug, Clone)]
pub struct DeploymentSettings {
    /// Refuse to start when the node reports a different chain ID.
    pub expected_chain_id: Option<u64>,
    /// Scale between wei and the native unit (10^decimals).
    pub native_decimals: u8,
    pub native_symbol: String,
    /// Upper bound of the receipt wait after submission.
    pub confirmation_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for DeploymentSettings {
    fn default() -> Self {
        Self {
            expected_chain_id: None,
            native_decimals: 18,
            native_symbol: "ETH".to_string(),
            confirmation_timeout: Duration::from_secs(120),
            poll_interval: Duration::from_secs(1),
        }
    }
}

impl DeploymentSettings {
    pub fn from_config(config: &DeployerConfig) -> Self {
        Self {
            expected_chain_id: config.chain.expected_chain_id,
            native_decimals: config.chain.native_decimals,
            native_symbol: config.chain.native_symbol.clone(),
            confirmation_timeout: Duration::from_secs(config.deployment.confirmation_timeout_secs),
            poll_interval: Duration::from_millis(config.deployment.receipt_poll_interval_ms),
        }
    }
}

/// Compiles, signs, broadcasts and tracks contract deployments.
pub struct Orchestrator {
    compiler: Arc<dyn SolidityCompiler>,
    chain: Arc<dyn ChainRpc>,
    wallet: Result<Wallet, KeyError>,
    network: ChainId,
    settings: DeploymentSettings,
    sequencer: Arc<NonceSequencer>,
    builder: TxBuilder,
    broadcaster: Broadcaster,
    estimator: CostEstimator,
    poller: StatusPoller,
    verifier: SourceVerifier,
}

impl Orchestrator {
    /// Build the production stack from configuration.
    ///
    /// A missing signing key is not fatal: read-only operations keep working and
    /// signing operations report the key error.
    pub async fn connect(config: &DeployerConfig) -> Result<Self, SetupError> {
        let compiler = Arc::new(SolcCompiler::new(config.compiler.clone()));
        let chain = Arc::new(AlloyChainClient::new(config.chain.clone())?);

        let wallet = Wallet::from_env(&config.signer.private_key_env);
        if let Err(e) = &wallet {
            tracing::warn!(error = %e, "No signing key; deployments are disabled");
        }

        Self::new(compiler, chain, wallet, DeploymentSettings::from_config(config)).await
    }

    /// Assemble an orchestrator from its collaborators.
    ///
    /// Queries the chain ID once and, when a key is present, reconciles its nonce
    /// counter with the node's pending nonce.
    pub async fn new(
        compiler: Arc<dyn SolidityCompiler>,
        chain: Arc<dyn ChainRpc>,
        wallet: Result<Wallet, KeyError>,
        settings: DeploymentSettings,
    ) -> Result<Self, SetupError> {
        let actual = chain.chain_id().await?;
        if let Some(expected) = settings.expected_chain_id {
            if expected != actual {
                return Err(ChainError::ChainMismatch { expected, actual }.into());
            }
        }
        let network = ChainId(actual);

        let sequencer = Arc::new(NonceSequencer::new());
        if let Ok(wallet) = &wallet {
            sequencer.reconcile(chain.as_ref(), wallet.address()).await?;
        }

        // interval() rejects a zero period
        let poll_interval = settings.poll_interval.max(Duration::from_millis(1));

        let builder = TxBuilder::new(chain.clone(), sequencer.clone(), network);
        let broadcaster = Broadcaster::new(
            chain.clone(),
            settings.confirmation_timeout,
            poll_interval,
            settings.native_decimals,
        );
        let estimator = CostEstimator::new(chain.clone(), settings.native_decimals);
        let poller = StatusPoller::new(chain.clone(), settings.native_decimals);
        let verifier = SourceVerifier::new(chain.clone());

        tracing::info!(
            chain_id = %network,
            sender = ?wallet.as_ref().ok().map(Wallet::address),
            "Orchestrator ready"
        );

        Ok(Self {
            compiler,
            chain,
            wallet,
            network,
            settings,
            sequencer,
            builder,
            broadcaster,
            estimator,
            poller,
            verifier,
        })
    }

    /// Chain ID resolved at startup.
    pub fn network(&self) -> ChainId {
        self.network
    }

    /// Sender address, if a signing key is loaded.
    pub fn sender(&self) -> Option<Address> {
        self.wallet.as_ref().ok().map(Wallet::address)
    }

    pub fn settings(&self) -> &DeploymentSettings {
        &self.settings
    }

    /// Next nonce the sequencer would assign to the sender, if known.
    pub async fn next_nonce(&self) -> Option<u64> {
        self.sequencer.peek(self.sender()?).await
    }

    fn wallet(&self) -> Result<&Wallet, KeyError> {
        self.wallet.as_ref().map_err(Clone::clone)
    }

    /// Compile source into its deployable contracts.
    pub async fn compile(&self, source: &str) -> Result<CompilationOutput, CompileError> {
        self.compiler.compile(source).await
    }

    /// Build and sign a deployment of `artifact`.
    pub async fn build(
        &self,
        artifact: &CompiledArtifact,
        constructor_args: Option<&str>,
        chain_id_hint: u64,
        gas_limit: u64,
    ) -> Result<PreparedDeployment, BuildError> {
        let wallet = self.wallet()?;
        self.builder
            .build(wallet, artifact, constructor_args, chain_id_hint, gas_limit)
            .await
    }

    /// Broadcast a prepared deployment and wait for its receipt.
    pub async fn deploy(&self, prepared: PreparedDeployment) -> Result<DeploymentResult, SubmitError> {
        self.broadcaster.deploy(prepared).await
    }

    /// Broadcast, stopping the receipt wait early when `cancel` resolves.
    /// Nothing is sent if `cancel` has already resolved.
    pub async fn deploy_with_cancel<C>(
        &self,
        prepared: PreparedDeployment,
        cancel: C,
    ) -> Result<DeploymentResult, SubmitError>
    where
        C: Future<Output = ()> + Send,
    {
        self.broadcaster.deploy_with_cancel(prepared, cancel).await
    }

    /// Compile, select, build and deploy in one go.
    pub async fn deploy_source(&self, request: &DeploymentRequest) -> Result<DeploymentResult, DeployError> {
        self.deploy_source_with_cancel(request, std::future::pending::<()>())
            .await
    }

    /// [`Orchestrator::deploy_source`] with a cancellable broadcast and receipt wait.
    pub async fn deploy_source_with_cancel<C>(
        &self,
        request: &DeploymentRequest,
        cancel: C,
    ) -> Result<DeploymentResult, DeployError>
    where
        C: Future<Output = ()> + Send,
    {
        let output = self.compile(&request.source_code).await?;
        let artifact = output.select(request.contract_name.as_deref())?;

        let prepared = self
            .build(
                artifact,
                request.constructor_args.as_deref(),
                request.chain_id,
                request.gas_limit,
            )
            .await?;

        Ok(self.deploy_with_cancel(prepared, cancel).await?)
    }

    /// Advisory cost of deploying the selected contract of `source`.
    pub async fn estimate(
        &self,
        source: &str,
        contract_name: Option<&str>,
        constructor_args: Option<&str>,
    ) -> Result<CostEstimate, EstimateError> {
        let output = self.compile(source).await?;
        let artifact = output.select(contract_name)?;
        let from = self.wallet()?.address();

        self.estimator.estimate(from, artifact, constructor_args).await
    }

    /// Current state of a transaction.
    pub async fn status(&self, tx_hash: TxHash) -> Result<TransactionStatus, StatusError> {
        self.poller.status(tx_hash).await
    }

    /// Sender, nonce and inclusion of a transaction the node knows about.
    pub async fn transaction(&self, tx_hash: TxHash) -> Result<Option<TransactionInfo>, StatusError> {
        self.poller.transaction(tx_hash).await
    }

    /// [`Orchestrator::status`] for a hex hash string.
    pub async fn status_of(&self, tx_hash: &str) -> Result<TransactionStatus, StatusError> {
        self.poller.status_of(tx_hash).await
    }

    /// Recompile `source` and compare it with the code at `address`.
    pub async fn verify(
        &self,
        address: Address,
        source: &str,
        constructor_args: Option<&str>,
    ) -> Result<VerificationReport, VerifyError> {
        let output = self.compile(source).await?;
        self.verifier.verify(address, &output, constructor_args).await
    }

    /// Execute a read-only call of `method` on the contract at `address`.
    pub async fn call(
        &self,
        address: Address,
        abi_json: &str,
        method: &str,
        args_json: Option<&str>,
    ) -> Result<Bytes, CallError> {
        let abi = encoding::parse_abi(abi_json)?;
        let data = encoding::encode_function_call(&abi, method, args_json)?;

        tracing::debug!(address = %address, method = method, "Executing read-only call");
        Ok(self.chain.call(address, data).await?)
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("network", &self.network)
            .field("sender", &self.sender())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

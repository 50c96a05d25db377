use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use contract_deployer::compiler::{SolcCompiler, SolidityCompiler};
use contract_deployer::config::{load_config, load_from_env, DeployerConfig};
use contract_deployer::contracts::record::CONTRACT_NAME_KEY;
use contract_deployer::contracts::{
    ContractQuery, ContractRecord, ContractService, ContractStore, DeployContractRequest,
    MemoryContractStore, NewContract,
};
use contract_deployer::deploy::{parse_address, DeploymentRequest};
use contract_deployer::lifecycle::signals::listen_for_shutdown;
use contract_deployer::observability::logging::init_logging;
use contract_deployer::{Orchestrator, Shutdown};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "contract-deployer", version)]
#[command(about = "Compile, deploy and track Solidity contracts", long_about = None)]
struct Cli {
    /// TOML configuration file (defaults + environment when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a Solidity file and print its artifacts
    Compile { source: PathBuf },
    /// Estimate the cost of deploying a contract
    Estimate {
        source: PathBuf,
        /// Contract name (substring) for multi-contract sources
        #[arg(long)]
        contract: Option<String>,
        /// Constructor arguments as a JSON array
        #[arg(long)]
        args: Option<String>,
    },
    /// Deploy a contract and wait for its receipt
    Deploy {
        source: PathBuf,
        #[arg(long)]
        contract: Option<String>,
        #[arg(long)]
        args: Option<String>,
        /// Defaults to deployment.default_gas_limit
        #[arg(long)]
        gas_limit: Option<u64>,
        /// 0 signs for the connected network
        #[arg(long, default_value_t = 0)]
        chain_id: u64,
    },
    /// Look up a transaction by hash
    Status { tx_hash: String },
    /// Compare deployed bytecode with a source file
    Verify {
        address: String,
        source: PathBuf,
        #[arg(long)]
        args: Option<String>,
    },
    /// Execute a read-only contract call
    Call {
        address: String,
        method: String,
        /// ABI JSON file
        #[arg(long)]
        abi: PathBuf,
        #[arg(long)]
        args: Option<String>,
    },
    /// Manage stored contract records
    #[command(subcommand)]
    Contract(ContractCommands),
}

#[derive(Subcommand)]
enum ContractCommands {
    /// Store a new contract
    Create {
        source: PathBuf,
        #[arg(long)]
        owner: String,
        /// Contract to deploy from a multi-contract source
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        public: bool,
    },
    /// List stored contracts
    List {
        #[arg(long)]
        owner: Option<String>,
        #[arg(long)]
        public: Option<bool>,
        #[arg(long, default_value_t = 0)]
        skip: usize,
        #[arg(long, default_value_t = 0)]
        limit: usize,
    },
    /// Show one contract
    Get { id: String },
    /// Deploy a stored contract as its owner
    Deploy {
        id: String,
        #[arg(long)]
        deployer: String,
        #[arg(long)]
        args: Option<String>,
        #[arg(long, default_value_t = 0)]
        gas_limit: u64,
        #[arg(long, default_value_t = 0)]
        chain_id: u64,
    },
    /// Re-poll a pending deployment
    Refresh { id: String },
    /// Verify a deployed contract against its stored source
    Verify {
        id: String,
        #[arg(long)]
        args: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let _ = dotenvy::dotenv();

    let config = match &cli.config {
        Some(path) => load_config(path),
        None => load_from_env(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_logging(&config.observability.log_level);
    tracing::debug!(rpc_url = %config.chain.rpc_url, "Configuration loaded");

    match run(cli.command, &config).await {
        Ok(output) => match serde_json::to_string_pretty(&output) {
            Ok(text) => {
                println!("{}", text);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, config: &DeployerConfig) -> CliResult<Value> {
    match command {
        Commands::Compile { source } => {
            let compiler = SolcCompiler::new(config.compiler.clone());
            let output = compiler.compile(&read_source(&source)?).await?;
            Ok(serde_json::to_value(output)?)
        }
        Commands::Estimate {
            source,
            contract,
            args,
        } => {
            let orchestrator = Orchestrator::connect(config).await?;
            let estimate = orchestrator
                .estimate(&read_source(&source)?, contract.as_deref(), args.as_deref())
                .await?;
            Ok(json!({
                "estimate": estimate,
                "native": format!(
                    "{} {}",
                    estimate.cost.format_native(config.chain.native_decimals),
                    config.chain.native_symbol
                ),
            }))
        }
        Commands::Deploy {
            source,
            contract,
            args,
            gas_limit,
            chain_id,
        } => {
            let orchestrator = Orchestrator::connect(config).await?;
            let request = DeploymentRequest {
                source_code: read_source(&source)?,
                constructor_args: args,
                chain_id,
                gas_limit: gas_limit.unwrap_or(config.deployment.default_gas_limit),
                contract_name: contract,
            };

            let shutdown = Shutdown::new();
            let cancel = shutdown.notified();
            let listener = tokio::spawn(listen_for_shutdown(shutdown));

            let result = orchestrator.deploy_source_with_cancel(&request, cancel).await;
            listener.abort();
            let result = result?;

            if result.is_pending() {
                tracing::warn!(
                    tx_hash = %result.tx_hash,
                    "Submitted but not yet mined; check again with `status`"
                );
            }
            Ok(serde_json::to_value(result)?)
        }
        Commands::Status { tx_hash } => {
            let orchestrator = Orchestrator::connect(config).await?;
            let status = orchestrator.status_of(&tx_hash).await?;
            Ok(serde_json::to_value(status)?)
        }
        Commands::Verify {
            address,
            source,
            args,
        } => {
            let orchestrator = Orchestrator::connect(config).await?;
            let report = orchestrator
                .verify(parse_address(&address)?, &read_source(&source)?, args.as_deref())
                .await?;
            Ok(serde_json::to_value(report)?)
        }
        Commands::Call {
            address,
            method,
            abi,
            args,
        } => {
            let orchestrator = Orchestrator::connect(config).await?;
            let abi_json = std::fs::read_to_string(&abi)?;
            let output = orchestrator
                .call(parse_address(&address)?, &abi_json, &method, args.as_deref())
                .await?;
            Ok(json!({ "result": output }))
        }
        Commands::Contract(command) => run_contract(command, config).await,
    }
}

async fn run_contract(command: ContractCommands, config: &DeployerConfig) -> CliResult<Value> {
    let store = Arc::new(match &config.store.persistence_path {
        Some(path) => MemoryContractStore::load_from_file(path)?,
        None => MemoryContractStore::new(None),
    });

    match command {
        ContractCommands::Create {
            source,
            owner,
            name,
            public,
        } => {
            let mut metadata = serde_json::Map::new();
            if let Some(name) = name {
                metadata.insert(CONTRACT_NAME_KEY.to_string(), Value::String(name));
            }
            let draft = NewContract {
                owner_id: owner,
                source_code: read_source(&source)?,
                metadata,
                is_public: public,
            };
            draft.validate()?;
            let record = ContractRecord::new(draft);
            store.insert(record.clone()).await?;
            Ok(serde_json::to_value(record)?)
        }
        ContractCommands::List {
            owner,
            public,
            skip,
            limit,
        } => {
            let page = store
                .list(&ContractQuery {
                    owner_id: owner,
                    is_public: public,
                    skip,
                    limit,
                })
                .await?;
            Ok(serde_json::to_value(page)?)
        }
        ContractCommands::Get { id } => Ok(serde_json::to_value(store.get(&id).await?)?),
        ContractCommands::Deploy {
            id,
            deployer,
            args,
            gas_limit,
            chain_id,
        } => {
            let service = connect_service(store, config).await?;
            let result = service
                .deploy_contract(&DeployContractRequest {
                    contract_id: id,
                    deployer_id: deployer,
                    chain_id,
                    gas_limit,
                    constructor_args: args,
                })
                .await?;
            Ok(serde_json::to_value(result)?)
        }
        ContractCommands::Refresh { id } => {
            let service = connect_service(store, config).await?;
            Ok(serde_json::to_value(service.refresh_deployment(&id).await?)?)
        }
        ContractCommands::Verify { id, args } => {
            let service = connect_service(store, config).await?;
            Ok(serde_json::to_value(
                service.verify_contract(&id, args.as_deref()).await?,
            )?)
        }
    }
}

async fn connect_service(
    store: Arc<MemoryContractStore>,
    config: &DeployerConfig,
) -> CliResult<ContractService> {
    let orchestrator = Arc::new(Orchestrator::connect(config).await?);
    Ok(ContractService::new(
        store,
        orchestrator,
        config.deployment.default_gas_limit,
    ))
}

fn read_source(path: &Path) -> CliResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e).into())
}

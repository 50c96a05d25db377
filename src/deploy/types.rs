//! Deployment data model.

use alloy::primitives::{Address, Bytes, TxHash};
use serde::{Deserialize, Serialize};

use crate::chain::ChainId;
use crate::signer::NonceLease;

/// A request to compile and deploy one contract.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRequest {
    /// Solidity source text.
    pub source_code: String,
    /// Constructor arguments as a JSON array, e.g. `["Hello", 42]`.
    #[serde(default)]
    pub constructor_args: Option<String>,
    /// Target chain ID; 0 means the connector's network.
    #[serde(default)]
    pub chain_id: u64,
    /// Gas limit for the creation transaction.
    pub gas_limit: u64,
    /// Contract name (substring) to pick when the source defines several.
    #[serde(default)]
    pub contract_name: Option<String>,
}

/// A signed contract-creation transaction bound to one nonce and one chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignedTransaction {
    /// EIP-2718 encoded bytes, ready for `eth_sendRawTransaction`.
    pub raw: Bytes,
    /// Locally computed transaction hash.
    pub hash: TxHash,
    pub nonce: u64,
    pub chain_id: u64,
    pub sender: Address,
    /// Gas price bid, in wei.
    pub gas_price: u128,
    pub gas_limit: u64,
}

/// A signed transaction together with the nonce lease it was built under.
///
/// The key's nonce stays locked until this is handed to the broadcaster or dropped.
#[derive(Debug)]
pub struct PreparedDeployment {
    pub(crate) contract_name: String,
    pub(crate) transaction: SignedTransaction,
    pub(crate) lease: NonceLease,
}

impl PreparedDeployment {
    pub fn contract_name(&self) -> &str {
        &self.contract_name
    }

    pub fn transaction(&self) -> &SignedTransaction {
        &self.transaction
    }
}

/// A fee expressed in wei and in the chain's native unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cost {
    pub wei: u128,
    pub native: f64,
}

impl Cost {
    /// `gas × gas_price`, saturating, scaled by `10^decimals` for the native figure.
    pub fn from_gas(gas: u64, gas_price: u128, decimals: u8) -> Self {
        let wei = u128::from(gas).saturating_mul(gas_price);
        Self {
            wei,
            native: wei as f64 / 10f64.powi(i32::from(decimals)),
        }
    }

    /// Exact decimal rendering of the native amount.
    pub fn format_native(&self, decimals: u8) -> String {
        format_units(self.wei, decimals)
    }
}

/// Render `amount / 10^decimals` exactly, without trailing zeros.
pub fn format_units(amount: u128, decimals: u8) -> String {
    let digits = amount.to_string();
    let decimals = usize::from(decimals);
    if decimals == 0 {
        return digits;
    }

    let (whole, fraction) = if digits.len() > decimals {
        let (w, f) = digits.split_at(digits.len() - decimals);
        (w.to_string(), f.to_string())
    } else {
        ("0".to_string(), format!("{:0>width$}", digits, width = decimals))
    };

    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        whole
    } else {
        format!("{}.{}", whole, fraction)
    }
}

/// Outcome of a mined deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentReceipt {
    pub contract_address: Option<Address>,
    pub block_number: u64,
    pub gas_used: u64,
    /// Effective gas price paid, in wei.
    pub gas_price: u128,
    pub cost: Cost,
    /// `false` when the creation reverted.
    pub success: bool,
}

/// Result of a broadcast.
///
/// `receipt` is `None` when the confirmation wait ended first; the transaction may
/// still be mined and must be followed up with a status lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentResult {
    pub tx_hash: TxHash,
    pub contract_name: String,
    pub nonce: u64,
    pub chain_id: ChainId,
    /// Gas price bid, in wei.
    pub gas_price: u128,
    pub receipt: Option<DeploymentReceipt>,
}

impl DeploymentResult {
    /// The receipt arrived.
    pub fn is_confirmed(&self) -> bool {
        self.receipt.is_some()
    }

    /// Only the hash is known.
    pub fn is_pending(&self) -> bool {
        self.receipt.is_none()
    }

    pub fn contract_address(&self) -> Option<Address> {
        self.receipt.as_ref().and_then(|r| r.contract_address)
    }
}

/// Current state of a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TransactionStatus {
    /// No receipt yet.
    Pending,
    /// Mined with receipt status 1.
    Success(MinedTransaction),
    /// Mined with receipt status 0.
    Failed(MinedTransaction),
}

impl TransactionStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, TransactionStatus::Pending)
    }

    pub fn mined(&self) -> Option<&MinedTransaction> {
        match self {
            TransactionStatus::Pending => None,
            TransactionStatus::Success(m) | TransactionStatus::Failed(m) => Some(m),
        }
    }

    /// Blocks mined on top of the inclusion block; 0 while pending.
    pub fn confirmations(&self) -> u64 {
        self.mined().map_or(0, |m| m.confirmations)
    }

    pub fn label(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Success(_) => "success",
            TransactionStatus::Failed(_) => "failed",
        }
    }
}

/// Receipt details of a mined transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinedTransaction {
    pub block_number: u64,
    pub confirmations: u64,
    pub gas_used: u64,
    pub gas_price: u128,
    pub cost: Cost,
    pub contract_address: Option<Address>,
}

/// Advisory deployment cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    pub contract_name: String,
    pub gas_estimate: u64,
    pub gas_price: u128,
    pub cost: Cost,
}

/// How a verification match was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// On-chain code equals the compiled runtime bytecode.
    Exact,
    /// On-chain code starts with the compiled bytecode.
    Prefix,
    /// Equal once the trailing compiler metadata is removed from both.
    MetadataStripped,
    /// No match.
    None,
}

/// Outcome of a source verification. A mismatch is a result, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub verified: bool,
    pub contract_name: Option<String>,
    pub confidence: Confidence,
    /// ABI-encoded constructor arguments, when supplied and a match was found.
    pub encoded_constructor_args: Option<Bytes>,
}

impl VerificationReport {
    pub fn unverified() -> Self {
        Self {
            verified: false,
            contract_name: None,
            confidence: Confidence::None,
            encoded_constructor_args: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_from_gas() {
        let cost = Cost::from_gas(21_000, 20_000_000_000, 18);
        assert_eq!(cost.wei, 420_000_000_000_000);
        assert!((cost.native - 0.00042).abs() < 1e-12);
        assert_eq!(cost.format_native(18), "0.00042");
    }

    #[test]
    fn test_cost_saturates() {
        let cost = Cost::from_gas(u64::MAX, u128::MAX, 18);
        assert_eq!(cost.wei, u128::MAX);
    }

    #[test]
    fn test_format_units() {
        assert_eq!(format_units(0, 18), "0");
        assert_eq!(format_units(1, 18), "0.000000000000000001");
        assert_eq!(format_units(1_500_000_000_000_000_000, 18), "1.5");
        assert_eq!(format_units(2_000_000, 6), "2");
        assert_eq!(format_units(123, 0), "123");
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_value(TransactionStatus::Pending).unwrap();
        assert_eq!(json, serde_json::json!({"status": "pending"}));

        let mined = MinedTransaction {
            block_number: 10,
            confirmations: 2,
            gas_used: 100,
            gas_price: 5,
            cost: Cost::from_gas(100, 5, 18),
            contract_address: None,
        };
        let status = TransactionStatus::Failed(mined);
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["block_number"], 10);
        assert_eq!(status.confirmations(), 2);
        assert_eq!(TransactionStatus::Pending.confirmations(), 0);
    }

    #[test]
    fn test_hash_only_result() {
        let result = DeploymentResult {
            tx_hash: TxHash::repeat_byte(1),
            contract_name: "Token".into(),
            nonce: 0,
            chain_id: ChainId(31337),
            gas_price: 1,
            receipt: None,
        };
        assert!(result.is_pending());
        assert!(!result.is_confirmed());
        assert_eq!(result.contract_address(), None);
    }
}

//! ABI encoding of constructor and call arguments given as JSON.
//!
//! Arguments are a JSON array, one element per parameter. Strings are parsed as
//! Solidity literals for the parameter's type (`"0x…"` addresses, `"1000"` integers,
//! `"0xdeadbeef"` bytes), numbers and booleans through their textual form, and nested
//! arrays map onto array and tuple parameters. Integers above 2^53 should be passed as
//! strings.

use alloy::dyn_abi::{DynSolType, DynSolValue, JsonAbiExt, Specifier};
use alloy::json_abi::{JsonAbi, Param};
use alloy::primitives::Bytes;
use serde_json::Value;

use crate::compiler::CompiledArtifact;
use crate::deploy::error::EncodingError;

/// Parse an argument list. Absent, blank and `null` mean "no arguments".
pub fn parse_args(json: Option<&str>) -> Result<Vec<Value>, EncodingError> {
    let Some(text) = json.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(Vec::new());
    };

    match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(items)) => Ok(items),
        Ok(Value::Null) => Ok(Vec::new()),
        Ok(other) => Err(EncodingError::InvalidJson(format!(
            "expected an array, got {}",
            other
        ))),
        Err(e) => Err(EncodingError::InvalidJson(e.to_string())),
    }
}

/// Encode constructor arguments (no selector) against `abi`.
pub fn encode_constructor(abi: &JsonAbi, args: &[Value]) -> Result<Bytes, EncodingError> {
    let Some(constructor) = abi.constructor() else {
        if args.is_empty() {
            return Ok(Bytes::new());
        }
        return Err(EncodingError::NoConstructor(args.len()));
    };

    let values = coerce_params(&constructor.inputs, args)?;
    constructor
        .abi_encode_input(&values)
        .map(Bytes::from)
        .map_err(|e| EncodingError::Abi(e.to_string()))
}

/// Creation bytecode followed by the encoded constructor arguments.
///
/// Without arguments the bytecode is returned unchanged.
pub fn deployment_payload(
    artifact: &CompiledArtifact,
    constructor_args: Option<&str>,
) -> Result<Bytes, EncodingError> {
    let args = parse_args(constructor_args)?;
    if args.is_empty() {
        if artifact
            .abi
            .constructor()
            .is_some_and(|c| !c.inputs.is_empty())
        {
            tracing::warn!(
                contract = %artifact.name,
                "Constructor takes parameters but no arguments were given"
            );
        }
        return Ok(artifact.bytecode.clone());
    }

    let encoded = encode_constructor(&artifact.abi, &args)?;
    let mut payload = Vec::with_capacity(artifact.bytecode.len() + encoded.len());
    payload.extend_from_slice(&artifact.bytecode);
    payload.extend_from_slice(&encoded);
    Ok(Bytes::from(payload))
}

/// Selector plus encoded arguments for `method`, choosing the overload by arity.
pub fn encode_function_call(
    abi: &JsonAbi,
    method: &str,
    args_json: Option<&str>,
) -> Result<Bytes, EncodingError> {
    let args = parse_args(args_json)?;

    let function = abi
        .function(method)
        .and_then(|overloads| overloads.iter().find(|f| f.inputs.len() == args.len()))
        .ok_or_else(|| EncodingError::FunctionNotFound {
            name: method.to_string(),
            arity: args.len(),
        })?;

    let values = coerce_params(&function.inputs, &args)?;
    function
        .abi_encode_input(&values)
        .map(Bytes::from)
        .map_err(|e| EncodingError::Abi(e.to_string()))
}

/// Parse an ABI given as JSON text.
pub fn parse_abi(abi_json: &str) -> Result<JsonAbi, EncodingError> {
    serde_json::from_str(abi_json).map_err(|e| EncodingError::InvalidAbi(e.to_string()))
}

fn coerce_params(params: &[Param], args: &[Value]) -> Result<Vec<DynSolValue>, EncodingError> {
    if params.len() != args.len() {
        return Err(EncodingError::ArityMismatch {
            expected: params.len(),
            actual: args.len(),
        });
    }

    params
        .iter()
        .zip(args)
        .enumerate()
        .map(|(index, (param, arg))| {
            let ty: DynSolType = param
                .resolve()
                .map_err(|e| EncodingError::UnsupportedType {
                    ty: param.ty.clone(),
                    reason: e.to_string(),
                })?;
            coerce(&ty, arg).map_err(|reason| EncodingError::InvalidArgument {
                index,
                ty: param.ty.clone(),
                reason,
            })
        })
        .collect()
}

fn coerce(ty: &DynSolType, value: &Value) -> Result<DynSolValue, String> {
    match (ty, value) {
        (DynSolType::Array(inner), Value::Array(items)) => items
            .iter()
            .map(|item| coerce(inner, item))
            .collect::<Result<Vec<_>, _>>()
            .map(DynSolValue::Array),
        (DynSolType::FixedArray(inner, len), Value::Array(items)) => {
            if items.len() != *len {
                return Err(format!("expected {} elements, got {}", len, items.len()));
            }
            items
                .iter()
                .map(|item| coerce(inner, item))
                .collect::<Result<Vec<_>, _>>()
                .map(DynSolValue::FixedArray)
        }
        (DynSolType::Tuple(types), Value::Array(items)) => {
            if items.len() != types.len() {
                return Err(format!(
                    "expected {} tuple fields, got {}",
                    types.len(),
                    items.len()
                ));
            }
            types
                .iter()
                .zip(items)
                .map(|(t, item)| coerce(t, item))
                .collect::<Result<Vec<_>, _>>()
                .map(DynSolValue::Tuple)
        }
        (_, Value::String(text)) => ty.coerce_str(text).map_err(|e| e.to_string()),
        (_, Value::Number(n)) => ty.coerce_str(&n.to_string()).map_err(|e| e.to_string()),
        (_, Value::Bool(b)) => ty.coerce_str(&b.to_string()).map_err(|e| e.to_string()),
        (_, other) => Err(format!("cannot convert {} to {}", other, ty)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{hex, Address, U256};

    fn abi(json: &str) -> JsonAbi {
        serde_json::from_str(json).unwrap()
    }

    const CTOR_ABI: &str = r#"[{"type":"constructor","stateMutability":"nonpayable","inputs":[
        {"name":"owner","type":"address"},
        {"name":"supply","type":"uint256"},
        {"name":"name","type":"string"}
    ]}]"#;

    fn artifact_with(abi_json: &str) -> CompiledArtifact {
        CompiledArtifact {
            name: "Token".into(),
            abi: abi(abi_json),
            bytecode: Bytes::from_static(&[0x60, 0x80]),
            runtime_bytecode: Bytes::new(),
        }
    }

    #[test]
    fn test_parse_args_variants() {
        assert!(parse_args(None).unwrap().is_empty());
        assert!(parse_args(Some("  ")).unwrap().is_empty());
        assert!(parse_args(Some("null")).unwrap().is_empty());
        assert_eq!(parse_args(Some(r#"[1, "a"]"#)).unwrap().len(), 2);
        assert!(matches!(
            parse_args(Some(r#"{"a":1}"#)),
            Err(EncodingError::InvalidJson(_))
        ));
        assert!(matches!(
            parse_args(Some("[1,")),
            Err(EncodingError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_payload_without_args_is_bytecode() {
        let artifact = artifact_with(CTOR_ABI);
        assert_eq!(deployment_payload(&artifact, None).unwrap(), artifact.bytecode);
        assert_eq!(deployment_payload(&artifact, Some("[]")).unwrap(), artifact.bytecode);
    }

    #[test]
    fn test_constructor_args_appended() {
        let artifact = artifact_with(CTOR_ABI);
        let owner = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";
        let args = format!(r#"["{}", 1000, "Token"]"#, owner);

        let payload = deployment_payload(&artifact, Some(&args)).unwrap();
        assert_eq!(&payload[..2], &[0x60, 0x80]);

        let expected = DynSolValue::Tuple(vec![
            DynSolValue::Address(owner.parse::<Address>().unwrap()),
            DynSolValue::Uint(U256::from(1000u64), 256),
            DynSolValue::String("Token".into()),
        ])
        .abi_encode_params();
        assert_eq!(&payload[2..], expected.as_slice());
    }

    #[test]
    fn test_constructor_arity_and_type_errors() {
        let parsed = abi(CTOR_ABI);

        let err = encode_constructor(&parsed, &parse_args(Some("[1]")).unwrap()).unwrap_err();
        assert!(matches!(err, EncodingError::ArityMismatch { expected: 3, actual: 1 }));

        let err = encode_constructor(
            &parsed,
            &parse_args(Some(r#"["not-an-address", 1, "x"]"#)).unwrap(),
        )
        .unwrap_err();
        assert!(matches!(err, EncodingError::InvalidArgument { index: 0, .. }));
    }

    #[test]
    fn test_args_without_constructor() {
        let parsed = abi("[]");
        assert!(encode_constructor(&parsed, &[]).unwrap().is_empty());
        assert!(matches!(
            encode_constructor(&parsed, &parse_args(Some("[1]")).unwrap()),
            Err(EncodingError::NoConstructor(1))
        ));
    }

    #[test]
    fn test_array_and_tuple_arguments() {
        let parsed = abi(
            r#"[{"type":"constructor","stateMutability":"nonpayable","inputs":[
                {"name":"ids","type":"uint8[]"},
                {"name":"pair","type":"bool[2]"},
                {"name":"cfg","type":"tuple","components":[
                    {"name":"limit","type":"uint64"},
                    {"name":"tag","type":"bytes4"}
                ]}
            ]}]"#,
        );
        let args = parse_args(Some(r#"[[1, 2, 3], [true, false], ["7", "0xdeadbeef"]]"#)).unwrap();
        let encoded = encode_constructor(&parsed, &args).unwrap();
        assert!(!encoded.is_empty());

        let args = parse_args(Some(r#"[[1], [true], ["7", "0xdeadbeef"]]"#)).unwrap();
        assert!(matches!(
            encode_constructor(&parsed, &args),
            Err(EncodingError::InvalidArgument { index: 1, .. })
        ));
    }

    #[test]
    fn test_function_call_encoding() {
        let parsed = abi(
            r#"[
                {"type":"function","name":"balanceOf","stateMutability":"view",
                 "inputs":[{"name":"a","type":"address"}],"outputs":[{"name":"","type":"uint256"}]},
                {"type":"function","name":"totalSupply","stateMutability":"view",
                 "inputs":[],"outputs":[{"name":"","type":"uint256"}]}
            ]"#,
        );

        let data = encode_function_call(&parsed, "totalSupply", None).unwrap();
        assert_eq!(&data[..], hex!("18160ddd"));

        let data = encode_function_call(
            &parsed,
            "balanceOf",
            Some(r#"["0x0000000000000000000000000000000000000001"]"#),
        )
        .unwrap();
        assert_eq!(&data[..4], hex!("70a08231"));
        assert_eq!(data.len(), 36);

        assert!(matches!(
            encode_function_call(&parsed, "balanceOf", None),
            Err(EncodingError::FunctionNotFound { arity: 0, .. })
        ));
        assert!(matches!(
            encode_function_call(&parsed, "mint", None),
            Err(EncodingError::FunctionNotFound { .. })
        ));
    }

    #[test]
    fn test_parse_abi_rejects_garbage() {
        assert!(matches!(parse_abi("{"), Err(EncodingError::InvalidAbi(_))));
    }
}

//! Calldata construction for constructors, initializers and the diamond cut

use alloy::{
    dyn_abi::{DynSolValue, Specifier},
    json_abi::{Function, Param},
    primitives::{Address, Bytes},
};
use alloy_sol_types::{SolCall, SolValue};
use diamond_abi::IDiamondCut;

use crate::{errors::ScriptError, selectors::selector, types::FacetCut};

/// Encode a call to the function with the given signature.
///
/// Arguments are given as strings and coerced to the signature's parameter
/// types, e.g. `"0x…"` for an `address` or `"5"` for a `uint256`.
pub fn encode_call(signature: &str, args: &[String]) -> Result<Bytes, ScriptError> {
    let function = Function::parse(signature).map_err(|e| ScriptError::MalformedSignature {
        signature: signature.to_string(),
        reason: e.to_string(),
    })?;
    let selector = selector(signature)?;
    let params = encode_params(&function.inputs, args)?;

    Ok([selector.as_slice(), params.as_slice()].concat().into())
}

/// ABI-encode constructor arguments against the constructor's parameters
pub fn encode_constructor_args(params: &[Param], args: &[String]) -> Result<Bytes, ScriptError> {
    encode_params(params, args).map(Bytes::from)
}

/// Encode the constructor arguments of the diamond proxy
pub fn encode_proxy_constructor(owner: Address, cut_facet: Address) -> Bytes {
    (owner, cut_facet).abi_encode_params().into()
}

/// Coerce string arguments to the given parameter types and encode them
fn encode_params(params: &[Param], args: &[String]) -> Result<Vec<u8>, ScriptError> {
    if params.len() != args.len() {
        return Err(ScriptError::CalldataConstruction(format!(
            "expected {} arguments, got {}",
            params.len(),
            args.len()
        )));
    }

    let values = params
        .iter()
        .zip(args)
        .map(|(param, arg)| {
            let ty = param
                .resolve()
                .map_err(|e| ScriptError::CalldataConstruction(e.to_string()))?;
            ty.coerce_str(arg)
                .map_err(|e| ScriptError::CalldataConstruction(format!("argument `{arg}`: {e}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DynSolValue::Tuple(values).abi_encode_params())
}

/// A diamond cut transaction: the cut list plus an optional initializer call
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpgradeTransaction {
    /// The cut records, applied atomically
    pub cuts: Vec<FacetCut>,
    /// The initializer to delegate-call, zero for none
    pub init: Address,
    /// The calldata for the initializer, empty for none
    pub init_calldata: Bytes,
}

impl UpgradeTransaction {
    /// A cut without an initializer
    pub fn new(cuts: Vec<FacetCut>) -> Self {
        Self {
            cuts,
            init: Address::ZERO,
            init_calldata: Bytes::new(),
        }
    }

    /// Attach an initializer call to the cut
    pub fn with_initializer(mut self, init: Address, init_calldata: Bytes) -> Self {
        self.init = init;
        self.init_calldata = init_calldata;
        self
    }

    /// Whether the cut carries an initializer call
    pub fn has_initializer(&self) -> bool {
        !self.init.is_zero()
    }

    /// The calldata of the `diamondCut` call
    pub fn calldata(&self) -> Bytes {
        IDiamondCut::diamondCutCall {
            _diamondCut: self.cuts.iter().map(Into::into).collect(),
            _init: self.init,
            _calldata: self.init_calldata.clone(),
        }
        .abi_encode()
        .into()
    }
}

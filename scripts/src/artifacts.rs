//! Reading compiled contracts from Hardhat or Foundry artifact files

use std::{
    fs,
    path::{Path, PathBuf},
};

use alloy::{
    hex,
    json_abi::{Constructor, Function, Param},
    primitives::Bytes,
};
use serde_json::Value;

use crate::{
    client::ContractArtifacts,
    constants::{
        ARTIFACT_ABI_KEY, ARTIFACT_BYTECODE_KEY, ARTIFACT_BYTECODE_OBJECT_KEY, ARTIFACT_EXTENSION,
    },
    errors::ScriptError,
};

/// The ABI `type` of function entries
const FUNCTION_ENTRY: &str = "function";
/// The ABI `type` of the constructor entry
const CONSTRUCTOR_ENTRY: &str = "constructor";

/// A directory of compilation artifacts, one JSON file per contract.
///
/// Artifacts are looked up at `<dir>/<Contract>.json`, falling back to the
/// Foundry layout `<dir>/<Contract>.sol/<Contract>.json`.
#[derive(Clone, Debug)]
pub struct ArtifactStore {
    /// The artifacts directory
    dir: PathBuf,
}

impl ArtifactStore {
    /// Create a store reading from the given directory
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory artifacts are read from
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The creation bytecode of the contract
    pub fn bytecode(&self, contract: &str) -> Result<Bytes, ScriptError> {
        let artifact = self.read_artifact(contract)?;
        let bytecode = match artifact.get(ARTIFACT_BYTECODE_KEY) {
            Some(Value::String(code)) => code.as_str(),
            Some(Value::Object(obj)) => obj
                .get(ARTIFACT_BYTECODE_OBJECT_KEY)
                .and_then(Value::as_str)
                .ok_or_else(|| missing_key(contract, ARTIFACT_BYTECODE_OBJECT_KEY))?,
            _ => return Err(missing_key(contract, ARTIFACT_BYTECODE_KEY)),
        };

        let code = hex::decode(bytecode).map_err(|e| {
            ScriptError::ArtifactParsing(format!("invalid bytecode for {contract}: {e}"))
        })?;
        if code.is_empty() {
            return Err(ScriptError::ArtifactParsing(format!(
                "{contract} has no bytecode, is it abstract?"
            )));
        }

        Ok(code.into())
    }

    /// The path of the contract's artifact file, if one exists
    fn artifact_path(&self, contract: &str) -> Result<PathBuf, ScriptError> {
        let flat = self.dir.join(contract).with_extension(ARTIFACT_EXTENSION);
        if flat.is_file() {
            return Ok(flat);
        }

        let nested = self
            .dir
            .join(format!("{contract}.sol"))
            .join(contract)
            .with_extension(ARTIFACT_EXTENSION);
        if nested.is_file() {
            return Ok(nested);
        }

        Err(ScriptError::ArtifactParsing(format!(
            "no artifact for {contract} in {}",
            self.dir.display()
        )))
    }

    /// Read and parse the contract's artifact file
    fn read_artifact(&self, contract: &str) -> Result<Value, ScriptError> {
        let path = self.artifact_path(contract)?;
        let contents = fs::read_to_string(&path)
            .map_err(|e| ScriptError::ArtifactParsing(format!("{}: {e}", path.display())))?;

        serde_json::from_str(&contents)
            .map_err(|e| ScriptError::ArtifactParsing(format!("{}: {e}", path.display())))
    }

    /// The ABI entries of the contract with the given `type`
    fn abi_entries(&self, contract: &str, entry_type: &str) -> Result<Vec<Value>, ScriptError> {
        let artifact = self.read_artifact(contract)?;
        let abi = artifact
            .get(ARTIFACT_ABI_KEY)
            .and_then(Value::as_array)
            .ok_or_else(|| missing_key(contract, ARTIFACT_ABI_KEY))?;

        Ok(abi
            .iter()
            .filter(|entry| entry.get("type").and_then(Value::as_str) == Some(entry_type))
            .cloned()
            .collect())
    }
}

impl ContractArtifacts for ArtifactStore {
    fn exposed_signatures(&self, contract: &str) -> Result<Vec<String>, ScriptError> {
        self.abi_entries(contract, FUNCTION_ENTRY)?
            .into_iter()
            .map(|entry| {
                serde_json::from_value::<Function>(entry)
                    .map(|function| function.signature())
                    .map_err(|e| ScriptError::ArtifactParsing(format!("{contract}: {e}")))
            })
            .collect()
    }

    fn constructor_params(&self, contract: &str) -> Result<Vec<Param>, ScriptError> {
        let Some(entry) = self.abi_entries(contract, CONSTRUCTOR_ENTRY)?.into_iter().next() else {
            return Ok(Vec::new());
        };

        let constructor: Constructor = serde_json::from_value(entry)
            .map_err(|e| ScriptError::ArtifactParsing(format!("{contract}: {e}")))?;
        Ok(constructor.inputs)
    }
}

/// The error for an artifact missing a required key
fn missing_key(contract: &str, key: &str) -> ScriptError {
    ScriptError::ArtifactParsing(format!("artifact for {contract} has no `{key}`"))
}

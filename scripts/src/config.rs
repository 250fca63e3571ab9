//! Deployment and upgrade plans, read from JSON files
//!
//! Every field of a [`DiamondPlan`] may be omitted, in which case the plan
//! describes the reference deployment: a `Diamond` proxy cut by
//! `DiamondCutFacet`, initialized by `DiamondInit`, with the loupe, ownership
//! and inventory facets installed.

use std::{fs, path::Path};

use alloy::primitives::Address;
use serde::{de::DeserializeOwned, Deserialize};

use crate::{
    constants::{
        DEFAULT_CUT_FACET, DEFAULT_INITIALIZER, DEFAULT_INIT_SIGNATURE, DEFAULT_PROXY,
        SUPPORTS_INTERFACE_SIGNATURE,
    },
    cut::{FacetCutPlan, SelectorOverrides},
    errors::ScriptError,
    types::{CutAction, FacetDescriptor},
};

/// A contract deployed alongside the diamond but not cut into it
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct AuxiliaryContract {
    /// The key the contract is recorded under, defaults to the contract name
    #[serde(default)]
    pub label: Option<String>,
    /// The contract name
    pub contract: String,
    /// The constructor arguments
    #[serde(default)]
    pub args: Vec<String>,
}

impl AuxiliaryContract {
    /// An auxiliary contract with the given constructor arguments
    pub fn new(contract: &str, args: &[&str]) -> Self {
        Self {
            label: None,
            contract: contract.to_string(),
            args: args.iter().map(ToString::to_string).collect(),
        }
    }

    /// The key the contract is recorded under
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.contract)
    }
}

/// The contract delegate-called by the cut transaction
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct InitializerPlan {
    /// The contract name
    pub contract: String,
    /// The entry point
    #[serde(default = "default_init_signature")]
    pub signature: String,
    /// The entry point's arguments
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for InitializerPlan {
    fn default() -> Self {
        Self {
            contract: DEFAULT_INITIALIZER.to_string(),
            signature: default_init_signature(),
            args: Vec::new(),
        }
    }
}

/// A facet to deploy and cut into the diamond
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct FacetPlan {
    /// The contract name
    pub contract: String,
    /// The cut action
    #[serde(default)]
    pub action: CutAction,
    /// Adjustments to the facet's selector set
    #[serde(flatten)]
    pub overrides: SelectorOverrides,
}

impl FacetPlan {
    /// A facet whose functions are all added
    pub fn add(contract: &str) -> Self {
        Self {
            contract: contract.to_string(),
            action: CutAction::Add,
            overrides: SelectorOverrides::default(),
        }
    }

    /// The cut plan for the facet once it is deployed
    pub fn cut_plan(&self, descriptor: FacetDescriptor) -> FacetCutPlan {
        FacetCutPlan {
            descriptor,
            action: self.action,
            overrides: self.overrides.clone(),
        }
    }
}

/// The plan for deploying a new diamond
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DiamondPlan {
    /// The proxy owner, defaults to the sender
    pub owner: Option<Address>,
    /// The facet exposing `diamondCut`
    pub cut_facet: String,
    /// The proxy contract
    pub proxy: String,
    /// Contracts deployed after the proxy, in order
    pub auxiliary: Vec<AuxiliaryContract>,
    /// The initializer, if any
    pub initializer: Option<InitializerPlan>,
    /// The facets to cut into the proxy, in order
    pub facets: Vec<FacetPlan>,
}

impl Default for DiamondPlan {
    fn default() -> Self {
        let inventory = FacetPlan {
            overrides: SelectorOverrides {
                exclude: vec![SUPPORTS_INTERFACE_SIGNATURE.to_string()],
                only: None,
            },
            ..FacetPlan::add("InventoryFacet")
        };

        Self {
            owner: None,
            cut_facet: DEFAULT_CUT_FACET.to_string(),
            proxy: DEFAULT_PROXY.to_string(),
            auxiliary: vec![
                AuxiliaryContract::new("MockERC721", &[]),
                AuxiliaryContract {
                    label: Some("MockERC721_Item".to_string()),
                    ..AuxiliaryContract::new("MockERC721", &[])
                },
                AuxiliaryContract::new("MockTerminus", &[]),
                AuxiliaryContract::new("MockERC20", &["lol", "lol"]),
            ],
            initializer: Some(InitializerPlan::default()),
            facets: vec![
                FacetPlan::add("DiamondLoupeFacet"),
                FacetPlan::add("OwnershipFacet"),
                inventory,
            ],
        }
    }
}

impl DiamondPlan {
    /// Read a plan from a JSON file, or use the reference plan if none is given
    pub fn load(path: Option<&Path>) -> Result<Self, ScriptError> {
        let plan = match path {
            Some(path) => read_plan(path)?,
            None => Self::default(),
        };

        plan.validate()?;
        Ok(plan)
    }

    /// Check the plan for mistakes that cannot be caught while parsing
    pub fn validate(&self) -> Result<(), ScriptError> {
        validate_facets(&self.facets)?;

        let mut labels: Vec<&str> = self.auxiliary.iter().map(AuxiliaryContract::label).collect();
        labels.sort_unstable();
        if let Some(pair) = labels.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(ScriptError::InvalidConfig(format!(
                "auxiliary label `{}` is used twice",
                pair[0]
            )));
        }

        Ok(())
    }
}

/// The plan for upgrading an existing diamond
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UpgradePlan {
    /// New facets to deploy and cut in, in order
    pub facets: Vec<FacetPlan>,
    /// Signatures to remove from the proxy
    pub remove: Vec<String>,
    /// The initializer, if any
    pub initializer: Option<InitializerPlan>,
}

impl UpgradePlan {
    /// Read a plan from a JSON file
    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let plan: Self = read_plan(path)?;
        plan.validate()?;
        Ok(plan)
    }

    /// Check the plan for mistakes that cannot be caught while parsing
    pub fn validate(&self) -> Result<(), ScriptError> {
        validate_facets(&self.facets)?;
        if self.facets.is_empty() && self.remove.is_empty() {
            return Err(ScriptError::InvalidConfig("upgrade plan has nothing to cut".to_string()));
        }

        Ok(())
    }
}

// -----------
// | Helpers |
// -----------

/// The default initializer entry point
fn default_init_signature() -> String {
    DEFAULT_INIT_SIGNATURE.to_string()
}

/// Parse a JSON plan file
fn read_plan<T: DeserializeOwned>(path: &Path) -> Result<T, ScriptError> {
    let contents = fs::read_to_string(path)
        .map_err(|e| ScriptError::ReadConfig(format!("{}: {e}", path.display())))?;

    serde_json::from_str(&contents)
        .map_err(|e| ScriptError::ReadConfig(format!("{}: {e}", path.display())))
}

/// Removals name signatures rather than facets, so facets may only be added
/// or replaced
fn validate_facets(facets: &[FacetPlan]) -> Result<(), ScriptError> {
    match facets.iter().find(|facet| facet.action == CutAction::Remove) {
        Some(facet) => Err(ScriptError::InvalidConfig(format!(
            "facet {} cannot be removed, list its signatures under `remove` instead",
            facet.contract
        ))),
        None => Ok(()),
    }
}

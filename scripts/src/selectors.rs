//! Selector derivation and set algebra over facet selectors
//!
//! A selector is the first four bytes of the Keccak-256 hash of a function's
//! canonical signature, i.e. `name(type1,type2,...)` with every parameter type
//! written in its canonical ABI form and no whitespace.

use alloy::{
    dyn_abi::Specifier,
    json_abi::Function,
    primitives::{keccak256, Selector},
};
use indexmap::IndexMap;

use crate::{constants::NUM_BYTES_SELECTOR, errors::ScriptError, types::FacetDescriptor};

/// Parse a function signature and render it in canonical form.
///
/// Accepts anything from `foo(uint)` to a full declaration such as
/// `function foo(uint256 amount) external returns (bool)`; parameter names,
/// visibility and return clauses are dropped.
pub fn canonical_signature(signature: &str) -> Result<String, ScriptError> {
    let function = Function::parse(signature).map_err(|e| ScriptError::MalformedSignature {
        signature: signature.to_string(),
        reason: e.to_string(),
    })?;

    let param_types = function
        .inputs
        .iter()
        .map(|param| param.resolve().map(|ty| ty.sol_type_name().into_owned()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ScriptError::MalformedSignature {
            signature: signature.to_string(),
            reason: e.to_string(),
        })?;

    Ok(format!("{}({})", function.name, param_types.join(",")))
}

/// Compute the selector of an already canonical signature
fn selector_of_canonical(canonical: &str) -> Selector {
    Selector::from_slice(&keccak256(canonical.as_bytes())[..NUM_BYTES_SELECTOR])
}

/// Compute the selector of a function signature
pub fn selector(signature: &str) -> Result<Selector, ScriptError> {
    canonical_signature(signature).map(|canonical| selector_of_canonical(&canonical))
}

/// Compute the selector set exposed by a facet
pub fn extract_selectors(facet: &FacetDescriptor) -> Result<SelectorSet, ScriptError> {
    SelectorSet::from_signatures(&facet.signatures)
}

/// An ordered set of selectors, each tagged with its canonical signature.
///
/// Equality is set equality; iteration follows insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectorSet {
    /// Selector -> canonical signature
    entries: IndexMap<Selector, String>,
}

impl SelectorSet {
    /// Build a set from function signatures, collapsing duplicates
    pub fn from_signatures<S: AsRef<str>>(signatures: &[S]) -> Result<Self, ScriptError> {
        let mut set = Self::default();
        for signature in signatures {
            let canonical = canonical_signature(signature.as_ref())?;
            set.insert(selector_of_canonical(&canonical), canonical)?;
        }

        Ok(set)
    }

    /// Insert a selector with its canonical signature.
    ///
    /// Returns whether the selector was newly inserted. Fails if a different
    /// signature already occupies the selector.
    pub fn insert(&mut self, selector: Selector, signature: String) -> Result<bool, ScriptError> {
        match self.entries.get(&selector) {
            Some(existing) if *existing == signature => Ok(false),
            Some(existing) => Err(ScriptError::SelectorClash {
                selector,
                first: existing.clone(),
                second: signature,
            }),
            None => {
                self.entries.insert(selector, signature);
                Ok(true)
            }
        }
    }

    /// Return this set without the selectors of the given signatures.
    ///
    /// Every named signature must be present.
    pub fn remove<S: AsRef<str>>(&self, signatures: &[S]) -> Result<Self, ScriptError> {
        let targets = self.lookup_all(signatures)?;
        let entries = self
            .entries
            .iter()
            .filter(|(selector, _)| !targets.contains(*selector))
            .map(|(selector, signature)| (*selector, signature.clone()))
            .collect();

        Ok(Self { entries })
    }

    /// Return only the selectors of the given signatures, in this set's order.
    ///
    /// Every named signature must be present.
    pub fn retain<S: AsRef<str>>(&self, signatures: &[S]) -> Result<Self, ScriptError> {
        let targets = self.lookup_all(signatures)?;
        let entries = self
            .entries
            .iter()
            .filter(|(selector, _)| targets.contains(*selector))
            .map(|(selector, signature)| (*selector, signature.clone()))
            .collect();

        Ok(Self { entries })
    }

    /// The union of two sets, with `self`'s entries first
    pub fn union(&self, other: &SelectorSet) -> Result<Self, ScriptError> {
        let mut set = self.clone();
        for (selector, signature) in other.iter() {
            set.insert(*selector, signature.clone())?;
        }

        Ok(set)
    }

    /// The selectors present in both sets, in `self`'s order
    pub fn intersection(&self, other: &SelectorSet) -> Self {
        let entries = self
            .entries
            .iter()
            .filter(|(selector, _)| other.contains(selector))
            .map(|(selector, signature)| (*selector, signature.clone()))
            .collect();

        Self { entries }
    }

    /// The selectors of `self` that are absent from `other`
    pub fn difference(&self, other: &SelectorSet) -> Self {
        let entries = self
            .entries
            .iter()
            .filter(|(selector, _)| !other.contains(selector))
            .map(|(selector, signature)| (*selector, signature.clone()))
            .collect();

        Self { entries }
    }

    /// Whether the set contains the selector
    pub fn contains(&self, selector: &Selector) -> bool {
        self.entries.contains_key(selector)
    }

    /// The canonical signature registered for a selector
    pub fn signature(&self, selector: &Selector) -> Option<&str> {
        self.entries.get(selector).map(String::as_str)
    }

    /// The number of selectors in the set
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(selector, canonical signature)` pairs in order
    pub fn iter(&self) -> impl Iterator<Item = (&Selector, &String)> {
        self.entries.iter()
    }

    /// The selectors in order
    pub fn selectors(&self) -> Vec<Selector> {
        self.entries.keys().copied().collect()
    }

    /// Resolve every signature to a selector present in this set
    fn lookup_all<S: AsRef<str>>(&self, signatures: &[S]) -> Result<Vec<Selector>, ScriptError> {
        signatures
            .iter()
            .map(|signature| {
                let canonical = canonical_signature(signature.as_ref())?;
                let selector = selector_of_canonical(&canonical);
                if self.contains(&selector) {
                    Ok(selector)
                } else {
                    Err(ScriptError::SelectorNotFound {
                        signature: canonical,
                        selector,
                    })
                }
            })
            .collect()
    }
}

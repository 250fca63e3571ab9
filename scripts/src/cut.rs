//! Assembly of diamond cut records from deployed facets
//!
//! Every selector a cut touches is checked against the routes the proxy already
//! has and against the records earlier in the same cut, so that no selector is
//! silently routed to two facets.

use alloy::primitives::{Address, Selector};
use indexmap::IndexMap;
use serde::Deserialize;
use tracing::debug;

use crate::{
    constants::REMOVED_FACET_NAME,
    errors::ScriptError,
    selectors::{extract_selectors, SelectorSet},
    types::{CutAction, FacetCut, FacetDescriptor, Route, RouteTable},
};

/// Caller-supplied adjustments to a facet's selector set
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct SelectorOverrides {
    /// Signatures to drop from the facet's set, e.g. an introspection
    /// function another facet already serves
    #[serde(default)]
    pub exclude: Vec<String>,
    /// If set, only these signatures are cut
    #[serde(default)]
    pub only: Option<Vec<String>>,
}

/// A facet paired with the action to apply to it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FacetCutPlan {
    /// The deployed facet
    pub descriptor: FacetDescriptor,
    /// The cut action
    pub action: CutAction,
    /// Adjustments to the facet's selector set
    pub overrides: SelectorOverrides,
}

impl FacetCutPlan {
    /// Plan to add every function of the facet
    pub fn add(descriptor: FacetDescriptor) -> Self {
        Self {
            descriptor,
            action: CutAction::Add,
            overrides: SelectorOverrides::default(),
        }
    }

    /// Plan to re-route every function of the facet to it
    pub fn replace(descriptor: FacetDescriptor) -> Self {
        Self {
            descriptor,
            action: CutAction::Replace,
            overrides: SelectorOverrides::default(),
        }
    }

    /// Plan to remove the given functions from the proxy
    pub fn remove(signatures: Vec<String>) -> Self {
        Self {
            descriptor: FacetDescriptor::new(REMOVED_FACET_NAME, Address::ZERO, signatures),
            action: CutAction::Remove,
            overrides: SelectorOverrides::default(),
        }
    }

    /// Drop the given signatures from the facet's set
    pub fn excluding<S: Into<String>>(mut self, signatures: impl IntoIterator<Item = S>) -> Self {
        self.overrides
            .exclude
            .extend(signatures.into_iter().map(Into::into));
        self
    }

    /// Cut only the given signatures of the facet
    pub fn only<S: Into<String>>(mut self, signatures: impl IntoIterator<Item = S>) -> Self {
        self.overrides.only = Some(signatures.into_iter().map(Into::into).collect());
        self
    }

    /// The facet's selector set after applying the overrides
    pub fn resolve_selectors(&self) -> Result<SelectorSet, ScriptError> {
        let mut selectors = extract_selectors(&self.descriptor)?;
        if let Some(only) = &self.overrides.only {
            selectors = selectors.retain(only)?;
        }
        if !self.overrides.exclude.is_empty() {
            selectors = selectors.remove(&self.overrides.exclude)?;
        }

        Ok(selectors)
    }

    /// The address the cut record points at
    fn cut_address(&self) -> Address {
        match self.action {
            CutAction::Remove => Address::ZERO,
            CutAction::Add | CutAction::Replace => self.descriptor.address,
        }
    }
}

/// Builds collision-checked cut lists
#[derive(Clone, Debug, Default)]
pub struct CutListBuilder {
    /// Routes the proxy already serves before the cut is applied
    existing: RouteTable,
}

impl CutListBuilder {
    /// A builder for a proxy with no routes
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the builder with routes the proxy already serves
    pub fn with_existing_routes(mut self, routes: impl IntoIterator<Item = (Selector, Route)>) -> Self {
        self.existing.extend(routes);
        self
    }

    /// The routes the builder checks new records against
    pub fn existing_routes(&self) -> &RouteTable {
        &self.existing
    }

    /// Build the cut list for the given plans, in order.
    ///
    /// - `Add` selectors must not be routed already, neither on the proxy nor
    ///   earlier in this cut
    /// - `Replace` and `Remove` selectors must be routed on the proxy and must
    ///   not be touched earlier in this cut
    pub fn build(&self, plans: &[FacetCutPlan]) -> Result<Vec<FacetCut>, ScriptError> {
        let mut claimed: RouteTable = IndexMap::new();
        let mut cuts = Vec::with_capacity(plans.len());

        for plan in plans {
            let selectors = plan.resolve_selectors()?;
            if selectors.is_empty() {
                return Err(ScriptError::EmptyFacetCut {
                    facet: plan.descriptor.name.clone(),
                });
            }

            let route = Route {
                address: plan.cut_address(),
                facet: plan.descriptor.name.clone(),
            };

            for (selector, signature) in selectors.iter() {
                if let Some(prior) = claimed.get(selector) {
                    return Err(collision(*selector, signature, prior, &route));
                }

                match (plan.action, self.existing.get(selector)) {
                    (CutAction::Add, Some(existing)) => {
                        return Err(collision(*selector, signature, existing, &route));
                    }
                    (CutAction::Replace | CutAction::Remove, None) => {
                        return Err(ScriptError::SelectorNotFound {
                            signature: signature.clone(),
                            selector: *selector,
                        });
                    }
                    _ => {}
                }

                claimed.insert(*selector, route.clone());
            }

            debug!(
                facet = %plan.descriptor.name,
                address = %route.address,
                action = %plan.action,
                selectors = selectors.len(),
                "resolved facet cut"
            );

            cuts.push(FacetCut {
                facet_name: plan.descriptor.name.clone(),
                facet_address: route.address,
                action: plan.action,
                selectors,
            });
        }

        Ok(cuts)
    }
}

/// The routes a facet serves once all of its functions are installed
pub fn facet_routes(facet: &FacetDescriptor) -> Result<Vec<(Selector, Route)>, ScriptError> {
    let route = Route {
        address: facet.address,
        facet: facet.name.clone(),
    };

    Ok(extract_selectors(facet)?
        .selectors()
        .into_iter()
        .map(|selector| (selector, route.clone()))
        .collect())
}

/// Flatten a loupe `facets()` report into routes
pub fn loupe_routes(facets: &[(Address, Vec<Selector>)]) -> Vec<(Selector, Route)> {
    facets
        .iter()
        .flat_map(|(address, selectors)| {
            selectors.iter().map(move |selector| {
                (
                    *selector,
                    Route {
                        address: *address,
                        facet: format!("{address:#x}"),
                    },
                )
            })
        })
        .collect()
}

/// The total number of selectors carried by a cut list
pub fn total_selectors(cuts: &[FacetCut]) -> usize {
    cuts.iter().map(|cut| cut.selectors.len()).sum()
}

/// Build the collision error for a selector claimed twice
fn collision(selector: Selector, signature: &str, first: &Route, second: &Route) -> ScriptError {
    ScriptError::SelectorCollision {
        selector,
        signature: signature.to_string(),
        first: first.address,
        first_facet: first.facet.clone(),
        second: second.address,
        second_facet: second.facet.clone(),
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::Address;

    use super::*;
    use crate::selectors::selector;

    /// Build a descriptor at an address derived from `n`
    fn facet(name: &str, n: u8, signatures: &[&str]) -> FacetDescriptor {
        FacetDescriptor::new(
            name,
            Address::with_last_byte(n),
            signatures.iter().map(|s| s.to_string()).collect(),
        )
    }

    #[test]
    fn test_disjoint_facets() {
        let plans = vec![
            FacetCutPlan::add(facet("A", 1, &["foo()", "qux(uint256)"])),
            FacetCutPlan::add(facet("B", 2, &["bar()"])),
            FacetCutPlan::add(facet("C", 3, &["baz()"])),
        ];

        let cuts = CutListBuilder::new().build(&plans).unwrap();
        assert_eq!(cuts.len(), 3);
        for (cut, plan) in cuts.iter().zip(&plans) {
            assert_eq!(cut.action, CutAction::Add);
            assert_eq!(cut.facet_address, plan.descriptor.address);
        }

        for (i, a) in cuts.iter().enumerate() {
            for b in &cuts[i + 1..] {
                assert!(a.selectors.intersection(&b.selectors).is_empty());
            }
        }
        assert_eq!(total_selectors(&cuts), 4);
    }

    #[test]
    fn test_shared_signature_collides() {
        let plans = vec![
            FacetCutPlan::add(facet("Loupe", 1, &["facets()", "supportsInterface(bytes4)"])),
            FacetCutPlan::add(facet("Inventory", 2, &["supportsInterface(bytes4)", "baz()"])),
        ];

        let err = CutListBuilder::new().build(&plans).unwrap_err();
        match err {
            ScriptError::SelectorCollision {
                selector: sel,
                first,
                second,
                ..
            } => {
                assert_eq!(sel, selector("supportsInterface(bytes4)").unwrap());
                assert_eq!(first, Address::with_last_byte(1));
                assert_eq!(second, Address::with_last_byte(2));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_collision_resolved_by_exclusion() {
        let loupe = facet("Loupe", 9, &["facets()", "supportsInterface(bytes4)"]);
        let builder = CutListBuilder::new().with_existing_routes(facet_routes(&loupe).unwrap());

        let plans = vec![
            FacetCutPlan::add(facet("A", 1, &["foo()"])),
            FacetCutPlan::add(facet("B", 2, &["bar()"])),
            FacetCutPlan::add(facet("C", 3, &["supportsInterface(bytes4)", "baz()"]))
                .excluding(["supportsInterface(bytes4)"]),
        ];

        let cuts = builder.build(&plans).unwrap();
        assert_eq!(cuts.len(), 3);
        assert!(cuts.iter().all(|cut| cut.action == CutAction::Add));
        assert_eq!(total_selectors(&cuts), 3);

        let all = cuts
            .iter()
            .try_fold(SelectorSet::default(), |acc, cut| acc.union(&cut.selectors))
            .unwrap();
        assert_eq!(all.len(), 3);

        // Without the exclusion the pre-existing loupe route shadows C
        let mut unresolved = plans.clone();
        unresolved[2].overrides.exclude.clear();
        let err = builder.build(&unresolved).unwrap_err();
        assert!(matches!(
            err,
            ScriptError::SelectorCollision { first, second, .. }
                if first == Address::with_last_byte(9) && second == Address::with_last_byte(3)
        ));
    }

    #[test]
    fn test_exclusion_of_absent_signature() {
        let plans =
            vec![FacetCutPlan::add(facet("A", 1, &["foo()"])).excluding(["supportsInterface(bytes4)"])];

        let err = CutListBuilder::new().build(&plans).unwrap_err();
        assert!(matches!(err, ScriptError::SelectorNotFound { .. }));
    }

    #[test]
    fn test_only_override() {
        let plans = vec![FacetCutPlan::add(facet("A", 1, &["foo()", "bar()", "baz()"])).only(["bar()"])];

        let cuts = CutListBuilder::new().build(&plans).unwrap();
        assert_eq!(cuts[0].selectors.selectors(), vec![selector("bar()").unwrap()]);
    }

    #[test]
    fn test_empty_cut_rejected() {
        let plans = vec![FacetCutPlan::add(facet("A", 1, &["foo()"])).excluding(["foo()"])];

        let err = CutListBuilder::new().build(&plans).unwrap_err();
        assert!(matches!(err, ScriptError::EmptyFacetCut { facet } if facet == "A"));
    }

    #[test]
    fn test_replace_and_remove() {
        let old = facet("Old", 1, &["foo()", "bar()"]);
        let builder = CutListBuilder::new().with_existing_routes(facet_routes(&old).unwrap());

        let plans = vec![
            FacetCutPlan::replace(facet("New", 2, &["foo()"])),
            FacetCutPlan::remove(vec!["bar()".to_string()]),
        ];

        let cuts = builder.build(&plans).unwrap();
        assert_eq!(cuts[0].action, CutAction::Replace);
        assert_eq!(cuts[0].facet_address, Address::with_last_byte(2));
        assert_eq!(cuts[1].action, CutAction::Remove);
        assert_eq!(cuts[1].facet_address, Address::ZERO);
    }

    #[test]
    fn test_replace_requires_existing_route() {
        let plans = vec![FacetCutPlan::replace(facet("New", 2, &["foo()"]))];
        let err = CutListBuilder::new().build(&plans).unwrap_err();
        assert!(matches!(err, ScriptError::SelectorNotFound { .. }));

        let plans = vec![FacetCutPlan::remove(vec!["foo()".to_string()])];
        let err = CutListBuilder::new().build(&plans).unwrap_err();
        assert!(matches!(err, ScriptError::SelectorNotFound { .. }));
    }

    #[test]
    fn test_remove_then_add_in_one_cut_collides() {
        let old = facet("Old", 1, &["foo()"]);
        let builder = CutListBuilder::new().with_existing_routes(facet_routes(&old).unwrap());

        let plans = vec![
            FacetCutPlan::remove(vec!["foo()".to_string()]),
            FacetCutPlan::replace(facet("New", 2, &["foo()"])),
        ];
        let err = builder.build(&plans).unwrap_err();
        assert!(matches!(err, ScriptError::SelectorCollision { .. }));
    }

    #[test]
    fn test_loupe_routes() {
        let foo = selector("foo()").unwrap();
        let bar = selector("bar()").unwrap();
        let routes = loupe_routes(&[
            (Address::with_last_byte(1), vec![foo]),
            (Address::with_last_byte(2), vec![bar]),
        ]);

        assert_eq!(routes.len(), 2);
        assert_eq!(routes[1].0, bar);
        assert_eq!(routes[1].1.address, Address::with_last_byte(2));
    }
}

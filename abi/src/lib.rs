//! Solidity bindings for the diamond (EIP-2535) proxy interfaces used by the
//! deploy scripts

use alloy::sol;

sol! {
    #![sol(all_derives)]
    #[allow(missing_docs)]
    #[sol(rpc)]
    interface IDiamondCut {
        enum FacetCutAction {
            Add,
            Replace,
            Remove
        }

        struct FacetCut {
            address facetAddress;
            FacetCutAction action;
            bytes4[] functionSelectors;
        }

        function diamondCut(FacetCut[] calldata _diamondCut, address _init, bytes calldata _calldata) external;

        event DiamondCut(FacetCut[] _diamondCut, address _init, bytes _calldata);
    }

    #[allow(missing_docs)]
    #[sol(rpc)]
    interface IDiamondLoupe {
        struct Facet {
            address facetAddress;
            bytes4[] functionSelectors;
        }

        function facets() external view returns (Facet[] memory facets_);
        function facetFunctionSelectors(address _facet) external view returns (bytes4[] memory facetFunctionSelectors_);
        function facetAddresses() external view returns (address[] memory facetAddresses_);
        function facetAddress(bytes4 _functionSelector) external view returns (address facetAddress_);
    }

    #[allow(missing_docs)]
    interface IDiamondInit {
        function init() external;
    }
}

#[cfg(test)]
mod tests {
    use alloy_sol_types::SolCall;

    use super::{IDiamondCut, IDiamondInit, IDiamondLoupe};

    #[test]
    fn test_interface_selectors() {
        // Values taken from the EIP-2535 reference implementation
        assert_eq!(IDiamondCut::diamondCutCall::SELECTOR, [0x1f, 0x93, 0x1c, 0x1c]);
        assert_eq!(IDiamondLoupe::facetsCall::SELECTOR, [0x7a, 0x0e, 0xd6, 0x27]);
        assert_eq!(IDiamondInit::initCall::SELECTOR, [0xe1, 0xc7, 0x39, 0x2a]);
    }

    #[test]
    fn test_cut_action_discriminants() {
        assert_eq!(IDiamondCut::FacetCutAction::Add as u8, 0);
        assert_eq!(IDiamondCut::FacetCutAction::Replace as u8, 1);
        assert_eq!(IDiamondCut::FacetCutAction::Remove as u8, 2);
    }
}

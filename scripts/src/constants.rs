//! Constants used in the deploy scripts

/// The number of bytes in a function selector
pub const NUM_BYTES_SELECTOR: usize = 4;

/// The facet name given to `Remove` cut records, which carry no facet
pub const REMOVED_FACET_NAME: &str = "removed";

/// The contract exposing the `diamondCut` entry point
pub const DEFAULT_CUT_FACET: &str = "DiamondCutFacet";

/// The diamond proxy contract
pub const DEFAULT_PROXY: &str = "Diamond";

/// The contract whose `init` function is called during the first cut
pub const DEFAULT_INITIALIZER: &str = "DiamondInit";

/// The signature of the initializer's entry point
pub const DEFAULT_INIT_SIGNATURE: &str = "init()";

/// The introspection function implemented by both the loupe facet and
/// ERC165-aware application facets
pub const SUPPORTS_INTERFACE_SIGNATURE: &str = "supportsInterface(bytes4)";

/// The number of times to poll for a transaction receipt before giving up
pub const DEFAULT_RECEIPT_POLL_ATTEMPTS: u32 = 60;

/// The interval between receipt polls, in milliseconds
pub const DEFAULT_RECEIPT_POLL_INTERVAL_MS: u64 = 1_000;

/// The file extension of compilation artifacts
pub const ARTIFACT_EXTENSION: &str = "json";

/// The ABI key in a compilation artifact
pub const ARTIFACT_ABI_KEY: &str = "abi";

/// The bytecode key in a compilation artifact
pub const ARTIFACT_BYTECODE_KEY: &str = "bytecode";

/// The key under which Foundry nests the bytecode hex
pub const ARTIFACT_BYTECODE_OBJECT_KEY: &str = "object";

/// The diamond proxy key in the `deployments.json` file
pub const DIAMOND_PROXY_KEY: &str = "Diamond";

/// The cut facet key in the `deployments.json` file
pub const DIAMOND_CUT_FACET_KEY: &str = "DiamondCutFacet";

/// The initializer key in the `deployments.json` file
pub const DIAMOND_INIT_KEY: &str = "DiamondInit";

//! Compiled contract artifacts
//!
//! Data produced by the compiler front-end and consumed by the registry and
//! the coverage analyzer. The front-end itself lives elsewhere; these types
//! only describe what it hands over.
//!
//! ## Bytecode matching
//!
//! ```text
//! runtime metadata hash (ipfs/bzzr0/bzzr1) ──► equal hashes?      ─► decided
//!          │ no hash on either side
//!          ▼
//! init code prefix (ctor args stripped)   ──► prefix equal?       ─► match
//!          │
//!          ▼
//! runtime code                            ──► byte-for-byte equal ─► match
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Metadata keys whose value is the hash of the contract's source and settings
const METADATA_HASH_KEYS: [&str; 3] = ["ipfs", "bzzr1", "bzzr0"];

/// A callable method in a contract ABI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiMethod {
    /// Method name
    pub name: String,
    /// Canonical input types
    pub inputs: Vec<String>,
    /// Canonical signature, e.g. `transfer(address,uint256)`
    pub sig: String,
}

impl AbiMethod {
    /// Create a method, deriving its canonical signature
    #[must_use]
    pub fn new(name: impl Into<String>, inputs: &[&str]) -> Self {
        let name = name.into();
        let inputs: Vec<String> = inputs.iter().map(|s| (*s).to_string()).collect();
        let sig = format!("{}({})", name, inputs.join(","));
        Self { name, inputs, sig }
    }
}

/// Ordered set of callable methods a contract exposes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractAbi {
    /// Methods in declaration order
    pub methods: Vec<AbiMethod>,
}

impl ContractAbi {
    /// Create an ABI from its methods
    #[must_use]
    pub fn new(methods: Vec<AbiMethod>) -> Self {
        Self { methods }
    }

    /// Iterate over method signatures
    pub fn signatures(&self) -> impl Iterator<Item = &str> {
        self.methods.iter().map(|m| m.sig.as_str())
    }
}

/// Compiled contract data: ABI, bytecode and source mappings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledContract {
    /// Contract ABI
    pub abi: ContractAbi,
    /// Init (creation) bytecode
    pub init_bytecode: Vec<u8>,
    /// Runtime (deployed) bytecode
    pub runtime_bytecode: Vec<u8>,
    /// Source map for the init bytecode
    pub src_map_init: String,
    /// Source map for the runtime bytecode
    pub src_map_runtime: String,
    /// Unresolved library link placeholders
    pub library_placeholders: Vec<String>,
}

impl CompiledContract {
    /// Create a compiled contract from an ABI and its bytecode
    #[must_use]
    pub fn new(abi: ContractAbi, init_bytecode: Vec<u8>, runtime_bytecode: Vec<u8>) -> Self {
        Self {
            abi,
            init_bytecode,
            runtime_bytecode,
            ..Default::default()
        }
    }

    /// Set the source maps
    #[must_use]
    pub fn with_source_maps(mut self, init: impl Into<String>, runtime: impl Into<String>) -> Self {
        self.src_map_init = init.into();
        self.src_map_runtime = runtime.into();
        self
    }

    /// Check whether observed bytecode was produced by this contract.
    ///
    /// Either side may be empty when the caller only knows one of them.
    #[must_use]
    pub fn is_match(&self, init_bytecode: &[u8], runtime_bytecode: &[u8]) -> bool {
        let can_compare_init = !init_bytecode.is_empty() && !self.init_bytecode.is_empty();
        let can_compare_runtime =
            !runtime_bytecode.is_empty() && !self.runtime_bytecode.is_empty();

        // Init code metadata can collide across contracts; only runtime hashes decide.
        if can_compare_runtime {
            let deployed = metadata_hash(runtime_bytecode);
            let defined = metadata_hash(&self.runtime_bytecode);
            if let (Some(deployed), Some(defined)) = (deployed, defined) {
                return deployed == defined;
            }
        }

        // Constructor arguments are appended to the init code.
        if can_compare_init
            && self.init_bytecode.len() <= init_bytecode.len()
            && init_bytecode[..self.init_bytecode.len()] == self.init_bytecode[..]
        {
            return true;
        }

        can_compare_runtime && runtime_bytecode == self.runtime_bytecode.as_slice()
    }
}

/// Locate the trailing CBOR metadata blob.
///
/// The final two bytes hold the big-endian length of the blob that precedes them.
#[must_use]
pub fn contract_metadata(bytecode: &[u8]) -> Option<&[u8]> {
    let len = bytecode.len();
    if len < 2 {
        return None;
    }
    let meta_len = usize::from(u16::from_be_bytes([bytecode[len - 2], bytecode[len - 1]]));
    if meta_len == 0 || meta_len + 2 > len {
        return None;
    }
    let metadata = &bytecode[len - 2 - meta_len..len - 2];
    // A CBOR map header (major type 5)
    if metadata[0] & 0xe0 != 0xa0 {
        return None;
    }
    Some(metadata)
}

/// Extract the source hash stored in the bytecode's metadata, if any
#[must_use]
pub fn metadata_hash(bytecode: &[u8]) -> Option<Vec<u8>> {
    let metadata = contract_metadata(bytecode)?;
    let mut entries: BTreeMap<String, serde_cbor::Value> =
        serde_cbor::from_slice(metadata).ok()?;
    METADATA_HASH_KEYS
        .iter()
        .find_map(|key| match entries.remove(*key) {
            Some(serde_cbor::Value::Bytes(hash)) => Some(hash),
            _ => None,
        })
}

/// Per-source-file output of a compilation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceArtifact {
    /// Compiler AST for the source file, when requested
    pub ast: Option<serde_json::Value>,
    /// Contracts defined in the file, by name
    pub contracts: BTreeMap<String, Arc<CompiledContract>>,
}

/// A build unit: compiled contracts grouped by source path
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Compilation {
    /// Source path to its artifacts
    pub sources: BTreeMap<String, SourceArtifact>,
}

impl Compilation {
    /// Create an empty compilation
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a compiled contract under a source path
    pub fn add_contract(
        &mut self,
        source_path: impl Into<String>,
        name: impl Into<String>,
        contract: CompiledContract,
    ) {
        let _ = self
            .sources
            .entry(source_path.into())
            .or_default()
            .contracts
            .insert(name.into(), Arc::new(contract));
    }

    /// Total number of contracts across all sources
    #[must_use]
    pub fn contract_count(&self) -> usize {
        self.sources.values().map(|s| s.contracts.len()).sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn with_metadata(code: &[u8], key: &str, hash: &[u8]) -> Vec<u8> {
        let mut meta = vec![0xa1, 0x60 | key.len() as u8];
        meta.extend_from_slice(key.as_bytes());
        meta.push(0x58);
        meta.push(hash.len() as u8);
        meta.extend_from_slice(hash);

        let mut out = code.to_vec();
        out.extend_from_slice(&meta);
        out.extend_from_slice(&(meta.len() as u16).to_be_bytes());
        out
    }

    #[test]
    fn test_abi_method_signature() {
        let method = AbiMethod::new("transfer", &["address", "uint256"]);
        assert_eq!(method.sig, "transfer(address,uint256)");
        assert_eq!(AbiMethod::new("pause", &[]).sig, "pause()");
    }

    #[test]
    fn test_metadata_hash_ipfs() {
        let hash = [7u8; 34];
        let code = with_metadata(&[0x60, 0x80, 0x60, 0x40], "ipfs", &hash);
        assert_eq!(metadata_hash(&code), Some(hash.to_vec()));
    }

    #[test]
    fn test_metadata_hash_bzzr0() {
        let hash = [3u8; 32];
        let code = with_metadata(&[0x60, 0x80], "bzzr0", &hash);
        assert_eq!(metadata_hash(&code), Some(hash.to_vec()));
    }

    /// Metadata `{"bzzr1": <hash>, "solc": h'000510'}` where the hash bytes
    /// spell out the `ipfs` key
    fn bzzr1_with_key_like_hash(last: u8) -> Vec<u8> {
        let hash = [0x64, b'i', b'p', b'f', b's', 0x41, 0x07, 0x11, 0x22, last];
        let mut meta = vec![0xa2, 0x65];
        meta.extend_from_slice(b"bzzr1");
        meta.push(0x40 | hash.len() as u8);
        meta.extend_from_slice(&hash);
        meta.push(0x64);
        meta.extend_from_slice(b"solc");
        meta.extend_from_slice(&[0x43, 0x00, 0x05, 0x10]);

        let mut out = vec![0x60, 0x80];
        out.extend_from_slice(&meta);
        out.extend_from_slice(&(meta.len() as u16).to_be_bytes());
        out
    }

    #[test]
    fn test_metadata_hash_containing_key_bytes() {
        let code = bzzr1_with_key_like_hash(0x33);
        assert_eq!(
            metadata_hash(&code),
            Some(vec![0x64, b'i', b'p', b'f', b's', 0x41, 0x07, 0x11, 0x22, 0x33])
        );

        let contract = CompiledContract::new(ContractAbi::default(), vec![], code);
        assert!(!contract.is_match(&[], &bzzr1_with_key_like_hash(0x34)));
        assert!(contract.is_match(&[], &bzzr1_with_key_like_hash(0x33)));
    }

    #[test]
    fn test_metadata_not_cbor() {
        // Map header followed by a truncated entry
        let code = [0x60, 0x80, 0xa1, 0x64, b'i', 0x00, 0x03];
        assert!(metadata_hash(&code).is_none());
    }

    #[test]
    fn test_metadata_absent() {
        assert!(metadata_hash(&[0x60, 0x80, 0x60, 0x40]).is_none());
        assert!(metadata_hash(&[]).is_none());
        assert!(metadata_hash(&[0x00, 0xff]).is_none());
    }

    #[test]
    fn test_match_by_runtime_metadata() {
        let runtime = with_metadata(&[1, 2, 3], "ipfs", &[9u8; 34]);
        let contract = CompiledContract::new(ContractAbi::default(), vec![], runtime.clone());

        // Different code body, same source hash
        let deployed = with_metadata(&[4, 5, 6, 7], "ipfs", &[9u8; 34]);
        assert!(contract.is_match(&[], &deployed));

        let other = with_metadata(&[1, 2, 3], "ipfs", &[8u8; 34]);
        assert!(!contract.is_match(&[], &other));
    }

    #[test]
    fn test_metadata_mismatch_is_final() {
        let runtime = with_metadata(&[1, 2, 3], "ipfs", &[9u8; 34]);
        let contract =
            CompiledContract::new(ContractAbi::default(), vec![0xaa, 0xbb], runtime);
        let other = with_metadata(&[1, 2, 3], "ipfs", &[1u8; 34]);
        assert!(!contract.is_match(&[0xaa, 0xbb], &other));
    }

    #[test]
    fn test_match_init_with_constructor_args() {
        let contract =
            CompiledContract::new(ContractAbi::default(), vec![0x60, 0x80, 0x52], vec![]);
        assert!(contract.is_match(&[0x60, 0x80, 0x52, 0x00, 0x01], &[]));
        assert!(contract.is_match(&[0x60, 0x80, 0x52], &[]));
        assert!(!contract.is_match(&[0x60, 0x80], &[]));
        assert!(!contract.is_match(&[0x60, 0x81, 0x52], &[]));
    }

    #[test]
    fn test_match_runtime_exact() {
        let contract = CompiledContract::new(ContractAbi::default(), vec![], vec![0x01, 0x02]);
        assert!(contract.is_match(&[], &[0x01, 0x02]));
        assert!(!contract.is_match(&[], &[0x01, 0x02, 0x03]));
        assert!(!contract.is_match(&[], &[]));
    }

    #[test]
    fn test_compilation_contract_count() {
        let mut compilation = Compilation::new();
        compilation.add_contract("a.sol", "A", CompiledContract::default());
        compilation.add_contract("a.sol", "B", CompiledContract::default());
        compilation.add_contract("b.sol", "C", CompiledContract::default());
        assert_eq!(compilation.contract_count(), 3);
        assert_eq!(compilation.sources.len(), 2);
    }
}

//! Compiled Artifact Registry and Bytecode Matcher
//!
//! The execution engine uses [`Contracts`] to attribute live bytecode to a
//! named contract, and each [`Contract`] to look up which of its methods are
//! currently eligible for fuzzing.
//!
//! Registry order is significant: when several contracts share identical
//! bytecode, the first one registered wins.

use crate::compilation::{Compilation, CompiledContract};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// A compiled contract known to the fuzzer
#[derive(Debug)]
pub struct Contract {
    name: String,
    source_path: String,
    compiled_contract: Arc<CompiledContract>,
    compilation: Arc<Compilation>,
    /// Method signature to enabled flag
    callable_methods: RwLock<HashMap<String, bool>>,
}

impl Contract {
    /// Create a contract with every ABI method enabled
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        source_path: impl Into<String>,
        compiled_contract: Arc<CompiledContract>,
        compilation: Arc<Compilation>,
    ) -> Self {
        let callable_methods = compiled_contract
            .abi
            .signatures()
            .map(|sig| (sig.to_string(), true))
            .collect();

        Self {
            name: name.into(),
            source_path: source_path.into(),
            compiled_contract,
            compilation,
            callable_methods: RwLock::new(callable_methods),
        }
    }

    /// Contract name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Key of the source file in the owning compilation
    #[must_use]
    pub fn source_path(&self) -> &str {
        &self.source_path
    }

    /// Compiled ABI, bytecode and source maps
    #[must_use]
    pub fn compiled_contract(&self) -> &Arc<CompiledContract> {
        &self.compiled_contract
    }

    /// Compilation this contract came from
    #[must_use]
    pub fn compilation(&self) -> &Arc<Compilation> {
        &self.compilation
    }

    /// Snapshot of the callable methods and their enabled flags
    #[must_use]
    pub fn callable_methods(&self) -> HashMap<String, bool> {
        self.callable_methods
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Check whether a method is currently enabled
    #[must_use]
    pub fn is_callable(&self, signature: &str) -> bool {
        self.callable_methods
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(signature)
            .copied()
            .unwrap_or(false)
    }

    /// Enabled method signatures, sorted
    #[must_use]
    pub fn enabled_methods(&self) -> Vec<String> {
        let methods = self
            .callable_methods
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let mut enabled: Vec<String> = methods
            .iter()
            .filter(|(_, &on)| on)
            .map(|(sig, _)| sig.to_string())
            .collect();
        enabled.sort();
        enabled
    }

    /// Allow the fuzzer to call a method. Unknown signatures are added.
    pub fn enable(&self, signature: &str) {
        self.set_callable(signature, true);
    }

    /// Stop the fuzzer from calling a method. Unknown signatures are added.
    pub fn disable(&self, signature: &str) {
        self.set_callable(signature, false);
    }

    fn set_callable(&self, signature: &str, enabled: bool) {
        let _ = self
            .callable_methods
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(signature.to_string(), enabled);
    }
}

/// Ordered registry of known contracts
#[derive(Debug, Clone, Default)]
pub struct Contracts {
    contracts: Vec<Arc<Contract>>,
}

impl Contracts {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from compilations.
    ///
    /// Compilations keep their given order; within one, contracts are
    /// registered by source path and then by name.
    #[must_use]
    pub fn from_compilations(compilations: &[Arc<Compilation>]) -> Self {
        let mut registry = Self::new();
        for compilation in compilations {
            for (source_path, artifact) in &compilation.sources {
                for (name, compiled) in &artifact.contracts {
                    let _ = registry.register(Contract::new(
                        name.clone(),
                        source_path.clone(),
                        Arc::clone(compiled),
                        Arc::clone(compilation),
                    ));
                }
            }
        }
        registry
    }

    /// Append a contract, returning the shared handle
    pub fn register(&mut self, contract: Contract) -> Arc<Contract> {
        let contract = Arc::new(contract);
        self.contracts.push(Arc::clone(&contract));
        contract
    }

    /// Find the first registered contract matching the observed bytecode
    #[must_use]
    pub fn match_bytecode(
        &self,
        init_bytecode: &[u8],
        runtime_bytecode: &[u8],
    ) -> Option<Arc<Contract>> {
        self.contracts
            .iter()
            .find(|c| {
                c.compiled_contract()
                    .is_match(init_bytecode, runtime_bytecode)
            })
            .cloned()
    }

    /// Look up a contract by name (first registered wins)
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&Arc<Contract>> {
        self.contracts.iter().find(|c| c.name() == name)
    }

    /// Iterate in registration order
    pub fn iter(&self) -> std::slice::Iter<'_, Arc<Contract>> {
        self.contracts.iter()
    }

    /// Number of registered contracts
    #[must_use]
    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    /// Check if the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }
}

impl<'a> IntoIterator for &'a Contracts {
    type Item = &'a Arc<Contract>;
    type IntoIter = std::slice::Iter<'a, Arc<Contract>>;

    fn into_iter(self) -> Self::IntoIter {
        self.contracts.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::compilation::{AbiMethod, ContractAbi};

    fn compiled(code: &[u8]) -> Arc<CompiledContract> {
        Arc::new(CompiledContract::new(
            ContractAbi::default(),
            code.to_vec(),
            code.to_vec(),
        ))
    }

    fn contract(name: &str, code: &[u8]) -> Contract {
        Contract::new(name, "src/Token.sol", compiled(code), Arc::new(Compilation::new()))
    }

    mod registry_tests {
        use super::*;

        #[test]
        fn test_all_methods_enabled_by_default() {
            let abi = ContractAbi::new(vec![
                AbiMethod::new("transfer", &["address", "uint256"]),
                AbiMethod::new("approve", &["address", "uint256"]),
                AbiMethod::new("pause", &[]),
            ]);
            let compiled = Arc::new(CompiledContract::new(abi, vec![], vec![]));
            let c = Contract::new("Token", "src/Token.sol", compiled, Arc::new(Compilation::new()));

            let methods = c.callable_methods();
            assert_eq!(methods.len(), 3);
            assert!(methods.values().all(|&on| on));
        }

        #[test]
        fn test_disable_then_enable() {
            let abi = ContractAbi::new(vec![AbiMethod::new("pause", &[])]);
            let compiled = Arc::new(CompiledContract::new(abi, vec![], vec![]));
            let c = Contract::new("Token", "src/Token.sol", compiled, Arc::new(Compilation::new()));

            c.disable("pause()");
            assert_eq!(c.callable_methods().get("pause()"), Some(&false));
            assert!(!c.is_callable("pause()"));

            c.enable("pause()");
            assert_eq!(c.callable_methods().get("pause()"), Some(&true));
        }

        #[test]
        fn test_toggle_is_idempotent() {
            let c = contract("A", &[1]);
            c.disable("x()");
            c.disable("x()");
            assert_eq!(c.callable_methods().get("x()"), Some(&false));
            c.enable("x()");
            c.enable("x()");
            assert_eq!(c.callable_methods().len(), 1);
        }

        #[test]
        fn test_unknown_signature_is_added() {
            let c = contract("A", &[1]);
            assert!(!c.is_callable("mint(uint256)"));
            c.enable("mint(uint256)");
            assert!(c.is_callable("mint(uint256)"));
        }

        #[test]
        fn test_enabled_methods_sorted() {
            let c = contract("A", &[1]);
            c.enable("b()");
            c.enable("a()");
            c.disable("c()");
            assert_eq!(c.enabled_methods(), vec!["a()".to_string(), "b()".to_string()]);
        }

        #[test]
        fn test_accessors() {
            let c = contract("Vault", &[1, 2]);
            assert_eq!(c.name(), "Vault");
            assert_eq!(c.source_path(), "src/Token.sol");
            assert_eq!(c.compiled_contract().runtime_bytecode, vec![1, 2]);
            assert_eq!(c.compilation().contract_count(), 0);
        }

        #[test]
        fn test_from_compilations_order() {
            let mut first = Compilation::new();
            first.add_contract("b.sol", "B", CompiledContract::default());
            first.add_contract("a.sol", "Z", CompiledContract::default());
            first.add_contract("a.sol", "Y", CompiledContract::default());
            let mut second = Compilation::new();
            second.add_contract("a.sol", "X", CompiledContract::default());

            let registry =
                Contracts::from_compilations(&[Arc::new(first), Arc::new(second)]);
            let names: Vec<&str> = registry.iter().map(|c| c.name()).collect();
            assert_eq!(names, vec!["Y", "Z", "B", "X"]);
        }
    }

    mod matcher_tests {
        use super::*;

        #[test]
        fn test_match_second_contract() {
            let mut registry = Contracts::new();
            let _ = registry.register(contract("A", &[0xaa]));
            let b = registry.register(contract("B", &[0xbb]));

            let found = registry.match_bytecode(&[0xbb], &[0xbb]).unwrap();
            assert!(Arc::ptr_eq(&found, &b));
        }

        #[test]
        fn test_no_match() {
            let mut registry = Contracts::new();
            let _ = registry.register(contract("A", &[0xaa]));
            let _ = registry.register(contract("B", &[0xbb]));
            assert!(registry.match_bytecode(&[0xcc], &[0xcc]).is_none());
        }

        #[test]
        fn test_first_registered_wins() {
            let mut registry = Contracts::new();
            let a = registry.register(contract("A", &[0xaa]));
            let _ = registry.register(contract("B", &[0xaa]));

            let found = registry.match_bytecode(&[0xaa], &[0xaa]).unwrap();
            assert!(Arc::ptr_eq(&found, &a));
            assert_eq!(found.name(), "A");
        }

        #[test]
        fn test_empty_registry() {
            let registry = Contracts::new();
            assert!(registry.is_empty());
            assert!(registry.match_bytecode(&[1], &[1]).is_none());
        }

        #[test]
        fn test_method_toggles_do_not_affect_matching() {
            let mut registry = Contracts::new();
            let a = registry.register(contract("A", &[0xaa]));
            a.disable("anything()");
            assert!(registry.match_bytecode(&[], &[0xaa]).is_some());
        }

        #[test]
        fn test_concurrent_readers() {
            let mut registry = Contracts::new();
            let _ = registry.register(contract("A", &[0xaa]));
            let _ = registry.register(contract("B", &[0xbb]));
            let registry = Arc::new(registry);

            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let registry = Arc::clone(&registry);
                    std::thread::spawn(move || {
                        registry
                            .match_bytecode(&[0xbb], &[0xbb])
                            .map(|c| c.name().to_string())
                    })
                })
                .collect();

            for handle in handles {
                assert_eq!(handle.join().unwrap().as_deref(), Some("B"));
            }
        }

        #[test]
        fn test_by_name() {
            let mut registry = Contracts::new();
            let _ = registry.register(contract("A", &[0xaa]));
            assert!(registry.by_name("A").is_some());
            assert!(registry.by_name("Nope").is_none());
            assert_eq!(registry.len(), 1);
        }
    }
}

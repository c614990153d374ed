use crate::{Base58Algorithm, Base64Algorithm, Sha256Algorithm};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use urlshortener_core::{AlgorithmType, CoreError, ShorteningAlgorithm};

static GLOBAL: LazyLock<AlgorithmFactory> = LazyLock::new(AlgorithmFactory::with_builtins);

/// Registry resolving an [`AlgorithmType`] to a shared strategy instance.
#[derive(Debug, Clone, Default)]
pub struct AlgorithmFactory {
    registry: HashMap<AlgorithmType, Arc<dyn ShorteningAlgorithm>>,
}

impl AlgorithmFactory {
    /// The process-wide registry holding every built-in strategy.
    pub fn global() -> &'static AlgorithmFactory {
        &GLOBAL
    }

    /// A registry with nothing registered.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry holding every built-in strategy.
    pub fn with_builtins() -> Self {
        let mut factory = Self::empty();
        factory
            .register(Base64Algorithm)
            .register(Sha256Algorithm)
            .register(Base58Algorithm);
        factory
    }

    /// Registers `algorithm` under its own type, replacing any previous entry.
    pub fn register(&mut self, algorithm: impl ShorteningAlgorithm) -> &mut Self {
        self.registry
            .insert(algorithm.algorithm_type(), Arc::new(algorithm));
        self
    }

    /// Returns the strategy registered for `algorithm_type`.
    pub fn get(
        &self,
        algorithm_type: AlgorithmType,
    ) -> Result<Arc<dyn ShorteningAlgorithm>, CoreError> {
        self.registry
            .get(&algorithm_type)
            .cloned()
            .ok_or_else(|| CoreError::UnsupportedAlgorithm(algorithm_type.to_string()))
    }
}

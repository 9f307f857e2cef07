//! Registration of layer builders.
//!
//! A [`LayerRegistry`] is the fixed `LayerId → builder` table handed to the
//! [`LayerCache`](crate::LayerCache). It is built once at startup and checked
//! at construction: registering a layer twice is an error, and
//! [`LayerRegistryBuilder::require_all`] additionally demands a builder for
//! every [`LayerId`].

use choropleth_common::{ChoroplethError, ChoroplethResult, LayerId, LayerResult};
use futures::future::{BoxFuture, FutureExt};
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Future produced by a layer builder.
pub type BuildFuture = BoxFuture<'static, ChoroplethResult<LayerResult>>;

/// Zero-argument asynchronous layer constructor.
pub type LayerBuilder = Arc<dyn Fn() -> BuildFuture + Send + Sync>;

/// Fixed table of layer builders.
#[derive(Clone, Default)]
pub struct LayerRegistry {
    builders: BTreeMap<LayerId, LayerBuilder>,
}

impl LayerRegistry {
    pub fn builder() -> LayerRegistryBuilder {
        LayerRegistryBuilder::default()
    }

    pub fn get(&self, id: LayerId) -> Option<&LayerBuilder> {
        self.builders.get(&id)
    }

    pub fn contains(&self, id: LayerId) -> bool {
        self.builders.contains_key(&id)
    }

    /// Registered ids in `LayerId` order.
    pub fn ids(&self) -> impl Iterator<Item = LayerId> + '_ {
        self.builders.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.builders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }

    pub(crate) fn into_builders(self) -> BTreeMap<LayerId, LayerBuilder> {
        self.builders
    }
}

impl fmt::Debug for LayerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.builders.keys()).finish()
    }
}

/// Collects registrations and validates them in [`build`](Self::build).
#[derive(Default)]
pub struct LayerRegistryBuilder {
    builders: BTreeMap<LayerId, LayerBuilder>,
    duplicates: Vec<LayerId>,
    require_all: bool,
}

impl LayerRegistryBuilder {
    /// Register the builder for `id`.
    pub fn register<F, Fut>(mut self, id: LayerId, builder: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ChoroplethResult<LayerResult>> + Send + 'static,
    {
        let builder: LayerBuilder = Arc::new(move || builder().boxed());
        if self.builders.insert(id, builder).is_some() {
            self.duplicates.push(id);
        }
        self
    }

    /// Fail construction unless every `LayerId` has a builder.
    pub fn require_all(mut self) -> Self {
        self.require_all = true;
        self
    }

    pub fn build(self) -> ChoroplethResult<LayerRegistry> {
        if let Some(id) = self.duplicates.first() {
            return Err(ChoroplethError::DuplicateLayer(*id));
        }

        if self.require_all {
            let missing: Vec<LayerId> = LayerId::ALL
                .into_iter()
                .filter(|id| !self.builders.contains_key(id))
                .collect();
            if !missing.is_empty() {
                return Err(ChoroplethError::UnregisteredLayers(missing));
            }
        }

        Ok(LayerRegistry {
            builders: self.builders,
        })
    }
}

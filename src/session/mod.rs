use crate::geometry::feature::{FeatureBatch, FeatureLayer, GeometryFeature};

/// Layers created during one working session, oldest first.
///
/// Owned by the caller. Builders never see it; only presentation, export and
/// cleanup take it. Appends only, until [`Session::clear`].
#[derive(Debug, Clone, Default)]
pub struct Session {
    layers: Vec<FeatureLayer>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, batch: &FeatureBatch) {
        self.layers.extend(batch.layers().iter().cloned());
    }

    pub fn layers(&self) -> &[FeatureLayer] {
        &self.layers
    }

    pub fn features(&self) -> impl Iterator<Item = &GeometryFeature> {
        self.layers.iter().flat_map(|l| l.features().iter())
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Drops every recorded layer, returning them so the host can unregister.
    pub fn clear(&mut self) -> Vec<FeatureLayer> {
        std::mem::take(&mut self.layers)
    }
}

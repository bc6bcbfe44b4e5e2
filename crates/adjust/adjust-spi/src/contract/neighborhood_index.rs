//! Trait for the spatial-indexing collaborator

/// Resolves the neighbourhood of a spatial cell.
pub trait NeighborhoodIndex: Send + Sync {
    /// All cells within graph distance `k` of `cell`, including `cell` itself.
    fn k_ring(&self, cell: &str, k: u32) -> Vec<String>;
}

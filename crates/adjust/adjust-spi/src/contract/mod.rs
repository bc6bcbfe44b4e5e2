//! Contract module containing trait definitions for price adjustment

mod inversion_strategy;
mod median_source;
mod neighborhood_index;

pub use inversion_strategy::InversionStrategy;
pub use median_source::MedianSource;
pub use neighborhood_index::NeighborhoodIndex;

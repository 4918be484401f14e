//! Spatial indexing for actor queries

pub mod sparse_hash;

pub use sparse_hash::SparseHashGrid;

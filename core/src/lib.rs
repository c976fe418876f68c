pub mod cluster;
pub mod model;
pub mod sample;
pub mod signature;
pub mod tokenizer;
pub mod trie;

pub use cluster::{cluster_captions, ClusterParams, Clustering};
pub use model::{BoundingBox, Caption, Item};
pub use signature::{extract_signature, DocumentFrequencies};
pub use trie::Trie;

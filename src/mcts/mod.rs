pub mod algorithm;
pub mod mcts_result;
pub mod min_max;
pub mod node;
pub mod noise;
pub mod sanitize;
pub mod selection;
pub mod tree;

pub use algorithm::{MuZeroMcts, SearchError};
pub use mcts_result::{apply_temperature, sample_from_distribution, SearchResult, SearchStats};
pub use node::{Edge, Node, NodeId};
pub use tree::SearchTree;

pub mod builder;
pub mod decomposition;
pub mod topology;

pub use builder::{GhostLayout, SubdomainSpec};
pub use decomposition::RankLayout;
pub use topology::{face_bc, Connectivity, FaceAdjacency, HexElement, NodeElemMap};

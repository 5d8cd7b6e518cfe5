pub mod embedding;
pub mod generation;
pub mod qa;
pub mod retry;
pub mod shapes;
pub mod transport;

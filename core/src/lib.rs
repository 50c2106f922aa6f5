pub mod catalogue;
pub mod determinism;
pub mod dispatch;
pub mod dsl;
pub mod engine;
pub mod graph;
pub mod model;
pub mod trace;

pub mod error;

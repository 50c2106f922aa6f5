pub mod checks;
pub mod extract;
pub mod param_graph;

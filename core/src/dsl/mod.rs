pub mod eval;
pub mod expr;

/// Interpreter compatibility tag. A DSL rule must declare exactly this
/// value to be evaluated.
pub const ENGINE_VERSION: &str = "2.0.0";

pub mod exec;
pub mod legacy;

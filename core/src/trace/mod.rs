pub mod artifact;
pub mod caps;
pub mod redact;

pub mod hashing;
pub mod json_canonical;

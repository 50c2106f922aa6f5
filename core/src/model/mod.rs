pub mod doc;
pub mod features;
pub mod finding;

/// Current wall-clock time as an RFC 3339 UTC string.
///
/// The engine itself never calls this: timestamps flow in from callers so
/// that identical inputs produce identical outputs. Binaries use it to mint
/// the request timestamp once per run.
pub fn now_rfc3339_utc() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap()
}

//! Subject-alternative-name normalization

/// Guarantee `localhost` and `127.0.0.1` are present in the SAN lists.
///
/// Adds each missing entry exactly once, preserving the caller's order
/// and never duplicating entries that are already there. Local
/// addresses are required so operator tooling on the node host can
/// always reach it over TLS.
pub fn normalize_sans(domains: &[String], ip_sans: &[String]) -> (Vec<String>, Vec<String>) {
    let mut domains = domains.to_vec();
    if !domains.iter().any(|d| d == "localhost") {
        domains.push("localhost".to_string());
    }
    let mut ip_sans = ip_sans.to_vec();
    if !ip_sans.iter().any(|ip| ip == "127.0.0.1") {
        ip_sans.push("127.0.0.1".to_string());
    }
    (domains, ip_sans)
}

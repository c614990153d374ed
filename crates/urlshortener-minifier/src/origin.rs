/// Returns `scheme://authority/` for an absolute URL, or `None` when the
/// URL lacks a scheme or an authority.
///
/// The authority is copied verbatim: host case, user info and ports (even
/// default or out-of-range ones) are kept. Only the scheme is lowercased.
pub fn origin_of(url: &str) -> Option<String> {
    let (scheme, authority) = split_origin(url)?;
    Some(format!("{}://{authority}/", scheme.to_ascii_lowercase()))
}

/// Whether `url` has both a scheme and an authority.
pub fn is_absolute_url(url: &str) -> bool {
    split_origin(url).is_some()
}

fn split_origin(url: &str) -> Option<(&str, &str)> {
    let (scheme, rest) = url.split_once(':')?;
    if !is_scheme(scheme) {
        return None;
    }

    let rest = rest.strip_prefix("//")?;
    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let authority = &rest[..end];
    if authority.is_empty() {
        return None;
    }

    Some((scheme, authority))
}

/// `ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )`
fn is_scheme(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

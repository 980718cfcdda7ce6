use crate::error::InputError;

const SITE_ID_MARKER: &str = "siteid=";

/// Derives the site key of a document URL.
///
/// URLs carrying a `siteid=` parameter are keyed by the `{...}` value after
/// its last occurrence. Anything else is keyed by its first four characters
/// (the scheme prefix) followed by the host.
pub fn site_key(url: &str) -> Result<String, InputError> {
    let malformed = || InputError::SiteKey(url.to_string());

    if let Some(pos) = url.rfind(SITE_ID_MARKER) {
        let tail = &url[pos + SITE_ID_MARKER.len()..];
        let open = tail.find('{').ok_or_else(malformed)?;
        let inner = &tail[open + 1..];
        let close = inner.find('}').ok_or_else(malformed)?;
        return Ok(inner[..close].to_string());
    }

    let host_start = url.find("//").ok_or_else(malformed)? + 2;
    let host = url[host_start..].split('/').next().unwrap_or_default();
    if host.is_empty() {
        return Err(malformed());
    }
    let prefix_end = url.char_indices().nth(4).map_or(url.len(), |(i, _)| i);
    Ok(format!("{}{host}", &url[..prefix_end]))
}

use url::Url;

/// True iff `text` is an absolute `http`/`https` URL.
pub fn is_link_like(text: &str) -> bool {
    match Url::parse(text) {
        Ok(url) => matches!(url.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

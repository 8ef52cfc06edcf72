pub mod artist;
pub mod genre;
pub mod show;
pub mod venue;

use serde::Serialize;

/// A requested record does not exist. The HTTP layer maps this to a 404;
/// every other error collapses to a generic failure response.
#[derive(Debug, thiserror::Error)]
#[error("{0} not found")]
pub struct NotFound(pub String);

/// Name-search response for venues and artists.
#[derive(Debug, Serialize)]
pub struct SearchResults<T> {
    pub count: usize,
    pub data: Vec<T>,
}

/// Optional form fields arrive as empty strings; store them as absent instead.
pub(crate) fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_to_none() {
        assert_eq!(blank_to_none(None), None);
        assert_eq!(blank_to_none(Some(String::new())), None);
        assert_eq!(
            blank_to_none(Some("555-1234".to_string())),
            Some("555-1234".to_string())
        );
    }
}

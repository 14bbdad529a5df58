use axum::http::header::HeaderMap;

use crate::filtering::config::DEFAULT_PAGE;

/// Normalized page and page size. Both are always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
}

impl Pagination {
    /// `(page - 1) * limit`, saturating.
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

/// Parse a positive integer leniently: decimals floor, anything that does
/// not yield at least 1 is `None`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn parse_positive(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    if let Ok(value) = raw.parse::<u64>() {
        return (value > 0).then_some(value);
    }
    let value = raw.parse::<f64>().ok()?;
    if value.is_finite() && value >= 1.0 {
        // Saturates at u64::MAX
        Some(value.floor() as u64)
    } else {
        None
    }
}

pub fn parse_page(raw: Option<&str>) -> u64 {
    raw.and_then(parse_positive).unwrap_or(DEFAULT_PAGE)
}

pub fn parse_limit(raw: Option<&str>, default_limit: u64) -> u64 {
    raw.and_then(parse_positive).unwrap_or(default_limit)
}

/// Sanitize resource name by removing control characters for HTTP headers
fn sanitize_resource_name(name: &str) -> String {
    name.chars().filter(|c| c.is_ascii() && !c.is_ascii_control()).collect()
}

/// Build the `Content-Range` header for a page of results.
///
/// The range end is clamped to the last existing item. A page that starts
/// past the last item, including any page of an empty result, has no range
/// and reads `spells */5`.
#[must_use]
pub fn calculate_content_range(
    offset: u64,
    limit: u64,
    total_count: u64,
    resource_name: &str,
) -> HeaderMap {
    // Sanitize resource name to prevent header injection
    let safe_name = sanitize_resource_name(resource_name);
    let content_range = if offset >= total_count {
        format!("{safe_name} */{total_count}")
    } else {
        let last = offset
            .saturating_add(limit)
            .saturating_sub(1)
            .min(total_count - 1);
        format!("{safe_name} {offset}-{last}/{total_count}")
    };

    let mut headers = HeaderMap::new();
    if let Ok(value) = content_range.parse() {
        headers.insert("Content-Range", value);
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset() {
        assert_eq!(Pagination { page: 1, limit: 20 }.offset(), 0);
        assert_eq!(Pagination { page: 2, limit: 10 }.offset(), 10);
        assert_eq!(Pagination { page: u64::MAX, limit: u64::MAX }.offset(), u64::MAX);
    }

    #[test]
    fn test_page_is_lenient() {
        assert_eq!(parse_page(None), 1);
        assert_eq!(parse_page(Some("3")), 3);
        assert_eq!(parse_page(Some("abc")), 1);
        assert_eq!(parse_page(Some("0")), 1);
        assert_eq!(parse_page(Some("-2")), 1);
        assert_eq!(parse_page(Some("2.7")), 2);
        assert_eq!(parse_page(Some("0.5")), 1);
    }

    #[test]
    fn test_limit_falls_back_to_default() {
        assert_eq!(parse_limit(None, 20), 20);
        assert_eq!(parse_limit(Some("50"), 20), 50);
        assert_eq!(parse_limit(Some("-5"), 20), 20);
        assert_eq!(parse_limit(Some(""), 25), 25);
    }

    #[test]
    fn test_content_range_normal() {
        let headers = calculate_content_range(0, 10, 100, "spells");
        let value = headers.get("Content-Range").unwrap().to_str().unwrap();
        assert_eq!(value, "spells 0-9/100");
    }

    #[test]
    fn test_content_range_last_page() {
        let headers = calculate_content_range(20, 10, 25, "spells");
        let value = headers.get("Content-Range").unwrap().to_str().unwrap();
        assert_eq!(value, "spells 20-24/25");
    }

    #[test]
    fn test_content_range_strips_control_characters() {
        let headers = calculate_content_range(0, 10, 100, "spells\r\nInjected: evil");
        let value = headers.get("Content-Range").unwrap().to_str().unwrap();
        assert!(!value.contains('\r'));
        assert!(!value.contains('\n'));
    }

    #[test]
    fn test_content_range_zero_items() {
        let headers = calculate_content_range(0, 10, 0, "spells");
        let value = headers.get("Content-Range").unwrap().to_str().unwrap();
        assert_eq!(value, "spells */0");
    }

    #[test]
    fn test_content_range_past_last_item() {
        let headers = calculate_content_range(40, 10, 5, "spells");
        let value = headers.get("Content-Range").unwrap().to_str().unwrap();
        assert_eq!(value, "spells */5");

        let headers = calculate_content_range(5, 10, 5, "spells");
        let value = headers.get("Content-Range").unwrap().to_str().unwrap();
        assert_eq!(value, "spells */5");
    }
}

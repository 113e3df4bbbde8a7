//! Method name to URI segment conversion.

/// Converts an UpperCamel method name into a lower-case, hyphenated segment.
///
/// A hyphen is inserted before every upper-case letter except the first
/// character: `GetUserList` → `get-user-list`, `Index` → `index`.
pub fn method_name_to_segment(name: &str) -> String {
    let mut segment = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if i > 0 && c.is_uppercase() {
            segment.push('-');
        }
        segment.extend(c.to_lowercase());
    }
    segment
}

/// Appends a method name to a base URI as its own path segment.
///
/// Trailing slashes on the base are collapsed, and the derived URI always
/// ends in `/`.
pub fn append_method_name(uri: &str, name: &str) -> String {
    let base = uri.trim_end_matches('/');
    format!("{base}/{}/", method_name_to_segment(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_conversion() {
        assert_eq!(method_name_to_segment("GetUserList"), "get-user-list");
        assert_eq!(method_name_to_segment("Index"), "index");
        assert_eq!(method_name_to_segment("ShowHTML"), "show-h-t-m-l");
        assert_eq!(method_name_to_segment("lower"), "lower");
    }

    #[test]
    fn test_append_method_name() {
        assert_eq!(append_method_name("/api", "GetUserList"), "/api/get-user-list/");
        assert_eq!(append_method_name("/api//", "Show"), "/api/show/");
        assert_eq!(append_method_name("/", "Show"), "/show/");
    }
}

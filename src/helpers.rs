use percent_encoding::percent_decode_str;
use std::borrow::Cow;
use std::str::Utf8Error;

pub(crate) fn percent_decode_request_path(val: &str) -> Result<Cow<'_, str>, Utf8Error> {
    percent_decode_str(val).decode_utf8()
}

/// Strips one trailing `/`, except for the root path itself.
pub(crate) fn trim_trailing_slash(path: &str) -> &str {
    if path.len() > 1 && path.ends_with('/') {
        &path[..path.len() - 1]
    } else {
        path
    }
}

/// Length of the longest common byte prefix of `a` and `b`.
pub(crate) fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_one_trailing_slash_only() {
        assert_eq!(trim_trailing_slash("/"), "/");
        assert_eq!(trim_trailing_slash("/a/"), "/a");
        assert_eq!(trim_trailing_slash("/a//"), "/a/");
        assert_eq!(trim_trailing_slash("/a"), "/a");
    }

    #[test]
    fn decodes_percent_escapes() {
        assert_eq!(percent_decode_request_path("/hello%20world").unwrap(), "/hello world");
        assert!(percent_decode_request_path("/%ff%fe").is_err());
    }

    #[test]
    fn common_prefix() {
        assert_eq!(common_prefix_len(b"/initfoo", b"/initbar"), 5);
        assert_eq!(common_prefix_len(b"/a", b"/a"), 2);
        assert_eq!(common_prefix_len(b"", b"/a"), 0);
    }
}

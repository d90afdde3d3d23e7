//! Path normalization helpers
//!
//! Host paths use `|` between hierarchy levels, `:` for namespaces and `.`
//! for plugs. Renderer-side entity tables and output files need a
//! filesystem-safe form.

/// Replace namespace, hierarchy and plug separators with underscores
///
/// `:` becomes `__`, `|` and `.` become `_`.
#[must_use]
pub fn normalize(path: &str) -> String {
    path.replace(':', "__").replace(['|', '.'], "_")
}

/// Render the `/`-separated hierarchy form with a leading slash
///
/// Namespace separators collapse to `_`; empty segments are dropped.
#[must_use]
pub fn hierarchy(path: &str) -> String {
    let mut out = String::new();
    for part in path.split('|').filter(|p| !p.is_empty()) {
        out.push('/');
        out.push_str(&part.replace(':', "_"));
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_replaces_separators() {
        assert_eq!(normalize("|ns:group|shape.out"), "_ns__group_shape_out");
    }

    #[test]
    fn test_hierarchy_form() {
        assert_eq!(hierarchy("|bla|blubb|dingensShape"), "/bla/blubb/dingensShape");
        assert_eq!(hierarchy("ns:top|child"), "/ns_top/child");
    }

    #[test]
    fn test_hierarchy_of_empty_path_is_root() {
        assert_eq!(hierarchy(""), "/");
    }
}

pub(crate) fn urljoin(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let base = base.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_paths() {
        assert_eq!(urljoin("https://h/v3/", "query"), "https://h/v3/query");
        assert_eq!(urljoin("https://h/v3", "/datalayers"), "https://h/v3/datalayers");
        assert_eq!(urljoin("https://h/v3", "https://other/x"), "https://other/x");
    }
}

use core::fmt;

/// Header map with case-insensitive lookup.
///
/// Entries keep insertion order so a serialized response is byte-for-byte
/// stable. Inserting a name that is already present replaces its value in
/// place (last write wins) and adopts the new spelling of the name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn insert(&mut self, k: &str, v: &str) -> Option<String> {
        match self.position(k) {
            Some(i) => {
                let (name, value) = &mut self.0[i];
                *name = k.to_string();
                Some(std::mem::replace(value, v.to_string()))
            }
            None => {
                self.0.push((k.to_string(), v.to_string()));
                None
            }
        }
    }

    pub fn get(&self, k: &str) -> Option<&str> {
        self.position(k).map(|i| self.0[i].1.as_str())
    }

    /// Like [`Headers::get`], but `None` when the value holds an ASCII
    /// control character other than HTAB. Use it for anything echoed back
    /// into a response head.
    pub fn get_printable(&self, k: &str) -> Option<&str> {
        self.get(k)
            .filter(|v| !v.chars().any(|c| c.is_ascii_control() && c != '\t'))
    }

    pub fn contains(&self, k: &str) -> bool {
        self.position(k).is_some()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn position(&self, k: &str) -> Option<usize> {
        self.0.iter().position(|(name, _)| name.eq_ignore_ascii_case(k))
    }

    /// Splits one raw header line on its first ':'.
    ///
    /// Returns `None` for blank lines and for lines with no ':' at all;
    /// callers drop those without complaint.
    pub fn parse_line(line: &str) -> Option<(&str, &str)> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return None;
        }
        let (field_name, field_value) = line.split_once(':')?;
        Some((field_name.trim(), field_value.trim()))
    }

    /// Builds a map from every line following the request line.
    pub fn from_lines<'a, I>(lines: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut headers = Self::new();
        for line in lines {
            if let Some((name, value)) = Self::parse_line(line) {
                headers.insert(name, value);
            }
        }
        headers
    }
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (k, v) in &self.0 {
            write!(f, "{}: {}\r\n", k, v)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn headers_basics() {
        let lines = [
            "Host: localhost:4221",
            "       User-Agent:    curl/8.5.0   ",
            "",
            "no separator here",
            "Accept: */*",
        ];
        let headers = Headers::from_lines(lines);

        assert_eq!(headers.len(), 3);
        assert_eq!(headers.get("Host"), Some("localhost:4221"));
        assert_eq!(headers.get("User-Agent"), Some("curl/8.5.0"));
        assert_eq!(headers.get("Accept"), Some("*/*"));
        assert!(!headers.contains("no separator here"));
    }

    #[test]
    fn splits_on_first_colon_only() {
        assert_eq!(
            Headers::parse_line("Status: 200: still text"),
            Some(("Status", "200: still text"))
        );
        assert_eq!(Headers::parse_line("X-Empty:"), Some(("X-Empty", "")));
        assert_eq!(Headers::parse_line("   \r\n"), None);
        assert_eq!(Headers::parse_line("Host localhost"), None);
    }

    #[test]
    fn lookup_ignores_case() {
        let headers =
            Headers::from_lines(["user-agent: test-client/1.0", "ACCEPT-ENCODING: gzip"]);
        assert_eq!(headers.get("User-Agent"), Some("test-client/1.0"));
        assert_eq!(headers.get("accept-encoding"), Some("gzip"));
        assert!(headers.contains("Accept-Encoding"));
    }

    #[test]
    fn printable_lookup_skips_control_characters() {
        let headers = Headers::from_lines([
            "Content-Type: text/html\rX-Injected: 1",
            "Status: x \u{0}Teapot",
            "Accept: text/plain;\tq=1",
        ]);
        assert_eq!(headers.get("Content-Type"), Some("text/html\rX-Injected: 1"));
        assert_eq!(headers.get_printable("Content-Type"), None);
        assert_eq!(headers.get_printable("Status"), None);
        assert_eq!(headers.get_printable("Accept"), Some("text/plain;\tq=1"));
        assert_eq!(headers.get_printable("Missing"), None);
    }

    #[test]
    fn last_duplicate_wins() {
        let headers = Headers::from_lines([
            "Content-Type: text/plain",
            "Host: example",
            "content-type: application/json",
        ]);
        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("Content-Type"), Some("application/json"));
        // replaced in place, so order is stable
        assert_eq!(
            headers.to_string(),
            "content-type: application/json\r\nHost: example\r\n"
        );
    }

    #[test]
    fn display_keeps_insertion_order() {
        let mut headers = Headers::new();
        headers.insert("Content-Type", "text/plain");
        headers.insert("Content-Encoding", "gzip");
        headers.insert("Content-Length", "23");
        assert_eq!(
            headers.to_string(),
            "Content-Type: text/plain\r\nContent-Encoding: gzip\r\nContent-Length: 23\r\n"
        );
        assert_eq!(Headers::new().to_string(), "");
    }
}

/// Framework-neutral view of an inbound HTTP request.
///
/// Carries exactly what token extraction and query-string-hash
/// computation need. Adapters build it from their framework's request
/// type; parameter values are stored already decoded.
#[derive(Debug, Clone, Default)]
pub struct InboundRequest {
    /// HTTP method, any casing.
    pub method: String,

    /// Request path, without the query string.
    pub path: String,

    /// Decoded query parameters in arrival order. Repeated keys stay
    /// repeated.
    pub query: Vec<(String, String)>,

    /// Decoded body parameters for form or JSON-object bodies. Empty
    /// when the request carries no parseable body.
    pub body_params: Vec<(String, String)>,

    /// Request headers. Lookup is case-insensitive.
    pub headers: Vec<(String, String)>,
}

impl InboundRequest {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Default::default()
        }
    }

    /// First query value under `name`, if any.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// First body value under `name`, if any.
    pub fn body_param(&self, name: &str) -> Option<&str> {
        self.body_params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let mut request = InboundRequest::new("GET", "/");
        request
            .headers
            .push(("Authorization".to_string(), "JWT abc".to_string()));

        assert_eq!(request.header("authorization"), Some("JWT abc"));
        assert_eq!(request.header("AUTHORIZATION"), Some("JWT abc"));
        assert_eq!(request.header("x-missing"), None);
    }

    #[test]
    fn test_query_param_returns_first_value() {
        let mut request = InboundRequest::new("GET", "/");
        request.query.push(("a".to_string(), "1".to_string()));
        request.query.push(("a".to_string(), "2".to_string()));

        assert_eq!(request.query_param("a"), Some("1"));
        assert_eq!(request.query_param("b"), None);
    }
}

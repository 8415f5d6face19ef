//! Token list (classList)
//!
//! Space-separated token set used for class attribute diffing.

/// Ordered set of space-separated tokens (e.g. a class list)
#[derive(Debug, Clone, Default)]
pub struct TokenList {
    tokens: Vec<String>,
}

impl TokenList {
    /// Create an empty token list
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a space-separated string
    pub fn from_string(s: &str) -> Self {
        let mut list = Self::new();
        for token in s.split_whitespace() {
            list.add(token);
        }
        list
    }

    /// Number of tokens
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Check if the list is empty
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Check if a token exists
    pub fn contains(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t == token)
    }

    /// Add a token if not already present
    pub fn add(&mut self, token: &str) {
        if !token.is_empty() && !self.contains(token) {
            self.tokens.push(token.to_string());
        }
    }

    /// Remove a token, returning whether it was present
    pub fn remove(&mut self, token: &str) -> bool {
        let before = self.tokens.len();
        self.tokens.retain(|t| t != token);
        self.tokens.len() != before
    }

    /// Get value as a space-joined string
    pub fn value(&self) -> String {
        self.tokens.join(" ")
    }

    /// Replace all tokens from a space-separated string
    pub fn set_value(&mut self, value: &str) {
        *self = Self::from_string(value);
    }

    /// Iterate over tokens
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(|s| s.as_str())
    }
}

impl std::fmt::Display for TokenList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_string() {
        let list = TokenList::from_string("btn btn-primary active");
        assert_eq!(list.len(), 3);
        assert!(list.contains("btn"));
        assert!(list.contains("active"));
    }

    #[test]
    fn test_add_dedupes() {
        let mut list = TokenList::new();
        list.add("foo");
        list.add("foo");
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut list = TokenList::from_string("a b c");
        assert!(list.remove("b"));
        assert!(!list.remove("b"));
        assert_eq!(list.value(), "a c");
    }
}

//! Identifier derivation for compiled types, properties and namespaces.

use crate::error::CompileError;
use std::collections::HashSet;
use std::path::PathBuf;

/// Words that cannot be used as identifiers.
const RESERVED: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "crate",
    "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl",
    "in", "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub",
    "ref", "return", "self", "Self", "static", "struct", "super", "trait", "true", "try", "type",
    "typeof", "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
];

fn is_separator(c: char) -> bool {
    matches!(c, '_' | '-' | '.' | ' ')
}

/// Converts a string to snake_case.
///
/// Acronyms stay together: `partyID` becomes `party_id`, `NAD` becomes
/// `nad`.
#[must_use]
pub fn to_snake_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if is_separator(c) {
            if !result.is_empty() && !result.ends_with('_') {
                result.push('_');
            }
            continue;
        }
        if c.is_uppercase() && i > 0 && !result.ends_with('_') {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_lower) {
                result.push('_');
            }
        }
        result.extend(c.to_lowercase());
    }

    while result.ends_with('_') {
        result.pop();
    }
    result
}

/// Converts a string to PascalCase.
#[must_use]
pub fn to_pascal_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut capitalize_next = true;

    for c in s.chars() {
        if is_separator(c) {
            capitalize_next = true;
        } else if capitalize_next {
            result.extend(c.to_uppercase());
            capitalize_next = false;
        } else {
            result.push(c);
        }
    }

    result
}

fn check_identifier(name: &str, identifier: String) -> Result<String, CompileError> {
    let Some(first) = identifier.chars().next() else {
        return Err(CompileError::illegal_identifier(name, "empty name"));
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return Err(CompileError::illegal_identifier(
            name,
            "must start with a letter",
        ));
    }
    if !identifier
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(CompileError::illegal_identifier(
            name,
            "contains invalid characters",
        ));
    }
    if RESERVED.contains(&identifier.as_str()) {
        return Err(CompileError::illegal_identifier(name, "reserved word"));
    }
    Ok(identifier)
}

/// Derives a type identifier from a schema name.
///
/// # Errors
/// Returns [`CompileError::IllegalIdentifier`] if the result is empty,
/// starts with a digit, contains invalid characters or is reserved.
pub fn type_identifier(name: &str) -> Result<String, CompileError> {
    check_identifier(name, to_pascal_case(name))
}

/// Derives a property identifier from a schema name.
///
/// # Errors
/// Same as [`type_identifier`].
pub fn property_identifier(name: &str) -> Result<String, CompileError> {
    check_identifier(name, to_snake_case(name))
}

/// Derives a namespace segment from a message name.
///
/// # Errors
/// Same as [`type_identifier`].
pub fn namespace_segment(name: &str) -> Result<String, CompileError> {
    check_identifier(name, to_snake_case(name).to_lowercase())
}

/// Checks every dot-separated segment of a namespace.
///
/// # Errors
/// Returns [`CompileError::IllegalIdentifier`] for an empty or invalid
/// segment.
pub fn validate_namespace(namespace: &str) -> Result<(), CompileError> {
    for segment in namespace.split('.') {
        check_identifier(namespace, segment.to_string())?;
    }
    Ok(())
}

/// Returns the directory of a namespace relative to the output root.
#[must_use]
pub fn namespace_dir(namespace: &str) -> PathBuf {
    namespace.split('.').collect()
}

/// Returns the logical `/`-separated path of a namespace.
#[must_use]
pub fn namespace_path(namespace: &str) -> String {
    format!("/{}", namespace.replace('.', "/"))
}

/// Claims unique names within one scope.
///
/// A name already taken gets the lowest free numeric suffix, starting at 2.
#[derive(Debug, Default, Clone)]
pub struct NameScope {
    used: HashSet<String>,
}

impl NameScope {
    /// Creates an empty scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `base`, or `base` + `separator` + suffix if it is taken.
    pub fn claim(&mut self, base: String, separator: &str) -> String {
        if self.used.insert(base.clone()) {
            return base;
        }
        let mut n = 2u32;
        loop {
            let candidate = format!("{base}{separator}{n}");
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_snake_case() {
        assert_eq!(to_snake_case("documentName"), "document_name");
        assert_eq!(to_snake_case("NAD"), "nad");
        assert_eq!(to_snake_case("partyID"), "party_id");
        assert_eq!(to_snake_case("HTTPServer"), "http_server");
        assert_eq!(to_snake_case("NameAndAddress"), "name_and_address");
        assert_eq!(to_snake_case("party-id"), "party_id");
        assert_eq!(to_snake_case("line2Item"), "line2_item");
        assert_eq!(to_snake_case("_x_"), "x");
    }

    #[test]
    fn test_to_pascal_case() {
        assert_eq!(to_pascal_case("party"), "Party");
        assert_eq!(to_pascal_case("name-and_address"), "NameAndAddress");
        assert_eq!(to_pascal_case("ORDERS"), "ORDERS");
        assert_eq!(to_pascal_case("documentName"), "DocumentName");
    }

    #[test]
    fn test_illegal_identifiers() {
        assert!(type_identifier("party").is_ok());
        assert!(matches!(
            type_identifier("1party"),
            Err(CompileError::IllegalIdentifier { reason: "must start with a letter", .. })
        ));
        assert!(matches!(
            property_identifier("amount$"),
            Err(CompileError::IllegalIdentifier { reason: "contains invalid characters", .. })
        ));
        assert!(matches!(
            property_identifier("type"),
            Err(CompileError::IllegalIdentifier { reason: "reserved word", .. })
        ));
        assert!(matches!(
            property_identifier("--"),
            Err(CompileError::IllegalIdentifier { reason: "empty name", .. })
        ));
    }

    #[test]
    fn test_namespace() {
        assert!(validate_namespace("com.acme.edi").is_ok());
        assert!(validate_namespace("com..edi").is_err());
        assert!(validate_namespace("com.1acme").is_err());
        assert_eq!(namespace_segment("ORDERS").unwrap(), "orders");
        assert_eq!(namespace_dir("com.acme"), PathBuf::from("com").join("acme"));
        assert_eq!(namespace_path("com.acme.common"), "/com/acme/common");
    }

    #[test]
    fn test_name_scope() {
        let mut scope = NameScope::new();
        assert_eq!(scope.claim("Party".to_string(), ""), "Party");
        assert_eq!(scope.claim("Party".to_string(), ""), "Party2");
        assert_eq!(scope.claim("Party".to_string(), ""), "Party3");

        let mut props = NameScope::new();
        assert_eq!(props.claim("id".to_string(), "_"), "id");
        assert_eq!(props.claim("id".to_string(), "_"), "id_2");
    }
}

//! Capability listings reported by the server: parsers, detectors and MIME types.

use crate::{Result, TikaError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A Tika parser. Composite parsers delegate to their `children`.
///
/// To list every available parser, walk the tree with [`Parser::iter`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parser {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub decorated: bool,
    #[serde(default)]
    pub composite: bool,
    #[serde(default)]
    pub children: Vec<Parser>,
    #[serde(default)]
    pub supported_types: Vec<String>,
}

/// A Tika detector, used to find the MIME type of a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detector {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub composite: bool,
    #[serde(default)]
    pub children: Vec<Detector>,
}

/// Properties of a single MIME type known to the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MimeType {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alias: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supertype: Option<String>,
}

/// MIME type name to its properties, as returned by `/mime-types`.
pub type MimeTypeRegistry = BTreeMap<String, MimeType>;

macro_rules! tree_iter {
    ($node:ty, $iter:ident) => {
        impl $node {
            /// Depth-first, pre-order walk over this node and all descendants.
            pub fn iter(&self) -> $iter<'_> {
                $iter { stack: vec![self] }
            }
        }

        pub struct $iter<'a> {
            stack: Vec<&'a $node>,
        }

        impl<'a> Iterator for $iter<'a> {
            type Item = &'a $node;

            fn next(&mut self) -> Option<Self::Item> {
                let node = self.stack.pop()?;
                self.stack.extend(node.children.iter().rev());
                Some(node)
            }
        }
    };
}

tree_iter!(Parser, ParserIter);
tree_iter!(Detector, DetectorIter);

impl Parser {
    /// Every MIME type supported anywhere in this tree, deduplicated and sorted.
    pub fn all_supported_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self
            .iter()
            .flat_map(|p| p.supported_types.iter().map(String::as_str))
            .collect();
        types.sort_unstable();
        types.dedup();
        types
    }
}

/// Decode a capability listing, which must be a JSON object at the top level.
///
/// serde would otherwise accept a JSON array for structs whose fields all
/// have defaults.
pub(crate) fn from_json_object<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    let value: serde_json::Value = serde_json::from_slice(body)?;
    if !value.is_object() {
        return Err(TikaError::decoding(format!(
            "expected a JSON object, got {}",
            truncate_for_display(&value.to_string())
        )));
    }
    Ok(serde_json::from_value(value)?)
}

fn truncate_for_display(text: &str) -> &str {
    match text.char_indices().nth(64) {
        Some((cut, _)) => &text[..cut],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parser_minimal() {
        let parser: Parser = serde_json::from_str(r#"{"name":"TestParser"}"#).unwrap();
        assert_eq!(
            parser,
            Parser {
                name: "TestParser".to_string(),
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_parser_nested_with_flags() {
        let parser: Parser = serde_json::from_str(
            r#"{
                "name":"TestParser",
                "supportedTypes":["test-type"],
                "children":[
                    {
                        "supportedTypes":["test-type-two"],
                        "name":"TestSubParser",
                        "decorated":true,
                        "composite":false
                    }
                ],
                "decorated":false,
                "composite":true}"#,
        )
        .unwrap();

        assert!(parser.composite);
        assert!(!parser.decorated);
        assert_eq!(parser.supported_types, vec!["test-type".to_string()]);
        assert_eq!(parser.children.len(), 1);
        assert!(parser.children[0].decorated);
        assert!(parser.children[0].children.is_empty());
        assert_eq!(parser.all_supported_types(), vec!["test-type", "test-type-two"]);
    }

    #[test]
    fn test_parser_iter_is_preorder() {
        let parser: Parser = serde_json::from_str(
            r#"{"name":"root","children":[
                {"name":"a","children":[{"name":"a1"}]},
                {"name":"b"}
            ]}"#,
        )
        .unwrap();
        let names: Vec<&str> = parser.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["root", "a", "a1", "b"]);
    }

    #[test]
    fn test_parser_rejects_top_level_array() {
        let err = from_json_object::<Parser>(br#"["test"]"#).unwrap_err();
        assert!(matches!(err, TikaError::Decoding { .. }));
        assert!(from_json_object::<Parser>(b"").is_err());
        assert!(from_json_object::<Parser>(b"invalid").is_err());
    }

    #[test]
    fn test_detector_rejects_top_level_array() {
        assert!(from_json_object::<Detector>(br#"["test"]"#).is_err());
        assert!(from_json_object::<Detector>(br#"{"name":"d"}"#).is_ok());
    }

    #[test]
    fn test_detector_defaults() {
        let detector: Detector = serde_json::from_str(
            r#"{"name":"TestDetector","children":[{"name":"TestSubDetector","composite":false}],"composite":true}"#,
        )
        .unwrap();
        assert!(detector.composite);
        assert_eq!(detector.children[0].name, "TestSubDetector");
        assert!(!detector.children[0].composite);
        assert_eq!(detector.iter().count(), 2);
    }

    #[test]
    fn test_mime_types() {
        let registry: MimeTypeRegistry = serde_json::from_str(
            r#"{"empty-mime":{},"super-alias":{"alias":["alias1","alias2"],"supertype":"super-mime"}}"#,
        )
        .unwrap();
        assert_eq!(registry["empty-mime"], MimeType::default());
        assert_eq!(registry["super-alias"].alias, vec!["alias1".to_string(), "alias2".to_string()]);
        assert_eq!(registry["super-alias"].supertype.as_deref(), Some("super-mime"));
    }

    #[test]
    fn test_mime_types_reject_array() {
        assert!(from_json_object::<MimeTypeRegistry>(br#"["test"]"#).is_err());
        assert!(from_json_object::<MimeTypeRegistry>(b"").is_err());
    }
}

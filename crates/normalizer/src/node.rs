//! Shape-tagged view over untyped response values

use serde_json::{Map, Value};

/// One value of a search response, tagged by the shapes the normalizer
/// knows how to read.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Node<'a> {
    Missing,
    Text(&'a str),
    List(&'a [Value]),
    Object(&'a Map<String, Value>),
    /// Numbers and booleans
    Scalar(&'a Value),
}

impl<'a> Node<'a> {
    pub(crate) fn new(value: &'a Value) -> Self {
        match value {
            Value::Null => Node::Missing,
            Value::String(text) => Node::Text(text),
            Value::Array(items) => Node::List(items),
            Value::Object(map) => Node::Object(map),
            other => Node::Scalar(other),
        }
    }

    /// Child under `key`; anything but an object has no children
    pub(crate) fn get(self, key: &str) -> Node<'a> {
        match self {
            Node::Object(map) => map.get(key).map_or(Node::Missing, Node::new),
            _ => Node::Missing,
        }
    }

    pub(crate) fn at(self, path: &[&str]) -> Node<'a> {
        path.iter().fold(self, |node, key| node.get(key))
    }

    /// Elements of a list, a lone value as a one-element list, nothing for a missing value
    pub(crate) fn one_or_many(self) -> Vec<Node<'a>> {
        match self {
            Node::Missing => Vec::new(),
            Node::List(items) => items.iter().map(Node::new).collect(),
            other => vec![other],
        }
    }

    /// Trimmed, non-empty text of a string or scalar
    pub(crate) fn text(self) -> Option<String> {
        match self {
            Node::Text(text) => non_empty(text),
            Node::Scalar(value) => Some(value.to_string()),
            _ => None,
        }
    }

    /// Like [`Node::text`], but a list of texts is joined with spaces
    pub(crate) fn flat_text(self) -> Option<String> {
        match self {
            Node::List(_) => {
                let parts: Vec<String> = self.one_or_many().into_iter().filter_map(Node::text).collect();
                non_empty(&parts.join(" "))
            }
            other => other.text(),
        }
    }

    /// Text under the first key that has one
    pub(crate) fn first_text(self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| self.get(key).text())
    }

    pub(crate) fn is_missing(self) -> bool {
        matches!(self, Node::Missing)
    }
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_one_or_many_tolerates_single_object() {
        let single = json!({"a": {"name": "x"}});
        let list = json!({"a": [{"name": "x"}]});
        assert_eq!(Node::new(&single).get("a").one_or_many().len(), 1);
        assert_eq!(Node::new(&list).get("a").one_or_many().len(), 1);
        assert!(Node::new(&single).get("b").one_or_many().is_empty());
    }

    #[test]
    fn test_text_shapes() {
        let value = json!({"s": "  hi ", "n": 20230601, "blank": "  ", "l": ["a", "", "b"]});
        let node = Node::new(&value);
        assert_eq!(node.get("s").text().as_deref(), Some("hi"));
        assert_eq!(node.get("n").text().as_deref(), Some("20230601"));
        assert_eq!(node.get("blank").text(), None);
        assert_eq!(node.get("l").text(), None);
        assert_eq!(node.get("l").flat_text().as_deref(), Some("a b"));
    }

    #[test]
    fn test_path_through_non_object_is_missing() {
        let value = json!({"a": "text"});
        assert!(Node::new(&value).at(&["a", "b", "c"]).is_missing());
    }
}

//! Description nodes: one parsed XML element and its property bag
//!
//! Every typed description (device, service, icon, action...) embeds a
//! [`DescriptionNode`] holding the raw text of its leaf child elements, and
//! implements [`Description`] to say which element it parses, which of those
//! raw properties it exposes through typed accessors, and which child elements
//! it parses as structured sub-descriptions instead of flat text.

use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::io::BufRead;
use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;
use tracing::trace;

use crate::error::{DescriptionError, Result};
use crate::ordered_map::OrderedMap;
use crate::reader::{DescriptionReader, Token};

/// Raw property bag of one parsed element
///
/// Keys are child element names (or `@attribute` names of the element
/// itself); values are the raw text. Accessors never fail: a missing or
/// unparsable value yields the caller's default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DescriptionNode {
    properties: OrderedMap<String, String>,
}

impl DescriptionNode {
    /// Create an empty node for incremental population
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a property, overwriting any earlier value for the same name
    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.properties.set(name.into(), value.into());
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    /// All properties in document order
    pub fn properties(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn get_string<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.property(name).unwrap_or(default)
    }

    pub fn get_int(&self, name: &str, default: i64) -> i64 {
        self.property(name)
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(default)
    }

    pub fn get_double(&self, name: &str, default: f64) -> f64 {
        self.property(name)
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(default)
    }
}

/// Child recognizer for descriptions that parse every child as flat text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoChildren {}

/// A typed description parsed from one XML element
///
/// Implementors declare their element name, the raw property names their
/// accessors read, and a closed set of child elements (`Child`) that are
/// parsed as structured sub-descriptions.
pub trait Description: Sized + 'static {
    /// Element name this description is parsed from
    const ELEMENT: &'static str;

    /// Raw property names claimed by this type's accessors
    const PROPERTIES: &'static [&'static str];

    /// Child elements parsed as sub-descriptions
    type Child: Copy;

    /// An empty description, before any input has been read
    fn empty() -> Self;

    fn node(&self) -> &DescriptionNode;

    fn node_mut(&mut self) -> &mut DescriptionNode;

    /// Map a direct child element name to a structured child, if any
    fn recognize(name: &str) -> Option<Self::Child>;

    /// Parse a recognized child; the reader is positioned on its start element
    fn read_child<R: BufRead>(
        &mut self,
        child: Self::Child,
        reader: &mut DescriptionReader<R>,
    ) -> Result<()>;

    /// Hook run once the end element has been reached
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }

    /// Parse a new description from a reader positioned on its start element
    fn read_from<R: BufRead>(reader: &mut DescriptionReader<R>) -> Result<Self> {
        let mut description = Self::empty();
        description.append_from(reader)?;
        Ok(description)
    }

    /// Parse the element the reader is positioned on into this description
    ///
    /// On return the reader sits on the element's end tag (or on the element
    /// itself when it was self-closing).
    fn append_from<R: BufRead>(&mut self, reader: &mut DescriptionReader<R>) -> Result<()> {
        let (attributes, self_closing) = reader.expect_start(Self::ELEMENT)?;
        for (name, value) in attributes {
            self.node_mut().set_property(format!("@{}", name), value);
        }
        if self_closing {
            return self.finish();
        }

        let mut current: Option<String> = None;
        let mut open: Vec<String> = Vec::new();
        loop {
            match reader.advance()? {
                Token::Start { name, .. } => {
                    if open.is_empty() {
                        if let Some(child) = Self::recognize(&name) {
                            trace!(element = Self::ELEMENT, child = %name, "Delegating child element");
                            self.read_child(child, reader)?;
                            current = None;
                            continue;
                        }
                    }
                    open.push(name.clone());
                    current = Some(name);
                }
                Token::Empty { name, .. } => {
                    if open.is_empty() {
                        if let Some(child) = Self::recognize(&name) {
                            self.read_child(child, reader)?;
                            current = None;
                            continue;
                        }
                    }
                    self.node_mut().set_property(name, "");
                    current = None;
                }
                Token::Text(text) => {
                    if let Some(name) = &current {
                        self.node_mut().set_property(name.clone(), text);
                    }
                }
                Token::End { name } => match open.pop() {
                    None => {
                        if name != Self::ELEMENT {
                            return Err(DescriptionError::structure(
                                format!("</{}>", Self::ELEMENT),
                                format!("</{}>", name),
                            ));
                        }
                        break;
                    }
                    Some(expected) => {
                        if name != expected {
                            return Err(DescriptionError::structure(
                                format!("</{}>", expected),
                                format!("</{}>", name),
                            ));
                        }
                        current = None;
                    }
                },
                Token::Eof | Token::Begin => {
                    return Err(DescriptionError::structure(
                        format!("</{}>", Self::ELEMENT),
                        "end of document",
                    ));
                }
            }
        }

        self.finish()
    }

    /// Raw properties no accessor of this type reads, in document order
    ///
    /// Useful to spot vendor extensions a device publishes.
    fn unused_properties(&self) -> Vec<(&str, &str)> {
        let declared = declared_properties::<Self>();
        self.node()
            .properties()
            .filter(|(name, _)| !declared.contains(*name))
            .collect()
    }
}

static DECLARED_PROPERTIES: LazyLock<RwLock<HashMap<TypeId, Arc<HashSet<&'static str>>>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// The set of property names a description type claims, built once per type
pub fn declared_properties<T: Description>() -> Arc<HashSet<&'static str>> {
    let type_id = TypeId::of::<T>();
    if let Some(set) = DECLARED_PROPERTIES.read().get(&type_id) {
        return Arc::clone(set);
    }

    let mut registry = DECLARED_PROPERTIES.write();
    Arc::clone(
        registry
            .entry(type_id)
            .or_insert_with(|| Arc::new(T::PROPERTIES.iter().copied().collect())),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Contact {
        node: DescriptionNode,
    }

    impl Description for Contact {
        const ELEMENT: &'static str = "contact";
        const PROPERTIES: &'static [&'static str] = &["name", "age"];
        type Child = NoChildren;

        fn empty() -> Self {
            Self::default()
        }

        fn node(&self) -> &DescriptionNode {
            &self.node
        }

        fn node_mut(&mut self) -> &mut DescriptionNode {
            &mut self.node
        }

        fn recognize(_name: &str) -> Option<NoChildren> {
            None
        }

        fn read_child<R: BufRead>(&mut self, child: NoChildren, _: &mut DescriptionReader<R>) -> Result<()> {
            match child {}
        }
    }

    fn parse(xml: &str) -> Result<Contact> {
        let mut reader = DescriptionReader::from_str(xml);
        reader.move_to_content()?;
        Contact::read_from(&mut reader)
    }

    #[test]
    fn test_leaf_text_becomes_properties() {
        let contact = parse("<contact><name>Ada</name><age> 36 </age><phone>555</phone></contact>").unwrap();
        assert_eq!(contact.node().get_string("name", ""), "Ada");
        assert_eq!(contact.node().get_int("age", 0), 36);
        assert_eq!(contact.node().property("phone"), Some("555"));
    }

    #[test]
    fn test_last_occurrence_wins() {
        let contact = parse("<contact><name>A</name><name>B</name></contact>").unwrap();
        assert_eq!(contact.node().get_string("name", ""), "B");
        assert_eq!(contact.node().len(), 1);
    }

    #[test]
    fn test_accessors_fall_back_to_defaults() {
        let contact = parse("<contact><age>old</age><ratio>x</ratio></contact>").unwrap();
        assert_eq!(contact.node().get_int("age", 7), 7);
        assert_eq!(contact.node().get_double("ratio", 0.5), 0.5);
        assert_eq!(contact.node().get_string("missing", "n/a"), "n/a");
    }

    #[test]
    fn test_wrong_start_element_is_structure_error() {
        let err = parse("<person><name>Ada</name></person>").unwrap_err();
        assert!(err.is_structure_error());
    }

    #[test]
    fn test_truncated_input_is_structure_error() {
        let err = parse("<contact><name>Ada</name>").unwrap_err();
        assert!(err.is_structure_error());
    }

    #[test]
    fn test_mismatched_nested_end_is_structure_error() {
        let err = parse("<contact><address><city>Paris</town></address></contact>").unwrap_err();
        assert!(err.is_structure_error());
        assert!(err.to_string().contains("</city>"));

        let nested = parse("<contact><address><city>Paris</city></address><name>Ada</name></contact>").unwrap();
        assert_eq!(nested.node().get_string("city", ""), "Paris");
        assert_eq!(nested.node().get_string("name", ""), "Ada");
    }

    #[test]
    fn test_attributes_and_empty_elements() {
        let contact = parse(r#"<contact kind="friend"><name>Ada</name><vip/></contact>"#).unwrap();
        assert_eq!(contact.node().property("@kind"), Some("friend"));
        assert_eq!(contact.node().property("vip"), Some(""));
    }

    #[test]
    fn test_unused_properties_report_unclaimed_entries_in_order() {
        let contact =
            parse("<contact><phone>555</phone><name>Ada</name><email>a@b</email></contact>").unwrap();
        assert_eq!(contact.unused_properties(), vec![("phone", "555"), ("email", "a@b")]);
    }

    #[test]
    fn test_parsing_stops_at_own_end_element() {
        let xml = "<list><contact><name>A</name></contact><contact><name>B</name></contact></list>";
        let mut reader = DescriptionReader::from_str(xml);
        reader.move_to_content().unwrap();
        reader.advance().unwrap();
        let first = Contact::read_from(&mut reader).unwrap();
        assert_eq!(first.node().get_string("name", ""), "A");
        assert_eq!(
            reader.current(),
            &Token::End {
                name: "contact".to_string()
            }
        );
        reader.advance().unwrap();
        let second = Contact::read_from(&mut reader).unwrap();
        assert_eq!(second.node().get_string("name", ""), "B");
    }

    #[test]
    fn test_declared_properties_are_shared() {
        let first = declared_properties::<Contact>();
        let second = declared_properties::<Contact>();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(first.contains("name"));
    }
}

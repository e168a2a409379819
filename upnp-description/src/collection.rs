//! Ordered collections of child descriptions
//!
//! Container elements such as `serviceList`, `deviceList` or `actionList`
//! are parsed into a [`DescriptionList`] (plain sequence) or a
//! [`DescriptionDictionary`] (sequence addressable by a domain key). Both keep
//! document order.

use std::io::BufRead;

use tracing::warn;
use uuid::Uuid;

use crate::error::{DescriptionError, Result};
use crate::node::Description;
use crate::ordered_map::OrderedMap;
use crate::reader::{DescriptionReader, Token};

/// Prefix of keys generated for entries whose natural key is unusable
pub const SYNTHETIC_KEY_PREFIX: &str = "~synthetic:";

/// A description that can be addressed by a domain key inside a dictionary
pub trait KeyedDescription: Description {
    /// The natural key, e.g. the UDN of a device or the id of a service
    fn key(&self) -> &str;
}

/// Shared loop for both collection kinds
///
/// Reads items of type `T` until the collection's own end element, skipping
/// any unrelated child elements.
fn read_items<T, R, F>(element: &str, reader: &mut DescriptionReader<R>, mut push: F) -> Result<()>
where
    T: Description,
    R: BufRead,
    F: FnMut(T) -> Result<()>,
{
    let (_, self_closing) = reader.expect_start(element)?;
    if self_closing {
        return Ok(());
    }

    loop {
        match reader.advance()? {
            Token::Start { name, .. } | Token::Empty { name, .. } if name == T::ELEMENT => {
                push(T::read_from(reader)?)?;
            }
            Token::Start { .. } => reader.skip_element()?,
            Token::Empty { .. } | Token::Text(_) => {}
            Token::End { name } => {
                if name != element {
                    return Err(DescriptionError::structure(
                        format!("</{}>", element),
                        format!("</{}>", name),
                    ));
                }
                return Ok(());
            }
            Token::Eof | Token::Begin => {
                return Err(DescriptionError::structure(
                    format!("</{}>", element),
                    "end of document",
                ));
            }
        }
    }
}

/// Ordered sequence of child descriptions
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptionList<T> {
    element: &'static str,
    items: Vec<T>,
}

impl<T: Description> DescriptionList<T> {
    /// An empty list parsed from `element` (e.g. `"iconList"`)
    pub fn new(element: &'static str) -> Self {
        Self {
            element,
            items: Vec::new(),
        }
    }

    pub fn element(&self) -> &'static str {
        self.element
    }

    /// Parse the list element the reader is positioned on, appending its items
    pub fn add_items_from<R: BufRead>(&mut self, reader: &mut DescriptionReader<R>) -> Result<()> {
        let items = &mut self.items;
        read_items::<T, R, _>(self.element, reader, |item| {
            items.push(item);
            Ok(())
        })
    }

    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    pub fn get(&self, position: usize) -> Option<&T> {
        self.items.get(position)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }
}

impl<'a, T> IntoIterator for &'a DescriptionList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Ordered dictionary of child descriptions keyed by their domain key
///
/// Entries whose key is empty, or repeats a key already present, are stored
/// under a generated key starting with [`SYNTHETIC_KEY_PREFIX`]: they remain
/// enumerable but are not addressable by any caller-supplied key.
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptionDictionary<T> {
    element: &'static str,
    items: OrderedMap<String, T>,
}

impl<T: KeyedDescription> DescriptionDictionary<T> {
    /// An empty dictionary parsed from `element` (e.g. `"serviceList"`)
    pub fn new(element: &'static str) -> Self {
        Self {
            element,
            items: OrderedMap::new(),
        }
    }

    pub fn element(&self) -> &'static str {
        self.element
    }

    /// Parse the dictionary element the reader is positioned on, adding its items
    pub fn add_items_from<R: BufRead>(&mut self, reader: &mut DescriptionReader<R>) -> Result<()> {
        let element = self.element;
        let items = &mut self.items;
        read_items::<T, R, _>(element, reader, |item| insert_keyed(element, items, item))
    }

    /// Add an item under its natural key (or a generated one)
    pub fn insert(&mut self, item: T) -> Result<()> {
        insert_keyed(self.element, &mut self.items, item)
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.items.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut T> {
        self.items.get_mut(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.items.contains_key(key)
    }

    pub fn get_at(&self, position: usize) -> Option<&T> {
        self.items.get_at(position).map(|(_, item)| item)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Keys in document order, generated keys included
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.items.iter().map(|(key, item)| (key.as_str(), item))
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.items.values()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.items.values_mut()
    }
}

fn insert_keyed<T: KeyedDescription>(
    element: &str,
    items: &mut OrderedMap<String, T>,
    item: T,
) -> Result<()> {
    let natural = item.key().trim();
    let key = if natural.is_empty() {
        synthetic_key()
    } else if items.contains_key(natural) {
        warn!(
            collection = element,
            key = natural,
            "Duplicate key in description, storing entry under a generated key"
        );
        synthetic_key()
    } else {
        natural.to_string()
    };
    items.add(key, item)?;
    Ok(())
}

fn synthetic_key() -> String {
    format!("{}{}", SYNTHETIC_KEY_PREFIX, Uuid::new_v4())
}

/// True for keys generated by a [`DescriptionDictionary`]
pub fn is_synthetic_key(key: &str) -> bool {
    key.starts_with(SYNTHETIC_KEY_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{DescriptionNode, NoChildren};

    #[derive(Debug, Default, PartialEq)]
    struct Entry {
        node: DescriptionNode,
    }

    impl Description for Entry {
        const ELEMENT: &'static str = "entry";
        const PROPERTIES: &'static [&'static str] = &["id"];
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

    impl KeyedDescription for Entry {
        fn key(&self) -> &str {
            self.node.get_string("id", "")
        }
    }

    fn reader_at(xml: &str) -> DescriptionReader<&[u8]> {
        let mut reader = DescriptionReader::from_str(xml);
        reader.move_to_content().unwrap();
        reader
    }

    #[test]
    fn test_list_preserves_document_order() {
        let mut reader = reader_at("<entries><entry><id>b</id></entry><entry><id>a</id></entry></entries>");
        let mut list: DescriptionList<Entry> = DescriptionList::new("entries");
        list.add_items_from(&mut reader).unwrap();

        let ids: Vec<&str> = list.iter().map(|e| e.key()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn test_list_skips_unrelated_children() {
        let mut reader = reader_at(
            "<entries><note><deep>x</deep></note><entry><id>a</id></entry><hint/></entries>",
        );
        let mut list: DescriptionList<Entry> = DescriptionList::new("entries");
        list.add_items_from(&mut reader).unwrap();
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_self_closing_list_is_empty() {
        let mut reader = reader_at("<entries/>");
        let mut list: DescriptionList<Entry> = DescriptionList::new("entries");
        list.add_items_from(&mut reader).unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn test_dictionary_keys_by_natural_key() {
        let mut reader = reader_at("<entries><entry><id>x</id></entry><entry><id>y</id></entry></entries>");
        let mut dict: DescriptionDictionary<Entry> = DescriptionDictionary::new("entries");
        dict.add_items_from(&mut reader).unwrap();

        assert_eq!(dict.keys().collect::<Vec<_>>(), vec!["x", "y"]);
        assert!(dict.get("y").is_some());
        assert_eq!(dict.get_at(0).map(|e| e.key()), Some("x"));
    }

    #[test]
    fn test_dictionary_synthesizes_keys_for_empty_and_duplicate_keys() {
        let mut reader = reader_at(
            "<entries><entry><id>x</id></entry><entry/><entry><id>x</id></entry><entry><id>z</id></entry></entries>",
        );
        let mut dict: DescriptionDictionary<Entry> = DescriptionDictionary::new("entries");
        dict.add_items_from(&mut reader).unwrap();

        assert_eq!(dict.len(), 4);
        let keys: Vec<&str> = dict.keys().collect();
        assert_eq!(keys[0], "x");
        assert!(is_synthetic_key(keys[1]));
        assert!(is_synthetic_key(keys[2]));
        assert_ne!(keys[1], keys[2]);
        assert_eq!(keys[3], "z");
    }

    #[test]
    fn test_mismatched_end_element_is_structure_error() {
        let mut reader = reader_at("<entries><entry><id>x</id></entry></other>");
        let mut dict: DescriptionDictionary<Entry> = DescriptionDictionary::new("entries");
        let err = dict.add_items_from(&mut reader).unwrap_err();
        assert!(err.is_structure_error());
    }
}

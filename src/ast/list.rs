//! Ordered sibling lists for the parse tree.
//!
//! The parser appends siblings left to right into a [`ListBuilder`]; the
//! enclosing construct then calls [`ListBuilder::finish`] exactly once, which
//! consumes the builder and yields an immutable [`NodeList`]. Entries live in
//! one arena allocation and are chained head to tail by index, so every link
//! points strictly forward and traversal always terminates.

use std::fmt;

struct Link<T> {
    value: T,
    next: Option<usize>,
}

pub struct ListBuilder<T> {
    links: Vec<Link<T>>,
}

impl<T> ListBuilder<T> {
    pub fn new() -> Self {
        ListBuilder { links: Vec::new() }
    }

    /// Appends at the tail in O(1), patching the previous tail's link.
    pub fn push(&mut self, value: T) {
        let index = self.links.len();
        if let Some(tail) = self.links.last_mut() {
            debug_assert!(tail.next.is_none(), "list tail already linked");
            tail.next = Some(index);
        }
        self.links.push(Link { value, next: None });
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Finalizes the list. Taking `self` by value makes a second finish
    /// impossible.
    pub fn finish(self) -> NodeList<T> {
        let head = if self.links.is_empty() { None } else { Some(0) };
        let list = NodeList {
            links: self.links,
            head,
        };
        debug_assert!(list.is_well_formed(), "malformed sibling list");
        list
    }
}

impl<T> Default for ListBuilder<T> {
    fn default() -> Self {
        ListBuilder::new()
    }
}

pub struct NodeList<T> {
    links: Vec<Link<T>>,
    head: Option<usize>,
}

impl<T> NodeList<T> {
    pub fn empty() -> Self {
        NodeList {
            links: Vec::new(),
            head: None,
        }
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    pub fn first(&self) -> Option<&T> {
        self.head.map(|i| &self.links[i].value)
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            links: &self.links,
            cursor: self.head,
        }
    }

    /// Every link points forward, exactly one entry (the tail) has no
    /// successor, and walking from the head reaches every entry once.
    pub fn is_well_formed(&self) -> bool {
        if self.links.is_empty() {
            return self.head.is_none();
        }
        if self.head != Some(0) {
            return false;
        }
        let forward = self
            .links
            .iter()
            .enumerate()
            .all(|(i, link)| link.next.is_none_or(|n| n > i && n < self.links.len()));
        let tails = self.links.iter().filter(|l| l.next.is_none()).count();
        forward && tails == 1 && self.iter().count() == self.links.len()
    }
}

impl<T> Default for NodeList<T> {
    fn default() -> Self {
        NodeList::empty()
    }
}

impl<T> FromIterator<T> for NodeList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut builder = ListBuilder::new();
        for value in iter {
            builder.push(value);
        }
        builder.finish()
    }
}

impl<T: fmt::Debug> fmt::Debug for NodeList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

pub struct Iter<'a, T> {
    links: &'a [Link<T>],
    cursor: Option<usize>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let link = &self.links[self.cursor?];
        self.cursor = link.next;
        Some(&link.value)
    }
}

impl<'a, T> IntoIterator for &'a NodeList<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

/// Owning traversal. A well-formed list chains its arena entries in index
/// order, so consuming the arena front to back is the link order.
pub struct IntoIter<T> {
    links: std::vec::IntoIter<Link<T>>,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.links.next().map(|link| link.value)
    }
}

impl<T> IntoIterator for NodeList<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> IntoIter<T> {
        debug_assert!(self.is_well_formed(), "malformed sibling list");
        IntoIter {
            links: self.links.into_iter(),
        }
    }
}

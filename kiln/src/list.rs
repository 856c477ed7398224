use std::collections::HashSet;

use crate::ClassRef;

/// Ordered set of classes.
///
/// Entries keep the order in which they were first inserted. For enablement
/// lists this order is the priority order used downstream.
#[derive(Clone, Debug, Default)]
pub struct ClassList {
    entries: Vec<ClassRef>,
    members: HashSet<ClassRef>,
}

impl ClassList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a class, returning `false` if it was already present.
    pub fn insert(&mut self, class: ClassRef) -> bool {
        if !self.members.insert(class.clone()) {
            return false;
        }
        self.entries.push(class);
        true
    }

    pub fn contains(&self, class: &ClassRef) -> bool {
        self.members.contains(class)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ClassRef> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[ClassRef] {
        &self.entries
    }
}

impl Extend<ClassRef> for ClassList {
    fn extend<I: IntoIterator<Item = ClassRef>>(&mut self, iter: I) {
        for class in iter {
            self.insert(class);
        }
    }
}

impl FromIterator<ClassRef> for ClassList {
    fn from_iter<I: IntoIterator<Item = ClassRef>>(iter: I) -> Self {
        let mut list = Self::new();
        list.extend(iter);
        list
    }
}

impl<'a> IntoIterator for &'a ClassList {
    type Item = &'a ClassRef;
    type IntoIter = std::slice::Iter<'a, ClassRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl PartialEq for ClassList {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for ClassList {}

use std::fmt;

use crate::error::{ErrorKind, XdError};

/// An ordered set of strings written as `a;b;c`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct StringSet {
    components: Vec<String>,
}

impl StringSet {
    pub fn new() -> Self {
        StringSet::default()
    }

    /// Parses `a;b;c`. Empty components and repeats are dropped.
    pub fn parse(text: &str) -> Self {
        let mut set = StringSet::new();
        for component in text.split(';') {
            set.add(component);
        }
        set
    }

    pub fn from_slice(items: &[&str]) -> Self {
        let mut set = StringSet::new();
        for item in items {
            set.add(item);
        }
        set
    }

    pub fn add(&mut self, component: &str) {
        if !component.is_empty() && !self.contains(component) {
            self.components.push(component.to_string());
        }
    }

    pub fn add_all(&mut self, items: &[&str]) {
        for item in items {
            self.add(item);
        }
    }

    pub fn remove(&mut self, component: &str) {
        self.components.retain(|c| c != component);
    }

    pub fn contains(&self, component: &str) -> bool {
        self.components.iter().any(|c| c == component)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.components.iter().map(String::as_str)
    }

    /// Applies an edit. `+x;-y` adds and removes components, a plain list
    /// replaces the whole set. Mixing the two forms is a format error.
    pub fn update(&mut self, edit: &str) -> Result<(), XdError> {
        let incremental = edit
            .split(';')
            .any(|c| c.starts_with('+') || c.starts_with('-'));
        if !incremental {
            *self = StringSet::parse(edit);
            return Ok(());
        }
        for component in edit.split(';').filter(|c| !c.is_empty()) {
            if let Some(added) = component.strip_prefix('+') {
                self.add(added);
            } else if let Some(removed) = component.strip_prefix('-') {
                self.remove(removed);
            } else {
                return Err(XdError::new(
                    ErrorKind::ValueFormat,
                    "Can't combine +/- syntax with plain entries",
                ));
            }
        }
        Ok(())
    }
}

impl fmt::Display for StringSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.components.join(";"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_print() {
        let set = StringSet::parse("a;b;;a;c");
        assert_eq!(set.len(), 3);
        assert_eq!(set.to_string(), "a;b;c");
    }

    #[test]
    fn test_update() {
        let mut set = StringSet::parse("a;b");
        set.update("+c;-a").unwrap();
        assert_eq!(set.to_string(), "b;c");
        set.update("x;y").unwrap();
        assert_eq!(set.to_string(), "x;y");
        let err = set.update("+z;w").unwrap_err();
        assert_eq!(err.kind, ErrorKind::ValueFormat);
    }
}

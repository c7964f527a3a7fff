//! Node-shaped input for `put` and `post`.
//!
//! A [`Given`] is what a marshaller hands to the engine: a name, a base (or
//! none yet, for freshly parsed data whose type is still open), an optional
//! value, and ordered metadata and children.

use crate::base::Base;
use crate::error::{ErrorKind, XdError};
use crate::meta;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Given {
    pub name: String,
    /// `None` while the data is still polymorphic.
    pub base: Option<Base>,
    pub value: Option<Value>,
    pub metadata: Vec<Given>,
    pub children: Vec<Given>,
}

impl Given {
    pub fn new(name: impl Into<String>, base: Base) -> Self {
        Given {
            name: name.into(),
            base: Some(base),
            ..Given::default()
        }
    }

    /// Polymorphic data; the target decides the base.
    pub fn untyped(name: impl Into<String>) -> Self {
        Given {
            name: name.into(),
            ..Given::default()
        }
    }

    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_meta(mut self, meta: Given) -> Self {
        self.metadata.push(meta);
        self
    }

    /// Adds a metadata item whose value is given as plain text.
    pub fn with_meta_text(self, name: &str, text: impl Into<String>) -> Self {
        self.with_meta(Given::untyped(name).with_value(text.into()))
    }

    pub fn with_child(mut self, child: Given) -> Self {
        self.children.push(child);
        self
    }

    pub fn partial(self) -> Self {
        self.with_meta(Given::new(meta::PARTIAL, Base::Boolean).with_value(true))
    }

    pub fn truncated(self) -> Self {
        self.with_meta(Given::new(meta::TRUNCATED, Base::Boolean).with_value(true))
    }

    /// The base this data reports, `Poly` while untyped.
    pub fn base_or_poly(&self) -> Base {
        self.base.unwrap_or(Base::Poly)
    }

    pub fn is_untyped(&self) -> bool {
        self.base.is_none()
    }

    /// Settles the base of untyped data. Typed data keeps its base; asking
    /// for a different one is a datatype error.
    pub fn finalize(mut self, base: Base) -> Result<Given, XdError> {
        match self.base {
            None => {
                self.base = Some(base);
                if let Some(value) = self.value.take() {
                    self.value = Some(value.conform(base)?);
                }
                Ok(self)
            }
            Some(own) if own == base => Ok(self),
            Some(own) => Err(XdError::new(
                ErrorKind::TargetDatatype,
                format!("'{}' is already a {own}, not a {base}", self.name),
            )),
        }
    }

    pub fn meta(&self, name: &str) -> Option<&Given> {
        self.metadata.iter().find(|m| m.name == name)
    }

    pub fn child(&self, name: &str) -> Option<&Given> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Text of a metadata item's value, if it has one.
    pub fn meta_text(&self, name: &str) -> Option<String> {
        self.meta(name)
            .and_then(|m| m.value.as_ref())
            .map(|v| v.to_string())
    }

    fn meta_flag(&self, name: &str) -> bool {
        self.meta(name)
            .and_then(|m| m.value.as_ref())
            .is_some_and(Value::to_bool)
    }

    pub fn is_partial(&self) -> bool {
        self.meta_flag(meta::PARTIAL)
    }

    pub fn is_truncated(&self) -> bool {
        self.meta_flag(meta::TRUNCATED)
    }

    /// Base to use for untyped data in a definition, judged from its shape.
    pub fn inferred_base(&self) -> Base {
        if let Some(base) = self.base {
            return base;
        }
        match &self.value {
            Some(value) => value.natural_base(),
            None if self.children.is_empty() => Base::Sequence,
            None => Base::Collection,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markers() {
        let given = Given::new("a", Base::List).partial();
        assert!(given.is_partial());
        assert!(!given.is_truncated());
    }

    #[test]
    fn test_finalize_once() {
        let given = Given::untyped("x").with_value("12");
        let typed = given.finalize(Base::Unsigned).unwrap();
        assert_eq!(typed.value, Some(Value::Unsigned(12)));
        assert_eq!(typed.clone().finalize(Base::Unsigned).unwrap(), typed);
        let err = typed.finalize(Base::Real).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TargetDatatype);
    }

    #[test]
    fn test_meta_text() {
        let given = Given::untyped("x").with_meta_text("$type", "MyType");
        assert_eq!(given.meta_text("$type").as_deref(), Some("MyType"));
        assert_eq!(given.meta_text("$extends"), None);
    }
}

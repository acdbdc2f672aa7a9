//! The resolved state of an output.

use std::collections::BTreeSet;

use crate::id::ResourceId;

/// The payload an [`Output`](crate::Output) resolves to.
///
/// An unknown value never carries a payload: `value()` is `None` exactly when
/// `is_known()` is `false`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputData<T> {
    value: Option<T>,
    is_secret: bool,
    resources: BTreeSet<ResourceId>,
}

impl<T> OutputData<T> {
    /// Creates known data with no dependencies.
    #[must_use]
    pub fn known(value: T, is_secret: bool) -> Self {
        Self {
            value: Some(value),
            is_secret,
            resources: BTreeSet::new(),
        }
    }

    /// Creates unknown data with no dependencies.
    #[must_use]
    pub fn unknown(is_secret: bool) -> Self {
        Self {
            value: None,
            is_secret,
            resources: BTreeSet::new(),
        }
    }

    /// Replaces the dependency set.
    #[must_use]
    pub fn with_resources(mut self, resources: BTreeSet<ResourceId>) -> Self {
        self.resources = resources;
        self
    }

    /// Adds one resource to the dependency set.
    #[must_use]
    pub fn with_resource(mut self, resource: ResourceId) -> Self {
        self.resources.insert(resource);
        self
    }

    /// Marks the data as secret.
    #[must_use]
    pub fn into_secret(mut self) -> Self {
        self.is_secret = true;
        self
    }

    /// Returns the value, if known.
    #[must_use]
    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Consumes the data and returns the value, if known.
    #[must_use]
    pub fn into_value(self) -> Option<T> {
        self.value
    }

    /// Returns `true` if the value is known.
    #[must_use]
    pub fn is_known(&self) -> bool {
        self.value.is_some()
    }

    /// Returns `true` if the value is secret.
    #[must_use]
    pub fn is_secret(&self) -> bool {
        self.is_secret
    }

    /// Returns the resources this value was derived from.
    #[must_use]
    pub fn resources(&self) -> &BTreeSet<ResourceId> {
        &self.resources
    }

    /// Splits the data into its parts.
    #[must_use]
    pub fn into_parts(self) -> (Option<T>, bool, BTreeSet<ResourceId>) {
        (self.value, self.is_secret, self.resources)
    }

    /// Maps the value, keeping flags and dependencies.
    ///
    /// `f` is not called for unknown data.
    #[must_use]
    pub fn map<R>(self, f: impl FnOnce(T) -> R) -> OutputData<R> {
        OutputData {
            value: self.value.map(f),
            is_secret: self.is_secret,
            resources: self.resources,
        }
    }

    /// Joins two payloads.
    ///
    /// The result is known only if both inputs are, secret if either is, and
    /// depends on the union of both dependency sets.
    #[must_use]
    pub fn zip_with<U, R>(self, other: OutputData<U>, f: impl FnOnce(T, U) -> R) -> OutputData<R> {
        let mut resources = self.resources;
        resources.extend(other.resources);

        let value = match (self.value, other.value) {
            (Some(a), Some(b)) => Some(f(a, b)),
            _ => None,
        };

        OutputData {
            value,
            is_secret: self.is_secret || other.is_secret,
            resources,
        }
    }

    /// Joins any number of payloads into one holding every value in order.
    #[must_use]
    pub fn collect(items: impl IntoIterator<Item = OutputData<T>>) -> OutputData<Vec<T>> {
        let mut values = Some(Vec::new());
        let mut is_secret = false;
        let mut resources = BTreeSet::new();

        for item in items {
            is_secret |= item.is_secret;
            resources.extend(item.resources);
            values = match (values, item.value) {
                (Some(mut acc), Some(value)) => {
                    acc.push(value);
                    Some(acc)
                }
                _ => None,
            };
        }

        OutputData {
            value: values,
            is_secret,
            resources,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_has_no_value() {
        let data = OutputData::<u32>::unknown(false);
        assert!(!data.is_known());
        assert_eq!(data.value(), None);
    }

    #[test]
    fn map_skips_unknown() {
        let data = OutputData::<u32>::unknown(true).map(|_| -> u32 { panic!("must not run") });
        assert!(!data.is_known());
        assert!(data.is_secret());
    }

    #[test]
    fn collect_of_empty_is_known_empty_vec() {
        let data = OutputData::<u8>::collect(Vec::new());
        assert_eq!(data.value(), Some(&Vec::new()));
        assert!(!data.is_secret());
        assert!(data.resources().is_empty());
    }

    #[test]
    fn collect_unions_and_propagates_unknown() {
        let a = OutputData::known(1, false).with_resource(ResourceId::new(1));
        let b = OutputData::<i32>::unknown(true).with_resource(ResourceId::new(2));
        let c = OutputData::known(3, false).with_resource(ResourceId::new(1));

        let data = OutputData::collect([a, b, c]);
        assert!(!data.is_known());
        assert!(data.is_secret());
        assert_eq!(
            data.resources().iter().copied().collect::<Vec<_>>(),
            vec![ResourceId::new(1), ResourceId::new(2)]
        );
    }
}

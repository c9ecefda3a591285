// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! The [`OptionSet`] container and the traits options implement.
//!
//! An option's resolution key is its concrete type. Adding a scalar option
//! whose key is already present replaces the stored value unless the type
//! overrides [`ConfigOption::compose`], in which case the stored (older)
//! value merges the incoming one. Collector options accumulate elements
//! instead; their `compose` appends, so merging two sets never loses
//! collected elements.
//!
//! Application order is strictly the caller's call order. An `OptionSet` is
//! built fresh per launch or invocation and is not meant to be mutated from
//! multiple threads.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

/// A typed configuration value storable in an [`OptionSet`].
///
/// The provided [`compose`](ConfigOption::compose) gives last-wins scalar
/// semantics. Composable types override it to merge; the convention is that
/// the receiver (the value already stored) keeps its populated fields and
/// falls back to `newer` for the rest. Collector types override it to append
/// `newer`'s elements after their own.
pub trait ConfigOption: Any + Clone + fmt::Debug + Send + Sync + 'static {
    /// Combine the stored value (`self`) with a newly added one.
    fn compose(self, newer: Self) -> Self {
        newer
    }
}

/// An element type that accumulates into a dedicated collector option
/// rather than occupying its own key.
pub trait Collectable: Clone + fmt::Debug + PartialEq + Send + Sync + 'static {
    /// The collector option this element accumulates into.
    type Collector: Collector<Self>;
}

/// A collector option: holds zero or more elements of type `E` in
/// insertion order.
pub trait Collector<E>: ConfigOption + Default {
    /// Return a collector with `element` appended.
    fn with(self, element: E) -> Self;

    /// Return a collector with the first element equal to `element` removed.
    /// Removing an element that is not present is a no-op.
    fn without(self, element: &E) -> Self;

    /// Clone out the collected elements in insertion order.
    fn to_vec(&self) -> Vec<E>;
}

/// Object-safe view of a stored option, so heterogeneous options can share
/// one map. Composition stays statically typed: `compose_erased` downcasts
/// to the concrete type before delegating to [`ConfigOption::compose`].
trait ErasedOption: fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
    fn clone_erased(&self) -> Box<dyn ErasedOption>;
    fn compose_erased(self: Box<Self>, newer: Box<dyn ErasedOption>) -> Box<dyn ErasedOption>;
}

impl<T: ConfigOption> ErasedOption for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn clone_erased(&self) -> Box<dyn ErasedOption> {
        Box::new(self.clone())
    }

    fn compose_erased(self: Box<Self>, newer: Box<dyn ErasedOption>) -> Box<dyn ErasedOption> {
        match newer.into_any().downcast::<T>() {
            Ok(newer) => Box::new((*self).compose(*newer)),
            // Entries are keyed by TypeId, so a mismatch cannot happen;
            // keep the existing value rather than panic.
            Err(_) => self,
        }
    }
}

/// A collection of options keyed by their concrete type.
#[derive(Debug, Default)]
pub struct OptionSet {
    entries: HashMap<TypeId, Box<dyn ErasedOption>>,
}

impl Clone for OptionSet {
    fn clone(&self) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .map(|(k, v)| (*k, v.clone_erased()))
                .collect(),
        }
    }
}

impl OptionSet {
    /// Create an empty option set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an option set holding a single option.
    pub fn of<T: ConfigOption>(option: T) -> Self {
        let mut set = Self::new();
        set.add(option);
        set
    }

    /// Add an option.
    ///
    /// If the key is already present the stored value is composed with the
    /// incoming one: last-wins for plain scalars, a type-defined merge for
    /// composables, append for collectors.
    pub fn add<T: ConfigOption>(&mut self, option: T) -> &mut Self {
        let key = TypeId::of::<T>();
        let stored: Box<dyn ErasedOption> = match self.entries.remove(&key) {
            Some(existing) => existing.compose_erased(Box::new(option)),
            None => Box::new(option),
        };
        self.entries.insert(key, stored);
        self
    }

    /// Add an option only when its key is currently absent.
    pub fn add_if_absent<T: ConfigOption>(&mut self, option: T) -> &mut Self {
        if !self.entries.contains_key(&TypeId::of::<T>()) {
            self.add(option);
        }
        self
    }

    /// Merge every option from `other` into this set, as if each had been
    /// added individually. Keys present in both compose with `other` as the
    /// newer value, so `other` wins for plain scalars.
    pub fn add_all(&mut self, other: OptionSet) -> &mut Self {
        for (key, option) in other.entries {
            let stored = match self.entries.remove(&key) {
                Some(existing) => existing.compose_erased(option),
                None => option,
            };
            self.entries.insert(key, stored);
        }
        self
    }

    /// Retrieve the current value for a key, if present.
    pub fn get<T: ConfigOption>(&self) -> Option<T> {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|entry| entry.as_any().downcast_ref::<T>())
            .cloned()
    }

    /// Retrieve the current value for a key, or the type's declared default
    /// when absent. The default is not inserted.
    pub fn get_or_default<T: ConfigOption + Default>(&self) -> T {
        self.get::<T>().unwrap_or_default()
    }

    /// Retrieve the current value for a key, inserting and returning
    /// `default` when absent.
    pub fn get_or_insert_default<T: ConfigOption>(&mut self, default: T) -> T {
        match self.get::<T>() {
            Some(existing) => existing,
            None => {
                self.add(default.clone());
                default
            }
        }
    }

    /// Whether a value is stored for the key.
    pub fn contains<T: ConfigOption>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    /// Clear a scalar key, but only when the stored value equals `value`.
    /// Returns whether anything was removed.
    pub fn remove_value<T: ConfigOption + PartialEq>(&mut self, value: &T) -> bool {
        if self.get::<T>().as_ref() == Some(value) {
            self.entries.remove(&TypeId::of::<T>());
            true
        } else {
            false
        }
    }

    /// Clear a key outright. Returns whether anything was removed.
    pub fn discard<T: ConfigOption>(&mut self) -> bool {
        self.entries.remove(&TypeId::of::<T>()).is_some()
    }

    /// Route an element into its collector, creating the collector from its
    /// default when absent.
    pub fn collect<E: Collectable>(&mut self, element: E) -> &mut Self {
        let collector = self.get::<E::Collector>().unwrap_or_default().with(element);
        // Plain insert: `with` already appended, composing would append twice.
        self.entries
            .insert(TypeId::of::<E::Collector>(), Box::new(collector));
        self
    }

    /// Remove the first element of the collector equal to `element`.
    /// A no-op when the collector is absent or the element is not present.
    pub fn discard_collected<E: Collectable>(&mut self, element: &E) -> &mut Self {
        if let Some(collector) = self.get::<E::Collector>() {
            let collector = collector.without(element);
            self.entries
                .insert(TypeId::of::<E::Collector>(), Box::new(collector));
        }
        self
    }

    /// All elements currently collected for `E`, in insertion order.
    /// Empty when the collector is absent.
    pub fn instances_of<E: Collectable>(&self) -> Vec<E> {
        self.get::<E::Collector>()
            .map(|collector| collector.to_vec())
            .unwrap_or_default()
    }

    /// Number of distinct option keys stored.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set holds no options.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Label(String);

    impl Label {
        fn of(value: &str) -> Self {
            Self(value.to_string())
        }
    }

    impl ConfigOption for Label {}

    #[derive(Clone, Debug, PartialEq, Default)]
    struct Limits {
        cpu: Option<u64>,
        memory: Option<u64>,
    }

    impl ConfigOption for Limits {
        fn compose(self, newer: Self) -> Self {
            Self {
                cpu: self.cpu.or(newer.cpu),
                memory: self.memory.or(newer.memory),
            }
        }
    }

    #[derive(Clone, Debug, PartialEq)]
    struct Tag(&'static str);

    impl Collectable for Tag {
        type Collector = Tags;
    }

    #[derive(Clone, Debug, PartialEq, Default)]
    struct Tags(Vec<Tag>);

    impl ConfigOption for Tags {
        fn compose(mut self, newer: Self) -> Self {
            self.0.extend(newer.0);
            self
        }
    }

    impl Collector<Tag> for Tags {
        fn with(mut self, element: Tag) -> Self {
            self.0.push(element);
            self
        }

        fn without(mut self, element: &Tag) -> Self {
            if let Some(index) = self.0.iter().position(|tag| tag == element) {
                self.0.remove(index);
            }
            self
        }

        fn to_vec(&self) -> Vec<Tag> {
            self.0.clone()
        }
    }

    #[test]
    fn test_scalar_last_wins() {
        let mut set = OptionSet::new();
        set.add(Label::of("A")).add(Label::of("B"));
        assert_eq!(set.get::<Label>(), Some(Label::of("B")));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_absent_key_yields_none() {
        let set = OptionSet::new();
        assert_eq!(set.get::<Label>(), None);
        assert!(set.is_empty());
    }

    #[test]
    fn test_composable_merge_stored_fields_win() {
        let mut set = OptionSet::new();
        set.add(Limits {
            cpu: Some(500),
            memory: None,
        });
        set.add(Limits {
            cpu: Some(900),
            memory: Some(1024),
        });

        // The stored value's populated fields take precedence.
        assert_eq!(
            set.get::<Limits>(),
            Some(Limits {
                cpu: Some(500),
                memory: Some(1024),
            })
        );
    }

    #[test]
    fn test_add_if_absent() {
        let mut set = OptionSet::new();
        set.add_if_absent(Label::of("first"));
        set.add_if_absent(Label::of("second"));
        assert_eq!(set.get::<Label>(), Some(Label::of("first")));
    }

    #[test]
    fn test_get_or_default_does_not_insert() {
        let set = OptionSet::new();
        assert_eq!(set.get_or_default::<Limits>(), Limits::default());
        assert!(set.is_empty());
    }

    #[test]
    fn test_get_or_insert_default() {
        let mut set = OptionSet::new();
        let value = set.get_or_insert_default(Label::of("fallback"));
        assert_eq!(value, Label::of("fallback"));
        assert_eq!(set.get::<Label>(), Some(Label::of("fallback")));

        // A stored value is returned untouched.
        let value = set.get_or_insert_default(Label::of("ignored"));
        assert_eq!(value, Label::of("fallback"));
    }

    #[test]
    fn test_remove_value_requires_equality() {
        let mut set = OptionSet::new();
        set.add(Label::of("keep"));
        assert!(!set.remove_value(&Label::of("other")));
        assert!(set.contains::<Label>());
        assert!(set.remove_value(&Label::of("keep")));
        assert!(!set.contains::<Label>());
    }

    #[test]
    fn test_discard_clears_key() {
        let mut set = OptionSet::new();
        set.add(Label::of("x"));
        assert!(set.discard::<Label>());
        assert!(!set.discard::<Label>());
    }

    #[test]
    fn test_collector_accumulates_in_insertion_order() {
        let mut set = OptionSet::new();
        set.collect(Tag("a")).collect(Tag("b")).collect(Tag("a"));
        assert_eq!(set.instances_of::<Tag>(), vec![Tag("a"), Tag("b"), Tag("a")]);
    }

    #[test]
    fn test_collector_option_composes_by_appending() {
        let mut set = OptionSet::new();
        set.add(Tags::default().with(Tag("a")));
        set.add(Tags::default().with(Tag("b")));
        assert_eq!(set.instances_of::<Tag>(), vec![Tag("a"), Tag("b")]);
    }

    #[test]
    fn test_discard_collected_removes_first_match_only() {
        let mut set = OptionSet::new();
        set.collect(Tag("a")).collect(Tag("b")).collect(Tag("a"));
        set.discard_collected(&Tag("a"));
        assert_eq!(set.instances_of::<Tag>(), vec![Tag("b"), Tag("a")]);

        // Removing a non-present element is a no-op.
        set.discard_collected(&Tag("zzz"));
        assert_eq!(set.instances_of::<Tag>(), vec![Tag("b"), Tag("a")]);
    }

    #[test]
    fn test_instances_of_absent_collector_is_empty() {
        let set = OptionSet::new();
        assert!(set.instances_of::<Tag>().is_empty());
    }

    #[test]
    fn test_add_all_later_set_wins_for_scalars() {
        let mut base = OptionSet::of(Label::of("platform"));
        base.add(Limits {
            cpu: Some(100),
            memory: None,
        });

        let mut overrides = OptionSet::of(Label::of("caller"));
        overrides.add(Limits {
            cpu: Some(999),
            memory: Some(64),
        });

        base.add_all(overrides);

        assert_eq!(base.get::<Label>(), Some(Label::of("caller")));
        // Composables merge: the already-stored fields keep precedence.
        assert_eq!(
            base.get::<Limits>(),
            Some(Limits {
                cpu: Some(100),
                memory: Some(64),
            })
        );
    }

    #[test]
    fn test_add_all_appends_collectors() {
        let mut base = OptionSet::new();
        base.collect(Tag("platform"));

        let mut overrides = OptionSet::new();
        overrides.collect(Tag("caller"));

        base.add_all(overrides);
        assert_eq!(
            base.instances_of::<Tag>(),
            vec![Tag("platform"), Tag("caller")]
        );
    }

    #[test]
    fn test_clone_is_independent() {
        let mut set = OptionSet::of(Label::of("original"));
        let snapshot = set.clone();
        set.add(Label::of("changed"));
        assert_eq!(snapshot.get::<Label>(), Some(Label::of("original")));
    }
}

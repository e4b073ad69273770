//! Typed, named side tables keyed by graph node identity.
//!
//! Annotations let collaborators attach data to a net, its places and
//! transitions, or an execution context without the core types knowing about
//! it. Keys are `(kind, id)` pairs ([`NodeKey`]), so carrying annotations
//! across structural transforms is a key translation: see
//! [`AnnotationMap::remap`] and [`Annotations::remap_keys`].

use std::any::{Any, type_name};
use std::collections::HashMap;
use std::fmt;

use crate::error::AnnotationError;
use crate::types::NodeKey;

/// A named map from node keys to values of one declared type.
#[derive(Clone, Debug)]
pub struct AnnotationMap<V> {
    name: String,
    declared_type: &'static str,
    entries: HashMap<NodeKey, V>,
}

impl<V> AnnotationMap<V> {
    /// Create an empty annotation map.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: type_name::<V>(),
            entries: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type name of `V`, recorded at creation.
    pub fn declared_type(&self) -> &'static str {
        self.declared_type
    }

    pub fn get(&self, key: impl Into<NodeKey>) -> Option<&V> {
        self.entries.get(&key.into())
    }

    /// Insert a value, returning the previous one.
    pub fn insert(&mut self, key: impl Into<NodeKey>, value: V) -> Option<V> {
        self.entries.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: impl Into<NodeKey>) -> Option<V> {
        self.entries.remove(&key.into())
    }

    pub fn contains(&self, key: impl Into<NodeKey>) -> bool {
        self.entries.contains_key(&key.into())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeKey, &V)> {
        self.entries.iter()
    }

    /// Copy this map through a key mapping and a value mapping.
    ///
    /// Entries whose key maps to `None` are dropped. The copy keeps the
    /// name; its declared type follows `W`.
    pub fn remap<W, K, F>(&self, key_fn: K, value_fn: F) -> AnnotationMap<W>
    where
        K: Fn(NodeKey) -> Option<NodeKey>,
        F: Fn(&V) -> W,
    {
        AnnotationMap {
            name: self.name.clone(),
            declared_type: type_name::<W>(),
            entries: self
                .entries
                .iter()
                .filter_map(|(key, value)| key_fn(*key).map(|k| (k, value_fn(value))))
                .collect(),
        }
    }
}

/// Object-safe view of an [`AnnotationMap`] used by the registry.
trait ErasedAnnotation: Send + Sync {
    fn declared_type(&self) -> &'static str;
    fn len(&self) -> usize;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn remap_keys(&self, key_fn: &dyn Fn(NodeKey) -> Option<NodeKey>) -> Box<dyn ErasedAnnotation>;
}

impl<V: Clone + Send + Sync + 'static> ErasedAnnotation for AnnotationMap<V> {
    fn declared_type(&self) -> &'static str {
        self.declared_type
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn remap_keys(&self, key_fn: &dyn Fn(NodeKey) -> Option<NodeKey>) -> Box<dyn ErasedAnnotation> {
        Box::new(self.remap(key_fn, V::clone))
    }
}

/// Registry of annotation maps of heterogeneous value types, looked up by name.
#[derive(Default)]
pub struct Annotations {
    maps: HashMap<String, Box<dyn ErasedAnnotation>>,
}

impl Annotations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the map `name` holding `V`.
    ///
    /// Creating a map that already exists with the same type returns the
    /// existing map; with a different type it fails.
    pub fn create<V>(&mut self, name: &str) -> Result<&mut AnnotationMap<V>, AnnotationError>
    where
        V: Clone + Send + Sync + 'static,
    {
        if let Some(existing) = self.maps.get(name) {
            if existing.as_any().downcast_ref::<AnnotationMap<V>>().is_none() {
                return Err(AnnotationError::AlreadyExists {
                    name: name.to_string(),
                    existing: existing.declared_type(),
                });
            }
        } else {
            self.maps
                .insert(name.to_string(), Box::new(AnnotationMap::<V>::new(name)));
        }
        self.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.maps.contains_key(name)
    }

    /// Names of all registered maps, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.maps.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    /// Borrow the map `name` as holding `V`.
    pub fn get<V: 'static>(&self, name: &str) -> Result<&AnnotationMap<V>, AnnotationError> {
        let map = self
            .maps
            .get(name)
            .ok_or_else(|| AnnotationError::Unknown(name.to_string()))?;
        let declared = map.declared_type();
        map.as_any()
            .downcast_ref::<AnnotationMap<V>>()
            .ok_or_else(|| AnnotationError::TypeMismatch {
                name: name.to_string(),
                declared,
                requested: type_name::<V>(),
            })
    }

    /// Mutably borrow the map `name` as holding `V`.
    pub fn get_mut<V: 'static>(
        &mut self,
        name: &str,
    ) -> Result<&mut AnnotationMap<V>, AnnotationError> {
        let map = self
            .maps
            .get_mut(name)
            .ok_or_else(|| AnnotationError::Unknown(name.to_string()))?;
        let declared = map.declared_type();
        map.as_any_mut()
            .downcast_mut::<AnnotationMap<V>>()
            .ok_or_else(|| AnnotationError::TypeMismatch {
                name: name.to_string(),
                declared,
                requested: type_name::<V>(),
            })
    }

    /// Read one entry of map `name`.
    pub fn value<V: Clone + 'static>(
        &self,
        name: &str,
        key: impl Into<NodeKey>,
    ) -> Result<Option<V>, AnnotationError> {
        Ok(self.get::<V>(name)?.get(key).cloned())
    }

    /// Write one entry of map `name`, returning the previous value.
    pub fn set_value<V: 'static>(
        &mut self,
        name: &str,
        key: impl Into<NodeKey>,
        value: V,
    ) -> Result<Option<V>, AnnotationError> {
        Ok(self.get_mut::<V>(name)?.insert(key, value))
    }

    /// Copy every map through `key_fn`, dropping entries mapped to `None`.
    pub fn remap_keys(&self, key_fn: impl Fn(NodeKey) -> Option<NodeKey>) -> Annotations {
        Annotations {
            maps: self
                .maps
                .iter()
                .map(|(name, map)| (name.clone(), map.remap_keys(&key_fn)))
                .collect(),
        }
    }
}

impl Clone for Annotations {
    fn clone(&self) -> Self {
        self.remap_keys(Some)
    }
}

impl fmt::Debug for Annotations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for name in self.names() {
            if let Some(entry) = self.maps.get(name) {
                map.entry(&name, &format_args!("{} ({} entries)", entry.declared_type(), entry.len()));
            }
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NodeKind, PlaceId, TransitionId};

    #[test]
    fn test_annotation_map_basic() {
        let mut labels = AnnotationMap::<String>::new("label");
        assert_eq!(labels.name(), "label");
        assert!(labels.declared_type().contains("String"));

        labels.insert(PlaceId(1), "reads".to_string());
        labels.insert(TransitionId(1), "align".to_string());
        assert_eq!(labels.len(), 2);
        assert_eq!(labels.get(PlaceId(1)).map(String::as_str), Some("reads"));
        assert_eq!(labels.get(TransitionId(1)).map(String::as_str), Some("align"));
        assert!(!labels.contains(PlaceId(2)));
    }

    #[test]
    fn test_remap_translates_and_drops() {
        let mut weights = AnnotationMap::<u32>::new("weight");
        weights.insert(PlaceId(0), 10);
        weights.insert(PlaceId(1), 20);
        weights.insert(TransitionId(0), 30);

        let shifted = weights.remap(
            |key| match key.kind {
                NodeKind::Place if key.id == 1 => None,
                NodeKind::Place => Some(NodeKey { kind: key.kind, id: key.id + 100 }),
                _ => Some(key),
            },
            |w| u64::from(*w) * 2,
        );

        assert_eq!(shifted.len(), 2);
        assert_eq!(shifted.get(PlaceId(100)), Some(&20u64));
        assert_eq!(shifted.get(TransitionId(0)), Some(&60u64));
        assert!(shifted.declared_type().contains("u64"));
    }

    #[test]
    fn test_registry_create_is_idempotent_per_type() {
        let mut registry = Annotations::new();
        registry.create::<u64>("elapsed_ms").unwrap().insert(TransitionId(3), 12);
        let again = registry.create::<u64>("elapsed_ms").unwrap();
        assert_eq!(again.get(TransitionId(3)), Some(&12));

        let err = registry.create::<String>("elapsed_ms").unwrap_err();
        assert!(matches!(err, AnnotationError::AlreadyExists { .. }));
    }

    #[test]
    fn test_registry_typed_access() {
        let mut registry = Annotations::new();
        registry.create::<String>("sample").unwrap();
        registry
            .set_value("sample", NodeKey::context(), "NA12878".to_string())
            .unwrap();

        let sample: Option<String> = registry.value("sample", NodeKey::context()).unwrap();
        assert_eq!(sample.as_deref(), Some("NA12878"));

        let wrong = registry.value::<u64>("sample", NodeKey::context());
        assert!(matches!(wrong, Err(AnnotationError::TypeMismatch { .. })));

        let missing = registry.value::<u64>("nope", NodeKey::context());
        assert!(matches!(missing, Err(AnnotationError::Unknown(_))));
    }

    #[test]
    fn test_registry_remap_keys() {
        let mut registry = Annotations::new();
        registry.create::<i32>("a").unwrap().insert(PlaceId(0), 1);
        registry.create::<String>("b").unwrap().insert(PlaceId(0), "x".into());

        let moved = registry.remap_keys(|key| Some(NodeKey { kind: key.kind, id: key.id + 1 }));
        assert_eq!(moved.names(), vec!["a", "b"]);
        assert_eq!(moved.value::<i32>("a", PlaceId(1)).unwrap(), Some(1));
        assert_eq!(moved.value::<String>("b", PlaceId(0)).unwrap(), None);

        let copy = registry.clone();
        assert_eq!(copy.value::<i32>("a", PlaceId(0)).unwrap(), Some(1));
    }
}

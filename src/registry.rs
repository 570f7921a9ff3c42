use crate::openapi::SchemaObject;
use indexmap::IndexMap;
use log::debug;
use std::collections::{HashMap, HashSet};

/// Identity of a type as requested by the annotation engine
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeKey {
    pub package_path: String,
    pub package_name: String,
    pub type_name: String,
}

impl TypeKey {
    pub fn new(package_path: &str, package_name: &str, type_name: &str) -> Self {
        Self {
            package_path: package_path.to_string(),
            package_name: package_name.to_string(),
            type_name: type_name.to_string(),
        }
    }
}

/// Outcome of [`TypeRegistry::reserve`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    /// The key was already registered under this component name
    Existing(String),
    /// The key is new; the caller must expand it and call `complete`
    Reserved(String),
}

/// Component schema registry for one document run.
///
/// Each key is assigned one component name, the first time it is seen. The
/// name is reserved before the type is expanded, so a type that refers back to
/// itself (directly or through others) finds its own name and is emitted as a
/// `$ref` instead of being expanded again.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    /// Canonical keys to component names
    names: HashMap<TypeKey, String>,
    /// Requested keys that resolved to a canonical key
    aliases: HashMap<TypeKey, String>,
    taken: HashSet<String>,
    /// Canonical keys in reservation order
    order: Vec<TypeKey>,
    /// Component schemas in registration order
    schemas: IndexMap<String, SchemaObject>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Component name for a canonical or aliased key.
    pub fn lookup(&self, key: &TypeKey) -> Option<&str> {
        self.names
            .get(key)
            .or_else(|| self.aliases.get(key))
            .map(String::as_str)
    }

    /// Remembers that `requested` resolves to the component `name`.
    pub fn alias(&mut self, requested: TypeKey, name: &str) {
        if !self.names.contains_key(&requested) {
            self.aliases.insert(requested, name.to_string());
        }
    }

    /// Registers `key` once. A new key gets a unique component name: the bare
    /// type name, then `<package>.<type>`, then a numeric suffix.
    pub fn reserve(&mut self, key: TypeKey) -> Registration {
        if let Some(name) = self.names.get(&key) {
            return Registration::Existing(name.clone());
        }

        let name = self.unique_name(&key);
        debug!("Registering {} as component {}", key.type_name, name);

        self.taken.insert(name.clone());
        self.order.push(key.clone());
        self.names.insert(key, name.clone());
        // Placeholder keeps the component in first-seen order
        self.schemas.insert(name.clone(), SchemaObject::default());
        Registration::Reserved(name)
    }

    fn unique_name(&self, key: &TypeKey) -> String {
        let bare = key.type_name.clone();
        if !self.taken.contains(&bare) {
            return bare;
        }

        let qualified = format!("{}.{}", key.package_name, key.type_name);
        if !self.taken.contains(&qualified) {
            return qualified;
        }

        (2..)
            .map(|n| format!("{}.{}", qualified, n))
            .find(|candidate| !self.taken.contains(candidate))
            .unwrap_or(qualified)
    }

    /// Stores the expanded schema of a reserved component.
    pub fn complete(&mut self, name: &str, schema: SchemaObject) {
        self.schemas.insert(name.to_string(), schema);
    }

    /// Drops a reservation whose expansion failed, along with aliases to it.
    ///
    /// Every key reserved after `key` was reserved while expanding it, and
    /// their schemas may hold `$ref`s to the freed name, so they are dropped
    /// as well.
    pub fn withdraw(&mut self, key: &TypeKey) {
        let Some(position) = self.order.iter().position(|k| k == key) else {
            return;
        };
        for withdrawn in self.order.split_off(position) {
            if let Some(name) = self.names.remove(&withdrawn) {
                debug!("Withdrawing component {}", name);
                self.taken.remove(&name);
                self.schemas.shift_remove(&name);
                self.aliases.retain(|_, aliased| *aliased != name);
            }
        }
    }

    pub fn schema(&self, name: &str) -> Option<&SchemaObject> {
        self.schemas.get(name)
    }

    pub fn schemas(&self) -> &IndexMap<String, SchemaObject> {
        &self.schemas
    }

    pub fn into_schemas(self) -> IndexMap<String, SchemaObject> {
        self.schemas
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Data type catalog: byte sizes, base categories and the project alias table.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Base category of a data type, as recorded by the table store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseCategory {
    #[serde(alias = "character")]
    Character,
    #[serde(alias = "signed integer")]
    SignedInteger,
    #[serde(alias = "unsigned integer")]
    UnsignedInteger,
    #[serde(alias = "floating point")]
    FloatingPoint,
    #[serde(alias = "pointer")]
    Pointer,
    #[serde(alias = "structure")]
    Structure,
}

impl BaseCategory {
    /// Character and integer types share the word swap strategies.
    pub fn is_integral(self) -> bool {
        matches!(
            self,
            Self::Character | Self::SignedInteger | Self::UnsignedInteger
        )
    }
}

/// Size and category lookups used by layout and swap planning.
pub trait TypeCatalog {
    /// Size of one element of `type_name`, in bytes.
    fn size_of(&self, type_name: &str) -> Option<usize>;

    /// Base category of `type_name`.
    fn category(&self, type_name: &str) -> Option<BaseCategory>;

    fn is_structure(&self, type_name: &str) -> bool {
        self.category(type_name) == Some(BaseCategory::Structure)
    }
}

/// One primitive data type definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimitiveType {
    /// Project-wide (canonical) type name, e.g. `uint16`.
    pub name: String,
    /// Underlying C type name, e.g. `unsigned short`.
    #[serde(default)]
    pub c_name: String,
    pub size: usize,
    pub category: BaseCategory,
}

impl PrimitiveType {
    pub fn new(name: &str, c_name: &str, size: usize, category: BaseCategory) -> Self {
        Self {
            name: name.to_string(),
            c_name: c_name.to_string(),
            size,
            category,
        }
    }
}

/// Primitive definitions plus the sizes of the project's structures.
#[derive(Debug, Clone, Default)]
pub struct TypeTable {
    primitives: Vec<PrimitiveType>,
    index: HashMap<String, usize>,
    structures: HashMap<String, usize>,
}

impl TypeTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Table preloaded with the default project primitives.
    pub fn builtin() -> Self {
        use BaseCategory::*;

        let mut table = Self::new();
        for def in [
            PrimitiveType::new("int8", "signed char", 1, SignedInteger),
            PrimitiveType::new("int16", "short", 2, SignedInteger),
            PrimitiveType::new("int32", "int", 4, SignedInteger),
            PrimitiveType::new("int64", "long long", 8, SignedInteger),
            PrimitiveType::new("uint8", "unsigned char", 1, UnsignedInteger),
            PrimitiveType::new("uint16", "unsigned short", 2, UnsignedInteger),
            PrimitiveType::new("uint32", "unsigned int", 4, UnsignedInteger),
            PrimitiveType::new("uint64", "unsigned long long", 8, UnsignedInteger),
            PrimitiveType::new("float", "float", 4, FloatingPoint),
            PrimitiveType::new("double", "double", 8, FloatingPoint),
            PrimitiveType::new("char", "char", 1, Character),
            PrimitiveType::new("address", "int *", 4, Pointer),
        ] {
            table.insert(def);
        }
        table
    }

    /// Add a primitive, replacing any earlier definition with the same name.
    pub fn insert(&mut self, def: PrimitiveType) {
        match self.index.get(&def.name) {
            Some(&slot) => self.primitives[slot] = def,
            None => {
                self.index.insert(def.name.clone(), self.primitives.len());
                self.primitives.push(def);
            }
        }
    }

    /// Record the size of a project structure.
    pub fn define_structure(&mut self, name: &str, size: usize) {
        self.structures.insert(name.to_string(), size);
    }

    pub fn primitive(&self, name: &str) -> Option<&PrimitiveType> {
        self.index.get(name).map(|&slot| &self.primitives[slot])
    }

    /// `(canonical, underlying)` pairs that need a `#define`: both names
    /// present and different, in definition order.
    pub fn aliases(&self) -> impl Iterator<Item = (&str, &str)> {
        self.primitives
            .iter()
            .filter(|p| !p.name.is_empty() && !p.c_name.is_empty() && p.name != p.c_name)
            .map(|p| (p.name.as_str(), p.c_name.as_str()))
    }
}

impl TypeCatalog for TypeTable {
    fn size_of(&self, type_name: &str) -> Option<usize> {
        self.primitive(type_name)
            .map(|p| p.size)
            .or_else(|| self.structures.get(type_name).copied())
    }

    fn category(&self, type_name: &str) -> Option<BaseCategory> {
        self.primitive(type_name).map(|p| p.category).or_else(|| {
            self.structures
                .contains_key(type_name)
                .then_some(BaseCategory::Structure)
        })
    }
}

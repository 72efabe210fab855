//! Deterministic hash-based identity for argument types.
//!
//! This module provides [`TypeHash`], a 64-bit hash identifying an argument
//! type variant. Hashes are computed from names and inner identities with
//! domain-specific mixing constants, so two variants from different domains
//! (say, a shared-object type and a primitive) can never compare equal even
//! when their names coincide.
//!
//! # Examples
//!
//! ```
//! use nativemod::type_hash::TypeHash;
//!
//! let a = TypeHash::for_primitive("Int");
//! let b = TypeHash::for_primitive("Int");
//! assert_eq!(a, b); // Deterministic
//!
//! let shared = TypeHash::for_shared_object("Int");
//! assert_ne!(a, shared); // Different domains never collide
//! ```

use std::fmt;
use xxhash_rust::xxh64::xxh64;

/// Domain-specific mixing constants for hash computation.
///
/// Each argument type variant hashes within its own domain, which keeps
/// structural equality variant-specific.
pub mod hash_constants {
    /// Separator constant for folding ordered components (e.g. record fields)
    pub const SEP: u64 = 0x6d1c3f5a9b42e807;

    /// Domain marker for primitive argument types
    pub const PRIMITIVE: u64 = 0x3b8e21d74fa6c095;

    /// Domain marker for structured (record) argument types
    pub const STRUCTURED: u64 = 0x84f02c6b1d97e3a5;

    /// Domain marker for shared-object argument types
    pub const SHARED_OBJECT: u64 = 0x57a9e4310fb86d2c;

    /// Domain marker for nullable wrappers
    pub const NULLABLE: u64 = 0xc2d56f98a1304be7;

    /// Domain marker for the passthrough "any" type
    pub const ANY: u64 = 0x19f7b3e8d5c0462a;
}

/// A deterministic 64-bit hash identifying an argument type.
///
/// The same variant with the same inner identity always produces the same
/// hash, so [`TypeHash`] equality is exactly the structural equality that
/// `ArgumentType::matches` requires: reflexive, symmetric, and incapable of
/// crossing variant domains.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TypeHash(pub u64);

impl TypeHash {
    /// Identity hash for the passthrough "any" argument type.
    pub const ANY: TypeHash = TypeHash(hash_constants::ANY);

    /// Identity hash for a primitive argument type.
    #[inline]
    pub fn for_primitive(name: &str) -> Self {
        TypeHash(hash_constants::PRIMITIVE ^ xxh64(name.as_bytes(), 0))
    }

    /// Identity hash for a shared-object argument type wrapping the named
    /// native type.
    #[inline]
    pub fn for_shared_object(type_name: &str) -> Self {
        TypeHash(hash_constants::SHARED_OBJECT ^ xxh64(type_name.as_bytes(), 0))
    }

    /// Identity hash for a structured argument type.
    ///
    /// Folds the record name and each `(field name, field identity)` pair in
    /// order, using `wrapping_mul` so field order matters.
    #[inline]
    pub fn for_structured<'a>(
        name: &str,
        fields: impl Iterator<Item = (&'a str, TypeHash)>,
    ) -> Self {
        let mut hash = hash_constants::STRUCTURED ^ xxh64(name.as_bytes(), 0);
        for (field_name, field_hash) in fields {
            hash = hash
                .wrapping_mul(hash_constants::SEP)
                .wrapping_add(xxh64(field_name.as_bytes(), 0) ^ field_hash.0);
        }
        TypeHash(hash)
    }

    /// Identity hash for a nullable wrapper around `inner`.
    #[inline]
    pub fn for_nullable(inner: TypeHash) -> Self {
        TypeHash(hash_constants::NULLABLE ^ inner.0.rotate_left(17))
    }

    /// Get the underlying u64 value.
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHash({:#018x})", self.0)
    }
}

impl fmt::Display for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

//! The accessibility widening pass.
//!
//! [`publicize`] makes every listed type, and every method and field they declare, public:
//!
//! - top-level types become [`TypeVisibility::Public`]
//! - nested types become [`TypeVisibility::NestedPublic`]
//! - methods and fields become [`MemberAccess::Public`]
//!
//! Whether a type is nested is decided by its position in the type tree, not by its current
//! visibility bits. All other attribute bits (`sealed`, `static`, `specialname`, ...) are kept.
//! Property and event accessors are ordinary methods here.
//!
//! # Examples
//!
//! ```rust,no_run
//! use publicizer::{publicize, walker::flatten_all, Module};
//! use std::path::Path;
//!
//! let mut module = Module::from_path(Path::new("Assembly-CSharp.dll"))?;
//! let types = flatten_all(&module);
//! let stats = publicize(&mut module, &types);
//! println!("{} types, {} methods, {} fields changed", stats.types, stats.methods, stats.fields);
//! # Ok::<(), publicizer::Error>(())
//! ```

use std::{fmt, ops::AddAssign};

use log::debug;

use crate::{
    metadata::accessibility::{MemberAccess, TypeVisibility},
    module::{Module, TypeIndex},
};

/// Number of entities that were not public before a [`publicize`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublicizeStats {
    /// Types that were not `Public` / `NestedPublic`
    pub types: usize,
    /// Methods that were not `Public`
    pub methods: usize,
    /// Fields that were not `Public`
    pub fields: usize,
}

impl PublicizeStats {
    /// Returns `true` if nothing needed to change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types == 0 && self.methods == 0 && self.fields == 0
    }
}

impl AddAssign for PublicizeStats {
    fn add_assign(&mut self, other: Self) {
        self.types += other.types;
        self.methods += other.methods;
        self.fields += other.fields;
    }
}

impl fmt::Display for PublicizeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} types, {} methods, {} fields",
            self.types, self.methods, self.fields
        )
    }
}

/// Counts the entities of `types` that are not public yet.
#[must_use]
pub fn count_non_public(module: &Module, types: &[TypeIndex]) -> PublicizeStats {
    let mut stats = PublicizeStats::default();

    for ty in types.iter().filter_map(|index| module.get(*index)) {
        if ty.visibility() != TypeVisibility::widest(ty.is_nested()) {
            stats.types += 1;
        }

        stats.methods += ty
            .methods
            .iter()
            .filter(|method| method.access() != MemberAccess::Public)
            .count();
        stats.fields += ty
            .fields
            .iter()
            .filter(|field| field.access() != MemberAccess::Public)
            .count();
    }

    stats
}

/// Widens the accessibility of `types` and of all their methods and fields.
///
/// The returned counts describe the state before the pass; running it again reports zero.
/// Indexes that do not belong to `module` are ignored.
pub fn publicize(module: &mut Module, types: &[TypeIndex]) -> PublicizeStats {
    let stats = count_non_public(module, types);

    for index in types {
        let Some(ty) = module.get_mut(*index) else {
            continue;
        };

        ty.set_visibility(TypeVisibility::widest(ty.is_nested()));
        for member in ty.methods.iter_mut().chain(ty.fields.iter_mut()) {
            member.set_access(MemberAccess::Public);
        }
    }

    debug!("Publicized {}", stats);
    stats
}

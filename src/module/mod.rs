//! In-memory representation of a .NET module's type tree.
//!
//! A [`Module`] is created from the bytes of a PE image and owns them. Types are stored in an
//! arena in `TypeDef` row order and addressed by [`TypeIndex`]; each [`TypeDef`] owns the ordered
//! indexes of its nested types, and the module keeps the ordered list of top-level types. The
//! loader guarantees that this forms a tree: every type is reachable from exactly one root.
//!
//! Each type, method and field remembers the absolute file offset of its flag column, so
//! serializing only patches those bytes in a copy of the original image.
//!
//! # Examples
//!
//! ```rust,no_run
//! use publicizer::Module;
//! use std::path::Path;
//!
//! let module = Module::from_path(Path::new("Assembly-CSharp.dll"))?;
//! for index in module.roots() {
//!     let ty = &module[*index];
//!     println!("{} ({} nested, {} methods)", module.full_name(*index), ty.nested.len(), ty.methods.len());
//! }
//! # Ok::<(), publicizer::Error>(())
//! ```

mod loader;
mod writer;

pub(crate) use writer::write_atomic;

use std::{
    fmt,
    ops::{Index, IndexMut},
    path::Path,
};

use crate::{
    file::File,
    metadata::{
        accessibility::{MemberAccess, TypeVisibility},
        token::Token,
    },
    Result,
};

/// Position of a type in the module's arena, equal to its `TypeDef` row minus one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeIndex(usize);

impl TypeIndex {
    /// Returns the zero-based arena position.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for TypeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A method or field declaration.
#[derive(Debug, Clone)]
pub struct MemberDef {
    /// `MethodDef` or `Field` token
    pub token: Token,
    /// Simple name
    pub name: String,
    access: MemberAccess,
    flags: u16,
    flags_offset: usize,
}

/// A method owned by a [`TypeDef`].
pub type MethodDef = MemberDef;

/// A field owned by a [`TypeDef`].
pub type FieldDef = MemberDef;

impl MemberDef {
    pub(crate) fn new(token: Token, name: String, flags: u16, flags_offset: usize) -> Result<Self> {
        Ok(MemberDef {
            token,
            name,
            access: MemberAccess::from_flags(flags)?,
            flags,
            flags_offset,
        })
    }

    /// Returns the current access level.
    #[must_use]
    pub fn access(&self) -> MemberAccess {
        self.access
    }

    /// Changes the access level; all other attribute bits are kept.
    pub fn set_access(&mut self, access: MemberAccess) {
        self.access = access;
    }

    /// Returns the full flag word as it will be serialized.
    #[must_use]
    pub fn flags(&self) -> u16 {
        self.access.apply(self.flags)
    }

    /// Returns the absolute file offset of the flag column.
    #[must_use]
    pub fn flags_offset(&self) -> usize {
        self.flags_offset
    }
}

/// A type declaration.
#[derive(Debug, Clone)]
pub struct TypeDef {
    /// `TypeDef` token
    pub token: Token,
    /// Simple name
    pub name: String,
    /// Namespace, empty for nested types and the global namespace
    pub namespace: String,
    /// The declaring type, for nested types
    pub enclosing: Option<TypeIndex>,
    /// Directly nested types, in declaration order
    pub nested: Vec<TypeIndex>,
    /// Methods, in declaration order
    pub methods: Vec<MethodDef>,
    /// Fields, in declaration order
    pub fields: Vec<FieldDef>,
    visibility: TypeVisibility,
    flags: u32,
    flags_offset: usize,
}

impl TypeDef {
    /// Returns the current visibility.
    #[must_use]
    pub fn visibility(&self) -> TypeVisibility {
        self.visibility
    }

    /// Changes the visibility; all other attribute bits are kept.
    pub fn set_visibility(&mut self, visibility: TypeVisibility) {
        self.visibility = visibility;
    }

    /// Returns `true` if the type is declared inside another type.
    #[must_use]
    pub fn is_nested(&self) -> bool {
        self.enclosing.is_some()
    }

    /// Returns the full flag word as it will be serialized.
    #[must_use]
    pub fn flags(&self) -> u32 {
        self.visibility.apply(self.flags)
    }

    /// Returns the absolute file offset of the flag column.
    #[must_use]
    pub fn flags_offset(&self) -> usize {
        self.flags_offset
    }
}

/// A loaded .NET module.
pub struct Module {
    file: File,
    name: String,
    runtime_version: String,
    types: Vec<TypeDef>,
    roots: Vec<TypeIndex>,
}

impl Module {
    /// Loads a module from disk.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file can not be read, or a format error if the
    /// bytes are not a .NET image this crate can parse.
    pub fn from_path(path: &Path) -> Result<Module> {
        let file = File::from_file(path)?;
        loader::load(file)
    }

    /// Loads a module from an in-memory image.
    ///
    /// # Errors
    /// Returns a format error if the bytes are not a .NET image this crate can parse.
    pub fn from_mem(data: Vec<u8>) -> Result<Module> {
        let file = File::from_mem(data)?;
        loader::load(file)
    }

    /// Serializes the module, applying all accessibility changes to a copy of the image.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if a recorded flag offset lies outside the image.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        writer::serialize(self)
    }

    /// Serializes the module and writes it to `path` through a temporary file in the same
    /// directory; `path` is only replaced once the complete image has been written.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the destination can not be written, or the errors
    /// of [`Module::to_bytes`].
    pub fn to_file(&self, path: &Path) -> Result<()> {
        let data = self.to_bytes()?;
        writer::write_atomic(path, &data)
    }

    /// Returns the name stored in the `Module` table.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the runtime version string of the metadata root.
    #[must_use]
    pub fn runtime_version(&self) -> &str {
        &self.runtime_version
    }

    /// Returns the underlying PE image.
    #[must_use]
    pub fn file(&self) -> &File {
        &self.file
    }

    /// Returns the top-level types in declaration order.
    #[must_use]
    pub fn roots(&self) -> &[TypeIndex] {
        &self.roots
    }

    /// Returns the number of types, including nested ones and `<Module>`.
    #[must_use]
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Returns the number of methods over all types.
    #[must_use]
    pub fn method_count(&self) -> usize {
        self.types.iter().map(|ty| ty.methods.len()).sum()
    }

    /// Returns the number of fields over all types.
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.types.iter().map(|ty| ty.fields.len()).sum()
    }

    /// Returns the type at `index`, if it belongs to this module.
    #[must_use]
    pub fn get(&self, index: TypeIndex) -> Option<&TypeDef> {
        self.types.get(index.0)
    }

    /// Returns the type at `index` mutably, if it belongs to this module.
    pub fn get_mut(&mut self, index: TypeIndex) -> Option<&mut TypeDef> {
        self.types.get_mut(index.0)
    }

    /// Iterates over all types in `TypeDef` row order.
    pub fn types(&self) -> impl Iterator<Item = (TypeIndex, &TypeDef)> {
        self.types
            .iter()
            .enumerate()
            .map(|(position, ty)| (TypeIndex(position), ty))
    }

    /// Returns the display name of a type: `Namespace.Outer/Inner`.
    #[must_use]
    pub fn full_name(&self, index: TypeIndex) -> String {
        let mut parts = Vec::new();
        let mut current = self.get(index);
        let mut namespace = "";

        while let Some(ty) = current {
            parts.push(ty.name.as_str());
            namespace = ty.namespace.as_str();
            current = ty.enclosing.and_then(|parent| self.get(parent));
        }

        parts.reverse();
        let path = parts.join("/");
        if namespace.is_empty() {
            path
        } else {
            format!("{namespace}.{path}")
        }
    }
}

impl Index<TypeIndex> for Module {
    type Output = TypeDef;

    fn index(&self, index: TypeIndex) -> &TypeDef {
        &self.types[index.0]
    }
}

impl IndexMut<TypeIndex> for Module {
    fn index_mut(&mut self, index: TypeIndex) -> &mut TypeDef {
        &mut self.types[index.0]
    }
}

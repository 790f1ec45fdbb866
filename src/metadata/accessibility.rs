//! Accessibility of types and members.
//!
//! ECMA-335 stores visibility in the low bits of the `TypeDef.Flags` (`VisibilityMask`, 3 bits)
//! and of the `MethodDef.Flags` / `Field.Flags` columns (`MemberAccessMask`, 3 bits). The rest of
//! each flag word carries unrelated attributes (`abstract`, `static`, `specialname`, ...), which
//! the publicizer must keep untouched, so both enums only ever replace the masked bits.
//!
//! # Reference
//! - [ECMA-335 II.23.1.10, II.23.1.5, II.23.1.15](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use strum::{Display, EnumIter};

use crate::{Error, Result};

/// Mask of the visibility bits in `TypeAttributes`.
pub const VISIBILITY_MASK: u32 = 0x0000_0007;

/// Mask of the access bits in `MethodAttributes` and `FieldAttributes`.
pub const MEMBER_ACCESS_MASK: u16 = 0x0007;

/// Visibility of a type.
///
/// Top-level types use [`TypeVisibility::NotPublic`] and [`TypeVisibility::Public`]; nested types
/// use the `Nested*` variants. The two sets are encoded in the same three bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum TypeVisibility {
    /// Top-level type visible only within its assembly
    NotPublic,
    /// Top-level type visible everywhere
    Public,
    /// Nested type with public visibility
    NestedPublic,
    /// Nested type with private visibility
    NestedPrivate,
    /// Nested type with family (protected) visibility
    NestedFamily,
    /// Nested type with assembly (internal) visibility
    NestedAssembly,
    /// Nested type with family-and-assembly (private protected) visibility
    NestedFamAndAssem,
    /// Nested type with family-or-assembly (protected internal) visibility
    NestedFamOrAssem,
}

impl TypeVisibility {
    /// Decodes the visibility from a `TypeDef.Flags` value.
    #[must_use]
    pub fn from_flags(flags: u32) -> Self {
        match flags & VISIBILITY_MASK {
            0 => TypeVisibility::NotPublic,
            1 => TypeVisibility::Public,
            2 => TypeVisibility::NestedPublic,
            3 => TypeVisibility::NestedPrivate,
            4 => TypeVisibility::NestedFamily,
            5 => TypeVisibility::NestedAssembly,
            6 => TypeVisibility::NestedFamAndAssem,
            _ => TypeVisibility::NestedFamOrAssem,
        }
    }

    /// Returns the raw visibility bits.
    #[must_use]
    pub fn bits(self) -> u32 {
        match self {
            TypeVisibility::NotPublic => 0,
            TypeVisibility::Public => 1,
            TypeVisibility::NestedPublic => 2,
            TypeVisibility::NestedPrivate => 3,
            TypeVisibility::NestedFamily => 4,
            TypeVisibility::NestedAssembly => 5,
            TypeVisibility::NestedFamAndAssem => 6,
            TypeVisibility::NestedFamOrAssem => 7,
        }
    }

    /// Replaces the visibility bits of `flags`, keeping every other attribute.
    #[must_use]
    pub fn apply(self, flags: u32) -> u32 {
        (flags & !VISIBILITY_MASK) | self.bits()
    }

    /// Returns `true` for the `Nested*` variants.
    #[must_use]
    pub fn is_nested(self) -> bool {
        !matches!(self, TypeVisibility::NotPublic | TypeVisibility::Public)
    }

    /// The widest visibility for a type at the given position in the type tree.
    #[must_use]
    pub fn widest(nested: bool) -> Self {
        if nested {
            TypeVisibility::NestedPublic
        } else {
            TypeVisibility::Public
        }
    }
}

/// Access level of a method or field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum MemberAccess {
    /// Member not referenceable at all; emitted by compilers for internal helpers
    CompilerControlled,
    /// Accessible only by the declaring type (`private`)
    Private,
    /// Accessible by subtypes within the assembly (`private protected`)
    FamAndAssem,
    /// Accessible within the assembly (`internal`)
    Assembly,
    /// Accessible by subtypes (`protected`)
    Family,
    /// Accessible by subtypes and within the assembly (`protected internal`)
    FamOrAssem,
    /// Accessible everywhere
    Public,
}

impl MemberAccess {
    /// Decodes the access level from a `MethodDef.Flags` or `Field.Flags` value.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidAccess`] for the reserved value `7`.
    pub fn from_flags(flags: u16) -> Result<Self> {
        // masked to 3 bits
        #[allow(clippy::cast_possible_truncation)]
        let access = (flags & MEMBER_ACCESS_MASK) as u8;

        match access {
            0 => Ok(MemberAccess::CompilerControlled),
            1 => Ok(MemberAccess::Private),
            2 => Ok(MemberAccess::FamAndAssem),
            3 => Ok(MemberAccess::Assembly),
            4 => Ok(MemberAccess::Family),
            5 => Ok(MemberAccess::FamOrAssem),
            6 => Ok(MemberAccess::Public),
            other => Err(Error::InvalidAccess(other)),
        }
    }

    /// Returns the raw access bits.
    #[must_use]
    pub fn bits(self) -> u16 {
        match self {
            MemberAccess::CompilerControlled => 0,
            MemberAccess::Private => 1,
            MemberAccess::FamAndAssem => 2,
            MemberAccess::Assembly => 3,
            MemberAccess::Family => 4,
            MemberAccess::FamOrAssem => 5,
            MemberAccess::Public => 6,
        }
    }

    /// Replaces the access bits of `flags`, keeping every other attribute.
    #[must_use]
    pub fn apply(self, flags: u16) -> u16 {
        (flags & !MEMBER_ACCESS_MASK) | self.bits()
    }
}

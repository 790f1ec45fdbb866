//! Flattening of the nested type tree.
//!
//! [`flatten`] turns a list of top-level types into a single sequence containing every type
//! of their subtrees exactly once, depth-first in pre-order: each type is followed by its
//! nested types (recursively) before its next sibling. Declaration order is kept at every
//! level. The walk uses an explicit stack, so arbitrarily deep nesting can not overflow the
//! call stack.

use crate::module::{Module, TypeIndex};

/// Returns every type reachable from `roots`, depth-first in pre-order.
///
/// Indexes that do not belong to `module` are skipped.
#[must_use]
pub fn flatten(module: &Module, roots: &[TypeIndex]) -> Vec<TypeIndex> {
    let mut result = Vec::with_capacity(module.type_count());
    let mut stack: Vec<TypeIndex> = roots.iter().rev().copied().collect();

    while let Some(current) = stack.pop() {
        let Some(ty) = module.get(current) else {
            continue;
        };

        result.push(current);
        stack.extend(ty.nested.iter().rev().copied());
    }

    result
}

/// Returns every type of `module`, starting from its top-level types.
#[must_use]
pub fn flatten_all(module: &Module) -> Vec<TypeIndex> {
    flatten(module, module.roots())
}

/*!
 * The translation engine.
 *
 * This module applies stored translations to live model instances. It is
 * split into several submodules:
 *
 * - `hierarchy`: Relation paths turned into a tree
 * - `purview`: Instances an operation touches and the scope of their rows
 * - `context`: Create, read, update, delete and reset over one entity
 * - `filter`: Predicates, including lookups on translated text
 * - `query`: Lazily evaluated queries carrying translation settings
 */

// Re-export main types for easier usage
pub use self::context::Context;
pub use self::filter::{Lookup, Q};
pub use self::hierarchy::{Hierarchy, HierarchyNode};
pub use self::purview::Purview;
pub use self::query::{QuerySettings, TranslatableQuery};

// Submodules
pub mod context;
pub mod filter;
pub mod hierarchy;
pub mod purview;
pub mod query;

/// Relation list for contexts that only cover the entity itself
pub const NO_RELATIONS: &[&str] = &[];

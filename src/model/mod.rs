/*!
 * Model layer: declarations of translatable models and live instances.
 *
 * - `meta`: model, field and relation declarations plus the `Registry`
 * - `entity`: the `Model` trait, instance handles and `Entity`
 */

pub mod entity;
pub mod meta;

pub use entity::{instance, Entity, Instance, Materialize, Model, ObjectKey, Related};
pub use meta::{
    FieldKind, FieldMeta, ModelMeta, RegisteredModel, Registry, RelationKind, RelationMeta,
    ResolvedField, TranslatableFields,
};

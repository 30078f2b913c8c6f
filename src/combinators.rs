//! Schema constructors and the combinators deriving new schemas from
//! existing ones, one file per family.
//!
//! Every function here returns a fresh node; sources are read, never
//! modified. Configuration methods on the typed schemas consume `self` and
//! hand back the reconfigured schema.

/// Implement [`crate::AsNode`] for schema structs holding a `node` field.
macro_rules! impl_as_node {
    ($($ty:ty),+ $(,)?) => {$(
        impl $crate::node::AsNode for $ty {
            fn node(&self) -> &$crate::node::SchemaNode {
                &self.node
            }
            fn node_mut(&mut self) -> &mut $crate::node::SchemaNode {
                &mut self.node
            }
            fn into_node(self) -> $crate::node::SchemaNode {
                self.node
            }
        }
    )+};
}
pub(crate) use impl_as_node;

pub mod array;
pub mod brand;
pub mod choice;
pub mod collections;
pub mod discriminated;
pub mod effects;
pub mod object;
pub mod primitives;
pub mod tuple;
pub mod union;
pub mod wrappers;

pub use array::{AnyLength, ArraySchema, FixedLength, NonEmpty, array};
pub use brand::{Brand, BrandTag, BrandedSchema, Dynamic, brand, brand_tag};
pub use choice::{EnumSchema, LiteralSchema, enumeration, literal};
pub use collections::{MapSchema, RecordSchema, SetSchema, map, record, record_with_key, set};
pub use discriminated::{DiscriminatedUnionSchema, discriminated_union};
pub use effects::{
    PreprocessSchema, ReadonlySchema, TransformSchema, preprocess, readonly, readonly_deep,
    transform,
};
pub use object::{ObjectSchema, object};
pub use primitives::{
    DateSchema, NumberSchema, PrimitiveSchema, StringSchema, any, bigint, boolean, custom, date,
    nan, never, null, number, string, symbol, undefined, unknown,
};
pub use tuple::{TupleSchema, tuple};
pub use union::{IntersectionSchema, UnionSchema, intersection, union};
pub use wrappers::{
    DefaultSchema, NonNullableSchema, NullableSchema, OptionalSchema, RequiredSchema, default,
    nonnullable, nullable, nullish, optional, required,
};

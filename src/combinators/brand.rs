//! Nominal tags. A brand changes the static type and the hint, never the
//! validation.
//!
//! ```
//! use schemata::{Brand, Compose, Describe, string};
//!
//! struct UserId;
//! impl Brand for UserId {
//!     const NAME: &'static str = "UserId";
//! }
//!
//! let id = string().uuid().brand::<UserId>();
//! assert_eq!(id.hint(), "UserId");
//! ```

use std::fmt;
use std::marker::PhantomData;

use crate::error::SchemaError;
use crate::node::{AsNode, SchemaNode, TypeTag};
use crate::value::Symbol;

/// Marker types implement this to brand schemas at compile time.
pub trait Brand {
    const NAME: &'static str;
}

/// Marker for brands chosen at run time through [`brand_tag`].
#[derive(Clone, Copy, Debug, Default)]
pub struct Dynamic;

/// Run-time brand name.
#[derive(Clone, Debug, PartialEq)]
pub enum BrandTag {
    Name(String),
    Symbol(Symbol),
}

pub struct BrandedSchema<B> {
    node: SchemaNode,
    brand: PhantomData<fn() -> B>,
}

impl<B> Clone for BrandedSchema<B> {
    fn clone(&self) -> Self {
        Self { node: self.node.clone(), brand: PhantomData }
    }
}

impl<B> fmt::Debug for BrandedSchema<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrandedSchema").field("node", &self.node).finish()
    }
}

impl<B> AsNode for BrandedSchema<B> {
    fn node(&self) -> &SchemaNode {
        &self.node
    }
    fn node_mut(&mut self) -> &mut SchemaNode {
        &mut self.node
    }
    fn into_node(self) -> SchemaNode {
        self.node
    }
}

fn branded<B>(schema: impl AsNode, name: &str) -> BrandedSchema<B> {
    let source = schema.into_node();
    BrandedSchema { node: source.wrap(TypeTag::Branded, name), brand: PhantomData }
}

pub fn brand<B: Brand>(schema: impl AsNode) -> BrandedSchema<B> {
    branded(schema, B::NAME)
}

/// Brand with a name known only at run time. Symbols need a description to
/// serve as the name.
pub fn brand_tag(schema: impl AsNode, tag: BrandTag) -> Result<BrandedSchema<Dynamic>, SchemaError> {
    let name = match &tag {
        BrandTag::Name(name) => name.clone(),
        BrandTag::Symbol(symbol) => symbol.description().ok_or(SchemaError::AnonymousBrand)?.to_string(),
    };
    Ok(branded(schema, &name))
}

impl<B> BrandedSchema<B> {
    pub fn brand_name(&self) -> &str {
        self.node.hint()
    }

    /// The schema this brand was put on.
    pub fn unwrap(self) -> SchemaNode {
        self.node.into_inner()
    }
}

//! The schema node.
//!
//! A [`SchemaNode`] bundles an engine [`Constraint`], a [`Manifest`], a
//! [`HookSet`] and a node-local [`PreferencesPatch`]. Typed schema structs
//! (`StringSchema`, `ObjectSchema`, ...) each wrap one node and gain the
//! public API through the capability traits in [`capabilities`].
pub mod capabilities;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;

use crate::config::PreferencesPatch;
use crate::engine::{Constraint, Presence, UnknownKeys};
use crate::hooks::{HookSet, Trigger};
use crate::manifest::Manifest;
use crate::value::Value;

pub use capabilities::{AsNode, Compose, Describe, Validate};

static NEXT_NODE: AtomicU64 = AtomicU64::new(1);

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeTag {
    String,
    Number,
    BigInt,
    Boolean,
    Date,
    Symbol,
    NaN,
    Null,
    Undefined,
    Any,
    Unknown,
    Never,
    Custom,
    Literal,
    Enum,
    Array,
    Tuple,
    Object,
    Record,
    Map,
    Set,
    Union,
    Intersection,
    DiscriminatedUnion,
    Optional,
    Nullable,
    Required,
    NonNullable,
    Default,
    Branded,
    Readonly,
    Transform,
    Preprocess,
}

/// What a combinator needs to know about a node's children after the fact
/// (`partial`, `pick`, discriminator lookup, `unwrap`, ...).
#[derive(Clone, Debug, Default)]
pub enum Structure {
    #[default]
    Leaf,
    Literal(Value),
    Enum(Vec<String>),
    Array(Box<SchemaNode>),
    Tuple {
        items: Vec<SchemaNode>,
        rest: Option<Box<SchemaNode>>,
    },
    Object(ObjectShape),
    Record {
        key: Box<SchemaNode>,
        value: Box<SchemaNode>,
    },
    /// Union, intersection and discriminated-union members.
    Options(Vec<SchemaNode>),
    /// Wrapper combinators keep the node they wrap.
    Wrapped(Box<SchemaNode>),
}

#[derive(Clone, Debug, Default)]
pub struct ObjectShape {
    pub keys: IndexMap<String, SchemaNode>,
    pub unknown: UnknownKeys,
    pub catchall: Option<Box<SchemaNode>>,
}

#[derive(Clone, Debug)]
pub struct SchemaNode {
    id: NodeId,
    tag: TypeTag,
    hint: String,
    constraint: Constraint,
    manifest: Manifest,
    hooks: HookSet,
    prefs: PreferencesPatch,
    structure: Structure,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl NodeId {
    fn next() -> Self {
        NodeId(NEXT_NODE.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TypeTag {
    pub fn name(self) -> &'static str {
        match self {
            TypeTag::String => "StringSchema",
            TypeTag::Number => "NumberSchema",
            TypeTag::BigInt => "BigIntSchema",
            TypeTag::Boolean => "BooleanSchema",
            TypeTag::Date => "DateSchema",
            TypeTag::Symbol => "SymbolSchema",
            TypeTag::NaN => "NaNSchema",
            TypeTag::Null => "NullSchema",
            TypeTag::Undefined => "UndefinedSchema",
            TypeTag::Any => "AnySchema",
            TypeTag::Unknown => "UnknownSchema",
            TypeTag::Never => "NeverSchema",
            TypeTag::Custom => "CustomSchema",
            TypeTag::Literal => "LiteralSchema",
            TypeTag::Enum => "EnumSchema",
            TypeTag::Array => "ArraySchema",
            TypeTag::Tuple => "TupleSchema",
            TypeTag::Object => "ObjectSchema",
            TypeTag::Record => "RecordSchema",
            TypeTag::Map => "MapSchema",
            TypeTag::Set => "SetSchema",
            TypeTag::Union => "UnionSchema",
            TypeTag::Intersection => "IntersectionSchema",
            TypeTag::DiscriminatedUnion => "DiscriminatedUnionSchema",
            TypeTag::Optional => "OptionalSchema",
            TypeTag::Nullable => "NullableSchema",
            TypeTag::Required => "RequiredSchema",
            TypeTag::NonNullable => "NonNullableSchema",
            TypeTag::Default => "DefaultSchema",
            TypeTag::Branded => "BrandedSchema",
            TypeTag::Readonly => "ReadonlySchema",
            TypeTag::Transform => "TransformSchema",
            TypeTag::Preprocess => "PreprocessSchema",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl SchemaNode {
    pub(crate) fn new(tag: TypeTag, hint: impl Into<String>, constraint: Constraint) -> Self {
        Self {
            id: NodeId::next(),
            tag,
            hint: hint.into(),
            constraint,
            manifest: Manifest::default(),
            hooks: HookSet::default(),
            prefs: PreferencesPatch::default(),
            structure: Structure::Leaf,
        }
    }

    /// A new node over a copy of `self`'s constraint, manifest, hooks and
    /// preferences, remembering `self` as the wrapped node.
    pub(crate) fn wrap(&self, tag: TypeTag, hint: impl Into<String>) -> Self {
        Self {
            id: NodeId::next(),
            tag,
            hint: hint.into(),
            constraint: self.constraint.clone(),
            manifest: self.manifest.clone(),
            hooks: self.hooks.clone(),
            prefs: self.prefs.clone(),
            structure: Structure::Wrapped(Box::new(self.clone())),
        }
    }

    pub(crate) fn with_structure(mut self, structure: Structure) -> Self {
        self.structure = structure;
        self
    }

    pub fn id(&self) -> NodeId {
        self.id
    }
    pub fn tag(&self) -> TypeTag {
        self.tag
    }
    pub fn hint(&self) -> &str {
        &self.hint
    }
    pub fn constraint(&self) -> &Constraint {
        &self.constraint
    }
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }
    pub fn hooks(&self) -> &HookSet {
        &self.hooks
    }
    pub fn prefs(&self) -> &PreferencesPatch {
        &self.prefs
    }
    pub fn structure(&self) -> &Structure {
        &self.structure
    }

    pub(crate) fn set_tag(&mut self, tag: TypeTag) {
        self.tag = tag;
    }
    pub(crate) fn set_hint(&mut self, hint: impl Into<String>) {
        self.hint = hint.into();
    }
    pub(crate) fn set_structure(&mut self, structure: Structure) {
        self.structure = structure;
    }
    pub(crate) fn constraint_mut(&mut self) -> &mut Constraint {
        &mut self.constraint
    }
    pub(crate) fn map_constraint(&mut self, f: impl FnOnce(Constraint) -> Constraint) {
        let current = std::mem::replace(&mut self.constraint, Constraint::any());
        self.constraint = f(current);
    }
    pub(crate) fn manifest_mut(&mut self) -> &mut Manifest {
        &mut self.manifest
    }
    pub(crate) fn hooks_mut(&mut self) -> &mut HookSet {
        &mut self.hooks
    }
    pub(crate) fn prefs_mut(&mut self) -> &mut PreferencesPatch {
        &mut self.prefs
    }

    /// The node this one wraps, for wrapper combinators.
    pub fn inner(&self) -> Option<&SchemaNode> {
        match &self.structure {
            Structure::Wrapped(inner) => Some(inner),
            _ => None,
        }
    }

    /// The wrapped node, or `self` when nothing is wrapped.
    pub fn into_inner(self) -> SchemaNode {
        match self.structure {
            Structure::Wrapped(inner) => *inner,
            structure => SchemaNode { structure, ..self },
        }
    }

    /// The constraint to use when this node sits inside a composite. Hooks
    /// become engine steps so they still run at that depth.
    pub fn embed(&self) -> Constraint {
        let mut constraint = self.constraint.clone();
        for mapper in self.hooks.mappers(Trigger::BeforeParse) {
            constraint = constraint.prepare(mapper);
        }
        for mapper in self.hooks.mappers(Trigger::AfterParse) {
            constraint = constraint.finalize(mapper);
        }
        constraint
    }

    /// Whether a missing value passes presence checks.
    pub fn accepts_undefined(&self) -> bool {
        self.constraint.current_presence() != Presence::Required
            || self.constraint.has_default()
    }

    /// Object shape, when this node is an object schema.
    pub fn shape(&self) -> Option<&ObjectShape> {
        match &self.structure {
            Structure::Object(shape) => Some(shape),
            _ => None,
        }
    }
}

impl AsNode for SchemaNode {
    fn node(&self) -> &SchemaNode {
        self
    }
    fn node_mut(&mut self) -> &mut SchemaNode {
        self
    }
    fn into_node(self) -> SchemaNode {
        self
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

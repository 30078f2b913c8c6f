//! Hook-backed combinators. Each one registers a single named hook on a copy
//! of the source node; undoing it removes the hook by that same name.

use super::impl_as_node;
use crate::hint;
use crate::hooks::{Hook, Trigger};
use crate::node::{AsNode, SchemaNode, TypeTag};
use crate::value::Value;

#[derive(Clone, Debug)]
pub struct ReadonlySchema {
    node: SchemaNode,
    deep: bool,
}

#[derive(Clone, Debug)]
pub struct TransformSchema {
    node: SchemaNode,
}

#[derive(Clone, Debug)]
pub struct PreprocessSchema {
    node: SchemaNode,
}

impl_as_node!(ReadonlySchema, TransformSchema, PreprocessSchema);

fn hook_name(prefix: &str, node: &SchemaNode) -> String {
    format!("{prefix}:{}", node.id())
}

/// Remove the hook `name` and give the node back the tag, hint and structure
/// of the node it wraps.
fn restore(mut node: SchemaNode, trigger: Trigger, name: &str, hint: String) -> SchemaNode {
    if !node.hooks_mut().remove(trigger, name) {
        return node;
    }
    let Some(inner) = node.inner().cloned() else { return node };
    node.set_tag(inner.tag());
    node.set_hint(hint);
    node.set_structure(inner.structure().clone());
    node
}

// ————————————————————————————————————————————————————————————————————————————
// READONLY
// ————————————————————————————————————————————————————————————————————————————

/// Freeze the accepted value (top level only).
pub fn readonly(schema: impl AsNode) -> ReadonlySchema {
    frozen(schema.into_node(), false)
}

/// Freeze the accepted value and everything inside it.
pub fn readonly_deep(schema: impl AsNode) -> ReadonlySchema {
    frozen(schema.into_node(), true)
}

fn frozen(source: SchemaNode, deep: bool) -> ReadonlySchema {
    let hint = if deep { hint::readonly_deep(source.hint()) } else { hint::readonly(source.hint()) };
    let mut node = source.wrap(TypeTag::Readonly, hint);
    let hook = if deep {
        Hook::new(hook_name("readonlyDeep", &node), Value::freeze_deep)
    } else {
        Hook::new(hook_name("readonly", &node), Value::freeze)
    };
    node.hooks_mut().add(Trigger::AfterParse, hook);
    ReadonlySchema { node, deep }
}

impl ReadonlySchema {
    pub fn is_deep(&self) -> bool {
        self.deep
    }

    /// Undo [`readonly`]. A deep-readonly schema is returned unchanged.
    pub fn writable(self) -> SchemaNode {
        if self.deep {
            return self.node;
        }
        let name = hook_name("readonly", &self.node);
        let hint = hint::strip_wrapper(self.node.hint(), "Readonly");
        restore(self.node, Trigger::AfterParse, &name, hint)
    }

    /// Undo [`readonly_deep`]. A shallow-readonly schema is returned
    /// unchanged.
    pub fn writable_deep(self) -> SchemaNode {
        if !self.deep {
            return self.node;
        }
        let name = hook_name("readonlyDeep", &self.node);
        let hint = hint::strip_wrapper(self.node.hint(), "ReadonlyDeep");
        restore(self.node, Trigger::AfterParse, &name, hint)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TRANSFORM / PREPROCESS
// ————————————————————————————————————————————————————————————————————————————

/// Map the accepted value. Runs only on success.
pub fn transform(schema: impl AsNode, map: impl Fn(Value) -> Value + Send + Sync + 'static) -> TransformSchema {
    let source = schema.into_node();
    let mut node = source.wrap(TypeTag::Transform, source.hint());
    let name = hook_name("transform", &node);
    node.hooks_mut().add(Trigger::AfterParse, Hook::new(name, map));
    TransformSchema { node }
}

impl TransformSchema {
    /// The schema without this transform.
    pub fn revert(self) -> SchemaNode {
        let name = hook_name("transform", &self.node);
        let hint = self.node.hint().to_string();
        restore(self.node, Trigger::AfterParse, &name, hint)
    }
}

/// Map the raw input before `schema` sees it.
pub fn preprocess(map: impl Fn(Value) -> Value + Send + Sync + 'static, schema: impl AsNode) -> PreprocessSchema {
    let source = schema.into_node();
    let mut node = source.wrap(TypeTag::Preprocess, source.hint());
    let name = hook_name("preprocess", &node);
    node.hooks_mut().add(Trigger::BeforeParse, Hook::new(name, map));
    PreprocessSchema { node }
}

impl PreprocessSchema {
    pub fn revert(self) -> SchemaNode {
        let name = hook_name("preprocess", &self.node);
        let hint = self.node.hint().to_string();
        restore(self.node, Trigger::BeforeParse, &name, hint)
    }
}

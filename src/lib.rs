//! Composable schema validation.
//!
//! Schemas are built from small constructors and combinators, then used to
//! parse dynamic [`Value`]s:
//!
//! ```
//! use schemata::{AsNode, Compose, Validate, array, number, object, string, value};
//!
//! let user = object([
//!     ("name", string().min(1).into_node()),
//!     ("tags", array(string()).optional().into_node()),
//!     ("age", number().int().nonnegative().into_node()),
//! ]);
//!
//! assert!(user.is_valid(&value!({"name": "ann", "age": 31})));
//! let error = user.parse(&value!({"name": "", "age": -1})).unwrap_err();
//! assert_eq!(error.codes(), ["string.min", "number.min"]);
//! ```
//!
//! Every parse runs the same pipeline: the input is cloned, the root node's
//! pre-parse hooks run, the engine validates (and converts), and on success
//! the post-parse hooks run. Failures come back as a [`ValidationError`]
//! carrying one [`Issue`] per failure with a stable code such as
//! `array.min`.
pub mod catalog;
pub mod combinators;
pub mod config;
pub mod descriptor;
pub mod engine;
pub mod error;
pub mod hint;
pub mod hooks;
pub mod manifest;
pub mod node;
pub mod parser;
pub mod value;

pub use combinators::*;
pub use config::{ParseOptions, Preferences, PreferencesPatch};
pub use descriptor::{Descriptor, DescriptorError};
pub use error::{Issue, IssueCategory, ParseAsError, SchemaError, ValidationError};
pub use hooks::{Hook, HookSet, Trigger};
pub use manifest::Manifest;
pub use node::{AsNode, Compose, Describe, NodeId, SchemaNode, TypeTag, Validate};
pub use parser::{ParseResult, Parser};
pub use value::{PathSegment, Symbol, Value};

#[doc(hidden)]
pub use serde_json as __json;

//! Payload schema model and legality checks for resource provider manifests.
//!
//! An API version declares the shape of its instances with a document in a
//! subset of JSON Schema. This crate converts such a document into a typed
//! [`Schema`] tree and checks it against the subset the control plane accepts.

pub mod error;
pub mod node;
pub mod validator;

pub use error::{ErrorKind, ValidationError, ValidationErrors};
pub use node::{AdditionalProperties, Composite, Schema, SchemaKind};
pub use validator::{Validator, validate_value};

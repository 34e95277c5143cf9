//! IDL database model
//!
//! The database is produced by an external IDL parser and consumed here as
//! JSON documents.

mod database;
mod model;

pub use database::IdlDatabase;
pub use model::{
    ExtAttrValue, ExtAttrs, IdlArgument, IdlAttribute, IdlConstant, IdlFunction, IdlInterface,
    IdlOperation, IdlParent,
};

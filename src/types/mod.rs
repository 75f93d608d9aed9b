//! The shared typed representation: scopes and identifiers, data types,
//! struct/union field trees, declarations, expressions/statements, and the
//! MIR value/type model.

pub mod scope;
pub mod data_type;
pub mod field;
pub mod decl;
pub mod expr;
pub mod stmt;
pub mod mir;

pub use scope::{FileId, FileKind, ScopeId, Scope};
pub use data_type::{DataType, DataTypeKind, TypeContext, TypeQualifier};
pub use field::{Field, FieldArena, FieldId, FieldKind, Fields, FieldsContainer};
pub use decl::{Decl, DeclKind, StorageClass, SizeInfo};
pub use expr::{Expr, ExprKind, Literal, IdentifierId, BinaryOp, UnaryOp, MAX_EXPR_PRECEDENCE};
pub use stmt::{Stmt, StmtKind, FunctionBody, BodyItem};
pub use mir::{MirDt, MirVal, RegId, VarId};

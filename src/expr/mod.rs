//! Expression builder: leaves, shapes and the expression tree.

pub mod array;
pub mod constant;
pub mod expression;
pub mod parameter;
pub mod shape;
pub mod variable;

pub use array::{Array, Definiteness};
pub use constant::{
    constant, constant_dmatrix, constant_matrix, constant_sparse, constant_vec, eye, ones, zeros,
    IntoConstant,
};
pub use expression::{ConstantData, Expr, ExprId, IndexSpec, ParameterData, VariableData};
pub use parameter::{parameter, ParameterBuilder};
pub use shape::Shape;
pub use variable::{
    named_variable, nonneg_variable, nonpos_variable, variable, VariableBuilder, VariableExt,
};

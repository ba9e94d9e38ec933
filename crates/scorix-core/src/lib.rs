//! Declarative request validation for the Scorix scoring service.
//!
//! Validation is policy-driven: each request type declares an ordered
//! schema of [`FieldSpec`] policies, and every incoming value is checked
//! against it into one aggregated [`ValidationResult`]. Expected input
//! errors never raise; they accumulate.

pub mod fields;
pub mod requests;
pub mod validation;

pub use fields::{FieldKind, FieldSpec, FEMALE, MALE, UNKNOWN};
pub use requests::{
    ADMIN_LOGIN, ClientsInterestsRequest, MethodRequest, OnlineScoreRequest, Schema,
    supplied_fields, validate_schema,
};
pub use validation::ValidationResult;

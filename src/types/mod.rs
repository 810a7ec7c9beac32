//! Type definitions for the risk scoring pipeline

pub mod assessment;
pub mod input;

pub use assessment::{
    Assessment, TextAssessment, TextVerdict, TransactionAssessment, TransactionStatus,
    UrlAssessment,
};
pub use input::{AssessmentDomain, FieldValue, RawInput, TransactionRecord};

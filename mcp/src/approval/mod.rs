pub mod audit;
pub mod policy;

pub use audit::{AuditEntry, AuditLog, DecisionResult, DecisionSource};
pub use policy::ApprovalPolicyService;

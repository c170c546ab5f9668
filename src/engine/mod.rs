pub mod assignment;
pub mod eligibility;
pub mod lifecycle;
pub mod manual;
pub mod matcher;
pub mod outcome;
pub mod ranking;

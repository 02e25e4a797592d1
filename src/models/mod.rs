pub mod diagnosis;
pub mod doctor;
pub mod labels;
pub mod outcome;
pub mod patient;

pub use diagnosis::Diagnosis;
pub use doctor::Doctor;
pub use labels::ClassLabel;
pub use outcome::DiagnosisOutcome;
pub use patient::Patient;

pub mod diagnosis;
pub mod doctor;
pub mod patient;

pub mod capture;
pub mod detection;
pub mod form;
pub mod shared;
pub mod submission;

pub mod constants;
pub mod frame;
pub mod photo;
pub mod region;

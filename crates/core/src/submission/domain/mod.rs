pub mod student_backend;

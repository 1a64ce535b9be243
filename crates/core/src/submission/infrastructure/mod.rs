pub mod http_student_backend;

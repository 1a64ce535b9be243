pub mod compare_student_use_case;
pub mod domain;
pub mod infrastructure;
pub mod register_student_use_case;

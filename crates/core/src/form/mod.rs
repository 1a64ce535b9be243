pub mod compare_form;
pub mod register_form;
pub mod screen_state;

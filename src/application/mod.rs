pub mod app_error;
pub mod pagination;
pub mod use_cases;

pub mod auth;
pub mod form_fields;
pub mod route_type;

//! Request intake: validate, assign an id, run the job in the background, report status.

pub mod render_service;

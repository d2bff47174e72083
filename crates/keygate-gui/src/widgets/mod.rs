//! UI widgets for keygate GUI

pub mod api_key_dialog;
pub mod key_status;
pub mod technical_log;

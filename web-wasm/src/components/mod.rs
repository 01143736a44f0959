pub mod extraction_form;
pub mod notification_bar;
pub mod processing_queue;
pub mod receipt_preview;
pub mod receiver_input;
pub mod sidebar;
pub mod splash;
pub mod upload_zone;

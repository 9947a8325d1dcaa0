pub mod blog_service;
pub mod firm_service;
pub mod media_service;
pub mod partner_service;
pub mod store;
pub mod upload_service;

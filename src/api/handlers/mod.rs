mod admin;
mod images;
mod photos;

pub use admin::{admin_purge, admin_reconcile, health};
pub use images::{image_data_url, serve_image};
pub use photos::{create_photo, delete_photo, get_photo, list_photos, update_photo};

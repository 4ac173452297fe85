use chrono::{DateTime, Utc};

use crate::sanitize::sanitize_object_name;

pub const UPLOAD_PREFIX: &str = "Uploads";

/// `Uploads/{epochMillis}_{fileName}`
pub fn upload_path(at: DateTime<Utc>, file_name: &str) -> String {
    format!(
        "{}/{}_{}",
        UPLOAD_PREFIX,
        at.timestamp_millis(),
        sanitize_object_name(file_name)
    )
}

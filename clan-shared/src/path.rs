use percent_encoding::percent_decode_str;

use crate::api;

/// Extracts `{family_id}` from `/api/v1/family/{family_id}/...`.
/// Returns a percent-decoded owned [`String`].
pub fn family_id_from_path(path: &str) -> Option<String> {
    let prefix = format!("{}/family/", api::API_V1_PREFIX);
    let rest = path.strip_prefix(&prefix)?;
    let seg = rest.split('/').next()?;
    if seg.is_empty() {
        None
    } else {
        Some(percent_decode_str(seg).decode_utf8_lossy().to_string())
    }
}

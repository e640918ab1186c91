use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct SetCompleteRequest {
    pub is_complete: bool,
}

#[derive(Debug, Deserialize)]
pub struct FileUrlRow {
    pub file_url: String,
}

#[derive(Debug, Serialize)]
pub struct RemoveObjectsRequest<'a> {
    pub prefixes: &'a [String],
}

use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CommonHeaders {
    /// Media type of the request body
    pub content_type: String,
    pub version: Option<String>,
    /// Bearer token
    pub authorization: String,
}

use serde::Deserialize;

pub const DEFAULT_READ_TIME: i32 = 5;

fn default_read_time() -> Option<i32> {
    Some(DEFAULT_READ_TIME)
}

/// Admin editor payload; `tags` is the comma-separated text field.
#[derive(Debug, Deserialize)]
pub struct BlogForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub content: String,
    pub excerpt: Option<String>,
    pub cover_image_url: Option<String>,
    #[serde(default)]
    pub tags: String,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default = "default_read_time")]
    pub read_time: Option<i32>,
}

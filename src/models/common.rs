use serde::Deserialize;

// Pagination query parameters for the event listing proxy
#[derive(Debug, Deserialize)]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

pub fn default_page() -> usize {
    1
}

pub fn default_page_size() -> usize {
    20
}

/// Treat whitespace-only input the way an empty field is treated.
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

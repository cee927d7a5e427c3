#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ListPagination {
    pub page: u32,
    pub page_size: u32,
}

impl Default for ListPagination {
    fn default() -> Self {
        Self {
            page: 0,
            page_size: 20,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GetListResponse<T> {
    pub values: Vec<T>,
    pub total_pages: u64,
    pub total_items: u64,
}

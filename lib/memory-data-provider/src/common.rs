use pki_core::model::list_query::{GetListResponse, ListPagination};

pub(crate) fn calculate_pages_count(total_items_count: u64, page_size: u64) -> u64 {
    if page_size == 0 {
        return 0;
    }

    (total_items_count / page_size) + std::cmp::min(total_items_count % page_size, 1)
}

/// Slices an already filtered and ordered result set
pub(crate) fn paginate<T>(values: Vec<T>, pagination: ListPagination) -> GetListResponse<T> {
    let total_items = values.len() as u64;
    let page_size = pagination.page_size as usize;
    let offset = (pagination.page as usize).saturating_mul(page_size);

    GetListResponse {
        values: values.into_iter().skip(offset).take(page_size).collect(),
        total_pages: calculate_pages_count(total_items, pagination.page_size.into()),
        total_items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_pages_count() {
        assert_eq!(0, calculate_pages_count(1, 0));

        assert_eq!(1, calculate_pages_count(1, 1));
        assert_eq!(1, calculate_pages_count(1, 2));
        assert_eq!(1, calculate_pages_count(1, 100));

        assert_eq!(5, calculate_pages_count(50, 10));
        assert_eq!(6, calculate_pages_count(51, 10));
        assert_eq!(6, calculate_pages_count(52, 10));
        assert_eq!(6, calculate_pages_count(60, 10));
        assert_eq!(7, calculate_pages_count(61, 10));
    }

    #[test]
    fn test_paginate_last_page() {
        let page = paginate(
            (0..45).collect::<Vec<_>>(),
            ListPagination {
                page: 2,
                page_size: 20,
            },
        );

        assert_eq!(page.values, (40..45).collect::<Vec<_>>());
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.total_items, 45);
    }
}

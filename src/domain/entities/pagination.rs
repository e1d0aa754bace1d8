use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub fn new(page: u32, limit: u32) -> Self {
        PageRequest { page: page.max(1), limit: limit.max(1) }
    }

    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.limit as i64
    }
}

/// One page of rows plus the total that matched the same predicate.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page { items: self.items.into_iter().map(f).collect(), total: self.total }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: i64,
    pub total_items: i64,
    pub items_per_page: u32,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl Pagination {
    pub fn new(request: PageRequest, total: i64) -> Self {
        let limit = request.limit as i64;
        let total_pages = if total <= 0 { 0 } else { (total + limit - 1) / limit };
        Pagination {
            current_page: request.page,
            total_pages,
            total_items: total,
            items_per_page: request.limit,
            has_next_page: (request.page as i64) < total_pages,
            has_prev_page: request.page > 1,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T, Q> {
    pub success: bool,
    pub data: Vec<T>,
    pub pagination: Pagination,
    pub meta: ListMeta<Q>,
}

#[derive(Debug, Serialize)]
pub struct ListMeta<Q> {
    pub count: usize,
    pub query: Q,
}

impl<T, Q> PaginatedResponse<T, Q> {
    pub fn new(page: Page<T>, request: PageRequest, query: Q) -> Self {
        PaginatedResponse {
            success: true,
            pagination: Pagination::new(request, page.total),
            meta: ListMeta { count: page.items.len(), query },
            data: page.items,
        }
    }
}

/// `{success, data}` body used by the unpaginated listing routes.
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<CountMeta>,
}

#[derive(Debug, Serialize)]
pub struct CountMeta {
    pub count: usize,
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Self {
        DataResponse { success: true, data, meta: None }
    }
}

impl<T> DataResponse<Vec<T>> {
    pub fn counted(data: Vec<T>) -> Self {
        let count = data.len();
        DataResponse { success: true, data, meta: Some(CountMeta { count }) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_window_math() {
        let p = Pagination::new(PageRequest::new(2, 10), 25);
        assert_eq!(p.total_pages, 3);
        assert!(p.has_next_page);
        assert!(p.has_prev_page);

        let last = Pagination::new(PageRequest::new(3, 10), 25);
        assert!(!last.has_next_page);

        let empty = Pagination::new(PageRequest::new(1, 10), 0);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next_page);
        assert!(!empty.has_prev_page);
    }

    #[test]
    fn offset_uses_one_based_pages() {
        assert_eq!(PageRequest::new(1, 10).offset(), 0);
        assert_eq!(PageRequest::new(3, 5).offset(), 10);
    }
}

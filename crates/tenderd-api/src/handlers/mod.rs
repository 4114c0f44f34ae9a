pub mod auth;
pub mod files;
pub mod tenders;
pub mod users;

use std::collections::HashMap;

use tenderd_db::{ListParams, SortDirection};

/// Pull pagination/ordering out of the raw query map; whatever remains feeds
/// the dynamic filter builder.
pub(crate) fn split_page_params(params: &mut HashMap<String, String>) -> ListParams {
    let defaults = ListParams::default();
    ListParams {
        page_number: params
            .remove("pageNumber")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.page_number),
        page_size: params
            .remove("pageSize")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.page_size),
        sort_by: params.remove("sortBy").unwrap_or(defaults.sort_by),
        sort_direction: params
            .remove("sortDirection")
            .map(|v| SortDirection::parse(&v))
            .unwrap_or(defaults.sort_direction),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_params_are_removed_from_the_filter_map() {
        let mut params = HashMap::from([
            ("pageNumber".to_string(), "2".to_string()),
            ("pageSize".to_string(), "25".to_string()),
            ("sortBy".to_string(), "title".to_string()),
            ("sortDirection".to_string(), "asc".to_string()),
            ("title".to_string(), "Мед".to_string()),
        ]);

        let page = split_page_params(&mut params);
        assert_eq!(page.page_number, 2);
        assert_eq!(page.page_size, 25);
        assert_eq!(page.sort_by, "title");
        assert_eq!(page.sort_direction, SortDirection::Asc);
        assert_eq!(params.len(), 1);
        assert!(params.contains_key("title"));
    }

    #[test]
    fn malformed_page_params_fall_back_to_defaults() {
        let mut params = HashMap::from([("pageNumber".to_string(), "two".to_string())]);
        let page = split_page_params(&mut params);
        assert_eq!(page.page_number, 0);
        assert_eq!(page.page_size, 10);
    }
}

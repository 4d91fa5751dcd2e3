//! Pure tabular view model.
//!
//! Given rows, column specs, and the active sort, produces the rendered
//! page: header cells, display cells for the visible slice, and pagination
//! totals. Never mutates rows and holds no data of its own; edit/delete
//! actions go straight to the controller using the row ids carried here.

use crate::config::ColumnSpec;
use crate::gateway::{SortDirection, SortSpec};
use crate::record::Record;

/// One rendered header cell.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderCell {
    pub field: String,
    pub label: String,
    pub sortable: bool,
    /// Set when this column is the active sort field.
    pub sort: Option<SortDirection>,
}

/// One rendered body row.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedRow {
    pub id: Option<String>,
    pub cells: Vec<String>,
}

/// A fully rendered page of the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedTable {
    pub headers: Vec<HeaderCell>,
    pub rows: Vec<RenderedRow>,
    pub page: usize,
    pub total_pages: usize,
    pub total_rows: usize,
    /// Presentational branch: no rows at all.
    pub empty: bool,
    /// Presentational branch: a load is in flight.
    pub loading: bool,
}

/// Sortable, paginated grid over controller-provided rows.
pub struct TableView {
    columns: Vec<ColumnSpec>,
    page: usize,
    items_per_page: usize,
}

impl TableView {
    pub fn new(columns: Vec<ColumnSpec>) -> Self {
        Self {
            columns,
            page: 1,
            items_per_page: 10,
        }
    }

    pub fn with_items_per_page(mut self, items_per_page: usize) -> Self {
        self.items_per_page = items_per_page.max(1);
        self
    }

    pub fn page(&self) -> usize {
        self.page
    }

    /// Move to a page; clamps to 1 at the bottom (the top clamp happens at
    /// render time, when the row count is known).
    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    /// A header click emits only the requested field; the sort-direction
    /// decision lives in the controller. `None` for unknown or unsortable
    /// columns.
    pub fn sort_request(&self, field: &str) -> Option<String> {
        self.columns
            .iter()
            .find(|c| c.field == field && c.sortable)
            .map(|c| c.field.clone())
    }

    /// Render the visible slice `rows[(page-1)*per_page .. page*per_page]`.
    pub fn render(&self, rows: &[Record], sort: Option<&SortSpec>, loading: bool) -> RenderedTable {
        let total_rows = rows.len();
        let total_pages = total_rows.div_ceil(self.items_per_page).max(1);
        let page = self.page.min(total_pages);

        let headers = self
            .columns
            .iter()
            .map(|c| HeaderCell {
                field: c.field.clone(),
                label: c.header.clone(),
                sortable: c.sortable,
                sort: sort
                    .filter(|s| s.field == c.field)
                    .map(|s| s.direction),
            })
            .collect();

        let start = (page - 1) * self.items_per_page;
        let visible = rows.iter().skip(start).take(self.items_per_page);
        let rendered_rows = visible
            .map(|row| RenderedRow {
                id: row.id(),
                cells: self.columns.iter().map(|c| c.display(row)).collect(),
            })
            .collect();

        RenderedTable {
            headers,
            rows: rendered_rows,
            page,
            total_pages,
            total_rows,
            empty: total_rows == 0,
            loading,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn columns() -> Vec<ColumnSpec> {
        vec![
            ColumnSpec::new("nombre", "Nombre"),
            ColumnSpec::new("tipo", "Tipo").not_sortable().with_empty_value("—"),
        ]
    }

    fn rows(n: usize) -> Vec<Record> {
        (1..=n)
            .map(|i| {
                Record::new()
                    .with_field("id", json!(i))
                    .with_field("nombre", json!(format!("Entidad {}", i)))
            })
            .collect()
    }

    #[test]
    fn test_page_slice() {
        let mut view = TableView::new(columns()).with_items_per_page(10);
        let rows = rows(25);

        let table = view.render(&rows, None, false);
        assert_eq!(table.rows.len(), 10);
        assert_eq!(table.total_pages, 3);
        assert_eq!(table.rows[0].id, Some("1".to_string()));

        view.set_page(3);
        let table = view.render(&rows, None, false);
        assert_eq!(table.rows.len(), 5);
        assert_eq!(table.rows[0].id, Some("21".to_string()));
    }

    #[test]
    fn test_page_clamped_to_range() {
        let mut view = TableView::new(columns()).with_items_per_page(10);
        view.set_page(99);
        let table = view.render(&rows(15), None, false);
        assert_eq!(table.page, 2);

        view.set_page(0);
        assert_eq!(view.page(), 1);
    }

    #[test]
    fn test_headers_carry_active_sort() {
        let view = TableView::new(columns());
        let sort = SortSpec::desc("nombre");
        let table = view.render(&rows(1), Some(&sort), false);

        assert_eq!(table.headers[0].sort, Some(SortDirection::Desc));
        assert_eq!(table.headers[1].sort, None);
        assert!(!table.headers[1].sortable);
    }

    #[test]
    fn test_sort_request_only_for_sortable_columns() {
        let view = TableView::new(columns());
        assert_eq!(view.sort_request("nombre"), Some("nombre".to_string()));
        assert_eq!(view.sort_request("tipo"), None);
        assert_eq!(view.sort_request("desconocido"), None);
    }

    #[test]
    fn test_empty_and_loading_flags() {
        let view = TableView::new(columns());
        let table = view.render(&[], None, true);
        assert!(table.empty);
        assert!(table.loading);
        assert_eq!(table.total_pages, 1);
    }

    #[test]
    fn test_empty_value_fallback_in_cells() {
        let view = TableView::new(columns());
        let table = view.render(&rows(1), None, false);
        // "tipo" is absent on the row: the column's empty_value shows.
        assert_eq!(table.rows[0].cells[1], "—");
    }
}

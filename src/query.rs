//! Parameters of a transaction listing and the rules that resolve loosely
//! typed request values into them.
use serde::Serialize;
use time::Date;

use crate::constants::{DEFAULT_PAGE, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::error::{Error, Result};
use crate::models::TransactionKind;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortColumn {
    #[default]
    Date,
    Amount,
    Category,
}

impl SortColumn {
    /// Unknown or missing column names sort by date.
    pub fn from_param(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("Amount") => SortColumn::Amount,
            Some("Category") => SortColumn::Category,
            _ => SortColumn::Date,
        }
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Only `asc` (any case) is ascending.
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.trim().eq_ignore_ascii_case("asc") => SortOrder::Asc,
            _ => SortOrder::Desc,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransactionQuery {
    pub kind: TransactionKind,
    pub category_id: Option<String>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    /// 1-based.
    pub page: u32,
    pub page_size: u32,
    pub sort_column: SortColumn,
    pub sort_order: SortOrder,
}

impl TransactionQuery {
    pub fn new(kind: TransactionKind) -> Self {
        Self {
            kind,
            category_id: None,
            start_date: None,
            end_date: None,
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
            sort_column: SortColumn::default(),
            sort_order: SortOrder::default(),
        }
    }

    /// Pages below 1 are clamped to the first page.
    pub fn with_page(mut self, page: i64) -> Self {
        self.page = page.clamp(1, u32::MAX as i64) as u32;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_category(mut self, category_id: impl Into<String>) -> Self {
        self.category_id = Some(category_id.into());
        self
    }

    pub fn with_date_range(mut self, start_date: Option<Date>, end_date: Option<Date>) -> Self {
        self.start_date = start_date;
        self.end_date = end_date;
        self
    }

    pub fn sorted_by(mut self, column: SortColumn, order: SortOrder) -> Self {
        self.sort_column = column;
        self.sort_order = order;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(Error::validation(format!(
                "Page size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        Ok(())
    }

    pub fn offset(&self) -> u64 {
        (self.page.max(1) as u64 - 1) * self.page_size as u64
    }

    pub fn total_pages(&self, total_count: u64) -> u64 {
        total_count.div_ceil(self.page_size.max(1) as u64)
    }
}

//! ORDER BY and LIMIT/OFFSET fragments.
//!
//! Sort columns cannot be bound as values, so the requested name is mapped
//! onto a closed enum and only the enum's own column text reaches the SQL.
//! Unknown names and directions fall back to per-aggregate defaults.
//!
//! | aggregate | columns               | default column | default direction |
//! |-----------|-----------------------|----------------|-------------------|
//! | orders    | id, created_at        | id             | DESC              |
//! | products  | id, title, price      | title          | ASC               |
//!
//! Runs once, after every predicate, so it numbers its placeholders from
//! the final cursor.

use bazaar_core::filter::{Pagination, SortRequest};

use super::buffer::SqlBuffer;

// =============================================================================
// Direction
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Case-insensitive `asc` / `desc`; anything else is `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "ASC" => Some(SortDirection::Asc),
            "DESC" => Some(SortDirection::Desc),
            _ => None,
        }
    }

    pub const fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

// =============================================================================
// Columns
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderSortColumn {
    #[default]
    Id,
    CreatedAt,
}

impl OrderSortColumn {
    pub const DEFAULT_DIRECTION: SortDirection = SortDirection::Desc;

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "id" => Some(OrderSortColumn::Id),
            "created_at" => Some(OrderSortColumn::CreatedAt),
            _ => None,
        }
    }

    pub const fn as_sql(&self) -> &'static str {
        match self {
            OrderSortColumn::Id => "o.id",
            OrderSortColumn::CreatedAt => "o.created_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductSortColumn {
    Id,
    #[default]
    Title,
    Price,
}

impl ProductSortColumn {
    pub const DEFAULT_DIRECTION: SortDirection = SortDirection::Asc;

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "id" => Some(ProductSortColumn::Id),
            "title" => Some(ProductSortColumn::Title),
            "price" => Some(ProductSortColumn::Price),
            _ => None,
        }
    }

    pub const fn as_sql(&self) -> &'static str {
        match self {
            ProductSortColumn::Id => "p.id",
            ProductSortColumn::Title => "p.title",
            ProductSortColumn::Price => "p.price_cents",
        }
    }
}

// =============================================================================
// Composers
// =============================================================================

pub(crate) fn orders(buf: &mut SqlBuffer, sort: &SortRequest, pagination: Pagination) {
    let column = OrderSortColumn::parse(&sort.order_by).unwrap_or_default();
    let direction =
        SortDirection::parse(&sort.direction).unwrap_or(OrderSortColumn::DEFAULT_DIRECTION);
    order_by(buf, column.as_sql(), direction);
    paginate(buf, pagination);
}

pub(crate) fn products(buf: &mut SqlBuffer, sort: &SortRequest, pagination: Pagination) {
    let column = ProductSortColumn::parse(&sort.order_by).unwrap_or_default();
    let direction =
        SortDirection::parse(&sort.direction).unwrap_or(ProductSortColumn::DEFAULT_DIRECTION);
    order_by(buf, column.as_sql(), direction);
    paginate(buf, pagination);
}

fn order_by(buf: &mut SqlBuffer, column: &'static str, direction: SortDirection) {
    buf.push_sql(&format!("\n  ORDER BY {} {}", column, direction.as_sql()));
}

fn paginate(buf: &mut SqlBuffer, pagination: Pagination) {
    buf.append(
        "\n  LIMIT ?1 OFFSET ?2",
        vec![pagination.limit().into(), pagination.offset().into()],
    );
    buf.commit();
}

//! Market data shapes.
//!
//! Providers answer either with a single-ticker table (columns keyed by
//! field) or a multi-ticker table (columns keyed by field and ticker). This
//! module holds both shapes and the close-price extraction over them.

mod quotes;

pub use quotes::{extract_close_prices, QuoteTable, ADJ_CLOSE, CLOSE, PRICE_FIELDS};

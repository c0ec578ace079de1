//! Feed ingestion: external band rows to canonical snapshots.

pub mod normalize;

pub use normalize::{
    normalize_payload, normalize_rows, sort_and_check, FeedLayout, FeedRow, FeedSchema,
    NormalizeError, RawField, PRICE_FIELDS,
};

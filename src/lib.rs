//! SDS materials backend.
//!
//! Aggregates chemical-material safety records (Safety Data Sheets) from
//! normalized Postgres tables into a paginated, de-normalized listing. One
//! page request fans out `page_size x 8` detail fetches concurrently,
//! absorbs isolated failures per fetch and per record, and formats the
//! hazard, composition, physical-properties, and transport sections.
//!
//! The HTTP transport, authentication, and the classification pipeline that
//! produces the GHS/DG review fields all live outside this crate; it
//! consumes the schema they maintain and exposes [`MaterialService`] plus
//! the response envelope types in [`response`].

pub mod database;
pub mod error;
pub mod pagination;
pub mod response;
pub mod sections;

pub use database::{
    AggregatedMaterial, DatabaseConfig, DatabaseManager, MaterialListing, MaterialService,
    PgExecutor, SqlExecutor, SqlParam,
};
pub use error::{ServiceError, StoreError};
pub use pagination::PaginationMeta;

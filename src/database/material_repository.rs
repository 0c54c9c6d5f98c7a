//! Master-table repository: paginated listing and counting by material type.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use super::executor::{project_row, SqlExecutor, SqlParam};
use super::queries;
use crate::error::StoreError;

/// One row of `material_sds_master`, projected at the repository boundary.
///
/// Every field is optional: the extraction pipeline writes partial rows, and
/// a hole in the master data must surface as a per-record condition in the
/// aggregation service, not as a listing failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MasterRecord {
    pub material_id: Option<i64>,
    pub material_code: Option<String>,
    pub material_name: Option<String>,
    pub source_file_path: Option<String>,
    pub pdf_file_path: Option<String>,
    pub extraction_timestamp: Option<String>,
}

/// Read access to the material master table. No retries; a failed query
/// surfaces as [`StoreError`] and the caller decides what that means.
pub struct MaterialRepository<E> {
    executor: Arc<E>,
}

impl<E> Clone for MaterialRepository<E> {
    fn clone(&self) -> Self {
        Self {
            executor: Arc::clone(&self.executor),
        }
    }
}

impl<E: SqlExecutor> MaterialRepository<E> {
    pub fn new(executor: Arc<E>) -> Self {
        Self { executor }
    }

    /// Total master rows matching the material-type filter.
    pub async fn count_by_type(&self, material_type: &str) -> Result<i64, StoreError> {
        let row = self
            .executor
            .fetch_one(queries::COUNT_MASTERS_BY_TYPE, &[material_type.into()])
            .await?;
        Ok(row
            .as_ref()
            .and_then(|r| r.get("total"))
            .and_then(Value::as_i64)
            .unwrap_or(0))
    }

    /// One page of master rows, most recently extracted first.
    pub async fn list_by_type(
        &self,
        material_type: &str,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<MasterRecord>, StoreError> {
        let rows = self
            .executor
            .fetch_all(
                queries::LIST_MASTERS_BY_TYPE,
                &[
                    material_type.into(),
                    SqlParam::Int(i64::from(limit)),
                    SqlParam::Int(offset as i64),
                ],
            )
            .await?;
        Ok(rows.into_iter().map(project_row).collect())
    }
}

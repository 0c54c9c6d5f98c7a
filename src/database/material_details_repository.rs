//! Detail-table repository: one typed accessor per per-material side table.
//!
//! Each accessor distinguishes "no row" (`Ok(None)` / empty vec) from
//! "query failed" ([`StoreError`]); the aggregation service treats the
//! former as normal sparse data and isolates the latter per fetch.

use std::sync::Arc;

use serde::Deserialize;

use super::executor::{project_row, Row, SqlExecutor, SqlParam};
use super::queries;
use crate::error::StoreError;

/// Section 1 identity block from `sds_table`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SdsInfo {
    pub product_name: Option<String>,
    pub product_identifier: Option<String>,
    pub material_code: Option<String>,
    pub recommended_use: Option<String>,
    pub supplier_name: Option<String>,
    pub supplier_address: Option<String>,
    pub emergency_phone: Option<String>,
}

/// Section 2 hazard block from `sds_hazards`. `pictograms` holds a
/// JSON-encoded string list as written by the extraction pipeline.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Hazards {
    pub classification: Option<String>,
    pub pictograms: Option<String>,
    pub signal_word: Option<String>,
    pub hazard_statements: Option<String>,
    pub precautionary_statements: Option<String>,
}

/// Section 9 physical properties from `sds_properties`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Properties {
    pub physical_state: Option<String>,
    pub appearance: Option<String>,
    pub odor: Option<String>,
    pub flash_point: Option<String>,
    pub boiling_point: Option<String>,
    pub vapor_pressure: Option<String>,
}

/// Section 14 transport block from `sds_transportation`. The air and
/// maritime columns hold stringified structured literals; decoding them is
/// the transport formatter's job.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Transport {
    pub road_transport: Option<String>,
    pub air_transport: Option<String>,
    pub maritime_transport: Option<String>,
    pub special_precautions: Option<String>,
}

/// GHS classification review state, produced upstream and consumed as-is.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Ghs {
    pub ghs_status: Option<String>,
    pub ghs_reason: Option<String>,
    pub reviewed_at: Option<String>,
}

/// Dangerous-goods classification review state, produced upstream.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Dg {
    pub dg_classification: Option<String>,
    pub dg_status: Option<String>,
    pub dg_reason: Option<String>,
    pub rationale_summary: Option<String>,
    pub hazardous_waste: Option<String>,
    pub reviewed_at: Option<String>,
}

/// One ingredient row from `sds_composition`, in `ingredient_sequence` order.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CompositionRow {
    pub chemical_name: Option<String>,
    pub cas_number: Option<String>,
    pub concentration: Option<String>,
    pub product_type: Option<String>,
}

/// Typed accessors for the eight per-material detail tables.
pub struct MaterialDetailsRepository<E> {
    executor: Arc<E>,
}

impl<E> Clone for MaterialDetailsRepository<E> {
    fn clone(&self) -> Self {
        Self {
            executor: Arc::clone(&self.executor),
        }
    }
}

impl<E: SqlExecutor> MaterialDetailsRepository<E> {
    pub fn new(executor: Arc<E>) -> Self {
        Self { executor }
    }

    pub async fn get_sds_info(&self, material_code: &str) -> Result<Option<SdsInfo>, StoreError> {
        self.fetch_by_code(queries::SDS_INFO_BY_CODE, material_code)
            .await
    }

    pub async fn get_hazards(&self, material_code: &str) -> Result<Option<Hazards>, StoreError> {
        self.fetch_by_code(queries::HAZARDS_BY_CODE, material_code)
            .await
    }

    pub async fn get_properties(
        &self,
        material_code: &str,
    ) -> Result<Option<Properties>, StoreError> {
        self.fetch_by_code(queries::PROPERTIES_BY_CODE, material_code)
            .await
    }

    pub async fn get_transport(
        &self,
        material_code: &str,
    ) -> Result<Option<Transport>, StoreError> {
        self.fetch_by_code(queries::TRANSPORT_BY_CODE, material_code)
            .await
    }

    pub async fn get_ghs(&self, material_code: &str) -> Result<Option<Ghs>, StoreError> {
        self.fetch_by_code(queries::GHS_BY_CODE, material_code).await
    }

    pub async fn get_dg(&self, material_code: &str) -> Result<Option<Dg>, StoreError> {
        self.fetch_by_code(queries::DG_BY_CODE, material_code).await
    }

    /// Ingredient rows for one material, ordered by ingredient sequence.
    pub async fn get_composition(
        &self,
        material_id: i64,
    ) -> Result<Vec<CompositionRow>, StoreError> {
        let rows = self
            .executor
            .fetch_all(queries::COMPOSITION_BY_ID, &[SqlParam::Int(material_id)])
            .await?;
        Ok(rows.into_iter().map(project_row).collect())
    }

    /// Toxicology rows, fetched alongside the other details. The column set
    /// varies by extractor version, so these stay raw mappings; the current
    /// response shape reserves them without projecting any field.
    pub async fn get_toxicology(&self, material_id: i64) -> Result<Vec<Row>, StoreError> {
        self.executor
            .fetch_all(queries::TOXICOLOGY_BY_ID, &[SqlParam::Int(material_id)])
            .await
    }

    async fn fetch_by_code<T>(&self, sql: &str, material_code: &str) -> Result<Option<T>, StoreError>
    where
        T: serde::de::DeserializeOwned + Default,
    {
        let row = self
            .executor
            .fetch_one(sql, &[material_code.into()])
            .await?;
        Ok(row.map(project_row))
    }
}

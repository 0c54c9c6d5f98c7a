//! Material aggregation service.
//!
//! Orchestrates one listing request end to end: page the master table, fan
//! out the eight detail fetches per material concurrently, isolate failures
//! at two levels, run the section formatters, and assemble the response
//! with pagination metadata.
//!
//! Failure isolation layers, innermost first:
//!
//! 1. Each detail fetch is guarded individually. A failing fetch yields its
//!    fallback (no row / no rows) and a [`DetailFailure`] entry; one bad
//!    detail table never blanks out a page.
//! 2. Each record is assembled in its own task. A record whose assembly
//!    fails or panics is dropped from the page; its siblings are unaffected
//!    and `total_records` keeps the true count.
//!
//! Only the page-level count/list step is fatal: without the master list
//! there is nothing to aggregate.

use std::future::Future;
use std::sync::Arc;

use anyhow::Context;
use futures::future::join_all;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, warn};

use super::executor::SqlExecutor;
use super::material_details_repository::MaterialDetailsRepository;
use super::material_repository::{MasterRecord, MaterialRepository};
use crate::error::{ServiceError, StoreError};
use crate::pagination::PaginationMeta;
use crate::sections::{
    decode_pictograms, format_section14, format_section2, format_section3, format_section9,
};

/// Hard cap on the requested page size.
pub const MAX_PAGE_SIZE: u32 = 200;

/// Which fetch or decode produced an isolated failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailKind {
    SdsInfo,
    Hazards,
    Properties,
    Transport,
    Ghs,
    Dg,
    Composition,
    Toxicology,
    Pictograms,
}

/// One failure absorbed during aggregation, kept out of the serialized
/// response but exposed so callers and tests can observe isolation without
/// scraping logs.
#[derive(Debug, Clone)]
pub struct DetailFailure {
    pub material_code: String,
    pub kind: DetailKind,
    pub error: String,
}

/// The four formatted response sections.
#[derive(Debug, Clone, Serialize)]
pub struct SectionSet {
    pub section2: Value,
    pub section3: Value,
    pub section9: Value,
    pub section14: Value,
}

/// One fully aggregated material record.
///
/// Field names follow the established response contract, including the two
/// legacy display-style review-date keys.
#[derive(Debug, Clone, Serialize)]
pub struct AggregatedMaterial {
    pub id: Option<i64>,
    pub material_id: String,
    pub material_name: Option<String>,
    pub internal_code: String,
    pub intended_use: Option<String>,
    pub product_type: Option<String>,
    pub part_number: Option<String>,
    pub source: Option<String>,
    pub sdssheet_url: Option<String>,
    pub manufacturer: Option<String>,
    pub manufacturer_location: Option<String>,
    pub emergency_contact: Option<String>,
    pub ai_recommended_dgcode: Option<String>,
    pub rationale_summary: Option<String>,
    pub ghs_rationale: Option<String>,
    pub dg_rationale: Option<String>,
    pub ghs_status: Option<String>,
    pub dg_status: Option<String>,
    pub ghs_pictograms: Vec<String>,
    pub hazardous_waste: Option<String>,
    #[serde(rename = "GHS Approval/Rejection Date")]
    pub ghs_reviewed_at: Option<String>,
    #[serde(rename = "DG Approval/Rejection Date")]
    pub dg_reviewed_at: Option<String>,
    pub feedback: String,
    pub sections: SectionSet,
    pub uploaded_date: Option<String>,
}

/// Meta block of a listing response.
#[derive(Debug, Clone, Serialize)]
pub struct ListingMeta {
    pub pagination: PaginationMeta,
}

/// Result of one listing request.
#[derive(Debug, Serialize)]
pub struct MaterialListing {
    pub data: Vec<AggregatedMaterial>,
    pub meta: ListingMeta,

    /// Isolated fetch/decode failures absorbed while building this page.
    #[serde(skip)]
    pub detail_failures: Vec<DetailFailure>,

    /// Records dropped by the record-level isolation layer.
    #[serde(skip)]
    pub dropped_records: usize,
}

struct BuiltMaterial {
    record: AggregatedMaterial,
    failures: Vec<DetailFailure>,
}

/// Aggregation service over the master and detail repositories.
pub struct MaterialService<E> {
    materials: MaterialRepository<E>,
    details: MaterialDetailsRepository<E>,
}

impl<E> Clone for MaterialService<E> {
    fn clone(&self) -> Self {
        Self {
            materials: self.materials.clone(),
            details: self.details.clone(),
        }
    }
}

impl<E: SqlExecutor + 'static> MaterialService<E> {
    pub fn new(executor: Arc<E>) -> Self {
        Self {
            materials: MaterialRepository::new(Arc::clone(&executor)),
            details: MaterialDetailsRepository::new(executor),
        }
    }

    /// List one page of aggregated materials.
    ///
    /// Validation happens before any store access. The count and listing
    /// queries run concurrently; either failing aborts the request. All
    /// later failures are isolated per fetch or per record and reported
    /// through [`MaterialListing::detail_failures`] / `dropped_records`.
    pub async fn list_materials(
        &self,
        material_type: &str,
        page: u32,
        page_size: u32,
    ) -> Result<MaterialListing, ServiceError> {
        if page < 1 {
            return Err(ServiceError::InvalidArgument("page must be >= 1".into()));
        }
        if page_size < 1 {
            return Err(ServiceError::InvalidArgument(
                "page_size must be >= 1".into(),
            ));
        }
        if page_size > MAX_PAGE_SIZE {
            return Err(ServiceError::InvalidArgument(format!(
                "page_size must be <= {MAX_PAGE_SIZE}"
            )));
        }

        let offset = u64::from(page - 1) * u64::from(page_size);
        let (total_records, masters) = tokio::try_join!(
            self.materials.count_by_type(material_type),
            self.materials.list_by_type(material_type, page_size, offset),
        )?;

        // Record-level fan-out. Each record assembles in its own task so a
        // panicking formatter drops that record alone; spawn order keeps
        // the master-list ordering through join_all.
        let handles: Vec<_> = masters
            .into_iter()
            .map(|master| {
                let service = self.clone();
                tokio::spawn(async move { service.build_material(master).await })
            })
            .collect();

        let spawned = handles.len();
        let mut data = Vec::with_capacity(spawned);
        let mut detail_failures = Vec::new();
        let mut dropped_records = 0usize;

        for outcome in join_all(handles).await {
            match outcome {
                Ok(Ok(built)) => {
                    detail_failures.extend(built.failures);
                    data.push(built.record);
                }
                Ok(Err(err)) => {
                    warn!("material assembly failed, dropping record: {err:#}");
                    dropped_records += 1;
                }
                Err(err) => {
                    warn!("material assembly task aborted, dropping record: {err}");
                    dropped_records += 1;
                }
            }
        }

        // Policy: a page remains a success even when every record on it was
        // dropped; the caller sees an empty data array against the true
        // total. It is loud in the logs because it usually means a
        // formatter regression rather than bad data.
        if spawned > 0 && data.is_empty() {
            error!(
                records = spawned,
                material_type, "every record on the page failed to assemble"
            );
        }

        Ok(MaterialListing {
            data,
            meta: ListingMeta {
                pagination: PaginationMeta::build(page, page_size, total_records),
            },
            detail_failures,
            dropped_records,
        })
    }

    /// Assemble one material: fan out the eight detail fetches, decode the
    /// embedded formats, and run the section formatters.
    async fn build_material(&self, master: MasterRecord) -> anyhow::Result<BuiltMaterial> {
        let material_code = master
            .material_code
            .clone()
            .context("master row has no material_code")?;
        let material_id = master.material_id.unwrap_or_default();

        let (
            (sds_info, f_info),
            (hazards, f_hazards),
            (properties, f_properties),
            (transport, f_transport),
            (ghs, f_ghs),
            (dg, f_dg),
            (composition, f_composition),
            (_toxicology, f_toxicology),
        ) = tokio::join!(
            isolate(
                self.details.get_sds_info(&material_code),
                None,
                DetailKind::SdsInfo,
                &material_code,
            ),
            isolate(
                self.details.get_hazards(&material_code),
                None,
                DetailKind::Hazards,
                &material_code,
            ),
            isolate(
                self.details.get_properties(&material_code),
                None,
                DetailKind::Properties,
                &material_code,
            ),
            isolate(
                self.details.get_transport(&material_code),
                None,
                DetailKind::Transport,
                &material_code,
            ),
            isolate(
                self.details.get_ghs(&material_code),
                None,
                DetailKind::Ghs,
                &material_code,
            ),
            isolate(
                self.details.get_dg(&material_code),
                None,
                DetailKind::Dg,
                &material_code,
            ),
            isolate(
                self.details.get_composition(material_id),
                Vec::new(),
                DetailKind::Composition,
                &material_code,
            ),
            isolate(
                self.details.get_toxicology(material_id),
                Vec::new(),
                DetailKind::Toxicology,
                &material_code,
            ),
        );

        let mut failures: Vec<DetailFailure> = [
            f_info,
            f_hazards,
            f_properties,
            f_transport,
            f_ghs,
            f_dg,
            f_composition,
            f_toxicology,
        ]
        .into_iter()
        .flatten()
        .collect();

        let ghs_pictograms =
            match decode_pictograms(hazards.as_ref().and_then(|h| h.pictograms.as_deref())) {
                Ok(list) => list,
                Err(err) => {
                    warn!(
                        material_code = %material_code,
                        error = %err,
                        "bad pictogram JSON, using empty list"
                    );
                    failures.push(DetailFailure {
                        material_code: material_code.clone(),
                        kind: DetailKind::Pictograms,
                        error: err.to_string(),
                    });
                    Vec::new()
                }
            };

        let sections = SectionSet {
            section2: format_section2(hazards.as_ref()),
            section3: format_section3(
                &composition,
                sds_info.as_ref(),
                ghs.as_ref(),
                dg.as_ref(),
            ),
            section9: format_section9(properties.as_ref()),
            section14: format_section14(transport.as_ref()),
        };

        let info = sds_info.unwrap_or_default();
        let ghs = ghs.unwrap_or_default();
        let dg = dg.unwrap_or_default();

        let record = AggregatedMaterial {
            id: master.material_id,
            material_id: material_code,
            material_name: master.material_name,
            internal_code: String::new(),
            intended_use: info.recommended_use,
            product_type: composition.first().and_then(|row| row.product_type.clone()),
            part_number: info.product_identifier,
            source: master.source_file_path,
            sdssheet_url: master.pdf_file_path,
            manufacturer: info.supplier_name,
            manufacturer_location: info.supplier_address,
            emergency_contact: info.emergency_phone,
            ai_recommended_dgcode: dg.dg_classification,
            rationale_summary: dg.rationale_summary,
            ghs_rationale: ghs.ghs_reason,
            dg_rationale: dg.dg_reason,
            ghs_status: ghs.ghs_status,
            dg_status: dg.dg_status,
            ghs_pictograms,
            hazardous_waste: dg.hazardous_waste,
            ghs_reviewed_at: ghs.reviewed_at,
            dg_reviewed_at: dg.reviewed_at,
            feedback: String::new(),
            sections,
            uploaded_date: master.extraction_timestamp,
        };

        Ok(BuiltMaterial { record, failures })
    }
}

/// Guard one detail fetch: a store failure yields the fallback value plus a
/// recorded [`DetailFailure`] instead of propagating. Siblings are never
/// cancelled; the join point simply sees the fallback.
async fn isolate<T>(
    fetch: impl Future<Output = Result<T, StoreError>>,
    fallback: T,
    kind: DetailKind,
    material_code: &str,
) -> (T, Option<DetailFailure>) {
    match fetch.await {
        Ok(value) => (value, None),
        Err(err) => {
            warn!(
                material_code = %material_code,
                kind = ?kind,
                error = %err,
                "detail fetch failed, using fallback"
            );
            (
                fallback,
                Some(DetailFailure {
                    material_code: material_code.to_string(),
                    kind,
                    error: err.to_string(),
                }),
            )
        }
    }
}

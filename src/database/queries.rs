//! SQL statements for the master and detail tables.
//!
//! The relational schema is an external contract owned by the extraction
//! pipeline; these statements read it, never shape it. Parameters bind
//! positionally (`$1`, `$2`, ...).

/// Total master rows for one material type. `$1` = material type.
pub const COUNT_MASTERS_BY_TYPE: &str = r#"
    SELECT COUNT(*) AS total
    FROM material_sds_master
    WHERE source_material_type = $1
"#;

/// One page of master rows, most recently extracted first. Tie order among
/// equal timestamps follows natural store order and is not stable.
/// `$1` = material type, `$2` = limit, `$3` = offset.
pub const LIST_MASTERS_BY_TYPE: &str = r#"
    SELECT *
    FROM material_sds_master
    WHERE source_material_type = $1
    ORDER BY extraction_timestamp DESC
    LIMIT $2 OFFSET $3
"#;

/// `$1` = material code for all code-keyed detail tables below.
pub const SDS_INFO_BY_CODE: &str = r#"
    SELECT *
    FROM sds_table
    WHERE material_code = $1
"#;

pub const HAZARDS_BY_CODE: &str = r#"
    SELECT *
    FROM sds_hazards
    WHERE material_code = $1
"#;

pub const PROPERTIES_BY_CODE: &str = r#"
    SELECT physical_state, appearance, odor, flash_point, boiling_point, vapor_pressure
    FROM sds_properties
    WHERE material_code = $1
"#;

pub const TRANSPORT_BY_CODE: &str = r#"
    SELECT *
    FROM sds_transportation
    WHERE material_code = $1
"#;

pub const GHS_BY_CODE: &str = r#"
    SELECT *
    FROM material_ghs_classification
    WHERE material_code = $1
"#;

pub const DG_BY_CODE: &str = r#"
    SELECT *
    FROM material_dg_classification
    WHERE material_code = $1
"#;

/// `$1` = numeric material id for the two id-keyed, one-to-many tables.
pub const COMPOSITION_BY_ID: &str = r#"
    SELECT chemical_name, cas_number, concentration, product_type
    FROM sds_composition
    WHERE material_id = $1
    ORDER BY ingredient_sequence
"#;

pub const TOXICOLOGY_BY_ID: &str = r#"
    SELECT *
    FROM sds_toxicology
    WHERE material_id = $1
"#;

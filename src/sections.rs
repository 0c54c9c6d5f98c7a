//! Section formatters for the aggregated SDS response.
//!
//! Four pure transforms, one per response section: hazards (section 2),
//! composition (section 3), physical properties (section 9), and transport
//! (section 14). No I/O; every embedded-format decode degrades to an empty
//! value instead of failing, so a malformed detail row can never blank out
//! a material. All four return `{}` for a missing input row.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{json, Map, Value};

use crate::database::{CompositionRow, Dg, Ghs, Hazards, Properties, SdsInfo, Transport};

/// Hazard statement codes: `H` followed by exactly three digits.
static H_CODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"H\d{3}").unwrap());

/// Precautionary codes, including combined forms like `P301+P312`.
static P_CODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"P[\d+]+").unwrap());

const CARCINOGENICITY_NOTE: &str = "Not specified in source material.";

const SECTION2_NOTES: &str = "These classifications are explicitly stated by the manufacturer \
     in Section 2 and supported by component toxicology in Sections 3 and 11.";

const COMBUSTIBLE_LIQUID_NOTE: &str = "Flash point exceeds 60 \u{b0}C, excluding it from Class 3 \
     flammable liquids but still meeting the U.S. definition of a combustible liquid.";

/// Decode the JSON-encoded pictogram list stored on the hazards row.
///
/// Missing or blank input is an empty list; malformed JSON is the caller's
/// signal to record a warning and fall back to empty.
pub fn decode_pictograms(raw: Option<&str>) -> Result<Vec<String>, serde_json::Error> {
    match raw {
        None => Ok(Vec::new()),
        Some(s) if s.trim().is_empty() => Ok(Vec::new()),
        Some(s) => serde_json::from_str(s),
    }
}

/// Hazard identification (section 2).
pub fn format_section2(hazards: Option<&Hazards>) -> Value {
    let Some(h) = hazards else {
        return json!({});
    };

    let pictograms = decode_pictograms(h.pictograms.as_deref()).unwrap_or_default();

    // "Flammable liquid, Category 3; Skin irritant, Category 2" ->
    // ["Flammable liquid", "Skin irritant"]
    let hazard_phrases: Vec<String> = h
        .classification
        .as_deref()
        .unwrap_or_default()
        .split(';')
        .filter_map(|part| {
            let phrase = part.split(',').next().unwrap_or_default().trim();
            (!phrase.is_empty()).then(|| phrase.to_string())
        })
        .collect();

    let hazard_statements = h.hazard_statements.as_deref().unwrap_or_default();
    let precautionary_statements = h.precautionary_statements.as_deref().unwrap_or_default();

    let hazard_codes = extract_codes(&H_CODE_RE, hazard_statements);
    let precautionary_codes = extract_codes(&P_CODE_RE, precautionary_statements);

    // Pictogram codes first, then H codes, in source order.
    let mut ghs_codes = pictograms;
    ghs_codes.extend(hazard_codes);

    json!({
        "classification": h.classification,
        "hazards": hazard_phrases,
        "ghs_codes": ghs_codes,
        "signal_word": h.signal_word,
        "hazard_statements": hazard_statements.trim_matches('"'),
        "precautionary_codes": precautionary_codes,
        "precautionary_statements": precautionary_statements.trim_matches('"'),
        "carcinogenicity": CARCINOGENICITY_NOTE,
        "additional_notes": SECTION2_NOTES,
    })
}

/// Composition and ingredient information (section 3).
///
/// The GHS/DG inputs are part of the formatter contract but the
/// per-ingredient `ghs_classification` and `hazard_statements` lists are
/// empty placeholders for now; upstream has not decided whether they will
/// ever be populated per ingredient.
pub fn format_section3(
    composition: &[CompositionRow],
    sds_info: Option<&SdsInfo>,
    _ghs: Option<&Ghs>,
    _dg: Option<&Dg>,
) -> Value {
    let Some(first) = composition.first() else {
        return json!({});
    };

    let info = sds_info.cloned().unwrap_or_default();
    let text = |field: &Option<String>| field.clone().unwrap_or_default();

    let description = format!(
        "{} - Fragrance / Perfume compound. Product Identifier: {}, Internal code: {}. \
         Manufacturer: {}, {}.",
        text(&info.product_name),
        text(&info.product_identifier),
        text(&info.material_code),
        text(&info.supplier_name),
        text(&info.supplier_address),
    );

    let ingredients: Vec<Value> = composition
        .iter()
        .map(|row| {
            json!({
                "chemical_name": row.chemical_name,
                "cas_number": row.cas_number,
                "concentration": row.concentration,
                "ghs_classification": [],
                "hazard_statements": [],
            })
        })
        .collect();

    json!({
        "chemical_nature": first.product_type,
        "description": description,
        "composition": ingredients,
    })
}

/// Physical and chemical properties (section 9).
pub fn format_section9(properties: Option<&Properties>) -> Value {
    let Some(p) = properties else {
        return json!({});
    };

    let flash_point = p.flash_point.as_deref().map(repair_degree_encoding);
    let note = flash_point
        .as_deref()
        .filter(|fp| fp.contains("\u{b0}C"))
        .map(|_| COMBUSTIBLE_LIQUID_NOTE);

    json!({
        "physical_state": p.physical_state,
        "appearance": p.appearance,
        "odour": p.odor,
        "flash_point": flash_point,
        "boiling_point": p.boiling_point,
        "vapour_pressure": p.vapor_pressure,
        "note": note,
    })
}

/// Transport information (section 14).
pub fn format_section14(transport: Option<&Transport>) -> Value {
    let Some(t) = transport else {
        return json!({});
    };

    let iata = parse_literal_map(t.air_transport.as_deref());
    let imdg = parse_literal_map(t.maritime_transport.as_deref());

    json!({
        "dot": t.road_transport,
        "iata": snake_case_keys(iata),
        "imdg": snake_case_keys(imdg),
        "otherInformation": t.special_precautions,
    })
}

fn extract_codes(pattern: &Regex, text: &str) -> Vec<String> {
    pattern
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Repair the UTF-8-read-as-Latin-1 degree sequences the extraction
/// pipeline leaves in flash-point text (`Â°F` -> `°F`, `Â°C` -> `°C`).
fn repair_degree_encoding(text: &str) -> String {
    text.replace("\u{c2}\u{b0}F", "\u{b0}F")
        .replace("\u{c2}\u{b0}C", "\u{b0}C")
        .trim()
        .to_string()
}

/// Parse a stringified dict column into a JSON map.
///
/// The extraction pipeline wrote these columns with Python's `repr`, so the
/// common case is single-quoted keys and values with `None`/`True`/`False`
/// tokens. Proper JSON is accepted as-is; anything unparseable yields an
/// empty map.
fn parse_literal_map(raw: Option<&str>) -> Map<String, Value> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Map::new();
    };

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(raw) {
        return map;
    }

    match serde_json::from_str::<Value>(&python_literal_to_json(raw)) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

/// Rewrite a Python dict literal into JSON text: single-quoted strings
/// become double-quoted, and bare `None`/`True`/`False` become their JSON
/// equivalents. Escapes inside strings are preserved.
fn python_literal_to_json(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 8);
    let mut chars = raw.chars().peekable();
    let mut in_string = false;

    while let Some(ch) = chars.next() {
        if in_string {
            match ch {
                '\'' => {
                    in_string = false;
                    out.push('"');
                }
                '"' => out.push_str("\\\""),
                '\\' => match chars.next() {
                    // \' inside a single-quoted string is a literal quote
                    Some('\'') => out.push('\''),
                    Some(next) => {
                        out.push('\\');
                        out.push(next);
                    }
                    None => out.push('\\'),
                },
                _ => out.push(ch),
            }
        } else {
            match ch {
                '\'' => {
                    in_string = true;
                    out.push('"');
                }
                'A'..='Z' | 'a'..='z' | '_' => {
                    let mut word = String::new();
                    word.push(ch);
                    while let Some(&next) = chars.peek() {
                        if next.is_ascii_alphanumeric() || next == '_' {
                            word.push(next);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    match word.as_str() {
                        "None" => out.push_str("null"),
                        "True" => out.push_str("true"),
                        "False" => out.push_str("false"),
                        _ => out.push_str(&word),
                    }
                }
                _ => out.push(ch),
            }
        }
    }

    out
}

/// Convert the top-level keys of a parsed transport map from camelCase to
/// snake_case. Values pass through untouched.
fn snake_case_keys(map: Map<String, Value>) -> Value {
    let converted: Map<String, Value> = map
        .into_iter()
        .map(|(key, value)| (camel_to_snake(&key), value))
        .collect();
    Value::Object(converted)
}

fn camel_to_snake(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for (i, ch) in key.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hazards_fixture() -> Hazards {
        Hazards {
            classification: Some(
                "Flammable liquid, Category 3; Skin sensitizer, Category 1".into(),
            ),
            pictograms: Some(r#"["GHS02", "GHS07"]"#.into()),
            signal_word: Some("Warning".into()),
            hazard_statements: Some("\"H226 Flammable liquid and vapour. H317 May cause an allergic skin reaction.\"".into()),
            precautionary_statements: Some("\"P210 Keep away from heat. P301+P312 IF SWALLOWED call a doctor.\"".into()),
        }
    }

    #[test]
    fn test_section2_empty_input_yields_empty_object() {
        assert_eq!(format_section2(None), serde_json::json!({}));
    }

    #[test]
    fn test_section2_splits_classification_phrases() {
        let section = format_section2(Some(&hazards_fixture()));
        assert_eq!(
            section["hazards"],
            serde_json::json!(["Flammable liquid", "Skin sensitizer"])
        );
    }

    #[test]
    fn test_section2_unions_pictograms_and_h_codes() {
        let section = format_section2(Some(&hazards_fixture()));
        assert_eq!(
            section["ghs_codes"],
            serde_json::json!(["GHS02", "GHS07", "H226", "H317"])
        );
    }

    #[test]
    fn test_section2_extracts_combined_p_codes() {
        let section = format_section2(Some(&hazards_fixture()));
        assert_eq!(
            section["precautionary_codes"],
            serde_json::json!(["P210", "P301+P312"])
        );
    }

    #[test]
    fn test_section2_strips_surrounding_quotes() {
        let section = format_section2(Some(&hazards_fixture()));
        let statements = section["hazard_statements"].as_str().unwrap();
        assert!(statements.starts_with("H226"));
        assert!(!statements.contains('"'));
    }

    #[test]
    fn test_section2_malformed_pictograms_degrade_to_h_codes_only() {
        let mut hazards = hazards_fixture();
        hazards.pictograms = Some("not json at all".into());
        let section = format_section2(Some(&hazards));
        assert_eq!(section["ghs_codes"], serde_json::json!(["H226", "H317"]));
    }

    #[test]
    fn test_section2_is_deterministic() {
        let hazards = hazards_fixture();
        assert_eq!(
            format_section2(Some(&hazards)),
            format_section2(Some(&hazards))
        );
    }

    #[test]
    fn test_section3_empty_composition_yields_empty_object() {
        let info = SdsInfo::default();
        assert_eq!(
            format_section3(&[], Some(&info), None, None),
            serde_json::json!({})
        );
    }

    #[test]
    fn test_section3_chemical_nature_from_first_row() {
        let rows = vec![
            CompositionRow {
                chemical_name: Some("Linalool".into()),
                cas_number: Some("78-70-6".into()),
                concentration: Some("10-20%".into()),
                product_type: Some("Fragrance compound".into()),
            },
            CompositionRow {
                chemical_name: Some("Limonene".into()),
                cas_number: Some("5989-27-5".into()),
                concentration: Some("1-5%".into()),
                product_type: Some("ignored".into()),
            },
        ];
        let section = format_section3(&rows, None, None, None);
        assert_eq!(
            section["chemical_nature"],
            serde_json::json!("Fragrance compound")
        );
        assert_eq!(section["composition"].as_array().unwrap().len(), 2);
        // per-ingredient classifications are an empty placeholder by contract
        assert_eq!(
            section["composition"][0]["ghs_classification"],
            serde_json::json!([])
        );
        assert_eq!(
            section["composition"][1]["hazard_statements"],
            serde_json::json!([])
        );
    }

    #[test]
    fn test_section3_description_interpolates_identity_fields() {
        let rows = vec![CompositionRow {
            product_type: Some("Compound".into()),
            ..Default::default()
        }];
        let info = SdsInfo {
            product_name: Some("Rose Oil 5123".into()),
            product_identifier: Some("RO-5123".into()),
            material_code: Some("RM-0042".into()),
            supplier_name: Some("Acme Aromatics".into()),
            supplier_address: Some("12 Perfume Way, Grasse".into()),
            ..Default::default()
        };
        let section = format_section3(&rows, Some(&info), None, None);
        let description = section["description"].as_str().unwrap();
        assert!(description.contains("Rose Oil 5123"));
        assert!(description.contains("RO-5123"));
        assert!(description.contains("RM-0042"));
        assert!(description.contains("Acme Aromatics"));
        assert!(description.contains("Grasse"));
    }

    #[test]
    fn test_section9_empty_input_yields_empty_object() {
        assert_eq!(format_section9(None), serde_json::json!({}));
    }

    #[test]
    fn test_section9_repairs_degree_encoding_and_renames() {
        let props = Properties {
            physical_state: Some("Liquid".into()),
            appearance: Some("Pale yellow".into()),
            odor: Some("Floral".into()),
            flash_point: Some("  93 \u{c2}\u{b0}C (199 \u{c2}\u{b0}F) ".into()),
            boiling_point: Some("> 200 \u{b0}C".into()),
            vapor_pressure: Some("0.1 hPa".into()),
        };
        let section = format_section9(Some(&props));
        assert_eq!(
            section["flash_point"],
            serde_json::json!("93 \u{b0}C (199 \u{b0}F)")
        );
        assert_eq!(section["odour"], serde_json::json!("Floral"));
        assert_eq!(section["vapour_pressure"], serde_json::json!("0.1 hPa"));
        assert!(section.get("odor").is_none());
    }

    #[test]
    fn test_section9_note_only_for_celsius_flash_point() {
        let celsius = Properties {
            flash_point: Some("93 \u{b0}C".into()),
            ..Default::default()
        };
        let section = format_section9(Some(&celsius));
        assert!(section["note"].as_str().unwrap().contains("combustible"));

        let fahrenheit = Properties {
            flash_point: Some("199 \u{b0}F".into()),
            ..Default::default()
        };
        let section = format_section9(Some(&fahrenheit));
        assert!(section["note"].is_null());
    }

    #[test]
    fn test_section14_empty_input_yields_empty_object() {
        assert_eq!(format_section14(None), serde_json::json!({}));
    }

    #[test]
    fn test_section14_parses_python_literal_and_snake_cases_keys() {
        let transport = Transport {
            road_transport: Some("Not regulated".into()),
            air_transport: Some("{'unNumber': '1234', 'properShippingName': 'Perfumery products'}".into()),
            maritime_transport: Some("{'unNumber': '1234', 'marinePollutant': False, 'emsNumber': None}".into()),
            special_precautions: Some("Keep upright".into()),
        };
        let section = format_section14(Some(&transport));
        assert_eq!(section["iata"]["un_number"], serde_json::json!("1234"));
        assert_eq!(
            section["iata"]["proper_shipping_name"],
            serde_json::json!("Perfumery products")
        );
        assert_eq!(
            section["imdg"]["marine_pollutant"],
            serde_json::json!(false)
        );
        assert!(section["imdg"]["ems_number"].is_null());
        assert_eq!(section["dot"], serde_json::json!("Not regulated"));
        assert_eq!(
            section["otherInformation"],
            serde_json::json!("Keep upright")
        );
    }

    #[test]
    fn test_section14_unparseable_literal_degrades_to_empty_map() {
        let transport = Transport {
            air_transport: Some("{'unNumber': ".into()),
            maritime_transport: Some("garbage".into()),
            ..Default::default()
        };
        let section = format_section14(Some(&transport));
        assert_eq!(section["iata"], serde_json::json!({}));
        assert_eq!(section["imdg"], serde_json::json!({}));
    }

    #[test]
    fn test_section14_accepts_plain_json_column() {
        let transport = Transport {
            air_transport: Some(r#"{"unNumber": "9999"}"#.into()),
            ..Default::default()
        };
        let section = format_section14(Some(&transport));
        assert_eq!(section["iata"]["un_number"], serde_json::json!("9999"));
    }

    #[test]
    fn test_camel_to_snake() {
        assert_eq!(camel_to_snake("unNumber"), "un_number");
        assert_eq!(camel_to_snake("properShippingName"), "proper_shipping_name");
        assert_eq!(camel_to_snake("already_snake"), "already_snake");
        assert_eq!(camel_to_snake("UN"), "u_n");
    }

    #[test]
    fn test_decode_pictograms() {
        assert_eq!(decode_pictograms(None).unwrap(), Vec::<String>::new());
        assert_eq!(decode_pictograms(Some("  ")).unwrap(), Vec::<String>::new());
        assert_eq!(
            decode_pictograms(Some(r#"["GHS05"]"#)).unwrap(),
            vec!["GHS05".to_string()]
        );
        assert!(decode_pictograms(Some("{broken")).is_err());
    }
}

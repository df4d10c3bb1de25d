//! Prompts and schemas for insight generation calls.

use crate::equipment::EquipmentRecord;

/// Records included in the prompt summary; the rest are left out.
pub const MAX_SUMMARY_RECORDS: usize = 15;

/// Insights the model is asked for.
pub const REQUESTED_INSIGHTS: usize = 3;

/// System instruction for providers without native structured output.
pub const JSON_ONLY_SYSTEM_PROMPT: &str = "You are a chemical process engineering assistant. \
Always respond with a valid JSON array only, no markdown formatting or code blocks.";

/// Condense the first records into `Name (Type): Flow=.., Press=.., Temp=..` entries.
pub fn build_equipment_summary(records: &[EquipmentRecord]) -> String {
    records
        .iter()
        .take(MAX_SUMMARY_RECORDS)
        .map(|r| {
            format!(
                "{} ({}): Flow={}, Press={}, Temp={}",
                r.name, r.equipment_type, r.flowrate, r.pressure, r.temperature
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Build the analysis prompt for a record set.
pub fn build_insight_prompt(records: &[EquipmentRecord]) -> String {
    let summary = build_equipment_summary(records);

    format!(
        r#"As a chemical process engineer, analyze the following chemical equipment data summary:
{summary}

Identify {count} critical operational insights. For each insight, provide:
1. A short title.
2. Detailed observation.
3. A technical recommendation.
4. Risk level (Low, Medium, or High).

Respond with a JSON array of objects with exactly these keys:
"title", "observation", "recommendation", "riskLevel".
"riskLevel" must be one of "Low", "Medium", "High"."#,
        summary = summary,
        count = REQUESTED_INSIGHTS,
    )
}

/// JSON schema for a single insight object.
pub fn insight_item_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "title": { "type": "string" },
            "observation": { "type": "string" },
            "recommendation": { "type": "string" },
            "riskLevel": {
                "type": "string",
                "enum": ["Low", "Medium", "High"]
            }
        },
        "required": ["title", "observation", "recommendation", "riskLevel"],
        "additionalProperties": false
    })
}

/// Strict schema for OpenAI structured output.
///
/// OpenAI requires an object at the top level, so the array is wrapped
/// in an `insights` member.
pub fn insights_envelope_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "insights": {
                "type": "array",
                "items": insight_item_schema()
            }
        },
        "required": ["insights"],
        "additionalProperties": false
    })
}

/// Gemini `responseSchema` (OpenAPI subset, upper-case type names).
pub fn gemini_response_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "title": { "type": "STRING" },
                "observation": { "type": "STRING" },
                "recommendation": { "type": "STRING" },
                "riskLevel": {
                    "type": "STRING",
                    "enum": ["Low", "Medium", "High"]
                }
            },
            "required": ["title", "observation", "recommendation", "riskLevel"]
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equipment::parse_csv;
    use crate::equipment::sample::sample_records;

    #[test]
    fn test_summary_format() {
        let records = parse_csv("name,type,flowrate,pressure,temperature\nP1,Pump,12.5,3,40.25");
        assert_eq!(
            build_equipment_summary(&records),
            "P1 (Pump): Flow=12.5, Press=3, Temp=40.25"
        );
    }

    #[test]
    fn test_summary_joins_sample_records() {
        let summary = build_equipment_summary(&sample_records());
        assert!(summary.starts_with("Heat Exchanger 01 (Exchanger): Flow=450.5, Press=12.5, Temp=85.2; "));
        assert!(summary.contains("Distillation Column A (Tower): Flow=1200, Press=4.2, Temp=165"));
        assert_eq!(summary.matches("; ").count(), 9);
    }

    #[test]
    fn test_summary_caps_at_fifteen_records() {
        let mut csv = String::from("name,type\n");
        for i in 0..20 {
            csv.push_str(&format!("Unit {},Pump\n", i));
        }
        let summary = build_equipment_summary(&parse_csv(&csv));
        assert!(summary.contains("Unit 14 (Pump)"));
        assert!(!summary.contains("Unit 15 (Pump)"));
        assert_eq!(summary.split("; ").count(), MAX_SUMMARY_RECORDS);
    }

    #[test]
    fn test_prompt_mentions_summary_and_risk_levels() {
        let prompt = build_insight_prompt(&sample_records());
        assert!(prompt.contains("chemical process engineer"));
        assert!(prompt.contains("Condenser C22 (Exchanger)"));
        assert!(prompt.contains("Identify 3 critical operational insights"));
        assert!(prompt.contains("\"Low\", \"Medium\", \"High\""));
    }

    #[test]
    fn test_schemas_require_all_fields() {
        let item = insight_item_schema();
        assert_eq!(item["required"].as_array().unwrap().len(), 4);
        assert_eq!(item["properties"]["riskLevel"]["enum"].as_array().unwrap().len(), 3);

        let envelope = insights_envelope_schema();
        assert_eq!(envelope["properties"]["insights"]["items"], item);

        let gemini = gemini_response_schema();
        assert_eq!(gemini["type"], "ARRAY");
        assert_eq!(gemini["items"]["required"].as_array().unwrap().len(), 4);
    }
}

//! Deterministic fitness calculators.
//!
//! All four tools are pure: same arguments, same output, no I/O. Numeric
//! contracts are fixed (Mifflin-St Jeor BMR, the standard activity
//! multiplier table, g-per-kg macro targets) so agents can rely on them
//! instead of doing arithmetic in the model.

use async_trait::async_trait;
use serde_json::{Value, json};

use fitcoach_core::error::{FitCoachError, Result};
use fitcoach_core::traits::Tool;
use fitcoach_core::types::{ToolDefinition, ToolResult};

fn num_field(args: &Value, key: &str) -> Result<f64> {
    args.get(key)
        .and_then(|v| v.as_f64())
        .ok_or_else(|| FitCoachError::Tool(format!("Missing or non-numeric field: {key}")))
}

fn str_field<'a>(args: &'a Value, key: &str) -> Result<&'a str> {
    args.get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| FitCoachError::Tool(format!("Missing field: {key}")))
}

fn activity_multiplier(activity: &str) -> f64 {
    match activity {
        "sedentary" => 1.2,
        "light" => 1.375,
        "moderate" => 1.55,
        "high" => 1.725,
        _ => 1.55,
    }
}

/// `estimate_tdee`: Mifflin-St Jeor BMR scaled by an activity multiplier.
pub struct EstimateTdeeTool;

#[async_trait]
impl Tool for EstimateTdeeTool {
    fn name(&self) -> &str {
        "estimate_tdee"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "estimate_tdee".into(),
            description: "Estimate BMR (Mifflin-St Jeor) and TDEE from sex, age, height, weight, and activity level. Input is a JSON string.".into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "sex": { "type": "string", "description": "M or F" },
                    "age": { "type": "number" },
                    "height_cm": { "type": "number" },
                    "weight_kg": { "type": "number" },
                    "activity": { "type": "string", "description": "sedentary|light|moderate|high" }
                },
                "required": ["sex", "age", "height_cm", "weight_kg"]
            }),
        }
    }

    async fn execute(&self, arguments: &str) -> Result<ToolResult> {
        let args: Value = serde_json::from_str(arguments)?;
        let sex = str_field(&args, "sex")?;
        let age = num_field(&args, "age")?;
        let height = num_field(&args, "height_cm")?;
        let weight = num_field(&args, "weight_kg")?;
        let activity = args.get("activity").and_then(|v| v.as_str()).unwrap_or("moderate");

        let sex_term = if sex.to_uppercase().starts_with('M') { 5.0 } else { -161.0 };
        let bmr = 10.0 * weight + 6.25 * height - 5.0 * age + sex_term;
        let tdee = bmr * activity_multiplier(activity);

        let output = json!({
            "bmr": bmr.round() as i64,
            "tdee": tdee.round() as i64,
        });
        Ok(ToolResult { output: output.to_string() })
    }
}

/// `macro_plan`: daily kcal target and protein/fat/carb grams for a goal.
pub struct MacroPlanTool;

#[async_trait]
impl Tool for MacroPlanTool {
    fn name(&self) -> &str {
        "macro_plan"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "macro_plan".into(),
            description: "Compute a daily calorie target and protein/fat/carb macros from weight, TDEE, and goal (cut/recomp/bulk). Input is a JSON string.".into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "weight_kg": { "type": "number" },
                    "tdee": { "type": "number" },
                    "goal": { "type": "string", "description": "cut|recomp|bulk" }
                },
                "required": ["weight_kg", "tdee", "goal"]
            }),
        }
    }

    async fn execute(&self, arguments: &str) -> Result<ToolResult> {
        let args: Value = serde_json::from_str(arguments)?;
        let weight = num_field(&args, "weight_kg")?;
        let tdee = num_field(&args, "tdee")?;
        let goal = str_field(&args, "goal")?;

        let adjustment = match goal {
            "cut" => -0.2,
            "bulk" => 0.1,
            _ => 0.0,
        };
        let kcal = (tdee * (1.0 + adjustment)).round() as i64;
        let protein = (weight * 2.0).round() as i64;
        let fat = (weight * 0.8).round() as i64;
        let carbs = ((kcal - protein * 4 - fat * 9) / 4).max(0);

        let output = json!({
            "kcal": kcal,
            "protein_g": protein,
            "fat_g": fat,
            "carbs_g": carbs,
        });
        Ok(ToolResult { output: output.to_string() })
    }
}

/// `exercise_picker`: filter a fixed exercise table by muscle, available
/// equipment, and exercises to avoid.
pub struct ExercisePickerTool;

/// (muscle, exercise, equipment, RIR target)
const EXERCISE_TABLE: &[(&str, &str, &str, &str)] = &[
    ("Chest", "Barbell Bench Press", "barbell", "2-3"),
    ("Back", "Barbell Row", "barbell", "2-3"),
    ("Shoulders", "Overhead Press", "barbell", "2-3"),
    ("Legs", "Front Squat", "barbell", "2-3"),
    ("Legs", "Romanian Deadlift", "barbell", "2-3"),
    ("Delts", "Side Lateral Raise", "dumbbell", "1-2"),
    ("Triceps", "Cable Triceps Extension", "cable", "1-2"),
];

#[async_trait]
impl Tool for ExercisePickerTool {
    fn name(&self) -> &str {
        "exercise_picker"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "exercise_picker".into(),
            description: "Recommend exercises matching a muscle group, available equipment, and an avoid list. Input is a JSON string.".into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "muscle": { "type": "string" },
                    "equipment": { "type": "array", "items": { "type": "string" } },
                    "avoid": { "type": "array", "items": { "type": "string" } }
                }
            }),
        }
    }

    async fn execute(&self, arguments: &str) -> Result<ToolResult> {
        let args: Value = serde_json::from_str(arguments)?;
        let muscle = args.get("muscle").and_then(|v| v.as_str()).unwrap_or("Back");
        let equipment: Vec<String> = args
            .get("equipment")
            .and_then(|v| v.as_array())
            .map(|a| a.iter().filter_map(|v| v.as_str().map(String::from)).collect())
            .unwrap_or_else(|| vec!["barbell".into(), "dumbbell".into()]);
        let avoid: Vec<String> = args
            .get("avoid")
            .and_then(|v| v.as_array())
            .map(|a| a.iter().filter_map(|v| v.as_str().map(str::to_lowercase)).collect())
            .unwrap_or_default();

        let picks: Vec<Value> = EXERCISE_TABLE
            .iter()
            .filter(|(m, exercise, equip, _)| {
                m.eq_ignore_ascii_case(muscle)
                    && equipment.iter().any(|e| e == equip)
                    && !avoid.contains(&exercise.to_lowercase())
            })
            .take(6)
            .map(|(m, exercise, equip, rir)| {
                json!({ "muscle": m, "exercise": exercise, "equipment": equip, "RIR": rir })
            })
            .collect();

        let output = if picks.is_empty() {
            json!([{ "note": "No match" }])
        } else {
            Value::Array(picks)
        };
        Ok(ToolResult { output: output.to_string() })
    }
}

/// `contraindication_check`: warnings and substitutions for flagged
/// conditions or injuries.
pub struct ContraindicationCheckTool;

#[async_trait]
impl Tool for ContraindicationCheckTool {
    fn name(&self) -> &str {
        "contraindication_check"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "contraindication_check".into(),
            description: "Return cautions and substitute exercises for flagged injuries or conditions. Input is a JSON string with a conditions array.".into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "conditions": { "type": "array", "items": { "type": "string" } }
                }
            }),
        }
    }

    async fn execute(&self, arguments: &str) -> Result<ToolResult> {
        let args: Value = serde_json::from_str(arguments)?;
        let conditions: Vec<String> = args
            .get("conditions")
            .and_then(|v| v.as_array())
            .map(|a| a.iter().filter_map(|v| v.as_str().map(str::to_lowercase)).collect())
            .unwrap_or_default();

        let mut warnings = Vec::new();
        if conditions.iter().any(|c| c == "knee pain") {
            warnings.push("Knee: consider Split Squat/Leg Press instead of Front Squat");
        }
        if conditions.iter().any(|c| c == "shoulder pain") {
            warnings.push("Shoulder: consider Landmine Press/Incline DB Press instead of OHP");
        }
        if conditions.iter().any(|c| c == "hypertension") {
            warnings.push("Hypertension: avoid high-dose caffeine (>200mg); consult a physician");
        }
        if warnings.is_empty() {
            warnings.push("None");
        }

        Ok(ToolResult { output: json!(warnings).to_string() })
    }
}

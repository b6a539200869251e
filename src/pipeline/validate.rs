use serde_json::Value;

pub const MAX_MODEL_NAME_LEN: usize = 100;
pub const MAX_REGION_LEN: usize = 50;
pub const MAX_ACCELERATOR_LEN: usize = 50;
pub const MIN_TOKENS: f64 = 1.0;
pub const MAX_TOKENS: f64 = 1_000_000_000.0;

/// A workload that passed validation. Strings are already sanitized.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkloadRequest {
    pub model_name: String,
    pub tokens: u64,
    pub accelerator_label: String,
    pub cloud_region: String,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("request body must be a JSON object")]
    NotAnObject,
    #[error("modelName is required")]
    MissingModelName,
    #[error("modelName must be 1-100 characters")]
    InvalidModelName,
    #[error("tokens must be a number between 1 and 1000000000")]
    InvalidTokens,
    #[error("acceleratorLabel must be a string")]
    InvalidAcceleratorLabel,
    #[error("cloudRegion is required")]
    MissingCloudRegion,
    #[error("cloudRegion must be 1-50 characters")]
    InvalidCloudRegion,
}

fn is_model_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
}

fn is_region_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-')
}

fn sanitize(raw: &str, allowed: fn(char) -> bool, max_len: usize) -> String {
    raw.chars().filter(|c| allowed(*c)).take(max_len).collect()
}

pub fn sanitize_model_name(raw: &str) -> String {
    sanitize(raw, is_model_char, MAX_MODEL_NAME_LEN)
}

pub fn sanitize_region(raw: &str) -> String {
    sanitize(raw, is_region_char, MAX_REGION_LEN)
}

pub fn sanitize_accelerator(raw: &str) -> String {
    sanitize(raw, is_model_char, MAX_ACCELERATOR_LEN)
}

/// Checks a required string field against its raw length limit, then
/// sanitizes it. A value that sanitizes to nothing counts as empty.
fn required_field(
    value: Option<&Value>,
    max_len: usize,
    sanitizer: fn(&str) -> String,
    missing: ValidationError,
    invalid: ValidationError,
) -> Result<String, ValidationError> {
    let raw = match value {
        None | Some(Value::Null) => return Err(missing),
        Some(Value::String(s)) => s,
        Some(_) => return Err(invalid),
    };
    let len = raw.chars().count();
    if len == 0 || len > max_len {
        return Err(invalid);
    }
    let clean = sanitizer(raw);
    if clean.is_empty() {
        return Err(invalid);
    }
    Ok(clean)
}

fn tokens_field(value: Option<&Value>) -> Result<u64, ValidationError> {
    let n = value
        .and_then(Value::as_f64)
        .ok_or(ValidationError::InvalidTokens)?;
    if !n.is_finite() || !(MIN_TOKENS..=MAX_TOKENS).contains(&n) {
        return Err(ValidationError::InvalidTokens);
    }
    Ok(n.trunc() as u64)
}

fn accelerator_field(payload: &serde_json::Map<String, Value>) -> Result<String, ValidationError> {
    let value = payload
        .get("acceleratorLabel")
        .filter(|v| !v.is_null())
        .or_else(|| payload.get("gpuType"));
    match value {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(sanitize_accelerator(s)),
        Some(_) => Err(ValidationError::InvalidAcceleratorLabel),
    }
}

/// Turns an untyped payload into a [`WorkloadRequest`], or names the first
/// field that failed. Fields are checked in order: modelName, tokens,
/// acceleratorLabel, cloudRegion.
pub fn validate_workload(payload: &Value) -> Result<WorkloadRequest, ValidationError> {
    let obj = payload.as_object().ok_or(ValidationError::NotAnObject)?;

    let model_name = required_field(
        obj.get("modelName"),
        MAX_MODEL_NAME_LEN,
        sanitize_model_name,
        ValidationError::MissingModelName,
        ValidationError::InvalidModelName,
    )?;
    let tokens = tokens_field(obj.get("tokens"))?;
    let accelerator_label = accelerator_field(obj)?;
    let cloud_region = required_field(
        obj.get("cloudRegion"),
        MAX_REGION_LEN,
        sanitize_region,
        ValidationError::MissingCloudRegion,
        ValidationError::InvalidCloudRegion,
    )?;

    tracing::debug!(%model_name, tokens, %cloud_region, "workload validated");

    Ok(WorkloadRequest {
        model_name,
        tokens,
        accelerator_label,
        cloud_region,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base() -> Value {
        json!({ "modelName": "gpt-4", "tokens": 1000, "cloudRegion": "eu-west-1" })
    }

    fn with(field: &str, value: Value) -> Value {
        let mut v = base();
        v[field] = value;
        v
    }

    #[test]
    fn accepts_minimal_payload() {
        let req = validate_workload(&base()).unwrap();
        assert_eq!(
            req,
            WorkloadRequest {
                model_name: "gpt-4".into(),
                tokens: 1000,
                accelerator_label: String::new(),
                cloud_region: "eu-west-1".into(),
            }
        );
    }

    #[test]
    fn rejects_non_object() {
        assert_eq!(validate_workload(&json!([1, 2])), Err(ValidationError::NotAnObject));
        assert_eq!(validate_workload(&json!("gpt-4")), Err(ValidationError::NotAnObject));
    }

    #[test]
    fn token_bounds() {
        assert_eq!(
            validate_workload(&with("tokens", json!(0))),
            Err(ValidationError::InvalidTokens)
        );
        assert_eq!(
            validate_workload(&with("tokens", json!(1_000_000_001u64))),
            Err(ValidationError::InvalidTokens)
        );
        assert_eq!(
            validate_workload(&with("tokens", json!(-5))),
            Err(ValidationError::InvalidTokens)
        );
        assert_eq!(validate_workload(&with("tokens", json!(1))).unwrap().tokens, 1);
        assert_eq!(
            validate_workload(&with("tokens", json!(1_000_000_000u64))).unwrap().tokens,
            1_000_000_000
        );
    }

    #[test]
    fn tokens_must_be_numeric() {
        assert_eq!(
            validate_workload(&with("tokens", json!("1000"))),
            Err(ValidationError::InvalidTokens)
        );
        assert_eq!(
            validate_workload(&with("tokens", Value::Null)),
            Err(ValidationError::InvalidTokens)
        );
    }

    #[test]
    fn fractional_tokens_are_truncated() {
        assert_eq!(validate_workload(&with("tokens", json!(1500.99))).unwrap().tokens, 1500);
        assert_eq!(validate_workload(&with("tokens", json!(1.5))).unwrap().tokens, 1);
        assert_eq!(
            validate_workload(&with("tokens", json!(0.9))),
            Err(ValidationError::InvalidTokens)
        );
    }

    #[test]
    fn model_name_rules() {
        assert_eq!(
            validate_workload(&with("modelName", json!(""))),
            Err(ValidationError::InvalidModelName)
        );
        assert_eq!(
            validate_workload(&with("modelName", json!("a".repeat(101)))),
            Err(ValidationError::InvalidModelName)
        );
        assert_eq!(
            validate_workload(&with("modelName", json!("!!!"))),
            Err(ValidationError::InvalidModelName)
        );
        let mut missing = base();
        missing.as_object_mut().unwrap().remove("modelName");
        assert_eq!(validate_workload(&missing), Err(ValidationError::MissingModelName));
        assert!(validate_workload(&with("modelName", json!("a".repeat(100)))).is_ok());
    }

    #[test]
    fn region_rules() {
        assert_eq!(
            validate_workload(&with("cloudRegion", json!(""))),
            Err(ValidationError::InvalidCloudRegion)
        );
        assert_eq!(
            validate_workload(&with("cloudRegion", json!("r".repeat(51)))),
            Err(ValidationError::InvalidCloudRegion)
        );
        assert_eq!(
            validate_workload(&with("cloudRegion", json!(42))),
            Err(ValidationError::InvalidCloudRegion)
        );
        let mut missing = base();
        missing.as_object_mut().unwrap().remove("cloudRegion");
        assert_eq!(validate_workload(&missing), Err(ValidationError::MissingCloudRegion));
    }

    #[test]
    fn first_failing_field_wins() {
        let err = validate_workload(&json!({ "modelName": "", "tokens": 0 })).unwrap_err();
        assert_eq!(err, ValidationError::InvalidModelName);
        assert!(err.to_string().contains("modelName"));
    }

    #[test]
    fn strips_disallowed_characters() {
        assert_eq!(sanitize_model_name("gpt-4!!!"), "gpt-4");
        assert_eq!(sanitize_model_name("llama 2.70b<script>"), "llama2.70bscript");
        assert_eq!(sanitize_region("eu-west-1; DROP"), "eu-west-1DROP");
        assert_eq!(sanitize_region("eu.west.1"), "euwest1");
        let req = validate_workload(&with("modelName", json!("gpt-4!!!"))).unwrap();
        assert_eq!(req.model_name, "gpt-4");
    }

    #[test]
    fn accelerator_label_is_optional_and_sanitized() {
        let req = validate_workload(&with("acceleratorLabel", json!("NVIDIA A100 (80GB)"))).unwrap();
        assert_eq!(req.accelerator_label, "NVIDIAA10080GB");

        let req = validate_workload(&with("acceleratorLabel", json!("x".repeat(80)))).unwrap();
        assert_eq!(req.accelerator_label.len(), 50);

        let req = validate_workload(&with("acceleratorLabel", Value::Null)).unwrap();
        assert_eq!(req.accelerator_label, "");

        let req = validate_workload(&with("gpuType", json!("H100"))).unwrap();
        assert_eq!(req.accelerator_label, "H100");

        assert_eq!(
            validate_workload(&with("acceleratorLabel", json!(100))),
            Err(ValidationError::InvalidAcceleratorLabel)
        );
    }
}

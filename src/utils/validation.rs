use crate::core::naming::DELIMITER;
use crate::utils::error::{DumpError, Result};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(DumpError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(DumpError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| DumpError::MissingConfigError {
        field: field_name.to_string(),
    })
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DumpError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// 名稱會成為目錄及檔名的一部分
pub fn validate_name_component(field_name: &str, value: &str) -> Result<()> {
    validate_non_empty_string(field_name, value)?;

    let reason = if value.contains('/') || value.contains('\0') {
        Some("Value must not contain path separators or null bytes".to_string())
    } else if value == "." || value == ".." {
        Some("Value must not be a relative path component".to_string())
    } else if value.contains(DELIMITER) {
        Some(format!("Value must not contain the '{}' delimiter", DELIMITER))
    } else {
        None
    };

    match reason {
        Some(reason) => Err(DumpError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

pub fn validate_non_negative(field_name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(DumpError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value must be a finite number greater than or equal to 0".to_string(),
        });
    }
    Ok(())
}

//! Teacher and student login payloads

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use super::validation::{int_in_range, text, ValidationError};

const MIN_PASSWORD_LEN: usize = 8;
const MAX_TEACHER_NAME_LEN: usize = 40;
const MAX_STUDENT_NAME_LEN: usize = 30;
const CLASS_CODE_LEN: usize = 6;
const PIN_LEN: usize = 4;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("invalid email regex"));

fn email(value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field: "email" });
    }
    if !EMAIL_RE.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat {
            field: "email",
            reason: "must be a valid email address",
        });
    }
    Ok(trimmed.to_owned())
}

fn password(value: &str) -> Result<String, ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::Empty { field: "password" });
    }
    if value.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::TooShort {
            field: "password",
            min: MIN_PASSWORD_LEN,
        });
    }
    Ok(value.to_owned())
}

/// Class codes are compared upper-cased.
pub fn normalize_class_code(value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field: "classCode" });
    }
    if trimmed.chars().count() != CLASS_CODE_LEN {
        return Err(ValidationError::InvalidFormat {
            field: "classCode",
            reason: "must be exactly 6 characters",
        });
    }
    Ok(trimmed.to_uppercase())
}

/// PINs are exactly four ASCII digits.
pub fn validate_pin(value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field: "pinCode" });
    }
    if trimmed.len() != PIN_LEN || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "pinCode",
            reason: "must be 4 digits",
        });
    }
    Ok(trimmed.to_owned())
}

// ============================================================================
// Teachers
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TeacherSignupRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Validated teacher sign-up
#[derive(Debug, Clone)]
pub struct NewTeacher {
    pub email: String,
    pub password: String,
    pub name: String,
}

impl TeacherSignupRequest {
    pub fn validate(self) -> Result<NewTeacher, ValidationError> {
        Ok(NewTeacher {
            email: email(&self.email)?,
            password: password(&self.password)?,
            name: text("name", &self.name, 1, MAX_TEACHER_NAME_LEN)?,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TeacherLoginRequest {
    pub email: String,
    pub password: String,
}

/// Validated teacher credentials
#[derive(Debug, Clone)]
pub struct TeacherCredentials {
    pub email: String,
    pub password: String,
}

impl TeacherLoginRequest {
    pub fn validate(self) -> Result<TeacherCredentials, ValidationError> {
        Ok(TeacherCredentials {
            email: email(&self.email)?,
            password: password(&self.password)?,
        })
    }
}

// ============================================================================
// Students
// ============================================================================

/// Student login body.
///
/// Either `name`, or `studentNumber` together with `pinCode`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StudentLoginRequest {
    pub class_code: String,
    pub name: Option<String>,
    pub student_number: Option<i64>,
    pub pin_code: Option<String>,
}

/// How a student identifies themself inside a class
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudentCredentials {
    ByName {
        class_code: String,
        name: String,
    },
    ByNumber {
        class_code: String,
        student_number: i32,
        pin_code: String,
    },
}

impl StudentCredentials {
    pub fn class_code(&self) -> &str {
        match self {
            Self::ByName { class_code, .. } | Self::ByNumber { class_code, .. } => class_code,
        }
    }
}

impl StudentLoginRequest {
    pub fn validate(self) -> Result<StudentCredentials, ValidationError> {
        let class_code = normalize_class_code(&self.class_code)?;

        if let Some(name) = self.name.as_deref().filter(|n| !n.trim().is_empty()) {
            return Ok(StudentCredentials::ByName {
                class_code,
                name: text("name", name, 1, MAX_STUDENT_NAME_LEN)?,
            });
        }

        match (self.student_number, self.pin_code.as_deref()) {
            (Some(number), Some(pin)) => Ok(StudentCredentials::ByNumber {
                class_code,
                student_number: int_in_range("studentNumber", number, 1, 99)?,
                pin_code: validate_pin(pin)?,
            }),
            (Some(_), None) => Err(ValidationError::Empty { field: "pinCode" }),
            _ => Err(ValidationError::Empty { field: "name" }),
        }
    }
}

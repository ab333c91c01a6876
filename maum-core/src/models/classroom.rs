//! Class and roster payloads

use serde::Deserialize;

use super::auth::validate_pin;
use super::validation::{int_in_range, text, ValidationError};
use crate::credentials::generate_pin;

const MAX_CLASS_NAME_LEN: usize = 40;
const MAX_STUDENT_NAME_LEN: usize = 30;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClassCreateRequest {
    pub class_name: String,
    pub grade: Option<i64>,
    pub section: Option<i64>,
}

/// Validated class creation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClass {
    pub class_name: String,
    /// 1..=6
    pub grade: i32,
    /// 1..=20
    pub section: i32,
}

impl ClassCreateRequest {
    pub fn validate(self) -> Result<NewClass, ValidationError> {
        let class_name = text("className", &self.class_name, 1, MAX_CLASS_NAME_LEN)?;
        let grade = self.grade.ok_or(ValidationError::Empty { field: "grade" })?;
        let section = self.section.ok_or(ValidationError::Empty { field: "section" })?;

        Ok(NewClass {
            class_name,
            grade: int_in_range("grade", grade, 1, 6)?,
            section: int_in_range("section", section, 1, 20)?,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StudentCreateRequest {
    pub name: String,
    pub student_number: Option<i64>,
    pub pin_code: Option<String>,
}

/// Validated roster entry. A PIN is generated when none was supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStudent {
    pub name: String,
    pub student_number: i32,
    pub pin_code: String,
}

impl StudentCreateRequest {
    pub fn validate(self) -> Result<NewStudent, ValidationError> {
        let name = text("name", &self.name, 1, MAX_STUDENT_NAME_LEN)?;
        let number = self
            .student_number
            .ok_or(ValidationError::Empty { field: "studentNumber" })?;
        let pin_code = match self.pin_code.as_deref() {
            Some(pin) if !pin.trim().is_empty() => validate_pin(pin)?,
            _ => generate_pin(),
        };

        Ok(NewStudent {
            name,
            student_number: int_in_range("studentNumber", number, 1, 99)?,
            pin_code,
        })
    }
}

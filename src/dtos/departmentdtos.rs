// src/dtos/departmentdtos.rs
use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, Default, Clone)]
pub struct CreateCategoryDto {
    #[validate(length(min = 1, max = 100, message = "Category name is required"))]
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub sub_categories: Vec<String>,
}

#[derive(Debug, Deserialize, Validate, Default)]
pub struct CreateDepartmentDto {
    #[validate(length(min = 1, max = 100, message = "Department name is required"))]
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    #[validate]
    pub categories: Vec<CreateCategoryDto>,
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateDepartmentDto {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn department_name_is_required() {
        let dto = CreateDepartmentDto {
            name: "".to_string(),
            ..Default::default()
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn duplicate_category_names_are_permitted() {
        // Looseness preserved from the embedded-category design.
        let dto = CreateDepartmentDto {
            name: "IT".to_string(),
            description: None,
            categories: vec![
                CreateCategoryDto {
                    name: "Hardware".to_string(),
                    ..Default::default()
                },
                CreateCategoryDto {
                    name: "Hardware".to_string(),
                    ..Default::default()
                },
            ],
        };
        assert!(dto.validate().is_ok());
    }
}

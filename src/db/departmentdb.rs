// src/db/departmentdb.rs
use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::Error;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::departmentmodel::{Category, Department};

#[async_trait]
pub trait DepartmentExt {
    async fn create_department(
        &self,
        name: String,
        description: Option<String>,
        categories: Vec<Category>,
    ) -> Result<Department, Error>;

    async fn get_department(&self, department_id: Uuid) -> Result<Option<Department>, Error>;

    async fn get_departments(&self) -> Result<Vec<Department>, Error>;

    async fn update_department(
        &self,
        department_id: Uuid,
        name: Option<String>,
        description: Option<String>,
    ) -> Result<Option<Department>, Error>;

    async fn delete_department(&self, department_id: Uuid) -> Result<u64, Error>;

    /// Appends a category to the embedded list. Duplicate names are allowed.
    async fn add_category(
        &self,
        department_id: Uuid,
        category: Category,
    ) -> Result<Option<Department>, Error>;
}

#[async_trait]
impl DepartmentExt for DBClient {
    async fn create_department(
        &self,
        name: String,
        description: Option<String>,
        categories: Vec<Category>,
    ) -> Result<Department, Error> {
        let department = sqlx::query_as::<_, Department>(
            r#"
            INSERT INTO departments (name, description, categories)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(Json(categories))
        .fetch_one(&self.pool)
        .await?;

        Ok(department)
    }

    async fn get_department(&self, department_id: Uuid) -> Result<Option<Department>, Error> {
        let department = sqlx::query_as::<_, Department>(
            r#"
            SELECT * FROM departments
            WHERE id = $1
            "#,
        )
        .bind(department_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(department)
    }

    async fn get_departments(&self) -> Result<Vec<Department>, Error> {
        let departments = sqlx::query_as::<_, Department>(
            r#"
            SELECT * FROM departments
            ORDER BY name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(departments)
    }

    async fn update_department(
        &self,
        department_id: Uuid,
        name: Option<String>,
        description: Option<String>,
    ) -> Result<Option<Department>, Error> {
        let department = sqlx::query_as::<_, Department>(
            r#"
            UPDATE departments
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(department_id)
        .bind(name)
        .bind(description)
        .fetch_optional(&self.pool)
        .await?;

        Ok(department)
    }

    async fn delete_department(&self, department_id: Uuid) -> Result<u64, Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM departments
            WHERE id = $1
            "#,
        )
        .bind(department_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn add_category(
        &self,
        department_id: Uuid,
        category: Category,
    ) -> Result<Option<Department>, Error> {
        let department = sqlx::query_as::<_, Department>(
            r#"
            UPDATE departments
            SET categories = categories || $2,
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(department_id)
        .bind(Json(category))
        .fetch_optional(&self.pool)
        .await?;

        Ok(department)
    }
}

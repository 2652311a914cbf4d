use serde::Deserialize;
use utoipa::IntoParams;

use super::LifecycleError;
use crate::schema::ResourceSchema;
use crate::store::{ListSpec, Scope, SortField, SortOrder};

pub const DEFAULT_PER_PAGE: u64 = 10;
pub const MAX_PER_PAGE: u64 = 100;

/// Raw list parameters as they arrive in the query string.
///
/// Numbers are kept as text so that malformed values surface as
/// `InvalidParameter` instead of a generic deserialization failure.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Case-insensitive substring matched against the searchable fields.
    #[serde(alias = "searchTerm")]
    pub search: Option<String>,
    /// `id` (default), `created_at`, `updated_at`, or a sortable field.
    #[serde(alias = "sortField")]
    pub sort_by: Option<String>,
    /// `asc` (default) or `desc`.
    #[serde(alias = "sortOrder")]
    pub sort_order: Option<String>,
    /// 1-based page number (default 1).
    #[param(value_type = Option<u64>, minimum = 1)]
    pub page: Option<String>,
    /// Items per page (default 10, max 100).
    #[serde(alias = "perPage")]
    #[param(value_type = Option<u64>, minimum = 1, maximum = 100)]
    pub per_page: Option<String>,
}

fn positive(name: &str, raw: Option<&str>, default: u64) -> Result<u64, LifecycleError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(default);
    };
    match raw.parse::<u64>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(LifecycleError::InvalidParameter(format!(
            "{name} must be a positive integer, got '{raw}'"
        ))),
    }
}

impl ListQuery {
    /// Validate against a schema and resolve into store parameters.
    pub fn resolve(&self, schema: &ResourceSchema, scope: Scope) -> Result<ListSpec, LifecycleError> {
        let page = positive("page", self.page.as_deref(), 1)?;
        let per_page = positive("per_page", self.per_page.as_deref(), DEFAULT_PER_PAGE)?;
        if per_page > MAX_PER_PAGE {
            return Err(LifecycleError::InvalidParameter(format!(
                "per_page must not exceed {MAX_PER_PAGE}"
            )));
        }
        // The offset must fit a signed 64-bit SQL OFFSET.
        match (page - 1).checked_mul(per_page) {
            Some(offset) if offset <= i64::MAX as u64 => {}
            _ => {
                return Err(LifecycleError::InvalidParameter(format!(
                    "page {page} is out of range"
                )));
            }
        }

        let sort = match self.sort_by.as_deref().map(str::trim) {
            None | Some("") => SortField::Id,
            Some(name) => schema.sort_field(name).ok_or_else(|| {
                LifecycleError::InvalidParameter(format!(
                    "sort_by must be one of: {}",
                    schema.sortable_names().join(", ")
                ))
            })?,
        };

        let order = match self
            .sort_order
            .as_deref()
            .map(|s| s.trim().to_ascii_lowercase())
            .as_deref()
        {
            None | Some("") | Some("asc") => SortOrder::Asc,
            Some("desc") => SortOrder::Desc,
            Some(other) => {
                return Err(LifecycleError::InvalidParameter(format!(
                    "sort_order must be asc or desc, got '{other}'"
                )));
            }
        };

        let search = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        Ok(ListSpec {
            scope,
            search,
            search_fields: schema.searchable_fields(),
            sort,
            order,
            page,
            per_page,
        })
    }
}

// Vehicle search: query-string validation and SQL construction

use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::pagination::PageRequest;
use crate::validation::normalize_optional;

const VEHICLE_COLUMNS: &str = "v.id, v.category_id, c.name AS category_name, v.color, v.price, \
     v.manufacture_date, v.model, v.version, v.image, v.is_deleted";
const VEHICLE_FROM: &str = "FROM vehicles v JOIN vehicle_categories c ON c.id = v.category_id";

/// `%term%` for ILIKE with the term's own wildcards matched literally
pub fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

/// A bound SQL parameter; values keep their database type
#[derive(Debug, Clone, PartialEq)]
pub enum QueryParam {
    Text(String),
    Int(i32),
    Decimal(Decimal),
}

/// Builds a parameterized vehicle listing query with its matching COUNT query
pub struct VehicleQueryBuilder {
    where_clauses: Vec<String>,
    params: Vec<QueryParam>,
    order_clause: String,
    limit: i64,
    offset: i64,
}

impl Default for VehicleQueryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl VehicleQueryBuilder {
    pub fn new() -> Self {
        Self {
            where_clauses: Vec::new(),
            params: Vec::new(),
            order_clause: "v.model ASC, v.id ASC".to_string(),
            limit: i64::from(crate::pagination::DEFAULT_PAGE_SIZE),
            offset: 0,
        }
    }

    fn push_param(&mut self, param: QueryParam) -> usize {
        self.params.push(param);
        self.params.len()
    }

    pub fn exclude_deleted(&mut self) {
        self.where_clauses.push("v.is_deleted = FALSE".to_string());
    }

    /// Case-insensitive substring match over model, color, version and category name
    pub fn add_search_filter(&mut self, search: &str) {
        let n = self.push_param(QueryParam::Text(contains_pattern(search)));
        self.where_clauses.push(format!(
            "(v.model ILIKE ${n} OR v.color ILIKE ${n} OR COALESCE(v.version, '') ILIKE ${n} OR c.name ILIKE ${n})"
        ));
    }

    pub fn add_category_filter(&mut self, category_id: i32) {
        let n = self.push_param(QueryParam::Int(category_id));
        self.where_clauses.push(format!("v.category_id = ${}", n));
    }

    /// Inclusive bounds
    pub fn add_price_range(&mut self, min: Option<Decimal>, max: Option<Decimal>) {
        if let Some(min_price) = min {
            let n = self.push_param(QueryParam::Decimal(min_price));
            self.where_clauses.push(format!("v.price >= ${}", n));
        }
        if let Some(max_price) = max {
            let n = self.push_param(QueryParam::Decimal(max_price));
            self.where_clauses.push(format!("v.price <= ${}", n));
        }
    }

    /// Sort by the given field; id breaks ties so paging is stable
    pub fn set_sort(&mut self, field: SortField, order: SortOrder) {
        let field_name = match field {
            SortField::Price => "v.price",
            SortField::Model => "v.model",
            SortField::ManufactureDate => "v.manufacture_date",
        };
        let order_str = match order {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };
        self.order_clause = format!("{} {}, v.id ASC", field_name, order_str);
    }

    pub fn set_pagination(&mut self, page: &PageRequest) {
        self.limit = page.limit();
        self.offset = page.offset();
    }

    fn where_sql(&self) -> String {
        if self.where_clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.where_clauses.join(" AND "))
        }
    }

    /// Page query; LIMIT/OFFSET are inlined integers
    pub fn build(&self) -> (String, Vec<QueryParam>) {
        let query = format!(
            "SELECT {} {}{} ORDER BY {} LIMIT {} OFFSET {}",
            VEHICLE_COLUMNS,
            VEHICLE_FROM,
            self.where_sql(),
            self.order_clause,
            self.limit,
            self.offset
        );
        (query, self.params.clone())
    }

    /// Total matching rows, ignoring paging
    pub fn build_count(&self) -> (String, Vec<QueryParam>) {
        let query = format!("SELECT COUNT(*) {}{}", VEHICLE_FROM, self.where_sql());
        (query, self.params.clone())
    }
}

/// `GET /api/vehicles` query string
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct VehicleQuery {
    /// Matches model, color, version or category name
    pub search: Option<String>,
    pub category_id: Option<i32>,
    #[param(value_type = Option<String>)]
    pub min_price: Option<Decimal>,
    #[param(value_type = Option<String>)]
    pub max_price: Option<Decimal>,
    /// "price", "model" or "manufacture_date"
    pub sort: Option<String>,
    /// "asc" or "desc"
    pub order: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    /// Honoured for admins only
    pub include_deleted: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Price,
    Model,
    ManufactureDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Normalized vehicle query with defaults applied
#[derive(Debug)]
pub struct ValidatedVehicleQuery {
    pub search: Option<String>,
    pub category_id: Option<i32>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub sort_field: Option<SortField>,
    pub sort_order: SortOrder,
    pub page: PageRequest,
    pub include_deleted: bool,
}

impl ValidatedVehicleQuery {
    /// Translate into a builder; deleted rows are hidden unless requested
    pub fn to_builder(&self) -> VehicleQueryBuilder {
        let mut builder = VehicleQueryBuilder::new();
        if !self.include_deleted {
            builder.exclude_deleted();
        }
        if let Some(search) = &self.search {
            builder.add_search_filter(search);
        }
        if let Some(category_id) = self.category_id {
            builder.add_category_filter(category_id);
        }
        builder.add_price_range(self.min_price, self.max_price);
        if let Some(field) = self.sort_field {
            builder.set_sort(field, self.sort_order);
        }
        builder.set_pagination(&self.page);
        builder
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct QueryError {
    pub message: String,
}

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for QueryError {}

impl From<QueryError> for crate::error::ApiError {
    fn from(err: QueryError) -> Self {
        crate::error::ApiError::BadRequest(err.message)
    }
}

pub struct QueryValidator;

impl QueryValidator {
    /// `allow_deleted` is false for anonymous and non-admin callers
    pub fn validate(params: VehicleQuery, allow_deleted: bool) -> Result<ValidatedVehicleQuery, QueryError> {
        let search = normalize_optional(params.search);

        for (value, name) in [(params.min_price, "min_price"), (params.max_price, "max_price")] {
            if let Some(price) = value {
                if price.is_sign_negative() {
                    return Err(QueryError {
                        message: format!("{} cannot be negative", name),
                    });
                }
            }
        }
        if let (Some(min), Some(max)) = (params.min_price, params.max_price) {
            if min > max {
                return Err(QueryError {
                    message: "min_price cannot be greater than max_price".to_string(),
                });
            }
        }

        let sort_field = match params.sort.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(sort) => Some(Self::parse_sort_field(sort)?),
            None => None,
        };
        let sort_order = match params.order.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(order) => Self::parse_sort_order(order)?,
            None => match sort_field {
                Some(SortField::ManufactureDate) => SortOrder::Desc,
                _ => SortOrder::Asc,
            },
        };

        for (value, name) in [(params.page, "page"), (params.page_size, "page_size")] {
            if value == Some(0) {
                return Err(QueryError {
                    message: format!("{} must be a positive number (greater than 0)", name),
                });
            }
        }

        Ok(ValidatedVehicleQuery {
            search,
            category_id: params.category_id,
            min_price: params.min_price,
            max_price: params.max_price,
            sort_field,
            sort_order,
            page: PageRequest {
                page: params.page,
                page_size: params.page_size,
            },
            include_deleted: allow_deleted && params.include_deleted.unwrap_or(false),
        })
    }

    fn parse_sort_field(s: &str) -> Result<SortField, QueryError> {
        match s.to_lowercase().as_str() {
            "price" => Ok(SortField::Price),
            "model" => Ok(SortField::Model),
            "manufacture_date" | "date" => Ok(SortField::ManufactureDate),
            _ => Err(QueryError {
                message: format!(
                    "Invalid sort field '{}'. Must be 'price', 'model' or 'manufacture_date'",
                    s
                ),
            }),
        }
    }

    fn parse_sort_order(s: &str) -> Result<SortOrder, QueryError> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(QueryError {
                message: format!("Invalid sort order '{}'. Must be 'asc' or 'desc'", s),
            }),
        }
    }
}

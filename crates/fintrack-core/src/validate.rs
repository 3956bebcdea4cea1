//! Validation layer
//!
//! Turns raw request input into normalized, typed values. Every check runs
//! before the store is touched, and a rejected payload reports every
//! offending field rather than only the first one.

use chrono::{DateTime, NaiveDate};
use fintrack_config::PaginationConfig;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationErrors};
use crate::models::{NewTransaction, Recurrence, TransactionKind, TransactionPatch};
use crate::store::StoreQuery;
use crate::types::{Category, GroupBy, PaymentMethod, RecurringFrequency, TransactionType};

// ==================== Raw Input ====================

/// Create/update body as received. Fields stay untyped so that a wrong
/// type on one field is reported alongside problems on the others.
/// JSON `null` counts as absent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPayload {
    #[serde(rename = "type")]
    pub transaction_type: Option<Value>,
    pub amount: Option<Value>,
    pub category: Option<Value>,
    pub description: Option<Value>,
    pub date: Option<Value>,
    pub source: Option<Value>,
    pub payment_method: Option<Value>,
    pub tags: Option<Value>,
    pub is_recurring: Option<Value>,
    pub recurring_frequency: Option<Value>,
}

/// List query string
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    pub category: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    pub tag: Option<String>,
    pub search: Option<String>,
}

/// Stats query string
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsQuery {
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub group_by: Option<String>,
}

// ==================== Normalized Output ====================

/// A validated list request
#[derive(Debug, Clone, PartialEq)]
pub struct ListFilter {
    pub query: StoreQuery,
    pub page: usize,
    pub limit: usize,
}

/// A validated stats request
#[derive(Debug, Clone, PartialEq)]
pub struct StatsFilter {
    pub query: StoreQuery,
    pub group_by: GroupBy,
}

// ==================== Operations ====================

/// Validate a create body
pub fn validate_create(payload: &TransactionPayload) -> CoreResult<NewTransaction> {
    let mut errors = ValidationErrors::default();

    let transaction_type = required(&mut errors, "type", &payload.transaction_type, parse_type);
    let amount = required(&mut errors, "amount", &payload.amount, parse_amount);

    let category = match (&payload.category, transaction_type) {
        (None, _) => {
            errors.push("category", "is required");
            None
        }
        (Some(v), Some(t)) => collect(&mut errors, "category", parse_string(v).and_then(|s| {
            Category::parse_for(t, &s)
                .map_err(|_| format!("'{}' is not in the {} categories", s, t))
        })),
        // type is already reported; still check the label exists somewhere
        (Some(v), None) => collect(&mut errors, "category", parse_category(v)),
    };

    let date = required(&mut errors, "date", &payload.date, parse_date);
    let description = optional(&mut errors, "description", &payload.description, parse_text)
        .unwrap_or_default();

    let source = match (&payload.source, transaction_type) {
        (Some(_), Some(TransactionType::Expense)) => {
            errors.push("source", "only allowed for income transactions");
            None
        }
        (v, _) => optional(&mut errors, "source", v, parse_text).filter(|s| !s.is_empty()),
    };

    let payment_method = match (&payload.payment_method, transaction_type) {
        (Some(_), Some(TransactionType::Income)) => {
            errors.push("paymentMethod", "only allowed for expense transactions");
            None
        }
        (v, _) => optional(&mut errors, "paymentMethod", v, parse_payment_method),
    };

    let tags = optional(&mut errors, "tags", &payload.tags, parse_tags).unwrap_or_default();
    let is_recurring =
        optional(&mut errors, "isRecurring", &payload.is_recurring, parse_bool).unwrap_or(false);
    let frequency =
        optional(&mut errors, "recurringFrequency", &payload.recurring_frequency, parse_frequency);

    let recurrence = match (is_recurring, payload.recurring_frequency.is_some(), frequency) {
        (true, _, Some(f)) => Some(Recurrence::Every(f)),
        (true, false, None) => {
            errors.push("recurringFrequency", "is required when isRecurring is true");
            None
        }
        (false, true, _) => {
            errors.push("recurringFrequency", "must be absent when isRecurring is false");
            None
        }
        (false, false, _) => Some(Recurrence::OneOff),
        // frequency present but malformed: already reported
        (true, true, None) => None,
    };

    if !errors.is_empty() {
        return Err(CoreError::Validation(errors));
    }

    match (transaction_type, amount, category, date, recurrence) {
        (Some(_), Some(amount), Some(category), Some(date), Some(recurrence)) => {
            let kind = match category {
                Category::Income(category) => TransactionKind::Income { category, source },
                Category::Expense(category) => TransactionKind::Expense { category, payment_method },
            };
            Ok(NewTransaction { kind, amount, description, date, tags, recurrence })
        }
        _ => Err(CoreError::Validation(ValidationErrors::single(
            "payload",
            "incomplete transaction",
        ))),
    }
}

/// Validate an update body. Present fields follow the create rules;
/// cross-field consistency with the stored record is checked later.
pub fn validate_update(payload: &TransactionPayload) -> CoreResult<TransactionPatch> {
    let mut errors = ValidationErrors::default();

    let patch = TransactionPatch {
        transaction_type: optional(&mut errors, "type", &payload.transaction_type, parse_type),
        amount: optional(&mut errors, "amount", &payload.amount, parse_amount),
        category: optional(&mut errors, "category", &payload.category, parse_category),
        description: optional(&mut errors, "description", &payload.description, parse_text),
        date: optional(&mut errors, "date", &payload.date, parse_date),
        source: optional(&mut errors, "source", &payload.source, parse_text),
        payment_method: optional(
            &mut errors,
            "paymentMethod",
            &payload.payment_method,
            parse_payment_method,
        ),
        tags: optional(&mut errors, "tags", &payload.tags, parse_tags),
        is_recurring: optional(&mut errors, "isRecurring", &payload.is_recurring, parse_bool),
        recurring_frequency: optional(
            &mut errors,
            "recurringFrequency",
            &payload.recurring_frequency,
            parse_frequency,
        ),
    };

    if !errors.is_empty() {
        return Err(CoreError::Validation(errors));
    }

    if patch.is_empty() {
        return Err(CoreError::EmptyUpdate);
    }

    if patch.is_recurring == Some(false) && patch.recurring_frequency.is_some() {
        return Err(CoreError::Validation(ValidationErrors::single(
            "recurringFrequency",
            "must be absent when isRecurring is false",
        )));
    }

    Ok(patch)
}

/// Validate list filters and pagination
pub fn validate_list(query: &ListQuery, pagination: &PaginationConfig) -> CoreResult<ListFilter> {
    let mut errors = ValidationErrors::default();

    let transaction_type = optional_param(&mut errors, "type", &query.transaction_type, |s| {
        s.parse::<TransactionType>().map_err(|_| "must be income or expense".to_string())
    });
    let category = optional_param(&mut errors, "category", &query.category, |s| {
        s.parse::<Category>().map_err(|_| format!("'{}' is not a known category", s))
    });
    if let (Some(t), Some(c)) = (transaction_type, category) {
        if c.transaction_type() != t {
            errors.push("category", format!("'{}' is not in the {} categories", c, t));
        }
    }

    let (date_from, date_to) = date_range(&mut errors, &query.date_from, &query.date_to);

    let page = optional_param(&mut errors, "page", &query.page, parse_positive).unwrap_or(1);
    let max_limit = pagination.max_limit as usize;
    let limit = optional_param(&mut errors, "limit", &query.limit, parse_positive)
        .unwrap_or(pagination.default_limit as usize)
        .min(max_limit);

    let tag = non_empty(&query.tag).map(|t| t.trim().to_string());
    let search = non_empty(&query.search).map(|s| s.trim().to_string());

    if !errors.is_empty() {
        return Err(CoreError::Validation(errors));
    }

    Ok(ListFilter {
        query: StoreQuery { transaction_type, category, date_from, date_to, tag, search },
        page,
        limit,
    })
}

/// Validate stats filters
pub fn validate_stats(query: &StatsQuery) -> CoreResult<StatsFilter> {
    let mut errors = ValidationErrors::default();

    let transaction_type = optional_param(&mut errors, "type", &query.transaction_type, |s| {
        s.parse::<TransactionType>().map_err(|_| "must be income or expense".to_string())
    });
    let (date_from, date_to) = date_range(&mut errors, &query.date_from, &query.date_to);
    let group_by = optional_param(&mut errors, "groupBy", &query.group_by, |s| {
        s.parse::<GroupBy>().map_err(|_| "must be category or month".to_string())
    })
    .unwrap_or_default();

    if !errors.is_empty() {
        return Err(CoreError::Validation(errors));
    }

    Ok(StatsFilter {
        query: StoreQuery { transaction_type, date_from, date_to, ..Default::default() },
        group_by,
    })
}

/// Validate a record id
pub fn parse_id(id: &str) -> CoreResult<Uuid> {
    Uuid::parse_str(id.trim()).map_err(|_| CoreError::InvalidId { id: id.to_string() })
}

// ==================== Field Helpers ====================

fn collect<T>(errors: &mut ValidationErrors, field: &str, result: Result<T, String>) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(reason) => {
            errors.push(field, reason);
            None
        }
    }
}

fn required<T>(
    errors: &mut ValidationErrors,
    field: &str,
    value: &Option<Value>,
    parse: impl Fn(&Value) -> Result<T, String>,
) -> Option<T> {
    match value {
        Some(v) => collect(errors, field, parse(v)),
        None => {
            errors.push(field, "is required");
            None
        }
    }
}

fn optional<T>(
    errors: &mut ValidationErrors,
    field: &str,
    value: &Option<Value>,
    parse: impl Fn(&Value) -> Result<T, String>,
) -> Option<T> {
    value.as_ref().and_then(|v| collect(errors, field, parse(v)))
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

/// Query-string parameters; an empty value counts as absent
fn optional_param<T>(
    errors: &mut ValidationErrors,
    field: &str,
    value: &Option<String>,
    parse: impl Fn(&str) -> Result<T, String>,
) -> Option<T> {
    non_empty(value).and_then(|s| collect(errors, field, parse(s.trim())))
}

fn date_range(
    errors: &mut ValidationErrors,
    from: &Option<String>,
    to: &Option<String>,
) -> (Option<NaiveDate>, Option<NaiveDate>) {
    let date_from = optional_param(errors, "dateFrom", from, parse_date_str);
    let date_to = optional_param(errors, "dateTo", to, parse_date_str);
    if let (Some(f), Some(t)) = (date_from, date_to) {
        if f > t {
            errors.push("dateTo", "must not be before dateFrom");
        }
    }
    (date_from, date_to)
}

fn parse_string(value: &Value) -> Result<String, String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| "must be a string".to_string())
}

fn parse_text(value: &Value) -> Result<String, String> {
    parse_string(value).map(|s| s.trim().to_string())
}

fn parse_type(value: &Value) -> Result<TransactionType, String> {
    parse_string(value)?
        .parse()
        .map_err(|_| "must be income or expense".to_string())
}

fn parse_amount(value: &Value) -> Result<Decimal, String> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return Err("must be a number".to_string()),
    };
    let amount = Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| "must be a number".to_string())?;
    if amount <= Decimal::ZERO {
        return Err("must be greater than 0".to_string());
    }
    Ok(amount.normalize())
}

fn parse_category(value: &Value) -> Result<Category, String> {
    let s = parse_string(value)?;
    s.parse().map_err(|_| format!("'{}' is not a known category", s))
}

fn parse_payment_method(value: &Value) -> Result<PaymentMethod, String> {
    let s = parse_string(value)?;
    s.parse().map_err(|_| {
        let allowed: Vec<&str> = PaymentMethod::ALL.iter().map(|m| m.label()).collect();
        format!("must be one of: {}", allowed.join(", "))
    })
}

fn parse_frequency(value: &Value) -> Result<RecurringFrequency, String> {
    parse_string(value)?
        .parse()
        .map_err(|_| "must be one of: daily, weekly, monthly, yearly".to_string())
}

fn parse_bool(value: &Value) -> Result<bool, String> {
    value.as_bool().ok_or_else(|| "must be a boolean".to_string())
}

fn parse_tags(value: &Value) -> Result<BTreeSet<String>, String> {
    let items = value.as_array().ok_or_else(|| "must be an array of strings".to_string())?;
    let mut labels = Vec::with_capacity(items.len());
    for item in items {
        labels.push(item.as_str().ok_or_else(|| "must be an array of strings".to_string())?);
    }
    Ok(fintrack_utils::normalize_tags(labels))
}

fn parse_date(value: &Value) -> Result<NaiveDate, String> {
    parse_date_str(&parse_string(value)?)
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp (its calendar date is kept)
fn parse_date_str(s: &str) -> Result<NaiveDate, String> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(s).map(|dt| dt.date_naive()))
        .map_err(|_| "must be a calendar date (YYYY-MM-DD)".to_string())
}

fn parse_positive(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err("must be a positive integer".to_string()),
    }
}

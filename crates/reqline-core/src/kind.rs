//! Capability predicates.
//!
//! The serializer and the config merger branch on what a value *is* rather than
//! on its concrete Rust type: a date, a plain data record, pre-encoded search
//! params, or multipart form data. [`Kind`] answers those questions for every
//! value type that flows through them.

use serde_json::Value;

use crate::config::ConfigValue;
use crate::query::Params;
use crate::value::ParamValue;

/// Capability checks over request values.
///
/// Every predicate defaults to `false`; implementors override the ones that
/// can hold.
pub trait Kind {
    /// Value is a point in time.
    fn is_date(&self) -> bool {
        false
    }

    /// Value is a plain key-value data record.
    ///
    /// False for arrays, dates, form data, search params and functions.
    fn is_plain_object(&self) -> bool {
        false
    }

    /// Value is a pre-encoded set of query pairs.
    fn is_search_params(&self) -> bool {
        false
    }

    /// Value is multipart form data.
    fn is_form_data(&self) -> bool {
        false
    }
}

impl Kind for ParamValue {
    fn is_date(&self) -> bool {
        matches!(self, Self::Date(_))
    }

    fn is_plain_object(&self) -> bool {
        matches!(self, Self::Object(_))
    }
}

impl Kind for Value {
    fn is_plain_object(&self) -> bool {
        self.is_object()
    }
}

impl Kind for Params {
    fn is_search_params(&self) -> bool {
        matches!(self, Self::Search(_))
    }
}

impl Kind for ConfigValue {
    fn is_plain_object(&self) -> bool {
        matches!(self, Self::Json(value) if value.is_object())
    }

    fn is_search_params(&self) -> bool {
        matches!(self, Self::Params(params) if params.is_search_params())
    }

    fn is_form_data(&self) -> bool {
        matches!(self, Self::Form(_))
    }
}

//! Request body transformation.

use reqline_core::value::FormPart;
use reqline_core::{ConfigValue, Error, FormData, Kind, Result};
use reqwest::multipart::{Form, Part};
use serde_json::{Map, Value};

use crate::headers::CONTENT_TYPE;

/// Content type set for JSON bodies when none is configured.
pub const JSON_CONTENT_TYPE: &str = "application/json;charset=utf-8";

/// Content type set for search-params bodies when none is configured.
pub const FORM_URLENCODED_CONTENT_TYPE: &str = "application/x-www-form-urlencoded;charset=utf-8";

/// Body handed to the transport.
pub enum RequestBody {
    /// No body
    Empty,
    /// Text body
    Text(String),
    /// Multipart body
    Multipart(Form),
}

/// Turn the configured `data` into a transport body, adjusting `headers`.
///
/// Plain objects, arrays and parameter maps become JSON text and get a JSON
/// content type unless one is configured. Search params keep their
/// form-urlencoded text and content type. Form data drops any configured content type so
/// the transport can set the multipart boundary. Without data, the content
/// type header is removed.
///
/// # Errors
///
/// Returns an error if `data` is a params serializer, or JSON encoding fails.
pub fn transform_request(
    data: Option<&ConfigValue>,
    headers: &mut Map<String, Value>,
) -> Result<RequestBody> {
    let Some(data) = data else {
        headers.remove(CONTENT_TYPE);
        return Ok(RequestBody::Empty);
    };

    if data.is_form_data() {
        headers.remove(CONTENT_TYPE);
    }

    match data {
        ConfigValue::Json(Value::Null) => {
            headers.remove(CONTENT_TYPE);
            Ok(RequestBody::Empty)
        }
        ConfigValue::Json(Value::String(text)) => Ok(RequestBody::Text(text.clone())),
        ConfigValue::Json(value) if value.is_plain_object() || value.is_array() => {
            set_default_content_type(headers, JSON_CONTENT_TYPE);
            Ok(RequestBody::Text(serde_json::to_string(value)?))
        }
        ConfigValue::Json(value) => Ok(RequestBody::Text(value.to_string())),
        ConfigValue::Params(params) => {
            let content_type = if data.is_search_params() {
                FORM_URLENCODED_CONTENT_TYPE
            } else {
                JSON_CONTENT_TYPE
            };
            set_default_content_type(headers, content_type);
            let text = match params.to_json() {
                Value::String(text) => text,
                json => serde_json::to_string(&json)?,
            };
            Ok(RequestBody::Text(text))
        }
        ConfigValue::Form(form) => Ok(RequestBody::Multipart(multipart(form))),
        ConfigValue::Serializer(_) => Err(Error::InvalidConfig(
            "request data cannot be a params serializer".to_string(),
        )),
    }
}

fn set_default_content_type(headers: &mut Map<String, Value>, content_type: &str) {
    headers
        .entry(CONTENT_TYPE.to_string())
        .or_insert_with(|| Value::String(content_type.to_string()));
}

fn multipart(form: &FormData) -> Form {
    form.iter().fold(Form::new(), |multipart, (name, part)| match part {
        FormPart::Text(value) => multipart.text(name.to_string(), value.clone()),
        FormPart::File { file_name, bytes } => multipart.part(
            name.to_string(),
            Part::bytes(bytes.clone()).file_name(file_name.clone()),
        ),
    })
}

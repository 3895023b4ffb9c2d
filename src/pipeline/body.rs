//! Request body parsing stage.

use log::debug;
use serde_json::Value;

use crate::parser::{HttpRequest, Method, ParsedData};
use crate::pipeline::middleware::{BoxFuture, Middleware, Next};
use crate::pipeline::HandlerResult;
use crate::server::Error;

const JSON: &str = "application/json";
const FORM: &str = "application/x-www-form-urlencoded";

/// Decodes POST bodies into [`HttpRequest::parsed_data`] before delegating.
#[derive(Debug, Default, Clone, Copy)]
pub struct BodyParser;

impl Middleware for BodyParser {
    fn name(&self) -> &'static str {
        "body-parser"
    }

    fn process(&self, mut request: HttpRequest, next: Next) -> BoxFuture<'_, Result<HandlerResult, Error>> {
        Box::pin(async move {
            parse_body(&mut request)?;
            next.run(request).await
        })
    }
}

/// Decode the body of a POST according to its content type.
///
/// JSON and URL-encoded forms are understood; anything else, and every
/// non-POST request, leaves `parsed_data` untouched.
pub fn parse_body(request: &mut HttpRequest) -> Result<(), Error> {
    if request.method != Method::POST {
        return Ok(());
    }

    if request.content_type_starts_with(JSON) {
        let value: Value = serde_json::from_slice(&request.body).map_err(|e| Error::MalformedBody {
            content_type: JSON,
            reason: e.to_string(),
        })?;
        debug!("request json: {value}");
        request.parsed_data = Some(ParsedData::Json(value));
    } else if request.content_type_starts_with(FORM) {
        let fields: Vec<(String, String)> =
            serde_urlencoded::from_bytes(&request.body).map_err(|e| Error::MalformedBody {
                content_type: FORM,
                reason: e.to_string(),
            })?;
        debug!("request form: {fields:?}");
        request.parsed_data = Some(ParsedData::Form(fields));
    }

    Ok(())
}

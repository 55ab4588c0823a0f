use crate::error::{AppError, Result};
use crate::meter::MeterId;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::debug;

/// Client for the endpoint exposing each meter's last recorded total.
pub struct TotalsClient {
    http_client: reqwest::Client,
    url: String,
}

impl TotalsClient {
    pub fn new(url: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        Ok(Self {
            http_client: builder.build()?,
            url: url.into(),
        })
    }

    /// Fetch the totals document and return the meter's PreviousTotal in Wh.
    pub async fn previous_total(&self, meter: &MeterId) -> Result<i64> {
        let totals = self.fetch_totals().await?;
        previous_total_from(&totals, meter)
    }

    async fn fetch_totals(&self) -> Result<Map<String, Value>> {
        let res = self
            .http_client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?;
        let body = res.text().await?;
        debug!(url = %self.url, bytes = body.len(), "fetched totals");

        match serde_json::from_str::<Value>(&body)? {
            Value::Object(map) => Ok(map),
            other => Err(AppError::UnexpectedPayload(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }
}

pub fn previous_total_from(totals: &Map<String, Value>, meter: &MeterId) -> Result<i64> {
    let key = meter.total_key();
    let raw = match totals.get(&key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => return Err(AppError::InvalidTotal(other.to_string())),
        None => return Err(AppError::MissingTotal(key)),
    };
    let wh = parse_total(&raw)?;
    debug!(meter = %meter, raw = %raw, wh, "parsed previous total");
    Ok(wh)
}

/// Convert a `"<kWh with comma decimal> <suffix>"` string to whole Wh.
///
/// Only the text before the first space is considered. The product is
/// truncated toward zero, so `"1,0005"` gives 1000.
pub fn parse_total(raw: &str) -> Result<i64> {
    let number = raw.split(' ').next().unwrap_or_default().replace(',', ".");
    let kwh: f64 = number
        .parse()
        .map_err(|_| AppError::InvalidTotal(raw.to_string()))?;
    if !kwh.is_finite() {
        return Err(AppError::InvalidTotal(raw.to_string()));
    }
    Ok((kwh * 1000.0) as i64)
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_parse_total_comma_decimal() {
        assert_eq!(parse_total("12,345 kWh").unwrap(), 12345);
        assert_eq!(parse_total("100,000 kWh").unwrap(), 100000);
    }

    #[test]
    fn test_parse_total_truncates() {
        assert_eq!(parse_total("1,0005").unwrap(), 1000);
        assert_eq!(parse_total("0,0009 kWh").unwrap(), 0);
    }

    #[test]
    fn test_parse_total_only_first_token() {
        assert_eq!(parse_total("7,5 kWh 3,2").unwrap(), 7500);
    }

    #[test]
    fn test_parse_total_rejects_garbage() {
        assert!(parse_total("n/a kWh").is_err());
        assert!(parse_total("").is_err());
        assert!(parse_total(" 12,3 kWh").is_err());
        assert!(parse_total("inf kWh").is_err());
        assert!(parse_total("NaN").is_err());
    }

    #[test]
    fn test_previous_total_lookup() {
        let totals = json!({
            "Totalcounter1": "3,5 kWh",
            "Totalcounter5": "100,000 kWh",
        });
        let map = totals.as_object().unwrap();
        assert_eq!(previous_total_from(map, &MeterId::from(5)).unwrap(), 100000);
        assert_eq!(previous_total_from(map, &MeterId::from(1)).unwrap(), 3500);
    }

    #[test]
    fn test_previous_total_numeric_value() {
        let totals = json!({ "Totalcounter2": 42.5 });
        let map = totals.as_object().unwrap();
        assert_eq!(previous_total_from(map, &MeterId::from(2)).unwrap(), 42500);
    }

    #[test]
    fn test_previous_total_missing_key() {
        let totals = json!({ "Totalcounter1": "3,5 kWh" });
        let map = totals.as_object().unwrap();
        match previous_total_from(map, &MeterId::from(7)) {
            Err(AppError::MissingTotal(key)) => assert_eq!(key, "Totalcounter7"),
            other => panic!("expected MissingTotal, got {:?}", other),
        }
    }

    #[test]
    fn test_previous_total_wrong_type() {
        let totals = json!({ "Totalcounter1": ["3,5"] });
        let map = totals.as_object().unwrap();
        assert!(matches!(
            previous_total_from(map, &MeterId::from(1)),
            Err(AppError::InvalidTotal(_))
        ));
    }
}

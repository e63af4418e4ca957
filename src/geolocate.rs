use serde_json::Value;

const GEO_URL: &str = "http://ip-api.com/json/";

/// Failure modes of the one-shot position lookup. `Unavailable` covers the
/// service answering but declining to give a position; `Other` covers
/// transport and parsing problems.
#[derive(Debug)]
pub enum GeoError {
    Unavailable(String),
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl std::fmt::Display for GeoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeoError::Unavailable(reason) => write!(f, "Position unavailable: {reason}"),
            GeoError::Other(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for GeoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GeoError::Unavailable(_) => None,
            GeoError::Other(e) => Some(&**e),
        }
    }
}

fn fetch_position_with_url(url: &str) -> Result<[f64; 2], GeoError> {
    let response = ureq::get(url).set("Accept", "application/json").call();
    let body = match response {
        Ok(r) => r.into_string().map_err(|e| GeoError::Other(Box::new(e)))?,
        Err(ureq::Error::Status(code, r)) => {
            let body = r.into_string().unwrap_or_default();
            return Err(GeoError::Unavailable(format!("status {code}: {body}")));
        }
        Err(e) => return Err(GeoError::Other(Box::new(e))),
    };
    let json: Value = serde_json::from_str(&body).map_err(|e| GeoError::Other(Box::new(e)))?;
    if json.get("status").and_then(|v| v.as_str()) != Some("success") {
        let message = json
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or("lookup did not succeed");
        return Err(GeoError::Unavailable(message.to_string()));
    }
    let lat = json.get("lat").and_then(|v| v.as_f64());
    let lon = json.get("lon").and_then(|v| v.as_f64());
    match (lat, lon) {
        (Some(lat), Some(lon)) => Ok([lat, lon]),
        _ => Err(GeoError::Unavailable("response carried no coordinates".into())),
    }
}

/// Look up the user's approximate position once, via IP geolocation. Called
/// a single time at startup and never retried; on failure the map stays
/// uninitialized.
pub fn fetch_current_position() -> Result<[f64; 2], GeoError> {
    log::info!("Looking up current position");
    fetch_position_with_url(GEO_URL)
}

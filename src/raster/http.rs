use std::time::Duration;

use tracing::debug;

use super::source::RasterSource;
use super::window::RasterWindow;
use crate::error::RasterError;

const USER_AGENT: &str = concat!("vfmap/", env!("CARGO_PKG_VERSION"));

/// Raster service reachable over HTTP
///
/// Sends `GET {url}?bbox=min_x,min_y,max_x,max_y&band=N` and expects a JSON
/// body of the form `{"width": W, "height": H, "values": [...]}`.
#[derive(Debug, Clone)]
pub struct HttpRasterSource {
    url: String,
    client: reqwest::blocking::Client,
}

impl HttpRasterSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, RasterError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

fn bbox_param(bbox: [f64; 4]) -> String {
    bbox.iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

impl RasterSource for HttpRasterSource {
    fn read(&self, bbox: [f64; 4], band: usize) -> Result<RasterWindow, RasterError> {
        debug!(url = %self.url, ?bbox, band, "requesting raster window");

        let response = self
            .client
            .get(&self.url)
            .query(&[("bbox", bbox_param(bbox)), ("band", band.to_string())])
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(RasterError::Status(status.as_u16()));
        }

        let body = response.text()?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_param() {
        assert_eq!(
            bbox_param([15734986.5, 5318375.25, 15735200.0, 5318500.0]),
            "15734986.5,5318375.25,15735200,5318500"
        );
    }

    #[test]
    fn test_parse_service_response() {
        let json = r#"{"width": 3, "height": 1, "values": [42.0, null, 38.5]}"#;
        let window: RasterWindow = serde_json::from_str(json).unwrap();

        assert_eq!(window.cell_count(), 3);
        assert_eq!(window.values, vec![42.0, 0.0, 38.5]);
    }

    #[test]
    fn test_client_builds() {
        let source = HttpRasterSource::new("http://localhost:9/humus", Duration::from_secs(5)).unwrap();
        assert_eq!(source.url(), "http://localhost:9/humus");
    }
}

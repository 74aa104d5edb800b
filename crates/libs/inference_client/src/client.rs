use crate::wire::parse_response;
use crate::{InferenceError, InferenceResult};
use app_state::InferenceSettings;
use bon::bon;
use bytes::Bytes;
use common_types::{AnalysisResult, ImageOrigin};
use reqwest::multipart::{Form, Part};
use tracing::debug;
use url::Url;

const DEFAULT_UPLOAD_ENDPOINT: &str = "predict/";
const DEFAULT_FRAME_ENDPOINT: &str = "analyze-frame";
const DEFAULT_FORM_FIELD: &str = "file";

/// Image bytes ready to be posted to the detector.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Bytes,
    pub mime_type: String,
    pub file_name: String,
}

/// Client for the remote fault detector.
///
/// There is no retry and no timeout of its own: a failed submission surfaces
/// immediately and the transport's limits apply.
#[derive(Clone)]
pub struct InferenceClient {
    http: reqwest::Client,
    settings: InferenceSettings,
}

#[bon]
impl InferenceClient {
    #[builder(start_fn = with_base_url)]
    #[must_use]
    pub fn new(
        #[builder(start_fn)] base_url: Url,
        upload_endpoint: Option<String>,
        frame_endpoint: Option<String>,
        form_field: Option<String>,
        http: Option<reqwest::Client>,
    ) -> Self {
        Self {
            http: http.unwrap_or_default(),
            settings: InferenceSettings {
                base_url,
                upload_endpoint: upload_endpoint
                    .unwrap_or_else(|| DEFAULT_UPLOAD_ENDPOINT.to_string()),
                frame_endpoint: frame_endpoint.unwrap_or_else(|| DEFAULT_FRAME_ENDPOINT.to_string()),
                form_field: form_field.unwrap_or_else(|| DEFAULT_FORM_FIELD.to_string()),
            },
        }
    }

    #[must_use]
    pub fn from_settings(settings: &InferenceSettings) -> Self {
        Self {
            http: reqwest::Client::new(),
            settings: settings.clone(),
        }
    }

    /// Url an image of the given origin is posted to.
    pub fn endpoint_for(&self, origin: ImageOrigin) -> InferenceResult<Url> {
        let endpoint = match origin {
            ImageOrigin::Upload => &self.settings.upload_endpoint,
            ImageOrigin::Camera => &self.settings.frame_endpoint,
        };
        Ok(self.settings.endpoint_url(endpoint)?)
    }

    /// Post one image as multipart form data and parse the detections.
    pub async fn submit(
        &self,
        origin: ImageOrigin,
        image: ImageUpload,
    ) -> InferenceResult<AnalysisResult> {
        let url = self.endpoint_for(origin)?;
        let size = image.bytes.len();
        let part = Part::stream_with_length(reqwest::Body::from(image.bytes), size as u64)
            .file_name(image.file_name)
            .mime_str(&image.mime_type)?;
        let form = Form::new().part(self.settings.form_field.clone(), part);

        debug!(%url, size, "Submitting image for analysis");
        let response = self.http.post(url).multipart(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(InferenceError::Status {
                status,
                body: response.text().await.unwrap_or_default(),
            });
        }

        let body = response.bytes().await?;
        let result = parse_response(&body)?;
        debug!(
            detections = result.detections.len(),
            width = result.original_width,
            height = result.original_height,
            "Analysis response parsed"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FailureKind;
    use axum::Json;
    use axum::Router;
    use axum::extract::Multipart;
    use axum::http::{HeaderMap, StatusCode, header};
    use axum::routing::post;
    use color_eyre::Result;
    use serde_json::{Value, json};

    async fn spawn_server(router: Router) -> Result<Url> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move { axum::serve(listener, router).await });
        Ok(format!("http://{addr}").parse()?)
    }

    /// Echoes back what it received in the multipart body.
    async fn echo_predict(mut multipart: Multipart) -> Json<Value> {
        let mut fields = vec![];
        while let Ok(Some(field)) = multipart.next_field().await {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().unwrap_or_default().to_string();
            let size = field.bytes().await.map(|b| b.len()).unwrap_or_default();
            fields.push(json!([name, file_name, content_type, size]));
        }
        Json(json!({
            "results": [{"label": "missing-resistor", "confidence": 0.82, "bbox": [100, 50, 40, 40]}],
            "original_width": 800,
            "original_height": 600,
            "missing_components": fields.iter().map(ToString::to_string).collect::<Vec<_>>(),
        }))
    }

    fn jpeg_upload() -> ImageUpload {
        ImageUpload {
            bytes: Bytes::from_static(&[0xFF, 0xD8, 0xFF, 0xE0, 1, 2, 3]),
            mime_type: "image/jpeg".to_string(),
            file_name: "board.jpg".to_string(),
        }
    }

    #[tokio::test]
    async fn test_submit_sends_multipart_field() -> Result<()> {
        let base = spawn_server(Router::new().route("/predict/", post(echo_predict))).await?;
        let client = InferenceClient::with_base_url(base).build();

        let result = client.submit(ImageOrigin::Upload, jpeg_upload()).await?;

        assert_eq!(result.detections.len(), 1);
        assert_eq!(result.original_width, 800);
        assert_eq!(
            result.missing_components,
            vec![r#"["file","board.jpg","image/jpeg",7]"#]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_camera_frames_use_frame_endpoint() -> Result<()> {
        let router = Router::new()
            .route("/predict/", post(|| async { StatusCode::IM_A_TEAPOT }))
            .route("/analyze-frame", post(echo_predict));
        let base = spawn_server(router).await?;
        let client = InferenceClient::with_base_url(base)
            .form_field("frame".to_string())
            .build();

        let result = client.submit(ImageOrigin::Camera, jpeg_upload()).await?;

        assert!(result.missing_components[0].starts_with(r#"["frame""#));
        Ok(())
    }

    #[tokio::test]
    async fn test_upload_has_content_length() -> Result<()> {
        let router = Router::new().route(
            "/predict/",
            post(|headers: HeaderMap| async move {
                let sized = headers.contains_key(header::CONTENT_LENGTH)
                    && !headers.contains_key(header::TRANSFER_ENCODING);
                if !sized {
                    return Err(StatusCode::LENGTH_REQUIRED);
                }
                Ok(Json(json!({"results": [], "original_width": 10, "original_height": 10})))
            }),
        );
        let base = spawn_server(router).await?;
        let client = InferenceClient::with_base_url(base).build();

        let result = client.submit(ImageOrigin::Upload, jpeg_upload()).await?;

        assert!(result.detections.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_error_status_is_network_failure() -> Result<()> {
        let router = Router::new().route(
            "/predict/",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"error": "File must be an image."})),
                )
            }),
        );
        let base = spawn_server(router).await?;
        let client = InferenceClient::with_base_url(base).build();

        let err = client
            .submit(ImageOrigin::Upload, jpeg_upload())
            .await
            .expect_err("400 should fail");

        assert_eq!(err.kind(), FailureKind::Network);
        assert!(matches!(err, InferenceError::Status { status, .. } if status == reqwest::StatusCode::BAD_REQUEST));
        Ok(())
    }

    #[tokio::test]
    async fn test_unexpected_shape_is_protocol_failure() -> Result<()> {
        let router = Router::new().route(
            "/predict/",
            post(|| async { Json(json!({"results": [{"label": "Cap1", "confidence": 0.9}]})) }),
        );
        let base = spawn_server(router).await?;
        let client = InferenceClient::with_base_url(base).build();

        let err = client
            .submit(ImageOrigin::Upload, jpeg_upload())
            .await
            .expect_err("missing dimensions should fail");

        assert_eq!(err.kind(), FailureKind::Protocol);
        Ok(())
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_failure() -> Result<()> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        drop(listener);
        let client = InferenceClient::with_base_url(format!("http://{addr}").parse()?).build();

        let err = client
            .submit(ImageOrigin::Upload, jpeg_upload())
            .await
            .expect_err("nothing is listening");

        assert_eq!(err.kind(), FailureKind::Network);
        Ok(())
    }
}

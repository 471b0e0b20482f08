// ABOUTME: REST implementation of the Backend trait over reqwest
// Maps transport failures and non-2xx answers onto LoanDeskError the way screens report them

use crate::data::backend::{ApiResponse, Backend};
use crate::data::models::{Customer, Loan, LoanStatus, Page, Record, ResourceKind};
use crate::utils::error::{LoanDeskError, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Url};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

pub struct RestBackend {
    client: Client,
    base_url: Url,
}

impl RestBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| LoanDeskError::Config(format!("invalid API URL '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(LoanDeskError::Config(format!(
                "API URL '{}' cannot be used as a base",
                base_url
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self { client, base_url })
    }

    /// Appends path segments to the base URL, percent-encoding each one.
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| LoanDeskError::Config("API URL cannot be used as a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder) -> Result<(u16, String)> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(status = status.as_u16(), bytes = body.len(), "API response");

        if !status.is_success() {
            return Err(LoanDeskError::Http {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }
        Ok((status.as_u16(), body))
    }

    async fn get_json(&self, segments: &[&str]) -> Result<(u16, Value)> {
        let url = self.url(segments)?;
        debug!("GET {}", url);
        let (status, body) = self.send(self.client.get(url)).await?;
        Ok((status, parse_body(&body)?))
    }
}

/// Extracts the `message` field of a JSON error body.
pub(crate) fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<Value>(body)
        .ok()?
        .get("message")?
        .as_str()
        .filter(|m| !m.trim().is_empty())
        .map(str::to_string)
}

fn parse_body(body: &str) -> Result<Value> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(body)?)
}

/// The email lookup answers with an object, sometimes wrapped in a JSON string.
pub(crate) fn decode_customer(value: Value) -> Result<Customer> {
    match value {
        Value::String(inner) => Ok(serde_json::from_str(&inner)?),
        other => Ok(serde_json::from_value(other)?),
    }
}

/// Anything but an array (e.g. a 204 with a text body) means no loans.
pub(crate) fn decode_loans(value: Value) -> Result<Vec<Loan>> {
    match value {
        Value::Array(_) => Ok(serde_json::from_value(value)?),
        _ => Ok(Vec::new()),
    }
}

#[async_trait]
impl Backend for RestBackend {
    fn base_url(&self) -> String {
        self.base_url.to_string()
    }

    async fn list(&self, kind: ResourceKind) -> Result<ApiResponse<Vec<Record>>> {
        let (status, value) = self.get_json(&[kind.path()]).await?;
        Ok(ApiResponse::new(status, Record::list_from_json(kind, value)?))
    }

    async fn get(&self, kind: ResourceKind, id: i64) -> Result<ApiResponse<Record>> {
        let id = id.to_string();
        let (status, value) = self.get_json(&[kind.path(), &id]).await?;
        Ok(ApiResponse::new(status, Record::from_json(kind, value)?))
    }

    async fn create(&self, record: &Record) -> Result<ApiResponse<Record>> {
        let kind = record.kind();
        let url = self.url(&[kind.path()])?;
        debug!("POST {}", url);
        let (status, body) = self
            .send(self.client.post(url).json(&record.to_json()?))
            .await?;
        Ok(ApiResponse::new(status, Record::from_json(kind, parse_body(&body)?)?))
    }

    async fn update(&self, id: i64, record: &Record) -> Result<ApiResponse<Record>> {
        let kind = record.kind();
        let id = id.to_string();
        let url = self.url(&[kind.path(), &id])?;
        debug!("PUT {}", url);
        let (status, body) = self
            .send(self.client.put(url).json(&record.to_json()?))
            .await?;
        Ok(ApiResponse::new(status, Record::from_json(kind, parse_body(&body)?)?))
    }

    async fn delete(&self, kind: ResourceKind, id: i64) -> Result<ApiResponse<()>> {
        let id = id.to_string();
        let url = self.url(&[kind.path(), &id])?;
        debug!("DELETE {}", url);
        let (status, _) = self.send(self.client.delete(url)).await?;
        Ok(ApiResponse::new(status, ()))
    }

    async fn customer_by_email(&self, email: &str) -> Result<ApiResponse<Customer>> {
        let (status, value) = self.get_json(&["customers", "email", email]).await?;
        Ok(ApiResponse::new(status, decode_customer(value)?))
    }

    async fn customers_by_credit_score(&self, min_score: f64) -> Result<ApiResponse<Vec<Customer>>> {
        let score = min_score.to_string();
        let (status, value) = self.get_json(&["customers", "creditScore", &score]).await?;
        Ok(ApiResponse::new(status, serde_json::from_value(value)?))
    }

    async fn customers_page(&self, page: u32, size: u32) -> Result<ApiResponse<Page<Customer>>> {
        let (page, size) = (page.to_string(), size.to_string());
        let (status, value) = self.get_json(&["customers", "page", &page, &size]).await?;
        Ok(ApiResponse::new(status, serde_json::from_value(value)?))
    }

    async fn loans_by_status(&self, status: LoanStatus) -> Result<ApiResponse<Vec<Loan>>> {
        let (code, value) = self.get_json(&["loans", "status", status.as_str()]).await?;
        Ok(ApiResponse::new(code, decode_loans(value)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::StatusCode;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves one canned HTTP response and returns the API base URL.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{}/api", addr)
    }

    fn backend(base: &str) -> RestBackend {
        RestBackend::new(base, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        let result = RestBackend::new("not a url", Duration::from_secs(1));
        assert!(matches!(result, Err(LoanDeskError::Config(_))));
    }

    #[test]
    fn test_url_segments_are_encoded() {
        let backend = backend("http://localhost:8080/api/");
        let url = backend.url(&["customers", "email", "a b@example.com"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/api/customers/email/a%20b@example.com"
        );
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(
            error_message(r#"{"message":"Credit score too low"}"#).as_deref(),
            Some("Credit score too low")
        );
        assert_eq!(error_message("Customer not found with email: x@y.z"), None);
        assert_eq!(error_message(r#"{"message":""}"#), None);
    }

    #[test]
    fn test_decode_customer_accepts_string_wrapped_json() {
        let wrapped = Value::String(
            r#"{"customerId":4,"customerName":"Meera","email":"meera@example.com","creditScore":780.0}"#
                .to_string(),
        );
        let customer = decode_customer(wrapped).unwrap();
        assert_eq!(customer.customer_id, Some(4));
        assert_eq!(customer.credit_score, Some(780.0));

        let plain = json!({"customerId": 5, "customerName": "Dev", "email": "dev@example.com"});
        assert_eq!(decode_customer(plain).unwrap().customer_id, Some(5));
    }

    #[test]
    fn test_decode_loans_treats_non_array_as_empty() {
        assert!(decode_loans(Value::Null).unwrap().is_empty());
        assert!(decode_loans(json!("No loans found with status: REJECTED"))
            .unwrap()
            .is_empty());
        let loans = decode_loans(json!([{"loanId": 1, "status": "PENDING"}])).unwrap();
        assert_eq!(loans.len(), 1);
    }

    #[tokio::test]
    async fn test_list_decodes_records() {
        let base = serve_once(
            "200 OK",
            r#"[{"guarantorId":1,"guarantorName":"K. Iyer"},{"guarantorId":2,"guarantorName":"S. Das"}]"#,
        )
        .await;
        let response = backend(&base).list(ResourceKind::Guarantor).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.data.len(), 2);
        assert_eq!(response.data[1].id(), Some(2));
    }

    #[tokio::test]
    async fn test_server_error_keeps_status_and_message() {
        let base = serve_once("400 Bad Request", r#"{"message":"Loan amount must be positive"}"#).await;
        let err = backend(&base).delete(ResourceKind::Loan, 7).await.unwrap_err();
        assert_eq!(err.status_code(), Some(StatusCode::Http(400)));
        assert_eq!(err.server_message(), Some("Loan amount must be positive"));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_network_error() {
        // Grab a free port, then close it so nothing is listening
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let backend = backend(&format!("http://127.0.0.1:{}/api", port));
        let err = backend.list(ResourceKind::Loan).await.unwrap_err();
        assert_eq!(err.status_code(), Some(StatusCode::NetworkError));
    }
}

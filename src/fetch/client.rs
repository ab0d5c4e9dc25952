use async_trait::async_trait;
use reqwest::{Request, Response};

/// Seam for the transport that downloads trajectory payloads.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}

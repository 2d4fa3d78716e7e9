//! HTTP client utilities for testing.
//!
//! This module provides helper functions for making HTTP requests to the gridscale server during tests.

use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::net::SocketAddr;
use std::time::Duration;

/// Default timeout for HTTP requests
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Create a default test client
pub fn create_test_client() -> Client {
    Client::builder()
        .timeout(DEFAULT_TIMEOUT)
        .build()
        .expect("Failed to build test HTTP client")
}

/// Build a URL for a gridscale server endpoint
pub fn build_url(addr: &SocketAddr, path: &str) -> Url {
    format!("http://{}{}", addr, path)
        .parse()
        .expect("Failed to parse URL")
}

/// Make a GET request to the gridscale server
pub async fn get(addr: &SocketAddr, path: &str) -> Result<Response, Box<dyn Error>> {
    let client = create_test_client();
    let url = build_url(addr, path);
    Ok(client.get(url).send().await?)
}

/// Make a POST request with a JSON body
pub async fn post_json<B: Serialize + ?Sized>(
    addr: &SocketAddr,
    path: &str,
    body: &B,
) -> Result<Response, Box<dyn Error>> {
    let client = create_test_client();
    let url = build_url(addr, path);
    Ok(client.post(url).json(body).send().await?)
}

/// Make a GET request and parse the JSON response
pub async fn get_json<T: DeserializeOwned>(
    addr: &SocketAddr,
    path: &str,
) -> Result<T, Box<dyn Error>> {
    expect_ok_json(get(addr, path).await?).await
}

/// Make a POST request and parse the JSON response
pub async fn post_json_ok<B: Serialize + ?Sized, T: DeserializeOwned>(
    addr: &SocketAddr,
    path: &str,
    body: &B,
) -> Result<T, Box<dyn Error>> {
    expect_ok_json(post_json(addr, path, body).await?).await
}

async fn expect_ok_json<T: DeserializeOwned>(response: Response) -> Result<T, Box<dyn Error>> {
    if response.status() != StatusCode::OK {
        return Err(format!(
            "Unexpected status code: {}, body: {:?}",
            response.status(),
            response.text().await
        )
        .into());
    }

    Ok(response.json::<T>().await?)
}

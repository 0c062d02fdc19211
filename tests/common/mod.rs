//! Shared test helpers: a recording transport that replays canned responses.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Mutex;

use serde_json::Value;

use invoicexpress_sdk::api::InvoiceXpressApi;
use invoicexpress_sdk::client::InvoiceXpressClient;
use invoicexpress_sdk::config::Auth;
use invoicexpress_sdk::errors::InvoiceXpressError;
use invoicexpress_sdk::transport::{ApiRequest, ApiResponse, Transport};

#[derive(Debug, Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<ApiResponse>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl MockTransport {
    pub fn new(responses: Vec<ApiResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every request sent so far, in order.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request(&self, index: usize) -> ApiRequest {
        self.requests()[index].clone()
    }

    pub fn remaining(&self) -> usize {
        self.responses.lock().unwrap().len()
    }
}

impl Transport for MockTransport {
    fn send(
        &self,
        request: &ApiRequest,
    ) -> impl Future<Output = Result<ApiResponse, InvoiceXpressError>> + Send {
        let request = request.clone();
        async move {
            self.requests.lock().unwrap().push(request);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| InvoiceXpressError::Other("no canned response left".to_string()))
        }
    }
}

pub fn ok(body: Value) -> ApiResponse {
    ApiResponse::new(200, Some(body))
}

pub fn empty(status: u16) -> ApiResponse {
    ApiResponse::new(status, None)
}

pub fn auth() -> Auth {
    Auth::new("acme", "secret-key").unwrap()
}

pub fn api(responses: Vec<ApiResponse>) -> InvoiceXpressApi<MockTransport> {
    InvoiceXpressApi::with_transport(MockTransport::new(responses), Some(auth()))
}

pub fn client(responses: Vec<ApiResponse>) -> InvoiceXpressClient<MockTransport> {
    InvoiceXpressClient::from_api(api(responses))
}

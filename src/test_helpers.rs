//! Shared fixtures for unit tests.

use crate::normalize::NormalizedImage;
use crate::source::{ImageOrigin, SourceImage};
use crate::variation::{
    ApiCredential, ApiFailure, VariationApi, VariationEntry, VariationRequest, VariationResponse,
};
use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, RgbImage};
use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// A syntactically valid credential.
pub const GOOD_KEY: &str = "sk-test-0123456789abcdefghij";

/// Scripted in-memory API that records every call.
#[derive(Default)]
pub struct FakeApi {
    responses: Mutex<VecDeque<Result<VariationResponse, ApiFailure>>>,
    calls: AtomicUsize,
    last_request: Mutex<Option<VariationRequest>>,
}

impl FakeApi {
    pub fn replying(response: Result<VariationResponse, ApiFailure>) -> Self {
        let api = Self::default();
        api.push(response);
        api
    }

    pub fn push(&self, response: Result<VariationResponse, ApiFailure>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<VariationRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl VariationApi for FakeApi {
    async fn create_variation(
        &self,
        _credential: &ApiCredential,
        request: VariationRequest,
    ) -> Result<VariationResponse, ApiFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiFailure::transport("no scripted response")))
    }
}

/// A response listing the given URLs.
pub fn urls(urls: &[&str]) -> VariationResponse {
    VariationResponse {
        created: Some(1_700_000_000),
        data: urls
            .iter()
            .map(|u| VariationEntry {
                url: Some(u.to_string()),
                b64_json: None,
            })
            .collect(),
    }
}

/// A small already-normalized upload.
pub fn source() -> SourceImage {
    SourceImage::new(
        NormalizedImage {
            png: vec![0x89, b'P', b'N', b'G'],
            size: 1024,
        },
        ImageOrigin::Upload {
            file_name: "cat.png".to_string(),
        },
    )
}

/// Encodes a solid-colour image as PNG file bytes.
pub fn png_file(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, image::Rgb([40, 80, 120]));
    let mut bytes = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut bytes, ImageFormat::Png)
        .unwrap();
    bytes.into_inner()
}

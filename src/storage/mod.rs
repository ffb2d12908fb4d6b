//! Media storage module
//!
//! Handles:
//! - Media upload and removal (Cloudflare R2 or a local directory)
//! - Video duration probing

mod media;
mod probe;

pub use media::{
    MAX_IMAGE_BYTES, MAX_VIDEO_BYTES, MediaKind, MediaStorage, StoredMedia, UploadedFile,
};

pub(crate) fn build_r2_http_client() -> aws_sdk_s3::config::SharedHttpClient {
    use aws_smithy_runtime::client::http::hyper_014::HyperClientBuilder;

    let https_connector = hyper_rustls::HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_only()
        .enable_http1()
        .enable_http2()
        .build();

    HyperClientBuilder::new().build(https_connector)
}

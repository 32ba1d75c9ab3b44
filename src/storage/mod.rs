//! Media storage module
//!
//! Talks to any S3-compatible endpoint (R2, minio, garage) for video
//! files, thumbnails, avatars and cover images.

mod media;

pub use media::{MediaKind, MediaStorage};

pub(crate) fn build_s3_http_client() -> aws_sdk_s3::config::SharedHttpClient {
    use aws_smithy_runtime::client::http::hyper_014::HyperClientBuilder;

    let https_connector = hyper_rustls::HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_only()
        .enable_http1()
        .enable_http2()
        .build();

    HyperClientBuilder::new().build(https_connector)
}

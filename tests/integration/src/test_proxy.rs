//! Alias proxy integration tests.

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use crate::{
        cleanup_objects, ensure_test_bucket, gateway_url, put_object, s3_client, test_alias,
        test_prefix,
    };

    fn alias_url(path: &str) -> String {
        format!("{}/{}/{path}", gateway_url(), test_alias())
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_serve_object_through_alias() {
        let client = s3_client();
        let bucket = ensure_test_bucket(&client).await;
        let key = format!("{}/greeting.txt", test_prefix("get"));
        put_object(&client, &bucket, &key, "text/plain", b"hello, bucketgate!").await;

        let resp = reqwest::get(alias_url(&key)).await.expect("gateway request");
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["content-type"], "text/plain");
        assert_eq!(resp.headers()["content-length"], "18");
        assert!(resp.headers().contains_key("last-modified"));

        let body = resp.bytes().await.expect("body");
        assert_eq!(body.as_ref(), b"hello, bucketgate!");

        cleanup_objects(&client, &bucket, &[key]).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_return_not_found_for_missing_object() {
        let client = s3_client();
        ensure_test_bucket(&client).await;
        let key = format!("{}/missing.txt", test_prefix("missing"));

        let resp = reqwest::get(alias_url(&key)).await.expect("gateway request");
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(resp.text().await.expect("body"), "404 page not found\n");
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_serve_index_document_for_directory() {
        let client = s3_client();
        let bucket = ensure_test_bucket(&client).await;
        let prefix = test_prefix("index");
        let key = format!("{prefix}/index.html");
        put_object(&client, &bucket, &key, "text/html", b"<h1>index</h1>").await;

        let resp = reqwest::get(alias_url(&format!("{prefix}/")))
            .await
            .expect("gateway request");
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["content-type"], "text/html");
        assert_eq!(resp.text().await.expect("body"), "<h1>index</h1>");

        cleanup_objects(&client, &bucket, &[key]).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_stream_large_object() {
        static LARGE: [u8; 1 << 20] = [b'x'; 1 << 20];

        let client = s3_client();
        let bucket = ensure_test_bucket(&client).await;
        let key = format!("{}/large.bin", test_prefix("large"));
        put_object(&client, &bucket, &key, "application/octet-stream", &LARGE).await;

        let resp = reqwest::get(alias_url(&key)).await.expect("gateway request");
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["content-length"], "1048576");
        let body = resp.bytes().await.expect("body");
        assert_eq!(body.len(), LARGE.len());

        cleanup_objects(&client, &bucket, &[key]).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_fall_through_for_unknown_alias() {
        let url = format!("{}/no-such-alias-{}/file.txt", gateway_url(), test_prefix("x"));
        let resp = reqwest::get(url).await.expect("gateway request");
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_report_health() {
        let resp = reqwest::get(format!("{}/_health", gateway_url()))
            .await
            .expect("gateway request");
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.text().await.expect("body").contains("running"));
    }
}

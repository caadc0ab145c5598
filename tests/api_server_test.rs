use regex::Regex;
use serde_json::{json, Value};
use site_cms::app::start_server;
use site_cms::{AuthConfig, SiteConfig};
use std::net::SocketAddr;
use tempfile::TempDir;

struct TestSite {
    addr: SocketAddr,
    dir: TempDir,
    http: reqwest::Client,
}

impl TestSite {
    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

async fn spawn_site(auth: AuthConfig) -> TestSite {
    let dir = TempDir::new().unwrap();
    let public = dir.path().join("public");
    std::fs::create_dir_all(&public).unwrap();
    std::fs::write(public.join("styles.css"), "body{}").unwrap();

    let mut config = SiteConfig::default();
    config.server.host = "127.0.0.1".to_string();
    config.server.port = 0;
    config.server.public_dir = public.clone();
    config.server.content_dir = dir.path().join("data");
    config.server.upload_dir = public.join("uploads");
    config.upload.max_bytes = 4096;
    config.auth = auth;

    let addr = start_server(config).await.unwrap();
    TestSite {
        addr,
        dir,
        http: reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap(),
    }
}

fn allowlist() -> AuthConfig {
    AuthConfig::new("a@x.com,b@x.com", false, None)
}

fn bundle_body() -> Value {
    json!({
        "defaultLocale": "en",
        "locales": ["en", "ru", "el"],
        "content": { "en": { "site": { "brand": "Back to You", "tagline": "" } } }
    })
}

#[tokio::test]
async fn test_get_before_put_is_not_found() {
    let site = spawn_site(allowlist()).await;

    let res = site.http.get(site.url("/api/content")).send().await.unwrap();
    assert_eq!(res.status(), 404);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["ok"], false);
    assert_eq!(body["reason"], "not_found");
}

#[tokio::test]
async fn test_allowlisted_put_round_trips() {
    let site = spawn_site(allowlist()).await;

    let res = site
        .http
        .put(site.url("/api/content"))
        .header("Cf-Access-Authenticated-User-Email", "A@X.COM")
        .json(&bundle_body())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.json::<Value>().await.unwrap(), json!({ "ok": true }));

    let res = site.http.get(site.url("/api/content")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["cache-control"], "no-store");
    assert!(res.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("application/json"));

    let text = res.text().await.unwrap();
    assert!(text.contains("\n  \"defaultLocale\": \"en\""));
    assert_eq!(serde_json::from_str::<Value>(&text).unwrap(), bundle_body());
}

#[tokio::test]
async fn test_forbidden_reasons() {
    let site = spawn_site(allowlist()).await;

    let res = site
        .http
        .put(site.url("/api/content"))
        .header("Cf-Access-Authenticated-User-Email", "c@x.com")
        .json(&bundle_body())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 403);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["reason"], "forbidden:not_in_allowlist");
    assert_eq!(body["details"]["email"], "c@x.com");
    assert_eq!(body["details"]["allowedCount"], 2);

    let res = site
        .http
        .put(site.url("/api/content"))
        .json(&bundle_body())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 403);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["reason"], "forbidden:missing_access_email");
    assert_eq!(body["details"]["hasAccessEmailHeader"], false);
}

#[tokio::test]
async fn test_empty_allowlist_fails_closed() {
    let site = spawn_site(AuthConfig::new("", false, None)).await;

    let res = site
        .http
        .put(site.url("/api/content"))
        .header("Cf-Access-Authenticated-User-Email", "a@x.com")
        .json(&bundle_body())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 403);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["reason"], "forbidden:allowlist_empty");
}

#[tokio::test]
async fn test_dev_token_gate() {
    let site = spawn_site(AuthConfig::new("", true, Some("s3cret".to_string()))).await;

    let put = |token: Option<&str>| {
        let mut req = site.http.put(site.url("/api/content")).json(&bundle_body());
        if let Some(token) = token {
            req = req.header("X-Dev-Admin-Token", token);
        }
        req.send()
    };

    let res = put(None).await.unwrap();
    assert_eq!(res.json::<Value>().await.unwrap()["reason"], "forbidden:missing_dev_token");

    let res = put(Some("nope")).await.unwrap();
    assert_eq!(res.status(), 403);
    assert_eq!(res.json::<Value>().await.unwrap()["reason"], "forbidden:bad_dev_token");

    let res = put(Some(" s3cret ")).await.unwrap();
    assert_eq!(res.status(), 200);
}

#[tokio::test]
async fn test_inlined_images_are_rejected() {
    let site = spawn_site(allowlist()).await;
    let mut body = bundle_body();
    body["content"]["en"]["services"] = json!([
        { "id": "a", "imageUrl": "/uploads/a.webp" },
        { "id": "b", "imageUrl": "  data:image/png;base64,AAAA" }
    ]);

    let res = site
        .http
        .put(site.url("/api/content"))
        .header("Cf-Access-Authenticated-User-Email", "b@x.com")
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
    let body: Value = res.json().await.unwrap();
    assert!(body["reason"].as_str().unwrap().starts_with("bad_request:"));
    assert_eq!(
        body["details"]["foundIn"],
        json!(["$.content.en.services[1].imageUrl"])
    );

    // nothing was written
    let res = site.http.get(site.url("/api/content")).send().await.unwrap();
    assert_eq!(res.status(), 404);
}

#[tokio::test]
async fn test_shape_errors() {
    let site = spawn_site(allowlist()).await;

    for (body, reason) in [
        ("{not json", "bad_request:Invalid JSON"),
        ("[1,2]", "bad_request:Body must be an object"),
        ("{\"content\":[]}", "bad_request:Missing 'content' object"),
    ] {
        let res = site
            .http
            .put(site.url("/api/content"))
            .header("Cf-Access-Authenticated-User-Email", "a@x.com")
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 400, "{}", body);
        assert_eq!(res.json::<Value>().await.unwrap()["reason"], reason);
    }
}

#[tokio::test]
async fn test_options_and_method_not_allowed() {
    let site = spawn_site(allowlist()).await;

    let res = site
        .http
        .request(reqwest::Method::OPTIONS, site.url("/api/content"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 204);
    let headers = res.headers();
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert_eq!(headers["access-control-allow-methods"], "GET,PUT,OPTIONS");
    assert_eq!(
        headers["access-control-allow-headers"],
        "Content-Type, X-Dev-Admin-Token"
    );
    assert_eq!(headers["access-control-max-age"], "86400");

    let res = site.http.delete(site.url("/api/content")).send().await.unwrap();
    assert_eq!(res.status(), 405);
    assert_eq!(res.json::<Value>().await.unwrap()["reason"], "method_not_allowed");
}

#[tokio::test]
async fn test_whoami_and_health() {
    let site = spawn_site(allowlist()).await;

    let res = site
        .http
        .get(site.url("/api/whoami"))
        .header("Cf-Access-Authenticated-User-Email", " B@x.com ")
        .send()
        .await
        .unwrap();
    assert_eq!(
        res.json::<Value>().await.unwrap(),
        json!({ "ok": true, "email": "b@x.com", "isAdmin": true, "allowedCount": 2 })
    );

    let res = site.http.get(site.url("/health")).send().await.unwrap();
    assert_eq!(res.json::<Value>().await.unwrap(), json!({ "ok": true }));
}

#[tokio::test]
async fn test_upload_stores_and_serves_file() {
    let site = spawn_site(allowlist()).await;

    let part = reqwest::multipart::Part::bytes(b"pixels".to_vec())
        .file_name("Portrait.WEBP")
        .mime_str("image/webp")
        .unwrap();
    let form = reqwest::multipart::Form::new().part("file", part);
    let res = site
        .http
        .post(site.url("/api/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let url = res.json::<Value>().await.unwrap()["url"]
        .as_str()
        .unwrap()
        .to_string();
    let re = Regex::new(r"^/uploads/u_\d+_[0-9a-f]{16}\.webp$").unwrap();
    assert!(re.is_match(&url), "unexpected url {}", url);

    let name = url.trim_start_matches("/uploads/");
    let on_disk = site.dir.path().join("public/uploads").join(name);
    assert_eq!(std::fs::read(on_disk).unwrap(), b"pixels");

    let served = site.http.get(site.url(&url)).send().await.unwrap();
    assert_eq!(served.status(), 200);
    assert_eq!(served.bytes().await.unwrap().as_ref(), b"pixels");
}

#[tokio::test]
async fn test_upload_without_file_is_bad_request() {
    let site = spawn_site(allowlist()).await;

    let form = reqwest::multipart::Form::new().text("note", "no file here");
    let res = site
        .http
        .post(site.url("/api/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
    assert_eq!(
        res.json::<Value>().await.unwrap()["reason"],
        "bad_request:file is required"
    );
}

#[tokio::test]
async fn test_upload_over_limit_is_rejected() {
    let site = spawn_site(allowlist()).await;

    let part = reqwest::multipart::Part::bytes(vec![7u8; 5000]).file_name("big.png");
    let form = reqwest::multipart::Form::new().part("file", part);
    let res = site
        .http
        .post(site.url("/api/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 413);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["reason"], "payload_too_large");
    assert_eq!(body["details"]["maxBytes"], 4096);

    let uploads = site.dir.path().join("public/uploads");
    assert_eq!(std::fs::read_dir(uploads).unwrap().count(), 0);
}

#[tokio::test]
async fn test_pages_and_static_files() {
    let site = spawn_site(allowlist()).await;

    let res = site.http.get(site.url("/")).send().await.unwrap();
    assert_eq!(res.status(), 302);
    assert_eq!(res.headers()["location"], "/en/");

    // no stored content and no seed file: the built-in seed renders
    let res = site.http.get(site.url("/ru/")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    let html = res.text().await.unwrap();
    assert!(html.contains("<html lang=\"ru\">"));

    let res = site.http.get(site.url("/ru")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    let html = res.text().await.unwrap();
    assert!(html.contains("<html lang=\"ru\">"));
    assert!(html.contains("<a href=\"/el\" hreflang=\"el\">EL</a>"));

    let res = site.http.get(site.url("/de/")).send().await.unwrap();
    assert_eq!(res.status(), 404);
    let res = site.http.get(site.url("/de")).send().await.unwrap();
    assert_eq!(res.status(), 404);

    let res = site.http.get(site.url("/styles.css")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "body{}");
}

#[tokio::test]
async fn test_page_renders_stored_content() {
    let site = spawn_site(allowlist()).await;
    let mut body: Value = serde_json::from_str(include_str!("../public/content.json")).unwrap();
    body["content"]["en"]["site"]["brand"] = json!("Stored Brand");

    let res = site
        .http
        .put(site.url("/api/content"))
        .header("Cf-Access-Authenticated-User-Email", "a@x.com")
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let html = site
        .http
        .get(site.url("/en/"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains("<title>Stored Brand</title>"));
}

#[tokio::test]
async fn test_root_redirect_follows_stored_default_locale() {
    let site = spawn_site(allowlist()).await;
    let mut body: Value = serde_json::from_str(include_str!("../public/content.json")).unwrap();
    body["defaultLocale"] = json!("ru");

    let res = site
        .http
        .put(site.url("/api/content"))
        .header("Cf-Access-Authenticated-User-Email", "a@x.com")
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let res = site.http.get(site.url("/")).send().await.unwrap();
    assert_eq!(res.status(), 302);
    assert_eq!(res.headers()["location"], "/ru/");
}

use crate::driver::DriverProcess;
use crate::results::RenderedDocument;
use fantoccini::error::CmdError;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::{Map, Value, json};
use std::future::Future;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::time::timeout_at;

/// Endpoints tried when the configured WebDriver URL refuses the session
const FALLBACK_WEBDRIVER_URLS: [&str; 2] = [
    "http://localhost:9515", // ChromeDriver default
    "http://127.0.0.1:4444", // Try with IP instead of localhost
];

/// Upper bound for a spawned driver to start listening
const DRIVER_READY_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound for closing a session once rendering is over
const SESSION_CLOSE_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that prevent a page from being rendered
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to start WebDriver: {0}")]
    DriverSpawn(#[source] std::io::Error),

    #[error("failed to connect to any WebDriver server ({0})")]
    Connect(String),

    #[error("failed to navigate to {url}: {source}")]
    Navigate {
        url: String,
        #[source]
        source: CmdError,
    },

    #[error("failed to capture rendered markup: {0}")]
    Capture(#[source] CmdError),

    #[error("rendered page has no markup")]
    EmptyCapture,

    #[error("render exceeded the session limit of {0:?}")]
    Timeout(Duration),
}

/// Something that turns a page URL into its rendered markup
pub trait PageRenderer {
    fn render(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<RenderedDocument, RenderError>> + Send;
}

/// Settings for a WebDriver-backed render
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// WebDriver server used when no driver binary is configured
    pub webdriver_url: String,

    /// Driver binary to spawn privately for every render
    pub chromedriver_path: Option<PathBuf>,

    pub headless: bool,

    /// Pause after navigation so challenge and redirect scripts can finish
    pub settle_interval: Duration,

    /// Hard ceiling on driver start-up, connection, navigation and capture
    pub session_timeout: Duration,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:4444".to_string(),
            chromedriver_path: None,
            headless: true,
            settle_interval: Duration::from_secs(3),
            session_timeout: Duration::from_secs(300),
        }
    }
}

/// Renders pages in Chrome through WebDriver
#[derive(Debug, Clone, Default)]
pub struct WebDriverRenderer {
    options: RenderOptions,
}

impl WebDriverRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Chrome capabilities for a small, non-interactive window
    ///
    /// The sandbox is disabled so Chrome can start inside containers.
    pub fn capabilities(&self) -> Map<String, Value> {
        let mut args = vec![
            "--disable-gpu",
            "--window-size=1,1",
            "--no-sandbox",
            "--disable-setuid-sandbox",
        ];
        if self.options.headless {
            args.push("--headless=new");
        }

        let mut caps = Map::new();
        caps.insert("browserName".to_string(), json!("chrome"));
        caps.insert("goog:chromeOptions".to_string(), json!({ "args": args }));
        caps
    }

    /// Connect a session, capture the page, and close the session again
    async fn run_session(
        &self,
        endpoint: Option<String>,
        url: &str,
        deadline: tokio::time::Instant,
    ) -> Result<RenderedDocument, RenderError> {
        let client = match timeout_at(deadline, self.connect(endpoint.as_deref())).await {
            Ok(client) => client?,
            Err(_) => return Err(RenderError::Timeout(self.options.session_timeout)),
        };

        let captured = match timeout_at(deadline, self.capture(&client, url)).await {
            Ok(captured) => captured,
            Err(_) => Err(RenderError::Timeout(self.options.session_timeout)),
        };

        match tokio::time::timeout(SESSION_CLOSE_TIMEOUT, client.close()).await {
            Ok(Ok(())) => ::log::debug!("Closed WebDriver session for {}", url),
            Ok(Err(e)) => ::log::warn!("Failed to close WebDriver session: {}", e),
            Err(_) => ::log::warn!("Timed out closing WebDriver session for {}", url),
        }

        captured
    }

    /// WebDriver endpoints to try, in order
    ///
    /// A spawned driver is the only candidate. Otherwise the configured URL is
    /// tried first, followed by common local defaults.
    fn endpoints<'a>(&'a self, spawned: Option<&'a str>) -> Vec<&'a str> {
        match spawned {
            Some(endpoint) => vec![endpoint],
            None => std::iter::once(self.options.webdriver_url.as_str())
                .chain(
                    FALLBACK_WEBDRIVER_URLS
                        .into_iter()
                        .filter(|url| *url != self.options.webdriver_url),
                )
                .collect(),
        }
    }

    /// Connects to the WebDriver instance
    async fn connect(&self, spawned: Option<&str>) -> Result<Client, RenderError> {
        let candidates = self.endpoints(spawned);
        let preferred = candidates.first().copied();

        let mut failures = Vec::with_capacity(candidates.len());
        for endpoint in candidates {
            let mut builder = ClientBuilder::native();
            builder.capabilities(self.capabilities());
            match builder.connect(endpoint).await {
                Ok(client) => {
                    if Some(endpoint) == preferred {
                        ::log::debug!("Connected to WebDriver at {}", endpoint);
                    } else {
                        ::log::info!(
                            "WebDriver at {} was unavailable, using fallback {}",
                            self.options.webdriver_url,
                            endpoint
                        );
                    }
                    return Ok(client);
                }
                Err(e) => {
                    ::log::debug!("WebDriver at {} refused a session: {}", endpoint, e);
                    failures.push(format!("{}: {}", endpoint, e));
                }
            }
        }

        ::log::error!(
            "Make sure a WebDriver server is running, set WEBDRIVER_URL, or configure a chromedriver path"
        );
        Err(RenderError::Connect(failures.join("; ")))
    }

    /// Navigate, let scripts settle, and serialize the document root
    async fn capture(&self, client: &Client, url: &str) -> Result<RenderedDocument, RenderError> {
        client
            .goto(url)
            .await
            .map_err(|source| RenderError::Navigate {
                url: url.to_string(),
                source,
            })?;

        tokio::time::sleep(self.options.settle_interval).await;

        let root = client
            .find(Locator::Css("html"))
            .await
            .map_err(RenderError::Capture)?;
        let html = root.html(false).await.map_err(RenderError::Capture)?;

        RenderedDocument::new(html).ok_or(RenderError::EmptyCapture)
    }
}

impl PageRenderer for WebDriverRenderer {
    /// Render a page, tearing down the session and any spawned driver on
    /// every exit path (session first, then the driver process)
    async fn render(&self, url: &str) -> Result<RenderedDocument, RenderError> {
        ::log::info!("Rendering: {}", url);
        let started = Instant::now();
        let deadline = tokio::time::Instant::now() + self.options.session_timeout;

        let driver = match &self.options.chromedriver_path {
            Some(path) => {
                match timeout_at(deadline, DriverProcess::spawn(path, DRIVER_READY_TIMEOUT)).await
                {
                    Ok(Ok(driver)) => Some(driver),
                    Ok(Err(e)) => return Err(RenderError::DriverSpawn(e)),
                    Err(_) => return Err(RenderError::Timeout(self.options.session_timeout)),
                }
            }
            None => None,
        };

        let result = self
            .run_session(driver.as_ref().map(DriverProcess::url), url, deadline)
            .await;

        if let Some(driver) = driver {
            driver.shutdown().await;
        }

        match &result {
            Ok(doc) => ::log::info!(
                "Rendered {} ({} bytes) in {:.2} seconds",
                url,
                doc.html().len(),
                started.elapsed().as_secs_f64()
            ),
            Err(e) => ::log::error!("Failed to render {}: {}", url, e),
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_capabilities() {
        let renderer = WebDriverRenderer::default();
        let caps = renderer.capabilities();
        let args = caps["goog:chromeOptions"]["args"].as_array().unwrap();

        for expected in [
            "--disable-gpu",
            "--window-size=1,1",
            "--no-sandbox",
            "--disable-setuid-sandbox",
            "--headless=new",
        ] {
            assert!(args.iter().any(|a| a == expected), "missing {expected}");
        }
    }

    #[test]
    fn test_headed_capabilities() {
        let renderer = WebDriverRenderer::new(RenderOptions {
            headless: false,
            ..RenderOptions::default()
        });
        let caps = renderer.capabilities();
        let args = caps["goog:chromeOptions"]["args"].as_array().unwrap();
        assert!(!args.iter().any(|a| a == "--headless=new"));
    }

    #[tokio::test]
    async fn test_missing_driver_binary() {
        let renderer = WebDriverRenderer::new(RenderOptions {
            chromedriver_path: Some(PathBuf::from("/nonexistent/chromedriver")),
            ..RenderOptions::default()
        });

        let result = renderer.render("https://example.com/").await;
        assert!(matches!(result, Err(RenderError::DriverSpawn(_))));
    }

    #[tokio::test]
    async fn test_hung_webdriver_hits_session_limit() {
        // Accepts connections but never answers
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hold = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let renderer = WebDriverRenderer::new(RenderOptions {
            webdriver_url: format!("http://{}", addr),
            session_timeout: Duration::from_millis(300),
            ..RenderOptions::default()
        });

        let result = renderer.render("https://example.com/").await;
        assert!(matches!(result, Err(RenderError::Timeout(_))));
        hold.abort();
    }

    #[tokio::test]
    async fn test_render_against_webdriver_protocol() {
        let server = MockServer::start().await;
        let markup = "<html><head></head><body><a href=\"/m.pdf\">m</a></body></html>";

        Mock::given(method("POST"))
            .and(path("/session"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": { "sessionId": "s1", "capabilities": { "browserName": "chrome" } }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/session/s1/url"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": "about:blank" })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/session/s1/url"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": null })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/session/s1/element"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({
                    "value": { "element-6066-11e4-a52e-4f735466cecf": "e1" }
                })),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/session/s1/element/e1/property/outerHTML"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": markup })))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/session/s1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": null })))
            .expect(1)
            .mount(&server)
            .await;

        let doc = protocol_renderer(&server)
            .render("https://example.com/manuals")
            .await
            .unwrap();
        assert_eq!(doc.html(), markup);
    }

    #[tokio::test]
    async fn test_session_closed_after_navigation_failure() {
        let server = MockServer::start().await;
        mount_session(&server).await;
        Mock::given(method("POST"))
            .and(path("/session/s1/url"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/session/s1/element"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": null })))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/session/s1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": null })))
            .expect(1)
            .mount(&server)
            .await;

        let result = protocol_renderer(&server)
            .render("https://example.com/manuals")
            .await;

        assert!(matches!(
            result,
            Err(RenderError::Navigate { ref url, .. }) if url == "https://example.com/manuals"
        ));
    }

    #[tokio::test]
    async fn test_session_closed_after_capture_failure() {
        let server = MockServer::start().await;
        mount_session(&server).await;
        Mock::given(method("POST"))
            .and(path("/session/s1/url"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": null })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/session/s1/element"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "value": {
                    "error": "no such element",
                    "message": "no such element: html",
                    "stacktrace": ""
                }
            })))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/session/s1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": null })))
            .expect(1)
            .mount(&server)
            .await;

        let result = protocol_renderer(&server)
            .render("https://example.com/manuals")
            .await;

        assert!(matches!(result, Err(RenderError::Capture(_))));
    }

    async fn mount_session(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/session"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": { "sessionId": "s1", "capabilities": { "browserName": "chrome" } }
            })))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/session/s1/url"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": "about:blank" })))
            .mount(server)
            .await;
    }

    fn protocol_renderer(server: &MockServer) -> WebDriverRenderer {
        WebDriverRenderer::new(RenderOptions {
            webdriver_url: server.uri(),
            settle_interval: Duration::from_millis(10),
            session_timeout: Duration::from_secs(10),
            ..RenderOptions::default()
        })
    }

    #[test]
    fn test_endpoint_order() {
        let renderer = WebDriverRenderer::new(RenderOptions {
            webdriver_url: "http://127.0.0.1:4444".to_string(),
            ..RenderOptions::default()
        });
        assert_eq!(
            renderer.endpoints(None),
            vec!["http://127.0.0.1:4444", "http://localhost:9515"]
        );
        assert_eq!(
            renderer.endpoints(Some("http://127.0.0.1:40123")),
            vec!["http://127.0.0.1:40123"]
        );
    }
}

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use carton_fs::{TempFile, TempFileRegistry, TempFileSpec};
use futures_util::Stream;
use url::Url;

use crate::core::{is_retryable, retry_delay};
use crate::data::{FetchOptions, FetchPhase, Progress};
use crate::effects::materialize::materialize_stream;
use crate::error::{FetchError, Result};

/// A boxed stream type for response bodies.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// An opened response: the announced length and the body.
pub struct HttpBody<E> {
    pub content_length: Option<u64>,
    pub stream:         BoxStream<'static, std::result::Result<Bytes, E>>,
}

/// Asynchronous HTTP client abstraction.
///
/// Implementations follow redirects, apply their own timeouts and turn
/// non-success statuses into errors before any body is returned.
///
/// - [`ReqwestClient`]: production implementation using `reqwest`
/// - mocks in tests
pub trait HttpClient: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Issues a GET and returns the response body as a stream.
    fn get(
        &self,
        url: &Url,
        headers: &[(String, String)],
    ) -> impl Future<Output = std::result::Result<HttpBody<Self::Error>, Self::Error>> + Send;
}

/// Downloads `http`/`https` locators into the temp file registry.
pub struct HttpDownloader<C> {
    client:   C,
    registry: TempFileRegistry,
    options:  FetchOptions,
}

impl<C: HttpClient> HttpDownloader<C> {
    pub fn new(client: C, registry: TempFileRegistry) -> Self {
        Self {
            client,
            registry,
            options: FetchOptions::default(),
        }
    }

    pub fn with_options(mut self, options: FetchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn registry(&self) -> &TempFileRegistry { &self.registry }

    pub fn client(&self) -> &C { &self.client }

    /// Fetches `url` into a new temp file named after `spec`.
    ///
    /// The name is checked before the request goes out.
    pub async fn fetch(&self, url: &Url, spec: &TempFileSpec) -> Result<TempFile> {
        self.registry.check_spec(spec)?;
        self.options
            .report(Progress::new(FetchPhase::Connecting, 0, None));

        let body = self.connect(url).await?;
        tracing::debug!(url = %redacted(url), length = ?body.content_length, "response opened");

        materialize_stream(
            &self.registry,
            body.stream,
            spec,
            body.content_length,
            &self.options,
        )
        .await
    }

    async fn connect(&self, url: &Url) -> Result<HttpBody<C::Error>> {
        let mut attempt = 0;
        loop {
            let result = self
                .client
                .get(url, &self.options.headers)
                .await
                .map_err(FetchError::network);

            match result {
                Err(err) if attempt < self.options.max_retries && is_retryable(&err) => {
                    let delay = retry_delay(attempt, self.options.retry_backoff);
                    tracing::debug!(url = %redacted(url), attempt, ?delay, error = %err, "retrying connect");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

pub(crate) fn redacted(url: &Url) -> Url {
    let mut url = url.clone();
    let _ = url.set_username("");
    let _ = url.set_password(None);
    url
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use super::*;
    use crate::data::ClientOptions;

    /// Production HTTP client implementation using reqwest.
    #[derive(Clone, Debug)]
    pub struct ReqwestClient {
        client: reqwest::Client,
    }

    impl ReqwestClient {
        pub fn new(options: &ClientOptions) -> Result<Self> {
            let mut builder = reqwest::Client::builder().user_agent(options.get_user_agent());
            if let Some(timeout) = options.get_connect_timeout() {
                builder = builder.connect_timeout(timeout);
            }
            let client = builder.build().map_err(FetchError::network)?;
            Ok(Self { client })
        }
    }

    impl HttpClient for ReqwestClient {
        type Error = reqwest::Error;

        async fn get(
            &self,
            url: &Url,
            headers: &[(String, String)],
        ) -> std::result::Result<HttpBody<Self::Error>, Self::Error> {
            let mut request = self.client.get(url.clone());
            for (key, value) in headers {
                request = request.header(key, value);
            }

            let response = request.send().await?.error_for_status()?;
            let content_length = response.content_length();
            Ok(HttpBody {
                content_length,
                stream: Box::pin(response.bytes_stream()),
            })
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::ReqwestClient;

//! Fluent request builder and verb dispatch

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use url::{form_urlencoded, Url};

use crate::decoder::{drain, BodyDecoder};
use crate::error::{Error, Result};
use crate::provider::BodyProvider;
use crate::uri::{normalize_base, resolve_path};
use crate::DEFAULT_TIMEOUT;

/// Fluent, synchronous HTTP request builder.
///
/// A `Client` accumulates a base URL, path, method, headers, query parameters
/// and body configuration across chained calls, then fires one blocking
/// request per verb-method invocation and decodes the response into the
/// caller's success or failure target by status class.
///
/// One instance serves one request at a time; for concurrent traffic derive
/// independent instances with [`Client::fork`].
pub struct Client {
    base: String,
    path: String,
    uri_override: Option<String>,
    method: Method,
    headers: HeaderMap,
    queries: BTreeMap<String, Vec<String>>,
    auth: String,
    status_code: u16,
    provider: Option<BodyProvider>,
    decoder: Option<BodyDecoder>,
    body_err: Option<Error>,
    transport: reqwest::blocking::Client,
    timeout: Duration,
}

impl Client {
    /// Create a client for `base_url` with the hardened default transport
    /// and the default timeout.
    ///
    /// Fails with [`Error::InvalidBase`] when the URL is empty, carries a
    /// scheme other than http/https, or has a malformed host.
    pub fn new(base_url: &str) -> Result<Self> {
        let base = normalize_base(base_url);
        if base.is_empty() {
            return Err(Error::InvalidBase(base_url.to_string()));
        }
        Ok(Self {
            base,
            path: String::new(),
            uri_override: None,
            method: Method::GET,
            headers: HeaderMap::new(),
            queries: BTreeMap::new(),
            auth: String::new(),
            status_code: 0,
            provider: None,
            decoder: None,
            body_err: None,
            transport: default_transport()?,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Derive a client for a new base URL, carrying over this instance's
    /// headers, method, body provider, decoder, auth and timeout.
    ///
    /// The copy owns its configuration outright; only the transport handle
    /// is shared, so the pair can serve overlapping requests from separate
    /// threads. Per-request state (path, queries, status) starts fresh.
    pub fn fork(&self, base_url: &str) -> Result<Self> {
        let base = normalize_base(base_url);
        if base.is_empty() {
            return Err(Error::InvalidBase(base_url.to_string()));
        }
        Ok(Self {
            base,
            path: String::new(),
            uri_override: None,
            method: self.method.clone(),
            headers: self.headers.clone(),
            queries: BTreeMap::new(),
            auth: self.auth.clone(),
            status_code: 0,
            provider: self.provider.clone(),
            decoder: self.decoder,
            body_err: None,
            transport: self.transport.clone(),
            timeout: self.timeout,
        })
    }

    /// Replace the base URL.
    ///
    /// An invalid URL leaves the client with an empty base; a request fired
    /// in that state fails with a URI construction error.
    pub fn base(&mut self, base_url: &str) -> &mut Self {
        self.base = normalize_base(base_url);
        self
    }

    /// Set the request path, resolved against the current base. A path that
    /// does not resolve leaves the empty path in place.
    pub fn path(&mut self, path: &str) -> &mut Self {
        self.path = resolve_path(&self.base, path);
        self
    }

    /// Set a complete request URI for exactly one request.
    ///
    /// The override takes precedence over base/path composition and is
    /// consumed when the next request resolves its URI.
    pub fn uri(&mut self, uri: &str) -> &mut Self {
        self.uri_override = Some(uri.to_string());
        self
    }

    /// Select the HTTP method by name, case-insensitively. Unrecognized
    /// names normalize to GET.
    pub fn method(&mut self, name: &str) -> &mut Self {
        self.with_method(normalize_method(name))
    }

    /// Append a header value, keeping any existing values for the key.
    /// Pairs the HTTP layer rejects are skipped with a warning.
    pub fn add_header(&mut self, key: &str, value: &str) -> &mut Self {
        if let Some((name, value)) = parse_header(key, value) {
            self.headers.append(name, value);
        }
        self
    }

    /// Set a header, replacing any existing values for the key.
    pub fn set_header(&mut self, key: &str, value: &str) -> &mut Self {
        if let Some((name, value)) = parse_header(key, value) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Remove all values for a header key.
    pub fn del_header(&mut self, key: &str) -> &mut Self {
        if let Ok(name) = HeaderName::from_bytes(key.as_bytes()) {
            self.headers.remove(name);
        }
        self
    }

    /// Append a query parameter value, keeping existing values for the key.
    pub fn add_query_param(&mut self, key: &str, value: &str) -> &mut Self {
        self.queries
            .entry(key.to_string())
            .or_default()
            .push(value.to_string());
        self
    }

    /// Set a query parameter, replacing any existing values for the key.
    pub fn set_query_param(&mut self, key: &str, value: &str) -> &mut Self {
        self.queries.insert(key.to_string(), vec![value.to_string()]);
        self
    }

    /// Remove all values for a query parameter key.
    pub fn del_query_param(&mut self, key: &str) -> &mut Self {
        self.queries.remove(key);
        self
    }

    /// Drop every accumulated query parameter. Runs automatically after
    /// each fired request, whatever its outcome.
    pub fn clean_query_params(&mut self) -> &mut Self {
        self.queries.clear();
        self
    }

    /// Attach HTTP Basic credentials. A no-op when either side is empty.
    ///
    /// The plaintext `username:password` pair stays readable through
    /// [`Client::get_basic_auth`]; the Authorization header carries the
    /// Base64-encoded form.
    pub fn set_basic_auth(&mut self, username: &str, password: &str) -> &mut Self {
        if username.is_empty() || password.is_empty() {
            return self;
        }
        self.auth = format!("{username}:{password}");
        let credential = format!("Basic {}", STANDARD.encode(self.auth.as_bytes()));
        self.set_header(AUTHORIZATION.as_str(), &credential)
    }

    /// The plaintext `username:password` credential, empty when unset.
    pub fn get_basic_auth(&self) -> &str {
        &self.auth
    }

    /// Status code of the last response, `0` before any request has fired.
    /// A decode failure does not clear the recorded status.
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    /// Attach a body provider, setting the matching Content-Type header and
    /// pointing the accept side at the same MIME type.
    pub fn body_provider(&mut self, provider: BodyProvider) -> &mut Self {
        let content_type = provider.content_type();
        self.provider = Some(provider);
        self.set_header(CONTENT_TYPE.as_str(), content_type);
        self.accept(content_type)
    }

    /// Attach `payload` as a form-encoded request body. A payload that
    /// serializes to null attaches nothing.
    pub fn body_as_form<T: Serialize>(&mut self, payload: &T) -> &mut Self {
        self.capture_body(payload, BodyProvider::Form)
    }

    /// Attach `payload` as a JSON request body. A payload that serializes
    /// to null attaches nothing.
    pub fn body_as_json<T: Serialize>(&mut self, payload: &T) -> &mut Self {
        self.capture_body(payload, BodyProvider::Json)
    }

    /// Declare a plain-text request body for `payload`. The wire body is
    /// empty; only the Content-Type and Accept sides take effect.
    pub fn body_as_text<T: Serialize>(&mut self, payload: &T) -> &mut Self {
        self.capture_body(payload, BodyProvider::Text)
    }

    /// Attach a response decoder and advertise its MIME type in the Accept
    /// header.
    pub fn body_response(&mut self, decoder: BodyDecoder) -> &mut Self {
        self.decoder = Some(decoder);
        self.set_header(ACCEPT.as_str(), decoder.accept())
    }

    /// Select the response decoder by MIME type. Unrecognized types clear
    /// the decoder; their response bodies are drained and discarded.
    pub fn accept(&mut self, mime: &str) -> &mut Self {
        match BodyDecoder::from_mime(mime) {
            Some(decoder) => self.body_response(decoder),
            None => {
                self.decoder = None;
                self
            }
        }
    }

    /// Replace the transport with a caller-configured one.
    pub fn set_client_transport(&mut self, transport: reqwest::blocking::Client) -> &mut Self {
        self.transport = transport;
        self
    }

    /// Set the per-request timeout. Fresh clients start at
    /// [`DEFAULT_TIMEOUT`](crate::DEFAULT_TIMEOUT).
    pub fn set_client_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.timeout = timeout;
        self
    }

    /// Resolve the URI the next request will use.
    ///
    /// A pending [`Client::uri`] override is consumed and returned verbatim;
    /// otherwise the normalized base, resolved path and encoded query
    /// parameters (keys in alphabetical order) are combined.
    pub fn prepare_request_uri(&mut self) -> String {
        if let Some(uri) = self.uri_override.take() {
            return uri;
        }
        let mut uri = format!("{}{}", self.base, self.path);
        if !self.queries.is_empty() {
            uri.push('?');
            uri.push_str(&self.encoded_queries());
        }
        uri
    }

    /// Fire the configured request and route the response body into the
    /// success or failure target by status class.
    ///
    /// The response status is recorded before any decode, so a decode
    /// failure still leaves it observable through [`Client::status_code`].
    /// Accumulated query parameters are cleared on every exit path. Pass
    /// `None::<&mut ()>` for a target slot you do not care about.
    pub fn execute<S, F>(
        &mut self,
        success: Option<&mut S>,
        failure: Option<&mut F>,
    ) -> Result<&mut Self>
    where
        S: DeserializeOwned,
        F: DeserializeOwned,
    {
        let outcome = self.dispatch(success, failure);
        self.clean_query_params();
        outcome.map(|()| self)
    }

    /// Fire a HEAD request against `path`.
    pub fn head<S, F>(
        &mut self,
        path: &str,
        success: Option<&mut S>,
        failure: Option<&mut F>,
    ) -> Result<&mut Self>
    where
        S: DeserializeOwned,
        F: DeserializeOwned,
    {
        self.with_method(Method::HEAD).path(path).execute(success, failure)
    }

    /// Fire a GET request against `path`.
    pub fn get<S, F>(
        &mut self,
        path: &str,
        success: Option<&mut S>,
        failure: Option<&mut F>,
    ) -> Result<&mut Self>
    where
        S: DeserializeOwned,
        F: DeserializeOwned,
    {
        self.with_method(Method::GET).path(path).execute(success, failure)
    }

    /// Fire a PUT request against `path`.
    pub fn put<S, F>(
        &mut self,
        path: &str,
        success: Option<&mut S>,
        failure: Option<&mut F>,
    ) -> Result<&mut Self>
    where
        S: DeserializeOwned,
        F: DeserializeOwned,
    {
        self.with_method(Method::PUT).path(path).execute(success, failure)
    }

    /// Fire a POST request against `path`.
    pub fn post<S, F>(
        &mut self,
        path: &str,
        success: Option<&mut S>,
        failure: Option<&mut F>,
    ) -> Result<&mut Self>
    where
        S: DeserializeOwned,
        F: DeserializeOwned,
    {
        self.with_method(Method::POST).path(path).execute(success, failure)
    }

    /// Fire a PATCH request against `path`.
    pub fn patch<S, F>(
        &mut self,
        path: &str,
        success: Option<&mut S>,
        failure: Option<&mut F>,
    ) -> Result<&mut Self>
    where
        S: DeserializeOwned,
        F: DeserializeOwned,
    {
        self.with_method(Method::PATCH).path(path).execute(success, failure)
    }

    /// Fire a DELETE request against `path`.
    pub fn delete<S, F>(
        &mut self,
        path: &str,
        success: Option<&mut S>,
        failure: Option<&mut F>,
    ) -> Result<&mut Self>
    where
        S: DeserializeOwned,
        F: DeserializeOwned,
    {
        self.with_method(Method::DELETE).path(path).execute(success, failure)
    }

    /// Fire an OPTIONS request against `path`.
    pub fn options<S, F>(
        &mut self,
        path: &str,
        success: Option<&mut S>,
        failure: Option<&mut F>,
    ) -> Result<&mut Self>
    where
        S: DeserializeOwned,
        F: DeserializeOwned,
    {
        self.with_method(Method::OPTIONS).path(path).execute(success, failure)
    }

    /// Fire a TRACE request against `path`.
    pub fn trace<S, F>(
        &mut self,
        path: &str,
        success: Option<&mut S>,
        failure: Option<&mut F>,
    ) -> Result<&mut Self>
    where
        S: DeserializeOwned,
        F: DeserializeOwned,
    {
        self.with_method(Method::TRACE).path(path).execute(success, failure)
    }

    /// Fire a CONNECT request against `path`.
    pub fn connect<S, F>(
        &mut self,
        path: &str,
        success: Option<&mut S>,
        failure: Option<&mut F>,
    ) -> Result<&mut Self>
    where
        S: DeserializeOwned,
        F: DeserializeOwned,
    {
        self.with_method(Method::CONNECT).path(path).execute(success, failure)
    }

    fn with_method(&mut self, method: Method) -> &mut Self {
        self.method = method;
        self
    }

    /// One request/response cycle; split out so [`Client::execute`] can
    /// reset query state on every exit path.
    fn dispatch<S, F>(&mut self, success: Option<&mut S>, failure: Option<&mut F>) -> Result<()>
    where
        S: DeserializeOwned,
        F: DeserializeOwned,
    {
        if let Some(err) = self.body_err.take() {
            return Err(err);
        }

        let uri = self.prepare_request_uri();
        let url = Url::parse(&uri)?;

        let body = match &self.provider {
            Some(provider) => Some(provider.body()?),
            None => None,
        };

        tracing::debug!("{} {}", self.method, url);

        let mut request = self
            .transport
            .request(self.method.clone(), url)
            .headers(self.headers.clone())
            .timeout(self.timeout);
        if let Some(bytes) = body {
            request = request.body(bytes);
        }

        let response = request.send()?;
        self.status_code = response.status().as_u16();
        tracing::debug!("Response status: {}", self.status_code);

        if self.status_code == 204 {
            return Ok(());
        }
        let Some(decoder) = self.decoder else {
            return drain(response);
        };
        if (200..=299).contains(&self.status_code) {
            match success {
                Some(target) => decoder.decode(response, target),
                None => drain(response),
            }
        } else {
            match failure {
                Some(target) => decoder.decode(response, target),
                None => drain(response),
            }
        }
    }

    /// Encode accumulated query parameters, keys in alphabetical order and
    /// spaces as `+`.
    fn encoded_queries(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, values) in &self.queries {
            for value in values {
                serializer.append_pair(key, value);
            }
        }
        serializer.finish()
    }

    /// Capture `payload` under a provider variant. Serialization failures
    /// are held and surfaced by the next execute call.
    fn capture_body<T: Serialize>(
        &mut self,
        payload: &T,
        variant: fn(Value) -> BodyProvider,
    ) -> &mut Self {
        match serde_json::to_value(payload) {
            Ok(Value::Null) => self,
            Ok(value) => self.body_provider(variant(value)),
            Err(err) => {
                self.body_err = Some(Error::Encode(err.to_string()));
                self
            }
        }
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base", &self.base)
            .field("path", &self.path)
            .field("method", &self.method)
            .field("status_code", &self.status_code)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Build the hardened default transport: explicit connect, keepalive and
/// pool settings instead of the library's bare defaults.
fn default_transport() -> Result<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .connect_timeout(Duration::from_secs(30))
        .tcp_keepalive(Duration::from_secs(30))
        .pool_idle_timeout(Duration::from_secs(90))
        .pool_max_idle_per_host(8)
        .build()
        .map_err(Error::from)
}

/// Map `name` onto the known verb set, defaulting to GET.
fn normalize_method(name: &str) -> Method {
    match name.to_ascii_uppercase().as_str() {
        "HEAD" => Method::HEAD,
        "GET" => Method::GET,
        "PUT" => Method::PUT,
        "POST" => Method::POST,
        "PATCH" => Method::PATCH,
        "DELETE" => Method::DELETE,
        "OPTIONS" => Method::OPTIONS,
        "TRACE" => Method::TRACE,
        "CONNECT" => Method::CONNECT,
        _ => Method::GET,
    }
}

/// Parse a header pair, skipping pairs the HTTP layer rejects.
fn parse_header(key: &str, value: &str) -> Option<(HeaderName, HeaderValue)> {
    match (
        HeaderName::from_bytes(key.as_bytes()),
        HeaderValue::from_str(value),
    ) {
        (Ok(name), Ok(value)) => Some((name, value)),
        _ => {
            tracing::warn!("Skipping malformed header: {}", key);
            None
        }
    }
}

//! HTTP-over-unix-socket implementation of [`ProcessControl`].

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use http_body_util::{BodyExt, Full, Limited};
use hyper::body::Bytes;
use hyper::client::conn::http1;
use hyper::header::{CONTENT_TYPE, HOST};
use hyper::{Method, Request, StatusCode};
use hyper_util::rt::TokioIo;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::net::UnixStream;
use tracing::{debug, trace};

use super::{ControlError, ProcessControl, ServerStatus};
use crate::consts::{CONTROL_MAX_RESPONSE_BYTES, CONTROL_REQUEST_TIMEOUT};

/// Characters escaped in a server name used as one path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
  .add(b' ')
  .add(b'"')
  .add(b'#')
  .add(b'%')
  .add(b'/')
  .add(b'<')
  .add(b'>')
  .add(b'?')
  .add(b'`')
  .add(b'{')
  .add(b'}');

#[derive(Debug, Clone)]
pub struct UnixSocketClient {
  socket: PathBuf,
  request_timeout: Duration,
}

#[derive(Deserialize)]
struct StatusBody {
  status: ServerStatus,
}

#[derive(Deserialize)]
struct ServersBody {
  servers: BTreeMap<String, StatusBody>,
}

impl UnixSocketClient {
  pub fn new(socket: impl Into<PathBuf>) -> Self {
    Self {
      socket: socket.into(),
      request_timeout: CONTROL_REQUEST_TIMEOUT,
    }
  }

  pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
    self.request_timeout = timeout;
    self
  }

  /// One request per connection. Anything but `200` is an error.
  async fn request(&self, method: Method, path: &str, body: Option<&'static str>) -> Result<Bytes, ControlError> {
    let exchange = async {
      let stream = UnixStream::connect(&self.socket)
        .await
        .map_err(|source| ControlError::Connect {
          path: self.socket.clone(),
          source,
        })?;
      let (mut sender, connection) = http1::handshake(TokioIo::new(stream)).await?;
      tokio::spawn(async move {
        if let Err(e) = connection.await {
          debug!(error = %e, "process control connection closed");
        }
      });

      let mut builder = Request::builder().method(method.clone()).uri(path).header(HOST, "localhost");
      if body.is_some() {
        builder = builder.header(CONTENT_TYPE, "text/plain");
      }
      let request = builder.body(Full::new(Bytes::from_static(body.unwrap_or_default().as_bytes())))?;

      let response = sender.send_request(request).await?;
      let status = response.status();
      let body = Limited::new(response.into_body(), CONTROL_MAX_RESPONSE_BYTES)
        .collect()
        .await
        .map_err(ControlError::Body)?
        .to_bytes();
      Ok::<_, ControlError>((status, body))
    };

    let (status, body) = tokio::time::timeout(self.request_timeout, exchange)
      .await
      .map_err(|_| ControlError::Timeout(self.request_timeout))??;
    trace!(%method, path, status = status.as_u16(), "process control response");

    if status != StatusCode::OK {
      return Err(ControlError::Http {
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or_default().to_string(),
      });
    }
    Ok(body)
  }

  async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ControlError> {
    let body = self.request(Method::GET, path, None).await?;
    Ok(serde_json::from_slice(&body)?)
  }

  async fn signal(&self, server: &str, action: &'static str) -> Result<(), ControlError> {
    debug!(server, action, "sending signal");
    self
      .request(Method::POST, &server_path(server), Some(action))
      .await
      .map(|_| ())
  }
}

fn server_path(server: &str) -> String {
  format!("/server/{}", utf8_percent_encode(server, PATH_SEGMENT))
}

#[async_trait]
impl ProcessControl for UnixSocketClient {
  async fn servers(&self) -> Result<BTreeMap<String, ServerStatus>, ControlError> {
    let body: ServersBody = self.get_json("/servers?extrainfo=true").await?;
    Ok(
      body
        .servers
        .into_iter()
        .map(|(name, info)| (name, info.status))
        .collect(),
    )
  }

  async fn status(&self, server: &str) -> Result<ServerStatus, ControlError> {
    let body: StatusBody = self.get_json(&server_path(server)).await?;
    Ok(body.status)
  }

  async fn start(&self, server: &str) -> Result<(), ControlError> {
    self.signal(server, "START").await
  }

  async fn terminate(&self, server: &str) -> Result<(), ControlError> {
    self.signal(server, "TERM").await
  }
}

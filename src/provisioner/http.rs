use crate::error::{Error, Result};
use crate::provisioner::{
    CreateGroupRequest, CreateInstallationRequest, Group, Installation, Provisioner,
};
use derivative::*;
use hyper::body::{to_bytes, Bytes};
use hyper::client::HttpConnector;
use hyper::header::{ACCEPT, CONTENT_TYPE};
use hyper::{Body, Client, Method, Request, StatusCode};
use hyper_tls::HttpsConnector;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

const JSON: &str = "application/json";

/// Provisioner client speaking JSON over HTTP(S).
#[derive(Derivative)]
#[derivative(Debug)]
pub struct HttpProvisioner {
    base_url: String,
    request_timeout: Duration,
    #[derivative(Debug = "ignore")]
    client: Client<HttpsConnector<HttpConnector>>,
}

impl HttpProvisioner {
    pub fn new(server: &str, request_timeout: Duration) -> Self {
        let client = Client::builder().build::<_, Body>(HttpsConnector::new());
        Self {
            base_url: server.trim_end_matches('/').to_owned(),
            request_timeout,
            client,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<(StatusCode, Bytes)> {
        let uri = self.endpoint(path);
        let builder = Request::builder()
            .method(method.clone())
            .uri(uri.as_str())
            .header(ACCEPT, JSON);
        let request = match body {
            Some(body) => builder.header(CONTENT_TYPE, JSON).body(Body::from(body))?,
            None => builder.body(Body::empty())?,
        };
        let exchange = async {
            let response = self.client.request(request).await?;
            let status = response.status();
            let body = to_bytes(response.into_body()).await?;
            Ok::<_, Error>((status, body))
        };
        match tokio::time::timeout(self.request_timeout, exchange).await {
            Ok(result) => {
                if let Ok((status, _)) = &result {
                    trace!("{} {} -> {}", method, uri, status);
                }
                result
            }
            Err(_) => Err(Error::Connection(format!(
                "{} {} timed out after {:?}",
                method, uri, self.request_timeout
            ))),
        }
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let payload = serde_json::to_vec(body)?;
        let (status, body) = self.send(Method::POST, path, Some(payload)).await?;
        decode(status, &body)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        let (status, body) = self.send(Method::GET, path, None).await?;
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        decode(status, &body).map(Some)
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let (status, body) = self.send(Method::DELETE, path, None).await?;
        check_status(status, &body)
    }
}

fn check_status(status: StatusCode, body: &Bytes) -> Result<()> {
    if status.is_success() {
        Ok(())
    } else {
        Err(Error::Api {
            status: status.as_u16(),
            message: String::from_utf8_lossy(body).trim().to_owned(),
        })
    }
}

fn decode<T: DeserializeOwned>(status: StatusCode, body: &Bytes) -> Result<T> {
    check_status(status, body)?;
    Ok(serde_json::from_slice(body)?)
}

#[async_trait::async_trait]
impl Provisioner for HttpProvisioner {
    async fn create_group(&self, request: &CreateGroupRequest) -> Result<Group> {
        self.post("groups", request).await
    }

    async fn get_group(&self, id: &str) -> Result<Option<Group>> {
        self.get(&format!("group/{}", id)).await
    }

    async fn delete_group(&self, id: &str) -> Result<()> {
        self.delete(&format!("group/{}", id)).await
    }

    async fn create_installation(
        &self,
        request: &CreateInstallationRequest,
    ) -> Result<Installation> {
        self.post("installations", request).await
    }

    async fn get_installation(&self, id: &str) -> Result<Option<Installation>> {
        self.get(&format!("installation/{}", id)).await
    }

    async fn delete_installation(&self, id: &str) -> Result<()> {
        self.delete(&format!("installation/{}", id)).await
    }
}

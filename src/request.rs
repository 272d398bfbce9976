use crate::config::ClientConfig;
use crate::error::{MeetolioError, Result};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::rc::Rc;

pub use meetolio_shared::protocol::HttpMethod;

#[cfg(test)]
use std::cell::RefCell;
#[cfg(test)]
use std::collections::VecDeque;

// =========================================================
// 核心抽象层 (HTTP Interface Abstraction)
// =========================================================

/// 通用 HTTP 请求结构
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    pub method: HttpMethod,
    pub headers: HashMap<String, String>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn new(url: &str, method: HttpMethod) -> Self {
        Self {
            url: url.to_string(),
            method,
            headers: HashMap::new(),
            body: None,
        }
    }

    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_bearer(self, token: &str) -> Self {
        self.with_header(
            meetolio_shared::HEADER_AUTHORIZATION,
            &format!("Bearer {}", token),
        )
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body.to_string());
        self.headers
            .insert("Content-Type".to_string(), "application/json".to_string());
        self
    }
}

/// 通用 HTTP 响应结构
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    /// 检查响应是否成功 (2xx)
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// 解析 JSON 响应体；空响应体按 `null` 处理（201/204 常见）
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        let body = self.body.trim();
        let body = if body.is_empty() { "null" } else { body };
        serde_json::from_str(body).map_err(MeetolioError::from)
    }
}

/// HTTP 客户端特性 (Trait)
/// 单线程事件循环模型，(?Send) 允许实现内部使用 Rc/RefCell
#[async_trait::async_trait(?Send)]
pub trait HttpClient {
    async fn send(&self, req: HttpRequest) -> Result<HttpResponse>;
}

/// 允许多个组件共享同一个客户端实例
#[async_trait::async_trait(?Send)]
impl<T: HttpClient + ?Sized> HttpClient for Rc<T> {
    async fn send(&self, req: HttpRequest) -> Result<HttpResponse> {
        (**self).send(req).await
    }
}

// =========================================================
// 实现层: reqwest 客户端 (Production)
// =========================================================

#[derive(Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    /// 按配置创建客户端；超时策略在这里生效，挂起的请求最终以 Transport 错误结束
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.as_str())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait(?Send)]
impl HttpClient for ReqwestHttpClient {
    async fn send(&self, req: HttpRequest) -> Result<HttpResponse> {
        let method = match req.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, &req.url);

        for (k, v) in &req.headers {
            builder = builder.header(k.as_str(), v.as_str());
        }

        if let Some(body) = req.body {
            builder = builder.body(body);
        }

        let resp = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                MeetolioError::transport(format!("request to {} timed out", req.url))
            } else {
                MeetolioError::transport(e.to_string())
            }
        })?;

        let status = resp.status().as_u16();
        let body = resp.text().await?;

        Ok(HttpResponse { status, body })
    }
}

// =========================================================
// 测试工具: MockHttpClient
// =========================================================

#[cfg(test)]
pub enum MockReply {
    Ready(u16, String),
    /// 模拟网络失败
    Fail(String),
    /// 由测试代码决定何时返回，用于制造交错的并发请求
    Deferred(futures::channel::oneshot::Receiver<(u16, String)>),
}

#[cfg(test)]
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Option<String>,
}

#[cfg(test)]
impl RecordedRequest {
    pub fn json_body(&self) -> serde_json::Value {
        self.body
            .as_deref()
            .and_then(|b| serde_json::from_str(b).ok())
            .unwrap_or(serde_json::Value::Null)
    }
}

/// 以 `METHOD url` 为键返回预设响应
///
/// 同一个键排了多个响应时依次弹出，最后一个 Ready/Fail 响应会被重复使用。
#[cfg(test)]
pub struct MockHttpClient {
    replies: RefCell<HashMap<String, VecDeque<MockReply>>>,
    pub requests: RefCell<Vec<RecordedRequest>>,
}

#[cfg(test)]
impl MockHttpClient {
    pub fn new() -> Self {
        Self {
            replies: RefCell::new(HashMap::new()),
            requests: RefCell::new(Vec::new()),
        }
    }

    fn key(method: HttpMethod, url: &str) -> String {
        format!("{} {}", method.as_str(), url)
    }

    fn push(&self, method: HttpMethod, url: &str, reply: MockReply) {
        self.replies
            .borrow_mut()
            .entry(Self::key(method, url))
            .or_default()
            .push_back(reply);
    }

    pub fn mock_response(&self, method: HttpMethod, url: &str, status: u16, body: serde_json::Value) {
        self.push(method, url, MockReply::Ready(status, body.to_string()));
    }

    pub fn mock_raw(&self, method: HttpMethod, url: &str, status: u16, body: &str) {
        self.push(method, url, MockReply::Ready(status, body.to_string()));
    }

    pub fn mock_failure(&self, method: HttpMethod, url: &str, message: &str) {
        self.push(method, url, MockReply::Fail(message.to_string()));
    }

    pub fn mock_deferred(
        &self,
        method: HttpMethod,
        url: &str,
    ) -> futures::channel::oneshot::Sender<(u16, String)> {
        let (tx, rx) = futures::channel::oneshot::channel();
        self.push(method, url, MockReply::Deferred(rx));
        tx
    }

    pub fn count(&self, method: HttpMethod, url: &str) -> usize {
        self.requests
            .borrow()
            .iter()
            .filter(|r| r.method == method && r.url == url)
            .count()
    }

    fn take_reply(&self, key: &str) -> Option<MockReply> {
        let mut replies = self.replies.borrow_mut();
        let queue = replies.get_mut(key)?;
        if queue.len() > 1 || matches!(queue.front()?, MockReply::Deferred(_)) {
            return queue.pop_front();
        }
        match queue.front()? {
            MockReply::Ready(status, body) => Some(MockReply::Ready(*status, body.clone())),
            MockReply::Fail(msg) => Some(MockReply::Fail(msg.clone())),
            MockReply::Deferred(_) => None,
        }
    }
}

#[cfg(test)]
#[async_trait::async_trait(?Send)]
impl HttpClient for MockHttpClient {
    async fn send(&self, req: HttpRequest) -> Result<HttpResponse> {
        self.requests.borrow_mut().push(RecordedRequest {
            method: req.method,
            url: req.url.clone(),
            headers: req.headers.clone(),
            body: req.body.clone(),
        });

        // 先释放 RefCell 借用，再等待 Deferred 响应
        let reply = self.take_reply(&Self::key(req.method, &req.url));
        match reply {
            Some(MockReply::Ready(status, body)) => Ok(HttpResponse { status, body }),
            Some(MockReply::Fail(msg)) => Err(MeetolioError::transport(msg)),
            Some(MockReply::Deferred(rx)) => match rx.await {
                Ok((status, body)) => Ok(HttpResponse { status, body }),
                Err(_) => Err(MeetolioError::transport("deferred reply dropped")),
            },
            None => Ok(HttpResponse {
                status: 404,
                body: "Not Found".to_string(),
            }),
        }
    }
}

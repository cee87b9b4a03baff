use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use crate::errors::ClientError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully built request, ready for the wire.
#[derive(Clone, Debug, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    pub timeout: Duration,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Raw response: status code and the undecoded body text.
#[derive(Clone, Debug, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs one HTTP exchange. Implementations must honor `request.timeout`
/// and report it as [`ClientError::Timeout`]; any other failure to get a
/// response is [`ClientError::Transport`].
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ClientError>;
}

impl<T: Transport> Transport for Rc<T> {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ClientError> {
        (**self).send(request).await
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use super::*;

    /// Replays queued outcomes in order and records every request it sees.
    #[derive(Default)]
    pub(crate) struct MockTransport {
        replies: RefCell<VecDeque<Result<HttpResponse, ClientError>>>,
        pub(crate) requests: RefCell<Vec<HttpRequest>>,
    }

    impl MockTransport {
        pub(crate) fn new() -> Rc<Self> {
            Rc::new(Self::default())
        }

        pub(crate) fn reply(&self, status: u16, body: serde_json::Value) {
            self.replies
                .borrow_mut()
                .push_back(Ok(HttpResponse { status, body: body.to_string() }));
        }

        pub(crate) fn reply_raw(&self, status: u16, body: &str) {
            self.replies
                .borrow_mut()
                .push_back(Ok(HttpResponse { status, body: body.to_string() }));
        }

        pub(crate) fn fail(&self, error: ClientError) {
            self.replies.borrow_mut().push_back(Err(error));
        }

        pub(crate) fn last_request(&self) -> HttpRequest {
            self.requests.borrow().last().cloned().expect("no request was sent")
        }

        pub(crate) fn request_count(&self) -> usize {
            self.requests.borrow().len()
        }
    }

    impl Transport for MockTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ClientError> {
            self.requests.borrow_mut().push(request);
            self.replies
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(ClientError::Transport("no scripted reply".to_string())))
        }
    }
}

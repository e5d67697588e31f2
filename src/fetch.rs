//! Feed retrieval collaborator: redirect-following fetch over a
//! caller-supplied transport

use tracing::debug;
use url::Url;

use crate::error::{Error, ErrorKind, Result};
use crate::parser::{Config, Parsed};

/// How many 301/302 hops a fetch will follow before giving up
pub const DEFAULT_REDIRECT_LIMIT: usize = 10;

/// One HTTP response, reduced to what feed retrieval needs
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    /// `Location` header on redirect responses; may be relative
    pub location: Option<String>,
    pub body: String,
}

impl Response {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            location: None,
            body: body.into(),
        }
    }

    pub fn redirect(status: u16, location: impl Into<String>) -> Self {
        Self {
            status,
            location: Some(location.into()),
            body: String::new(),
        }
    }
}

/// The HTTP seam. Implementations issue a single GET and report the
/// status, `Location` header and body; they never follow redirects
/// themselves.
pub trait Transport {
    fn get(&mut self, url: &str) -> Result<Response>;
}

/// Fetches a feed document, following redirects up to a bound.
#[derive(Debug)]
pub struct Fetcher<T> {
    transport: T,
    redirect_limit: usize,
}

impl<T: Transport> Fetcher<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            redirect_limit: DEFAULT_REDIRECT_LIMIT,
        }
    }

    pub fn with_redirect_limit(mut self, limit: usize) -> Self {
        self.redirect_limit = limit;
        self
    }

    /// GET `url`, following 301/302 through `Location`. A relative
    /// `Location` resolves against the URL that produced it. Exceeding
    /// the redirect bound fails with `RedirectLimitExceeded`; any other
    /// non-200 status fails with `Fetch`.
    pub fn fetch(&mut self, url: &str) -> Result<String> {
        let mut current = url.to_string();
        let mut redirects = 0;
        loop {
            let response = self.transport.get(&current)?;
            match response.status {
                200 => return Ok(response.body),
                301 | 302 => {
                    redirects += 1;
                    if redirects > self.redirect_limit {
                        return Err(Error::new(ErrorKind::RedirectLimitExceeded {
                            limit: self.redirect_limit,
                        }));
                    }
                    let location = response.location.ok_or_else(|| {
                        Error::with_message(
                            ErrorKind::Fetch {
                                status: response.status,
                            },
                            "redirect response without a Location header",
                        )
                    })?;
                    let next = match Url::parse(&current) {
                        Ok(base) => base
                            .join(&location)
                            .map(String::from)
                            .unwrap_or(location),
                        Err(_) => location,
                    };
                    debug!(from = %current, to = %next, "following redirect");
                    current = next;
                }
                status => return Err(Error::new(ErrorKind::Fetch { status })),
            }
        }
    }

    /// Fetch and hand the body to the string parsing entry point
    pub fn fetch_feed(&mut self, url: &str, config: Config) -> Result<Parsed> {
        let body = self.fetch(url)?;
        crate::parse_str_with_config(&body, config)
    }
}

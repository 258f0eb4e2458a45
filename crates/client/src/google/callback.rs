//! OAuth callback handling
//!
//! The authorization redirect lands either on a pasted URL (handed to
//! [`CallbackParams::from_url`]) or on the local loopback receiver
//! ([`wait_for_callback`]). Either way the parameters are classified
//! once: a provider error or a missing code/state is terminal and must
//! never reach the backend exchange.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::time::Duration;

/// Display delay before leaving the success state
pub const SUCCESS_DISPLAY_DELAY: Duration = Duration::from_secs(2);

/// Display delay before leaving the error state (longer, so the
/// message can be read)
pub const ERROR_DISPLAY_DELAY: Duration = Duration::from_secs(5);

/// Port range to try for the loopback callback receiver
const PORT_RANGE: std::ops::RangeInclusive<u16> = 8080..=8090;

/// Query parameters extracted from the authorization redirect
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

impl CallbackParams {
    /// Parse the parameters out of a full redirect URL
    pub fn from_url(redirect_url: &str) -> Result<Self, String> {
        let parsed = url::Url::parse(redirect_url)
            .map_err(|e| format!("invalid redirect URL: {}", e))?;
        let mut params = Self::default();
        for (key, value) in parsed.query_pairs() {
            match key.as_ref() {
                "code" => params.code = Some(value.into_owned()),
                "state" => params.state = Some(value.into_owned()),
                "error" => params.error = Some(value.into_owned()),
                _ => {}
            }
        }
        Ok(params)
    }

    /// Parse the parameters out of a bare query string
    /// (`code=...&state=...`)
    pub fn from_query(query: &str) -> Self {
        // Lean on the URL parser by rebuilding a synthetic URL
        Self::from_url(&format!("http://localhost/?{}", query)).unwrap_or_default()
    }
}

/// What to do with a received callback
#[derive(Debug, Clone, PartialEq)]
pub enum CallbackDisposition {
    /// Valid code and state: exchange them with the backend
    Exchange { code: String, state: String },
    /// Terminal error state: display only, no backend call
    Reject { message: String },
}

impl CallbackDisposition {
    /// How long the outcome stays on screen before moving on
    pub fn display_delay(&self) -> Duration {
        match self {
            CallbackDisposition::Exchange { .. } => SUCCESS_DISPLAY_DELAY,
            CallbackDisposition::Reject { .. } => ERROR_DISPLAY_DELAY,
        }
    }
}

/// Classify callback parameters into an exchange or a terminal error
pub fn classify(params: &CallbackParams) -> CallbackDisposition {
    if let Some(error) = &params.error {
        return CallbackDisposition::Reject {
            message: format!("Authorization was not granted: {}", error),
        };
    }
    match (&params.code, &params.state) {
        (Some(code), Some(state)) => CallbackDisposition::Exchange {
            code: code.clone(),
            state: state.clone(),
        },
        _ => CallbackDisposition::Reject {
            message: "The redirect is missing its code or state parameter".into(),
        },
    }
}

/// Bind the loopback receiver on the first free port in the range
pub fn bind_receiver() -> std::io::Result<(TcpListener, u16)> {
    for port in PORT_RANGE {
        if let Ok(listener) = TcpListener::bind(("127.0.0.1", port)) {
            return Ok((listener, port));
        }
    }
    Err(std::io::Error::new(
        std::io::ErrorKind::AddrInUse,
        format!(
            "no free port in {}-{}",
            PORT_RANGE.start(),
            PORT_RANGE.end()
        ),
    ))
}

/// Accept one redirect on the listener and extract its parameters.
///
/// Responds to the browser with a small HTML page so the tab doesn't
/// hang, then returns whatever parameters were present; classification
/// is the caller's job.
pub fn wait_for_callback(listener: TcpListener) -> std::io::Result<CallbackParams> {
    let (mut stream, _) = listener.accept()?;

    let mut reader = BufReader::new(&stream);
    let mut request_line = String::new();
    reader.read_line(&mut request_line)?;

    // Format: GET /?code=...&state=... HTTP/1.1
    let params = request_line
        .split_whitespace()
        .nth(1)
        .and_then(|path| path.split('?').nth(1))
        .map(CallbackParams::from_query)
        .unwrap_or_default();

    let (status, body) = if params.code.is_some() && params.error.is_none() {
        ("200 OK", "Authorization received. You can close this window.")
    } else {
        ("400 Bad Request", "Authorization failed. You can close this window.")
    };
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n<html><body><h1>{}</h1></body></html>",
        status, body
    );
    stream.write_all(response.as_bytes()).ok();

    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_redirect_url() {
        let params = CallbackParams::from_url(
            "http://localhost:3000/oauth/callback?code=4%2F0abc&state=xyz",
        )
        .unwrap();
        assert_eq!(params.code.as_deref(), Some("4/0abc"));
        assert_eq!(params.state.as_deref(), Some("xyz"));
        assert!(params.error.is_none());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(CallbackParams::from_url("not a url").is_err());
    }

    #[test]
    fn test_classify_valid_params() {
        let params = CallbackParams {
            code: Some("c".into()),
            state: Some("s".into()),
            error: None,
        };
        assert_eq!(
            classify(&params),
            CallbackDisposition::Exchange {
                code: "c".into(),
                state: "s".into()
            }
        );
    }

    #[test]
    fn test_classify_provider_error_is_terminal() {
        // Even with a code present, an error parameter wins
        let params = CallbackParams {
            code: Some("c".into()),
            state: Some("s".into()),
            error: Some("access_denied".into()),
        };
        match classify(&params) {
            CallbackDisposition::Reject { message } => {
                assert!(message.contains("access_denied"));
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_missing_code_or_state() {
        let missing_state = CallbackParams {
            code: Some("c".into()),
            state: None,
            error: None,
        };
        assert!(matches!(
            classify(&missing_state),
            CallbackDisposition::Reject { .. }
        ));

        let missing_code = CallbackParams {
            code: None,
            state: Some("s".into()),
            error: None,
        };
        assert!(matches!(
            classify(&missing_code),
            CallbackDisposition::Reject { .. }
        ));
    }

    #[test]
    fn test_error_delay_longer_than_success() {
        let exchange = CallbackDisposition::Exchange {
            code: "c".into(),
            state: "s".into(),
        };
        let reject = CallbackDisposition::Reject {
            message: "denied".into(),
        };
        assert!(reject.display_delay() > exchange.display_delay());
    }

    #[test]
    fn test_loopback_receiver_roundtrip() {
        use std::io::Read;
        use std::net::TcpStream;

        let (listener, port) = bind_receiver().unwrap();
        let handle = std::thread::spawn(move || wait_for_callback(listener));

        let mut stream = TcpStream::connect(("127.0.0.1", port)).unwrap();
        stream
            .write_all(b"GET /?code=abc&state=xyz HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).unwrap();
        assert!(response.starts_with("HTTP/1.1 200"));

        let params = handle.join().unwrap().unwrap();
        assert_eq!(params.code.as_deref(), Some("abc"));
        assert_eq!(params.state.as_deref(), Some("xyz"));
    }
}

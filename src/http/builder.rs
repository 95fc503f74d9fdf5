//! Translation of a [`Request`] into transfer handle configuration.

use crate::base::error::Error;
use crate::http::request::Request;
use crate::transfer::{OptionCode, OptionValue, TransferHandle};
use bytes::Bytes;

/// Stateless translator from [`Request`] to handle options and callbacks.
pub struct HttpRequestBuilder;

impl HttpRequestBuilder {
    /// Configures `handle` for `request`.
    ///
    /// Usage errors (empty URL, unsupported method, malformed values) are
    /// raised before anything is set, so a rejected request leaves the
    /// handle untouched. Callbacks left over from an earlier request are
    /// dropped, so without a body sink the response body is collected into
    /// the [`Response`](crate::http::Response). Options already on the handle
    /// are kept; call [`TransferHandle::reset`] for a pristine handle.
    pub fn configure(handle: &mut TransferHandle, request: &Request) -> Result<(), Error> {
        let mut options = Vec::new();
        let plan = Self::plan(request, &mut options)?;

        handle.clear_callbacks();
        for (code, value) in options {
            handle.set_option(code, value)?;
        }
        if let Some(body) = plan.upload {
            let mut cursor = body.cursor();
            handle.set_read_function(move |buf| cursor.read(buf));
        }
        Self::install_sinks(handle, request);

        tracing::debug!(
            transfer = %handle.id(),
            method = %plan.method,
            url = %request.url,
            "configured request"
        );
        Ok(())
    }

    fn plan(request: &Request, out: &mut Vec<(OptionCode, OptionValue)>) -> Result<Plan, Error> {
        if request.url.is_empty() {
            return Err(Error::EmptyUrl);
        }
        let mut push = |code: OptionCode, value: OptionValue| out.push((code, value));

        push(OptionCode::URL, request.url.as_str().into());

        let method = request.effective_method();
        let mut upload = None;
        match method.as_str() {
            "GET" => push(OptionCode::HTTPGET, true.into()),
            "PUT" => {
                push(OptionCode::UPLOAD, true.into());
                push(
                    OptionCode::INFILESIZE_LARGE,
                    OptionValue::OffT(request.body.len() as i64),
                );
                upload = Some(request.body.clone());
            }
            "POST" => {
                let body = request.body.to_bytes();
                push(OptionCode::POST, true.into());
                push(
                    OptionCode::POSTFIELDSIZE_LARGE,
                    OptionValue::OffT(body.len() as i64),
                );
                push(OptionCode::COPYPOSTFIELDS, body.into());
            }
            "DELETE" => push(OptionCode::CUSTOMREQUEST, "DELETE".into()),
            "HEAD" => {
                push(OptionCode::HTTPGET, true.into());
                push(OptionCode::NOBODY, true.into());
            }
            other if request.allow_nonstandard_methods && is_token(other) => {
                push(OptionCode::CUSTOMREQUEST, other.into());
            }
            _ => return Err(Error::UnsupportedMethod(request.method.clone())),
        }

        if !request.headers.is_empty() {
            push(OptionCode::HTTPHEADER, request.headers.to_lines().into());
        }

        if let Some(username) = &request.username {
            push(OptionCode::USERNAME, username.as_str().into());
        }
        if let Some(password) = &request.password {
            push(OptionCode::PASSWORD, password.as_str().into());
        }
        if let Some(mode) = request.auth_mode {
            push(OptionCode::HTTPAUTH, mode.bits().into());
        }

        if let Some(timeout) = request.connect_timeout {
            push(OptionCode::CONNECTTIMEOUT_MS, millis(timeout).into());
        }
        if let Some(timeout) = request.request_timeout {
            push(OptionCode::TIMEOUT_MS, millis(timeout).into());
        }
        push(OptionCode::FOLLOWLOCATION, request.follow_redirects.into());
        if let Some(max) = request.max_redirects {
            push(OptionCode::MAXREDIRS, max.into());
        }

        if let Some(agent) = &request.user_agent {
            push(OptionCode::USERAGENT, agent.as_str().into());
        }
        if request.use_gzip {
            push(OptionCode::ACCEPT_ENCODING, "gzip".into());
        }
        if let Some(interface) = &request.network_interface {
            push(OptionCode::INTERFACE, interface.as_str().into());
        }

        if let Some(proxy) = &request.proxy {
            let (host, port) = proxy.engine_proxy().ok_or_else(|| {
                Error::InvalidArgument(format!("proxy URL has no host: {}", proxy.url))
            })?;
            push(OptionCode::PROXY, host.into());
            push(OptionCode::PROXYPORT, port.into());
            if let Some(username) = &proxy.username {
                push(OptionCode::PROXYUSERNAME, username.as_str().into());
            }
            if let Some(password) = &proxy.password {
                push(OptionCode::PROXYPASSWORD, password.as_str().into());
            }
            if let Some(no_proxy) = &proxy.no_proxy {
                push(OptionCode::NOPROXY, no_proxy.as_str().into());
            }
        }

        let verify = i64::from(request.validate_cert);
        push(OptionCode::SSL_VERIFYPEER, verify.into());
        push(OptionCode::SSL_VERIFYHOST, (verify * 2).into());
        if let Some(path) = &request.ca_certs {
            push(OptionCode::CAINFO, path.as_path().into());
        }
        if let Some(path) = &request.client_cert {
            push(OptionCode::SSLCERT, path.as_path().into());
        }
        if let Some(path) = &request.client_key {
            push(OptionCode::SSLKEY, path.as_path().into());
        }
        if !request.allow_ipv6 {
            // IPv4 only
            push(OptionCode::IPRESOLVE, 1i64.into());
        }
        if request.progress_sink.is_some() {
            push(OptionCode::NOPROGRESS, false.into());
        }

        Ok(Plan { method, upload })
    }

    fn install_sinks(handle: &mut TransferHandle, request: &Request) {
        if let Some(sink) = request.body_sink.clone() {
            // A closed receiver aborts the transfer with a write error.
            handle.set_write_function(move |data| match sink.send(Bytes::copy_from_slice(data)) {
                Ok(()) => data.len(),
                Err(_) => 0,
            });
        }
        if let Some(sink) = request.header_sink.clone() {
            handle.set_header_function(move |line| sink.send(Bytes::copy_from_slice(line)).is_ok());
        }
        if let Some(sink) = request.progress_sink.clone() {
            handle.set_progress_function(move |progress| sink.send(progress).is_ok());
        }
    }
}

struct Plan {
    method: String,
    upload: Option<crate::http::requestbody::RequestBody>,
}

fn millis(d: std::time::Duration) -> i64 {
    i64::try_from(d.as_millis()).unwrap_or(i64::MAX)
}

fn is_token(method: &str) -> bool {
    http::Method::from_bytes(method.as_bytes()).is_ok()
}

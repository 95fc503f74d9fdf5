//! libcurl-backed [`TransferEngine`].
//!
//! Wraps a curl multi handle in socket-action mode. The multi handle's
//! socket and timer callbacks must be `Send`, so they record requests into
//! a shared buffer which is forwarded to the [`EngineNotifier`] after every
//! call into curl.

use crate::base::error::Error;
use crate::base::multierror::MultiError;
use crate::base::neterror::NetError;
use crate::engine::{
    ActionTarget, CompletionMessage, Detached, EasyRequest, EngineNotifier, EventFlags,
    TransferEngine, TransferIo,
};
use crate::transfer::{InfoCode, InfoValue, OptionCode, OptionValue, Progress, TransferId, TransferInfo};
use curl::easy::{Auth, Easy2, Handler, IpResolve, List, ReadError, WriteError};
use curl::multi::{Easy2Handle, Events, Multi, Socket, SocketEvents};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Passed as the socket for a step that only carries readiness flags.
const SOCKET_TIMEOUT: Socket = -1;

enum Raw {
    Socket(Socket, i32),
    Timer(Option<Duration>),
}

struct Collector {
    io: TransferIo,
}

impl Handler for Collector {
    fn write(&mut self, data: &[u8]) -> Result<usize, WriteError> {
        Ok(self.io.write(data))
    }

    fn read(&mut self, data: &mut [u8]) -> Result<usize, ReadError> {
        Ok(self.io.read(data))
    }

    fn header(&mut self, data: &[u8]) -> bool {
        self.io.header(data)
    }

    fn progress(&mut self, dltotal: f64, dlnow: f64, ultotal: f64, ulnow: f64) -> bool {
        self.io.progress(Progress {
            download_total: dltotal,
            downloaded: dlnow,
            upload_total: ultotal,
            uploaded: ulnow,
        })
    }
}

/// libcurl multi handle in socket-action mode.
///
/// Each transfer is an `Easy2` handle whose private token is the
/// [`TransferId`]. Socket and timer callbacks are forwarded to the
/// [`EngineNotifier`] installed by the coordinator.
pub struct CurlEngine {
    multi: Multi,
    handles: HashMap<TransferId, Easy2Handle<Collector>>,
    raw: Arc<Mutex<Vec<Raw>>>,
    notifier: Option<EngineNotifier>,
    messages: VecDeque<CompletionMessage>,
    descriptions: HashMap<TransferId, String>,
}

impl CurlEngine {
    /// Creates an engine with an empty multi handle.
    pub fn new() -> Self {
        Self {
            multi: Multi::new(),
            handles: HashMap::new(),
            raw: Arc::new(Mutex::new(Vec::new())),
            notifier: None,
            messages: VecDeque::new(),
            descriptions: HashMap::new(),
        }
    }

    /// Hands requests recorded by curl's callbacks to the coordinator.
    fn flush(&self) {
        let Some(notifier) = &self.notifier else {
            return;
        };
        let raw = match self.raw.lock() {
            Ok(mut raw) => std::mem::take(&mut *raw),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };
        for event in raw {
            match event {
                Raw::Socket(socket, action) => {
                    notifier.socket_changed(socket, action, None);
                }
                Raw::Timer(Some(timeout)) => {
                    notifier.set_timer(i64::try_from(timeout.as_millis()).unwrap_or(i64::MAX));
                }
                Raw::Timer(None) => notifier.clear_timer(),
            }
        }
    }

    fn collect_messages(&mut self) {
        let mut finished = Vec::new();
        self.multi.messages(|message| {
            let Ok(token) = message.token() else {
                return;
            };
            if let Some(result) = message.result() {
                finished.push((token, result));
            }
        });

        for (token, result) in finished {
            let id = TransferId::from_token(token as u64);
            let result = match result {
                Ok(()) => Ok(()),
                Err(err) => {
                    let description = err
                        .extra_description()
                        .unwrap_or_else(|| err.description())
                        .to_string();
                    self.descriptions.insert(id, description);
                    Err(NetError::from(err.code() as i32))
                }
            };
            self.messages.push_back(CompletionMessage { id, result });
        }
    }
}

impl Default for CurlEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn multi_error(err: curl::MultiError) -> Error {
    Error::Multi(MultiError::from(err.code() as i32))
}

fn easy_error(err: curl::Error) -> Error {
    Error::transfer(
        NetError::from(err.code() as i32),
        err.extra_description().unwrap_or_else(|| err.description()),
    )
}

fn socket_action_code(events: &SocketEvents) -> i32 {
    if events.remove() {
        4
    } else if events.input_and_output() {
        3
    } else if events.output() {
        2
    } else if events.input() {
        1
    } else {
        0
    }
}

fn apply_option(easy: &mut Easy2<Collector>, code: OptionCode, value: &OptionValue) -> Result<(), curl::Error> {
    use OptionValue::{Bytes, List as Lines, Long, OffT, Str};

    let flag = |v: &i64| *v != 0;
    let millis = |v: &i64| Duration::from_millis(u64::try_from(*v).unwrap_or(0));
    let size = |v: &i64| u64::try_from(*v).unwrap_or(0);

    match (code, value) {
        (OptionCode::URL, Str(s)) => easy.url(s),
        (OptionCode::PORT, Long(v)) => easy.port(u16::try_from(*v).unwrap_or(0)),
        (OptionCode::HTTPGET, Long(v)) => easy.get(flag(v)),
        (OptionCode::POST, Long(v)) => easy.post(flag(v)),
        (OptionCode::POSTFIELDS | OptionCode::COPYPOSTFIELDS, Bytes(b)) => easy.post_fields_copy(b),
        (OptionCode::POSTFIELDS | OptionCode::COPYPOSTFIELDS, Str(s)) => easy.post_fields_copy(s.as_bytes()),
        (OptionCode::POSTFIELDSIZE | OptionCode::POSTFIELDSIZE_LARGE, Long(v) | OffT(v)) => {
            easy.post_field_size(size(v))
        }
        (OptionCode::UPLOAD, Long(v)) => easy.upload(flag(v)),
        (OptionCode::INFILESIZE | OptionCode::INFILESIZE_LARGE, Long(v) | OffT(v)) => easy.in_filesize(size(v)),
        (OptionCode::CUSTOMREQUEST, Str(s)) => easy.custom_request(s),
        (OptionCode::NOBODY, Long(v)) => easy.nobody(flag(v)),
        (OptionCode::RANGE, Str(s)) => easy.range(s),
        (OptionCode::REFERER, Str(s)) => easy.referer(s),
        (OptionCode::AUTOREFERER, Long(v)) => easy.autoreferer(flag(v)),
        (OptionCode::HTTPHEADER, Lines(lines)) => {
            let mut list = List::new();
            for line in lines {
                list.append(line)?;
            }
            easy.http_headers(list)
        }
        (OptionCode::USERAGENT, Str(s)) => easy.useragent(s),
        (OptionCode::ACCEPT_ENCODING, Str(s)) => easy.accept_encoding(s),
        (OptionCode::FOLLOWLOCATION, Long(v)) => easy.follow_location(flag(v)),
        (OptionCode::MAXREDIRS, Long(v)) => easy.max_redirections(u32::try_from(*v).unwrap_or(0)),
        (OptionCode::TIMEOUT, Long(v)) => easy.timeout(Duration::from_secs(size(v))),
        (OptionCode::TIMEOUT_MS, Long(v)) => easy.timeout(millis(v)),
        (OptionCode::CONNECTTIMEOUT, Long(v)) => easy.connect_timeout(Duration::from_secs(size(v))),
        (OptionCode::CONNECTTIMEOUT_MS, Long(v)) => easy.connect_timeout(millis(v)),
        (OptionCode::INTERFACE, Str(s)) => easy.interface(s),
        (OptionCode::PROXY, Str(s)) => easy.proxy(s),
        (OptionCode::PROXYPORT, Long(v)) => easy.proxy_port(u16::try_from(*v).unwrap_or(0)),
        (OptionCode::PROXYUSERNAME, Str(s)) => easy.proxy_username(s),
        (OptionCode::PROXYPASSWORD, Str(s)) => easy.proxy_password(s),
        (OptionCode::NOPROXY, Str(s)) => easy.noproxy(s),
        (OptionCode::USERNAME, Str(s)) => easy.username(s),
        (OptionCode::PASSWORD, Str(s)) => easy.password(s),
        (OptionCode::HTTPAUTH, Long(bits)) => {
            let mut auth = Auth::new();
            auth.basic(bits & 1 != 0)
                .digest(bits & 2 != 0)
                .gssnegotiate(bits & 4 != 0)
                .ntlm(bits & 8 != 0);
            easy.http_auth(&auth)
        }
        (OptionCode::SSL_VERIFYPEER, Long(v)) => easy.ssl_verify_peer(flag(v)),
        (OptionCode::SSL_VERIFYHOST, Long(v)) => easy.ssl_verify_host(flag(v)),
        (OptionCode::CAINFO, Str(s)) => easy.cainfo(s),
        (OptionCode::CAPATH, Str(s)) => easy.capath(s),
        (OptionCode::SSLCERT, Str(s)) => easy.ssl_cert(s),
        (OptionCode::SSLKEY, Str(s)) => easy.ssl_key(s),
        (OptionCode::IPRESOLVE, Long(v)) => easy.ip_resolve(match v {
            1 => IpResolve::V4,
            2 => IpResolve::V6,
            _ => IpResolve::Any,
        }),
        (OptionCode::MAXFILESIZE, Long(v)) => easy.max_filesize(size(v)),
        (OptionCode::NOPROGRESS, Long(v)) => easy.progress(!flag(v)),
        (OptionCode::VERBOSE, Long(v)) => easy.verbose(flag(v)),
        (OptionCode::FAILONERROR, Long(v)) => easy.fail_on_error(flag(v)),
        // CURLE_UNKNOWN_OPTION
        _ => Err(curl::Error::new(48)),
    }
}

fn snapshot(easy: &mut Easy2<Collector>) -> TransferInfo {
    let mut info = TransferInfo::new();
    let string = |v: Option<&str>| InfoValue::Str(v.map(str::to_owned));
    let seconds = |d: Duration| InfoValue::Double(d.as_secs_f64());

    if let Ok(url) = easy.effective_url() {
        info.insert(InfoCode::EFFECTIVE_URL, string(url));
    }
    if let Ok(code) = easy.response_code() {
        info.insert(InfoCode::RESPONSE_CODE, InfoValue::Long(i64::from(code)));
    }
    if let Ok(t) = easy.total_time() {
        info.insert(InfoCode::TOTAL_TIME, seconds(t));
    }
    if let Ok(t) = easy.namelookup_time() {
        info.insert(InfoCode::NAMELOOKUP_TIME, seconds(t));
    }
    if let Ok(t) = easy.connect_time() {
        info.insert(InfoCode::CONNECT_TIME, seconds(t));
    }
    if let Ok(t) = easy.starttransfer_time() {
        info.insert(InfoCode::STARTTRANSFER_TIME, seconds(t));
    }
    if let Ok(n) = easy.download_size() {
        info.insert(InfoCode::SIZE_DOWNLOAD, InfoValue::Double(n));
    }
    if let Ok(n) = easy.upload_size() {
        info.insert(InfoCode::SIZE_UPLOAD, InfoValue::Double(n));
    }
    if let Ok(n) = easy.redirect_count() {
        info.insert(InfoCode::REDIRECT_COUNT, InfoValue::Long(i64::from(n)));
    }
    if let Ok(url) = easy.redirect_url() {
        info.insert(InfoCode::REDIRECT_URL, string(url));
    }
    if let Ok(ct) = easy.content_type() {
        info.insert(InfoCode::CONTENT_TYPE, string(ct));
    }
    if let Ok(ip) = easy.primary_ip() {
        info.insert(InfoCode::PRIMARY_IP, string(ip));
    }
    if let Ok(port) = easy.primary_port() {
        info.insert(InfoCode::PRIMARY_PORT, InfoValue::Long(i64::from(port)));
    }
    if let Ok(cookies) = easy.cookies() {
        let lines = cookies
            .iter()
            .map(|c| String::from_utf8_lossy(c).into_owned())
            .collect();
        info.insert(InfoCode::COOKIELIST, InfoValue::List(lines));
    }
    info
}

impl TransferEngine for CurlEngine {
    fn install_callbacks(&mut self, notifier: EngineNotifier) -> Result<(), Error> {
        let raw = self.raw.clone();
        self.multi
            .socket_function(move |socket, events, _token| {
                if let Ok(mut raw) = raw.lock() {
                    raw.push(Raw::Socket(socket, socket_action_code(&events)));
                }
            })
            .map_err(multi_error)?;

        let raw = self.raw.clone();
        self.multi
            .timer_function(move |timeout| match raw.lock() {
                Ok(mut raw) => {
                    raw.push(Raw::Timer(timeout));
                    true
                }
                Err(_) => false,
            })
            .map_err(multi_error)?;

        self.notifier = Some(notifier);
        Ok(())
    }

    fn add(&mut self, id: TransferId, request: EasyRequest) -> Result<(), Error> {
        let mut easy = Easy2::new(Collector { io: request.io });
        for (code, value) in &request.options {
            apply_option(&mut easy, *code, value).map_err(easy_error)?;
        }

        let mut handle = self.multi.add2(easy).map_err(multi_error)?;
        if let Err(err) = handle.set_token(id.as_u64() as usize) {
            let _ = self.multi.remove2(handle);
            return Err(easy_error(err));
        }
        self.handles.insert(id, handle);
        self.flush();
        Ok(())
    }

    fn remove(&mut self, id: TransferId) -> Result<Detached, Error> {
        let handle = self.handles.remove(&id).ok_or(Error::UnknownTransfer(id))?;
        let mut easy = self.multi.remove2(handle).map_err(multi_error)?;
        self.flush();
        Ok(Detached {
            info: snapshot(&mut easy),
            error_description: self.descriptions.remove(&id).unwrap_or_default(),
        })
    }

    fn socket_action(&mut self, target: ActionTarget, flags: EventFlags) -> Result<usize, Error> {
        let mut events = Events::new();
        events
            .input(flags.contains(EventFlags::IN))
            .output(flags.contains(EventFlags::OUT))
            .error(flags.contains(EventFlags::ERR));

        let running = match target {
            ActionTarget::Socket(socket) => self.multi.action(socket, &events),
            ActionTarget::Timeout if flags.is_empty() => self.multi.timeout(),
            ActionTarget::Timeout => self.multi.action(SOCKET_TIMEOUT, &events),
        };
        self.collect_messages();
        self.flush();
        running.map(|n| n as usize).map_err(multi_error)
    }

    fn next_message(&mut self) -> Option<CompletionMessage> {
        self.messages.pop_front()
    }

    fn version(&self) -> String {
        format!("libcurl/{}", curl::Version::get().version())
    }
}

/// Python driver handed to the hosted interpreter.
///
/// The network patches and the ssl stub are installed before yt-dlp is
/// imported, so every request the tool makes flows through the relay
/// chain and nothing can open a direct secure socket around it.
pub(crate) const DRIVER_SOURCE: &str = r##"
"""yt-dlp driver.

Runs one metadata-only extraction with the tool's network stack rerouted
through the relay chain supplied by the host process. Prints a single
JSON line on stdout; failures become {"error": ...} lines, never a
traceback exit.
"""
import base64
import gzip
import io
import json
import os
import sys
import types
import zlib

import http.client as _http_client
import urllib.error as _urlerror
import urllib.parse as _urlparse
import urllib.request as _urlrequest

TARGET_URL = os.environ["STREAMVAULT_URL"]
QUALITY = os.environ.get("STREAMVAULT_QUALITY", "720")
RELAYS = json.loads(os.environ.get("STREAMVAULT_RELAYS", "[]"))
TIMEOUT = int(os.environ.get("STREAMVAULT_TIMEOUT", "30"))

_ORIG_URLOPEN = _urlrequest.urlopen
_ORIG_HTTP_CONNECTION = _http_client.HTTPConnection
_ORIG_HTTPS_CONNECTION = _http_client.HTTPSConnection

_RELAY_HOSTS = {_urlparse.urlsplit(r["base"]).netloc for r in RELAYS}


def _wrap(relay, target):
    if relay.get("style") == "path":
        return relay["base"] + target
    return relay["base"] + _urlparse.quote(target, safe="")


def _is_relayed(target):
    # already-wrapped URLs pass through once, not twice
    return _urlparse.urlsplit(target).netloc in _RELAY_HOSTS


# ---------------------------------------------------------------------------
# Direct opener bound to the saved connection classes. Both patch layers
# go through this; the globally visible classes are replaced below.
# ---------------------------------------------------------------------------
class _DirectHTTPHandler(_urlrequest.HTTPHandler):
    def http_open(self, req):
        return self.do_open(_ORIG_HTTP_CONNECTION, req)


class _DirectHTTPSHandler(_urlrequest.HTTPSHandler):
    def https_open(self, req):
        return self.do_open(_ORIG_HTTPS_CONNECTION, req, context=self._context)


_DIRECT_OPENER = _urlrequest.build_opener(_DirectHTTPHandler(), _DirectHTTPSHandler())


# ---------------------------------------------------------------------------
# High-level patch: urlopen rewrites the target through the relay chain
# with per-relay retry.
# ---------------------------------------------------------------------------
def _relayed(url_or_req, relay):
    if isinstance(url_or_req, str):
        return _wrap(relay, url_or_req)
    req = url_or_req
    return _urlrequest.Request(
        _wrap(relay, req.full_url),
        data=req.data,
        headers=dict(req.headers),
        method=req.get_method(),
    )


def _relayed_urlopen(url_or_req, data=None, timeout=None, **kwargs):
    timeout = timeout or TIMEOUT
    target = url_or_req if isinstance(url_or_req, str) else url_or_req.full_url
    if _is_relayed(target) or not RELAYS:
        return _DIRECT_OPENER.open(url_or_req, data=data, timeout=timeout)
    last_err = None
    for relay in RELAYS:
        try:
            return _DIRECT_OPENER.open(_relayed(url_or_req, relay), data=data, timeout=timeout)
        except Exception as err:
            last_err = err
    raise last_err or _urlerror.URLError("all relays failed")


_urlrequest.urlopen = _relayed_urlopen


# ---------------------------------------------------------------------------
# Low-level patch: the tool sometimes talks to connection objects
# directly, bypassing urlopen. The replacement classes issue the request
# against a relay endpoint via the direct opener and hand back the
# byte-stream/header interface the caller expects. Bodies stay bytes the
# whole way through; gzip/deflate is undone here because the relayed
# response has been reframed.
# ---------------------------------------------------------------------------
class _RelayResponse(io.BytesIO):
    def __init__(self, status, headers, body):
        super().__init__(body)
        self.status = status
        self.code = status
        self.reason = "OK" if status == 200 else ""
        self.headers = headers
        self.msg = headers
        self.length = len(body)

    def getheader(self, name, default=None):
        for key, value in self.headers.items():
            if key.lower() == name.lower():
                return value
        return default

    def getheaders(self):
        return list(self.headers.items())

    def isclosed(self):
        return False


def _decompress(body, encoding):
    if encoding == "gzip":
        return gzip.decompress(body)
    if encoding == "deflate":
        try:
            return zlib.decompress(body)
        except zlib.error:
            return zlib.decompress(body, -zlib.MAX_WBITS)
    return body


def _unwrap_envelope(body):
    # {"contents": ...} envelopes carry binary payloads as base64 data URIs
    try:
        value = json.loads(body)
    except Exception:
        return body
    if not isinstance(value, dict) or "contents" not in value:
        return body
    contents = value["contents"]
    if contents.startswith("data:") and ";base64," in contents:
        return base64.b64decode(contents.split(";base64,", 1)[1])
    try:
        return contents.encode("latin-1")
    except UnicodeEncodeError:
        return contents.encode("utf-8")


class _RelayHTTPConnection:
    default_port = 80
    _scheme = "http"

    def __init__(self, host, port=None, timeout=None, **kwargs):
        self.host = host
        self.port = port or self.default_port
        self.timeout = timeout or TIMEOUT
        self.sock = None
        self._method = "GET"
        self._path = "/"
        self._headers = {}
        self._body = None

    def connect(self):
        pass

    def request(self, method, path, body=None, headers=None, **kwargs):
        self._method = method
        self._path = path
        self._headers = dict(headers or {})
        self._body = body

    def putrequest(self, method, path, **kwargs):
        self._method = method
        self._path = path

    def putheader(self, name, value):
        self._headers[name] = value

    def endheaders(self, message_body=None, **kwargs):
        if message_body is not None:
            self._body = message_body

    def send(self, data):
        self._body = (self._body or b"") + data

    def _target(self):
        netloc = self.host
        if self.port and self.port != self.default_port:
            netloc = "%s:%s" % (self.host, self.port)
        return "%s://%s%s" % (self._scheme, netloc, self._path)

    def getresponse(self):
        target = self._target()
        if _is_relayed(target) or not RELAYS:
            candidates = [target]
        else:
            candidates = [_wrap(relay, target) for relay in RELAYS]
        last_err = None
        for candidate in candidates:
            try:
                req = _urlrequest.Request(
                    candidate,
                    data=self._body,
                    headers=self._headers,
                    method=self._method,
                )
                with _DIRECT_OPENER.open(req, timeout=self.timeout) as res:
                    body = res.read()
                    body = _decompress(body, res.headers.get("Content-Encoding", ""))
                    body = _unwrap_envelope(body)
                    headers = dict(res.headers)
                    headers.pop("Content-Encoding", None)
                    headers["Content-Length"] = str(len(body))
                    return _RelayResponse(getattr(res, "status", 200), headers, body)
            except Exception as err:
                last_err = err
        raise last_err or OSError("all relays failed")

    def close(self):
        self.sock = None

    def set_debuglevel(self, level):
        pass

    def set_tunnel(self, *args, **kwargs):
        pass


class _RelayHTTPSConnection(_RelayHTTPConnection):
    default_port = 443
    _scheme = "https"

    def __init__(self, host, port=None, timeout=None, context=None, **kwargs):
        super().__init__(host, port=port, timeout=timeout, **kwargs)


_http_client.HTTPConnection = _RelayHTTPConnection
_http_client.HTTPSConnection = _RelayHTTPSConnection


# ---------------------------------------------------------------------------
# ssl stub: satisfies the tool's import-time attribute accesses without
# doing any cryptographic work. All real transport happens through the
# relay shims above; a direct TLS socket must never open.
# ---------------------------------------------------------------------------
def _install_ssl_stub():
    stub = types.ModuleType("ssl")

    class _StubSSLError(OSError):
        pass

    class _StubSSLContext:
        def __init__(self, *args, **kwargs):
            self.check_hostname = False
            self.verify_mode = 0
            self.options = 0
            self.minimum_version = 0
            self.maximum_version = 0

        def load_default_certs(self, *args, **kwargs):
            pass

        def load_verify_locations(self, *args, **kwargs):
            pass

        def set_ciphers(self, *args, **kwargs):
            pass

        def set_alpn_protocols(self, *args, **kwargs):
            pass

        def wrap_socket(self, sock, *args, **kwargs):
            raise _StubSSLError(
                "direct TLS sockets are unavailable; traffic goes through the relay shims"
            )

    def _context(*args, **kwargs):
        return _StubSSLContext()

    stub.SSLContext = _StubSSLContext
    stub.SSLError = _StubSSLError
    stub.SSLCertVerificationError = _StubSSLError
    stub.CertificateError = _StubSSLError
    stub.SSLZeroReturnError = _StubSSLError
    stub.SSLWantReadError = _StubSSLError
    stub.SSLWantWriteError = _StubSSLError
    stub.SSLEOFError = _StubSSLError
    stub.PROTOCOL_TLS = 2
    stub.PROTOCOL_TLS_CLIENT = 16
    stub.OP_NO_SSLv2 = 0
    stub.OP_NO_SSLv3 = 0
    stub.OP_NO_TICKET = 0
    stub.CERT_NONE = 0
    stub.CERT_REQUIRED = 2
    stub.HAS_SNI = True
    stub.HAS_ALPN = True
    stub.OPENSSL_VERSION = "relay-shim"
    stub.OPENSSL_VERSION_NUMBER = 0
    stub.create_default_context = _context
    stub._create_unverified_context = _context
    sys.modules["ssl"] = stub


def _extract():
    _install_ssl_stub()
    import yt_dlp

    opts = {
        "quiet": True,
        "no_warnings": True,
        "noplaylist": True,
        "socket_timeout": TIMEOUT,
        "format": "bestvideo[height<=%s]+bestaudio/best[height<=%s]/best" % (QUALITY, QUALITY),
    }
    with yt_dlp.YoutubeDL(opts) as ydl:
        info = ydl.extract_info(TARGET_URL, download=False)

    formats = info.get("formats") or [info]
    best = None
    # prefer a format carrying both audio and video
    for fmt in reversed(formats):
        if (
            fmt.get("url")
            and fmt.get("vcodec", "none") != "none"
            and fmt.get("acodec", "none") != "none"
        ):
            best = fmt
            break
    if best is None and formats:
        best = formats[-1]

    return {
        "url": (best or {}).get("url") or info.get("url"),
        "ext": (best or {}).get("ext", "mp4"),
        "title": info.get("title", ""),
        "thumbnail": info.get("thumbnail", ""),
        "quality": "%sp" % best["height"] if best and best.get("height") else "?",
    }


def main():
    try:
        result = _extract()
    except Exception as err:
        result = {"error": str(err)}
    sys.stdout.write(json.dumps(result) + "\n")


if __name__ == "__main__":
    main()
"##;

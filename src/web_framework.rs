use std::{
    collections::HashMap,
    io::{prelude::*, BufReader},
    net::TcpStream,
    str::FromStr,
};

use log::{debug, info};
use serde::Serialize;

pub enum HttpMethod {
    Get,
    Post,
    Patch,
    Put,
    Delete,
}

pub struct HttpRequest {
    pub method: HttpMethod,
    pub path: String,
    pub query: HashMap<String, String>,
    pub version: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

pub enum HttpResponseCode {
    Ok,
    BadRequest,
    NotFound,
    UnprocessableEntity,
    InternalServerError,
}

pub struct HttpResponse {
    stream: TcpStream,
    pub headers: HashMap<String, String>,
    pub response_code: HttpResponseCode,
    json_body: Option<String>,
    sent_response: bool,
}

impl FromStr for HttpMethod {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PATCH" => Ok(HttpMethod::Patch),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            _ => Err(()),
        }
    }
}

fn percent_decode(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' if i + 2 < bytes.len() => {
                let hex = [bytes[i + 1], bytes[i + 2]];
                match std::str::from_utf8(&hex)
                    .ok()
                    .and_then(|h| u8::from_str_radix(h, 16).ok())
                {
                    Some(byte) => {
                        out.push(byte);
                        i += 3;
                    }
                    None => {
                        out.push(b'%');
                        i += 1;
                    }
                }
            }
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            byte => {
                out.push(byte);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn parse_query(raw: &str) -> HashMap<String, String> {
    let mut query = HashMap::new();
    for pair in raw.split('&') {
        if pair.is_empty() {
            continue;
        }
        let mut parts = pair.splitn(2, '=');
        let key = parts.next().unwrap_or("");
        let value = parts.next().unwrap_or("");
        query.insert(percent_decode(key), percent_decode(value));
    }
    query
}

impl TryFrom<&mut TcpStream> for HttpRequest {
    type Error = ();

    fn try_from(stream: &mut TcpStream) -> Result<Self, Self::Error> {
        let mut buf_reader = BufReader::new(std::io::Read::by_ref(stream));

        let mut http_request_lines = Vec::new();
        loop {
            let mut line = String::new();
            let bytes_read = buf_reader.read_line(&mut line).map_err(|_| ())?;
            line = line.trim().to_string();
            if line.is_empty() || bytes_read == 0 {
                break;
            }
            http_request_lines.push(line);
        }

        if http_request_lines.is_empty() {
            return Err(());
        }

        let mut req = HttpRequest {
            method: HttpMethod::Get,
            path: String::from(""),
            query: HashMap::new(),
            version: String::from(""),
            headers: HashMap::new(),
            body: Vec::new(),
        };

        info!("http request: {:?}", http_request_lines[0]);

        for (i, line) in http_request_lines.iter().enumerate() {
            if i == 0 {
                let parts: Vec<&str> = line.split(' ').collect();
                if parts.len() != 3 {
                    return Err(());
                }
                req.method = HttpMethod::from_str(parts[0])?;
                let mut target = parts[1].splitn(2, '?');
                req.path = String::from(target.next().unwrap_or(""));
                if let Some(raw_query) = target.next() {
                    req.query = parse_query(raw_query);
                }
                req.version = String::from(parts[2]);
            } else if let Some((key, value)) = line.split_once(": ") {
                req.headers
                    .insert(String::from(key).to_lowercase(), String::from(value));
            }
        }

        // read the body
        if let Some(header) = req.headers.get("content-length") {
            if let Ok(content_length) = header.parse::<usize>() {
                let mut buf = vec![0; content_length];
                buf_reader.read_exact(&mut buf).map_err(|_| ())?;
                req.body = buf;
            }
        }

        debug!("http request body: {} bytes", req.body.len());

        Ok(req)
    }
}

impl HttpResponse {
    pub fn new(stream: TcpStream) -> HttpResponse {
        HttpResponse {
            stream,
            headers: HashMap::new(),
            response_code: HttpResponseCode::Ok,
            json_body: None,
            sent_response: false,
        }
    }

    pub fn set_json<T>(&mut self, value: &T)
    where
        T: ?Sized + Serialize,
    {
        self.json_body = serde_json::to_string(value).ok();
    }

    fn send_response(&mut self) {
        if self.sent_response {
            return;
        }

        let mut response = String::from("HTTP/1.1 ");

        response.push_str(match self.response_code {
            HttpResponseCode::Ok => "200 OK",
            HttpResponseCode::BadRequest => "400 Bad Request",
            HttpResponseCode::NotFound => "404 Not Found",
            HttpResponseCode::UnprocessableEntity => "422 Unprocessable Entity",
            HttpResponseCode::InternalServerError => "500 Internal Server Error",
        });

        response.push_str("\r\n");

        // encode json body if we have one
        if let Some(json_body) = &self.json_body {
            self.headers.insert(
                String::from("Content-Type"),
                String::from("application/json"),
            );
            self.headers
                .insert(String::from("Content-Length"), json_body.len().to_string());
        }

        for (key, value) in &self.headers {
            response.push_str(key);
            response.push_str(": ");
            response.push_str(value);
            response.push_str("\r\n");
        }

        response.push_str("\r\n");

        if let Some(json_body) = &self.json_body {
            response.push_str(json_body);
        }

        if let Err(err) = self.stream.write_all(response.as_bytes()) {
            debug!("could not write response: {}", err);
        }

        self.sent_response = true;
    }
}

impl Drop for HttpResponse {
    fn drop(&mut self) {
        self.send_response();
    }
}

pub fn handle_connection(mut stream: TcpStream) -> (Result<HttpRequest, ()>, HttpResponse) {
    let req = HttpRequest::try_from(&mut stream);
    let res: HttpResponse = HttpResponse::new(stream);
    (req, res)
}

#[cfg(test)]
mod tests {
    use super::{parse_query, percent_decode};

    #[test]
    fn decodes_percent_escapes() {
        assert_eq!(
            percent_decode("http%3A%2F%2Fexample.com%2Fa.mp3"),
            "http://example.com/a.mp3"
        );
        assert_eq!(percent_decode("plain"), "plain");
        assert_eq!(percent_decode("a+b"), "a b");
    }

    #[test]
    fn malformed_escape_passes_through() {
        assert_eq!(percent_decode("100%"), "100%");
        assert_eq!(percent_decode("%zz"), "%zz");
    }

    #[test]
    fn parses_query_pairs() {
        let query = parse_query("url=http%3A%2F%2Fx%2Fy.wav&length=2048&sample_rate=44100");
        assert_eq!(query["url"], "http://x/y.wav");
        assert_eq!(query["length"], "2048");
        assert_eq!(query["sample_rate"], "44100");
    }

    #[test]
    fn empty_query_is_empty() {
        assert!(parse_query("").is_empty());
    }
}

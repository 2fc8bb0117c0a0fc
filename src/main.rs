use std::net::TcpListener;

use log::{error, info};
use serde::Serialize;

use wavepeek::web_framework::{self, HttpMethod, HttpRequest, HttpResponse, HttpResponseCode};
use wavepeek::{config, AudioSource, SampleError, Sampler};

#[derive(Serialize)]
struct ErrorResponse {
    error_kind: &'static str,
    message: String,
}

fn error_response(res: &mut HttpResponse, err: &SampleError) {
    res.response_code = match err {
        SampleError::InvalidParameter(_)
        | SampleError::UnsupportedFormat
        | SampleError::EmptySource => HttpResponseCode::BadRequest,
        SampleError::CorruptStream | SampleError::EmptyStream => {
            HttpResponseCode::UnprocessableEntity
        }
        SampleError::IoFailure(_) => HttpResponseCode::InternalServerError,
    };
    res.set_json(&ErrorResponse {
        error_kind: err.kind(),
        message: err.to_string(),
    });
}

fn parse_params(req: &HttpRequest, sampler: &Sampler) -> Result<(usize, u32), SampleError> {
    let options = sampler.options();

    let length = match req.query.get("length") {
        Some(raw) => raw.parse::<usize>().map_err(|_| {
            SampleError::InvalidParameter("length must be a positive integer".into())
        })?,
        None => options.default_length,
    };

    let sample_rate = match req.query.get("sample_rate") {
        Some(raw) => raw.parse::<u32>().map_err(|_| {
            SampleError::InvalidParameter("sample_rate must be a positive integer".into())
        })?,
        None => options.default_sample_rate,
    };

    Ok((length, sample_rate))
}

fn fetch_url(url: &str) -> Result<Vec<u8>, SampleError> {
    let response = reqwest::blocking::get(url).map_err(|err| {
        error!("fetching {} failed: {}", url, err);
        SampleError::IoFailure(std::io::Error::new(
            std::io::ErrorKind::Other,
            "could not fetch audio url",
        ))
    })?;

    let bytes = response.bytes().map_err(|err| {
        error!("reading body of {} failed: {}", url, err);
        SampleError::IoFailure(std::io::Error::new(
            std::io::ErrorKind::Other,
            "could not read audio url response",
        ))
    })?;

    Ok(bytes.to_vec())
}

fn handle_sample(req: &HttpRequest, res: &mut HttpResponse, sampler: &Sampler) {
    let result = parse_params(req, sampler).and_then(|(length, sample_rate)| {
        let source = match req.method {
            // GET samples a remote file; POST samples the request body
            HttpMethod::Get => match req.query.get("url") {
                Some(url) => AudioSource::Memory(fetch_url(url)?),
                None => {
                    return Err(SampleError::InvalidParameter(
                        "url query parameter is required".into(),
                    ))
                }
            },
            _ => AudioSource::Memory(req.body.clone()),
        };
        sampler.sample(source, length, sample_rate)
    });

    match result {
        Ok(reply) => {
            res.set_json(&reply);
            res.response_code = HttpResponseCode::Ok;
        }
        Err(err) => {
            error!("sampling failed: {}", err);
            error_response(res, &err);
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = config::load_config();
    let sampler = Sampler::new(config.sampler_options());

    let listener = TcpListener::bind(format!("0.0.0.0:{}", config.port))?;
    info!("listening on port {}", config.port);

    for stream in listener.incoming() {
        let stream = stream?;
        let (req, mut res) = web_framework::handle_connection(stream);

        match req {
            Ok(req) => match (&req.method, req.path.as_str()) {
                (HttpMethod::Get, "/waveform/sample") | (HttpMethod::Post, "/waveform/sample") => {
                    handle_sample(&req, &mut res, &sampler);
                }
                _ => {
                    res.response_code = HttpResponseCode::NotFound;
                }
            },
            Err(_) => {
                error!("error parsing request");
                res.response_code = HttpResponseCode::BadRequest;
            }
        }
    }

    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        error!("server failed: {}", err);
        std::process::exit(1);
    }
}

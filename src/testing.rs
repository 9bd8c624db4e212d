// Shared test fixtures.

use polars::prelude::*;
use std::{
    io::{Read, Write},
    net::TcpListener,
    thread::{self, JoinHandle},
};

use crate::domain::schema::RAW_COLUMNS;

/// Build a raw 17-column bike-share table. `season` and `holiday`
/// are supplied by the caller; the other categorical columns cycle
/// through a few levels, and `cnt` grows with the hour so there is
/// a signal to learn.
pub fn raw_frame(seasons: &[f64], holidays: &[f64]) -> DataFrame {
    assert_eq!(seasons.len(), holidays.len(), "fixture columns must have equal length");
    let n = seasons.len();
    let ints = |name: &str, f: &dyn Fn(usize) -> i64| {
        Series::new(name.into(), (0..n).map(f).collect::<Vec<i64>>())
    };
    let floats = |name: &str| {
        Series::new(name.into(), (0..n).map(|i| 0.1 + (i % 10) as f64 / 100.0).collect::<Vec<f64>>())
    };

    let columns = RAW_COLUMNS
        .iter()
        .map(|&name| match name {
            "dteday"     => Series::new(
                name.into(),
                (0..n).map(|i| format!("2011-01-{:02}", i % 28 + 1)).collect::<Vec<String>>(),
            ),
            "season"     => ints(name, &|i| seasons[i] as i64),
            "holiday"    => ints(name, &|i| holidays[i] as i64),
            "instant"    => ints(name, &|i| i as i64 + 1),
            "yr"         => ints(name, &|i| (i % 2) as i64),
            "mnth"       => ints(name, &|i| (i % 3 + 1) as i64),
            "hr"         => ints(name, &|i| (i % 4) as i64),
            "weekday"    => ints(name, &|i| (i % 7) as i64),
            "workingday" => ints(name, &|i| (i % 2) as i64),
            "weathersit" => ints(name, &|i| (i % 3 + 1) as i64),
            "casual"     => ints(name, &|i| (i % 5) as i64),
            "registered" => ints(name, &|i| (i % 6) as i64),
            "cnt"        => ints(name, &|i| (10 * (i % 4) + 5 + i % 3) as i64),
            _            => floats(name),
        })
        .map(Column::from)
        .collect();

    DataFrame::new(columns).expect("fixture table is well formed")
}

/// The fixture rendered as CSV text
pub fn raw_csv(seasons: &[f64], holidays: &[f64]) -> String {
    let mut df  = raw_frame(seasons, holidays);
    let mut buf = Vec::new();
    CsvWriter::new(&mut buf)
        .include_header(true)
        .finish(&mut df)
        .expect("fixture table serializes");
    String::from_utf8(buf).expect("CSV output is UTF-8")
}

/// Accept a single HTTP request on 127.0.0.1, answer it with
/// `status` and `body`, and hand back the raw request text.
pub fn serve_once(status: &'static str, body: Vec<u8>) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind test listener");
    let base = format!("http://{}", listener.local_addr().expect("listener address"));

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept test connection");
        let mut request = Vec::new();
        let mut chunk = [0u8; 4096];

        let header_end = loop {
            let n = stream.read(&mut chunk).expect("read request");
            if n == 0 {
                break request.len();
            }
            request.extend_from_slice(&chunk[..n]);
            if let Some(pos) = request.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&request[..header_end]).to_string();
        let content_length = head
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(k, _)| k.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, v)| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        while request.len() < header_end + content_length {
            let n = stream.read(&mut chunk).expect("read request body");
            if n == 0 {
                break;
            }
            request.extend_from_slice(&chunk[..n]);
        }

        let mut response = format!(
            "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        )
        .into_bytes();
        response.extend_from_slice(&body);
        // the client may hang up once it has seen the status line
        let _ = stream.write_all(&response);

        String::from_utf8_lossy(&request).to_string()
    });

    (base, handle)
}

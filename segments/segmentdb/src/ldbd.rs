//! Client for the ldbd segment database protocol.
//!
//! A request is the method name and its argument, each terminated by a NUL
//! byte. The server replies with an integer return code and a payload, also
//! NUL separated, and closes the connection.

use std::{
    io::{Read, Write},
    net::{Shutdown, TcpStream},
};

use url::Url;

use crate::{Error, QueryEngine, Result, Row};

pub const DEFAULT_PORT: u16 = 30015;

#[derive(Debug, Clone)]
pub struct LdbdEngine {
    host: String,
    port: u16,
}

impl LdbdEngine {
    /// Check that the server at `url` accepts connections.
    pub fn new(url: &Url) -> Result<Self> {
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| Error::UnsupportedSource(url.to_string()))?
            .to_string();
        let engine = Self {
            host,
            port: url.port().unwrap_or(DEFAULT_PORT),
        };
        engine.open()?;
        Ok(engine)
    }

    fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn open(&self) -> Result<TcpStream> {
        TcpStream::connect((self.host.as_str(), self.port)).map_err(|source| Error::Connection {
            target: self.target(),
            source,
        })
    }

    /// Send one request and return the reply payload.
    pub fn request(&self, method: &str, arg: &str) -> Result<String> {
        let mut stream = self.open()?;
        tracing::debug!("ldbd {method} to {}", self.target());
        stream.write_all(format!("{method}\0{arg}\0").as_bytes())?;
        stream.flush()?;
        stream.shutdown(Shutdown::Write)?;
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf)?;
        parse_reply(&buf)
    }
}

fn parse_reply(buf: &[u8]) -> Result<String> {
    let text = String::from_utf8_lossy(buf);
    let mut fields = text.split('\0');
    let code = fields
        .next()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| Error::Protocol("empty reply".into()))?;
    let code: i64 = code
        .parse()
        .map_err(|_| Error::Protocol(format!("bad return code \"{code}\"")))?;
    let payload = fields.next().unwrap_or_default().to_string();
    if code != 0 {
        return Err(Error::Server { code, msg: payload });
    }
    Ok(payload)
}

impl QueryEngine for LdbdEngine {
    fn query(&mut self, sql: &str) -> Result<Vec<Row>> {
        tracing::debug!("ldbd query: {sql}");
        let payload = self.request("QUERY", sql)?;
        let doc = ligolw::load_reader(payload.as_bytes())?;
        match ligolw::tables(&doc).first() {
            Some(el) => Ok(ligolw::Table::from_element(el)?.rows),
            None => Ok(Vec::new()),
        }
    }

    fn ping(&mut self) -> Result<String> {
        self.request("PING", "")
    }

    fn describe(&self) -> String {
        format!("ldbd://{}", self.target())
    }

    fn joins_on_creator_db(&self) -> bool {
        true
    }
}

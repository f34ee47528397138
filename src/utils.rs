use crate::Error;
use std::{
    io,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

/// Minimal local HTTP server that answers every request with the same HTML page.
/// Only lives for as long as the browser needs to load the page.
pub struct Server {
    server: Arc<tiny_http::Server>,
    handler: Option<JoinHandle<()>>,
    shall_exit: Arc<AtomicBool>,
}

impl Server {
    pub fn new(
        mut responder: impl FnMut(tiny_http::Request) -> Result<(), io::Error> + Send + 'static,
    ) -> Result<Self, Error> {
        let server = Arc::new(
            tiny_http::Server::http("127.0.0.1:0").map_err(|err| Error::Other(err.to_string()))?,
        );
        let shall_exit = Arc::new(AtomicBool::new(false));
        let srv = server.clone();
        let exit = shall_exit.clone();
        let handler = thread::spawn(move || loop {
            match srv.recv_timeout(Duration::from_millis(200)) {
                Ok(Some(request)) => {
                    if let Err(err) = responder(request) {
                        log::warn!("Failed to answer browser request: {}", err);
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    log::error!("Html server stopped: {}", err);
                    break;
                }
            }
            if exit.load(Ordering::Relaxed) {
                break;
            }
        });
        Ok(Server {
            server,
            handler: Some(handler),
            shall_exit,
        })
    }

    pub fn with_html(html: String) -> Result<Self, Error> {
        let responder = move |request: tiny_http::Request| {
            log::debug!("Serving form page for {}", request.url());
            let header = tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"text/html; charset=utf-8"[..])
                .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "bad header"))?;
            let response = tiny_http::Response::new(
                tiny_http::StatusCode(200),
                vec![header],
                io::Cursor::new(html.clone().into_bytes()),
                Some(html.len()),
                None,
            );
            request.respond(response)
        };
        Self::new(responder)
    }

    pub fn port(&self) -> u16 {
        self.server.server_addr().port()
    }

    pub fn url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port())
    }

    pub fn exit(&mut self) -> Result<(), io::Error> {
        self.shall_exit.store(true, Ordering::Relaxed);
        match self.handler.take() {
            Some(handler) => handler
                .join()
                .map_err(|_| io::Error::new(io::ErrorKind::Other, "html server thread panicked")),
            None => Ok(()),
        }
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        if let Err(err) = self.exit() {
            log::warn!("{}", err);
        }
    }
}

use crate::{utils::Server, Error};
use headless_chrome::{protocol::page::ScreenshotFormat, Browser, LaunchOptionsBuilder};

/// Turns a page of HTML into a PNG of one element on it.
pub trait FormRenderer {
    /// `Ok(None)` when the page has no element matching `selector`.
    fn rasterize(&self, html: &str, selector: &str) -> Result<Option<Vec<u8>>, Error>;
}

/// Renders with a headless Chrome that loads the page from a throwaway local server.
#[derive(Debug, Clone)]
pub struct ChromeRenderer {
    headless: bool,
}

impl Default for ChromeRenderer {
    fn default() -> Self {
        ChromeRenderer { headless: true }
    }
}

impl ChromeRenderer {
    pub fn new(headless: bool) -> Self {
        ChromeRenderer { headless }
    }

    fn browser(&self) -> Result<Browser, Error> {
        let options = LaunchOptionsBuilder::default()
            .headless(self.headless)
            .build()
            .map_err(Error::Browser)?;
        Browser::new(options).map_err(|err| Error::Browser(err.to_string()))
    }
}

impl FormRenderer for ChromeRenderer {
    fn rasterize(&self, html: &str, selector: &str) -> Result<Option<Vec<u8>>, Error> {
        let server = Server::with_html(html.to_owned())?;
        let browser = self.browser()?;
        let tab = browser
            .wait_for_initial_tab()
            .map_err(|err| Error::Browser(err.to_string()))?;
        tab.navigate_to(&server.url())
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(|err| Error::Browser(err.to_string()))?;

        let element = match tab.find_element(selector) {
            Ok(element) => element,
            Err(err) => {
                log::debug!("No render target {}: {}", selector, err);
                return Ok(None);
            }
        };
        let png = element
            .capture_screenshot(ScreenshotFormat::PNG)
            .map_err(|err| Error::Browser(err.to_string()))?;
        log::debug!("Captured {} ({} bytes)", selector, png.len());
        Ok(Some(png))
    }
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SweepError {
    #[error("no Chromium-family browser found (install Chrome, Chromium or Brave, or set CHROME_EXECUTABLE)")]
    BrowserUnavailable,

    #[error("browser launch failed: {0}")]
    BrowserLaunch(String),

    #[error("not a playlist page: {0}")]
    NotACollectionView(String),

    #[error("playlist container never appeared")]
    ContainerMissing,

    #[error("automation failed: {0}")]
    Automation(String),
}

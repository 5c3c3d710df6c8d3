use anyhow::Result;
use async_trait::async_trait;
use client_core::LinkOpener;

/// Terminal stand-in for a browser tab: prints the link for the user.
pub struct StdoutLinkOpener;

#[async_trait]
impl LinkOpener for StdoutLinkOpener {
    async fn open(&self, link: &str) -> Result<()> {
        println!("Open in browser: {link}");
        Ok(())
    }
}

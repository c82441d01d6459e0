//! Opening URIs with the platform's default handler

use std::process::Command;

use opsh_core::prelude::*;
use url::Url;

/// Schemes handed to the platform opener
const ALLOWED_SCHEMES: [&str; 4] = ["http", "https", "mailto", "file"];

/// Parse `uri` and check it is something the opener should receive.
pub fn validate_external(uri: &str) -> Result<Url> {
    let url = Url::parse(uri).map_err(|e| Error::surface(format!("Invalid URI '{}': {}", uri, e)))?;
    if !ALLOWED_SCHEMES.contains(&url.scheme()) {
        return Err(Error::surface(format!(
            "Refusing to open '{}' scheme",
            url.scheme()
        )));
    }
    Ok(url)
}

/// Open a URI in the system handler (cross-platform, fire-and-forget).
pub fn open_external(uri: &str) -> Result<()> {
    let url = validate_external(uri)?;
    spawn_opener(url.as_str()).map_err(|e| {
        Error::surface(format!("Failed to open '{}': {}", url, e))
    })
}

fn spawn_opener(target: &str) -> std::io::Result<()> {
    #[cfg(target_os = "macos")]
    {
        Command::new("open").arg(target).spawn()?;
        return Ok(());
    }

    #[cfg(target_os = "linux")]
    {
        Command::new("xdg-open").arg(target).spawn()?;
        return Ok(());
    }

    #[cfg(target_os = "windows")]
    {
        Command::new("cmd").args(["/C", "start", "", target]).spawn()?;
        return Ok(());
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        let _ = target;
        return Err(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "no opener available for this platform",
        ));
    }

    #[allow(unreachable_code)]
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_web_and_mail() {
        assert!(validate_external("https://example.com/docs?q=1").is_ok());
        assert!(validate_external("mailto:me@example.com").is_ok());
    }

    #[test]
    fn test_validate_rejects_garbage_and_odd_schemes() {
        assert!(validate_external("not a uri").is_err());
        assert!(validate_external("javascript:alert(1)").is_err());
        let err = validate_external("ssh://host").unwrap_err();
        assert!(err.is_recoverable());
    }
}
